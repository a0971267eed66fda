//! Prime factorization by trial division.

use crate::{CourierError, Result};

/// Lazy sequence of the prime factors of `n`, with repetition, ascending.
///
/// Keeps a divisor candidate starting at 2. While the remainder is above 1,
/// a candidate that divides it is yielded and divided out (the candidate
/// stays put to catch repeated factors); otherwise the candidate advances by
/// one. Once the candidate's square exceeds the remainder, the remainder is
/// itself prime and is yielded last.
///
/// ```
/// use courier::greet::PrimeFactors;
///
/// let factors: Vec<i64> = PrimeFactors::new(120).unwrap().collect();
/// assert_eq!(factors, vec![2, 2, 2, 3, 5]);
/// ```
#[derive(Debug, Clone)]
pub struct PrimeFactors {
    remaining: i64,
    candidate: i64,
}

impl PrimeFactors {
    /// Fails with an invalid-argument error for `n <= 0`.
    pub fn new(n: i64) -> Result<Self> {
        if n <= 0 {
            return Err(CourierError::InvalidArgument(format!(
                "cannot factorize non-positive number: {n}"
            )));
        }
        Ok(Self {
            remaining: n,
            candidate: 2,
        })
    }
}

impl Iterator for PrimeFactors {
    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        while self.remaining > 1 {
            if self.candidate > self.remaining / self.candidate {
                let prime = self.remaining;
                self.remaining = 1;
                return Some(prime);
            }
            if self.remaining % self.candidate == 0 {
                self.remaining /= self.candidate;
                return Some(self.candidate);
            }
            self.candidate += 1;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_prime(n: i64) -> bool {
        n >= 2 && (2..).take_while(|d| d * d <= n).all(|d| n % d != 0)
    }

    #[test]
    fn one_has_no_factors() {
        assert_eq!(PrimeFactors::new(1).unwrap().count(), 0);
    }

    #[test]
    fn rejects_non_positive_input() {
        assert!(PrimeFactors::new(0).is_err());
        assert!(PrimeFactors::new(-12).is_err());
    }

    #[test]
    fn repeated_factors_are_emitted() {
        let factors: Vec<i64> = PrimeFactors::new(1024).unwrap().collect();
        assert_eq!(factors, vec![2; 10]);
    }

    #[test]
    fn factors_multiply_back_and_are_prime_and_sorted() {
        for n in 2..=2_000i64 {
            let factors: Vec<i64> = PrimeFactors::new(n).unwrap().collect();
            assert_eq!(factors.iter().product::<i64>(), n, "product for {n}");
            assert!(factors.iter().all(|&f| is_prime(f)), "primality for {n}");
            assert!(factors.windows(2).all(|w| w[0] <= w[1]), "order for {n}");
        }
    }

    #[test]
    fn large_prime_terminates() {
        let factors: Vec<i64> = PrimeFactors::new(2_147_483_647).unwrap().collect();
        assert_eq!(factors, vec![2_147_483_647]);
    }

    #[test]
    fn max_i64() {
        let factors: Vec<i64> = PrimeFactors::new(i64::MAX).unwrap().collect();
        assert_eq!(factors, vec![7, 7, 73, 127, 337, 92_737, 649_657]);
    }
}
