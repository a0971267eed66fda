//! Build metadata for `--version` output and the daemon's startup log.

/// Package version from Cargo.toml.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Abbreviated commit the binary was built from.
///
/// `None` when the build had no git checkout; vergen then emits a
/// placeholder that is not a hex sha.
pub fn commit() -> Option<&'static str> {
    option_env!("VERGEN_GIT_SHA")
        .filter(|sha| !sha.is_empty() && sha.bytes().all(|b| b.is_ascii_hexdigit()))
        .map(|sha| &sha[..sha.len().min(7)])
}

/// RFC 3339 build timestamp, when recorded.
pub fn built_at() -> Option<&'static str> {
    option_env!("VERGEN_BUILD_TIMESTAMP")
}

fn modified() -> bool {
    option_env!("VERGEN_GIT_DIRTY") == Some("true")
}

/// `0.1.0 (abc1234)`, `0.1.0 (abc1234, modified)`, or the bare package
/// version outside a git checkout.
pub fn version_string() -> String {
    match commit() {
        Some(sha) if modified() => format!("{PKG_VERSION} ({sha}, modified)"),
        Some(sha) => format!("{PKG_VERSION} ({sha})"),
        None => PKG_VERSION.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_package_version() {
        assert!(version_string().starts_with(PKG_VERSION));
    }

    #[test]
    fn commit_is_short_hex() {
        if let Some(sha) = commit() {
            assert!(sha.len() <= 7, "{sha}");
            assert!(version_string().contains(sha));
        } else {
            assert_eq!(version_string(), PKG_VERSION);
        }
    }
}
