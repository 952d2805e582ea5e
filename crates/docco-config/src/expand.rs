//! Environment variable expansion for configuration strings.
//!
//! Supports:
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::ConfigError;

/// `${NAME}` references without a default.
static REQUIRED_VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap());

/// Every `${NAME...}` reference, with or without a default.
static BRACED_VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)").unwrap());

/// Expand environment variable references in a string.
///
/// Returns the original string unchanged if no `${}` patterns are present.
/// Bare `$VAR` syntax is not expanded (only `${VAR}` with braces).
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    // Fast path: no expansion needed
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    if let Some(missing) = REQUIRED_VAR_RE
        .captures_iter(value)
        .map(|caps| caps[1].to_owned())
        .find(|name| std::env::var(name).is_err())
    {
        return Err(ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{missing}}} not set"),
        });
    }

    // Names referenced in braces; bare `$NAME` resolves to nothing and stays as written
    let braced: HashSet<&str> = BRACED_VAR_RE
        .captures_iter(value)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect();
    shellexpand::env_with_context(value, |var| -> Result<Option<String>, ConfigError> {
        if braced.contains(var) {
            Ok(std::env::var(var).ok())
        } else {
            Ok(None)
        }
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| e.cause)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_simple_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("DOCCO_TEST_VAR_SIMPLE", "hello");
        }
        let result = expand_env("${DOCCO_TEST_VAR_SIMPLE}", "test.field").unwrap();
        assert_eq!(result, "hello");
        unsafe {
            std::env::remove_var("DOCCO_TEST_VAR_SIMPLE");
        }
    }

    #[test]
    fn test_expand_with_default_uses_value() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("DOCCO_TEST_VAR_DEFAULT", "hello");
        }
        let result = expand_env("${DOCCO_TEST_VAR_DEFAULT:-world}", "test.field").unwrap();
        assert_eq!(result, "hello");
        unsafe {
            std::env::remove_var("DOCCO_TEST_VAR_DEFAULT");
        }
    }

    #[test]
    fn test_expand_with_default_uses_default() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("DOCCO_UNSET_VAR_TEST");
        }
        let result = expand_env("${DOCCO_UNSET_VAR_TEST:-default}", "test.field").unwrap();
        assert_eq!(result, "default");
    }

    #[test]
    fn test_expand_missing_var_error() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("DOCCO_MISSING_VAR_TEST");
        }
        let err = expand_env("out/${DOCCO_MISSING_VAR_TEST}", "build.output_dir").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("DOCCO_MISSING_VAR_TEST"));
        assert!(err.to_string().contains("build.output_dir"));
    }

    #[test]
    fn test_expand_literal_unchanged() {
        let result = expand_env("literal string", "test.field").unwrap();
        assert_eq!(result, "literal string");
    }

    #[test]
    fn test_expand_embedded_var_keeps_bare_dollar() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("DOCCO_HOME_TEST", "/srv");
        }
        let result = expand_env("${DOCCO_HOME_TEST}/$out", "test.field").unwrap();
        assert_eq!(result, "/srv/$out");
        unsafe {
            std::env::remove_var("DOCCO_HOME_TEST");
        }
    }

    #[test]
    fn test_bare_dollar_not_expanded() {
        let result = expand_env("$HOME", "test.field").unwrap();
        assert_eq!(result, "$HOME");
    }
}
