//! `${VAR}` and `${VAR:-default}` expansion for configuration strings.
//!
//! Bare `$VAR` is left alone so URLs and TeX survive unchanged.

use crate::ConfigError;

/// Expand environment variable references in `value`.
///
/// A `${VAR}` without a default must be set.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    if let Some(missing) = required_vars(value).find(|var| std::env::var_os(var).is_none()) {
        return Err(ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{missing}}} not set"),
        });
    }

    shellexpand::env_with_context(value, |var| {
        Ok::<_, std::env::VarError>(std::env::var(var).ok())
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: e.to_string(),
    })
}

/// Names referenced as `${NAME}` with no `:-` default.
fn required_vars(value: &str) -> impl Iterator<Item = &str> {
    value.split("${").skip(1).filter_map(|rest| {
        let inner = &rest[..rest.find('}')?];
        (!inner.contains(":-")).then_some(inner)
    })
}

/// Expand an optional value in place.
pub(crate) fn expand_opt(value: &mut Option<String>, field: &str) -> Result<(), ConfigError> {
    if let Some(current) = value.as_deref() {
        *value = Some(expand_env(current, field)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_unchanged() {
        assert_eq!(expand_env("docs/index.md", "docs.default_doc").unwrap(), "docs/index.md");
        assert_eq!(expand_env("$x^2$ and $PATH", "f").unwrap(), "$x^2$ and $PATH");
    }

    #[test]
    fn test_expand_embedded_var() {
        // SAFETY: the variable name is unique to this test
        unsafe {
            std::env::set_var("MDVIEW_TEST_KROKI_HOST", "kroki.internal");
        }
        let result = expand_env("https://${MDVIEW_TEST_KROKI_HOST}:8000", "diagrams.kroki_url").unwrap();
        assert_eq!(result, "https://kroki.internal:8000");
        unsafe {
            std::env::remove_var("MDVIEW_TEST_KROKI_HOST");
        }
    }

    #[test]
    fn test_default_used_when_unset() {
        // SAFETY: the variable name is unique to this test
        unsafe {
            std::env::remove_var("MDVIEW_TEST_UNSET_HOST");
        }
        let result = expand_env("${MDVIEW_TEST_UNSET_HOST:-0.0.0.0}", "server.host").unwrap();
        assert_eq!(result, "0.0.0.0");
    }

    #[test]
    fn test_missing_var_names_field() {
        // SAFETY: the variable name is unique to this test
        unsafe {
            std::env::remove_var("MDVIEW_TEST_MISSING");
        }
        let err = expand_env("${MDVIEW_TEST_MISSING}", "docs.base_url").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        let message = err.to_string();
        assert!(message.contains("MDVIEW_TEST_MISSING"));
        assert!(message.contains("docs.base_url"));
    }

    #[test]
    fn test_required_vars() {
        let vars: Vec<_> = required_vars("${A}/${B:-x}/${C}").collect();
        assert_eq!(vars, ["A", "C"]);
    }

    #[test]
    fn test_expand_opt() {
        let mut none = None;
        expand_opt(&mut none, "f").unwrap();
        assert_eq!(none, None);

        let mut some = Some("plain".to_owned());
        expand_opt(&mut some, "f").unwrap();
        assert_eq!(some.as_deref(), Some("plain"));
    }
}
