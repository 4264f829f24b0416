use crate::errors::ToolError;
use serde_json::Value;

#[derive(Clone)]
pub struct Validation;

impl Validation {
    pub fn new() -> Self {
        Self
    }

    pub fn ensure_string(
        &self,
        value: &Value,
        label: &str,
        trim: bool,
    ) -> Result<String, ToolError> {
        let text = value.as_str().ok_or_else(|| {
            ToolError::invalid_argument(format!("{} must be a non-empty string", label))
        })?;
        let normalized = text.trim();
        if normalized.is_empty() {
            return Err(ToolError::invalid_argument(format!(
                "{} must be a non-empty string",
                label
            )));
        }
        Ok(if trim {
            normalized.to_string()
        } else {
            text.to_string()
        })
    }

    pub fn ensure_optional_string(
        &self,
        value: Option<&Value>,
        label: &str,
    ) -> Result<Option<String>, ToolError> {
        match value {
            None => Ok(None),
            Some(val) if val.is_null() => Ok(None),
            Some(val) => {
                let text = val.as_str().ok_or_else(|| {
                    ToolError::invalid_argument(format!("{} must be a string", label))
                })?;
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Ok(None);
                }
                Ok(Some(trimmed.to_string()))
            }
        }
    }

    pub fn ensure_optional_integer(
        &self,
        value: Option<&Value>,
        label: &str,
    ) -> Result<Option<i64>, ToolError> {
        let Some(value) = value else {
            return Ok(None);
        };
        if value.is_null() {
            return Ok(None);
        }
        value
            .as_i64()
            .or_else(|| value.as_str().and_then(|s| s.trim().parse::<i64>().ok()))
            .map(Some)
            .ok_or_else(|| ToolError::invalid_argument(format!("{} must be an integer", label)))
    }
}

impl Default for Validation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ensure_string_trims_and_rejects_blank() {
        let validation = Validation::new();
        assert_eq!(
            validation
                .ensure_string(&json!("  rust engineer  "), "role", true)
                .unwrap(),
            "rust engineer"
        );
        let err = validation
            .ensure_string(&json!("   "), "role", true)
            .unwrap_err();
        assert_eq!(err.code, "INVALID_ARGUMENT");
    }

    #[test]
    fn optional_string_treats_blank_as_absent() {
        let validation = Validation::new();
        assert_eq!(
            validation
                .ensure_optional_string(Some(&json!("")), "city")
                .unwrap(),
            None
        );
        assert_eq!(
            validation
                .ensure_optional_string(Some(&Value::Null), "city")
                .unwrap(),
            None
        );
    }

    #[test]
    fn optional_integer_accepts_numeric_strings() {
        let validation = Validation::new();
        assert_eq!(
            validation
                .ensure_optional_integer(Some(&json!("7")), "num_jobs")
                .unwrap(),
            Some(7)
        );
        assert!(validation
            .ensure_optional_integer(Some(&json!("seven")), "num_jobs")
            .is_err());
    }
}
