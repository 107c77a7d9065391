use crate::utils::error::{MarketError, Result};
use std::collections::HashSet;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(MarketError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(MarketError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_min_value(field_name: &str, value: i64, min_value: i64) -> Result<()> {
    if value < min_value {
        return Err(MarketError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_file_extensions(
    field_name: &str,
    files: &[String],
    allowed_extensions: &[&str],
) -> Result<()> {
    let allowed_set: HashSet<&str> = allowed_extensions.iter().copied().collect();

    for file in files {
        if let Some(extension) = std::path::Path::new(file)
            .extension()
            .and_then(|ext| ext.to_str())
        {
            if !allowed_set.contains(extension) {
                return Err(MarketError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value: file.clone(),
                    reason: format!(
                        "Unsupported file extension: {}. Allowed extensions: {}",
                        extension,
                        allowed_extensions.join(", ")
                    ),
                });
            }
        } else {
            return Err(MarketError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: file.clone(),
                reason: "File has no extension or invalid filename".to_string(),
            });
        }
    }

    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| MarketError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(MarketError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(MarketError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("snapshot", "./market.json").is_ok());
        assert!(validate_path("snapshot", "").is_err());
        assert!(validate_path("snapshot", "bad\0path").is_err());
    }

    #[test]
    fn test_validate_min_value() {
        assert!(validate_min_value("thresholds.n", 5, 1).is_ok());
        assert!(validate_min_value("thresholds.n", 0, 1).is_err());
        assert!(validate_min_value("thresholds.k", -1, 0).is_err());
    }

    #[test]
    fn test_validate_file_extensions() {
        let files = vec!["market.json".to_string()];
        assert!(validate_file_extensions("snapshot", &files, &["json"]).is_ok());

        let invalid_files = vec!["market.yaml".to_string()];
        assert!(validate_file_extensions("snapshot", &invalid_files, &["json"]).is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("thresholds.l", 85, 0, 100).is_ok());
        assert!(validate_range("thresholds.l", 101, 0, 100).is_err());
        assert!(validate_range("thresholds.l", -1, 0, 100).is_err());
    }

    #[test]
    fn test_validate_required_field() {
        let present = Some("value".to_string());
        let absent: Option<String> = None;
        assert_eq!(
            validate_required_field("candidate", &present).unwrap(),
            "value"
        );

        // the CLI prints the field name when neither run mode is given
        let err = validate_required_field("candidate or seller", &absent).unwrap_err();
        assert!(matches!(
            err,
            MarketError::MissingConfigError { field } if field == "candidate or seller"
        ));
    }
}
