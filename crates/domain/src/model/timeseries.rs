use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result};

/// A named, typed measurement stream (`spec.md` §3).
///
/// `name` uniqueness is enforced by the storage layer (a unique index); the
/// domain only validates shape (non-empty, 1-80 chars).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeseries {
    pub id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
}

impl Timeseries {
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        unit: Option<String>,
        min_value: Option<f64>,
        max_value: Option<f64>,
    ) -> Result<Self> {
        let name = name.into();
        Self::validate_name(&name)?;
        Ok(Self {
            id: None,
            name,
            description,
            unit,
            min_value,
            max_value,
        })
    }

    fn validate_name(name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(DomainError::InvalidTimeseriesName(
                "name cannot be empty".to_string(),
            ));
        }
        if name.chars().count() > 80 {
            return Err(DomainError::InvalidTimeseriesName(format!(
                "name too long: {} chars (max 80)",
                name.chars().count()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_valid() {
        let ts = Timeseries::new("outdoor_temp", None, Some("degC".into()), None, None).unwrap();
        assert_eq!(ts.name, "outdoor_temp");
    }

    #[test]
    fn test_empty_name_rejected() {
        assert!(Timeseries::new("", None, None, None, None).is_err());
    }

    #[test]
    fn test_name_too_long_rejected() {
        let name = "a".repeat(81);
        assert!(Timeseries::new(name, None, None, None, None).is_err());
    }

    #[test]
    fn test_name_at_max_length_ok() {
        let name = "a".repeat(80);
        assert!(Timeseries::new(name, None, None, None, None).is_ok());
    }
}
