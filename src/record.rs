//! Stored records and search hits.

use crate::error::{DbError, Result};
use serde::{Deserialize, Serialize};

/// A stored vector and the id the store assigned to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: u64,
    pub values: Vec<f64>,
}

/// A record paired with its cosine similarity to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub record: VectorRecord,
    pub score: f64,
}

/// Rejects vectors that cannot be stored or queried: empty ones, and ones
/// holding a non-finite component.
pub fn validate_values(values: &[f64]) -> Result<()> {
    if values.is_empty() {
        return Err(DbError::InvalidInput("vector must not be empty".to_string()));
    }

    if let Some(pos) = values.iter().position(|x| !x.is_finite()) {
        return Err(DbError::InvalidInput(format!(
            "component {} is not a finite number",
            pos
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_regular_vector() {
        assert!(validate_values(&[1.0, -2.5, 0.0]).is_ok());
    }

    #[test]
    fn test_validate_rejects_empty() {
        assert!(matches!(validate_values(&[]), Err(DbError::InvalidInput(_))));
    }

    #[test]
    fn test_validate_rejects_non_finite() {
        let err = validate_values(&[1.0, f64::INFINITY]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid input: component 1 is not a finite number");
        assert!(validate_values(&[f64::NAN]).is_err());
    }
}
