//! This is the vector math module
//! Provide dot product, L2 norm and cosine similarity

use crate::error::{DbError, Result};

/// Dot Product
/// dot_prod = sum(a[i] * b[i]) for i = 0..a.len()
/// Can only process vectors with same dimensions
pub fn dot(left: &[f64], right: &[f64]) -> Result<f64> {
    check_dimensions(left, right)?;

    Ok(left.iter()
        .zip(right.iter())
        .map(|(x, y)| x * y)
        .sum())
}

/// L2 Norm
/// norm = sqrt(sum(a[i]^2))
/// Empty and all-zero vectors have norm 0
pub fn l2_norm(vector: &[f64]) -> f64 {
    let scale = max_abs(vector);
    if scale == 0.0 {
        return 0.0;
    }

    scale * scaled_norm(vector, scale)
}

/// Cosine Similarity
/// sim = dot(a, b) / (||a|| * ||b||)
///
/// A zero norm on either side makes the ratio undefined; the similarity is
/// then reported as `0.0` so it never injects NaN into a ranking.
///
/// Each side is divided by its largest component first. The ratio does not
/// change, but squares of very large components no longer overflow and very
/// small ones no longer underflow to zero.
pub fn cosine_similarity(left: &[f64], right: &[f64]) -> Result<f64> {
    check_dimensions(left, right)?;

    let (left_scale, right_scale) = (max_abs(left), max_abs(right));
    if left_scale == 0.0 || right_scale == 0.0 {
        return Ok(0.0);
    }

    let dot = left.iter()
        .zip(right.iter())
        .map(|(x, y)| (x / left_scale) * (y / right_scale))
        .sum::<f64>();
    let norms = scaled_norm(left, left_scale) * scaled_norm(right, right_scale);

    Ok((dot / norms).clamp(-1.0, 1.0))
}

fn check_dimensions(left: &[f64], right: &[f64]) -> Result<()> {
    if left.len() != right.len() {
        return Err(DbError::DimensionMismatch {
            expected: left.len(),
            got: right.len(),
        });
    }
    Ok(())
}

fn max_abs(vector: &[f64]) -> f64 {
    vector.iter().fold(0.0, |acc, x| acc.max(x.abs()))
}

/// Norm of `vector / scale`; `scale` must be non-zero.
fn scaled_norm(vector: &[f64], scale: f64) -> f64 {
    vector.iter()
        .map(|x| {
            let v = x / scale;
            v * v
        })
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========== Dot Product Tests ==========

    #[test]
    fn test_dot_basic() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![4.0, 5.0, 6.0];
        // Expected: 1*4 + 2*5 + 3*6 = 32
        let result = dot(&a, &b).unwrap();

        assert!((result - 32.0).abs() < 1e-6);
    }

    #[test]
    fn test_dot_orthogonal() {
        let result = dot(&[1.0, 0.0], &[0.0, 1.0]).unwrap();
        assert_eq!(result, 0.0);
    }

    #[test]
    fn test_dot_dimension_mismatch() {
        let result = dot(&[1.0, 2.0, 3.0], &[4.0, 5.0]);

        match result {
            Err(DbError::DimensionMismatch { expected, got }) => {
                assert_eq!(expected, 3);
                assert_eq!(got, 2);
            }
            other => panic!("Expected dimension mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_dot_empty_vectors() {
        assert_eq!(dot(&[], &[]).unwrap(), 0.0);
    }

    // ========== L2 Norm Tests ==========

    #[test]
    fn test_l2_norm_basic() {
        // [3, 4] -> 5
        assert!((l2_norm(&[3.0, 4.0]) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_l2_norm_negative_values() {
        assert!((l2_norm(&[-3.0, -4.0]) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_l2_norm_zero_and_empty() {
        assert_eq!(l2_norm(&[0.0, 0.0, 0.0]), 0.0);
        assert_eq!(l2_norm(&[]), 0.0);
    }

    // ========== Cosine Similarity Tests ==========

    #[test]
    fn test_cosine_orthogonal_is_zero() {
        let sim = cosine_similarity(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]).unwrap();
        assert_eq!(sim, 0.0);
    }

    #[test]
    fn test_cosine_ignores_magnitude() {
        let sim = cosine_similarity(&[2.0, 0.0], &[1.0, 0.0]).unwrap();
        assert_eq!(sim, 1.0);
    }

    #[test]
    fn test_cosine_opposite_is_minus_one() {
        let sim = cosine_similarity(&[1.0, 2.0], &[-1.0, -2.0]).unwrap();
        assert!((sim + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_diagonal() {
        let sim = cosine_similarity(&[1.0, 0.0], &[1.0, 1.0]).unwrap();
        assert!((sim - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_zero_norm_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]).unwrap(), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 1.0], &[0.0, 0.0]).unwrap(), 0.0);
        assert_eq!(cosine_similarity(&[], &[]).unwrap(), 0.0);
    }

    #[test]
    fn test_cosine_large_components_stay_finite() {
        // Squaring these overflows f64
        let a = vec![3.0e300, 3.0e300];
        let b = vec![1.0e300, 1.0e300];
        let sim = cosine_similarity(&a, &b).unwrap();

        assert!(sim.is_finite());
        assert!((sim - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cosine_tiny_components_not_zero() {
        // Squaring these underflows to 0.0
        let a = vec![1.0e-200, 0.0];
        let b = vec![1.0e-200, 1.0e-200];
        let sim = cosine_similarity(&a, &b).unwrap();

        assert!((sim - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-12);
    }

    #[test]
    fn test_l2_norm_extreme_magnitudes() {
        assert!((l2_norm(&[3.0e300, 4.0e300]) / 5.0e300 - 1.0).abs() < 1e-12);
        assert!((l2_norm(&[3.0e-300, 4.0e-300]) / 5.0e-300 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cosine_dimension_mismatch() {
        let result = cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]);
        assert!(matches!(result, Err(DbError::DimensionMismatch { expected: 2, got: 3 })));
    }
}
