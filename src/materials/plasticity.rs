//! Plastic projection applied by G2P after the deformation update.

use crate::config::constants;
use crate::math::{Matrix, Real, Svd, Vector, matrix_determinant};

/// Returns the projected deformation gradient and the new volume ratio `J`.
pub trait PlasticModel: Send + Sync {
    fn project(&self, deformation_gradient: Matrix, volume_ratio: Real) -> (Matrix, Real);
}

/// Purely elastic material: `F` is kept and `J` tracks `det(F)`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NoPlasticity;

impl PlasticModel for NoPlasticity {
    fn project(&self, deformation_gradient: Matrix, _volume_ratio: Real) -> (Matrix, Real) {
        (deformation_gradient, matrix_determinant(&deformation_gradient))
    }
}

/// Snow plasticity: singular values of `F` are clamped to
/// `[1 - critical_compression, 1 + critical_stretch]` and the plastic volume
/// ratio absorbs the removed volume change.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SnowPlasticity {
    pub critical_compression: Real,
    pub critical_stretch: Real,
    pub min_volume_ratio: Real,
    pub max_volume_ratio: Real,
}

impl Default for SnowPlasticity {
    fn default() -> Self {
        Self {
            critical_compression: constants::CRITICAL_COMPRESSION,
            critical_stretch: constants::CRITICAL_STRETCH,
            min_volume_ratio: constants::MIN_VOLUME_RATIO,
            max_volume_ratio: constants::MAX_VOLUME_RATIO,
        }
    }
}

impl PlasticModel for SnowPlasticity {
    fn project(&self, deformation_gradient: Matrix, volume_ratio: Real) -> (Matrix, Real) {
        let Some(mut svd) = Svd::decompose(&deformation_gradient) else {
            return (deformation_gradient, volume_ratio);
        };

        let old_det = matrix_determinant(&deformation_gradient);
        svd.singular_values = svd.singular_values.clamp(
            Vector::splat(1.0 - self.critical_compression),
            Vector::splat(1.0 + self.critical_stretch),
        );
        let projected = svd.recompose();

        let new_det = matrix_determinant(&projected);
        let volume_ratio = (volume_ratio * old_det / new_det)
            .clamp(self.min_volume_ratio, self.max_volume_ratio);

        (projected, volume_ratio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{identity_matrix, matrix_norm};

    #[test]
    fn test_no_plasticity_tracks_determinant() {
        let f = Matrix::from_cols(Vector::new(1.1, 0.0), Vector::new(0.2, 0.9));
        let (projected, j) = NoPlasticity.project(f, 0.5);
        assert_eq!(projected, f);
        assert!((j - 0.99).abs() < 1e-12);
    }

    #[test]
    fn test_snow_keeps_small_deformations() {
        let f = identity_matrix() * 1.001;
        let (projected, j) = SnowPlasticity::default().project(f, 1.0);
        assert!(matrix_norm(&(projected - f)) < 1e-12);
        assert!((j - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_snow_clamps_large_compression() {
        let plasticity = SnowPlasticity::default();
        let f = identity_matrix() * 0.8;
        let (projected, j) = plasticity.project(f, 1.0);

        let sigma = 1.0 - plasticity.critical_compression;
        assert!(matrix_norm(&(projected - identity_matrix() * sigma)) < 1e-12);
        // Plastic ratio absorbs 0.64 / 0.975².
        let expected = 0.64 / (sigma * sigma);
        assert!((j - expected).abs() < 1e-12);
    }

    #[test]
    fn test_snow_clamps_volume_ratio_range() {
        let plasticity = SnowPlasticity::default();
        let f = identity_matrix() * 0.5;
        let (_, j) = plasticity.project(f, 1.0);
        assert_eq!(j, plasticity.min_volume_ratio);
    }

    #[test]
    fn test_snow_preserves_rotation() {
        let rotation = Matrix::from_angle(0.3);
        let f = rotation * (identity_matrix() * 1.2);
        let (projected, _) = SnowPlasticity::default().project(f, 1.0);
        let expected = rotation * (identity_matrix() * (1.0 + constants::CRITICAL_STRETCH));
        assert!(matrix_norm(&(projected - expected)) < 1e-10);
    }
}
