//! Corotated elasticity with snow hardening.
//!
//! The stress fed to P2G is the MLS-MPM "affine stress"
//! `-dt V Dinv [2μ(F - R)Fᵀ + volume_term]`, with `Dinv = 4 / dx²` the inverse
//! second moment of the quadratic kernel.

use crate::config::SolverParams;
use crate::core::kernel::inv_d;
use crate::math::{
    Matrix, Real, diagonal_from_value, filled_matrix, matrix_determinant, matrix_is_finite,
    polar_rotation, qr_rotation,
};

use super::utils::{check, physics};

/// How the rotational part `R` of the deformation gradient is obtained.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RotationExtraction {
    /// `R = U Vᵀ` from the singular value decomposition.
    #[default]
    Polar,
    /// Orthogonal factor of a QR factorisation. Equal to the polar rotation
    /// only when `F` is a rotation times an upper-triangular stretch.
    Qr,
}

impl RotationExtraction {
    pub fn rotation(&self, deformation_gradient: &Matrix) -> Option<Matrix> {
        match self {
            Self::Polar => polar_rotation(deformation_gradient),
            Self::Qr => qr_rotation(deformation_gradient),
        }
    }
}

/// Shape of the volumetric term `λ (J - 1) J`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VolumeTerm {
    /// `λ (J - 1) J I`
    #[default]
    Identity,
    /// Every entry set to `λ (J - 1) J`.
    ConstantFill,
}

impl VolumeTerm {
    #[inline]
    pub fn matrix(&self, value: Real) -> Matrix {
        match self {
            Self::Identity => diagonal_from_value(value),
            Self::ConstantFill => filled_matrix(value),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CorotatedModel {
    /// Unhardened shear modulus.
    pub mu0: Real,
    /// Unhardened first Lamé parameter.
    pub lambda0: Real,
    pub hardening: Real,
    pub rotation: RotationExtraction,
    pub volume_term: VolumeTerm,
}

impl CorotatedModel {
    pub fn new(young_modulus: Real, poisson_ratio: Real, hardening: Real) -> Self {
        let (lambda0, mu0) = physics::lame_lambda_mu(young_modulus, poisson_ratio);
        Self {
            mu0,
            lambda0,
            hardening,
            rotation: RotationExtraction::default(),
            volume_term: VolumeTerm::default(),
        }
    }

    pub fn from_params(params: &SolverParams) -> Self {
        Self {
            rotation: params.rotation,
            volume_term: params.volume_term,
            ..Self::new(params.young_modulus, params.poisson_ratio, params.hardening)
        }
    }

    /// Hardened `(mu, lambda)` for a particle with volume ratio `J`.
    #[inline]
    pub fn lame_parameters(&self, volume_ratio: Real) -> (Real, Real) {
        let e = physics::hardening_factor(self.hardening, volume_ratio);
        (self.mu0 * e, self.lambda0 * e)
    }

    /// `2μ(F - R)Fᵀ + volume_term(λ (J - 1) J)`, or `None` for a degenerate `F`.
    pub fn kirchhoff_stress(&self, deformation_gradient: &Matrix, volume_ratio: Real) -> Option<Matrix> {
        if !matrix_is_finite(deformation_gradient) {
            return None;
        }

        let j = matrix_determinant(deformation_gradient);
        if !check::deformation_gradient_ok(j) {
            return None;
        }

        let r = self.rotation.rotation(deformation_gradient)?;
        let (mu, lambda) = self.lame_parameters(volume_ratio);

        let deviatoric = 2.0 * mu * (*deformation_gradient - r) * deformation_gradient.transpose();
        Some(deviatoric + self.volume_term.matrix(lambda * (j - 1.0) * j))
    }

    /// Stress contribution to the P2G affine momentum.
    pub fn affine_stress(
        &self,
        deformation_gradient: &Matrix,
        volume_ratio: Real,
        volume: Real,
        dt: Real,
        cell_width: Real,
    ) -> Option<Matrix> {
        let stress = self.kirchhoff_stress(deformation_gradient, volume_ratio)?;
        Some(stress * (-dt * volume * inv_d(cell_width)))
    }
}
