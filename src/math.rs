use bevy::math::{DMat2, DVec2, IVec2};
use nalgebra::Matrix2;

pub type Real = f64;

pub type Vector = DVec2;
pub type Matrix = DMat2;
pub type Coord = IVec2;

#[inline(always)]
pub fn zero_vector() -> Vector {
    DVec2::ZERO
}

#[inline(always)]
pub fn zero_matrix() -> Matrix {
    DMat2::ZERO
}

#[inline(always)]
pub fn identity_matrix() -> Matrix {
    DMat2::IDENTITY
}

#[inline(always)]
pub fn matrix_determinant(m: &Matrix) -> Real {
    m.determinant()
}

#[inline(always)]
pub fn diagonal_from_value(value: Real) -> Matrix {
    Matrix::from_diagonal(DVec2::splat(value))
}

/// Matrix with every entry equal to `value`.
#[inline(always)]
pub fn filled_matrix(value: Real) -> Matrix {
    Matrix::from_cols(DVec2::splat(value), DVec2::splat(value))
}

/// `a ⊗ b`, i.e. `a bᵀ`.
#[inline(always)]
pub fn outer_product(a: Vector, b: Vector) -> Matrix {
    Matrix::from_cols(a * b.x, a * b.y)
}

#[inline(always)]
pub fn matrix_is_finite(m: &Matrix) -> bool {
    m.x_axis.is_finite() && m.y_axis.is_finite()
}

/// Frobenius norm.
#[inline]
pub fn matrix_norm(m: &Matrix) -> Real {
    (m.x_axis.length_squared() + m.y_axis.length_squared()).sqrt()
}

pub fn to_nalgebra(m: &Matrix) -> Matrix2<Real> {
    Matrix2::new(m.x_axis.x, m.y_axis.x, m.x_axis.y, m.y_axis.y)
}

pub fn from_nalgebra(m: &Matrix2<Real>) -> Matrix {
    Matrix::from_cols(
        DVec2::new(m[(0, 0)], m[(1, 0)]),
        DVec2::new(m[(0, 1)], m[(1, 1)]),
    )
}

/// Singular value decomposition `m = U Σ Vᵀ` with `U` and `V` proper rotations.
///
/// When `det(m) < 0` the sign is carried by the second singular value, so the
/// returned factors never contain a reflection.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Svd {
    pub u: Matrix,
    pub singular_values: Vector,
    pub v_t: Matrix,
}

impl Svd {
    pub fn decompose(m: &Matrix) -> Option<Self> {
        if !matrix_is_finite(m) {
            return None;
        }

        let svd = to_nalgebra(m).svd(true, true);
        let (Some(u), Some(v_t)) = (svd.u, svd.v_t) else {
            return None;
        };

        let mut u = from_nalgebra(&u);
        let mut v_t = from_nalgebra(&v_t);
        let mut singular_values = DVec2::new(svd.singular_values[0], svd.singular_values[1]);

        if u.determinant() < 0.0 {
            u.y_axis = -u.y_axis;
            singular_values.y = -singular_values.y;
        }
        if v_t.determinant() < 0.0 {
            // Row 1 of Vᵀ.
            v_t.x_axis.y = -v_t.x_axis.y;
            v_t.y_axis.y = -v_t.y_axis.y;
            singular_values.y = -singular_values.y;
        }

        Some(Self {
            u,
            singular_values,
            v_t,
        })
    }

    pub fn recompose(&self) -> Matrix {
        self.u * Matrix::from_diagonal(self.singular_values) * self.v_t
    }
}

/// Rotational factor of the polar decomposition `m = R S`.
pub fn polar_rotation(m: &Matrix) -> Option<Matrix> {
    Svd::decompose(m).map(|svd| svd.u * svd.v_t)
}

/// Orthogonal factor of the QR factorisation `m = Q R`, normalised so the
/// triangular factor has a non-negative diagonal.
pub fn qr_rotation(m: &Matrix) -> Option<Matrix> {
    if !matrix_is_finite(m) {
        return None;
    }

    let (q, r) = to_nalgebra(m).qr().unpack();
    let mut q = from_nalgebra(&q);
    if r[(0, 0)] < 0.0 {
        q.x_axis = -q.x_axis;
    }
    if r[(1, 1)] < 0.0 {
        q.y_axis = -q.y_axis;
    }
    Some(q)
}
