//! 4x4 homogeneous rigid transforms.
//!
//! A [`HomogeneousTransform`] locates one reference frame relative to
//! another: the top-left 3x3 block holds an orthonormal right-handed
//! rotation, the top-right 3x1 column the translation, and the bottom row is
//! `(0, 0, 0, 1)`. Composition and inversion always operate on the full
//! matrix; Euler angles only appear at serialization time.

use crate::error::{ModelError, Result};
use nalgebra::{Matrix3, Matrix4, Point3, Vector3};
use std::ops::Mul;

/// A rigid (rotation + translation) transform stored as a 4x4 matrix.
///
/// Invariant: the rotation block is orthonormal and right-handed. The
/// constructors uphold it; [`HomogeneousTransform::from_matrix`] trusts the
/// caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HomogeneousTransform(Matrix4<f64>);

impl HomogeneousTransform {
    /// The identity transform.
    #[must_use]
    pub fn identity() -> Self {
        Self(Matrix4::identity())
    }

    /// Wrap an existing homogeneous matrix.
    ///
    /// The caller is responsible for the rotation block being orthonormal
    /// and the bottom row being `(0, 0, 0, 1)`.
    #[must_use]
    pub const fn from_matrix(matrix: Matrix4<f64>) -> Self {
        Self(matrix)
    }

    /// Build a transform from three unit rotation columns and a translation.
    ///
    /// `columns[i]` is placed in rotation column `i`, so the caller decides
    /// which axis slot each vector occupies.
    #[must_use]
    pub fn from_rotation_columns(columns: [Vector3<f64>; 3], translation: Point3<f64>) -> Self {
        let mut matrix = Matrix4::identity();
        for (slot, column) in columns.iter().enumerate() {
            matrix[(0, slot)] = column.x;
            matrix[(1, slot)] = column.y;
            matrix[(2, slot)] = column.z;
        }
        matrix[(0, 3)] = translation.x;
        matrix[(1, 3)] = translation.y;
        matrix[(2, 3)] = translation.z;
        Self(matrix)
    }

    /// Build a transform from a rotation block and a translation.
    #[must_use]
    pub fn from_rotation_translation(rotation: Matrix3<f64>, translation: Vector3<f64>) -> Self {
        let mut matrix = Matrix4::identity();
        matrix.fixed_view_mut::<3, 3>(0, 0).copy_from(&rotation);
        matrix.fixed_view_mut::<3, 1>(0, 3).copy_from(&translation);
        Self(matrix)
    }

    /// Build a transform from Euler angles applied over an axis sequence.
    ///
    /// `sequence` is a string of `x`/`y`/`z` characters, one per angle;
    /// rotations are composed in the given order (`"xyz"` means
    /// `Rx * Ry * Rz`).
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Configuration`] if the angle and sequence
    /// lengths differ or the sequence contains an unknown axis character.
    pub fn from_euler(angles: &[f64], sequence: &str, translation: Vector3<f64>) -> Result<Self> {
        if angles.len() != sequence.chars().count() {
            return Err(ModelError::configuration(format!(
                "angle sequence '{sequence}' expects {} angles, got {}",
                sequence.chars().count(),
                angles.len()
            )));
        }

        let mut rotation = Matrix3::identity();
        for (&angle, axis) in angles.iter().zip(sequence.chars()) {
            let (sin, cos) = angle.sin_cos();
            let step = match axis {
                'x' => Matrix3::new(1.0, 0.0, 0.0, 0.0, cos, -sin, 0.0, sin, cos),
                'y' => Matrix3::new(cos, 0.0, sin, 0.0, 1.0, 0.0, -sin, 0.0, cos),
                'z' => Matrix3::new(cos, -sin, 0.0, sin, cos, 0.0, 0.0, 0.0, 1.0),
                other => {
                    return Err(ModelError::configuration(format!(
                        "unknown axis '{other}' in angle sequence '{sequence}'"
                    )))
                }
            };
            rotation *= step;
        }

        Ok(Self::from_rotation_translation(rotation, translation))
    }

    /// The 3x3 rotation block.
    #[must_use]
    pub fn rotation(&self) -> Matrix3<f64> {
        self.0.fixed_view::<3, 3>(0, 0).into_owned()
    }

    /// The translation column.
    #[must_use]
    pub fn translation(&self) -> Vector3<f64> {
        self.0.fixed_view::<3, 1>(0, 3).into_owned()
    }

    /// The underlying 4x4 matrix.
    #[must_use]
    pub const fn matrix(&self) -> &Matrix4<f64> {
        &self.0
    }

    /// Rigid inverse: the inverse rotation is the transpose and the inverse
    /// translation is `-R^T * t`.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let rotation_t = self.rotation().transpose();
        let translation = -(rotation_t * self.translation());
        Self::from_rotation_translation(rotation_t, translation)
    }

    /// Apply the transform to a point: `R * p + t`.
    #[must_use]
    pub fn transform_point(&self, point: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.rotation() * point.coords + self.translation())
    }

    /// Decompose the rotation block into extrinsic `xyz` Euler angles
    /// `[rx, ry, rz]`, the convention of the model-file grammar.
    #[must_use]
    pub fn euler_xyz(&self) -> [f64; 3] {
        let m = &self.0;
        [
            (-m[(1, 2)]).atan2(m[(2, 2)]),
            m[(0, 2)].clamp(-1.0, 1.0).asin(),
            (-m[(0, 1)]).atan2(m[(0, 0)]),
        ]
    }

    /// Whether the rotation columns are unit-length and mutually orthogonal
    /// within `tolerance`.
    #[must_use]
    pub fn rotation_is_orthonormal(&self, tolerance: f64) -> bool {
        let r = self.rotation();
        let columns = [r.column(0), r.column(1), r.column(2)];
        for (i, column) in columns.iter().enumerate() {
            if (column.norm() - 1.0).abs() > tolerance {
                return false;
            }
            for other in &columns[i + 1..] {
                if column.dot(other).abs() > tolerance {
                    return false;
                }
            }
        }
        true
    }
}

impl Default for HomogeneousTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul for HomogeneousTransform {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Self(self.0 * rhs.0)
    }
}
