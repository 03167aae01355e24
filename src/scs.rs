//! Segment coordinate systems: rigid frames locating a segment relative to
//! its parent or to the global frame.
//!
//! A frame built from markers is stored in the global frame and only
//! re-expressed relative to its parent when serialized; a frame built from
//! Euler angles is already parent-local. The parent is a shared read-only
//! handle — a frame never owns its parent, it only needs it to outlive the
//! child for printing.

use crate::axis::{Axis, AxisName};
use crate::error::{ModelError, Result};
use crate::marker::Marker;
use crate::math::{canonical_zero, HomogeneousTransform};
use nalgebra::{Point3, Vector3};
use std::fmt;
use std::rc::Rc;

/// Axis vectors with a norm below this are considered degenerate
/// (coincident or collinear markers).
const AXIS_NORM_EPSILON: f64 = 1e-10;

/// A segment's local reference frame.
#[derive(Debug, Clone, Default)]
pub struct SegmentCoordinateSystem {
    transform: HomogeneousTransform,
    parent: Option<Rc<SegmentCoordinateSystem>>,
    is_local: bool,
}

impl SegmentCoordinateSystem {
    /// Wrap a transform with an optional parent handle.
    ///
    /// `is_local` declares whether `transform` is already expressed in the
    /// parent's frame (true) or in the global frame (false).
    #[must_use]
    pub const fn new(
        transform: HomogeneousTransform,
        parent: Option<Rc<SegmentCoordinateSystem>>,
        is_local: bool,
    ) -> Self {
        Self {
            transform,
            parent,
            is_local,
        }
    }

    /// Build a frame from an origin marker and two marker-defined axes.
    ///
    /// The two axes are reordered if needed so that together with the
    /// derived third axis they form a right-handed triple. The third axis is
    /// always the cross product of the first two; of the two supplied axes,
    /// only `axis_to_keep` keeps its exact direction while the other is
    /// recomputed to guarantee orthogonality. The result is expressed in the
    /// global frame (`is_local = false`).
    ///
    /// # Errors
    ///
    /// - [`ModelError::Configuration`] if both axes share a name or
    ///   `axis_to_keep` names neither supplied axis.
    /// - [`ModelError::DegenerateGeometry`] if any axis vector has
    ///   near-zero norm (coincident or collinear markers).
    pub fn from_markers(
        origin: &Marker,
        first: &Axis,
        second: &Axis,
        axis_to_keep: AxisName,
        parent: Option<Rc<SegmentCoordinateSystem>>,
    ) -> Result<Self> {
        let Some(third_name) = AxisName::third(first.name(), second.name()) else {
            return Err(ModelError::configuration(
                "the two axes cannot share the same name",
            ));
        };

        // Reorder so (first, second, third) is a right-handed triple.
        let (first, second) = if AxisName::is_cyclic_pair(first.name(), second.name()) {
            (first, second)
        } else {
            (second, first)
        };

        let mut first_vector = first.direction();
        let mut second_vector = second.direction();
        let third_vector = first_vector.cross(&second_vector);
        if axis_to_keep == first.name() {
            second_vector = third_vector.cross(&first_vector);
        } else if axis_to_keep == second.name() {
            first_vector = second_vector.cross(&third_vector);
        } else {
            return Err(ModelError::configuration(format!(
                "axis to keep {axis_to_keep} must be one of the two supplied axes ({}, {})",
                first.name(),
                second.name()
            )));
        }

        let mut columns = [Vector3::zeros(); 3];
        for (vector, name) in [
            (first_vector, first.name()),
            (second_vector, second.name()),
            (third_vector, third_name),
        ] {
            let norm = vector.norm();
            if norm < AXIS_NORM_EPSILON {
                return Err(ModelError::degenerate_geometry(format!(
                    "axis {name} has near-zero norm"
                )));
            }
            columns[name.index()] = vector / norm;
        }

        Ok(Self {
            transform: HomogeneousTransform::from_rotation_columns(columns, origin.position()),
            parent,
            is_local: false,
        })
    }

    /// Build a parent-local frame from Euler angles and a translation.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Configuration`] for a malformed angle sequence.
    pub fn from_euler_and_translation(
        angles: &[f64],
        sequence: &str,
        translation: Vector3<f64>,
        parent: Option<Rc<SegmentCoordinateSystem>>,
    ) -> Result<Self> {
        Ok(Self {
            transform: HomogeneousTransform::from_euler(angles, sequence, translation)?,
            parent,
            is_local: true,
        })
    }

    /// The stored transform (global or parent-local depending on
    /// [`SegmentCoordinateSystem::is_local`]).
    #[must_use]
    pub const fn transform(&self) -> &HomogeneousTransform {
        &self.transform
    }

    /// The parent frame handle, if any.
    #[must_use]
    pub const fn parent(&self) -> Option<&Rc<SegmentCoordinateSystem>> {
        self.parent.as_ref()
    }

    /// Whether the stored transform is already parent-local.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        self.is_local
    }

    /// A new frame holding the rigid inverse of this one.
    #[must_use]
    pub fn transpose(&self) -> Self {
        Self {
            transform: self.transform.inverse(),
            parent: self.parent.clone(),
            is_local: false,
        }
    }

    /// Apply the stored transform to a point.
    #[must_use]
    pub fn transform_point(&self, point: &Point3<f64>) -> Point3<f64> {
        self.transform.transform_point(point)
    }

    /// The transform expressed in the parent's local frame, as serialized.
    ///
    /// A local frame is returned as-is; a global frame is re-expressed as
    /// `parent.inverse * transform`, or collapses to identity when it has no
    /// parent.
    #[must_use]
    pub fn in_parent_frame(&self) -> HomogeneousTransform {
        if self.is_local {
            self.transform
        } else {
            match &self.parent {
                Some(parent) => parent.transform.inverse() * self.transform,
                None => HomogeneousTransform::identity(),
            }
        }
    }
}

impl fmt::Display for SegmentCoordinateSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let local = self.in_parent_frame();
        let [rx, ry, rz] = local.euler_xyz();
        let t = local.translation();
        write!(
            f,
            "{:.3} {:.3} {:.3} xyz {:.3} {:.3} {:.3}",
            canonical_zero(rx),
            canonical_zero(ry),
            canonical_zero(rz),
            canonical_zero(t.x),
            canonical_zero(t.y),
            canonical_zero(t.z)
        )
    }
}
