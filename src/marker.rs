//! Concrete markers: labeled 3D points rigidly attached to a segment.

use crate::math::canonical_zero;
use nalgebra::{Point3, Vector3};
use std::fmt;
use std::ops::{Add, Sub};

/// A labeled 3D point attached to a segment.
///
/// The position is expressed in the local frame of the parent segment.
/// Markers are immutable once constructed; the offset operators return new
/// markers.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    name: String,
    parent_name: String,
    position: Point3<f64>,
    is_technical: bool,
    is_anatomical: bool,
}

impl Marker {
    /// Create a marker from literal coordinates.
    ///
    /// Flags default to technical and not anatomical; use
    /// [`Marker::with_flags`] to override.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        parent_name: impl Into<String>,
        position: Point3<f64>,
    ) -> Self {
        Self {
            name: name.into(),
            parent_name: parent_name.into(),
            position,
            is_technical: true,
            is_anatomical: false,
        }
    }

    /// Set the technical/anatomical usage flags.
    #[must_use]
    pub fn with_flags(mut self, is_technical: bool, is_anatomical: bool) -> Self {
        self.is_technical = is_technical;
        self.is_anatomical = is_anatomical;
        self
    }

    /// The marker name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The segment this marker is attached to.
    #[must_use]
    pub fn parent_name(&self) -> &str {
        &self.parent_name
    }

    /// The position in the parent segment's local frame.
    #[must_use]
    pub const fn position(&self) -> Point3<f64> {
        self.position
    }

    /// Whether the marker is flagged as technical.
    #[must_use]
    pub const fn is_technical(&self) -> bool {
        self.is_technical
    }

    /// Whether the marker is flagged as anatomical.
    #[must_use]
    pub const fn is_anatomical(&self) -> bool {
        self.is_anatomical
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "marker {}", self.name)?;
        writeln!(f, "\tparent {}", self.parent_name)?;
        writeln!(
            f,
            "\tposition {:.4} {:.4} {:.4}",
            canonical_zero(self.position.x),
            canonical_zero(self.position.y),
            canonical_zero(self.position.z)
        )?;
        writeln!(f, "\ttechnical {}", u8::from(self.is_technical))?;
        writeln!(f, "\tanatomical {}", u8::from(self.is_anatomical))?;
        writeln!(f, "endmarker")
    }
}

impl Add<Vector3<f64>> for Marker {
    type Output = Self;

    fn add(mut self, offset: Vector3<f64>) -> Self::Output {
        self.position += offset;
        self
    }
}

impl Sub<Vector3<f64>> for Marker {
    type Output = Self;

    fn sub(mut self, offset: Vector3<f64>) -> Self::Output {
        self.position -= offset;
        self
    }
}
