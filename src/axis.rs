//! Anatomical axes: intended axis names and marker-backed axis vectors.

use crate::marker::Marker;
use nalgebra::Vector3;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The intended direction of an axis within a segment frame.
///
/// "Intended" because only one of the two axes supplied to frame
/// construction is kept exactly; the other is recomputed to guarantee
/// orthogonality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AxisName {
    X,
    Y,
    Z,
}

impl AxisName {
    /// The rotation-matrix column this axis occupies.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }

    /// The axis name missing from a pair, or `None` when the pair is
    /// degenerate (both names equal).
    #[must_use]
    pub const fn third(first: Self, second: Self) -> Option<Self> {
        match (first, second) {
            (Self::X, Self::Y) | (Self::Y, Self::X) => Some(Self::Z),
            (Self::Y, Self::Z) | (Self::Z, Self::Y) => Some(Self::X),
            (Self::Z, Self::X) | (Self::X, Self::Z) => Some(Self::Y),
            _ => None,
        }
    }

    /// Whether `(first, second)` already follows the right-handed cyclic
    /// order X -> Y -> Z -> X.
    #[must_use]
    pub const fn is_cyclic_pair(first: Self, second: Self) -> bool {
        matches!(
            (first, second),
            (Self::X, Self::Y) | (Self::Y, Self::Z) | (Self::Z, Self::X)
        )
    }
}

impl fmt::Display for AxisName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X => write!(f, "X"),
            Self::Y => write!(f, "Y"),
            Self::Z => write!(f, "Z"),
        }
    }
}

/// An axis defined by two concrete markers.
///
/// A pure computation helper for frame construction; never serialized.
#[derive(Debug, Clone)]
pub struct Axis {
    name: AxisName,
    start: Marker,
    end: Marker,
}

impl Axis {
    /// Create an axis running from `start` to `end`.
    #[must_use]
    pub const fn new(name: AxisName, start: Marker, end: Marker) -> Self {
        Self { name, start, end }
    }

    /// The intended axis name.
    #[must_use]
    pub const fn name(&self) -> AxisName {
        self.name
    }

    /// The start marker.
    #[must_use]
    pub const fn start(&self) -> &Marker {
        &self.start
    }

    /// The end marker.
    #[must_use]
    pub const fn end(&self) -> &Marker {
        &self.end
    }

    /// The axis vector `end - start`.
    #[must_use]
    pub fn direction(&self) -> Vector3<f64> {
        self.end.position() - self.start.position()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    #[test]
    fn test_third_axis() {
        assert_eq!(AxisName::third(AxisName::X, AxisName::Y), Some(AxisName::Z));
        assert_eq!(AxisName::third(AxisName::Z, AxisName::Y), Some(AxisName::X));
        assert_eq!(AxisName::third(AxisName::X, AxisName::X), None);
    }

    #[test]
    fn test_cyclic_pairs() {
        assert!(AxisName::is_cyclic_pair(AxisName::X, AxisName::Y));
        assert!(AxisName::is_cyclic_pair(AxisName::Y, AxisName::Z));
        assert!(AxisName::is_cyclic_pair(AxisName::Z, AxisName::X));
        assert!(!AxisName::is_cyclic_pair(AxisName::Y, AxisName::X));
        assert!(!AxisName::is_cyclic_pair(AxisName::X, AxisName::Z));
    }

    #[test]
    fn test_direction() {
        let start = Marker::new("HIP", "THIGH", Point3::new(0.1, 0.2, 0.3));
        let end = Marker::new("KNEE", "THIGH", Point3::new(0.1, 0.2, -0.2));
        let axis = Axis::new(AxisName::Z, start, end);

        let direction = axis.direction();
        assert_relative_eq!(direction.x, 0.0);
        assert_relative_eq!(direction.y, 0.0);
        assert_relative_eq!(direction.z, -0.5);
    }
}
