//! Concrete segments: rigid bodies of the kinematic tree.

use crate::marker::Marker;
use crate::scs::SegmentCoordinateSystem;
use nalgebra::Point3;
use std::fmt;

/// A rigid body with a local frame, inertial properties and attached
/// markers.
///
/// `parent_name` refers by name to a segment declared earlier in the same
/// chain; the root segment has an empty parent name.
#[derive(Debug, Clone, Default)]
pub struct Segment {
    name: String,
    parent_name: String,
    translations: String,
    rotations: String,
    scs: Option<SegmentCoordinateSystem>,
    mass: f64,
    center_of_mass: [f64; 3],
    inertia: [f64; 3],
    mesh: Vec<Point3<f64>>,
    markers: Vec<Marker>,
}

impl Segment {
    /// Create a segment with no parent, no frame and zero inertial data.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the parent segment name.
    #[must_use]
    pub fn with_parent(mut self, parent_name: impl Into<String>) -> Self {
        self.parent_name = parent_name.into();
        self
    }

    /// Set the translation degrees-of-freedom specifier (e.g. `"xyz"`).
    #[must_use]
    pub fn with_translations(mut self, translations: impl Into<String>) -> Self {
        self.translations = translations.into();
        self
    }

    /// Set the rotation degrees-of-freedom specifier (e.g. `"xyz"`).
    #[must_use]
    pub fn with_rotations(mut self, rotations: impl Into<String>) -> Self {
        self.rotations = rotations.into();
        self
    }

    /// Set the segment's coordinate system.
    #[must_use]
    pub fn with_scs(mut self, scs: SegmentCoordinateSystem) -> Self {
        self.scs = Some(scs);
        self
    }

    /// Set the mesh vertices.
    #[must_use]
    pub fn with_mesh(mut self, mesh: Vec<Point3<f64>>) -> Self {
        self.mesh = mesh;
        self
    }

    /// The segment name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The parent segment name (empty for the root).
    #[must_use]
    pub fn parent_name(&self) -> &str {
        &self.parent_name
    }

    /// The segment's coordinate system, if one was resolved.
    #[must_use]
    pub const fn scs(&self) -> Option<&SegmentCoordinateSystem> {
        self.scs.as_ref()
    }

    /// The segment mass.
    #[must_use]
    pub const fn mass(&self) -> f64 {
        self.mass
    }

    /// The center-of-mass offset in the segment's local frame.
    #[must_use]
    pub const fn center_of_mass(&self) -> [f64; 3] {
        self.center_of_mass
    }

    /// The three principal moments of inertia.
    #[must_use]
    pub const fn inertia(&self) -> [f64; 3] {
        self.inertia
    }

    /// The markers attached to this segment, in attachment order.
    #[must_use]
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Update the mass.
    pub fn set_mass(&mut self, mass: f64) {
        self.mass = mass;
    }

    /// Update the center-of-mass offset.
    pub fn set_center_of_mass(&mut self, center_of_mass: [f64; 3]) {
        self.center_of_mass = center_of_mass;
    }

    /// Update the principal moments of inertia.
    pub fn set_inertia(&mut self, inertia: [f64; 3]) {
        self.inertia = inertia;
    }

    /// Attach a marker.
    pub fn add_marker(&mut self, marker: Marker) {
        self.markers.push(marker);
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "segment {}", self.name)?;
        if !self.parent_name.is_empty() {
            writeln!(f, "\tparent {}", self.parent_name)?;
        }
        if let Some(scs) = &self.scs {
            writeln!(f, "\tRT {scs}")?;
        }
        if !self.translations.is_empty() {
            writeln!(f, "\ttranslations {}", self.translations)?;
        }
        if !self.rotations.is_empty() {
            writeln!(f, "\trotations {}", self.rotations)?;
        }
        writeln!(f, "\tmass {}", self.mass)?;
        writeln!(
            f,
            "\tcom {} {} {}",
            self.center_of_mass[0], self.center_of_mass[1], self.center_of_mass[2]
        )?;
        writeln!(f, "\tinertia {} 0 0", self.inertia[0])?;
        writeln!(f, "\t        0 {} 0", self.inertia[1])?;
        writeln!(f, "\t        0 0 {}", self.inertia[2])?;
        for vertex in &self.mesh {
            writeln!(f, "\tmesh {} {} {}", vertex.x, vertex.y, vertex.z)?;
        }
        writeln!(f, "endsegment")?;

        for marker in &self.markers {
            write!(f, "{marker}")?;
        }
        Ok(())
    }
}
