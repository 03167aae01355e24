//! The assembled kinematic chain and its serialization.
//!
//! Segments are kept in declaration order, and every non-empty parent name
//! must match a segment that appears earlier in the sequence. The invariant
//! is enforced at insertion rather than assumed, so a misordered definition
//! fails immediately instead of producing a file the downstream engine
//! cannot resolve.

use crate::error::{ModelError, Result};
use crate::math::HomogeneousTransform;
use crate::scs::SegmentCoordinateSystem;
use crate::segment::Segment;
use nalgebra::Point3;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::debug;

/// An ordered sequence of segments forming a kinematic tree.
#[derive(Debug, Clone, Default)]
pub struct KinematicChain {
    segments: Vec<Segment>,
}

impl KinematicChain {
    /// Create an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a chain from segments, validating the parent ordering.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownParent`] if a segment's parent was not
    /// declared before it.
    pub fn from_segments(segments: impl IntoIterator<Item = Segment>) -> Result<Self> {
        let mut chain = Self::new();
        for segment in segments {
            chain.push(segment)?;
        }
        Ok(chain)
    }

    /// Append a segment.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownParent`] if the segment names a parent
    /// that is not already in the chain.
    pub fn push(&mut self, segment: Segment) -> Result<()> {
        if !segment.parent_name().is_empty() && self.index_of(segment.parent_name()).is_none() {
            return Err(ModelError::unknown_parent(
                segment.name(),
                segment.parent_name(),
            ));
        }
        self.segments.push(segment);
        Ok(())
    }

    /// The segments in declaration order.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the chain is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Index of the first segment with the given name.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.segments.iter().position(|s| s.name() == name)
    }

    /// Look up a segment by name.
    #[must_use]
    pub fn segment(&self, name: &str) -> Option<&Segment> {
        self.segments.iter().find(|s| s.name() == name)
    }

    /// Look up a segment by name, mutably.
    pub fn segment_mut(&mut self, name: &str) -> Option<&mut Segment> {
        self.segments.iter_mut().find(|s| s.name() == name)
    }

    /// Each segment's global frame at zero joint coordinates.
    ///
    /// Composes the serialized (parent-local) frames down the tree in
    /// declaration order, mirroring what the consuming engine reconstructs
    /// from the written file.
    #[must_use]
    pub fn global_frames(&self) -> Vec<HomogeneousTransform> {
        let mut frames: Vec<HomogeneousTransform> = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            let local = segment
                .scs()
                .map_or_else(HomogeneousTransform::identity, SegmentCoordinateSystem::in_parent_frame);
            let global = match self.index_of(segment.parent_name()) {
                Some(parent_index) => frames[parent_index] * local,
                None => local,
            };
            frames.push(global);
        }
        frames
    }

    /// Global rest-pose positions of every marker, in declaration order.
    #[must_use]
    pub fn rest_pose_markers(&self) -> Vec<(String, Point3<f64>)> {
        let frames = self.global_frames();
        self.segments
            .iter()
            .zip(&frames)
            .flat_map(|(segment, frame)| {
                segment
                    .markers()
                    .iter()
                    .map(|marker| (marker.name().to_owned(), frame.transform_point(&marker.position())))
            })
            .collect()
    }

    /// Write the chain to a model file.
    ///
    /// The whole document is formatted in memory first, so a failure never
    /// leaves a partially written file behind.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Io`] if the file cannot be written.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let contents = self.to_string();
        debug!(
            path = %path.as_ref().display(),
            segments = self.segments.len(),
            "writing model file"
        );
        fs::write(path, contents)?;
        Ok(())
    }
}

impl fmt::Display for KinematicChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "version 4")?;
        writeln!(f)?;
        for segment in &self.segments {
            write!(f, "{segment}")?;
            writeln!(f, "\n\n")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::Marker;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    #[test]
    fn test_push_rejects_undeclared_parent() {
        let mut chain = KinematicChain::new();
        let result = chain.push(Segment::new("THIGH").with_parent("PELVIS"));
        assert!(matches!(result, Err(ModelError::UnknownParent { .. })));
    }

    #[test]
    fn test_push_accepts_declared_parent() {
        let mut chain = KinematicChain::new();
        chain.push(Segment::new("PELVIS")).unwrap();
        chain
            .push(Segment::new("THIGH").with_parent("PELVIS"))
            .unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.index_of("THIGH"), Some(1));
    }

    #[test]
    fn test_header_and_separators() {
        let mut chain = KinematicChain::new();
        chain.push(Segment::new("PELVIS")).unwrap();

        let text = chain.to_string();
        assert!(text.starts_with("version 4\n\n"));
        assert!(text.ends_with("endsegment\n\n\n\n"));
    }

    #[test]
    fn test_rest_pose_composes_local_frames() {
        let root_scs = SegmentCoordinateSystem::from_euler_and_translation(
            &[],
            "",
            Vector3::new(0.0, 0.0, 1.0),
            None,
        )
        .unwrap();
        let child_scs = SegmentCoordinateSystem::from_euler_and_translation(
            &[std::f64::consts::FRAC_PI_2],
            "z",
            Vector3::new(1.0, 0.0, 0.0),
            None,
        )
        .unwrap();

        let mut root = Segment::new("ROOT").with_scs(root_scs);
        root.add_marker(Marker::new("ROOT_MARKER", "ROOT", Point3::new(0.0, 0.0, 0.0)));
        let mut child = Segment::new("CHILD").with_parent("ROOT").with_scs(child_scs);
        child.add_marker(Marker::new("CHILD_MARKER", "CHILD", Point3::new(1.0, 0.0, 0.0)));

        let chain = KinematicChain::from_segments([root, child]).unwrap();
        let markers = chain.rest_pose_markers();

        assert_eq!(markers[0].0, "ROOT_MARKER");
        assert_relative_eq!(markers[0].1.z, 1.0, epsilon = 1e-12);

        // Child frame: translate (1, 0, 0) then rotate pi/2 about z, inside
        // the root frame at z = 1. The local (1, 0, 0) marker lands at
        // (1, 1, 1) globally.
        assert_eq!(markers[1].0, "CHILD_MARKER");
        assert_relative_eq!(markers[1].1.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(markers[1].1.y, 1.0, epsilon = 1e-12);
        assert_relative_eq!(markers[1].1.z, 1.0, epsilon = 1e-12);
    }
}
