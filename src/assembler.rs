//! Collapsing a symbolic model template into a concrete kinematic chain.
//!
//! Segments are processed strictly in declaration order; a parent must have
//! been assembled before any of its children. Any resolution failure aborts
//! the whole assembly — no partial chain is ever returned.

use crate::chain::KinematicChain;
use crate::error::{ModelError, Result};
use crate::scs::SegmentCoordinateSystem;
use crate::segment::Segment;
use crate::template::ModelTemplate;
use crate::trial::TrialSource;
use std::rc::Rc;
use tracing::debug;

/// Collapse `template` against `trial` into a concrete [`KinematicChain`].
///
/// For each segment template, in declaration order:
/// 1. resolve the parent among the already-assembled segments;
/// 2. bind the frame recipe with the parent's frame (identity when the
///    template has none);
/// 3. construct the concrete segment with zero inertial data;
/// 4. bind each marker template into the segment's own frame.
///
/// # Errors
///
/// - [`ModelError::UnknownParent`] when a segment names a parent that was
///   not declared before it.
/// - Any binding error ([`ModelError::MissingMarkers`],
///   [`ModelError::Configuration`], [`ModelError::DegenerateGeometry`])
///   from frame or marker resolution.
pub fn assemble(template: &ModelTemplate, trial: &impl TrialSource) -> Result<KinematicChain> {
    let mut frames: Vec<Rc<SegmentCoordinateSystem>> =
        Vec::with_capacity(template.segments().len());
    let mut chain = KinematicChain::new();

    for segment_template in template.segments() {
        let parent_frame = if segment_template.parent_name().is_empty() {
            None
        } else {
            let index = chain.index_of(segment_template.parent_name()).ok_or_else(|| {
                ModelError::unknown_parent(
                    segment_template.name(),
                    segment_template.parent_name(),
                )
            })?;
            Some(Rc::clone(&frames[index]))
        };

        let scs = match segment_template.frame() {
            Some(frame) => Rc::new(frame.bind(trial, parent_frame)?),
            None => Rc::new(SegmentCoordinateSystem::default()),
        };

        let mut segment = Segment::new(segment_template.name())
            .with_parent(segment_template.parent_name())
            .with_translations(segment_template.translations())
            .with_rotations(segment_template.rotations())
            .with_scs((*scs).clone());

        for marker_template in segment_template.markers() {
            segment.add_marker(marker_template.bind(trial, Some(&*scs))?);
        }

        debug!(
            segment = %segment_template.name(),
            markers = segment_template.markers().len(),
            "assembled segment"
        );

        frames.push(scs);
        chain.push(segment)?;
    }

    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::AxisName;
    use crate::template::{AxisTemplate, FrameTemplate, MarkerTemplate, PointRecipe, SegmentTemplate};
    use crate::trial::{LengthUnit, StaticTrial};
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    fn trial() -> StaticTrial {
        StaticTrial::from_single_frame(
            [
                ("PELVIS_MARKER", Point3::new(0.1, 0.2, 0.3)),
                ("HIP", Point3::new(0.5, 0.0, 1.0)),
                ("THIGH_X", Point3::new(1.5, 0.0, 1.0)),
                ("THIGH_Y", Point3::new(0.5, 1.0, 1.0)),
            ],
            LengthUnit::Meter,
        )
    }

    fn thigh_frame() -> FrameTemplate {
        FrameTemplate::new(
            PointRecipe::marker("HIP"),
            AxisTemplate::new(
                AxisName::X,
                PointRecipe::marker("HIP"),
                PointRecipe::marker("THIGH_X"),
            ),
            AxisTemplate::new(
                AxisName::Y,
                PointRecipe::marker("HIP"),
                PointRecipe::marker("THIGH_Y"),
            ),
            AxisName::X,
        )
    }

    fn two_segment_template() -> ModelTemplate {
        let mut model = ModelTemplate::new();
        model.add_segment(
            SegmentTemplate::new("PELVIS")
                .with_translations("xyz")
                .with_rotations("xyz"),
        );
        model
            .add_marker(
                "PELVIS",
                MarkerTemplate::new("PELVIS_MARKER", "PELVIS", PointRecipe::marker("PELVIS_MARKER")),
            )
            .unwrap();
        model.add_segment(
            SegmentTemplate::new("THIGH")
                .with_parent("PELVIS")
                .with_rotations("xyz")
                .with_frame(thigh_frame()),
        );
        model
            .add_marker(
                "THIGH",
                MarkerTemplate::new("KNEE", "THIGH", PointRecipe::marker("THIGH_X")),
            )
            .unwrap();
        model
    }

    #[test]
    fn test_assembles_in_declaration_order() {
        let chain = assemble(&two_segment_template(), &trial()).unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.segments()[0].name(), "PELVIS");
        assert_eq!(chain.segments()[1].name(), "THIGH");
    }

    #[test]
    fn test_markers_are_bound_in_segment_frame() {
        let chain = assemble(&two_segment_template(), &trial()).unwrap();

        // PELVIS has an identity frame, so its marker keeps the global
        // position.
        let pelvis_marker = &chain.segments()[0].markers()[0];
        assert_relative_eq!(pelvis_marker.position().x, 0.1);

        // THIGH's frame sits at HIP with an identity rotation, so THIGH_X
        // lands one meter along local x.
        let knee = &chain.segments()[1].markers()[0];
        assert_relative_eq!(knee.position().x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(knee.position().y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(knee.position().z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_forward_reference_fails() {
        let mut model = ModelTemplate::new();
        model.add_segment(SegmentTemplate::new("THIGH").with_parent("PELVIS"));
        model.add_segment(SegmentTemplate::new("PELVIS"));

        let result = assemble(&model, &trial());
        assert!(matches!(result, Err(ModelError::UnknownParent { .. })));
    }

    #[test]
    fn test_reordered_declaration_succeeds() {
        let mut model = ModelTemplate::new();
        model.add_segment(SegmentTemplate::new("PELVIS"));
        model.add_segment(SegmentTemplate::new("THIGH").with_parent("PELVIS"));

        assert!(assemble(&model, &trial()).is_ok());
    }

    #[test]
    fn test_missing_marker_aborts_assembly() {
        let mut model = two_segment_template();
        model
            .add_marker(
                "THIGH",
                MarkerTemplate::new("GHOST", "THIGH", PointRecipe::marker("NO_SUCH_LABEL")),
            )
            .unwrap();

        let result = assemble(&model, &trial());
        assert!(matches!(result, Err(ModelError::MissingMarkers { .. })));
    }
}
