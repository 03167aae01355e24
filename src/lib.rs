//! Subject-specific rigid-body kinematic model generation.
//!
//! This library turns a generic anatomical template plus one recorded
//! static motion-capture trial into a personalized rigid-body model
//! description for a downstream dynamics engine. It is an offline,
//! once-per-subject pipeline:
//!
//! 1. **Describe** the model symbolically: segments, their parent
//!    relations, frame recipes (an origin marker and two marker-defined
//!    axes) and marker recipes, all by trial marker *names*.
//! 2. **Collapse** the template against a trial: virtual markers are
//!    averaged from named samples, orthonormal right-handed frames are
//!    built from the axis recipes, and a parent-relative kinematic chain is
//!    assembled in declaration order.
//! 3. **Estimate** segment mass, center of mass and inertia from the
//!    de Leva (1996) anthropometric regression, and merge them in.
//! 4. **Serialize** the chain to the textual model-file grammar consumed by
//!    the dynamics engine.
//!
//! # Quick start
//!
//! ```
//! use mocap_model::{
//!     LengthUnit, MarkerTemplate, ModelTemplate, PointRecipe, SegmentTemplate, StaticTrial,
//! };
//! use nalgebra::Point3;
//!
//! let mut template = ModelTemplate::new();
//! template.add_segment(
//!     SegmentTemplate::new("PELVIS")
//!         .with_translations("xyz")
//!         .with_rotations("xyz"),
//! );
//! template.add_marker(
//!     "PELVIS",
//!     MarkerTemplate::new("PELVIS_MARKER", "PELVIS", PointRecipe::marker("PELVIS_MARKER")),
//! )?;
//!
//! let trial = StaticTrial::from_single_frame(
//!     [("PELVIS_MARKER", Point3::new(0.1, 0.2, 0.3))],
//!     LengthUnit::Meter,
//! );
//!
//! let chain = template.personalize(&trial)?;
//! assert_eq!(chain.len(), 1);
//! assert!(chain.to_string().starts_with("version 4"));
//! # Ok::<(), mocap_model::ModelError>(())
//! ```
//!
//! # Failure model
//!
//! Generation is all-or-nothing: the first resolution failure (missing
//! marker, undeclared parent, degenerate axis geometry) aborts assembly and
//! nothing is written. Given the same trial and template, the output is
//! fully deterministic.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_precision_loss)]

pub mod anthropometry;
pub mod assembler;
pub mod axis;
pub mod chain;
pub mod error;
pub mod marker;
pub mod math;
pub mod scs;
pub mod segment;
pub mod template;
pub mod trial;

// Re-exports for convenient access
pub use anthropometry::{ComAnchor, DeLevaTable, InertialParam, RestPose, Sex};
pub use assembler::assemble;
pub use axis::{Axis, AxisName};
pub use chain::KinematicChain;
pub use error::{ModelError, Result};
pub use marker::Marker;
pub use math::HomogeneousTransform;
pub use scs::SegmentCoordinateSystem;
pub use segment::Segment;
pub use template::{
    AxisTemplate, FrameTemplate, MarkerTemplate, ModelTemplate, PointRecipe, SegmentTemplate,
};
pub use trial::{LengthUnit, StaticTrial, TrialSource};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn leg_template() -> ModelTemplate {
        let mut template = ModelTemplate::new();
        template.add_segment(
            SegmentTemplate::new("PELVIS")
                .with_translations("xyz")
                .with_rotations("xyz"),
        );
        template
            .add_marker(
                "PELVIS",
                MarkerTemplate::new("PELVIS", "PELVIS", PointRecipe::marker("PELVIS")),
            )
            .unwrap();

        template.add_segment(
            SegmentTemplate::new("THIGH")
                .with_parent("PELVIS")
                .with_rotations("xyz")
                .with_frame(FrameTemplate::new(
                    PointRecipe::marker("PELVIS"),
                    AxisTemplate::new(
                        AxisName::Z,
                        PointRecipe::markers(["KNEE_MED", "KNEE_LAT"]),
                        PointRecipe::marker("PELVIS"),
                    ),
                    AxisTemplate::new(
                        AxisName::X,
                        PointRecipe::marker("KNEE_MED"),
                        PointRecipe::marker("KNEE_LAT"),
                    ),
                    AxisName::Z,
                )),
        );
        template
            .add_marker(
                "THIGH",
                MarkerTemplate::new("KNEE", "THIGH", PointRecipe::markers(["KNEE_MED", "KNEE_LAT"])),
            )
            .unwrap();
        template
    }

    fn static_trial() -> StaticTrial {
        StaticTrial::from_single_frame(
            [
                ("PELVIS", Point3::new(0.0, 0.0, 1.0)),
                ("KNEE_MED", Point3::new(-0.05, 0.02, 0.55)),
                ("KNEE_LAT", Point3::new(0.05, 0.01, 0.54)),
            ],
            LengthUnit::Meter,
        )
    }

    #[test]
    fn test_full_pipeline() {
        let template = leg_template();
        let trial = static_trial();

        let mut chain = template.personalize(&trial).unwrap();
        assert_eq!(chain.len(), 2);

        // Every resolved frame must be orthonormal.
        for segment in chain.segments() {
            let scs = segment.scs().unwrap();
            assert!(scs.transform().rotation_is_orthonormal(1e-10));
        }

        // Merge anthropometric estimates into the thigh and serialize.
        let table = DeLevaTable::new(Sex::Male, 80.0, &chain);
        let thigh = chain.segment_mut("THIGH").unwrap();
        table.apply("THIGH", thigh, ComAnchor::Proximal).unwrap();
        assert!(chain.segment("THIGH").unwrap().mass() > 0.0);

        let text = chain.to_string();
        assert!(text.starts_with("version 4\n\n"));
        assert!(text.contains("segment PELVIS\n"));
        assert!(text.contains("segment THIGH\n\tparent PELVIS\n"));
        assert!(text.contains("marker KNEE\n"));
    }

    #[test]
    fn test_version_constant() {
        assert!(!VERSION.is_empty());
    }
}
