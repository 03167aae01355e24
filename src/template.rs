//! The symbolic model template layer.
//!
//! Templates describe markers, axes, frames and segments by marker *names*
//! and combination recipes instead of numeric values. They carry no
//! transform; each one is a recipe that produces its concrete counterpart
//! when bound against a trial — so one model definition can be collapsed
//! against any number of subjects.

use crate::axis::{Axis, AxisName};
use crate::error::{ModelError, Result};
use crate::marker::Marker;
use crate::scs::SegmentCoordinateSystem;
use crate::trial::TrialSource;
use nalgebra::Point3;
use std::rc::Rc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Recipe producing a 3D point from a trial.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PointRecipe {
    /// A fixed global position.
    Literal([f64; 3]),
    /// The mean of one or more named trial markers (several names make a
    /// virtual marker).
    MarkerMean(Vec<String>),
}

impl PointRecipe {
    /// Recipe reading a single named marker.
    #[must_use]
    pub fn marker(name: impl Into<String>) -> Self {
        Self::MarkerMean(vec![name.into()])
    }

    /// Recipe averaging several named markers into a virtual marker.
    #[must_use]
    pub fn markers<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::MarkerMean(names.into_iter().map(Into::into).collect())
    }

    /// Recipe holding a fixed global position.
    #[must_use]
    pub const fn literal(x: f64, y: f64, z: f64) -> Self {
        Self::Literal([x, y, z])
    }

    /// Resolve the recipe against a trial.
    ///
    /// The point is resolved in the global frame and, when a parent frame
    /// is supplied, re-expressed in that frame.
    ///
    /// # Errors
    ///
    /// Propagates [`ModelError::MissingMarkers`] from marker resolution.
    pub fn bind(
        &self,
        trial: &impl TrialSource,
        parent_frame: Option<&SegmentCoordinateSystem>,
    ) -> Result<Point3<f64>> {
        let global = match self {
            Self::Literal([x, y, z]) => Point3::new(*x, *y, *z),
            Self::MarkerMean(names) => trial.mean_marker_position(names)?,
        };
        Ok(match parent_frame {
            Some(parent) => parent.transpose().transform_point(&global),
            None => global,
        })
    }
}

/// Symbolic counterpart of [`Marker`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MarkerTemplate {
    name: String,
    parent_name: String,
    recipe: PointRecipe,
    is_technical: bool,
    is_anatomical: bool,
}

impl MarkerTemplate {
    /// Create a marker template. Flags default to technical and not
    /// anatomical.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        parent_name: impl Into<String>,
        recipe: PointRecipe,
    ) -> Self {
        Self {
            name: name.into(),
            parent_name: parent_name.into(),
            recipe,
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

    /// Bind against a trial, expressing the position in `parent_frame` when
    /// one is supplied.
    ///
    /// # Errors
    ///
    /// Propagates resolution failures from the recipe.
    pub fn bind(
        &self,
        trial: &impl TrialSource,
        parent_frame: Option<&SegmentCoordinateSystem>,
    ) -> Result<Marker> {
        let position = self.recipe.bind(trial, parent_frame)?;
        Ok(Marker::new(&self.name, &self.parent_name, position)
            .with_flags(self.is_technical, self.is_anatomical))
    }
}

/// Symbolic counterpart of [`Axis`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AxisTemplate {
    name: AxisName,
    start: PointRecipe,
    end: PointRecipe,
}

impl AxisTemplate {
    /// Create an axis template from start/end point recipes.
    #[must_use]
    pub const fn new(name: AxisName, start: PointRecipe, end: PointRecipe) -> Self {
        Self { name, start, end }
    }

    /// The intended axis name.
    #[must_use]
    pub const fn name(&self) -> AxisName {
        self.name
    }

    /// Bind both endpoints against a trial, in the global frame.
    ///
    /// # Errors
    ///
    /// Propagates resolution failures from the endpoint recipes.
    pub fn bind(&self, trial: &impl TrialSource) -> Result<Axis> {
        let start = Marker::new("", "", self.start.bind(trial, None)?);
        let end = Marker::new("", "", self.end.bind(trial, None)?);
        Ok(Axis::new(self.name, start, end))
    }
}

/// Symbolic counterpart of [`SegmentCoordinateSystem`]: an origin recipe,
/// two axis templates and the name of the axis to trust exactly.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrameTemplate {
    origin: PointRecipe,
    first_axis: AxisTemplate,
    second_axis: AxisTemplate,
    axis_to_keep: AxisName,
}

impl FrameTemplate {
    /// Create a frame template.
    #[must_use]
    pub const fn new(
        origin: PointRecipe,
        first_axis: AxisTemplate,
        second_axis: AxisTemplate,
        axis_to_keep: AxisName,
    ) -> Self {
        Self {
            origin,
            first_axis,
            second_axis,
            axis_to_keep,
        }
    }

    /// Collapse to a concrete frame: resolve origin and axes in the global
    /// frame, then construct the orthonormal frame with the given parent.
    ///
    /// # Errors
    ///
    /// Propagates resolution failures and the construction errors of
    /// [`SegmentCoordinateSystem::from_markers`].
    pub fn bind(
        &self,
        trial: &impl TrialSource,
        parent: Option<Rc<SegmentCoordinateSystem>>,
    ) -> Result<SegmentCoordinateSystem> {
        let origin = Marker::new("", "", self.origin.bind(trial, None)?);
        let first = self.first_axis.bind(trial)?;
        let second = self.second_axis.bind(trial)?;
        SegmentCoordinateSystem::from_markers(&origin, &first, &second, self.axis_to_keep, parent)
    }
}

/// Symbolic counterpart of [`crate::Segment`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SegmentTemplate {
    name: String,
    parent_name: String,
    translations: String,
    rotations: String,
    frame: Option<FrameTemplate>,
    markers: Vec<MarkerTemplate>,
}

impl SegmentTemplate {
    /// Create a segment template with no parent, DOFs, frame or markers.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent_name: String::new(),
            translations: String::new(),
            rotations: String::new(),
            frame: None,
            markers: Vec::new(),
        }
    }

    /// Set the parent segment name.
    #[must_use]
    pub fn with_parent(mut self, parent_name: impl Into<String>) -> Self {
        self.parent_name = parent_name.into();
        self
    }

    /// Set the translation degrees-of-freedom specifier.
    #[must_use]
    pub fn with_translations(mut self, translations: impl Into<String>) -> Self {
        self.translations = translations.into();
        self
    }

    /// Set the rotation degrees-of-freedom specifier.
    #[must_use]
    pub fn with_rotations(mut self, rotations: impl Into<String>) -> Self {
        self.rotations = rotations.into();
        self
    }

    /// Set the frame recipe.
    #[must_use]
    pub fn with_frame(mut self, frame: FrameTemplate) -> Self {
        self.frame = Some(frame);
        self
    }

    /// Define (or replace) the frame recipe.
    pub fn set_frame(&mut self, frame: FrameTemplate) {
        self.frame = Some(frame);
    }

    /// Append a marker template.
    pub fn add_marker(&mut self, marker: MarkerTemplate) {
        self.markers.push(marker);
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

    /// The translation DOF specifier.
    #[must_use]
    pub fn translations(&self) -> &str {
        &self.translations
    }

    /// The rotation DOF specifier.
    #[must_use]
    pub fn rotations(&self) -> &str {
        &self.rotations
    }

    /// The frame recipe, if any.
    #[must_use]
    pub const fn frame(&self) -> Option<&FrameTemplate> {
        self.frame.as_ref()
    }

    /// The marker templates, in declaration order.
    #[must_use]
    pub fn markers(&self) -> &[MarkerTemplate] {
        &self.markers
    }
}

/// A whole symbolic model: segment templates in declaration order.
///
/// Declaration order doubles as resolution order, so parents must be added
/// before their children.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ModelTemplate {
    segments: Vec<SegmentTemplate>,
}

impl ModelTemplate {
    /// Create an empty model template.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a segment template. Re-adding an existing name replaces the
    /// definition in place, keeping its declaration position.
    pub fn add_segment(&mut self, segment: SegmentTemplate) {
        match self.segments.iter_mut().find(|s| s.name == segment.name) {
            Some(existing) => *existing = segment,
            None => self.segments.push(segment),
        }
    }

    /// Define the frame recipe of an already-declared segment.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Configuration`] for an unknown segment name.
    pub fn set_frame(&mut self, segment_name: &str, frame: FrameTemplate) -> Result<()> {
        self.segment_template_mut(segment_name)?.set_frame(frame);
        Ok(())
    }

    /// Attach a marker template to an already-declared segment.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Configuration`] for an unknown segment name.
    pub fn add_marker(&mut self, segment_name: &str, marker: MarkerTemplate) -> Result<()> {
        self.segment_template_mut(segment_name)?.add_marker(marker);
        Ok(())
    }

    /// The segment templates in declaration order.
    #[must_use]
    pub fn segments(&self) -> &[SegmentTemplate] {
        &self.segments
    }

    /// Collapse the template against a trial into a concrete chain.
    ///
    /// # Errors
    ///
    /// Propagates every binding and assembly failure; no partial chain is
    /// returned.
    pub fn personalize(&self, trial: &impl TrialSource) -> Result<crate::chain::KinematicChain> {
        crate::assembler::assemble(self, trial)
    }

    /// Collapse against a trial and write the model file.
    ///
    /// Serialization only starts after the whole chain assembled, so a
    /// binding failure never produces a file.
    ///
    /// # Errors
    ///
    /// Propagates assembly failures and [`ModelError::Io`] from the write.
    pub fn generate(
        &self,
        trial: &impl TrialSource,
        path: impl AsRef<std::path::Path>,
    ) -> Result<()> {
        self.personalize(trial)?.write(path)
    }

    fn segment_template_mut(&mut self, name: &str) -> Result<&mut SegmentTemplate> {
        self.segments
            .iter_mut()
            .find(|s| s.name == name)
            .ok_or_else(|| {
                ModelError::configuration(format!("segment '{name}' has not been declared"))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trial::{LengthUnit, StaticTrial};
    use approx::assert_relative_eq;

    fn trial() -> StaticTrial {
        StaticTrial::from_single_frame(
            [
                ("HIP", Point3::new(0.5, 0.0, 1.0)),
                ("KNEE_MED", Point3::new(0.4, 0.0, 0.5)),
                ("KNEE_LAT", Point3::new(0.6, 0.0, 0.5)),
            ],
            LengthUnit::Meter,
        )
    }

    #[test]
    fn test_point_recipe_virtual_marker() {
        let recipe = PointRecipe::markers(["KNEE_MED", "KNEE_LAT"]);
        let point = recipe.bind(&trial(), None).unwrap();
        assert_relative_eq!(point.x, 0.5);
        assert_relative_eq!(point.z, 0.5);
    }

    #[test]
    fn test_point_recipe_reexpresses_in_parent_frame() {
        let parent = SegmentCoordinateSystem::from_euler_and_translation(
            &[],
            "",
            nalgebra::Vector3::new(0.5, 0.0, 1.0),
            None,
        )
        .unwrap();

        let recipe = PointRecipe::marker("HIP");
        let point = recipe.bind(&trial(), Some(&parent)).unwrap();
        assert_relative_eq!(point.x, 0.0);
        assert_relative_eq!(point.y, 0.0);
        assert_relative_eq!(point.z, 0.0);
    }

    #[test]
    fn test_marker_template_bind() {
        let template = MarkerTemplate::new("KNEE", "THIGH", PointRecipe::markers(["KNEE_MED", "KNEE_LAT"]))
            .with_flags(false, true);
        let marker = template.bind(&trial(), None).unwrap();

        assert_eq!(marker.name(), "KNEE");
        assert_eq!(marker.parent_name(), "THIGH");
        assert!(!marker.is_technical());
        assert!(marker.is_anatomical());
        assert_relative_eq!(marker.position().x, 0.5);
    }

    #[test]
    fn test_add_segment_replaces_in_place() {
        let mut model = ModelTemplate::new();
        model.add_segment(SegmentTemplate::new("PELVIS"));
        model.add_segment(SegmentTemplate::new("THIGH").with_parent("PELVIS"));
        model.add_segment(SegmentTemplate::new("PELVIS").with_rotations("xyz"));

        assert_eq!(model.segments().len(), 2);
        assert_eq!(model.segments()[0].name(), "PELVIS");
        assert_eq!(model.segments()[0].rotations(), "xyz");
    }

    #[test]
    fn test_mutators_reject_unknown_segment() {
        let mut model = ModelTemplate::new();
        let result = model.add_marker(
            "PELVIS",
            MarkerTemplate::new("M", "PELVIS", PointRecipe::marker("M")),
        );
        assert!(matches!(result, Err(ModelError::Configuration(_))));
    }
}
