//! Anthropometric regression of segment inertial parameters.
//!
//! Coefficients follow de Leva (1996), "Adjustments to
//! Zatsiorsky-Seluyanov's segment inertia parameters": per sex and segment,
//! a mass fraction of total body mass, a center-of-mass fraction of the
//! proximal-to-distal distance, and three radii of gyration (sagittal,
//! transverse, longitudinal) as fractions of segment length. Limb rows
//! cover both sides, hence the doubled mass fractions.
//!
//! The table works on an already-resolved model at rest pose (all joint
//! coordinates zero); it reaches the model only through the [`RestPose`]
//! capability, so any source of rest-pose marker positions fits.

use crate::chain::KinematicChain;
use crate::error::{ModelError, Result};
use crate::segment::Segment;
use nalgebra::{Point3, Vector3};
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Subject sex, selecting the regression column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Sex {
    Male,
    Female,
}

/// Which segment endpoint a center-of-mass offset is measured from.
///
/// Both anchorings are equivalent descriptions of the same point; which one
/// a consuming engine expects depends on where it anchors the segment
/// frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ComAnchor {
    /// Offset from the proximal marker: `f * (distal - proximal)`.
    Proximal,
    /// Offset from the distal marker: `(1 - f) * (proximal - distal)`.
    Distal,
}

/// One regression row: segment endpoints and inertial fractions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InertialParam {
    /// Name of the proximal endpoint marker.
    pub proximal: &'static str,
    /// Name of the distal endpoint marker.
    pub distal: &'static str,
    /// Fraction of total body mass.
    pub mass_fraction: f64,
    /// Center-of-mass position as a fraction of the proximal-to-distal
    /// distance.
    pub com_fraction: f64,
    /// Radii of gyration as fractions of segment length
    /// (sagittal, transverse, longitudinal).
    pub gyration_radii: [f64; 3],
}

const MALE: &[(&str, InertialParam)] = &[
    (
        "HEAD",
        InertialParam {
            proximal: "TOP_HEAD",
            distal: "SHOULDER",
            mass_fraction: 0.0694,
            com_fraction: 0.5002,
            gyration_radii: [0.303, 0.315, 0.261],
        },
    ),
    (
        "TRUNK",
        InertialParam {
            proximal: "SHOULDER",
            distal: "PELVIS",
            mass_fraction: 0.4346,
            com_fraction: 0.5138,
            gyration_radii: [0.328, 0.306, 0.169],
        },
    ),
    (
        "UPPER_ARM",
        InertialParam {
            proximal: "SHOULDER",
            distal: "ELBOW",
            mass_fraction: 0.0271 * 2.0,
            com_fraction: 0.5772,
            gyration_radii: [0.285, 0.269, 0.158],
        },
    ),
    (
        "LOWER_ARM",
        InertialParam {
            proximal: "ELBOW",
            distal: "WRIST",
            mass_fraction: 0.0162 * 2.0,
            com_fraction: 0.4574,
            gyration_radii: [0.276, 0.265, 0.121],
        },
    ),
    (
        "HAND",
        InertialParam {
            proximal: "WRIST",
            distal: "FINGER",
            mass_fraction: 0.0061 * 2.0,
            com_fraction: 0.7900,
            gyration_radii: [0.628, 0.513, 0.401],
        },
    ),
    (
        "THIGH",
        InertialParam {
            proximal: "PELVIS",
            distal: "KNEE",
            mass_fraction: 0.1416 * 2.0,
            com_fraction: 0.4095,
            gyration_radii: [0.329, 0.329, 0.149],
        },
    ),
    (
        "SHANK",
        InertialParam {
            proximal: "KNEE",
            distal: "ANKLE",
            mass_fraction: 0.0433 * 2.0,
            com_fraction: 0.4459,
            gyration_radii: [0.255, 0.249, 0.103],
        },
    ),
    (
        "FOOT",
        InertialParam {
            proximal: "ANKLE",
            distal: "TOE",
            mass_fraction: 0.0137 * 2.0,
            com_fraction: 0.4415,
            gyration_radii: [0.257, 0.245, 0.124],
        },
    ),
];

const FEMALE: &[(&str, InertialParam)] = &[
    (
        "HEAD",
        InertialParam {
            proximal: "TOP_HEAD",
            distal: "SHOULDER",
            mass_fraction: 0.0669,
            com_fraction: 0.4841,
            gyration_radii: [0.271, 0.295, 0.261],
        },
    ),
    (
        "TRUNK",
        InertialParam {
            proximal: "SHOULDER",
            distal: "PELVIS",
            mass_fraction: 0.4257,
            com_fraction: 0.4964,
            gyration_radii: [0.307, 0.292, 0.147],
        },
    ),
    (
        "UPPER_ARM",
        InertialParam {
            proximal: "SHOULDER",
            distal: "ELBOW",
            mass_fraction: 0.0255 * 2.0,
            com_fraction: 0.5754,
            gyration_radii: [0.278, 0.260, 0.148],
        },
    ),
    (
        "LOWER_ARM",
        InertialParam {
            proximal: "ELBOW",
            distal: "WRIST",
            mass_fraction: 0.0138 * 2.0,
            com_fraction: 0.4559,
            gyration_radii: [0.261, 0.257, 0.094],
        },
    ),
    (
        "HAND",
        InertialParam {
            proximal: "WRIST",
            distal: "FINGER",
            mass_fraction: 0.0056 * 2.0,
            com_fraction: 0.7474,
            gyration_radii: [0.531, 0.454, 0.335],
        },
    ),
    (
        "THIGH",
        InertialParam {
            proximal: "PELVIS",
            distal: "KNEE",
            mass_fraction: 0.1478 * 2.0,
            com_fraction: 0.3612,
            gyration_radii: [0.369, 0.364, 0.162],
        },
    ),
    (
        "SHANK",
        InertialParam {
            proximal: "KNEE",
            distal: "ANKLE",
            mass_fraction: 0.0481 * 2.0,
            com_fraction: 0.4416,
            gyration_radii: [0.271, 0.267, 0.093],
        },
    ),
    (
        "FOOT",
        InertialParam {
            proximal: "ANKLE",
            distal: "TOE",
            mass_fraction: 0.0129 * 2.0,
            com_fraction: 0.4014,
            gyration_radii: [0.299, 0.279, 0.124],
        },
    ),
];

/// Capability trait exposing a resolved model's rest-pose markers.
///
/// Implemented by [`KinematicChain`]; a model loaded by an external
/// dynamics engine can provide the same view.
pub trait RestPose {
    /// Marker names, in model order.
    fn marker_names(&self) -> Vec<String>;

    /// Global position of a marker at rest pose (all joint coordinates
    /// zero).
    fn marker_position(&self, name: &str) -> Option<Point3<f64>>;
}

impl RestPose for KinematicChain {
    fn marker_names(&self) -> Vec<String> {
        self.rest_pose_markers()
            .into_iter()
            .map(|(name, _)| name)
            .collect()
    }

    fn marker_position(&self, name: &str) -> Option<Point3<f64>> {
        self.rest_pose_markers()
            .into_iter()
            .find(|(marker_name, _)| marker_name == name)
            .map(|(_, position)| position)
    }
}

/// Sex-specific de Leva regression bound to one subject and one resolved
/// model.
#[derive(Debug, Clone)]
pub struct DeLevaTable {
    sex: Sex,
    total_mass: f64,
    rest_pose: BTreeMap<String, Point3<f64>>,
}

impl DeLevaTable {
    /// Capture the model's rest-pose marker positions for a subject of the
    /// given sex and total mass (kg).
    pub fn new(sex: Sex, total_mass: f64, model: &impl RestPose) -> Self {
        let rest_pose = model
            .marker_names()
            .into_iter()
            .filter_map(|name| model.marker_position(&name).map(|position| (name, position)))
            .collect();
        Self {
            sex,
            total_mass,
            rest_pose,
        }
    }

    /// The regression row for a segment name.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Configuration`] for a segment absent from the
    /// table — there is no computed fallback.
    pub fn param(&self, segment: &str) -> Result<&'static InertialParam> {
        let table = match self.sex {
            Sex::Male => MALE,
            Sex::Female => FEMALE,
        };
        table
            .iter()
            .find(|(name, _)| *name == segment)
            .map(|(_, param)| param)
            .ok_or_else(|| {
                ModelError::configuration(format!(
                    "segment '{segment}' has no anthropometric table entry"
                ))
            })
    }

    /// Segment mass: mass fraction times total body mass.
    ///
    /// # Errors
    ///
    /// Fails for a segment absent from the table.
    pub fn segment_mass(&self, segment: &str) -> Result<f64> {
        Ok(self.param(segment)?.mass_fraction * self.total_mass)
    }

    /// Euclidean distance between the segment's endpoint markers at rest
    /// pose.
    ///
    /// # Errors
    ///
    /// Fails for a segment absent from the table or an endpoint marker
    /// absent from the model ([`ModelError::UnknownMarker`]).
    pub fn segment_length(&self, segment: &str) -> Result<f64> {
        let param = self.param(segment)?;
        let proximal = self.endpoint(param.proximal)?;
        let distal = self.endpoint(param.distal)?;
        Ok((distal - proximal).norm())
    }

    /// Center-of-mass offset from the chosen endpoint marker.
    ///
    /// # Errors
    ///
    /// Fails for a segment absent from the table or an endpoint marker
    /// absent from the model.
    pub fn segment_center_of_mass(
        &self,
        segment: &str,
        anchor: ComAnchor,
    ) -> Result<Vector3<f64>> {
        let param = self.param(segment)?;
        let proximal = self.endpoint(param.proximal)?;
        let distal = self.endpoint(param.distal)?;
        Ok(match anchor {
            ComAnchor::Proximal => param.com_fraction * (distal - proximal),
            ComAnchor::Distal => (1.0 - param.com_fraction) * (proximal - distal),
        })
    }

    /// Principal moments of inertia about the segment's own axes:
    /// `mass * (length * r_i)^2` per radius of gyration. Cross terms are
    /// zero (diagonal tensor in the segment frame).
    ///
    /// # Errors
    ///
    /// Fails for a segment absent from the table or an endpoint marker
    /// absent from the model.
    pub fn segment_moment_of_inertia(&self, segment: &str) -> Result<[f64; 3]> {
        let mass = self.segment_mass(segment)?;
        let length = self.segment_length(segment)?;
        let radii = self.param(segment)?.gyration_radii;
        Ok([
            mass * (length * radii[0]).powi(2),
            mass * (length * radii[1]).powi(2),
            mass * (length * radii[2]).powi(2),
        ])
    }

    /// Merge mass, center of mass and inertia into a segment before
    /// serialization.
    ///
    /// # Errors
    ///
    /// Fails for a table segment absent from the regression or endpoint
    /// markers absent from the model.
    pub fn apply(
        &self,
        table_segment: &str,
        segment: &mut Segment,
        anchor: ComAnchor,
    ) -> Result<()> {
        let com = self.segment_center_of_mass(table_segment, anchor)?;
        segment.set_mass(self.segment_mass(table_segment)?);
        segment.set_center_of_mass([com.x, com.y, com.z]);
        segment.set_inertia(self.segment_moment_of_inertia(table_segment)?);
        Ok(())
    }

    fn endpoint(&self, name: &str) -> Result<Point3<f64>> {
        self.rest_pose
            .get(name)
            .copied()
            .ok_or_else(|| ModelError::unknown_marker(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    struct FixedMarkers(Vec<(String, Point3<f64>)>);

    impl RestPose for FixedMarkers {
        fn marker_names(&self) -> Vec<String> {
            self.0.iter().map(|(name, _)| name.clone()).collect()
        }

        fn marker_position(&self, name: &str) -> Option<Point3<f64>> {
            self.0
                .iter()
                .find(|(marker_name, _)| marker_name == name)
                .map(|(_, position)| *position)
        }
    }

    fn leg_markers(scale: f64) -> FixedMarkers {
        FixedMarkers(vec![
            ("PELVIS".to_owned(), Point3::new(0.0, 0.0, scale)),
            ("KNEE".to_owned(), Point3::new(0.0, 0.0, scale * 0.5)),
        ])
    }

    #[test]
    fn test_mass_is_linear_in_total_mass() {
        let markers = leg_markers(1.0);
        let light = DeLevaTable::new(Sex::Male, 60.0, &markers);
        let heavy = DeLevaTable::new(Sex::Male, 120.0, &markers);

        let light_mass = light.segment_mass("THIGH").unwrap();
        let heavy_mass = heavy.segment_mass("THIGH").unwrap();
        assert_relative_eq!(heavy_mass, 2.0 * light_mass, epsilon = 1e-12);
        assert_relative_eq!(light_mass, 0.2832 * 60.0, epsilon = 1e-12);
    }

    #[test]
    fn test_inertia_scales_with_length_squared() {
        let short = DeLevaTable::new(Sex::Female, 70.0, &leg_markers(1.0));
        let long = DeLevaTable::new(Sex::Female, 70.0, &leg_markers(2.0));

        let short_inertia = short.segment_moment_of_inertia("THIGH").unwrap();
        let long_inertia = long.segment_moment_of_inertia("THIGH").unwrap();
        for i in 0..3 {
            assert_relative_eq!(long_inertia[i], 4.0 * short_inertia[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_com_anchorings_describe_the_same_point() {
        let table = DeLevaTable::new(Sex::Male, 80.0, &leg_markers(1.0));
        let proximal_marker = Point3::new(0.0, 0.0, 1.0);
        let distal_marker = Point3::new(0.0, 0.0, 0.5);

        let from_proximal = table
            .segment_center_of_mass("THIGH", ComAnchor::Proximal)
            .unwrap();
        let from_distal = table
            .segment_center_of_mass("THIGH", ComAnchor::Distal)
            .unwrap();

        let com_a = proximal_marker + from_proximal;
        let com_b = distal_marker + from_distal;
        assert_relative_eq!(com_a.z, com_b.z, epsilon = 1e-12);
    }

    #[test]
    fn test_unknown_segment_is_a_configuration_error() {
        let table = DeLevaTable::new(Sex::Male, 80.0, &leg_markers(1.0));
        assert!(matches!(
            table.segment_mass("TAIL"),
            Err(ModelError::Configuration(_))
        ));
    }

    #[test]
    fn test_missing_endpoint_marker() {
        let table = DeLevaTable::new(Sex::Male, 80.0, &leg_markers(1.0));
        // SHANK needs KNEE and ANKLE; ANKLE is absent from the model.
        assert!(matches!(
            table.segment_length("SHANK"),
            Err(ModelError::UnknownMarker(_))
        ));
    }

    #[test]
    fn test_apply_merges_into_segment() {
        let table = DeLevaTable::new(Sex::Male, 80.0, &leg_markers(1.0));
        let mut segment = Segment::new("THIGH");
        table
            .apply("THIGH", &mut segment, ComAnchor::Proximal)
            .unwrap();

        assert_relative_eq!(segment.mass(), 0.2832 * 80.0, epsilon = 1e-12);
        assert!(segment.inertia().iter().all(|&i| i > 0.0));
        // COM points from PELVIS toward KNEE (negative z here).
        assert!(segment.center_of_mass()[2] < 0.0);
    }
}
