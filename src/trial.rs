//! Motion-capture trial access.
//!
//! The actual file reader (C3D or otherwise) is an external collaborator;
//! the pipeline only depends on the [`TrialSource`] capability, which
//! exposes ordered point labels, the recording unit and raw per-frame
//! samples. Absent samples are NaN. A concrete in-memory [`StaticTrial`]
//! ships with the crate for tests and for adapting any reader.

use crate::error::{ModelError, Result};
use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The length unit a trial was recorded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LengthUnit {
    /// Positions are already in meters.
    #[default]
    Meter,
    /// Positions are in millimeters and divided by 1000 on resolution.
    Millimeter,
}

impl LengthUnit {
    /// Parse a unit tag as found in capture files (`"mm"` means
    /// millimeters, anything else meters).
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        if tag == "mm" {
            Self::Millimeter
        } else {
            Self::Meter
        }
    }

    /// The divisor converting recorded values to meters.
    #[must_use]
    pub const fn meter_divisor(self) -> f64 {
        match self {
            Self::Meter => 1.0,
            Self::Millimeter => 1000.0,
        }
    }
}

/// Capability trait giving the pipeline access to one recorded trial.
pub trait TrialSource {
    /// Ordered point labels.
    fn labels(&self) -> &[String];

    /// The unit positions were recorded in.
    fn unit(&self) -> LengthUnit;

    /// Number of recorded frames.
    fn frame_count(&self) -> usize;

    /// Raw recorded position of a marker at a frame, in the trial's unit.
    /// Absent samples have NaN components.
    fn position(&self, marker_index: usize, frame: usize) -> Point3<f64>;

    /// Column index of a label.
    fn label_index(&self, name: &str) -> Option<usize> {
        self.labels().iter().position(|label| label == name)
    }

    /// Mean position of the named markers, in meters.
    ///
    /// For each name, valid (non-NaN) samples are averaged over frames in
    /// ascending frame order; the per-marker means are then averaged in the
    /// given name order. This single canonical reduction order keeps the
    /// result reproducible. The unit conversion happens after averaging.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MissingMarkers`] naming every requested marker
    /// that is absent from the trial or NaN for all frames, and
    /// [`ModelError::Configuration`] for an empty name list.
    fn mean_marker_position(&self, names: &[String]) -> Result<Point3<f64>> {
        if names.is_empty() {
            return Err(ModelError::configuration(
                "at least one marker name is required",
            ));
        }

        let mut missing: Vec<String> = Vec::new();
        let mut sum = Vector3::zeros();
        for name in names {
            let Some(index) = self.label_index(name) else {
                missing.push(name.clone());
                continue;
            };

            let mut marker_sum = Vector3::zeros();
            let mut samples = 0_usize;
            for frame in 0..self.frame_count() {
                let position = self.position(index, frame);
                if position.coords.iter().all(|c| c.is_finite()) {
                    marker_sum += position.coords;
                    samples += 1;
                }
            }
            if samples == 0 {
                missing.push(name.clone());
            } else {
                sum += marker_sum / samples as f64;
            }
        }

        if !missing.is_empty() {
            return Err(ModelError::missing_markers(missing));
        }

        let mean = sum / names.len() as f64;
        Ok(Point3::from(mean / self.unit().meter_divisor()))
    }
}

/// An in-memory trial with marker-major sample storage.
#[derive(Debug, Clone)]
pub struct StaticTrial {
    labels: Vec<String>,
    unit: LengthUnit,
    frame_count: usize,
    samples: Vec<Point3<f64>>,
}

impl StaticTrial {
    /// Create a trial from marker-major samples
    /// (`samples[marker * frame_count + frame]`).
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Configuration`] if the sample count does not
    /// equal `labels.len() * frame_count`.
    pub fn new(
        labels: Vec<String>,
        unit: LengthUnit,
        frame_count: usize,
        samples: Vec<Point3<f64>>,
    ) -> Result<Self> {
        if samples.len() != labels.len() * frame_count {
            return Err(ModelError::configuration(format!(
                "expected {} samples ({} labels x {} frames), got {}",
                labels.len() * frame_count,
                labels.len(),
                frame_count,
                samples.len()
            )));
        }
        Ok(Self {
            labels,
            unit,
            frame_count,
            samples,
        })
    }

    /// Create a single-frame trial, one position per label.
    pub fn from_single_frame<S, I>(points: I, unit: LengthUnit) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, Point3<f64>)>,
    {
        let (labels, samples): (Vec<String>, Vec<Point3<f64>>) = points
            .into_iter()
            .map(|(name, position)| (name.into(), position))
            .unzip();
        Self {
            labels,
            unit,
            frame_count: 1,
            samples,
        }
    }
}

impl TrialSource for StaticTrial {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn unit(&self) -> LengthUnit {
        self.unit
    }

    fn frame_count(&self) -> usize {
        self.frame_count
    }

    fn position(&self, marker_index: usize, frame: usize) -> Point3<f64> {
        self.samples[marker_index * self.frame_count + frame]
    }
}
