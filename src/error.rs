//! Error types for model generation.
//!
//! All failures during template binding, chain assembly and serialization
//! are fail-fast: the first error aborts generation and no partial model
//! file is ever written.

use thiserror::Error;

/// Main error type for model generation operations.
#[derive(Error, Debug)]
pub enum ModelError {
    /// A template is self-contradictory (duplicate axis names, an
    /// `axis_to_keep` that matches neither supplied axis, an unknown angle
    /// sequence character, a missing anthropometric table entry).
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Axis markers produced a near-zero-length axis vector, typically
    /// because the markers are coincident or collinear.
    #[error("Degenerate geometry: {context}")]
    DegenerateGeometry { context: String },

    /// Requested trial markers could not be resolved: either the label is
    /// absent from the trial or the marker is NaN for every sample.
    #[error("Markers {names:?} are not present in the trial")]
    MissingMarkers { names: Vec<String> },

    /// A segment references a parent that was not declared before it.
    #[error("Segment '{segment}' references unknown parent '{parent}'")]
    UnknownParent { segment: String, parent: String },

    /// An anthropometric lookup references a marker absent from the model.
    #[error("Marker '{0}' is not present in the model")]
    UnknownMarker(String),

    /// Writing the model file failed.
    #[error("Failed to write model file: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for model generation operations.
pub type Result<T> = std::result::Result<T, ModelError>;

impl ModelError {
    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a degenerate geometry error.
    #[must_use]
    pub fn degenerate_geometry(context: impl Into<String>) -> Self {
        Self::DegenerateGeometry {
            context: context.into(),
        }
    }

    /// Create a missing markers error.
    #[must_use]
    pub fn missing_markers<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::MissingMarkers {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Create an unknown parent error.
    #[must_use]
    pub fn unknown_parent(segment: impl Into<String>, parent: impl Into<String>) -> Self {
        Self::UnknownParent {
            segment: segment.into(),
            parent: parent.into(),
        }
    }

    /// Create an unknown marker error.
    #[must_use]
    pub fn unknown_marker(name: impl Into<String>) -> Self {
        Self::UnknownMarker(name.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ModelError::unknown_parent("THIGH", "PELVIS");
        assert!(err.to_string().contains("THIGH"));
        assert!(err.to_string().contains("PELVIS"));

        let err = ModelError::missing_markers(["KNEE_MED", "KNEE_LAT"]);
        assert!(err.to_string().contains("KNEE_MED"));
        assert!(err.to_string().contains("KNEE_LAT"));
    }

    #[test]
    fn test_error_constructors() {
        let _ = ModelError::configuration("the two axes cannot share a name");
        let _ = ModelError::degenerate_geometry("axis X has near-zero norm");
        let _ = ModelError::unknown_marker("ANKLE");
    }
}
