//! Error types for the rendering pipeline.

use std::fmt;

use crate::encoder::EncodeError;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StylistError>;

/// The pipeline stage an error escaped from.
///
/// Used as a stable message prefix so callers can tell which entry point
/// failed without matching on the inner error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Generate,
    Render,
    Export,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Generate => "generate",
            Self::Render => "render",
            Self::Export => "export",
        })
    }
}

/// Top-level error returned by every public entry point.
#[derive(thiserror::Error, Debug)]
pub enum StylistError {
    /// Input rejected before any work was done.
    #[error("validation error: {0}")]
    Validation(String),

    /// A failure after validation, tagged with the stage it came from.
    #[error("failed to {stage} QR code: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: StageError,
    },

    /// A configuration profile could not be parsed or written.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl StylistError {
    /// Creates a [`StylistError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Wraps `source` as a failure of `stage`.
    pub fn stage(stage: Stage, source: impl Into<StageError>) -> Self {
        Self::Stage {
            stage,
            source: source.into(),
        }
    }

    /// Returns true for errors raised before any rendering work started.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// The underlying cause of a [`StylistError::Stage`].
#[derive(thiserror::Error, Debug)]
pub enum StageError {
    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("could not allocate a {width}x{height} surface")]
    Surface { width: u32, height: u32 },

    #[error("png encoding failed: {0}")]
    Png(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            StylistError::validation("Text cannot be empty")
                .to_string()
                .starts_with("validation error:")
        );

        let surface = StageError::Surface {
            width: 0,
            height: 0,
        };
        assert!(
            StylistError::stage(Stage::Generate, surface)
                .to_string()
                .starts_with("failed to generate QR code:")
        );

        let io = std::io::Error::other("disk full");
        let err = StylistError::stage(Stage::Export, io);
        assert_eq!(err.to_string(), "failed to export QR code: disk full");
    }

    #[test]
    fn validation_is_distinguishable() {
        assert!(StylistError::validation("x").is_validation());
        let err = StylistError::stage(Stage::Render, StageError::Png("bad".into()));
        assert!(!err.is_validation());
    }
}
