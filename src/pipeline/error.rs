//! Build errors and soft-failure diagnostics.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Result type for pipeline stages and component builders.
pub type BuildResult<T> = Result<T, BuildError>;

/// Hard failure of a build. Batch callers treat any variant as "nothing to add".
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    /// The source curve or plane cannot be used at all.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
    #[error("invalid parameter `{name}`: {value}")]
    InvalidParameter { name: &'static str, value: f64 },
    /// Fewer than two rail samples survived sampling.
    #[error("rail sampling produced {count} sections, at least 2 are required")]
    InsufficientSamples { count: usize },
    /// Every corner style and every fallback of an offset stage failed.
    #[error("offset failed at stage `{stage}`")]
    OffsetFailed { stage: &'static str },
    #[error("loft failed at stage `{stage}`")]
    LoftFailed { stage: &'static str },
    #[error("sweep along rail returned no result")]
    SweepFailed,
    /// Joining, capping and fragment selection left no usable solid.
    #[error("assembled shells do not form a solid")]
    NotSolid,
    #[error("profile `{name}` not found{}", suggestion_suffix(.suggestion.as_deref()))]
    MissingProfile { name: String, suggestion: Option<String> },
}

fn suggestion_suffix(suggestion: Option<&str>) -> String {
    suggestion.map(|s| format!(" (did you mean `{s}`?)")).unwrap_or_default()
}

/// Warnings collected while a build recovered from geometric infeasibility.
///
/// A non-empty list never means the build failed; it records which fallback
/// was taken (alternate corner style, duplicated profile, skipped cutter).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    pub warnings: Vec<String>,
}

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a warning and logs it.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{message}");
        self.warnings.push(message);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.warnings.extend(other.warnings);
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.warnings.is_empty() {
            return write!(f, "no warnings");
        }
        for (i, warning) in self.warnings.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "warning: {warning}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_profile_message_includes_suggestion() {
        let err = BuildError::MissingProfile {
            name: "rond".into(),
            suggestion: Some("round".into()),
        };
        assert_eq!(err.to_string(), "profile `rond` not found (did you mean `round`?)");

        let err = BuildError::MissingProfile {
            name: "zzz".into(),
            suggestion: None,
        };
        assert_eq!(err.to_string(), "profile `zzz` not found");
    }

    #[test]
    fn test_diagnostics_collects_warnings() {
        let mut diagnostics = Diagnostics::new();
        assert!(diagnostics.is_clean());
        diagnostics.warn("cutter skipped");
        let mut other = Diagnostics::new();
        other.warn("round corners used");
        diagnostics.extend(other);
        assert_eq!(diagnostics.warnings.len(), 2);
        assert_eq!(diagnostics.to_string(), "warning: cutter skipped\nwarning: round corners used");
    }
}
