//! Named profile curves.
//!
//! Builders never read a global catalog. They receive a [`ProfileLibrary`]
//! through the build context and look profiles up by name.

mod catalog;

pub use catalog::{CatalogError, ProfileCatalog};

use crate::geom::Curve;
use crate::pipeline::{BuildError, BuildResult};

/// Read-only `name -> profile curve` lookup.
///
/// Profiles are closed curves in local XY. Lookups return owned copies, so
/// callers are free to transform them.
pub trait ProfileLibrary: Sync {
    fn profile(&self, name: &str) -> Option<Curve>;

    fn names(&self) -> Vec<String>;
}

/// Looks up `name`, turning a miss into [`BuildError::MissingProfile`] with
/// the closest known name as a suggestion.
pub fn require_profile(library: &dyn ProfileLibrary, name: &str) -> BuildResult<Curve> {
    library.profile(name).ok_or_else(|| BuildError::MissingProfile {
        name: name.to_owned(),
        suggestion: closest_name(name, &library.names()),
    })
}

/// Closest candidate by case-insensitive edit distance, if it is close enough
/// to be a plausible typo.
#[must_use]
pub fn closest_name(name: &str, candidates: &[String]) -> Option<String> {
    let needle = name.to_lowercase();
    let max_distance = (needle.chars().count() / 3).max(2);
    candidates
        .iter()
        .map(|c| (levenshtein::levenshtein(&needle, &c.to_lowercase()), c))
        .filter(|(d, _)| *d <= max_distance)
        .min_by_key(|(d, _)| *d)
        .map(|(_, c)| c.clone())
}
