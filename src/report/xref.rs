//! Snapshot-to-image cross reference
//!
//! Snapshots created implicitly by CreateImage carry a provider-generated
//! description of the form `Created by CreateImage(i-...) for ami-... from
//! vol-...`. The image ID embedded in that text is the only link back to the
//! image, which may since have been deregistered.

use regex::Regex;

/// Outcome of the best-effort image lookup for a snapshot.
///
/// Lookup failures are absorbed into [`ImageXref::Missing`] rather than
/// failing the report: a deregistered image and a transient describe failure
/// render identically.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImageXref {
    /// Description carried no extractable image ID (manually created
    /// snapshots; the common case)
    #[default]
    None,
    /// Image still registered, with its current lifecycle state
    Found { image_id: String, state: String },
    /// Image deregistered, or the lookup failed
    Missing { image_id: String },
}

/// Sentinel status rendered for images that no longer resolve
pub const STATUS_DOES_NOT_EXIST: &str = "does not exist";

impl ImageXref {
    /// CSV projection: `(ImageId, ImageStatus)` columns.
    pub fn columns(&self) -> (&str, &str) {
        match self {
            ImageXref::None => ("", ""),
            ImageXref::Found { image_id, state } => (image_id, state),
            ImageXref::Missing { image_id } => (image_id, STATUS_DOES_NOT_EXIST),
        }
    }
}

/// Matcher for CreateImage-generated snapshot descriptions.
pub struct DescriptionMatcher {
    pattern: Regex,
}

impl Default for DescriptionMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl DescriptionMatcher {
    pub fn new() -> Self {
        // The pattern is a constant, so compilation cannot fail at runtime.
        let pattern = Regex::new(r"Created by CreateImage\(.*\) for (ami-\S+) from")
            .expect("static regex must compile");
        Self { pattern }
    }

    /// Extract the embedded image ID, if the description matches.
    pub fn image_id<'a>(&self, description: &'a str) -> Option<&'a str> {
        self.pattern
            .captures(description)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}
