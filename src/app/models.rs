//! Data models for Photoset Mirror
//!
//! This module defines the remote photo descriptor and the local identifier
//! derived from it. The identifier is the join key between the remote
//! inventory and the files already present in the destination directory.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::MalformedLocator;

/// Local file name of a remote photo
///
/// Opaque: compared byte for byte, never normalized for case, encoding or
/// extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Wrap a name read from the local filesystem
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Identifier {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<std::path::Path> for Identifier {
    fn as_ref(&self) -> &std::path::Path {
        std::path::Path::new(&self.0)
    }
}

/// Derive the local identifier of a remote locator
///
/// The identifier is the last path segment of the URL, exactly as it
/// appears in the path. Query string and fragment are not part of it.
///
/// # Errors
///
/// Returns `MalformedLocator` when the URL has no path segments (e.g. a
/// `mailto:` URL) or its path ends in `/`.
///
/// # Examples
///
/// ```
/// use photoset_mirror::app::identifier_of;
/// use url::Url;
///
/// let url = Url::parse("https://live.staticflickr.com/65535/5367_abc_o.jpg").unwrap();
/// assert_eq!(identifier_of(&url).unwrap().as_str(), "5367_abc_o.jpg");
/// ```
pub fn identifier_of(locator: &Url) -> Result<Identifier, MalformedLocator> {
    locator
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .map(Identifier::new)
        .ok_or_else(|| MalformedLocator {
            locator: locator.to_string(),
        })
}

/// One photo of the remote set, as reported by the listing API
///
/// The identifier is resolved when the descriptor is built so that every
/// descriptor in an inventory is known to map to a local file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoDescriptor {
    id: String,
    title: String,
    source: Url,
    identifier: Identifier,
}

impl PhotoDescriptor {
    /// Create a descriptor, resolving its local identifier
    ///
    /// # Errors
    ///
    /// Returns `MalformedLocator` if `source` has no trailing path segment
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        source: Url,
    ) -> Result<Self, MalformedLocator> {
        let identifier = identifier_of(&source)?;
        Ok(Self {
            id: id.into(),
            title: title.into(),
            source,
            identifier,
        })
    }

    /// Remote photo id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Photo title, possibly empty
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Locator of the original-size image
    pub fn source(&self) -> &Url {
        &self.source
    }

    /// Local file name of this photo
    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }
}

/// One page of a paginated listing
#[derive(Debug, Clone, Default)]
pub struct Page {
    /// Descriptors on this page, in remote order
    pub descriptors: Vec<PhotoDescriptor>,
    /// Size of the whole remote set as reported with this page
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_identifier_is_last_segment() {
        let id = identifier_of(&url("https://farm1.staticflickr.com/123/456_abc_o.jpg")).unwrap();
        assert_eq!(id.as_str(), "456_abc_o.jpg");
    }

    #[test]
    fn test_identifier_is_opaque() {
        let id = identifier_of(&url("https://example.com/photos/IMG%20001.JPG")).unwrap();
        assert_eq!(id.as_str(), "IMG%20001.JPG");

        let id = identifier_of(&url("https://example.com/photos/noext")).unwrap();
        assert_eq!(id.as_str(), "noext");
    }

    #[test]
    fn test_identifier_ignores_query_and_fragment() {
        let id = identifier_of(&url("https://example.com/a/b.png?size=o#top")).unwrap();
        assert_eq!(id.as_str(), "b.png");
    }

    #[test]
    fn test_identifier_is_deterministic() {
        let first = PhotoDescriptor::new("1", "one", url("https://example.com/x/1.jpg")).unwrap();
        let second = PhotoDescriptor::new("2", "other", url("https://example.com/x/1.jpg")).unwrap();
        assert_eq!(first.identifier(), second.identifier());
        assert_eq!(
            identifier_of(first.source()).unwrap(),
            identifier_of(first.source()).unwrap()
        );
    }

    #[test]
    fn test_malformed_locators() {
        for locator in [
            "https://example.com",
            "https://example.com/",
            "https://example.com/photos/",
            "mailto:someone@example.com",
        ] {
            let err = identifier_of(&url(locator)).unwrap_err();
            assert_eq!(err.locator, url(locator).to_string());
        }
    }

    #[test]
    fn test_descriptor_rejects_malformed_source() {
        let result = PhotoDescriptor::new("9", "", url("https://example.com/dir/"));
        assert!(result.is_err());
    }

    #[test]
    fn test_identifier_borrows_as_str() {
        let mut set = std::collections::HashSet::new();
        set.insert(Identifier::new("a.jpg"));
        assert!(set.contains("a.jpg"));
        assert_eq!(Identifier::new("a.jpg").to_string(), "a.jpg");
    }
}
