//! Photoset listing responses
//!
//! Decodes one page of `flickr.photosets.getPhotos` (JSON format, no
//! callback) into a [`Page`]. The API reports `total` as a number in some
//! responses and as a numeric string in others; both are accepted.

use serde::de::Error as _;
use serde::Deserialize;
use url::Url;

use crate::app::models::{Page, PhotoDescriptor};
use crate::constants::flickr;
use crate::errors::PageFetchError;

#[derive(Debug, Deserialize)]
struct Envelope {
    stat: String,
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    photoset: Option<PhotosetPage>,
}

#[derive(Debug, Deserialize)]
struct PhotosetPage {
    #[serde(default)]
    photo: Vec<PhotoEntry>,
    total: Count,
}

#[derive(Debug, Deserialize)]
struct PhotoEntry {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    url_o: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Count {
    Number(u64),
    Text(String),
}

impl Count {
    fn value(&self) -> Result<usize, serde_json::Error> {
        match self {
            Count::Number(n) => usize::try_from(*n).map_err(serde_json::Error::custom),
            Count::Text(s) => s.trim().parse().map_err(serde_json::Error::custom),
        }
    }
}

/// Decode one listing page
///
/// # Errors
///
/// - `PageFetchError::Decode` if the body is not a photoset page
/// - `PageFetchError::Api` if the API reports a failure
/// - `PageFetchError::MissingSource` / `InvalidSource` / `MalformedLocator`
///   if a photo has no usable original-size URL
pub fn parse_page(body: &str) -> Result<Page, PageFetchError> {
    let envelope: Envelope = serde_json::from_str(body)?;

    if envelope.stat != flickr::STAT_OK {
        return Err(PageFetchError::Api {
            code: envelope.code.unwrap_or_default(),
            message: envelope
                .message
                .unwrap_or_else(|| format!("stat={}", envelope.stat)),
        });
    }

    let photoset = envelope
        .photoset
        .ok_or_else(|| serde_json::Error::custom("response has no photoset"))?;
    let total = photoset.total.value()?;

    let descriptors = photoset
        .photo
        .into_iter()
        .map(descriptor_of)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Page { descriptors, total })
}

fn descriptor_of(entry: PhotoEntry) -> Result<PhotoDescriptor, PageFetchError> {
    let raw = entry.url_o.ok_or_else(|| PageFetchError::MissingSource {
        photo_id: entry.id.clone(),
    })?;
    let source = Url::parse(&raw).map_err(|e| PageFetchError::InvalidSource {
        photo_id: entry.id.clone(),
        url: raw.clone(),
        error: e.to_string(),
    })?;
    Ok(PhotoDescriptor::new(entry.id, entry.title, source)?)
}
