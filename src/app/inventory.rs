//! Remote inventory accumulation
//!
//! Turns a page-by-page listing API into one complete, ordered inventory.
//! The listing reports an authoritative total with every page, so the loop
//! stops when the accumulated count reaches that total rather than when a
//! short page comes back. Anything that makes the count unreachable or
//! overshoot fails the whole run: a plan built on a partial inventory could
//! delete local files that still exist remotely.

use std::collections::HashSet;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::app::models::{Identifier, Page, PhotoDescriptor};
use crate::constants::sync;
use crate::errors::{DuplicateIdentifier, InventoryError, InventoryResult, PageFetchError};

/// Source of listing pages
///
/// Pages are numbered from 1. Implementations report the remote set's total
/// size with every page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, page: u32) -> Result<Page, PageFetchError>;
}

/// Complete, ordered listing of the remote set
///
/// Every identifier appears once. Read-only after construction.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    descriptors: Vec<PhotoDescriptor>,
}

impl Inventory {
    /// Build an inventory from already-listed descriptors
    ///
    /// # Errors
    ///
    /// Returns `DuplicateIdentifier` if two descriptors map to the same file
    pub fn from_descriptors(
        descriptors: Vec<PhotoDescriptor>,
    ) -> Result<Self, DuplicateIdentifier> {
        let mut seen = HashSet::with_capacity(descriptors.len());
        for descriptor in &descriptors {
            if !seen.insert(descriptor.identifier()) {
                return Err(DuplicateIdentifier {
                    identifier: descriptor.identifier().to_string(),
                });
            }
        }
        Ok(Self { descriptors })
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Descriptors in listing order
    pub fn descriptors(&self) -> &[PhotoDescriptor] {
        &self.descriptors
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PhotoDescriptor> {
        self.descriptors.iter()
    }

    /// Identifiers of every listed photo
    pub fn identifiers(&self) -> HashSet<&Identifier> {
        self.descriptors.iter().map(|d| d.identifier()).collect()
    }
}

impl<'a> IntoIterator for &'a Inventory {
    type Item = &'a PhotoDescriptor;
    type IntoIter = std::slice::Iter<'a, PhotoDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.descriptors.iter()
    }
}

/// Fetch every page of the remote listing
///
/// Equivalent to [`build_inventory_bounded`] with
/// [`sync::DEFAULT_MAX_PAGES`].
pub async fn build_inventory<F>(fetcher: &F) -> InventoryResult<Inventory>
where
    F: PageFetcher + ?Sized,
{
    build_inventory_bounded(fetcher, sync::DEFAULT_MAX_PAGES).await
}

/// Fetch every page of the remote listing, requesting at most `max_pages`
///
/// Pages are requested strictly one after another starting at page 1. The
/// loop ends as soon as the accumulated count equals the total reported by
/// the latest page.
///
/// # Errors
///
/// - `InventoryError::PageFetch` if any page request fails
/// - `InventoryError::Inconsistency` if the accumulated count exceeds the
///   reported total, a page comes back empty before the total is reached,
///   `max_pages` is exhausted, or two photos share an identifier
pub async fn build_inventory_bounded<F>(fetcher: &F, max_pages: u32) -> InventoryResult<Inventory>
where
    F: PageFetcher + ?Sized,
{
    let mut descriptors: Vec<PhotoDescriptor> = Vec::new();
    let mut page = 1;

    loop {
        if page > max_pages {
            return Err(InventoryError::inconsistency(
                page,
                format!(
                    "listing not complete after {} pages ({} photos accumulated)",
                    max_pages,
                    descriptors.len()
                ),
            ));
        }

        let Page {
            descriptors: batch,
            total,
        } = fetcher
            .fetch_page(page)
            .await
            .map_err(|source| InventoryError::PageFetch { page, source })?;

        let received = batch.len();
        descriptors.extend(batch);
        let accumulated = descriptors.len();
        debug!(page, received, accumulated, total, "Fetched listing page");

        if accumulated == total {
            break;
        }
        if accumulated > total {
            return Err(InventoryError::inconsistency(
                page,
                format!("accumulated {accumulated} photos but the remote reports {total}"),
            ));
        }
        if received == 0 {
            return Err(InventoryError::inconsistency(
                page,
                format!("empty page with {accumulated} of {total} photos accumulated"),
            ));
        }

        page += 1;
    }

    let inventory = Inventory::from_descriptors(descriptors)
        .map_err(|dup| InventoryError::inconsistency(page, dup.to_string()))?;

    info!(
        "Remote inventory complete: {} photos over {} pages",
        inventory.len(),
        page
    );
    Ok(inventory)
}
