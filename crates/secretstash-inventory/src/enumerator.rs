//! Enumeration and batched fetching
//!
//! A full backup pages through the listing API until it runs dry, then
//! fetches the listed entries ten at a time, one batch after another. A
//! backup of a single named entry skips the listing entirely.

use async_trait::async_trait;
use secretstash_core::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::store::Page;

/// Entries per fetch call (the SSM GetParameters limit)
pub const BATCH_SIZE: usize = 10;

/// Which entries a backup covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    Single(String),
}

impl Selection {
    /// `Single` for a non-empty name, `All` otherwise
    pub fn from_name(name: Option<&str>) -> Self {
        match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => Selection::Single(name.to_string()),
            None => Selection::All,
        }
    }
}

/// A source of backup entries
#[async_trait]
pub trait Inventory: Send + Sync {
    /// What a listing page yields
    type Listing: Clone + Send + Sync;
    /// What ends up in the backup document
    type Entry: Serialize + DeserializeOwned + Send;

    /// "parameter" or "secret", for log lines
    fn kind(&self) -> &'static str;

    async fn list_page(&self, next_token: Option<&str>) -> Result<Page<Self::Listing>>;

    /// Listing for a single named entry, without paging
    async fn resolve(&self, identifier: &str) -> Result<Self::Listing>;

    /// Fetch entries for at most `BATCH_SIZE` listings, in listing order
    async fn fetch_batch(&self, batch: &[Self::Listing]) -> Result<Vec<Self::Entry>>;
}

/// Every listing, across all pages
pub async fn enumerate_all<I>(inventory: &I) -> Result<Vec<I::Listing>>
where
    I: Inventory + ?Sized,
{
    let mut listings = Vec::new();
    let mut next_token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = inventory.list_page(next_token.as_deref()).await?;
        pages += 1;
        next_token = page.continuation().map(String::from);
        listings.extend(page.items);

        if next_token.is_none() {
            break;
        }
    }

    debug!(kind = inventory.kind(), pages, count = listings.len(), "Enumerated inventory");
    Ok(listings)
}

/// Fetch `listings` in sequential batches of `BATCH_SIZE`.
/// The first failing batch aborts the whole fetch.
pub async fn fetch_in_batches<I>(inventory: &I, listings: &[I::Listing]) -> Result<Vec<I::Entry>>
where
    I: Inventory + ?Sized,
{
    let mut entries = Vec::with_capacity(listings.len());
    for (index, batch) in listings.chunks(BATCH_SIZE).enumerate() {
        debug!(kind = inventory.kind(), batch = index + 1, size = batch.len(), "Fetching batch");
        entries.extend(inventory.fetch_batch(batch).await?);
    }
    Ok(entries)
}

/// Entries for `selection`
pub async fn collect_entries<I>(inventory: &I, selection: &Selection) -> Result<Vec<I::Entry>>
where
    I: Inventory + ?Sized,
{
    let entries = match selection {
        Selection::All => {
            let listings = enumerate_all(inventory).await?;
            fetch_in_batches(inventory, &listings).await?
        }
        Selection::Single(identifier) => {
            let listing = inventory.resolve(identifier).await?;
            inventory.fetch_batch(std::slice::from_ref(&listing)).await?
        }
    };

    info!(kind = inventory.kind(), count = entries.len(), "Collected entries");
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secretstash_core::Error;
    use std::sync::Mutex;

    /// Serves `total` ids in pages of `page_size` and records every call
    struct NumberedInventory {
        total: usize,
        page_size: usize,
        list_calls: Mutex<usize>,
        batches: Mutex<Vec<Vec<String>>>,
        fail_on_batch: Option<usize>,
    }

    impl NumberedInventory {
        fn new(total: usize, page_size: usize) -> Self {
            Self {
                total,
                page_size,
                list_calls: Mutex::new(0),
                batches: Mutex::new(Vec::new()),
                fail_on_batch: None,
            }
        }

        fn id(n: usize) -> String {
            format!("/app/param-{:04}", n)
        }

        fn batch_sizes(&self) -> Vec<usize> {
            self.batches.lock().unwrap().iter().map(Vec::len).collect()
        }
    }

    #[async_trait]
    impl Inventory for NumberedInventory {
        type Listing = String;
        type Entry = String;

        fn kind(&self) -> &'static str {
            "parameter"
        }

        async fn list_page(&self, next_token: Option<&str>) -> Result<Page<String>> {
            *self.list_calls.lock().unwrap() += 1;
            let start: usize = next_token.map(|t| t.parse().unwrap()).unwrap_or(0);
            let end = (start + self.page_size).min(self.total);
            Ok(Page {
                items: (start..end).map(Self::id).collect(),
                // the last page carries an empty token, like some AWS APIs
                next_token: Some(if end < self.total { end.to_string() } else { String::new() }),
            })
        }

        async fn resolve(&self, identifier: &str) -> Result<String> {
            Ok(identifier.to_string())
        }

        async fn fetch_batch(&self, batch: &[String]) -> Result<Vec<String>> {
            let mut batches = self.batches.lock().unwrap();
            batches.push(batch.to_vec());
            if Some(batches.len()) == self.fail_on_batch {
                return Err(Error::transport("ssm:GetParameters", "ThrottlingException"));
            }
            Ok(batch.iter().map(|id| format!("{}=value", id)).collect())
        }
    }

    #[tokio::test]
    async fn test_enumeration_is_complete_for_any_page_size() {
        for total in [0usize, 1, 9, 10, 11, 57] {
            for page_size in [1usize, 3, 10, 50, 100] {
                let inventory = NumberedInventory::new(total, page_size);
                let listed = enumerate_all(&inventory).await.unwrap();

                let expected: Vec<String> = (0..total).map(NumberedInventory::id).collect();
                assert_eq!(listed, expected, "total={} page_size={}", total, page_size);
                assert_eq!(
                    *inventory.list_calls.lock().unwrap(),
                    total.div_ceil(page_size).max(1)
                );
            }
        }
    }

    #[tokio::test]
    async fn test_batches_of_ten_preserve_order() {
        for (total, expected_sizes) in [
            (0usize, vec![]),
            (7, vec![7]),
            (10, vec![10]),
            (23, vec![10, 10, 3]),
            (30, vec![10, 10, 10]),
        ] {
            let inventory = NumberedInventory::new(total, 4);
            let entries = collect_entries(&inventory, &Selection::All).await.unwrap();

            assert_eq!(inventory.batch_sizes(), expected_sizes);
            let expected: Vec<String> = (0..total)
                .map(|n| format!("{}=value", NumberedInventory::id(n)))
                .collect();
            assert_eq!(entries, expected);
        }
    }

    #[tokio::test]
    async fn test_single_selection_skips_listing() {
        let inventory = NumberedInventory::new(100, 10);
        let entries = collect_entries(&inventory, &Selection::Single("/app/only".into()))
            .await
            .unwrap();

        assert_eq!(entries, vec!["/app/only=value".to_string()]);
        assert_eq!(*inventory.list_calls.lock().unwrap(), 0);
        assert_eq!(inventory.batch_sizes(), vec![1]);
    }

    #[tokio::test]
    async fn test_failed_batch_aborts() {
        let mut inventory = NumberedInventory::new(25, 25);
        inventory.fail_on_batch = Some(2);

        let err = collect_entries(&inventory, &Selection::All).await.unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));
        // no batch after the failing one is attempted
        assert_eq!(inventory.batch_sizes(), vec![10, 10]);
    }

    #[test]
    fn test_selection_from_name() {
        assert_eq!(Selection::from_name(None), Selection::All);
        assert_eq!(Selection::from_name(Some("  ")), Selection::All);
        assert_eq!(
            Selection::from_name(Some("/app/db")),
            Selection::Single("/app/db".into())
        );
    }
}
