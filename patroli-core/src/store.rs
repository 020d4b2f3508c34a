//! In-memory product collection shared across handlers.
//!
//! State is process-lifetime only. The store is handed to the server as an
//! explicit value (axum state), never reached through a global, and all
//! mutation goes through the write lock so concurrent reviews serialize.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;
use utoipa::ToSchema;

use crate::model::{ProductRecord, ReviewOutcome, Stats};

#[derive(Error, Debug, PartialEq)]
pub enum StoreError {
    #[error("Product {0} not found")]
    NotFound(u64),
}

/// Filters and pagination for the product listing. Pages are 1-based; the
/// two partitions page independently.
#[derive(Debug, Clone)]
pub struct ProductQuery {
    pub reviewer: Option<String>,
    pub search: Option<String>,
    pub category: Option<String>,
    pub page_unreviewed: usize,
    pub limit_unreviewed: usize,
    pub page_reviewed: usize,
    pub limit_reviewed: usize,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            reviewer: None,
            search: None,
            category: None,
            page_unreviewed: 1,
            limit_unreviewed: 10,
            page_reviewed: 1,
            limit_reviewed: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub items_per_page: usize,
}

#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct PaginationInfo {
    pub unreviewed: PageInfo,
    pub reviewed: PageInfo,
}

/// One page of each partition plus pager metadata.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductView {
    pub unreviewed: Vec<ProductRecord>,
    pub reviewed: Vec<ProductRecord>,
    pub pagination: PaginationInfo,
}

/// Shared handle to the product collection. Cloning is cheap; clones share
/// the same underlying records.
#[derive(Debug, Clone, Default)]
pub struct ProductStore {
    records: Arc<RwLock<Vec<ProductRecord>>>,
}

impl ProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a freshly ingested generation, dropping the previous one.
    pub async fn replace_all(&self, records: Vec<ProductRecord>) {
        *self.records.write().await = records;
    }

    pub async fn reset(&self) {
        self.records.write().await.clear();
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn snapshot(&self) -> Vec<ProductRecord> {
        self.records.read().await.clone()
    }

    /// Filter, partition, and paginate.
    ///
    /// Filter order: records without an inspection verdict are dropped first,
    /// then reviewer (exact), category (exact on kategori_lv3), and search
    /// (case-insensitive substring on nama_produk). The reviewed partition
    /// comes back in reverse insertion order.
    pub async fn query(&self, query: &ProductQuery) -> ProductView {
        let records = self.records.read().await;

        let search_term = query
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        let filtered: Vec<&ProductRecord> = records
            .iter()
            .filter(|r| r.has_inspection())
            .filter(|r| match query.reviewer.as_deref() {
                Some(reviewer) => r.reviewer == reviewer,
                None => true,
            })
            .filter(|r| match query.category.as_deref() {
                Some(category) => r.kategori_lv3 == category,
                None => true,
            })
            .filter(|r| match search_term.as_deref() {
                Some(term) => r.nama_produk.to_lowercase().contains(term),
                None => true,
            })
            .collect();

        let (mut reviewed, unreviewed): (Vec<&ProductRecord>, Vec<&ProductRecord>) =
            filtered.into_iter().partition(|r| r.reviewed);
        reviewed.reverse();

        let (unreviewed_page, unreviewed_info) =
            paginate(&unreviewed, query.page_unreviewed, query.limit_unreviewed);
        let (reviewed_page, reviewed_info) =
            paginate(&reviewed, query.page_reviewed, query.limit_reviewed);

        ProductView {
            unreviewed: unreviewed_page,
            reviewed: reviewed_page,
            pagination: PaginationInfo {
                unreviewed: unreviewed_info,
                reviewed: reviewed_info,
            },
        }
    }

    /// Reviewer-scoped counters. Search and category filters never apply
    /// here; only the inspection-verdict exclusion does.
    pub async fn stats(&self, reviewer: Option<&str>) -> Stats {
        let records = self.records.read().await;

        let mut stats = Stats::default();
        for r in records.iter().filter(|r| r.has_inspection()) {
            if let Some(reviewer) = reviewer {
                if r.reviewer != reviewer {
                    continue;
                }
            }
            stats.total += 1;
            if r.reviewed {
                stats.reviewed += 1;
            }
            match r.hasil_review {
                Some(ReviewOutcome::Benar) => stats.benar += 1,
                Some(ReviewOutcome::Salah) => stats.salah += 1,
                None => {}
            }
        }
        stats.belum_review = stats.total - stats.reviewed;
        stats
    }

    /// Record a verdict. Re-reviewing overwrites the previous verdict.
    pub async fn review(
        &self,
        id: u64,
        outcome: ReviewOutcome,
    ) -> Result<ProductRecord, StoreError> {
        let mut records = self.records.write().await;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound(id))?;
        record.hasil_review = Some(outcome);
        record.reviewed = true;
        Ok(record.clone())
    }

    /// Scraper write-back for a record's image URL.
    pub async fn set_image_url(&self, id: u64, url: &str) -> Result<ProductRecord, StoreError> {
        let mut records = self.records.write().await;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound(id))?;
        record.url_image = url.to_string();
        Ok(record.clone())
    }

    /// Sorted, deduplicated kategori_lv3 values of qualifying records.
    pub async fn distinct_categories(&self, reviewer: Option<&str>) -> Vec<String> {
        let records = self.records.read().await;

        let mut categories: Vec<String> = records
            .iter()
            .filter(|r| r.has_inspection())
            .filter(|r| match reviewer {
                Some(reviewer) => r.reviewer == reviewer,
                None => true,
            })
            .map(|r| r.kategori_lv3.clone())
            .filter(|c| !c.is_empty())
            .collect();
        categories.sort();
        categories.dedup();
        categories
    }
}

fn paginate(items: &[&ProductRecord], page: usize, per_page: usize) -> (Vec<ProductRecord>, PageInfo) {
    let per_page = per_page.max(1);
    let page = page.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(per_page);

    let page_items = items
        .iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .map(|r| (*r).clone())
        .collect();

    (
        page_items,
        PageInfo {
            current_page: page,
            total_pages,
            total_items,
            items_per_page: per_page,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64, name: &str, reviewer: &str, category: &str, inspection: &str) -> ProductRecord {
        ProductRecord {
            id,
            kategori_lv1: "Perkantoran".to_string(),
            kategori_lv2: "ATK".to_string(),
            kategori_lv3: category.to_string(),
            nama_produk: name.to_string(),
            url_produk: format!("https://example.com/p/{}", id),
            url_image: String::new(),
            hasil_pemeriksaan: inspection.to_string(),
            reviewer: reviewer.to_string(),
            pemeriksa: "Budi".to_string(),
            hasil_review: None,
            reviewed: false,
        }
    }

    async fn seeded_store(records: Vec<ProductRecord>) -> ProductStore {
        let store = ProductStore::new();
        store.replace_all(records).await;
        store
    }

    #[tokio::test]
    async fn test_query_excludes_records_without_inspection() {
        let store = seeded_store(vec![
            record(1, "Pulpen", "Rina", "Pulpen", "Sesuai"),
            record(2, "Kertas", "Rina", "Kertas", ""),
            record(3, "Map", "Rina", "Map", "   "),
        ])
        .await;

        let view = store.query(&ProductQuery::default()).await;
        assert_eq!(view.unreviewed.len(), 1);
        assert_eq!(view.unreviewed[0].id, 1);
        assert_eq!(view.pagination.unreviewed.total_items, 1);
    }

    #[tokio::test]
    async fn test_query_filters_by_reviewer_then_category_then_search() {
        let store = seeded_store(vec![
            record(1, "Pulpen Gel Hitam", "Rina", "Pulpen", "Sesuai"),
            record(2, "Pulpen Gel Biru", "Rina", "Pulpen", "Sesuai"),
            record(3, "Pulpen Gel Merah", "Andi", "Pulpen", "Sesuai"),
            record(4, "Spidol Hitam", "Rina", "Spidol", "Sesuai"),
        ])
        .await;

        let view = store
            .query(&ProductQuery {
                reviewer: Some("Rina".to_string()),
                category: Some("Pulpen".to_string()),
                search: Some("hitam".to_string()),
                ..Default::default()
            })
            .await;

        assert_eq!(view.unreviewed.len(), 1);
        assert_eq!(view.unreviewed[0].id, 1);
    }

    #[tokio::test]
    async fn test_reviewed_partition_is_reverse_insertion_order() {
        let store = seeded_store(vec![
            record(1, "A", "Rina", "X", "Sesuai"),
            record(2, "B", "Rina", "X", "Sesuai"),
            record(3, "C", "Rina", "X", "Sesuai"),
        ])
        .await;

        store.review(1, ReviewOutcome::Benar).await.unwrap();
        store.review(3, ReviewOutcome::Salah).await.unwrap();

        let view = store.query(&ProductQuery::default()).await;
        let reviewed_ids: Vec<u64> = view.reviewed.iter().map(|r| r.id).collect();
        assert_eq!(reviewed_ids, vec![3, 1]);

        let unreviewed_ids: Vec<u64> = view.unreviewed.iter().map(|r| r.id).collect();
        assert_eq!(unreviewed_ids, vec![2]);
    }

    #[tokio::test]
    async fn test_partitions_paginate_independently() {
        let mut records = Vec::new();
        for id in 1..=7 {
            records.push(record(id, &format!("Produk {}", id), "Rina", "X", "Sesuai"));
        }
        let store = seeded_store(records).await;
        for id in 1..=2 {
            store.review(id, ReviewOutcome::Benar).await.unwrap();
        }

        // 5 unreviewed at 3 per page -> 2 pages; 2 reviewed at 10 per page -> 1.
        let view = store
            .query(&ProductQuery {
                page_unreviewed: 2,
                limit_unreviewed: 3,
                ..Default::default()
            })
            .await;

        assert_eq!(view.pagination.unreviewed.total_items, 5);
        assert_eq!(view.pagination.unreviewed.total_pages, 2);
        assert_eq!(view.pagination.unreviewed.current_page, 2);
        assert_eq!(view.unreviewed.len(), 2);

        assert_eq!(view.pagination.reviewed.total_items, 2);
        assert_eq!(view.pagination.reviewed.total_pages, 1);
    }

    #[tokio::test]
    async fn test_pagination_of_empty_partition() {
        let store = seeded_store(vec![record(1, "A", "Rina", "X", "Sesuai")]).await;

        let view = store.query(&ProductQuery::default()).await;
        assert_eq!(view.reviewed.len(), 0);
        assert_eq!(view.pagination.reviewed.total_pages, 0);
        assert_eq!(view.pagination.reviewed.total_items, 0);
    }

    #[tokio::test]
    async fn test_review_overwrites_previous_verdict() {
        let store = seeded_store(vec![record(1, "A", "Rina", "X", "Sesuai")]).await;

        let first = store.review(1, ReviewOutcome::Benar).await.unwrap();
        assert_eq!(first.hasil_review, Some(ReviewOutcome::Benar));
        assert!(first.reviewed);

        let second = store.review(1, ReviewOutcome::Salah).await.unwrap();
        assert_eq!(second.hasil_review, Some(ReviewOutcome::Salah));
        assert!(second.reviewed);

        let stats = store.stats(None).await;
        assert_eq!(stats.reviewed, 1);
        assert_eq!(stats.salah, 1);
        assert_eq!(stats.benar, 0);
    }

    #[tokio::test]
    async fn test_review_unknown_id() {
        let store = seeded_store(vec![record(1, "A", "Rina", "X", "Sesuai")]).await;
        assert_eq!(
            store.review(99, ReviewOutcome::Benar).await,
            Err(StoreError::NotFound(99))
        );
    }

    #[tokio::test]
    async fn test_stats_scoped_by_reviewer_and_ignores_uninspected() {
        let store = seeded_store(vec![
            record(1, "A", "Rina", "X", "Sesuai"),
            record(2, "B", "Rina", "X", "Tidak Sesuai"),
            record(3, "C", "Rina", "X", ""),
            record(4, "D", "Andi", "X", "Sesuai"),
        ])
        .await;
        store.review(1, ReviewOutcome::Benar).await.unwrap();

        let stats = store.stats(Some("Rina")).await;
        assert_eq!(
            stats,
            Stats {
                total: 2,
                reviewed: 1,
                belum_review: 1,
                benar: 1,
                salah: 0,
            }
        );

        let all = store.stats(None).await;
        assert_eq!(all.total, 3);
    }

    #[tokio::test]
    async fn test_distinct_categories_sorted_and_deduplicated() {
        let store = seeded_store(vec![
            record(1, "A", "Rina", "Spidol", "Sesuai"),
            record(2, "B", "Rina", "Pulpen", "Sesuai"),
            record(3, "C", "Rina", "Spidol", "Sesuai"),
            record(4, "D", "Rina", "", "Sesuai"),
            record(5, "E", "Andi", "Kertas", "Sesuai"),
            record(6, "F", "Rina", "Tinta", ""),
        ])
        .await;

        assert_eq!(
            store.distinct_categories(Some("Rina")).await,
            vec!["Pulpen".to_string(), "Spidol".to_string()]
        );
        assert_eq!(
            store.distinct_categories(None).await,
            vec![
                "Kertas".to_string(),
                "Pulpen".to_string(),
                "Spidol".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_replace_all_and_reset() {
        let store = seeded_store(vec![record(1, "A", "Rina", "X", "Sesuai")]).await;
        assert!(!store.is_empty().await);
        assert_eq!(store.len().await, 1);

        store
            .replace_all(vec![
                record(1, "B", "Rina", "X", "Sesuai"),
                record(2, "C", "Rina", "X", "Sesuai"),
            ])
            .await;
        assert_eq!(store.len().await, 2);
        assert_eq!(store.snapshot().await[0].nama_produk, "B");

        store.reset().await;
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_set_image_url() {
        let store = seeded_store(vec![record(1, "A", "Rina", "X", "Sesuai")]).await;
        let updated = store
            .set_image_url(1, "https://cdn.example.com/a.jpg")
            .await
            .unwrap();
        assert_eq!(updated.url_image, "https://cdn.example.com/a.jpg");
        assert_eq!(
            store.set_image_url(5, "x").await,
            Err(StoreError::NotFound(5))
        );
    }

    // Elektronik scenario: import one row, review it, and watch it move
    // between partitions for its reviewer.
    #[tokio::test]
    async fn test_review_moves_record_between_partitions() {
        let mut r = record(1, "Laptop 14 inci", "Rina", "Elektronik", "Sesuai");
        r.kategori_lv1 = "Elektronik".to_string();
        let store = seeded_store(vec![r]).await;

        let query = ProductQuery {
            reviewer: Some("Rina".to_string()),
            ..Default::default()
        };

        let before = store.query(&query).await;
        assert_eq!(before.unreviewed.len(), 1);
        assert_eq!(before.unreviewed[0].id, 1);
        assert!(before.reviewed.is_empty());

        store.review(1, ReviewOutcome::Benar).await.unwrap();

        let after = store.query(&query).await;
        assert!(after.unreviewed.is_empty());
        assert_eq!(after.reviewed.len(), 1);
        assert_eq!(after.reviewed[0].hasil_review, Some(ReviewOutcome::Benar));
    }
}
