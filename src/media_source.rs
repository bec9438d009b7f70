//! Media source adapter contract.
//!
//! A `MediaSource` hands out pages of photos and videos behind a permission
//! gate and can move items to the trash. [`fetch_page`] and [`delete_items`]
//! wrap the raw adapter calls with the rules the feed relies on.

use crate::domain::{MediaItem, MediaKind, MediaPage, PageRequest, PageToken};
use crate::error::{PhotoBurnError, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AssetSort {
    #[default]
    CreationTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetQuery {
    pub kinds: Vec<MediaKind>,
    pub page_size: usize,
    pub after: Option<PageToken>,
    pub sort_by: AssetSort,
}

#[derive(Debug, Clone, Default)]
pub struct AssetPage {
    pub items: Vec<MediaItem>,
    pub end_cursor: Option<PageToken>,
    pub has_next_page: bool,
    pub total_count: usize,
}

#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn check_permission(&self) -> PermissionStatus;

    async fn request_permission(&self) -> PermissionStatus;

    async fn list_assets(&self, query: &AssetQuery) -> Result<AssetPage>;

    /// Moves the given ids to the trash. `Ok(true)` means every id was handled.
    async fn delete_assets(&self, ids: &[String]) -> Result<bool>;
}

/// Performs one feed page request, confirming permission on the first page
pub async fn fetch_page(
    source: &dyn MediaSource,
    request: &PageRequest,
    kinds: &[MediaKind],
) -> Result<MediaPage> {
    if request.is_first() {
        let mut status = source.check_permission().await;
        if status != PermissionStatus::Granted {
            debug!("Media permission not granted yet, requesting");
            status = source.request_permission().await;
        }
        if status != PermissionStatus::Granted {
            return Err(PhotoBurnError::PermissionDenied);
        }
    }

    let query = AssetQuery {
        kinds: kinds.to_vec(),
        page_size: request.page_size,
        after: request.after.clone(),
        sort_by: AssetSort::CreationTime,
    };
    let page = source.list_assets(&query).await?;
    debug!(
        items = page.items.len(),
        total = page.total_count,
        has_next = page.has_next_page,
        "Listed assets"
    );

    Ok(MediaPage {
        items: page.items,
        next: page.end_cursor,
        has_more: page.has_next_page,
    })
}

/// Moves items to the trash, skipping entries without an id
pub async fn delete_items(source: &dyn MediaSource, items: &[MediaItem]) -> Result<()> {
    let ids: Vec<String> = items
        .iter()
        .filter(|item| !item.id.is_empty())
        .map(|item| item.id.clone())
        .collect();

    if ids.is_empty() {
        warn!("No valid items to move to trash");
        return Err(PhotoBurnError::DeleteFailed(
            "no valid items provided".to_string(),
        ));
    }

    match source.delete_assets(&ids).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(PhotoBurnError::DeleteFailed(format!(
            "media source did not trash all of {:?}",
            ids
        ))),
        Err(PhotoBurnError::DeleteFailed(reason)) => Err(PhotoBurnError::DeleteFailed(reason)),
        Err(e) => Err(PhotoBurnError::DeleteFailed(e.to_string())),
    }
}

/// Serves one offset-anchored page out of a stable listing
pub fn paginate(listing: &[MediaItem], query: &AssetQuery) -> Result<AssetPage> {
    let matching: Vec<&MediaItem> = listing
        .iter()
        .filter(|item| query.kinds.is_empty() || query.kinds.contains(&item.kind))
        .collect();

    let start = match &query.after {
        None => 0,
        Some(PageToken(token)) => token.parse::<usize>().map_err(|_| {
            PhotoBurnError::FetchFailed(format!("invalid continuation token: {}", token))
        })?,
    };
    let start = start.min(matching.len());
    let end = start.saturating_add(query.page_size).min(matching.len());

    Ok(AssetPage {
        items: matching[start..end].iter().map(|item| (*item).clone()).collect(),
        end_cursor: Some(PageToken(end.to_string())),
        has_next_page: end < matching.len(),
        total_count: matching.len(),
    })
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process media source, used by tests and `--demo`
#[derive(Debug)]
pub struct MemoryLibrary {
    items: Vec<MediaItem>,
    permission: Mutex<PermissionStatus>,
    grant_on_request: AtomicBool,
    fail_deletes: AtomicBool,
    failing_lists: AtomicUsize,
    list_calls: AtomicUsize,
    deleted: Mutex<Vec<String>>,
}

impl MemoryLibrary {
    pub fn new(mut items: Vec<MediaItem>) -> Self {
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Self {
            items,
            permission: Mutex::new(PermissionStatus::Granted),
            grant_on_request: AtomicBool::new(true),
            fail_deletes: AtomicBool::new(false),
            failing_lists: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            deleted: Mutex::new(Vec::new()),
        }
    }

    /// Starts without permission; `grant_on_request` decides the prompt's answer
    pub fn with_permission(self, status: PermissionStatus, grant_on_request: bool) -> Self {
        *lock(&self.permission) = status;
        self.grant_on_request
            .store(grant_on_request, Ordering::SeqCst);
        self
    }

    pub fn set_grant_on_request(&self, grant: bool) {
        self.grant_on_request.store(grant, Ordering::SeqCst);
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Makes the next `count` listings fail
    pub fn fail_next_lists(&self, count: usize) {
        self.failing_lists.store(count, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn deleted_ids(&self) -> Vec<String> {
        lock(&self.deleted).clone()
    }
}

#[async_trait]
impl MediaSource for MemoryLibrary {
    async fn check_permission(&self) -> PermissionStatus {
        *lock(&self.permission)
    }

    async fn request_permission(&self) -> PermissionStatus {
        let mut permission = lock(&self.permission);
        if self.grant_on_request.load(Ordering::SeqCst) {
            *permission = PermissionStatus::Granted;
        }
        *permission
    }

    async fn list_assets(&self, query: &AssetQuery) -> Result<AssetPage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        let failing = self.failing_lists.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_lists.store(failing - 1, Ordering::SeqCst);
            return Err(PhotoBurnError::FetchFailed("simulated outage".to_string()));
        }

        paginate(&self.items, query)
    }

    async fn delete_assets(&self, ids: &[String]) -> Result<bool> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(PhotoBurnError::DeleteFailed("simulated failure".to_string()));
        }
        lock(&self.deleted).extend(ids.iter().cloned());
        Ok(true)
    }
}
