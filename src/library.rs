//! Directory-backed media library.
//!
//! Every photo and video under a root directory is one asset. The listing is
//! snapshotted on the first page so continuation tokens stay valid while items
//! are trashed underneath it.

use crate::domain::{MediaItem, MediaKind};
use crate::error::{PhotoBurnError, Result};
use crate::media_source::{paginate, AssetPage, AssetQuery, MediaSource, PermissionStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Options for scanning a library directory
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub recursive: bool,
    pub show_hidden: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            show_hidden: false,
        }
    }
}

/// Collects every media file under `root`, oldest first
pub fn scan_media(root: &Path, options: &ScanOptions) -> io::Result<Vec<MediaItem>> {
    let mut items = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    let mut is_root = true;

    while let Some(dir) = pending.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            // The root must be readable, nested folders are best effort
            Err(e) if is_root => return Err(e),
            Err(e) => {
                debug!(path = %dir.display(), error = %e, "Skipping unreadable directory");
                continue;
            }
        };
        is_root = false;

        for entry in entries.flatten() {
            let path = entry.path();

            let file_name = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => name,
                None => continue,
            };
            if !options.show_hidden && file_name.starts_with('.') {
                continue;
            }

            let file_type = match entry.file_type() {
                Ok(t) => t,
                Err(_) => continue,
            };
            if file_type.is_dir() {
                if options.recursive {
                    pending.push(path);
                }
                continue;
            }

            let metadata = match fs::metadata(&path) {
                Ok(m) => m,
                Err(_) => continue,
            };
            // Linked folders would list the same files again under new ids
            if metadata.is_dir() {
                debug!(path = %path.display(), "Skipping symlinked directory");
                continue;
            }

            if let Some(item) = media_item(&path, &metadata) {
                items.push(item);
            }
        }
    }

    items.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    Ok(items)
}

fn media_item(path: &Path, metadata: &fs::Metadata) -> Option<MediaItem> {
    let kind = path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(MediaKind::from_extension)?;

    let created = metadata.created().or_else(|_| metadata.modified()).ok()?;
    let id = path.to_string_lossy().into_owned();

    Some(MediaItem {
        uri: format!("file://{}", id),
        display_name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| id.clone()),
        id,
        kind,
        created_at: DateTime::<Utc>::from(created),
    })
}

#[derive(Debug, Default)]
struct Snapshot {
    items: Vec<MediaItem>,
    paths: HashMap<String, PathBuf>,
}

pub struct LocalLibrary {
    root: PathBuf,
    options: ScanOptions,
    dry_run: bool,
    snapshot: Arc<Mutex<Option<Snapshot>>>,
}

impl LocalLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            options: ScanOptions::default(),
            dry_run: false,
            snapshot: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    /// Log trash operations instead of performing them
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    async fn scan(&self) -> Result<Snapshot> {
        let root = self.root.clone();
        let options = self.options.clone();
        let items = tokio::task::spawn_blocking(move || scan_media(&root, &options))
            .await
            .map_err(|e| PhotoBurnError::FetchFailed(format!("scan task failed: {}", e)))?
            .map_err(|e| PhotoBurnError::FetchFailed(format!("{}: {}", self.root.display(), e)))?;

        info!(root = %self.root.display(), count = items.len(), "Scanned media library");

        let paths = items
            .iter()
            .map(|item| (item.id.clone(), PathBuf::from(&item.id)))
            .collect();
        Ok(Snapshot { items, paths })
    }
}

#[async_trait]
impl MediaSource for LocalLibrary {
    async fn check_permission(&self) -> PermissionStatus {
        match fs::read_dir(&self.root) {
            Ok(_) => PermissionStatus::Granted,
            Err(e) => {
                debug!(root = %self.root.display(), error = %e, "Library not readable");
                PermissionStatus::Denied
            }
        }
    }

    /// There is no prompt for a directory; asking again re-checks readability
    async fn request_permission(&self) -> PermissionStatus {
        self.check_permission().await
    }

    async fn list_assets(&self, query: &AssetQuery) -> Result<AssetPage> {
        let mut guard = self.snapshot.lock().await;

        if query.after.is_none() || guard.is_none() {
            *guard = Some(self.scan().await?);
        }

        match guard.as_ref() {
            Some(snapshot) => paginate(&snapshot.items, query),
            None => Ok(AssetPage::default()),
        }
    }

    async fn delete_assets(&self, ids: &[String]) -> Result<bool> {
        let paths: Vec<PathBuf> = {
            let guard = self.snapshot.lock().await;
            let known = guard.as_ref().map(|s| &s.paths);
            ids.iter()
                .filter_map(|id| known.and_then(|paths| paths.get(id)).cloned())
                .collect()
        };

        if paths.len() != ids.len() {
            warn!(
                requested = ids.len(),
                known = paths.len(),
                "Refusing to trash ids outside the library"
            );
            return Ok(false);
        }

        if self.dry_run {
            for path in &paths {
                info!(path = %path.display(), "[dry-run] Would move to trash");
            }
            return Ok(true);
        }

        tokio::task::spawn_blocking(move || trash::delete_all(&paths))
            .await
            .map_err(|e| PhotoBurnError::DeleteFailed(format!("trash task failed: {}", e)))?
            .map_err(|e| PhotoBurnError::DeleteFailed(e.to_string()))?;

        Ok(true)
    }
}
