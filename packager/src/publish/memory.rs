//! In-memory release store for tests.
//!
//! Models a release host closely enough to observe upsert behaviour: assets
//! are kept in upload order and duplicates are *not* rejected, so a
//! non-idempotent publish shows up as repeated asset names.

use super::{PublishError, PublishRequest, ReleasePublisher, ReleaseRecord};
use camino::Utf8Path;
use std::cell::RefCell;
use std::collections::BTreeMap;

/// A call received by [`InMemoryReleaseStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    /// `find_release(tag)`.
    Find(String),
    /// `create_release` with the request's tag.
    Create(String),
    /// `update_release` with the request's tag.
    Update(String),
    /// `delete_asset(tag, asset)`.
    DeleteAsset(String, String),
    /// `upload_asset(tag, file name)`.
    Upload(String, String),
}

#[derive(Debug, Clone, Default)]
struct StoredRelease {
    prerelease: bool,
    assets: Vec<String>,
}

/// A [`ReleasePublisher`] that keeps releases in memory.
#[derive(Debug, Default)]
pub struct InMemoryReleaseStore {
    releases: RefCell<BTreeMap<String, StoredRelease>>,
    latest: RefCell<Option<String>>,
    calls: RefCell<Vec<StoreCall>>,
    reject_uploads: bool,
}

impl InMemoryReleaseStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose uploads always fail, for exercising publish failures.
    #[must_use]
    pub fn rejecting_uploads() -> Self {
        Self {
            reject_uploads: true,
            ..Self::default()
        }
    }

    /// Seed a release as if a previous run had published it.
    #[must_use]
    pub fn with_release(self, record: ReleaseRecord) -> Self {
        self.releases.borrow_mut().insert(
            record.tag,
            StoredRelease {
                prerelease: record.prerelease,
                assets: record.assets,
            },
        );
        self
    }

    /// Current state of the release for `tag`.
    #[must_use]
    pub fn release(&self, tag: &str) -> Option<ReleaseRecord> {
        self.releases.borrow().get(tag).map(|stored| ReleaseRecord {
            tag: tag.to_owned(),
            prerelease: stored.prerelease,
            assets: stored.assets.clone(),
        })
    }

    /// Number of releases in the store.
    #[must_use]
    pub fn release_count(&self) -> usize {
        self.releases.borrow().len()
    }

    /// Tag of the release marked latest, if any.
    #[must_use]
    pub fn latest(&self) -> Option<String> {
        self.latest.borrow().clone()
    }

    /// Every call received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: StoreCall) {
        self.calls.borrow_mut().push(call);
    }

    fn apply_flags(&self, request: &PublishRequest) {
        if let Some(stored) = self.releases.borrow_mut().get_mut(&request.tag) {
            stored.prerelease = request.prerelease;
        }
        if request.make_latest {
            *self.latest.borrow_mut() = Some(request.tag.clone());
        }
    }

    fn not_found(tag: &str) -> PublishError {
        PublishError::CommandFailed {
            command: format!("memory release {tag}"),
            status: "1".to_owned(),
            stderr: "release not found".to_owned(),
        }
    }
}

impl ReleasePublisher for InMemoryReleaseStore {
    fn find_release(&self, tag: &str) -> Result<Option<ReleaseRecord>, PublishError> {
        self.record(StoreCall::Find(tag.to_owned()));
        Ok(self.release(tag))
    }

    fn create_release(&self, request: &PublishRequest) -> Result<(), PublishError> {
        self.record(StoreCall::Create(request.tag.clone()));
        self.releases
            .borrow_mut()
            .insert(request.tag.clone(), StoredRelease::default());
        self.apply_flags(request);
        Ok(())
    }

    fn update_release(&self, request: &PublishRequest) -> Result<(), PublishError> {
        self.record(StoreCall::Update(request.tag.clone()));
        if !self.releases.borrow().contains_key(&request.tag) {
            return Err(Self::not_found(&request.tag));
        }
        self.apply_flags(request);
        Ok(())
    }

    fn delete_asset(&self, tag: &str, asset_name: &str) -> Result<(), PublishError> {
        self.record(StoreCall::DeleteAsset(tag.to_owned(), asset_name.to_owned()));
        let mut releases = self.releases.borrow_mut();
        let stored = releases.get_mut(tag).ok_or_else(|| Self::not_found(tag))?;
        stored.assets.retain(|asset| asset != asset_name);
        Ok(())
    }

    fn upload_asset(&self, tag: &str, path: &Utf8Path) -> Result<(), PublishError> {
        let name = path.file_name().unwrap_or(path.as_str()).to_owned();
        self.record(StoreCall::Upload(tag.to_owned(), name.clone()));
        if self.reject_uploads {
            return Err(PublishError::CommandFailed {
                command: format!("memory upload {name}"),
                status: "1".to_owned(),
                stderr: "upload rejected".to_owned(),
            });
        }
        let mut releases = self.releases.borrow_mut();
        let stored = releases.get_mut(tag).ok_or_else(|| Self::not_found(tag))?;
        stored.assets.push(name);
        Ok(())
    }
}
