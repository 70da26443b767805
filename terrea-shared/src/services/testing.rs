//! In-memory cache and notifier doubles for service tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::db::Repositories;
use crate::models::project::ProjectKey;
use crate::models::user::UserKey;
use crate::notifications::{EmailJob, Notifier, NotifyError};
use crate::redis::cache::{CacheKey, CachedView, ViewCache};

/// Cache backed by a `HashMap`; `mark` records a key without a value
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<CacheKey, Option<CachedView>>>,
}

impl MemoryCache {
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.lock().unwrap().contains_key(key)
    }

    pub fn mark(&self, key: CacheKey) {
        self.entries.lock().unwrap().insert(key, None);
    }
}

#[async_trait]
impl ViewCache for MemoryCache {
    async fn get(&self, key: &CacheKey) -> Option<CachedView> {
        self.entries.lock().unwrap().get(key).cloned().flatten()
    }

    async fn put(&self, key: &CacheKey, view: &CachedView) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.clone(), Some(view.clone()));
    }

    async fn invalidate(&self, key: &CacheKey) {
        self.entries.lock().unwrap().remove(key);
    }
}

/// Notifier that records jobs, or fails every dispatch when set to
#[derive(Default)]
pub struct RecordingNotifier {
    jobs: Mutex<Vec<EmailJob>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn jobs(&self) -> Vec<EmailJob> {
        self.jobs.lock().unwrap().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn dispatch(&self, job: EmailJob) -> Result<(), NotifyError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError::Timeout);
        }
        self.jobs.lock().unwrap().push(job);
        Ok(())
    }
}

/// Cache that stores nothing and records, for each invalidated key, whether
/// the row behind it still existed at that moment
pub struct InvalidationLog {
    repos: Repositories,
    entries: Mutex<Vec<(CacheKey, bool)>>,
}

impl InvalidationLog {
    pub fn new(repos: Repositories) -> Self {
        Self {
            repos,
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Whether the row existed when `key` was invalidated, if it was
    pub fn row_present_at(&self, key: &CacheKey) -> Option<bool> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .find(|(seen, _)| seen == key)
            .map(|(_, present)| *present)
    }
}

#[async_trait]
impl ViewCache for InvalidationLog {
    async fn get(&self, _key: &CacheKey) -> Option<CachedView> {
        None
    }

    async fn put(&self, _key: &CacheKey, _view: &CachedView) {}

    async fn invalidate(&self, key: &CacheKey) {
        let present = match key {
            CacheKey::Project(name) => !self
                .repos
                .projects
                .find_many(&ProjectKey::Name(name.clone()))
                .await
                .unwrap()
                .is_empty(),
            CacheKey::Profile(username) => self
                .repos
                .users
                .find_one(&UserKey::Username(username.clone()))
                .await
                .unwrap()
                .is_some(),
        };
        self.entries.lock().unwrap().push((key.clone(), present));
    }
}
