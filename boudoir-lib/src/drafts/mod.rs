//! Article drafts
//!
//! Unpublished article forms kept on the seller's side. The in-progress
//! form lives under [`CURRENT_KEY`]; saved drafts live as one JSON array
//! under [`LIST_KEY`], newest last, capped at [`DEFAULT_CAPACITY`] with the
//! oldest evicted first.

mod backend;

pub use backend::KeyValueBackend;
pub use backend::MemoryBackend;
pub use backend::SqliteBackend;

pub use crate::error::DraftError;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::model::Condition;

/// Key of the in-progress draft slot.
pub const CURRENT_KEY: &str = "article-draft";

/// Key of the saved drafts array.
pub const LIST_KEY: &str = "article-drafts";

/// Saved drafts kept before the oldest is evicted.
pub const DEFAULT_CAPACITY: usize = 10;

/// Form state of an article being written. Every field is optional or
/// free text since drafts are saved before validation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArticleDraft {
    /// Client-generated identifier.
    pub id: String,
    pub title: String,
    pub description: String,
    /// Raw price input as typed.
    pub price: String,
    pub brand: Option<String>,
    pub size: Option<String>,
    pub condition: Option<Condition>,
    pub category_id: Option<String>,
    pub images: Vec<String>,
    pub saved_at: Option<DateTime<Utc>>,
}

impl ArticleDraft {
    /// Empty draft with a fresh id.
    pub fn new() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            ..Default::default()
        }
    }

    /// A draft with no title, description, price or images.
    pub fn is_blank(&self) -> bool {
        self.title.trim().is_empty()
            && self.description.trim().is_empty()
            && self.price.trim().is_empty()
            && self.images.is_empty()
    }
}

/// Storage of article drafts.
#[async_trait]
pub trait DraftRepository: Send + Sync {
    /// Saved drafts, newest first.
    async fn list(&self) -> Result<Vec<ArticleDraft>, DraftError>;

    async fn get(&self, id: &str) -> Result<Option<ArticleDraft>, DraftError>;

    /// Saves a draft. An existing id is replaced and becomes the newest;
    /// past capacity the oldest draft is evicted.
    async fn save(&self, draft: ArticleDraft) -> Result<(), DraftError>;

    /// Removes a draft; returns whether it existed.
    async fn delete(&self, id: &str) -> Result<bool, DraftError>;

    /// The in-progress draft, if any.
    async fn current(&self) -> Result<Option<ArticleDraft>, DraftError>;

    async fn set_current(&self, draft: &ArticleDraft) -> Result<(), DraftError>;

    async fn clear_current(&self) -> Result<(), DraftError>;
}

/// Draft repository storing JSON blobs in a [`KeyValueBackend`].
///
/// # Example
///
/// ```ignore
/// use boudoir_lib::drafts::{ArticleDraft, DraftRepository, MemoryDraftStore};
///
/// let drafts = MemoryDraftStore::in_memory();
/// let mut draft = ArticleDraft::new();
/// draft.title = "Robe vintage".into();
/// drafts.save(draft).await?;
/// assert_eq!(drafts.list().await?.len(), 1);
/// ```
pub struct KeyValueDraftStore<B> {
    backend: Arc<B>,
    /// Held across each read-modify-write of the saved list; clones share it.
    list_lock: Arc<Mutex<()>>,
    capacity: usize,
}

impl<B> Clone for KeyValueDraftStore<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            list_lock: Arc::clone(&self.list_lock),
            capacity: self.capacity,
        }
    }
}

/// Draft store that lives only as long as the process.
pub type MemoryDraftStore = KeyValueDraftStore<MemoryBackend>;

impl MemoryDraftStore {
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }
}

impl<B: KeyValueBackend> KeyValueDraftStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
            list_lock: Arc::new(Mutex::new(())),
            capacity: DEFAULT_CAPACITY,
        }
    }

    /// Overrides the capacity (at least 1).
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Stored array, oldest first. An undecodable blob reads as empty and
    /// is overwritten by the next save.
    async fn load(&self) -> Result<Vec<ArticleDraft>, DraftError> {
        let Some(bytes) = self.backend.get_bytes(LIST_KEY).await? else {
            return Ok(Vec::new());
        };
        match serde_json::from_slice(&bytes) {
            Ok(drafts) => Ok(drafts),
            Err(e) => {
                log::warn!("Ignoring undecodable {} entry: {}", LIST_KEY, e);
                Ok(Vec::new())
            }
        }
    }

    async fn write(&self, drafts: &[ArticleDraft]) -> Result<(), DraftError> {
        let bytes = serde_json::to_vec(drafts)?;
        self.backend.set_bytes(LIST_KEY, bytes).await
    }
}

/// Inserts `draft` as newest, dropping any older copy and the oldest
/// entries past `capacity`. Returns how many drafts were evicted.
fn push_bounded(drafts: &mut Vec<ArticleDraft>, draft: ArticleDraft, capacity: usize) -> usize {
    drafts.retain(|d| d.id != draft.id);
    drafts.push(draft);
    let overflow = drafts.len().saturating_sub(capacity);
    drafts.drain(..overflow);
    overflow
}

#[async_trait]
impl<B: KeyValueBackend + 'static> DraftRepository for KeyValueDraftStore<B> {
    async fn list(&self) -> Result<Vec<ArticleDraft>, DraftError> {
        let mut drafts = self.load().await?;
        drafts.reverse();
        Ok(drafts)
    }

    async fn get(&self, id: &str) -> Result<Option<ArticleDraft>, DraftError> {
        Ok(self.load().await?.into_iter().find(|d| d.id == id))
    }

    async fn save(&self, mut draft: ArticleDraft) -> Result<(), DraftError> {
        draft.saved_at = Some(Utc::now());
        let _guard = self.list_lock.lock().await;
        let mut drafts = self.load().await?;
        let evicted = push_bounded(&mut drafts, draft, self.capacity);
        if evicted > 0 {
            log::debug!("Evicted {} oldest draft(s)", evicted);
        }
        self.write(&drafts).await
    }

    async fn delete(&self, id: &str) -> Result<bool, DraftError> {
        let _guard = self.list_lock.lock().await;
        let mut drafts = self.load().await?;
        let before = drafts.len();
        drafts.retain(|d| d.id != id);
        if drafts.len() == before {
            return Ok(false);
        }
        self.write(&drafts).await?;
        Ok(true)
    }

    async fn current(&self) -> Result<Option<ArticleDraft>, DraftError> {
        let Some(bytes) = self.backend.get_bytes(CURRENT_KEY).await? else {
            return Ok(None);
        };
        match serde_json::from_slice(&bytes) {
            Ok(draft) => Ok(Some(draft)),
            Err(e) => {
                log::warn!("Dropping undecodable {} entry: {}", CURRENT_KEY, e);
                self.backend.delete(CURRENT_KEY).await?;
                Ok(None)
            }
        }
    }

    async fn set_current(&self, draft: &ArticleDraft) -> Result<(), DraftError> {
        self.backend.set_bytes(CURRENT_KEY, serde_json::to_vec(draft)?).await
    }

    async fn clear_current(&self) -> Result<(), DraftError> {
        self.backend.delete(CURRENT_KEY).await
    }
}
