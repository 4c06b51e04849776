use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{
    apply_changes, Collection, Document, DocumentStore, Filter, StoreError, WriteOp, ID_FIELD, MAX_IDS_PER_LOOKUP,
};

type Collections = HashMap<Collection, BTreeMap<String, Document>>;

/// In-process store used for local runs and tests.
///
/// Batches are applied to a staged copy and only swapped in once every operation succeeded, which
/// gives the same all-or-nothing behavior as the remote store.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
    queries: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of read queries served so far (`get`, `find`, `get_many`).
    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn count_query(&self) {
        self.queries.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        self.count_query();
        let collections = self.collections.read().await;
        Ok(collections.get(&collection).and_then(|docs| docs.get(id)).cloned())
    }

    async fn find(&self, collection: Collection, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        self.count_query();
        let collections = self.collections.read().await;
        let matching = collections
            .get(&collection)
            .map(|docs| docs.values().filter(|doc| filter.matches(doc)).cloned().collect())
            .unwrap_or_default();
        Ok(filter.arrange(matching))
    }

    async fn get_many(&self, collection: Collection, ids: &[String]) -> Result<Vec<Document>, StoreError> {
        if ids.len() > MAX_IDS_PER_LOOKUP {
            return Err(StoreError::BatchTooLarge {
                requested: ids.len(),
                limit: MAX_IDS_PER_LOOKUP,
            });
        }

        self.count_query();
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(&collection) else {
            return Ok(Vec::new());
        };
        Ok(ids.iter().filter_map(|id| docs.get(id)).cloned().collect())
    }

    async fn commit(&self, ops: Vec<WriteOp>) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let mut staged = collections.clone();
        let now = Utc::now();

        for op in ops {
            match op {
                WriteOp::Put {
                    collection,
                    id,
                    mut document,
                } => {
                    document.insert(ID_FIELD.to_owned(), Value::String(id.clone()));
                    staged.entry(collection).or_default().insert(id, document);
                }
                WriteOp::Update { collection, id, changes } => {
                    let document = staged
                        .get_mut(&collection)
                        .and_then(|docs| docs.get_mut(&id))
                        .ok_or(StoreError::Missing { collection, id: id.clone() })?;
                    apply_changes(document, &changes, now);
                }
                WriteOp::Delete { collection, id } => {
                    if let Some(docs) = staged.get_mut(&collection) {
                        docs.remove(&id);
                    }
                }
            }
        }

        *collections = staged;
        Ok(())
    }
}
