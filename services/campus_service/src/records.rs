//! Typed access to the store on top of [`Record`].

use serde_json::Value;

use crate::error::CampusError;
use crate::model::Record;
use crate::store::{DocumentStore, FieldChange, Filter, WriteOp};

pub async fn fetch<R: Record>(store: &dyn DocumentStore, id: &str) -> Result<R, CampusError> {
    fetch_optional(store, id)
        .await?
        .ok_or_else(|| CampusError::not_found(R::COLLECTION, id))
}

pub async fn fetch_optional<R: Record>(store: &dyn DocumentStore, id: &str) -> Result<Option<R>, CampusError> {
    match store.get(R::COLLECTION, id).await? {
        Some(document) => Ok(Some(R::from_document(document)?)),
        None => Ok(None),
    }
}

pub async fn find<R: Record>(store: &dyn DocumentStore, filter: &Filter) -> Result<Vec<R>, CampusError> {
    store
        .find(R::COLLECTION, filter)
        .await?
        .into_iter()
        .map(|document| R::from_document(document).map_err(CampusError::from))
        .collect()
}

pub fn put<R: Record>(record: &R) -> Result<WriteOp, CampusError> {
    Ok(WriteOp::Put {
        collection: R::COLLECTION,
        id: record.id().to_owned(),
        document: record.to_document()?,
    })
}

/// Partial update that also refreshes `updatedAt`.
pub fn update<R: Record>(id: &str, mut changes: Vec<FieldChange>) -> WriteOp {
    changes.push(FieldChange::ServerTimestamp("updatedAt".to_owned()));
    WriteOp::Update {
        collection: R::COLLECTION,
        id: id.to_owned(),
        changes,
    }
}

pub fn delete<R: Record>(id: &str) -> WriteOp {
    WriteOp::Delete {
        collection: R::COLLECTION,
        id: id.to_owned(),
    }
}

pub fn string(value: &str) -> Value {
    Value::String(value.to_owned())
}
