use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::{TransactWriteItemsError, TransactWriteItemsErrorKind};
use aws_sdk_dynamodb::model::{AttributeValue, CancellationReason, Delete, Put, TransactWriteItem, Update};
use aws_sdk_dynamodb::types::SdkError;
use chrono::{DateTime, Utc};
use common_macros::hash_map;
use serde_json::Value;
use service_core::ddb::batch_get_item::{BatchGetItem, BatchGetItemInput};
use service_core::ddb::document::{from_item, to_attribute, to_item, Item};
use service_core::ddb::get_item::{GetItem, GetItemInput};
use service_core::ddb::scan::{Scan, ScanInput};
use service_core::ddb::transact_write_items::{TransactWriteItems, TransactWriteItemsInput};

use super::{
    apply_changes, Collection, Document, DocumentStore, FieldChange, Filter, StoreError, WriteOp, ID_FIELD,
    MAX_IDS_PER_LOOKUP,
};

const UNPROCESSED_KEYS_ATTEMPTS: u32 = 5;

pub trait ThreadSafeDdbClient: GetItem + Scan + BatchGetItem + TransactWriteItems + Send + Sync {}
impl<T: GetItem + Scan + BatchGetItem + TransactWriteItems + Send + Sync> ThreadSafeDdbClient for T {}

/// DynamoDB-backed store: one table per collection, named `{table_prefix}{collection}`, with the
/// document ID as partition key.
///
/// DynamoDB has no server-side timestamps, so [`FieldChange::ServerTimestamp`] is stamped with the
/// clock of this process. Array changes are read, resolved here and written back on condition that
/// the array is unchanged; losing that race fails the commit with [`StoreError::Conflict`].
pub struct DdbStore<T: ThreadSafeDdbClient> {
    ddb: T,
    table_prefix: String,
}

impl<T: ThreadSafeDdbClient> DdbStore<T> {
    pub fn new(ddb: T, table_prefix: impl Into<String>) -> Self {
        Self {
            ddb,
            table_prefix: table_prefix.into(),
        }
    }

    fn table(&self, collection: Collection) -> String {
        format!("{}{}", self.table_prefix, collection)
    }

    async fn transact_item(&self, op: &WriteOp) -> Result<TransactWriteItem, StoreError> {
        let item = match op {
            WriteOp::Put { collection, id, document } => {
                let mut document = document.clone();
                document.insert(ID_FIELD.to_owned(), Value::String(id.clone()));
                let put = Put::builder()
                    .table_name(self.table(*collection))
                    .set_item(Some(to_item(&document)))
                    .build();
                TransactWriteItem::builder().put(put).build()
            }
            WriteOp::Update { collection, id, changes } => {
                let current = if changes.iter().any(FieldChange::reads_current) {
                    let current = self
                        .get(*collection, id)
                        .await?
                        .ok_or_else(|| StoreError::Missing {
                            collection: *collection,
                            id: id.clone(),
                        })?;
                    Some(current)
                } else {
                    None
                };
                let update = update_item(self.table(*collection), id, changes, current.as_ref(), Utc::now());
                TransactWriteItem::builder().update(update).build()
            }
            WriteOp::Delete { collection, id } => {
                let delete = Delete::builder()
                    .table_name(self.table(*collection))
                    .set_key(Some(key(id)))
                    .build();
                TransactWriteItem::builder().delete(delete).build()
            }
        };
        Ok(item)
    }
}

#[async_trait]
impl<T: ThreadSafeDdbClient> DocumentStore for DdbStore<T> {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        let input = GetItemInput::builder()
            .table_name(self.table(collection))
            .key(key(id))
            .build();
        let output = self.ddb.get_item(input).await.map_err(|e| {
            log::error!("Failed to get item from DynamoDB. Original error: {:?}.", &e);
            StoreError::Remote(e.to_string().into())
        })?;

        Ok(output.item.as_ref().map(from_item))
    }

    async fn find(&self, collection: Collection, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        let (filter_expression, names, values) = if filter.conditions.is_empty() {
            (None, None, None)
        } else {
            let mut names = HashMap::new();
            let mut values = HashMap::new();
            let mut clauses = Vec::new();
            for (idx, (field, value)) in filter.conditions.iter().enumerate() {
                names.insert(format!("#f{idx}"), field.clone());
                values.insert(format!(":v{idx}"), to_attribute(value));
                clauses.push(format!("#f{idx} = :v{idx}"));
            }
            (Some(clauses.join(" AND ")), Some(names), Some(values))
        };

        let mut documents = Vec::new();
        let mut page_start = None;
        loop {
            let input = ScanInput::builder()
                .table_name(self.table(collection))
                .exclusive_start_key(page_start.take())
                .filter_expression(filter_expression.clone())
                .expression_attribute_names(names.clone())
                .expression_attribute_values(values.clone())
                .build();
            let output = self.ddb.scan(input).await.map_err(|e| {
                log::error!("Failed to scan DynamoDB table. Original error: {:?}.", &e);
                StoreError::Remote(e.to_string().into())
            })?;

            documents.extend(output.items.unwrap_or_default().iter().map(from_item));
            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => page_start = Some(key),
                _ => break,
            }
        }

        Ok(filter.arrange(documents))
    }

    async fn get_many(&self, collection: Collection, ids: &[String]) -> Result<Vec<Document>, StoreError> {
        if ids.len() > MAX_IDS_PER_LOOKUP {
            return Err(StoreError::BatchTooLarge {
                requested: ids.len(),
                limit: MAX_IDS_PER_LOOKUP,
            });
        }

        let table = self.table(collection);
        let mut pending: Vec<Item> = {
            let mut unique = HashSet::new();
            ids.iter()
                .filter(|id| unique.insert(id.as_str()))
                .map(|id| key(id))
                .collect()
        };
        let mut found: HashMap<String, Document> = HashMap::with_capacity(pending.len());

        let mut attempt = 0;
        while !pending.is_empty() {
            if attempt == UNPROCESSED_KEYS_ATTEMPTS {
                log::error!("{} keys still unprocessed after {} attempts.", pending.len(), attempt);
                return Err(StoreError::Remote("unprocessed keys left after retries".into()));
            }
            if attempt > 0 {
                tokio::time::sleep(Duration::from_millis(50 << attempt)).await;
            }
            attempt += 1;

            let input = BatchGetItemInput::builder()
                .table_name(table.clone())
                .keys(std::mem::take(&mut pending))
                .build();
            let mut output = self.ddb.batch_get_item(input).await.map_err(|e| {
                log::error!("Failed to batch get items from DynamoDB. Original error: {:?}.", &e);
                StoreError::Remote(e.to_string().into())
            })?;

            let items = output
                .responses
                .as_mut()
                .and_then(|responses| responses.remove(&table))
                .unwrap_or_default();
            for item in items.iter() {
                let document = from_item(item);
                if let Some(Value::String(id)) = document.get(ID_FIELD) {
                    found.insert(id.clone(), document);
                }
            }

            pending = output
                .unprocessed_keys
                .as_mut()
                .and_then(|unprocessed| unprocessed.remove(&table))
                .and_then(|keys_and_attributes| keys_and_attributes.keys)
                .unwrap_or_default();
        }

        Ok(ids.iter().filter_map(|id| found.get(id)).cloned().collect())
    }

    async fn commit(&self, ops: Vec<WriteOp>) -> Result<(), StoreError> {
        if ops.is_empty() {
            return Ok(());
        }

        let mut items = Vec::with_capacity(ops.len());
        for op in ops.iter() {
            items.push(self.transact_item(op).await?);
        }

        let input = TransactWriteItemsInput::builder().items(items).build();
        self.ddb.transact_write_items(input).await.map_err(|err| {
            match cancellation_reasons(&err).and_then(|reasons| rejected_condition(&ops, reasons)) {
                Some(rejected) => {
                    log::warn!("DynamoDB transaction cancelled: {}", rejected);
                    rejected
                }
                None => {
                    log::error!("Failed to write transaction to DynamoDB. Original error: {:?}.", &err);
                    StoreError::Remote(err.to_string().into())
                }
            }
        })?;

        Ok(())
    }
}

const ID_NAME: &str = "#id";

fn key(id: &str) -> Item {
    hash_map! {
        ID_FIELD.to_owned() => AttributeValue::S(id.to_owned()),
    }
}

/// Turns an update into a `SET` expression. Array changes are resolved against `current`, which
/// must have been read right before the transaction. The write is conditioned on every such array
/// still holding the value that was read, so a concurrent change cancels the transaction instead
/// of being overwritten.
fn update_item(
    table: String,
    id: &str,
    changes: &[FieldChange],
    current: Option<&Document>,
    now: DateTime<Utc>,
) -> Update {
    let mut resolved = current.cloned().unwrap_or_default();
    apply_changes(&mut resolved, changes, now);

    let mut names = hash_map! { ID_NAME.to_owned() => ID_FIELD.to_owned() };
    let mut values = HashMap::new();
    let mut assignments = Vec::new();
    let mut conditions = vec![format!("attribute_exists({})", ID_NAME)];
    let mut seen = HashSet::new();
    for change in changes {
        let field = change.field();
        if !seen.insert(field) {
            continue;
        }
        let idx = assignments.len();
        names.insert(format!("#f{idx}"), field.to_owned());
        values.insert(format!(":v{idx}"), to_attribute(resolved.get(field).unwrap_or(&Value::Null)));
        assignments.push(format!("#f{idx} = :v{idx}"));

        let guarded = changes.iter().any(|c| c.field() == field && c.reads_current());
        match current.and_then(|doc| doc.get(field)) {
            Some(read) if guarded => {
                values.insert(format!(":c{idx}"), to_attribute(read));
                conditions.push(format!("#f{idx} = :c{idx}"));
            }
            None if guarded => conditions.push(format!("attribute_not_exists(#f{idx})")),
            _ => {}
        }
    }

    Update::builder()
        .table_name(table)
        .set_key(Some(key(id)))
        .update_expression(format!("SET {}", assignments.join(", ")))
        .condition_expression(conditions.join(" AND "))
        .set_expression_attribute_names(Some(names))
        .set_expression_attribute_values(Some(values))
        .build()
}

fn cancellation_reasons(err: &SdkError<TransactWriteItemsError>) -> Option<&[CancellationReason]> {
    let SdkError::ServiceError {
        err:
            TransactWriteItemsError {
                kind: TransactWriteItemsErrorKind::TransactionCanceledException(canceled),
                ..
            },
        ..
    } = err
    else {
        return None;
    };
    canceled.cancellation_reasons()
}

/// Error for the first operation whose condition failed. Updates of arrays are conditioned on the
/// value read before the commit, so their failure means a concurrent write; every other condition
/// only checks that the document exists.
fn rejected_condition(ops: &[WriteOp], reasons: &[CancellationReason]) -> Option<StoreError> {
    let idx = reasons
        .iter()
        .position(|reason| reason.code() == Some("ConditionalCheckFailed"))?;
    let op = ops.get(idx)?;
    let (collection, id) = op.target();
    let id = id.to_owned();

    match op {
        WriteOp::Update { changes, .. } if changes.iter().any(FieldChange::reads_current) => {
            Some(StoreError::Conflict { collection, id })
        }
        _ => Some(StoreError::Missing { collection, id }),
    }
}
