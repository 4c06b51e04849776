//! Document store the console data lives in.
//!
//! The store is deliberately dumb: it knows about collections of JSON documents, field-equality
//! filters, lookups by ID list and atomic batches of writes. Cross-document invariants are the
//! business of the callers, see [`crate::relation`].

pub mod ddb;
pub mod memory;

use std::cmp::Ordering;
use std::error::Error;
use std::fmt::{Display, Formatter};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

pub use ddb::DdbStore;
pub use memory::MemoryStore;

pub type Document = serde_json::Map<String, Value>;

/// Upper bound on the number of IDs a single [`DocumentStore::get_many`] call accepts.
pub const MAX_IDS_PER_LOOKUP: usize = 30;

/// Field every document carries its own ID under.
pub const ID_FIELD: &str = "id";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Users,
    Students,
    Teachers,
    Groups,
    Subjects,
    Journals,
    JournalEntries,
    Schedules,
    Chats,
    Messages,
    Notifications,
    News,
    Comments,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Document {collection}/{id} does not exist.")]
    Missing { collection: Collection, id: String },

    /// The document changed between the read an update was based on and the commit.
    #[error("Document {collection}/{id} was changed concurrently.")]
    Conflict { collection: Collection, id: String },

    #[error("Lookup of {requested} IDs exceeds the limit of {limit}.")]
    BatchTooLarge { requested: usize, limit: usize },

    #[error("Malformed document: {0}.")]
    Serialization(#[from] serde_json::Error),

    #[error("Remote store operation failed: {0}.")]
    Remote(Box<dyn Error + Send + Sync>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Order {
    Ascending,
    Descending,
}

/// Field-equality query with optional ordering and limit.
#[derive(Clone, Debug, Default)]
pub struct Filter {
    pub conditions: Vec<(String, Value)>,
    pub order_by: Option<(String, Order)>,
    pub limit: Option<usize>,
}

/// Partial modification of a single field.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldChange {
    Set(String, Value),
    /// Resets a reference to the empty string. The field itself is kept.
    Clear(String),
    /// Appends the values that are not present yet.
    ArrayUnion(String, Vec<Value>),
    ArrayRemove(String, Vec<Value>),
    ServerTimestamp(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum WriteOp {
    Put {
        collection: Collection,
        id: String,
        document: Document,
    },
    /// Fails the whole batch if the document does not exist.
    Update {
        collection: Collection,
        id: String,
        changes: Vec<FieldChange>,
    },
    Delete {
        collection: Collection,
        id: String,
    },
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError>;

    async fn find(&self, collection: Collection, filter: &Filter) -> Result<Vec<Document>, StoreError>;

    /// Fetches up to [`MAX_IDS_PER_LOOKUP`] documents by ID. Unknown IDs are skipped; results follow
    /// the order of `ids`.
    async fn get_many(&self, collection: Collection, ids: &[String]) -> Result<Vec<Document>, StoreError>;

    /// Applies every operation or none of them.
    async fn commit(&self, ops: Vec<WriteOp>) -> Result<(), StoreError>;
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Students => "students",
            Self::Teachers => "teachers",
            Self::Groups => "groups",
            Self::Subjects => "subjects",
            Self::Journals => "journals",
            Self::JournalEntries => "journalEntries",
            Self::Schedules => "schedules",
            Self::Chats => "chats",
            Self::Messages => "messages",
            Self::Notifications => "notifications",
            Self::News => "news",
            Self::Comments => "comments",
        }
    }
}

impl Display for Collection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, order: Order) -> Self {
        self.order_by = Some((field.into(), order));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, document: &Document) -> bool {
        self.conditions
            .iter()
            .all(|(field, expected)| document.get(field) == Some(expected))
    }

    /// Sorts and truncates documents that already passed [`Filter::matches`].
    pub fn arrange(&self, mut documents: Vec<Document>) -> Vec<Document> {
        if let Some((field, order)) = &self.order_by {
            documents.sort_by(|a, b| {
                let ord = compare_values(a.get(field), b.get(field));
                match order {
                    Order::Ascending => ord,
                    Order::Descending => ord.reverse(),
                }
            });
        }
        if let Some(limit) = self.limit {
            documents.truncate(limit);
        }
        documents
    }
}

impl WriteOp {
    pub fn target(&self) -> (Collection, &str) {
        match self {
            Self::Put { collection, id, .. } | Self::Update { collection, id, .. } | Self::Delete { collection, id } => {
                (*collection, id.as_str())
            }
        }
    }
}

impl FieldChange {
    pub fn field(&self) -> &str {
        match self {
            Self::Set(f, _) | Self::Clear(f) | Self::ArrayUnion(f, _) | Self::ArrayRemove(f, _) | Self::ServerTimestamp(f) => f,
        }
    }

    /// Whether applying the change depends on the current value of the field.
    pub fn reads_current(&self) -> bool {
        matches!(self, Self::ArrayUnion(..) | Self::ArrayRemove(..))
    }
}

/// Applies `changes` in order on top of `document`. Array operations on a missing or non-array
/// field start from an empty array.
pub fn apply_changes(document: &mut Document, changes: &[FieldChange], now: DateTime<Utc>) {
    for change in changes {
        match change {
            FieldChange::Set(field, value) => {
                document.insert(field.clone(), value.clone());
            }
            FieldChange::Clear(field) => {
                document.insert(field.clone(), Value::String(String::new()));
            }
            FieldChange::ArrayUnion(field, values) => {
                let array = array_field(document, field);
                for value in values {
                    if !array.contains(value) {
                        array.push(value.clone());
                    }
                }
            }
            FieldChange::ArrayRemove(field, values) => {
                array_field(document, field).retain(|v| !values.contains(v));
            }
            FieldChange::ServerTimestamp(field) => {
                document.insert(field.clone(), Value::String(now.to_rfc3339()));
            }
        }
    }
}

fn array_field<'a>(document: &'a mut Document, field: &str) -> &'a mut Vec<Value> {
    let slot = document.entry(field.to_owned()).or_insert_with(|| Value::Array(Vec::new()));
    if !slot.is_array() {
        *slot = Value::Array(Vec::new());
    }
    match slot {
        Value::Array(array) => array,
        _ => unreachable!("slot was just replaced with an array"),
    }
}

/// Total order used for `order_by`: missing values sort last, numbers numerically, RFC 3339
/// timestamps chronologically, everything else by its string form.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(f64::NAN), y.as_f64().unwrap_or(f64::NAN));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => {
            match (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y)) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}
