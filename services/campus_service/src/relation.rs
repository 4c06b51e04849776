//! Bidirectional references between documents.
//!
//! The store has no foreign keys, so a membership is written on both sides in the same batch: the
//! parent keeps an array of child IDs, the child points back at its parent(s). Every relation of
//! the console is described by a [`Relation`] and maintained only through [`link`] and [`unlink`].

use serde_json::Value;

use crate::error::CampusError;
use crate::records::string;
use crate::store::{Collection, Document, DocumentStore, FieldChange, WriteOp};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cardinality {
    /// The child belongs to at most one parent; the back-reference is a string, empty when unset.
    Scalar,
    /// The child keeps an array of parent IDs.
    Many,
}

/// Copy of a scalar back-reference kept on a third document, e.g. the student's group on the user.
#[derive(Clone, Copy, Debug)]
pub struct Mirror {
    pub collection: Collection,
    /// Field of the child holding the ID of the mirror document.
    pub via: &'static str,
    pub field: &'static str,
}

#[derive(Clone, Copy, Debug)]
pub struct Relation {
    pub name: &'static str,
    pub parent: Collection,
    pub parent_field: &'static str,
    pub child: Collection,
    pub child_field: &'static str,
    pub cardinality: Cardinality,
    pub mirror: Option<Mirror>,
}

pub const STUDENT_GROUP: Relation = Relation {
    name: "student_group",
    parent: Collection::Groups,
    parent_field: "students",
    child: Collection::Students,
    child_field: "groupId",
    cardinality: Cardinality::Scalar,
    mirror: Some(Mirror {
        collection: Collection::Users,
        via: "userId",
        field: "groupId",
    }),
};

pub const TEACHER_GROUP: Relation = Relation {
    name: "teacher_group",
    parent: Collection::Groups,
    parent_field: "teachers",
    child: Collection::Teachers,
    child_field: "groups",
    cardinality: Cardinality::Many,
    mirror: None,
};

/// What a [`link`] changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkOutcome {
    /// False when both sides already held the link.
    pub changed: bool,
    /// Parent the child was detached from, for scalar relations.
    pub previous_parent: Option<String>,
}

const UPDATED_AT: &str = "updatedAt";

/// Links `child_id` to `parent_id` on both sides in one atomic batch.
///
/// Linking an existing pair again changes nothing but timestamps and reports `changed: false`.
/// Both sides are still written, which repairs a link that only one side remembers. For scalar
/// relations a child
/// that already belongs to another parent is moved: it is removed from the old parent's array in
/// the same batch.
#[tracing::instrument(skip(store, relation), fields(relation = relation.name))]
pub async fn link(
    store: &dyn DocumentStore,
    relation: &Relation,
    parent_id: &str,
    child_id: &str,
) -> Result<LinkOutcome, CampusError> {
    let parent = require(store, relation.parent, parent_id).await?;
    let child = require(store, relation.child, child_id).await?;

    let mut ops = vec![update(
        relation.parent,
        parent_id,
        FieldChange::ArrayUnion(relation.parent_field.to_owned(), vec![string(child_id)]),
    )];
    let mut outcome = LinkOutcome {
        changed: !is_linked(relation, &parent, &child, parent_id, child_id).both(),
        previous_parent: None,
    };

    match relation.cardinality {
        Cardinality::Scalar => {
            let previous = scalar_field(&child, relation.child_field);
            if !previous.is_empty() && previous != parent_id {
                if store.get(relation.parent, previous).await?.is_some() {
                    ops.push(update(
                        relation.parent,
                        previous,
                        FieldChange::ArrayRemove(relation.parent_field.to_owned(), vec![string(child_id)]),
                    ));
                } else {
                    tracing::warn!(
                        previous_parent = previous,
                        "Child points at a parent that no longer exists (PartialCascadeGap)."
                    );
                }
                outcome.previous_parent = Some(previous.to_owned());
            }
            ops.push(update(
                relation.child,
                child_id,
                FieldChange::Set(relation.child_field.to_owned(), string(parent_id)),
            ));
        }
        Cardinality::Many => ops.push(update(
            relation.child,
            child_id,
            FieldChange::ArrayUnion(relation.child_field.to_owned(), vec![string(parent_id)]),
        )),
    }

    if let Some(op) = mirror_op(store, relation, &child, FieldChange::Set(String::new(), string(parent_id))).await? {
        ops.push(op);
    }

    store.commit(ops).await?;
    tracing::debug!("Linked.");
    Ok(outcome)
}

/// Removes the link between `parent_id` and `child_id` on both sides in one atomic batch.
///
/// A scalar back-reference is cleared only if it still points at `parent_id`. Returns whether
/// either side held the link; unlinking a pair that was never linked writes nothing.
#[tracing::instrument(skip(store, relation), fields(relation = relation.name))]
pub async fn unlink(
    store: &dyn DocumentStore,
    relation: &Relation,
    parent_id: &str,
    child_id: &str,
) -> Result<bool, CampusError> {
    let parent = require(store, relation.parent, parent_id).await?;
    let child = require(store, relation.child, child_id).await?;
    if !is_linked(relation, &parent, &child, parent_id, child_id).either() {
        tracing::debug!("Nothing to unlink.");
        return Ok(false);
    }

    let mut ops = vec![update(
        relation.parent,
        parent_id,
        FieldChange::ArrayRemove(relation.parent_field.to_owned(), vec![string(child_id)]),
    )];

    match relation.cardinality {
        Cardinality::Scalar => {
            if scalar_field(&child, relation.child_field) == parent_id {
                ops.push(update(
                    relation.child,
                    child_id,
                    FieldChange::Clear(relation.child_field.to_owned()),
                ));
                if let Some(op) = mirror_op(store, relation, &child, FieldChange::Clear(String::new())).await? {
                    ops.push(op);
                }
            }
        }
        Cardinality::Many => ops.push(update(
            relation.child,
            child_id,
            FieldChange::ArrayRemove(relation.child_field.to_owned(), vec![string(parent_id)]),
        )),
    }

    store.commit(ops).await?;
    tracing::debug!("Unlinked.");
    Ok(true)
}

/// Which sides of a relation currently record a given pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Sides {
    parent: bool,
    child: bool,
}

impl Sides {
    fn both(self) -> bool {
        self.parent && self.child
    }

    fn either(self) -> bool {
        self.parent || self.child
    }
}

fn is_linked(relation: &Relation, parent: &Document, child: &Document, parent_id: &str, child_id: &str) -> Sides {
    Sides {
        parent: array_contains(parent, relation.parent_field, child_id),
        child: match relation.cardinality {
            Cardinality::Scalar => scalar_field(child, relation.child_field) == parent_id,
            Cardinality::Many => array_contains(child, relation.child_field, parent_id),
        },
    }
}

fn array_contains(document: &Document, field: &str, id: &str) -> bool {
    document
        .get(field)
        .and_then(Value::as_array)
        .map_or(false, |values| values.iter().any(|value| value.as_str() == Some(id)))
}

async fn require(store: &dyn DocumentStore, collection: Collection, id: &str) -> Result<Document, CampusError> {
    store
        .get(collection, id)
        .await?
        .ok_or_else(|| CampusError::not_found(collection, id))
}

fn update(collection: Collection, id: &str, change: FieldChange) -> WriteOp {
    WriteOp::Update {
        collection,
        id: id.to_owned(),
        changes: vec![change, FieldChange::ServerTimestamp(UPDATED_AT.to_owned())],
    }
}

fn scalar_field<'a>(document: &'a Document, field: &str) -> &'a str {
    document.get(field).and_then(Value::as_str).unwrap_or_default()
}

/// Builds the write for the mirror document, retargeting `change` to the mirror field. A missing
/// mirror document is logged and skipped so it cannot block roster changes.
async fn mirror_op(
    store: &dyn DocumentStore,
    relation: &Relation,
    child: &Document,
    change: FieldChange,
) -> Result<Option<WriteOp>, CampusError> {
    let Some(mirror) = relation.mirror else {
        return Ok(None);
    };
    let target = scalar_field(child, mirror.via);
    if target.is_empty() {
        return Ok(None);
    }
    if store.get(mirror.collection, target).await?.is_none() {
        tracing::warn!(
            mirror = %mirror.collection,
            id = target,
            "Mirror document missing, back-reference not propagated (PartialCascadeGap)."
        );
        return Ok(None);
    }

    let change = match change {
        FieldChange::Set(_, value) => FieldChange::Set(mirror.field.to_owned(), value),
        _ => FieldChange::Clear(mirror.field.to_owned()),
    };
    Ok(Some(update(mirror.collection, target, change)))
}
