//! Thin, mockable wrappers around the DynamoDB operations used by the services.
//!
//! Each operation gets its own trait so repositories can declare exactly what they need, e.g.
//! `impl<T: GetItem + Scan> ...`, and tests can stub a single call.

pub mod adapter;
pub mod batch_get_item;
pub mod document;
pub mod get_item;
pub mod scan;
pub mod transact_write_items;

pub use adapter::Adapter;
