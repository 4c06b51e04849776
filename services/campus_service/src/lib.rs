pub mod chat;
pub mod context;
pub mod error;
pub mod events;
pub mod groups;
pub mod journal;
pub mod lookup;
pub mod model;
pub mod news;
pub mod notifications;
pub mod operations;
pub mod pb;
pub mod records;
pub mod relation;
pub mod roster;
pub mod schedule;
pub mod store;
pub mod subjects;
pub mod svc;
pub mod users;
