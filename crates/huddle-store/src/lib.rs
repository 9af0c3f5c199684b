//! # Huddle Store
//! The document store owning the three record collections — Event, Reply,
//! Reminder — and the consistency rules between them. Both the command
//! dispatcher and the reminder scheduler go through this crate; nothing
//! outside it touches the collections directly.

pub mod records;
pub mod store;
pub mod tz;

pub use records::{Event, EventPatch, OffsetUnit, Reminder, Reply, ReplyStatus};
pub use store::{ReplyOutcome, Store, EDITABLE_EVENT_FIELDS, EVENT_FIELDS};
