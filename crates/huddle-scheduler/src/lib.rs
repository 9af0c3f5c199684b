//! # Huddle Scheduler
//! The reminder engine — a periodic task that scans the store for due
//! reminders and delivers them to attendees over the channel's private-
//! address boundary, concurrently with live command handling.

pub mod engine;

pub use engine::{spawn_reminder_loop, ReminderEngine};
