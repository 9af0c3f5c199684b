//! The document store. Three collections live behind one mutex; every
//! operation takes the lock for its full duration, so a cascade delete and a
//! concurrent due-reminder scan can never interleave. State is mirrored to a
//! JSON document on every mutation — human-readable, git-friendly.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use huddle_core::error::{HuddleError, Result};

use crate::records::{Event, EventPatch, OffsetUnit, Reminder, Reply, ReplyStatus};

/// Field catalog for the Event collection, declared here rather than sniffed
/// from whatever keys the first record happens to have.
pub const EVENT_FIELDS: &[&str] = &[
    "name",
    "date",
    "time",
    "timezone",
    "description",
    "author",
    "created_at",
];

/// The subset of [`EVENT_FIELDS`] the edit command may touch. `name` and
/// `author` are immutable; `created_at` is server-owned.
pub const EDITABLE_EVENT_FIELDS: &[&str] = &["date", "time", "timezone", "description"];

/// Outcome of an RSVP upsert, used to word the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyOutcome {
    Recorded,
    Updated,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Collections {
    events: Vec<Event>,
    replies: Vec<Reply>,
    reminders: Vec<Reminder>,
}

/// The store. Shared as `Arc<Store>` between the dispatcher and the
/// scheduler; interior locking keeps each operation atomic.
pub struct Store {
    file: PathBuf,
    inner: Mutex<Collections>,
}

impl Store {
    /// Open (or create) the store document under the given directory.
    pub fn open(dir: &Path) -> Self {
        std::fs::create_dir_all(dir).ok();
        let file = dir.join("huddle.json");
        let collections = Self::load(&file);
        Self {
            file,
            inner: Mutex::new(collections),
        }
    }

    fn load(file: &Path) -> Collections {
        if !file.exists() {
            return Collections::default();
        }
        match std::fs::read_to_string(file) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse {}: {e}", file.display());
                Collections::default()
            }),
            Err(e) => {
                tracing::warn!("Failed to read {}: {e}", file.display());
                Collections::default()
            }
        }
    }

    fn doc(&self) -> MutexGuard<'_, Collections> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, doc: &Collections) -> Result<()> {
        let json = serde_json::to_string_pretty(doc)
            .map_err(|e| HuddleError::Storage(format!("serialize: {e}")))?;
        std::fs::write(&self.file, json)
            .map_err(|e| HuddleError::Storage(format!("write {}: {e}", self.file.display())))?;
        tracing::debug!("Saved store document to {}", self.file.display());
        Ok(())
    }

    // ── Event operations ──

    /// Insert a new event. Rejects a duplicate name without touching the
    /// existing record.
    pub fn create_event(
        &self,
        name: &str,
        date: NaiveDate,
        time: chrono::NaiveTime,
        timezone: &str,
        description: &str,
        author: &str,
    ) -> Result<Event> {
        let mut doc = self.doc();
        if doc.events.iter().any(|e| e.name == name) {
            return Err(HuddleError::AlreadyExists(name.to_string()));
        }
        let event = Event {
            name: name.to_string(),
            date,
            time,
            timezone: timezone.to_string(),
            description: description.to_string(),
            author: author.to_string(),
            created_at: Utc::now(),
        };
        doc.events.push(event.clone());
        self.persist(&doc)?;
        tracing::info!("Event created: '{name}' by {author}");
        Ok(event)
    }

    /// Apply a field patch. Only the event's own author may edit.
    pub fn edit_event(&self, name: &str, requesting_author: &str, patch: EventPatch) -> Result<()> {
        let mut doc = self.doc();
        let event = doc
            .events
            .iter_mut()
            .find(|e| e.name == name)
            .ok_or_else(|| HuddleError::NotFound(name.to_string()))?;
        if event.author != requesting_author {
            return Err(HuddleError::Forbidden(name.to_string()));
        }
        if let Some(date) = patch.date {
            event.date = date;
        }
        if let Some(time) = patch.time {
            event.time = time;
        }
        if let Some(timezone) = patch.timezone {
            event.timezone = timezone;
        }
        if let Some(description) = patch.description {
            event.description = description;
        }
        self.persist(&doc)?;
        tracing::info!("Event edited: '{name}' by {requesting_author}");
        Ok(())
    }

    /// Remove an event and cascade-remove every reply and reminder that
    /// references it. An orphaned reminder must never fire.
    pub fn delete_event(&self, name: &str, requesting_author: &str) -> Result<()> {
        let mut doc = self.doc();
        let idx = doc
            .events
            .iter()
            .position(|e| e.name == name)
            .ok_or_else(|| HuddleError::NotFound(name.to_string()))?;
        if doc.events[idx].author != requesting_author {
            return Err(HuddleError::Forbidden(name.to_string()));
        }
        doc.events.remove(idx);
        let replies_before = doc.replies.len();
        doc.replies.retain(|r| r.event_name != name);
        let reminders_before = doc.reminders.len();
        doc.reminders.retain(|r| r.event_name != name);
        self.persist(&doc)?;
        tracing::info!(
            "Event deleted: '{name}' (cascaded {} replies, {} reminders)",
            replies_before - doc.replies.len(),
            reminders_before - doc.reminders.len(),
        );
        Ok(())
    }

    // ── Reply operations ──

    /// Record or overwrite one user's RSVP. Exactly one reply exists per
    /// (event, author) pair afterwards.
    pub fn upsert_reply(
        &self,
        event_name: &str,
        author: &str,
        status: ReplyStatus,
    ) -> Result<ReplyOutcome> {
        let mut doc = self.doc();
        if !doc.events.iter().any(|e| e.name == event_name) {
            return Err(HuddleError::EventNotScheduled(event_name.to_string()));
        }
        let outcome = if let Some(reply) = doc
            .replies
            .iter_mut()
            .find(|r| r.event_name == event_name && r.author == author)
        {
            reply.status = status;
            reply.created_at = Utc::now();
            ReplyOutcome::Updated
        } else {
            doc.replies.push(Reply {
                event_name: event_name.to_string(),
                author: author.to_string(),
                status,
                created_at: Utc::now(),
            });
            ReplyOutcome::Recorded
        };
        self.persist(&doc)?;
        Ok(outcome)
    }

    // ── Reminder operations ──

    /// Create a reminder for an attendee who has RSVP'd yes. The fire
    /// instant is fixed now: event start in its stated offset, minus the
    /// requested lead time.
    pub fn create_reminder(
        &self,
        event_name: &str,
        attendee: &str,
        offset_value: u32,
        offset_unit: &str,
    ) -> Result<Reminder> {
        let mut doc = self.doc();
        let event = doc
            .events
            .iter()
            .find(|e| e.name == event_name)
            .ok_or_else(|| HuddleError::EventNotScheduled(event_name.to_string()))?;
        let affirmed = doc.replies.iter().any(|r| {
            r.event_name == event_name && r.author == attendee && r.status == ReplyStatus::Yes
        });
        if !affirmed {
            return Err(HuddleError::NoAffirmativeReply(event_name.to_string()));
        }
        let unit = OffsetUnit::parse(offset_unit)
            .ok_or_else(|| HuddleError::InvalidOffsetUnit(offset_unit.to_string()))?;
        let start = event.start_utc().ok_or_else(|| {
            HuddleError::Storage(format!("unknown timezone on event '{event_name}'"))
        })?;
        let reminder = Reminder::new(
            event_name,
            attendee,
            start - unit.to_duration(offset_value),
            unit,
            offset_value,
        );
        doc.reminders.push(reminder.clone());
        self.persist(&doc)?;
        tracing::info!(
            "Reminder set: '{event_name}' for {attendee}, {offset_value} {unit} ahead"
        );
        Ok(reminder)
    }

    /// Undelivered reminders whose fire time has arrived, in insertion order.
    pub fn due_reminders(&self, now: DateTime<Utc>) -> Vec<Reminder> {
        self.doc()
            .reminders
            .iter()
            .filter(|r| !r.delivered && r.fire_at <= now)
            .cloned()
            .collect()
    }

    /// Remove delivered reminders in one batch. A reminder is destroyed once
    /// delivered; an id that is already gone is ignored.
    pub fn mark_delivered(&self, ids: &[String]) -> Result<()> {
        let mut doc = self.doc();
        doc.reminders.retain(|r| !ids.contains(&r.id));
        self.persist(&doc)?;
        Ok(())
    }

    // ── Queries ──

    pub fn event(&self, name: &str) -> Option<Event> {
        self.doc().events.iter().find(|e| e.name == name).cloned()
    }

    pub fn event_exists(&self, name: &str) -> bool {
        self.doc().events.iter().any(|e| e.name == name)
    }

    /// All events, ordered by computed start ascending. Listing order is
    /// part of the user-facing contract and must be stable.
    pub fn all_events(&self) -> Vec<Event> {
        let mut events = self.doc().events.clone();
        Self::sort_by_start(&mut events);
        events
    }

    /// Events on one calendar date, ordered by computed start ascending.
    pub fn events_on(&self, date: NaiveDate) -> Vec<Event> {
        let mut events: Vec<Event> = self
            .doc()
            .events
            .iter()
            .filter(|e| e.date == date)
            .cloned()
            .collect();
        Self::sort_by_start(&mut events);
        events
    }

    /// Replies for an event, in insertion order.
    pub fn replies_for(&self, event_name: &str) -> Vec<Reply> {
        self.doc()
            .replies
            .iter()
            .filter(|r| r.event_name == event_name)
            .cloned()
            .collect()
    }

    /// Reminders for an event, in insertion order.
    pub fn reminders_for(&self, event_name: &str) -> Vec<Reminder> {
        self.doc()
            .reminders
            .iter()
            .filter(|r| r.event_name == event_name)
            .cloned()
            .collect()
    }

    // ── Field catalog ──

    pub fn event_fields(&self) -> &'static [&'static str] {
        EVENT_FIELDS
    }

    /// Whether the edit command may touch this field.
    pub fn is_editable_event_field(&self, field: &str) -> bool {
        EDITABLE_EVENT_FIELDS.contains(&field)
    }

    fn sort_by_start(events: &mut [Event]) {
        events.sort_by_key(|e| e.start_utc().unwrap_or(DateTime::<Utc>::MAX_UTC));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, TimeDelta};

    fn temp_store(tag: &str) -> (Store, PathBuf) {
        let dir = std::env::temp_dir().join(format!("huddle-test-{tag}"));
        std::fs::remove_dir_all(&dir).ok();
        (Store::open(&dir), dir)
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn time(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%I:%M%p").unwrap()
    }

    fn seed_event(store: &Store, name: &str, author: &str) {
        store
            .create_event(name, date("2017-06-01"), time("05:30PM"), "PST", "fun", author)
            .unwrap();
    }

    #[test]
    fn test_create_event_rejects_duplicate() {
        let (store, dir) = temp_store("dup");
        seed_event(&store, "Game Night", "lena");
        let second = store.create_event(
            "Game Night",
            date("2018-01-01"),
            time("01:00AM"),
            "EST",
            "other",
            "marco",
        );
        assert!(matches!(second, Err(HuddleError::AlreadyExists(_))));
        // first record untouched
        let event = store.event("Game Night").unwrap();
        assert_eq!(event.author, "lena");
        assert_eq!(event.timezone, "PST");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_event_names_are_case_sensitive() {
        let (store, dir) = temp_store("case");
        seed_event(&store, "Game Night", "lena");
        assert!(store
            .create_event("game night", date("2017-06-02"), time("06:00PM"), "PST", "", "lena")
            .is_ok());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_upsert_reply_overwrites() {
        let (store, dir) = temp_store("upsert");
        seed_event(&store, "Game Night", "lena");
        let first = store
            .upsert_reply("Game Night", "marco", ReplyStatus::Maybe)
            .unwrap();
        assert_eq!(first, ReplyOutcome::Recorded);
        let second = store
            .upsert_reply("Game Night", "marco", ReplyStatus::Yes)
            .unwrap();
        assert_eq!(second, ReplyOutcome::Updated);

        let replies = store.replies_for("Game Night");
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].status, ReplyStatus::Yes);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_reply_requires_event() {
        let (store, dir) = temp_store("noreply");
        let result = store.upsert_reply("Ghost Event", "marco", ReplyStatus::Yes);
        assert!(matches!(result, Err(HuddleError::EventNotScheduled(_))));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_reminder_requires_affirmative_reply() {
        let (store, dir) = temp_store("remind-gate");
        seed_event(&store, "Game Night", "lena");
        let denied = store.create_reminder("Game Night", "marco", 30, "minutes");
        assert!(matches!(denied, Err(HuddleError::NoAffirmativeReply(_))));

        store
            .upsert_reply("Game Night", "marco", ReplyStatus::No)
            .unwrap();
        let still_denied = store.create_reminder("Game Night", "marco", 30, "minutes");
        assert!(matches!(still_denied, Err(HuddleError::NoAffirmativeReply(_))));

        store
            .upsert_reply("Game Night", "marco", ReplyStatus::Yes)
            .unwrap();
        let reminder = store
            .create_reminder("Game Night", "marco", 30, "minutes")
            .unwrap();
        // 05:30PM PST == 01:30 UTC next day; minus 30 minutes
        assert_eq!(reminder.fire_at.to_rfc3339(), "2017-06-02T01:00:00+00:00");
        assert!(!reminder.delivered);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_reminder_rejects_unknown_unit() {
        let (store, dir) = temp_store("remind-unit");
        seed_event(&store, "Game Night", "lena");
        store
            .upsert_reply("Game Night", "marco", ReplyStatus::Yes)
            .unwrap();
        let result = store.create_reminder("Game Night", "marco", 2, "fortnights");
        assert!(matches!(result, Err(HuddleError::InvalidOffsetUnit(_))));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_edit_event_permission() {
        let (store, dir) = temp_store("edit");
        seed_event(&store, "Game Night", "lena");

        let patch = EventPatch {
            description: Some("new snacks".into()),
            ..EventPatch::default()
        };
        let forbidden = store.edit_event("Game Night", "marco", patch.clone());
        assert!(matches!(forbidden, Err(HuddleError::Forbidden(_))));
        assert_eq!(store.event("Game Night").unwrap().description, "fun");

        store.edit_event("Game Night", "lena", patch).unwrap();
        assert_eq!(store.event("Game Night").unwrap().description, "new snacks");

        let missing = store.edit_event("No Such", "lena", EventPatch::default());
        assert!(matches!(missing, Err(HuddleError::NotFound(_))));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_delete_event_cascades() {
        let (store, dir) = temp_store("cascade");
        seed_event(&store, "Game Night", "lena");
        seed_event(&store, "Raid Night", "lena");
        store
            .upsert_reply("Game Night", "marco", ReplyStatus::Yes)
            .unwrap();
        store
            .upsert_reply("Raid Night", "marco", ReplyStatus::Yes)
            .unwrap();
        store
            .create_reminder("Game Night", "marco", 1, "hours")
            .unwrap();
        store
            .create_reminder("Raid Night", "marco", 1, "hours")
            .unwrap();

        let forbidden = store.delete_event("Game Night", "marco");
        assert!(matches!(forbidden, Err(HuddleError::Forbidden(_))));
        assert!(store.event_exists("Game Night"));

        store.delete_event("Game Night", "lena").unwrap();
        assert!(!store.event_exists("Game Night"));
        assert!(store.replies_for("Game Night").is_empty());
        assert!(store.reminders_for("Game Night").is_empty());
        // the other event's rows survive
        assert_eq!(store.replies_for("Raid Night").len(), 1);
        assert_eq!(store.reminders_for("Raid Night").len(), 1);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_due_reminders_and_mark_delivered() {
        let (store, dir) = temp_store("due");
        seed_event(&store, "Game Night", "lena");
        store
            .upsert_reply("Game Night", "marco", ReplyStatus::Yes)
            .unwrap();
        let reminder = store
            .create_reminder("Game Night", "marco", 15, "minutes")
            .unwrap();

        let before = reminder.fire_at - TimeDelta::seconds(1);
        assert!(store.due_reminders(before).is_empty());

        let after = reminder.fire_at + TimeDelta::seconds(1);
        let due = store.due_reminders(after);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, reminder.id);

        store.mark_delivered(&[reminder.id.clone()]).unwrap();
        assert!(store.due_reminders(after).is_empty());
        assert!(store.reminders_for("Game Night").is_empty());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_event_listing_order() {
        let (store, dir) = temp_store("order");
        store
            .create_event("Late", date("2017-06-01"), time("09:00PM"), "PST", "", "lena")
            .unwrap();
        store
            .create_event("Early", date("2017-06-01"), time("08:00AM"), "PST", "", "lena")
            .unwrap();
        // same wall clock as Late but an earlier instant in UTC
        store
            .create_event("Eastern", date("2017-06-01"), time("09:00PM"), "EST", "", "lena")
            .unwrap();

        let names: Vec<String> = store
            .events_on(date("2017-06-01"))
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["Early", "Eastern", "Late"]);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_reload_from_disk() {
        let dir = std::env::temp_dir().join("huddle-test-reload");
        std::fs::remove_dir_all(&dir).ok();
        {
            let store = Store::open(&dir);
            seed_event(&store, "Game Night", "lena");
            store
                .upsert_reply("Game Night", "marco", ReplyStatus::Yes)
                .unwrap();
        }
        let reopened = Store::open(&dir);
        assert!(reopened.event_exists("Game Night"));
        assert_eq!(reopened.replies_for("Game Night").len(), 1);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_field_catalog() {
        let (store, dir) = temp_store("catalog");
        assert!(store.is_editable_event_field("date"));
        assert!(store.is_editable_event_field("description"));
        assert!(!store.is_editable_event_field("name"));
        assert!(!store.is_editable_event_field("author"));
        assert!(!store.is_editable_event_field("created_at"));
        assert!(store.event_fields().contains(&"name"));
        std::fs::remove_dir_all(&dir).ok();
    }
}
