//! Record definitions — the data model for events, RSVPs and reminders.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::tz;

/// A proposed session: who is hosting what, and when.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique key, case-sensitive. Immutable once set.
    pub name: String,
    /// Calendar date of the session.
    pub date: NaiveDate,
    /// Local time of day.
    pub time: NaiveTime,
    /// Timezone abbreviation, interpreted as a fixed UTC offset.
    pub timezone: String,
    pub description: String,
    /// User who scheduled the event. Immutable.
    pub author: String,
    /// Set once at insert.
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// The event's start instant in UTC, derived from its date, time and
    /// fixed-offset timezone. `None` when the abbreviation is unknown.
    pub fn start_utc(&self) -> Option<DateTime<Utc>> {
        let offset = tz::offset_for(&self.timezone)?;
        let local = self.date.and_time(self.time);
        offset
            .from_local_datetime(&local)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Partial update applied by the edit command. `name` and `author` have no
/// slot here — they are immutable by contract.
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub timezone: Option<String>,
    pub description: Option<String>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.time.is_none()
            && self.timezone.is_none()
            && self.description.is_none()
    }
}

/// One user's RSVP to one event. Keyed by (`event_name`, `author`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    pub event_name: String,
    pub author: String,
    pub status: ReplyStatus,
    pub created_at: DateTime<Utc>,
}

/// RSVP status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReplyStatus {
    Yes,
    No,
    Maybe,
}

impl ReplyStatus {
    /// Case-insensitive parse. `None` for anything outside yes/no/maybe.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "yes" => Some(Self::Yes),
            "no" => Some(Self::No),
            "maybe" => Some(Self::Maybe),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReplyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Yes => write!(f, "yes"),
            Self::No => write!(f, "no"),
            Self::Maybe => write!(f, "maybe"),
        }
    }
}

/// A one-time notification to an attendee ahead of an event's start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub event_name: String,
    pub attendee: String,
    /// Absolute fire instant, computed once at creation.
    pub fire_at: DateTime<Utc>,
    pub offset_unit: OffsetUnit,
    pub offset_value: u32,
    #[serde(default)]
    pub delivered: bool,
}

impl Reminder {
    pub fn new(
        event_name: &str,
        attendee: &str,
        fire_at: DateTime<Utc>,
        offset_unit: OffsetUnit,
        offset_value: u32,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            event_name: event_name.to_string(),
            attendee: attendee.to_string(),
            fire_at,
            offset_unit,
            offset_value,
            delivered: false,
        }
    }
}

/// Allowed reminder offset units.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OffsetUnit {
    Minutes,
    Hours,
    Days,
}

impl OffsetUnit {
    /// Case-insensitive parse, accepting singular and plural forms.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "minute" | "minutes" => Some(Self::Minutes),
            "hour" | "hours" => Some(Self::Hours),
            "day" | "days" => Some(Self::Days),
            _ => None,
        }
    }

    pub fn to_duration(self, value: u32) -> chrono::Duration {
        match self {
            Self::Minutes => chrono::Duration::minutes(i64::from(value)),
            Self::Hours => chrono::Duration::hours(i64::from(value)),
            Self::Days => chrono::Duration::days(i64::from(value)),
        }
    }
}

impl std::fmt::Display for OffsetUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Minutes => write!(f, "minutes"),
            Self::Hours => write!(f, "hours"),
            Self::Days => write!(f, "days"),
        }
    }
}
