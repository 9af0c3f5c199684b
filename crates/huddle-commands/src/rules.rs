//! Input-validation rules. A rule pairs a predicate over string arguments
//! with a fixed user-facing failure message; the dispatcher evaluates a
//! command's rules left-to-right and surfaces the first failure verbatim.

use chrono::{NaiveDate, NaiveTime};

use huddle_store::{tz, ReplyStatus};

/// A named check the dispatcher runs before touching the store.
pub struct Rule<'r> {
    cond: Box<dyn Fn(&[&str]) -> bool + 'r>,
    msg: &'static str,
}

impl<'r> Rule<'r> {
    pub fn new(msg: &'static str, cond: impl Fn(&[&str]) -> bool + 'r) -> Self {
        Self {
            cond: Box::new(cond),
            msg,
        }
    }

    /// Evaluate the predicate. Arguments are spread positionally.
    pub fn passes(&self, args: &[&str]) -> bool {
        (self.cond)(args)
    }

    pub fn msg(&self) -> &'static str {
        self.msg
    }
}

/// Evaluate rules in order; the first failing rule's message wins.
pub fn first_failure(checks: &[(Rule<'_>, Vec<&str>)]) -> Option<&'static str> {
    checks
        .iter()
        .find(|(rule, args)| !rule.passes(args))
        .map(|(rule, _)| rule.msg())
}

// ── Canonical predicates ──

/// Strict `YYYY-MM-DD`, zero-padded.
pub fn is_valid_date(s: &str) -> bool {
    s.len() == 10 && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

/// `HH:MM` with a trailing am/pm marker, case-insensitive.
pub fn is_valid_time(s: &str) -> bool {
    NaiveTime::parse_from_str(&s.to_uppercase(), "%I:%M%p").is_ok()
}

pub fn is_known_timezone(s: &str) -> bool {
    tz::is_known(s)
}

pub fn is_reply_status(s: &str) -> bool {
    ReplyStatus::parse(s).is_some()
}

pub fn contains_digit(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_digit())
}

pub fn is_today_or_tomorrow(s: &str) -> bool {
    matches!(s.to_lowercase().as_str(), "today" | "tomorrow")
}

// ── Canonical failure messages ──

pub const MSG_BAD_DATE: &str = "Invalid date format. Use: YYYY-MM-DD i.e. 2017-01-01";
pub const MSG_BAD_TIME: &str = "Invalid time format. Use: HH:MMPP i.e. 07:58PM";
pub const MSG_BAD_TIMEZONE: &str = "Invalid timezone. Use an abbreviation i.e. PST";
pub const MSG_BAD_STATUS: &str = "Invalid input. Use: yes, no, or maybe.";
pub const MSG_BAD_DAY: &str = "Invalid day format. Use: today or tomorrow.";
pub const MSG_NO_EVENT: &str = "Invalid input. Event not yet created.";
pub const MSG_BAD_FIELD: &str =
    "Unknown event field. Use: date, time, timezone, or description.";
pub const MSG_BAD_OFFSET: &str = "Invalid offset. Use a positive whole number i.e. 30";
