//! Command dispatcher. Classifies an inbound line by its first token,
//! tokenizes the remainder, runs the command's validation chain and performs
//! at most one store mutation. Unknown keywords are ignored — most messages
//! are ordinary chat, not commands.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};

use huddle_core::error::HuddleError;
use huddle_store::{EventPatch, ReplyOutcome, ReplyStatus, Store};

use crate::format::{format_events, format_single_event};
use crate::rules::{
    contains_digit, first_failure, is_known_timezone, is_reply_status, is_today_or_tomorrow,
    is_valid_date, is_valid_time, Rule, MSG_BAD_DATE, MSG_BAD_DAY, MSG_BAD_FIELD, MSG_BAD_OFFSET,
    MSG_BAD_STATUS, MSG_BAD_TIME, MSG_BAD_TIMEZONE, MSG_NO_EVENT,
};
use crate::tokenizer::tokenize;

const MSG_TOO_FEW: &str = "Invalid input: too few parameters. See list-commands.";
const MSG_TOO_MANY: &str = "Invalid input: too many parameters. See list-commands.";

/// Command catalog with usage examples, rendered by list-commands.
const COMMANDS: &[(&str, &str)] = &[
    (
        "schedule",
        "schedule \"Game Night\" 2017-06-01 05:30PM PST \"Bring your own beer.\"",
    ),
    ("reply", "reply \"Game Night\" yes"),
    ("events", "events 2017-06-01"),
    ("event", "event \"Game Night\""),
    ("edit-event", "edit-event \"Game Night\" time 06:30PM"),
    ("delete-event", "delete-event \"Game Night\""),
    ("remind", "remind \"Game Night\" 30 minutes"),
    ("list-commands", "list-commands"),
];

/// Routes command lines to handlers. Each handler is a pure function of
/// (tokens, requesting author, store) and returns the response text.
pub struct Dispatcher {
    store: Arc<Store>,
    prefix: String,
}

impl Dispatcher {
    pub fn new(store: Arc<Store>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    /// Handle one inbound line. `None` means the message is not a command
    /// and deserves no reply.
    pub fn dispatch(&self, content: &str, author: &str) -> Option<String> {
        let trimmed = content.trim();
        let (first, rest) = trimmed
            .split_once(char::is_whitespace)
            .unwrap_or((trimmed, ""));
        let keyword = first.strip_prefix(self.prefix.as_str())?;
        let tokens = tokenize(rest);

        let response = match keyword.to_lowercase().as_str() {
            "schedule" => self.schedule(&tokens, author),
            "reply" => self.reply(&tokens, author),
            "events" => self.events(&tokens),
            "event" => self.event(&tokens),
            "edit-event" => self.edit_event(&tokens, author),
            "delete-event" => self.delete_event(&tokens, author),
            "remind" => self.remind(&tokens, author),
            "list-commands" => self.list_commands(),
            other => {
                tracing::debug!("Ignoring unknown keyword '{other}'");
                return None;
            }
        };
        Some(response)
    }

    fn schedule(&self, tokens: &[String], author: &str) -> String {
        match tokens.len() {
            n if n < 5 => return MSG_TOO_FEW.into(),
            n if n > 5 => return MSG_TOO_MANY.into(),
            _ => {}
        }
        let checks = [
            (
                Rule::new(MSG_BAD_DATE, |a: &[&str]| is_valid_date(a[0])),
                vec![tokens[1].as_str()],
            ),
            (
                Rule::new(MSG_BAD_TIME, |a: &[&str]| is_valid_time(a[0])),
                vec![tokens[2].as_str()],
            ),
            (
                Rule::new(MSG_BAD_TIMEZONE, |a: &[&str]| is_known_timezone(a[0])),
                vec![tokens[3].as_str()],
            ),
        ];
        if let Some(msg) = first_failure(&checks) {
            return msg.into();
        }
        let Ok(date) = NaiveDate::parse_from_str(&tokens[1], "%Y-%m-%d") else {
            return MSG_BAD_DATE.into();
        };
        let Ok(time) = NaiveTime::parse_from_str(&tokens[2].to_uppercase(), "%I:%M%p") else {
            return MSG_BAD_TIME.into();
        };

        match self
            .store
            .create_event(&tokens[0], date, time, &tokens[3], &tokens[4], author)
        {
            Ok(event) => format!(
                "{} event successfully recorded. Others may now reply to this event.",
                event.name
            ),
            Err(e) => store_failure(e, "Cannot insert record into the Event table."),
        }
    }

    fn reply(&self, tokens: &[String], author: &str) -> String {
        match tokens.len() {
            n if n < 2 => return MSG_TOO_FEW.into(),
            n if n > 2 => return MSG_TOO_MANY.into(),
            _ => {}
        }
        let checks = [
            (
                Rule::new(MSG_NO_EVENT, |a: &[&str]| self.store.event_exists(a[0])),
                vec![tokens[0].as_str()],
            ),
            (
                Rule::new(MSG_BAD_STATUS, |a: &[&str]| is_reply_status(a[0])),
                vec![tokens[1].as_str()],
            ),
        ];
        if let Some(msg) = first_failure(&checks) {
            return msg.into();
        }
        let Some(status) = ReplyStatus::parse(&tokens[1]) else {
            return MSG_BAD_STATUS.into();
        };

        match self.store.upsert_reply(&tokens[0], author, status) {
            Ok(ReplyOutcome::Recorded) => "Your reply has been successfully recorded.".into(),
            Ok(ReplyOutcome::Updated) => {
                format!("Your old reply has been updated to {status}.")
            }
            Err(e) => store_failure(e, "Cannot insert record into the Reply table."),
        }
    }

    fn events(&self, tokens: &[String]) -> String {
        match tokens.len() {
            0 => format_events(&self.store.all_events()),
            1 => {
                let arg = &tokens[0];
                if contains_digit(arg) {
                    if !is_valid_date(arg) {
                        return MSG_BAD_DATE.into();
                    }
                    let Ok(date) = NaiveDate::parse_from_str(arg, "%Y-%m-%d") else {
                        return MSG_BAD_DATE.into();
                    };
                    format_events(&self.store.events_on(date))
                } else {
                    if !is_today_or_tomorrow(arg) {
                        return MSG_BAD_DAY.into();
                    }
                    let today = chrono::Local::now().date_naive();
                    let date = if arg.eq_ignore_ascii_case("today") {
                        today
                    } else {
                        today + chrono::Duration::days(1)
                    };
                    format_events(&self.store.events_on(date))
                }
            }
            _ => MSG_TOO_MANY.into(),
        }
    }

    fn event(&self, tokens: &[String]) -> String {
        match tokens.len() {
            n if n < 1 => return MSG_TOO_FEW.into(),
            n if n > 1 => return MSG_TOO_MANY.into(),
            _ => {}
        }
        match self.store.event(&tokens[0]) {
            Some(event) => {
                let replies = self.store.replies_for(&event.name);
                format_single_event(&event, &replies)
            }
            None => MSG_NO_EVENT.into(),
        }
    }

    fn edit_event(&self, tokens: &[String], author: &str) -> String {
        if tokens.len() < 3 {
            return MSG_TOO_FEW.into();
        }
        let (name, pairs) = (&tokens[0], &tokens[1..]);
        if pairs.len() % 2 != 0 {
            return MSG_TOO_FEW.into();
        }

        let mut patch = EventPatch::default();
        for pair in pairs.chunks(2) {
            let (field, value) = (pair[0].to_lowercase(), &pair[1]);
            if !self.store.is_editable_event_field(&field) {
                return MSG_BAD_FIELD.into();
            }
            match field.as_str() {
                "date" => {
                    if !is_valid_date(value) {
                        return MSG_BAD_DATE.into();
                    }
                    let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") else {
                        return MSG_BAD_DATE.into();
                    };
                    patch.date = Some(date);
                }
                "time" => {
                    let Ok(time) = NaiveTime::parse_from_str(&value.to_uppercase(), "%I:%M%p")
                    else {
                        return MSG_BAD_TIME.into();
                    };
                    patch.time = Some(time);
                }
                "timezone" => {
                    if !is_known_timezone(value) {
                        return MSG_BAD_TIMEZONE.into();
                    }
                    patch.timezone = Some(value.to_string());
                }
                "description" => patch.description = Some(value.to_string()),
                _ => return MSG_BAD_FIELD.into(),
            }
        }

        match self.store.edit_event(name, author, patch) {
            Ok(()) => format!("{name} event successfully updated."),
            Err(e) => store_failure(e, "Cannot update the Event table."),
        }
    }

    fn delete_event(&self, tokens: &[String], author: &str) -> String {
        match tokens.len() {
            n if n < 1 => return MSG_TOO_FEW.into(),
            n if n > 1 => return MSG_TOO_MANY.into(),
            _ => {}
        }
        if !self.store.event_exists(&tokens[0]) {
            return MSG_NO_EVENT.into();
        }
        match self.store.delete_event(&tokens[0], author) {
            Ok(()) => "Event successfully deleted.".into(),
            Err(e) => store_failure(e, "Cannot connect to the Event table."),
        }
    }

    fn remind(&self, tokens: &[String], author: &str) -> String {
        match tokens.len() {
            n if n < 3 => return MSG_TOO_FEW.into(),
            n if n > 3 => return MSG_TOO_MANY.into(),
            _ => {}
        }
        let checks = [
            (
                Rule::new(MSG_NO_EVENT, |a: &[&str]| self.store.event_exists(a[0])),
                vec![tokens[0].as_str()],
            ),
            (
                Rule::new(MSG_BAD_OFFSET, |a: &[&str]| contains_digit(a[0])),
                vec![tokens[1].as_str()],
            ),
        ];
        if let Some(msg) = first_failure(&checks) {
            return msg.into();
        }
        let value = match tokens[1].parse::<u32>() {
            Ok(v) if v > 0 => v,
            _ => return MSG_BAD_OFFSET.into(),
        };

        match self
            .store
            .create_reminder(&tokens[0], author, value, &tokens[2])
        {
            Ok(r) => format!(
                "Reminder set. You'll get a message {} {} before {} starts.",
                r.offset_value, r.offset_unit, r.event_name
            ),
            Err(e) => store_failure(e, "Cannot insert record into the Reminder table."),
        }
    }

    fn list_commands(&self) -> String {
        let mut out = String::from("**COMMANDS**\n```");
        for (name, example) in COMMANDS {
            out.push_str(&format!(
                "{prefix}{name}: \n\t {prefix}{example}\n\n",
                prefix = self.prefix
            ));
        }
        out.push_str("```");
        out
    }
}

/// Map a store error to response text. Storage faults collapse to a fixed
/// "cannot record" message; precondition errors carry their own wording.
fn store_failure(err: HuddleError, storage_msg: &str) -> String {
    match err {
        HuddleError::Storage(detail) => {
            tracing::error!("Store failure: {detail}");
            storage_msg.to_string()
        }
        other => other.to_string(),
    }
}
