//! Presentation of event listings and rosters as fixed-width code blocks.

use huddle_store::{Event, Reply, ReplyStatus};

/// Render a date/time pair the way commands accept them.
fn date_col(event: &Event) -> String {
    event.date.format("%Y-%m-%d").to_string()
}

fn time_col(event: &Event) -> String {
    event.time.format("%I:%M%p").to_string()
}

/// Multi-event table, one row per event in listing order.
pub fn format_events(events: &[Event]) -> String {
    let mut out = String::from("**EVENTS**\n");
    out.push_str(&format!(
        "```{:<12} {:<25} {:<10} {:<7} {:<8}\n",
        "Host", "Name", "Date", "Time", "Timezone"
    ));
    for event in events {
        out.push_str(&format!(
            "{:<12} {:<25} {:<10} {:<7} {:<8}\n",
            event.author,
            clip(&event.name, 25),
            date_col(event),
            time_col(event),
            event.timezone
        ));
    }
    out.push_str("```");
    out
}

/// One event with its description and the RSVP roster grouped by status.
pub fn format_single_event(event: &Event, replies: &[Reply]) -> String {
    let mut out = format!("**{}**\n", event.name);
    out.push_str(&format!(
        "```{:<12} {:<15} {:<10} {:<7} {:<8}\n",
        "Host", "Name", "Date", "Time", "Timezone"
    ));
    out.push_str(&format!(
        "{:<12} {:<15} {:<10} {:<7} {:<8}\n\n{}\n\n",
        event.author,
        clip(&event.name, 15),
        date_col(event),
        time_col(event),
        event.timezone,
        event.description
    ));

    out.push_str(&format!("Yes: {}\n", roster(replies, ReplyStatus::Yes)));
    out.push_str(&format!("No: {}\n", roster(replies, ReplyStatus::No)));
    out.push_str(&format!("Maybe: {}", roster(replies, ReplyStatus::Maybe)));
    out.push_str("```");
    out
}

fn roster(replies: &[Reply], status: ReplyStatus) -> String {
    replies
        .iter()
        .filter(|r| r.status == status)
        .map(|r| r.author.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Truncate long names at a character boundary, marking the cut.
fn clip(name: &str, max: usize) -> String {
    if name.chars().count() <= max {
        name.to_string()
    } else {
        let cut: String = name.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}
