//! Reminder engine — the loop that checks and delivers due reminders.
//! Uses tokio::interval for zero-overhead ticking (sleeps between checks).

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use huddle_core::traits::Channel;
use huddle_store::{Reminder, Store};

/// Scans the store each tick and pushes due reminders out to attendees.
pub struct ReminderEngine {
    store: Arc<Store>,
}

impl ReminderEngine {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// One tick. The due set is copied out before any delivery, so the store
    /// lock is never held across a send. Delivery failures leave the row in
    /// place for the next tick — at-least-once, never lost.
    ///
    /// Returns the number of reminders delivered and removed.
    pub async fn tick(&self, channel: &dyn Channel, now: DateTime<Utc>) -> usize {
        let due = self.store.due_reminders(now);
        if due.is_empty() {
            return 0;
        }
        tracing::debug!("{} reminders due", due.len());

        let mut delivered_total = 0;
        for (attendee, reminders) in group_by_attendee(due) {
            let mut delivered_ids = Vec::new();
            for reminder in &reminders {
                // The event may have been deleted since the scan copied this
                // row out; its reminders are already cascaded, so just drop it.
                let Some(event) = self.store.event(&reminder.event_name) else {
                    delivered_ids.push(reminder.id.clone());
                    continue;
                };
                let text = format!(
                    "Reminder: {} starts {} at {} {}.",
                    event.name,
                    event.date.format("%Y-%m-%d"),
                    event.time.format("%I:%M%p"),
                    event.timezone,
                );
                if let Err(e) = channel.send_direct(&attendee, &text).await {
                    tracing::warn!("Reminder delivery to {attendee} failed: {e}");
                    // Skip to the next attendee; their remaining reminders
                    // stay undelivered and are retried next tick.
                    break;
                }
                delivered_ids.push(reminder.id.clone());
                delivered_total += 1;
            }
            if !delivered_ids.is_empty() {
                if let Err(e) = self.store.mark_delivered(&delivered_ids) {
                    tracing::warn!("Failed to clear delivered reminders: {e}");
                }
            }
        }
        delivered_total
    }
}

/// Group due reminders per attendee, preserving scan order within a group.
fn group_by_attendee(due: Vec<Reminder>) -> Vec<(String, Vec<Reminder>)> {
    let mut groups: Vec<(String, Vec<Reminder>)> = Vec::new();
    for reminder in due {
        match groups.iter_mut().find(|(a, _)| *a == reminder.attendee) {
            Some((_, list)) => list.push(reminder),
            None => groups.push((reminder.attendee.clone(), vec![reminder])),
        }
    }
    groups
}

/// Spawnable scheduler loop. Ticks until process shutdown; a failed tick
/// never kills the loop.
pub async fn spawn_reminder_loop(
    engine: ReminderEngine,
    channel: Arc<dyn Channel>,
    poll_secs: u64,
) {
    tracing::info!("Reminder scheduler started (check every {poll_secs}s)");
    let mut interval = tokio::time::interval(Duration::from_secs(poll_secs.max(1)));
    loop {
        interval.tick().await;
        let delivered = engine.tick(channel.as_ref(), Utc::now()).await;
        if delivered > 0 {
            tracing::info!("Delivered {delivered} reminders");
        }
    }
}
