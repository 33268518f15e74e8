//! Notification collaborator seam and reminder templates.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// When a scheduled notification fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Immediate,
    After(Duration),
}

impl Trigger {
    pub fn after_secs(secs: u64) -> Self {
        Trigger::After(Duration::from_secs(secs))
    }

    /// Delay in whole seconds, `None` for immediate delivery.
    pub fn delay_secs(&self) -> Option<u64> {
        match self {
            Trigger::Immediate => None,
            Trigger::After(d) => Some(d.as_secs()),
        }
    }
}

/// Local-notification and push-registration backend.
///
/// Implementations that can't deliver (web) return `None` and do nothing;
/// callers treat that as a normal outcome.
pub trait Notifier {
    fn schedule(&mut self, title: &str, body: &str, trigger: Trigger) -> Option<String>;

    fn cancel(&mut self, id: &str);

    fn register_for_push(&mut self) -> Option<String>;
}

/// Notifier for platforms without notification support.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn schedule(&mut self, title: &str, _body: &str, _trigger: Trigger) -> Option<String> {
        tracing::debug!("notifications unavailable, dropping '{title}'");
        None
    }

    fn cancel(&mut self, _id: &str) {}

    fn register_for_push(&mut self) -> Option<String> {
        None
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScheduledNotification {
    pub id: String,
    pub title: String,
    pub body: String,
    pub trigger: Trigger,
    pub cancelled: bool,
}

/// In-memory notifier that keeps everything it was asked to schedule.
#[derive(Clone, Debug, Default)]
pub struct RecordingNotifier {
    pub scheduled: Vec<ScheduledNotification>,
    pub push_registrations: usize,
}

impl RecordingNotifier {
    pub fn pending(&self) -> impl Iterator<Item = &ScheduledNotification> {
        self.scheduled.iter().filter(|n| !n.cancelled)
    }
}

impl Notifier for RecordingNotifier {
    fn schedule(&mut self, title: &str, body: &str, trigger: Trigger) -> Option<String> {
        let id = uuid::Uuid::new_v4().to_string();
        self.scheduled.push(ScheduledNotification {
            id: id.clone(),
            title: title.to_string(),
            body: body.to_string(),
            trigger,
            cancelled: false,
        });
        Some(id)
    }

    fn cancel(&mut self, id: &str) {
        if let Some(n) = self.scheduled.iter_mut().find(|n| n.id == id) {
            n.cancelled = true;
        }
    }

    fn register_for_push(&mut self) -> Option<String> {
        self.push_registrations += 1;
        Some("recording-token".to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubstanceKind {
    Cigarette,
    Drink,
}

/// Canned immediate reminders.
#[derive(Clone, Debug, PartialEq)]
pub enum Reminder {
    ScrollingWarning { minutes: u64 },
    ExplicitContentWarning { site: Option<String> },
    SubstanceReminder { kind: SubstanceKind },
}

impl Reminder {
    pub fn title(&self) -> &'static str {
        match self {
            Reminder::ScrollingWarning { .. } => "Stop scrolling!",
            Reminder::ExplicitContentWarning { .. } => "Caught you!",
            Reminder::SubstanceReminder { .. } => "Addiction Alert",
        }
    }

    pub fn body(&self) -> String {
        match self {
            Reminder::ScrollingWarning { minutes } => format!(
                "You've been scrolling TikTok for {minutes} minutes. Get back to work!"
            ),
            Reminder::ExplicitContentWarning { site } => format!(
                "Close {} and go do something real.",
                site.as_deref().unwrap_or("that site")
            ),
            Reminder::SubstanceReminder { kind } => match kind {
                SubstanceKind::Cigarette => "Another cigarette? Your lungs are crying.".to_string(),
                SubstanceKind::Drink => "Another drink? Your liver must hate you.".to_string(),
            },
        }
    }

    pub fn send(&self, notifier: &mut dyn Notifier) -> Option<String> {
        notifier.schedule(self.title(), &self.body(), Trigger::Immediate)
    }
}

/// Reminder armed after onboarding when social media is selected.
pub(crate) fn onboarding_reminder() -> (&'static str, &'static str) {
    (
        "Stop scrolling!",
        "You've been on TikTok for 10 minutes. Get back to work!",
    )
}
