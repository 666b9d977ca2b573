use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    /// The relic fired and lost power; the cooldown begins.
    Start,
    /// The relic regained power; the cooldown is over.
    Reset,
}

/// A classified log line, stamped when the watcher saw it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerEvent {
    pub kind: TriggerKind,
    pub line: String,
    pub timestamp: DateTime<Local>,
}

impl TriggerEvent {
    pub fn new(kind: TriggerKind, line: impl Into<String>) -> Self {
        Self {
            kind,
            line: line.into(),
            timestamp: Local::now(),
        }
    }
}

/// Everything that flows through the single consumer channel. Trigger events
/// come from the tailer thread, ticks from the controller's ticker thread;
/// the receiving loop is the only writer of countdown state.
#[derive(Debug, Clone)]
pub enum AppEvent {
    Trigger(TriggerEvent),
    Tick,
    /// The tailed file became unreadable; the watcher has stopped.
    StreamLost(String),
    Quit,
}
