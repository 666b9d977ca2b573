use crate::events::TriggerKind;

/// Chat line announcing the relic saved the player and lost power.
pub const START_PATTERN: &str =
    "Your Undying Retribution Relic saves your life. The Relic has lost power for 3 minutes.";

/// Chat line announcing the relic is charged again.
pub const RESET_PATTERN: &str = "Your Undying Retribution relic is now ready.";

/// A literal substring whose presence in a log line fires a trigger.
/// Matching is case-sensitive containment, nothing fancier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerPattern {
    pub kind: TriggerKind,
    pub substring: String,
}

impl TriggerPattern {
    pub fn new(kind: TriggerKind, substring: impl Into<String>) -> Self {
        Self {
            kind,
            substring: substring.into(),
        }
    }

    pub fn matches(&self, line: &str) -> bool {
        line.contains(&self.substring)
    }
}

/// The two patterns the tailer scans for.
#[derive(Debug, Clone)]
pub struct TriggerSet {
    start: TriggerPattern,
    reset: TriggerPattern,
}

impl TriggerSet {
    pub fn new(start_pattern: impl Into<String>, reset_pattern: impl Into<String>) -> Self {
        Self {
            start: TriggerPattern::new(TriggerKind::Start, start_pattern),
            reset: TriggerPattern::new(TriggerKind::Reset, reset_pattern),
        }
    }

    /// Classify one raw log line. Start is tested first on purpose: a line
    /// containing both substrings counts as a Start, never both.
    pub fn classify(&self, line: &str) -> Option<TriggerKind> {
        if self.start.matches(line) {
            Some(TriggerKind::Start)
        } else if self.reset.matches(line) {
            Some(TriggerKind::Reset)
        } else {
            None
        }
    }
}

impl Default for TriggerSet {
    fn default() -> Self {
        Self::new(START_PATTERN, RESET_PATTERN)
    }
}
