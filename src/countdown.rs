use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Local};

use crate::events::{AppEvent, TriggerKind};

/// Receives display updates from the controller. Implementations render a
/// label however they like (TUI panel, stdout line, JSON object); the
/// controller guarantees calls arrive one at a time from a single thread.
pub trait RenderSink {
    fn on_countdown(&mut self, minutes: u32, seconds: u32);
    fn on_ready(&mut self);
}

/// What the UI should currently show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayState {
    Ready,
    Counting { minutes: u32, seconds: u32 },
}

/// A [`RenderSink`] that just remembers the latest display state.
/// The TUI draws from it every frame; tests read it back directly.
#[derive(Debug, Clone, Copy)]
pub struct DisplayBuffer {
    state: DisplayState,
}

impl DisplayBuffer {
    pub fn new() -> Self {
        Self {
            state: DisplayState::Ready,
        }
    }

    pub fn state(&self) -> DisplayState {
        self.state
    }
}

impl Default for DisplayBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderSink for DisplayBuffer {
    fn on_countdown(&mut self, minutes: u32, seconds: u32) {
        self.state = DisplayState::Counting { minutes, seconds };
    }

    fn on_ready(&mut self) {
        self.state = DisplayState::Ready;
    }
}

/// Format remaining seconds as `M:SS`, e.g. `65` -> `"1:05"`.
/// Only used while counting; the idle state renders as "Ready" instead.
pub fn format_countdown(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Snapshot of the countdown pair, taken between transitions so it is never
/// torn: `running` implies `remaining_secs > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownState {
    pub remaining_secs: u32,
    pub running: bool,
    pub last_started_at: Option<DateTime<Local>>,
}

/// Sends one `Tick` into the app channel per interval until stopped.
/// Owned by the controller and kept alive only while counting, so no tick
/// wakeups happen while idle.
struct Ticker {
    stop: Arc<AtomicBool>,
}

impl Ticker {
    fn start(event_tx: Sender<AppEvent>, interval: Duration) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        thread::spawn(move || loop {
            thread::sleep(interval);
            if stop_flag.load(Ordering::SeqCst) {
                break;
            }
            if event_tx.send(AppEvent::Tick).is_err() {
                break;
            }
        });
        Self { stop }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

/// The countdown state machine. Idle until a Start trigger, then counts down
/// once per second to zero (or until a Reset trigger), rendering every
/// transition into the supplied sink.
///
/// All handlers must be called from the single thread draining the app event
/// channel; the controller owns its state outright and never locks.
pub struct CountdownController<R: RenderSink> {
    remaining_secs: u32,
    running: bool,
    last_started_at: Option<DateTime<Local>>,
    duration_secs: u32,
    tick_interval: Duration,
    event_tx: Sender<AppEvent>,
    ticker: Option<Ticker>,
    sink: R,
}

impl<R: RenderSink> CountdownController<R> {
    pub fn new(
        duration_secs: u32,
        tick_interval: Duration,
        event_tx: Sender<AppEvent>,
        sink: R,
    ) -> Self {
        Self {
            remaining_secs: 0,
            running: false,
            last_started_at: None,
            duration_secs,
            tick_interval,
            event_tx,
            ticker: None,
            sink,
        }
    }

    pub fn state(&self) -> CountdownState {
        CountdownState {
            remaining_secs: self.remaining_secs,
            running: self.running,
            last_started_at: self.last_started_at,
        }
    }

    pub fn sink(&self) -> &R {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut R {
        &mut self.sink
    }

    /// Drive the controller with one channel event. Returns `false` when the
    /// consumer loop should exit (quit requested or the log stream died).
    pub fn handle_event(&mut self, event: AppEvent) -> bool {
        match event {
            AppEvent::Trigger(trigger) => {
                match trigger.kind {
                    TriggerKind::Start => self.handle_start(self.duration_secs),
                    TriggerKind::Reset => self.handle_reset(),
                }
                true
            }
            AppEvent::Tick => {
                self.handle_tick();
                true
            }
            AppEvent::StreamLost(reason) => {
                tracing::error!("log stream lost, stopping: {}", reason);
                false
            }
            AppEvent::Quit => false,
        }
    }

    /// (Re)start the countdown at `duration_secs`, overriding any countdown
    /// already in progress. A second Start never stacks or extends.
    pub fn handle_start(&mut self, duration_secs: u32) {
        if duration_secs == 0 {
            // A zero-length countdown is already over.
            self.handle_reset();
            return;
        }
        self.remaining_secs = duration_secs;
        self.running = true;
        self.last_started_at = Some(Local::now());
        if self.ticker.is_none() {
            self.ticker = Some(Ticker::start(self.event_tx.clone(), self.tick_interval));
        }
        self.render_countdown();
    }

    /// Drop back to idle. Safe to call in any state; resetting while already
    /// idle re-renders the ready label and nothing else.
    pub fn handle_reset(&mut self) {
        self.remaining_secs = 0;
        self.running = false;
        self.ticker = None;
        self.sink.on_ready();
    }

    /// One-second tick. Ignored while idle, which also swallows any tick that
    /// was already queued when the countdown stopped.
    pub fn handle_tick(&mut self) {
        if !self.running {
            return;
        }
        self.remaining_secs -= 1;
        if self.remaining_secs > 0 {
            self.render_countdown();
        } else {
            self.running = false;
            self.ticker = None;
            self.sink.on_ready();
        }
    }

    fn render_countdown(&mut self) {
        self.sink
            .on_countdown(self.remaining_secs / 60, self.remaining_secs % 60);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::TriggerEvent;
    use std::sync::mpsc;

    /// Records every render call in order.
    struct RecordingSink {
        renders: Vec<DisplayState>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                renders: Vec::new(),
            }
        }
    }

    impl RenderSink for RecordingSink {
        fn on_countdown(&mut self, minutes: u32, seconds: u32) {
            self.renders.push(DisplayState::Counting { minutes, seconds });
        }

        fn on_ready(&mut self) {
            self.renders.push(DisplayState::Ready);
        }
    }

    fn controller(duration: u32) -> CountdownController<RecordingSink> {
        let (tx, _rx) = mpsc::channel();
        // Long tick interval so the real ticker thread never interferes with
        // the hand-driven ticks below.
        CountdownController::new(duration, Duration::from_secs(3600), tx, RecordingSink::new())
    }

    fn counting(minutes: u32, seconds: u32) -> DisplayState {
        DisplayState::Counting { minutes, seconds }
    }

    #[test]
    fn start_enters_counting_and_renders_full_duration() {
        let mut ctl = controller(180);
        ctl.handle_start(180);

        let state = ctl.state();
        assert!(state.running);
        assert_eq!(state.remaining_secs, 180);
        assert!(state.last_started_at.is_some());
        assert_eq!(ctl.sink().renders, vec![counting(3, 0)]);
    }

    #[test]
    fn start_overrides_countdown_in_progress() {
        let mut ctl = controller(180);
        ctl.handle_start(180);
        for _ in 0..5 {
            ctl.handle_tick();
        }
        assert_eq!(ctl.state().remaining_secs, 175);

        ctl.handle_start(180);
        assert_eq!(ctl.state().remaining_secs, 180);
        assert_eq!(ctl.sink().renders.last(), Some(&counting(3, 0)));
    }

    #[test]
    fn reset_while_idle_is_idempotent_but_still_renders() {
        let mut ctl = controller(180);
        ctl.handle_reset();
        ctl.handle_reset();

        let state = ctl.state();
        assert!(!state.running);
        assert_eq!(state.remaining_secs, 0);
        assert_eq!(ctl.sink().renders, vec![DisplayState::Ready, DisplayState::Ready]);
    }

    #[test]
    fn reset_cancels_countdown_in_progress() {
        let mut ctl = controller(180);
        ctl.handle_start(180);
        ctl.handle_tick();
        ctl.handle_reset();

        let state = ctl.state();
        assert!(!state.running);
        assert_eq!(state.remaining_secs, 0);
        assert_eq!(ctl.sink().renders.last(), Some(&DisplayState::Ready));
    }

    #[test]
    fn n_ticks_reach_idle_with_n_minus_one_counting_renders() {
        let mut ctl = controller(3);
        ctl.handle_start(3);
        for _ in 0..3 {
            ctl.handle_tick();
        }

        assert_eq!(
            ctl.sink().renders,
            vec![
                counting(0, 3),
                counting(0, 2),
                counting(0, 1),
                DisplayState::Ready,
            ]
        );
        let state = ctl.state();
        assert!(!state.running);
        assert_eq!(state.remaining_secs, 0);
    }

    #[test]
    fn tick_while_idle_is_a_no_op() {
        let mut ctl = controller(180);
        ctl.handle_tick();
        ctl.handle_tick();

        assert!(ctl.sink().renders.is_empty());
        assert_eq!(ctl.state().remaining_secs, 0);
    }

    #[test]
    fn running_never_observed_with_zero_remaining() {
        let mut ctl = controller(2);
        ctl.handle_start(2);
        for _ in 0..2 {
            ctl.handle_tick();
            let state = ctl.state();
            assert!(!(state.running && state.remaining_secs == 0));
        }
        ctl.handle_start(0);
        let state = ctl.state();
        assert!(!state.running);
        assert_eq!(state.remaining_secs, 0);
    }

    #[test]
    fn ticker_stops_when_leaving_counting() {
        let (tx, rx) = mpsc::channel();
        let mut ctl =
            CountdownController::new(180, Duration::from_millis(10), tx, RecordingSink::new());
        ctl.handle_start(180);

        // Ticks flow while counting.
        assert!(rx.recv_timeout(Duration::from_millis(500)).is_ok());

        ctl.handle_reset();
        // Let any tick already past the stop check land, drain, then expect silence.
        thread::sleep(Duration::from_millis(30));
        while rx.try_recv().is_ok() {}
        thread::sleep(Duration::from_millis(50));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn handle_event_dispatches_triggers_and_stops_on_quit() {
        let mut ctl = controller(180);
        assert!(ctl.handle_event(AppEvent::Trigger(TriggerEvent::new(
            TriggerKind::Start,
            "line"
        ))));
        assert!(ctl.state().running);

        assert!(ctl.handle_event(AppEvent::Trigger(TriggerEvent::new(
            TriggerKind::Reset,
            "line"
        ))));
        assert!(!ctl.state().running);

        assert!(!ctl.handle_event(AppEvent::StreamLost("gone".into())));
        assert!(!ctl.handle_event(AppEvent::Quit));
    }

    #[test]
    fn formats_minutes_and_zero_padded_seconds() {
        assert_eq!(format_countdown(65), "1:05");
        assert_eq!(format_countdown(180), "3:00");
        assert_eq!(format_countdown(59), "0:59");
        assert_eq!(format_countdown(600), "10:00");
    }
}
