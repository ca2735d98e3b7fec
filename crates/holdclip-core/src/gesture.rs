//! Press gesture classification.
//!
//! Distinguishes a deliberate hold from an accidental tap on a single
//! control. The detector is a plain finite state machine driven by
//! timestamps, so it has no timer thread of its own: the event loop arms a
//! wakeup at [`PressGesture::deadline`] and calls [`PressGesture::poll`]
//! when it fires. Edge-triggered results queue up internally and are
//! drained with [`PressGesture::next_event`].

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Hold duration that separates a long press from a tap.
pub const LONG_PRESS_THRESHOLD: Duration = Duration::from_millis(500);

/// Edge-triggered signals produced by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureEvent {
    /// The control was released before the threshold elapsed
    ShortPress,
    /// The hold was sustained past the threshold
    LongPressStart,
    /// A confirmed hold was released
    LongPressEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    /// Pressed, threshold timer running
    Timing { deadline: Instant },
    /// Long press confirmed, waiting for release
    Held,
}

/// Single-control press gesture detector.
#[derive(Debug)]
pub struct PressGesture {
    phase: Phase,
    threshold: Duration,
    queue: VecDeque<GestureEvent>,
}

impl Default for PressGesture {
    fn default() -> Self {
        Self::new()
    }
}

impl PressGesture {
    pub fn new() -> Self {
        Self::with_threshold(LONG_PRESS_THRESHOLD)
    }

    /// Detector with a non-default threshold. Used by tests; the
    /// application always runs with [`LONG_PRESS_THRESHOLD`].
    pub fn with_threshold(threshold: Duration) -> Self {
        Self {
            phase: Phase::Idle,
            threshold,
            queue: VecDeque::new(),
        }
    }

    /// The control went down. Arms the one-shot threshold timer.
    ///
    /// Repeated press-down while already timing or held is ignored; this
    /// swallows key auto-repeat the same way the reference control
    /// suppresses the platform context-menu trigger on a long hold.
    pub fn press_down(&mut self, now: Instant) {
        if self.phase != Phase::Idle {
            return;
        }
        self.phase = Phase::Timing {
            deadline: now + self.threshold,
        };
    }

    /// The control was released.
    ///
    /// A release from a confirmed hold queues [`GestureEvent::LongPressEnd`];
    /// a release before the threshold queues [`GestureEvent::ShortPress`].
    /// If the deadline elapsed but no poll has run yet, the start edge is
    /// queued first so every long cycle yields exactly one start/end pair.
    pub fn press_up(&mut self, now: Instant) {
        self.promote(now);
        match self.phase {
            Phase::Idle => {}
            Phase::Timing { .. } => self.queue.push_back(GestureEvent::ShortPress),
            Phase::Held => self.queue.push_back(GestureEvent::LongPressEnd),
        }
        self.phase = Phase::Idle;
    }

    /// Safety cancellation, e.g. the session going away mid-press.
    ///
    /// Behaves like [`PressGesture::press_up`] for state transitions, but a
    /// cancelled tap stays silent instead of counting as a short press.
    /// Idempotent: cancelling twice in a row has no additional effect.
    pub fn cancel(&mut self, now: Instant) {
        self.promote(now);
        if self.phase == Phase::Held {
            self.queue.push_back(GestureEvent::LongPressEnd);
        }
        self.phase = Phase::Idle;
    }

    /// Advance the timer. Queues [`GestureEvent::LongPressStart`] once the
    /// deadline is reached.
    pub fn poll(&mut self, now: Instant) {
        self.promote(now);
    }

    fn promote(&mut self, now: Instant) {
        if let Phase::Timing { deadline } = self.phase {
            if now >= deadline {
                self.phase = Phase::Held;
                self.queue.push_back(GestureEvent::LongPressStart);
            }
        }
    }

    /// Next pending wakeup for the event loop, if the timer is armed.
    pub fn deadline(&self) -> Option<Instant> {
        match self.phase {
            Phase::Timing { deadline } => Some(deadline),
            _ => None,
        }
    }

    /// Whether a long press is currently confirmed and not yet released.
    pub fn is_held(&self) -> bool {
        self.phase == Phase::Held
    }

    /// Drain the next queued gesture signal.
    pub fn next_event(&mut self) -> Option<GestureEvent> {
        self.queue.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(base: Instant, ms: u64) -> Instant {
        base + Duration::from_millis(ms)
    }

    fn drain(gesture: &mut PressGesture) -> Vec<GestureEvent> {
        std::iter::from_fn(|| gesture.next_event()).collect()
    }

    #[test]
    fn tap_fires_short_press_only() {
        let base = Instant::now();
        let mut gesture = PressGesture::new();

        gesture.press_down(base);
        gesture.press_up(at(base, 300));

        assert_eq!(drain(&mut gesture), vec![GestureEvent::ShortPress]);
        assert_eq!(gesture.deadline(), None);
    }

    #[test]
    fn hold_fires_one_start_end_pair() {
        let base = Instant::now();
        let mut gesture = PressGesture::new();

        gesture.press_down(base);
        gesture.poll(at(base, 500));
        assert!(gesture.is_held());
        gesture.press_up(at(base, 800));

        assert_eq!(
            drain(&mut gesture),
            vec![GestureEvent::LongPressStart, GestureEvent::LongPressEnd]
        );
    }

    #[test]
    fn poll_before_deadline_is_silent() {
        let base = Instant::now();
        let mut gesture = PressGesture::new();

        gesture.press_down(base);
        gesture.poll(at(base, 499));

        assert_eq!(gesture.next_event(), None);
        assert_eq!(gesture.deadline(), Some(at(base, 500)));
    }

    #[test]
    fn release_after_deadline_without_poll_fires_both_edges() {
        // The release event can beat the timer wakeup; the start edge must
        // still come through, and exactly once.
        let base = Instant::now();
        let mut gesture = PressGesture::new();

        gesture.press_down(base);
        gesture.press_up(at(base, 650));

        assert_eq!(
            drain(&mut gesture),
            vec![GestureEvent::LongPressStart, GestureEvent::LongPressEnd]
        );
    }

    #[test]
    fn repeat_press_down_does_not_rearm_timer() {
        let base = Instant::now();
        let mut gesture = PressGesture::new();

        gesture.press_down(base);
        gesture.press_down(at(base, 400));

        assert_eq!(gesture.deadline(), Some(at(base, 500)));
    }

    #[test]
    fn repeat_press_down_during_hold_is_ignored() {
        let base = Instant::now();
        let mut gesture = PressGesture::new();

        gesture.press_down(base);
        gesture.poll(at(base, 500));
        gesture.press_down(at(base, 600));
        gesture.press_up(at(base, 700));

        assert_eq!(
            drain(&mut gesture),
            vec![GestureEvent::LongPressStart, GestureEvent::LongPressEnd]
        );
    }

    #[test]
    fn cancel_during_hold_matches_release() {
        let base = Instant::now();
        let mut gesture = PressGesture::new();

        gesture.press_down(base);
        gesture.poll(at(base, 500));
        gesture.cancel(at(base, 600));

        assert_eq!(
            drain(&mut gesture),
            vec![GestureEvent::LongPressStart, GestureEvent::LongPressEnd]
        );

        // A second cancellation is a no-op.
        gesture.cancel(at(base, 601));
        assert_eq!(gesture.next_event(), None);
    }

    #[test]
    fn cancelled_tap_stays_silent() {
        let base = Instant::now();
        let mut gesture = PressGesture::new();

        gesture.press_down(base);
        gesture.cancel(at(base, 200));

        assert_eq!(gesture.next_event(), None);
        assert_eq!(gesture.deadline(), None);
    }

    #[test]
    fn stray_release_from_idle_is_ignored() {
        let base = Instant::now();
        let mut gesture = PressGesture::new();

        gesture.press_up(base);

        assert_eq!(gesture.next_event(), None);
    }

    #[test]
    fn threshold_boundary_counts_as_long() {
        // Release exactly at the threshold is a long press, not a tap.
        let base = Instant::now();
        let mut gesture = PressGesture::new();

        gesture.press_down(base);
        gesture.press_up(at(base, 500));

        assert_eq!(
            drain(&mut gesture),
            vec![GestureEvent::LongPressStart, GestureEvent::LongPressEnd]
        );
    }

    #[test]
    fn custom_threshold_is_honored() {
        let base = Instant::now();
        let mut gesture = PressGesture::with_threshold(Duration::from_millis(50));

        gesture.press_down(base);
        gesture.poll(at(base, 50));
        gesture.press_up(at(base, 60));

        assert_eq!(
            drain(&mut gesture),
            vec![GestureEvent::LongPressStart, GestureEvent::LongPressEnd]
        );
    }

    #[test]
    fn consecutive_cycles_are_independent() {
        let base = Instant::now();
        let mut gesture = PressGesture::new();

        gesture.press_down(base);
        gesture.press_up(at(base, 100));
        gesture.press_down(at(base, 200));
        gesture.poll(at(base, 700));
        gesture.press_up(at(base, 900));

        assert_eq!(
            drain(&mut gesture),
            vec![
                GestureEvent::ShortPress,
                GestureEvent::LongPressStart,
                GestureEvent::LongPressEnd,
            ]
        );
    }
}
