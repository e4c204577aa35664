//! Classifies raw press/release events into playback gestures.
//!
//! A press can mean two things: a quick tap navigates, a sustained hold
//! pauses. The classifier is an explicit state machine rather than a pair of
//! racing timeouts:
//!
//! ```text
//! Idle --press--> Pressed --pause-intent fires--> Pressed(hold engaged)
//! Pressed --release < tap threshold--> Idle, navigate
//! Pressed(hold engaged) --release--> Idle, resume
//! ```
//!
//! Two thresholds apply, measured from press start: the pause-intent delay
//! (default 150 ms) after which a still-held press engages pause, and the
//! tap threshold (default 200 ms) below which a release counts as a
//! navigation tap. Rule for the overlap: a tap wins unless the hold
//! threshold already elapsed; once pause engaged, the release resumes and
//! never navigates.
//!
//! The mute toggle is deliberately outside this machine: its clicks are
//! routed straight to the scheduler (see `StoryViewer::mute_clicked`) and
//! must never engage pause or navigation.

use log::{debug, trace};

use crate::clock::{Generation, Timer};
use crate::config::ViewerConfig;

/// Which half of the viewer a press landed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavSide {
    Prev,
    Next,
}

/// A fully classified gesture, ready to apply to the scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureAction {
    Pause,
    Resume,
    Navigate(NavSide),
}

/// Gesture timing thresholds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GestureConfig {
    pub pause_intent_ms: u64,
    pub tap_threshold_ms: u64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            pause_intent_ms: crate::config::DEFAULT_PAUSE_INTENT_MS,
            tap_threshold_ms: crate::config::DEFAULT_TAP_THRESHOLD_MS,
        }
    }
}

impl From<&ViewerConfig> for GestureConfig {
    fn from(config: &ViewerConfig) -> Self {
        Self {
            pause_intent_ms: config.pause_intent_ms,
            tap_threshold_ms: config.tap_threshold_ms,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum GestureState {
    Idle,
    Pressed {
        started_at_ms: u64,
        side: NavSide,
        token: Generation,
        hold_engaged: bool,
    },
}

/// Turns press/release events into [`GestureAction`]s.
///
/// The pause-intent timer is a host-scheduled [`Timer`]; its fire must be
/// routed back through [`pause_intent_fired`](Self::pause_intent_fired) with
/// the token it was armed with, so a fire racing its own cancellation is
/// discarded by token mismatch.
pub struct InputController {
    config: GestureConfig,
    state: GestureState,
    pause_intent: Box<dyn Timer>,
    token: Generation,
}

impl InputController {
    pub fn new(config: GestureConfig, pause_intent: Box<dyn Timer>) -> Self {
        Self {
            config,
            state: GestureState::Idle,
            pause_intent,
            token: 0,
        }
    }

    /// A press began on the given side at `now_ms`. Arms the pause-intent
    /// timer; a press arriving while another is tracked replaces it.
    pub fn press(&mut self, side: NavSide, now_ms: u64) {
        self.token += 1;
        trace!("Press on {:?} side at t={}ms (token {})", side, now_ms, self.token);
        self.state = GestureState::Pressed {
            started_at_ms: now_ms,
            side,
            token: self.token,
            hold_engaged: false,
        };
        self.pause_intent.arm(self.config.pause_intent_ms, self.token);
    }

    /// The pause-intent timer fired. Returns `Pause` when the press it was
    /// armed for is still held; a stale token yields nothing.
    pub fn pause_intent_fired(&mut self, token: Generation) -> Option<GestureAction> {
        match &mut self.state {
            GestureState::Pressed { token: current, hold_engaged, .. } if *current == token => {
                debug!("Hold engaged (token {})", token);
                *hold_engaged = true;
                Some(GestureAction::Pause)
            }
            _ => {
                debug!("Ignoring stale pause intent (token {})", token);
                None
            }
        }
    }

    /// The press ended at `now_ms`. Always cancels the pause-intent timer,
    /// then classifies: resume if the hold engaged, navigation tap if the
    /// press was shorter than the tap threshold, nothing otherwise.
    pub fn release(&mut self, now_ms: u64) -> Option<GestureAction> {
        self.pause_intent.cancel();
        match std::mem::replace(&mut self.state, GestureState::Idle) {
            GestureState::Idle => None,
            GestureState::Pressed { started_at_ms, side, hold_engaged, .. } => {
                let held_ms = now_ms.saturating_sub(started_at_ms);
                if hold_engaged {
                    trace!("Release after {}ms hold: resume", held_ms);
                    Some(GestureAction::Resume)
                } else if held_ms < self.config.tap_threshold_ms {
                    trace!("Release after {}ms: navigation tap {:?}", held_ms, side);
                    Some(GestureAction::Navigate(side))
                } else {
                    trace!("Release after {}ms: no action", held_ms);
                    None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::clock::{Clock, DeadlineTimer, ManualClock};

    struct Rig {
        clock: Rc<ManualClock>,
        timer: Rc<RefCell<DeadlineTimer>>,
        input: InputController,
    }

    impl Rig {
        fn new() -> Self {
            let clock = Rc::new(ManualClock::new());
            let timer = Rc::new(RefCell::new(DeadlineTimer::new(clock.clone())));
            let input = InputController::new(GestureConfig::default(), Box::new(timer.clone()));
            Self { clock, timer, input }
        }

        /// Advances time and returns the pause-intent action, if its timer
        /// became due along the way.
        fn advance(&mut self, ms: u64) -> Option<GestureAction> {
            let target = self.clock.now_ms() + ms;
            let due = {
                let armed = self.timer.borrow().armed();
                match armed {
                    Some(deadline) if deadline.fire_at_ms <= target => {
                        self.clock.set(deadline.fire_at_ms);
                        self.timer.borrow_mut().due(deadline.fire_at_ms)
                    }
                    _ => None,
                }
            };
            let action = due.and_then(|token| self.input.pause_intent_fired(token));
            self.clock.set(target);
            action
        }
    }

    #[test]
    fn quick_tap_navigates_and_never_pauses() {
        let mut rig = Rig::new();
        rig.input.press(NavSide::Next, rig.clock.now_ms());
        // Released at 120ms: under both thresholds.
        let fired = rig.advance(120);
        assert_eq!(fired, None);
        let action = rig.input.release(rig.clock.now_ms());
        assert_eq!(action, Some(GestureAction::Navigate(NavSide::Next)));
        // The cancelled pause-intent timer never fires afterwards.
        assert_eq!(rig.advance(10_000), None);
    }

    #[test]
    fn hold_engages_pause_then_release_resumes() {
        let mut rig = Rig::new();
        rig.clock.set(1000);
        rig.input.press(NavSide::Prev, rig.clock.now_ms());

        let fired = rig.advance(150);
        assert_eq!(fired, Some(GestureAction::Pause));
        assert_eq!(rig.clock.now_ms(), 1150);

        rig.clock.set(3000);
        let action = rig.input.release(rig.clock.now_ms());
        assert_eq!(action, Some(GestureAction::Resume));
    }

    #[test]
    fn release_between_thresholds_after_hold_resumes_not_navigates() {
        let mut rig = Rig::new();
        rig.input.press(NavSide::Next, rig.clock.now_ms());
        assert_eq!(rig.advance(150), Some(GestureAction::Pause));
        // 180ms is under the tap threshold, but the hold already engaged.
        rig.clock.set(180);
        assert_eq!(rig.input.release(180), Some(GestureAction::Resume));
    }

    #[test]
    fn long_press_without_engaged_hold_does_nothing_on_release() {
        let mut rig = Rig::new();
        rig.input.press(NavSide::Next, 0);
        // No timer fire delivered (e.g. pause was a no-op upstream); a
        // release past the tap threshold must not navigate.
        rig.clock.set(400);
        rig.timer.borrow_mut().cancel();
        assert_eq!(rig.input.release(400), None);
    }

    #[test]
    fn stale_pause_intent_token_is_ignored() {
        let mut rig = Rig::new();
        rig.input.press(NavSide::Next, 0);
        rig.input.release(100);
        // A fire that lost the race with its cancellation carries the old
        // token and is discarded.
        assert_eq!(rig.input.pause_intent_fired(1), None);

        rig.input.press(NavSide::Prev, 200);
        assert_eq!(rig.input.pause_intent_fired(1), None);
        assert_eq!(rig.input.pause_intent_fired(2), Some(GestureAction::Pause));
    }

    #[test]
    fn new_press_replaces_a_tracked_one() {
        let mut rig = Rig::new();
        rig.input.press(NavSide::Next, 0);
        rig.input.press(NavSide::Prev, 50);
        let action = rig.input.release(100);
        assert_eq!(action, Some(GestureAction::Navigate(NavSide::Prev)));
    }
}
