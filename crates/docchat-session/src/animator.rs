//! Reveal state machine for the typewriter answer display.
//!
//! Enforces valid transitions for the reveal lifecycle:
//! - Idle -> Revealing (answer staged, reveal begins)
//! - Revealing -> Done (final character shown)
//! - Revealing -> Idle (cancelled by reset)
//! - Done -> Idle (revealed turn committed)
//!
//! The animator holds no timer. The session drives it with one `advance`
//! call per tick, so pacing lives with the caller and tests can step the
//! machine directly.

use std::fmt;

use crate::error::SessionError;

/// Phase of the answer reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RevealState {
    /// No answer staged. Ready to begin.
    Idle,
    /// Showing the staged answer one step at a time.
    Revealing,
    /// The full answer is visible, awaiting commit.
    Done,
}

impl fmt::Display for RevealState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RevealState::Idle => write!(f, "Idle"),
            RevealState::Revealing => write!(f, "Revealing"),
            RevealState::Done => write!(f, "Done"),
        }
    }
}

impl RevealState {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &RevealState) -> bool {
        matches!(
            (self, target),
            (RevealState::Idle, RevealState::Revealing)
                | (RevealState::Revealing, RevealState::Done)
                // Cancel and commit both land back on Idle
                | (RevealState::Revealing, RevealState::Idle)
                | (RevealState::Done, RevealState::Idle)
        )
    }
}

/// Steps a staged answer into view a fixed number of characters at a time.
///
/// Characters, not bytes: multi-byte text reveals without ever splitting a
/// character.
#[derive(Debug, Clone)]
pub struct RevealAnimator {
    state: RevealState,
    source: Vec<char>,
    visible: String,
    shown: usize,
    step: usize,
}

impl RevealAnimator {
    /// Create an idle animator revealing `step` characters per advance.
    pub fn new(step: usize) -> Self {
        Self {
            state: RevealState::Idle,
            source: Vec::new(),
            visible: String::new(),
            shown: 0,
            step: step.max(1),
        }
    }

    /// Stage `text` and enter `Revealing`.
    ///
    /// Only valid from `Idle`. An empty text still passes through
    /// `Revealing`; the first advance completes it.
    pub fn begin(&mut self, text: &str) -> Result<(), SessionError> {
        if !self.state.can_transition_to(&RevealState::Revealing) {
            return Err(SessionError::Invariant(format!(
                "invalid reveal transition: {} -> {}",
                self.state,
                RevealState::Revealing
            )));
        }
        tracing::debug!("Reveal state: {} -> {}", self.state, RevealState::Revealing);
        self.source = text.chars().collect();
        self.visible.clear();
        self.shown = 0;
        self.state = RevealState::Revealing;
        Ok(())
    }

    /// Show the next step of characters.
    ///
    /// Returns `true` exactly on the advance that shows the final character
    /// and moves the machine to `Done`. Advancing outside `Revealing` is a
    /// no-op returning `false`.
    pub fn advance(&mut self) -> bool {
        if self.state != RevealState::Revealing {
            return false;
        }
        let target = (self.shown + self.step).min(self.source.len());
        for &c in &self.source[self.shown..target] {
            self.visible.push(c);
        }
        self.shown = target;
        if self.shown == self.source.len() {
            tracing::debug!("Reveal state: {} -> {}", self.state, RevealState::Done);
            self.state = RevealState::Done;
            return true;
        }
        false
    }

    /// Abandon the reveal and return to `Idle` from any state.
    ///
    /// Returns the number of characters that had been revealed; they are
    /// discarded without being committed.
    pub fn cancel(&mut self) -> usize {
        let discarded = self.shown;
        if self.state != RevealState::Idle {
            tracing::debug!("Reveal state: {} -> {}", self.state, RevealState::Idle);
        }
        self.state = RevealState::Idle;
        self.source.clear();
        self.visible.clear();
        self.shown = 0;
        discarded
    }

    /// Acknowledge a completed reveal, returning to `Idle`.
    ///
    /// Only valid from `Done`.
    pub fn finish(&mut self) -> Result<(), SessionError> {
        if self.state != RevealState::Done {
            return Err(SessionError::Invariant(format!(
                "invalid reveal transition: {} -> {}",
                self.state,
                RevealState::Idle
            )));
        }
        tracing::debug!("Reveal state: {} -> {}", self.state, RevealState::Idle);
        self.state = RevealState::Idle;
        self.source.clear();
        self.visible.clear();
        self.shown = 0;
        Ok(())
    }

    pub fn state(&self) -> RevealState {
        self.state
    }

    /// The currently visible prefix of the staged answer.
    pub fn visible(&self) -> &str {
        &self.visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_display() {
        assert_eq!(RevealState::Idle.to_string(), "Idle");
        assert_eq!(RevealState::Revealing.to_string(), "Revealing");
        assert_eq!(RevealState::Done.to_string(), "Done");
    }

    #[test]
    fn test_valid_transitions() {
        assert!(RevealState::Idle.can_transition_to(&RevealState::Revealing));
        assert!(RevealState::Revealing.can_transition_to(&RevealState::Done));
        assert!(RevealState::Revealing.can_transition_to(&RevealState::Idle));
        assert!(RevealState::Done.can_transition_to(&RevealState::Idle));
    }

    #[test]
    fn test_invalid_transitions() {
        // Cannot skip straight to Done
        assert!(!RevealState::Idle.can_transition_to(&RevealState::Done));

        // Cannot restart a finished reveal without passing through Idle
        assert!(!RevealState::Done.can_transition_to(&RevealState::Revealing));

        // Cannot transition to self
        assert!(!RevealState::Idle.can_transition_to(&RevealState::Idle));
        assert!(!RevealState::Revealing.can_transition_to(&RevealState::Revealing));
        assert!(!RevealState::Done.can_transition_to(&RevealState::Done));
    }

    #[test]
    fn test_reveal_one_char_per_step() {
        let mut animator = RevealAnimator::new(1);
        animator.begin("abc").unwrap();
        assert_eq!(animator.state(), RevealState::Revealing);

        assert!(!animator.advance());
        assert_eq!(animator.visible(), "a");
        assert!(!animator.advance());
        assert_eq!(animator.visible(), "ab");
        // the completing advance returns true
        assert!(animator.advance());
        assert_eq!(animator.visible(), "abc");
        assert_eq!(animator.state(), RevealState::Done);
    }

    #[test]
    fn test_reveal_step_larger_than_text() {
        let mut animator = RevealAnimator::new(10);
        animator.begin("hi").unwrap();
        assert!(animator.advance());
        assert_eq!(animator.visible(), "hi");
        assert_eq!(animator.state(), RevealState::Done);
    }

    #[test]
    fn test_reveal_step_exact_boundary() {
        let mut animator = RevealAnimator::new(2);
        animator.begin("abcd").unwrap();
        assert!(!animator.advance());
        assert_eq!(animator.visible(), "ab");
        assert!(animator.advance());
        assert_eq!(animator.visible(), "abcd");
    }

    #[test]
    fn test_empty_text_completes_on_first_advance() {
        let mut animator = RevealAnimator::new(1);
        animator.begin("").unwrap();
        assert_eq!(animator.state(), RevealState::Revealing);
        assert!(animator.advance());
        assert_eq!(animator.visible(), "");
        assert_eq!(animator.state(), RevealState::Done);
    }

    #[test]
    fn test_begin_while_revealing_fails() {
        let mut animator = RevealAnimator::new(1);
        animator.begin("first").unwrap();
        let result = animator.begin("second");
        assert!(matches!(result, Err(SessionError::Invariant(_))));
        // the running reveal is untouched
        assert_eq!(animator.state(), RevealState::Revealing);
    }

    #[test]
    fn test_begin_while_done_fails() {
        let mut animator = RevealAnimator::new(10);
        animator.begin("x").unwrap();
        animator.advance();
        assert!(animator.begin("y").is_err());
    }

    #[test]
    fn test_advance_outside_revealing_is_noop() {
        let mut animator = RevealAnimator::new(1);
        assert!(!animator.advance());
        assert_eq!(animator.state(), RevealState::Idle);

        animator.begin("ab").unwrap();
        animator.advance();
        animator.advance();
        assert_eq!(animator.state(), RevealState::Done);
        assert!(!animator.advance());
        assert_eq!(animator.visible(), "ab");
    }

    #[test]
    fn test_cancel_mid_reveal_counts_revealed() {
        let mut animator = RevealAnimator::new(1);
        animator.begin("abcde").unwrap();
        animator.advance();
        animator.advance();
        assert_eq!(animator.visible(), "ab");

        let discarded = animator.cancel();
        assert_eq!(discarded, 2);
        assert_eq!(animator.state(), RevealState::Idle);
        assert_eq!(animator.visible(), "");
    }

    #[test]
    fn test_cancel_from_idle_is_zero() {
        let mut animator = RevealAnimator::new(1);
        assert_eq!(animator.cancel(), 0);
        assert_eq!(animator.state(), RevealState::Idle);
    }

    #[test]
    fn test_cancel_before_first_advance_is_zero() {
        let mut animator = RevealAnimator::new(1);
        animator.begin("abc").unwrap();
        assert_eq!(animator.cancel(), 0);
        assert_eq!(animator.state(), RevealState::Idle);
    }

    #[test]
    fn test_cancel_from_done_counts_everything() {
        let mut animator = RevealAnimator::new(10);
        animator.begin("shown").unwrap();
        animator.advance();
        assert_eq!(animator.cancel(), 5);
        assert_eq!(animator.state(), RevealState::Idle);
    }

    #[test]
    fn test_finish_after_done() {
        let mut animator = RevealAnimator::new(10);
        animator.begin("text").unwrap();
        animator.advance();
        animator.finish().unwrap();
        assert_eq!(animator.state(), RevealState::Idle);
        assert_eq!(animator.visible(), "");
        // ready for the next answer
        assert!(animator.begin("next").is_ok());
    }

    #[test]
    fn test_finish_outside_done_fails() {
        let mut animator = RevealAnimator::new(1);
        assert!(animator.finish().is_err());

        animator.begin("text").unwrap();
        assert!(animator.finish().is_err());
    }

    #[test]
    fn test_multibyte_characters_reveal_atomically() {
        let mut animator = RevealAnimator::new(1);
        animator.begin("caf\u{00e9}").unwrap();
        animator.advance();
        animator.advance();
        animator.advance();
        assert_eq!(animator.visible(), "caf");
        assert!(animator.advance());
        assert_eq!(animator.visible(), "caf\u{00e9}");
    }

    #[test]
    fn test_zero_step_is_clamped() {
        let mut animator = RevealAnimator::new(0);
        animator.begin("ab").unwrap();
        // still makes progress every advance
        assert!(!animator.advance());
        assert_eq!(animator.visible(), "a");
        assert!(animator.advance());
    }
}
