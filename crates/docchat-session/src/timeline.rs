//! Ordered conversation history with a staging slot for the answer in reveal.
//!
//! Committed turns are append-only. At most one assistant turn sits in the
//! pending slot while its text is being revealed; committing moves it to the
//! tail of the history.

use docchat_core::{Turn, TurnId};

use crate::error::SessionError;

/// The conversation timeline for one session.
#[derive(Debug, Clone)]
pub struct Timeline {
    turns: Vec<Turn>,
    pending: Option<Turn>,
    next_id: u64,
}

impl Timeline {
    pub fn new() -> Self {
        Self {
            turns: Vec::new(),
            pending: None,
            next_id: 1,
        }
    }

    fn mint_id(&mut self) -> TurnId {
        let id = TurnId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Append a user turn with the trimmed question text.
    ///
    /// Returns `None` without appending when the text is empty after
    /// trimming.
    pub fn append_user(&mut self, text: &str) -> Option<TurnId> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        let id = self.mint_id();
        self.turns.push(Turn::user(id, trimmed));
        Some(id)
    }

    /// Stage an assistant turn for reveal.
    ///
    /// Fails if the pending slot is already occupied; the caller must commit
    /// or discard the staged turn first.
    pub fn set_pending(
        &mut self,
        text: impl Into<String>,
        references: Vec<String>,
    ) -> Result<TurnId, SessionError> {
        if self.pending.is_some() {
            return Err(SessionError::Invariant(
                "a pending turn is already staged".to_string(),
            ));
        }
        let id = self.mint_id();
        self.pending = Some(Turn::assistant(id, text, references));
        Ok(id)
    }

    /// Move the pending turn to the tail of the committed history.
    pub fn commit_pending(&mut self) -> Option<TurnId> {
        let turn = self.pending.take()?;
        let id = turn.id;
        self.turns.push(turn);
        Some(id)
    }

    /// Discard all turns, committed and pending. Returns the number dropped.
    pub fn clear(&mut self) -> usize {
        let count = self.turns.len() + usize::from(self.pending.is_some());
        self.turns.clear();
        self.pending = None;
        count
    }

    /// Committed turns in conversation order.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// The most recently committed turn.
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn pending(&self) -> Option<&Turn> {
        self.pending.as_ref()
    }

    /// Number of committed turns.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// True only when there are no committed turns and no pending turn.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty() && self.pending.is_none()
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}
