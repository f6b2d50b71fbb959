//! Code/preview synchronization.
//!
//! The coordinator owns the single authoritative HTML string. Free-text
//! edits are debounced before becoming authoritative; canvas edits are
//! committed immediately. Echo suppression is primarily string comparison
//! in both directions, with a short-lived suppression flag as a secondary
//! guard against async races (an upload settling while a reload arrives).
//!
//! Debouncing is poll-driven: the embedding shell calls
//! [`Coordinator::poll`] from its tick with the current instant, so there
//! are no background timers to coordinate with the event loop.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

struct PendingEdit {
    content: String,
    deadline: Instant,
}

pub struct Coordinator {
    authoritative: String,
    debounce: Duration,
    pending: Option<PendingEdit>,
    suppressed: Rc<Cell<bool>>,
}

impl Coordinator {
    pub fn new(initial: String, debounce: Duration) -> Self {
        Self {
            authoritative: initial,
            debounce,
            pending: None,
            suppressed: Rc::new(Cell::new(false)),
        }
    }

    /// The authoritative document string.
    pub fn html(&self) -> &str {
        &self.authoritative
    }

    pub fn has_pending_edit(&self) -> bool {
        self.pending.is_some()
    }

    /// Record a free-text edit. Always replaces any pending edit and
    /// restarts the debounce window; there is never more than one timer.
    pub fn stage_text_edit(&mut self, content: String, now: Instant) {
        self.pending = Some(PendingEdit {
            content,
            deadline: now + self.debounce,
        });
    }

    /// Commit the pending edit if its quiet period has elapsed. Returns
    /// the newly authoritative string when a commit happened.
    pub fn poll(&mut self, now: Instant) -> Option<&str> {
        let pending = self.pending.take_if(|p| p.deadline <= now)?;
        self.authoritative = pending.content;
        Some(&self.authoritative)
    }

    /// Commit the pending edit immediately, bypassing the debounce.
    pub fn apply_now(&mut self) -> Option<&str> {
        let pending = self.pending.take()?;
        self.authoritative = pending.content;
        Some(&self.authoritative)
    }

    /// Next instant at which [`poll`](Self::poll) could commit something.
    pub fn poll_at(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    /// Commit a canvas-originated edit. No debounce: the canvas is the
    /// live view, its serialized output is authoritative the moment it is
    /// produced. Returns whether the string actually changed; callers only
    /// propagate to the text view on `true`.
    pub fn commit_canvas_markup(&mut self, markup: String) -> bool {
        if markup == self.authoritative {
            return false;
        }
        self.authoritative = markup;
        self.pending = None;
        true
    }

    /// Whether an incoming string warrants a sandbox reload: it must
    /// differ from the live markup, and no suppressed write-back may be in
    /// flight.
    pub fn should_reload(&self, incoming: &str, live_markup: &str) -> bool {
        !self.suppressed.get() && incoming != live_markup
    }

    /// Raise the suppression flag for the duration of the returned guard.
    /// The flag always drops with the guard, on every exit path.
    pub fn suppress(&self) -> SuppressionGuard {
        self.suppressed.set(true);
        SuppressionGuard {
            flag: Rc::clone(&self.suppressed),
        }
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed.get()
    }
}

/// RAII guard for the echo-suppression flag.
pub struct SuppressionGuard {
    flag: Rc<Cell<bool>>,
}

impl Drop for SuppressionGuard {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEBOUNCE: Duration = Duration::from_secs(1);

    #[test]
    fn keystrokes_coalesce_into_one_commit() {
        let t0 = Instant::now();
        let mut coord = Coordinator::new("initial".into(), DEBOUNCE);

        coord.stage_text_edit("a".into(), t0);
        coord.stage_text_edit("ab".into(), t0 + Duration::from_millis(300));
        coord.stage_text_edit("abc".into(), t0 + Duration::from_millis(600));

        // quiet period not yet elapsed after the last keystroke
        assert_eq!(coord.poll(t0 + Duration::from_millis(1100)), None);

        let committed = coord.poll(t0 + Duration::from_millis(1700));
        assert_eq!(committed, Some("abc"));
        assert_eq!(coord.html(), "abc");
        assert!(!coord.has_pending_edit());
    }

    #[test]
    fn apply_now_bypasses_the_debounce() {
        let t0 = Instant::now();
        let mut coord = Coordinator::new("initial".into(), DEBOUNCE);
        coord.stage_text_edit("typed".into(), t0);
        assert_eq!(coord.apply_now(), Some("typed"));
        assert_eq!(coord.poll(t0 + Duration::from_secs(5)), None);
    }

    #[test]
    fn identical_canvas_markup_does_not_propagate() {
        let mut coord = Coordinator::new("<p>same</p>".into(), DEBOUNCE);
        assert!(!coord.commit_canvas_markup("<p>same</p>".into()));
        assert!(coord.commit_canvas_markup("<p>different</p>".into()));
        assert_eq!(coord.html(), "<p>different</p>");
    }

    #[test]
    fn reload_requires_a_difference() {
        let coord = Coordinator::new("x".into(), DEBOUNCE);
        assert!(!coord.should_reload("<p>live</p>", "<p>live</p>"));
        assert!(coord.should_reload("<p>new</p>", "<p>live</p>"));
    }

    #[test]
    fn suppression_flag_clears_with_the_guard() {
        let coord = Coordinator::new("x".into(), DEBOUNCE);
        {
            let _guard = coord.suppress();
            assert!(coord.is_suppressed());
            assert!(!coord.should_reload("<p>new</p>", "<p>live</p>"));
        }
        assert!(!coord.is_suppressed());
        assert!(coord.should_reload("<p>new</p>", "<p>live</p>"));
    }

    #[test]
    fn canvas_commit_discards_pending_text_edit() {
        let t0 = Instant::now();
        let mut coord = Coordinator::new("initial".into(), DEBOUNCE);
        coord.stage_text_edit("stale typing".into(), t0);
        assert!(coord.commit_canvas_markup("canvas wins".into()));
        assert_eq!(coord.poll(t0 + Duration::from_secs(2)), None);
        assert_eq!(coord.html(), "canvas wins");
    }
}
