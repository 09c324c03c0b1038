//! # Scroll Follow
//!
//! Decides whether the message view should follow new content.
//!
//! Two inputs, deliberately kept apart:
//!
//! - **Geometry** (`on_scroll`): every scroll event recomputes `ScrollState`
//!   from the viewport via [`ScrollFollowPolicy`].
//! - **Mutation** (`observe`): every store change *consults* the last
//!   `ScrollState` and queues a [`FollowAction`]. It never looks at geometry,
//!   so a reader scrolled up into history is left alone.
//!
//! The queued action is picked up with `take_pending` after the render
//! pass has laid out the new content.

use crate::core::store::MessageStore;

/// Distance from the bottom, in content units, still counted as "at bottom".
pub const FOLLOW_THRESHOLD: f64 = 100.0;

/// Viewport measurements, in whatever unit the host renders in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scroll_top: f64,
    pub scroll_height: f64,
    pub client_height: f64,
}

impl Viewport {
    pub fn new(scroll_top: f64, scroll_height: f64, client_height: f64) -> Self {
        Self {
            scroll_top,
            scroll_height,
            client_height,
        }
    }

    /// How far the bottom edge of the viewport is from the end of content.
    pub fn distance_to_bottom(&self) -> f64 {
        self.scroll_height - self.scroll_top - self.client_height
    }
}

/// Pure geometry decision: is the viewport close enough to the end?
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollFollowPolicy {
    threshold: f64,
}

impl Default for ScrollFollowPolicy {
    fn default() -> Self {
        Self::new(FOLLOW_THRESHOLD)
    }
}

impl ScrollFollowPolicy {
    pub const fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn is_at_bottom(&self, viewport: Viewport) -> bool {
        viewport.distance_to_bottom() < self.threshold
    }
}

/// Derived from viewport geometry, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollState {
    pub is_at_bottom: bool,
}

impl Default for ScrollState {
    fn default() -> Self {
        // A fresh view starts pinned to the newest message.
        Self { is_at_bottom: true }
    }
}

/// What the renderer should do once layout is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowAction {
    /// A snapshot was just loaded: go straight to the end.
    JumpToEnd,
    /// New live content arrived while the reader was at the bottom.
    AnimateToEnd,
}

#[derive(Debug, Default)]
pub struct AutoFollow {
    policy: ScrollFollowPolicy,
    state: ScrollState,
    seen_revision: u64,
    pending: Option<FollowAction>,
}

impl AutoFollow {
    pub fn new(policy: ScrollFollowPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn state(&self) -> ScrollState {
        self.state
    }

    pub fn policy(&self) -> ScrollFollowPolicy {
        self.policy
    }

    /// Refresh `ScrollState` from the current viewport. Call on every scroll.
    pub fn on_scroll(&mut self, viewport: Viewport) {
        self.state.is_at_bottom = self.policy.is_at_bottom(viewport);
    }

    /// Look at the store and queue a follow action if it changed.
    ///
    /// Cheap when nothing changed, so it is fine to call once per frame.
    pub fn observe(&mut self, store: &MessageStore) {
        let revision = store.revision();
        if revision == self.seen_revision {
            return;
        }
        self.seen_revision = revision;

        if store.snapshot_revision() == revision {
            self.state.is_at_bottom = true;
            self.pending = Some(FollowAction::JumpToEnd);
        } else if self.state.is_at_bottom && !store.is_empty() {
            // A queued jump is stronger than an animation; keep it.
            if self.pending.is_none() {
                self.pending = Some(FollowAction::AnimateToEnd);
            }
        }
    }

    /// Hand the queued action to the renderer. Call after layout.
    pub fn take_pending(&mut self) -> Option<FollowAction> {
        self.pending.take()
    }

    /// Forget everything about the previous room's content.
    pub fn reset(&mut self) {
        *self = Self::new(self.policy);
    }
}
