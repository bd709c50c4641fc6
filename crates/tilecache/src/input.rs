//! Edge-triggered input actions.
//!
//! The window layer reports which actions are held; the render loop asks which
//! ones went down this frame. Each press fires exactly once however many
//! frames the key stays held.

use std::collections::HashSet;
use std::hash::Hash;

/// Everything the explorer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ZoomIn,
    ZoomOut,
    PanUp,
    PanDown,
    PanLeft,
    PanRight,
    Recalculate,
    ToggleHud,
    Quit,
}

/// Previous-frame and current-frame held sets for a family of actions.
#[derive(Debug, Clone)]
pub struct EdgeDetector<A> {
    previous: HashSet<A>,
    current: HashSet<A>,
    // Went down during this frame, even if already released again.
    pressed: HashSet<A>,
}

impl<A> Default for EdgeDetector<A> {
    fn default() -> Self {
        Self {
            previous: HashSet::new(),
            current: HashSet::new(),
            pressed: HashSet::new(),
        }
    }
}

impl<A: Copy + Eq + Hash> EdgeDetector<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the held state of `action` for the current frame.
    pub fn set(&mut self, action: A, held: bool) {
        if held {
            if self.current.insert(action) {
                self.pressed.insert(action);
            }
        } else {
            self.current.remove(&action);
        }
    }

    #[inline]
    pub fn is_held(&self, action: A) -> bool {
        self.current.contains(&action)
    }

    /// Went down during this frame, including a release and re-press of a
    /// key that was held last frame.
    #[inline]
    pub fn just_pressed(&self, action: A) -> bool {
        self.pressed.contains(&action)
    }

    /// Released since last frame.
    #[inline]
    pub fn just_released(&self, action: A) -> bool {
        !self.current.contains(&action) && self.previous.contains(&action)
    }

    /// Actions that went down this frame.
    pub fn pressed(&self) -> impl Iterator<Item = A> + '_ {
        self.pressed.iter().copied()
    }

    /// Closes the frame: this frame's held set becomes the previous one.
    pub fn end_frame(&mut self) {
        self.previous.clone_from(&self.current);
        self.pressed.clear();
    }

    /// Forgets everything, e.g. when the window loses focus.
    pub fn clear(&mut self) {
        self.current.clear();
    }
}
