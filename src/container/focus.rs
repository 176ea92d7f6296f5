use crate::events::MouseButton;

use super::core::NodeId;

/// Mouse gesture progress. A left press arms on the container under the
/// pointer; the gesture commits only when the release resolves to the
/// same container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gesture {
    Idle,
    Armed { node: NodeId, button: MouseButton },
}

/// Tracks the container that owns keyboard input. One per tree; the
/// root starts focused.
#[derive(Debug)]
pub struct FocusTracker {
    root: NodeId,
    active: NodeId,
    gesture: Gesture,
}

impl FocusTracker {
    pub(crate) fn new(root: NodeId) -> Self {
        Self {
            root,
            active: root,
            gesture: Gesture::Idle,
        }
    }

    pub fn active(&self) -> NodeId {
        self.active
    }

    pub fn is_active(&self, id: NodeId) -> bool {
        self.active == id
    }

    /// Feed one mouse event; `target` is the container under the
    /// pointer, if any. Returns whether the active container changed.
    pub(crate) fn mouse(&mut self, target: Option<NodeId>, button: MouseButton) -> bool {
        match button {
            MouseButton::Left => {
                // A press always (re-)arms, including while a gesture is
                // already in flight.
                self.gesture = match target {
                    Some(node) => Gesture::Armed { node, button },
                    None => Gesture::Idle,
                };
                false
            }
            MouseButton::Release => {
                let armed = match self.gesture {
                    Gesture::Armed { node, .. } => Some(node),
                    Gesture::Idle => None,
                };
                self.gesture = Gesture::Idle;
                match (armed, target) {
                    (Some(node), Some(hit)) if node == hit => {
                        let changed = self.active != node;
                        self.active = node;
                        changed
                    }
                    _ => false,
                }
            }
            // Any other press cancels an in-flight gesture and never
            // focuses anything.
            MouseButton::Middle
            | MouseButton::Right
            | MouseButton::WheelUp
            | MouseButton::WheelDown => {
                self.gesture = Gesture::Idle;
                false
            }
        }
    }

    /// Move focus to the next eligible node. `scan` is the tree's
    /// preorder paired with per-node eligibility; wraps past the end and
    /// falls back to the root when nothing is eligible. Returns whether
    /// the active container changed.
    pub(crate) fn next(&mut self, scan: &[(NodeId, bool)]) -> bool {
        self.advance(scan.iter().copied())
    }

    /// As [`FocusTracker::next`], walking right-to-left.
    pub(crate) fn previous(&mut self, scan: &[(NodeId, bool)]) -> bool {
        self.advance(scan.iter().rev().copied())
    }

    fn advance(&mut self, scan: impl Iterator<Item = (NodeId, bool)>) -> bool {
        let mut first = None;
        let mut next = None;
        let mut after_active = false;
        for (id, eligible) in scan {
            if eligible {
                if first.is_none() {
                    first = Some(id);
                }
                if after_active && next.is_none() {
                    next = Some(id);
                }
            }
            if id == self.active {
                after_active = true;
            }
        }

        let target = next.or(first).unwrap_or(self.root);
        let changed = target != self.active;
        self.active = target;
        changed
    }
}
