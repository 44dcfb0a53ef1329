//! Touch dispatch and input debouncing.

use grinder_traits::TouchSample;

use crate::widget::{ContainerId, Point, WidgetTree};

impl<A: Copy> WidgetTree<A> {
    /// Hit-test `point` (in the parent frame of `container`) against the
    /// subtree rooted at `container` and return the fired actions in order.
    ///
    /// Within one container the first enabled button whose region contains
    /// the point wins. Every child container is then tested independently,
    /// so overlapping buttons in sibling containers all fire from one sample.
    /// An empty result means nothing was hit.
    pub fn dispatch(&self, container: ContainerId, point: Point) -> Vec<A> {
        self.owns(container.tree);
        let mut fired = Vec::new();
        self.dispatch_into(container.index, point, &mut fired);
        fired
    }

    fn dispatch_into(&self, index: usize, point: Point, fired: &mut Vec<A>) {
        let node = &self.containers[index];
        let local = point.relative_to(node.offset);
        if let Some(b) = node
            .buttons
            .iter()
            .map(|id| &self.buttons[id.index])
            .find(|b| b.enabled && b.region.contains(local))
        {
            fired.push(b.action);
        }
        for child in &node.children {
            self.dispatch_into(child.index, local, fired);
        }
    }
}

/// One-dispatch-per-press latch.
///
/// The latch is "clear" while no finger is down. A press that finds the latch
/// clear consumes it and dispatches. If that dispatch hit nothing the latch
/// is cleared again so the next sample of the same press may still land on
/// a control; a hit keeps it consumed until the pressure drops.
#[derive(Debug, Clone, Copy)]
pub struct TouchLatch {
    cleared: bool,
}

impl Default for TouchLatch {
    fn default() -> Self {
        Self { cleared: true }
    }
}

impl TouchLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch for a loop that starts while `sample` may still be pressed.
    /// A press already down is treated as consumed, so it cannot fire until
    /// the finger lifts.
    pub fn seeded(sample: Option<TouchSample>, threshold: u32) -> Self {
        Self {
            cleared: !sample.is_some_and(|s| s.pressure > threshold),
        }
    }

    pub fn is_cleared(&self) -> bool {
        self.cleared
    }

    /// Feed one sample. `dispatch` is called at most once, with the point of
    /// a qualifying press; its result is returned (empty when not called).
    pub fn poll<A>(
        &mut self,
        sample: Option<TouchSample>,
        threshold: u32,
        dispatch: impl FnOnce(Point) -> Vec<A>,
    ) -> Vec<A> {
        match sample {
            Some(s) if s.pressure > threshold => {
                if !self.cleared {
                    return Vec::new();
                }
                self.cleared = false;
                let fired = dispatch(Point::new(s.x, s.y));
                if fired.is_empty() {
                    self.cleared = true;
                }
                fired
            }
            _ => {
                self.cleared = true;
                Vec::new()
            }
        }
    }
}

/// Rising-edge detector for a polled digital line.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeDetector {
    last: bool,
}

impl EdgeDetector {
    /// Seed with the current line level so a line already high is not an edge.
    pub fn new(initial: bool) -> Self {
        Self { last: initial }
    }

    /// `true` exactly on a low→high transition.
    #[inline]
    pub fn rising(&mut self, level: bool) -> bool {
        let edge = level && !self.last;
        self.last = level;
        edge
    }
}
