//! Arena-backed widget tree.
//!
//! Containers own buttons, labels, progress bars and child containers; every
//! node lives in a flat arena and is addressed by a typed handle. Ownership
//! only points downward (container → children), so screens can hold handles
//! to any node without reference cycles.
//!
//! Buttons carry an action value instead of a callback. Dispatch hands the
//! fired actions back to the owning screen, which applies them with full
//! mutable access to its own state.
//!
//! # Handle preconditions
//!
//! Handles are only meaningful for the tree that issued them. Passing a
//! handle from another tree is a caller bug: debug builds assert on it and
//! release builds may address an unrelated node or panic on an out-of-range
//! index. There is no removal, so a handle never dangles within its own tree.

use std::sync::atomic::{AtomicU32, Ordering};

use grinder_traits::ViewId;

static NEXT_TREE_TAG: AtomicU32 = AtomicU32::new(1);

/// A point in some container's coordinate frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Express `self` in the frame of a container placed at `origin`.
    #[inline]
    pub fn relative_to(self, origin: Point) -> Point {
        Point {
            x: self.x.saturating_sub(origin.x),
            y: self.y.saturating_sub(origin.y),
        }
    }

    #[inline]
    pub fn offset_by(self, by: Point) -> Point {
        Point {
            x: self.x.saturating_add(by.x),
            y: self.y.saturating_add(by.y),
        }
    }
}

/// Axis-aligned rectangle in its container's local frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Hit test, inclusive on all four edges.
    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        let (px, py) = (i64::from(p.x), i64::from(p.y));
        let (x0, y0) = (i64::from(self.x), i64::from(self.y));
        px >= x0
            && px <= x0 + i64::from(self.width)
            && py >= y0
            && py <= y0 + i64::from(self.height)
    }

    pub fn translated(self, by: Point) -> Region {
        Region {
            x: self.x.saturating_add(by.x),
            y: self.y.saturating_add(by.y),
            ..self
        }
    }
}

macro_rules! handle {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name {
            pub(crate) tree: u32,
            pub(crate) index: usize,
        }
    };
}

handle!(
    /// Handle to a container (the root or a sub-screen).
    ContainerId
);
handle!(
    /// Handle to a button.
    ButtonId
);
handle!(
    /// Handle to a text label.
    LabelId
);
handle!(
    /// Handle to a progress bar.
    BarId
);

/// Hit-testable control. Disabled buttons are invisible to dispatch.
#[derive(Debug, Clone)]
pub struct Button<A> {
    pub region: Region,
    pub label: String,
    pub enabled: bool,
    /// Visual highlight only; does not affect dispatch.
    pub selected: bool,
    pub action: A,
}

#[derive(Debug, Clone)]
pub struct Label {
    pub at: Point,
    pub text: String,
    pub visible: bool,
}

#[derive(Debug, Clone)]
pub struct ProgressBar {
    pub region: Region,
    /// 0..=100
    pub percent: u8,
    pub visible: bool,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ContainerNode {
    pub(crate) offset: Point,
    pub(crate) buttons: Vec<ButtonId>,
    pub(crate) children: Vec<ContainerId>,
    labels: Vec<LabelId>,
    bars: Vec<BarId>,
}

/// Widget arena for one screen. `A` is the action type its buttons emit.
#[derive(Debug, Clone)]
pub struct WidgetTree<A> {
    tag: u32,
    pub(crate) containers: Vec<ContainerNode>,
    pub(crate) buttons: Vec<Button<A>>,
    labels: Vec<Label>,
    bars: Vec<ProgressBar>,
}

impl<A: Copy> Default for WidgetTree<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Copy> WidgetTree<A> {
    /// New tree with an empty root container at offset (0, 0).
    pub fn new() -> Self {
        Self {
            tag: NEXT_TREE_TAG.fetch_add(1, Ordering::Relaxed),
            containers: vec![ContainerNode::default()],
            buttons: Vec::new(),
            labels: Vec::new(),
            bars: Vec::new(),
        }
    }

    /// The id under which this tree is mounted at the display root.
    pub fn view_id(&self) -> ViewId {
        ViewId(self.tag)
    }

    pub fn root(&self) -> ContainerId {
        ContainerId {
            tree: self.tag,
            index: 0,
        }
    }

    #[inline]
    pub(crate) fn owns(&self, tree: u32) {
        debug_assert_eq!(tree, self.tag, "widget handle belongs to another tree");
    }

    /// Attach a new child container to `parent`, placed at `offset` in the
    /// parent's frame. Offsets compose down the tree.
    pub fn add_subscreen(&mut self, parent: ContainerId, offset: Point) -> ContainerId {
        self.owns(parent.tree);
        let id = ContainerId {
            tree: self.tag,
            index: self.containers.len(),
        };
        self.containers.push(ContainerNode {
            offset,
            ..ContainerNode::default()
        });
        self.containers[parent.index].children.push(id);
        id
    }

    pub fn offset(&self, container: ContainerId) -> Point {
        self.owns(container.tree);
        self.containers[container.index].offset
    }

    /// Register a button under `container`. New buttons start disabled and
    /// hidden; call [`show`](Self::show) to make them live.
    pub fn add_button(
        &mut self,
        container: ContainerId,
        region: Region,
        label: impl Into<String>,
        action: A,
    ) -> ButtonId {
        self.owns(container.tree);
        let id = ButtonId {
            tree: self.tag,
            index: self.buttons.len(),
        };
        self.buttons.push(Button {
            region,
            label: label.into(),
            enabled: false,
            selected: false,
            action,
        });
        self.containers[container.index].buttons.push(id);
        id
    }

    /// Enable the button and make it visible to the render layer.
    pub fn show(&mut self, button: ButtonId) {
        self.owns(button.tree);
        self.buttons[button.index].enabled = true;
    }

    /// Disable the button and hide it.
    pub fn hide(&mut self, button: ButtonId) {
        self.owns(button.tree);
        self.buttons[button.index].enabled = false;
    }

    pub fn set_selected(&mut self, button: ButtonId, selected: bool) {
        self.owns(button.tree);
        self.buttons[button.index].selected = selected;
    }

    pub fn button(&self, button: ButtonId) -> &Button<A> {
        self.owns(button.tree);
        &self.buttons[button.index]
    }

    pub fn is_enabled(&self, button: ButtonId) -> bool {
        self.button(button).enabled
    }

    /// Add a visible text label.
    pub fn add_label(
        &mut self,
        container: ContainerId,
        at: Point,
        text: impl Into<String>,
    ) -> LabelId {
        self.owns(container.tree);
        let id = LabelId {
            tree: self.tag,
            index: self.labels.len(),
        };
        self.labels.push(Label {
            at,
            text: text.into(),
            visible: true,
        });
        self.containers[container.index].labels.push(id);
        id
    }

    pub fn set_text(&mut self, label: LabelId, text: impl Into<String>) {
        self.owns(label.tree);
        self.labels[label.index].text = text.into();
    }

    pub fn set_label_visible(&mut self, label: LabelId, visible: bool) {
        self.owns(label.tree);
        self.labels[label.index].visible = visible;
    }

    pub fn label(&self, label: LabelId) -> &Label {
        self.owns(label.tree);
        &self.labels[label.index]
    }

    /// Add a hidden progress bar at 0 %.
    pub fn add_bar(&mut self, container: ContainerId, region: Region) -> BarId {
        self.owns(container.tree);
        let id = BarId {
            tree: self.tag,
            index: self.bars.len(),
        };
        self.bars.push(ProgressBar {
            region,
            percent: 0,
            visible: false,
        });
        self.containers[container.index].bars.push(id);
        id
    }

    pub fn set_bar(&mut self, bar: BarId, percent: u8) {
        self.owns(bar.tree);
        self.bars[bar.index].percent = percent.min(100);
    }

    pub fn set_bar_visible(&mut self, bar: BarId, visible: bool) {
        self.owns(bar.tree);
        self.bars[bar.index].visible = visible;
    }

    pub fn bar(&self, bar: BarId) -> &ProgressBar {
        self.owns(bar.tree);
        &self.bars[bar.index]
    }

    /// Enabled buttons with their regions in root (display) coordinates,
    /// depth-first in registration order. This is what a render layer draws.
    pub fn visible_buttons(&self) -> Vec<(Region, &Button<A>)> {
        let mut out = Vec::new();
        self.collect_visible(0, Point::default(), &mut out);
        out
    }

    fn collect_visible<'a>(
        &'a self,
        index: usize,
        parent_origin: Point,
        out: &mut Vec<(Region, &'a Button<A>)>,
    ) {
        let node = &self.containers[index];
        let origin = parent_origin.offset_by(node.offset);
        for id in &node.buttons {
            let b = &self.buttons[id.index];
            if b.enabled {
                out.push((b.region.translated(origin), b));
            }
        }
        for child in &node.children {
            self.collect_visible(child.index, origin, out);
        }
    }

    /// Visible label texts, depth-first.
    pub fn visible_texts(&self) -> Vec<&str> {
        let mut out = Vec::new();
        let mut stack = vec![0usize];
        while let Some(i) = stack.pop() {
            let node = &self.containers[i];
            out.extend(
                node.labels
                    .iter()
                    .map(|id| &self.labels[id.index])
                    .filter(|l| l.visible)
                    .map(|l| l.text.as_str()),
            );
            stack.extend(node.children.iter().rev().map(|c| c.index));
        }
        out
    }

    /// Visible progress bars, depth-first.
    pub fn visible_bars(&self) -> Vec<&ProgressBar> {
        let mut out = Vec::new();
        let mut stack = vec![0usize];
        while let Some(i) = stack.pop() {
            let node = &self.containers[i];
            out.extend(
                node.bars
                    .iter()
                    .map(|id| &self.bars[id.index])
                    .filter(|b| b.visible),
            );
            stack.extend(node.children.iter().rev().map(|c| c.index));
        }
        out
    }
}
