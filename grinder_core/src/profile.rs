//! Grind profiles and the exclusive selection group that owns them.

use crate::widget::{ButtonId, ContainerId, LabelId, Point, Region, WidgetTree};

/// What a profile's buttons ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileAction {
    Select,
    Plus,
    Minus,
}

/// One canned grind setting: an amount in whole grams plus its controls.
#[derive(Debug, Clone)]
pub struct GrindProfile {
    container: ContainerId,
    select: ButtonId,
    plus: ButtonId,
    minus: ButtonId,
    amount_label: LabelId,
    amount: u8,
    max: u8,
}

impl GrindProfile {
    pub const SELECT_REGION: Region = Region::new(10, 0, 140, 100);
    pub const MINUS_REGION: Region = Region::new(10, 110, 40, 40);
    pub const PLUS_REGION: Region = Region::new(110, 110, 40, 40);
    pub const AMOUNT_AT: Point = Point::new(70, 130);

    /// Build the profile's controls in a new sub-container at `offset`.
    /// `action` wraps each [`ProfileAction`] in the screen's action type.
    pub fn attach<A: Copy>(
        tree: &mut WidgetTree<A>,
        parent: ContainerId,
        offset: Point,
        label: &str,
        amount: u8,
        max: u8,
        action: impl Fn(ProfileAction) -> A,
    ) -> Self {
        let container = tree.add_subscreen(parent, offset);
        let select = tree.add_button(container, Self::SELECT_REGION, label, action(ProfileAction::Select));
        let minus = tree.add_button(container, Self::MINUS_REGION, "-", action(ProfileAction::Minus));
        let plus = tree.add_button(container, Self::PLUS_REGION, "+", action(ProfileAction::Plus));
        let amount = amount.min(max);
        let amount_label = tree.add_label(container, Self::AMOUNT_AT, amount.to_string());
        for b in [select, minus, plus] {
            tree.show(b);
        }
        Self {
            container,
            select,
            plus,
            minus,
            amount_label,
            amount,
            max,
        }
    }

    pub fn amount(&self) -> u8 {
        self.amount
    }

    pub fn container(&self) -> ContainerId {
        self.container
    }

    pub fn is_selected<A: Copy>(&self, tree: &WidgetTree<A>) -> bool {
        tree.button(self.select).selected
    }

    fn set_selected<A: Copy>(&self, tree: &mut WidgetTree<A>, on: bool) {
        tree.set_selected(self.select, on);
    }

    /// Step the amount by one gram, saturating at 0 and the profile maximum.
    pub fn adjust<A: Copy>(&mut self, tree: &mut WidgetTree<A>, up: bool) {
        self.amount = if up {
            self.amount.saturating_add(1).min(self.max)
        } else {
            self.amount.saturating_sub(1)
        };
        tree.set_text(self.amount_label, self.amount.to_string());
    }

    pub fn buttons(&self) -> [ButtonId; 3] {
        [self.select, self.minus, self.plus]
    }
}

/// Sibling profiles of which exactly one is selected once anything has been
/// selected.
#[derive(Debug, Clone, Default)]
pub struct SelectionGroup {
    members: Vec<GrindProfile>,
    selected: Option<usize>,
}

impl SelectionGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member; returns its index.
    pub fn push(&mut self, profile: GrindProfile) -> usize {
        self.members.push(profile);
        self.members.len() - 1
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&GrindProfile> {
        self.members.get(index)
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Select `index` and deselect every other member. Out-of-range indices
    /// are ignored.
    pub fn select<A: Copy>(&mut self, tree: &mut WidgetTree<A>, index: usize) {
        if index >= self.members.len() {
            return;
        }
        for (i, m) in self.members.iter().enumerate() {
            m.set_selected(tree, i == index);
        }
        self.selected = Some(index);
        tracing::debug!(profile = index, amount = self.members[index].amount, "profile selected");
    }

    /// Route a profile button to the member it belongs to.
    pub fn apply<A: Copy>(&mut self, tree: &mut WidgetTree<A>, index: usize, action: ProfileAction) {
        match action {
            ProfileAction::Select => self.select(tree, index),
            ProfileAction::Plus | ProfileAction::Minus => {
                if let Some(m) = self.members.get_mut(index) {
                    m.adjust(tree, action == ProfileAction::Plus);
                }
            }
        }
    }

    /// Amount of the selected profile, in grams.
    pub fn selected_amount(&self) -> Option<u8> {
        self.selected.map(|i| self.members[i].amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(tree: &mut WidgetTree<(usize, ProfileAction)>) -> SelectionGroup {
        let root = tree.root();
        let mut g = SelectionGroup::new();
        let a = GrindProfile::attach(tree, root, Point::new(0, 10), "Single", 9, 30, |a| (0, a));
        let b = GrindProfile::attach(tree, root, Point::new(160, 10), "Double", 19, 30, |a| (1, a));
        g.push(a);
        g.push(b);
        g
    }

    #[test]
    fn selecting_one_deselects_the_other() {
        let mut tree = WidgetTree::new();
        let mut g = group(&mut tree);
        g.select(&mut tree, 0);
        g.select(&mut tree, 1);
        assert!(!g.get(0).unwrap().is_selected(&tree));
        assert!(g.get(1).unwrap().is_selected(&tree));
        assert_eq!(g.selected_amount(), Some(19));
    }

    #[test]
    fn amounts_clamp_to_range() {
        let mut tree = WidgetTree::new();
        let mut g = group(&mut tree);
        for _ in 0..50 {
            g.apply(&mut tree, 1, ProfileAction::Plus);
        }
        assert_eq!(g.get(1).unwrap().amount(), 30);
        for _ in 0..50 {
            g.apply(&mut tree, 0, ProfileAction::Minus);
        }
        assert_eq!(g.get(0).unwrap().amount(), 0);
        assert!(tree.visible_texts().contains(&"0"));
        assert!(tree.visible_texts().contains(&"30"));
    }

    #[test]
    fn profile_buttons_dispatch_through_their_offset() {
        let mut tree = WidgetTree::new();
        let _g = group(&mut tree);
        let root = tree.root();
        // Plus of the second profile: offset (160,10) + region (110,110)
        let fired = tree.dispatch(root, Point::new(160 + 120, 10 + 120));
        assert_eq!(fired, vec![(1, ProfileAction::Plus)]);
    }
}
