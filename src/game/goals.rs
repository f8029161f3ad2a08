//! # Goal Stacks
//!
//! The quest goal kinds a level can ask for, and the ordered set of them active
//! for one level. Goals stack rather than replace one another.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One kind of quest goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalKind {
    /// Gather ingredients, brew a remedy, heal the NPC
    Cure,
    /// Open a chest for a key, then unlock a door
    KeyAndDoor,
    /// Find a tagged pickup and return it to the NPC
    LostItem,
    /// Buy materials and mend a broken water crossing
    RepairBridge,
}

impl GoalKind {
    /// All goal kinds in canonical order.
    pub const ALL: [GoalKind; 4] = [
        GoalKind::Cure,
        GoalKind::KeyAndDoor,
        GoalKind::LostItem,
        GoalKind::RepairBridge,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GoalKind::Cure => "cure",
            GoalKind::KeyAndDoor => "key_and_door",
            GoalKind::LostItem => "lost_item",
            GoalKind::RepairBridge => "repair_bridge",
        }
    }

    /// Normalises a goal name. Unknown names yield `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use questgrid::GoalKind;
    ///
    /// assert_eq!(GoalKind::parse(" Repair_Bridge "), Some(GoalKind::RepairBridge));
    /// assert_eq!(GoalKind::parse("slay_dragon"), None);
    /// ```
    pub fn parse(value: &str) -> Option<GoalKind> {
        let normalized = value.trim().to_lowercase();
        GoalKind::ALL
            .into_iter()
            .find(|kind| kind.name() == normalized)
    }
}

impl fmt::Display for GoalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered, de-duplicated list of at most four goal kinds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalStack {
    goals: Vec<GoalKind>,
}

impl GoalStack {
    /// Maximum number of goals a level can stack.
    pub const MAX_GOALS: usize = 4;

    /// Builds a stack keeping first occurrences in order.
    ///
    /// # Examples
    ///
    /// ```
    /// use questgrid::{GoalKind, GoalStack};
    ///
    /// let stack = GoalStack::new([GoalKind::Cure, GoalKind::LostItem, GoalKind::Cure]);
    /// assert_eq!(stack.len(), 2);
    /// assert_eq!(stack.goals(), &[GoalKind::Cure, GoalKind::LostItem]);
    /// ```
    pub fn new<I: IntoIterator<Item = GoalKind>>(goals: I) -> Self {
        let mut stack = Self::default();
        for goal in goals {
            stack.push(goal);
        }
        stack
    }

    /// Parses a comma-separated plan like `"cure,key_and_door"`, ignoring unknown names.
    pub fn parse_plan(raw: &str) -> Self {
        Self::new(raw.split(',').filter_map(GoalKind::parse))
    }

    /// Adds a goal if it is new and there is room. Returns whether it was added.
    pub fn push(&mut self, goal: GoalKind) -> bool {
        if self.goals.contains(&goal) || self.goals.len() >= Self::MAX_GOALS {
            return false;
        }
        self.goals.push(goal);
        true
    }

    pub fn contains(&self, goal: GoalKind) -> bool {
        self.goals.contains(&goal)
    }

    pub fn goals(&self) -> &[GoalKind] {
        &self.goals
    }

    pub fn iter(&self) -> impl Iterator<Item = GoalKind> + '_ {
        self.goals.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.goals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.goals.is_empty()
    }

    /// The stack a level actually plays: an empty stack becomes `[lost_item]`.
    pub fn or_default_goal(self) -> Self {
        if self.is_empty() {
            Self::new([GoalKind::LostItem])
        } else {
            self
        }
    }
}

impl FromIterator<GoalKind> for GoalStack {
    fn from_iter<I: IntoIterator<Item = GoalKind>>(iter: I) -> Self {
        Self::new(iter)
    }
}
