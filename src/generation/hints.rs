//! # Prompt Hints and Goal Plans
//!
//! Keyword heuristics that turn a free-form level prompt into goal kinds and
//! environment hints, and the seeded planner that assigns goal stacks to a
//! short run of levels.

use super::utils::rand_between;
use crate::{Biome, GoalKind, GoalStack, LayoutStyle, LevelSpec, TimeOfDay};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Most levels a plan covers.
pub const MAX_PLANNED_LEVELS: usize = 3;

const GOAL_KEYWORDS: &[(GoalKind, &[&str])] = &[
    (GoalKind::Cure, &["heal", "cure", "sick", "remedy", "medicine"]),
    (GoalKind::KeyAndDoor, &["unlock", "key", "door", "gate", "sealed"]),
    (GoalKind::LostItem, &["lost", "missing", "heirloom", "stolen", "memento"]),
    (GoalKind::RepairBridge, &["bridge", "repair", "fix", "planks", "rope", "nails"]),
];

const TIME_KEYWORDS: &[(TimeOfDay, &[&str])] = &[
    (TimeOfDay::Night, &["night", "midnight", "moonlit", "starlit"]),
    (TimeOfDay::Sunset, &["sunset", "dusk", "twilight"]),
    (TimeOfDay::Dawn, &["dawn", "sunrise", "early morning"]),
    (TimeOfDay::Day, &["day", "noon", "afternoon", "morning"]),
];

const BIOME_KEYWORDS: &[(Biome, &[&str])] = &[
    (Biome::Meadow, &["meadow", "field", "fields", "plains", "grassland"]),
    (Biome::Desert, &["desert", "oasis", "dune", "sand"]),
    (Biome::Beach, &["beach", "coast", "seaside", "shore", "port", "harbor"]),
    (Biome::Snow, &["snow", "blizzard", "ice", "frost", "winter"]),
    (Biome::Town, &["town", "village", "city", "market", "bazaar", "street"]),
    (Biome::Castle, &["castle", "keep"]),
    (Biome::Ruins, &["ruins", "temple", "ancient", "dungeon"]),
    (Biome::Forest, &["forest", "woods", "grove", "jungle"]),
];

const LAYOUT_KEYWORDS: &[(LayoutStyle, &[&str])] = &[
    (LayoutStyle::WindingRoad, &["winding_road", "winding road"]),
    (LayoutStyle::Crossroads, &["crossroads"]),
    (LayoutStyle::RingRoad, &["ring_road", "ring road"]),
    (LayoutStyle::LakeCenter, &["lake_center", "lake center", "central lake"]),
    (LayoutStyle::Islands, &["islands"]),
    (LayoutStyle::RuinRing, &["ruin_ring", "ruin ring"]),
    (LayoutStyle::Oasis, &["oasis"]),
    (LayoutStyle::MarketStreet, &["market", "bazaar", "street"]),
    (LayoutStyle::Plaza, &["plaza", "square", "courtyard"]),
    (LayoutStyle::Coastline, &["coast", "shore", "seaside"]),
    (LayoutStyle::MazeGrove, &["maze", "labyrinth"]),
    (LayoutStyle::Riverbend, &["river", "creek", "stream"]),
];

/// Words that become theme tags whenever they appear in a prompt.
pub const THEME_TAG_VOCABULARY: &[&str] = &[
    "oasis", "market", "bazaar", "ruins", "temple", "castle", "port", "harbor", "lantern",
    "festival", "mushroom", "vines", "statue",
];

/// First table entry with any keyword contained in `prompt`.
fn match_keywords<T: Copy>(prompt: &str, table: &[(T, &[&str])]) -> Option<T> {
    table
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| prompt.contains(k)))
        .map(|(value, _)| *value)
}

/// Goal kinds implied by a prompt, in priority order.
///
/// # Examples
///
/// ```
/// use questgrid::{infer_goals, GoalKind};
///
/// let goals = infer_goals("Fix the old bridge and find my lost ring");
/// assert_eq!(goals.goals(), &[GoalKind::LostItem, GoalKind::RepairBridge]);
/// ```
pub fn infer_goals(prompt: &str) -> GoalStack {
    let prompt = prompt.to_lowercase();
    GOAL_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| prompt.contains(k)))
        .map(|(goal, _)| *goal)
        .collect()
}

/// Environment intent read from a prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvHints {
    pub time_of_day: Option<TimeOfDay>,
    pub biome: Option<Biome>,
    pub layout_style: Option<LayoutStyle>,
    pub theme_tags: BTreeSet<String>,
}

impl EnvHints {
    /// Scans a prompt with the keyword tables. The detected biome and time of
    /// day are also added as theme tags.
    pub fn extract(prompt: &str) -> Self {
        let prompt = prompt.to_lowercase();
        let time_of_day = match_keywords(&prompt, TIME_KEYWORDS);
        let biome = match_keywords(&prompt, BIOME_KEYWORDS);
        let layout_style = match_keywords(&prompt, LAYOUT_KEYWORDS);

        let mut theme_tags: BTreeSet<String> = THEME_TAG_VOCABULARY
            .iter()
            .filter(|tag| prompt.contains(*tag))
            .map(|tag| tag.to_string())
            .collect();
        if let Some(biome) = biome {
            theme_tags.insert(biome.name().to_string());
        }
        if let Some(time) = time_of_day {
            theme_tags.insert(time.name().to_string());
        }

        Self {
            time_of_day,
            biome,
            layout_style,
            theme_tags,
        }
    }
}

/// Assigns a goal stack to each of `level_count` levels (clamped to 1..=3).
///
/// A non-empty per-level selection is used as given. Other levels stack one
/// or two goals drawn from the prompt's inferred goals (or every goal),
/// preferring kinds no earlier level has used.
pub fn build_goal_plans(
    prompt: &str,
    per_level: &[GoalStack],
    level_count: usize,
    rng: &mut StdRng,
) -> Vec<GoalStack> {
    let level_count = level_count.clamp(1, MAX_PLANNED_LEVELS);
    let inferred = infer_goals(prompt);
    let candidates: Vec<GoalKind> = if inferred.is_empty() {
        GoalKind::ALL.to_vec()
    } else {
        inferred.goals().to_vec()
    };

    let mut used: Vec<GoalKind> = Vec::new();
    let mut plans = Vec::with_capacity(level_count);
    for level in 0..level_count {
        let plan = match per_level.get(level).filter(|stack| !stack.is_empty()) {
            Some(selected) => selected.clone(),
            None => {
                let fresh: Vec<GoalKind> = candidates
                    .iter()
                    .copied()
                    .filter(|goal| !used.contains(goal))
                    .collect();
                let pool = if fresh.is_empty() { candidates.clone() } else { fresh };
                let max_stack = pool.len().min(2) as i32;
                let stack_size = rand_between(rng, 1, max_stack) as usize;
                pool.choose_multiple(rng, stack_size).copied().collect()
            }
        };
        for goal in plan.iter() {
            if !used.contains(&goal) {
                used.push(goal);
            }
        }
        plans.push(plan);
    }
    plans
}

impl LevelSpec {
    /// Fills in a level description from prompt hints.
    ///
    /// The hinted biome wins over `biome`. Features are a random 3..=5 of the
    /// biome's defaults; the layout style is the hinted one or a random pick
    /// among the biome's styles.
    pub fn designed(seed: u64, biome: Biome, hints: &EnvHints, rng: &mut StdRng) -> Self {
        let biome = hints.biome.unwrap_or(biome);
        let base = biome.default_features();
        let upper = base.len().min(5) as i32;
        let count = rand_between(rng, 3.min(upper), upper) as usize;
        let features: Vec<_> = base.choose_multiple(rng, count).copied().collect();

        let layout_style = match hints.layout_style {
            Some(style) => style,
            None => biome
                .layout_styles()
                .choose(rng)
                .copied()
                .unwrap_or_default(),
        };

        LevelSpec::new(seed, biome, layout_style)
            .with_features(features)
            .with_theme_tags(&hints.theme_tags)
            .with_time_of_day(hints.time_of_day.unwrap_or_default())
    }
}
