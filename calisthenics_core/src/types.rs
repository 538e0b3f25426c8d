//! Core domain types for the calisthenics skill system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Skills and workout categories
//! - Exercises (catalog entries)
//! - Progression nodes and their mastery criteria
//! - Per-node performance tracking

use crate::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Skills
// ============================================================================

/// A bodyweight skill with its own progression tree
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum Skill {
    Handstand,
    Planche,
    Lsit,
    FrontLever,
    BackLever,
}

impl Skill {
    /// Every skill, in the order trees are cycled through
    pub const ALL: [Skill; 5] = [
        Skill::Handstand,
        Skill::Planche,
        Skill::Lsit,
        Skill::FrontLever,
        Skill::BackLever,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Skill::Handstand => "handstand",
            Skill::Planche => "planche",
            Skill::Lsit => "lsit",
            Skill::FrontLever => "frontLever",
            Skill::BackLever => "backLever",
        }
    }

    /// Canonical muscle groups trained by the skill
    pub fn target_muscles(&self) -> &'static [&'static str] {
        match self {
            Skill::Handstand => &["shoulders", "core", "wrists", "balance"],
            Skill::Planche => &["shoulders", "chest", "core", "wrists"],
            Skill::Lsit => &["core", "hip-flexors", "triceps"],
            Skill::FrontLever => &["back", "lats", "core"],
            Skill::BackLever => &["back", "lats", "biceps"],
        }
    }

    /// Exercise id prefix used to recognise skill work for this skill.
    ///
    /// This is the first two characters of the skill name, so handstand
    /// yields "ha" and does not match the "hs-" ids of the built-in catalog.
    pub fn id_prefix(&self) -> &'static str {
        &self.as_str()[..2]
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Skill {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "handstand" => Ok(Skill::Handstand),
            "planche" => Ok(Skill::Planche),
            "lsit" | "l-sit" | "l_sit" => Ok(Skill::Lsit),
            "frontlever" | "front_lever" | "front-lever" => Ok(Skill::FrontLever),
            "backlever" | "back_lever" | "back-lever" => Ok(Skill::BackLever),
            other => Err(Error::UnknownSkill(other.to_string())),
        }
    }
}

// ============================================================================
// Categories / sections
// ============================================================================

/// Exercise category, which is also the workout section it lands in
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Warmup,
    Skill,
    Strength,
    Cooldown,
}

impl Category {
    /// Sections in workout order
    pub const ALL: [Category; 4] = [
        Category::Warmup,
        Category::Skill,
        Category::Strength,
        Category::Cooldown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Warmup => "warmup",
            Category::Skill => "skill",
            Category::Strength => "strength",
            Category::Cooldown => "cooldown",
        }
    }

    /// Metabolic equivalent used for calorie estimates
    pub fn met_value(&self) -> f64 {
        match self {
            Category::Warmup => 3.5,
            Category::Skill => 4.0,
            Category::Strength => 5.0,
            Category::Cooldown => 2.5,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "warmup" => Ok(Category::Warmup),
            "skill" => Ok(Category::Skill),
            "strength" => Ok(Category::Strength),
            "cooldown" => Ok(Category::Cooldown),
            other => Err(Error::UnknownCategory(other.to_string())),
        }
    }
}

// ============================================================================
// Exercises
// ============================================================================

/// An immutable catalog entry
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub category: Category,
    /// Global difficulty, comparable across skills
    pub progression_level: u32,
    /// Ordered muscle tags, primary first
    pub target_muscles: Vec<String>,
    #[serde(default)]
    pub skill_tags: Vec<String>,
    #[serde(default)]
    pub rep_range: Option<(u32, u32)>,
    #[serde(default)]
    pub time_range: Option<(u32, u32)>,
    #[serde(default)]
    pub description: String,
}

impl Exercise {
    pub fn primary_muscle(&self) -> Option<&str> {
        self.target_muscles.first().map(String::as_str)
    }

    /// Whether the exercise sits within two levels of `level`
    pub fn is_suitable_for_level(&self, level: u32) -> bool {
        self.progression_level.abs_diff(level) <= 2
    }
}

// ============================================================================
// Progression nodes
// ============================================================================

/// Thresholds that must all be met to master a node
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MasteryCriteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reps: Option<u32>,
    /// Seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hold_time: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consecutive_successes: Option<u32>,
}

impl MasteryCriteria {
    pub fn reps(reps: u32) -> Self {
        Self {
            reps: Some(reps),
            ..Self::default()
        }
    }

    pub fn hold(seconds: u32) -> Self {
        Self {
            hold_time: Some(seconds),
            ..Self::default()
        }
    }

    pub fn with_consecutive(mut self, successes: u32) -> Self {
        self.consecutive_successes = Some(successes);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.reps.is_none() && self.hold_time.is_none() && self.consecutive_successes.is_none()
    }
}

/// One milestone in a skill's progression DAG
///
/// Edges are node ids resolved through the owning tree.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ProgressionNode {
    pub id: String,
    pub name: String,
    pub level: u32,
    pub skill: Skill,
    #[serde(default)]
    pub exercise_ids: Vec<String>,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub criteria: MasteryCriteria,
    #[serde(default)]
    pub next_nodes: Vec<String>,
}

impl ProgressionNode {
    pub fn new(id: &str, name: &str, level: u32, skill: Skill) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            level,
            skill,
            exercise_ids: Vec::new(),
            prerequisites: Vec::new(),
            criteria: MasteryCriteria::default(),
            next_nodes: Vec::new(),
        }
    }

    pub fn exercises(mut self, ids: &[&str]) -> Self {
        self.exercise_ids = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn requires(mut self, ids: &[&str]) -> Self {
        self.prerequisites = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn criteria(mut self, criteria: MasteryCriteria) -> Self {
        self.criteria = criteria;
        self
    }

    /// True when every prerequisite id appears in `completed`
    pub fn is_accessible(&self, completed: &BTreeSet<String>) -> bool {
        self.prerequisites.iter().all(|req| completed.contains(req))
    }
}

impl fmt::Display for ProgressionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Level {}) - Skill: {}", self.name, self.level, self.skill)
    }
}

/// Derived state of a node for one user
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum NodeState {
    /// Prerequisites unsatisfied
    Locked,
    /// Prerequisites satisfied, not yet completed
    Available,
    /// Recorded in the user's completed set
    Mastered,
}

// ============================================================================
// Performance tracking
// ============================================================================

/// Running performance record for a single progression node
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct PerformanceMetrics {
    pub attempts: u32,
    pub successful_attempts: u32,
    /// Longest hold in seconds
    pub max_time: u32,
    pub max_reps: u32,
    pub consecutive_successes: u32,
    pub last_attempt_date: Option<DateTime<Utc>>,
}

/// A single attempt at a node, as reported after a workout
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct NodeAttempt {
    pub success: bool,
    #[serde(default)]
    pub time: Option<u32>,
    #[serde(default)]
    pub reps: Option<u32>,
}
