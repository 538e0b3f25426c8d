//! Progression tracking over the skill trees.
//!
//! Node states are derived from the profile on every query and never
//! stored. A node is Locked until all prerequisites are completed, then
//! Available, and Mastered once it is recorded in the completed set.

use crate::history;
use crate::profile::UserProfile;
use crate::tree::{ProgressionTree, TreeStore};
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How far above the user's level a node may sit and still be offered
const LEVEL_ALLOWANCE: u32 = 2;

/// Workout history entries considered by readiness estimates
const READINESS_WINDOW: usize = 3;

const READINESS_MIN_ENTRIES: usize = 2;
const READINESS_MIN_RATING: f64 = 4.0;

/// Share of the target criteria asked for in the first week
const RAMP_START: f64 = 0.6;

/// Per-week targets derived from the target node's criteria
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeeklyTargets {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hold_time: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reps: Option<u32>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeeklyGoal {
    /// 1-based
    pub week: u32,
    /// Target node name
    pub focus: String,
    pub exercises: Vec<String>,
    pub goals: WeeklyTargets,
}

/// A multi-week ramp toward the next node on a skill's path
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DevelopmentPlan {
    pub skill: Skill,
    pub current_level: u32,
    pub target_node: Option<String>,
    pub weeks: Vec<WeeklyGoal>,
}

/// Answers progression queries against a read-only tree store
pub struct ProgressionTracker<'a> {
    trees: &'a TreeStore,
}

impl<'a> ProgressionTracker<'a> {
    pub fn new(trees: &'a TreeStore) -> Self {
        Self { trees }
    }

    fn tree(&self, skill: Skill) -> Option<&'a ProgressionTree> {
        self.trees.get_tree(skill)
    }

    /// Lowest-level available node within reach of the user's level
    pub fn next_node(&self, profile: &UserProfile, skill: Skill) -> Option<&'a ProgressionNode> {
        let tree = self.tree(skill)?;
        let completed = profile.completed_nodes(skill);
        let ceiling = profile.skill_level(skill).saturating_add(LEVEL_ALLOWANCE);

        tree.nodes()
            .filter(|n| n.is_accessible(completed))
            .filter(|n| !completed.contains(&n.id))
            .filter(|n| n.level <= ceiling)
            .min_by_key(|n| n.level)
    }

    /// Recompute a skill level as the highest completed node level (min 1)
    ///
    /// Overwrites any manually set level. Skills without a tree keep their
    /// current level.
    pub fn update_skill_level(&self, profile: &mut UserProfile, skill: Skill) -> u32 {
        let Some(tree) = self.tree(skill) else {
            return profile.skill_level(skill);
        };

        let level = profile
            .completed_nodes(skill)
            .iter()
            .filter_map(|id| tree.get(id))
            .map(|n| n.level)
            .fold(1, u32::max);

        if level != profile.skill_level(skill) {
            tracing::info!("{} level is now {}", skill, level);
        }
        profile.set_skill_level(skill, level);
        level
    }

    /// Whether `metrics` meet every criterion set on `node`
    ///
    /// Nodes without criteria are never mastered this way.
    pub fn has_mastered(node: &ProgressionNode, metrics: Option<&PerformanceMetrics>) -> bool {
        let criteria = &node.criteria;
        if criteria.is_empty() {
            return false;
        }
        let Some(m) = metrics else {
            return false;
        };

        criteria.reps.map_or(true, |r| m.max_reps >= r)
            && criteria.hold_time.map_or(true, |t| m.max_time >= t)
            && criteria
                .consecutive_successes
                .map_or(true, |c| m.consecutive_successes >= c)
    }

    /// `has_mastered` for a node looked up by id; false if it is unknown
    pub fn has_node_mastered(&self, profile: &UserProfile, skill: Skill, node_id: &str) -> bool {
        self.tree(skill)
            .and_then(|t| t.get(node_id))
            .map_or(false, |node| Self::has_mastered(node, profile.metrics(node_id)))
    }

    pub fn node_state(&self, profile: &UserProfile, skill: Skill, node_id: &str) -> Option<NodeState> {
        let node = self.tree(skill)?.get(node_id)?;
        let completed = profile.completed_nodes(skill);

        Some(if completed.contains(node_id) {
            NodeState::Mastered
        } else if node.is_accessible(completed) {
            NodeState::Available
        } else {
            NodeState::Locked
        })
    }

    /// Depth-first walk from the root over reachable nodes, in preorder
    ///
    /// A neighbour is entered only when its prerequisites are completed and
    /// it is within reach of the user's level.
    pub fn progression_path(&self, profile: &UserProfile, skill: Skill) -> Vec<&'a ProgressionNode> {
        let Some(tree) = self.tree(skill) else {
            return Vec::new();
        };
        let Some(root) = tree.root() else {
            return Vec::new();
        };

        let completed = profile.completed_nodes(skill);
        let ceiling = profile.skill_level(skill).saturating_add(LEVEL_ALLOWANCE);

        let mut path = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![root];

        while let Some(node) = stack.pop() {
            if !visited.insert(node.id.as_str()) {
                continue;
            }
            path.push(node);

            // reversed so the first edge is explored first
            let next: Vec<_> = tree
                .next_nodes(node)
                .filter(|n| n.is_accessible(completed) && n.level <= ceiling)
                .collect();
            stack.extend(next.into_iter().rev());
        }

        tracing::debug!("{} path: {} nodes", skill, path.len());
        path
    }

    /// Weekly goals ramping linearly from 60% to 100% of the target criteria
    ///
    /// The target is the first uncompleted node on the path, or its last
    /// node when everything is completed.
    pub fn development_plan(&self, profile: &UserProfile, skill: Skill, weeks: u32) -> DevelopmentPlan {
        let path = self.progression_path(profile, skill);
        let completed = profile.completed_nodes(skill);

        let target = path
            .iter()
            .find(|n| !completed.contains(&n.id))
            .or_else(|| path.last())
            .copied();

        let goals = match target {
            Some(node) => (0..weeks)
                .map(|week| WeeklyGoal {
                    week: week + 1,
                    focus: node.name.clone(),
                    exercises: node.exercise_ids.clone(),
                    goals: WeeklyTargets {
                        hold_time: node.criteria.hold_time.map(|t| progressive_goal(t, week, weeks)),
                        reps: node.criteria.reps.map(|r| progressive_goal(r, week, weeks)),
                    },
                })
                .collect(),
            None => Vec::new(),
        };

        DevelopmentPlan {
            skill,
            current_level: profile.skill_level(skill),
            target_node: target.map(|n| n.name.clone()),
            weeks: goals,
        }
    }

    /// Bump the skill level when recent focused sessions were rated highly
    ///
    /// Looks at the last three workouts focused on `skill`; unrated ones
    /// count as zero. Needs at least two of them averaging 4 or more.
    pub fn estimate_readiness(&self, profile: &mut UserProfile, skill: Skill) -> bool {
        let recent = history::recent_for_skill(&profile.workout_history, skill, READINESS_WINDOW);
        if recent.len() < READINESS_MIN_ENTRIES {
            return false;
        }

        let total: u32 = recent.iter().map(|r| r.rating.unwrap_or(0) as u32).sum();
        let average = total as f64 / recent.len() as f64;
        if average < READINESS_MIN_RATING {
            return false;
        }

        let level = profile.skill_level(skill).saturating_add(1);
        tracing::info!(
            "Ready to progress {} (average rating {:.1}), level {}",
            skill,
            average,
            level
        );
        profile.set_skill_level(skill, level);
        true
    }
}

/// `round(target * (0.6 + 0.4 * week / (weeks - 1)))`; full target for one week
pub fn progressive_goal(target: u32, week: u32, weeks: u32) -> u32 {
    if weeks <= 1 {
        return target;
    }
    let share = RAMP_START + (1.0 - RAMP_START) * (week as f64 / (weeks - 1) as f64);
    (target as f64 * share).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::WorkoutPerformance;
    use crate::tree::build_default_trees;
    use crate::workout::Workout;

    fn rated(profile: &mut UserProfile, skill: Skill, rating: Option<u8>) {
        let workout = Workout::builder(30).focus_skill(Some(skill)).build();
        let performance = WorkoutPerformance {
            rating,
            ..WorkoutPerformance::default()
        };
        profile.record_workout_completion(&workout, &performance);
    }

    fn metrics(max_time: u32, max_reps: u32, consecutive: u32) -> PerformanceMetrics {
        PerformanceMetrics {
            max_time,
            max_reps,
            consecutive_successes: consecutive,
            ..PerformanceMetrics::default()
        }
    }

    #[test]
    fn test_fresh_profile_starts_at_root() {
        let trees = build_default_trees();
        let tracker = ProgressionTracker::new(&trees);
        let profile = UserProfile::default();

        assert_eq!(tracker.next_node(&profile, Skill::Handstand).unwrap().id, "hs-wall-plank");
        assert_eq!(tracker.next_node(&profile, Skill::Lsit).unwrap().id, "ls-foot-supported");
    }

    #[test]
    fn test_next_node_after_wall_plank() {
        let trees = build_default_trees();
        let tracker = ProgressionTracker::new(&trees);
        let mut profile = UserProfile::default();
        profile.complete_node(Skill::Handstand, "hs-wall-plank");

        let next = tracker.next_node(&profile, Skill::Handstand).unwrap();
        assert_eq!(next.id, "hs-pike-pushup");
    }

    #[test]
    fn test_next_node_respects_level_allowance() {
        let trees = build_default_trees();
        let tracker = ProgressionTracker::new(&trees);
        let mut profile = UserProfile::default();
        for id in ["pl-plank", "pl-elevated-plank", "pl-pseudo-planche", "pl-planche-leans"] {
            profile.complete_node(Skill::Planche, id);
        }

        // tuck planche is level 5, user level 1 allows up to 3
        assert!(tracker.next_node(&profile, Skill::Planche).is_none());

        tracker.update_skill_level(&mut profile, Skill::Planche);
        assert_eq!(tracker.next_node(&profile, Skill::Planche).unwrap().id, "pl-tuck-planche");
    }

    #[test]
    fn test_skills_without_nodes_yield_nothing() {
        let trees = build_default_trees();
        let tracker = ProgressionTracker::new(&trees);
        let profile = UserProfile::default();

        assert!(tracker.next_node(&profile, Skill::FrontLever).is_none());
        assert!(tracker.progression_path(&profile, Skill::BackLever).is_empty());
        assert!(tracker.node_state(&profile, Skill::FrontLever, "fl-tuck").is_none());

        let plan = tracker.development_plan(&profile, Skill::FrontLever, 4);
        assert!(plan.target_node.is_none());
        assert!(plan.weeks.is_empty());

        let empty = TreeStore::new();
        let tracker = ProgressionTracker::new(&empty);
        assert!(tracker.next_node(&profile, Skill::Handstand).is_none());
    }

    #[test]
    fn test_update_skill_level_is_max_completed() {
        let trees = build_default_trees();
        let tracker = ProgressionTracker::new(&trees);
        let mut profile = UserProfile::default();

        profile.set_skill_level(Skill::Handstand, 7);
        assert_eq!(tracker.update_skill_level(&mut profile, Skill::Handstand), 1);

        profile.complete_node(Skill::Handstand, "hs-wall-plank");
        profile.complete_node(Skill::Handstand, "hs-wall-walk");
        profile.complete_node(Skill::Handstand, "not-a-node");
        assert_eq!(tracker.update_skill_level(&mut profile, Skill::Handstand), 3);
        assert_eq!(tracker.update_skill_level(&mut profile, Skill::Handstand), 3);
        assert_eq!(profile.skill_level(Skill::Handstand), 3);
    }

    #[test]
    fn test_skill_level_never_decreases_as_nodes_complete() {
        let trees = build_default_trees();
        let tracker = ProgressionTracker::new(&trees);
        let tree = trees.get_tree(Skill::Handstand).unwrap();
        let mut profile = UserProfile::default();

        let mut previous = tracker.update_skill_level(&mut profile, Skill::Handstand);
        for node in tree.nodes() {
            profile.complete_node(Skill::Handstand, &node.id);
            let level = tracker.update_skill_level(&mut profile, Skill::Handstand);
            assert!(level >= previous);
            previous = level;
        }
        assert_eq!(previous, 9);
    }

    #[test]
    fn test_hold_time_mastery_boundary() {
        let node = ProgressionNode::new("n", "N", 1, Skill::Handstand).criteria(MasteryCriteria::hold(60));

        assert!(ProgressionTracker::has_mastered(&node, Some(&metrics(65, 0, 0))));
        assert!(ProgressionTracker::has_mastered(&node, Some(&metrics(60, 0, 0))));
        assert!(!ProgressionTracker::has_mastered(&node, Some(&metrics(59, 0, 0))));
        assert!(!ProgressionTracker::has_mastered(&node, None));
    }

    #[test]
    fn test_mastery_requires_every_criterion() {
        let node = ProgressionNode::new("n", "N", 1, Skill::Planche)
            .criteria(MasteryCriteria::reps(10).with_consecutive(3));

        assert!(ProgressionTracker::has_mastered(&node, Some(&metrics(0, 10, 3))));
        assert!(!ProgressionTracker::has_mastered(&node, Some(&metrics(0, 12, 2))));
        assert!(!ProgressionTracker::has_mastered(&node, Some(&metrics(100, 9, 5))));

        let bare = ProgressionNode::new("b", "B", 1, Skill::Planche);
        assert!(!ProgressionTracker::has_mastered(&bare, Some(&metrics(100, 100, 100))));
    }

    #[test]
    fn test_has_node_mastered_uses_profile_metrics() {
        let trees = build_default_trees();
        let tracker = ProgressionTracker::new(&trees);
        let mut profile = UserProfile::default();

        assert!(!tracker.has_node_mastered(&profile, Skill::Handstand, "hs-wall-plank"));
        profile.update_node_performance(
            "hs-wall-plank",
            &NodeAttempt {
                success: true,
                time: Some(61),
                reps: None,
            },
        );
        assert!(tracker.has_node_mastered(&profile, Skill::Handstand, "hs-wall-plank"));
        assert!(!tracker.has_node_mastered(&profile, Skill::Handstand, "ghost"));
    }

    #[test]
    fn test_node_states_only_move_forward() {
        let trees = build_default_trees();
        let tracker = ProgressionTracker::new(&trees);
        let tree = trees.get_tree(Skill::Handstand).unwrap();
        let mut profile = UserProfile::default();

        let states = |profile: &UserProfile| -> Vec<NodeState> {
            tree.nodes()
                .map(|n| tracker.node_state(profile, Skill::Handstand, &n.id).unwrap())
                .collect()
        };

        assert_eq!(states(&profile)[0], NodeState::Available);
        assert_eq!(states(&profile)[3], NodeState::Locked);

        let mut previous = states(&profile);
        for id in ["hs-wall-plank", "hs-wall-walk", "hs-pike-pushup", "hs-wall-handstand"] {
            profile.complete_node(Skill::Handstand, id);
            let current = states(&profile);
            assert!(previous.iter().zip(&current).all(|(before, after)| after >= before));
            previous = current;
        }
        assert_eq!(
            tracker.node_state(&profile, Skill::Handstand, "hs-chest-to-wall"),
            Some(NodeState::Available)
        );
    }

    #[test]
    fn test_unresolved_prerequisite_stays_locked() {
        let s = Skill::FrontLever;
        let mut tree = ProgressionTree::new(s);
        tree.add_node(ProgressionNode::new("fl-tuck", "Tuck", 1, s).requires(&["fl-missing"]));
        let mut store = TreeStore::new();
        store.insert(tree);

        let tracker = ProgressionTracker::new(&store);
        let profile = UserProfile::default();
        assert_eq!(tracker.node_state(&profile, s, "fl-tuck"), Some(NodeState::Locked));
        assert!(tracker.next_node(&profile, s).is_none());
    }

    #[test]
    fn test_progression_path_preorder() {
        let trees = build_default_trees();
        let tracker = ProgressionTracker::new(&trees);
        let mut profile = UserProfile::default();

        let ids = |path: Vec<&ProgressionNode>| path.iter().map(|n| n.id.clone()).collect::<Vec<_>>();

        assert_eq!(ids(tracker.progression_path(&profile, Skill::Handstand)), vec!["hs-wall-plank"]);

        profile.complete_node(Skill::Handstand, "hs-wall-plank");
        assert_eq!(
            ids(tracker.progression_path(&profile, Skill::Handstand)),
            vec!["hs-wall-plank", "hs-pike-pushup", "hs-wall-walk"]
        );

        profile.complete_node(Skill::Handstand, "hs-pike-pushup");
        profile.complete_node(Skill::Handstand, "hs-wall-walk");
        tracker.update_skill_level(&mut profile, Skill::Handstand);
        // the wall handstand is reached through the pike push-up and not repeated
        assert_eq!(
            ids(tracker.progression_path(&profile, Skill::Handstand)),
            vec!["hs-wall-plank", "hs-pike-pushup", "hs-wall-handstand", "hs-wall-walk"]
        );
    }

    #[test]
    fn test_goal_ramp_boundaries() {
        assert_eq!(progressive_goal(60, 0, 4), 36);
        assert_eq!(progressive_goal(60, 3, 4), 60);
        assert_eq!(progressive_goal(10, 1, 4), 7);
        assert_eq!(progressive_goal(45, 0, 1), 45);
    }

    #[test]
    fn test_development_plan_targets_next_node() {
        let trees = build_default_trees();
        let tracker = ProgressionTracker::new(&trees);
        let mut profile = UserProfile::default();
        profile.complete_node(Skill::Handstand, "hs-wall-plank");

        let plan = tracker.development_plan(&profile, Skill::Handstand, 4);
        assert_eq!(plan.target_node.as_deref(), Some("Pike Push-up"));
        assert_eq!(plan.current_level, 1);
        assert_eq!(plan.weeks.len(), 4);
        assert_eq!(plan.weeks[0].week, 1);
        assert_eq!(plan.weeks[0].goals.reps, Some(6));
        assert_eq!(plan.weeks[0].goals.hold_time, None);
        assert_eq!(plan.weeks[3].goals.reps, Some(10));
        assert_eq!(plan.weeks[0].exercises, vec!["st-pushup".to_string()]);
    }

    #[test]
    fn test_development_plan_falls_back_to_last_node() {
        let trees = build_default_trees();
        let tracker = ProgressionTracker::new(&trees);
        let mut profile = UserProfile::default();
        profile.set_skill_level(Skill::Lsit, 10);
        let tree = trees.get_tree(Skill::Lsit).unwrap();
        for node in tree.nodes() {
            profile.complete_node(Skill::Lsit, &node.id);
        }

        let plan = tracker.development_plan(&profile, Skill::Lsit, 2);
        assert_eq!(plan.target_node.as_deref(), Some("V-Sit"));
        assert_eq!(plan.weeks[0].goals.hold_time, Some(6));
        assert_eq!(plan.weeks[1].goals.hold_time, Some(10));
    }

    #[test]
    fn test_readiness_needs_two_sessions() {
        let trees = build_default_trees();
        let tracker = ProgressionTracker::new(&trees);
        let mut profile = UserProfile::default();

        assert!(!tracker.estimate_readiness(&mut profile, Skill::Handstand));

        rated(&mut profile, Skill::Handstand, Some(5));
        let before = profile.skill_levels.clone();
        assert!(!tracker.estimate_readiness(&mut profile, Skill::Handstand));
        assert_eq!(profile.skill_levels, before);
    }

    #[test]
    fn test_readiness_bumps_level() {
        let trees = build_default_trees();
        let tracker = ProgressionTracker::new(&trees);
        let mut profile = UserProfile::default();

        rated(&mut profile, Skill::Planche, Some(4));
        rated(&mut profile, Skill::Handstand, Some(1));
        rated(&mut profile, Skill::Planche, Some(5));

        assert!(tracker.estimate_readiness(&mut profile, Skill::Planche));
        assert_eq!(profile.skill_level(Skill::Planche), 2);
        assert_eq!(profile.skill_level(Skill::Handstand), 1);
    }

    #[test]
    fn test_readiness_only_counts_last_three_sessions() {
        let trees = build_default_trees();
        let tracker = ProgressionTracker::new(&trees);
        let mut profile = UserProfile::default();

        // Averaging all four would be 3.75
        rated(&mut profile, Skill::Handstand, Some(1));
        rated(&mut profile, Skill::Handstand, Some(5));
        rated(&mut profile, Skill::Handstand, Some(5));
        rated(&mut profile, Skill::Handstand, Some(4));

        assert!(tracker.estimate_readiness(&mut profile, Skill::Handstand));
        assert_eq!(profile.skill_level(Skill::Handstand), 2);
    }

    #[test]
    fn test_readiness_ignores_old_unrated_session() {
        let trees = build_default_trees();
        let tracker = ProgressionTracker::new(&trees);
        let mut profile = UserProfile::default();

        rated(&mut profile, Skill::Planche, None);
        rated(&mut profile, Skill::Planche, Some(4));
        rated(&mut profile, Skill::Lsit, Some(1));
        rated(&mut profile, Skill::Planche, Some(4));
        rated(&mut profile, Skill::Planche, Some(4));

        assert!(tracker.estimate_readiness(&mut profile, Skill::Planche));
        assert_eq!(profile.skill_level(Skill::Planche), 2);
    }

    #[test]
    fn test_readiness_recent_low_rating_blocks() {
        let trees = build_default_trees();
        let tracker = ProgressionTracker::new(&trees);
        let mut profile = UserProfile::default();

        rated(&mut profile, Skill::Lsit, Some(5));
        rated(&mut profile, Skill::Lsit, Some(5));
        rated(&mut profile, Skill::Lsit, Some(5));
        rated(&mut profile, Skill::Lsit, None);
        rated(&mut profile, Skill::Lsit, Some(5));

        // Window is 5, None, 5
        assert!(!tracker.estimate_readiness(&mut profile, Skill::Lsit));
        assert_eq!(profile.skill_level(Skill::Lsit), 1);
    }

    #[test]
    fn test_extreme_imported_level_does_not_overflow() {
        let trees = build_default_trees();
        let tracker = ProgressionTracker::new(&trees);
        let mut profile: UserProfile =
            serde_json::from_str(r#"{"skill_levels":{"handstand":4294967295}}"#).unwrap();

        assert_eq!(tracker.next_node(&profile, Skill::Handstand).unwrap().id, "hs-wall-plank");
        let path = tracker.progression_path(&profile, Skill::Handstand);
        assert_eq!(path.first().unwrap().id, "hs-wall-plank");
        assert!(!tracker.development_plan(&profile, Skill::Handstand, 4).weeks.is_empty());

        rated(&mut profile, Skill::Handstand, Some(5));
        rated(&mut profile, Skill::Handstand, Some(5));
        assert!(tracker.estimate_readiness(&mut profile, Skill::Handstand));
        assert_eq!(profile.skill_level(Skill::Handstand), u32::MAX);
    }

    #[test]
    fn test_readiness_counts_missing_ratings_as_zero() {
        let trees = build_default_trees();
        let tracker = ProgressionTracker::new(&trees);
        let mut profile = UserProfile::default();

        rated(&mut profile, Skill::Lsit, Some(5));
        rated(&mut profile, Skill::Lsit, Some(5));
        rated(&mut profile, Skill::Lsit, None);

        assert!(!tracker.estimate_readiness(&mut profile, Skill::Lsit));
        assert_eq!(profile.skill_level(Skill::Lsit), 1);
    }
}
