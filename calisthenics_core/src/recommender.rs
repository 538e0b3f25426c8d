//! Workout recommendation and progress tracking.
//!
//! The recommender resolves duration, focus skill and difficulty for a
//! profile, splits the duration across the four sections and fills each
//! section through the `ExerciseSelector`. Tracking feeds reported
//! performance back into the profile through the `ProgressionTracker`.

use crate::catalog::Catalog;
use crate::config::RecommenderConfig;
use crate::history::WorkoutPerformance;
use crate::profile::UserProfile;
use crate::random::RandomSource;
use crate::selector::ExerciseSelector;
use crate::tracker::ProgressionTracker;
use crate::tree::TreeStore;
use crate::types::{Category, Exercise, Skill};
use crate::workout::Workout;
use serde::{Deserialize, Serialize};

const DAYS_PER_WEEK: u32 = 7;

/// Generated workouts per focus skill before the plan moves on
const WORKOUTS_PER_FOCUS: usize = 2;

/// Per-request overrides; unset fields fall back to the profile
#[derive(Clone, Debug, Default)]
pub struct WorkoutOptions {
    /// Minutes
    pub duration: Option<u32>,
    pub focus_skill: Option<Skill>,
}

/// One day of a plan; rest days carry no workout
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlanDay {
    /// 0-based
    pub day: u32,
    pub workout: Option<Workout>,
}

impl PlanDay {
    pub fn is_rest(&self) -> bool {
        self.workout.is_none()
    }
}

/// Builds workouts from a shared catalog and tree store
pub struct WorkoutRecommender<'a> {
    catalog: &'a Catalog,
    trees: &'a TreeStore,
    config: RecommenderConfig,
}

impl<'a> WorkoutRecommender<'a> {
    pub fn new(catalog: &'a Catalog, trees: &'a TreeStore) -> Self {
        Self {
            catalog,
            trees,
            config: RecommenderConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RecommenderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn selector(&self) -> ExerciseSelector<'a> {
        ExerciseSelector::new(self.catalog)
    }

    pub fn tracker(&self) -> ProgressionTracker<'a> {
        ProgressionTracker::new(self.trees)
    }

    /// Request duration, else the profile preference, else the configured default
    pub fn resolve_duration(&self, profile: &UserProfile, options: &WorkoutOptions) -> u32 {
        options
            .duration
            .filter(|d| *d > 0)
            .or(Some(profile.preferences.workout_duration).filter(|d| *d > 0))
            .unwrap_or(self.config.default_duration)
    }

    /// Highest priority weight, else highest current level, else the fallback
    ///
    /// Ties go to the first skill in `Skill::ALL` order.
    pub fn highest_priority_skill(&self, profile: &UserProfile) -> Skill {
        let priorities = &profile.preferences.skill_priorities;
        let ranked = if priorities.is_empty() {
            &profile.skill_levels
        } else {
            priorities
        };

        ranked
            .iter()
            .fold(None, |best: Option<(Skill, u32)>, (&skill, &weight)| match best {
                Some((_, w)) if w >= weight => best,
                _ => Some((skill, weight)),
            })
            .map_or(self.config.fallback_skill, |(skill, _)| skill)
    }

    /// Rounded mean of all skill levels
    pub fn estimate_global_skill_level(&self, profile: &UserProfile) -> u32 {
        profile.overall_fitness_level()
    }

    pub fn generate_workout(
        &self,
        profile: &UserProfile,
        options: &WorkoutOptions,
        rng: &mut dyn RandomSource,
    ) -> Workout {
        let duration = self.resolve_duration(profile, options);
        let focus = options
            .focus_skill
            .unwrap_or_else(|| self.highest_priority_skill(profile));
        let difficulty = self.estimate_global_skill_level(profile);
        let ratios = self.config.section_ratios;
        let selector = self.selector();

        let mut builder = Workout::builder(duration)
            .focus_skill(Some(focus))
            .difficulty(difficulty)
            .ratios(ratios);

        for (category, minutes) in ratios.split(duration) {
            let picked: Vec<&Exercise> = match category {
                Category::Warmup => selector.select_warmup(profile, minutes, rng),
                Category::Skill => selector.select_skill(profile, minutes, focus, rng),
                Category::Strength => selector.select_strength(profile, minutes, Some(focus), rng),
                Category::Cooldown => selector.select_cooldown(profile, minutes, rng),
            };
            builder = builder.extend(category, picked.into_iter().cloned());
        }

        let workout = builder.build();
        tracing::info!(
            "Generated {} min {} workout with {} exercises (difficulty {})",
            duration,
            focus,
            workout.exercise_count(),
            difficulty
        );
        workout
    }

    /// A day-by-day plan with workouts spread by `distribute_workout_days`
    ///
    /// The focus skill rotates through the tree store every two workouts,
    /// overriding any focus in `options`.
    pub fn generate_workout_plan(
        &self,
        profile: &UserProfile,
        days: u32,
        options: &WorkoutOptions,
        rng: &mut dyn RandomSource,
    ) -> Vec<PlanDay> {
        let workout_days = distribute_workout_days(days, profile.preferences.workout_frequency);
        let skills = self.trees.skills();
        let mut generated = 0;

        (0..days)
            .map(|day| {
                if !workout_days.contains(&day) {
                    return PlanDay { day, workout: None };
                }

                let mut day_options = options.clone();
                if !skills.is_empty() {
                    let idx = (generated / WORKOUTS_PER_FOCUS) % skills.len();
                    day_options.focus_skill = Some(skills[idx]);
                }
                generated += 1;

                PlanDay {
                    day,
                    workout: Some(self.generate_workout(profile, &day_options, rng)),
                }
            })
            .collect()
    }

    /// Record a completed workout and fold node attempts into the profile
    ///
    /// Attempts on any node id update its metrics. Available nodes in the
    /// workout's focus tree that now meet their criteria are completed and
    /// the skill level is recomputed. Returns the newly mastered node ids.
    pub fn track_progress(
        &self,
        profile: &mut UserProfile,
        workout: &Workout,
        performance: &WorkoutPerformance,
    ) -> Vec<String> {
        profile.record_workout_completion(workout, performance);

        let tracker = self.tracker();
        let focus = workout.focus_skill();
        let tree = focus.and_then(|s| self.trees.get_tree(s));
        let mut mastered = Vec::new();

        for (node_id, attempt) in &performance.exercise_performance {
            profile.update_node_performance(node_id, attempt);

            let (Some(skill), Some(tree)) = (focus, tree) else {
                continue;
            };
            let Some(node) = tree.get(node_id) else {
                tracing::debug!("Node '{}' is not in the {} tree", node_id, skill);
                continue;
            };
            let completed = profile.completed_nodes(skill);
            if completed.contains(node_id) {
                continue;
            }
            if !node.is_accessible(completed) {
                tracing::debug!("Node '{}' is still locked", node_id);
                continue;
            }
            if ProgressionTracker::has_mastered(node, profile.metrics(node_id)) {
                tracing::info!("Mastered {}", node);
                profile.complete_node(skill, node_id);
                tracker.update_skill_level(profile, skill);
                mastered.push(node_id.clone());
            }
        }

        mastered
    }
}

/// Workout day indices for a plan of `total_days`
///
/// Frequency is clamped to 1..=6 and sessions are spaced `7 / frequency`
/// days apart inside each 7-day block.
pub fn distribute_workout_days(total_days: u32, frequency: u32) -> Vec<u32> {
    let frequency = frequency.clamp(1, 6);
    let interval = DAYS_PER_WEEK / frequency;
    let weeks = total_days.div_ceil(DAYS_PER_WEEK);

    (0..weeks)
        .flat_map(|week| (0..frequency).map(move |i| week * DAYS_PER_WEEK + i * interval))
        .filter(|day| *day < total_days)
        .collect()
}
