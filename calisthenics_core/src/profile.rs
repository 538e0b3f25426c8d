//! The user profile, the single mutable aggregate of the system.
//!
//! Every tracking operation mutates a profile in place. Updates go through
//! explicit field-by-field functions rather than shallow merges, and every
//! mutation touches `last_active`.

use crate::config::ProfileDefaults;
use crate::history::{self, ExerciseSnapshot, WorkoutCompletionRecord, WorkoutPerformance};
use crate::tree::ProgressionTree;
use crate::types::*;
use crate::workout::Workout;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

static NO_NODES: BTreeSet<String> = BTreeSet::new();

/// Workout preferences
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Preferences {
    /// Minutes
    pub workout_duration: u32,
    /// Sessions per week
    pub workout_frequency: u32,
    /// Muscle tags to emphasise
    pub focus_areas: Vec<String>,
    pub excluded_exercises: BTreeSet<String>,
    /// Relative weight per skill
    pub skill_priorities: BTreeMap<Skill, u32>,
    pub workout_reminders: bool,
    pub equipment: Vec<String>,
    pub preferred_workout_time: Option<String>,
    /// "auto" or a manual override
    pub difficulty: String,
}

impl Preferences {
    fn from_defaults(defaults: &ProfileDefaults) -> Self {
        Self {
            workout_duration: defaults.workout_duration,
            workout_frequency: defaults.workout_frequency,
            focus_areas: Vec::new(),
            excluded_exercises: BTreeSet::new(),
            skill_priorities: BTreeMap::new(),
            workout_reminders: true,
            equipment: Vec::new(),
            preferred_workout_time: None,
            difficulty: "auto".into(),
        }
    }
}

impl Default for Preferences {
    fn default() -> Self {
        Self::from_defaults(&ProfileDefaults::default())
    }
}

/// Field-by-field preference update; `None` leaves a field untouched
#[derive(Clone, Debug, Default)]
pub struct PreferencesUpdate {
    pub workout_duration: Option<u32>,
    pub workout_frequency: Option<u32>,
    pub focus_areas: Option<Vec<String>>,
    pub excluded_exercises: Option<BTreeSet<String>>,
    pub skill_priorities: Option<BTreeMap<Skill, u32>>,
    pub workout_reminders: Option<bool>,
    pub equipment: Option<Vec<String>>,
    pub preferred_workout_time: Option<Option<String>>,
    pub difficulty: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Goals {
    pub primary_skill: Option<Skill>,
    pub target_date: Option<NaiveDate>,
    pub weekly_workouts: Option<u32>,
    pub notes: String,
}

#[derive(Clone, Debug, Default)]
pub struct GoalsUpdate {
    pub primary_skill: Option<Option<Skill>>,
    pub target_date: Option<Option<NaiveDate>>,
    pub weekly_workouts: Option<Option<u32>>,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HealthInfo {
    pub injuries: Vec<String>,
    pub limitations: Vec<String>,
    pub medical_conditions: Vec<String>,
}

#[derive(Clone, Debug, Default)]
pub struct HealthInfoUpdate {
    pub injuries: Option<Vec<String>>,
    pub limitations: Option<Vec<String>>,
    pub medical_conditions: Option<Vec<String>>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PrivacyPreferences {
    pub share_workout_data: bool,
    pub allow_anonymous_stats: bool,
}

impl Default for PrivacyPreferences {
    fn default() -> Self {
        Self {
            share_workout_data: false,
            allow_anonymous_stats: true,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    pub notifications: bool,
    pub dark_mode: bool,
    pub language: String,
    /// "metric" or "imperial"
    pub units: String,
    pub privacy: PrivacyPreferences,
}

impl AppSettings {
    fn from_defaults(defaults: &ProfileDefaults) -> Self {
        Self {
            notifications: defaults.notifications,
            dark_mode: defaults.dark_mode,
            language: defaults.language.clone(),
            units: defaults.units.clone(),
            privacy: PrivacyPreferences::default(),
        }
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self::from_defaults(&ProfileDefaults::default())
    }
}

#[derive(Clone, Debug, Default)]
pub struct AppSettingsUpdate {
    pub notifications: Option<bool>,
    pub dark_mode: Option<bool>,
    pub language: Option<String>,
    pub units: Option<String>,
    pub privacy: Option<PrivacyPreferences>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Onboarding {
    pub completed: bool,
    pub step: u32,
    pub assessment_completed: bool,
    pub tutorial_seen: bool,
}

impl Default for Onboarding {
    fn default() -> Self {
        Self {
            completed: false,
            step: 1,
            assessment_completed: false,
            tutorial_seen: false,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct OnboardingUpdate {
    pub completed: Option<bool>,
    pub step: Option<u32>,
    pub assessment_completed: Option<bool>,
    pub tutorial_seen: Option<bool>,
}

/// Identity and body measurements
#[derive(Clone, Debug, Default)]
pub struct UserInfoUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub age: Option<Option<u32>>,
    pub gender: Option<Option<String>>,
    pub height_cm: Option<Option<f64>>,
    pub weight_kg: Option<Option<f64>>,
}

fn set<T>(field: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *field = value;
    }
}

/// A user's preferences, progress and history
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub date_created: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub preferences: Preferences,
    pub skill_levels: BTreeMap<Skill, u32>,
    pub completed_nodes: BTreeMap<Skill, BTreeSet<String>>,
    /// Keyed by progression node id
    pub performance_metrics: BTreeMap<String, PerformanceMetrics>,
    pub workout_history: Vec<WorkoutCompletionRecord>,
    pub goals: Goals,
    pub health_info: HealthInfo,
    pub app_settings: AppSettings,
    pub onboarding: Onboarding,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self::new(&ProfileDefaults::default())
    }
}

impl UserProfile {
    /// A fresh profile with every skill at the configured starting level
    pub fn new(defaults: &ProfileDefaults) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: String::new(),
            email: String::new(),
            date_created: now,
            last_active: now,
            age: None,
            gender: None,
            height_cm: None,
            weight_kg: None,
            preferences: Preferences::from_defaults(defaults),
            skill_levels: Skill::ALL
                .into_iter()
                .map(|s| (s, defaults.starting_skill_level))
                .collect(),
            completed_nodes: BTreeMap::new(),
            performance_metrics: BTreeMap::new(),
            workout_history: Vec::new(),
            goals: Goals::default(),
            health_info: HealthInfo::default(),
            app_settings: AppSettings::from_defaults(defaults),
            onboarding: Onboarding::default(),
        }
    }

    fn touch(&mut self) {
        self.last_active = Utc::now();
    }

    // ------------------------------------------------------------------
    // Skill levels and nodes
    // ------------------------------------------------------------------

    /// Current level for a skill, 1 when unset
    pub fn skill_level(&self, skill: Skill) -> u32 {
        self.skill_levels.get(&skill).copied().unwrap_or(1)
    }

    pub fn set_skill_level(&mut self, skill: Skill, level: u32) {
        self.skill_levels.insert(skill, level);
        self.touch();
    }

    pub fn completed_nodes(&self, skill: Skill) -> &BTreeSet<String> {
        self.completed_nodes.get(&skill).unwrap_or(&NO_NODES)
    }

    /// Mark a node completed; returns false if it already was
    pub fn complete_node(&mut self, skill: Skill, node_id: &str) -> bool {
        let added = self
            .completed_nodes
            .entry(skill)
            .or_default()
            .insert(node_id.to_string());
        self.touch();
        added
    }

    /// Nodes of `tree` whose prerequisites this user has completed
    pub fn accessible_nodes<'t>(&self, tree: &'t ProgressionTree) -> Vec<&'t ProgressionNode> {
        let completed = self.completed_nodes(tree.skill());
        tree.nodes().filter(|n| n.is_accessible(completed)).collect()
    }

    pub fn metrics(&self, node_id: &str) -> Option<&PerformanceMetrics> {
        self.performance_metrics.get(node_id)
    }

    /// Fold one attempt into a node's running metrics
    ///
    /// Unknown node ids start from default metrics.
    pub fn update_node_performance(&mut self, node_id: &str, attempt: &NodeAttempt) {
        let now = Utc::now();
        let perf = self
            .performance_metrics
            .entry(node_id.to_string())
            .or_default();

        perf.attempts += 1;
        perf.last_attempt_date = Some(now);

        if attempt.success {
            perf.successful_attempts += 1;
            perf.consecutive_successes += 1;
        } else {
            perf.consecutive_successes = 0;
        }

        if let Some(time) = attempt.time {
            perf.max_time = perf.max_time.max(time);
        }
        if let Some(reps) = attempt.reps {
            perf.max_reps = perf.max_reps.max(reps);
        }

        tracing::debug!(
            "Node '{}': {} attempts, {} in a row, max {}s / {} reps",
            node_id,
            perf.attempts,
            perf.consecutive_successes,
            perf.max_time,
            perf.max_reps
        );
        self.last_active = now;
    }

    /// Rounded mean of all skill levels
    pub fn overall_fitness_level(&self) -> u32 {
        if self.skill_levels.is_empty() {
            return 1;
        }
        let total: u64 = self.skill_levels.values().map(|&l| u64::from(l)).sum();
        (total as f64 / self.skill_levels.len() as f64).round() as u32
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    /// Append a completion record for `workout`
    ///
    /// Node performance in `performance.exercise_performance` is not applied
    /// here; progress tracking does that so attempts are counted once.
    pub fn record_workout_completion(
        &mut self,
        workout: &Workout,
        performance: &WorkoutPerformance,
    ) -> &WorkoutCompletionRecord {
        let exercises = workout
            .exercises()
            .map(|ex| {
                let result = performance.exercises.get(&ex.id);
                ExerciseSnapshot {
                    id: ex.id.clone(),
                    name: ex.name.clone(),
                    category: ex.category,
                    completed: result.and_then(|r| r.completed).unwrap_or(true),
                    notes: result.and_then(|r| r.notes.clone()).unwrap_or_default(),
                    sets: result.map(|r| r.sets.clone()).unwrap_or_default(),
                }
            })
            .collect();

        let record = WorkoutCompletionRecord {
            workout_id: workout.id(),
            focus_skill: workout.focus_skill(),
            date: Utc::now(),
            duration: performance.duration.unwrap_or(workout.estimated_duration()),
            exercises,
            feedback: performance.feedback.clone(),
            rating: performance.rating,
            notes: performance.notes.clone(),
            calories_burned: performance
                .calories_burned
                .or_else(|| self.estimate_calories_burned(workout)),
        };

        tracing::info!(
            "Recorded workout {} ({} min, rating {:?})",
            record.workout_id,
            record.duration,
            record.rating
        );
        self.workout_history.push(record);
        self.touch();
        &self.workout_history[self.workout_history.len() - 1]
    }

    /// MET-based estimate; `None` without a body weight
    pub fn estimate_calories_burned(&self, workout: &Workout) -> Option<u32> {
        let weight = self.weight_kg?;
        let total: f64 = Category::ALL
            .into_iter()
            .map(|c| c.met_value() * weight * workout.section_duration(c) as f64 / 60.0)
            .sum();
        Some(total.round() as u32)
    }

    pub fn current_streak(&self, today: NaiveDate) -> u32 {
        history::current_streak(&self.workout_history, today)
    }

    // ------------------------------------------------------------------
    // Updates
    // ------------------------------------------------------------------

    pub fn update_preferences(&mut self, update: PreferencesUpdate) {
        let p = &mut self.preferences;
        set(&mut p.workout_duration, update.workout_duration);
        set(&mut p.workout_frequency, update.workout_frequency);
        set(&mut p.focus_areas, update.focus_areas);
        set(&mut p.excluded_exercises, update.excluded_exercises);
        set(&mut p.skill_priorities, update.skill_priorities);
        set(&mut p.workout_reminders, update.workout_reminders);
        set(&mut p.equipment, update.equipment);
        set(&mut p.preferred_workout_time, update.preferred_workout_time);
        set(&mut p.difficulty, update.difficulty);
        self.touch();
    }

    pub fn update_goals(&mut self, update: GoalsUpdate) {
        let g = &mut self.goals;
        set(&mut g.primary_skill, update.primary_skill);
        set(&mut g.target_date, update.target_date);
        set(&mut g.weekly_workouts, update.weekly_workouts);
        set(&mut g.notes, update.notes);
        self.touch();
    }

    pub fn update_health_info(&mut self, update: HealthInfoUpdate) {
        let h = &mut self.health_info;
        set(&mut h.injuries, update.injuries);
        set(&mut h.limitations, update.limitations);
        set(&mut h.medical_conditions, update.medical_conditions);
        self.touch();
    }

    pub fn update_app_settings(&mut self, update: AppSettingsUpdate) {
        let a = &mut self.app_settings;
        set(&mut a.notifications, update.notifications);
        set(&mut a.dark_mode, update.dark_mode);
        set(&mut a.language, update.language);
        set(&mut a.units, update.units);
        set(&mut a.privacy, update.privacy);
        self.touch();
    }

    pub fn update_onboarding(&mut self, update: OnboardingUpdate) {
        let o = &mut self.onboarding;
        set(&mut o.completed, update.completed);
        set(&mut o.step, update.step);
        set(&mut o.assessment_completed, update.assessment_completed);
        set(&mut o.tutorial_seen, update.tutorial_seen);
        self.touch();
    }

    /// Empty name/email strings are ignored
    pub fn update_user_info(&mut self, update: UserInfoUpdate) {
        set(&mut self.name, update.name.filter(|n| !n.is_empty()));
        set(&mut self.email, update.email.filter(|e| !e.is_empty()));
        set(&mut self.age, update.age);
        set(&mut self.gender, update.gender);
        set(&mut self.height_cm, update.height_cm);
        set(&mut self.weight_kg, update.weight_kg);
        self.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::build_default_catalog;
    use crate::history::ExerciseResult;
    use crate::tree::build_default_trees;

    fn workout() -> Workout {
        let catalog = build_default_catalog();
        Workout::builder(30)
            .focus_skill(Some(Skill::Handstand))
            .add(Category::Warmup, catalog.get_exercise("wu-plank").unwrap().clone())
            .add(Category::Skill, catalog.get_exercise("hs-wall-plank").unwrap().clone())
            .build()
    }

    #[test]
    fn test_new_profile_uses_defaults() {
        let defaults = ProfileDefaults {
            workout_duration: 45,
            starting_skill_level: 2,
            language: "de".into(),
            ..ProfileDefaults::default()
        };
        let profile = UserProfile::new(&defaults);

        assert_eq!(profile.preferences.workout_duration, 45);
        assert_eq!(profile.preferences.workout_frequency, 3);
        assert_eq!(profile.app_settings.language, "de");
        assert_eq!(profile.skill_levels.len(), 5);
        assert!(Skill::ALL.iter().all(|s| profile.skill_level(*s) == 2));
        assert_eq!(profile.onboarding.step, 1);
    }

    #[test]
    fn test_skill_level_defaults_to_one() {
        let mut profile = UserProfile::default();
        profile.skill_levels.clear();
        assert_eq!(profile.skill_level(Skill::Planche), 1);
        assert_eq!(profile.overall_fitness_level(), 1);
    }

    #[test]
    fn test_fitness_level_with_huge_imported_levels() {
        let profile: UserProfile =
            serde_json::from_str(r#"{"skill_levels":{"handstand":4294967295,"planche":4294967295}}"#).unwrap();
        assert_eq!(profile.overall_fitness_level(), u32::MAX);
    }

    #[test]
    fn test_complete_node_is_idempotent() {
        let mut profile = UserProfile::default();
        assert!(profile.complete_node(Skill::Handstand, "hs-wall-plank"));
        assert!(!profile.complete_node(Skill::Handstand, "hs-wall-plank"));
        assert_eq!(profile.completed_nodes(Skill::Handstand).len(), 1);
        assert!(profile.completed_nodes(Skill::Lsit).is_empty());
    }

    #[test]
    fn test_update_node_performance_tracks_streaks_and_maxima() {
        let mut profile = UserProfile::default();
        let ok = |time, reps| NodeAttempt {
            success: true,
            time,
            reps,
        };

        profile.update_node_performance("n", &ok(Some(40), None));
        profile.update_node_performance("n", &ok(Some(30), Some(5)));
        let m = profile.metrics("n").unwrap();
        assert_eq!(m.attempts, 2);
        assert_eq!(m.consecutive_successes, 2);
        assert_eq!(m.max_time, 40);
        assert_eq!(m.max_reps, 5);

        profile.update_node_performance("n", &NodeAttempt::default());
        let m = profile.metrics("n").unwrap();
        assert_eq!(m.attempts, 3);
        assert_eq!(m.successful_attempts, 2);
        assert_eq!(m.consecutive_successes, 0);
        assert!(m.last_attempt_date.is_some());
    }

    #[test]
    fn test_accessible_nodes_follow_completed_set() {
        let trees = build_default_trees();
        let tree = trees.get_tree(Skill::Handstand).unwrap();
        let mut profile = UserProfile::default();

        let ids: Vec<_> = profile.accessible_nodes(tree).iter().map(|n| n.id.clone()).collect();
        assert_eq!(ids, vec!["hs-wall-plank"]);

        profile.complete_node(Skill::Handstand, "hs-wall-plank");
        let ids: Vec<_> = profile.accessible_nodes(tree).iter().map(|n| n.id.clone()).collect();
        assert_eq!(ids, vec!["hs-wall-plank", "hs-pike-pushup", "hs-wall-walk"]);
    }

    #[test]
    fn test_record_workout_completion_snapshot() {
        let mut profile = UserProfile::default();
        let workout = workout();
        let mut performance = WorkoutPerformance {
            rating: Some(4),
            ..WorkoutPerformance::default()
        };
        performance.exercises.insert(
            "wu-plank".into(),
            ExerciseResult {
                completed: Some(false),
                notes: Some("skipped".into()),
                sets: vec![],
            },
        );

        let record = profile.record_workout_completion(&workout, &performance).clone();
        assert_eq!(record.workout_id, workout.id());
        assert_eq!(record.focus_skill, Some(Skill::Handstand));
        assert_eq!(record.duration, 30);
        assert_eq!(record.exercises.len(), 2);
        assert!(!record.exercises[0].completed);
        assert_eq!(record.exercises[0].notes, "skipped");
        assert!(record.exercises[1].completed);
        assert_eq!(record.calories_burned, None);
        assert_eq!(profile.workout_history.len(), 1);
    }

    #[test]
    fn test_calorie_estimate_uses_weight() {
        let mut profile = UserProfile::default();
        profile.update_user_info(UserInfoUpdate {
            weight_kg: Some(Some(70.0)),
            ..UserInfoUpdate::default()
        });
        // 30 min -> 5/9/14/3 minutes at MET 3.5/4.0/5.0/2.5
        // 70 * (17.5 + 36 + 70 + 7.5) / 60 = 152.83
        assert_eq!(profile.estimate_calories_burned(&workout()), Some(153));
    }

    #[test]
    fn test_update_preferences_is_field_by_field() {
        let mut profile = UserProfile::default();
        profile.update_preferences(PreferencesUpdate {
            focus_areas: Some(vec!["core".into()]),
            ..PreferencesUpdate::default()
        });
        profile.update_preferences(PreferencesUpdate {
            workout_duration: Some(45),
            ..PreferencesUpdate::default()
        });

        assert_eq!(profile.preferences.focus_areas, vec!["core".to_string()]);
        assert_eq!(profile.preferences.workout_duration, 45);
        assert_eq!(profile.preferences.difficulty, "auto");
    }

    #[test]
    fn test_update_user_info_ignores_empty_name() {
        let mut profile = UserProfile::default();
        profile.update_user_info(UserInfoUpdate {
            name: Some("Sam".into()),
            ..UserInfoUpdate::default()
        });
        profile.update_user_info(UserInfoUpdate {
            name: Some(String::new()),
            age: Some(Some(31)),
            ..UserInfoUpdate::default()
        });
        assert_eq!(profile.name, "Sam");
        assert_eq!(profile.age, Some(31));
    }

    #[test]
    fn test_partial_import_fills_defaults() {
        let json = r#"{ "name": "Ana", "skill_levels": { "planche": 3 } }"#;
        let profile: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.name, "Ana");
        assert_eq!(profile.skill_level(Skill::Planche), 3);
        assert_eq!(profile.skill_level(Skill::Handstand), 1);
        assert_eq!(profile.preferences.workout_duration, 30);
    }

    #[test]
    fn test_export_import_roundtrip() {
        let mut profile = UserProfile::default();
        profile.complete_node(Skill::Lsit, "ls-foot-supported");
        profile.record_workout_completion(&workout(), &WorkoutPerformance::default());

        let json = serde_json::to_string(&profile).unwrap();
        let restored: UserProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, profile);
    }
}
