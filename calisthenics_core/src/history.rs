//! Workout completion history.
//!
//! Completion records are appended to the profile when a workout is logged
//! and never modified afterwards.

use crate::types::{Category, NodeAttempt, Skill};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// One performed set
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct SetRecord {
    #[serde(default)]
    pub reps: Option<u32>,
    /// Seconds
    #[serde(default)]
    pub time: Option<u32>,
}

/// What the user reports about a single exercise
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ExerciseResult {
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub sets: Vec<SetRecord>,
}

/// Everything reported after a workout
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct WorkoutPerformance {
    /// Minutes actually spent; defaults to the workout estimate
    #[serde(default)]
    pub duration: Option<u32>,
    /// 1-5
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub feedback: BTreeMap<String, String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub calories_burned: Option<u32>,
    /// Keyed by exercise id
    #[serde(default)]
    pub exercises: BTreeMap<String, ExerciseResult>,
    /// Keyed by progression node id
    #[serde(default)]
    pub exercise_performance: BTreeMap<String, NodeAttempt>,
}

/// Snapshot of an exercise as it was performed
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseSnapshot {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub completed: bool,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub sets: Vec<SetRecord>,
}

/// Append-only history entry
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutCompletionRecord {
    pub workout_id: Uuid,
    #[serde(default)]
    pub focus_skill: Option<Skill>,
    pub date: DateTime<Utc>,
    /// Minutes
    pub duration: u32,
    pub exercises: Vec<ExerciseSnapshot>,
    #[serde(default)]
    pub feedback: BTreeMap<String, String>,
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub calories_burned: Option<u32>,
}

/// Most recent `limit` records focused on `skill`, oldest first
pub fn recent_for_skill(
    history: &[WorkoutCompletionRecord],
    skill: Skill,
    limit: usize,
) -> Vec<&WorkoutCompletionRecord> {
    let matching: Vec<_> = history
        .iter()
        .filter(|r| r.focus_skill == Some(skill))
        .collect();
    let skip = matching.len().saturating_sub(limit);
    matching.into_iter().skip(skip).collect()
}

/// Consecutive days with a logged workout, ending today or yesterday
///
/// A streak is broken as soon as neither today nor yesterday has a workout.
pub fn current_streak(history: &[WorkoutCompletionRecord], today: NaiveDate) -> u32 {
    let days: BTreeSet<NaiveDate> = history.iter().map(|r| r.date.date_naive()).collect();

    let yesterday = today - Duration::days(1);
    let mut day = if days.contains(&today) {
        today
    } else if days.contains(&yesterday) {
        yesterday
    } else {
        return 0;
    };

    let mut streak = 0;
    while days.contains(&day) {
        streak += 1;
        day -= Duration::days(1);
    }
    streak
}
