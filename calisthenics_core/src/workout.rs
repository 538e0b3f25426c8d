//! Generated workouts.
//!
//! A `Workout` is assembled once through `WorkoutBuilder` and is read-only
//! afterwards; transformations return a new value.

use crate::config::SectionRatios;
use crate::profile::UserProfile;
use crate::types::{Category, Exercise, Skill};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The four fixed sections, always present even when empty
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct WorkoutSections {
    #[serde(default)]
    pub warmup: Vec<Exercise>,
    #[serde(default)]
    pub skill: Vec<Exercise>,
    #[serde(default)]
    pub strength: Vec<Exercise>,
    #[serde(default)]
    pub cooldown: Vec<Exercise>,
}

impl WorkoutSections {
    pub fn get(&self, category: Category) -> &[Exercise] {
        match category {
            Category::Warmup => &self.warmup,
            Category::Skill => &self.skill,
            Category::Strength => &self.strength,
            Category::Cooldown => &self.cooldown,
        }
    }

    fn get_mut(&mut self, category: Category) -> &mut Vec<Exercise> {
        match category {
            Category::Warmup => &mut self.warmup,
            Category::Skill => &mut self.skill,
            Category::Strength => &mut self.strength,
            Category::Cooldown => &mut self.cooldown,
        }
    }
}

/// A recommended workout
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Workout {
    id: Uuid,
    created_at: DateTime<Utc>,
    sections: WorkoutSections,
    /// Minutes
    estimated_duration: u32,
    focus_skill: Option<Skill>,
    difficulty: u32,
    #[serde(default)]
    ratios: SectionRatios,
}

impl Workout {
    pub fn builder(estimated_duration: u32) -> WorkoutBuilder {
        WorkoutBuilder {
            workout: Workout {
                id: Uuid::new_v4(),
                created_at: Utc::now(),
                sections: WorkoutSections::default(),
                estimated_duration,
                focus_skill: None,
                difficulty: 1,
                ratios: SectionRatios::default(),
            },
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn sections(&self) -> &WorkoutSections {
        &self.sections
    }

    pub fn section(&self, category: Category) -> &[Exercise] {
        self.sections.get(category)
    }

    pub fn estimated_duration(&self) -> u32 {
        self.estimated_duration
    }

    pub fn focus_skill(&self) -> Option<Skill> {
        self.focus_skill
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    /// All exercises, sections in workout order
    pub fn exercises(&self) -> impl Iterator<Item = &Exercise> {
        Category::ALL
            .into_iter()
            .flat_map(move |c| self.sections.get(c).iter())
    }

    pub fn exercise_count(&self) -> usize {
        Category::ALL
            .into_iter()
            .map(|c| self.sections.get(c).len())
            .sum()
    }

    pub fn contains(&self, exercise_id: &str) -> bool {
        self.exercises().any(|e| e.id == exercise_id)
    }

    /// Approximate minutes spent in a section
    pub fn section_duration(&self, category: Category) -> u32 {
        (self.estimated_duration as f64 * self.ratios.ratio(category)).round() as u32
    }

    /// Rounded mean progression level of the included exercises (1 if empty)
    pub fn average_level(&self) -> u32 {
        let count = self.exercise_count();
        if count == 0 {
            return 1;
        }
        let total: u64 = self.exercises().map(|e| u64::from(e.progression_level)).sum();
        (total as f64 / count as f64).round() as u32
    }

    /// Copy with every occurrence of `old_id` replaced
    pub fn with_replacement(&self, old_id: &str, replacement: Exercise) -> Workout {
        let mut next = self.clone();
        for category in Category::ALL {
            for slot in next.sections.get_mut(category).iter_mut() {
                if slot.id == old_id {
                    *slot = replacement.clone();
                }
            }
        }
        next
    }

    /// Copy adjusted to a new duration
    ///
    /// Shrinking drops exercises from the end of each section in proportion
    /// to the cut, never emptying a section. Growing only changes the
    /// estimate, since adding exercises needs the catalog.
    pub fn with_duration(&self, minutes: u32) -> Workout {
        let mut next = self.clone();
        next.estimated_duration = minutes;

        if minutes < self.estimated_duration && self.estimated_duration > 0 {
            let removal = 1.0 - minutes as f64 / self.estimated_duration as f64;
            for category in Category::ALL {
                let section = next.sections.get_mut(category);
                let remove = (section.len() as f64 * removal).floor() as usize;
                if remove > 0 && section.len() > remove {
                    section.truncate(section.len() - remove);
                }
            }
        }
        next
    }

    /// Whether the workout sits within two levels of the user
    ///
    /// Compares against the focus skill level when the user has one for it,
    /// else the mean of all skill levels.
    pub fn is_appropriate_for(&self, profile: &UserProfile) -> bool {
        let count = self.exercise_count();
        if count == 0 {
            return false;
        }
        let total: u64 = self.exercises().map(|e| u64::from(e.progression_level)).sum();
        let workout_level = total as f64 / count as f64;

        let user_level = match self.focus_skill.and_then(|s| profile.skill_levels.get(&s)) {
            Some(&level) => level as f64,
            None => {
                if profile.skill_levels.is_empty() {
                    1.0
                } else {
                    profile.skill_levels.values().map(|&l| f64::from(l)).sum::<f64>()
                        / profile.skill_levels.len() as f64
                }
            }
        };

        (workout_level - user_level).abs() <= 2.0
    }
}

/// Assembles a `Workout`; the only way to populate sections
pub struct WorkoutBuilder {
    workout: Workout,
}

impl WorkoutBuilder {
    pub fn focus_skill(mut self, skill: Option<Skill>) -> Self {
        self.workout.focus_skill = skill;
        self
    }

    pub fn difficulty(mut self, difficulty: u32) -> Self {
        self.workout.difficulty = difficulty;
        self
    }

    pub fn ratios(mut self, ratios: SectionRatios) -> Self {
        self.workout.ratios = ratios;
        self
    }

    pub fn add(mut self, category: Category, exercise: Exercise) -> Self {
        self.workout.sections.get_mut(category).push(exercise);
        self
    }

    pub fn extend(mut self, category: Category, exercises: impl IntoIterator<Item = Exercise>) -> Self {
        self.workout.sections.get_mut(category).extend(exercises);
        self
    }

    pub fn build(self) -> Workout {
        self.workout
    }
}

/// Human label for a numeric difficulty
pub fn difficulty_label(level: u32) -> &'static str {
    match level {
        0..=3 => "beginner",
        4..=6 => "intermediate",
        _ => "advanced",
    }
}
