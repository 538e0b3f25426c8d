//! Exercise catalog and the built-in exercise table.
//!
//! The catalog is read-only once built. It preserves insertion order, which
//! is the iteration order every selector relies on for tie-breaking.

use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

/// Ordered, id-indexed collection of exercises
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    exercises: Vec<Exercise>,
    index: HashMap<String, usize>,
    duplicates: Vec<String>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_exercises(exercises: impl IntoIterator<Item = Exercise>) -> Self {
        let mut catalog = Self::new();
        for exercise in exercises {
            catalog.insert(exercise);
        }
        catalog
    }

    /// Add an exercise; a repeated id replaces the earlier entry in place
    pub fn insert(&mut self, exercise: Exercise) {
        if let Some(&idx) = self.index.get(&exercise.id) {
            tracing::warn!("Duplicate exercise id '{}' replaces earlier entry", exercise.id);
            self.duplicates.push(exercise.id.clone());
            self.exercises[idx] = exercise;
            return;
        }
        self.index.insert(exercise.id.clone(), self.exercises.len());
        self.exercises.push(exercise);
    }

    pub fn get_exercise(&self, id: &str) -> Option<&Exercise> {
        self.index.get(id).map(|&idx| &self.exercises[idx])
    }

    pub fn list_by_category(&self, category: Category) -> Vec<&Exercise> {
        self.exercises
            .iter()
            .filter(|e| e.category == category)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Exercise> {
        self.exercises.iter()
    }

    pub fn len(&self) -> usize {
        self.exercises.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }

    /// Categories with no exercises; such sections will always be empty
    pub fn missing_categories(&self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|c| !self.exercises.iter().any(|e| e.category == *c))
            .collect()
    }

    /// Validate the catalog for consistency
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for id in &self.duplicates {
            errors.push(format!("Exercise id '{}' appears more than once", id));
        }

        for exercise in &self.exercises {
            if exercise.id.is_empty() {
                errors.push("Exercise has empty ID".to_string());
            }
            if exercise.name.is_empty() {
                errors.push(format!("Exercise '{}' has empty name", exercise.id));
            }
            if exercise.progression_level < 1 {
                errors.push(format!(
                    "Exercise '{}' has progression level 0 (minimum is 1)",
                    exercise.id
                ));
            }
            for (label, range) in [("rep", exercise.rep_range), ("time", exercise.time_range)] {
                if let Some((lo, hi)) = range {
                    if lo > hi {
                        errors.push(format!(
                            "Exercise '{}': {} range min {} > max {}",
                            exercise.id, label, lo, hi
                        ));
                    }
                }
            }
        }

        errors
    }
}

fn exercise(
    id: &str,
    name: &str,
    category: Category,
    level: u32,
    muscles: &[&str],
    description: &str,
) -> Exercise {
    Exercise {
        id: id.into(),
        name: name.into(),
        category,
        progression_level: level,
        target_muscles: muscles.iter().map(|m| m.to_string()).collect(),
        skill_tags: Vec::new(),
        rep_range: None,
        time_range: None,
        description: description.into(),
    }
}

fn tagged(mut ex: Exercise, tags: &[&str]) -> Exercise {
    ex.skill_tags = tags.iter().map(|t| t.to_string()).collect();
    ex
}

fn reps(mut ex: Exercise, lo: u32, hi: u32) -> Exercise {
    ex.rep_range = Some((lo, hi));
    ex
}

fn hold(mut ex: Exercise, lo: u32, hi: u32) -> Exercise {
    ex.time_range = Some((lo, hi));
    ex
}

/// Builds the default catalog of built-in exercises
///
/// **Note**: For production use, prefer `default_catalog()` which returns a
/// cached reference.
pub fn build_default_catalog() -> Catalog {
    use Category::*;

    Catalog::from_exercises([
        // ====================================================================
        // Warmup
        // ====================================================================
        hold(
            reps(
                tagged(
                    exercise(
                        "wu-plank",
                        "Plank Warmup",
                        Warmup,
                        1,
                        &["core", "shoulders"],
                        "Hold a plank position for a designated duration.",
                    ),
                    &["core stability"],
                ),
                10,
                20,
            ),
            30,
            60,
        ),
        reps(
            exercise(
                "wu-wrist-circles",
                "Wrist Circles",
                Warmup,
                1,
                &["wrists", "forearms"],
                "Rotate the wrists in both directions with fingers interlaced.",
            ),
            10,
            20,
        ),
        reps(
            exercise(
                "wu-arm-circles",
                "Arm Circles",
                Warmup,
                1,
                &["shoulders"],
                "Small to large arm circles, forwards then backwards.",
            ),
            10,
            20,
        ),
        reps(
            exercise(
                "wu-cat-cow",
                "Cat-Cow",
                Warmup,
                1,
                &["back", "core"],
                "Alternate spinal flexion and extension on hands and knees.",
            ),
            8,
            12,
        ),
        reps(
            exercise(
                "wu-scap-pushups",
                "Scapular Push-ups",
                Warmup,
                2,
                &["shoulders", "chest"],
                "Protract and retract the shoulder blades with straight arms.",
            ),
            8,
            15,
        ),
        reps(
            exercise(
                "wu-hollow-rocks",
                "Hollow Body Rocks",
                Warmup,
                2,
                &["core", "hip-flexors"],
                "Rock gently while holding a hollow body position.",
            ),
            10,
            20,
        ),
        // ====================================================================
        // Skill
        // ====================================================================
        hold(
            tagged(
                exercise(
                    "hs-wall-plank",
                    "Wall Plank",
                    Skill,
                    1,
                    &["shoulders", "core"],
                    "Hold a plank position with your feet against the wall.",
                ),
                &["handstand"],
            ),
            30,
            60,
        ),
        reps(
            tagged(
                exercise(
                    "hs-pike-pushup",
                    "Pike Pushup",
                    Skill,
                    2,
                    &["shoulders", "triceps"],
                    "Perform pushups in a pike position to build shoulder strength.",
                ),
                &["handstand"],
            ),
            6,
            12,
        ),
        reps(
            tagged(
                exercise(
                    "hs-wall-walk",
                    "Wall Walk",
                    Skill,
                    2,
                    &["shoulders", "core"],
                    "Walk feet up the wall and back down in control.",
                ),
                &["handstand"],
            ),
            3,
            6,
        ),
        hold(
            tagged(
                exercise(
                    "hs-wall-handstand",
                    "Wall Handstand",
                    Skill,
                    3,
                    &["shoulders", "core"],
                    "Hold a handstand with your chest facing the wall.",
                ),
                &["handstand"],
            ),
            30,
            60,
        ),
        hold(
            tagged(
                exercise(
                    "hs-chest-to-wall",
                    "Chest-to-Wall Handstand",
                    Skill,
                    4,
                    &["shoulders", "core", "balance"],
                    "Stack hips over shoulders with the chest against the wall.",
                ),
                &["handstand"],
            ),
            30,
            60,
        ),
        hold(
            tagged(
                exercise(
                    "pl-plank",
                    "Planche Plank",
                    Skill,
                    1,
                    &["core", "shoulders"],
                    "Straight-arm plank with hands turned slightly out.",
                ),
                &["planche"],
            ),
            30,
            60,
        ),
        hold(
            tagged(
                exercise(
                    "pl-elevated-plank",
                    "Elevated Plank",
                    Skill,
                    2,
                    &["shoulders", "core", "chest"],
                    "Plank with the feet raised on a box.",
                ),
                &["planche"],
            ),
            20,
            45,
        ),
        hold(
            tagged(
                exercise(
                    "pl-pseudo-planche",
                    "Pseudo Planche",
                    Skill,
                    3,
                    &["shoulders", "chest", "wrists"],
                    "Lean forward from a plank until the shoulders pass the hands.",
                ),
                &["planche"],
            ),
            15,
            30,
        ),
        hold(
            tagged(
                exercise(
                    "ls-supported-tuck",
                    "Supported Tuck L-Sit",
                    Skill,
                    3,
                    &["core", "hip-flexors", "triceps"],
                    "Press down on parallettes and lift tucked knees.",
                ),
                &["lsit"],
            ),
            10,
            20,
        ),
        hold(
            tagged(
                exercise(
                    "ls-one-leg-ext",
                    "One-Leg Extended L-Sit",
                    Skill,
                    4,
                    &["core", "hip-flexors", "triceps"],
                    "Tuck L-sit with one leg extended, alternating sides.",
                ),
                &["lsit"],
            ),
            10,
            20,
        ),
        hold(
            tagged(
                exercise(
                    "ls-full-lsit",
                    "Full L-Sit",
                    Skill,
                    5,
                    &["core", "hip-flexors", "triceps"],
                    "Both legs straight and parallel to the floor.",
                ),
                &["lsit"],
            ),
            10,
            30,
        ),
        // ====================================================================
        // Strength
        // ====================================================================
        reps(
            tagged(
                exercise(
                    "st-pushup",
                    "Standard Pushup",
                    Strength,
                    2,
                    &["chest", "triceps", "core"],
                    "Perform push-ups maintaining a straight body line.",
                ),
                &["push"],
            ),
            8,
            15,
        ),
        reps(
            tagged(
                exercise(
                    "st-dips",
                    "Parallel Bar Dips",
                    Strength,
                    3,
                    &["triceps", "chest", "shoulders"],
                    "Lower until the shoulders are below the elbows, then press up.",
                ),
                &["push"],
            ),
            5,
            12,
        ),
        reps(
            tagged(
                exercise(
                    "st-pullup",
                    "Pull-up",
                    Strength,
                    3,
                    &["back", "lats", "biceps"],
                    "Pull from a dead hang until the chin clears the bar.",
                ),
                &["pull"],
            ),
            3,
            10,
        ),
        reps(
            tagged(
                exercise(
                    "st-australian-row",
                    "Australian Row",
                    Strength,
                    2,
                    &["back", "biceps"],
                    "Row the chest to a low bar with the body straight.",
                ),
                &["pull"],
            ),
            8,
            15,
        ),
        reps(
            exercise(
                "st-pike-compression",
                "Seated Pike Compression",
                Strength,
                2,
                &["core", "hip-flexors"],
                "Lift the legs off the floor in a seated pike.",
            ),
            8,
            15,
        ),
        hold(
            exercise(
                "st-hollow-hold",
                "Hollow Body Hold",
                Strength,
                1,
                &["core"],
                "Lower back pressed down, arms and legs extended.",
            ),
            20,
            45,
        ),
        reps(
            tagged(
                exercise(
                    "st-pseudo-planche-pushup",
                    "Pseudo Planche Push-up",
                    Strength,
                    4,
                    &["shoulders", "chest", "wrists"],
                    "Push-ups with the hands placed by the hips and a forward lean.",
                ),
                &["push"],
            ),
            5,
            10,
        ),
        reps(
            exercise(
                "st-squat",
                "Bodyweight Squat",
                Strength,
                1,
                &["quadriceps", "glutes"],
                "Squat below parallel keeping the heels down.",
            ),
            10,
            20,
        ),
        // ====================================================================
        // Cooldown
        // ====================================================================
        hold(
            exercise(
                "cd-child-pose",
                "Child's Pose",
                Cooldown,
                1,
                &["back", "shoulders"],
                "Sit back on the heels with the arms stretched forward.",
            ),
            30,
            60,
        ),
        hold(
            exercise(
                "cd-wrist-stretch",
                "Wrist Flexor Stretch",
                Cooldown,
                1,
                &["wrists", "forearms"],
                "Kneel with fingers pointing back and lean gently.",
            ),
            30,
            60,
        ),
        hold(
            exercise(
                "cd-pancake",
                "Pancake Stretch",
                Cooldown,
                1,
                &["hamstrings", "hip-flexors"],
                "Straddle sit and fold forward from the hips.",
            ),
            30,
            90,
        ),
        hold(
            exercise(
                "cd-shoulder-stretch",
                "Doorway Shoulder Stretch",
                Cooldown,
                1,
                &["shoulders", "chest"],
                "Open the chest with the forearm against a door frame.",
            ),
            30,
            60,
        ),
        hold(
            exercise(
                "cd-cobra",
                "Cobra Stretch",
                Cooldown,
                1,
                &["core", "back"],
                "Press the chest up from prone with the hips on the floor.",
            ),
            20,
            45,
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_loads() {
        let catalog = build_default_catalog();
        assert_eq!(catalog.len(), 30);
        assert!(catalog.get_exercise("hs-wall-plank").is_some());
        assert!(catalog.get_exercise("missing").is_none());
    }

    #[test]
    fn test_every_category_populated() {
        let catalog = build_default_catalog();
        assert!(catalog.missing_categories().is_empty());
        assert_eq!(catalog.list_by_category(Category::Cooldown).len(), 5);
    }

    #[test]
    fn test_list_by_category_keeps_catalog_order() {
        let catalog = build_default_catalog();
        let ids: Vec<_> = catalog
            .list_by_category(Category::Skill)
            .iter()
            .take(3)
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(ids, vec!["hs-wall-plank", "hs-pike-pushup", "hs-wall-walk"]);
    }

    #[test]
    fn test_default_catalog_validates() {
        let catalog = build_default_catalog();
        let errors = catalog.validate();
        assert!(
            errors.is_empty(),
            "Default catalog has validation errors: {:?}",
            errors
        );
    }

    #[test]
    fn test_duplicate_and_bad_level_reported() {
        let mut catalog = Catalog::new();
        catalog.insert(exercise("a", "A", Category::Warmup, 1, &["core"], ""));
        catalog.insert(exercise("a", "A again", Category::Warmup, 0, &["core"], ""));

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get_exercise("a").unwrap().name, "A again");

        let errors = catalog.validate();
        assert_eq!(errors.len(), 2, "{:?}", errors);
    }

    #[test]
    fn test_cached_catalog_matches_built() {
        assert_eq!(default_catalog().len(), build_default_catalog().len());
    }
}
