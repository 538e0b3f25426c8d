//! Feature-vector similarity between exercises.
//!
//! An exercise is encoded as one weight per vocabulary muscle tag
//! (`1.0 - 0.1 * position`, primary tag heaviest) followed by its
//! progression level. The vocabulary is rebuilt for every query from the
//! candidate pool, so vectors must not be reused across pools.

use crate::catalog::Catalog;
use crate::types::Exercise;
use crate::workout::Workout;
use std::collections::BTreeSet;

/// Added to the magnitude product to keep zero vectors finite
pub const EPSILON: f64 = 1e-6;

/// Distinct muscle tags in first-seen order
pub fn build_vocabulary<'a>(exercises: impl IntoIterator<Item = &'a Exercise>) -> Vec<String> {
    let mut vocabulary: Vec<String> = Vec::new();
    for exercise in exercises {
        for tag in &exercise.target_muscles {
            if !vocabulary.contains(tag) {
                vocabulary.push(tag.clone());
            }
        }
    }
    vocabulary
}

/// Encode an exercise against a vocabulary (length `vocabulary.len() + 1`)
///
/// Tags past position 10 get negative weights; that is accepted as-is.
pub fn vectorize(exercise: &Exercise, vocabulary: &[String]) -> Vec<f64> {
    let mut vec = vec![0.0; vocabulary.len() + 1];
    for (i, tag) in exercise.target_muscles.iter().enumerate() {
        if let Some(idx) = vocabulary.iter().position(|v| v == tag) {
            vec[idx] = 1.0 - 0.1 * i as f64;
        }
    }
    vec[vocabulary.len()] = exercise.progression_level as f64;
    vec
}

pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let mag_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let mag_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    dot / (mag_a * mag_b + EPSILON)
}

/// The candidate most similar to `target`
///
/// Skips the target itself and excluded ids. Returns `None` when the target
/// has no muscle tags or level, or nothing is eligible. The first maximal
/// candidate wins ties.
pub fn find_similar_exercise<'a>(
    target: &Exercise,
    candidates: &[&'a Exercise],
    excluded: &BTreeSet<String>,
) -> Option<&'a Exercise> {
    if target.target_muscles.is_empty() || target.progression_level == 0 {
        return None;
    }

    let vocabulary = build_vocabulary(candidates.iter().copied().chain(std::iter::once(target)));
    let target_vec = vectorize(target, &vocabulary);

    let mut best: Option<(&'a Exercise, f64)> = None;
    for &candidate in candidates {
        if candidate.id == target.id || excluded.contains(&candidate.id) {
            continue;
        }
        let score = cosine_similarity(&target_vec, &vectorize(candidate, &vocabulary));
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((candidate, score));
        }
    }

    best.map(|(exercise, score)| {
        tracing::debug!(
            "Most similar to '{}' is '{}' (score {:.3})",
            target.id,
            exercise.id,
            score
        );
        exercise
    })
}

/// Replace every excluded exercise in a workout with its closest substitute
///
/// Substitutes come from the same category at the same or a lower level. An
/// exercise with no substitute is left in place. Returns the new workout and
/// the number of replacements.
pub fn substitute_excluded(
    workout: &Workout,
    catalog: &Catalog,
    excluded: &BTreeSet<String>,
) -> (Workout, usize) {
    let mut result = workout.clone();
    let mut replaced = 0;

    for exercise in workout.exercises() {
        if !excluded.contains(&exercise.id) {
            continue;
        }

        let candidates: Vec<&Exercise> = catalog
            .list_by_category(exercise.category)
            .into_iter()
            .filter(|e| e.progression_level <= exercise.progression_level)
            .filter(|e| !result.contains(&e.id))
            .collect();

        match find_similar_exercise(exercise, &candidates, excluded) {
            Some(substitute) => {
                tracing::info!("Swapping '{}' for '{}'", exercise.id, substitute.id);
                result = result.with_replacement(&exercise.id, substitute.clone());
                replaced += 1;
            }
            None => tracing::warn!("No substitute found for excluded '{}'", exercise.id),
        }
    }

    (result, replaced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::build_default_catalog;
    use crate::types::Category;

    fn ex(id: &str, level: u32, muscles: &[&str]) -> Exercise {
        Exercise {
            id: id.into(),
            name: id.into(),
            category: Category::Strength,
            progression_level: level,
            target_muscles: muscles.iter().map(|m| m.to_string()).collect(),
            skill_tags: vec![],
            rep_range: None,
            time_range: None,
            description: String::new(),
        }
    }

    #[test]
    fn test_vectorize_weights_by_position() {
        let e = ex("a", 3, &["core", "shoulders"]);
        let vocab = vec!["shoulders".to_string(), "core".to_string(), "legs".to_string()];
        let v = vectorize(&e, &vocab);
        assert_eq!(v.len(), 4);
        assert!((v[0] - 0.9).abs() < 1e-9);
        assert!((v[1] - 1.0).abs() < 1e-9);
        assert_eq!(v[2], 0.0);
        assert_eq!(v[3], 3.0);
    }

    #[test]
    fn test_vocabulary_first_seen_order() {
        let a = ex("a", 1, &["core", "back"]);
        let b = ex("b", 1, &["back", "lats"]);
        assert_eq!(build_vocabulary([&a, &b]), vec!["core", "back", "lats"]);
    }

    #[test]
    fn test_zero_vector_similarity_is_zero() {
        let zero = vec![0.0, 0.0];
        let other = vec![1.0, 2.0];
        let s = cosine_similarity(&zero, &other);
        assert_eq!(s, 0.0);
        assert!(!s.is_nan());
    }

    #[test]
    fn test_identical_vectors_near_one() {
        let v = vec![1.0, 0.5, 2.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_find_similar_prefers_shared_muscles() {
        let target = ex("target", 2, &["back", "lats"]);
        let pull = ex("pull", 2, &["back", "lats", "biceps"]);
        let squat = ex("squat", 2, &["quadriceps", "glutes"]);
        let candidates = vec![&squat, &pull, &target];

        let found = find_similar_exercise(&target, &candidates, &BTreeSet::new()).unwrap();
        assert_eq!(found.id, "pull");
    }

    #[test]
    fn test_find_similar_respects_exclusions() {
        let target = ex("target", 2, &["back"]);
        let a = ex("a", 2, &["back"]);
        let b = ex("b", 2, &["core"]);
        let excluded: BTreeSet<String> = ["a".to_string()].into();

        let found = find_similar_exercise(&target, &[&a, &b], &excluded).unwrap();
        assert_eq!(found.id, "b");
    }

    #[test]
    fn test_find_similar_none_cases() {
        let untagged = ex("t", 2, &[]);
        let a = ex("a", 2, &["back"]);
        assert!(find_similar_exercise(&untagged, &[&a], &BTreeSet::new()).is_none());

        let target = ex("t", 2, &["back"]);
        assert!(find_similar_exercise(&target, &[&target], &BTreeSet::new()).is_none());
    }

    #[test]
    fn test_ties_keep_first_candidate() {
        let target = ex("t", 2, &["back"]);
        let a = ex("a", 2, &["back"]);
        let b = ex("b", 2, &["back"]);
        let found = find_similar_exercise(&target, &[&a, &b], &BTreeSet::new()).unwrap();
        assert_eq!(found.id, "a");
    }

    #[test]
    fn test_substitute_excluded_swaps_within_category() {
        let catalog = build_default_catalog();
        let pullup = catalog.get_exercise("st-pullup").unwrap().clone();
        let squat = catalog.get_exercise("st-squat").unwrap().clone();
        let workout = Workout::builder(30)
            .add(Category::Strength, pullup)
            .add(Category::Strength, squat)
            .build();

        let excluded: BTreeSet<String> = ["st-pullup".to_string()].into();
        let (swapped, count) = substitute_excluded(&workout, &catalog, &excluded);

        assert_eq!(count, 1);
        assert!(!swapped.contains("st-pullup"));
        let strength = swapped.section(Category::Strength);
        assert_eq!(strength.len(), 2);
        assert_eq!(strength[0].id, "st-australian-row");
        assert!(strength[0].progression_level <= 3);
    }
}
