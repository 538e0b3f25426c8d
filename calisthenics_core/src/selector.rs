//! Per-section exercise selection.
//!
//! Selection applies the hard constraints first (category, exclusions,
//! level window) and only then uses the injected random source for
//! tie-breaking, so a fixed seed reproduces a workout exactly.

use crate::catalog::Catalog;
use crate::profile::UserProfile;
use crate::random::{self, RandomSource};
use crate::types::{Category, Exercise, Skill};
use std::cmp::Ordering;

/// Share of skill slots filled from the focus partition
const FOCUS_SHARE: f64 = 0.7;

/// Share of strength slots filled from muscles related to the focus skill
const RELATED_SHARE: f64 = 0.6;

/// Upper bound (exclusive) of the tie-breaking jitter
const JITTER: f64 = 0.2;

/// Minutes per warmup/cooldown exercise
const MOBILITY_MINUTES: f64 = 1.5;

/// Minutes per skill/strength exercise
const WORK_MINUTES: u32 = 4;

/// Picks exercises for each workout section from a read-only catalog
pub struct ExerciseSelector<'a> {
    catalog: &'a Catalog,
}

impl<'a> ExerciseSelector<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    pub fn select_warmup(
        &self,
        profile: &UserProfile,
        minutes: u32,
        rng: &mut dyn RandomSource,
    ) -> Vec<&'a Exercise> {
        let pool = self.catalog.list_by_category(Category::Warmup);
        let count = mobility_count(minutes);
        select_by_preferences(&pool, profile, count, rng)
    }

    /// Skill work, mostly from exercises matching the focus skill's id prefix
    pub fn select_skill(
        &self,
        profile: &UserProfile,
        minutes: u32,
        focus: Skill,
        rng: &mut dyn RandomSource,
    ) -> Vec<&'a Exercise> {
        let prefix = focus.id_prefix();
        let (focus_pool, others): (Vec<_>, Vec<_>) = self
            .catalog
            .list_by_category(Category::Skill)
            .into_iter()
            .filter(|e| !profile.preferences.excluded_exercises.contains(&e.id))
            .partition(|e| e.id.starts_with(prefix));

        let count = (minutes / WORK_MINUTES).max(1) as usize;
        let focus_slots = (count as f64 * FOCUS_SHARE).ceil() as usize;

        let mut selected = select_by_level(&focus_pool, profile.skill_level(focus), focus_slots);
        let rest = count.saturating_sub(selected.len());
        selected.extend(select_by_preferences(&others, profile, rest, rng));

        tracing::debug!(
            "Skill section for {}: {} focus candidates, {} selected",
            focus,
            focus_pool.len(),
            selected.len()
        );
        selected
    }

    /// Strength work, biased toward muscles the focus skill relies on
    pub fn select_strength(
        &self,
        profile: &UserProfile,
        minutes: u32,
        focus: Option<Skill>,
        rng: &mut dyn RandomSource,
    ) -> Vec<&'a Exercise> {
        let pool = self.catalog.list_by_category(Category::Strength);
        let count = (minutes / WORK_MINUTES).max(2) as usize;

        let Some(skill) = focus else {
            return select_by_preferences(&pool, profile, count, rng);
        };

        let muscles = skill.target_muscles();
        let (related, others): (Vec<_>, Vec<_>) = pool.into_iter().partition(|e| {
            e.target_muscles
                .iter()
                .any(|m| muscles.contains(&m.as_str()))
        });

        let related_slots = (count as f64 * RELATED_SHARE).ceil() as usize;
        let mut selected = select_by_preferences(&related, profile, related_slots, rng);
        let rest = count.saturating_sub(selected.len());
        selected.extend(select_by_preferences(&others, profile, rest, rng));
        selected
    }

    pub fn select_cooldown(
        &self,
        profile: &UserProfile,
        minutes: u32,
        rng: &mut dyn RandomSource,
    ) -> Vec<&'a Exercise> {
        let pool = self.catalog.list_by_category(Category::Cooldown);
        let count = mobility_count(minutes);
        select_by_preferences(&pool, profile, count, rng)
    }

    /// Closest same-category exercise strictly below `exercise`'s level
    pub fn find_easier_alternative(
        &self,
        exercise: &Exercise,
        profile: &UserProfile,
    ) -> Option<&'a Exercise> {
        self.alternatives(exercise, profile)
            .filter(|e| e.progression_level < exercise.progression_level)
            .fold(None, |best: Option<&Exercise>, e| match best {
                Some(b) if b.progression_level >= e.progression_level => Some(b),
                _ => Some(e),
            })
    }

    /// Closest same-category exercise strictly above `exercise`'s level
    pub fn find_harder_alternative(
        &self,
        exercise: &Exercise,
        profile: &UserProfile,
    ) -> Option<&'a Exercise> {
        self.alternatives(exercise, profile)
            .filter(|e| e.progression_level > exercise.progression_level)
            .min_by_key(|e| e.progression_level)
    }

    fn alternatives<'p>(
        &self,
        exercise: &'p Exercise,
        profile: &'p UserProfile,
    ) -> impl Iterator<Item = &'a Exercise> + 'p
    where
        'a: 'p,
    {
        self.catalog
            .list_by_category(exercise.category)
            .into_iter()
            .filter(move |e| !profile.preferences.excluded_exercises.contains(&e.id))
    }
}

fn mobility_count(minutes: u32) -> usize {
    ((minutes as f64 / MOBILITY_MINUTES).floor() as usize).max(2)
}

/// The `count` exercises closest to `level`
///
/// Only exercises within one level are considered when any exist; otherwise
/// the whole pool is ranked. Equal distances keep pool order.
pub fn select_by_level<'e>(pool: &[&'e Exercise], level: u32, count: usize) -> Vec<&'e Exercise> {
    let window: Vec<&Exercise> = pool
        .iter()
        .copied()
        .filter(|e| e.progression_level.abs_diff(level) <= 1)
        .collect();

    let mut ranked = if window.is_empty() {
        tracing::debug!("No exercise within one level of {}, ranking whole pool", level);
        pool.to_vec()
    } else {
        window
    };

    ranked.sort_by_key(|e| e.progression_level.abs_diff(level));
    ranked.truncate(count);
    ranked
}

/// Up to `count` non-excluded exercises ranked by the user's focus areas
///
/// Each exercise scores one point per focus-area muscle, one more when its
/// primary muscle is a focus area, plus jitter in `[0, 0.2)`. Without focus
/// areas the pick is uniformly random.
pub fn select_by_preferences<'e>(
    pool: &[&'e Exercise],
    profile: &UserProfile,
    count: usize,
    rng: &mut dyn RandomSource,
) -> Vec<&'e Exercise> {
    let prefs = &profile.preferences;
    let available: Vec<&Exercise> = pool
        .iter()
        .copied()
        .filter(|e| !prefs.excluded_exercises.contains(&e.id))
        .collect();

    if count == 0 || available.is_empty() {
        return Vec::new();
    }

    let focus = &prefs.focus_areas;
    if focus.is_empty() {
        return random::choose_multiple(&available, count, rng);
    }

    let mut scored: Vec<(&Exercise, f64)> = available
        .into_iter()
        .map(|e| {
            let overlap = e.target_muscles.iter().filter(|m| focus.contains(m)).count() as f64;
            let primary = match e.primary_muscle() {
                Some(m) if focus.iter().any(|f| f == m) => 1.0,
                _ => 0.0,
            };
            (e, overlap + primary + rng.next_f64() * JITTER)
        })
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    scored.into_iter().take(count).map(|(e, _)| e).collect()
}
