#![forbid(unsafe_code)]

//! Core domain model and engines for the calisthenics skill system.
//!
//! This crate provides:
//! - Domain types (skills, exercises, progression nodes, metrics)
//! - The exercise catalog and progression tree store
//! - Workout recommendation (similarity, selection, orchestration)
//! - Progression tracking over the skill trees
//! - The user profile and its persistence

pub mod types;
pub mod error;
pub mod catalog;
pub mod tree;
pub mod content;
pub mod config;
pub mod logging;
pub mod random;
pub mod similarity;
pub mod workout;
pub mod history;
pub mod profile;
pub mod state;
pub mod selector;
pub mod tracker;
pub mod recommender;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{build_default_catalog, default_catalog, Catalog};
pub use tree::{build_default_trees, default_trees, ProgressionTree, TreeStore};
pub use content::load_content_pack;
pub use config::Config;
pub use random::RandomSource;
pub use similarity::{find_similar_exercise, substitute_excluded};
pub use workout::{difficulty_label, Workout};
pub use history::{WorkoutCompletionRecord, WorkoutPerformance};
pub use profile::UserProfile;
pub use selector::ExerciseSelector;
pub use tracker::{DevelopmentPlan, ProgressionTracker};
pub use recommender::{PlanDay, WorkoutOptions, WorkoutRecommender};
