//! Configuration file support for cali.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/cali/config.toml`.

use crate::types::{Category, Skill};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub profile: ProfileDefaults,

    #[serde(default)]
    pub recommender: RecommenderConfig,

    #[serde(default)]
    pub content: ContentConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Named defaults applied when a new profile is created
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ProfileDefaults {
    /// Minutes
    #[serde(default = "default_workout_duration")]
    pub workout_duration: u32,

    /// Sessions per week
    #[serde(default = "default_workout_frequency")]
    pub workout_frequency: u32,

    #[serde(default = "default_starting_skill_level")]
    pub starting_skill_level: u32,

    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default = "default_units")]
    pub units: String,

    #[serde(default = "default_true")]
    pub notifications: bool,

    #[serde(default)]
    pub dark_mode: bool,
}

impl Default for ProfileDefaults {
    fn default() -> Self {
        Self {
            workout_duration: default_workout_duration(),
            workout_frequency: default_workout_frequency(),
            starting_skill_level: default_starting_skill_level(),
            language: default_language(),
            units: default_units(),
            notifications: true,
            dark_mode: false,
        }
    }
}

/// Share of the total duration given to each workout section
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct SectionRatios {
    pub warmup: f64,
    pub skill: f64,
    pub strength: f64,
    pub cooldown: f64,
}

impl Default for SectionRatios {
    fn default() -> Self {
        Self {
            warmup: 0.15,
            skill: 0.30,
            strength: 0.45,
            cooldown: 0.10,
        }
    }
}

impl SectionRatios {
    pub fn ratio(&self, category: Category) -> f64 {
        match category {
            Category::Warmup => self.warmup,
            Category::Skill => self.skill,
            Category::Strength => self.strength,
            Category::Cooldown => self.cooldown,
        }
    }

    /// Each section rounded independently; drift across sections is accepted
    pub fn split(&self, total_minutes: u32) -> [(Category, u32); 4] {
        Category::ALL.map(|c| (c, (total_minutes as f64 * self.ratio(c)).round() as u32))
    }
}

/// Workout recommender tuning
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RecommenderConfig {
    /// Minutes, used when neither the request nor the profile sets one
    #[serde(default = "default_workout_duration")]
    pub default_duration: u32,

    /// Focus skill when the profile gives no signal
    #[serde(default = "default_fallback_skill")]
    pub fallback_skill: Skill,

    #[serde(default)]
    pub section_ratios: SectionRatios,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            default_duration: default_workout_duration(),
            fallback_skill: default_fallback_skill(),
            section_ratios: SectionRatios::default(),
        }
    }
}

impl RecommenderConfig {
    /// Ratios must be non-negative and sum to roughly one
    pub fn validate(&self) -> Result<()> {
        let ratios = &self.section_ratios;
        let all = [ratios.warmup, ratios.skill, ratios.strength, ratios.cooldown];
        if all.iter().any(|r| !r.is_finite() || *r < 0.0) {
            return Err(Error::Config("section ratios must be non-negative".into()));
        }
        let sum: f64 = all.iter().sum();
        if (sum - 1.0).abs() > 0.01 {
            return Err(Error::Config(format!(
                "section ratios sum to {:.2}, expected 1.0",
                sum
            )));
        }
        Ok(())
    }
}

/// External exercise/tree content
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct ContentConfig {
    /// JSON content pack replacing the built-in catalog and trees
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("cali")
}

fn default_workout_duration() -> u32 {
    30
}

fn default_workout_frequency() -> u32 {
    3
}

fn default_starting_skill_level() -> u32 {
    1
}

fn default_language() -> String {
    "en".into()
}

fn default_units() -> String {
    "metric".into()
}

fn default_true() -> bool {
    true
}

fn default_fallback_skill() -> Skill {
    Skill::Handstand
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.recommender.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("cali").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
