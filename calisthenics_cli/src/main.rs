use calisthenics_core::profile::{PreferencesUpdate, UserInfoUpdate};
use calisthenics_core::state::{load_workout, save_workout};
use calisthenics_core::tracker::WeeklyGoal;
use calisthenics_core::*;
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "cali")]
#[command(about = "Calisthenics skill workout recommender", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Seed the random source for reproducible workouts
    #[arg(long, global = true)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or update the user profile
    Init {
        #[arg(long)]
        name: Option<String>,

        /// Preferred workout length in minutes
        #[arg(long)]
        duration: Option<u32>,

        /// Workouts per week
        #[arg(long)]
        frequency: Option<u32>,

        /// Focus muscle groups, comma separated (e.g. shoulders,core)
        #[arg(long, value_delimiter = ',')]
        focus: Option<Vec<String>>,

        /// Exercise ids to never recommend, comma separated
        #[arg(long, value_delimiter = ',')]
        exclude: Option<Vec<String>>,

        /// Skill priorities as skill=weight, comma separated
        #[arg(long, value_delimiter = ',', value_parser = parse_priority)]
        priority: Option<Vec<(Skill, u32)>>,

        /// Body weight in kg, used for calorie estimates
        #[arg(long)]
        weight: Option<f64>,
    },

    /// Generate the next workout (default)
    Workout {
        /// Workout length in minutes
        #[arg(long)]
        duration: Option<u32>,

        /// Focus skill (handstand, planche, lsit, frontLever, backLever)
        #[arg(long, value_parser = parse_skill)]
        skill: Option<Skill>,

        /// Show descriptions and target muscles
        #[arg(long)]
        detailed: bool,

        /// Dry run - show the workout without saving it
        #[arg(long)]
        dry_run: bool,
    },

    /// Show a day-by-day workout plan
    Plan {
        #[arg(long, default_value_t = 7)]
        days: u32,
    },

    /// Show progression for a skill
    Progress {
        #[arg(long, value_parser = parse_skill)]
        skill: Skill,

        /// Length of the development plan
        #[arg(long, default_value_t = 4)]
        weeks: u32,
    },

    /// Log the last generated workout as completed
    Log {
        /// How the workout felt, 1-5
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        rating: u8,

        /// Minutes actually spent
        #[arg(long)]
        duration: Option<u32>,

        /// Node attempt as node[:reps=N][:time=S][:fail]; repeatable
        #[arg(long, value_parser = parse_attempt)]
        attempt: Vec<(String, NodeAttempt)>,
    },

    /// Check whether recent sessions justify a level bump
    Ready {
        #[arg(long, value_parser = parse_skill)]
        skill: Skill,
    },

    /// Replace excluded exercises in the last workout
    Swap,
}

fn main() -> Result<()> {
    // Initialize logging
    calisthenics_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let (catalog, trees) = load_content(&config)?;
    let recommender = WorkoutRecommender::new(&catalog, &trees).with_config(config.recommender.clone());
    let paths = DataPaths::new(&data_dir);

    match cli.command {
        Some(Commands::Init {
            name,
            duration,
            frequency,
            focus,
            exclude,
            priority,
            weight,
        }) => cmd_init(
            &paths,
            &config,
            InitArgs {
                name,
                duration,
                frequency,
                focus,
                exclude,
                priority,
                weight,
            },
        ),
        Some(Commands::Workout {
            duration,
            skill,
            detailed,
            dry_run,
        }) => cmd_workout(
            &paths,
            &config,
            &recommender,
            WorkoutOptions {
                duration,
                focus_skill: skill,
            },
            detailed,
            dry_run,
            &mut rng,
        ),
        Some(Commands::Plan { days }) => cmd_plan(&paths, &config, &recommender, days, &mut rng),
        Some(Commands::Progress { skill, weeks }) => cmd_progress(&paths, &config, &recommender, skill, weeks),
        Some(Commands::Log {
            rating,
            duration,
            attempt,
        }) => cmd_log(&paths, &config, &recommender, rating, duration, attempt),
        Some(Commands::Ready { skill }) => cmd_ready(&paths, &config, &recommender, skill),
        Some(Commands::Swap) => cmd_swap(&paths, &config, &catalog),
        None => {
            // Default to "workout" command
            cmd_workout(
                &paths,
                &config,
                &recommender,
                WorkoutOptions::default(),
                false,
                false,
                &mut rng,
            )
        }
    }
}

struct DataPaths {
    profile: PathBuf,
    last_workout: PathBuf,
}

impl DataPaths {
    fn new(data_dir: &Path) -> Self {
        Self {
            profile: data_dir.join("profile.json"),
            last_workout: data_dir.join("last_workout.json"),
        }
    }
}

/// Built-in content unless the config names a content pack
fn load_content(config: &Config) -> Result<(Catalog, TreeStore)> {
    let (catalog, trees) = match &config.content.path {
        Some(path) => load_content_pack(path)?,
        None => (default_catalog().clone(), default_trees().clone()),
    };
    tracing::debug!("Using {} exercises over {} skills", catalog.len(), trees.skills().len());

    let errors = catalog.validate();
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::CatalogValidation("Invalid catalog".into()));
    }
    Ok((catalog, trees))
}

/// Existing profile, or a new one built from the configured defaults
fn load_profile(paths: &DataPaths, config: &Config) -> Result<UserProfile> {
    if paths.profile.exists() {
        UserProfile::load(&paths.profile)
    } else {
        Ok(UserProfile::new(&config.profile))
    }
}

fn require_last_workout(paths: &DataPaths) -> Result<Workout> {
    load_workout(&paths.last_workout)?
        .ok_or_else(|| Error::Other("No saved workout; run `cali workout` first".into()))
}

struct InitArgs {
    name: Option<String>,
    duration: Option<u32>,
    frequency: Option<u32>,
    focus: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
    priority: Option<Vec<(Skill, u32)>>,
    weight: Option<f64>,
}

fn cmd_init(paths: &DataPaths, config: &Config, args: InitArgs) -> Result<()> {
    let mut profile = load_profile(paths, config)?;

    profile.update_user_info(UserInfoUpdate {
        name: args.name,
        weight_kg: args.weight.map(Some),
        ..UserInfoUpdate::default()
    });
    profile.update_preferences(PreferencesUpdate {
        workout_duration: args.duration,
        workout_frequency: args.frequency,
        focus_areas: args.focus,
        excluded_exercises: args.exclude.map(|ids| ids.into_iter().collect::<BTreeSet<_>>()),
        skill_priorities: args.priority.map(|p| p.into_iter().collect::<BTreeMap<_, _>>()),
        ..PreferencesUpdate::default()
    });

    profile.save(&paths.profile)?;

    println!("✓ Profile saved to {}", paths.profile.display());
    display_profile(&profile);
    Ok(())
}

fn cmd_workout(
    paths: &DataPaths,
    config: &Config,
    recommender: &WorkoutRecommender,
    options: WorkoutOptions,
    detailed: bool,
    dry_run: bool,
    rng: &mut StdRng,
) -> Result<()> {
    let profile = load_profile(paths, config)?;
    let workout = recommender.generate_workout(&profile, &options, rng);

    display_workout(&workout, detailed);

    if dry_run {
        println!("[Dry run - workout not saved]");
        return Ok(());
    }

    save_workout(&workout, &paths.last_workout)?;
    tracing::info!("Saved workout {} to {:?}", workout.id(), paths.last_workout);
    println!("✓ Workout saved. Log it with `cali log --rating <1-5>` when done.");
    Ok(())
}

fn cmd_plan(
    paths: &DataPaths,
    config: &Config,
    recommender: &WorkoutRecommender,
    days: u32,
    rng: &mut StdRng,
) -> Result<()> {
    let profile = load_profile(paths, config)?;
    let plan = recommender.generate_workout_plan(&profile, days, &WorkoutOptions::default(), rng);

    println!("\n{}-DAY PLAN ({} workouts per week)\n", days, profile.preferences.workout_frequency);
    for day in &plan {
        match &day.workout {
            Some(workout) => println!(
                "  Day {:>2}: {} - {} exercises, {} min",
                day.day + 1,
                workout
                    .focus_skill()
                    .map_or_else(|| "general".to_string(), |s| s.to_string()),
                workout.exercise_count(),
                workout.estimated_duration()
            ),
            None => println!("  Day {:>2}: rest", day.day + 1),
        }
    }
    println!();
    Ok(())
}

fn cmd_progress(
    paths: &DataPaths,
    config: &Config,
    recommender: &WorkoutRecommender,
    skill: Skill,
    weeks: u32,
) -> Result<()> {
    let profile = load_profile(paths, config)?;
    let tracker = recommender.tracker();

    println!("\n{} - level {}", skill.as_str().to_uppercase(), profile.skill_level(skill));

    match tracker.next_node(&profile, skill) {
        Some(node) => println!("  Next: {}", node),
        None => println!("  Next: nothing within reach"),
    }

    let path = tracker.progression_path(&profile, skill);
    if path.is_empty() {
        println!("  No progression defined for {}", skill);
    } else {
        println!("\n  Reachable path:");
        for node in path {
            let mark = match tracker.node_state(&profile, skill, &node.id) {
                Some(NodeState::Mastered) => "✓",
                Some(NodeState::Available) => "→",
                _ => " ",
            };
            println!("   {} {}", mark, node);
        }
    }

    let plan = tracker.development_plan(&profile, skill, weeks);
    if let Some(target) = &plan.target_node {
        println!("\n  {}-week plan toward {}:", weeks, target);
        for week in &plan.weeks {
            println!("    {}", format_week(week));
        }
    }
    println!();
    Ok(())
}

fn cmd_log(
    paths: &DataPaths,
    config: &Config,
    recommender: &WorkoutRecommender,
    rating: u8,
    duration: Option<u32>,
    attempts: Vec<(String, NodeAttempt)>,
) -> Result<()> {
    let workout = require_last_workout(paths)?;
    let mut profile = load_profile(paths, config)?;

    let performance = WorkoutPerformance {
        duration,
        rating: Some(rating),
        exercise_performance: attempts.into_iter().collect(),
        ..WorkoutPerformance::default()
    };
    let mastered = recommender.track_progress(&mut profile, &workout, &performance);
    profile.save(&paths.profile)?;
    tracing::info!("Logged workout {} ({} node(s) mastered)", workout.id(), mastered.len());

    println!("\n✓ Workout logged!");
    if let Some(record) = profile.workout_history.last() {
        println!("  Duration: {} min", record.duration);
        if let Some(calories) = record.calories_burned {
            println!("  Calories: ~{}", calories);
        }
    }
    if let Some(skill) = workout.focus_skill() {
        for node_id in &mastered {
            println!("  ★ Mastered {}", node_id);
        }
        println!("  {} level: {}", skill, profile.skill_level(skill));
    }
    println!(
        "  Streak: {} day(s)",
        profile.current_streak(chrono::Utc::now().date_naive())
    );
    Ok(())
}

fn cmd_ready(paths: &DataPaths, config: &Config, recommender: &WorkoutRecommender, skill: Skill) -> Result<()> {
    let mut profile = load_profile(paths, config)?;

    if recommender.tracker().estimate_readiness(&mut profile, skill) {
        profile.save(&paths.profile)?;
        tracing::info!("Bumped {} to level {}", skill, profile.skill_level(skill));
        println!("✓ Ready to progress! {} level is now {}", skill, profile.skill_level(skill));
    } else {
        println!("Not ready yet - keep training {} (level {})", skill, profile.skill_level(skill));
    }
    Ok(())
}

fn cmd_swap(paths: &DataPaths, config: &Config, catalog: &Catalog) -> Result<()> {
    let workout = require_last_workout(paths)?;
    let profile = load_profile(paths, config)?;

    let (swapped, count) = substitute_excluded(&workout, catalog, &profile.preferences.excluded_exercises);
    if count == 0 {
        println!("Nothing to swap.");
        return Ok(());
    }

    save_workout(&swapped, &paths.last_workout)?;
    tracing::info!("Swapped {} excluded exercise(s) in workout {}", count, swapped.id());
    println!("✓ Swapped {} exercise(s)", count);
    display_workout(&swapped, false);
    Ok(())
}

fn display_profile(profile: &UserProfile) {
    let prefs = &profile.preferences;
    println!();
    if !profile.name.is_empty() {
        println!("  Name: {}", profile.name);
    }
    println!(
        "  Workouts: {} min, {}x per week",
        prefs.workout_duration, prefs.workout_frequency
    );
    if !prefs.focus_areas.is_empty() {
        println!("  Focus areas: {}", prefs.focus_areas.join(", "));
    }
    if !prefs.excluded_exercises.is_empty() {
        let excluded: Vec<&str> = prefs.excluded_exercises.iter().map(String::as_str).collect();
        println!("  Excluded: {}", excluded.join(", "));
    }
    for (skill, weight) in &prefs.skill_priorities {
        println!("  Priority {}: {}", skill, weight);
    }
    println!();
}

fn display_workout(workout: &Workout, detailed: bool) {
    println!("\n╭─────────────────────────────────────────╮");
    println!(
        "│  WORKOUT PLAN: {} ({} minutes)",
        difficulty_label(workout.difficulty()).to_uppercase(),
        workout.estimated_duration()
    );
    println!("╰─────────────────────────────────────────╯");
    println!(
        "  Focus: {}",
        workout
            .focus_skill()
            .map_or_else(|| "general".to_string(), |s| s.to_string())
    );
    println!();

    for category in Category::ALL {
        let exercises = workout.section(category);
        let title = category.as_str();
        let mut chars = title.chars();
        let title: String = chars
            .next()
            .map(|c| c.to_uppercase().chain(chars).collect())
            .unwrap_or_default();
        println!("== {} ({} minutes) ==", title, workout.section_duration(category));

        if exercises.is_empty() {
            println!("  No exercises in this section.\n");
            continue;
        }

        for (i, exercise) in exercises.iter().enumerate() {
            println!("  {}. {} (Level {})", i + 1, exercise.name, exercise.progression_level);
            if detailed {
                if !exercise.description.is_empty() {
                    println!("     {}", exercise.description);
                }
                if !exercise.target_muscles.is_empty() {
                    println!("     Targets: {}", exercise.target_muscles.join(", "));
                }
                if let Some((lo, hi)) = exercise.rep_range {
                    println!("     Reps: {}-{}", lo, hi);
                }
                if let Some((lo, hi)) = exercise.time_range {
                    println!("     Hold: {}-{}s", lo, hi);
                }
            }
        }
        println!();
    }
}

fn format_week(week: &WeeklyGoal) -> String {
    let mut goals = Vec::new();
    if let Some(hold) = week.goals.hold_time {
        goals.push(format!("hold {}s", hold));
    }
    if let Some(reps) = week.goals.reps {
        goals.push(format!("{} reps", reps));
    }
    format!("Week {}: {} - {}", week.week, week.focus, goals.join(", "))
}

fn parse_skill(s: &str) -> std::result::Result<Skill, String> {
    s.parse::<Skill>().map_err(|e| e.to_string())
}

fn parse_priority(s: &str) -> std::result::Result<(Skill, u32), String> {
    let (skill, weight) = s
        .split_once('=')
        .ok_or_else(|| format!("expected skill=weight, got '{}'", s))?;
    let weight = weight
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("bad weight '{}': {}", weight, e))?;
    Ok((parse_skill(skill)?, weight))
}

/// `node[:reps=N][:time=S][:fail]`
fn parse_attempt(s: &str) -> std::result::Result<(String, NodeAttempt), String> {
    let mut parts = s.split(':');
    let node_id = parts
        .next()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| format!("missing node id in '{}'", s))?;

    let mut attempt = NodeAttempt {
        success: true,
        time: None,
        reps: None,
    };
    for part in parts {
        match part.split_once('=') {
            Some(("reps", n)) => attempt.reps = Some(n.parse().map_err(|e| format!("bad reps '{}': {}", n, e))?),
            Some(("time", n)) => attempt.time = Some(n.parse().map_err(|e| format!("bad time '{}': {}", n, e))?),
            None if part == "fail" => attempt.success = false,
            _ => return Err(format!("unknown attempt field '{}'", part)),
        }
    }
    Ok((node_id.to_string(), attempt))
}
