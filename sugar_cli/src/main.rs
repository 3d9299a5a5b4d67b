use chrono::{DateTime, Local};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use sugar_core::*;

type Tracker = SugarTracker<JsonFileStore, ManualScheduler>;

const STORE_FILE: &str = "sugar_store.json";

#[derive(Parser)]
#[command(name = "sugarmeter")]
#[command(about = "Daily sugar intake tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show today's total, level, and quick-access items (default)
    Status,

    /// Log one serving of an item
    Log {
        /// Item name (case-insensitive)
        name: String,

        /// Serving size
        #[arg(long, value_enum, conflicts_with = "grams")]
        size: Option<SizeArg>,

        /// Exact grams, bypassing the item's serving size
        #[arg(long, allow_negative_numbers = true)]
        grams: Option<i32>,
    },

    /// Zero today's total
    Reset,

    /// Set the daily limit in grams
    Limit {
        grams: i32,
    },

    /// Set the level multipliers relative to the daily limit
    Thresholds {
        l2: f64,
        l3: f64,
        l4: f64,
        l5: f64,
    },

    /// List quick-access items
    Items {
        /// List the full catalog instead
        #[arg(long)]
        all: bool,
    },

    /// Add a custom item
    AddItem {
        name: String,
        grams: i32,

        /// Category (drink, candy, bakery, ...)
        #[arg(long)]
        category: Option<String>,
    },

    /// Remove a custom item
    RemoveItem {
        name: String,
    },

    /// Show logged days
    History,

    /// Show the read-only widget summary
    Widget,
}

#[derive(Clone, Copy, ValueEnum)]
enum SizeArg {
    Small,
    Medium,
    Large,
}

impl From<SizeArg> for SugarItemSize {
    fn from(size: SizeArg) -> Self {
        match size {
            SizeArg::Small => SugarItemSize::Small,
            SizeArg::Medium => SugarItemSize::Medium,
            SizeArg::Large => SugarItemSize::Large,
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    sugar_core::logging::init();

    let cli = Cli::parse();

    // Determine data directory
    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let now = Local::now();

    let store = open_store(&data_dir, &config)?;
    let settings = TrackerSettings::from(&config.tracker);
    let unit = config.display.unit;

    // The widget only reads; building a tracker would apply the day boundary
    let command = cli.command.unwrap_or(Commands::Status);
    if let Commands::Widget = command {
        return cmd_widget(&store, now, &settings, unit);
    }

    validate_catalog(&store)?;
    let mut tracker = SugarTracker::new(store, ManualScheduler::new(), settings, now);

    let result = match command {
        Commands::Status => cmd_status(&tracker, now, unit),
        Commands::Log { name, size, grams } => {
            let serving = match (grams, size) {
                (Some(grams), _) => Serving::Grams(grams),
                (None, Some(size)) => Serving::Size(size.into()),
                (None, None) => Serving::default(),
            };
            cmd_log(&mut tracker, &name, serving, now, unit)
        }
        Commands::Reset => {
            tracker.reset_daily(now);
            println!("✓ Today's total reset");
            Ok(())
        }
        Commands::Limit { grams } => {
            tracker.update_daily_limit(grams);
            println!(
                "✓ Daily limit set to {}",
                unit.formatted_with_unit(tracker.daily_limit())
            );
            Ok(())
        }
        Commands::Thresholds { l2, l3, l4, l5 } => {
            tracker.update_threshold_multipliers(ThresholdMultipliers::new(l2, l3, l4, l5));
            let m = tracker.threshold_multipliers();
            println!(
                "✓ Multipliers set to {}x / {}x / {}x / {}x",
                m.l2, m.l3, m.l4, m.l5
            );
            print_boundaries(&tracker, unit);
            Ok(())
        }
        Commands::Items { all } => {
            cmd_items(&tracker, all, unit);
            Ok(())
        }
        Commands::AddItem {
            name,
            grams,
            category,
        } => cmd_add_item(&mut tracker, &name, grams, category.as_deref()),
        Commands::RemoveItem { name } => {
            if tracker.remove_custom_item(&name) {
                println!("✓ Removed '{}'", name);
                Ok(())
            } else {
                Err(Error::Other(format!("No custom item named '{}'", name)))
            }
        }
        Commands::History => {
            cmd_history(&tracker, now, unit);
            Ok(())
        }
        Commands::Widget => cmd_widget(tracker.store(), now, &settings, unit),
    };

    for warning in tracker.take_warnings() {
        eprintln!("warning: {}", warning);
    }

    result
}

/// Open the store, copying over legacy keys when configured
fn open_store(data_dir: &Path, config: &Config) -> Result<JsonFileStore> {
    std::fs::create_dir_all(data_dir)?;
    let mut store = JsonFileStore::new(data_dir.join(STORE_FILE));

    if let Some(ref legacy_path) = config.data.legacy_store {
        if legacy_path.exists() {
            let legacy = JsonFileStore::new(legacy_path);
            let migrated = migrate_legacy(&mut store, &legacy)?;
            if !migrated.is_empty() {
                tracing::info!("Migrated {:?} from {:?}", migrated, legacy_path);
            }
        }
    }

    Ok(store)
}

fn validate_catalog(store: &JsonFileStore) -> Result<()> {
    let custom = store.custom_items().into_iter().map(SugarItem::from).collect();
    let errors = Catalog::with_builtins(custom).validate();
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::CatalogValidation("Invalid catalog".into()));
    }
    Ok(())
}

fn cmd_status(tracker: &Tracker, now: DateTime<Local>, unit: SugarUnit) -> Result<()> {
    let level = tracker.current_level();

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  TODAY: {}", level.status_label().to_uppercase());
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!(
        "  {} of {} ({} logs)",
        unit.formatted_with_unit(tracker.total_grams_today()),
        unit.formatted_with_unit(tracker.daily_limit()),
        tracker.log_count_today()
    );
    println!("  Level {}: {}", level.ordinal(), level.status_label());
    println!(
        "  Limit progress: {:.0}%",
        tracker.limit_progress() * 100.0
    );
    println!("  Gauge: {}", gauge_bar(tracker.visual_fill_fraction(), 30));

    let streak = tracker.current_streak(now);
    if streak > 0 {
        println!("  Streak: {} day{}", streak, if streak == 1 { "" } else { "s" });
    }

    println!();
    cmd_items(tracker, false, unit);
    Ok(())
}

fn cmd_log(
    tracker: &mut Tracker,
    name: &str,
    serving: Serving,
    now: DateTime<Local>,
    unit: SugarUnit,
) -> Result<()> {
    let outcome = tracker
        .log_by_name(name, serving, now)
        .ok_or_else(|| Error::Other(format!("Unknown item '{}'", name)))?;

    if outcome.reset_before_logging {
        println!("(New day - yesterday's total was reset)");
    }
    println!(
        "✓ Logged {} (+{})",
        outcome.item_name,
        unit.formatted_with_unit(outcome.grams_added)
    );
    println!(
        "  Today: {} / {}",
        unit.formatted_with_unit(outcome.total_grams),
        unit.formatted_with_unit(tracker.daily_limit())
    );

    if let Some(message) = tracker.take_level_message() {
        println!();
        println!("  ⚠ {}", message.title);
        println!("    {}", message.body);
    }
    Ok(())
}

fn cmd_items(tracker: &Tracker, all: bool, unit: SugarUnit) {
    let items = if all {
        tracker.full_catalog()
    } else {
        tracker.displayed_items()
    };

    println!("  {}", if all { "Catalog:" } else { "Quick access:" });
    for item in items {
        let marker = if item.is_custom { " *" } else { "" };
        println!(
            "    {:<22} {:>7}  {}{}",
            item.name,
            unit.formatted_with_unit(item.sugar_grams),
            item.category.title(),
            marker
        );
    }
}

fn cmd_add_item(tracker: &mut Tracker, name: &str, grams: i32, category: Option<&str>) -> Result<()> {
    let category = match category {
        Some(c) => SugarItemCategory::parse(c).unwrap_or_else(|| {
            eprintln!("Unknown category: {}. Using Custom.", c);
            SugarItemCategory::Custom
        }),
        None => SugarItemCategory::Custom,
    };

    if tracker.add_custom_item(name, grams, category) {
        println!("✓ Added '{}' ({}g)", name.trim(), grams);
        Ok(())
    } else {
        Err(Error::Other(format!(
            "Cannot add '{}': name must be new and non-empty, grams must be positive",
            name
        )))
    }
}

fn cmd_history(tracker: &Tracker, now: DateTime<Local>, unit: SugarUnit) {
    let history = tracker.history();
    if history.is_empty() {
        println!("No days logged yet.");
        return;
    }

    let limit = tracker.daily_limit();
    let multipliers = tracker.threshold_multipliers();
    for (date, log) in history.iter().rev() {
        let level = level::level_for(log.grams, limit, multipliers);
        println!(
            "  {}  {:>7}  {:>3} logs  {}",
            date,
            unit.formatted_with_unit(log.grams),
            log.count,
            level.status_label()
        );
    }
    println!();
    println!("  Current streak: {} days", tracker.current_streak(now));
}

fn cmd_widget(
    store: &JsonFileStore,
    now: DateTime<Local>,
    settings: &TrackerSettings,
    unit: SugarUnit,
) -> Result<()> {
    let snapshot = WidgetSnapshot::load(store, now, settings);
    println!(
        "{} / {}  {}",
        unit.formatted_with_unit(snapshot.total_grams),
        unit.formatted_with_unit(snapshot.daily_limit),
        snapshot.status_label
    );
    println!("{}", gauge_bar(snapshot.progress, 20));
    Ok(())
}

fn print_boundaries(tracker: &Tracker, unit: SugarUnit) {
    for zone in level::zones(tracker.daily_limit(), tracker.threshold_multipliers()) {
        let range = match zone.upper_bound {
            Some(upper) => format!(
                "{}-{}",
                unit.formatted_value(zone.lower_bound),
                unit.formatted_with_unit(upper)
            ),
            None => format!(">{}", unit.formatted_with_unit(zone.lower_bound)),
        };
        println!("  {:<14} {}", zone.name, range);
    }
}

fn gauge_bar(fraction: f64, width: usize) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("[{}{}]", "█".repeat(filled), "░".repeat(width - filled))
}
