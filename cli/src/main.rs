mod config;
mod data;
mod logging;
mod widget;

use std::path::PathBuf;
use std::time::Duration;

use chrono::Local;
use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;

use batinfo_telemetry::IoRegSource;
use config::{config_path, ensure_dirs, LogLevel, Settings};
use data::{
    BatteryDataController, HelperFetcher, HistoryStore, Recorder, SettingsBatteryCache,
};
use logging::LogMode;
use widget::{FixedLocator, PluginKitLocator, SnapshotLocator, WidgetBridge, WidgetSnapshot};

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show the home view battery groups (default)
    Show {
        /// Show serial numbers unmasked
        #[arg(long)]
        show_serials: bool,

        /// Health rounding override (keep, ceiling, round, floor)
        #[arg(long)]
        accuracy: Option<String>,
    },

    /// Show every available data group
    All {
        /// Show serial numbers unmasked
        #[arg(long)]
        show_serials: bool,

        /// Health rounding override (keep, ceiling, round, floor)
        #[arg(long)]
        accuracy: Option<String>,
    },

    /// Refresh and print continuously
    Watch {
        /// Refresh interval in seconds
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Record a battery health sample now
    Record,

    /// View and manage recorded history
    History {
        #[command(subcommand)]
        command: Option<HistoryCommands>,
    },

    /// Manage the widget snapshot file
    Widget {
        #[command(subcommand)]
        command: WidgetCommands,
    },

    /// Show or edit configuration
    Config {
        /// Print config file path
        #[arg(long)]
        path: bool,

        /// Reset config to defaults
        #[arg(long)]
        reset: bool,

        /// Enable or disable automatic recording
        #[arg(long)]
        recording: Option<bool>,

        /// Set the recording policy (automatic, data-changed, every-day, manual)
        #[arg(long)]
        record_policy: Option<String>,

        /// Enable or disable the widget bridge
        #[arg(long)]
        widget: Option<bool>,

        /// Set the home view group order as comma-separated group ids
        #[arg(long)]
        home_groups: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
enum HistoryCommands {
    /// List recorded samples (default)
    #[command(alias = "ls")]
    List {
        /// Maximum number of rows to print
        #[arg(short, long, default_value_t = 50)]
        limit: usize,
    },

    /// Export all samples as CSV
    Export {
        /// Output file path (defaults to stdout)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Delete one sample
    Delete {
        /// Record id to delete
        #[arg(long)]
        id: i64,
    },

    /// Delete all samples
    Clear {
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Debug, Subcommand)]
enum WidgetCommands {
    /// Write the current battery data to the widget containers
    Sync,

    /// Print the snapshot the widget currently sees
    Show,

    /// Scan for widget sandbox containers and cache them
    Detect,
}

/// Battery diagnostics, health history, and widget snapshots
/// https://github.com/developlab/batinfo
#[derive(Debug, Parser)]
#[command(name = "batinfo", version, verbatim_doc_comment)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let _ = ensure_dirs();

    let cli = Cli::parse();
    let settings = Settings::load();
    let log_level_override = cli.log_level.as_deref().map(LogLevel::from_str);

    match cli.command {
        Some(Commands::All {
            show_serials,
            accuracy,
        }) => {
            let _guard = logging::init(settings.log_level, LogMode::Stderr, log_level_override);
            run_show(settings, show_serials, accuracy, true)
        }
        Some(Commands::Watch { interval }) => {
            let _guard = logging::init(settings.log_level, LogMode::Both, log_level_override);
            run_watch(settings, interval)
        }
        Some(Commands::Record) => {
            let _guard = logging::init(settings.log_level, LogMode::Stderr, log_level_override);
            run_record(settings)
        }
        Some(Commands::History { command }) => {
            let _guard = logging::init(settings.log_level, LogMode::Stderr, log_level_override);
            run_history_command(command)
        }
        Some(Commands::Widget { command }) => {
            // Widget syncs often run from a scheduled job with no terminal.
            let _guard = logging::init(settings.log_level, LogMode::File, log_level_override);
            run_widget_command(command, settings)
        }
        Some(Commands::Config {
            path,
            reset,
            recording,
            record_policy,
            widget,
            home_groups,
        }) => {
            let _guard = logging::init(settings.log_level, LogMode::Stderr, log_level_override);
            run_config(path, reset, recording, record_policy, widget, home_groups)
        }
        Some(Commands::Show {
            show_serials,
            accuracy,
        }) => {
            let _guard = logging::init(settings.log_level, LogMode::Stderr, log_level_override);
            run_show(settings, show_serials, accuracy, false)
        }
        None => {
            let _guard = logging::init(settings.log_level, LogMode::Stderr, log_level_override);
            run_show(settings, false, None, false)
        }
    }
}

fn build_controller(settings: Settings) -> BatteryDataController {
    let cache = SettingsBatteryCache::new(Box::new(HelperFetcher::new(
        settings.settings_helper_path.clone(),
    )));
    BatteryDataController::new(Box::new(IoRegSource::new()), settings, cache)
}

fn build_recorder(settings: &Settings) -> Result<Recorder> {
    let store = HistoryStore::open()?;
    Ok(Recorder::new(
        store,
        settings.recording.clone(),
        settings.accuracy,
    ))
}

fn run_show(
    mut settings: Settings,
    show_serials: bool,
    accuracy: Option<String>,
    all: bool,
) -> Result<()> {
    if let Some(mode) = accuracy.as_deref() {
        settings.accuracy = config::AccuracyMode::from_str(mode);
    }

    let mut recorder = build_recorder(&settings)?;
    let mut controller = build_controller(settings);
    if show_serials {
        controller.toggle_serial_mask();
    }

    controller.refresh(&mut recorder);

    let groups = if all {
        controller.all_groups(&recorder)
    } else {
        controller.home_groups(&recorder)
    };

    if groups.is_empty() {
        println!("No battery data available from {}.", controller.source_name());
        return Ok(());
    }
    print_groups(&groups);

    Ok(())
}

fn run_watch(settings: Settings, interval: Option<u64>) -> Result<()> {
    let interval = interval.unwrap_or(settings.refresh_secs).max(1);
    let mut recorder = build_recorder(&settings)?;
    let mut controller = build_controller(settings);

    println!("Refreshing every {}s. Press Ctrl+C to stop.", interval);

    loop {
        controller.refresh(&mut recorder);

        println!();
        println!(
            "--- {} ---",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        let groups = controller.home_groups(&recorder);
        if groups.is_empty() {
            println!("No battery data available.");
        } else {
            print_groups(&groups);
        }

        std::thread::sleep(Duration::from_secs(interval));
    }
}

fn run_record(settings: Settings) -> Result<()> {
    if !settings.recording.enabled {
        eprintln!("Recording is disabled. Enable it with `batinfo config --recording true`.");
        std::process::exit(1);
    }

    let mut recorder = build_recorder(&settings)?;
    let mut controller = build_controller(settings);

    if controller.record_manual(&mut recorder) {
        let count = recorder.store().count()?;
        println!("Recorded battery sample ({} total).", count);
    } else {
        eprintln!("Could not record: battery data is incomplete or the insert failed.");
        std::process::exit(1);
    }

    Ok(())
}

fn run_history_command(command: Option<HistoryCommands>) -> Result<()> {
    let cmd = command.unwrap_or(HistoryCommands::List { limit: 50 });
    let store = HistoryStore::open()?;

    match cmd {
        HistoryCommands::List { limit } => {
            let records = store.fetch_all()?;
            if records.is_empty() {
                println!("No history recorded yet. Run `batinfo record` to add a sample.");
                return Ok(());
            }

            println!(
                "{:<6} {:<20} {:>8} {:>10} {:>10} {:>9}",
                "ID", "Date", "Cycles", "Nominal", "Design", "Health"
            );
            println!("{}", "-".repeat(68));
            for record in records.iter().take(limit) {
                println!(
                    "{:<6} {:<20} {:>8} {:>10} {:>10} {:>8}%",
                    record.id.unwrap_or(0),
                    data::format::format_timestamp(record.create_date),
                    record.cycle_count,
                    record.nominal_charge_capacity.unwrap_or(0),
                    record.design_capacity.unwrap_or(0),
                    record.maximum_capacity.as_deref().unwrap_or("N/A"),
                );
            }
            if records.len() > limit {
                println!("... and {} more", records.len() - limit);
            }
        }
        HistoryCommands::Export { output } => {
            let csv = store.export_csv()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, &csv)?;
                    println!("Exported {} rows to: {}", csv.lines().count() - 1, path);
                }
                None => print!("{}", csv),
            }
        }
        HistoryCommands::Delete { id } => {
            if store.delete(id)? {
                println!("Deleted record {}.", id);
            } else {
                eprintln!("No record with id {}.", id);
                std::process::exit(1);
            }
        }
        HistoryCommands::Clear { yes } => {
            let count = store.count()?;
            if count == 0 {
                println!("History is already empty.");
                return Ok(());
            }

            if !yes {
                print!("Delete all {} records? [y/N] ", count);
                std::io::Write::flush(&mut std::io::stdout())?;

                let mut input = String::new();
                std::io::stdin().read_line(&mut input)?;

                if !input.trim().eq_ignore_ascii_case("y") {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            let deleted = store.delete_all()?;
            println!("Deleted {} records.", deleted);
        }
    }

    Ok(())
}

fn run_widget_command(command: WidgetCommands, mut settings: Settings) -> Result<()> {
    match command {
        WidgetCommands::Sync => {
            let candidates = widget_candidates(&mut settings);
            if candidates.is_empty() {
                eprintln!("No widget containers found. Is the widget installed?");
                std::process::exit(1);
            }

            let accuracy = settings.accuracy;
            let widget_config = settings.widget.clone();
            let mut recorder = build_recorder(&settings)?;
            let mut controller = build_controller(settings);
            controller.refresh(&mut recorder);

            let Some(info) = controller.snapshot() else {
                eprintln!("No battery data available to publish.");
                std::process::exit(1);
            };
            let (Some(cycles), Some(health)) = (
                info.cycle_count,
                data::format::format_maximum_capacity(
                    info.nominal_charge_capacity,
                    info.design_capacity,
                    accuracy,
                ),
            ) else {
                eprintln!("Battery data is incomplete; not publishing.");
                std::process::exit(1);
            };

            let bridge = WidgetBridge::new(Box::new(FixedLocator::new(candidates)), widget_config);
            let snapshot = WidgetSnapshot::new(health, cycles, Local::now().timestamp());
            let outcome = bridge.publish(&snapshot);

            if outcome.persisted {
                println!(
                    "Widget snapshot published{}.",
                    if outcome.reload_requested {
                        ", timeline reload requested"
                    } else {
                        ""
                    }
                );
            } else {
                println!("Nothing published (policy skipped or writes failed).");
            }
        }
        WidgetCommands::Show => {
            let candidates = widget_candidates(&mut settings);
            let bridge =
                WidgetBridge::new(Box::new(FixedLocator::new(candidates)), settings.widget);

            match bridge.read() {
                Some(snapshot) => {
                    println!("Maximum capacity: {}%", snapshot.maximum_capacity);
                    println!("Cycle count:      {}", snapshot.cycle_count);
                    println!("Updated:          {}", snapshot.update_date);

                    let suggestion = bridge.staleness(&snapshot);
                    println!(
                        "Freshness:        {:?} (next check in {}s)",
                        suggestion,
                        suggestion.recheck_after_secs()
                    );
                }
                None => {
                    println!("No widget snapshot found.");
                }
            }
        }
        WidgetCommands::Detect => {
            let locator = PluginKitLocator::new(settings.widget.bundle_identifier.clone());
            let found = locator.candidates();
            if found.is_empty() {
                println!(
                    "No containers matched {}.",
                    settings.widget.bundle_identifier
                );
                return Ok(());
            }

            for path in &found {
                println!("{}", path.display());
            }
            settings.set_widget_sandbox_paths(
                found.iter().map(|p| p.display().to_string()).collect(),
            );
            println!("Cached {} container path(s).", found.len());
        }
    }

    Ok(())
}

/// Cached container paths, revalidated; falls back to a fresh scan and
/// updates the cache when it finds anything.
fn widget_candidates(settings: &mut Settings) -> Vec<PathBuf> {
    let cached: Vec<PathBuf> = settings
        .widget
        .sandbox_paths
        .iter()
        .map(PathBuf::from)
        .filter(|p| p.is_dir())
        .collect();
    if !cached.is_empty() {
        return cached;
    }

    let found = PluginKitLocator::new(settings.widget.bundle_identifier.clone()).candidates();
    if !found.is_empty() {
        settings
            .set_widget_sandbox_paths(found.iter().map(|p| p.display().to_string()).collect());
    }
    found
}

fn run_config(
    path: bool,
    reset: bool,
    recording: Option<bool>,
    record_policy: Option<String>,
    widget: Option<bool>,
    home_groups: Option<String>,
) -> Result<()> {
    let config_file = config_path();

    if path {
        println!("{}", config_file.display());
        return Ok(());
    }

    if reset {
        let settings = Settings::default();
        settings.save()?;
        println!("Config reset to defaults at: {}", config_file.display());
        return Ok(());
    }

    let mut settings = Settings::load();
    let mut changed = false;

    if let Some(enabled) = recording {
        settings.set_recording_enabled(enabled);
        println!("Recording {}.", if enabled { "enabled" } else { "disabled" });
        changed = true;
    }
    if let Some(policy) = record_policy.as_deref() {
        let policy = config::RecordPolicy::from_str(policy);
        settings.set_record_policy(policy);
        println!("Record policy set to {}.", policy.label());
        changed = true;
    }
    if let Some(enabled) = widget {
        settings.set_widget_enabled(enabled);
        println!("Widget {}.", if enabled { "enabled" } else { "disabled" });
        changed = true;
    }
    if let Some(sequence) = home_groups.as_deref() {
        let ids: Vec<i64> = sequence
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        let unique = ids.iter().collect::<std::collections::HashSet<_>>().len();
        if ids.is_empty() || unique != ids.len() {
            eprintln!("Group ids must be non-empty and unique: '{}'.", sequence);
            std::process::exit(1);
        }
        settings.set_home_group_sequence(ids);
        println!("Home group order updated.");
        changed = true;
    }
    if changed {
        return Ok(());
    }

    println!("Config file: {}", config_file.display());
    println!(
        "Accuracy: {}, recording: {} ({})",
        settings.accuracy.label(),
        if settings.recording.enabled { "on" } else { "off" },
        settings.recording.policy.label()
    );
    println!();
    println!("{}", toml::to_string_pretty(&settings)?);

    Ok(())
}

fn print_groups(groups: &[data::InfoItemGroup]) {
    for group in groups {
        println!("{}", group.title);
        println!("{}", "-".repeat(group.title.len().max(16)));
        for item in &group.items {
            println!("  {}", item.text);
            if let Some(detail) = &item.detail {
                for line in detail.lines() {
                    println!("    {}", line);
                }
            }
        }
        if let Some(footer) = &group.footer {
            println!("  ({})", footer);
        }
        println!();
    }
}
