//! Command-line interface for the listing feature jobs.

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::MissingCategories;
use crate::PipelineConfig;

#[derive(Parser)]
#[command(name = "listing-features")]
#[command(about = "Location cleaning and categorical encoding for listing tables", version)]
pub struct Cli {
    /// Path to YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Repair coordinates and replace them with polar features
    Clean {
        /// Directory holding the input and output tables
        #[arg(short, long)]
        dataset_dir: Option<PathBuf>,
    },

    /// One-hot encode categorical columns and add cyclic date features
    Encode {
        /// Directory holding the input and output tables
        #[arg(short, long)]
        dataset_dir: Option<PathBuf>,
        /// Where to write the category dictionary
        #[arg(long)]
        dictionary: Option<PathBuf>,
        /// Leave indicator cells missing for missing categories
        #[arg(long)]
        propagate_missing: bool,
    },

    /// Run the cleaner, then the encoder
    Run {
        /// Directory holding the input and output tables
        #[arg(short, long)]
        dataset_dir: Option<PathBuf>,
        /// Where to write the category dictionary
        #[arg(long)]
        dictionary: Option<PathBuf>,
    },

    /// Write the default configuration as YAML
    InitConfig {
        /// Output YAML path
        #[arg(default_value = "listing-features.yaml")]
        output: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Create a spinner for indeterminate operations
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Print a summary box
fn print_summary(title: &str, items: &[(&str, String)]) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ {:<62} ║", title);
    println!("╠══════════════════════════════════════════════════════════════╣");
    for (key, value) in items {
        let display_value = if value.chars().count() > 39 {
            format!("{}...", value.chars().take(36).collect::<String>())
        } else {
            value.clone()
        };
        println!("║ {:<20}: {:<39} ║", key, display_value);
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
}

pub fn run() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity (must come first)
    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .parse_default_env()
        .format_timestamp_secs()
        .init();

    // Load config
    let mut config = match &cli.config {
        Some(path) => match PipelineConfig::from_yaml(path) {
            Ok(cfg) => {
                info!("Loaded config from: {}", path.display());
                cfg
            }
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}, using defaults",
                    path.display(),
                    e
                );
                PipelineConfig::default()
            }
        },
        None => PipelineConfig::default(),
    };

    // Dispatch to subcommands
    match cli.command {
        Commands::Clean { dataset_dir } => {
            apply_path_overrides(&mut config, dataset_dir, None);
            cmd_clean(&config);
        }
        Commands::Encode {
            dataset_dir,
            dictionary,
            propagate_missing,
        } => {
            apply_path_overrides(&mut config, dataset_dir, dictionary);
            if propagate_missing {
                config.encoding.missing_categories = MissingCategories::Propagate;
            }
            cmd_encode(&config);
        }
        Commands::Run {
            dataset_dir,
            dictionary,
        } => {
            apply_path_overrides(&mut config, dataset_dir, dictionary);
            cmd_clean(&config);
            cmd_encode(&config);
        }
        Commands::InitConfig { output, force } => {
            cmd_init_config(&output, force, &config);
        }
    }
}

fn apply_path_overrides(
    config: &mut PipelineConfig,
    dataset_dir: Option<PathBuf>,
    dictionary: Option<PathBuf>,
) {
    if let Some(dir) = dataset_dir {
        config.paths.dataset_dir = dir;
    }
    if let Some(path) = dictionary {
        config.paths.dictionary = path;
    }
}

fn cmd_clean(config: &PipelineConfig) {
    use crate::processors::location;

    let start = Instant::now();

    println!("Cleaning listing locations...");
    println!("Dataset directory: {}", config.paths.dataset_dir.display());

    let spinner = create_spinner("Converting coordinates to polar features...");

    match location::run_location_job(&config.paths, &config.location) {
        Ok((test, train)) => {
            spinner.finish_and_clear();

            print_summary(
                "Location Cleaning Complete",
                &[
                    ("Dataset directory", config.paths.dataset_dir.display().to_string()),
                    ("Test rows", test.rows.to_string()),
                    ("Train rows", train.rows.to_string()),
                    ("Redacted", (test.redacted + train.redacted).to_string()),
                    ("Overridden", (test.overridden + train.overridden).to_string()),
                    ("Converted", (test.converted + train.converted).to_string()),
                    ("Columns dropped", train.dropped_columns.to_string()),
                    ("Duration", format!("{:.2?}", start.elapsed())),
                ],
            );
        }
        Err(e) => {
            spinner.finish_and_clear();
            error!("Location cleaning failed: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn cmd_encode(config: &PipelineConfig) {
    use crate::processors::encoding;

    let start = Instant::now();

    println!("Encoding categorical features...");
    println!("Dataset directory: {}", config.paths.dataset_dir.display());
    println!("Dictionary: {}", config.paths.dictionary_path().display());

    let spinner = create_spinner("One-hot encoding listing columns...");

    match encoding::run_encoding_job(&config.paths, &config.encoding) {
        Ok(stats) => {
            spinner.finish_and_clear();

            let skipped = if stats.skipped_columns.is_empty() {
                "none".to_string()
            } else {
                stats.skipped_columns.join(", ")
            };

            print_summary(
                "Categorical Encoding Complete",
                &[
                    ("Train rows", stats.train_rows.to_string()),
                    ("Test rows", stats.test_rows.to_string()),
                    ("Encoded columns", stats.encoded_columns.len().to_string()),
                    ("Indicator columns", stats.indicator_columns.to_string()),
                    ("Output columns", stats.output_columns.to_string()),
                    ("Missing cells", stats.missing_cells.to_string()),
                    ("Unparsed dates", stats.unparsed_dates.to_string()),
                    ("Skipped", skipped),
                    ("Duration", format!("{:.2?}", start.elapsed())),
                ],
            );
        }
        Err(e) => {
            spinner.finish_and_clear();
            error!("Categorical encoding failed: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn cmd_init_config(output: &Path, force: bool, config: &PipelineConfig) {
    if output.exists() && !force {
        error!(
            "{} already exists, pass --force to overwrite",
            output.display()
        );
        std::process::exit(1);
    }

    match config.to_yaml(output) {
        Ok(()) => println!("Wrote configuration to {}", output.display()),
        Err(e) => {
            error!("Failed to write {}: {}", output.display(), e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_encode_flags() {
        let cli = Cli::try_parse_from([
            "listing-features",
            "-vv",
            "encode",
            "--dataset-dir",
            "/data",
            "--propagate-missing",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Encode {
                dataset_dir,
                dictionary,
                propagate_missing,
            } => {
                assert_eq!(dataset_dir, Some(PathBuf::from("/data")));
                assert!(dictionary.is_none());
                assert!(propagate_missing);
            }
            _ => panic!("Expected encode subcommand"),
        }
    }

    #[test]
    fn test_apply_path_overrides() {
        let mut config = PipelineConfig::default();
        apply_path_overrides(
            &mut config,
            Some(PathBuf::from("/data")),
            Some(PathBuf::from("/out/dict.json")),
        );
        assert_eq!(config.paths.dataset_dir, PathBuf::from("/data"));
        assert_eq!(config.paths.dictionary_path(), PathBuf::from("/out/dict.json"));
    }
}
