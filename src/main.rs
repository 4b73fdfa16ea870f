use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::*;
use env_logger::{Builder, Env};
use log::{error, info, Level};

use calorie_scan::image_loader::load_image;
use calorie_scan::report::render_text;
use calorie_scan::{CalorieScanner, FoodCategory, PipelineConfig, PortionSize, Result};

#[derive(Subcommand)]
enum Commands {
    /// Detect food items in a photo and estimate their calories
    Analyze {
        /// Image file (PNG, JPEG, GIF, WebP, ...)
        image: PathBuf,

        /// Pipeline configuration JSON
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the food table
    Foods {
        /// Only show one category (fruits, vegetables, proteins, ...)
        #[arg(long)]
        category: Option<FoodCategory>,
    },

    /// Estimate calories for a named food
    Estimate {
        name: String,

        /// Detection confidence in [0, 1]
        #[arg(long, default_value_t = 1.0)]
        confidence: f32,

        /// small, medium, large or extra_large
        #[arg(long, default_value_t = PortionSize::Medium)]
        portion: PortionSize,
    },

    /// Report sharpness, brightness and contrast of a photo
    Quality { image: PathBuf },

    /// Write the default pipeline configuration as JSON
    Config { output: PathBuf },
}

#[derive(Parser)]
#[command(name = "calorie-scan")]
#[command(about = "Estimate calories in food photos")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    verbosity: clap_verbosity_flag::Verbosity<clap_verbosity_flag::ErrorLevel>,

    #[command(subcommand)]
    command: Commands,
}

fn get_log_level_from_verbosity(
    verbosity: &clap_verbosity_flag::Verbosity<clap_verbosity_flag::ErrorLevel>,
) -> log::LevelFilter {
    if verbosity.is_silent() {
        return log::LevelFilter::Error;
    }
    // default -> WARN, -v -> INFO, -vv -> DEBUG, -vvv -> TRACE
    match verbosity.log_level_filter() {
        log::LevelFilter::Off => log::LevelFilter::Off,
        log::LevelFilter::Error => log::LevelFilter::Warn,
        log::LevelFilter::Warn => log::LevelFilter::Info,
        log::LevelFilter::Info => log::LevelFilter::Debug,
        log::LevelFilter::Debug | log::LevelFilter::Trace => log::LevelFilter::Trace,
    }
}

fn init_logging(cli: &Cli) {
    let use_env = !cli.verbosity.is_present() && std::env::var_os("RUST_LOG").is_some();

    let mut logger = if use_env {
        Builder::from_env(Env::default())
    } else {
        let mut b = Builder::new();
        b.filter_level(get_log_level_from_verbosity(&cli.verbosity));
        b
    };

    logger
        .format(|buf, record| {
            let level_str = match record.level() {
                Level::Error => "ERROR".red().bold().to_string(),
                Level::Warn => "WARN".yellow().to_string(),
                Level::Info => "INFO".green().to_string(),
                Level::Debug => "DEBUG".blue().to_string(),
                Level::Trace => "TRACE".magenta().to_string(),
            };
            writeln!(buf, "[{}] {}", level_str, record.args())
        })
        .init();
}

fn analyze(image: &Path, config: Option<&Path>, json: bool) -> Result<()> {
    let scanner = match config {
        Some(path) => {
            info!("Using configuration {}", path.display());
            CalorieScanner::from_config_file(path)?
        }
        None => CalorieScanner::new(),
    };

    let result = scanner.analyze_path(image)?;
    if json {
        let text = serde_json::to_string_pretty(&result)
            .map_err(|e| calorie_scan::AnalysisError::ProcessingError(e.to_string()))?;
        println!("{}", text);
    } else {
        print!("{}", render_text(&result));
    }
    Ok(())
}

fn list_foods(category: Option<FoodCategory>) {
    let scanner = CalorieScanner::new();
    let estimator = scanner.estimator();
    let entries: Vec<_> = match category {
        Some(category) => estimator.foods_by_category(category),
        None => estimator.food_database().entries().collect(),
    };

    for entry in entries {
        println!(
            "{:<20} {:>6.0} kcal/100g  {}",
            entry.name, entry.calories_per_100g, entry.category
        );
    }
}

fn estimate(name: &str, confidence: f32, portion: PortionSize) -> Result<()> {
    let scanner = CalorieScanner::new();
    let estimator = scanner.estimator();
    let calories = estimator.try_estimate_calories(name, confidence, portion)?;

    match estimator.nutritional_info(name) {
        Some(info) => println!(
            "{} ({}, {:.0} kcal/100g)",
            info.name.bold(),
            info.category,
            info.calories_per_100g
        ),
        None => println!("{} (not in table, using closest match)", name.bold()),
    }
    println!("  {} portion: {:.1} kcal", portion, calories);
    Ok(())
}

fn quality(image: &Path) -> Result<()> {
    let mat = load_image(image)?;
    let assessment = CalorieScanner::new().processor().validate_image_quality(&mat);

    let verdict = if assessment.is_good_quality {
        "good".green()
    } else {
        "poor".red()
    };
    println!("Quality:    {} (score {:.2})", verdict, assessment.quality_score);
    println!("Sharpness:  {:.1}", assessment.sharpness);
    println!("Brightness: {:.1}", assessment.brightness);
    println!("Contrast:   {:.1}", assessment.contrast);
    Ok(())
}

fn write_config(output: &Path) -> Result<()> {
    PipelineConfig::default().to_json_file(output)?;
    info!("Configuration saved to {}", output.display());
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    let outcome = match &cli.command {
        Commands::Analyze {
            image,
            config,
            json,
        } => analyze(image, config.as_deref(), *json),
        Commands::Foods { category } => {
            list_foods(*category);
            Ok(())
        }
        Commands::Estimate {
            name,
            confidence,
            portion,
        } => estimate(name, *confidence, *portion),
        Commands::Quality { image } => quality(image),
        Commands::Config { output } => write_config(output),
    };

    if let Err(e) = outcome {
        error!("{}", e.user_message());
        std::process::exit(1);
    }
}
