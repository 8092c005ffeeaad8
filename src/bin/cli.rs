// src/bin/cli.rs

//! coursescan: university course assessment scraper CLI
//!
//! Local entry point for single extractions, delivery lookups, batch runs
//! and cache maintenance.

use std::fs;
use std::sync::Arc;

use chrono::Datelike;
use clap::{Parser, Subcommand};

use coursescan::cache::ScrapeCache;
use coursescan::error::{AppError, Result};
use coursescan::fetch::HttpFetcher;
use coursescan::models::{
    Config, DeliveryMode, Institution, SemesterSelection, SemesterType,
};
use coursescan::pipeline::{BatchRequest, Pipeline};

#[derive(Parser, Debug)]
#[command(
    name = "coursescan",
    version,
    about = "University course assessment scraper"
)]

/// CLI Arguments
struct Cli {
    #[arg(short, long, default_value = "data/config.toml")]
    config: String,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// CLI Commands
#[derive(Subcommand, Debug)]
enum Command {
    /// Extract the assessment structure of one course
    Scrape {
        /// Course or unit code, e.g. CSSE1001
        course: String,
        #[arg(short, long, default_value = "uq")]
        institution: String,
        /// Offering year, e.g. 2026 (requires --semester and --delivery)
        #[arg(long)]
        year: Option<i32>,
        /// Offering semester: sem1, sem2 or summer
        #[arg(long)]
        semester: Option<String>,
        /// Delivery mode: internal or external
        #[arg(long)]
        delivery: Option<String>,
        /// Bypass the cache for this run
        #[arg(long)]
        no_cache: bool,
    },
    /// List delivery modes offered for a course in one semester
    Deliveries {
        course: String,
        year: i32,
        /// Semester: sem1, sem2 or summer
        semester: String,
        #[arg(short, long, default_value = "uq")]
        institution: String,
    },
    /// Extract a batch of courses from a JSON request file
    Batch {
        /// JSON array of {institution, course, selection?} requests
        file: String,
    },
    /// Delete cached entries older than the cutoff year
    Evict {
        /// Entries with an embedded year before this are deleted;
        /// defaults to the previous year
        #[arg(long)]
        cutoff_year: Option<i32>,
    },
    /// Validate the configuration file
    Validate,
}

fn parse_institution(text: &str) -> Result<Institution> {
    Institution::parse(text)
        .ok_or_else(|| AppError::validation(format!("unknown institution '{text}'")))
}

fn parse_selection(
    year: Option<i32>,
    semester: Option<&str>,
    delivery: Option<&str>,
) -> Result<Option<SemesterSelection>> {
    match (year, semester, delivery) {
        (None, None, None) => Ok(None),
        (Some(year), Some(semester), Some(delivery)) => {
            let semester = SemesterType::parse(semester)
                .ok_or_else(|| AppError::validation(format!("unknown semester '{semester}'")))?;
            let delivery = DeliveryMode::parse(delivery)
                .ok_or_else(|| AppError::validation(format!("unknown delivery '{delivery}'")))?;
            Ok(Some(SemesterSelection::new(year, semester, delivery)))
        }
        _ => Err(AppError::validation(
            "--year, --semester and --delivery must be given together",
        )),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Main entry point
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = Config::load_or_default(&cli.config);

    match cli.command {
        Command::Scrape {
            course,
            institution,
            year,
            semester,
            delivery,
            no_cache,
        } => {
            let institution = parse_institution(&institution)?;
            let selection = parse_selection(year, semester.as_deref(), delivery.as_deref())?;
            let pipeline = if no_cache {
                config.validate()?;
                let fetcher =
                    Arc::new(HttpFetcher::new(&config.scraper, config.relay.clone())?);
                Pipeline::new(config, ScrapeCache::disabled(), fetcher)
            } else {
                Pipeline::from_config(config)?
            };
            let result = pipeline.extract(institution, &course, selection).await?;
            print_json(&result)?;
        }
        Command::Deliveries {
            course,
            year,
            semester,
            institution,
        } => {
            let institution = parse_institution(&institution)?;
            let semester = SemesterType::parse(&semester)
                .ok_or_else(|| AppError::validation(format!("unknown semester '{semester}'")))?;
            let pipeline = Pipeline::from_config(config)?;
            let result = pipeline
                .list_deliveries(institution, &course, year, semester)
                .await?;
            print_json(&result)?;
        }
        Command::Batch { file } => {
            let raw = fs::read_to_string(&file)?;
            let requests: Vec<BatchRequest> = serde_json::from_str(&raw)?;
            let pipeline = Pipeline::from_config(config)?;
            let summary = pipeline.run_batch(requests).await;
            println!(
                "Batch complete: {} succeeded, {} failed",
                summary.succeeded, summary.failed
            );
            for outcome in summary.outcomes.iter().filter(|o| o.result.is_err()) {
                if let Err(e) = &outcome.result {
                    eprintln!(
                        "  {} {}: {e}",
                        outcome.request.institution.as_str(),
                        outcome.request.course
                    );
                }
            }
        }
        Command::Evict { cutoff_year } => {
            let cutoff = cutoff_year.unwrap_or_else(|| chrono::Utc::now().year() - 1);
            let pipeline = Pipeline::from_config(config)?;
            let summary = pipeline.evict_stale(cutoff).await;
            println!(
                "Evicted {} of {} scanned entries ({} failure memos cleared)",
                summary.deleted, summary.scanned, summary.memo_removed
            );
        }
        Command::Validate => {
            config.validate()?;
            println!("Configuration OK");
        }
    }

    Ok(())
}
