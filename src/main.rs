mod api;
mod server;

use admit_fit::config::{DataConfig, EngineConfig};
use admit_fit::institutions::InstitutionTable;
use admit_fit::scoring::FitResult;
use admit_fit::seats::{SeatRow, SeatTable};
use admit_fit::{format_float, format_percent, recommend, telemetry, Normalizer, RawProfile};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::api::{selection, validate_raw_profile, ApiEligibilityRequest};

#[derive(Parser)]
#[command(name = "admit-fit", about = "Admission fit scoring and merit-list eligibility")]
struct Cli {
    /// Config file (defaults to $ADMIT_FIT_CONFIG_PATH or config/admit-fit.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Score a profile against every institution and band the results
    Recommend(RecommendArgs),
    /// List merit-list seats a rank is eligible for
    Eligible(EligibleArgs),
    /// Browse institutions by global rank and the per-country weights
    Institutions(InstitutionsArgs),
    /// Serve the JSON API
    Serve(ServeArgs),
    /// Write the effective configuration to a TOML file
    InitConfig {
        #[arg(long, default_value = "config/admit-fit.toml")]
        path: PathBuf,
    },
}

#[derive(Args, Debug, Clone, Default)]
struct DataArgs {
    /// Institution table with per-row weights
    #[arg(long)]
    institutions: Option<PathBuf>,
    /// Per-country weights table, joined onto --universities
    #[arg(long, requires = "universities")]
    country_weights: Option<PathBuf>,
    #[arg(long, requires = "country_weights")]
    universities: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct RecommendArgs {
    #[arg(long, default_value_t = 0.0)]
    class10: f64,
    #[arg(long, default_value_t = 0.0)]
    class12: f64,
    #[arg(long, default_value_t = 0.0)]
    sat: f64,
    /// Subject test / AP score in percent, repeat up to 3 times
    #[arg(long = "aptitude")]
    aptitude: Vec<f64>,
    #[arg(long, default_value_t = 0)]
    eca: u32,
    #[arg(long, default_value_t = 0)]
    co_curricular: u32,
    #[arg(long, default_value_t = 0)]
    internships: u32,
    #[arg(long)]
    community_service: bool,
    #[arg(long)]
    research: bool,
    #[arg(long)]
    essay_rating: Option<u8>,
    #[arg(long)]
    interview_rating: Option<u8>,
    /// Restrict to these countries; "All" or nothing selects every country
    #[arg(long = "country")]
    countries: Vec<String>,
    #[arg(long)]
    mode: Option<String>,
    #[arg(long)]
    window: Option<usize>,
    #[command(flatten)]
    data: DataArgs,
    #[arg(long)]
    json: bool,
    /// Also print the full ranked list
    #[arg(long)]
    details: bool,
}

#[derive(Args, Debug, Clone)]
struct EligibleArgs {
    #[arg(long)]
    seats: Option<PathBuf>,
    #[arg(long)]
    category: String,
    #[arg(long, allow_negative_numbers = true)]
    rank: i64,
    #[arg(long)]
    quota: Option<String>,
    #[arg(long)]
    gender: Option<String>,
    #[arg(long = "branch")]
    branches: Vec<String>,
    #[arg(long = "institute")]
    institutes: Vec<String>,
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug, Clone)]
struct InstitutionsArgs {
    #[arg(long = "country")]
    countries: Vec<String>,
    #[command(flatten)]
    data: DataArgs,
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    #[arg(long, default_value_t = 8787)]
    port: u16,
    #[command(flatten)]
    data: DataArgs,
    #[arg(long)]
    seats: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    load_dotenv();
    if let Err(err) = run().await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let cli = Cli::parse();
    let (config, _) = EngineConfig::load(cli.config)?;
    if let Err(err) = telemetry::init(&config.logging) {
        eprintln!("warning: {}", err);
    }

    match cli.command {
        Command::Recommend(args) => run_recommend(args, &config),
        Command::Eligible(args) => run_eligible(args, &config),
        Command::Institutions(args) => run_institutions(args, &config),
        Command::Serve(args) => {
            let institutions = load_institutions(&args.data, &config.data)?;
            let seats = match args.seats.as_ref().or(config.data.seats.as_ref()) {
                Some(path) if path.exists() => load_seats(path)?,
                _ => {
                    warn!("no seat table configured, eligibility will return no rows");
                    SeatTable::default()
                }
            };
            let state = server::AppState::new(
                institutions,
                seats,
                Normalizer::new(config.rules.clone()),
                config.tiers.clone(),
            );
            server::serve(args, state).await
        }
        Command::InitConfig { path } => {
            config.write(&path)?;
            println!("Wrote {}", path.display());
            Ok(())
        }
    }
}

fn run_recommend(args: RecommendArgs, config: &EngineConfig) -> Result<(), String> {
    let raw = RawProfile {
        class10_percent: args.class10,
        class12_percent: args.class12,
        sat_score: args.sat,
        aptitude_scores: args.aptitude,
        extracurriculars: args.eca,
        co_curriculars: args.co_curricular,
        internships: args.internships,
        community_service: args.community_service,
        research: args.research,
        essay_rating: args.essay_rating,
        interview_rating: args.interview_rating,
    };
    validate_raw_profile(&raw)?;

    let tiers = config.tiers.with_overrides(args.mode.as_deref(), args.window)?;
    let classifier = tiers.classifier();
    let table = load_institutions(&args.data, &config.data)?;
    let countries = selection(args.countries);

    let profile = Normalizer::new(config.rules.clone()).normalize(&raw);
    let recommendation = recommend(&table, &profile, &countries, &classifier);

    if args.json {
        return print_json(&recommendation);
    }

    println!("Profile scores:");
    for (criterion, value) in recommendation.profile.iter() {
        println!("  {}: {}", criterion, format_percent(value));
    }

    if let Some(boundary) = recommendation.tiers.boundary.as_ref() {
        println!("\nClosest reach: {}", boundary.name);
    }

    for (tier, band) in recommendation.tiers.iter() {
        println!("\n{} ({})", tier.label(), band.len());
        if band.is_empty() {
            println!("  no matches");
        }
        for result in band {
            println!("  {}", describe_result(result));
        }
    }

    if args.details {
        println!("\nAll institutions by fit:");
        for (idx, result) in recommendation.results.iter().enumerate() {
            println!("  {:>3}. {}", idx + 1, describe_result(result));
        }
    }

    Ok(())
}

fn run_eligible(args: EligibleArgs, config: &EngineConfig) -> Result<(), String> {
    let query = ApiEligibilityRequest {
        category: Some(args.category),
        rank: Some(args.rank),
        quota: args.quota,
        gender: args.gender,
        branches: Some(args.branches),
        institutes: Some(args.institutes),
    }
    .into_query()?;

    let path = args
        .seats
        .or_else(|| config.data.seats.clone())
        .ok_or_else(|| "missing seat table: pass --seats or set data.seats".to_string())?;
    let table = load_seats(&path)?;

    let rows = table.filter(&query);
    if args.json {
        return print_json(&rows);
    }

    if rows.is_empty() {
        println!("No seats match rank {} in category {}.", query.rank, query.category);
        return Ok(());
    }
    println!("{} eligible seats:", rows.len());
    for row in &rows {
        println!("  {}", describe_seat(row));
    }
    Ok(())
}

fn run_institutions(args: InstitutionsArgs, config: &EngineConfig) -> Result<(), String> {
    let table = load_institutions(&args.data, &config.data)?;
    let countries = selection(args.countries);
    let rows = table.by_global_rank(&countries);

    if args.json {
        return print_json(&rows);
    }

    let weights: Vec<_> = table
        .country_weights()
        .iter()
        .filter(|entry| countries.is_empty() || countries.contains(&entry.country))
        .collect();
    if !weights.is_empty() {
        println!("Admission weightage by country:");
        for entry in weights {
            let parts: Vec<String> = entry
                .weights
                .iter()
                .map(|(criterion, weight)| format!("{} {}", criterion, format_percent(*weight)))
                .collect();
            println!("  {}: {}", entry.country, parts.join(" | "));
        }
        println!();
    }

    println!("Institutions by global rank:");
    for row in rows {
        println!(
            "  {} ({}) rank {} | required {}",
            row.name,
            row.country,
            row.global_rank
                .map(|rank| rank.to_string())
                .unwrap_or_else(|| "-".to_string()),
            row.required_score
                .map(|score| format!("{}%", format_float(score, 1)))
                .unwrap_or_else(|| "-".to_string()),
        );
    }
    Ok(())
}

fn load_institutions(args: &DataArgs, data: &DataConfig) -> Result<InstitutionTable, String> {
    let split = match (&args.country_weights, &args.universities) {
        (Some(weights), Some(universities)) => Some((weights, universities)),
        _ if args.institutions.is_some() => None,
        _ => data.country_weights.as_ref().zip(data.universities.as_ref()),
    };

    if let Some((weights, universities)) = split {
        return InstitutionTable::from_split_paths(weights, universities).map_err(|err| {
            format!(
                "failed to load {} and {}: {}",
                weights.display(),
                universities.display(),
                err
            )
        });
    }

    let path = args
        .institutions
        .as_ref()
        .or(data.institutions.as_ref())
        .ok_or_else(|| "missing institution table: pass --institutions".to_string())?;
    InstitutionTable::from_path(path)
        .map_err(|err| format!("failed to load {}: {}", path.display(), err))
}

fn load_seats(path: &Path) -> Result<SeatTable, String> {
    SeatTable::from_path(path).map_err(|err| format!("failed to load {}: {}", path.display(), err))
}

fn describe_result(result: &FitResult) -> String {
    let rank = result
        .global_rank
        .map(|rank| format!("rank {}", rank))
        .unwrap_or_else(|| "unranked".to_string());
    let required = result
        .required_score
        .map(|score| format!(" | required {}%", format_float(score, 2)))
        .unwrap_or_default();
    format!(
        "{} ({}, {}) | fit {}%{}",
        result.name,
        result.country,
        rank,
        format_float(result.fit_score, 2),
        required
    )
}

fn describe_seat(row: &SeatRow) -> String {
    let rank = |value: Option<u32>| {
        value
            .map(|rank| rank.to_string())
            .unwrap_or_else(|| "-".to_string())
    };
    format!(
        "{} | {} | {} | {} | {} | open {} close {}",
        row.institute,
        row.branch,
        row.quota,
        row.seat_category,
        row.gender,
        rank(row.opening_rank),
        rank(row.closing_rank)
    )
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), String> {
    let payload = serde_json::to_string_pretty(value)
        .map_err(|err| format!("failed to serialize output: {}", err))?;
    println!("{}", payload);
    Ok(())
}

fn load_dotenv() {
    let _ = dotenvy::dotenv();
}
