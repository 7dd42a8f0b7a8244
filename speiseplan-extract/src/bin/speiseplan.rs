use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use chrono::{Datelike, Local, NaiveDate};
use clap::{Args, Parser, Subcommand, ValueEnum};
use speiseplan_extract::{
    CropLayout, DirectoryPublisher, DocumentUrlCache, ExtractError, ExtractOptions,
    ExtractionReport, ImagePublisher, OverflowPolicy, StrategyKind, daily_dishes,
    dish_file_name, encode_png, extract_weekly_menu_from_path, feedback_message,
    menu_to_csv_string, menu_to_json, render_chat_table, resolve_menu_link, write_menu_csv,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "speiseplan",
    version,
    about = "Extract the weekly cafeteria menu from its PDF"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract the weekly menu from a menu PDF.
    Menu(MenuArgs),
    /// Crop one day's dish images out of the rendered weekly menu.
    Dishes(DishesArgs),
    /// Pick this week's menu PDF out of a list of links.
    Link(LinkArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
    Chat,
}

#[derive(Debug, Args)]
struct MenuArgs {
    /// Input PDF path.
    #[arg(short, long)]
    input: PathBuf,

    /// Output path; prints to stdout when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "csv")]
    format: OutputFormat,

    /// Ordered extraction strategies, e.g. ruled,positional.
    #[arg(long, default_value = "ruled,positional")]
    strategies: String,

    /// Fail a strategy instead of dropping day rows after Friday.
    #[arg(long)]
    strict: bool,

    /// Column clustering tolerance for positional extraction, in points.
    #[arg(long, default_value_t = 10.0)]
    column_tolerance: f64,

    /// CSV delimiter character.
    #[arg(long, default_value = ",")]
    delimiter: char,

    /// Enable verbose warning output.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Args)]
struct DishesArgs {
    /// Rendered weekly menu image.
    #[arg(long)]
    image: PathBuf,

    /// Menu PDF to read dish names from.
    #[arg(long)]
    menu: Option<PathBuf>,

    /// Day to crop as YYYY-MM-DD; defaults to today.
    #[arg(long)]
    date: Option<String>,

    /// Crop geometry as top,left,padding,height,width.
    #[arg(long, default_value = "265,118,9,90,210")]
    layout: String,

    /// Directory the dish images are written to.
    #[arg(long)]
    out_dir: PathBuf,

    /// Public URL the output directory is served under.
    #[arg(long, default_value = "")]
    base_url: String,
}

#[derive(Debug, Args)]
struct LinkArgs {
    /// Reference day as YYYY-MM-DD, repeatable; defaults to today.
    #[arg(long)]
    date: Vec<String>,

    /// Candidate links found on the cafeteria page.
    #[arg(required = true)]
    hrefs: Vec<String>,
}

fn parse_date(value: Option<&str>) -> Result<NaiveDate> {
    match value {
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .with_context(|| format!("invalid date '{value}', expected YYYY-MM-DD")),
        None => Ok(Local::now().date_naive()),
    }
}

fn parse_options(args: &MenuArgs) -> Result<ExtractOptions> {
    let strategies = StrategyKind::parse_list(&args.strategies)
        .map_err(|error| anyhow!("invalid strategy list: {error}"))
        .context("failed to parse --strategies")?;

    if !args.delimiter.is_ascii() {
        anyhow::bail!("delimiter must be a single ASCII character");
    }

    Ok(ExtractOptions {
        strategies,
        overflow: if args.strict {
            OverflowPolicy::Strict
        } else {
            OverflowPolicy::Truncate
        },
        column_tolerance: args.column_tolerance,
        ..ExtractOptions::default()
    })
}

fn log_report(report: &ExtractionReport, verbose: bool) {
    if report.warnings.is_empty() {
        return;
    }

    eprintln!("warning: {} issue(s) detected", report.warnings.len());
    if verbose {
        for warning in &report.warnings {
            eprintln!(
                "  - {:?} strategy={:?} row={:?} weekday={:?}: {}",
                warning.code, warning.strategy, warning.row, warning.weekday, warning.message
            );
        }
    }
}

fn run_menu(args: &MenuArgs) -> Result<ExtractionReport> {
    let options = parse_options(args)?;
    let extraction = extract_weekly_menu_from_path(&args.input, &options)
        .with_context(|| format!("failed to extract menu from '{}'", args.input.display()))?;
    let delimiter = args.delimiter as u8;

    match (args.format, &args.output) {
        (OutputFormat::Csv, Some(path)) => write_menu_csv(path, &extraction.menu, delimiter)?,
        (format, output) => {
            let rendered = match format {
                OutputFormat::Csv => menu_to_csv_string(&extraction.menu, delimiter)?,
                OutputFormat::Json => menu_to_json(&extraction.menu)?,
                OutputFormat::Chat => render_chat_table(&extraction.menu),
            };
            match output {
                Some(path) => std::fs::write(path, rendered)
                    .with_context(|| format!("failed to write '{}'", path.display()))?,
                None => println!("{}", rendered.trim_end()),
            }
        }
    }

    Ok(extraction.report)
}

fn run_dishes(args: &DishesArgs) -> Result<Vec<String>> {
    let layout = CropLayout::from_str(&args.layout)
        .map_err(|error| anyhow!("invalid crop layout: {error}"))
        .context("failed to parse --layout")?;
    let date = parse_date(args.date.as_deref())?;
    let weekday = date.weekday().num_days_from_monday();

    let menu = match &args.menu {
        Some(path) => {
            extract_weekly_menu_from_path(path, &ExtractOptions::default())
                .with_context(|| format!("failed to extract menu from '{}'", path.display()))?
                .menu
        }
        None => speiseplan_extract::WeeklyMenu::default(),
    };
    let image = image::open(&args.image)
        .with_context(|| format!("failed to open '{}'", args.image.display()))?;
    let daily = daily_dishes(&menu, &image, &layout, weekday)?;

    let publisher = DirectoryPublisher::new(&args.out_dir, args.base_url.clone());
    let mut messages = Vec::new();
    for (index, dish) in daily.images.iter().enumerate() {
        let url = publisher.publish(&dish_file_name(date, index + 1), &encode_png(dish)?)?;
        messages.push(feedback_message(date, index, &url)?);
    }
    if !daily.dishes.is_empty() {
        messages.push(format!(
            "{}: {} | {}",
            daily.weekday.german_name(),
            daily.dishes.meat_text(),
            daily.dishes.vegetarian_text()
        ));
    }
    Ok(messages)
}

/// One resolved link per reference day; days of the same week share a
/// cache entry.
fn run_link(args: &LinkArgs) -> Result<Vec<String>> {
    let days = if args.date.is_empty() {
        vec![parse_date(None)?]
    } else {
        args.date
            .iter()
            .map(|value| parse_date(Some(value)))
            .collect::<Result<Vec<_>>>()?
    };

    let mut cache = DocumentUrlCache::default();
    Ok(days
        .into_iter()
        .filter_map(|day| resolve_menu_link(&mut cache, &args.hrefs, day))
        .collect())
}

fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("speiseplan_extract=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Menu(args) => match run_menu(&args) {
            Ok(report) => {
                log_report(&report, args.verbose);
                if report.day_count > 0 {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::from(2)
                }
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                ExitCode::from(1)
            }
        },
        Commands::Dishes(args) => match run_dishes(&args) {
            Ok(messages) => {
                for message in messages {
                    println!("{message}");
                }
                ExitCode::SUCCESS
            }
            Err(error) => {
                if matches!(
                    error.downcast_ref::<ExtractError>(),
                    Some(ExtractError::Weekend(_))
                ) {
                    eprintln!("no dishes: {error}");
                    return ExitCode::from(2);
                }
                eprintln!("error: {error:#}");
                ExitCode::from(1)
            }
        },
        Commands::Link(args) => match run_link(&args) {
            Ok(hrefs) if hrefs.is_empty() => {
                eprintln!("no cafeteria menu link found");
                ExitCode::from(2)
            }
            Ok(hrefs) => {
                for href in hrefs {
                    println!("{href}");
                }
                ExitCode::SUCCESS
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                ExitCode::from(1)
            }
        },
    }
}
