use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use annict_season::annict::AnnictClient;
use annict_season::channel::{self, ChannelCategory};
use annict_season::config;
use annict_season::model::{self, SeasonProgramRow, SeasonSlug};
use annict_season::recording::{self, RecordingList};
use annict_season::season::{self, FetchLimits};
use annict_season::selection;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Fetch one Annict season, filter by channel, and write a printable recording list"
)]
struct Args {
    /// Path to YAML config file (built-in defaults when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Broadcast year, 1970-2100
    #[arg(long)]
    year: String,

    /// spring / summer / autumn / winter
    #[arg(long)]
    season: String,

    /// Keep only this channel (repeatable)
    #[arg(long = "channel")]
    channels: Vec<String>,

    /// Keep every channel of this category: national / local / other (repeatable)
    #[arg(long = "category")]
    categories: Vec<ChannelCategory>,

    /// Keep only the row with this `title|channel|startedAt` key (repeatable)
    #[arg(long = "select")]
    select: Vec<String>,

    /// Print each row's selection key instead of the table
    #[arg(long, conflicts_with = "json")]
    keys: bool,

    /// Print rows as JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Write the recording list hand-off document (default: recording-list.json)
    #[arg(long, num_args = 0..=1)]
    save_list: Option<Option<PathBuf>>,

    /// Write the printable HTML schedule here
    #[arg(long)]
    html: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(args.config.as_deref())?;
    let token = cfg
        .access_token()
        .ok_or_else(|| anyhow!("{} is not set", config::ACCESS_TOKEN_ENV))?;

    let year = model::parse_year(&args.year).ok_or_else(|| {
        anyhow!(
            "year must be an integer between {} and {}",
            model::MIN_YEAR,
            model::MAX_YEAR
        )
    })?;
    let season: SeasonSlug = args.season.parse()?;

    let annict = AnnictClient::from_config(&cfg.annict)?;
    let cancel = CancellationToken::new();
    let signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted; cancelling fetch");
            signal.cancel();
        }
    });

    let rows = season::fetch_season_programs_with(
        &annict,
        year,
        season,
        &token,
        &FetchLimits::from(&cfg.annict),
        &cancel,
    )
    .await
    .with_context(|| format!("failed to fetch {} {}", year, season))?;

    let fetched = rows.len();
    let rows = selection::narrow_rows(&rows, &args.channels, &args.categories, &args.select);
    if rows.is_empty() && fetched > 0 {
        warn!(fetched, "channel filter or selection matched no rows of this season");
    }
    info!(year, %season, rows = rows.len(), "season rows ready");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else if args.keys {
        for row in &rows {
            println!("{}", selection::row_key(row));
        }
    } else {
        print_table(year, season, &rows);
    }

    if let Some(path) = &args.save_list {
        let path = path.clone().unwrap_or_else(recording::default_list_path);
        RecordingList::new(rows.clone())
            .save(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "recording list saved");
    }

    if let Some(path) = &args.html {
        tokio::fs::write(path, recording::render_html(&rows))
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "printable schedule written");
    }

    Ok(())
}

fn print_table(year: i32, season: SeasonSlug, rows: &[SeasonProgramRow]) {
    println!(
        "{}年 {}（{}）: {} rows",
        year,
        season.label(),
        season.months_label(),
        rows.len()
    );

    let groups = channel::group_by_category(channel::channel_names(rows));
    for (category, names) in groups.iter() {
        println!("  [{}] {}", category.label(), names.join(", "));
    }

    for row in rows {
        let (date, time) = recording::format_started_at(&row.started_at)
            .unwrap_or_else(|| (row.started_at.clone(), String::new()));
        println!("{} {:>5}  {:<16}  {}", date, time, row.channel_name, row.title);
    }
}
