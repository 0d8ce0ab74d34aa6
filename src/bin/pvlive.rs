use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use pvlive::{EntityType, ExtraValue, Period, PvLive, Query, Record};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pvlive")]
#[command(about = "Download solar PV generation estimates from Sheffield Solar PV_Live")]
#[command(version)]
struct Cli {
    /// Entity type: `pes` (PES region, 0 = national) or `gsp`
    #[arg(short = 't', long, default_value = "pes", global = true)]
    entity_type: EntityType,

    /// Entity id
    #[arg(short = 'i', long, default_value_t = 0, global = true)]
    entity_id: u32,

    /// Comma-separated extra fields, e.g. `ucl_mw,lcl_mw,installedcapacity_mwp`
    #[arg(short = 'e', long, default_value = "", global = true)]
    extra_fields: String,

    /// Resolution in minutes (5 or 30)
    #[arg(short, long, default_value_t = 30, global = true)]
    period: u32,

    /// Override the API base URL
    #[arg(long, global = true)]
    url: Option<String>,

    /// Write CSV to this file instead of stdout
    #[arg(short, long, global = true)]
    out: Option<PathBuf>,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Most recent estimate
    Latest,
    /// Estimate at a point in time
    AtTime {
        /// RFC 3339 timestamp, e.g. 2018-06-03T12:30:00Z
        time: DateTime<Utc>,
    },
    /// All estimates in a closed time range
    Between {
        /// RFC 3339 start timestamp
        start: DateTime<Utc>,
        /// RFC 3339 end timestamp
        end: DateTime<Utc>,
    },
    /// Highest estimate of a UTC day
    DayPeak {
        /// YYYY-MM-DD
        date: NaiveDate,
    },
    /// Energy generated on a UTC day, in MWh
    DayEnergy {
        /// YYYY-MM-DD
        date: NaiveDate,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet);

    let client = PvLive::new(cli.url.clone(), None).context("failed to configure PV_Live client")?;
    let query = Query::new()
        .entity(cli.entity_type, cli.entity_id)
        .period(Period::try_from(cli.period)?)
        .with_extra_fields(&cli.extra_fields)?;

    let records: Vec<Record> = match cli.command {
        Commands::Latest => client.latest(&query)?.into_iter().collect(),
        Commands::AtTime { time } => client.at_time(time, &query)?.into_iter().collect(),
        Commands::Between { start, end } => client.between(start, end, &query)?,
        Commands::DayPeak { date } => client.day_peak(date, &query)?.into_iter().collect(),
        Commands::DayEnergy { date } => {
            let energy = client.day_energy(date, &query)?;
            let mut out = open_output(cli.out.as_ref())?;
            writeln!(out, "{energy}")?;
            return Ok(());
        }
    };

    if records.is_empty() {
        tracing::warn!("PV_Live returned no data for this query");
    }
    tracing::info!(rows = records.len(), "writing CSV");

    let out = open_output(cli.out.as_ref())?;
    write_csv(out, &query, &records).context("failed to write CSV")
}

fn init_tracing(quiet: bool) {
    let default = if quiet { "pvlive=warn" } else { "pvlive=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn open_output(path: Option<&PathBuf>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(p) => Box::new(
            std::fs::File::create(p).with_context(|| format!("failed to create {}", p.display()))?,
        ),
        None => Box::new(std::io::stdout().lock()),
    })
}

fn write_csv(out: impl Write, query: &Query, records: &[Record]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);

    let mut header = vec![
        query.entity_type.id_column().to_string(),
        "datetime_gmt".to_string(),
        "generation_mw".to_string(),
    ];
    header.extend(query.extra_fields.iter().map(|f| f.name().to_string()));
    wtr.write_record(&header)?;

    for record in records {
        let (id, datetime_gmt, generation_mw) = record.tuple();
        let mut row = vec![
            id.to_string(),
            datetime_gmt,
            if generation_mw.is_nan() {
                String::new()
            } else {
                generation_mw.to_string()
            },
        ];
        row.extend(record.extras().map(|(_, v)| match v {
            Some(ExtraValue::Float(f)) => f.to_string(),
            Some(ExtraValue::Integer(i)) => i.to_string(),
            None => String::new(),
        }));
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}
