//! # Leadscout CLI
//!
//! Parses arguments, builds the configuration, runs the selected pipeline
//! stage(s), and emits exactly one JSON result object as the final line on
//! stdout. Logs and progress events go to stderr.

use leadscout::output::progress::{ProgressReporter, StderrReporter};
use leadscout::output::read_records;
use leadscout::query::generate_targets;
use leadscout::transport::RetryingClient;
use leadscout::{
    run_contact_discovery, run_listing_discovery, Config, ConfigBuilder, ErrorReport,
    FetchStrategy, GeoScope, RunReport,
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Which part of the pipeline to run.
#[derive(Copy, Clone, Debug, ValueEnum)]
enum Stage {
    /// Discover business listings only.
    Listings,
    /// Enrich an existing listing file with emails only.
    Emails,
    /// Discover listings, then enrich them.
    Full,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Listings => write!(f, "listings"),
            Stage::Emails => write!(f, "emails"),
            Stage::Full => write!(f, "full"),
        }
    }
}

/// CLI spelling of the contact-crawl fetch strategy.
#[derive(Copy, Clone, Debug, ValueEnum)]
enum FetchArg {
    Render,
    Http,
}

impl From<FetchArg> for FetchStrategy {
    fn from(arg: FetchArg) -> Self {
        match arg {
            FetchArg::Render => FetchStrategy::Render,
            FetchArg::Http => FetchStrategy::Http,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Discovers business listings and their contact emails.",
    long_about = "Leadscout paginates map-search result feeds with a scripted browser to \
collect business listings, then crawls each listing's website for contact \
email addresses, optionally verifying them against the domain's mail exchange."
)]
struct AppArgs {
    /// Pipeline stage to run.
    #[arg(short, long, value_enum, default_value_t = Stage::Full, env = "LEADSCOUT_STAGE")]
    stage: Stage,

    /// Business type to search for (required for listings/full).
    #[arg(short, long, env = "LEADSCOUT_BUSINESS_TYPE")]
    business_type: Option<String>,

    /// Target city (required for listings/full).
    #[arg(long, env = "LEADSCOUT_CITY")]
    city: Option<String>,

    /// State or region code.
    #[arg(long, default_value = "ID", env = "LEADSCOUT_STATE")]
    state: String,

    /// Country code.
    #[arg(long, default_value = "US", env = "LEADSCOUT_COUNTRY")]
    country: String,

    /// Comma-separated ZIP codes; one search target is generated per code.
    #[arg(long, value_delimiter = ',', env = "LEADSCOUT_ZIPS")]
    zips: Option<Vec<String>>,

    /// Latitude for postal-code expansion (requires --longitude).
    #[arg(long, requires = "longitude", env = "LEADSCOUT_LATITUDE")]
    latitude: Option<f64>,

    /// Longitude for postal-code expansion (requires --latitude).
    #[arg(long, requires = "latitude", env = "LEADSCOUT_LONGITUDE")]
    longitude: Option<f64>,

    /// Input listing CSV (emails stage).
    #[arg(short, long, default_value = "listings.csv", env = "LEADSCOUT_INPUT")]
    input: String,

    /// Output path for the listing table.
    #[arg(long, default_value = "listings.csv", env = "LEADSCOUT_LISTINGS_OUTPUT")]
    listings_output: String,

    /// Output path for the enriched table.
    #[arg(short, long, default_value = "enriched.csv", env = "LEADSCOUT_OUTPUT")]
    output: String,

    /// Path to a TOML configuration file. CLI args override file settings.
    #[arg(long, env = "LEADSCOUT_CONFIG")]
    config_file: Option<String>,

    /// Maximum listings to extract per search target.
    #[arg(short, long, env = "LEADSCOUT_MAX_RESULTS")]
    max_results: Option<usize>,

    /// Delay between targets/records, in seconds.
    #[arg(long, env = "LEADSCOUT_RECORD_DELAY")]
    record_delay: Option<f64>,

    /// Fetch strategy for the contact crawl.
    #[arg(long, value_enum, env = "LEADSCOUT_FETCH")]
    fetch: Option<FetchArg>,

    /// Disable DNS/SMTP verification of discovered emails.
    #[arg(long, action = clap::ArgAction::SetTrue, env = "LEADSCOUT_NO_VERIFY")]
    no_verify: bool,

    /// Column of the input CSV holding the website URL.
    #[arg(long, env = "LEADSCOUT_WEBSITE_COLUMN")]
    website_column: Option<String>,

    /// URL of the running WebDriver instance.
    #[arg(long, env = "LEADSCOUT_WEBDRIVER_URL")]
    webdriver_url: Option<String>,

    /// Run the browser with a visible window.
    #[arg(long, action = clap::ArgAction::SetTrue, env = "LEADSCOUT_NO_HEADLESS")]
    no_headless: bool,

    /// GeoNames username for coordinate-based postal-code expansion.
    #[arg(long, env = "LEADSCOUT_GEONAMES_USERNAME")]
    geonames_username: Option<String>,

    /// Sender address used in SMTP verification probes.
    #[arg(long, env = "LEADSCOUT_SMTP_SENDER")]
    smtp_sender: Option<String>,

    /// User agent string for HTTP requests.
    #[arg(long, env = "LEADSCOUT_USER_AGENT")]
    user_agent: Option<String>,

    /// HTTP request timeout in seconds.
    #[arg(long, env = "LEADSCOUT_REQUEST_TIMEOUT")]
    request_timeout: Option<u64>,

    /// SMTP connection/command timeout in seconds.
    #[arg(long, env = "LEADSCOUT_SMTP_TIMEOUT")]
    smtp_timeout: Option<u64>,

    /// DNS resolution timeout in seconds.
    #[arg(long, env = "LEADSCOUT_DNS_TIMEOUT")]
    dns_timeout: Option<u64>,

    /// Comma-separated list of DNS servers for MX lookups.
    #[arg(long, value_delimiter = ',', env = "LEADSCOUT_DNS_SERVERS")]
    dns_servers: Option<Vec<String>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout carries exactly one JSON result object; everything else,
    // including logs and progress, goes to stderr.
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Setting up tracing subscriber failed")?;

    tracing::info!("Leadscout v{} starting...", env!("CARGO_PKG_VERSION"));

    let args = AppArgs::parse();
    tracing::debug!("Parsed CLI arguments: {:?}", args);

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => return fail(format!("Configuration error: {}", e)),
    };
    tracing::debug!("Effective configuration loaded: {:?}", config);

    match execute(&args, &config).await {
        Ok(report) => {
            println!(
                "{}",
                serde_json::to_string(&report).context("Serializing run report failed")?
            );
            Ok(())
        }
        Err(e) => fail(format!("{:#}", e)),
    }
}

/// Emits the structured error object on stdout and exits non-zero.
fn fail(message: String) -> Result<()> {
    tracing::error!("{}", message);
    let report = ErrorReport::new(message);
    let line = serde_json::to_string(&report)
        .unwrap_or_else(|_| r#"{"success":false,"error":"unserializable error"}"#.to_string());
    println!("{}", line);
    std::process::exit(1);
}

fn build_config(args: &AppArgs) -> leadscout::Result<Config> {
    let mut builder = ConfigBuilder::new();

    if let Some(ref path) = args.config_file {
        builder = builder.config_file(path);
    }
    if let Some(v) = args.max_results {
        builder = builder.max_results(v);
    }
    if let Some(v) = args.record_delay {
        builder = builder.record_delay(Duration::from_secs_f64(v));
    }
    if let Some(ref v) = args.website_column {
        builder = builder.website_column(v);
    }
    if let Some(fetch) = args.fetch {
        builder = builder.fetch_strategy(fetch.into());
    }
    if args.no_verify {
        builder = builder.verify_emails(false);
    }
    if let Some(ref url) = args.webdriver_url {
        builder = builder.webdriver_url(url);
    }
    if args.no_headless {
        builder = builder.headless(false);
    }
    if args.geonames_username.is_some() {
        builder = builder.geonames_username(args.geonames_username.as_deref());
    }
    if let Some(ref v) = args.smtp_sender {
        builder = builder.smtp_sender_email(v);
    }
    if let Some(ref v) = args.user_agent {
        builder = builder.user_agent(v);
    }
    if let Some(t) = args.request_timeout {
        builder = builder.request_timeout(Duration::from_secs(t));
    }
    if let Some(t) = args.smtp_timeout {
        builder = builder.smtp_timeout(Duration::from_secs(t));
    }
    if let Some(t) = args.dns_timeout {
        builder = builder.dns_timeout(Duration::from_secs(t));
    }
    if let Some(ref servers) = args.dns_servers {
        if !servers.is_empty() {
            builder = builder.dns_servers(servers.clone());
        }
    }

    builder.build()
}

async fn execute(args: &AppArgs, config: &Config) -> Result<RunReport> {
    let reporter = StderrReporter;

    match args.stage {
        Stage::Listings => {
            let records = discover_listings(args, config, &reporter).await?;
            Ok(RunReport::new(&records, &args.listings_output, None))
        }
        Stage::Emails => {
            let records = read_records(Path::new(&args.input), config)
                .with_context(|| format!("Reading input file '{}' failed", args.input))?;
            let (records, stats) =
                run_contact_discovery(config, records, &reporter, Path::new(&args.output))
                    .await
                    .context("Contact discovery failed")?;
            Ok(RunReport::new(&records, &args.output, Some(stats)))
        }
        Stage::Full => {
            let records = discover_listings(args, config, &reporter).await?;
            let (records, stats) =
                run_contact_discovery(config, records, &reporter, Path::new(&args.output))
                    .await
                    .context("Contact discovery failed")?;
            Ok(RunReport::new(&records, &args.output, Some(stats)))
        }
    }
}

async fn discover_listings(
    args: &AppArgs,
    config: &Config,
    reporter: &dyn ProgressReporter,
) -> Result<Vec<leadscout::BusinessRecord>> {
    let business_type = args
        .business_type
        .as_deref()
        .context("--business-type is required for the listings stage")?;
    let scope = geo_scope(args)?;

    let client = RetryingClient::new(config).context("Building the HTTP client failed")?;
    let targets = generate_targets(config, &client, business_type, &scope)
        .await
        .context("Generating search targets failed")?;

    run_listing_discovery(config, &targets, reporter, Path::new(&args.listings_output))
        .await
        .context("Listing discovery failed")
}

fn geo_scope(args: &AppArgs) -> Result<GeoScope> {
    let city = args
        .city
        .as_deref()
        .context("--city is required for the listings stage")?
        .to_string();
    let state = args.state.clone();
    let country = args.country.clone();

    if let Some(ref zips) = args.zips {
        let zips: Vec<String> = zips
            .iter()
            .map(|z| z.trim().to_string())
            .filter(|z| !z.is_empty())
            .collect();
        return Ok(GeoScope::ZipCodes {
            city,
            state,
            country,
            zips,
        });
    }
    if let (Some(latitude), Some(longitude)) = (args.latitude, args.longitude) {
        return Ok(GeoScope::Coordinates {
            city,
            state,
            country,
            latitude,
            longitude,
        });
    }
    Ok(GeoScope::City {
        city,
        state,
        country,
    })
}
