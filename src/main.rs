use anyhow::Result;
use clap::Parser;
use cvescan::{
    cache::CacheConfig,
    config::Config,
    fetch::Fetcher,
    model::{ExitStatus, OutputMode, Priority},
    options::{Options, RawArguments},
    output, plan,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cvescan")]
#[command(
    author,
    version,
    about = "Check this system or an Ubuntu cloud image manifest against the Ubuntu CVE Tracker"
)]
struct Cli {
    /// Report whether this system is vulnerable to a specific CVE
    #[arg(short, long, value_name = "CVE-IDENTIFIER")]
    cve: Option<String>,

    /// Lowest CVE priority to report: 'critical' only critical CVEs,
    /// 'high' critical and high (default), 'medium' critical, high and medium,
    /// 'all' every CVE
    #[arg(short, long, value_enum)]
    priority: Option<Priority>,

    /// Script mode, used with '-c <cve-identifier>': print nothing, exit 0 if
    /// not vulnerable, 1 if vulnerable without a fix, 2 if a fix is available
    #[arg(short, long)]
    silent: bool,

    /// Scan the packages listed in an Ubuntu cloud image manifest file
    /// instead of this host
    #[arg(short, long, value_name = "FILE", short_alias = 'f', alias = "file")]
    manifest: Option<PathBuf>,

    /// Nagios/NRPE mode: OK, WARNING, CRITICAL or UNKNOWN with exit codes 0-3
    #[arg(short, long)]
    nagios: bool,

    /// Show URLs to the Ubuntu CVE Tracker instead of bare CVE IDs
    #[arg(long = "show-links")]
    show_links: bool,

    /// Output in CSV format
    #[arg(long)]
    csv: bool,

    /// Output in JSON format
    #[arg(long = "JSON")]
    json: bool,

    /// Use this Ubuntu CVE Tracker database file instead of downloading one
    #[arg(long, value_name = "FILE")]
    db: Option<PathBuf>,

    /// Also report CVEs for which no fix is available yet
    #[arg(long)]
    unresolved: bool,

    /// Enable verbose messages
    #[arg(short, long)]
    verbose: bool,

    /// Use experimental data, including updates only available with
    /// Ubuntu Advantage ESM Apps
    #[arg(short = 'x', long)]
    experimental: bool,
}

impl From<Cli> for RawArguments {
    fn from(cli: Cli) -> Self {
        RawArguments {
            cve: cli.cve,
            priority: cli.priority,
            silent: cli.silent,
            manifest: cli.manifest,
            nagios: cli.nagios,
            show_links: cli.show_links,
            csv: cli.csv,
            json: cli.json,
            db: cli.db,
            unresolved: cli.unresolved,
            verbose: cli.verbose,
            experimental: cli.experimental,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return usage_exit_status(&e).into();
        }
    };
    init_logging(cli.verbose);

    match run(cli.into()).await {
        Ok(status) => status.into(),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitStatus::Unknown.into()
        }
    }
}

/// Help and version requests succeed; any other usage error is UNKNOWN so a
/// Nagios check line with a typo never reads as CRITICAL.
fn usage_exit_status(err: &clap::Error) -> ExitStatus {
    if err.exit_code() == 0 {
        ExitStatus::Ok
    } else {
        ExitStatus::Unknown
    }
}

fn init_logging(verbose: bool) {
    let log_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

async fn run(args: RawArguments) -> Result<ExitStatus> {
    let options = Options::new(args)?;
    let config = Config::load()?;

    let cache = CacheConfig::resolve(&config);
    debug!(root = %cache.root().display(), "cache root");
    let fetcher = Fetcher::new(cache);

    let progress = download_spinner(&options);
    let prepared = plan::prepare(options, &config, &fetcher).await;
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    output::print_plan(&prepared?)?;
    Ok(ExitStatus::Ok)
}

/// Spinner shown while the database downloads, for interactive text output only.
fn download_spinner(options: &Options) -> Option<ProgressBar> {
    let interactive =
        options.output == OutputMode::Text && !options.silent && !options.nagios_mode;
    if !interactive || !options.download_db {
        return None;
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Downloading vulnerability database...");
    Some(pb)
}
