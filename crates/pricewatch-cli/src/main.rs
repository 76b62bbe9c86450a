mod lock;
mod runner;
mod schedule;

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pricewatch_alerts::{AlertStateStore, CycleSummary, ModelDecision};
use pricewatch_core::AppConfig;

use crate::runner::Runner;

#[derive(Debug, Parser)]
#[command(name = "pricewatch")]
#[command(about = "Retail TV price watcher with deduplicated email alerts")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape on a schedule and alert on price drops.
    Run {
        /// Run a single guarded cycle and exit.
        #[arg(long)]
        once: bool,
        /// Alert on every below-threshold model, ignoring previous alerts.
        #[arg(long)]
        force: bool,
        /// Decide but never send alerts or update alert state.
        #[arg(long)]
        dry_run: bool,
    },
    /// Run one cycle and print each model's verdict. Sends nothing.
    Check {
        #[arg(long)]
        force: bool,
    },
    /// Print the persisted alert state.
    State,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let config = pricewatch_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Some(Commands::Run {
            once,
            force,
            dry_run,
        }) => run(config, once, force, dry_run).await,
        Some(Commands::Check { force }) => check(config, force).await,
        Some(Commands::State) => {
            print_state(&AlertStateStore::new(&config.state_path));
            Ok(())
        }
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    }
}

async fn run(config: AppConfig, once: bool, force: bool, dry_run: bool) -> anyhow::Result<()> {
    if config.mail.is_none() && !dry_run {
        anyhow::bail!(
            "mail relay is not configured; set PRICEWATCH_MAIL_RELAY_URL or pass --dry-run"
        );
    }
    tracing::info!(env = %config.env, once, force, dry_run, "pricewatch starting");

    let runner = Runner::new(config, force, !dry_run, true)?;
    if once {
        let summary = runner.guarded_cycle().await?;
        schedule::log_cycle_result(Ok(summary));
        return Ok(());
    }

    schedule::run_loop(&runner).await;
    Ok(())
}

async fn check(config: AppConfig, force: bool) -> anyhow::Result<()> {
    let runner = Runner::new(config, force, false, false)?;
    let summary = runner.cycle().await?;
    print_check(&summary);
    Ok(())
}

fn print_check(summary: &CycleSummary) {
    println!(
        "{} rows, {} models with an in-stock offer",
        summary.rows.len(),
        summary.best_offers.len()
    );
    println!(
        "{:<12} {:>10} {:>10} {:>10}  {:<10} {:<16}",
        "MODEL", "THRESHOLD", "BEST", "LAST", "SITE", "VERDICT"
    );
    for decision in &summary.decisions {
        println!("{}", decision_line(decision));
    }
}

fn decision_line(d: &ModelDecision) -> String {
    let price = d
        .offer
        .as_ref()
        .map_or_else(|| "-".to_string(), |o| format!("£{:.2}", o.price_num));
    let site = d.offer.as_ref().map_or("-", |o| o.site.as_str());
    let last = d
        .last_notified_price
        .map_or_else(|| "-".to_string(), |p| format!("£{p:.2}"));
    let threshold = format!("£{:.2}", d.threshold);
    format!(
        "{:<12} {:>10} {:>10} {:>10}  {:<10} {:<16}",
        d.model,
        threshold,
        price,
        last,
        site,
        d.verdict.as_str()
    )
}

fn print_state(store: &AlertStateStore) {
    let state = store.load();
    if state.is_empty() {
        println!("no alerts recorded in {}", store.path().display());
        return;
    }
    for (model, record) in state.iter() {
        println!(
            "{model:<12} £{:.2} @ {} on {}  {}",
            record.last_notified_price,
            if record.last_site.is_empty() { "-" } else { record.last_site.as_str() },
            record.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            record.last_url
        );
    }
}
