//! Wirecheck: main entry point
//!
//! Continuously verifies a wire harness against its taught pin map and
//! keeps the fixture locked until an authorized card is presented.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  Rig (rppal / sim)     LogEventSink  JsonlStore  JsonConfigFile │
//! │  (Pins, Indicators,    (EventSink)   (Persist)   (ConfigPort)   │
//! │   Solenoid)                                                    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Continuity · Classifier · Counters · Interlock        │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Threads: scan loop · reporter · card input (stdin)            │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage:
//!
//! ```text
//! wirecheck [--sim] [run [CONFIG.json]]
//! wirecheck [--sim] teach OUT.json [--product-name NAME] [--product-no NO]
//! wirecheck cards FILE list
//! wirecheck cards FILE add ID NAME [--level LEVEL]
//! wirecheck cards FILE remove ID
//! ```

// ── Module declarations ───────────────────────────────────────
mod cli;

// ── Imports ───────────────────────────────────────────────────
use std::io::{self, BufRead};
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use chrono::Utc;
use clap::Parser;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::{info, warn};

use wirecheck::adapters::config_file::JsonConfigFile;
use wirecheck::adapters::hardware::{Rig, simulated_rig};
use wirecheck::adapters::json_store::JsonlStore;
use wirecheck::adapters::log_sink::LogEventSink;
use wirecheck::app::commands::AppCommand;
use wirecheck::app::context::AppContext;
use wirecheck::app::ports::{ConfigPort, PinController, PinId};
use wirecheck::app::service::AppService;
use wirecheck::cards::CardRegistry;
use wirecheck::config::{SystemConfig, WireHarnessConfig};
use wirecheck::continuity::DEFAULT_SETTLE_MS;
use wirecheck::continuity::teach::discover_pairs;
use wirecheck::interlock::Interlock;
use wirecheck::pins;
use wirecheck::scheduler::{CancelToken, run_reporter, run_scan_loop};

use cli::{CardCommands, Cli, Commands};

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    let simulate = cli.sim;

    // ── 1. Logging ────────────────────────────────────────────
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("╔══════════════════════════════════════╗");
    info!("║  Wirecheck v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    match cli.into_command() {
        Commands::Run { config } => {
            // ── 2. Load config (or defaults) ──────────────────
            let config = match config {
                Some(path) => JsonConfigFile::new(path).load().context("loading config")?,
                None => {
                    info!("No config given, using defaults");
                    SystemConfig::default()
                }
            };
            config.validate().context("validating config")?;
            info!(
                "Product {} ({}), {} pair(s)",
                config.harness.product_name(),
                config.harness.product_no(),
                config.harness.len()
            );

            // ── 3. Build the rig ──────────────────────────────
            #[cfg(feature = "rpi")]
            if !simulate {
                let rig = wirecheck::adapters::hardware::raspberry_pi_rig(&config)?;
                return run(config, rig);
            }
            #[cfg(not(feature = "rpi"))]
            if !simulate {
                warn!("Built without the `rpi` feature; running against the simulated rig");
            }
            let rig = simulated_rig(&config).context("building simulated rig")?;
            run(config, rig)
        }
        Commands::Teach { out, product_name, product_no } => {
            teach(&out, &product_name, &product_no, simulate)
        }
        Commands::Cards { file, action } => manage_cards(&file, action),
    }
}

/// Wire up the session and block until the operator ends it.
fn run<P, D, O>(config: SystemConfig, rig: Rig<P, D, O>) -> Result<()>
where
    P: PinController + Send + 'static,
    D: DelayNs + Send + 'static,
    O: OutputPin + Send + 'static,
{
    // ── 4. Interlock + shared context ─────────────────────────
    let cards = Arc::new(
        CardRegistry::load(&config.cards_file).context("loading authorized cards")?,
    );
    info!("{} authorized card(s)", cards.len());

    let Rig { pins, delay, mut indicators, solenoid } = rig;
    let interlock = Interlock::new(solenoid, cards);
    let ctx = Arc::new(AppContext::new(interlock, config.harness.product_no(), Utc::now()));
    let store = JsonlStore::from_config(&config);
    let cancel = CancelToken::new();

    // ── 5. Ctrl+C / SIGTERM ───────────────────────────────────
    // Same path as `quit`: the scan loop runs its shutdown before `main`
    // returns.
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || {
            warn!("Termination signal received; ending session");
            cancel.cancel();
        })
        .context("installing signal handler")?;
    }

    // ── 6. Scan thread ────────────────────────────────────────
    let scan = {
        let mut service = AppService::new(&config, pins, delay, Arc::clone(&ctx));
        let mut store = store.clone();
        let cancel = cancel.clone();
        let interval = Duration::from_millis(config.scan_interval_ms.into());
        thread::Builder::new().name("scan".into()).spawn(move || {
            run_scan_loop(
                &mut service,
                &mut indicators,
                &mut store,
                &mut LogEventSink::new(),
                &cancel,
                interval,
            )
        })?
    };

    // ── 7. Reporter thread ────────────────────────────────────
    let reporter = {
        let ctx = Arc::clone(&ctx);
        let cancel = cancel.clone();
        let interval = Duration::from_millis(config.report_interval_ms.into());
        thread::Builder::new().name("reporter".into()).spawn(move || {
            run_reporter(&ctx, &mut LogEventSink::new(), &cancel, interval);
        })?
    };

    // ── 8. Card input ─────────────────────────────────────────
    // Blocking stdin reads cannot be interrupted; this thread is left
    // detached and dies with the process. Only the scan and reporter
    // threads are joined.
    {
        let ctx = Arc::clone(&ctx);
        let cancel = cancel.clone();
        let mut store = store;
        thread::Builder::new().name("cards".into()).spawn(move || {
            let mut sink = LogEventSink::new();
            for line in io::stdin().lock().lines() {
                let line = match line {
                    Ok(l) => l,
                    Err(e) => {
                        warn!("stdin: {e}");
                        break;
                    }
                };
                let Some(cmd) = AppCommand::parse_line(&line) else {
                    continue;
                };
                if !ctx.handle_command(cmd, &mut store, &mut sink, Utc::now()) {
                    break;
                }
            }
            info!("Card input closed; ending session");
            cancel.cancel();
        })?;
    }

    info!("System ready. Present a card, 'lock [reason]' or 'quit' (Ctrl+C also ends).");

    // ── 9. Wait for the session to end ────────────────────────
    let summary = scan.join().map_err(|_| anyhow!("scan thread panicked"))?;
    reporter.join().map_err(|_| anyhow!("reporter thread panicked"))?;

    let c = summary.counters;
    info!(
        "Session {} ended: checked={} good={} not_good={} open={}",
        summary.product_no, c.checked, c.good, c.not_good, c.open
    );
    Ok(())
}

/// Discover the harness pin map and write a config built from it.
fn teach(out: &Path, product_name: &str, product_no: &str, simulate: bool) -> Result<()> {
    let candidates = pins::teach_candidates();
    info!("TEACH | probing {} candidate pins", candidates.len());

    #[cfg(feature = "rpi")]
    let pairs = if simulate {
        teach_simulated(&candidates)?
    } else {
        let mut pins = wirecheck::drivers::rpi::RpiPinController::new().context("opening GPIO")?;
        let mut delay = wirecheck::drivers::delay::StdDelay;
        discover_pairs(&mut pins, &mut delay, &candidates, DEFAULT_SETTLE_MS)
    };
    #[cfg(not(feature = "rpi"))]
    let pairs = {
        if !simulate {
            warn!("Built without the `rpi` feature; teaching against the simulated rig");
        }
        teach_simulated(&candidates)?
    };

    if pairs.is_empty() {
        bail!("no wire pairs discovered");
    }
    let mut config = SystemConfig::default();
    config.harness = WireHarnessConfig::from_discovered(product_name, product_no, &pairs)
        .context("building harness from discovered pairs")?;
    JsonConfigFile::new(out).save(&config)?;
    info!("TEACH | {} pair(s) written to {}", pairs.len(), out.display());
    Ok(())
}

/// Teach against the simulated rig wired with the default harness.
fn teach_simulated(candidates: &[PinId]) -> Result<Vec<(PinId, PinId)>> {
    let Rig { mut pins, mut delay, .. } = simulated_rig(&SystemConfig::default())?;
    Ok(discover_pairs(&mut pins, &mut delay, candidates, DEFAULT_SETTLE_MS))
}

fn manage_cards(file: &Path, action: CardCommands) -> Result<()> {
    let registry = CardRegistry::load(file).context("loading card registry")?;
    match action {
        CardCommands::List => {
            for card in registry.list() {
                println!(
                    "{}\t{}\t{:?}\t{}",
                    card.card_id,
                    card.name,
                    card.level,
                    card.added_at.to_rfc3339()
                );
            }
            return Ok(());
        }
        CardCommands::Add { id, name, level } => {
            registry.add(&id, &name, level)?;
        }
        CardCommands::Remove { id } => {
            if registry.remove(&id).is_none() {
                bail!("card '{id}' is not registered");
            }
        }
    }
    registry.save(file)?;
    Ok(())
}
