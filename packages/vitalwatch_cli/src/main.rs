//! vitalwatch command line
//!
//! Runs a simulated monitoring session, classifies a single reading,
//! generates an alert on demand, or browses exported session reports.
//! Logging goes through env_logger; set `RUST_LOG=debug` for request-level
//! detail.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use vitalwatch::alert::{AlertGenerator, AlertTrigger};
use vitalwatch::chart::{series, sparkline, ChartRenderer, ChartViewport, Metric};
use vitalwatch::monitor::{Finding, SessionReport, Thresholds};
use vitalwatch::storage::{LocalFileStorage, StorageBackend};
use vitalwatch::{MonitorConfig, MonitorEvent, MonitorSession, VitalsReading};

#[derive(Parser)]
#[command(name = "vitalwatch-cli", version, about = "Simulated vitals monitor with generated emergency alerts")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a monitoring session until Ctrl-C or the duration elapses
    Monitor(MonitorArgs),
    /// Classify a single reading against the configured thresholds
    Check {
        #[command(flatten)]
        reading: ReadingArgs,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print the findings as JSON
        #[arg(long)]
        json: bool,
    },
    /// List exported session reports, or chart one of them
    Reports {
        /// Directory the reports were exported to
        #[arg(long)]
        dir: PathBuf,
        /// Session to render; requires --chart-out
        #[arg(long, requires = "chart_out")]
        session: Option<Uuid>,
        #[arg(long)]
        chart_out: Option<PathBuf>,
    },
    /// Generate an alert for a reading on demand
    Alert {
        #[command(flatten)]
        reading: ReadingArgs,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print the whole alert as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct MonitorArgs {
    /// JSON config file; defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,
    /// Stop after this many seconds
    #[arg(long)]
    duration: Option<u64>,
    /// Seed the simulator for a reproducible run
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    spike_probability: Option<f64>,
    /// Render the session's chart to this PNG file on exit
    #[arg(long)]
    chart_out: Option<PathBuf>,
    /// Export a JSON session report into this directory on exit
    #[arg(long)]
    export_dir: Option<PathBuf>,
}

#[derive(Args)]
struct ReadingArgs {
    /// Heart rate, bpm
    #[arg(long)]
    hr: u16,
    #[arg(long)]
    systolic: u16,
    #[arg(long)]
    diastolic: u16,
    /// Oxygen saturation, percent
    #[arg(long)]
    spo2: u8,
}

impl ReadingArgs {
    fn reading(&self) -> VitalsReading {
        VitalsReading::new(self.hr, self.systolic, self.diastolic, self.spo2)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Command::Monitor(args) => monitor(args).await,
        Command::Check { reading, config, json } => {
            let config = load_config(config.as_deref())?;
            check(&config, reading.reading(), json)
        }
        Command::Reports { dir, session, chart_out } => reports(&dir, session, chart_out.as_deref()),
        Command::Alert { reading, config, json } => {
            let config = load_config(config.as_deref())?;
            alert(&config, reading.reading(), json).await
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<MonitorConfig> {
    match path {
        Some(path) => MonitorConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => {
            let mut config = MonitorConfig::default();
            config.apply_env();
            Ok(config)
        }
    }
}

async fn monitor(args: MonitorArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(seed) = args.seed {
        config.simulator.seed = Some(seed);
    }
    if let Some(p) = args.spike_probability {
        config.simulator.spike_probability = p;
    }
    if let Some(dir) = args.export_dir {
        config.export_dir = Some(dir);
    }
    config.validate()?;

    if config.alert.api_key.is_none() {
        warn!("No API key configured; alert generation will likely be rejected");
    }

    let alerts = AlertGenerator::from_config(&config.alert, config.thresholds)?;
    let storage = match &config.export_dir {
        Some(dir) => {
            let storage = LocalFileStorage::new(dir)
                .with_context(|| format!("Failed to open export directory {}", dir.display()))?;
            Some(Arc::new(storage) as Arc<dyn StorageBackend + Send + Sync>)
        }
        None => None,
    };

    let session = MonitorSession::new(&config, alerts, storage);
    let mut events = session.subscribe();
    session.connect();

    let deadline = async {
        match args.duration {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);
    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => print_event(&event),
                Err(RecvError::Lagged(skipped)) => warn!("Display fell behind, skipped {} events", skipped),
                Err(RecvError::Closed) => break,
            },
            _ = &mut interrupt => {
                info!("Interrupted");
                break;
            }
            _ = &mut deadline => break,
        }
    }

    let Some(report) = session.disconnect() else {
        return Ok(());
    };

    println!();
    println!("Session {}: {} samples kept", report.session_id, report.samples.len());
    for metric in Metric::ALL {
        let points = series(&report.samples, metric);
        println!("{:>10} {:<5} {}", metric.label(), metric.unit(), sparkline(&points));
    }

    if let Some(path) = args.chart_out {
        write_chart(&report, &config.thresholds, &path)?;
    }

    Ok(())
}

fn write_chart(report: &SessionReport, thresholds: &Thresholds, path: &Path) -> Result<()> {
    let viewport = ChartViewport::fitted(&report.samples);
    match ChartRenderer::default().render_png(&report.samples, &viewport, &Metric::ALL, thresholds) {
        Ok(png) => {
            std::fs::write(path, png).with_context(|| format!("Failed to write chart to {}", path.display()))?;
            println!("Chart written to {}", path.display());
        }
        Err(e) => warn!("No chart rendered for session {}: {}", report.session_id, e),
    }
    Ok(())
}

fn reports(dir: &Path, session: Option<Uuid>, chart_out: Option<&Path>) -> Result<()> {
    let storage = LocalFileStorage::new(dir)
        .with_context(|| format!("Failed to open report directory {}", dir.display()))?;

    if let (Some(id), Some(path)) = (session, chart_out) {
        let report = SessionReport::load(&storage, id)?;
        return write_chart(&report, &Thresholds::default(), path);
    }

    let reports = SessionReport::load_all(&storage)?;
    if reports.is_empty() {
        println!("No reports in {}", dir.display());
    }
    for report in reports {
        let alert = match &report.alert {
            Some(alert) => format!("{:?} alert", alert.trigger),
            None => "no alert".to_string(),
        };
        println!(
            "{}  {}  {:>3} samples  {}",
            report.session_id,
            report.started_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
            report.samples.len(),
            alert
        );
    }
    Ok(())
}

fn print_event(event: &MonitorEvent) {
    match event {
        MonitorEvent::Connected { session_id } => println!("Connected (session {})", session_id),
        MonitorEvent::Reading(sample) => println!(
            "[{}] {}",
            sample.timestamp.with_timezone(&Local).format("%H:%M:%S"),
            sample.reading
        ),
        MonitorEvent::CriticalDetected { findings, .. } => println!("  CRITICAL: {}", describe_all(findings)),
        MonitorEvent::AlertReady(alert) => {
            println!();
            println!("=== {:?} alert ===", alert.trigger);
            println!("{}", alert.text);
            println!();
        }
        MonitorEvent::AlertFailed { message, .. } => println!("  {}", message),
        MonitorEvent::Disconnected { session_id } => println!("Disconnected (session {})", session_id),
    }
}

fn describe_all(findings: &[Finding]) -> String {
    findings.iter().map(Finding::describe).collect::<Vec<_>>().join("; ")
}

fn check(config: &MonitorConfig, reading: VitalsReading, json: bool) -> Result<()> {
    let findings = config.thresholds.findings(&reading);

    if json {
        let output = serde_json::json!({
            "reading": reading,
            "critical": !findings.is_empty(),
            "findings": findings,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if findings.is_empty() {
        println!("{}: within limits", reading);
    } else {
        println!("{}: CRITICAL, {}", reading, describe_all(&findings));
    }
    Ok(())
}

async fn alert(config: &MonitorConfig, reading: VitalsReading, json: bool) -> Result<()> {
    config.validate()?;
    let alerts = AlertGenerator::from_config(&config.alert, config.thresholds)?;

    match alerts.generate(AlertTrigger::Manual, reading).await {
        Ok(message) if json => {
            println!("{}", serde_json::to_string_pretty(&message)?);
            Ok(())
        }
        Ok(message) => {
            println!("{}", message.text);
            Ok(())
        }
        Err(e) => {
            warn!("Alert generation failed: {}", e);
            bail!("{}", alerts.failure_text(&e))
        }
    }
}
