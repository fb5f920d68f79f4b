mod bus;
mod cancel;
mod collectors;
mod config;
mod logging;
mod models;
mod monitor;
mod probe;
mod quirks;
mod resolver;
mod ui;
mod util;

#[cfg(test)]
mod testing;

use anyhow::Result;
use bus::EventBus;
use clap::Parser;
use config::Config;
use models::status::StatusNotice;
use monitor::StatusMonitor;
use probe::LinuxProbe;
use std::collections::BTreeMap;
use std::io::IsTerminal;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use ui::indicator::{fold_until, IndicatorState};
use ui::theme::{Theme, ThemeVariant};

#[derive(Parser, Debug)]
#[command(name = "mstat", about = "Show the mount, lock state and disk usage behind a directory", version = "0.1")]
struct Cli {
    /// Directories to check
    #[arg(default_value = ".")]
    paths: Vec<String>,

    /// Usage percentage at which a mount is flagged (0-100)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(0..=100))]
    warn: Option<u32>,

    /// Re-check interval in milliseconds for --watch
    #[arg(short, long)]
    interval: Option<u64>,

    /// Color theme: default, dracula, gruvbox, nord
    #[arg(short = 't', long)]
    theme: Option<String>,

    /// Print one JSON object per path instead of the indicator line
    #[arg(long)]
    json: bool,

    /// Keep re-checking every interval until interrupted
    #[arg(long)]
    watch: bool,

    /// Exit 1 if any path has no mount, stalls or crosses the threshold
    #[arg(long)]
    check: bool,

    /// Print config file path and current values, then exit
    #[arg(long)]
    config: bool,

    /// Debug logging on stderr (MSTAT_LOG overrides)
    #[arg(short, long)]
    verbose: bool,
}

struct Session {
    monitor:  StatusMonitor,
    rx:       mpsc::Receiver<StatusNotice>,
    warn_pct: u32,
    theme:    Theme,
    json:     bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let cfg = Config::load();

    if cli.config {
        return run_print_config(&cfg);
    }

    let theme = if std::io::stdout().is_terminal() {
        let name = cli.theme.as_deref().unwrap_or(cfg.general.theme.as_str());
        Theme::for_variant(ThemeVariant::from_name(name))
    } else {
        Theme::plain()
    };

    let bus = EventBus::new();
    let session = Session {
        monitor:  StatusMonitor::new(Arc::new(LinuxProbe), cfg.quirk_table(), bus.clone()),
        rx:       bus.subscribe(),
        warn_pct: cli.warn.unwrap_or(cfg.general.warn_pct),
        theme,
        json:     cli.json,
    };

    let result = if cli.watch {
        let interval = Duration::from_millis(cli.interval.unwrap_or(cfg.general.update_interval_ms).max(200));
        run_watch(&session, &cli.paths, interval)
    } else {
        let timeout = Duration::from_millis(cfg.general.query_timeout_ms);
        run_once(&session, &cli.paths, timeout)
    };

    let running = session.monitor.in_flight();
    if running > 0 {
        tracing::debug!("{} pass(es) still running at exit", running);
    }
    session.monitor.cancel_all();
    bus.shutdown();

    let healthy = result?;
    if cli.check && !healthy {
        std::process::exit(1);
    }
    Ok(())
}

/// Resolve every path once and print the results. Returns false when any
/// path needs attention.
fn run_once(s: &Session, paths: &[String], timeout: Duration) -> Result<bool> {
    let mut states: BTreeMap<String, IndicatorState> = BTreeMap::new();
    for path in paths {
        states.insert(path.clone(), IndicatorState::new(path));
        // A failed spawn has already published its warning
        let _ = s.monitor.request(path, path, s.warn_pct);
    }

    if !fold_until(&s.rx, &mut states, Instant::now() + timeout) {
        tracing::warn!("gave up waiting after {} ms", timeout.as_millis());
        s.monitor.cancel_all();
    }

    for path in paths {
        if let Some(st) = states.get(path) {
            print_state(s, st, None)?;
        }
    }
    Ok(states.values().all(|st| !st.needs_attention()))
}

/// Refresh every path each tick. A path whose worker from an earlier tick
/// has not returned yet is skipped until it does.
fn run_watch(s: &Session, paths: &[String], interval: Duration) -> Result<bool> {
    eprintln!("mstat watching {} path(s) every {}ms…", paths.len(), interval.as_millis());
    let mut states: BTreeMap<&str, IndicatorState> =
        paths.iter().map(|p| (p.as_str(), IndicatorState::new(p))).collect();
    let mut shown: BTreeMap<String, IndicatorState> = BTreeMap::new();

    loop {
        for path in paths {
            // None while a worker is stuck; a failed spawn has published its warning
            let _ = s.monitor.refresh(path, path, s.warn_pct);
        }
        let next_tick = Instant::now() + interval;
        loop {
            let remaining = next_tick.saturating_duration_since(Instant::now());
            if remaining.is_zero() { break; }
            match s.rx.recv_timeout(remaining) {
                Ok(notice) => {
                    let Some(st) = states.get_mut(notice.target.as_str()) else { continue };
                    st.apply(&notice.event);
                    if !st.finished { continue; }
                    if shown.get(&notice.target).is_some_and(|prev| !changed(prev, st)) { continue; }
                    let now = chrono::Local::now().format("%H:%M:%S").to_string();
                    print_state(s, st, Some(&now))?;
                    shown.insert(notice.target, st.clone());
                }
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => return Ok(true),
            }
        }
    }
}

/// Only print when what the indicator shows actually moved.
fn changed(before: &IndicatorState, after: &IndicatorState) -> bool {
    before.unmounted != after.unmounted
        || before.locked != after.locked
        || before.mount != after.mount
        || before.usage.as_ref().map(|u| (u.percent, u.treatment))
            != after.usage.as_ref().map(|u| (u.percent, u.treatment))
}

fn print_state(s: &Session, st: &IndicatorState, timestamp: Option<&str>) -> Result<()> {
    if s.json {
        let mut v = st.to_json();
        if let Some(ts) = timestamp {
            v["timestamp"] = serde_json::Value::String(ts.to_string());
        }
        println!("{}", serde_json::to_string(&v)?);
    } else if let Some(ts) = timestamp {
        println!("{} {}", ts, st.render(&s.theme));
    } else {
        println!("{}", st.render(&s.theme));
    }
    Ok(())
}

fn run_print_config(cfg: &Config) -> Result<()> {
    let path = Config::config_path()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| "(unknown)".to_string());
    println!("Config: {}", path);
    println!();
    println!("[general]");
    println!("  warn_pct           = {}%", cfg.general.warn_pct);
    println!("  update_interval_ms = {}", cfg.general.update_interval_ms);
    println!("  query_timeout_ms   = {}", cfg.general.query_timeout_ms);
    println!("  theme              = {}", cfg.general.theme);
    println!();
    let quirks = cfg.quirk_table();
    if quirks.entries().is_empty() {
        println!("[quirks] (none)");
    }
    for q in quirks.entries() {
        println!("[quirk] {} → {}", q.path.display(), q.redirect.display());
    }
    Ok(())
}
