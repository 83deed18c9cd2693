//! Writer, reader and status loops on top of the mapshare library

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Local};
use console::style;
use mapshare::{LeadershipToken, Observer, RoleCoordinator, ShareError, SharedRegion};
use std::io::{self, BufRead};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;
use std::time::SystemTime;

fn timestamp(at: SystemTime) -> String {
    DateTime::<Local>::from(at).format("%H:%M:%S").to_string()
}

/// Publish stdin line by line until EOF.
pub fn run_writer(coordinator: &RoleCoordinator, append: bool) -> Result<()> {
    let config = coordinator.config();
    let mut writer = coordinator
        .start_writer()
        .context("cannot start the writer")?;

    println!(
        "{} Writing to '{}' ({} bytes). Each line {} the content; Ctrl+D to stop.",
        style("✓").green(),
        style(&config.region.name).green(),
        writer.capacity(),
        if append { "is appended to" } else { "replaces" },
    );

    let mut content = String::new();
    for line in io::stdin().lock().lines() {
        let line = line.context("failed to read stdin")?;
        if append {
            if !content.is_empty() {
                content.push('\n');
            }
            content.push_str(&line);
        } else {
            content = line;
        }

        let receipt = writer.push(&content)?;
        println!(
            "   {} Updated: {}{}",
            style("✓").green(),
            timestamp(receipt.written_at),
            if receipt.truncated {
                style(" (truncated to fit)").yellow().to_string()
            } else {
                String::new()
            }
        );
    }

    writer.close()?;
    println!("{} Writer closed", style("✓").green());
    Ok(())
}

struct Printer {
    fatal: Sender<String>,
}

impl Observer for Printer {
    fn on_content_changed(&self, content: &str, observed_at: SystemTime) {
        println!("{} {}", style(format!("[{}]", timestamp(observed_at))).dim(), content);
    }

    fn on_fatal_error(&self, error: &ShareError) {
        let _ = self.fatal.send(error.to_string());
    }
}

/// Print every change until the region goes away.
pub fn run_reader(coordinator: &RoleCoordinator) -> Result<()> {
    let config = coordinator.config();
    let reader = coordinator
        .start_reader()
        .context("cannot start the reader")?;

    println!(
        "{} Following '{}' (poll every {} ms)",
        style("✓").green(),
        style(&config.region.name).green(),
        config.poll_interval.as_millis()
    );

    let (fatal, fatal_rx) = mpsc::channel();
    let handle = reader.spawn_with(config, Arc::new(Printer { fatal }))?;

    let message = fatal_rx.recv();
    handle.stop();
    match message {
        Ok(message) => Err(anyhow!(message).context("reader stopped")),
        Err(_) => Ok(()),
    }
}

struct StatusPrinter;

impl Observer for StatusPrinter {
    fn on_writer_detected(&self, active: bool) {
        let now = timestamp(SystemTime::now());
        if active {
            println!("[{now}] {}", style("writer running").green());
        } else {
            println!("[{now}] {}", style("no writer").yellow());
        }
    }
}

/// Print availability once, or keep watching it.
pub fn run_status(mut coordinator: RoleCoordinator, watch: bool) -> Result<()> {
    if watch {
        coordinator.watch(Arc::new(StatusPrinter))?;
        loop {
            thread::park();
        }
    }

    let state = coordinator.probe()?;
    let token = &coordinator.config().token;
    if state.writer_active {
        match LeadershipToken::holder_pid(token) {
            Some(pid) => println!("{} (pid {pid})", style("writer running").green()),
            None => println!("{}", style("writer running").green()),
        }
    } else {
        println!("{}", style("no writer").yellow());
    }
    Ok(())
}

/// Remove a leftover region, refusing while a writer is using it.
pub fn run_clean(coordinator: &RoleCoordinator) -> Result<()> {
    if coordinator.probe()?.writer_active {
        bail!("a writer is running; close it first");
    }

    let region = &coordinator.config().region;
    if SharedRegion::remove(region)? {
        println!("{} Removed '{}'", style("✓").green(), region.name);
    } else {
        println!("Nothing to remove for '{}'", region.name);
    }
    Ok(())
}
