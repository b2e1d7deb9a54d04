use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use iptmon_core::config::{Config, LogTarget, MonitorSettings};
use iptmon_core::error::StartupError;
use iptmon_core::format::format_magnitude;
use iptmon_core::interrupt;
use iptmon_core::monitor::MonitorHeader;
use iptmon_core::sample_log::SampleLog;
use iptmon_core::selector::CounterSelector;
use tracing::info;

use crate::cli::WatchArgs;

pub fn run(args: &WatchArgs, config: &Config) -> Result<()> {
    let log = args.log.as_ref().map(|path| LogTarget {
        path: path.clone(),
        format: config.log_format,
    });
    // clap enforces --number unless --list
    let position = args.number.unwrap_or_default();
    let settings = MonitorSettings::validate(config, position, log)?;

    let command = settings.listing_command();
    let command_line = command.display();
    let selector = CounterSelector::new(command);
    let records = selector.records();
    settings.check_position(records.len())?;
    let rule_line = records[settings.position - 1].raw_line.clone();

    if let Some(target) = &settings.log
        && target.path.exists()
        && !args.force
    {
        let stdin = io::stdin();
        let confirmed = confirm_overwrite(&target.path, &mut stdin.lock(), &mut io::stderr())?;
        if !confirmed {
            return Err(StartupError::OverwriteDeclined(target.path.clone()).into());
        }
    }

    println!("Selected rule {}: {rule_line}", settings.position);

    iptmon_tui::ensure_terminal()?;
    interrupt::init()?;
    let sample_log = settings
        .log
        .as_ref()
        .map(|target| SampleLog::create(&target.path, target.format))
        .transpose()?;

    let header = MonitorHeader {
        chain: settings.chain.clone(),
        position: settings.position,
        period: settings.period,
        rule_line,
        log: settings.log.as_ref().map(|target| {
            format!(
                "{} ({})",
                target.path.display(),
                target.format.display_name()
            )
        }),
    };
    info!(command = %command_line, position = settings.position, "starting monitor");

    let summary = iptmon_tui::run_status_display(selector, &settings, &header, sample_log)?;

    println!(
        "Stopped after {} samples. Total: {} ({} packets)",
        summary.reported_ticks,
        format_magnitude(summary.totals.total_bytes as f64, "B"),
        summary.totals.total_packets
    );
    Ok(())
}

/// Asks whether to overwrite `path`. Anything but `y`/`yes` declines.
fn confirm_overwrite<R, W>(path: &Path, input: &mut R, prompt: &mut W) -> Result<bool>
where
    R: BufRead,
    W: Write,
{
    write!(
        prompt,
        "Log file {} already exists. Overwrite? [y/N] ",
        path.display()
    )?;
    prompt.flush()?;

    let mut answer = String::new();
    input
        .read_line(&mut answer)
        .context("Failed to read overwrite confirmation")?;
    let answer = answer.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}
