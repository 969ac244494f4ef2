//! Operator-facing prompts and the ranked listing
//!
//! Plain println rendering with a severity color per entry, and two
//! line-oriented prompts: the proxy port (forgiving, falls back to the
//! default) and the final selection (strict, fatal on bad input).

use dpitune_common::input::{self, DEFAULT_PORT};
use dpitune_common::model::RankedEntry;
use dpitune_common::ranking::Severity;
use owo_colors::OwoColorize;
use std::io::{self, Write};

/// True when stdin is an interactive terminal.
pub fn stdin_is_tty() -> bool {
    // SAFETY: isatty only inspects the descriptor
    unsafe { libc::isatty(libc::STDIN_FILENO) == 1 }
}

/// Render the ranked list with severity-coded success rates.
pub fn render_ranked(entries: &[RankedEntry]) {
    println!("\nRanked bypass strategies:\n");
    for entry in entries {
        let trial = &entry.trial;
        let rate = format!("{:>3}%", trial.success_rate);
        let rate = match Severity::for_rate(trial.success_rate) {
            Severity::High => rate.green().to_string(),
            Severity::Medium => rate.yellow().to_string(),
            Severity::Low => rate.red().to_string(),
        };
        println!(
            "  [{}] {} {}/{} reachable, {} failed - {}",
            entry.rank,
            rate,
            trial.success_count,
            trial.total_count,
            trial.failed_count,
            trial.setting
        );
        let failed = trial.failed_domains();
        if !failed.is_empty() && failed.len() <= 5 {
            println!("        unreachable: {}", failed.join(", "));
        }
    }
    println!();
}

/// Ask for the proxy listening port. Anything unusable (non-numeric,
/// privileged, out of range) falls back to the default.
pub fn prompt_port() -> io::Result<u16> {
    print!("Proxy port [{}]: ", DEFAULT_PORT);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(input::parse_port(&line))
}

/// Ask which ranked entry to install. In non-interactive runs the top
/// entry is chosen automatically.
pub fn prompt_selection(entries: &[RankedEntry], auto: bool) -> anyhow::Result<usize> {
    if auto {
        return Ok(0);
    }
    print!("Select a strategy to install [0-{}]: ", entries.len() - 1);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    let index = input::parse_selection(&line, entries.len()).map_err(|e| {
        // keep the typed error so main can map it to its exit code
        anyhow::Error::new(e)
    })?;
    Ok(index)
}
