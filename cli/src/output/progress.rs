//! Spinners for fleet-wide operations, drawn on stderr.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Falls back to indicatif's default layout if `template` does not parse.
fn style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template).unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// Spinner for an operation over `count` instances, e.g. "Checking 3 instance(s)...".
#[must_use]
pub fn fleet_spinner(verb: &str, count: usize) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(style("  {spinner:.cyan} {msg}").tick_strings(TICKS));
    pb.set_message(format!("{verb} {count} instance(s)..."));
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Replace the spinner with `✓ msg` when `ok`, `⚠ msg` otherwise.
pub fn finish(pb: &ProgressBar, ok: bool, msg: &str) {
    pb.set_style(style("  {prefix} {msg}"));
    pb.set_prefix(if ok { "✓" } else { "⚠" });
    pb.finish_with_message(msg.to_string());
}
