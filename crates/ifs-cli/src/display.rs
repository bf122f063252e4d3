//! Output formatting for envelopes and listings.

use anyhow::Result;
use colored::Colorize;

use ifs_common::{Pagination, ResultEnvelope};

/// Prints a status line followed by the envelope as pretty JSON.
pub fn display_envelope(envelope: &ResultEnvelope) -> Result<()> {
    let status = format!("HTTP {}", envelope.status_code());
    if envelope.is_success() {
        println!("{} {}", "✓".bright_green(), status.bright_green());
    } else {
        println!("{} {}", "✗".bright_red(), status.bright_red());
    }
    if let Some(message) = envelope.message() {
        println!("  {}", message.italic());
    }
    println!("{}", serde_json::to_string_pretty(envelope)?);
    Ok(())
}

/// Prints a one-line summary of a listing.
pub fn display_pagination(shown: usize, pagination: &Pagination) {
    if pagination.total > 0 {
        println!(
            "\n{} {shown} of {} (page {}/{})",
            "○".bright_blue(),
            pagination.total,
            pagination.current_page,
            pagination.last_page
        );
    } else {
        println!("\n{} {shown} records", "○".bright_blue());
    }
}
