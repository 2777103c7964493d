//! Credential and data source check.

use console::style;

use crate::config::Settings;

/// Fetch the configured range and report how many ticket rows it holds.
pub async fn cmd_check(settings: &Settings) -> anyhow::Result<()> {
    let lookup = settings.create_lookup_service()?;

    println!(
        "{} Fetching {} ...",
        style("→").cyan(),
        style(lookup.range()).bold()
    );

    match lookup.fetch_tickets().await {
        Ok(tickets) => {
            let picked_up = tickets.iter().filter(|t| t.picked_up).count();
            println!("  {} {} ticket rows", style("✓").green(), tickets.len());
            println!(
                "  {} picked up, {} waiting",
                picked_up,
                tickets.len() - picked_up
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("  {} {}", style("✗").red(), e);
            Err(anyhow::anyhow!("Failed to read spreadsheet: {}", e))
        }
    }
}
