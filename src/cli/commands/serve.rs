//! Web server command.

use console::style;

use crate::config::Settings;
use crate::server::AppState;

/// Start the web server.
pub async fn cmd_serve(settings: &Settings, bind: Option<&str>) -> anyhow::Result<()> {
    let (host, port) = match bind {
        Some(bind) => parse_bind_address(bind, &settings.host, settings.port),
        None => (settings.host.clone(), settings.port),
    };

    // Build the data source first so bad credentials fail before binding
    println!("{} Loading service account...", style("→").cyan());
    let lookup = match settings.create_lookup_service() {
        Ok(lookup) => {
            println!(
                "  {} Reading {} ({} matching)",
                style("✓").green(),
                lookup.range(),
                lookup.match_mode().as_str()
            );
            lookup
        }
        Err(e) => {
            eprintln!("  {} {}", style("✗").red(), e);
            return Err(anyhow::anyhow!("Data source setup failed: {}", e));
        }
    };

    println!(
        "{} Starting ticketcheck server at http://{}:{}",
        style("→").cyan(),
        host,
        port
    );
    println!("  Press Ctrl+C to stop");

    crate::server::serve(AppState::new(lookup), &host, port).await
}

/// Parse a bind address that can be:
/// - Just a port: "3030" -> default host:3030
/// - Just a host: "127.0.0.1" -> 127.0.0.1:default port
/// - Host and port: "127.0.0.1:3030" -> 127.0.0.1:3030
fn parse_bind_address(bind: &str, default_host: &str, default_port: u16) -> (String, u16) {
    if let Ok(port) = bind.parse::<u16>() {
        return (default_host.to_string(), port);
    }

    if let Some((host, port_str)) = bind.rsplit_once(':') {
        if let Ok(port) = port_str.parse::<u16>() {
            return (host.to_string(), port);
        }
    }

    (bind.to_string(), default_port)
}
