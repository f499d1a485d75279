//! List command - show the current port inventory.

use anyhow::Result;
use portwarden_core::PortEngine;

pub async fn run(
    port_filter: Option<u16>,
    name_filter: Option<String>,
    all: bool,
    json: bool,
) -> Result<()> {
    let engine = PortEngine::new().await?;
    engine.refresh().await;

    let show_inactive = all || engine.show_inactive().await?;

    let mut ports = engine.current_ports();
    if !show_inactive {
        ports.retain(|r| r.is_active);
    }
    if let Some(p) = port_filter {
        ports.retain(|r| r.port == p);
    }
    if let Some(ref name) = name_filter {
        let name_lower = name.to_lowercase();
        ports.retain(|r| r.process_name.to_lowercase().contains(&name_lower));
    }

    // Piped output gets JSON so scripts never scrape the table.
    if json || !atty::is(atty::Stream::Stdout) {
        println!("{}", serde_json::to_string_pretty(&ports)?);
        return Ok(());
    }

    if ports.is_empty() {
        println!("No listening ports found.");
        return Ok(());
    }

    println!(
        "  {:<6} {:<8} {:<20} {:<18} {:<10} COMMAND",
        "PORT", "PID", "PROCESS", "ADDRESS", "USER"
    );
    println!("{}", "-".repeat(96));

    for record in &ports {
        let marker = if engine.is_favorite(record.port) {
            "*"
        } else {
            " "
        };
        let pid = if record.is_active {
            record.pid.to_string()
        } else {
            "-".to_string()
        };

        println!(
            "{} {:<6} {:<8} {:<20} {:<18} {:<10} {}",
            marker,
            record.port,
            pid,
            clip(&record.process_name, 20),
            clip(&record.address, 18),
            clip(&record.user, 10),
            clip(&record.command, 30),
        );
    }

    println!("\nTotal: {} entries", ports.len());
    Ok(())
}

/// Clip a field to `max` characters for the table view.
fn clip(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some(_) => {
            let head: String = s.chars().take(max.saturating_sub(1)).collect();
            format!("{}…", head)
        }
        None => s.to_string(),
    }
}
