//! Config command - display the persisted configuration.

use anyhow::Result;
use portwarden_core::ConfigStore;

pub async fn show(json: bool) -> Result<()> {
    let config = ConfigStore::new()?.load().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    println!("Refresh interval: {}s", config.refresh_interval);
    println!("Show inactive:    {}", config.show_inactive);

    if config.favorites.is_empty() {
        println!("Favorites:        (none)");
    } else {
        let ports: Vec<String> = config.favorites.iter().map(u16::to_string).collect();
        println!("Favorites:        {}", ports.join(", "));
    }

    if config.watched_ports.is_empty() {
        println!("Watched:          (none)");
    } else {
        println!("Watched:");
        for spec in &config.watched_ports {
            println!("  {}", spec);
        }
    }

    Ok(())
}
