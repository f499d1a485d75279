//! Watched-port commands.

use anyhow::Result;
use portwarden_core::ConfigStore;

pub async fn add(port: u16, on_start: bool, on_stop: bool) -> Result<()> {
    let spec = ConfigStore::new()?
        .add_watched_port(port, on_start, on_stop)
        .await?;
    println!("Watching {}", spec);
    Ok(())
}

pub async fn remove(port: u16) -> Result<()> {
    ConfigStore::new()?.remove_watched_port(port).await?;
    println!("Stopped watching port {}.", port);
    Ok(())
}

pub async fn list(json: bool) -> Result<()> {
    let watched = ConfigStore::new()?.get_watched_ports().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&watched)?);
    } else if watched.is_empty() {
        println!("No watched ports.");
    } else {
        for spec in watched {
            println!("{}", spec);
        }
    }
    Ok(())
}
