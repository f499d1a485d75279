//! Favorites commands.

use anyhow::Result;
use portwarden_core::ConfigStore;

pub async fn add(port: u16) -> Result<()> {
    ConfigStore::new()?.add_favorite(port).await?;
    println!("Added port {} to favorites.", port);
    Ok(())
}

pub async fn remove(port: u16) -> Result<()> {
    ConfigStore::new()?.remove_favorite(port).await?;
    println!("Removed port {} from favorites.", port);
    Ok(())
}

pub async fn list(json: bool) -> Result<()> {
    let mut favorites: Vec<u16> = ConfigStore::new()?
        .get_favorites()
        .await?
        .into_iter()
        .collect();
    favorites.sort_unstable();

    if json {
        println!("{}", serde_json::to_string(&favorites)?);
    } else if favorites.is_empty() {
        println!("No favorite ports.");
    } else {
        for port in favorites {
            println!("{}", port);
        }
    }
    Ok(())
}
