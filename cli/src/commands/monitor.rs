//! Monitor command - live inventory watching.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use portwarden_core::{EngineEvent, PortEngine, RefreshScheduler};
use tokio::sync::broadcast::error::RecvError;

pub async fn run(interval: Option<u64>) -> Result<()> {
    let engine = Arc::new(PortEngine::new().await?);
    let interval = match interval {
        Some(secs) => secs.max(1),
        None => engine.refresh_interval().await?.max(1),
    };

    let mut events = engine.subscribe();
    let scheduler = RefreshScheduler::start(engine.clone(), Duration::from_secs(interval));

    println!(
        "Monitoring listening ports every {}s. Press Ctrl-C to stop.",
        interval
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(EngineEvent::PortsChanged) => {
                    println!(
                        "[{}] inventory changed: {} entries",
                        timestamp(),
                        engine.current_ports().len()
                    );
                }
                Ok(EngineEvent::WatchTransition { port, to_active: true, process_name }) => {
                    let name = process_name.unwrap_or_else(|| "unknown process".to_string());
                    println!("[{}] watched port {} started ({})", timestamp(), port, name);
                }
                Ok(EngineEvent::WatchTransition { port, to_active: false, .. }) => {
                    println!("[{}] watched port {} stopped", timestamp(), port);
                }
                Err(RecvError::Lagged(missed)) => {
                    println!("[{}] fell behind, {} events dropped", timestamp(), missed);
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    scheduler.stop();
    println!("Stopped.");
    Ok(())
}

fn timestamp() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}
