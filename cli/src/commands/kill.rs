//! Kill command - terminate the process bound to a port.

use anyhow::Result;
use portwarden_core::PortEngine;

pub async fn run(port: u16, force: bool) -> Result<()> {
    let engine = PortEngine::new().await?;
    engine.refresh().await;

    let Some(record) = engine
        .current_ports()
        .into_iter()
        .find(|r| r.is_active && r.port == port)
    else {
        eprintln!("No process is listening on port {}.", port);
        std::process::exit(1);
    };

    println!(
        "Killing {} (PID {}) on port {}...",
        record.process_name, record.pid, port
    );

    let killed = if force {
        let ok = engine.kill_process(record.pid, true).await;
        if ok {
            // Confirm the port is actually free.
            engine.refresh().await;
        }
        ok
    } else {
        engine.kill_port(port).await
    };

    if !killed {
        eprintln!(
            "Failed to kill PID {}. Try again with elevated privileges (sudo).",
            record.pid
        );
        std::process::exit(1);
    }

    if engine.is_port_active(port) {
        println!("Signal delivered, but port {} is still in use.", port);
    } else {
        println!("Port {} is free.", port);
    }

    Ok(())
}
