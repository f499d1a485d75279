//! Example: scan and display all listening ports.

use portwarden_core::PortScanner;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    println!("Scanning ports...\n");

    let scanner = PortScanner::new();
    let records = scanner.scan().await;

    if records.is_empty() {
        println!("No listening ports found.");
        return;
    }

    println!(
        "{:<6} {:<8} {:<20} {:<18} COMMAND",
        "PORT", "PID", "PROCESS", "ADDRESS"
    );
    println!("{}", "-".repeat(90));

    for record in &records {
        let command: String = record.command.chars().take(40).collect();
        let process: String = record.process_name.chars().take(20).collect();
        let address: String = record.address.chars().take(18).collect();

        println!(
            "{:<6} {:<8} {:<20} {:<18} {}",
            record.port, record.pid, process, address, command
        );
    }

    println!("\nTotal: {} ports", records.len());
}
