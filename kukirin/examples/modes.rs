//! Example of how to print riding mode changes from a scooter with a known MAC address.

use futures::stream::StreamExt;
use kukirin::{KukirinEvent, KukirinSession, MacAddress, ModeMonitor};
use std::time::Duration;

const SCAN_DURATION: Duration = Duration::from_secs(6);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<(), eyre::Report> {
    pretty_env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        eyre::bail!("USAGE: {} AA:BB:CC:DD:EE:FF", args[0]);
    }
    let mac_address: MacAddress = args[1].parse()?;

    let (_, session) = KukirinSession::new().await?;
    let devices = session.scan(SCAN_DURATION).await?;
    let device = devices
        .into_iter()
        .find(|device| device.mac_address == mac_address)
        .ok_or_else(|| eyre::eyre!("{} not found", mac_address))?;

    session.connect(&device.id, CONNECT_TIMEOUT).await?;
    let (_, mut events) = session.start_notify_status(&device.id).await?;

    let mut monitor = ModeMonitor::new();
    while let Some(event) = events.next().await {
        match event {
            KukirinEvent::Frame { value } => {
                if let Some(mode) = monitor.process(&value) {
                    println!("{}", mode);
                }
            }
            KukirinEvent::Disconnected => break,
        }
    }
    println!("Disconnected: {}", monitor.stats());

    Ok(())
}
