mod config;
mod menu;
mod ui;

use crate::config::Config;
use crate::menu::{format_table, prompt_choice, Choice};
use crate::ui::Hud;
use eyre::{bail, Report, WrapErr};
use futures::future;
use futures::stream::{Stream, StreamExt};
use kukirin::{DeviceProps, KukirinEvent, KukirinSession, ModeMonitor};
use log::{debug, info, warn};
use std::future::Future;
use tokio::signal;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> Result<(), Report> {
    stable_eyre::install()?;
    pretty_env_logger::init();
    color_backtrace::install();

    let config = Config::from_file()?;
    let hud = Hud::new(config.colour);

    // Ctrl+C is handled here for the whole run, as once tokio listens for it the default action
    // of exiting is gone.
    let (shutdown_sender, mut shutdown) = watch::channel(false);
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                let _ = shutdown_sender.send(true);
            }
            Err(e) => warn!("Failed to listen for Ctrl+C: {}", e),
        }
    });

    // Connect a Bluetooth session.
    let (dbus_handle, session) = KukirinSession::new().await?;

    tokio::select! {
        res = dbus_handle => {
            res?;
            bail!("Lost connection to D-Bus");
        }
        res = run_menu(&session, &config, &hud, &mut shutdown) => res,
    }
}

/// Why a monitoring session ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum SessionEnd {
    /// The scooter went away, so go back to the device list.
    Disconnected,
    /// The user pressed Ctrl+C, so exit.
    Interrupted,
}

/// Resolves once Ctrl+C has been pressed, or never if it can't be listened for.
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    if shutdown.wait_for(|&stop| stop).await.is_err() {
        future::pending::<()>().await;
    }
}

/// Scans, asks which device to connect to, and monitors it, until the user quits.
async fn run_menu(
    session: &KukirinSession,
    config: &Config,
    hud: &Hud,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<(), Report> {
    loop {
        hud.status(&format!(
            "Scanning for {}s… (close other BT apps)",
            config.scan_duration.as_secs()
        ));
        let devices = tokio::select! {
            devices = session.scan(config.scan_duration) => devices?,
            _ = wait_for_shutdown(shutdown) => {
                println!();
                return Ok(());
            }
        };
        if devices.is_empty() {
            println!("No BLE devices found.");
            return Ok(());
        }

        let choice = tokio::select! {
            choice = choose_device(&devices, config) => choice?,
            _ = wait_for_shutdown(shutdown) => Choice::Quit,
        };
        let device = match choice {
            Choice::Quit => return Ok(()),
            Choice::Rescan => continue,
            Choice::Invalid(message) => {
                println!("{}", message);
                continue;
            }
            Choice::Device(index) => &devices[index],
        };

        match run_session(session, device, config, hud, shutdown).await {
            Ok(SessionEnd::Interrupted) => return Ok(()),
            Ok(SessionEnd::Disconnected) => {
                hud.status(&format!("{} disconnected.", device.mac_address));
            }
            Err(e) => println!("Session error: {:?}", e),
        }
        println!();
    }
}

/// Picks the configured device if the scan found it, otherwise asks.
async fn choose_device(devices: &[DeviceProps], config: &Config) -> Result<Choice, Report> {
    if let Some(address) = &config.device_address {
        if let Some(index) = devices
            .iter()
            .position(|device| device.mac_address == *address)
        {
            return Ok(Choice::Device(index));
        }
        println!("{} not found, choose another device.", address);
    }

    print!("{}", format_table(devices));
    prompt_choice(devices.len()).await
}

/// Runs `cleanup` if `result` is an error, then passes the result on.
async fn or_cleanup<T, E, F: Future<Output = ()>>(
    result: Result<T, E>,
    cleanup: impl FnOnce() -> F,
) -> Result<T, E> {
    if result.is_err() {
        cleanup().await;
    }
    result
}

/// Connects to the given device and shows its riding mode until it disconnects or the user presses
/// Ctrl+C. Nothing is ever written to the device, and it is always disconnected afterwards.
async fn run_session(
    session: &KukirinSession,
    device: &DeviceProps,
    config: &Config,
    hud: &Hud,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<SessionEnd, Report> {
    let name = device.name.as_deref().unwrap_or("no name");
    hud.status(&format!("Connecting to {} ({})…", device.mac_address, name));
    let connected = tokio::select! {
        res = session.connect(&device.id, config.connect_timeout) => res,
        _ = wait_for_shutdown(shutdown) => {
            println!();
            disconnect(session, device).await;
            return Ok(SessionEnd::Interrupted);
        }
    };
    or_cleanup(connected, || disconnect(session, device))
        .await
        .wrap_err_with(|| format!("Connecting to {}", device.mac_address))?;

    hud.status("Connected. Subscribing to FFF2 (READ-ONLY)…");
    let subscription = session.start_notify_status(&device.id).await;
    let (status, events) = or_cleanup(subscription, || disconnect(session, device))
        .await
        .wrap_err_with(|| format!("Starting notifications on {}", device.mac_address))?;

    let end = show_modes(events, hud, shutdown).await;

    if let Err(e) = session.stop_notify_status(&status).await {
        debug!("Failed to stop notifications: {}", e);
    }
    hud.finish();
    disconnect(session, device).await;
    Ok(end)
}

async fn disconnect(session: &KukirinSession, device: &DeviceProps) {
    if let Err(e) = session.disconnect(&device.id).await {
        debug!("Failed to disconnect from {}: {}", device.mac_address, e);
    }
}

/// Feeds status frames through a fresh `ModeMonitor`, showing each mode change, until the device
/// disconnects or the user presses Ctrl+C.
async fn show_modes(
    mut events: impl Stream<Item = KukirinEvent> + Unpin,
    hud: &Hud,
    shutdown: &mut watch::Receiver<bool>,
) -> SessionEnd {
    let mut monitor = ModeMonitor::new();
    let end = loop {
        tokio::select! {
            event = events.next() => match event {
                Some(KukirinEvent::Frame { value }) => {
                    if let Some(mode) = monitor.process(&value) {
                        if let Err(e) = hud.show_mode(mode) {
                            warn!("Failed to show mode {}: {}", mode, e);
                        }
                    }
                }
                Some(KukirinEvent::Disconnected) | None => break SessionEnd::Disconnected,
            },
            _ = wait_for_shutdown(shutdown) => break SessionEnd::Interrupted,
        }
    };
    info!("Session ended ({:?}): {}", end, monitor.stats());
    end
}
