//! A library for reading the riding mode of KuKirin scooters (such as the G4) over Bluetooth Low
//! Energy.
//!
//! The scooter controller sends status frames as notifications on the FFF2 characteristic. This
//! crate never writes anything to the scooter; it only listens.
//!
//! Start by creating a [`KukirinSession`], then feed the frames from its event stream into a
//! [`ModeMonitor`] to get riding mode changes.

pub mod decode;
pub mod monitor;
pub mod tracker;

pub use bluez_async::{
    BluetoothError, BluetoothSession, CharacteristicId, DeviceId, MacAddress, SpawnError,
};
pub use decode::Mode;
pub use monitor::{ModeMonitor, MonitorStats};
pub use tracker::ChangeTracker;

use bluez_async::{
    BluetoothEvent, CharacteristicEvent, CharacteristicInfo, DeviceEvent, DeviceInfo,
};
use futures::future;
use futures::{Stream, StreamExt};
use log::{debug, trace, warn};
use std::cmp::Reverse;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time;
use uuid::Uuid;

/// The characteristic on which the scooter controller sends status frames.
pub const STATUS_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x0000fff2_0000_1000_8000_00805f9b34fb);

/// An error connecting to or subscribing to a scooter.
#[derive(Debug, Error)]
pub enum SessionError {
    /// There was an error talking to BlueZ.
    #[error(transparent)]
    Bluetooth(#[from] BluetoothError),
    /// The connection wasn't established within the time limit.
    #[error("Timed out connecting to {0}")]
    ConnectTimedOut(DeviceId),
    /// BlueZ claimed to have connected, but the device doesn't report being connected.
    #[error("Could not connect to {0}")]
    NotConnected(DeviceId),
}

/// A Bluetooth device which was found by a scan.
#[derive(Clone, Debug)]
pub struct DeviceProps {
    /// An opaque identifier for the device, including a reference to which Bluetooth adapter it was
    /// discovered on. This can be used to connect to it.
    pub id: DeviceId,
    /// The MAC address of the device.
    pub mac_address: MacAddress,
    /// The advertised name of the device, if any.
    pub name: Option<String>,
    /// Signal strength of the most recent advertisement.
    pub rssi: Option<i16>,
}

impl From<DeviceInfo> for DeviceProps {
    fn from(info: DeviceInfo) -> Self {
        Self {
            id: info.id,
            mac_address: info.mac_address,
            name: info.name,
            rssi: info.rssi,
        }
    }
}

/// An event from the scooter which is being monitored.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum KukirinEvent {
    /// A notification was received on the status characteristic. It may or may not be a valid
    /// status frame.
    Frame { value: Vec<u8> },
    /// The Bluetooth connection to the scooter has been lost.
    Disconnected,
}

impl KukirinEvent {
    fn from_bluetooth(event: BluetoothEvent, status: &CharacteristicId) -> Option<Self> {
        match event {
            BluetoothEvent::Characteristic {
                id,
                event: CharacteristicEvent::Value { value },
            } => Self::from_value(id == *status, value),
            BluetoothEvent::Device { event, .. } => Self::from_device_event(event),
            _ => None,
        }
    }

    /// Values of characteristics other than the status characteristic are dropped.
    fn from_value(is_status: bool, value: Vec<u8>) -> Option<Self> {
        is_status.then(|| Self::Frame { value })
    }

    fn from_device_event(event: DeviceEvent) -> Option<Self> {
        match event {
            DeviceEvent::Connected { connected: false } => Some(Self::Disconnected),
            _ => None,
        }
    }
}

/// A wrapper around a Bluetooth session which adds some methods for dealing with KuKirin scooters.
/// The underlying Bluetooth session may still be accessed.
pub struct KukirinSession {
    pub bt_session: BluetoothSession,
}

impl KukirinSession {
    /// Returns a tuple of (join handle, Self).
    /// If the join handle ever completes then you're in trouble and should
    /// probably restart the process.
    pub async fn new(
    ) -> Result<(impl Future<Output = Result<(), SpawnError>>, Self), BluetoothError> {
        let (handle, bt_session) = BluetoothSession::new().await?;
        Ok((handle, KukirinSession { bt_session }))
    }

    /// Scans for Bluetooth devices for the given time, and returns all devices which are known
    /// afterwards, strongest signal first.
    ///
    /// Nothing is filtered out, as scooters don't all advertise the same name.
    pub async fn scan(&self, duration: Duration) -> Result<Vec<DeviceProps>, BluetoothError> {
        self.bt_session.start_discovery().await?;
        time::sleep(duration).await;
        let devices = self.bt_session.get_devices().await?;
        if let Err(e) = self.bt_session.stop_discovery().await {
            warn!("Failed to stop discovery: {}", e);
        }

        let mut devices: Vec<DeviceProps> = devices
            .into_iter()
            .map(|device| {
                trace!(
                    "{} ({:?}): RSSI {:?}",
                    device.mac_address,
                    device.name,
                    device.rssi
                );
                DeviceProps::from(device)
            })
            .collect();
        sort_strongest_first(&mut devices, |device| device.rssi);
        Ok(devices)
    }

    /// Connects to the given device, giving up after `timeout`.
    ///
    /// On error the connection attempt may still be in progress in BlueZ, so the caller should
    /// call `disconnect` before trying again.
    pub async fn connect(&self, id: &DeviceId, timeout: Duration) -> Result<(), SessionError> {
        time::timeout(timeout, self.bt_session.connect(id))
            .await
            .map_err(|_| SessionError::ConnectTimedOut(id.to_owned()))??;
        if !self.bt_session.get_device_info(id).await?.connected {
            return Err(SessionError::NotConnected(id.to_owned()));
        }
        Ok(())
    }

    pub async fn disconnect(&self, id: &DeviceId) -> Result<(), BluetoothError> {
        self.bt_session.disconnect(id).await
    }

    /// Finds the status characteristic among all the GATT services of the given device.
    ///
    /// The device must already be connected.
    pub async fn find_status_characteristic(
        &self,
        id: &DeviceId,
    ) -> Result<CharacteristicInfo, BluetoothError> {
        for service in self.bt_session.get_services(id).await? {
            let characteristics = self.bt_session.get_characteristics(&service.id).await?;
            if let Some(characteristic) = characteristics
                .into_iter()
                .find(|characteristic| characteristic.uuid == STATUS_CHARACTERISTIC_UUID)
            {
                debug!(
                    "Found status characteristic {:?} in service {}",
                    characteristic.id, service.uuid
                );
                return Ok(characteristic);
            }
        }
        Err(BluetoothError::UuidNotFound {
            uuid: STATUS_CHARACTERISTIC_UUID,
        })
    }

    /// Assuming that the given device is a connected scooter, subscribes to notifications of status
    /// frames.
    ///
    /// Returns the ID of the status characteristic, which should be passed to
    /// `stop_notify_status` when done, and a stream of frames and disconnection events for the
    /// device. The stream is set up before notifications start, so no frames are missed.
    pub async fn start_notify_status(
        &self,
        id: &DeviceId,
    ) -> Result<(CharacteristicId, impl Stream<Item = KukirinEvent> + Unpin), BluetoothError>
    {
        let status = self.find_status_characteristic(id).await?.id;
        let events = self.bt_session.device_event_stream(id).await?;
        self.bt_session.start_notify(&status).await?;

        let status_filter = status.clone();
        let events = events.filter_map(move |event| {
            future::ready(KukirinEvent::from_bluetooth(event, &status_filter))
        });
        Ok((status, Box::pin(events)))
    }

    pub async fn stop_notify_status(&self, status: &CharacteristicId) -> Result<(), BluetoothError> {
        self.bt_session.stop_notify(status).await
    }
}

/// Sorts by signal strength, strongest first. Items without a signal strength go last, and the
/// order is otherwise kept.
fn sort_strongest_first<T>(items: &mut [T], rssi: impl Fn(&T) -> Option<i16>) {
    items.sort_by_key(|item| Reverse(rssi(item).unwrap_or(i16::MIN)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_characteristic_uuid() {
        assert_eq!(
            STATUS_CHARACTERISTIC_UUID.to_string(),
            "0000fff2-0000-1000-8000-00805f9b34fb"
        );
    }

    #[test]
    fn sort_by_signal() {
        let mut devices = vec![
            ("far", Some(-90)),
            ("silent", None),
            ("near", Some(-40)),
            ("quiet", None),
            ("middle", Some(-65)),
        ];
        sort_strongest_first(&mut devices, |(_, rssi)| *rssi);
        let names: Vec<&str> = devices.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["near", "middle", "far", "silent", "quiet"]);
    }

    #[test]
    fn status_value_is_frame() {
        assert_eq!(
            KukirinEvent::from_value(true, vec![0, 0, 0, 0, 0, 1, 0]),
            Some(KukirinEvent::Frame {
                value: vec![0, 0, 0, 0, 0, 1, 0]
            })
        );
    }

    #[test]
    fn other_characteristic_value_dropped() {
        assert_eq!(KukirinEvent::from_value(false, vec![0, 0, 0, 0, 0, 1, 0]), None);
    }

    #[test]
    fn disconnect_event() {
        assert_eq!(
            KukirinEvent::from_device_event(DeviceEvent::Connected { connected: false }),
            Some(KukirinEvent::Disconnected)
        );
        assert_eq!(
            KukirinEvent::from_device_event(DeviceEvent::Connected { connected: true }),
            None
        );
    }
}
