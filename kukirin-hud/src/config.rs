use eyre::{Report, WrapErr};
use kukirin::MacAddress;
use serde::{Deserialize as _, Deserializer};
use serde_derive::Deserialize;
use std::fs::read_to_string;
use std::path::Path;
use std::time::Duration;

const CONFIG_FILENAME: &str = "kukirin-hud.toml";
const DEFAULT_SCAN_DURATION: Duration = Duration::from_secs(6);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// How long to scan for devices before showing the list.
    #[serde(deserialize_with = "de_duration_seconds", rename = "scan_seconds")]
    pub scan_duration: Duration,
    #[serde(
        deserialize_with = "de_duration_seconds",
        rename = "connect_timeout_seconds"
    )]
    pub connect_timeout: Duration,
    /// Whether to use ANSI colours.
    pub colour: bool,
    /// If set, connect to this device as soon as a scan finds it rather than asking.
    #[serde(deserialize_with = "de_mac_address")]
    pub device_address: Option<MacAddress>,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            scan_duration: DEFAULT_SCAN_DURATION,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            colour: true,
            device_address: None,
        }
    }
}

impl Config {
    /// Reads the config file from the current directory, or uses the defaults if there isn't one.
    pub fn from_file() -> Result<Config, Report> {
        if Path::new(CONFIG_FILENAME).exists() {
            Config::read(CONFIG_FILENAME)
        } else {
            log::info!("No {} found, using defaults.", CONFIG_FILENAME);
            Ok(Config::default())
        }
    }

    fn read(filename: &str) -> Result<Config, Report> {
        let config_file =
            read_to_string(filename).wrap_err_with(|| format!("Reading {filename}"))?;
        toml::from_str(&config_file).wrap_err_with(|| format!("Parsing {filename}"))
    }
}

/// Deserialize an integer as a number of seconds.
fn de_duration_seconds<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
    let seconds = u64::deserialize(d)?;
    Ok(Duration::from_secs(seconds))
}

fn de_mac_address<'de, D: Deserializer<'de>>(d: D) -> Result<Option<MacAddress>, D::Error> {
    let address = String::deserialize(d)?;
    address.parse().map(Some).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Parsing the example config file should not give any errors.
    #[test]
    fn example_config() {
        Config::read("kukirin-hud.example.toml").unwrap();
    }

    /// Parsing an empty config file should give the defaults.
    #[test]
    fn empty_config() {
        let config = toml::from_str::<Config>("").unwrap();
        assert_eq!(config.scan_duration, Duration::from_secs(6));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert!(config.colour);
        assert_eq!(config.device_address, None);
    }

    #[test]
    fn device_address() {
        let config = toml::from_str::<Config>(r#"device_address = "AA:BB:CC:DD:EE:FF""#).unwrap();
        assert_eq!(
            config.device_address,
            Some("AA:BB:CC:DD:EE:FF".parse().unwrap())
        );
    }

    #[test]
    fn invalid_device_address() {
        assert!(toml::from_str::<Config>(r#"device_address = "scooter""#).is_err());
    }

    #[test]
    fn unknown_field() {
        assert!(toml::from_str::<Config>("scan_minutes = 1").is_err());
    }
}
