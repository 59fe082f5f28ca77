use std::net::SocketAddr;
use std::str::FromStr;

use envconfig::Envconfig;

use crate::profile::{self, SensorProfile};

#[derive(Envconfig, Clone)]
pub struct Config {
    #[envconfig(default = "dht")]
    pub profile: ProfileKind,

    #[envconfig(from = "SERIAL_DEVICE", default = "/dev/ttyACM0")]
    pub serial_device: String,

    #[envconfig(from = "SERIAL_BAUD", default = "9600")]
    pub serial_baud: u32,

    #[envconfig(from = "ES_HOST", default = "http://new.cornic.net:9200")]
    pub es_host: String,

    /// Overrides the profile's default log file.
    pub log_path: Option<String>,

    #[envconfig(default = "pretty")]
    pub log_format: LogFormat,

    #[envconfig(default = "false")]
    pub print_sink: bool,

    #[envconfig(default = "false")]
    pub export_prometheus: bool,

    #[envconfig(from = "METRICS_ADDRESS", default = "127.0.0.1:9102")]
    pub metrics_address: SocketAddr,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProfileKind {
    Dht,
    WeatherStation,
}

impl ProfileKind {
    pub fn profile(&self) -> &'static SensorProfile {
        match self {
            ProfileKind::Dht => &profile::DHT,
            ProfileKind::WeatherStation => &profile::WEATHER_STATION,
        }
    }
}

impl FromStr for ProfileKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "dht" => Ok(ProfileKind::Dht),
            "weather-station" => Ok(ProfileKind::WeatherStation),
            other => Err(format!("unknown sensor profile: {other}")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Ndjson,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pretty" => Ok(LogFormat::Pretty),
            "ndjson" => Ok(LogFormat::Ndjson),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}
