use std::ffi::OsString;
use std::time::Duration;

use service_config::{ConfigError, Entry, Provider};

const ENV_PREFIX: &str = "GRACEFUL_WORKER";

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub tick_interval: Duration,
}

impl Config {
    fn provider() -> Result<Provider, ConfigError> {
        Provider::new(
            "graceful-worker",
            vec![
                Entry::new("bind-host", "", "Address to bind the HTTP server to", "0.0.0.0"),
                Entry::new("port", "p", "Port of the HTTP server", 3301u16),
                Entry::new(
                    "tick-interval-ms",
                    "t",
                    "Milliseconds between two worker ticks",
                    1000u64,
                ),
            ],
            Some(ENV_PREFIX),
        )
    }

    /// Reads flags from `args` (binary name first), then `GRACEFUL_WORKER_*` env vars.
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let mut provider = Self::provider()?;
        provider.read_args(args)?;

        let port = provider.get_uint("port")?;
        Ok(Config {
            host: provider.get_string("bind-host")?,
            port: u16::try_from(port).map_err(|_| ConfigError::InvalidValue {
                name: "port".to_string(),
                value: port.to_string(),
                kind: "port number",
            })?,
            tick_interval: Duration::from_millis(provider.get_uint("tick-interval-ms")?),
        })
    }

    pub fn usage() -> String {
        Self::provider().map(|p| p.usage()).unwrap_or_default()
    }

    /// Produce a host:port address for binding a TcpListener.
    pub fn bind(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::from_args(["graceful-worker"]).unwrap();
        assert_eq!(config.bind(), "0.0.0.0:3301");
        assert_eq!(config.tick_interval, Duration::from_secs(1));
    }

    #[test]
    fn flags() {
        let config = Config::from_args([
            "graceful-worker",
            "--bind-host",
            "127.0.0.1",
            "-p",
            "8080",
            "-t",
            "250",
        ])
        .unwrap();
        assert_eq!(config.bind(), "127.0.0.1:8080");
        assert_eq!(config.tick_interval, Duration::from_millis(250));
    }

    #[test]
    fn port_out_of_range() {
        assert!(matches!(
            Config::from_args(["graceful-worker", "--port", "70000"]),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn usage_mentions_every_setting() {
        let usage = Config::usage();
        assert!(usage.contains("--bind-host [default:0.0.0.0 (string)]"));
        assert!(usage.contains("--port (-p) [default:3301 (uint)]"));
        assert!(usage.contains("--tick-interval-ms (-t) [default:1000 (uint)]"));
    }
}
