//! Startup configuration.

use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::path::PathBuf;

use clap::Parser;

use crate::Throttle;

/// Command line and environment configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "esi", version, about = "REST service for email account profiles")]
pub struct Config {
    /// Directory holding one JSON file per account.
    #[arg(short, long, env = "ESI_DIRECTORY")]
    pub directory: Option<PathBuf>,

    /// Address to listen on.
    #[arg(short, long, env = "ESI_BIND", default_value = "127.0.0.1:8080")]
    pub bind: SocketAddr,

    /// Disable the audit log.
    #[arg(long, env = "ESI_NO_AUDIT")]
    pub no_audit: bool,

    /// Requests a client may send at once before being throttled.
    #[arg(long, env = "ESI_THROTTLE_BURST", default_value = "10")]
    pub throttle_burst: NonZeroU32,

    /// Sustained requests per second allowed per client.
    #[arg(long, env = "ESI_THROTTLE_RATE", default_value = "5")]
    pub throttle_rate: NonZeroU32,

    /// Disable per-client rate limiting.
    #[arg(long, env = "ESI_NO_THROTTLE")]
    pub no_throttle: bool,
}

impl Config {
    /// Store directory, defaulting to `<data dir>/esi/accounts`.
    #[must_use]
    pub fn store_directory(&self) -> PathBuf {
        self.directory.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("esi")
                .join("accounts")
        })
    }

    /// Whether the audit log is enabled.
    #[must_use]
    pub const fn audit(&self) -> bool {
        !self.no_audit
    }

    /// Per-client rate limit, unless disabled.
    #[must_use]
    pub fn throttle(&self) -> Option<Throttle> {
        (!self.no_throttle).then(|| Throttle::new(self.throttle_burst, self.throttle_rate))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["esi"]).unwrap();
        assert_eq!(config.bind, "127.0.0.1:8080".parse().unwrap());
        assert!(config.audit());
        assert!(config.store_directory().ends_with("esi/accounts"));
        assert_eq!(config.throttle_burst.get(), 10);
        assert_eq!(config.throttle().unwrap().rate().get(), 5);
    }

    #[test]
    fn explicit_values() {
        let config = Config::try_parse_from([
            "esi",
            "--directory",
            "/srv/accounts",
            "-b",
            "0.0.0.0:9000",
            "--no-audit",
        ])
        .unwrap();
        assert_eq!(config.store_directory(), PathBuf::from("/srv/accounts"));
        assert_eq!(config.bind.port(), 9000);
        assert!(!config.audit());
    }

    #[test]
    fn throttle_settings() {
        let config = Config::try_parse_from([
            "esi",
            "--throttle-burst",
            "20",
            "--throttle-rate",
            "2",
        ])
        .unwrap();
        assert_eq!(config.throttle_burst.get(), 20);
        assert_eq!(config.throttle().unwrap().rate().get(), 2);

        let config = Config::try_parse_from(["esi", "--no-throttle"]).unwrap();
        assert!(config.throttle().is_none());

        assert!(Config::try_parse_from(["esi", "--throttle-rate", "0"]).is_err());
    }

    #[test]
    fn rejects_bad_address() {
        assert!(Config::try_parse_from(["esi", "--bind", "nowhere"]).is_err());
    }
}
