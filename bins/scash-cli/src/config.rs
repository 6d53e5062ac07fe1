//! CLI configuration loaded from environment variables.
//!
//! Every value has a default; command-line flags override the environment.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use scash_core::network::{Network, NetworkParams};
use scash_wallet::default_file_name;

/// Default node JSON-RPC endpoint.
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8332";

/// Default RPC request timeout in milliseconds.
pub const DEFAULT_RPC_TIMEOUT_MS: u64 = 8_000;

/// Default confirmation target for fee estimation, in blocks.
pub const DEFAULT_CONF_TARGET: u16 = 6;

#[derive(Clone, Debug)]
pub struct CliConfig {
    pub network: Network,
    /// Node JSON-RPC endpoint. Credentials go in the URL userinfo.
    pub rpc_url: String,
    pub rpc_timeout: Duration,
    /// Confirmation target passed to `estimatesmartfee`.
    pub conf_target: u16,
    /// Directory holding the wallet file and pending ledger.
    pub data_dir: PathBuf,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl CliConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let testnet = match get("SCASH_TESTNET") {
            Some(v) => parse_bool(&v).context("SCASH_TESTNET must be a boolean")?,
            None => false,
        };

        let rpc_url = get("SCASH_RPC_URL").unwrap_or_else(|| DEFAULT_RPC_URL.to_string());

        let rpc_timeout_ms: u64 = get("SCASH_RPC_TIMEOUT_MS")
            .unwrap_or_else(|| DEFAULT_RPC_TIMEOUT_MS.to_string())
            .parse()
            .context("SCASH_RPC_TIMEOUT_MS must be a positive integer")?;

        let conf_target: u16 = get("SCASH_CONF_TARGET")
            .unwrap_or_else(|| DEFAULT_CONF_TARGET.to_string())
            .parse()
            .context("SCASH_CONF_TARGET must be a positive integer")?;
        if conf_target == 0 {
            bail!("SCASH_CONF_TARGET must be at least 1");
        }

        let data_dir = get("SCASH_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        let log_level = get("SCASH_LOG").unwrap_or_else(|| "info".to_string());

        Ok(CliConfig {
            network: Network::from_testnet_flag(testnet),
            rpc_url,
            rpc_timeout: Duration::from_millis(rpc_timeout_ms),
            conf_target,
            data_dir,
            log_level,
        })
    }

    pub fn params(&self) -> &'static NetworkParams {
        self.network.params()
    }

    /// Default wallet backup path for the configured network.
    pub fn wallet_path(&self) -> PathBuf {
        self.data_dir.join(default_file_name(self.params()))
    }

    /// Pending ledger path for the configured network.
    pub fn pending_path(&self) -> PathBuf {
        match self.network {
            Network::Mainnet => self.data_dir.join("pending.json"),
            Network::Testnet => self.data_dir.join("pending-testnet.json"),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("scash")
}

fn parse_bool(s: &str) -> Result<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => bail!("not a boolean: {other}"),
    }
}
