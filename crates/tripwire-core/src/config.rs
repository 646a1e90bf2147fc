//! tripwire.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::types::{Address, AmountError, DEFAULT_THRESHOLD_WEI, Wei, parse_wei};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";
const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_BLOCK_SAMPLE_SIZE: usize = 2;
const DEFAULT_RESPONSE_FUNCTION: &str = "responseCallback(string)";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("invalid threshold: {0}")]
    Threshold(String),

    #[error("block_sample_size must be at least 2, got {0}")]
    SampleSize(usize),

    #[error("invalid duration: {0}")]
    Duration(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripwireConfig {
    pub subject: SubjectConfig,
    pub trap: Option<TrapSettings>,
    pub rpc: Option<RpcConfig>,
    pub response: Option<ResponseConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectConfig {
    /// Account whose native balance is watched.
    pub address: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrapSettings {
    pub threshold_wei: Option<AmountSetting>,
    pub block_sample_size: Option<usize>,
    pub cooldown_period_blocks: Option<u64>,
}

/// An amount written either as a TOML integer or as a string such as
/// `"0.01 ether"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum AmountSetting {
    Integer(u64),
    Text(String),
}

impl AmountSetting {
    pub fn to_wei(&self) -> Result<Wei, AmountError> {
        match self {
            AmountSetting::Integer(n) => Ok(Wei::from(*n)),
            AmountSetting::Text(s) => parse_wei(s),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    pub url: String,
    pub timeout: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseConfig {
    /// Signature of the sink's receiving operation.
    pub function: Option<String>,
    /// HTTP endpoint receiving alerts. Alerts are only logged when unset.
    pub webhook: Option<String>,
    pub timeout: Option<String>,
}

impl TripwireConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&content)?;
        Ok(config)
    }

    /// Parse and validate a config document.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: TripwireConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every derived setting once so later accessors cannot fail
    /// on a config that passed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.threshold()?;
        if threshold == 0 {
            return Err(ConfigError::Threshold("must be greater than zero".to_string()));
        }
        let size = self.block_sample_size();
        if size < 2 {
            return Err(ConfigError::SampleSize(size));
        }
        self.rpc_timeout()?;
        self.response_timeout()?;
        Ok(())
    }

    pub fn threshold(&self) -> Result<Wei, ConfigError> {
        match self.trap.as_ref().and_then(|t| t.threshold_wei.as_ref()) {
            Some(amount) => amount
                .to_wei()
                .map_err(|e| ConfigError::Threshold(e.to_string())),
            None => Ok(DEFAULT_THRESHOLD_WEI),
        }
    }

    pub fn block_sample_size(&self) -> usize {
        self.trap
            .as_ref()
            .and_then(|t| t.block_sample_size)
            .unwrap_or(DEFAULT_BLOCK_SAMPLE_SIZE)
    }

    pub fn cooldown_period_blocks(&self) -> u64 {
        self.trap
            .as_ref()
            .and_then(|t| t.cooldown_period_blocks)
            .unwrap_or(0)
    }

    pub fn rpc_url(&self) -> &str {
        self.rpc
            .as_ref()
            .map(|r| r.url.as_str())
            .unwrap_or(DEFAULT_RPC_URL)
    }

    pub fn rpc_timeout(&self) -> Result<Duration, ConfigError> {
        optional_duration(self.rpc.as_ref().and_then(|r| r.timeout.as_deref()))
    }

    pub fn response_function(&self) -> &str {
        self.response
            .as_ref()
            .and_then(|r| r.function.as_deref())
            .unwrap_or(DEFAULT_RESPONSE_FUNCTION)
    }

    pub fn webhook(&self) -> Option<&str> {
        self.response.as_ref().and_then(|r| r.webhook.as_deref())
    }

    pub fn response_timeout(&self) -> Result<Duration, ConfigError> {
        optional_duration(self.response.as_ref().and_then(|r| r.timeout.as_deref()))
    }

    /// Scaffold a tripwire.toml watching the given account.
    pub fn scaffold(address: Address) -> Self {
        TripwireConfig {
            subject: SubjectConfig { address },
            trap: Some(TrapSettings {
                threshold_wei: Some(AmountSetting::Text("0.01 ether".to_string())),
                block_sample_size: Some(DEFAULT_BLOCK_SAMPLE_SIZE),
                cooldown_period_blocks: Some(0),
            }),
            rpc: Some(RpcConfig {
                url: DEFAULT_RPC_URL.to_string(),
                timeout: Some("5s".to_string()),
            }),
            response: Some(ResponseConfig {
                function: Some(DEFAULT_RESPONSE_FUNCTION.to_string()),
                webhook: None,
                timeout: None,
            }),
        }
    }
}

fn optional_duration(value: Option<&str>) -> Result<Duration, ConfigError> {
    match value {
        Some(s) => parse_duration(s).ok_or_else(|| ConfigError::Duration(s.to_string())),
        None => Ok(DEFAULT_RPC_TIMEOUT),
    }
}

/// Parse a duration string like "5s", "500ms", "1m".
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(secs) = s.strip_suffix('s') {
        if let Some(ms) = secs.strip_suffix('m') {
            ms.parse::<u64>().ok().map(Duration::from_millis)
        } else {
            secs.parse::<u64>().ok().map(Duration::from_secs)
        }
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "0x3fc91a3afd70395cd496c647d5a6cc9d4b2b7fad";

    #[test]
    fn test_scaffold() {
        let config = TripwireConfig::scaffold(ADDR.parse().unwrap());
        let toml_str = config.to_toml_string().unwrap();
        assert!(toml_str.contains(ADDR));
        assert!(toml_str.contains("0.01 ether"));
        assert!(toml_str.contains("responseCallback(string)"));
    }

    #[test]
    fn test_scaffold_reparses() {
        let config = TripwireConfig::scaffold(ADDR.parse().unwrap());
        let toml_str = config.to_toml_string().unwrap();
        let back = TripwireConfig::parse(&toml_str).unwrap();
        assert_eq!(back.threshold().unwrap(), DEFAULT_THRESHOLD_WEI);
    }

    #[test]
    fn test_parse_minimal() {
        let toml_str = format!(
            r#"
[subject]
address = "{ADDR}"
"#
        );
        let config = TripwireConfig::parse(&toml_str).unwrap();
        assert_eq!(config.subject.address.to_string(), ADDR);
        assert_eq!(config.threshold().unwrap(), DEFAULT_THRESHOLD_WEI);
        assert_eq!(config.block_sample_size(), 2);
        assert_eq!(config.cooldown_period_blocks(), 0);
        assert_eq!(config.rpc_url(), "http://127.0.0.1:8545");
        assert_eq!(config.rpc_timeout().unwrap(), Duration::from_secs(5));
        assert_eq!(config.response_function(), "responseCallback(string)");
        assert!(config.webhook().is_none());
    }

    #[test]
    fn test_parse_full() {
        let toml_str = format!(
            r#"
[subject]
address = "{ADDR}"

[trap]
threshold_wei = 10
block_sample_size = 5
cooldown_period_blocks = 3

[rpc]
url = "http://node.internal:8545/rpc"
timeout = "750ms"

[response]
function = "freeze(string)"
webhook = "http://alerts.internal/hook"
timeout = "2s"
"#
        );
        let config = TripwireConfig::parse(&toml_str).unwrap();
        assert_eq!(config.threshold().unwrap(), 10);
        assert_eq!(config.block_sample_size(), 5);
        assert_eq!(config.cooldown_period_blocks(), 3);
        assert_eq!(config.rpc_url(), "http://node.internal:8545/rpc");
        assert_eq!(config.rpc_timeout().unwrap(), Duration::from_millis(750));
        assert_eq!(config.response_function(), "freeze(string)");
        assert_eq!(config.webhook(), Some("http://alerts.internal/hook"));
        assert_eq!(config.response_timeout().unwrap(), Duration::from_secs(2));
    }

    #[test]
    fn test_threshold_as_string_exceeds_toml_integer() {
        let toml_str = format!(
            r#"
[subject]
address = "{ADDR}"

[trap]
threshold_wei = "100000000000000000000000"
"#
        );
        let config = TripwireConfig::parse(&toml_str).unwrap();
        assert_eq!(config.threshold().unwrap(), 100_000_000_000_000_000_000_000);
    }

    #[test]
    fn test_rejects_zero_threshold() {
        let toml_str = format!(
            r#"
[subject]
address = "{ADDR}"

[trap]
threshold_wei = 0
"#
        );
        assert!(matches!(
            TripwireConfig::parse(&toml_str),
            Err(ConfigError::Threshold(_))
        ));
    }

    #[test]
    fn test_rejects_small_sample_size() {
        let toml_str = format!(
            r#"
[subject]
address = "{ADDR}"

[trap]
block_sample_size = 1
"#
        );
        assert!(matches!(
            TripwireConfig::parse(&toml_str),
            Err(ConfigError::SampleSize(1))
        ));
    }

    #[test]
    fn test_rejects_bad_address() {
        let toml_str = r#"
[subject]
address = "0x1234"
"#;
        assert!(matches!(
            TripwireConfig::parse(toml_str),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_rejects_bad_timeout() {
        let toml_str = format!(
            r#"
[subject]
address = "{ADDR}"

[rpc]
url = "http://127.0.0.1:8545"
timeout = "soon"
"#
        );
        assert!(matches!(
            TripwireConfig::parse(&toml_str),
            Err(ConfigError::Duration(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tripwire.toml");
        let config = TripwireConfig::scaffold(ADDR.parse().unwrap());
        std::fs::write(&path, config.to_toml_string().unwrap()).unwrap();

        let loaded = TripwireConfig::from_file(&path).unwrap();
        assert_eq!(loaded.subject.address, config.subject.address);
    }

    #[test]
    fn test_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = TripwireConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn parse_duration_values() {
        assert_eq!(parse_duration("5s"), Some(Duration::from_secs(5)));
        assert_eq!(parse_duration("500ms"), Some(Duration::from_millis(500)));
        assert_eq!(parse_duration("2m"), Some(Duration::from_secs(120)));
        assert_eq!(parse_duration("10"), Some(Duration::from_secs(10)));
        assert_eq!(parse_duration("soon"), None);
    }

    #[test]
    fn parse_duration_rejects_minute_overflow() {
        assert_eq!(parse_duration("999999999999999999m"), None);
        assert_eq!(
            parse_duration("307445734561825860m"),
            Some(Duration::from_secs(307_445_734_561_825_860 * 60))
        );
    }

    #[test]
    fn test_rejects_overflowing_timeout() {
        let toml_str = format!(
            r#"
[subject]
address = "{ADDR}"

[rpc]
url = "http://127.0.0.1:8545"
timeout = "999999999999999999m"
"#
        );
        assert!(matches!(
            TripwireConfig::parse(&toml_str),
            Err(ConfigError::Duration(_))
        ));
    }
}
