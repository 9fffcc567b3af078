use spinwheel_shared::{CatalogError, GameRules, Prize, PrizeCatalog, SpinTuning};
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_STORAGE_PATH: &str = "spinwheel-state.json";

#[derive(Debug)]
pub enum ConfigError {
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
    CatalogFile {
        path: PathBuf,
        reason: String,
    },
    Catalog(CatalogError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid { key, value, reason } => {
                write!(f, "invalid {}='{}': {}", key, value, reason)
            }
            ConfigError::CatalogFile { path, reason } => {
                write!(f, "could not read catalog {}: {}", path.display(), reason)
            }
            ConfigError::Catalog(e) => write!(f, "invalid prize catalog: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<CatalogError> for ConfigError {
    fn from(err: CatalogError) -> Self {
        ConfigError::Catalog(err)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub storage_path: PathBuf,
    pub catalog_path: Option<PathBuf>,
    pub rules: GameRules,
    pub tuning: SpinTuning,
}

fn parse_value<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = match lookup("BIND_ADDR") {
            Some(raw) => parse_value("BIND_ADDR", &raw)?,
            None => parse_value("BIND_ADDR", DEFAULT_BIND_ADDR)?,
        };
        let storage_path = lookup("STORAGE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_PATH));
        let catalog_path = lookup("CATALOG_PATH")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        let max_claimable = match lookup("MAX_CLAIMABLE") {
            Some(raw) if !raw.trim().is_empty() => {
                let max: f64 = parse_value("MAX_CLAIMABLE", &raw)?;
                if !max.is_finite() || max < 0.0 {
                    return Err(ConfigError::Invalid {
                        key: "MAX_CLAIMABLE",
                        value: raw,
                        reason: "must be a non-negative amount".to_string(),
                    });
                }
                Some(max)
            }
            _ => None,
        };

        let rules = GameRules {
            max_claimable,
            one_spin_lock: match lookup("ONE_SPIN_LOCK") {
                Some(raw) => parse_flag("ONE_SPIN_LOCK", &raw)?,
                None => false,
            },
            require_channel_verification: match lookup("REQUIRE_CHANNEL_VERIFICATION") {
                Some(raw) => parse_flag("REQUIRE_CHANNEL_VERIFICATION", &raw)?,
                None => false,
            },
        };

        let defaults = SpinTuning::default();
        let tuning = SpinTuning {
            jitter_fraction: match lookup("JITTER_FRACTION") {
                Some(raw) => parse_value("JITTER_FRACTION", &raw)?,
                None => defaults.jitter_fraction,
            },
            min_spins: match lookup("MIN_SPINS") {
                Some(raw) => parse_value("MIN_SPINS", &raw)?,
                None => defaults.min_spins,
            },
            max_extra_spins: match lookup("MAX_EXTRA_SPINS") {
                Some(raw) => parse_value("MAX_EXTRA_SPINS", &raw)?,
                None => defaults.max_extra_spins,
            },
            duration_ms: match lookup("SPIN_DURATION_MS") {
                Some(raw) => parse_value("SPIN_DURATION_MS", &raw)?,
                None => defaults.duration_ms,
            },
        };
        tuning.validate().map_err(|reason| ConfigError::Invalid {
            key: "SPIN_TUNING",
            value: format!("{:?}", tuning),
            reason,
        })?;

        Ok(Self {
            bind_addr,
            storage_path,
            catalog_path,
            rules,
            tuning,
        })
    }

    /// The configured catalog, or the built-in one when no file is set.
    pub fn load_catalog(&self) -> Result<PrizeCatalog, ConfigError> {
        let Some(path) = &self.catalog_path else {
            return Ok(PrizeCatalog::perunnal());
        };
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::CatalogFile {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        let prizes: Vec<Prize> =
            serde_json::from_str(&raw).map_err(|e| ConfigError::CatalogFile {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        Ok(PrizeCatalog::new(prizes)?)
    }
}
