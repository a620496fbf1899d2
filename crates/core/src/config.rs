use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpanlinkError};
use crate::time::DayBucket;

/// Immutable parameters for one dependency-job run. Constructed once,
/// validated up front, never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobConfig {
    pub keyspace: String,
    pub contact_points: Vec<String>,
    pub day: DayBucket,
}

impl JobConfig {
    pub fn new(
        keyspace: impl Into<String>,
        contact_points: Vec<String>,
        day: DayBucket,
    ) -> Result<Self> {
        let keyspace = keyspace.into();
        if keyspace.is_empty() {
            return Err(SpanlinkError::InvalidArgument(
                "keyspace cannot be empty".to_string(),
            ));
        }
        if contact_points.is_empty() {
            return Err(SpanlinkError::InvalidArgument(
                "at least one contact point is required".to_string(),
            ));
        }
        for point in &contact_points {
            validate_contact_point(point)?;
        }
        Ok(Self {
            keyspace,
            contact_points,
            day,
        })
    }
}

fn validate_contact_point(point: &str) -> Result<()> {
    let Some((host, port)) = point.rsplit_once(':') else {
        return Err(SpanlinkError::InvalidArgument(format!(
            "contact point must be host:port, got {point}"
        )));
    };
    if host.is_empty() {
        return Err(SpanlinkError::InvalidArgument(format!(
            "contact point has empty host: {point}"
        )));
    }
    port.parse::<u16>().map_err(|e| {
        SpanlinkError::InvalidArgument(format!("bad port in contact point {point}: {e}"))
    })?;
    Ok(())
}

/// Tunables for the ingestion path. Defaults match the source system:
/// 100-span chunks, 100 ms drain poll, no drain timeout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestSettings {
    pub chunk_size: usize,
    pub poll_interval: Duration,
    pub drain_timeout: Option<Duration>,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            chunk_size: 100,
            poll_interval: Duration::from_millis(100),
            drain_timeout: None,
        }
    }
}

impl IngestSettings {
    pub fn load() -> Result<Self> {
        let mut settings = Self::default();
        let config_path = config_file_path();
        if let Some(file_overrides) = load_file_overrides(&config_path)? {
            apply_overrides(&mut settings, file_overrides, "config file")?;
        }
        let env_overrides = load_env_overrides()?;
        apply_overrides(&mut settings, env_overrides, "environment")?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_env() -> Result<Self> {
        let mut settings = Self::default();
        let env_overrides = load_env_overrides()?;
        apply_overrides(&mut settings, env_overrides, "environment")?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(SpanlinkError::Config(
                "chunk_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsOverrides {
    chunk_size: Option<usize>,
    poll_interval: Option<String>,
    drain_timeout: Option<String>,
}

fn config_file_path() -> PathBuf {
    if let Ok(path) = env::var("SPANLINK_CONFIG") {
        return PathBuf::from(path);
    }

    let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
    let config_home = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(home).join(".config"));
    config_home.join("spanlink/config.toml")
}

fn load_file_overrides(path: &PathBuf) -> Result<Option<SettingsOverrides>> {
    if !path.exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(path)
        .map_err(|e| SpanlinkError::Config(format!("failed reading {}: {e}", path.display())))?;
    let parsed: SettingsOverrides = toml::from_str(&raw)
        .map_err(|e| SpanlinkError::Config(format!("failed parsing {}: {e}", path.display())))?;
    Ok(Some(parsed))
}

fn load_env_overrides() -> Result<SettingsOverrides> {
    let chunk_size = match env::var("SPANLINK_CHUNK_SIZE") {
        Ok(v) => Some(v.parse::<usize>().map_err(|e| {
            SpanlinkError::Config(format!("bad SPANLINK_CHUNK_SIZE in environment: {e}"))
        })?),
        Err(_) => None,
    };

    Ok(SettingsOverrides {
        chunk_size,
        poll_interval: env::var("SPANLINK_POLL_INTERVAL").ok(),
        drain_timeout: env::var("SPANLINK_DRAIN_TIMEOUT").ok(),
    })
}

fn apply_overrides(
    settings: &mut IngestSettings,
    overrides: SettingsOverrides,
    source: &str,
) -> Result<()> {
    if let Some(v) = overrides.chunk_size {
        settings.chunk_size = v;
    }
    if let Some(v) = overrides.poll_interval {
        settings.poll_interval = humantime::parse_duration(&v).map_err(|e| {
            SpanlinkError::Config(format!("bad poll_interval in {source}: {e} (value={v})"))
        })?;
    }
    if let Some(v) = overrides.drain_timeout {
        settings.drain_timeout = Some(humantime::parse_duration(&v).map_err(|e| {
            SpanlinkError::Config(format!("bad drain_timeout in {source}: {e} (value={v})"))
        })?);
    }
    Ok(())
}
