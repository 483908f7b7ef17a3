//! Configuration module
//!
//! Environment-driven configuration for the pipeline and its backends.
//! Deployment glue loads a `.env` via `dotenvy` before calling
//! [`Config::from_env`]; the library itself only reads the process
//! environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::constants;

/// Storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Local,
    S3,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(StorageBackend::Local),
            "s3" => Ok(StorageBackend::S3),
            other => Err(ConfigError::InvalidVar {
                name: "STORAGE_BACKEND",
                value: other.to_string(),
                expected: "local | s3",
            }),
        }
    }
}

/// Progress store backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressBackend {
    Memory,
    Postgres,
}

impl FromStr for ProgressBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(ProgressBackend::Memory),
            "postgres" => Ok(ProgressBackend::Postgres),
            other => Err(ConfigError::InvalidVar {
                name: "PROGRESS_BACKEND",
                value: other.to_string(),
                expected: "memory | postgres",
            }),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {name}: {value:?} (expected {expected})")]
    InvalidVar {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct Config {
    // Routing policy
    pub hard_size_ceiling_bytes: u64,

    // Local transcoder
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub local_video_bitrate_bps: u32,
    pub encode_grace_secs: u64,

    // Remote transcoder (absent = no remote path registered)
    pub remote_transcode_url: Option<String>,
    pub remote_timeout_secs: u64,
    pub remote_max_request_bytes: u64,

    // Storage
    pub storage_backend: StorageBackend,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,

    // Progress store
    pub progress_backend: ProgressBackend,
    pub database_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hard_size_ceiling_bytes: constants::DEFAULT_HARD_SIZE_CEILING_BYTES,
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            local_video_bitrate_bps: constants::DEFAULT_LOCAL_VIDEO_BITRATE_BPS,
            encode_grace_secs: constants::DEFAULT_ENCODE_GRACE_SECS,
            remote_transcode_url: None,
            remote_timeout_secs: constants::DEFAULT_REMOTE_TIMEOUT_SECS,
            remote_max_request_bytes: constants::DEFAULT_REMOTE_MAX_REQUEST_BYTES,
            storage_backend: StorageBackend::Local,
            local_storage_path: None,
            local_storage_base_url: None,
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            progress_backend: ProgressBackend::Memory,
            database_url: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();

        Ok(Config {
            hard_size_ceiling_bytes: parse_var(
                "HARD_SIZE_CEILING_BYTES",
                defaults.hard_size_ceiling_bytes,
            )?,
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or(defaults.ffmpeg_path),
            ffprobe_path: env::var("FFPROBE_PATH").unwrap_or(defaults.ffprobe_path),
            local_video_bitrate_bps: parse_var(
                "LOCAL_VIDEO_BITRATE_BPS",
                defaults.local_video_bitrate_bps,
            )?,
            encode_grace_secs: parse_var("ENCODE_GRACE_SECS", defaults.encode_grace_secs)?,
            remote_transcode_url: optional_var("REMOTE_TRANSCODE_URL"),
            remote_timeout_secs: parse_var("REMOTE_TIMEOUT_SECS", defaults.remote_timeout_secs)?,
            remote_max_request_bytes: parse_var(
                "REMOTE_MAX_REQUEST_BYTES",
                defaults.remote_max_request_bytes,
            )?,
            storage_backend: match optional_var("STORAGE_BACKEND") {
                Some(v) => v.parse()?,
                None => defaults.storage_backend,
            },
            local_storage_path: optional_var("LOCAL_STORAGE_PATH"),
            local_storage_base_url: optional_var("LOCAL_STORAGE_BASE_URL"),
            s3_bucket: optional_var("S3_BUCKET"),
            s3_region: optional_var("S3_REGION"),
            s3_endpoint: optional_var("S3_ENDPOINT"),
            progress_backend: match optional_var("PROGRESS_BACKEND") {
                Some(v) => v.parse()?,
                None => defaults.progress_backend,
            },
            database_url: optional_var("DATABASE_URL"),
        })
    }

    /// Check cross-field consistency: each selected backend must carry the
    /// settings it needs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hard_size_ceiling_bytes == 0 {
            return Err(ConfigError::InvalidVar {
                name: "HARD_SIZE_CEILING_BYTES",
                value: "0".to_string(),
                expected: "a positive byte count",
            });
        }
        match self.storage_backend {
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(ConfigError::MissingVar("LOCAL_STORAGE_PATH"));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(ConfigError::MissingVar("LOCAL_STORAGE_BASE_URL"));
                }
            }
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(ConfigError::MissingVar("S3_BUCKET"));
                }
                if self.s3_region.is_none() {
                    return Err(ConfigError::MissingVar("S3_REGION"));
                }
            }
        }
        if self.progress_backend == ProgressBackend::Postgres && self.database_url.is_none() {
            return Err(ConfigError::MissingVar("DATABASE_URL"));
        }
        Ok(())
    }

    pub fn encode_grace(&self) -> Duration {
        Duration::from_secs(self.encode_grace_secs)
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_secs(self.remote_timeout_secs)
    }
}

/// Load a `.env` file into the process environment if one is present.
/// Call once at startup, before [`Config::from_env`].
pub fn load_dotenv() {
    // Missing .env is fine; the process environment wins either way.
    let _ = dotenvy::dotenv();
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
{
    match optional_var(name) {
        Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidVar {
            name,
            value: raw,
            expected: "a number",
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates_with_local_paths() {
        let mut config = Config {
            local_storage_path: Some("/tmp/bingoproof".to_string()),
            local_storage_base_url: Some("http://localhost:3000/media".to_string()),
            ..Config::default()
        };
        assert!(config.validate().is_ok());

        config.local_storage_path = None;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingVar("LOCAL_STORAGE_PATH"))
        ));
    }

    #[test]
    fn test_s3_backend_requires_bucket() {
        let config = Config {
            storage_backend: StorageBackend::S3,
            s3_region: Some("eu-west-1".to_string()),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingVar("S3_BUCKET"))
        ));
    }

    #[test]
    fn test_postgres_backend_requires_database_url() {
        let config = Config {
            local_storage_path: Some("/tmp/bingoproof".to_string()),
            local_storage_base_url: Some("http://localhost:3000/media".to_string()),
            progress_backend: ProgressBackend::Postgres,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingVar("DATABASE_URL"))
        ));
    }

    #[test]
    fn test_backend_parsing() {
        assert_eq!("local".parse::<StorageBackend>().unwrap(), StorageBackend::Local);
        assert_eq!("S3".parse::<StorageBackend>().unwrap(), StorageBackend::S3);
        assert!("nfs".parse::<StorageBackend>().is_err());
        assert_eq!(
            "postgres".parse::<ProgressBackend>().unwrap(),
            ProgressBackend::Postgres
        );
        assert!("redis".parse::<ProgressBackend>().is_err());
    }

    #[test]
    fn test_zero_ceiling_rejected() {
        let config = Config {
            hard_size_ceiling_bytes: 0,
            local_storage_path: Some("/tmp/bingoproof".to_string()),
            local_storage_base_url: Some("http://localhost:3000/media".to_string()),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
