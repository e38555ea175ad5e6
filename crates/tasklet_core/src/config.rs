//! Connection string parsing and store configuration.
//!
//! # Responsibility
//! - Parse `[jdbc:]<store-type>:<store-name>[;OPTION=value...]` strings.
//! - Produce typed store location and pool/pragma settings.
//!
//! # Invariants
//! - Only the `sqlite` store type is accepted.
//! - Unknown or duplicated options are rejected, never ignored.
//! - In-memory stores are limited to one pooled connection.

use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const JDBC_PREFIX: &str = "jdbc:";
const SQLITE_STORE_TYPE: &str = "sqlite";
const MEMORY_STORE_NAME: &str = ":memory:";

pub const DEFAULT_POOL_MAX_SIZE: u32 = 8;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// SQLite's busy handler takes milliseconds as a C `int`.
pub const MAX_BUSY_TIMEOUT_MS: u64 = i32::MAX as u64;

/// Connection string parse failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStringError {
    Empty,
    MissingStoreType,
    UnsupportedStore(String),
    MissingStoreName,
    MalformedOption(String),
    UnknownOption(String),
    DuplicateOption(String),
    InvalidOptionValue {
        option: &'static str,
        value: String,
        expected: &'static str,
    },
    MemoryPoolSize(u32),
}

impl Display for ConnectionStringError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "connection string is empty"),
            Self::MissingStoreType => {
                write!(f, "connection string must look like `<store-type>:<store-name>`")
            }
            Self::UnsupportedStore(kind) => {
                write!(f, "unsupported store type `{kind}`; only `sqlite` is available")
            }
            Self::MissingStoreName => write!(f, "connection string has no store name"),
            Self::MalformedOption(raw) => {
                write!(f, "malformed option `{raw}`; expected `KEY=value`")
            }
            Self::UnknownOption(key) => write!(f, "unknown connection option `{key}`"),
            Self::DuplicateOption(key) => write!(f, "connection option `{key}` given twice"),
            Self::InvalidOptionValue {
                option,
                value,
                expected,
            } => write!(f, "invalid value `{value}` for `{option}`; expected {expected}"),
            Self::MemoryPoolSize(size) => write!(
                f,
                "in-memory store supports POOL_MAX_SIZE=1 only, got {size}"
            ),
        }
    }
}

impl Error for ConnectionStringError {}

/// Where the backing store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// Private in-memory database, alive as long as its single connection.
    Memory,
    File(PathBuf),
}

impl StoreLocation {
    pub fn is_memory(&self) -> bool {
        matches!(self, Self::Memory)
    }
}

/// Pool sizing and per-connection pragma settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    /// Upper bound of live connections in the pool.
    pub pool_max_size: u32,
    /// Idle connections the pool tries to keep warm. `None` means pool default.
    pub pool_min_idle: Option<u32>,
    /// Maximum wait for a pooled connection.
    pub connect_timeout: Duration,
    /// SQLite busy handler timeout applied to every connection.
    pub busy_timeout: Duration,
    pub foreign_keys: bool,
}

impl StoreSettings {
    /// Checks the bounds the pool builder and SQLite rely on.
    ///
    /// [`ConnectionString::parse`] always returns validated settings; values
    /// assembled in code are checked again before a store is opened.
    pub fn validate(&self) -> Result<(), ConnectionStringError> {
        if self.pool_max_size == 0 {
            return Err(invalid_value(
                "POOL_MAX_SIZE",
                "0",
                "a positive integer",
            ));
        }
        if let Some(min_idle) = self.pool_min_idle {
            if min_idle > self.pool_max_size {
                return Err(invalid_value(
                    "POOL_MIN_IDLE",
                    &min_idle.to_string(),
                    "a value not larger than POOL_MAX_SIZE",
                ));
            }
        }
        if self.connect_timeout.is_zero() {
            return Err(invalid_value(
                "CONNECT_TIMEOUT_MS",
                "0",
                "a positive integer",
            ));
        }
        if self.busy_timeout.as_millis() > u128::from(MAX_BUSY_TIMEOUT_MS) {
            return Err(invalid_value(
                "BUSY_TIMEOUT_MS",
                &self.busy_timeout.as_millis().to_string(),
                "at most 2147483647",
            ));
        }
        Ok(())
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            pool_max_size: DEFAULT_POOL_MAX_SIZE,
            pool_min_idle: None,
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
            foreign_keys: true,
        }
    }
}

/// Parsed connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionString {
    pub location: StoreLocation,
    pub settings: StoreSettings,
}

impl ConnectionString {
    /// Connection string for a private in-memory store.
    pub fn memory() -> Self {
        Self {
            location: StoreLocation::Memory,
            settings: StoreSettings {
                pool_max_size: 1,
                ..StoreSettings::default()
            },
        }
    }

    /// Connection string for a file store with default settings.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            location: StoreLocation::File(path.into()),
            settings: StoreSettings::default(),
        }
    }

    /// Parses a connection string.
    ///
    /// # Errors
    /// - Returns [`ConnectionStringError`] for any malformed part.
    pub fn parse(raw: &str) -> Result<Self, ConnectionStringError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ConnectionStringError::Empty);
        }

        let body = strip_prefix_ignore_case(trimmed, JDBC_PREFIX).unwrap_or(trimmed);
        let (store_type, rest) = body
            .split_once(':')
            .ok_or(ConnectionStringError::MissingStoreType)?;
        if store_type.is_empty() {
            return Err(ConnectionStringError::MissingStoreType);
        }
        if !store_type.eq_ignore_ascii_case(SQLITE_STORE_TYPE) {
            return Err(ConnectionStringError::UnsupportedStore(
                store_type.to_string(),
            ));
        }

        let mut parts = rest.split(';');
        let store_name = parts.next().unwrap_or_default().trim();
        if store_name.is_empty() {
            return Err(ConnectionStringError::MissingStoreName);
        }
        let location = if store_name == MEMORY_STORE_NAME {
            StoreLocation::Memory
        } else {
            StoreLocation::File(PathBuf::from(store_name))
        };

        let mut settings = StoreSettings::default();
        let mut pool_size_given = false;
        let mut seen = BTreeSet::new();
        for raw_option in parts {
            // Tolerate a trailing `;`.
            if raw_option.trim().is_empty() {
                continue;
            }
            let (key, value) = raw_option
                .split_once('=')
                .ok_or_else(|| ConnectionStringError::MalformedOption(raw_option.to_string()))?;
            let key = key.trim().to_ascii_uppercase();
            let value = value.trim();
            if key.is_empty() || value.is_empty() {
                return Err(ConnectionStringError::MalformedOption(
                    raw_option.to_string(),
                ));
            }
            if !seen.insert(key.clone()) {
                return Err(ConnectionStringError::DuplicateOption(key));
            }

            match key.as_str() {
                "POOL_MAX_SIZE" => {
                    settings.pool_max_size =
                        parse_positive_u32("POOL_MAX_SIZE", value)?;
                    pool_size_given = true;
                }
                "POOL_MIN_IDLE" => {
                    settings.pool_min_idle = Some(value.parse().map_err(|_| {
                        invalid_value("POOL_MIN_IDLE", value, "a non-negative integer")
                    })?);
                }
                "CONNECT_TIMEOUT_MS" => {
                    let millis = parse_positive_u64("CONNECT_TIMEOUT_MS", value)?;
                    settings.connect_timeout = Duration::from_millis(millis);
                }
                "BUSY_TIMEOUT_MS" => {
                    let millis: u64 = value.parse().map_err(|_| {
                        invalid_value("BUSY_TIMEOUT_MS", value, "a non-negative integer")
                    })?;
                    settings.busy_timeout = Duration::from_millis(millis);
                }
                "FOREIGN_KEYS" => {
                    settings.foreign_keys = parse_flag("FOREIGN_KEYS", value)?;
                }
                _ => return Err(ConnectionStringError::UnknownOption(key)),
            }
        }

        if location.is_memory() {
            if pool_size_given && settings.pool_max_size != 1 {
                return Err(ConnectionStringError::MemoryPoolSize(
                    settings.pool_max_size,
                ));
            }
            settings.pool_max_size = 1;
        }

        let parsed = Self { location, settings };
        parsed.validate()?;
        Ok(parsed)
    }

    /// Checks settings bounds, plus the single-connection rule for
    /// in-memory stores.
    pub fn validate(&self) -> Result<(), ConnectionStringError> {
        if self.location.is_memory() && self.settings.pool_max_size != 1 {
            return Err(ConnectionStringError::MemoryPoolSize(
                self.settings.pool_max_size,
            ));
        }
        self.settings.validate()
    }
}

impl FromStr for ConnectionString {
    type Err = ConnectionStringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for ConnectionString {
    /// Canonical form: every option is spelled out, defaults included.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            StoreLocation::Memory => write!(f, "{JDBC_PREFIX}{SQLITE_STORE_TYPE}:{MEMORY_STORE_NAME}")?,
            StoreLocation::File(path) => {
                write!(f, "{JDBC_PREFIX}{SQLITE_STORE_TYPE}:{}", path.display())?
            }
        }
        let settings = &self.settings;
        write!(f, ";POOL_MAX_SIZE={}", settings.pool_max_size)?;
        if let Some(min_idle) = settings.pool_min_idle {
            write!(f, ";POOL_MIN_IDLE={min_idle}")?;
        }
        write!(
            f,
            ";CONNECT_TIMEOUT_MS={};BUSY_TIMEOUT_MS={};FOREIGN_KEYS={}",
            settings.connect_timeout.as_millis(),
            settings.busy_timeout.as_millis(),
            if settings.foreign_keys { "TRUE" } else { "FALSE" }
        )
    }
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    let head = value.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        value.get(prefix.len()..)
    } else {
        None
    }
}

fn parse_positive_u32(option: &'static str, value: &str) -> Result<u32, ConnectionStringError> {
    match value.parse::<u32>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        _ => Err(invalid_value(option, value, "a positive integer")),
    }
}

fn parse_positive_u64(option: &'static str, value: &str) -> Result<u64, ConnectionStringError> {
    match value.parse::<u64>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        _ => Err(invalid_value(option, value, "a positive integer")),
    }
}

fn parse_flag(option: &'static str, value: &str) -> Result<bool, ConnectionStringError> {
    match value.to_ascii_uppercase().as_str() {
        "TRUE" | "ON" | "1" => Ok(true),
        "FALSE" | "OFF" | "0" => Ok(false),
        _ => Err(invalid_value(option, value, "TRUE or FALSE")),
    }
}

fn invalid_value(
    option: &'static str,
    value: &str,
    expected: &'static str,
) -> ConnectionStringError {
    ConnectionStringError::InvalidOptionValue {
        option,
        value: value.to_string(),
        expected,
    }
}
