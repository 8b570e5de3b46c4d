//! Database connection parameters and their validation
//!
//! Raw input arrives either as a JSON mapping with the keys `USER`,
//! `PASSWORD`, `HOST`, `DATABASE` and `PORT`, as a typed `ConnectionConfig`,
//! or from `DB_*` environment variables. All three paths end in
//! `ValidatedConfig`, which can only be obtained by passing the checks.

use std::env;
use std::fmt;

use serde_json::{Map, Value};

use crate::core::ConfigError;

/// Required keys, in the order they are checked
pub const REQUIRED_FIELDS: [&str; 5] = ["USER", "PASSWORD", "HOST", "DATABASE", "PORT"];

/// Environment variable backing each required key
const ENV_VARS: [(&str, &str); 5] = [
    ("USER", "DB_USER"),
    ("PASSWORD", "DB_PASSWORD"),
    ("HOST", "DB_HOST"),
    ("DATABASE", "DB_DATABASE"),
    ("PORT", "DB_PORT"),
];

/// Connection parameters as supplied by the caller
///
/// Values are opaque strings. Nothing is parsed or coerced, so `PORT` stays
/// text all the way into the connection URI.
#[derive(Clone)]
pub struct ConnectionConfig {
    pub user: String,
    pub password: String,
    pub host: String,
    pub database: String,
    pub port: String,
}

impl ConnectionConfig {
    /// Create a config from its five fields
    pub fn new(
        user: impl Into<String>,
        password: impl Into<String>,
        host: impl Into<String>,
        database: impl Into<String>,
        port: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
            host: host.into(),
            database: database.into(),
            port: port.into(),
        }
    }

    /// Read `DB_USER`, `DB_PASSWORD`, `DB_HOST`, `DB_DATABASE` and `DB_PORT`
    /// and validate them
    pub fn from_env() -> Result<ValidatedConfig, ConfigError> {
        let mut map = Map::new();
        for (field, var) in ENV_VARS {
            if let Ok(value) = env::var(var) {
                map.insert(field.to_string(), Value::String(value));
            }
        }
        validate(Some(&Value::Object(map)))
    }

    /// Check that every field is non-empty
    ///
    /// Fields are checked in `REQUIRED_FIELDS` order and the first empty one
    /// is reported.
    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        for (name, value) in REQUIRED_FIELDS.iter().zip(self.fields()) {
            if value.is_empty() {
                return Err(ConfigError::MissingField(name.to_string()));
            }
        }
        Ok(ValidatedConfig { inner: self })
    }

    fn fields(&self) -> [&str; 5] {
        [
            &self.user,
            &self.password,
            &self.host,
            &self.database,
            &self.port,
        ]
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("user", &self.user)
            .field("password", &"***")
            .field("host", &self.host)
            .field("database", &self.database)
            .field("port", &self.port)
            .finish()
    }
}

/// Validate an arbitrary, possibly absent, JSON value
///
/// Fails with `NotAMapping` unless the value is a JSON object, then with
/// `MissingField` for the first key (in `REQUIRED_FIELDS` order) that is
/// absent, empty, or not a string. Pure: nothing is opened or logged.
pub fn validate(raw: Option<&Value>) -> Result<ValidatedConfig, ConfigError> {
    let map = match raw {
        Some(Value::Object(map)) => map,
        _ => return Err(ConfigError::NotAMapping),
    };

    let field = |name: &str| match map.get(name) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        _ => Err(ConfigError::MissingField(name.to_string())),
    };

    // Field expressions evaluate top to bottom, matching REQUIRED_FIELDS.
    let inner = ConnectionConfig {
        user: field("USER")?,
        password: field("PASSWORD")?,
        host: field("HOST")?,
        database: field("DATABASE")?,
        port: field("PORT")?,
    };

    Ok(ValidatedConfig { inner })
}

/// Connection parameters that passed validation
///
/// All five fields are present and non-empty. Read-only after construction.
#[derive(Clone)]
pub struct ValidatedConfig {
    inner: ConnectionConfig,
}

impl ValidatedConfig {
    pub fn user(&self) -> &str {
        &self.inner.user
    }

    pub fn password(&self) -> &str {
        &self.inner.password
    }

    pub fn host(&self) -> &str {
        &self.inner.host
    }

    pub fn database(&self) -> &str {
        &self.inner.database
    }

    pub fn port(&self) -> &str {
        &self.inner.port
    }
}

impl fmt::Debug for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ValidatedConfig").field(&self.inner).finish()
    }
}
