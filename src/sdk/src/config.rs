// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Connection profiles.
//!
//! Profiles live in a TOML file:
//!
//! ```toml
//! default_profile = "dev"
//!
//! [profiles.dev]
//! host = "localhost"
//! port = 6875
//! user = "admin"
//! password = "${WH_PASSWORD}"
//! warehouse = "compute_wh"
//! ```
//!
//! Any `${VAR}` reference in a string value is replaced by the value of the
//! environment variable `VAR` by [`ProfilesConfig::expand_env_vars`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 6875;
pub const DEFAULT_APPLICATION: &str = "wh-sdk";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read profiles file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse profiles: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("profile '{0}' not found")]
    ProfileNotFound(String),
    #[error("no profile name given and no default_profile configured")]
    NoDefaultProfile,
    #[error("environment variable '{var}' referenced by field '{field}' is not set")]
    MissingEnvVar { field: &'static str, var: String },
    #[error("unterminated '${{' in field '{field}'")]
    UnterminatedEnvVar { field: &'static str },
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_application() -> String {
    DEFAULT_APPLICATION.to_string()
}

/// How to reach one warehouse endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionProfile {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub warehouse: Option<String>,
    #[serde(default = "default_application")]
    pub application: String,
}

impl ConnectionProfile {
    pub fn new(host: impl Into<String>) -> Self {
        ConnectionProfile {
            host: host.into(),
            port: DEFAULT_PORT,
            user: None,
            password: None,
            database: None,
            role: None,
            warehouse: None,
            application: default_application(),
        }
    }

    /// Builds the driver configuration for this profile. Each setting is
    /// passed through unparsed, so values may contain spaces or `=`.
    pub fn to_pg_config(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config.host(&self.host).port(self.port);
        if let Some(user) = &self.user {
            config.user(user.as_str());
        }
        if let Some(password) = &self.password {
            config.password(password);
        }
        if let Some(database) = &self.database {
            config.dbname(database.as_str());
        }
        config.application_name(self.application.as_str());
        config
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilesConfig {
    #[serde(default)]
    pub default_profile: Option<String>,
    #[serde(default)]
    pub profiles: BTreeMap<String, ConnectionProfile>,
}

impl ProfilesConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn get_profile(&self, name: &str) -> Result<ConnectionProfile, ConfigError> {
        self.profiles
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::ProfileNotFound(name.to_string()))
    }

    pub fn get_default_profile(&self) -> Result<ConnectionProfile, ConfigError> {
        match &self.default_profile {
            Some(name) => self.get_profile(name),
            None => Err(ConfigError::NoDefaultProfile),
        }
    }

    /// Resolves `${VAR}` references in every string field of `profile`.
    pub fn expand_env_vars(
        &self,
        profile: ConnectionProfile,
    ) -> Result<ConnectionProfile, ConfigError> {
        self.expand_with(profile, |var| std::env::var(var).ok())
    }

    fn expand_with(
        &self,
        profile: ConnectionProfile,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<ConnectionProfile, ConfigError> {
        let opt = |field, value: Option<String>| -> Result<Option<String>, ConfigError> {
            value.map(|v| expand(field, &v, &lookup)).transpose()
        };
        Ok(ConnectionProfile {
            host: expand("host", &profile.host, &lookup)?,
            port: profile.port,
            user: opt("user", profile.user)?,
            password: opt("password", profile.password)?,
            database: opt("database", profile.database)?,
            role: opt("role", profile.role)?,
            warehouse: opt("warehouse", profile.warehouse)?,
            application: expand("application", &profile.application, &lookup)?,
        })
    }
}

fn expand(
    field: &'static str,
    value: &str,
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<String, ConfigError> {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .ok_or(ConfigError::UnterminatedEnvVar { field })?;
        let var = &after[..end];
        let resolved = lookup(var).ok_or_else(|| ConfigError::MissingEnvVar {
            field,
            var: var.to_string(),
        })?;
        out.push_str(&resolved);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const PROFILES: &str = r#"
default_profile = "dev"

[profiles.dev]
host = "localhost"
user = "admin"
password = "${WH_TEST_PASSWORD}"
warehouse = "compute_wh"

[profiles.prod]
host = "${WH_TEST_HOST}.example.com"
port = 5432
"#;

    #[test]
    fn parses_profiles_with_defaults() {
        let config = ProfilesConfig::from_toml_str(PROFILES).unwrap();
        let dev = config.get_default_profile().unwrap();
        assert_eq!(dev.host, "localhost");
        assert_eq!(dev.port, DEFAULT_PORT);
        assert_eq!(dev.warehouse.as_deref(), Some("compute_wh"));
        assert_eq!(dev.application, DEFAULT_APPLICATION);
        assert_eq!(config.get_profile("prod").unwrap().port, 5432);
        assert!(matches!(
            config.get_profile("staging"),
            Err(ConfigError::ProfileNotFound(name)) if name == "staging"
        ));
    }

    #[test]
    fn expands_environment_references() {
        let config = ProfilesConfig::from_toml_str(PROFILES).unwrap();
        let lookup = |var: &str| match var {
            "WH_TEST_PASSWORD" => Some("s3cret".to_string()),
            "WH_TEST_HOST" => Some("acme".to_string()),
            _ => None,
        };
        let dev = config
            .expand_with(config.get_profile("dev").unwrap(), lookup)
            .unwrap();
        assert_eq!(dev.password.as_deref(), Some("s3cret"));
        let prod = config
            .expand_with(config.get_profile("prod").unwrap(), lookup)
            .unwrap();
        assert_eq!(prod.host, "acme.example.com");

        let missing = config.expand_with(config.get_profile("dev").unwrap(), |_| None);
        assert!(matches!(
            missing,
            Err(ConfigError::MissingEnvVar { field: "password", ref var }) if var == "WH_TEST_PASSWORD"
        ));
    }

    #[test]
    fn rejects_unterminated_reference() {
        assert!(matches!(
            expand("host", "${OOPS", &|_: &str| None),
            Err(ConfigError::UnterminatedEnvVar { field: "host" })
        ));
    }

    #[test]
    fn builds_driver_config() {
        let mut profile = ConnectionProfile::new("db.internal");
        profile.user = Some("svc".into());
        profile.database = Some("analytics".into());
        let config = profile.to_pg_config();
        assert_eq!(
            config.get_hosts(),
            &[tokio_postgres::config::Host::Tcp("db.internal".into())]
        );
        assert_eq!(config.get_ports(), &[6875]);
        assert_eq!(config.get_user(), Some("svc"));
        assert_eq!(config.get_password(), None);
        assert_eq!(config.get_dbname(), Some("analytics"));
        assert_eq!(config.get_application_name(), Some("wh-sdk"));
    }

    #[test]
    fn settings_are_not_reparsed() {
        let mut profile = ConnectionProfile::new("db.internal");
        profile.user = Some("svc user".into());
        profile.password = Some("pa ss dbname=other".into());
        let config = profile.to_pg_config();
        assert_eq!(config.get_password(), Some(&b"pa ss dbname=other"[..]));
        assert_eq!(config.get_user(), Some("svc user"));
        assert_eq!(config.get_dbname(), None);
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(PROFILES.as_bytes()).unwrap();
        let config = ProfilesConfig::load(file.path()).unwrap();
        assert_eq!(config.profiles.len(), 2);

        let err = ProfilesConfig::load("/nonexistent/profiles.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn no_default_profile() {
        let config = ProfilesConfig::default();
        assert!(matches!(
            config.get_default_profile(),
            Err(ConfigError::NoDefaultProfile)
        ));
    }
}
