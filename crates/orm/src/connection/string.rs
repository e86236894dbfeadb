//! Strict PostgreSQL connection string parsing.
//!
//! Only `postgres://` and `postgresql://` URIs with an explicit user, host and
//! database are accepted. Nothing is defaulted except the port, so a malformed
//! `DATABASE_URL` can never silently point the tooling at another server.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use sqlx::postgres::{PgConnectOptions, PgSslMode};
use thiserror::Error;
use url::Url;

use crate::error::OrmError;

/// PostgreSQL well-known port, used only when the URI omits one
pub const DEFAULT_PORT: u16 = 5432;

/// Query parameters understood by [`ConnectionString::connect_options`]
const SUPPORTED_PARAMS: &[&str] = &["sslmode", "application_name"];

/// Connection string parse failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionStringError {
    #[error("connection string is empty")]
    Empty,

    #[error("connection string is not a valid URI: {0}")]
    InvalidUri(String),

    #[error("unsupported scheme '{0}', expected postgres or postgresql")]
    UnsupportedScheme(String),

    #[error("connection string has no {0}")]
    MissingComponent(&'static str),

    #[error("connection string {component} is not valid UTF-8 after percent-decoding")]
    InvalidEncoding { component: &'static str },

    #[error("connection string path must be a single database name, got '{0}'")]
    InvalidDatabase(String),

    #[error("unsupported connection parameter '{0}'")]
    UnsupportedParameter(String),

    #[error("invalid value '{value}' for connection parameter '{name}'")]
    InvalidParameter { name: String, value: String },

    #[error("connection string must not contain a fragment")]
    UnexpectedFragment,
}

impl From<ConnectionStringError> for OrmError {
    fn from(err: ConnectionStringError) -> Self {
        OrmError::Connection(err.to_string())
    }
}

/// URI scheme of a connection string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Postgres,
    Postgresql,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Postgres => "postgres",
            Scheme::Postgresql => "postgresql",
        }
    }
}

/// A fully specified PostgreSQL connection target
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionString {
    pub scheme: Scheme,
    pub user: String,
    pub password: Option<String>,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub params: BTreeMap<String, String>,
}

impl ConnectionString {
    /// Parse a connection URI, failing on anything that is not fully specified
    pub fn parse(input: &str) -> Result<Self, ConnectionStringError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ConnectionStringError::Empty);
        }

        let url = Url::parse(input).map_err(|e| ConnectionStringError::InvalidUri(e.to_string()))?;

        let scheme = match url.scheme() {
            "postgres" => Scheme::Postgres,
            "postgresql" => Scheme::Postgresql,
            other => return Err(ConnectionStringError::UnsupportedScheme(other.to_string())),
        };

        if url.fragment().is_some() {
            return Err(ConnectionStringError::UnexpectedFragment);
        }

        let host = url
            .host_str()
            .map(|h| h.trim_start_matches('[').trim_end_matches(']'))
            .filter(|h| !h.is_empty())
            .ok_or(ConnectionStringError::MissingComponent("host"))?
            .to_string();

        let user = decode(url.username(), "user")?;
        if user.is_empty() {
            return Err(ConnectionStringError::MissingComponent("user"));
        }

        let password = url
            .password()
            .map(|p| decode(p, "password"))
            .transpose()?;

        let raw_database = url.path().trim_start_matches('/');
        if raw_database.is_empty() {
            return Err(ConnectionStringError::MissingComponent("database"));
        }
        if raw_database.contains('/') {
            return Err(ConnectionStringError::InvalidDatabase(raw_database.to_string()));
        }
        let database = decode(raw_database, "database")?;

        let mut params = BTreeMap::new();
        for (name, value) in url.query_pairs() {
            if !SUPPORTED_PARAMS.contains(&name.as_ref()) {
                return Err(ConnectionStringError::UnsupportedParameter(name.into_owned()));
            }
            if name == "sslmode" && value.parse::<PgSslMode>().is_err() {
                return Err(ConnectionStringError::InvalidParameter {
                    name: name.into_owned(),
                    value: value.into_owned(),
                });
            }
            params.insert(name.into_owned(), value.into_owned());
        }

        Ok(Self {
            scheme,
            user,
            password,
            host,
            port: url.port().unwrap_or(DEFAULT_PORT),
            database,
            params,
        })
    }

    /// Driver options for this target
    pub fn connect_options(&self) -> PgConnectOptions {
        let mut options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .database(&self.database);

        if let Some(password) = &self.password {
            options = options.password(password);
        }
        if let Some(mode) = self
            .params
            .get("sslmode")
            .and_then(|m| m.parse::<PgSslMode>().ok())
        {
            options = options.ssl_mode(mode);
        }
        if let Some(name) = self.params.get("application_name") {
            options = options.application_name(name);
        }

        options
    }

    /// Render the target with the password replaced, safe for logs and output
    pub fn masked(&self) -> String {
        let credentials = match &self.password {
            Some(_) => format!("{}:****", self.user),
            None => self.user.clone(),
        };
        let host = if self.host.contains(':') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        let mut rendered = format!(
            "{}://{}@{}:{}/{}",
            self.scheme.as_str(),
            credentials,
            host,
            self.port,
            self.database
        );
        if !self.params.is_empty() {
            let query: Vec<String> = self
                .params
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            rendered.push('?');
            rendered.push_str(&query.join("&"));
        }
        rendered
    }
}

fn decode(raw: &str, component: &'static str) -> Result<String, ConnectionStringError> {
    urlencoding::decode(raw)
        .map(|s| s.into_owned())
        .map_err(|_| ConnectionStringError::InvalidEncoding { component })
}

impl FromStr for ConnectionString {
    type Err = ConnectionStringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

// Debug goes through the masked form so passwords never reach log output.
impl fmt::Debug for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConnectionString")
            .field(&self.masked())
            .finish()
    }
}
