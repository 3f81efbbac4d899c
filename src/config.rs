//! Server configuration read from the environment and command line.
//!
//! Every required value is checked up front so that a misconfigured server
//! refuses to start with one message listing everything that is wrong,
//! instead of failing on the first request that needs the missing value.

use std::path::{Path, PathBuf};

/// Environment variable holding the session secret used to encrypt cookies.
pub const SECRET_VAR: &str = "SECRET";
/// Environment variable holding the credential shared with the authenticating proxy.
pub const AUTH_PROXY_SECRET_VAR: &str = "AUTH_PROXY_SECRET";
/// Environment variable holding the path to the SQLite database.
pub const DATABASE_PATH_VAR: &str = "DATABASE_PATH";
/// Environment variable holding the canonical name of the local timezone.
pub const TIMEZONE_VAR: &str = "TIMEZONE";

const MIN_SECRET_LENGTH: usize = 32;
const MIN_PROXY_SECRET_LENGTH: usize = 16;

/// A single problem with the configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigProblem {
    /// A required value was not set or was blank.
    #[error("{0} is not set")]
    Missing(&'static str),

    /// A secret is too short to be safe.
    #[error("{name} must be at least {min_length} characters long")]
    TooShort {
        /// The name of the variable.
        name: &'static str,
        /// The minimum number of characters.
        min_length: usize,
    },

    /// The database would be created in a directory that does not exist.
    #[error("{name} points into the directory {directory:?}, which does not exist")]
    MissingDirectory {
        /// The name of the variable.
        name: &'static str,
        /// The directory that should contain the database file.
        directory: PathBuf,
    },

    /// The timezone is not a canonical timezone name.
    #[error("{name} \"{value}\" is not a canonical timezone name, e.g. \"Asia/Kolkata\"")]
    UnknownTimezone {
        /// The name of the variable.
        name: &'static str,
        /// The value that was given.
        value: String,
    },
}

/// The configuration could not be validated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{}", describe_problems(.0))]
pub struct ConfigError(pub Vec<ConfigProblem>);

fn describe_problems(problems: &[ConfigProblem]) -> String {
    let mut description = String::from("Missing or invalid configuration:\n");

    for problem in problems {
        description.push_str(&format!("  - {problem}\n"));
    }

    description.push_str(&format!(
        "\nSet the following before starting the server:\n  \
        {SECRET_VAR}=<random string, e.g. from `openssl rand -base64 48`>\n  \
        {AUTH_PROXY_SECRET_VAR}=<credential the authenticating proxy sends in X-Auth-Proxy-Secret>\n  \
        {DATABASE_PATH_VAR}=<path to the SQLite database, e.g. ./spendwise.db>\n  \
        {TIMEZONE_VAR}=<canonical timezone name, e.g. Asia/Kolkata>"
    ));

    description
}

/// The configuration values as they were given, before validation.
#[derive(Debug, Clone, Default)]
pub struct RawConfig {
    /// See [SECRET_VAR].
    pub secret: Option<String>,
    /// See [AUTH_PROXY_SECRET_VAR].
    pub auth_proxy_secret: Option<String>,
    /// See [DATABASE_PATH_VAR].
    pub database_path: Option<String>,
    /// See [TIMEZONE_VAR].
    pub timezone: Option<String>,
}

impl RawConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Self {
        let read = |name: &str| std::env::var(name).ok();

        Self {
            secret: read(SECRET_VAR),
            auth_proxy_secret: read(AUTH_PROXY_SECRET_VAR),
            database_path: read(DATABASE_PATH_VAR),
            timezone: read(TIMEZONE_VAR),
        }
    }
}

/// Validated server configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// The session secret used to derive the cookie key.
    pub secret: String,
    /// The credential the authenticating proxy must present.
    pub auth_proxy_secret: String,
    /// Where the SQLite database lives.
    pub database_path: PathBuf,
    /// The canonical name of the local timezone.
    pub timezone: String,
}

impl TryFrom<RawConfig> for Config {
    type Error = ConfigError;

    /// Validate every value in `raw`, collecting all problems before failing.
    fn try_from(raw: RawConfig) -> Result<Self, Self::Error> {
        let mut problems = Vec::new();

        let secret = require_secret(raw.secret, SECRET_VAR, MIN_SECRET_LENGTH, &mut problems);
        let auth_proxy_secret = require_secret(
            raw.auth_proxy_secret,
            AUTH_PROXY_SECRET_VAR,
            MIN_PROXY_SECRET_LENGTH,
            &mut problems,
        );

        let database_path = match non_blank(raw.database_path) {
            Some(path) => {
                let path = PathBuf::from(path);
                match database_directory(&path) {
                    Some(directory) if !directory.is_dir() => {
                        problems.push(ConfigProblem::MissingDirectory {
                            name: DATABASE_PATH_VAR,
                            directory: directory.to_path_buf(),
                        });
                    }
                    _ => {}
                }
                Some(path)
            }
            None => {
                problems.push(ConfigProblem::Missing(DATABASE_PATH_VAR));
                None
            }
        };

        let timezone = match non_blank(raw.timezone) {
            Some(timezone) if time_tz::timezones::get_by_name(&timezone).is_some() => {
                Some(timezone)
            }
            Some(timezone) => {
                problems.push(ConfigProblem::UnknownTimezone {
                    name: TIMEZONE_VAR,
                    value: timezone,
                });
                None
            }
            None => {
                problems.push(ConfigProblem::Missing(TIMEZONE_VAR));
                None
            }
        };

        match (secret, auth_proxy_secret, database_path, timezone) {
            (Some(secret), Some(auth_proxy_secret), Some(database_path), Some(timezone))
                if problems.is_empty() =>
            {
                Ok(Config {
                    secret,
                    auth_proxy_secret,
                    database_path,
                    timezone,
                })
            }
            _ => Err(ConfigError(problems)),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn require_secret(
    value: Option<String>,
    name: &'static str,
    min_length: usize,
    problems: &mut Vec<ConfigProblem>,
) -> Option<String> {
    match non_blank(value) {
        Some(secret) if secret.chars().count() >= min_length => Some(secret),
        Some(_) => {
            problems.push(ConfigProblem::TooShort { name, min_length });
            None
        }
        None => {
            problems.push(ConfigProblem::Missing(name));
            None
        }
    }
}

/// The directory the database file will be created in, if the path names one.
fn database_directory(path: &Path) -> Option<&Path> {
    path.parent().filter(|parent| !parent.as_os_str().is_empty())
}
