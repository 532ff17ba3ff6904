//! Upsert dialect selection.
//!
//! MySQL 8.0.19 added row aliases to `INSERT ... ON DUPLICATE KEY UPDATE` and
//! deprecated the `VALUES(col)` function. MariaDB never adopted the alias form.
//! [`Dialect::for_server`] is the single place that decides which one to emit.

use crate::error::{OrmError, OrmResult};
use std::fmt;
use std::str::FromStr;

/// Alias used for the inserted row in the modern upsert form.
pub const UPSERT_ALIAS: &str = "new_table";

/// The ON DUPLICATE KEY UPDATE syntax to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// `INSERT ... VALUES (...) AS new_table ON DUPLICATE KEY UPDATE col = new_table.col`
    #[default]
    Modern,
    /// `INSERT ... VALUES (...) ON DUPLICATE KEY UPDATE col = VALUES(col)`
    Legacy,
}

impl Dialect {
    /// Pick the dialect for a server version.
    pub fn for_server(version: &ServerVersion) -> Self {
        if !version.mariadb && (version.major, version.minor, version.patch) >= (8, 0, 19) {
            Dialect::Modern
        } else {
            Dialect::Legacy
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Modern => f.write_str("modern"),
            Dialect::Legacy => f.write_str("legacy"),
        }
    }
}

impl FromStr for Dialect {
    type Err = OrmError;

    fn from_str(s: &str) -> OrmResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "modern" => Ok(Dialect::Modern),
            "legacy" => Ok(Dialect::Legacy),
            other => Err(OrmError::configuration(format!(
                "unknown dialect '{other}' (expected 'modern' or 'legacy')"
            ))),
        }
    }
}

/// A parsed `SELECT VERSION()` string, e.g. `8.0.36` or `10.11.6-MariaDB-log`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerVersion {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
    pub mariadb: bool,
}

impl ServerVersion {
    pub fn parse(version: &str) -> OrmResult<Self> {
        let mariadb = version.to_ascii_lowercase().contains("mariadb");
        // MariaDB behind replication may report "5.5.5-10.6.12-MariaDB"
        let core = version
            .strip_prefix("5.5.5-")
            .filter(|_| mariadb)
            .unwrap_or(version);
        let numeric = core
            .split(|c: char| !(c.is_ascii_digit() || c == '.'))
            .next()
            .unwrap_or_default();

        let mut parts = numeric.split('.').map(str::parse::<u16>);
        let mut next = || -> OrmResult<u16> {
            match parts.next() {
                Some(Ok(n)) => Ok(n),
                None => Ok(0),
                Some(Err(_)) => Err(OrmError::Other(format!(
                    "unrecognised server version '{version}'"
                ))),
            }
        };

        let major = next()?;
        let minor = next()?;
        let patch = next()?;
        if major == 0 {
            return Err(OrmError::Other(format!(
                "unrecognised server version '{version}'"
            )));
        }

        Ok(Self {
            major,
            minor,
            patch,
            mariadb,
        })
    }
}
