//! Configuration loading from environment variables.
//!
//! One struct per binary concern: the prediction server, the UI client and
//! the operational pollers. Each reads through a lookup function so tests
//! can supply variables without touching the process environment.

mod client_config;
mod ops_config;
mod server_config;

pub use client_config::ClientEnvConfig;
pub use ops_config::{PollerEnvConfig, PollerFile};
pub use server_config::ServerEnvConfig;

use anyhow::{Context, Result};
use std::str::FromStr;

/// Reads one variable; `None` when unset.
pub type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

pub(crate) fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse `key` or fall back to `default` when unset. A set but invalid
/// value is an error.
pub(crate) fn parse_or<T>(lookup: Lookup<'_>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("Invalid {}: {}", key, raw)),
        None => Ok(default),
    }
}

/// Split `a=b,c=d` into trimmed pairs.
pub(crate) fn parse_pairs(key: &str, raw: &str) -> Result<Vec<(String, String)>> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            let (left, right) = item
                .split_once('=')
                .with_context(|| format!("Invalid {} entry '{}': expected name=value", key, item))?;
            Ok((left.trim().to_string(), right.trim().to_string()))
        })
        .collect()
}

#[cfg(test)]
pub(crate) fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: std::collections::HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or() {
        let lookup = lookup_from(&[("PORT", "9000"), ("BAD", "nine")]);
        assert_eq!(parse_or::<u16>(&lookup, "PORT", 1).unwrap(), 9000);
        assert_eq!(parse_or::<u16>(&lookup, "UNSET", 1).unwrap(), 1);
        assert!(parse_or::<u16>(&lookup, "BAD", 1).is_err());
    }

    #[test]
    fn test_parse_pairs() {
        let pairs = parse_pairs("X", " a=1 , b = 2,").unwrap();
        assert_eq!(
            pairs,
            vec![("a".into(), "1".into()), ("b".into(), "2".into())]
        );
        assert!(parse_pairs("X", "a").is_err());
    }
}
