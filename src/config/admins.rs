//! Admin allowlist.
//!
//! Admin rights come from `ADMIN_USER_IDS` (comma-separated platform ids) and
//! the `admins` list in `config.toml`. Handlers ask the registry on every
//! admin-gated action instead of trusting the flag stored on the user row.

use crate::errors::{Error, Result};
use std::collections::BTreeSet;

/// Set of platform user ids with admin rights
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminRegistry {
    ids: BTreeSet<i64>,
}

impl AdminRegistry {
    /// Builds a registry from a list of ids.
    #[must_use]
    pub fn new(ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    /// Parses a comma-separated id list such as `"123, 456"`.
    ///
    /// # Errors
    /// Returns an error if any entry is not an integer.
    pub fn parse_list(list: &str) -> Result<Vec<i64>> {
        list.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                entry.parse::<i64>().map_err(|e| Error::Config {
                    message: format!("Invalid admin id {entry:?}: {e}"),
                })
            })
            .collect()
    }

    /// Builds the registry from `ADMIN_USER_IDS` plus the ids in `config.toml`.
    pub fn from_env_and_config(config_ids: &[u64]) -> Result<Self> {
        let mut ids = match std::env::var("ADMIN_USER_IDS") {
            Ok(list) => Self::parse_list(&list)?,
            Err(_) => Vec::new(),
        };
        for id in config_ids {
            ids.push(i64::try_from(*id)?);
        }
        if ids.is_empty() {
            tracing::warn!("No admin ids configured; the admin panel is unreachable");
        }
        Ok(Self::new(ids))
    }

    /// Whether `user_id` may perform admin actions.
    #[must_use]
    pub fn is_admin(&self, user_id: i64) -> bool {
        self.ids.contains(&user_id)
    }

    /// All admin ids, ascending.
    pub fn ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.ids.iter().copied()
    }

    /// Number of admins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether there are no admins.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
