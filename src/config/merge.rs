//! Command-line overrides, applied last.

use crate::domain::Config;
use std::path::PathBuf;

#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub vault: Option<PathBuf>,
    pub db: Option<PathBuf>,
    pub bind: Option<String>,
}

pub fn merge_cli_with_config(mut config: Config, overrides: &CliOverrides) -> Config {
    if let Some(vault) = &overrides.vault {
        config.vault.path = vault.clone();
    }
    if let Some(db) = &overrides.db {
        config.database.path = db.clone();
    }
    if let Some(bind) = &overrides.bind {
        config.server.bind = bind.clone();
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_values_win_over_config() {
        let mut config = Config::default();
        config.server.bind = "127.0.0.1:1".into();
        let merged = merge_cli_with_config(
            config,
            &CliOverrides { bind: Some("0.0.0.0:9".into()), ..CliOverrides::default() },
        );
        assert_eq!(merged.server.bind, "0.0.0.0:9");
        assert_eq!(merged.database.path, PathBuf::from("scribe.db"));
    }
}
