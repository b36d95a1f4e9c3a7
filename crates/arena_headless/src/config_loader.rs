//! Agent configuration loading.
//!
//! Tunables live in RON files; every field is optional and falls back to the
//! built-in defaults.

use std::fs;
use std::path::Path;

use arena_core::config::AgentConfig;
use tracing::info;

use crate::error::{Result, RunnerError};

/// Load and validate a configuration file.
pub fn load_config(path: &Path) -> Result<AgentConfig> {
    let label = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|e| RunnerError::io(label.clone(), e))?;
    let config = AgentConfig::from_ron_labeled(&content, &label)?;
    info!(path = %label, seed = config.rng_seed, "Loaded agent configuration");
    Ok(config)
}

/// Load `path` if given, otherwise the defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<AgentConfig> {
    match path {
        Some(path) => load_config(path),
        None => Ok(AgentConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_core::error::AgentError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let file = write_config("(rng_seed: 42, health: (heal_threshold: 80))");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.rng_seed, 42);
        assert_eq!(config.health.heal_threshold, 80);
        assert_eq!(config.health.critical_threshold, 50);
        assert_eq!(config.scores.weapon("SHOTGUN"), 900);
    }

    #[test]
    fn test_parse_error_names_file() {
        let file = write_config("(rng_seed: \"not a number\")");
        let err = load_config(file.path()).unwrap_err();
        match err {
            RunnerError::Agent(AgentError::ConfigParse { path, .. }) => {
                assert_eq!(path, file.path().display().to_string());
            }
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        let file = write_config(
            "(strategy: (hunting_weapon_threshold: 2, farming_weapon_threshold: 3))",
        );
        assert!(matches!(
            load_config(file.path()),
            Err(RunnerError::Agent(AgentError::InvalidConfig(_)))
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join("absent.ron")).unwrap_err();
        assert!(matches!(err, RunnerError::Io { .. }));
    }

    #[test]
    fn test_no_path_gives_defaults() {
        assert_eq!(load_or_default(None).unwrap(), AgentConfig::default());
    }
}
