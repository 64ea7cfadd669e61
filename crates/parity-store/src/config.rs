// Configuration loading and parsing (config/parity.toml).

use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

use parity_core::league::{League, LeagueConfigError, LeagueRecord};
use parity_core::salary::SalarySettings;

/// Name of the single configuration file under `config/` and `defaults/`.
pub const CONFIG_FILE: &str = "parity.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub salary: SalarySettings,
    /// Leagues to seed at start-up, already checked for a usable pay table
    /// and salary model.
    pub leagues: Vec<League>,
}

// ---------------------------------------------------------------------------
// parity.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire parity.toml file.
#[derive(Debug, Clone, Deserialize)]
struct ParityFile {
    database: DatabaseSection,
    #[serde(default)]
    salary: SalarySettings,
    #[serde(default)]
    leagues: Vec<LeagueRecord>,
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSection {
    path: String,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/parity.toml` relative to the
/// given `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
/// Prefer `load_config()` which handles default initialization automatically.
pub(crate) fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    let file: ParityFile = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    validate(file)
}

/// Seed `config/parity.toml` from `defaults/parity.toml` when it is missing.
/// Returns the path written, or `None` when an operator copy already exists.
pub fn ensure_config_file(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let target = base_dir.join("config").join(CONFIG_FILE);
    if target.exists() {
        return Ok(None);
    }

    let source = base_dir.join("defaults").join(CONFIG_FILE);
    if !source.is_file() {
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "no {CONFIG_FILE} under config/ or defaults/ in {}",
                base_dir.display()
            ),
        });
    }

    let copy_err = |e: std::io::Error| ConfigError::DefaultsCopyError {
        message: format!("failed to copy {} to {}: {e}", source.display(), target.display()),
    };
    if let Some(dir) = target.parent() {
        std::fs::create_dir_all(dir).map_err(copy_err)?;
    }
    std::fs::copy(&source, &target).map_err(copy_err)?;
    Ok(Some(target))
}

/// Load config relative to `base_dir`, copying defaults first.
pub fn load_config_in(base_dir: &Path) -> Result<Config, ConfigError> {
    ensure_config_file(base_dir)?;
    load_config_from(base_dir)
}

/// Convenience wrapper: loads config relative to the current working directory.
/// Seeds the config file from defaults before loading.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    load_config_in(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn league_field(idx: usize, err: &LeagueConfigError) -> String {
    let name = match err {
        LeagueConfigError::MissingStatValues { .. }
        | LeagueConfigError::UnknownStatValues { .. } => "stat_values",
        LeagueConfigError::MissingSalaryCalc { .. }
        | LeagueConfigError::UnknownSalaryCalc { .. } => "salary_calc",
    };
    format!("leagues[{idx}].{name}")
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(file: ParityFile) -> Result<Config, ConfigError> {
    if file.database.path.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "database.path".into(),
            message: "must not be empty".into(),
        });
    }

    if file.salary.pro_rate_points == 0 {
        return Err(ConfigError::ValidationError {
            field: "salary.pro_rate_points".into(),
            message: "must be greater than 0".into(),
        });
    }

    let mut seen = HashSet::new();
    let mut leagues = Vec::with_capacity(file.leagues.len());
    for (idx, record) in file.leagues.into_iter().enumerate() {
        if !seen.insert(record.id) {
            return Err(ConfigError::ValidationError {
                field: format!("leagues[{idx}].id"),
                message: format!("duplicate league id {}", record.id),
            });
        }
        if record.name.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: format!("leagues[{idx}].name"),
                message: "must not be empty".into(),
            });
        }
        let league = League::try_from(record).map_err(|e| ConfigError::ValidationError {
            field: league_field(idx, &e),
            message: e.to_string(),
        })?;
        leagues.push(league);
    }

    Ok(Config {
        db_path: file.database.path,
        salary: file.salary,
        leagues,
    })
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use parity_core::league::{SalaryCalc, StatValueVersion};
    use std::fs;

    /// Helper: returns the path to the parity-store crate root
    /// (works whether `cargo test` runs from the crate root or repo root).
    fn project_root() -> PathBuf {
        let cwd = std::env::current_dir().unwrap();
        if cwd.join("defaults").exists() {
            cwd
        } else if cwd.join("crates/parity-store/defaults").exists() {
            cwd.join("crates/parity-store")
        } else {
            panic!("Cannot locate defaults/ directory from CWD {:?}", cwd);
        }
    }

    /// Scratch dir with `config/parity.toml` holding `text`.
    fn scratch(name: &str, text: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        fs::write(tmp.join("config").join(CONFIG_FILE), text).unwrap();
        tmp
    }

    fn default_text() -> String {
        fs::read_to_string(project_root().join("defaults").join(CONFIG_FILE)).unwrap()
    }

    fn expect_field(err: ConfigError, expected: &str) {
        match &err {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, expected),
            other => panic!("expected ValidationError, got: {other}"),
        }
    }

    #[test]
    fn load_defaults_from_scratch_dir() {
        let tmp = scratch("parity_config_defaults", &default_text());
        let config = load_config_from(&tmp).expect("defaults should load");

        assert_eq!(config.db_path, "parity.db");
        assert_eq!(config.salary, SalarySettings::default());
        assert_eq!(config.leagues.len(), 2);
        assert_eq!(config.leagues[0].stat_values, StatValueVersion::V2);
        assert_eq!(config.leagues[0].salary_calc, SalaryCalc::ProRate);
        assert_eq!(config.leagues[1].salary_calc, SalaryCalc::Sum);
        assert_eq!(config.leagues[1].line_size, Some(7));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn salary_section_is_optional() {
        let tmp = scratch(
            "parity_config_no_salary",
            "[database]\npath = \"x.db\"\n",
        );
        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.salary, SalarySettings::default());
        assert!(config.leagues.is_empty());
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn partial_salary_section_keeps_other_defaults() {
        let tmp = scratch(
            "parity_config_partial_salary",
            "[database]\npath = \"x.db\"\n[salary]\nsum_base = 1000\n",
        );
        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.salary.sum_base, 1000);
        assert_eq!(config.salary.pro_rate_points, 15);
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_projection_points() {
        let text = default_text().replace("pro_rate_points = 15", "pro_rate_points = 0");
        let tmp = scratch("parity_config_zero_points", &text);
        expect_field(load_config_from(&tmp).unwrap_err(), "salary.pro_rate_points");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_empty_database_path() {
        let text = default_text().replace("path = \"parity.db\"", "path = \"\"");
        let tmp = scratch("parity_config_empty_db", &text);
        expect_field(load_config_from(&tmp).unwrap_err(), "database.path");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_duplicate_league_ids() {
        let text = default_text().replace("id = 2", "id = 1");
        let tmp = scratch("parity_config_dup_league", &text);
        expect_field(load_config_from(&tmp).unwrap_err(), "leagues[1].id");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_unknown_stat_values() {
        let text = default_text().replace("stat_values = \"v1\"", "stat_values = \"v9\"");
        let tmp = scratch("parity_config_bad_values", &text);
        expect_field(load_config_from(&tmp).unwrap_err(), "leagues[1].stat_values");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_league_without_salary_calc() {
        let text = "[database]\npath = \"x.db\"\n\n[[leagues]]\nid = 3\nname = \"Old\"\nstat_values = \"v1\"\n";
        let tmp = scratch("parity_config_no_calc", text);
        expect_field(load_config_from(&tmp).unwrap_err(), "leagues[0].salary_calc");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn file_not_found_for_missing_config() {
        let tmp = std::env::temp_dir().join("parity_config_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();

        let err = load_config_from(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let tmp = scratch("parity_config_invalid", "[database\npath = ");
        let err = load_config_from(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_file_copies_then_keeps_operator_edits() {
        let tmp = std::env::temp_dir().join("parity_config_ensure");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        fs::write(tmp.join("defaults").join(CONFIG_FILE), default_text()).unwrap();

        let copied = ensure_config_file(&tmp).unwrap();
        assert_eq!(copied, Some(tmp.join("config").join(CONFIG_FILE)));

        fs::write(tmp.join("config").join(CONFIG_FILE), "edited").unwrap();
        assert_eq!(ensure_config_file(&tmp).unwrap(), None);
        assert_eq!(
            fs::read_to_string(tmp.join("config").join(CONFIG_FILE)).unwrap(),
            "edited"
        );

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_file_without_defaults_errors() {
        let tmp = std::env::temp_dir().join("parity_config_bare");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        let err = ensure_config_file(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::DefaultsCopyError { .. }));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn load_config_in_bootstraps_from_defaults() {
        let tmp = std::env::temp_dir().join("parity_config_bootstrap");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        fs::write(tmp.join("defaults").join(CONFIG_FILE), default_text()).unwrap();

        let config = load_config_in(&tmp).unwrap();
        assert_eq!(config.leagues.len(), 2);
        assert!(tmp.join("config").join(CONFIG_FILE).exists());

        let _ = fs::remove_dir_all(&tmp);
    }
}
