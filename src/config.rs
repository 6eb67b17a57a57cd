use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::profile::RuleTable;
use crate::scoring::tiers::DEFAULT_WINDOW_SIZE;
use crate::scoring::{TierClassifier, TierMode};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TierConfig {
    pub mode: TierMode,
    pub window_size: usize,
}

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            mode: TierMode::GapBoundary,
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }
}

impl TierConfig {
    /// Applies per-call mode and window overrides. A zero window is rejected.
    pub fn with_overrides(&self, mode: Option<&str>, window: Option<usize>) -> Result<Self, String> {
        let mut tiers = self.clone();
        if let Some(mode) = mode {
            tiers.mode = mode.parse()?;
        }
        if let Some(window) = window {
            if window == 0 {
                return Err("window size must be at least 1".to_string());
            }
            tiers.window_size = window;
        }
        Ok(tiers)
    }

    pub fn classifier(&self) -> TierClassifier {
        TierClassifier::new(self.mode, self.window_size)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub institutions: Option<PathBuf>,
    pub country_weights: Option<PathBuf>,
    pub universities: Option<PathBuf>,
    pub seats: Option<PathBuf>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            institutions: Some(PathBuf::from("data/institutions.csv")),
            country_weights: None,
            universities: None,
            seats: Some(PathBuf::from("data/seats.csv")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub tiers: TierConfig,
    pub data: DataConfig,
    pub logging: LoggingConfig,
    pub rules: RuleTable,
}

impl EngineConfig {
    pub fn load(path: Option<PathBuf>) -> Result<(Self, Option<PathBuf>), String> {
        let config_path = path.or_else(default_config_path);
        let mut config = match config_path.as_ref() {
            Some(path) if path.exists() => Self::from_file(path)?,
            _ => EngineConfig::default(),
        };

        config.apply_env_overrides();
        Ok((config, config_path))
    }

    pub fn from_file(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|err| format!("failed to read config: {}", err))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, String> {
        toml::from_str(contents).map_err(|err| format!("failed to parse config: {}", err))
    }

    pub fn write(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|err| format!("failed to create config dir: {}", err))?;
        }
        let payload = toml::to_string_pretty(self)
            .map_err(|err| format!("failed to serialize config: {}", err))?;
        std::fs::write(path, payload).map_err(|err| format!("failed to write config: {}", err))?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(mode) = env::var("TIER_MODE") {
            if let Ok(mode) = mode.parse::<TierMode>() {
                self.tiers.mode = mode;
            }
        }
        if let Ok(window) = env::var("TIER_WINDOW_SIZE") {
            if let Some(value) = window.parse::<usize>().ok().filter(|value| *value > 0) {
                self.tiers.window_size = value;
            }
        }
        if let Ok(path) = env::var("INSTITUTIONS_PATH") {
            if !path.trim().is_empty() {
                self.data.institutions = Some(PathBuf::from(path));
            }
        }
        if let Ok(path) = env::var("SEATS_PATH") {
            if !path.trim().is_empty() {
                self.data.seats = Some(PathBuf::from(path));
            }
        }
        if let Ok(level) = env::var("LOG_LEVEL") {
            if !level.trim().is_empty() {
                self.logging.level = level;
            }
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    env::var("ADMIT_FIT_CONFIG_PATH")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| Some(PathBuf::from("config/admit-fit.toml")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::CriterionName;

    #[test]
    fn empty_toml_uses_defaults() {
        let config = EngineConfig::from_toml("").expect("parse");
        assert_eq!(config.tiers.mode, TierMode::GapBoundary);
        assert_eq!(config.tiers.window_size, 6);
        assert_eq!(config.rules, RuleTable::undergraduate());
    }

    #[test]
    fn overrides_parse_mode_and_reject_zero_window() {
        let tiers = TierConfig::default();
        let overridden = tiers
            .with_overrides(Some("fit"), Some(3))
            .expect("valid overrides");
        assert_eq!(overridden.mode, TierMode::FitDescending);
        assert_eq!(overridden.window_size, 3);

        assert!(tiers.with_overrides(None, Some(0)).is_err());
        assert!(tiers.with_overrides(Some("random"), None).is_err());
        assert_eq!(tiers.with_overrides(None, None).expect("no overrides").window_size, 6);
    }

    #[test]
    fn default_config_survives_toml_round_trip() {
        let payload = toml::to_string_pretty(&EngineConfig::default()).expect("serialize");
        let parsed = EngineConfig::from_toml(&payload).expect("parse");
        assert_eq!(parsed.rules, RuleTable::undergraduate());
    }

    #[test]
    fn custom_rules_are_parsed_and_validated() {
        let payload = r#"
            [tiers]
            mode = "fit_descending"
            window_size = 4

            [[rules]]
            criterion = "SAT"
            terms = [
                { source = { from = "field", field = "sat_score", scale = { max = 1600.0 } }, coefficient = 1.0 },
            ]

            [[rules]]
            criterion = "Interview"
            terms = [
                { source = { from = "field", field = "interview_rating", scale = { max = 5.0 } }, coefficient = 0.5 },
                { source = { from = "criterion", criterion = "SAT" }, coefficient = 0.5 },
            ]
        "#;
        let config = EngineConfig::from_toml(payload).expect("parse");
        assert_eq!(config.tiers.window_size, 4);
        let criteria: Vec<_> = config.rules.criteria().collect();
        assert_eq!(criteria, vec![CriterionName::Sat, CriterionName::Interview]);
    }

    #[test]
    fn invalid_rules_are_rejected_on_load() {
        let payload = r#"
            [[rules]]
            criterion = "SAT"
            terms = [
                { source = { from = "field", field = "sat_score", scale = "percent" }, coefficient = 0.4 },
            ]
        "#;
        let err = EngineConfig::from_toml(payload).unwrap_err();
        assert!(err.contains("failed to parse config"));
    }
}
