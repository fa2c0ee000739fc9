//! Layered configuration (spec §6 "Configurable tables" + SPEC_FULL §A.3).
//!
//! Layering order, later wins: built-in defaults → `.roam/settings.toml` →
//! `ROAM_`-prefixed environment variables (double-underscore nesting, e.g.
//! `ROAM_INDEXING__PARALLEL_THREADS=8`).

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,

    #[serde(default)]
    pub indexing: IndexingConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub risk: RiskConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexingConfig {
    #[serde(default = "default_parallel_threads")]
    pub parallel_threads: usize,

    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub default: String,
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

/// The two user-overridable tables from spec §6, consumed by the graph
/// overlay's risk-adjacent scoring (bottleneck severity context, hub
/// penalty thresholds) — kept in one place per spec §9's closing note
/// rather than scattered as inline constants at each call site.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RiskConfig {
    #[serde(default = "default_domain_weights")]
    pub domain_weights: HashMap<String, f64>,
    #[serde(default = "default_path_zones")]
    pub path_zones: Vec<PathZone>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathZone {
    pub name: String,
    pub patterns: Vec<String>,
    pub weight: f64,
}

fn default_index_path() -> PathBuf {
    PathBuf::from(".roam")
}

fn default_parallel_threads() -> usize {
    num_cpus::get()
}

fn default_ignore_patterns() -> Vec<String> {
    vec![
        "target/**".into(),
        "node_modules/**".into(),
        ".git/**".into(),
        "dist/**".into(),
        "build/**".into(),
    ]
}

fn default_log_level() -> String {
    "warn".into()
}

fn default_domain_weights() -> HashMap<String, f64> {
    [
        ("auth", 1.5),
        ("payment", 1.8),
        ("security", 1.6),
        ("crypto", 1.6),
        ("billing", 1.5),
        ("session", 1.3),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

fn default_path_zones() -> Vec<PathZone> {
    vec![
        PathZone {
            name: "tests".into(),
            patterns: vec!["**/tests/**".into(), "**/*_test.*".into(), "**/*.test.*".into()],
            weight: 0.3,
        },
        PathZone {
            name: "vendor".into(),
            patterns: vec!["**/vendor/**".into(), "**/third_party/**".into()],
            weight: 0.2,
        },
        PathZone {
            name: "generated".into(),
            patterns: vec!["**/generated/**".into(), "**/*.generated.*".into()],
            weight: 0.2,
        },
    ]
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            index_path: default_index_path(),
            indexing: IndexingConfig::default(),
            logging: LoggingConfig::default(),
            risk: RiskConfig::default(),
        }
    }
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            parallel_threads: default_parallel_threads(),
            ignore_patterns: default_ignore_patterns(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load layered settings rooted at `project_root` (the directory whose
    /// `.roam/` holds `settings.toml`, `domain-weights.json`,
    /// `path-zones.json`).
    pub fn load(project_root: &Path) -> crate::error::Result<Self> {
        let roam_dir = project_root.join(".roam");
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));

        let settings_toml = roam_dir.join("settings.toml");
        if settings_toml.exists() {
            figment = figment.merge(Toml::file(&settings_toml));
        }
        figment = figment.merge(Env::prefixed("ROAM_").split("__"));

        let mut settings: Settings =
            figment
                .extract()
                .map_err(|e| crate::error::RoamError::Config {
                    reason: e.to_string(),
                })?;

        settings.risk.domain_weights = load_json_or(
            &roam_dir.join("domain-weights.json"),
            settings.risk.domain_weights,
        )?;
        settings.risk.path_zones =
            load_json_or(&roam_dir.join("path-zones.json"), settings.risk.path_zones)?;

        Ok(settings)
    }
}

fn load_json_or<T: serde::de::DeserializeOwned>(
    path: &Path,
    fallback: T,
) -> crate::error::Result<T> {
    if !path.exists() {
        return Ok(fallback);
    }
    let data = std::fs::read_to_string(path).map_err(|e| crate::error::RoamError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&data).map_err(|e| crate::error::RoamError::Config {
        reason: format!("{}: {e}", path.display()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_non_empty() {
        let s = Settings::default();
        assert!(!s.risk.domain_weights.is_empty());
        assert!(!s.risk.path_zones.is_empty());
        assert!(s.indexing.parallel_threads > 0);
    }

    #[test]
    fn load_falls_back_to_defaults_without_roam_dir() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(dir.path()).unwrap();
        assert_eq!(settings.index_path, PathBuf::from(".roam"));
    }

    #[test]
    fn load_honors_domain_weights_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".roam")).unwrap();
        std::fs::write(
            dir.path().join(".roam/domain-weights.json"),
            r#"{"custom": 9.0}"#,
        )
        .unwrap();
        let settings = Settings::load(dir.path()).unwrap();
        assert_eq!(settings.risk.domain_weights.get("custom"), Some(&9.0));
    }
}
