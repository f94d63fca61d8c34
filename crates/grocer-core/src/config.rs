//! AI task configuration
//!
//! Each AI task (product matching, meal expansion, flyer vision) gets its own
//! timeout and optional model override.
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/grocer/config/ai.toml)
//! 2. Fall back to embedded defaults (compiled into binary)

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/ai.toml");

/// AI tasks with independent settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskType {
    /// Batched phrase -> catalog product matching
    ProductMatching,
    /// Meal description -> ingredient list
    MealExpansion,
    /// Flyer image -> deals
    FlyerVision,
}

impl TaskType {
    /// Get the config key for this task type
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProductMatching => "product_matching",
            Self::MealExpansion => "meal_expansion",
            Self::FlyerVision => "flyer_vision",
        }
    }

    /// Get all task types
    pub fn all() -> &'static [TaskType] {
        &[
            Self::ProductMatching,
            Self::MealExpansion,
            Self::FlyerVision,
        ]
    }
}

impl std::str::FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "product_matching" => Ok(Self::ProductMatching),
            "meal_expansion" => Ok(Self::MealExpansion),
            "flyer_vision" => Ok(Self::FlyerVision),
            _ => Err(format!("Unknown task type: {}", s)),
        }
    }
}

/// Settings for one task
#[derive(Debug, Clone, PartialEq)]
pub struct TaskConfig {
    /// Model override; None uses the backend's own model
    pub model: Option<String>,
    /// Per-call timeout; expiry counts as a call failure
    pub timeout: Duration,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            model: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// AI configuration for all tasks
#[derive(Debug, Clone)]
pub struct AiConfig {
    /// Timeout for tasks without their own entry
    pub default_timeout: Duration,
    /// Per-task configurations
    pub tasks: HashMap<TaskType, TaskConfig>,
}

impl Default for AiConfig {
    fn default() -> Self {
        let mut tasks = HashMap::new();
        tasks.insert(TaskType::ProductMatching, TaskConfig::default());
        tasks.insert(TaskType::MealExpansion, TaskConfig::default());
        tasks.insert(
            TaskType::FlyerVision,
            TaskConfig {
                model: None,
                timeout: Duration::from_secs(120),
            },
        );
        Self {
            default_timeout: Duration::from_secs(30),
            tasks,
        }
    }
}

impl AiConfig {
    /// Load from the override file if present, else the embedded default
    pub fn load() -> Result<Self> {
        load_config(default_config_path().as_deref())
    }

    /// Load from a specific override path (falls back to the embedded default)
    pub fn load_from(path: &Path) -> Result<Self> {
        load_config(Some(path))
    }

    /// Load, falling back to built-in defaults on any error
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("Invalid AI config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Get the full task configuration
    pub fn task(&self, task: TaskType) -> TaskConfig {
        self.tasks.get(&task).cloned().unwrap_or_else(|| TaskConfig {
            model: None,
            timeout: self.default_timeout,
        })
    }

    /// Model to use for a task, given the backend's own model
    pub fn model_for<'a>(&'a self, task: TaskType, backend_model: &'a str) -> &'a str {
        self.tasks
            .get(&task)
            .and_then(|c| c.model.as_deref())
            .unwrap_or(backend_model)
    }

    /// Get the timeout for a task
    pub fn timeout_for(&self, task: TaskType) -> Duration {
        self.task(task).timeout
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("grocer").join("config").join("ai.toml"))
}

/// Load configuration (override first, then default)
fn load_config(override_path: Option<&Path>) -> Result<AiConfig> {
    let content = match override_path {
        Some(path) if path.exists() => fs::read_to_string(path)
            .map_err(|e| Error::InvalidData(format!("Failed to read config: {}", e)))?,
        _ => DEFAULT_CONFIG.to_string(),
    };

    parse_config(&content)
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    defaults: Option<RawDefaults>,
    tasks: Option<HashMap<String, RawTaskConfig>>,
}

#[derive(Debug, Deserialize)]
struct RawDefaults {
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawTaskConfig {
    model: Option<String>,
    timeout_secs: Option<u64>,
}

/// Parse config from TOML content
fn parse_config(content: &str) -> Result<AiConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::InvalidData(format!("Invalid config TOML: {}", e)))?;

    let mut config = AiConfig::default();

    if let Some(timeout) = raw.defaults.and_then(|d| d.timeout_secs) {
        config.default_timeout = Duration::from_secs(timeout);
    }

    if let Some(tasks) = raw.tasks {
        for (task_name, task_config) in tasks {
            let Ok(task) = task_name.parse::<TaskType>() else {
                tracing::warn!(task = %task_name, "Ignoring unknown AI task in config");
                continue;
            };

            config.tasks.insert(
                task,
                TaskConfig {
                    model: task_config.model.filter(|m| !m.trim().is_empty()),
                    timeout: task_config
                        .timeout_secs
                        .map(Duration::from_secs)
                        .unwrap_or(config.default_timeout),
                },
            );
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_config() {
        let config = parse_config(DEFAULT_CONFIG).unwrap();
        assert_eq!(
            config.timeout_for(TaskType::ProductMatching),
            Duration::from_secs(30)
        );
        assert_eq!(
            config.timeout_for(TaskType::MealExpansion),
            Duration::from_secs(30)
        );
        assert_eq!(
            config.timeout_for(TaskType::FlyerVision),
            Duration::from_secs(120)
        );
    }

    #[test]
    fn test_task_type_round_trip_names() {
        for task in TaskType::all() {
            assert_eq!(task.as_str().parse::<TaskType>().unwrap(), *task);
        }
    }

    #[test]
    fn test_model_override() {
        let config = parse_config(
            r#"
[tasks.flyer_vision]
model = "llava"
"#,
        )
        .unwrap();

        assert_eq!(config.model_for(TaskType::FlyerVision, "gemma3"), "llava");
        assert_eq!(
            config.model_for(TaskType::ProductMatching, "gemma3"),
            "gemma3"
        );
    }

    #[test]
    fn test_task_without_timeout_uses_default() {
        let config = parse_config(
            r#"
[defaults]
timeout_secs = 12

[tasks.meal_expansion]
model = "phi3"
"#,
        )
        .unwrap();

        assert_eq!(
            config.timeout_for(TaskType::MealExpansion),
            Duration::from_secs(12)
        );
    }

    #[test]
    fn test_unknown_task_is_ignored() {
        let config = parse_config(
            r#"
[tasks.receipt_parsing]
timeout_secs = 5
"#,
        )
        .unwrap();
        assert_eq!(config.tasks.len(), 3);
    }

    #[test]
    fn test_invalid_toml_is_error() {
        assert!(matches!(
            parse_config("[defaults\ntimeout_secs = "),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn test_load_from_missing_path_uses_embedded() {
        let dir = tempfile::tempdir().unwrap();
        let config = AiConfig::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(
            config.timeout_for(TaskType::FlyerVision),
            Duration::from_secs(120)
        );
    }

    #[test]
    fn test_load_from_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ai.toml");
        fs::write(&path, "[tasks.product_matching]\ntimeout_secs = 3\n").unwrap();

        let config = AiConfig::load_from(&path).unwrap();
        assert_eq!(
            config.timeout_for(TaskType::ProductMatching),
            Duration::from_secs(3)
        );
    }
}
