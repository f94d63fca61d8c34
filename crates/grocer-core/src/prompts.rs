//! Prompt library for the AI backends
//!
//! Prompts are markdown files with YAML frontmatter and `# System` / `# User`
//! sections. They are resolved in two layers:
//! 1. An override in the data dir (~/.local/share/grocer/prompts/overrides/<id>.md)
//! 2. The embedded default compiled into the binary
//!
//! Users can tune the wording without rebuilding, and still pick up new
//! defaults on upgrade.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Embedded default prompts (compiled into binary)
mod defaults {
    pub const MATCH_PRODUCTS: &str = include_str!("../../../prompts/match_products.md");
    pub const EXPAND_MEAL: &str = include_str!("../../../prompts/expand_meal.md");
    pub const PARSE_FLYER: &str = include_str!("../../../prompts/parse_flyer.md");
}

/// Known prompt IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptId {
    /// Batched item -> catalog product matching
    MatchProducts,
    /// Meal description -> ingredient list
    ExpandMeal,
    /// Flyer image -> deals (vision)
    ParseFlyer,
}

impl PromptId {
    /// Get the string identifier for this prompt
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MatchProducts => "match_products",
            Self::ExpandMeal => "expand_meal",
            Self::ParseFlyer => "parse_flyer",
        }
    }

    /// Get all known prompt IDs
    pub fn all() -> &'static [PromptId] {
        &[Self::MatchProducts, Self::ExpandMeal, Self::ParseFlyer]
    }

    fn default_content(&self) -> &'static str {
        match self {
            Self::MatchProducts => defaults::MATCH_PRODUCTS,
            Self::ExpandMeal => defaults::EXPAND_MEAL,
            Self::ParseFlyer => defaults::PARSE_FLYER,
        }
    }
}

impl std::str::FromStr for PromptId {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| format!("Unknown prompt ID: {}", s))
    }
}

/// Prompt frontmatter metadata
#[derive(Debug, Clone, Deserialize)]
pub struct PromptMetadata {
    pub id: String,
    /// Bumped whenever the wording changes
    pub version: u32,
    /// AI task this prompt is used for (matches config task keys)
    pub task_type: String,
}

/// A loaded prompt with metadata and content
#[derive(Debug, Clone)]
pub struct Prompt {
    pub metadata: PromptMetadata,
    /// Body after the frontmatter (system + user sections)
    pub content: String,
    pub is_override: bool,
    pub override_path: Option<PathBuf>,
}

impl Prompt {
    pub fn system_section(&self) -> Option<&str> {
        extract_section(&self.content, "# System")
    }

    pub fn user_section(&self) -> Option<&str> {
        extract_section(&self.content, "# User")
    }

    /// Render the whole body with `{{var}}` placeholders filled in
    pub fn render(&self, vars: &HashMap<&str, &str>) -> String {
        substitute(&self.content, vars)
    }

    /// Render just the user section, or the whole body if it has none
    pub fn render_user(&self, vars: &HashMap<&str, &str>) -> String {
        match self.user_section() {
            Some(user) => substitute(user, vars),
            None => self.render(vars),
        }
    }
}

/// Prompt library for loading and caching prompts
pub struct PromptLibrary {
    override_dir: Option<PathBuf>,
    cache: HashMap<PromptId, Prompt>,
}

impl PromptLibrary {
    /// Create a prompt library with the default override directory
    pub fn new() -> Self {
        Self {
            override_dir: default_prompts_dir(),
            cache: HashMap::new(),
        }
    }

    /// Create a prompt library with a custom override directory
    pub fn with_override_dir(path: PathBuf) -> Self {
        Self {
            override_dir: Some(path),
            cache: HashMap::new(),
        }
    }

    /// Create a prompt library that only uses embedded prompts
    pub fn embedded_only() -> Self {
        Self {
            override_dir: None,
            cache: HashMap::new(),
        }
    }

    /// Get a prompt by ID, loading from override or default
    pub fn get(&mut self, id: PromptId) -> Result<&Prompt> {
        match self.cache.entry(id) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let prompt = load(self.override_dir.as_ref(), id)?;
                Ok(entry.insert(prompt))
            }
        }
    }

    /// Render the user section of a prompt
    pub fn render_user(&mut self, id: PromptId, vars: &HashMap<&str, &str>) -> Result<String> {
        Ok(self.get(id)?.render_user(vars))
    }

    /// List all prompts with their override status
    pub fn list(&mut self) -> Vec<PromptInfo> {
        PromptId::all()
            .iter()
            .map(|&id| {
                let override_path = self.override_path(id).filter(|p| p.exists());
                let (version, task_type) = match self.get(id) {
                    Ok(p) => (p.metadata.version, p.metadata.task_type.clone()),
                    Err(e) => {
                        tracing::warn!(prompt = id.as_str(), "Failed to load prompt: {}", e);
                        (0, String::new())
                    }
                };
                PromptInfo {
                    id: id.as_str().to_string(),
                    version,
                    task_type,
                    has_override: override_path.is_some(),
                    override_path,
                }
            })
            .collect()
    }

    /// Check if a prompt has an override file
    pub fn has_override(&self, id: PromptId) -> bool {
        self.override_path(id).is_some_and(|p| p.exists())
    }

    /// Get the override directory path
    pub fn override_dir(&self) -> Option<&PathBuf> {
        self.override_dir.as_ref()
    }

    /// Drop cached prompts so edited overrides are picked up
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    fn override_path(&self, id: PromptId) -> Option<PathBuf> {
        self.override_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.md", id.as_str())))
    }
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::new()
    }
}

/// Information about a prompt for listing
#[derive(Debug, Clone)]
pub struct PromptInfo {
    pub id: String,
    pub version: u32,
    pub task_type: String,
    pub has_override: bool,
    pub override_path: Option<PathBuf>,
}

/// Default prompts override directory
pub fn default_prompts_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("grocer").join("prompts").join("overrides"))
}

fn load(override_dir: Option<&PathBuf>, id: PromptId) -> Result<Prompt> {
    if let Some(dir) = override_dir {
        let path = dir.join(format!("{}.md", id.as_str()));
        if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| {
                Error::InvalidData(format!("Failed to read prompt override: {}", e))
            })?;
            let (metadata, body) = parse_prompt(&content)?;
            return Ok(Prompt {
                metadata,
                content: body,
                is_override: true,
                override_path: Some(path),
            });
        }
    }

    let (metadata, body) = parse_prompt(id.default_content())?;
    Ok(Prompt {
        metadata,
        content: body,
        is_override: false,
        override_path: None,
    })
}

/// Split a prompt file into frontmatter metadata and body
fn parse_prompt(content: &str) -> Result<(PromptMetadata, String)> {
    let rest = content.trim().strip_prefix("---").ok_or_else(|| {
        Error::InvalidData("Prompt must start with YAML frontmatter (---)".into())
    })?;

    let (frontmatter, body) = rest.split_once("---").ok_or_else(|| {
        Error::InvalidData("Prompt frontmatter not closed (missing second ---)".into())
    })?;

    let metadata: PromptMetadata = serde_yaml::from_str(frontmatter.trim())
        .map_err(|e| Error::InvalidData(format!("Invalid prompt frontmatter: {}", e)))?;

    Ok((metadata, body.trim().to_string()))
}

/// Text between `header` and the next top-level header
fn extract_section<'a>(content: &'a str, header: &str) -> Option<&'a str> {
    let start = content.find(header)?;
    let after_header = &content[start + header.len()..];
    let end = after_header.find("\n# ").unwrap_or(after_header.len());
    Some(after_header[..end].trim())
}

/// Fill `{{var}}` placeholders and resolve `{{#if var}}...{{/if}}` blocks
fn substitute(template: &str, vars: &HashMap<&str, &str>) -> String {
    let mut result = resolve_conditionals(template, vars);
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}

/// Keep conditional blocks whose variable is set and non-empty, drop the rest
fn resolve_conditionals(content: &str, vars: &HashMap<&str, &str>) -> String {
    const OPEN: &str = "{{#if ";
    const CLOSE: &str = "{{/if}}";

    let mut result = content.to_string();
    while let Some(if_start) = result.find(OPEN) {
        let var_start = if_start + OPEN.len();
        let Some(var_len) = result[var_start..].find("}}") else {
            break;
        };
        let block_start = var_start + var_len + 2;
        let Some(block_len) = result[block_start..].find(CLOSE) else {
            break;
        };

        let var_name = &result[var_start..var_start + var_len];
        let keep = vars.get(var_name).is_some_and(|v| !v.is_empty());
        let block = if keep {
            result[block_start..block_start + block_len].to_string()
        } else {
            String::new()
        };
        let block_end = block_start + block_len + CLOSE.len();
        result = format!("{}{}{}", &result[..if_start], block, &result[block_end..]);
    }
    result
}
