//! Configuration management for `basecamp_redmine`.
//!
//! Configuration sources and precedence (highest wins):
//! 1. CLI overrides
//! 2. Environment variables (`BC2RM_*`)
//! 3. Config file (`--config`, or `bc2rm.yaml` in the working directory)
//! 4. Defaults
//!
//! Every layer is a flat `key -> string` map. YAML mappings nest with `.` and
//! sequences are joined with commas. The merged layer is resolved once into a
//! typed [`ImportConfig`], which is where validation happens.

use crate::error::{ImportError, Result};
use crate::mapping::filter::InclusionFilter;
use crate::mapping::users::UserMap;
use crate::model::TargetId;
use crate::util::text::char_count;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILENAME: &str = "bc2rm.yaml";
/// Environment variable prefix.
const ENV_PREFIX: &str = "BC2RM_";

/// Every scalar setting, in its canonical spelling.
const KNOWN_KEYS: &[&str] = &[
    "limits.project-name",
    "limits.board-description",
    "limits.message-subject",
    "limits.issue-subject",
    "ellipsis",
    "reply-prefix",
    "name-append",
    "status.default",
    "status.closed",
    "tracker.default",
    "tracker.list",
    "organizations.import",
    "organizations.name-prefix",
    "organizations.short-name-prefix",
    "organizations.include",
    "organizations.exclude",
    "projects.include",
    "projects.exclude",
    "parent-project-id",
    "rollback-on-failure",
];

/// Field length limits of the target data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub project_name: usize,
    pub board_description: usize,
    pub message_subject: usize,
    pub issue_subject: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            project_name: 30,
            board_description: 255,
            message_subject: 255,
            issue_subject: 255,
        }
    }
}

/// How `firm` and `clients/client` are treated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganizationOptions {
    /// Import organizations as parent projects.
    pub import: bool,
    /// Prepended to the organization name in the project description.
    pub name_prefix: String,
    /// Prepended to the organization name before it is truncated.
    pub short_name_prefix: String,
    pub filter: InclusionFilter,
}

/// Resolved settings for one import run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportConfig {
    pub limits: Limits,
    pub ellipsis: String,
    pub reply_prefix: String,
    /// Appended to board names; its length is reserved in the project name.
    pub name_append: String,
    pub default_status: String,
    pub closed_status: String,
    pub default_tracker: String,
    pub list_tracker: String,
    pub organizations: OrganizationOptions,
    pub projects: InclusionFilter,
    pub parent_project_id: Option<TargetId>,
    pub users: UserMap,
    pub rollback_on_failure: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            limits: Limits::default(),
            ellipsis: "...".to_string(),
            reply_prefix: "Re: ".to_string(),
            name_append: String::new(),
            default_status: "New".to_string(),
            closed_status: "Closed".to_string(),
            default_tracker: "Bug".to_string(),
            list_tracker: "Todo List".to_string(),
            organizations: OrganizationOptions::default(),
            projects: InclusionFilter::default(),
            parent_project_id: None,
            users: UserMap::default(),
            rollback_on_failure: false,
        }
    }
}

impl ImportConfig {
    /// Resolve a merged layer. Unset keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::Config`] for unparsable values or limits too
    /// small to hold the ellipsis.
    pub fn from_layer(layer: &ConfigLayer) -> Result<Self> {
        let defaults = Self::default();
        let limits = Limits {
            project_name: parse_usize(layer, "limits.project-name")?
                .unwrap_or(defaults.limits.project_name),
            board_description: parse_usize(layer, "limits.board-description")?
                .unwrap_or(defaults.limits.board_description),
            message_subject: parse_usize(layer, "limits.message-subject")?
                .unwrap_or(defaults.limits.message_subject),
            issue_subject: parse_usize(layer, "limits.issue-subject")?
                .unwrap_or(defaults.limits.issue_subject),
        };

        let config = Self {
            limits,
            ellipsis: string_or(layer, "ellipsis", defaults.ellipsis),
            reply_prefix: string_or(layer, "reply-prefix", defaults.reply_prefix),
            name_append: string_or(layer, "name-append", defaults.name_append),
            default_status: string_or(layer, "status.default", defaults.default_status),
            closed_status: string_or(layer, "status.closed", defaults.closed_status),
            default_tracker: string_or(layer, "tracker.default", defaults.default_tracker),
            list_tracker: string_or(layer, "tracker.list", defaults.list_tracker),
            organizations: OrganizationOptions {
                import: parse_flag(layer, "organizations.import")?.unwrap_or(false),
                name_prefix: string_or(layer, "organizations.name-prefix", String::new()),
                short_name_prefix: string_or(
                    layer,
                    "organizations.short-name-prefix",
                    String::new(),
                ),
                filter: InclusionFilter::new(
                    parse_list(layer, "organizations.include"),
                    parse_list(layer, "organizations.exclude"),
                ),
            },
            projects: InclusionFilter::new(
                parse_list(layer, "projects.include"),
                parse_list(layer, "projects.exclude"),
            ),
            parent_project_id: parse_i64(layer, "parent-project-id")?
                .filter(|id| *id > 0)
                .map(TargetId),
            users: user_map(layer)?,
            rollback_on_failure: parse_flag(layer, "rollback-on-failure")?.unwrap_or(false),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let ellipsis = char_count(&self.ellipsis);
        let room = [
            (
                "limits.project-name",
                self.limits
                    .project_name
                    .checked_sub(char_count(&self.name_append)),
            ),
            ("limits.board-description", Some(self.limits.board_description)),
            (
                "limits.message-subject",
                self.limits
                    .message_subject
                    .checked_sub(char_count(&self.reply_prefix)),
            ),
            ("limits.issue-subject", Some(self.limits.issue_subject)),
        ];
        for (key, available) in room {
            match available {
                Some(n) if n >= ellipsis && n > 0 => {}
                _ => {
                    return Err(ImportError::Config(format!(
                        "{key} leaves no room for the ellipsis '{}'",
                        self.ellipsis
                    )));
                }
            }
        }
        Ok(())
    }

    /// Usable length of a project name before `name-append` is added.
    #[must_use]
    pub fn project_name_room(&self) -> usize {
        self.limits
            .project_name
            .saturating_sub(char_count(&self.name_append))
    }

    /// Usable length of a post title so its reply subject still fits.
    #[must_use]
    pub fn message_subject_room(&self) -> usize {
        self.limits
            .message_subject
            .saturating_sub(char_count(&self.reply_prefix))
    }
}

/// A flat configuration layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    pub values: HashMap<String, String>,
}

impl ConfigLayer {
    /// Merge another layer on top of this one (higher precedence wins).
    pub fn merge_from(&mut self, other: &Self) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Merge multiple layers in precedence order (lowest to highest).
    #[must_use]
    pub fn merge_layers(layers: &[Self]) -> Self {
        let mut merged = Self::default();
        for layer in layers {
            merged.merge_from(layer);
        }
        merged
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(normalize_key(key), value.into());
    }

    /// Build a layer from a YAML file path. Missing files return empty config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_yaml(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// # Errors
    ///
    /// Returns an error if the text is not valid YAML.
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let value: serde_yaml::Value = serde_yaml::from_str(contents)?;
        let mut flat = HashMap::new();
        flatten_yaml(&value, "", &mut flat);

        let mut layer = Self::default();
        for (key, value) in flat {
            layer.insert(&key, value);
        }
        Ok(layer)
    }

    /// Build a layer from `BC2RM_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(env::vars())
    }

    /// Build a layer from `(name, value)` pairs shaped like the environment.
    pub fn from_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut layer = Self::default();
        for (key, value) in vars {
            let Some(stripped) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match canonical_key(stripped) {
                Some(known) => {
                    layer.values.insert(known.to_string(), value);
                }
                None => {
                    for variant in env_key_variants(stripped) {
                        layer.values.insert(variant, value.clone());
                    }
                }
            }
        }
        layer
    }
}

/// CLI overrides for config loading (optional).
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub rollback: Option<bool>,
    pub import_organizations: Option<bool>,
    pub parent_project_id: Option<i64>,
}

impl CliOverrides {
    #[must_use]
    pub fn as_layer(&self) -> ConfigLayer {
        let mut layer = ConfigLayer::default();

        if let Some(rollback) = self.rollback {
            layer.insert("rollback-on-failure", rollback.to_string());
        }
        if let Some(import) = self.import_organizations {
            layer.insert("organizations.import", import.to_string());
        }
        if let Some(id) = self.parent_project_id {
            layer.insert("parent-project-id", id.to_string());
        }

        layer
    }
}

/// Default config layer (lowest precedence).
#[must_use]
pub fn default_config_layer() -> ConfigLayer {
    let defaults = ImportConfig::default();
    let mut layer = ConfigLayer::default();
    layer.insert("limits.project-name", defaults.limits.project_name.to_string());
    layer.insert(
        "limits.board-description",
        defaults.limits.board_description.to_string(),
    );
    layer.insert(
        "limits.message-subject",
        defaults.limits.message_subject.to_string(),
    );
    layer.insert("limits.issue-subject", defaults.limits.issue_subject.to_string());
    layer.insert("ellipsis", defaults.ellipsis);
    layer.insert("reply-prefix", defaults.reply_prefix);
    layer.insert("status.default", defaults.default_status);
    layer.insert("status.closed", defaults.closed_status);
    layer.insert("tracker.default", defaults.default_tracker);
    layer.insert("tracker.list", defaults.list_tracker);
    layer
}

/// Load configuration with the usual precedence order.
///
/// An explicit `config_path` must exist; the default file is optional.
///
/// # Errors
///
/// Returns an error if a config file cannot be read or parsed.
pub fn load_config(config_path: Option<&Path>, cli: &CliOverrides) -> Result<ConfigLayer> {
    let file_layer = match config_path {
        Some(path) if !path.exists() => {
            return Err(ImportError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        Some(path) => ConfigLayer::from_yaml(path)?,
        None => ConfigLayer::from_yaml(&PathBuf::from(DEFAULT_CONFIG_FILENAME))?,
    };

    Ok(ConfigLayer::merge_layers(&[
        default_config_layer(),
        file_layer,
        ConfigLayer::from_env(),
        cli.as_layer(),
    ]))
}

/// Load and resolve in one step.
///
/// # Errors
///
/// Returns an error if loading or validation fails.
pub fn load_import_config(config_path: Option<&Path>, cli: &CliOverrides) -> Result<ImportConfig> {
    ImportConfig::from_layer(&load_config(config_path, cli)?)
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

/// Map an environment name onto the known setting it spells, so it replaces
/// the same key set by the file and default layers.
fn canonical_key(raw: &str) -> Option<&'static str> {
    let wanted = raw.to_lowercase();
    KNOWN_KEYS
        .iter()
        .copied()
        .find(|key| underscore_form(key) == wanted)
}

/// Environment names cannot carry `.` or `-`, so every underscore form is kept
/// and lookups also try the underscore spelling of a key.
fn env_key_variants(raw: &str) -> Vec<String> {
    let raw_lower = raw.to_lowercase();
    let mut variants = vec![
        raw_lower.clone(),
        raw_lower.replace('_', "."),
        raw_lower.replace('_', "-"),
    ];
    variants.dedup();
    variants
}

fn underscore_form(key: &str) -> String {
    key.replace(['.', '-'], "_")
}

fn get_value<'a>(layer: &'a ConfigLayer, key: &str) -> Option<&'a String> {
    layer
        .values
        .get(key)
        .or_else(|| layer.values.get(&underscore_form(key)))
}

fn string_or(layer: &ConfigLayer, key: &str, default: String) -> String {
    get_value(layer, key).cloned().unwrap_or(default)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

fn parse_flag(layer: &ConfigLayer, key: &str) -> Result<Option<bool>> {
    get_value(layer, key)
        .map(|value| {
            parse_bool(value)
                .ok_or_else(|| ImportError::Config(format!("{key}: expected a boolean, got '{value}'")))
        })
        .transpose()
}

fn parse_usize(layer: &ConfigLayer, key: &str) -> Result<Option<usize>> {
    get_value(layer, key)
        .map(|value| {
            value.trim().parse::<usize>().map_err(|_| {
                ImportError::Config(format!("{key}: expected a non-negative number, got '{value}'"))
            })
        })
        .transpose()
}

fn parse_i64(layer: &ConfigLayer, key: &str) -> Result<Option<i64>> {
    get_value(layer, key)
        .filter(|value| !value.trim().is_empty())
        .map(|value| {
            value
                .trim()
                .parse::<i64>()
                .map_err(|_| ImportError::Config(format!("{key}: expected a number, got '{value}'")))
        })
        .transpose()
}

fn parse_list(layer: &ConfigLayer, key: &str) -> Vec<String> {
    get_value(layer, key)
        .map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// `users.<source-id>: <target-id>` entries.
fn user_map(layer: &ConfigLayer) -> Result<UserMap> {
    layer
        .values
        .iter()
        .filter_map(|(key, value)| {
            key.strip_prefix("users.")
                .or_else(|| key.strip_prefix("users_"))
                .map(|source| (source, value))
        })
        .map(|(source, value)| {
            value
                .trim()
                .parse::<i64>()
                .map(|target| (source.to_string(), target))
                .map_err(|_| {
                    ImportError::Config(format!("users.{source}: expected a user id, got '{value}'"))
                })
        })
        .collect()
}

fn flatten_yaml(value: &serde_yaml::Value, prefix: &str, out: &mut HashMap<String, String>) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (key, value) in map {
                let Some(key_str) = yaml_scalar_to_string(key) else {
                    continue;
                };
                let next_prefix = if prefix.is_empty() {
                    key_str
                } else {
                    format!("{prefix}.{key_str}")
                };
                flatten_yaml(value, &next_prefix, out);
            }
        }
        serde_yaml::Value::Sequence(values) => {
            let joined = values
                .iter()
                .filter_map(yaml_scalar_to_string)
                .collect::<Vec<_>>()
                .join(",");
            out.insert(prefix.to_string(), joined);
        }
        _ => {
            if let Some(value) = yaml_scalar_to_string(value) {
                out.insert(prefix.to_string(), value);
            }
        }
    }
}

fn yaml_scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Bool(v) => Some(v.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Null
        | serde_yaml::Value::Sequence(_)
        | serde_yaml::Value::Mapping(_) => None,
        serde_yaml::Value::Tagged(tagged) => yaml_scalar_to_string(&tagged.value),
    }
}
