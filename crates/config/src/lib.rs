//! Layered configuration.
//!
//! Values are merged in order, later layers winning:
//!
//! 1. built-in defaults,
//! 2. a config file (`--config`, or `config.{toml,yaml,yml,json}` in the
//!    platform config directory),
//! 3. environment variables prefixed with `MEDIANORM_`, with nested keys
//!    separated by `__` (e.g. `MEDIANORM_SOURCE__LENGTH=12`).

pub mod error;

use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use medianorm_naming::{FileNameSchema, MAX_SOURCE_ID_LENGTH, Registry};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ErrorKind, Result};

pub const ENV_PREFIX: &str = "MEDIANORM_";
const CONFIG_FILE_STEM: &str = "config";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "medianorm")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub source: SourceConfig,
    pub scan: ScanConfig,
    pub device: DeviceConfig,
    /// Extra schemas, tried after the built-in ones in the listed order.
    pub schemas: Vec<SchemaConfig>,
}

/// Root directories of the three pipeline stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub upload: PathBuf,
    pub processed: PathBuf,
    pub failed: PathBuf,
}
impl Default for StorageConfig {
    fn default() -> Self {
        let base = project_dirs()
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("medianorm"));
        Self {
            upload: base.join("upload"),
            processed: base.join("processed"),
            failed: base.join("failed"),
        }
    }
}

impl StorageConfig {
    /// Every stage directory must be absolute.
    pub fn validate(&self) -> Result<()> {
        for (field, path) in [
            ("storage.upload", &self.upload),
            ("storage.processed", &self.processed),
            ("storage.failed", &self.failed),
        ] {
            if !path.is_absolute() {
                exn::bail!(ErrorKind::Invalid(format!("{field}: {} is not an absolute path", path.display())));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Raw identifier of the local machine; empty means unknown.
    pub identifier: String,
    /// Hex characters kept in source ids.
    pub length: usize,
}
impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            identifier: String::new(),
            length: medianorm_naming::DEFAULT_SOURCE_ID_LENGTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Extension allow-list; an empty list keeps every file.
    pub extensions: Vec<String>,
}
impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: vec![".jpg".to_string(), ".mp4".to_string()],
        }
    }
}
impl ScanConfig {
    /// The allow-list in the shape the scanner expects.
    pub fn allow_list(&self) -> Option<Vec<&str>> {
        match self.extensions.is_empty() {
            true => None,
            false => Some(self.extensions.iter().map(String::as_str).collect()),
        }
    }
}

/// Where MTP devices get mounted, and what their storage root is called.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub gvfs: PathBuf,
    pub internal_storage: String,
}
impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            gvfs: PathBuf::from("/run/user/1000/gvfs"),
            internal_storage: "Interner Speicher".to_string(),
        }
    }
}

/// A schema declared in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaConfig {
    pub name: String,
    pub pattern: String,
    pub timestamp_pattern: String,
    pub timestamp_format: String,
    #[serde(default)]
    pub index_pattern: Option<String>,
}
impl SchemaConfig {
    pub fn compile(&self) -> Result<FileNameSchema> {
        FileNameSchema::new(
            self.name.as_str(),
            &self.pattern,
            &self.timestamp_pattern,
            &self.timestamp_format,
            self.index_pattern.as_deref(),
        )
        .or_raise(|| ErrorKind::Schema(self.name.clone()))
    }
}

impl Config {
    /// The default config file location, if the platform has one.
    pub fn default_dir() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Builds the provider stack without extracting it.
    ///
    /// With an explicit `file`, its format follows the extension (TOML when
    /// unknown) and it must exist. Without one, every
    /// `config.{toml,yaml,yml,json}` found in `default_dir` is merged.
    pub fn figment(file: Option<&Path>, default_dir: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        match file {
            Some(file) => {
                figment = match file.extension().and_then(|ext| ext.to_str()) {
                    Some("yaml" | "yml") => figment.merge(Yaml::file_exact(file)),
                    Some("json") => figment.merge(Json::file_exact(file)),
                    _ => figment.merge(Toml::file_exact(file)),
                };
            },
            None => {
                if let Some(dir) = default_dir {
                    for ext in ["toml", "yaml", "yml", "json"] {
                        let path = dir.join(format!("{CONFIG_FILE_STEM}.{ext}"));
                        if !path.is_file() {
                            continue;
                        }
                        figment = match ext {
                            "toml" => figment.merge(Toml::file_exact(path)),
                            "json" => figment.merge(Json::file_exact(path)),
                            _ => figment.merge(Yaml::file_exact(path)),
                        };
                    }
                }
            },
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Loads and validates the configuration.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        Self::from_figment(Self::figment(file, Self::default_dir().as_deref()))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        tracing::debug!(?config, "Loaded configuration");
        Ok(config)
    }

    /// Rejects values that deserialize fine but can't work.
    ///
    /// Stage directories are only checked by [`StorageConfig::validate`], so
    /// commands that never touch storage work without a data directory.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_SOURCE_ID_LENGTH).contains(&self.source.length) {
            exn::bail!(ErrorKind::Invalid(format!(
                "source.length: {} is outside 1..={MAX_SOURCE_ID_LENGTH}",
                self.source.length
            )));
        }
        if self.device.internal_storage.is_empty() {
            exn::bail!(ErrorKind::Invalid("device.internal_storage: must not be empty".to_string()));
        }
        for schema in &self.schemas {
            schema.compile()?;
        }
        Ok(())
    }

    /// The engine registry: built-in schemas followed by configured ones.
    pub fn registry(&self) -> Result<Registry> {
        let mut registry = Registry::default()
            .with_source_id_length(self.source.length)
            .or_raise(|| ErrorKind::Invalid("source.length".to_string()))?;
        for schema in &self.schemas {
            if registry.get(&schema.name).is_some() {
                exn::bail!(ErrorKind::Schema(format!("{}: name already registered", schema.name)));
            }
            registry = registry.with_schema(schema.compile()?);
        }
        Ok(registry)
    }
}
