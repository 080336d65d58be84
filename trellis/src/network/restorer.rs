//! Loaders: single network files and the manifest that enumerates them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info};

use crate::error::ConfigError;
use crate::validation::{CompositeValidator, ValidatorOptions};

use super::network::AgentNetwork;
use super::spec::NetworkSpec;

/// Restores one agent network from a file under a registry directory.
pub struct NetworkRestorer {
    registry_dir: PathBuf,
    validator: CompositeValidator,
}

impl NetworkRestorer {
    pub fn new(registry_dir: impl Into<PathBuf>) -> Self {
        Self::with_options(registry_dir, ValidatorOptions::default())
    }

    pub fn with_options(registry_dir: impl Into<PathBuf>, options: ValidatorOptions) -> Self {
        Self {
            registry_dir: registry_dir.into(),
            validator: CompositeValidator::new(options),
        }
    }

    /// Reads, parses, and validates one network file. `file_reference` may be
    /// absolute or relative to the registry directory.
    pub fn restore(&self, file_reference: &str) -> Result<AgentNetwork, ConfigError> {
        let path = self.resolve_path(file_reference);
        let body = std::fs::read_to_string(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NetworkFileNotFound(path.display().to_string())
            } else {
                ConfigError::Io {
                    path: path.display().to_string(),
                    source,
                }
            }
        })?;

        let spec = NetworkSpec::parse(&body).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let name = network_name(file_reference);
        AgentNetwork::from_spec(name, spec, &self.validator).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    fn resolve_path(&self, file_reference: &str) -> PathBuf {
        let candidate = Path::new(file_reference);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.registry_dir.join(candidate)
        }
    }
}

/// The logical network name is the file stem of its reference.
fn network_name(file_reference: &str) -> String {
    Path::new(file_reference)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_reference.to_string())
}

/// Restores the whole manifest: a JSON map from network-file reference to a
/// truthy include flag.
pub struct ManifestRestorer {
    manifest_file: PathBuf,
    options: ValidatorOptions,
}

impl ManifestRestorer {
    /// `manifest_file` defaults from `AGENT_MANIFEST_FILE` when the caller
    /// passes `None`.
    pub fn new(manifest_file: Option<&str>) -> Result<Self, ConfigError> {
        let path = match manifest_file {
            Some(path) => path.to_string(),
            None => std::env::var(env_config::agent_env::AGENT_MANIFEST_FILE)
                .map_err(|_| ConfigError::ManifestNotFound("AGENT_MANIFEST_FILE unset".into()))?,
        };
        Ok(Self {
            manifest_file: PathBuf::from(path),
            options: ValidatorOptions::default(),
        })
    }

    pub fn with_options(mut self, options: ValidatorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn manifest_file(&self) -> &Path {
        &self.manifest_file
    }

    /// Restores every truthy manifest entry into a network map.
    ///
    /// One bad entry logs an error and is skipped; a missing or unparseable
    /// manifest file is fail-fast.
    pub fn restore(&self) -> Result<HashMap<String, Arc<AgentNetwork>>, ConfigError> {
        let body = std::fs::read_to_string(&self.manifest_file).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ConfigError::ManifestNotFound(manifest_missing_message(&self.manifest_file))
            } else {
                ConfigError::Io {
                    path: self.manifest_file.display().to_string(),
                    source,
                }
            }
        })?;

        let manifest: serde_json::Map<String, Value> =
            serde_json::from_str(&body).map_err(|e| ConfigError::Parse {
                path: self.manifest_file.display().to_string(),
                message: e.to_string(),
            })?;

        let manifest_dir = self
            .manifest_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let restorer = NetworkRestorer::with_options(manifest_dir, self.options.clone());

        let mut networks = HashMap::new();
        for (key, value) in &manifest {
            // Keys sometimes come with quotes baked in.
            let reference = key.replace('"', "");
            if !is_truthy(value) {
                continue;
            }
            match restorer.restore(&reference) {
                Ok(network) => {
                    let name = network.name().to_string();
                    info!(network = %name, file = %reference, "restored agent network");
                    networks.insert(name, Arc::new(network));
                }
                Err(e) => {
                    error!(file = %reference, error = %e, "failed to restore registry item");
                }
            }
        }
        Ok(networks)
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Null => false,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty() && s.to_lowercase() != "false",
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn manifest_missing_message(path: &Path) -> String {
    format!(
        "{}\n\
         Some common problems include:\n\
         * The file itself simply does not exist.\n\
         * The path is not absolute and the server was started from a place\n\
         \x20 where the path is not reachable.\n\
         * The path has a typo in it.\n\
         Double-check the value of the AGENT_MANIFEST_FILE env var and the\n\
         current working directory.",
        path.display()
    )
}
