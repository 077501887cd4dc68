use std::path::{Path, PathBuf};

use cmtypes::CompilationUnit;
use serde::{Deserialize, Serialize};

use crate::{
    magic::{DEFAULT_MANGLE_PREFIX, DEFAULT_ROOT_NAMESPACE, DEFAULT_TYPE_NODE_ID, ENV_CONFIG_PATH},
    utils::error::{CmtError, CmtResult},
};

/// Tunables of the type-minting machinery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CmtConfig {
    /// Namespace every minted class name lives under.
    pub root_namespace: String,

    /// Atom prefix used when a class name must be mangled.
    pub mangle_prefix: String,

    /// Log the full diagnostic listing of every descriptor at debug level
    /// when it is built.
    pub dump_on_build: bool,

    /// Node id of the type registry's UUID generator.
    pub type_node_id: [u8; 6],
}

impl Default for CmtConfig {
    fn default() -> Self {
        Self {
            root_namespace: DEFAULT_ROOT_NAMESPACE.to_string(),
            mangle_prefix: DEFAULT_MANGLE_PREFIX.to_string(),
            dump_on_build: false,
            type_node_id: DEFAULT_TYPE_NODE_ID,
        }
    }
}

impl CmtConfig {
    /// Get the default path to the configuration file.
    pub fn default_path() -> PathBuf {
        // Check if the environment variable is set
        if let Ok(config_path) = std::env::var(ENV_CONFIG_PATH) {
            return config_path.into();
        }

        // Fallback to default paths based on OS
        let mut path = PathBuf::new();

        #[cfg(target_os = "windows")]
        {
            if let Ok(appdata) = std::env::var("APPDATA") {
                path.push(appdata);
            }

            path.push("cmt");
            path.push("config.toml");
        }
        #[cfg(not(target_os = "windows"))]
        {
            if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
                path.push(xdg_config_home);
            } else if let Ok(home) = std::env::var("HOME") {
                path.push(home);
                path.push(".config");
            } else {
                // Fallback to current directory if HOME is not set
            }

            path.push("cmt");
            path.push("config.toml");
        }

        path
    }

    /// Parse a configuration from TOML text. Missing keys take their default
    /// value.
    pub fn from_toml_str(toml_str: &str) -> CmtResult<Self> {
        toml::from_str(toml_str).map_err(|e| CmtError::ConfigParseError {
            source: e,
            file: toml_str.to_string(),
        })
    }

    /// Load a configuration from a TOML file.
    pub fn load_from_toml(path: &Path) -> CmtResult<Self> {
        let toml_str = std::fs::read_to_string(path)?;

        toml::from_str(&toml_str).map_err(|e| CmtError::ConfigParseError {
            source: e,
            file: path.display().to_string(),
        })
    }

    /// Load the configuration from [`Self::default_path`], falling back to the
    /// defaults when the file does not exist.
    pub fn load_or_default() -> CmtResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from_toml(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save the configuration to a TOML file.
    pub fn save_to_toml(&self, path: &Path) -> CmtResult<()> {
        let toml_str = toml::to_string(self)?;

        // Attempt to create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, toml_str)?;
        Ok(())
    }

    /// A fresh compilation unit configured from this configuration.
    pub fn compilation_unit(&self) -> CompilationUnit {
        CompilationUnit::new(self.type_node_id, self.mangle_prefix.clone())
    }
}
