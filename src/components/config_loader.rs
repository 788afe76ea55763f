//! Reading a component's declared slot names
//!
//! For a component directory the loader looks for `component.json`
//! (`{"slots": [...]}`) and falls back to the `component` section of the
//! package's `package.json`. A path naming a file is read directly as a
//! `component.json`-shaped document.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::ComponentConfig;
use super::error::ConfigError;

const COMPONENT_CONFIG_FILE: &str = "component.json";
const MANIFEST_FILE: &str = "package.json";

/// Loads the slot configuration for a component's defining path.
///
/// `None` means the component contributes no slots; failures are logged by
/// the implementation and never propagated.
#[async_trait::async_trait]
pub trait ComponentConfigLoader: Send + Sync {
    async fn load(&self, path: &Path) -> Option<ComponentConfig>;
}

#[derive(Debug, Deserialize)]
struct ManifestWithComponent {
    component: Option<ComponentConfig>,
}

/// Filesystem-backed loader; re-reads on every call.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsConfigLoader;

impl FsConfigLoader {
    async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        serde_json::from_str(&content)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    async fn load_dir(dir: &Path) -> Result<Option<ComponentConfig>, ConfigError> {
        let config_path: PathBuf = dir.join(COMPONENT_CONFIG_FILE);
        match Self::read_json::<ComponentConfig>(&config_path).await {
            Ok(config) => return Ok(Some(config)),
            Err(e) if e.is_not_found() => {
                debug!("No {} in {:?}, trying {}", COMPONENT_CONFIG_FILE, dir, MANIFEST_FILE);
            }
            Err(e) => return Err(e),
        }

        let manifest_path = dir.join(MANIFEST_FILE);
        match Self::read_json::<ManifestWithComponent>(&manifest_path).await {
            Ok(manifest) => Ok(manifest.component),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait::async_trait]
impl ComponentConfigLoader for FsConfigLoader {
    async fn load(&self, path: &Path) -> Option<ComponentConfig> {
        let result = match tokio::fs::metadata(path).await {
            Ok(metadata) if metadata.is_dir() => Self::load_dir(path).await,
            Ok(_) => Self::read_json::<ComponentConfig>(path).await.map(Some),
            Err(source) => Err(ConfigError::Read { path: path.to_path_buf(), source }),
        };

        match result {
            Ok(Some(mut config)) => {
                config.dedup();
                Some(config)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Component configuration unavailable: {}", e);
                None
            }
        }
    }
}
