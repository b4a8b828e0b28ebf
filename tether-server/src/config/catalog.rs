use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

pub const MIN_PARTICIPANTS: u32 = 2;
pub const MAX_PARTICIPANTS: u32 = 10;

/// One space as configured in the catalog file. Immutable after load.
#[derive(Debug, Clone, Deserialize)]
pub struct SpaceEntry {
    pub id: String,
    pub display_name: String,
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_max_participants")]
    pub max_participants: u32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Robot ids allowed to register as this space's robot endpoint.
    #[serde(default)]
    pub robot_ids: Vec<String>,
}

fn default_max_participants() -> u32 {
    MIN_PARTICIPANTS
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    version: String,
    #[serde(default = "default_image_url")]
    default_image_url: String,
    spaces: Vec<SpaceEntry>,
}

fn default_image_url() -> String {
    "/images/default-space.jpg".to_string()
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read space catalog at {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid YAML in space catalog: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("space id cannot be empty")]
    EmptySpaceId,
    #[error("space id '{0}' may only contain alphanumeric characters, hyphens, and underscores")]
    InvalidSpaceId(String),
    #[error("duplicate space id '{0}'")]
    DuplicateSpaceId(String),
    #[error(
        "space '{id}': max_participants must be between {MIN_PARTICIPANTS} and {MAX_PARTICIPANTS}, got {got}"
    )]
    InvalidCapacity { id: String, got: u32 },
}

/// The validated space catalog. Read-only after startup; every space lookup
/// the server does goes through [`SpaceCatalog::get`].
#[derive(Debug, Clone)]
pub struct SpaceCatalog {
    version: String,
    spaces: Vec<SpaceEntry>,
}

impl SpaceCatalog {
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let catalog = Self::from_yaml(&text)?;
        info!(spaces = catalog.spaces.len(), "loaded space catalog");
        Ok(catalog)
    }

    pub fn from_yaml(text: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_yaml::from_str(text)?;
        Self::validate(file)
    }

    fn validate(file: CatalogFile) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        let mut spaces = file.spaces;
        for space in &mut spaces {
            if space.id.is_empty() {
                return Err(CatalogError::EmptySpaceId);
            }
            if !is_valid_id(&space.id) {
                return Err(CatalogError::InvalidSpaceId(space.id.clone()));
            }
            if !seen.insert(space.id.clone()) {
                return Err(CatalogError::DuplicateSpaceId(space.id.clone()));
            }
            if !(MIN_PARTICIPANTS..=MAX_PARTICIPANTS).contains(&space.max_participants) {
                return Err(CatalogError::InvalidCapacity {
                    id: space.id.clone(),
                    got: space.max_participants,
                });
            }
            if space.image_url.is_none() {
                space.image_url = Some(file.default_image_url.clone());
            }
        }
        Ok(Self {
            version: file.version,
            spaces,
        })
    }

    pub fn get(&self, space_id: &str) -> Option<&SpaceEntry> {
        self.spaces.iter().find(|space| space.id == space_id)
    }

    pub fn len(&self) -> usize {
        self.spaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spaces.is_empty()
    }

    /// Projection served on `/spaces`. Authorized robot ids stay private.
    pub fn listing(&self) -> CatalogListing {
        CatalogListing {
            version: self.version.clone(),
            spaces: self
                .spaces
                .iter()
                .map(|space| SpaceListing {
                    id: space.id.clone(),
                    display_name: space.display_name.clone(),
                    description: space.description.clone(),
                    image_url: space.image_url.clone().unwrap_or_default(),
                    max_participants: space.max_participants,
                    enabled: space.enabled,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogListing {
    pub version: String,
    pub spaces: Vec<SpaceListing>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpaceListing {
    pub id: String,
    pub display_name: String,
    pub description: String,
    pub image_url: String,
    pub max_participants: u32,
    pub enabled: bool,
}

pub(crate) fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
