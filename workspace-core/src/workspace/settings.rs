use super::io::Endpoints;
use crate::grid::GridSettings;
use crate::panel::{default_aliases, LegacyAlias};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellSize {
    pub w: u32,
    pub h: u32,
}

/// Host-level knobs for a workspace, read from a TOML file. Every field is
/// optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceSettings {
    /// Build panels of inactive tabs only when their tab is first shown,
    /// even if the configuration does not ask for it.
    pub deferred_activation: bool,
    pub default_column: u32,
    pub default_cell: CellSize,
    pub edit_margin: u32,
    pub view_margin: u32,
    pub cell_height: String,
    pub float: bool,
    pub root_selector: String,
    pub modal_selector: String,
    pub event_system_name: String,
    pub workspace_system_name: String,
    pub aliases: Vec<LegacyAlias>,
    pub endpoints: Endpoints,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            deferred_activation: false,
            default_column: 12,
            default_cell: CellSize { w: 6, h: 8 },
            edit_margin: 10,
            view_margin: 0,
            cell_height: "25px".to_string(),
            float: true,
            root_selector: ".workspace-root".to_string(),
            modal_selector: "#workspace-modal".to_string(),
            event_system_name: "EventSystem".to_string(),
            workspace_system_name: "WorkspaceSystem".to_string(),
            aliases: default_aliases(),
            endpoints: Endpoints::default(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid setting: {0}")]
    Invalid(String),
}

impl WorkspaceSettings {
    pub fn from_toml_str(text: &str) -> Result<Self, SettingsError> {
        let settings: WorkspaceSettings = toml::from_str(text)?;
        settings.validated()
    }

    pub fn load_from_file(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    fn validated(self) -> Result<Self, SettingsError> {
        if self.default_column == 0 {
            return Err(SettingsError::Invalid(
                "default_column must be at least 1".to_string(),
            ));
        }
        if self.default_cell.w == 0 || self.default_cell.h == 0 {
            return Err(SettingsError::Invalid(
                "default_cell needs a non-zero width and height".to_string(),
            ));
        }
        Ok(self)
    }

    pub fn grid_settings(&self) -> GridSettings {
        GridSettings {
            column: self.default_column,
            float: self.float,
            cell_height: self.cell_height.clone(),
            edit_margin: self.edit_margin,
            view_margin: self.view_margin,
        }
    }
}
