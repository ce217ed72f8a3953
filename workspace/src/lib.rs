use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::Path;

pub mod subscriptions;
pub use event_bus::{Endpoint, EventSystemConfig, Subscription};
pub use subscriptions::{remap_subscriptions, rename_guid_references, GuidMap, RemapOutcome};

/// `typeInit` value that requests every panel to be built on load.
pub const INIT_ALL: &str = "all";
/// `typeInit` value that defers panels of inactive tabs until first visit.
pub const INIT_ACTIVE_TAB: &str = "activeTab";

/// Server-side identifier of a stored configuration. Older backends hand out
/// numbers, newer ones strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigurationId {
    Number(u64),
    Text(String),
}

impl fmt::Display for ConfigurationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationId::Number(id) => write!(f, "{id}"),
            ConfigurationId::Text(id) => write!(f, "{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ConfigurationId>,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
    #[serde(default)]
    pub edit_mode: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_init: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub panel_border_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub panel_border_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub panel_border_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_panels_config: Option<TabPanelsConfig>,
    #[serde(default)]
    pub plugins: Vec<PluginEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabPanelsConfig {
    #[serde(default)]
    pub tabs_options: Vec<TabOptions>,
    #[serde(default = "default_visible_nav_bar")]
    pub visible_nav_bar: bool,
}

fn default_visible_nav_bar() -> bool {
    true
}

impl Default for TabPanelsConfig {
    fn default() -> Self {
        Self {
            tabs_options: Vec::new(),
            visible_nav_bar: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabOptions {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginType {
    Core,
    Panel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginMeta {
    #[serde(rename = "type")]
    pub kind: PluginType,
    pub name: String,
    #[serde(default)]
    pub version: String,
}

impl PluginMeta {
    pub fn panel(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            kind: PluginType::Panel,
            name: name.into(),
            version: version.into(),
        }
    }

    pub fn core(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            kind: PluginType::Core,
            name: name.into(),
            version: version.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelPosition {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<String>,
}

impl PanelPosition {
    pub fn rect(&self) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            w: self.w,
            h: self.h,
        }
    }

    pub fn from_rect(rect: Rect, tab_id: Option<String>) -> Self {
        Self {
            x: rect.x,
            y: rect.y,
            w: rect.w,
            h: rect.h,
            tab_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginEntry {
    pub guid: String,
    pub meta: PluginMeta,
    #[serde(default)]
    pub config: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<PanelPosition>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub undeletable: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub to_fix_panel: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl PluginEntry {
    pub fn is_panel(&self) -> bool {
        self.meta.kind == PluginType::Panel
    }

    pub fn tab_id(&self) -> Option<&str> {
        self.position.as_ref().and_then(|p| p.tab_id.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelBorder {
    pub width: Option<u32>,
    pub style: Option<String>,
    pub color: Option<String>,
}

impl PanelBorder {
    pub fn is_empty(&self) -> bool {
        self.width.is_none() && self.style.is_none() && self.color.is_none()
    }
}

#[derive(thiserror::Error, Debug)]
pub enum WorkspaceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Configuration {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            path: None,
            column: None,
            edit_mode: false,
            type_init: None,
            panel_border_width: None,
            panel_border_style: None,
            panel_border_color: None,
            tab_panels_config: None,
            plugins: Vec::new(),
        }
    }

    pub fn from_value(value: Value) -> Result<Self, WorkspaceError> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_value(&self) -> Result<Value, WorkspaceError> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), WorkspaceError> {
        let data = serde_json::to_vec_pretty(self)?;
        fs::write(path, data)?;
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, WorkspaceError> {
        let data = fs::read(path)?;
        let configuration = serde_json::from_slice(&data)?;
        Ok(configuration)
    }

    pub fn defers_inactive_tabs(&self) -> bool {
        self.type_init.as_deref() == Some(INIT_ACTIVE_TAB)
    }

    pub fn panel_border(&self) -> PanelBorder {
        PanelBorder {
            width: self.panel_border_width,
            style: self.panel_border_style.clone(),
            color: self.panel_border_color.clone(),
        }
    }

    pub fn set_panel_border(&mut self, border: &PanelBorder) {
        self.panel_border_width = border.width;
        self.panel_border_style = border.style.clone();
        self.panel_border_color = border.color.clone();
    }

    pub fn panels(&self) -> impl Iterator<Item = &PluginEntry> {
        self.plugins.iter().filter(|p| p.is_panel())
    }

    pub fn core_entry(&self, name: &str) -> Option<&PluginEntry> {
        self.plugins
            .iter()
            .find(|p| p.meta.kind == PluginType::Core && p.meta.name == name)
    }

    /// Subscriptions declared by the event system entry named `name`, if any.
    pub fn event_system_config(
        &self,
        name: &str,
    ) -> Result<Option<EventSystemConfig>, WorkspaceError> {
        match self.core_entry(name) {
            Some(entry) => Ok(Some(EventSystemConfig::from_value(&entry.config)?)),
            None => Ok(None),
        }
    }
}
