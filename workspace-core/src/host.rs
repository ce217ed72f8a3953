//! Interfaces of the collaborators the workspace drives but does not own:
//! the plugin runtime, the host system directory, the grid-layout library,
//! the event bus, HTTP persistence, the version prompt, notifications and
//! navigation state.

use event_bus::EventBus;
use futures_util::future::LocalBoxFuture;
use serde_json::Value;
use workspace::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellHandle {
    pub grid: GridId,
    pub cell: CellId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridOptions {
    pub float: bool,
    pub cell_height: String,
    pub margin: u32,
    pub static_grid: bool,
    pub column: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetContent {
    /// Empty cell offering the panel picker.
    Placeholder,
    /// Mount point a panel instance renders into.
    Panel { selector: String },
    /// Non-interactive stand-in for a pinned panel living in another tab.
    Clone { guid: String },
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetOptions {
    pub id: String,
    pub rect: Option<Rect>,
    pub auto_position: bool,
    pub locked: bool,
    pub no_move: bool,
    pub no_resize: bool,
}

pub trait GridLayout {
    fn init(&mut self, tab_id: &str, options: &GridOptions) -> GridId;
    fn destroy(&mut self, grid: GridId);
    fn add_widget(&mut self, grid: GridId, content: WidgetContent, options: &WidgetOptions)
        -> CellId;
    fn remove_widget(&mut self, grid: GridId, cell: CellId);
    fn update(&mut self, grid: GridId, cell: CellId, options: &WidgetOptions);
    fn set_content(&mut self, grid: GridId, cell: CellId, content: WidgetContent);
    /// Moves the rendered content of `from` into `to`; `from` is left with
    /// `replacement`.
    fn transfer_content(&mut self, from: CellHandle, to: CellHandle, replacement: WidgetContent);
    fn position(&self, grid: GridId, cell: CellId) -> Option<Rect>;
    fn compact(&mut self, grid: GridId);
    fn batch_update(&mut self, grid: GridId);
    fn commit(&mut self, grid: GridId);
    fn margin(&mut self, grid: GridId, px: u32);
    fn set_static(&mut self, grid: GridId, is_static: bool);
    fn column(&mut self, grid: GridId, columns: u32);
    fn inject_stylesheet(&mut self, id: &str, css: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemInfo {
    pub guid: String,
    pub name: String,
    pub version: String,
}

/// Read-only view of the host systems that are already running.
pub trait SystemDirectory {
    /// `version` of `None` matches any installed version.
    fn find(&self, name: &str, version: Option<&str>) -> Option<SystemInfo>;
    fn systems(&self) -> Vec<SystemInfo>;
    fn system_config(&self, guid: &str) -> Option<Value>;
    fn apply_system_config(&mut self, guid: &str, config: &Value) -> Result<(), HostError>;
}

/// Optional hooks a panel implementation exposes, resolved once when the
/// instance is created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PanelCapabilities {
    pub visibility: bool,
    pub config: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct InstallRequest<'a> {
    pub name: &'a str,
    pub version: &'a str,
    pub guid: &'a str,
    pub selector: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPanel {
    pub guid: String,
    pub capabilities: PanelCapabilities,
}

pub trait PluginRuntime {
    fn installed_versions(&self, name: &str) -> Vec<String>;
    fn install_panel(&mut self, request: InstallRequest<'_>) -> Result<InstalledPanel, HostError>;
    fn uninstall_by_guid(&mut self, guid: &str) -> Result<(), HostError>;
    fn set_visible(&mut self, guid: &str, visible: bool);
    fn export_config(&self, guid: &str) -> Option<Value>;
    fn apply_config(&mut self, guid: &str, config: &Value) -> Result<(), HostError>;
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("plugin {name} v{version} is not installed")]
    PluginUnavailable { name: String, version: String },
    #[error("no instance with guid '{0}'")]
    UnknownInstance(String),
    #[error("host rejected request: {0}")]
    Rejected(String),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum HttpError {
    #[error("request to '{path}' failed: {message}")]
    Request { path: String, message: String },
    #[error("request to '{path}' returned status {status}")]
    Status { path: String, status: u16 },
}

pub trait HttpClient {
    fn get<'a>(&'a self, path: &'a str) -> LocalBoxFuture<'a, Result<Value, HttpError>>;
    fn put<'a>(&'a self, path: &'a str, body: Vec<Value>)
        -> LocalBoxFuture<'a, Result<Value, HttpError>>;
    fn post<'a>(&'a self, path: &'a str, body: Vec<Value>)
        -> LocalBoxFuture<'a, Result<Value, HttpError>>;
    fn delete<'a>(&'a self, path: &'a str, data: Value)
        -> LocalBoxFuture<'a, Result<Value, HttpError>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubstitutionRequest {
    pub name: String,
    pub requested_version: String,
    pub available_version: String,
}

/// Asks the user whether a panel may run on a different installed version.
pub trait VersionPrompt {
    fn confirm_substitution<'a>(&'a self, request: &'a SubstitutionRequest)
        -> LocalBoxFuture<'a, bool>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

pub trait Notifier {
    fn notify(&mut self, level: NotificationLevel, title: &str, message: &str);
}

pub trait Navigation {
    fn query_tab(&self) -> Option<String>;
    fn set_query_tab(&mut self, tab_id: &str);
    fn redirect_not_found(&mut self);
}

/// Synchronous collaborators owned by a [`crate::Workspace`].
pub struct Host {
    pub runtime: Box<dyn PluginRuntime>,
    pub systems: Box<dyn SystemDirectory>,
    pub layout: Box<dyn GridLayout>,
    pub events: Box<dyn EventBus>,
    pub notifier: Box<dyn Notifier>,
    pub navigation: Box<dyn Navigation>,
}
