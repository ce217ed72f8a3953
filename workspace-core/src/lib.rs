pub mod error;
pub mod grid;
pub mod headless;
pub mod host;
pub mod panel;
pub mod style;
pub mod tabs;
pub mod workspace;

pub use error::WorkspaceCoreError;
pub use grid::{CellSpec, CloneCell, GridCell, GridSettings, GridSurfaceManager};
pub use host::{
    CellHandle, CellId, GridId, GridLayout, GridOptions, Host, HostError, HttpClient, HttpError,
    Navigation, NotificationLevel, Notifier, PanelCapabilities, PluginRuntime,
    SubstitutionRequest, SystemDirectory, SystemInfo, VersionPrompt, WidgetContent, WidgetOptions,
};
pub use panel::{LegacyAlias, Panel, PanelLifecycleManager, Resolution};
pub use tabs::{Tab, TabEvent, TabRegistry};
pub use crate::workspace::{
    CellRequest, ConfigurationRef, ConfigurationSummary, Endpoints, LoadOutcome, LoadReport,
    PluginChoice, ReconcilePhase, Workspace, WorkspaceSettings, WorkspaceSystem,
};
