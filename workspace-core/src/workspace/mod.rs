pub mod deferred;
pub mod io;
pub mod operations;
pub mod plan;
pub mod reconciler;
pub mod settings;
pub mod summary;
pub mod system;

pub use deferred::{DeferredActivation, PendingPanel};
pub use io::{ConfigurationRef, Endpoints};
pub use operations::{CellRequest, PluginChoice};
pub use plan::{LoadOutcome, LoadPlan, LoadReport, PlannedEntry, ReconcilePhase};
pub use reconciler::{
    BrokenPanel, Workspace, ACTION_CHANGE_MODE, ACTION_COMPACT_ALL_PANELS, ACTION_SET_ACTIVE_TAB,
    ACTION_SET_COLUMN, EVENT_CELL_CLICKED, EVENT_EDIT_MODE_CHANGED, EVENT_TAB_CLICKED,
    EVENT_TAB_SELECTED_PROGRAMMLY, EVENT_TITLE_LOADED, WORKSPACE_ACTIONS, WORKSPACE_EVENTS,
};
pub use settings::{CellSize, SettingsError, WorkspaceSettings};
pub use summary::{ConfigurationSummary, PanelSummary};
pub use system::WorkspaceSystem;
