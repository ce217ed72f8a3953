pub mod aliases;
pub mod manager;
pub mod types;

pub use aliases::{apply_aliases, default_aliases, LegacyAlias};
pub use manager::{availability, compare_versions, next_guid, preferred_version, PanelLifecycleManager};
pub use types::{Availability, Panel, PanelRequest, Resolution};

/// Mount point selector for the cell hosting `guid`.
pub fn panel_selector(guid: &str) -> String {
    format!("#panel-{guid}")
}
