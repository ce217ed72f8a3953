#![allow(dead_code)]

use serde_json::{json, Value};
use workspace::{
    Configuration, EventSystemConfig, PanelPosition, PluginEntry, PluginMeta, Subscription,
    TabOptions, TabPanelsConfig,
};
use workspace_core::headless::{HeadlessHost, EVENT_SYSTEM_GUID, WORKSPACE_SYSTEM_GUID};
use workspace_core::{Workspace, WorkspaceSettings};

pub fn tab(id: &str, name: &str, active: bool) -> TabOptions {
    TabOptions {
        id: id.to_string(),
        name: name.to_string(),
        is_active: active,
    }
}

pub fn panel(guid: &str, name: &str, version: &str, tab: &str, x: u32, y: u32) -> PluginEntry {
    PluginEntry {
        guid: guid.to_string(),
        meta: PluginMeta::panel(name, version),
        config: json!({ "title": guid }),
        position: Some(PanelPosition {
            x,
            y,
            w: 6,
            h: 8,
            tab_id: Some(tab.to_string()),
        }),
        undeletable: false,
        to_fix_panel: false,
    }
}

pub fn pinned(entry: PluginEntry) -> PluginEntry {
    PluginEntry {
        to_fix_panel: true,
        ..entry
    }
}

pub fn core(guid: &str, name: &str, config: Value) -> PluginEntry {
    PluginEntry {
        guid: guid.to_string(),
        meta: PluginMeta::core(name, "0.4.0"),
        config,
        position: None,
        undeletable: false,
        to_fix_panel: false,
    }
}

pub fn event_system(subscriptions: Vec<Subscription>) -> PluginEntry {
    let config = EventSystemConfig {
        events: Vec::new(),
        actions: Vec::new(),
        subscriptions,
    };
    core(EVENT_SYSTEM_GUID, "EventSystem", config.to_value())
}

pub fn workspace_system() -> PluginEntry {
    core(WORKSPACE_SYSTEM_GUID, "WorkspaceSystem", Value::Null)
}

pub fn configuration(tabs: Vec<TabOptions>, plugins: Vec<PluginEntry>) -> Configuration {
    let mut configuration = Configuration::new("Operations");
    configuration.column = Some(12);
    configuration.tab_panels_config = Some(TabPanelsConfig {
        tabs_options: tabs,
        visible_nav_bar: true,
    });
    configuration.plugins = plugins;
    configuration
}

/// Headless host with Chart 1.0.0, Table 1.0.0 and Foo 3.0.0 installable.
pub fn host() -> HeadlessHost {
    let host = HeadlessHost::new();
    host.runtime.add_plugin("Chart", "1.0.0");
    host.runtime.add_plugin("Table", "1.0.0");
    host.runtime.add_plugin("Foo", "3.0.0");
    host.runtime.add_plugin("DataTablePanel", "0.3.0");
    host
}

pub fn setup() -> (HeadlessHost, Workspace) {
    let host = host();
    let workspace = host.workspace(WorkspaceSettings::default());
    (host, workspace)
}
