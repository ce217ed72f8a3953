mod common;

use common::{configuration, core, event_system, panel, pinned, setup, tab, workspace_system};
use serde_json::json;
use workspace::{Endpoint, Subscription};
use workspace_core::headless::{EVENT_SYSTEM_GUID, WORKSPACE_SYSTEM_GUID};
use workspace_core::{
    CellRequest, ConfigurationSummary, NotificationLevel, PluginChoice, ReconcilePhase,
    WidgetContent, WorkspaceCoreError,
};

fn accept_all(_: &workspace_core::SubstitutionRequest) -> bool {
    true
}

#[test]
fn pinned_panel_lands_in_the_active_tab() {
    let (host, mut workspace) = setup();
    let config = configuration(
        vec![tab("a", "A", true), tab("b", "B", false)],
        vec![pinned(panel("Chart_1", "Chart", "1.0.0", "b", 0, 0))],
    );
    let report = workspace.load_with(config, accept_all);
    assert_eq!(report.active_tab.as_deref(), Some("a"));
    assert_eq!(report.panels, 1);

    let real = workspace.grid().cell("Chart_1").expect("real cell");
    assert_eq!(real.tab_id, "a");
    let clones = workspace.grid().clones_of("Chart_1");
    assert_eq!(clones.len(), 1);
    assert_eq!(clones[0].tab_id, "b");
    assert!(host.grid.widgets("a").iter().any(|w| w.content
        == WidgetContent::Panel {
            selector: "#panel-Chart_1".to_string()
        }));

    assert!(workspace.select_tab("b"));
    assert_eq!(
        workspace.grid().cell("Chart_1").map(|c| c.tab_id.as_str()),
        Some("b")
    );
    assert_eq!(workspace.phase(), ReconcilePhase::Idle);
}

#[test]
fn query_tab_wins_over_saved_selection() {
    let (host, mut workspace) = setup();
    host.navigation.open_with_tab("b");
    let config = configuration(
        vec![tab("a", "A", true), tab("b", "B", false)],
        vec![panel("Table_1", "Table", "1.0.0", "a", 0, 0)],
    );
    let report = workspace.load_with(config, accept_all);
    assert_eq!(report.active_tab.as_deref(), Some("b"));
    assert_eq!(workspace.tabs().active_tab_id(), Some("b"));
    let table = host.runtime.instance("Table_1").expect("instance");
    assert!(!table.visible);
}

#[test]
fn save_then_reload_is_structurally_identical() {
    let (_host, mut workspace) = setup();
    let subscription = Subscription::new(
        Endpoint::new("Chart_1", "Clicked"),
        Endpoint::new("Table_1", "Refresh"),
    );
    let mut config = configuration(
        vec![tab("a", "A", true), tab("b", "B", false)],
        vec![
            event_system(vec![subscription]),
            workspace_system(),
            pinned(panel("Chart_1", "Chart", "1.0.0", "b", 0, 0)),
            panel("Table_1", "Table", "1.0.0", "b", 6, 0),
        ],
    );
    config.edit_mode = true;
    config.panel_border_width = Some(2);

    let report = workspace.load_with(config.clone(), accept_all);
    assert_eq!(report.subscriptions_wired, 1);
    let saved = workspace.save_configuration();
    assert_eq!(ConfigurationSummary::of(&saved), ConfigurationSummary::of(&config));
    assert_eq!(saved.panel_border_width, Some(2));

    let (_host, mut reloaded) = setup();
    reloaded.load_with(saved.clone(), accept_all);
    let resaved = reloaded.save_configuration();
    assert_eq!(ConfigurationSummary::of(&resaved), ConfigurationSummary::of(&saved));
    let events = resaved
        .event_system_config("EventSystem")
        .expect("parse")
        .expect("event system entry");
    assert_eq!(events.subscriptions.len(), 1);
}

#[test]
fn saved_config_keeps_runtime_changes() {
    let (host, mut workspace) = setup();
    let config = configuration(
        vec![tab("a", "A", true)],
        vec![panel("Table_1", "Table", "1.0.0", "a", 0, 0)],
    );
    workspace.load_with(config, accept_all);
    host.runtime
        .set_instance_config("Table_1", json!({ "title": "edited" }));
    host.grid.move_widget(
        "a",
        "Table_1",
        workspace::Rect {
            x: 3,
            y: 5,
            w: 4,
            h: 4,
        },
    );
    let saved = workspace.save_configuration();
    let entry = saved.panels().next().expect("panel entry");
    assert_eq!(entry.config, json!({ "title": "edited" }));
    let position = entry.position.clone().expect("position");
    assert_eq!((position.x, position.y, position.w, position.h), (3, 5, 4, 4));
    assert_eq!(position.tab_id.as_deref(), Some("a"));
}

#[test]
fn declined_substitution_keeps_the_entry() {
    let (host, mut workspace) = setup();
    let config = configuration(
        vec![tab("a", "A", true)],
        vec![panel("Foo_1", "Foo", "2", "a", 0, 0)],
    );
    let mut asked = Vec::new();
    let report = workspace.load_with(config, |request| {
        asked.push(request.clone());
        false
    });
    assert_eq!(asked.len(), 1);
    assert_eq!(asked[0].available_version, "3.0.0");
    assert_eq!(report.missing, vec!["Foo v2".to_string()]);
    assert!(host.runtime.instances().is_empty());

    let widgets = host.grid.widgets("a");
    assert!(matches!(
        &widgets[0].content,
        WidgetContent::Error { message } if message.contains("Foo v2")
    ));
    assert_eq!(host.notifier.count(NotificationLevel::Error), 1);

    let saved = workspace.save_configuration();
    let entry = saved.panels().next().expect("broken entry kept");
    assert_eq!(entry.guid, "Foo_1");
    assert_eq!(entry.meta.version, "2");
}

#[test]
fn accepted_substitution_is_asked_once() {
    let (host, mut workspace) = setup();
    let config = configuration(
        vec![tab("a", "A", true)],
        vec![
            panel("Foo_1", "Foo", "2", "a", 0, 0),
            panel("Foo_2", "Foo", "2", "a", 6, 0),
        ],
    );
    let mut prompts = 0;
    let report = workspace.load_with(config.clone(), |_| {
        prompts += 1;
        true
    });
    assert_eq!(prompts, 1);
    assert_eq!(report.panels, 2);
    assert_eq!(report.substituted.len(), 1);
    assert_eq!(host.notifier.count(NotificationLevel::Warning), 1);
    let instance = host.runtime.instance("Foo_1").expect("instance");
    assert_eq!(instance.version, "3.0.0");
    assert_eq!(
        workspace
            .panels()
            .get("Foo_1")
            .and_then(|p| p.requested_version.clone()),
        Some("2".to_string())
    );

    workspace.load_with(config, |_| panic!("answer is cached"));
    assert_eq!(workspace.panels().len(), 2);
}

#[test]
fn missing_plugin_becomes_error_placeholder() {
    let (host, mut workspace) = setup();
    let config = configuration(
        vec![tab("a", "A", true)],
        vec![
            panel("Gauge_1", "Gauge", "1.0.0", "a", 0, 0),
            panel("Chart_1", "Chart", "1.0.0", "a", 6, 0),
        ],
    );
    let report = workspace.load_with(config, accept_all);
    assert_eq!(report.panels, 1);
    assert_eq!(report.missing, vec!["Gauge v1.0.0".to_string()]);
    assert_eq!(workspace.broken_panels().len(), 1);
    assert_eq!(
        workspace.get_guid_list_of_widgets(),
        vec!["Gauge_1".to_string(), "Chart_1".to_string()]
    );
    assert_eq!(host.notifier.entries()[0].message, "Plugin Gauge v1.0.0 not found");
}

#[test]
fn core_guids_are_mapped_and_unknown_subscriptions_dropped() {
    let (host, mut workspace) = setup();
    host.systems.add_system("AlertSystem", "0.4.0", "AlertSystem_1");
    let config = configuration(
        vec![tab("a", "A", true)],
        vec![
            event_system(vec![
                Subscription::new(
                    Endpoint::new("Chart_1", "Clicked"),
                    Endpoint::new("WorkspaceSystem_9", "compactAllPanels"),
                ),
                Subscription::new(
                    Endpoint::new("Ghost_1", "Clicked"),
                    Endpoint::new("Chart_1", "Refresh"),
                ),
            ]),
            core("WorkspaceSystem_9", "WorkspaceSystem", serde_json::Value::Null),
            core("AlertSystem_4", "AlertSystem", json!({ "threshold": 3 })),
            panel("Chart_1", "Chart", "1.0.0", "a", 0, 0),
        ],
    );
    let report = workspace.load_with(config, accept_all);
    assert_eq!(report.subscriptions_wired, 1);
    assert_eq!(report.subscriptions_dropped, 1);
    assert_eq!(workspace.guid_map().resolve("WorkspaceSystem_9"), Some(WORKSPACE_SYSTEM_GUID));
    assert_eq!(workspace.guid_map().resolve("AlertSystem_4"), Some("AlertSystem_1"));
    assert_eq!(host.systems.config("AlertSystem_1"), Some(json!({ "threshold": 3 })));
    assert_eq!(host.notifier.count(NotificationLevel::Warning), 1);

    let wired = host.events.subscriptions();
    assert_eq!(wired[0].action.guid, WORKSPACE_SYSTEM_GUID);
    assert_eq!(workspace.guid_map().resolve(EVENT_SYSTEM_GUID), Some(EVENT_SYSTEM_GUID));
}

#[test]
fn legacy_panels_are_renamed() {
    let (host, mut workspace) = setup();
    let config = configuration(
        vec![tab("a", "A", true)],
        vec![panel("TablePanel_1", "TablePanel", "0.1.0", "a", 0, 0)],
    );
    let report = workspace.load_with(config, accept_all);
    assert_eq!(report.aliased, 1);
    let instance = host.runtime.instance("DataTablePanel_1").expect("aliased panel");
    assert_eq!(instance.version, "0.3.0");
    assert_eq!(workspace.guid_map().resolve("DataTablePanel_1"), Some("DataTablePanel_1"));
}

#[test]
fn reset_is_idempotent() {
    let (host, mut workspace) = setup();
    let config = configuration(
        vec![tab("a", "A", true), tab("b", "B", false)],
        vec![
            panel("Chart_1", "Chart", "1.0.0", "a", 0, 0),
            panel("Table_1", "Table", "1.0.0", "b", 0, 0),
        ],
    );
    workspace.load_with(config, accept_all);
    workspace.reset_workspace();
    workspace.reset_workspace();
    assert!(workspace.tabs().tabs().is_empty());
    assert!(workspace.panels().is_empty());
    assert!(workspace.get_guid_list_of_widgets().is_empty());
    assert!(host.runtime.instances().is_empty());
    assert_eq!(host.grid.grid_count(), 0);
}

#[test]
fn cells_are_created_and_deleted() {
    let (host, mut workspace) = setup();
    let placeholder = workspace.create_cell(CellRequest::default()).expect("cell");
    assert_eq!(placeholder, "cell_1");
    let chart = workspace
        .create_cell(CellRequest {
            plugin: Some(PluginChoice::new("Chart", None)),
            ..CellRequest::default()
        })
        .expect("chart");
    assert_eq!(chart, "Chart_1");
    let widgets = host.grid.widgets(workspace.tabs().active_tab_id().expect("tab"));
    assert_eq!(widgets.len(), 2);
    assert!(widgets[1].rect.y >= widgets[0].rect.y + widgets[0].rect.h);

    let err = workspace
        .create_cell(CellRequest {
            plugin: Some(PluginChoice::new("Chart", Some("9.9.9"))),
            ..CellRequest::default()
        })
        .expect_err("version not installed");
    assert!(matches!(err, WorkspaceCoreError::PluginNotFound { .. }));
    assert_eq!(workspace.get_guid_list_of_widgets().len(), 2);

    let mounted = workspace
        .mount_panel(&placeholder, &PluginChoice::new("Table", Some("1.0.0")))
        .expect("mount");
    assert_eq!(mounted, "Table_1");
    assert!(workspace.grid().cell(&placeholder).is_none());

    workspace.delete_cell(&chart).expect("delete");
    assert!(host.runtime.instance(&chart).is_none());
    assert!(matches!(
        workspace.delete_cell(&chart),
        Err(WorkspaceCoreError::UnknownCell(_))
    ));
}

#[test]
fn undeletable_panel_is_refused() {
    let (host, mut workspace) = setup();
    let mut entry = panel("Chart_1", "Chart", "1.0.0", "a", 0, 0);
    entry.undeletable = true;
    workspace.load_with(configuration(vec![tab("a", "A", true)], vec![entry]), accept_all);
    assert!(matches!(
        workspace.delete_cell("Chart_1"),
        Err(WorkspaceCoreError::Undeletable(_))
    ));
    assert!(host.runtime.instance("Chart_1").is_some());
}

#[test]
fn deleting_a_tab_tears_down_its_panels() {
    let (host, mut workspace) = setup();
    let config = configuration(
        vec![tab("a", "A", true), tab("b", "B", false)],
        vec![
            panel("Chart_1", "Chart", "1.0.0", "a", 0, 0),
            panel("Table_1", "Table", "1.0.0", "b", 0, 0),
        ],
    );
    workspace.load_with(config, accept_all);
    assert!(workspace.delete_tab("a"));
    assert_eq!(workspace.tabs().active_tab_id(), Some("b"));
    assert!(host.runtime.instance("Chart_1").is_none());
    assert!(host.runtime.instance("Table_1").expect("kept").visible);
}

#[test]
fn deleting_a_visited_tab_keeps_the_pinned_panel() {
    let (host, mut workspace) = setup();
    let config = configuration(
        vec![tab("a", "A", true), tab("b", "B", false), tab("c", "C", false)],
        vec![pinned(panel("Chart_1", "Chart", "1.0.0", "a", 0, 0))],
    );
    workspace.load_with(config, accept_all);
    assert!(workspace.select_tab("b"));
    assert_eq!(
        workspace.grid().cell("Chart_1").map(|c| c.tab_id.as_str()),
        Some("b")
    );

    assert!(workspace.delete_tab("b"));
    assert!(host.runtime.instance("Chart_1").is_some());
    let real = workspace.grid().cell("Chart_1").expect("real cell");
    assert_eq!(real.owner_tab, "a");
    assert_eq!(real.tab_id, workspace.tabs().active_tab_id().expect("active"));
    assert_eq!(workspace.grid().clones_of("Chart_1").len(), 1);

    let saved = workspace.save_configuration();
    let chart = saved
        .panels()
        .find(|entry| entry.guid == "Chart_1")
        .expect("pinned entry");
    assert_eq!(chart.tab_id(), Some("a"));
}

#[test]
fn deleting_the_owning_tab_removes_the_pinned_panel() {
    let (host, mut workspace) = setup();
    let config = configuration(
        vec![tab("a", "A", true), tab("b", "B", false)],
        vec![pinned(panel("Chart_1", "Chart", "1.0.0", "a", 0, 0))],
    );
    workspace.load_with(config, accept_all);
    assert!(workspace.select_tab("b"));
    assert!(workspace.delete_tab("a"));
    assert!(host.runtime.instance("Chart_1").is_none());
    assert!(workspace.grid().cell("Chart_1").is_none());
    assert!(host.grid.widgets("b").is_empty());
}

#[test]
fn toggling_pin_mirrors_the_cell() {
    let (host, mut workspace) = setup();
    let config = configuration(
        vec![tab("a", "A", true), tab("b", "B", false)],
        vec![panel("Chart_1", "Chart", "1.0.0", "a", 0, 0)],
    );
    workspace.load_with(config, accept_all);
    assert!(workspace.toggle_fix_panel("Chart_1").expect("pin"));
    assert_eq!(host.grid.widgets("b").len(), 1);
    workspace.select_tab("b");
    assert!(host.runtime.instance("Chart_1").expect("instance").visible);
    assert!(!workspace.toggle_fix_panel("Chart_1").expect("unpin"));
    assert_eq!(workspace.grid().clones_of("Chart_1").len(), 0);
}

#[test]
fn copy_tab_duplicates_unpinned_panels() {
    let (host, mut workspace) = setup();
    let config = configuration(
        vec![tab("a", "Sales", true)],
        vec![
            panel("Chart_1", "Chart", "1.0.0", "a", 0, 0),
            pinned(panel("Table_1", "Table", "1.0.0", "a", 6, 0)),
        ],
    );
    workspace.load_with(config, accept_all);
    host.runtime
        .set_instance_config("Chart_1", json!({ "title": "live" }));

    let copy = workspace.copy_tab("a").expect("copy");
    assert_eq!(
        workspace.tabs().get(&copy).map(|t| t.name.as_str()),
        Some("Sales (copy)")
    );
    let copied = host.runtime.instance("Chart_2").expect("copied chart");
    assert_eq!(copied.config, json!({ "title": "live" }));
    assert_eq!(workspace.grid().cell("Chart_2").map(|c| c.tab_id.clone()), Some(copy));
    assert!(host.runtime.instance("Table_2").is_none());
    assert_eq!(workspace.grid().clones_of("Table_1").len(), 1);
}

#[test]
fn custom_actions_drive_the_workspace() {
    let (host, mut workspace) = setup();
    let b = workspace.create_tab(Some("B"));
    workspace.change_mode(Some(true));
    assert!(workspace.grid().edit_mode());

    let invocation = |action: &str, payload: serde_json::Value| event_bus::ActionInvocation {
        guid: WORKSPACE_SYSTEM_GUID.to_string(),
        action: action.to_string(),
        source_guid: "Chart_1".to_string(),
        event: "Clicked".to_string(),
        payload,
        args: None,
    };
    assert!(workspace
        .handle_action(&invocation("setColumn", json!({ "column": 6 })))
        .expect("setColumn"));
    assert_eq!(workspace.grid().column(), 6);
    assert!(workspace
        .handle_action(&invocation("setActiveTab", json!(b.clone())))
        .expect("setActiveTab"));
    assert_eq!(workspace.tabs().active_tab_id(), Some(b.as_str()));
    assert!(workspace
        .handle_action(&invocation("changeMode", serde_json::Value::Null))
        .expect("changeMode"));
    assert!(!workspace.grid().edit_mode());
    assert!(!workspace
        .handle_action(&invocation("explode", serde_json::Value::Null))
        .expect("unknown action"));
    assert!(host.events.has_action(WORKSPACE_SYSTEM_GUID, "compactAllPanels"));
}

#[test]
fn modal_holds_one_panel() {
    let (host, mut workspace) = setup();
    let guid = workspace
        .open_panel_in_modal(&PluginChoice::new("Chart", None))
        .expect("modal");
    assert_eq!(
        host.runtime.instance(&guid).map(|i| i.selector),
        Some("#workspace-modal".to_string())
    );
    assert!(matches!(
        workspace.open_panel_in_modal(&PluginChoice::new("Table", None)),
        Err(WorkspaceCoreError::ModalBusy)
    ));
    assert!(workspace.get_guid_list_of_widgets().is_empty());
    assert!(workspace.close_modal());
    assert!(host.runtime.instances().is_empty());
    assert!(!workspace.close_modal());
}
