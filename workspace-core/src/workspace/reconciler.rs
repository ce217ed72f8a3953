use super::deferred::{DeferredActivation, PendingPanel};
use super::plan::{LoadPlan, LoadReport, PlannedEntry, ReconcilePhase};
use super::settings::WorkspaceSettings;
use crate::error::WorkspaceCoreError;
use crate::grid::{CellSpec, GridSurfaceManager};
use crate::host::{Host, NotificationLevel, SubstitutionRequest, WidgetContent};
use crate::panel::{
    apply_aliases, next_guid, panel_selector, PanelLifecycleManager, PanelRequest, Resolution,
};
use crate::style;
use crate::tabs::{NewTab, TabEvent, TabRegistry};
use serde_json::{json, Value};
use std::collections::HashMap;
use workspace::{
    remap_subscriptions, Configuration, ConfigurationId, EventSystemConfig, GuidMap, PanelBorder,
    PanelPosition, PluginEntry, PluginMeta, Subscription,
};

pub const EVENT_CELL_CLICKED: &str = "WorkspaceCellClicked";
pub const EVENT_TAB_SELECTED_PROGRAMMLY: &str = "WorkspaceTabSelectedProgrammly";
pub const EVENT_TAB_CLICKED: &str = "WorkspaceTabClicked";
pub const EVENT_EDIT_MODE_CHANGED: &str = "WorkspaceEditModeChanged";
pub const EVENT_TITLE_LOADED: &str = "WorkspaceTitleLoaded";

pub const WORKSPACE_EVENTS: [&str; 5] = [
    EVENT_CELL_CLICKED,
    EVENT_TAB_SELECTED_PROGRAMMLY,
    EVENT_TAB_CLICKED,
    EVENT_EDIT_MODE_CHANGED,
    EVENT_TITLE_LOADED,
];

pub const ACTION_COMPACT_ALL_PANELS: &str = "compactAllPanels";
pub const ACTION_CHANGE_MODE: &str = "changeMode";
pub const ACTION_SET_COLUMN: &str = "setColumn";
pub const ACTION_SET_ACTIVE_TAB: &str = "setActiveTab";

pub const WORKSPACE_ACTIONS: [&str; 4] = [
    ACTION_COMPACT_ALL_PANELS,
    ACTION_CHANGE_MODE,
    ACTION_SET_COLUMN,
    ACTION_SET_ACTIVE_TAB,
];

const NOTIFICATION_TITLE: &str = "Workspace";

/// A saved panel that could not be built. Its cell shows an error and the
/// entry is written back on save so nothing is lost.
#[derive(Debug, Clone, PartialEq)]
pub struct BrokenPanel {
    pub entry: PluginEntry,
    pub message: String,
}

/// The live workspace: tabs, grids, panel instances and the mapping from
/// saved guids to live ones.
pub struct Workspace {
    pub(super) guid: String,
    pub(super) host: Host,
    pub(super) settings: WorkspaceSettings,
    pub(super) tabs: TabRegistry,
    pub(super) grid: GridSurfaceManager,
    pub(super) panels: PanelLifecycleManager,
    pub(super) deferred: DeferredActivation,
    pub(super) guid_map: GuidMap,
    pub(super) held_subscriptions: Vec<Subscription>,
    pub(super) broken: Vec<BrokenPanel>,
    pub(super) phase: ReconcilePhase,
    pub(super) id: Option<ConfigurationId>,
    pub(super) title: String,
    pub(super) path: Option<String>,
    pub(super) type_init: Option<String>,
    pub(super) border: PanelBorder,
    pub(super) selected_cell: Option<String>,
    pub(super) modal_panel: Option<String>,
}

impl Workspace {
    /// Creates a workspace registered on the event bus under `guid`, with a
    /// single empty tab.
    pub fn new(guid: impl Into<String>, host: Host, settings: WorkspaceSettings) -> Self {
        let mut workspace = Self {
            guid: guid.into(),
            host,
            grid: GridSurfaceManager::new(settings.grid_settings()),
            deferred: DeferredActivation::new(settings.deferred_activation),
            settings,
            tabs: TabRegistry::new(),
            panels: PanelLifecycleManager::new(),
            guid_map: GuidMap::new(),
            held_subscriptions: Vec::new(),
            broken: Vec::new(),
            phase: ReconcilePhase::Idle,
            id: None,
            title: String::new(),
            path: None,
            type_init: None,
            border: PanelBorder::default(),
            selected_cell: None,
            modal_panel: None,
        };
        workspace
            .host
            .events
            .register_plugin_instance(&workspace.guid, &WORKSPACE_EVENTS);
        for action in WORKSPACE_ACTIONS {
            workspace
                .host
                .events
                .register_custom_action(&workspace.guid, action);
        }
        workspace.tabs.create_tab(NewTab {
            id: None,
            name: Some("Tab 1".to_string()),
        });
        workspace.dispatch_tab_events();
        workspace
    }

    pub fn guid(&self) -> &str {
        &self.guid
    }

    pub fn settings(&self) -> &WorkspaceSettings {
        &self.settings
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    pub fn tabs(&self) -> &TabRegistry {
        &self.tabs
    }

    pub fn grid(&self) -> &GridSurfaceManager {
        &self.grid
    }

    pub fn panels(&self) -> &PanelLifecycleManager {
        &self.panels
    }

    pub fn deferred(&self) -> &DeferredActivation {
        &self.deferred
    }

    pub fn guid_map(&self) -> &GuidMap {
        &self.guid_map
    }

    pub fn held_subscriptions(&self) -> &[Subscription] {
        &self.held_subscriptions
    }

    pub fn broken_panels(&self) -> &[BrokenPanel] {
        &self.broken
    }

    pub fn phase(&self) -> ReconcilePhase {
        self.phase
    }

    /// Drops a drafted plan that will never be applied.
    pub fn abandon_plan(&mut self) {
        if self.phase == ReconcilePhase::Resolving {
            self.phase = ReconcilePhase::Idle;
        }
    }

    pub fn id(&self) -> Option<&ConfigurationId> {
        self.id.as_ref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn panel_border(&self) -> &PanelBorder {
        &self.border
    }

    pub fn selected_cell(&self) -> Option<&str> {
        self.selected_cell.as_deref()
    }

    pub fn modal_panel(&self) -> Option<&str> {
        self.modal_panel.as_deref()
    }

    pub(crate) fn notify(&mut self, level: NotificationLevel, message: &str) {
        self.host.notifier.notify(level, NOTIFICATION_TITLE, message);
    }

    pub(crate) fn redirect_not_found(&mut self) {
        self.host.navigation.redirect_not_found();
    }

    pub(super) fn publish(&mut self, name: &str, payload: Value) {
        if let Err(err) = self.host.events.publish_event(&self.guid, name, payload) {
            log::warn!("failed to publish {name}: {err}");
        }
    }

    /// Tears down every panel, cell, grid and tab. Safe to call repeatedly.
    pub fn reset_workspace(&mut self) {
        for panel in self.panels.teardown_all(self.host.runtime.as_mut()) {
            self.host.events.unregister_instance(&panel.guid);
        }
        self.grid.clear(self.host.layout.as_mut());
        self.tabs.clear();
        self.deferred.clear();
        self.guid_map.clear();
        self.held_subscriptions.clear();
        self.broken.clear();
        self.selected_cell = None;
        self.modal_panel = None;
    }

    /// Runs the side effects of queued tab changes.
    pub(super) fn dispatch_tab_events(&mut self) {
        loop {
            let events = self.tabs.take_events();
            if events.is_empty() {
                break;
            }
            for event in events {
                match event {
                    TabEvent::Added { tab_id } => {
                        self.grid.add_tab_grid(self.host.layout.as_mut(), &tab_id);
                    }
                    TabEvent::Activated { tab_id } => self.on_tab_activated(&tab_id),
                    TabEvent::Deleted { tab_id } => self.on_tab_deleted(&tab_id),
                    TabEvent::Copied { source_id, tab_id } => {
                        self.on_tab_copied(&source_id, &tab_id)
                    }
                }
            }
        }
    }

    fn on_tab_activated(&mut self, tab_id: &str) {
        self.grid
            .change_fixed_panel_position(self.host.layout.as_mut(), tab_id);
        let ready = self.deferred.take_for_tab(tab_id);
        if !ready.is_empty() {
            log::debug!("building {} deferred panel(s) for tab '{tab_id}'", ready.len());
            for pending in ready {
                self.materialize(pending.entry, pending.resolution, &pending.tab_id);
            }
            self.wire_held_subscriptions();
        }
        self.propagate_visibility(tab_id);
        self.host.navigation.set_query_tab(tab_id);
    }

    fn on_tab_deleted(&mut self, tab_id: &str) {
        let removed = self
            .grid
            .remove_tab_grid(self.host.layout.as_mut(), tab_id);
        for guid in removed {
            self.forget_cell(&guid);
        }
        for pending in self.deferred.take_for_tab(tab_id) {
            self.held_subscriptions
                .retain(|sub| !sub.references(&pending.entry.guid));
        }
    }

    fn on_tab_copied(&mut self, source_id: &str, tab_id: &str) {
        let waiting: Vec<PendingPanel> = self
            .deferred
            .pending()
            .iter()
            .filter(|pending| pending.tab_id == source_id)
            .cloned()
            .collect();
        for pending in waiting {
            let mut entry = pending.entry;
            entry.guid = self.next_guid(&entry.meta.name);
            if let Some(position) = entry.position.as_mut() {
                position.tab_id = Some(tab_id.to_string());
            }
            self.deferred.hold(PendingPanel {
                entry,
                tab_id: tab_id.to_string(),
                resolution: pending.resolution,
            });
        }
        let sources: Vec<String> = self
            .grid
            .cells_in_tab(source_id)
            .filter(|cell| !cell.to_fix_panel && self.panels.contains(&cell.guid))
            .map(|cell| cell.guid.clone())
            .collect();
        for guid in sources {
            let Some(panel) = self.panels.get(&guid).cloned() else {
                continue;
            };
            let rect = self.grid.refresh_rect(self.host.layout.as_ref(), &guid);
            let config = self.panels.export_config(self.host.runtime.as_ref(), &guid);
            let spec = CellSpec {
                guid: self.next_guid(panel.name()),
                rect,
                auto_position: rect.is_none(),
                locked: false,
                to_fix_panel: false,
            };
            if let Err(err) = self.mount_new_panel(tab_id, spec, &panel.meta, &config) {
                log::warn!("failed to copy panel '{guid}' into tab '{tab_id}': {err}");
            }
        }
    }

    /// Drops the panel and bookkeeping behind a cell that is already gone
    /// from the grid.
    pub(super) fn forget_cell(&mut self, guid: &str) {
        if let Some(panel) = self.panels.teardown(self.host.runtime.as_mut(), guid) {
            self.host.events.unregister_instance(&panel.guid);
        }
        self.broken.retain(|broken| broken.entry.guid != guid);
        if self.selected_cell.as_deref() == Some(guid) {
            self.selected_cell = None;
        }
    }

    pub(super) fn propagate_visibility(&mut self, active_tab: &str) {
        for panel in self.panels.panels() {
            let Some(cell) = self.grid.cell(&panel.guid) else {
                continue;
            };
            if panel.capabilities.visibility {
                let visible = cell.to_fix_panel || cell.tab_id == active_tab;
                self.host.runtime.set_visible(&panel.guid, visible);
            }
        }
    }

    pub(super) fn is_guid_taken(&self, guid: &str) -> bool {
        self.panels.contains(guid)
            || self.grid.cell(guid).is_some()
            || self.deferred.is_pending(guid)
            || self.broken.iter().any(|broken| broken.entry.guid == guid)
    }

    pub(super) fn next_guid(&self, name: &str) -> String {
        let taken = self
            .panels
            .panels()
            .iter()
            .map(|panel| panel.guid.as_str())
            .chain(self.grid.cells().iter().map(|cell| cell.guid.as_str()))
            .chain(self.deferred.pending().iter().map(|p| p.entry.guid.as_str()))
            .chain(self.broken.iter().map(|broken| broken.entry.guid.as_str()));
        next_guid(name, taken)
    }

    /// Creates a cell and a panel in it. The cell is removed again if the
    /// runtime refuses the panel.
    pub(super) fn mount_new_panel(
        &mut self,
        tab_id: &str,
        spec: CellSpec,
        meta: &PluginMeta,
        config: &Value,
    ) -> Result<String, WorkspaceCoreError> {
        let guid = spec.guid.clone();
        let selector = panel_selector(&guid);
        self.grid.create_cell(
            self.host.layout.as_mut(),
            tab_id,
            spec,
            WidgetContent::Panel {
                selector: selector.clone(),
            },
        )?;
        let request = PanelRequest {
            name: &meta.name,
            version: &meta.version,
            requested_version: None,
            guid: Some(&guid),
            selector,
            to_fix_panel: false,
            undeletable: false,
            config,
        };
        let live = match self.panels.instantiate(self.host.runtime.as_mut(), request) {
            Ok(panel) => panel.guid.clone(),
            Err(err) => {
                self.grid.remove_cell(self.host.layout.as_mut(), &guid);
                return Err(err);
            }
        };
        self.grid.rekey(self.host.layout.as_mut(), &guid, &live);
        if let Some(active) = self.tabs.active_tab_id().map(str::to_string) {
            self.propagate_visibility(&active);
        }
        Ok(live)
    }

    /// Builds the cell and panel for a saved entry in `tab_id`. Entries that
    /// cannot run get an error cell and are kept as broken.
    fn materialize(
        &mut self,
        entry: PluginEntry,
        resolution: Resolution,
        tab_id: &str,
    ) -> Option<String> {
        let guid = if self.is_guid_taken(&entry.guid) {
            let guid = self.next_guid(&entry.meta.name);
            log::warn!("guid '{}' is taken, using '{guid}'", entry.guid);
            guid
        } else {
            entry.guid.clone()
        };
        let rect = entry.position.as_ref().map(PanelPosition::rect);
        let spec = CellSpec {
            guid: guid.clone(),
            rect,
            auto_position: rect.is_none(),
            locked: false,
            to_fix_panel: entry.to_fix_panel,
        };
        let Some(version) = resolution.version_to_install().map(str::to_string) else {
            let message = format!(
                "Plugin {} v{} not found",
                entry.meta.name,
                resolution.requested_version()
            );
            let content = WidgetContent::Error {
                message: message.clone(),
            };
            if let Err(err) =
                self.grid
                    .create_cell(self.host.layout.as_mut(), tab_id, spec, content)
            {
                log::error!("failed to place error cell for '{guid}': {err}");
            }
            self.record_broken(entry, guid, message);
            return None;
        };

        let selector = panel_selector(&guid);
        let content = WidgetContent::Panel {
            selector: selector.clone(),
        };
        if let Err(err) = self
            .grid
            .create_cell(self.host.layout.as_mut(), tab_id, spec, content)
        {
            log::error!("failed to create cell for '{guid}': {err}");
            return None;
        }
        let request = PanelRequest {
            name: &entry.meta.name,
            version: &version,
            requested_version: Some(resolution.requested_version()),
            guid: Some(&guid),
            selector,
            to_fix_panel: entry.to_fix_panel,
            undeletable: entry.undeletable,
            config: &entry.config,
        };
        match self.panels.instantiate(self.host.runtime.as_mut(), request) {
            Ok(panel) => {
                let live = panel.guid.clone();
                self.grid.rekey(self.host.layout.as_mut(), &guid, &live);
                self.guid_map.insert(entry.guid, live.clone());
                Some(live)
            }
            Err(err) => {
                log::error!("failed to create panel {} v{version}: {err}", entry.meta.name);
                let message = err.to_string();
                let content = WidgetContent::Error {
                    message: message.clone(),
                };
                if let Err(err) = self
                    .grid
                    .set_cell_content(self.host.layout.as_mut(), &guid, content)
                {
                    log::error!("failed to mark cell '{guid}' as broken: {err}");
                }
                self.record_broken(entry, guid, message);
                None
            }
        }
    }

    fn record_broken(&mut self, entry: PluginEntry, guid: String, message: String) {
        log::warn!("{message}");
        self.notify(NotificationLevel::Error, &message);
        self.broken.push(BrokenPanel {
            entry: PluginEntry { guid, ..entry },
            message,
        });
    }

    fn restore_core(&mut self, entry: &PluginEntry) {
        let name = entry.meta.name.as_str();
        if name == self.settings.workspace_system_name {
            self.guid_map.insert(entry.guid.clone(), self.guid.clone());
            return;
        }
        let system = self
            .host
            .systems
            .find(name, Some(entry.meta.version.as_str()))
            .or_else(|| self.host.systems.find(name, None));
        let Some(system) = system else {
            log::warn!("core system {name} v{} is not running", entry.meta.version);
            return;
        };
        self.guid_map.insert(entry.guid.clone(), system.guid.clone());
        if name == self.settings.event_system_name || entry.config.is_null() {
            return;
        }
        if let Err(err) = self
            .host
            .systems
            .apply_system_config(&system.guid, &entry.config)
        {
            log::warn!("failed to restore config of {name}: {err}");
        }
    }

    /// Phase one of a load: applies legacy aliases and decides which
    /// version each panel runs on. Mismatches without a cached answer stay
    /// undecided.
    pub fn draft_plan(&mut self, mut configuration: Configuration) -> LoadPlan {
        let mut event_system =
            match configuration.event_system_config(&self.settings.event_system_name) {
                Ok(config) => config,
                Err(err) => {
                    log::warn!("ignoring unreadable event system config: {err}");
                    None
                }
            };
        let mut subscriptions = event_system
            .as_mut()
            .map(|config| std::mem::take(&mut config.subscriptions))
            .unwrap_or_default();
        let aliased = apply_aliases(
            &self.settings.aliases,
            &mut configuration.plugins,
            &mut subscriptions,
        );
        if let Some(config) = event_system.as_mut() {
            config.subscriptions = subscriptions;
        }
        let entries = std::mem::take(&mut configuration.plugins)
            .into_iter()
            .map(|entry| {
                if entry.is_panel() {
                    let resolution = self.panels.resolve(
                        self.host.runtime.as_ref(),
                        &entry.meta.name,
                        &entry.meta.version,
                    );
                    PlannedEntry::Panel { entry, resolution }
                } else {
                    PlannedEntry::Core(entry)
                }
            })
            .collect();
        self.phase = ReconcilePhase::Resolving;
        LoadPlan {
            configuration,
            entries,
            event_system,
            aliased,
        }
    }

    pub fn record_substitution(&mut self, request: &SubstitutionRequest, accepted: bool) {
        self.panels
            .record_decision(&request.name, &request.requested_version, accepted);
    }

    /// Loads a configuration, asking `prompt` about each version mismatch
    /// not answered earlier in the session.
    pub fn load_with(
        &mut self,
        configuration: Configuration,
        mut prompt: impl FnMut(&SubstitutionRequest) -> bool,
    ) -> LoadReport {
        let mut plan = self.draft_plan(configuration);
        for request in plan.undecided() {
            let accepted = prompt(&request);
            self.record_substitution(&request, accepted);
            plan.decide(&request, accepted);
        }
        self.apply_plan(plan)
    }

    /// Phase two of a load: replaces all live state with the plan.
    pub fn apply_plan(&mut self, plan: LoadPlan) -> LoadReport {
        let LoadPlan {
            configuration,
            entries,
            event_system,
            aliased,
        } = plan;
        let mut report = LoadReport {
            aliased,
            ..LoadReport::default()
        };

        self.phase = ReconcilePhase::Resetting;
        self.reset_workspace();

        self.phase = ReconcilePhase::BuildingTabs;
        self.id = configuration.id.clone();
        self.title = configuration.title.clone();
        self.path = configuration.path.clone();
        self.type_init = configuration.type_init.clone();
        self.border = configuration.panel_border();
        self.deferred
            .set_enabled(self.settings.deferred_activation || configuration.defers_inactive_tabs());
        let column = configuration
            .column
            .filter(|column| *column > 0)
            .unwrap_or(self.settings.default_column);
        if let Err(err) = self.grid.set_column(self.host.layout.as_mut(), column) {
            log::warn!("keeping previous column count: {err}");
        }
        self.grid
            .set_edit_mode(self.host.layout.as_mut(), Some(configuration.edit_mode));

        let tabs_config = configuration.tab_panels_config.clone().unwrap_or_default();
        self.tabs.set_visible_nav_bar(tabs_config.visible_nav_bar);
        let mut tab_ids: HashMap<String, String> = HashMap::new();
        let mut configured_active = None;
        for options in &tabs_config.tabs_options {
            let id = self.tabs.create_tab(NewTab {
                id: Some(options.id.clone()),
                name: Some(options.name.clone()),
            });
            if options.is_active && configured_active.is_none() {
                configured_active = Some(id.clone());
            }
            tab_ids.entry(options.id.clone()).or_insert(id);
        }
        if self.tabs.tabs().is_empty() {
            self.tabs.create_tab(NewTab {
                id: None,
                name: Some("Tab 1".to_string()),
            });
        }
        self.dispatch_tab_events();
        let requested_tab = self
            .host
            .navigation
            .query_tab()
            .filter(|tab_id| self.tabs.contains(tab_id));
        let target = requested_tab
            .or(configured_active)
            .or_else(|| self.tabs.first_tab_id().map(str::to_string))
            .unwrap_or_default();

        self.phase = ReconcilePhase::BuildingPanels;
        for planned in entries {
            match planned {
                PlannedEntry::Core(entry) => self.restore_core(&entry),
                PlannedEntry::Panel {
                    entry,
                    mut resolution,
                } => {
                    if matches!(resolution, Resolution::Undecided { .. }) {
                        log::warn!(
                            "no answer for {} v{}, leaving it unloaded",
                            entry.meta.name,
                            entry.meta.version
                        );
                        resolution.decide(false);
                    }
                    if let Some(request) = resolution.substitution(&entry.meta.name) {
                        if !report.substituted.contains(&request) {
                            report.substituted.push(request);
                        }
                    }
                    let tab_id = entry
                        .tab_id()
                        .map(|saved| tab_ids.get(saved).cloned().unwrap_or_else(|| saved.to_string()))
                        .filter(|tab_id| self.tabs.contains(tab_id))
                        .unwrap_or_else(|| target.clone());
                    if self.deferred.should_defer(&entry, &tab_id, &target) {
                        self.deferred.hold(PendingPanel {
                            entry,
                            tab_id,
                            resolution,
                        });
                        report.deferred += 1;
                        continue;
                    }
                    if self.materialize(entry, resolution, &tab_id).is_some() {
                        report.panels += 1;
                    }
                }
            }
        }
        report.missing = self
            .broken
            .iter()
            .map(|broken| format!("{} v{}", broken.entry.meta.name, broken.entry.meta.version))
            .collect();

        self.tabs.activate_tab(&target);
        self.dispatch_tab_events();
        report.tabs = self.tabs.tabs().len();
        report.active_tab = Some(target);

        self.phase = ReconcilePhase::WiringSubscriptions;
        if let Some(config) = event_system {
            self.wire_subscriptions(config, &mut report);
        }

        let rule = style::panel_border_rule(&self.settings.root_selector, &self.border)
            .unwrap_or_default();
        self.host
            .layout
            .inject_stylesheet(style::BORDER_STYLESHEET_ID, &rule);
        if !report.substituted.is_empty() {
            let names: Vec<String> = report
                .substituted
                .iter()
                .map(|s| format!("{} v{} (saved v{})", s.name, s.available_version, s.requested_version))
                .collect();
            self.notify(
                NotificationLevel::Warning,
                &format!("Running substitute versions: {}", names.join(", ")),
            );
        }
        let title = self.title.clone();
        self.publish(EVENT_TITLE_LOADED, json!({ "title": title }));
        self.phase = ReconcilePhase::Idle;
        log::info!(
            "loaded '{}': {} tab(s), {} panel(s), {} deferred, {} missing",
            self.title,
            report.tabs,
            report.panels,
            report.deferred,
            report.missing.len()
        );
        report
    }

    fn references_pending(&self, subscription: &Subscription) -> bool {
        let pending = |guid: &str| self.deferred.is_pending(guid);
        let known = |guid: &str| self.guid_map.contains(guid) || pending(guid);
        (pending(&subscription.event.guid) || pending(&subscription.action.guid))
            && known(&subscription.event.guid)
            && known(&subscription.action.guid)
    }

    fn wire_subscriptions(&mut self, config: EventSystemConfig, report: &mut LoadReport) {
        let outcome = remap_subscriptions(&config.subscriptions, &self.guid_map);
        let mut held = Vec::new();
        let mut dropped = 0;
        for subscription in outcome.unresolved {
            if self.references_pending(&subscription) {
                held.push(subscription);
            } else {
                log::warn!(
                    "dropping subscription {}[{}] -> {}[{}]: endpoint not loaded",
                    subscription.event.name,
                    subscription.event.guid,
                    subscription.action.name,
                    subscription.action.guid
                );
                dropped += 1;
            }
        }
        report.subscriptions_wired = self.host.events.set_plugin_config(EventSystemConfig {
            events: config.events,
            actions: config.actions,
            subscriptions: outcome.resolved,
        });
        report.subscriptions_held = held.len();
        report.subscriptions_dropped = dropped;
        self.held_subscriptions = held;
        if dropped > 0 {
            self.notify(
                NotificationLevel::Warning,
                &format!("{dropped} event subscription(s) could not be restored"),
            );
        }
    }

    /// Subscribes every held subscription whose endpoints are now all live.
    fn wire_held_subscriptions(&mut self) {
        for subscription in std::mem::take(&mut self.held_subscriptions) {
            let event = self.guid_map.resolve(&subscription.event.guid);
            let action = self.guid_map.resolve(&subscription.action.guid);
            let (Some(event), Some(action)) = (event, action) else {
                self.held_subscriptions.push(subscription);
                continue;
            };
            let mut live = subscription.clone();
            live.event.guid = event.to_string();
            live.action.guid = action.to_string();
            if let Err(err) = self.host.events.subscribe(live) {
                log::warn!("failed to wire deferred subscription: {err}");
            }
        }
    }

    /// Held subscriptions as they must be saved: live endpoints use their
    /// runtime guid, pending ones keep the saved guid.
    fn held_for_save(&self) -> Vec<Subscription> {
        self.held_subscriptions
            .iter()
            .map(|subscription| {
                let mut saved = subscription.clone();
                if let Some(live) = self.guid_map.resolve(&saved.event.guid) {
                    saved.event.guid = live.to_string();
                }
                if let Some(live) = self.guid_map.resolve(&saved.action.guid) {
                    saved.action.guid = live.to_string();
                }
                saved
            })
            .collect()
    }

    /// Subscriptions currently in force plus those waiting on deferred
    /// panels.
    pub fn event_system_config(&self) -> EventSystemConfig {
        let mut config = self.host.events.plugin_config();
        config.subscriptions.extend(self.held_for_save());
        config
    }

    /// Serializes the live state. Positions are read back from the grid.
    pub fn save_configuration(&mut self) -> Configuration {
        let mut plugins = Vec::new();
        for system in self.host.systems.systems() {
            let config = if system.name == self.settings.event_system_name {
                self.event_system_config().to_value()
            } else if system.guid == self.guid || system.name == self.settings.workspace_system_name
            {
                Value::Null
            } else {
                self.host
                    .systems
                    .system_config(&system.guid)
                    .unwrap_or(Value::Null)
            };
            plugins.push(PluginEntry {
                guid: system.guid,
                meta: PluginMeta::core(system.name, system.version),
                config,
                position: None,
                undeletable: false,
                to_fix_panel: false,
            });
        }

        let cells: Vec<String> = self.grid.guids();
        for guid in cells {
            self.grid.refresh_rect(self.host.layout.as_ref(), &guid);
            let Some(cell) = self.grid.cell(&guid) else {
                continue;
            };
            let position = cell
                .rect
                .map(|rect| PanelPosition::from_rect(rect, Some(cell.owner_tab.clone())));
            if let Some(panel) = self.panels.get(&guid) {
                plugins.push(PluginEntry {
                    guid: panel.guid.clone(),
                    meta: panel.meta.clone(),
                    config: self.panels.export_config(self.host.runtime.as_ref(), &guid),
                    position,
                    undeletable: panel.undeletable,
                    to_fix_panel: cell.to_fix_panel,
                });
            } else if let Some(broken) = self.broken.iter().find(|b| b.entry.guid == guid) {
                plugins.push(PluginEntry {
                    position: position.or_else(|| broken.entry.position.clone()),
                    to_fix_panel: cell.to_fix_panel,
                    ..broken.entry.clone()
                });
            }
        }
        plugins.extend(self.deferred.pending().iter().map(|p| p.entry.clone()));

        let mut configuration = Configuration::new(self.title.clone());
        configuration.id = self.id.clone();
        configuration.path = self.path.clone();
        configuration.column = Some(self.grid.column());
        configuration.edit_mode = self.grid.edit_mode();
        configuration.type_init = self.type_init.clone();
        configuration.set_panel_border(&self.border);
        configuration.tab_panels_config = Some(self.tabs.config());
        configuration.plugins = plugins;
        configuration
    }
}
