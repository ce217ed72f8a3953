//! In-memory implementations of every host collaborator. Each one is a
//! cheap handle over shared state, so a caller can keep a clone for
//! inspection after boxing another into a [`Host`].

use crate::host::{
    CellHandle, CellId, GridId, GridLayout, GridOptions, Host, HostError, HttpClient, HttpError,
    InstallRequest, InstalledPanel, Navigation, NotificationLevel, Notifier, PanelCapabilities,
    PluginRuntime, SubstitutionRequest, SystemDirectory, SystemInfo, VersionPrompt, WidgetContent,
    WidgetOptions,
};
use crate::workspace::{Workspace, WorkspaceSettings};
use event_bus::{
    ActionInvocation, EventBus, EventBusError, EventSystemConfig, InProcessEventBus, Subscription,
};
use futures_util::future::LocalBoxFuture;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use workspace::Rect;

pub const EVENT_SYSTEM_GUID: &str = "EventSystem_1";
pub const WORKSPACE_SYSTEM_GUID: &str = "WorkspaceSystem_1";

#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessInstance {
    pub guid: String,
    pub name: String,
    pub version: String,
    pub selector: String,
    pub visible: bool,
    pub config: Value,
}

#[derive(Debug, Default)]
struct RuntimeState {
    catalog: Vec<(String, String, PanelCapabilities)>,
    instances: Vec<HeadlessInstance>,
    installs: usize,
}

#[derive(Debug, Clone, Default)]
pub struct HeadlessRuntime {
    state: Rc<RefCell<RuntimeState>>,
}

impl HeadlessRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `name` installable at `version` with both optional hooks.
    pub fn add_plugin(&self, name: &str, version: &str) {
        self.add_plugin_with(
            name,
            version,
            PanelCapabilities {
                visibility: true,
                config: true,
            },
        );
    }

    pub fn add_plugin_with(&self, name: &str, version: &str, capabilities: PanelCapabilities) {
        let mut state = self.state.borrow_mut();
        if !state
            .catalog
            .iter()
            .any(|(n, v, _)| n == name && v == version)
        {
            state
                .catalog
                .push((name.to_string(), version.to_string(), capabilities));
        }
    }

    pub fn instances(&self) -> Vec<HeadlessInstance> {
        self.state.borrow().instances.clone()
    }

    pub fn instance(&self, guid: &str) -> Option<HeadlessInstance> {
        self.state
            .borrow()
            .instances
            .iter()
            .find(|instance| instance.guid == guid)
            .cloned()
    }

    /// Total installs since creation, including instances since removed.
    pub fn install_count(&self) -> usize {
        self.state.borrow().installs
    }

    /// Simulates a panel changing its own configuration.
    pub fn set_instance_config(&self, guid: &str, config: Value) {
        if let Some(instance) = self
            .state
            .borrow_mut()
            .instances
            .iter_mut()
            .find(|instance| instance.guid == guid)
        {
            instance.config = config;
        }
    }
}

impl PluginRuntime for HeadlessRuntime {
    fn installed_versions(&self, name: &str) -> Vec<String> {
        self.state
            .borrow()
            .catalog
            .iter()
            .filter(|(n, _, _)| n == name)
            .map(|(_, version, _)| version.clone())
            .collect()
    }

    fn install_panel(&mut self, request: InstallRequest<'_>) -> Result<InstalledPanel, HostError> {
        let mut state = self.state.borrow_mut();
        let capabilities = state
            .catalog
            .iter()
            .find(|(n, v, _)| n == request.name && v == request.version)
            .map(|(_, _, capabilities)| *capabilities)
            .ok_or_else(|| HostError::PluginUnavailable {
                name: request.name.to_string(),
                version: request.version.to_string(),
            })?;
        let taken = |guid: &str| state.instances.iter().any(|i| i.guid == guid);
        let guid = if !request.guid.is_empty() && !taken(request.guid) {
            request.guid.to_string()
        } else {
            let mut counter = 1;
            while taken(&format!("{}_{counter}", request.name)) {
                counter += 1;
            }
            format!("{}_{counter}", request.name)
        };
        state.instances.push(HeadlessInstance {
            guid: guid.clone(),
            name: request.name.to_string(),
            version: request.version.to_string(),
            selector: request.selector.to_string(),
            visible: true,
            config: Value::Null,
        });
        state.installs += 1;
        Ok(InstalledPanel { guid, capabilities })
    }

    fn uninstall_by_guid(&mut self, guid: &str) -> Result<(), HostError> {
        let mut state = self.state.borrow_mut();
        let before = state.instances.len();
        state.instances.retain(|instance| instance.guid != guid);
        if state.instances.len() == before {
            return Err(HostError::UnknownInstance(guid.to_string()));
        }
        Ok(())
    }

    fn set_visible(&mut self, guid: &str, visible: bool) {
        if let Some(instance) = self
            .state
            .borrow_mut()
            .instances
            .iter_mut()
            .find(|instance| instance.guid == guid)
        {
            instance.visible = visible;
        }
    }

    fn export_config(&self, guid: &str) -> Option<Value> {
        self.instance(guid).map(|instance| instance.config)
    }

    fn apply_config(&mut self, guid: &str, config: &Value) -> Result<(), HostError> {
        let mut state = self.state.borrow_mut();
        let instance = state
            .instances
            .iter_mut()
            .find(|instance| instance.guid == guid)
            .ok_or_else(|| HostError::UnknownInstance(guid.to_string()))?;
        instance.config = config.clone();
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct HeadlessSystems {
    state: Rc<RefCell<Vec<(SystemInfo, Value)>>>,
}

impl HeadlessSystems {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_system(&self, name: &str, version: &str, guid: &str) {
        self.state.borrow_mut().push((
            SystemInfo {
                guid: guid.to_string(),
                name: name.to_string(),
                version: version.to_string(),
            },
            Value::Null,
        ));
    }

    pub fn config(&self, guid: &str) -> Option<Value> {
        self.system_config(guid)
    }
}

impl SystemDirectory for HeadlessSystems {
    fn find(&self, name: &str, version: Option<&str>) -> Option<SystemInfo> {
        self.state
            .borrow()
            .iter()
            .map(|(info, _)| info)
            .find(|info| info.name == name && version.map_or(true, |v| info.version == v))
            .cloned()
    }

    fn systems(&self) -> Vec<SystemInfo> {
        self.state
            .borrow()
            .iter()
            .map(|(info, _)| info.clone())
            .collect()
    }

    fn system_config(&self, guid: &str) -> Option<Value> {
        self.state
            .borrow()
            .iter()
            .find(|(info, _)| info.guid == guid)
            .map(|(_, config)| config.clone())
    }

    fn apply_system_config(&mut self, guid: &str, config: &Value) -> Result<(), HostError> {
        let mut state = self.state.borrow_mut();
        let (_, stored) = state
            .iter_mut()
            .find(|(info, _)| info.guid == guid)
            .ok_or_else(|| HostError::UnknownInstance(guid.to_string()))?;
        *stored = config.clone();
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessWidget {
    pub cell: CellId,
    pub content: WidgetContent,
    pub options: WidgetOptions,
    pub rect: Rect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessGridState {
    pub tab_id: String,
    pub options: GridOptions,
    pub widgets: Vec<HeadlessWidget>,
}

#[derive(Debug, Default)]
struct LayoutState {
    next_id: u64,
    grids: BTreeMap<GridId, HeadlessGridState>,
    stylesheets: BTreeMap<String, String>,
}

fn overlaps(a: &Rect, b: &Rect) -> bool {
    a.x < b.x + b.w && b.x < a.x + a.w && a.y < b.y + b.h && b.y < a.y + a.h
}

/// Grid layout that keeps rectangles in memory. Auto-positioned widgets go
/// below everything else; compaction moves each widget up until it hits
/// another.
#[derive(Debug, Clone, Default)]
pub struct HeadlessGrid {
    state: Rc<RefCell<LayoutState>>,
}

impl HeadlessGrid {
    pub fn new() -> Self {
        Self::default()
    }

    fn grid_of_tab(&self, tab_id: &str) -> Option<HeadlessGridState> {
        self.state
            .borrow()
            .grids
            .values()
            .find(|grid| grid.tab_id == tab_id)
            .cloned()
    }

    pub fn grid_count(&self) -> usize {
        self.state.borrow().grids.len()
    }

    pub fn widgets(&self, tab_id: &str) -> Vec<HeadlessWidget> {
        self.grid_of_tab(tab_id)
            .map(|grid| grid.widgets)
            .unwrap_or_default()
    }

    pub fn options(&self, tab_id: &str) -> Option<GridOptions> {
        self.grid_of_tab(tab_id).map(|grid| grid.options)
    }

    pub fn stylesheet(&self, id: &str) -> Option<String> {
        self.state.borrow().stylesheets.get(id).cloned()
    }

    /// Simulates the user dragging the widget with element id `id`.
    pub fn move_widget(&self, tab_id: &str, id: &str, rect: Rect) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(grid) = state.grids.values_mut().find(|grid| grid.tab_id == tab_id) else {
            return false;
        };
        match grid.widgets.iter_mut().find(|widget| widget.options.id == id) {
            Some(widget) => {
                widget.rect = rect;
                true
            }
            None => false,
        }
    }

    fn with_widget<R>(
        &self,
        grid: GridId,
        cell: CellId,
        f: impl FnOnce(&mut HeadlessWidget) -> R,
    ) -> Option<R> {
        let mut state = self.state.borrow_mut();
        let widget = state
            .grids
            .get_mut(&grid)?
            .widgets
            .iter_mut()
            .find(|widget| widget.cell == cell)?;
        Some(f(widget))
    }
}

impl GridLayout for HeadlessGrid {
    fn init(&mut self, tab_id: &str, options: &GridOptions) -> GridId {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let grid = GridId(state.next_id);
        state.grids.insert(
            grid,
            HeadlessGridState {
                tab_id: tab_id.to_string(),
                options: options.clone(),
                widgets: Vec::new(),
            },
        );
        grid
    }

    fn destroy(&mut self, grid: GridId) {
        self.state.borrow_mut().grids.remove(&grid);
    }

    fn add_widget(&mut self, grid: GridId, content: WidgetContent, options: &WidgetOptions) -> CellId {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let cell = CellId(state.next_id);
        let Some(target) = state.grids.get_mut(&grid) else {
            log::warn!("widget added to unknown grid {grid:?}");
            return cell;
        };
        let mut rect = options.rect.unwrap_or(Rect {
            x: 0,
            y: 0,
            w: 1,
            h: 1,
        });
        if options.auto_position {
            rect.x = 0;
            rect.y = target
                .widgets
                .iter()
                .map(|widget| widget.rect.y + widget.rect.h)
                .max()
                .unwrap_or(0);
        }
        target.widgets.push(HeadlessWidget {
            cell,
            content,
            options: options.clone(),
            rect,
        });
        cell
    }

    fn remove_widget(&mut self, grid: GridId, cell: CellId) {
        if let Some(target) = self.state.borrow_mut().grids.get_mut(&grid) {
            target.widgets.retain(|widget| widget.cell != cell);
        }
    }

    fn update(&mut self, grid: GridId, cell: CellId, options: &WidgetOptions) {
        self.with_widget(grid, cell, |widget| {
            if let Some(rect) = options.rect {
                widget.rect = rect;
            }
            widget.options = options.clone();
        });
    }

    fn set_content(&mut self, grid: GridId, cell: CellId, content: WidgetContent) {
        self.with_widget(grid, cell, |widget| widget.content = content);
    }

    fn transfer_content(&mut self, from: CellHandle, to: CellHandle, replacement: WidgetContent) {
        let moved = self.with_widget(from.grid, from.cell, |widget| {
            std::mem::replace(&mut widget.content, replacement)
        });
        if let Some(content) = moved {
            self.with_widget(to.grid, to.cell, |widget| widget.content = content);
        }
    }

    fn position(&self, grid: GridId, cell: CellId) -> Option<Rect> {
        self.state
            .borrow()
            .grids
            .get(&grid)?
            .widgets
            .iter()
            .find(|widget| widget.cell == cell)
            .map(|widget| widget.rect)
    }

    fn compact(&mut self, grid: GridId) {
        let mut state = self.state.borrow_mut();
        let Some(target) = state.grids.get_mut(&grid) else {
            return;
        };
        target
            .widgets
            .sort_by_key(|widget| (widget.rect.y, widget.rect.x));
        let mut placed: Vec<Rect> = Vec::new();
        for widget in &mut target.widgets {
            let mut rect = widget.rect;
            rect.y = 0;
            while placed.iter().any(|other| overlaps(&rect, other)) {
                rect.y += 1;
            }
            widget.rect = rect;
            placed.push(rect);
        }
    }

    fn batch_update(&mut self, _grid: GridId) {}

    fn commit(&mut self, _grid: GridId) {}

    fn margin(&mut self, grid: GridId, px: u32) {
        if let Some(target) = self.state.borrow_mut().grids.get_mut(&grid) {
            target.options.margin = px;
        }
    }

    fn set_static(&mut self, grid: GridId, is_static: bool) {
        if let Some(target) = self.state.borrow_mut().grids.get_mut(&grid) {
            target.options.static_grid = is_static;
        }
    }

    fn column(&mut self, grid: GridId, columns: u32) {
        if let Some(target) = self.state.borrow_mut().grids.get_mut(&grid) {
            target.options.column = columns;
        }
    }

    fn inject_stylesheet(&mut self, id: &str, css: &str) {
        self.state
            .borrow_mut()
            .stylesheets
            .insert(id.to_string(), css.to_string());
    }
}

/// Shared handle over an [`InProcessEventBus`].
#[derive(Debug, Clone, Default)]
pub struct HeadlessEventBus {
    inner: Rc<RefCell<InProcessEventBus>>,
}

impl HeadlessEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscriptions(&self) -> Vec<Subscription> {
        self.inner.borrow().subscriptions().to_vec()
    }

    pub fn drain(&self) -> Vec<ActionInvocation> {
        self.inner.borrow().drain()
    }

    pub fn has_action(&self, guid: &str, name: &str) -> bool {
        self.inner.borrow().has_action(guid, name)
    }
}

impl EventBus for HeadlessEventBus {
    fn subscribe(&mut self, subscription: Subscription) -> Result<(), EventBusError> {
        self.inner.borrow_mut().subscribe(subscription)
    }

    fn publish_event(
        &mut self,
        source_guid: &str,
        name: &str,
        payload: Value,
    ) -> Result<usize, EventBusError> {
        self.inner
            .borrow_mut()
            .publish_event(source_guid, name, payload)
    }

    fn register_plugin_instance(&mut self, guid: &str, events: &[&str]) {
        self.inner.borrow_mut().register_plugin_instance(guid, events);
    }

    fn register_custom_action(&mut self, guid: &str, name: &str) {
        self.inner.borrow_mut().register_custom_action(guid, name);
    }

    fn unregister_instance(&mut self, guid: &str) {
        self.inner.borrow_mut().unregister_instance(guid);
    }

    fn set_plugin_config(&mut self, config: EventSystemConfig) -> usize {
        self.inner.borrow_mut().set_plugin_config(config)
    }

    fn plugin_config(&self) -> EventSystemConfig {
        self.inner.borrow().plugin_config()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    entries: Rc<RefCell<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Notification> {
        self.entries.borrow().clone()
    }

    pub fn count(&self, level: NotificationLevel) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|entry| entry.level == level)
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&mut self, level: NotificationLevel, title: &str, message: &str) {
        self.entries.borrow_mut().push(Notification {
            level,
            title: title.to_string(),
            message: message.to_string(),
        });
    }
}

#[derive(Debug, Default)]
struct NavigationState {
    tab: Option<String>,
    not_found: bool,
}

#[derive(Debug, Clone, Default)]
pub struct HeadlessNavigation {
    state: Rc<RefCell<NavigationState>>,
}

impl HeadlessNavigation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretends the page was opened with `?tab=tab_id`.
    pub fn open_with_tab(&self, tab_id: &str) {
        self.state.borrow_mut().tab = Some(tab_id.to_string());
    }

    pub fn redirected(&self) -> bool {
        self.state.borrow().not_found
    }
}

impl Navigation for HeadlessNavigation {
    fn query_tab(&self) -> Option<String> {
        self.state.borrow().tab.clone()
    }

    fn set_query_tab(&mut self, tab_id: &str) {
        self.state.borrow_mut().tab = Some(tab_id.to_string());
    }

    fn redirect_not_found(&mut self) {
        self.state.borrow_mut().not_found = true;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: &'static str,
    pub path: String,
    pub body: Value,
}

#[derive(Debug, Default)]
struct HttpState {
    responses: HashMap<String, Value>,
    failures: HashMap<String, u16>,
    requests: Vec<HttpRequest>,
}

/// Configuration store answering from a path-keyed map.
#[derive(Debug, Clone, Default)]
pub struct HeadlessHttp {
    state: Rc<RefCell<HttpState>>,
}

impl HeadlessHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, path: &str, value: Value) {
        self.state
            .borrow_mut()
            .responses
            .insert(path.to_string(), value);
    }

    pub fn fail(&self, path: &str, status: u16) {
        self.state
            .borrow_mut()
            .failures
            .insert(path.to_string(), status);
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.state.borrow().requests.clone()
    }

    fn answer(&self, method: &'static str, path: &str, body: Value) -> Result<Value, HttpError> {
        let mut state = self.state.borrow_mut();
        state.requests.push(HttpRequest {
            method,
            path: path.to_string(),
            body,
        });
        if let Some(status) = state.failures.get(path) {
            return Err(HttpError::Status {
                path: path.to_string(),
                status: *status,
            });
        }
        match method {
            "GET" => state
                .responses
                .get(path)
                .cloned()
                .ok_or_else(|| HttpError::Status {
                    path: path.to_string(),
                    status: 404,
                }),
            _ => Ok(Value::Null),
        }
    }
}

impl HttpClient for HeadlessHttp {
    fn get<'a>(&'a self, path: &'a str) -> LocalBoxFuture<'a, Result<Value, HttpError>> {
        Box::pin(async move { self.answer("GET", path, Value::Null) })
    }

    fn put<'a>(&'a self, path: &'a str, body: Vec<Value>)
        -> LocalBoxFuture<'a, Result<Value, HttpError>> {
        Box::pin(async move { self.answer("PUT", path, Value::Array(body)) })
    }

    fn post<'a>(&'a self, path: &'a str, body: Vec<Value>)
        -> LocalBoxFuture<'a, Result<Value, HttpError>> {
        Box::pin(async move { self.answer("POST", path, Value::Array(body)) })
    }

    fn delete<'a>(&'a self, path: &'a str, data: Value)
        -> LocalBoxFuture<'a, Result<Value, HttpError>> {
        Box::pin(async move { self.answer("DELETE", path, data) })
    }
}

/// Answers every substitution question the same way and remembers them.
#[derive(Debug, Clone)]
pub struct StaticPrompt {
    answer: bool,
    asked: Rc<RefCell<Vec<SubstitutionRequest>>>,
}

impl StaticPrompt {
    pub fn new(answer: bool) -> Self {
        Self {
            answer,
            asked: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn asked(&self) -> Vec<SubstitutionRequest> {
        self.asked.borrow().clone()
    }
}

impl VersionPrompt for StaticPrompt {
    fn confirm_substitution<'a>(&'a self, request: &'a SubstitutionRequest)
        -> LocalBoxFuture<'a, bool> {
        Box::pin(async move {
            self.asked.borrow_mut().push(request.clone());
            self.answer
        })
    }
}

/// Every collaborator of a headless workspace, kept for inspection.
#[derive(Debug, Clone, Default)]
pub struct HeadlessHost {
    pub runtime: HeadlessRuntime,
    pub systems: HeadlessSystems,
    pub grid: HeadlessGrid,
    pub events: HeadlessEventBus,
    pub notifier: RecordingNotifier,
    pub navigation: HeadlessNavigation,
}

impl HeadlessHost {
    /// A host already running an event system and the workspace system.
    pub fn new() -> Self {
        let host = Self::default();
        host.systems
            .add_system("EventSystem", "0.4.0", EVENT_SYSTEM_GUID);
        host.systems
            .add_system("WorkspaceSystem", "0.5.0", WORKSPACE_SYSTEM_GUID);
        host
    }

    pub fn host(&self) -> Host {
        Host {
            runtime: Box::new(self.runtime.clone()),
            systems: Box::new(self.systems.clone()),
            layout: Box::new(self.grid.clone()),
            events: Box::new(self.events.clone()),
            notifier: Box::new(self.notifier.clone()),
            navigation: Box::new(self.navigation.clone()),
        }
    }

    pub fn workspace(&self, settings: WorkspaceSettings) -> Workspace {
        Workspace::new(WORKSPACE_SYSTEM_GUID, self.host(), settings)
    }
}
