use super::reconciler::{
    Workspace, ACTION_CHANGE_MODE, ACTION_COMPACT_ALL_PANELS, ACTION_SET_ACTIVE_TAB,
    ACTION_SET_COLUMN, EVENT_CELL_CLICKED, EVENT_EDIT_MODE_CHANGED, EVENT_TAB_CLICKED,
    EVENT_TAB_SELECTED_PROGRAMMLY,
};
use crate::error::WorkspaceCoreError;
use crate::grid::CellSpec;
use crate::host::WidgetContent;
use crate::panel::{availability, Availability, PanelRequest};
use crate::tabs::NewTab;
use event_bus::ActionInvocation;
use serde_json::{json, Value};
use workspace::{PluginMeta, Rect};

/// A cell requested from the UI. Without a plugin the cell is an empty
/// placeholder.
#[derive(Debug, Clone, Default)]
pub struct CellRequest {
    pub tab_id: Option<String>,
    pub plugin: Option<PluginChoice>,
    pub rect: Option<Rect>,
    pub locked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginChoice {
    pub name: String,
    /// `None` picks the newest installed version.
    pub version: Option<String>,
}

impl PluginChoice {
    pub fn new(name: &str, version: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            version: version.map(str::to_string),
        }
    }
}

impl Workspace {
    pub fn create_tab(&mut self, name: Option<&str>) -> String {
        let tab_id = self.tabs.create_tab(NewTab {
            id: None,
            name: name.map(str::to_string),
        });
        self.dispatch_tab_events();
        tab_id
    }

    pub fn delete_tab(&mut self, tab_id: &str) -> bool {
        let deleted = self.tabs.delete_tab(tab_id);
        self.dispatch_tab_events();
        deleted
    }

    pub fn rename_tab(&mut self, tab_id: &str, name: &str) -> Result<(), WorkspaceCoreError> {
        self.tabs.rename_tab(tab_id, name)
    }

    /// Duplicates a tab with copies of its non-pinned panels.
    pub fn copy_tab(&mut self, tab_id: &str) -> Option<String> {
        let copy = self.tabs.copy_tab(tab_id);
        self.dispatch_tab_events();
        copy
    }

    /// Activates a tab from code and announces it on the bus.
    pub fn set_active_tab(&mut self, tab_id: &str) -> bool {
        if !self.tabs.activate_tab(tab_id) {
            return false;
        }
        self.dispatch_tab_events();
        self.publish(EVENT_TAB_SELECTED_PROGRAMMLY, json!({ "tabId": tab_id }));
        true
    }

    /// Activates a tab in response to a user click.
    pub fn select_tab(&mut self, tab_id: &str) -> bool {
        if !self.tabs.activate_tab(tab_id) {
            return false;
        }
        self.dispatch_tab_events();
        self.publish(EVENT_TAB_CLICKED, json!({ "tabId": tab_id }));
        true
    }

    fn resolve_choice(&self, choice: &PluginChoice) -> Result<PluginMeta, WorkspaceCoreError> {
        let versions = self.host.runtime.installed_versions(&choice.name);
        let version = match &choice.version {
            Some(version) => {
                match availability(self.host.runtime.as_ref(), &choice.name, version) {
                    Availability::Exact => Some(version.clone()),
                    _ => None,
                }
            }
            None => crate::panel::preferred_version(&versions),
        };
        version
            .map(|version| PluginMeta::panel(choice.name.as_str(), version))
            .ok_or_else(|| WorkspaceCoreError::PluginNotFound {
                name: choice.name.clone(),
                version: choice.version.clone().unwrap_or_default(),
            })
    }

    fn default_rect(&self) -> Rect {
        Rect {
            x: 0,
            y: 0,
            w: self.settings.default_cell.w,
            h: self.settings.default_cell.h,
        }
    }

    /// Adds a cell to a tab (the active one by default) and returns its
    /// guid.
    pub fn create_cell(&mut self, request: CellRequest) -> Result<String, WorkspaceCoreError> {
        let tab_id = match request.tab_id {
            Some(tab_id) => tab_id,
            None => self
                .tabs
                .active_tab_id()
                .map(str::to_string)
                .ok_or_else(|| WorkspaceCoreError::UnknownTab(String::new()))?,
        };
        if !self.tabs.contains(&tab_id) {
            return Err(WorkspaceCoreError::UnknownTab(tab_id));
        }
        let auto_position = request.rect.is_none();
        let rect = Some(request.rect.unwrap_or_else(|| self.default_rect()));
        match request.plugin {
            Some(choice) => {
                let meta = self.resolve_choice(&choice)?;
                let spec = CellSpec {
                    guid: self.next_guid(&meta.name),
                    rect,
                    auto_position,
                    locked: request.locked,
                    to_fix_panel: false,
                };
                self.mount_new_panel(&tab_id, spec, &meta, &Value::Null)
            }
            None => {
                let guid = self.next_guid("cell");
                let spec = CellSpec {
                    guid: guid.clone(),
                    rect,
                    auto_position,
                    locked: request.locked,
                    to_fix_panel: false,
                };
                self.grid.create_cell(
                    self.host.layout.as_mut(),
                    &tab_id,
                    spec,
                    WidgetContent::Placeholder,
                )?;
                Ok(guid)
            }
        }
    }

    /// Fills an empty cell with a panel. The cell keeps its place; the panel
    /// gets a guid of its own.
    pub fn mount_panel(
        &mut self,
        cell_guid: &str,
        choice: &PluginChoice,
    ) -> Result<String, WorkspaceCoreError> {
        let cell = self
            .grid
            .cell(cell_guid)
            .cloned()
            .ok_or_else(|| WorkspaceCoreError::UnknownCell(cell_guid.to_string()))?;
        if self.panels.contains(cell_guid) {
            return Err(WorkspaceCoreError::CellOccupied(cell_guid.to_string()));
        }
        let meta = self.resolve_choice(choice)?;
        let rect = self.grid.refresh_rect(self.host.layout.as_ref(), cell_guid);
        self.grid.remove_cell(self.host.layout.as_mut(), cell_guid);
        self.broken.retain(|broken| broken.entry.guid != cell_guid);
        let spec = CellSpec {
            guid: self.next_guid(&meta.name),
            rect,
            auto_position: rect.is_none(),
            locked: cell.locked,
            to_fix_panel: cell.to_fix_panel,
        };
        self.mount_new_panel(&cell.tab_id, spec, &meta, &Value::Null)
    }

    /// Removes a cell, its clones and its panel.
    pub fn delete_cell(&mut self, guid: &str) -> Result<(), WorkspaceCoreError> {
        if self.panels.get(guid).is_some_and(|panel| panel.undeletable) {
            log::warn!("refusing to delete undeletable panel '{guid}'");
            return Err(WorkspaceCoreError::Undeletable(guid.to_string()));
        }
        if self
            .grid
            .remove_cell(self.host.layout.as_mut(), guid)
            .is_none()
        {
            return Err(WorkspaceCoreError::UnknownCell(guid.to_string()));
        }
        self.forget_cell(guid);
        Ok(())
    }

    /// Pins or unpins a cell. A pinned cell moves into the active tab right
    /// away and is mirrored everywhere else. Returns the new pin state.
    pub fn toggle_fix_panel(&mut self, guid: &str) -> Result<bool, WorkspaceCoreError> {
        let fixed = !self
            .grid
            .cell(guid)
            .ok_or_else(|| WorkspaceCoreError::UnknownCell(guid.to_string()))?
            .to_fix_panel;
        self.grid.set_fixed(self.host.layout.as_mut(), guid, fixed)?;
        if let Some(panel) = self.panels.get_mut(guid) {
            panel.to_fix_panel = fixed;
        }
        if let Some(active) = self.tabs.active_tab_id().map(str::to_string) {
            if fixed {
                self.grid
                    .change_fixed_panel_position(self.host.layout.as_mut(), &active);
            }
            self.propagate_visibility(&active);
        }
        Ok(fixed)
    }

    pub fn compact_all_panels(&mut self) {
        self.grid.compact_all(self.host.layout.as_mut());
    }

    /// Enters edit mode, leaves it, or flips it when `edit` is `None`.
    pub fn change_mode(&mut self, edit: Option<bool>) -> bool {
        let edit_mode = self.grid.set_edit_mode(self.host.layout.as_mut(), edit);
        self.publish(EVENT_EDIT_MODE_CHANGED, json!({ "editMode": edit_mode }));
        edit_mode
    }

    pub fn set_column(&mut self, columns: u32) -> Result<(), WorkspaceCoreError> {
        self.grid.set_column(self.host.layout.as_mut(), columns)?;
        Ok(())
    }

    pub fn click_cell(&mut self, guid: &str) -> Result<(), WorkspaceCoreError> {
        if self.grid.cell(guid).is_none() {
            return Err(WorkspaceCoreError::UnknownCell(guid.to_string()));
        }
        self.selected_cell = Some(guid.to_string());
        self.publish(EVENT_CELL_CLICKED, json!({ "guid": guid }));
        Ok(())
    }

    /// Guids of every real cell across all tabs.
    pub fn get_guid_list_of_widgets(&self) -> Vec<String> {
        self.grid.guids()
    }

    /// Opens a panel outside the grid. Only one modal panel exists at a
    /// time.
    pub fn open_panel_in_modal(&mut self, choice: &PluginChoice) -> Result<String, WorkspaceCoreError> {
        if self.modal_panel.is_some() {
            return Err(WorkspaceCoreError::ModalBusy);
        }
        let meta = self.resolve_choice(choice)?;
        let guid = self.next_guid(&meta.name);
        let request = PanelRequest {
            name: &meta.name,
            version: &meta.version,
            requested_version: None,
            guid: Some(&guid),
            selector: self.settings.modal_selector.clone(),
            to_fix_panel: false,
            undeletable: false,
            config: &Value::Null,
        };
        let live = self
            .panels
            .instantiate(self.host.runtime.as_mut(), request)?
            .guid
            .clone();
        self.modal_panel = Some(live.clone());
        Ok(live)
    }

    pub fn close_modal(&mut self) -> bool {
        let Some(guid) = self.modal_panel.take() else {
            return false;
        };
        if let Some(panel) = self.panels.teardown(self.host.runtime.as_mut(), &guid) {
            self.host.events.unregister_instance(&panel.guid);
        }
        true
    }

    /// Runs a custom action delivered by the event bus. Returns whether the
    /// action was addressed to this workspace and understood.
    pub fn handle_action(
        &mut self,
        invocation: &ActionInvocation,
    ) -> Result<bool, WorkspaceCoreError> {
        if invocation.guid != self.guid {
            return Ok(false);
        }
        let argument = action_argument(invocation);
        match invocation.action.as_str() {
            ACTION_COMPACT_ALL_PANELS => self.compact_all_panels(),
            ACTION_CHANGE_MODE => {
                let edit = argument
                    .and_then(|value| value.get("editMode").cloned().or(Some(value)))
                    .and_then(|value| value.as_bool());
                self.change_mode(edit);
            }
            ACTION_SET_COLUMN => {
                let columns = argument
                    .and_then(|value| value.get("column").cloned().or(Some(value)))
                    .and_then(|value| value.as_u64())
                    .and_then(|value| u32::try_from(value).ok())
                    .ok_or(WorkspaceCoreError::InvalidColumn)?;
                self.set_column(columns)?;
            }
            ACTION_SET_ACTIVE_TAB => {
                let tab_id = argument
                    .and_then(|value| value.get("tabId").cloned().or(Some(value)))
                    .and_then(|value| value.as_str().map(str::to_string))
                    .unwrap_or_default();
                if !self.set_active_tab(&tab_id) {
                    return Err(WorkspaceCoreError::UnknownTab(tab_id));
                }
            }
            other => {
                log::warn!("unknown workspace action '{other}'");
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Subscription args win over the event payload.
fn action_argument(invocation: &ActionInvocation) -> Option<Value> {
    invocation
        .args
        .clone()
        .filter(|args| !args.is_null())
        .or_else(|| Some(invocation.payload.clone()).filter(|payload| !payload.is_null()))
}
