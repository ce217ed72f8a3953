use crate::error::WorkspaceCoreError;
use uuid::Uuid;
use workspace::{TabOptions, TabPanelsConfig};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    pub id: String,
    pub name: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabEvent {
    Added { tab_id: String },
    Activated { tab_id: String },
    Deleted { tab_id: String },
    Copied { source_id: String, tab_id: String },
}

#[derive(Debug, Clone, Default)]
pub struct NewTab {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// Ordered tab list with a single active tab. Mutations queue [`TabEvent`]s
/// that the owner drains with [`TabRegistry::take_events`].
#[derive(Debug, Clone)]
pub struct TabRegistry {
    tabs: Vec<Tab>,
    visible_nav_bar: bool,
    events: Vec<TabEvent>,
}

impl Default for TabRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TabRegistry {
    pub fn new() -> Self {
        Self {
            tabs: Vec::new(),
            visible_nav_bar: true,
            events: Vec::new(),
        }
    }

    fn generate_id(&self) -> String {
        loop {
            let id = Uuid::new_v4().simple().to_string();
            if !self.contains(&id) {
                return id;
            }
        }
    }

    /// Appends a tab. The first tab of an empty registry becomes active
    /// without an activation event.
    pub fn create_tab(&mut self, options: NewTab) -> String {
        let id = match options.id {
            Some(id) if !id.is_empty() && !self.contains(&id) => id,
            Some(id) if !id.is_empty() => {
                log::warn!("tab id '{id}' already exists, generating a new one");
                self.generate_id()
            }
            _ => self.generate_id(),
        };
        let name = options
            .name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| id.clone());
        let is_active = self.tabs.is_empty();
        self.tabs.push(Tab {
            id: id.clone(),
            name,
            is_active,
        });
        self.events.push(TabEvent::Added { tab_id: id.clone() });
        id
    }

    pub fn activate_tab(&mut self, tab_id: &str) -> bool {
        if !self.contains(tab_id) {
            log::warn!("cannot activate unknown tab '{tab_id}'");
            return false;
        }
        for tab in &mut self.tabs {
            tab.is_active = tab.id == tab_id;
        }
        self.events.push(TabEvent::Activated {
            tab_id: tab_id.to_string(),
        });
        true
    }

    /// Removes a tab. When the active tab goes away, the tab that now sits at
    /// its position (or the new last tab) is activated.
    pub fn delete_tab(&mut self, tab_id: &str) -> bool {
        let Some(index) = self.tabs.iter().position(|tab| tab.id == tab_id) else {
            log::warn!("cannot delete unknown tab '{tab_id}'");
            return false;
        };
        let removed = self.tabs.remove(index);
        self.events.push(TabEvent::Deleted {
            tab_id: removed.id.clone(),
        });
        if removed.is_active && !self.tabs.is_empty() {
            let replacement = self.tabs[index.min(self.tabs.len() - 1)].id.clone();
            self.activate_tab(&replacement);
        }
        true
    }

    pub fn is_name_available(&self, tab_id: &str, name: &str) -> bool {
        !self
            .tabs
            .iter()
            .any(|tab| tab.id != tab_id && tab.name == name)
    }

    pub fn rename_tab(&mut self, tab_id: &str, new_name: &str) -> Result<(), WorkspaceCoreError> {
        if new_name.trim().is_empty() {
            log::warn!("rejecting empty name for tab '{tab_id}'");
            return Err(WorkspaceCoreError::EmptyTabName);
        }
        if !self.is_name_available(tab_id, new_name) {
            log::warn!("rejecting duplicate tab name '{new_name}'");
            return Err(WorkspaceCoreError::DuplicateTabName(new_name.to_string()));
        }
        let tab = self
            .tabs
            .iter_mut()
            .find(|tab| tab.id == tab_id)
            .ok_or_else(|| WorkspaceCoreError::UnknownTab(tab_id.to_string()))?;
        tab.name = new_name.to_string();
        Ok(())
    }

    /// Creates a tab named after `source_id` and queues a copy event; the
    /// owner is responsible for duplicating its contents.
    pub fn copy_tab(&mut self, source_id: &str) -> Option<String> {
        let Some(source) = self.get(source_id) else {
            log::warn!("cannot copy unknown tab '{source_id}'");
            return None;
        };
        let base = format!("{} (copy)", source.name);
        let mut name = base.clone();
        let mut counter = 2;
        while !self.is_name_available("", &name) {
            name = format!("{base} {counter}");
            counter += 1;
        }
        let tab_id = self.create_tab(NewTab {
            id: None,
            name: Some(name),
        });
        self.events.push(TabEvent::Copied {
            source_id: source_id.to_string(),
            tab_id: tab_id.clone(),
        });
        Some(tab_id)
    }

    pub fn clear(&mut self) {
        self.tabs.clear();
        self.events.clear();
        self.visible_nav_bar = true;
    }

    pub fn take_events(&mut self) -> Vec<TabEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn get(&self, tab_id: &str) -> Option<&Tab> {
        self.tabs.iter().find(|tab| tab.id == tab_id)
    }

    pub fn contains(&self, tab_id: &str) -> bool {
        self.get(tab_id).is_some()
    }

    pub fn active_tab(&self) -> Option<&Tab> {
        self.tabs.iter().find(|tab| tab.is_active)
    }

    pub fn active_tab_id(&self) -> Option<&str> {
        self.active_tab().map(|tab| tab.id.as_str())
    }

    pub fn first_tab_id(&self) -> Option<&str> {
        self.tabs.first().map(|tab| tab.id.as_str())
    }

    pub fn visible_nav_bar(&self) -> bool {
        self.visible_nav_bar
    }

    pub fn set_visible_nav_bar(&mut self, visible: bool) {
        self.visible_nav_bar = visible;
    }

    pub fn config(&self) -> TabPanelsConfig {
        TabPanelsConfig {
            tabs_options: self
                .tabs
                .iter()
                .map(|tab| TabOptions {
                    id: tab.id.clone(),
                    name: tab.name.clone(),
                    is_active: tab.is_active,
                })
                .collect(),
            visible_nav_bar: self.visible_nav_bar,
        }
    }
}
