use std::fmt;
use workspace::{Configuration, Rect};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PanelSummary {
    pub tab: String,
    pub name: String,
    pub version: String,
    pub rect: Option<(u32, u32, u32, u32)>,
    pub pinned: bool,
}

/// What a user can observe of a configuration, independent of guids and
/// tab ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationSummary {
    pub title: String,
    pub column: Option<u32>,
    pub edit_mode: bool,
    pub tabs: Vec<String>,
    pub active_tab: Option<String>,
    pub panels: Vec<PanelSummary>,
}

impl ConfigurationSummary {
    pub fn of(configuration: &Configuration) -> Self {
        let tabs = configuration.tab_panels_config.clone().unwrap_or_default();
        let tab_name = |id: &str| {
            tabs.tabs_options
                .iter()
                .find(|tab| tab.id == id)
                .map(|tab| tab.name.clone())
                .unwrap_or_default()
        };
        let mut panels: Vec<PanelSummary> = configuration
            .panels()
            .map(|entry| PanelSummary {
                tab: if entry.to_fix_panel {
                    String::new()
                } else {
                    entry.tab_id().map(tab_name).unwrap_or_default()
                },
                name: entry.meta.name.clone(),
                version: entry.meta.version.clone(),
                rect: entry.position.as_ref().map(|p| {
                    let Rect { x, y, w, h } = p.rect();
                    (x, y, w, h)
                }),
                pinned: entry.to_fix_panel,
            })
            .collect();
        panels.sort();
        Self {
            title: configuration.title.clone(),
            column: configuration.column,
            edit_mode: configuration.edit_mode,
            tabs: tabs.tabs_options.iter().map(|tab| tab.name.clone()).collect(),
            active_tab: tabs
                .tabs_options
                .iter()
                .find(|tab| tab.is_active)
                .map(|tab| tab.name.clone()),
            panels,
        }
    }
}

impl fmt::Display for ConfigurationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "title: {}", self.title)?;
        if let Some(column) = self.column {
            writeln!(f, "columns: {column}")?;
        }
        writeln!(f, "edit mode: {}", self.edit_mode)?;
        for tab in &self.tabs {
            let marker = if self.active_tab.as_deref() == Some(tab.as_str()) {
                "*"
            } else {
                " "
            };
            writeln!(f, "{marker} tab {tab}")?;
        }
        for panel in &self.panels {
            let place = if panel.pinned {
                "pinned".to_string()
            } else {
                format!("in '{}'", panel.tab)
            };
            match panel.rect {
                Some((x, y, w, h)) => writeln!(
                    f,
                    "  {} v{} {place} at {x},{y} {w}x{h}",
                    panel.name, panel.version
                )?,
                None => writeln!(f, "  {} v{} {place}", panel.name, panel.version)?,
            }
        }
        Ok(())
    }
}
