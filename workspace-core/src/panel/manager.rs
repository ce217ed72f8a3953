use super::types::{Availability, Panel, PanelRequest, Resolution};
use crate::error::WorkspaceCoreError;
use crate::host::{InstallRequest, PluginRuntime};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use workspace::PluginMeta;

/// Owns the live panel instances and the substitution answers given during
/// this session.
#[derive(Debug, Default)]
pub struct PanelLifecycleManager {
    panels: Vec<Panel>,
    decisions: HashMap<(String, String), bool>,
}

/// Compares dotted version strings numerically where both parts are numbers.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (Some(_), None) => return Ordering::Greater,
            (None, Some(_)) => return Ordering::Less,
            (Some(l), Some(r)) => {
                let ordering = match (l.parse::<u64>(), r.parse::<u64>()) {
                    (Ok(l), Ok(r)) => l.cmp(&r),
                    _ => l.cmp(r),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

pub fn preferred_version(versions: &[String]) -> Option<String> {
    versions
        .iter()
        .max_by(|a, b| compare_versions(a, b))
        .cloned()
}

/// `name_N` with N one above the highest suffix already taken for `name`.
pub fn next_guid<'a>(name: &str, taken: impl IntoIterator<Item = &'a str>) -> String {
    let prefix = format!("{name}_");
    let max = taken
        .into_iter()
        .filter_map(|guid| guid.strip_prefix(&prefix))
        .filter_map(|suffix| suffix.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    format!("{name}_{}", max + 1)
}

pub fn availability(runtime: &dyn PluginRuntime, name: &str, version: &str) -> Availability {
    let versions = runtime.installed_versions(name);
    if versions.iter().any(|installed| installed == version) {
        return Availability::Exact;
    }
    match preferred_version(&versions) {
        Some(available) => Availability::Mismatch { available },
        None => Availability::Missing,
    }
}

impl PanelLifecycleManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cached_decision(&self, name: &str, requested: &str) -> Option<bool> {
        self.decisions
            .get(&(name.to_string(), requested.to_string()))
            .copied()
    }

    pub fn record_decision(&mut self, name: &str, requested: &str, accepted: bool) {
        self.decisions
            .insert((name.to_string(), requested.to_string()), accepted);
    }

    /// Resolution for a saved entry. Mismatches already answered in this
    /// session reuse the answer instead of asking again.
    pub fn resolve(&self, runtime: &dyn PluginRuntime, name: &str, version: &str) -> Resolution {
        match availability(runtime, name, version) {
            Availability::Exact => Resolution::Exact {
                version: version.to_string(),
            },
            Availability::Missing => Resolution::NotInstalled {
                requested: version.to_string(),
            },
            Availability::Mismatch { available } => {
                let mut resolution = Resolution::Undecided {
                    requested: version.to_string(),
                    available,
                };
                if let Some(accepted) = self.cached_decision(name, version) {
                    resolution.decide(accepted);
                }
                resolution
            }
        }
    }

    /// Installs a panel. When `guid` is omitted one is generated from the
    /// panels this manager already holds.
    pub fn instantiate(
        &mut self,
        runtime: &mut dyn PluginRuntime,
        request: PanelRequest<'_>,
    ) -> Result<&Panel, WorkspaceCoreError> {
        let guid = match request.guid {
            Some(guid) => guid.to_string(),
            None => next_guid(request.name, self.panels.iter().map(|p| p.guid.as_str())),
        };
        let installed = runtime.install_panel(InstallRequest {
            name: request.name,
            version: request.version,
            guid: &guid,
            selector: &request.selector,
        })?;
        if installed.capabilities.config && !request.config.is_null() {
            if let Err(err) = runtime.apply_config(&installed.guid, request.config) {
                log::warn!("panel '{}' rejected its saved config: {err}", installed.guid);
            }
        }
        log::debug!(
            "installed panel {} v{} as '{}'",
            request.name,
            request.version,
            installed.guid
        );
        self.panels.push(Panel {
            guid: installed.guid,
            meta: PluginMeta::panel(request.name, request.version),
            requested_version: request
                .requested_version
                .filter(|requested| *requested != request.version)
                .map(str::to_string),
            capabilities: installed.capabilities,
            to_fix_panel: request.to_fix_panel,
            undeletable: request.undeletable,
            initial_config: request.config.clone(),
        });
        let index = self.panels.len() - 1;
        Ok(&self.panels[index])
    }

    pub fn teardown(&mut self, runtime: &mut dyn PluginRuntime, guid: &str) -> Option<Panel> {
        let index = self.panels.iter().position(|panel| panel.guid == guid)?;
        let panel = self.panels.remove(index);
        if let Err(err) = runtime.uninstall_by_guid(guid) {
            log::warn!("failed to uninstall panel '{guid}': {err}");
        }
        Some(panel)
    }

    pub fn teardown_all(&mut self, runtime: &mut dyn PluginRuntime) -> Vec<Panel> {
        let panels = std::mem::take(&mut self.panels);
        for panel in &panels {
            if let Err(err) = runtime.uninstall_by_guid(&panel.guid) {
                log::warn!("failed to uninstall panel '{}': {err}", panel.guid);
            }
        }
        panels
    }

    pub fn set_visible(&self, runtime: &mut dyn PluginRuntime, guid: &str, visible: bool) {
        if let Some(panel) = self.get(guid) {
            if panel.capabilities.visibility {
                runtime.set_visible(guid, visible);
            }
        }
    }

    /// Current configuration of a panel, falling back to the one it was
    /// created with.
    pub fn export_config(&self, runtime: &dyn PluginRuntime, guid: &str) -> Value {
        let Some(panel) = self.get(guid) else {
            return Value::Null;
        };
        if panel.capabilities.config {
            if let Some(config) = runtime.export_config(guid) {
                return config;
            }
        }
        panel.initial_config.clone()
    }

    pub fn get(&self, guid: &str) -> Option<&Panel> {
        self.panels.iter().find(|panel| panel.guid == guid)
    }

    pub fn get_mut(&mut self, guid: &str) -> Option<&mut Panel> {
        self.panels.iter_mut().find(|panel| panel.guid == guid)
    }

    pub fn contains(&self, guid: &str) -> bool {
        self.get(guid).is_some()
    }

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }
}
