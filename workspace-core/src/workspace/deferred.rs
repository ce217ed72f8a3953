use crate::panel::Resolution;
use workspace::PluginEntry;

/// A saved panel waiting for its tab to be shown.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingPanel {
    /// Entry after legacy aliases were applied. Written back untouched on
    /// save.
    pub entry: PluginEntry,
    pub tab_id: String,
    pub resolution: Resolution,
}

#[derive(Debug, Default)]
pub struct DeferredActivation {
    enabled: bool,
    pending: Vec<PendingPanel>,
}

impl DeferredActivation {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            pending: Vec::new(),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Pinned panels are visible everywhere and never wait.
    pub fn should_defer(&self, entry: &PluginEntry, tab_id: &str, active_tab: &str) -> bool {
        self.enabled && !entry.to_fix_panel && tab_id != active_tab
    }

    pub fn hold(&mut self, panel: PendingPanel) {
        log::debug!(
            "deferring panel '{}' until tab '{}' is shown",
            panel.entry.guid,
            panel.tab_id
        );
        self.pending.push(panel);
    }

    /// Removes and returns the panels waiting on `tab_id`, in load order.
    pub fn take_for_tab(&mut self, tab_id: &str) -> Vec<PendingPanel> {
        let (ready, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|panel| panel.tab_id == tab_id);
        self.pending = waiting;
        ready
    }

    pub fn is_pending(&self, saved_guid: &str) -> bool {
        self.pending
            .iter()
            .any(|panel| panel.entry.guid == saved_guid)
    }

    pub fn pending(&self) -> &[PendingPanel] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
