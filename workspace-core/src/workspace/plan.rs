use crate::host::SubstitutionRequest;
use crate::panel::Resolution;
use workspace::{Configuration, EventSystemConfig, PluginEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconcilePhase {
    #[default]
    Idle,
    Resolving,
    Resetting,
    BuildingTabs,
    BuildingPanels,
    WiringSubscriptions,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlannedEntry {
    Core(PluginEntry),
    Panel {
        entry: PluginEntry,
        resolution: Resolution,
    },
}

/// Everything a load needs once version questions are answered. Building
/// it touches no live state.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadPlan {
    /// Header fields of the configuration; `plugins` is emptied.
    pub configuration: Configuration,
    pub entries: Vec<PlannedEntry>,
    pub event_system: Option<EventSystemConfig>,
    pub aliased: usize,
}

impl LoadPlan {
    /// Open substitution questions, one per (name, requested version).
    pub fn undecided(&self) -> Vec<SubstitutionRequest> {
        let mut requests: Vec<SubstitutionRequest> = Vec::new();
        for planned in &self.entries {
            let PlannedEntry::Panel {
                entry,
                resolution: resolution @ Resolution::Undecided { .. },
            } = planned
            else {
                continue;
            };
            let Some(request) = resolution.substitution(&entry.meta.name) else {
                continue;
            };
            if !requests.iter().any(|known| {
                known.name == request.name && known.requested_version == request.requested_version
            }) {
                requests.push(request);
            }
        }
        requests
    }

    pub fn decide(&mut self, request: &SubstitutionRequest, accepted: bool) {
        for planned in &mut self.entries {
            if let PlannedEntry::Panel { entry, resolution } = planned {
                if entry.meta.name == request.name
                    && resolution.requested_version() == request.requested_version
                {
                    resolution.decide(accepted);
                }
            }
        }
    }

    pub fn panel_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|planned| matches!(planned, PlannedEntry::Panel { .. }))
            .count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub tabs: usize,
    pub active_tab: Option<String>,
    pub panels: usize,
    pub deferred: usize,
    /// `name vVERSION` of every entry left as an error placeholder.
    pub missing: Vec<String>,
    pub substituted: Vec<SubstitutionRequest>,
    pub aliased: usize,
    pub subscriptions_wired: usize,
    pub subscriptions_held: usize,
    pub subscriptions_dropped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied(LoadReport),
    /// A newer load started while this one waited; nothing was applied.
    Superseded,
}

impl LoadOutcome {
    pub fn report(&self) -> Option<&LoadReport> {
        match self {
            LoadOutcome::Applied(report) => Some(report),
            LoadOutcome::Superseded => None,
        }
    }
}
