use crate::host::{PanelCapabilities, SubstitutionRequest};
use serde_json::Value;
use workspace::PluginMeta;

/// A live panel instance bound to one real grid cell (or to the modal).
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub guid: String,
    pub meta: PluginMeta,
    /// Version the configuration asked for when a substitute is running.
    pub requested_version: Option<String>,
    pub capabilities: PanelCapabilities,
    pub to_fix_panel: bool,
    pub undeletable: bool,
    /// Configuration the instance was created with. Saved as-is when the
    /// panel cannot export its own.
    pub initial_config: Value,
}

impl Panel {
    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn version(&self) -> &str {
        &self.meta.version
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Exact,
    Mismatch { available: String },
    Missing,
}

/// Which version, if any, a saved panel entry will run on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Exact {
        version: String,
    },
    Substituted {
        requested: String,
        version: String,
    },
    /// A different version is installed and the user has not answered yet.
    Undecided {
        requested: String,
        available: String,
    },
    Declined {
        requested: String,
        available: String,
    },
    NotInstalled {
        requested: String,
    },
}

impl Resolution {
    pub fn version_to_install(&self) -> Option<&str> {
        match self {
            Resolution::Exact { version } | Resolution::Substituted { version, .. } => {
                Some(version)
            }
            _ => None,
        }
    }

    pub fn requested_version(&self) -> &str {
        match self {
            Resolution::Exact { version } => version,
            Resolution::Substituted { requested, .. }
            | Resolution::Undecided { requested, .. }
            | Resolution::Declined { requested, .. }
            | Resolution::NotInstalled { requested } => requested,
        }
    }

    pub fn substitution(&self, name: &str) -> Option<SubstitutionRequest> {
        match self {
            Resolution::Substituted {
                requested,
                version: available,
            }
            | Resolution::Undecided {
                requested,
                available,
            } => Some(SubstitutionRequest {
                name: name.to_string(),
                requested_version: requested.clone(),
                available_version: available.clone(),
            }),
            _ => None,
        }
    }

    /// Settles an `Undecided` resolution; other states are left alone.
    pub fn decide(&mut self, accepted: bool) {
        if let Resolution::Undecided {
            requested,
            available,
        } = self
        {
            let requested = std::mem::take(requested);
            let available = std::mem::take(available);
            *self = if accepted {
                Resolution::Substituted {
                    requested,
                    version: available,
                }
            } else {
                Resolution::Declined {
                    requested,
                    available,
                }
            };
        }
    }
}

#[derive(Debug, Clone)]
pub struct PanelRequest<'a> {
    pub name: &'a str,
    pub version: &'a str,
    pub requested_version: Option<&'a str>,
    pub guid: Option<&'a str>,
    pub selector: String,
    pub to_fix_panel: bool,
    pub undeletable: bool,
    pub config: &'a Value,
}
