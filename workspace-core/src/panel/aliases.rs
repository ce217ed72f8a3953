use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use workspace::{rename_guid_references, PluginEntry, Subscription};

/// Maps a retired panel name onto its replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyAlias {
    pub from: String,
    pub to: String,
    pub version: String,
}

impl LegacyAlias {
    pub fn new(from: &str, to: &str, version: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            version: version.to_string(),
        }
    }
}

pub fn default_aliases() -> Vec<LegacyAlias> {
    vec![
        LegacyAlias::new("TablePanel", "DataTablePanel", "0.3.0"),
        LegacyAlias::new("TextAreaPanel", "TextEditorPanel", "0.2.0"),
    ]
}

/// Rewrites aliased panel entries in place. A guid of the form `Old_N`
/// becomes `New_N` unless that guid is already taken, and subscriptions
/// follow the rename. Returns the number of entries rewritten.
pub fn apply_aliases(
    aliases: &[LegacyAlias],
    plugins: &mut [PluginEntry],
    subscriptions: &mut [Subscription],
) -> usize {
    let mut taken: HashSet<String> = plugins.iter().map(|entry| entry.guid.clone()).collect();
    let mut rewritten = 0;
    for entry in plugins.iter_mut().filter(|entry| entry.is_panel()) {
        let Some(alias) = aliases.iter().find(|alias| alias.from == entry.meta.name) else {
            continue;
        };
        log::info!(
            "panel {} v{} is now {} v{}",
            entry.meta.name,
            entry.meta.version,
            alias.to,
            alias.version
        );
        entry.meta.name = alias.to.clone();
        entry.meta.version = alias.version.clone();
        rewritten += 1;

        let Some(suffix) = entry.guid.strip_prefix(&format!("{}_", alias.from)) else {
            continue;
        };
        let renamed = format!("{}_{suffix}", alias.to);
        if taken.contains(&renamed) {
            log::warn!("keeping guid '{}', '{renamed}' is taken", entry.guid);
            continue;
        }
        rename_guid_references(subscriptions, &entry.guid, &renamed);
        taken.remove(&entry.guid);
        taken.insert(renamed.clone());
        entry.guid = renamed;
    }
    rewritten
}
