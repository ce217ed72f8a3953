use crate::Subscription;
use serde_json::Value;
use std::collections::HashMap;

/// Saved-guid to runtime-guid translation built while a configuration loads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuidMap {
    entries: HashMap<String, String>,
}

impl GuidMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, saved: impl Into<String>, runtime: impl Into<String>) {
        self.entries.insert(saved.into(), runtime.into());
    }

    pub fn resolve(&self, saved: &str) -> Option<&str> {
        self.entries.get(saved).map(String::as_str)
    }

    /// Reverse lookup: the saved guid a runtime guid was produced from.
    pub fn saved_for(&self, runtime: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, value)| value.as_str() == runtime)
            .map(|(key, _)| key.as_str())
    }

    pub fn contains(&self, saved: &str) -> bool {
        self.entries.contains_key(saved)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemapOutcome {
    pub resolved: Vec<Subscription>,
    pub unresolved: Vec<Subscription>,
}

/// Rewrites both endpoint guids through `map`. A subscription with either
/// side missing from the map lands in `unresolved` untouched.
pub fn remap_subscriptions(subscriptions: &[Subscription], map: &GuidMap) -> RemapOutcome {
    let mut outcome = RemapOutcome::default();
    for sub in subscriptions {
        match (map.resolve(&sub.event.guid), map.resolve(&sub.action.guid)) {
            (Some(event_guid), Some(action_guid)) => {
                let mut remapped = sub.clone();
                remapped.event.guid = event_guid.to_string();
                remapped.action.guid = action_guid.to_string();
                outcome.resolved.push(remapped);
            }
            _ => {
                log::debug!(
                    "no live guid for subscription {}.{} -> {}.{}",
                    sub.event.guid,
                    sub.event.name,
                    sub.action.guid,
                    sub.action.name
                );
                outcome.unresolved.push(sub.clone());
            }
        }
    }
    outcome
}

/// Replaces every textual reference to `old` (endpoint guids and string
/// event arguments, nested included) with `new`. Returns the number of
/// replacements.
pub fn rename_guid_references(subscriptions: &mut [Subscription], old: &str, new: &str) -> usize {
    let mut replaced = 0;
    for sub in subscriptions.iter_mut() {
        for endpoint in [&mut sub.event, &mut sub.action] {
            if endpoint.guid == old {
                endpoint.guid = new.to_string();
                replaced += 1;
            }
            if let Some(args) = endpoint.args.as_mut() {
                replaced += rename_in_value(args, old, new);
            }
        }
    }
    if replaced > 0 {
        log::debug!("renamed {replaced} reference(s) from '{old}' to '{new}'");
    }
    replaced
}

fn rename_in_value(value: &mut Value, old: &str, new: &str) -> usize {
    match value {
        Value::String(text) if text == old => {
            *text = new.to_string();
            1
        }
        Value::Array(items) => items
            .iter_mut()
            .map(|item| rename_in_value(item, old, new))
            .sum(),
        Value::Object(map) => map
            .values_mut()
            .map(|item| rename_in_value(item, old, new))
            .sum(),
        _ => 0,
    }
}
