use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub guid: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Value>,
}

impl Endpoint {
    pub fn new(guid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            guid: guid.into(),
            name: name.into(),
            args: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub event: Endpoint,
    pub action: Endpoint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_name: Option<String>,
}

impl Subscription {
    pub fn new(event: Endpoint, action: Endpoint) -> Self {
        Self {
            event,
            action,
            subscription_name: None,
        }
    }

    pub fn references(&self, guid: &str) -> bool {
        self.event.guid == guid || self.action.guid == guid
    }
}

/// Configuration block the event system persists inside a workspace
/// configuration: declared events, actions and the subscriptions between them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventSystemConfig {
    #[serde(default)]
    pub events: Vec<Value>,
    #[serde(default)]
    pub actions: Vec<Value>,
    #[serde(default)]
    pub subscriptions: Vec<Subscription>,
}

impl EventSystemConfig {
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value.clone())
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// An action the bus resolved for a published event, queued for the host to
/// deliver to the instance identified by `guid`.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionInvocation {
    pub guid: String,
    pub action: String,
    pub source_guid: String,
    pub event: String,
    pub payload: Value,
    pub args: Option<Value>,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SubscriptionRuleError {
    #[error("subscription endpoint guid is empty")]
    EmptyGuid,
    #[error("subscription endpoint name is empty")]
    EmptyName,
    #[error("subscription between these endpoints already exists")]
    Duplicate,
}

#[derive(thiserror::Error, Debug)]
pub enum EventBusError {
    #[error("invalid subscription: {0}")]
    Rule(#[from] SubscriptionRuleError),
    #[error("event '{name}' is not registered for instance '{guid}'")]
    UnregisteredEvent { guid: String, name: String },
    #[error("send failed")]
    SendFailed,
    #[error("receive failed")]
    RecvFailed,
}

pub fn validate_subscription(
    existing: &[Subscription],
    candidate: &Subscription,
) -> Result<(), SubscriptionRuleError> {
    if candidate.event.guid.is_empty() || candidate.action.guid.is_empty() {
        return Err(SubscriptionRuleError::EmptyGuid);
    }
    if candidate.event.name.is_empty() || candidate.action.name.is_empty() {
        return Err(SubscriptionRuleError::EmptyName);
    }
    if existing.iter().any(|sub| {
        sub.event.guid == candidate.event.guid
            && sub.event.name == candidate.event.name
            && sub.action.guid == candidate.action.guid
            && sub.action.name == candidate.action.name
    }) {
        return Err(SubscriptionRuleError::Duplicate);
    }
    Ok(())
}

pub trait EventBus {
    fn subscribe(&mut self, subscription: Subscription) -> Result<(), EventBusError>;

    /// Publishes `name` on behalf of `source_guid` and returns how many
    /// actions were queued.
    fn publish_event(
        &mut self,
        source_guid: &str,
        name: &str,
        payload: Value,
    ) -> Result<usize, EventBusError>;

    fn register_plugin_instance(&mut self, guid: &str, events: &[&str]);

    fn register_custom_action(&mut self, guid: &str, name: &str);

    /// Drops every registration and subscription that references `guid`.
    fn unregister_instance(&mut self, guid: &str);

    /// Replaces the whole configuration in one call. Subscriptions that break
    /// a rule are skipped; returns the number accepted.
    fn set_plugin_config(&mut self, config: EventSystemConfig) -> usize;

    fn plugin_config(&self) -> EventSystemConfig;
}

#[derive(Debug)]
pub struct InProcessEventBus {
    events: Vec<Value>,
    actions: Vec<Value>,
    subscriptions: Vec<Subscription>,
    instances: HashMap<String, Vec<String>>,
    custom_actions: HashMap<String, Vec<String>>,
    sender: Sender<ActionInvocation>,
    receiver: Receiver<ActionInvocation>,
}

impl Default for InProcessEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl InProcessEventBus {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            events: Vec::new(),
            actions: Vec::new(),
            subscriptions: Vec::new(),
            instances: HashMap::new(),
            custom_actions: HashMap::new(),
            sender,
            receiver,
        }
    }

    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    pub fn has_action(&self, guid: &str, name: &str) -> bool {
        self.custom_actions
            .get(guid)
            .map(|names| names.iter().any(|n| n == name))
            .unwrap_or(false)
    }

    pub fn try_recv(&self) -> Result<Option<ActionInvocation>, EventBusError> {
        match self.receiver.try_recv() {
            Ok(value) => Ok(Some(value)),
            Err(mpsc::TryRecvError::Empty) => Ok(None),
            Err(mpsc::TryRecvError::Disconnected) => Err(EventBusError::RecvFailed),
        }
    }

    pub fn drain(&self) -> Vec<ActionInvocation> {
        let mut drained = Vec::new();
        while let Ok(Some(invocation)) = self.try_recv() {
            drained.push(invocation);
        }
        drained
    }
}

impl EventBus for InProcessEventBus {
    fn subscribe(&mut self, subscription: Subscription) -> Result<(), EventBusError> {
        validate_subscription(&self.subscriptions, &subscription)?;
        log::debug!(
            "subscribe {}[{}] -> {}[{}]",
            subscription.event.name,
            subscription.event.guid,
            subscription.action.name,
            subscription.action.guid
        );
        self.subscriptions.push(subscription);
        Ok(())
    }

    fn publish_event(
        &mut self,
        source_guid: &str,
        name: &str,
        payload: Value,
    ) -> Result<usize, EventBusError> {
        if let Some(events) = self.instances.get(source_guid) {
            if !events.iter().any(|event| event == name) {
                return Err(EventBusError::UnregisteredEvent {
                    guid: source_guid.to_string(),
                    name: name.to_string(),
                });
            }
        }
        let mut queued = 0;
        for sub in &self.subscriptions {
            if sub.event.guid != source_guid || sub.event.name != name {
                continue;
            }
            let invocation = ActionInvocation {
                guid: sub.action.guid.clone(),
                action: sub.action.name.clone(),
                source_guid: source_guid.to_string(),
                event: name.to_string(),
                payload: payload.clone(),
                args: sub.event.args.clone(),
            };
            self.sender
                .send(invocation)
                .map_err(|_| EventBusError::SendFailed)?;
            queued += 1;
        }
        Ok(queued)
    }

    fn register_plugin_instance(&mut self, guid: &str, events: &[&str]) {
        let entry = self.instances.entry(guid.to_string()).or_default();
        for event in events {
            if !entry.iter().any(|e| e == event) {
                entry.push(event.to_string());
            }
        }
    }

    fn register_custom_action(&mut self, guid: &str, name: &str) {
        let entry = self.custom_actions.entry(guid.to_string()).or_default();
        if !entry.iter().any(|n| n == name) {
            entry.push(name.to_string());
        }
    }

    fn unregister_instance(&mut self, guid: &str) {
        self.instances.remove(guid);
        self.custom_actions.remove(guid);
        self.subscriptions.retain(|sub| !sub.references(guid));
    }

    fn set_plugin_config(&mut self, config: EventSystemConfig) -> usize {
        self.events = config.events;
        self.actions = config.actions;
        self.subscriptions.clear();
        for subscription in config.subscriptions {
            if let Err(err) = validate_subscription(&self.subscriptions, &subscription) {
                log::warn!(
                    "skipping subscription {}[{}] -> {}[{}]: {err}",
                    subscription.event.name,
                    subscription.event.guid,
                    subscription.action.name,
                    subscription.action.guid
                );
                continue;
            }
            self.subscriptions.push(subscription);
        }
        self.subscriptions.len()
    }

    fn plugin_config(&self) -> EventSystemConfig {
        EventSystemConfig {
            events: self.events.clone(),
            actions: self.actions.clone(),
            subscriptions: self.subscriptions.clone(),
        }
    }
}
