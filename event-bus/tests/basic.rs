use event_bus::{
    validate_subscription, Endpoint, EventBus, EventBusError, EventSystemConfig,
    InProcessEventBus, Subscription, SubscriptionRuleError,
};
use serde_json::json;

fn subscription(event_guid: &str, event: &str, action_guid: &str, action: &str) -> Subscription {
    Subscription::new(Endpoint::new(event_guid, event), Endpoint::new(action_guid, action))
}

#[test]
fn publish_queues_matching_actions_in_order() {
    let mut bus = InProcessEventBus::new();
    bus.subscribe(subscription("Table_1", "RowClicked", "Chart_1", "highlight"))
        .unwrap();
    bus.subscribe(subscription("Table_1", "RowClicked", "Text_1", "show"))
        .unwrap();
    bus.subscribe(subscription("Table_1", "Other", "Text_1", "hide"))
        .unwrap();

    let queued = bus
        .publish_event("Table_1", "RowClicked", json!({"row": 3}))
        .unwrap();
    assert_eq!(queued, 2);

    let first = bus.try_recv().unwrap().expect("first invocation");
    assert_eq!(first.guid, "Chart_1");
    assert_eq!(first.action, "highlight");
    assert_eq!(first.payload, json!({"row": 3}));
    let second = bus.try_recv().unwrap().expect("second invocation");
    assert_eq!(second.guid, "Text_1");
    assert!(bus.try_recv().unwrap().is_none());
}

#[test]
fn publish_rejects_event_not_registered_for_known_instance() {
    let mut bus = InProcessEventBus::new();
    bus.register_plugin_instance("Table_1", &["RowClicked"]);
    let err = bus
        .publish_event("Table_1", "Unknown", json!(null))
        .unwrap_err();
    assert!(matches!(err, EventBusError::UnregisteredEvent { .. }));
    assert_eq!(bus.publish_event("Table_1", "RowClicked", json!(null)).unwrap(), 0);
}

#[test]
fn subscription_rules() {
    let existing = vec![subscription("a", "E", "b", "A")];
    assert_eq!(
        validate_subscription(&existing, &subscription("a", "E", "b", "A")).unwrap_err(),
        SubscriptionRuleError::Duplicate
    );
    assert_eq!(
        validate_subscription(&existing, &subscription("", "E", "b", "A")).unwrap_err(),
        SubscriptionRuleError::EmptyGuid
    );
    assert_eq!(
        validate_subscription(&existing, &subscription("a", "E", "b", "")).unwrap_err(),
        SubscriptionRuleError::EmptyName
    );
    assert!(validate_subscription(&existing, &subscription("a", "E", "c", "A")).is_ok());
}

#[test]
fn set_plugin_config_replaces_and_skips_invalid() {
    let mut bus = InProcessEventBus::new();
    bus.subscribe(subscription("old", "E", "old2", "A")).unwrap();

    let accepted = bus.set_plugin_config(EventSystemConfig {
        events: vec![json!({"name": "RowClicked"})],
        actions: Vec::new(),
        subscriptions: vec![
            subscription("a", "E", "b", "A"),
            subscription("a", "E", "b", "A"),
            subscription("", "E", "b", "A"),
        ],
    });
    assert_eq!(accepted, 1);
    let config = bus.plugin_config();
    assert_eq!(config.subscriptions.len(), 1);
    assert_eq!(config.events.len(), 1);
}

#[test]
fn unregister_instance_removes_its_subscriptions() {
    let mut bus = InProcessEventBus::new();
    bus.register_custom_action("ws", "compactAllPanels");
    bus.subscribe(subscription("a", "E", "b", "A")).unwrap();
    bus.subscribe(subscription("c", "E", "d", "A")).unwrap();
    assert!(bus.has_action("ws", "compactAllPanels"));

    bus.unregister_instance("b");
    bus.unregister_instance("ws");
    assert_eq!(bus.subscriptions().len(), 1);
    assert!(!bus.has_action("ws", "compactAllPanels"));
}

#[test]
fn event_args_travel_with_invocation() {
    let mut bus = InProcessEventBus::new();
    let mut sub = subscription("a", "E", "b", "A");
    sub.event.args = Some(json!(["a"]));
    bus.subscribe(sub).unwrap();
    bus.publish_event("a", "E", json!(1)).unwrap();
    let drained = bus.drain();
    assert_eq!(drained.len(), 1);
    assert_eq!(drained[0].args, Some(json!(["a"])));
}

#[test]
fn config_from_null_is_empty() {
    let config = EventSystemConfig::from_value(&serde_json::Value::Null).unwrap();
    assert!(config.subscriptions.is_empty());
}
