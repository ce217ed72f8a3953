use serde_json::json;
use std::path::{Path, PathBuf};
use std::process::Command;

fn write_config(dir: &Path) -> PathBuf {
    let config = json!({
        "title": "Line 4",
        "column": 12,
        "editMode": false,
        "tabPanelsConfig": {
            "tabsOptions": [
                { "id": "main", "name": "Main", "isActive": true },
                { "id": "detail", "name": "Detail", "isActive": false }
            ],
            "visibleNavBar": true
        },
        "plugins": [
            {
                "guid": "EventSystem_1",
                "meta": { "name": "EventSystem", "version": "0.4.0", "type": "core" },
                "config": {
                    "subscriptions": [{
                        "event": { "guid": "Chart_1", "name": "Clicked" },
                        "action": { "guid": "TablePanel_1", "name": "Refresh" }
                    }]
                }
            },
            {
                "guid": "Chart_1",
                "meta": { "name": "Chart", "version": "1.2.0", "type": "panel" },
                "config": { "title": "Pressure" },
                "position": { "x": 0, "y": 0, "w": 6, "h": 8, "tabId": "main" }
            },
            {
                "guid": "TablePanel_1",
                "meta": { "name": "TablePanel", "version": "0.1.0", "type": "panel" },
                "config": {},
                "position": { "x": 0, "y": 0, "w": 12, "h": 6, "tabId": "detail" },
                "toFixPanel": true
            }
        ]
    });
    let path = dir.join("workspace.json");
    std::fs::write(&path, serde_json::to_string_pretty(&config).expect("serialize"))
        .expect("write config");
    path
}

#[test]
fn inspect_prints_the_loaded_workspace() {
    let exe = env!("CARGO_BIN_EXE_workspace-cli");
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(dir.path());

    let output = Command::new(exe)
        .arg("inspect")
        .arg(&config)
        .output()
        .expect("run inspect");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("title: Line 4"));
    assert!(stdout.contains("* tab Main"));
    assert!(stdout.contains("Chart v1.2.0 in 'Main'"));
    assert!(stdout.contains("DataTablePanel v0.3.0 pinned"));
    assert!(stdout.contains("Renamed 1 legacy panel(s)"));
    assert!(stdout.contains("subscriptions: 1 wired"));
}

#[test]
fn roundtrip_writes_a_stable_configuration() {
    let exe = env!("CARGO_BIN_EXE_workspace-cli");
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(dir.path());
    let out = dir.path().join("saved.json");

    let status = Command::new(exe)
        .arg("roundtrip")
        .arg(&config)
        .arg("--out")
        .arg(&out)
        .status()
        .expect("run roundtrip");
    assert!(status.success());

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).expect("read saved"))
            .expect("parse saved");
    assert_eq!(saved["title"], "Line 4");
    let plugins = saved["plugins"].as_array().expect("plugins");
    assert!(plugins.iter().any(|entry| entry["guid"] == "DataTablePanel_1"));
    assert!(!plugins.iter().any(|entry| entry["guid"] == "TablePanel_1"));
}

#[test]
fn missing_configuration_fails() {
    let exe = env!("CARGO_BIN_EXE_workspace-cli");
    let dir = tempfile::tempdir().expect("tempdir");
    let output = Command::new(exe)
        .arg("inspect")
        .arg(dir.path().join("absent.json"))
        .output()
        .expect("run inspect");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("[Workspace][ERROR]"));
}

#[test]
fn roundtrip_without_out_prints_json() {
    let exe = env!("CARGO_BIN_EXE_workspace-cli");
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(dir.path());
    let output = Command::new(exe)
        .arg("roundtrip")
        .arg(&config)
        .output()
        .expect("run roundtrip");
    assert!(output.status.success());
    let saved: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is json");
    assert_eq!(saved["column"], 12);
}

#[test]
fn verbose_flag_enables_debug_logs() {
    let exe = env!("CARGO_BIN_EXE_workspace-cli");
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(dir.path());

    let quiet = Command::new(exe)
        .arg("inspect")
        .arg(&config)
        .output()
        .expect("run inspect");
    assert!(!String::from_utf8_lossy(&quiet.stderr).contains("[Workspace][DEBUG]"));

    let verbose = Command::new(exe)
        .arg("inspect")
        .arg(&config)
        .arg("--verbose")
        .output()
        .expect("run inspect");
    assert!(verbose.status.success());
    let stderr = String::from_utf8_lossy(&verbose.stderr);
    assert!(stderr.contains("[Workspace][DEBUG] renamed 1 reference(s) from 'TablePanel_1'"));
}
