use crate::commands::Commands;
use crate::output::*;
use std::path::{Path, PathBuf};
use workspace::Configuration;
use workspace_core::headless::HeadlessHost;
use workspace_core::panel::apply_aliases;
use workspace_core::workspace::SettingsError;
use workspace_core::{ConfigurationSummary, LoadReport, Workspace, WorkspaceSettings};

pub fn handle_command(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Inspect {
            config,
            settings,
            deferred,
            json,
        } => {
            let mut settings = load_settings(settings.as_deref())?;
            if deferred {
                settings.deferred_activation = true;
            }
            inspect(&config, &settings, json)?
        }
        Commands::Roundtrip {
            config,
            settings,
            out,
        } => {
            let settings = load_settings(settings.as_deref())?;
            roundtrip(&config, &settings, out)?
        }
    }
    Ok(())
}

fn load_settings(path: Option<&Path>) -> Result<WorkspaceSettings, SettingsError> {
    match path {
        Some(path) => WorkspaceSettings::load_from_file(path),
        None => Ok(WorkspaceSettings::default()),
    }
}

/// A host where every plugin the configuration names is installed at the
/// version it was saved with.
fn host_for(configuration: &Configuration, settings: &WorkspaceSettings) -> HeadlessHost {
    let host = HeadlessHost::new();
    let mut plugins = configuration.plugins.clone();
    apply_aliases(&settings.aliases, &mut plugins, &mut []);
    for entry in &plugins {
        if entry.is_panel() {
            host.runtime.add_plugin(&entry.meta.name, &entry.meta.version);
        } else if entry.meta.name != settings.event_system_name
            && entry.meta.name != settings.workspace_system_name
        {
            host.systems
                .add_system(&entry.meta.name, &entry.meta.version, &entry.guid);
        }
    }
    host
}

fn load(
    configuration: Configuration,
    settings: &WorkspaceSettings,
) -> (HeadlessHost, Workspace, LoadReport) {
    let host = host_for(&configuration, settings);
    let mut workspace = host.workspace(settings.clone());
    let report = workspace.load_with(configuration, |request| {
        log::warn!(
            "running {} v{} in place of v{}",
            request.name,
            request.available_version,
            request.requested_version
        );
        true
    });
    (host, workspace, report)
}

fn inspect(
    path: &Path,
    settings: &WorkspaceSettings,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let configuration = Configuration::load_from_file(path)?;
    let (_host, mut workspace, report) = load(configuration, settings);
    let saved = workspace.save_configuration();
    if json {
        println!("{}", serde_json::to_string_pretty(&saved)?);
        return Ok(());
    }
    print_report(&report);
    print_summary("Workspace", &ConfigurationSummary::of(&saved));
    Ok(())
}

fn roundtrip(
    path: &Path,
    settings: &WorkspaceSettings,
    out: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let configuration = Configuration::load_from_file(path)?;
    let (_host, mut first, report) = load(configuration, settings);
    let saved = first.save_configuration();

    let (_host, mut second, _) = load(saved.clone(), settings);
    let resaved = second.save_configuration();
    let before = ConfigurationSummary::of(&saved);
    let after = ConfigurationSummary::of(&resaved);
    if before != after {
        print_summary("First save", &before);
        print_summary("Second save", &after);
        return Err("configuration changed across save and reload".into());
    }
    log::info!("configuration is stable across save and reload");

    match out {
        Some(out) => {
            saved.save_to_file(&out)?;
            print_report(&report);
            print_info(&format!("Saved configuration to {}", out.display()));
        }
        None => println!("{}", serde_json::to_string_pretty(&saved)?),
    }
    Ok(())
}
