use super::io::ConfigurationRef;
use super::plan::LoadOutcome;
use super::reconciler::Workspace;
use crate::error::WorkspaceCoreError;
use crate::host::{HttpClient, NotificationLevel, VersionPrompt};
use serde_json::{json, Value};
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::Rc;
use workspace::{Configuration, ConfigurationId};

/// Async entry points of the workspace. Loads are numbered; a load that
/// finishes waiting after a newer one started is discarded.
pub struct WorkspaceSystem {
    workspace: RefCell<Workspace>,
    http: Rc<dyn HttpClient>,
    prompt: Rc<dyn VersionPrompt>,
    generation: Cell<u64>,
    /// Load whose drafted plan is waiting on version questions.
    resolving: Cell<Option<u64>>,
}

impl WorkspaceSystem {
    pub fn new(workspace: Workspace, http: Rc<dyn HttpClient>, prompt: Rc<dyn VersionPrompt>) -> Self {
        Self {
            workspace: RefCell::new(workspace),
            http,
            prompt,
            generation: Cell::new(0),
            resolving: Cell::new(None),
        }
    }

    pub fn workspace(&self) -> Ref<'_, Workspace> {
        self.workspace.borrow()
    }

    pub fn workspace_mut(&self) -> RefMut<'_, Workspace> {
        self.workspace.borrow_mut()
    }

    pub fn generation(&self) -> u64 {
        self.generation.get()
    }

    fn begin_load(&self) -> u64 {
        let generation = self.generation.get() + 1;
        self.generation.set(generation);
        generation
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.get() == generation
    }

    /// Returns the workspace to idle unless a newer load owns the drafted
    /// plan.
    fn settle(&self, generation: u64) {
        if self.resolving.get().is_some_and(|owner| owner <= generation) {
            self.resolving.set(None);
            self.workspace.borrow_mut().abandon_plan();
        }
    }

    fn fail(&self, message: &str) {
        log::error!("{message}");
        let mut workspace = self.workspace.borrow_mut();
        workspace.notify(NotificationLevel::Error, message);
        workspace.redirect_not_found();
    }

    /// Replaces the workspace with `configuration`, prompting for version
    /// substitutions first.
    pub async fn load_configuration(
        &self,
        configuration: Configuration,
    ) -> Result<LoadOutcome, WorkspaceCoreError> {
        let generation = self.begin_load();
        Ok(self.load_for_generation(configuration, generation).await)
    }

    async fn load_for_generation(&self, configuration: Configuration, generation: u64) -> LoadOutcome {
        let mut plan = self.workspace.borrow_mut().draft_plan(configuration);
        self.resolving.set(Some(generation));
        for request in plan.undecided() {
            let cached = self
                .workspace
                .borrow()
                .panels()
                .cached_decision(&request.name, &request.requested_version);
            let accepted = match cached {
                Some(accepted) => accepted,
                None => {
                    let accepted = self.prompt.confirm_substitution(&request).await;
                    self.workspace
                        .borrow_mut()
                        .record_substitution(&request, accepted);
                    accepted
                }
            };
            if !self.is_current(generation) {
                log::info!("load {generation} superseded while resolving versions");
                self.settle(generation);
                return LoadOutcome::Superseded;
            }
            plan.decide(&request, accepted);
        }
        if !self.is_current(generation) {
            self.settle(generation);
            return LoadOutcome::Superseded;
        }
        self.resolving.set(None);
        let report = self.workspace.borrow_mut().apply_plan(plan);
        LoadOutcome::Applied(report)
    }

    /// Fetches a stored configuration by id or path and loads it. Failures
    /// are reported to the user and redirect to the not-found view.
    pub async fn set_configuration(
        &self,
        target: ConfigurationRef,
    ) -> Result<LoadOutcome, WorkspaceCoreError> {
        let generation = self.begin_load();
        let path = self.workspace.borrow().settings().endpoints.object_path(&target);
        let response = self.http.get(&path).await;
        if !self.is_current(generation) {
            self.settle(generation);
            return Ok(LoadOutcome::Superseded);
        }
        let value = match response {
            Ok(value) => value,
            Err(err) => {
                self.settle(generation);
                self.fail(&format!("Failed to load configuration: {err}"));
                return Err(err.into());
            }
        };
        let configuration = match Configuration::from_value(value) {
            Ok(configuration) => configuration,
            Err(err) => {
                self.settle(generation);
                self.fail(&format!("Invalid configuration: {err}"));
                return Err(err.into());
            }
        };
        Ok(self.load_for_generation(configuration, generation).await)
    }

    /// Loads a configuration handed over as raw JSON.
    pub async fn set_plugin_config(&self, value: Value) -> Result<LoadOutcome, WorkspaceCoreError> {
        let configuration = Configuration::from_value(value)?;
        self.load_configuration(configuration).await
    }

    pub fn get_plugin_config(&self) -> Result<Value, WorkspaceCoreError> {
        let configuration = self.workspace.borrow_mut().save_configuration();
        Ok(configuration.to_value()?)
    }

    /// Stores the current workspace under its id.
    pub async fn save_configuration(&self) -> Result<Configuration, WorkspaceCoreError> {
        let configuration = self.workspace.borrow_mut().save_configuration();
        let body = configuration.to_value()?;
        let path = self.workspace.borrow().settings().endpoints.objects.clone();
        match self.http.put(&path, vec![body]).await {
            Ok(_) => {
                self.workspace
                    .borrow_mut()
                    .notify(NotificationLevel::Info, "Configuration saved");
                Ok(configuration)
            }
            Err(err) => {
                log::error!("failed to save configuration: {err}");
                self.workspace
                    .borrow_mut()
                    .notify(NotificationLevel::Error, &format!("Save failed: {err}"));
                Err(err.into())
            }
        }
    }

    /// Creates an empty stored configuration and returns the server reply.
    pub async fn create_configuration(&self, title: &str) -> Result<Value, WorkspaceCoreError> {
        let body = Configuration::new(title).to_value()?;
        let path = self.workspace.borrow().settings().endpoints.objects.clone();
        match self.http.post(&path, vec![body]).await {
            Ok(value) => Ok(value),
            Err(err) => {
                log::error!("failed to create configuration '{title}': {err}");
                self.workspace
                    .borrow_mut()
                    .notify(NotificationLevel::Error, &format!("Create failed: {err}"));
                Err(err.into())
            }
        }
    }

    pub async fn delete_configuration(&self, id: &ConfigurationId) -> Result<(), WorkspaceCoreError> {
        let path = self.workspace.borrow().settings().endpoints.objects.clone();
        match self.http.delete(&path, json!({ "data": [id] })).await {
            Ok(_) => Ok(()),
            Err(err) => {
                log::error!("failed to delete configuration {id}: {err}");
                self.workspace
                    .borrow_mut()
                    .notify(NotificationLevel::Error, &format!("Delete failed: {err}"));
                Err(err.into())
            }
        }
    }
}
