use crate::host::{HostError, HttpError};

#[derive(thiserror::Error, Debug)]
pub enum WorkspaceCoreError {
    #[error("tab '{0}' not found")]
    UnknownTab(String),
    #[error("tab name must not be empty")]
    EmptyTabName,
    #[error("tab name '{0}' is already used")]
    DuplicateTabName(String),
    #[error("no cell with guid '{0}'")]
    UnknownCell(String),
    #[error("panel '{0}' cannot be deleted")]
    Undeletable(String),
    #[error("cell '{0}' already hosts a panel")]
    CellOccupied(String),
    #[error("column count must be at least 1")]
    InvalidColumn,
    #[error("plugin {name} v{version} not found")]
    PluginNotFound { name: String, version: String },
    #[error("a panel is already open in the modal")]
    ModalBusy,
    #[error(transparent)]
    Host(#[from] HostError),
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error(transparent)]
    Configuration(#[from] workspace::WorkspaceError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
