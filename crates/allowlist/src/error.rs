use thiserror::Error;

#[derive(Error, Debug)]
pub enum AllowListError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("invalid path: {0}")]
    InvalidPath(String),
}
