use derive_more::{Display, Error};

/// Failure conditions surfaced by the panel and grid engine.
///
/// Application flow wraps these in `anyhow::Error`; only the variants the
/// engine itself raises live here.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum OverlayError {
    /// A host capability (document, terminal, storage backend) is missing
    /// when a panel is requested. Panel creation aborts without leaving a
    /// partial node attached.
    #[display("host environment unavailable: {capability}")]
    EnvironmentUnavailable { capability: String },

    /// A caller-supplied cell renderer failed for one cell.
    #[display("cell renderer failed in column {column}: {message}")]
    RenderData { column: usize, message: String },

    /// A data request issued by a feature module failed.
    #[display("request failed: {message}")]
    RequestFailure { message: String },

    /// Reading or writing a persisted preference failed.
    #[display("storage unavailable for '{key}': {reason}")]
    StorageUnavailable { key: String, reason: String },
}

impl OverlayError {
    pub fn environment(capability: impl Into<String>) -> Self {
        Self::EnvironmentUnavailable {
            capability: capability.into(),
        }
    }

    pub fn storage(key: impl Into<String>, reason: impl ToString) -> Self {
        Self::StorageUnavailable {
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    pub fn request(message: impl ToString) -> Self {
        Self::RequestFailure {
            message: message.to_string(),
        }
    }
}
