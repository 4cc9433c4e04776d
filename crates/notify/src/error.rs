use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("group not found: {group_id}")]
    GroupNotFound { group_id: String },

    #[error("{message}")]
    Message { message: String },

    #[error("{context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn group_not_found(group_id: impl Into<String>) -> Self {
        Self::GroupNotFound {
            group_id: group_id.into(),
        }
    }

    /// Wrap a collaborator (observer, transport, text generator) failure.
    #[must_use]
    pub fn collaborator(context: impl Into<String>, source: anyhow::Error) -> Self {
        Self::External {
            context: context.into(),
            source: source.into(),
        }
    }
}

impl streamwatch_common::FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message { message }
    }
}

streamwatch_common::impl_context!();

pub type Result<T> = std::result::Result<T, Error>;
