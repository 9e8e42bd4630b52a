use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid group-ban config: {message}")]
    Config { message: String },

    #[error("{message}")]
    Message { message: String },

    #[error(transparent)]
    Store(#[from] group_ban_common::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),
}

impl Error {
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

impl group_ban_common::FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message { message }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

group_ban_common::impl_context!();
