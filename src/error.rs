// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{convert::Infallible, io, result};

use thiserror::Error;
use tokio::sync::watch;

pub(crate) type Result<T, E = Error> = result::Result<T, E>;

#[derive(Error, Debug)]
pub(crate) enum Error {
    #[error("IO operation failed: {0}")]
    Io(#[from] io::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON format error: {0}")]
    Json(serde_json::Error),
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("API error: {0}")]
    Api(#[from] Api),
    #[error("{0}")]
    Rejected(String),
    #[error("storage error: {0}")]
    Storage(#[from] Storage),
    #[error("password retrieval error: {0}")]
    Password(#[from] Password),
    #[error("internal communication error: {0}")]
    Internal(#[from] Internal),
    #[error("command execution failed")]
    Command,
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    /// The message the server attached to a failed response, if any.
    pub(crate) fn detail(&self) -> Option<&str> {
        match *self {
            Self::Api(ref api) => api.detail(),
            Self::Rejected(ref message) => Some(message),
            Self::Io(_)
            | Self::Http(_)
            | Self::Json(_)
            | Self::Url(_)
            | Self::Storage(_)
            | Self::Password(_)
            | Self::Internal(_)
            | Self::Command
            | Self::Cancelled => None,
        }
    }

    pub(crate) const fn is_unauthorized(&self) -> bool {
        matches!(*self, Self::Api(Api::Unauthorized { .. }))
    }
}

impl From<pinentry::Error> for Error {
    fn from(value: pinentry::Error) -> Self {
        // LINT: Deliberate fall-through that should catch future cases added to
        // the enum.
        #[allow(
            clippy::wildcard_enum_match_arm,
            clippy::match_wildcard_for_single_variants
        )]
        match value {
            pinentry::Error::Cancelled | pinentry::Error::Timeout => Self::Cancelled,
            pinentry::Error::Io(e) => Self::Io(e),
            _ => Self::Password(Password::Pinentry(value)),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        // LINT: Deliberate fall-through that should catch future cases added to
        // the enum.
        #[allow(clippy::wildcard_enum_match_arm)]
        match value.classify() {
            serde_json::error::Category::Io => Self::Io(value.into()),
            _ => Self::Json(value),
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::Io(value.into())
    }
}

impl From<Infallible> for Error {
    fn from(value: Infallible) -> Self {
        match value {}
    }
}

#[derive(Error, Debug)]
pub(crate) enum Api {
    #[error("the server rejected our credentials{}", suffix(.detail))]
    Unauthorized { detail: Option<String> },
    #[error("server responded with status {status}{}", suffix(.detail))]
    Status { status: u16, detail: Option<String> },
}

fn suffix(detail: &Option<String>) -> String {
    detail.as_ref().map(|d| format!(": {d}")).unwrap_or_default()
}

impl Api {
    pub(crate) fn detail(&self) -> Option<&str> {
        match *self {
            Self::Unauthorized { ref detail } | Self::Status { ref detail, .. } => {
                detail.as_deref()
            }
        }
    }
}

#[derive(Error, Debug)]
pub(crate) enum Storage {
    #[error("storage lock was poisoned by a panicking writer")]
    Poisoned,
}

#[derive(Error, Debug)]
pub(crate) enum Password {
    #[error("no password prompt available")]
    NoPrompt,
    #[error("Pinentry implementation error: {0}")]
    Pinentry(pinentry::Error),
}

#[derive(Error, Debug)]
pub(crate) enum Internal {
    #[error("channel is closed")]
    ChannelClosed,
    #[error("lock was poisoned by a panicking holder")]
    Poisoned,
}

impl From<watch::error::RecvError> for Internal {
    fn from(_: watch::error::RecvError) -> Self {
        Self::ChannelClosed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_displays_message_verbatim() {
        let error = Error::Rejected("Incorrect email or password".to_owned());
        assert_eq!(error.to_string(), "Incorrect email or password");
        assert_eq!(error.detail(), Some("Incorrect email or password"));
    }

    #[test]
    fn api_errors_expose_server_detail() {
        let error: Error = Api::Status {
            status: 404,
            detail: Some("Task not found".to_owned()),
        }
        .into();
        assert_eq!(error.detail(), Some("Task not found"));
        assert_eq!(
            error.to_string(),
            "API error: server responded with status 404: Task not found"
        );
        assert!(!error.is_unauthorized());

        let error: Error = Api::Unauthorized { detail: None }.into();
        assert!(error.is_unauthorized());
        assert_eq!(error.detail(), None);
    }
}
