// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

//! The session controller: who is logged in, and whether we know yet.

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};

use log::{debug, info, warn};
use secrecy::{ExposeSecret as _, SecretString};
use tokio::sync::watch;

use crate::{
    api::{self, Executor as _},
    credential::Credentials,
    error::{Error, Result},
    model::{Registration, User},
    pipeline::Pipeline,
};

const LOGIN_FAILED: &str = "Failed to login";
const REGISTER_FAILED: &str = "Failed to register";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Phase {
    Initializing,
    Authenticated,
    Anonymous,
}

/// Snapshot of the session. Authentication is derived from the presence of a
/// user and never stored on its own.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct State {
    user: Option<User>,
    loading: bool,
}

impl State {
    pub(crate) const fn initializing() -> Self {
        Self {
            user: None,
            loading: true,
        }
    }

    #[cfg(test)]
    pub(crate) const fn resolved(user: Option<User>) -> Self {
        Self {
            user,
            loading: false,
        }
    }

    pub(crate) const fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub(crate) const fn is_loading(&self) -> bool {
        self.loading
    }

    pub(crate) const fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub(crate) const fn phase(&self) -> Phase {
        match (self.loading, self.is_authenticated()) {
            (true, _) => Phase::Initializing,
            (false, true) => Phase::Authenticated,
            (false, false) => Phase::Anonymous,
        }
    }
}

pub(crate) struct Session {
    pipeline: Arc<Pipeline>,
    state: watch::Sender<State>,
    generation: AtomicU64,
    recovered: AtomicBool,
}

impl Session {
    pub(crate) fn new(pipeline: Arc<Pipeline>) -> Self {
        let (state, _) = watch::channel(State::initializing());
        Self {
            pipeline,
            state,
            generation: AtomicU64::new(0),
            recovered: AtomicBool::new(false),
        }
    }

    fn credentials(&self) -> &Credentials {
        self.pipeline.credentials()
    }

    pub(crate) fn state(&self) -> State {
        self.state.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<State> {
        self.state.subscribe()
    }

    /// Restores the session from the stored credential. Only the first call
    /// does anything.
    pub(crate) async fn recover(&self) {
        if self.recovered.swap(true, Ordering::AcqRel) {
            return;
        }

        if self.credentials().token().is_some() {
            _ = self.identify().await;
        } else {
            debug!("No stored credential, so we're starting anonymously");
        }

        _ = self.state.send_if_modified(|state| {
            let was_loading = state.loading;
            state.loading = false;
            was_loading
        });
    }

    /// Adopts a freshly issued token.
    pub(crate) async fn login(&self, token: SecretString) -> Result<State> {
        self.credentials().store(&token)?;
        _ = self.identify().await;
        Ok(self.state())
    }

    /// Exchanges an e-mail address and password for a token, then logs in
    /// with it. A rejection carries the server's explanation verbatim.
    pub(crate) async fn authenticate(&self, email: &str, password: &SecretString) -> Result<State> {
        let token = api::IssueToken {
            username: email,
            password: password.expose_secret(),
        }
        .execute(&self.pipeline)
        .await
        .map_err(|e| rejection(e, LOGIN_FAILED))?;

        self.login(token.access_token).await
    }

    pub(crate) async fn register(&self, registration: Registration) -> Result<User> {
        api::Register(registration)
            .execute(&self.pipeline)
            .await
            .map_err(|e| rejection(e, REGISTER_FAILED))
    }

    pub(crate) fn logout(&self) {
        _ = self.generation.fetch_add(1, Ordering::AcqRel);
        self.credentials().forget();
        _ = self.state.send_if_modified(|state| state.user.take().is_some());
        info!("Logged out");
    }

    /// Fetches the current user and applies the outcome, unless a newer
    /// fetch (or a logout) was issued in the meantime. Returns whether the
    /// outcome was applied.
    async fn identify(&self) -> bool {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let outcome = api::GetCurrentUser.execute(&self.pipeline).await;

        let failed = outcome.is_err();
        let applied = self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::Acquire) != generation {
                return false;
            }
            state.user = match outcome {
                Ok(ref user) => {
                    info!("Logged in as {}", user.email);
                    Some(user.clone())
                }
                Err(ref e) => {
                    warn!("We could not fetch the current user, so we're logging out: {}", e);
                    None
                }
            };
            true
        });

        if !applied {
            debug!("Discarding stale identity response {}", generation);
        } else if failed {
            self.credentials().forget();
        }
        applied
    }
}

fn rejection(error: Error, fallback: &str) -> Error {
    debug!("Request was rejected: {}", error);
    Error::Rejected(error.detail().unwrap_or(fallback).to_owned())
}
