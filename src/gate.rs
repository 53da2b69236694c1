// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

//! Route gatekeepers. These hold no state: every decision is a function of
//! the session snapshot it is given.

use std::fmt;

use tokio::sync::watch;

use crate::{
    error::{self, Result},
    session::{Phase, State},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Route {
    Guest,
    Login,
    Register,
    Dashboard,
    Tasks,
    NewTask,
    Task(i64),
    EditTask(i64),
    Trash,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Access {
    PublicOnly,
    AuthenticatedOnly,
}

impl Route {
    /// Where authenticated users land.
    pub(crate) const HOME: Self = Self::Dashboard;

    pub(crate) const fn access(self) -> Access {
        match self {
            Self::Guest | Self::Login | Self::Register => Access::PublicOnly,
            Self::Dashboard
            | Self::Tasks
            | Self::NewTask
            | Self::Task(_)
            | Self::EditTask(_)
            | Self::Trash => Access::AuthenticatedOnly,
        }
    }

    pub(crate) fn parse(path: &str) -> Option<Self> {
        let segments: Vec<&str> = path
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        match segments.as_slice() {
            [] => Some(Self::Guest),
            ["login"] => Some(Self::Login),
            ["register"] => Some(Self::Register),
            ["dashboard"] => Some(Self::Dashboard),
            ["tasks"] => Some(Self::Tasks),
            ["tasks", "new"] => Some(Self::NewTask),
            ["tasks", id] => id.parse().ok().map(Self::Task),
            ["tasks", id, "edit"] => id.parse().ok().map(Self::EditTask),
            ["trash"] => Some(Self::Trash),
            _ => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Guest => f.write_str("/"),
            Self::Login => f.write_str("/login"),
            Self::Register => f.write_str("/register"),
            Self::Dashboard => f.write_str("/dashboard"),
            Self::Tasks => f.write_str("/tasks"),
            Self::NewTask => f.write_str("/tasks/new"),
            Self::Task(id) => write!(f, "/tasks/{id}"),
            Self::EditTask(id) => write!(f, "/tasks/{id}/edit"),
            Self::Trash => f.write_str("/trash"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Decision {
    /// The session is still resolving; show nothing and do not redirect.
    Placeholder,
    Render,
    Redirect(Route),
}

pub(crate) fn authenticated_only(state: &State) -> Decision {
    match state.phase() {
        Phase::Initializing => Decision::Placeholder,
        Phase::Authenticated => Decision::Render,
        Phase::Anonymous => Decision::Redirect(Route::Login),
    }
}

pub(crate) fn public_only(state: &State) -> Decision {
    match state.phase() {
        Phase::Initializing => Decision::Placeholder,
        Phase::Authenticated => Decision::Redirect(Route::HOME),
        Phase::Anonymous => Decision::Render,
    }
}

pub(crate) fn admit(route: Route, state: &State) -> Decision {
    match route.access() {
        Access::PublicOnly => public_only(state),
        Access::AuthenticatedOnly => authenticated_only(state),
    }
}

/// Waits until the session has resolved, then decides.
pub(crate) async fn resolve(route: Route, rx: &mut watch::Receiver<State>) -> Result<Decision> {
    let state = rx
        .wait_for(|state| !state.is_loading())
        .await
        .map_err(error::Internal::from)?;
    Ok(admit(route, &state))
}
