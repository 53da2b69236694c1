// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

//! Every call to the API goes through [`Pipeline::send`], which attaches the
//! stored bearer token and owns the reaction to a rejected credential.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use log::{debug, warn};
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;

use crate::{
    credential::Credentials,
    error::{self, Error, Result},
    transport::{Request, Response, Transport},
};

pub(crate) const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

/// Decides what the user sees when the server stops accepting our token.
pub(crate) trait ExpiryHandler: Send + Sync {
    /// Called immediately with a message to show the user.
    fn notify(&self, message: &str);

    /// Called once the expiry delay has elapsed. A UI would navigate to its
    /// login view here.
    fn expired(&self);
}

pub(crate) struct Pipeline {
    transport: Arc<dyn Transport>,
    credentials: Credentials,
    handler: Arc<dyn ExpiryHandler>,
    delay: Duration,
    expiring: Arc<AtomicBool>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Pipeline {
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        credentials: Credentials,
        handler: Arc<dyn ExpiryHandler>,
        delay: Duration,
    ) -> Self {
        Self {
            transport,
            credentials,
            handler,
            delay,
            expiring: Arc::new(AtomicBool::new(false)),
            pending: Mutex::new(None),
        }
    }

    pub(crate) fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Sends a request, returning the response only when it is a success.
    /// Failures are returned as errors after any global handling.
    pub(crate) async fn send(&self, mut req: Request) -> Result<Response> {
        if let Some(token) = self.credentials.token() {
            req.bearer = Some(token);
        }
        let authenticated = req.bearer.is_some();

        let resp = self.transport.send(req).await?;
        if resp.is_success() {
            return Ok(resp);
        }
        let err = Error::from(resp.into_error());
        if authenticated && err.is_unauthorized() {
            self.expire();
        }
        Err(err)
    }

    /// Waits for a scheduled expiry event to be delivered. A process that is
    /// about to exit calls this so the event is not lost with the runtime.
    pub(crate) async fn settled(&self) -> Result<()> {
        let pending = self
            .pending
            .lock()
            .map_err(|_| error::Internal::Poisoned)?
            .take();
        if let Some(handle) = pending {
            handle.await?;
        }
        Ok(())
    }

    pub(crate) async fn fetch<T: DeserializeOwned>(&self, req: Request) -> Result<T> {
        self.send(req).await?.json()
    }

    fn expire(&self) {
        if self.expiring.swap(true, Ordering::AcqRel) {
            debug!("Session expiry is already being handled");
            return;
        }

        warn!("The server rejected our stored credential");
        self.credentials.forget();
        self.handler.notify(SESSION_EXPIRED_MESSAGE);

        let handler = Arc::clone(&self.handler);
        let expiring = Arc::clone(&self.expiring);
        let delay = self.delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            handler.expired();
            expiring.store(false, Ordering::Release);
        });
        match self.pending.lock() {
            Ok(mut pending) => *pending = Some(handle),
            Err(_) => warn!("We lost track of the session expiry, so it may not be reported"),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::ExpiryHandler;

    #[derive(Default)]
    pub(crate) struct Recorder {
        notifications: AtomicUsize,
        expirations: AtomicUsize,
    }

    impl Recorder {
        pub(crate) fn notifications(&self) -> usize {
            self.notifications.load(Ordering::Acquire)
        }

        pub(crate) fn expirations(&self) -> usize {
            self.expirations.load(Ordering::Acquire)
        }
    }

    impl ExpiryHandler for Recorder {
        fn notify(&self, _message: &str) {
            _ = self.notifications.fetch_add(1, Ordering::AcqRel);
        }

        fn expired(&self) {
            _ = self.expirations.fetch_add(1, Ordering::AcqRel);
        }
    }
}
