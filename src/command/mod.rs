// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use async_trait::async_trait;
use log::{error, info};

use crate::{
    error::{self, Result},
    gate::{self, Decision, Route},
    metadata,
    password::Prompt,
    pipeline::{ExpiryHandler, Pipeline},
    session::Session,
};

pub(crate) mod account;
pub(crate) mod dashboard;
pub(crate) mod label;
pub(crate) mod open;
pub(crate) mod task;

/// What a command runs against: the one session of this process, the
/// pipeline behind it, and a way to ask for passwords.
pub(crate) struct Context {
    pub(crate) session: Arc<Session>,
    pub(crate) pipeline: Arc<Pipeline>,
    pub(crate) prompt: Box<dyn Prompt>,
}

#[async_trait]
pub(crate) trait Command {
    /// The view this command stands in for. Ungated commands return `None`.
    fn route(&self) -> Option<Route>;

    async fn execute(self, ctx: &Context) -> Result<()>;
}

/// Runs a command if the session admits its route.
pub(crate) async fn dispatch<C: Command + Send>(cmd: C, ctx: &Context) -> Result<()> {
    let decision = match cmd.route() {
        Some(route) => gate::resolve(route, &mut ctx.session.subscribe()).await?,
        None => Decision::Render,
    };

    match decision {
        Decision::Render => cmd.execute(ctx).await,
        Decision::Redirect(Route::Login) => {
            error!(
                "You need to log in first: run `{} login <EMAIL>`",
                *metadata::CLIENT_TYPE_ID
            );
            Err(error::Error::Command)
        }
        Decision::Redirect(route) => {
            if let Some(user) = ctx.session.state().user() {
                println!("Already logged in as {}.", user.email);
            }
            info!("Skipping command, the session belongs at {}", route);
            Ok(())
        }
        Decision::Placeholder => Err(error::Internal::ChannelClosed.into()),
    }
}

/// Reports session expiry on the terminal.
pub(crate) struct Terminal;

impl ExpiryHandler for Terminal {
    fn notify(&self, message: &str) {
        eprintln!("{message}");
    }

    fn expired(&self) {
        eprintln!(
            "Run `{} login <EMAIL>` to start a new session.",
            *metadata::CLIENT_TYPE_ID
        );
    }
}


#[cfg(test)]
mod tests {
    use clap::Parser as _;
    use secrecy::SecretString;
    use serde_json::json;

    use crate::transport::Method;

    use super::{
        testing::{context, recorded_context},
        *,
    };

    struct Visit(Option<Route>);

    #[async_trait]
    impl Command for Visit {
        fn route(&self) -> Option<Route> {
            self.0
        }

        async fn execute(self, ctx: &Context) -> Result<()> {
            _ = ctx.pipeline.send(crate::transport::Request::get("/visit")).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn protected_command_requires_login() {
        let (fake, ctx) = context(&[]);
        ctx.session.recover().await;

        let err = dispatch(Visit(Some(Route::Tasks)), &ctx)
            .await
            .expect_err("anonymous users are redirected");
        assert!(matches!(err, error::Error::Command));
        assert!(fake.requests().is_empty());
    }

    #[tokio::test]
    async fn public_command_is_skipped_when_logged_in() -> Result<()> {
        let (fake, ctx) = context(&[]);
        ctx.pipeline
            .credentials()
            .store(&SecretString::new("abc".to_owned()))?;
        fake.reply(
            Method::Get,
            "/users/me",
            200,
            json!({"id": 1, "email": "a@b.com", "first_name": "A", "last_name": "B"}),
        );
        ctx.session.recover().await;

        dispatch(Visit(Some(Route::Login)), &ctx).await?;
        assert_eq!(fake.requests().len(), 1);

        dispatch(Visit(Some(Route::Dashboard)), &ctx).await?;
        assert_eq!(fake.requests().len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn ungated_command_always_runs() -> Result<()> {
        let (fake, ctx) = context(&[]);
        dispatch(Visit(None), &ctx).await?;
        assert_eq!(fake.requests().len(), 1);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_is_delivered_before_exit() -> Result<()> {
        let (fake, recorder, ctx) = recorded_context(&[]);
        ctx.pipeline
            .credentials()
            .store(&SecretString::new("abc".to_owned()))?;
        fake.reply(
            Method::Get,
            "/users/me",
            200,
            json!({"id": 1, "email": "a@b.com", "first_name": "A", "last_name": "B"}),
        );
        fake.reply(
            Method::Get,
            "/tasks/",
            401,
            json!({"detail": "Could not validate credentials"}),
        );
        ctx.session.recover().await;

        let err = dispatch(task::Command::parse_from(["task", "list"]), &ctx)
            .await
            .expect_err("the token was rejected");
        assert!(err.is_unauthorized());
        assert_eq!(recorder.notifications(), 1);
        assert_eq!(recorder.expirations(), 0);

        ctx.pipeline.settled().await?;
        assert_eq!(recorder.expirations(), 1);
        assert!(ctx.pipeline.credentials().token().is_none());
        Ok(())
    }
}
