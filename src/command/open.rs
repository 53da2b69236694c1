// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;
use log::error;

use crate::{
    error::{self, Result},
    gate::{self, Decision, Route},
};

use super::Context;

/// Show where the current session would land when visiting a page.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// A page path such as `/tasks/12/edit`.
    path: String,
}

#[async_trait]
impl super::Command for Command {
    fn route(&self) -> Option<Route> {
        None
    }

    async fn execute(self, ctx: &Context) -> Result<()> {
        let Some(route) = Route::parse(&self.path) else {
            error!("There is no page at {}", self.path);
            return Err(error::Error::Command);
        };

        match gate::resolve(route, &mut ctx.session.subscribe()).await? {
            Decision::Render => println!("{route}"),
            Decision::Redirect(to) => println!("{route} -> {to}"),
            Decision::Placeholder => return Err(error::Internal::ChannelClosed.into()),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::command::{dispatch, testing::context};

    use super::*;

    #[tokio::test]
    async fn unknown_pages_fail() {
        let (_, ctx) = context(&[]);
        ctx.session.recover().await;

        let err = dispatch(Command::parse_from(["open", "/nowhere"]), &ctx)
            .await
            .expect_err("no such page");
        assert!(matches!(err, error::Error::Command));
    }

    #[tokio::test]
    async fn anonymous_visits_resolve() -> Result<()> {
        let (fake, ctx) = context(&[]);
        ctx.session.recover().await;

        dispatch(Command::parse_from(["open", "/tasks/3/edit"]), &ctx).await?;
        dispatch(Command::parse_from(["open", "/login"]), &ctx).await?;
        assert!(fake.requests().is_empty());
        Ok(())
    }
}
