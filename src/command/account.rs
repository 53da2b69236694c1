// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;
use log::{error, warn};
use secrecy::ExposeSecret as _;
use tabled::{settings::Style, Table};

use crate::{
    error::{self, Result},
    gate::Route,
    model::Registration,
    password::{self, RequestBuilder},
};

use super::Context;

const ATTEMPTS: usize = 3;

/// Log in with an e-mail address and password.
#[derive(Debug, Parser)]
pub(crate) struct Login {
    /// The e-mail address of the account.
    #[clap()]
    email: String,
}

#[async_trait]
impl super::Command for Login {
    fn route(&self) -> Option<Route> {
        Some(Route::Login)
    }

    async fn execute(self, ctx: &Context) -> Result<()> {
        let mut req = RequestBuilder::new(&self.email).into_request();
        let mut last_error = None;

        for _ in 0..ATTEMPTS {
            let password = password::require(ctx.prompt.as_ref(), req).await?;
            match ctx.session.authenticate(&self.email, &password).await {
                Ok(state) => {
                    return match state.user() {
                        Some(user) => {
                            println!("Logged in as {} <{}>.", user.full_name(), user.email);
                            Ok(())
                        }
                        None => {
                            error!("The server issued a token but would not tell us who you are");
                            Err(error::Error::Command)
                        }
                    };
                }
                Err(error::Error::Rejected(message)) => {
                    warn!("Login was rejected: {}", message);
                    req = RequestBuilder::new(&self.email)
                        .with_error(&message)
                        .into_request();
                    last_error = Some(message);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.map_or(error::Error::Command, error::Error::Rejected))
    }
}

/// Forget the stored session.
#[derive(Debug, Parser)]
pub(crate) struct Logout;

#[async_trait]
impl super::Command for Logout {
    fn route(&self) -> Option<Route> {
        None
    }

    async fn execute(self, ctx: &Context) -> Result<()> {
        ctx.session.logout();
        println!("Logged out.");
        Ok(())
    }
}

/// Create a new account.
#[derive(Debug, Parser)]
pub(crate) struct Register {
    #[arg(long)]
    first_name: String,

    #[arg(long)]
    last_name: String,

    /// The e-mail address to register.
    #[clap()]
    email: String,
}

#[async_trait]
impl super::Command for Register {
    fn route(&self) -> Option<Route> {
        Some(Route::Register)
    }

    async fn execute(self, ctx: &Context) -> Result<()> {
        let password = password::require(
            ctx.prompt.as_ref(),
            RequestBuilder::new(&self.email).into_request(),
        )
        .await?;

        let user = ctx
            .session
            .register(Registration {
                email: self.email,
                first_name: self.first_name,
                last_name: self.last_name,
                password: password.expose_secret().clone(),
            })
            .await?;
        println!(
            "Registered {}. Log in with `{} login {}`.",
            user.full_name(),
            *crate::metadata::CLIENT_TYPE_ID,
            user.email
        );
        Ok(())
    }
}

/// Show who is logged in.
#[derive(Debug, Parser)]
pub(crate) struct Status;

#[async_trait]
impl super::Command for Status {
    fn route(&self) -> Option<Route> {
        None
    }

    async fn execute(self, ctx: &Context) -> Result<()> {
        let state = ctx
            .session
            .subscribe()
            .wait_for(|state| !state.is_loading())
            .await
            .map_err(error::Internal::from)?
            .clone();

        match state.user() {
            Some(user) => println!("{}", Table::new([user]).with(Style::rounded())),
            None => println!("Not logged in."),
        }
        Ok(())
    }
}
