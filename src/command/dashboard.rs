// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;
use tabled::{settings::Style, Table};

use crate::{
    api::{self, Executor as _},
    error::Result,
    gate::Route,
    model::StatusCounts,
};

use super::Context;

/// Summarize tasks by status.
#[derive(Debug, Parser)]
pub(crate) struct Command;

#[async_trait]
impl super::Command for Command {
    fn route(&self) -> Option<Route> {
        Some(Route::Dashboard)
    }

    async fn execute(self, ctx: &Context) -> Result<()> {
        let tasks = api::ListTasks::default().execute(&ctx.pipeline).await?;
        let counts = StatusCounts::tally(&tasks);

        if let Some(user) = ctx.session.state().user() {
            println!("Welcome back, {}.", user.first_name);
        }
        println!("{}", Table::new([counts]).with(Style::rounded()));
        println!("{} tasks in total.", counts.total());
        Ok(())
    }
}
