// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use tabled::{settings::Style, Table};

use crate::{
    api::{self, Executor as _},
    error::Result,
    gate::Route,
    model::LabelUpdate,
};

use super::Context;

#[derive(Debug, Subcommand)]
pub(crate) enum Action {
    /// List labels.
    List {
        /// Include how many of your tasks carry each label.
        #[arg(long)]
        counts: bool,
    },
    /// Show a single label.
    Show {
        #[clap()]
        id: i64,
    },
    /// Rename or recolor a label.
    Update {
        #[clap()]
        id: i64,

        #[clap()]
        name: String,

        /// A CSS color such as `#4318FF`.
        #[arg(long)]
        color: Option<String>,
    },
}

/// Manage labels.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    #[clap(subcommand)]
    action: Action,
}

#[async_trait]
impl super::Command for Command {
    fn route(&self) -> Option<Route> {
        Some(Route::Tasks)
    }

    async fn execute(self, ctx: &Context) -> Result<()> {
        let pipeline = &ctx.pipeline;
        let mut table = match self.action {
            Action::List { counts: true } => {
                Table::new(api::ListLabelsWithCount.execute(pipeline).await?)
            }
            Action::List { counts: false } => {
                Table::new(api::ListLabels::default().execute(pipeline).await?)
            }
            Action::Show { id } => Table::new([api::GetLabel { id }.execute(pipeline).await?]),
            Action::Update { id, name, color } => Table::new([api::UpdateLabel {
                id,
                label: LabelUpdate { name, color },
            }
            .execute(pipeline)
            .await?]),
        };
        println!("{}", table.with(Style::rounded()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;
    use serde_json::json;

    use crate::{
        command::{dispatch, testing::context},
        transport::{testing::Fake, Body, Method},
    };

    use super::*;

    async fn logged_in() -> Result<(std::sync::Arc<Fake>, Context)> {
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
        Ok((fake, ctx))
    }

    #[tokio::test]
    async fn list_pages_through_labels() -> Result<()> {
        let (fake, ctx) = logged_in().await?;
        fake.reply(
            Method::Get,
            "/",
            200,
            json!([{"id": 1, "name": "work", "color": "#4318FF"}]),
        );

        dispatch(Command::parse_from(["label", "list"]), &ctx).await?;

        let requests = fake.requests();
        assert_eq!(
            requests[1].query,
            vec![
                ("skip".to_owned(), "0".to_owned()),
                ("limit".to_owned(), "100".to_owned()),
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn list_with_counts() -> Result<()> {
        let (fake, ctx) = logged_in().await?;
        fake.reply(
            Method::Get,
            "/with_count",
            200,
            json!([{"id": 1, "name": "work", "color": null, "count": 3}]),
        );

        dispatch(Command::parse_from(["label", "list", "--counts"]), &ctx).await?;
        assert_eq!(fake.requests()[1].path, "/with_count");
        Ok(())
    }

    #[tokio::test]
    async fn update_sends_name_and_color() -> Result<()> {
        let (fake, ctx) = logged_in().await?;
        fake.reply(
            Method::Put,
            "/1",
            200,
            json!({"id": 1, "name": "home", "color": "#05CD99"}),
        );

        dispatch(
            Command::parse_from(["label", "update", "1", "home", "--color", "#05CD99"]),
            &ctx,
        )
        .await?;
        assert_eq!(
            fake.requests()[1].body,
            Body::Json(json!({"name": "home", "color": "#05CD99"}))
        );
        Ok(())
    }

    #[tokio::test]
    async fn missing_label_is_an_error() -> Result<()> {
        let (_, ctx) = logged_in().await?;

        let err = dispatch(Command::parse_from(["label", "show", "9"]), &ctx)
            .await
            .expect_err("nothing is scripted for this label");
        assert_eq!(err.detail(), Some("Not Found"));
        Ok(())
    }
}
