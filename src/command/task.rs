// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use log::error;
use tabled::{settings::Style, Table};

use crate::{
    api::{self, Executor as _},
    error::{self, Result},
    gate::Route,
    model::{NewTask, Task, TaskStatus, TaskUpdate},
};

use super::Context;

/// Accepts RFC 3339 timestamps or plain dates (taken as midnight UTC).
fn parse_due(value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|t| t.and_utc())
        .ok_or_else(|| {
            format!("{value:?} is neither a date (YYYY-MM-DD) nor an RFC 3339 timestamp")
        })
}

#[derive(Debug, Subcommand)]
pub(crate) enum LabelAction {
    /// Attach a label by name, creating it if needed.
    Add {
        #[clap()]
        name: String,
    },
    /// Detach a label.
    Remove {
        #[clap()]
        label_id: i64,
    },
}

#[derive(Debug, Subcommand)]
pub(crate) enum ParticipantAction {
    /// Share the task with another user.
    Add {
        #[clap()]
        email: String,
    },
    /// Stop sharing the task with a user.
    Remove {
        #[clap()]
        user_id: i64,
    },
}

#[derive(Debug, Subcommand)]
pub(crate) enum Action {
    /// List active tasks.
    List {
        /// Only show tasks with this status.
        #[arg(long, short, value_enum)]
        status: Option<TaskStatus>,
    },
    /// Show a task with its labels and participants.
    Show {
        #[clap()]
        id: i64,
    },
    /// Create a task.
    New {
        #[clap()]
        title: String,

        #[arg(long, short)]
        description: Option<String>,

        #[arg(long, short, value_enum, default_value_t)]
        status: TaskStatus,

        #[arg(long, value_parser = parse_due)]
        due: Option<DateTime<Utc>>,

        /// Labels to attach by name.
        #[arg(long = "label", short)]
        labels: Vec<String>,
    },
    /// Change a task. When only a progress is given, the status follows it.
    Edit {
        #[clap()]
        id: i64,

        #[arg(long)]
        title: Option<String>,

        #[arg(long, short)]
        description: Option<String>,

        #[arg(long, short, value_enum)]
        status: Option<TaskStatus>,

        /// Completion percentage, from 0 to 100.
        #[arg(long, short, value_parser = clap::value_parser!(i32).range(0..=100))]
        progress: Option<i32>,

        #[arg(long, value_parser = parse_due)]
        due: Option<DateTime<Utc>>,
    },
    /// Delete a task.
    Delete {
        #[clap()]
        id: i64,
    },
    /// List deleted tasks.
    Trash,
    /// Restore a deleted task.
    Restore {
        #[clap()]
        id: i64,
    },
    /// Manage the labels of a task.
    Label {
        #[clap()]
        id: i64,

        #[clap(subcommand)]
        action: LabelAction,
    },
    /// Manage who a task is shared with.
    Participant {
        #[clap()]
        id: i64,

        #[clap(subcommand)]
        action: ParticipantAction,
    },
}

/// Work with tasks.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    #[clap(subcommand)]
    action: Action,
}

fn print_tasks(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No tasks.");
    } else {
        println!("{}", Table::new(tasks).with(Style::rounded()));
    }
}

fn print_task(task: &Task) {
    println!("{}", Table::new([task]).with(Style::rounded()));
    if let Some(ref description) = task.description {
        println!("{description}");
    }
    if let Some(ref owner) = task.owner {
        println!("Owner: {} <{}>", owner.full_name(), owner.email);
    }
    if !task.participants.is_empty() {
        println!("{}", Table::new(&task.participants).with(Style::rounded()));
    }
}

#[async_trait]
impl super::Command for Command {
    fn route(&self) -> Option<Route> {
        Some(match self.action {
            Action::List { .. } | Action::Delete { .. } => Route::Tasks,
            Action::Show { id } => Route::Task(id),
            Action::New { .. } => Route::NewTask,
            Action::Edit { id, .. } | Action::Label { id, .. } | Action::Participant { id, .. } => {
                Route::EditTask(id)
            }
            Action::Trash | Action::Restore { .. } => Route::Trash,
        })
    }

    async fn execute(self, ctx: &Context) -> Result<()> {
        let pipeline = &ctx.pipeline;
        match self.action {
            Action::List { status } => {
                print_tasks(&api::ListTasks { status }.execute(pipeline).await?);
            }
            Action::Show { id } => print_task(&api::GetTask { id }.execute(pipeline).await?),
            Action::New {
                title,
                description,
                status,
                due,
                labels,
            } => {
                let task = api::CreateTask(NewTask {
                    title,
                    description,
                    status,
                    due_date: due,
                    labels,
                })
                .execute(pipeline)
                .await?;
                println!("Created task {}.", task.id);
            }
            Action::Edit {
                id,
                title,
                description,
                status,
                progress,
                due,
            } => {
                let update = TaskUpdate {
                    title,
                    description,
                    status: status.or_else(|| progress.map(TaskStatus::from_progress)),
                    progress,
                    due_date: due,
                };
                if update.is_empty() {
                    error!("Nothing to change; pass at least one field to update");
                    return Err(error::Error::Command);
                }
                print_task(&api::UpdateTask { id, update }.execute(pipeline).await?);
            }
            Action::Delete { id } => {
                let task = api::DeleteTask { id }.execute(pipeline).await?;
                println!("Deleted task {} ({}).", task.id, task.title);
            }
            Action::Trash => {
                print_tasks(&api::ListAllTasks { is_active: false }.execute(pipeline).await?);
            }
            Action::Restore { id } => {
                let task = api::ActivateTask { id }.execute(pipeline).await?;
                println!("Restored task {} ({}).", task.id, task.title);
            }
            Action::Label { id, action } => {
                let task = match action {
                    LabelAction::Add { name } => {
                        api::AddLabel {
                            task_id: id,
                            label_name: name.trim().to_owned(),
                        }
                        .execute(pipeline)
                        .await?
                    }
                    LabelAction::Remove { label_id } => {
                        api::RemoveLabel {
                            task_id: id,
                            label_id,
                        }
                        .execute(pipeline)
                        .await?
                    }
                };
                print_task(&task);
            }
            Action::Participant { id, action } => {
                let task = match action {
                    ParticipantAction::Add { email } => {
                        api::AddParticipant {
                            task_id: id,
                            email: email.trim().to_owned(),
                        }
                        .execute(pipeline)
                        .await?
                    }
                    ParticipantAction::Remove { user_id } => {
                        api::RemoveParticipant {
                            task_id: id,
                            user_id,
                        }
                        .execute(pipeline)
                        .await?
                    }
                };
                print_task(&task);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;
    use serde_json::json;

    use crate::{
        command::{dispatch, testing::context, Command as _},
        transport::{Body, Method},
    };

    use super::*;

    #[test]
    fn due_dates() {
        assert_eq!(
            parse_due("2026-10-20").map(|t| t.to_rfc3339()),
            Ok("2026-10-20T00:00:00+00:00".to_owned())
        );
        assert_eq!(
            parse_due("2026-10-20T09:00:00+02:00").map(|t| t.to_rfc3339()),
            Ok("2026-10-20T07:00:00+00:00".to_owned())
        );
        assert!(parse_due("next tuesday").is_err());
    }

    #[test]
    fn routes_follow_views() {
        let cmd = Command::parse_from(["task", "show", "3"]);
        assert_eq!(cmd.route(), Some(Route::Task(3)));
        let cmd = Command::parse_from(["task", "participant", "3", "add", "f@x.com"]);
        assert_eq!(cmd.route(), Some(Route::EditTask(3)));
        let cmd = Command::parse_from(["task", "restore", "3"]);
        assert_eq!(cmd.route(), Some(Route::Trash));
    }

    #[tokio::test]
    async fn edit_derives_status_from_progress() -> Result<()> {
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
        fake.reply(
            Method::Put,
            "/tasks/3",
            200,
            json!({"id": 3, "title": "t", "status": "DOING", "progress": 50}),
        );
        ctx.session.recover().await;

        dispatch(
            Command::parse_from(["task", "edit", "3", "--progress", "50"]),
            &ctx,
        )
        .await?;

        let requests = fake.requests();
        assert_eq!(
            requests[1].body,
            Body::Json(json!({"status": "DOING", "progress": 50}))
        );
        Ok(())
    }

    #[tokio::test]
    async fn empty_edit_is_refused() -> Result<()> {
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

        let err = dispatch(Command::parse_from(["task", "edit", "3"]), &ctx)
            .await
            .expect_err("nothing to change");
        assert!(matches!(err, error::Error::Command));
        assert_eq!(fake.requests().len(), 1);
        Ok(())
    }
}
