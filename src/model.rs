// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, NaiveDateTime, Utc};
use clap::ValueEnum;
use inflector::Inflector as _;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// The account behind the current token. Only ever produced by deserializing
/// a successful identity response.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Tabled)]
pub(crate) struct User {
    #[tabled(rename = "ID")]
    pub(crate) id: i64,
    #[tabled(rename = "E-mail")]
    pub(crate) email: String,
    #[tabled(rename = "First Name")]
    pub(crate) first_name: String,
    #[tabled(rename = "Last Name")]
    pub(crate) last_name: String,
}

impl User {
    pub(crate) fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Deserialize)]
pub(crate) struct Token {
    pub(crate) access_token: SecretString,
    #[allow(dead_code)]
    pub(crate) token_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct Registration {
    pub(crate) email: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) password: String,
}

#[derive(Copy, Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq, Hash, ValueEnum)]
#[serde(rename_all = "UPPERCASE")]
pub(crate) enum TaskStatus {
    #[default]
    Todo,
    Doing,
    Done,
}

impl TaskStatus {
    /// Status implied by a completion percentage.
    pub(crate) const fn from_progress(progress: i32) -> Self {
        if progress <= 0 {
            Self::Todo
        } else if progress < 100 {
            Self::Doing
        } else {
            Self::Done
        }
    }

    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "TODO",
            Self::Doing => "DOING",
            Self::Done => "DONE",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = self.to_possible_value().ok_or(std::fmt::Error)?;
        write!(f, "{}", value.get_name().to_title_case())
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Tabled)]
pub(crate) struct Label {
    #[tabled(rename = "ID")]
    pub(crate) id: i64,
    #[tabled(rename = "Name")]
    pub(crate) name: String,
    #[tabled(rename = "Color", display_with = "display_option")]
    pub(crate) color: Option<String>,
    #[tabled(skip)]
    pub(crate) created_at: Option<NaiveDateTime>,
    #[tabled(skip)]
    pub(crate) updated_at: Option<NaiveDateTime>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Tabled)]
pub(crate) struct LabelWithCount {
    #[tabled(rename = "ID")]
    pub(crate) id: i64,
    #[tabled(rename = "Name")]
    pub(crate) name: String,
    #[tabled(rename = "Color", display_with = "display_option")]
    pub(crate) color: Option<String>,
    #[tabled(rename = "Tasks")]
    pub(crate) count: u64,
}

#[derive(Debug, Serialize)]
pub(crate) struct LabelUpdate {
    pub(crate) name: String,
    pub(crate) color: Option<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Tabled)]
pub(crate) struct Task {
    #[tabled(rename = "ID")]
    pub(crate) id: i64,
    #[tabled(rename = "Title")]
    pub(crate) title: String,
    #[tabled(skip)]
    pub(crate) description: Option<String>,
    #[tabled(rename = "Status")]
    #[serde(default)]
    pub(crate) status: TaskStatus,
    #[tabled(rename = "Progress", display_with = "display_progress")]
    #[serde(default)]
    pub(crate) progress: Option<i32>,
    #[tabled(rename = "Due", display_with = "display_timestamp")]
    #[serde(default)]
    pub(crate) due_date: Option<NaiveDateTime>,
    #[tabled(skip)]
    #[serde(default = "default_active")]
    pub(crate) is_active: bool,
    #[tabled(skip)]
    pub(crate) created_at: Option<NaiveDateTime>,
    #[tabled(rename = "Updated", display_with = "display_timestamp")]
    #[serde(default)]
    pub(crate) updated_at: Option<NaiveDateTime>,
    #[tabled(skip)]
    #[serde(default)]
    pub(crate) user_id: Option<i64>,
    #[tabled(rename = "Labels", display_with = "display_labels")]
    #[serde(default)]
    pub(crate) labels: Vec<Label>,
    #[tabled(skip)]
    #[serde(default)]
    pub(crate) owner: Option<User>,
    #[tabled(skip)]
    #[serde(default)]
    pub(crate) participants: Vec<User>,
}

const fn default_active() -> bool {
    true
}

#[derive(Debug, Default, Serialize)]
pub(crate) struct NewTask {
    pub(crate) title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) description: Option<String>,
    pub(crate) status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) due_date: Option<DateTime<Utc>>,
    pub(crate) labels: Vec<String>,
}

/// Partial update; unset fields are left alone by the server.
#[derive(Debug, Default, Serialize)]
pub(crate) struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) progress: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) due_date: Option<DateTime<Utc>>,
}

impl TaskUpdate {
    pub(crate) const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.progress.is_none()
            && self.due_date.is_none()
    }
}

/// Tasks per status, as shown on the dashboard.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Tabled)]
pub(crate) struct StatusCounts {
    #[tabled(rename = "To Do")]
    pub(crate) todo: usize,
    #[tabled(rename = "In Progress")]
    pub(crate) doing: usize,
    #[tabled(rename = "Completed")]
    pub(crate) done: usize,
}

impl StatusCounts {
    pub(crate) fn tally<'a, I: IntoIterator<Item = &'a Task>>(tasks: I) -> Self {
        tasks.into_iter().fold(Self::default(), |mut counts, task| {
            match task.status {
                TaskStatus::Todo => counts.todo += 1,
                TaskStatus::Doing => counts.doing += 1,
                TaskStatus::Done => counts.done += 1,
            }
            counts
        })
    }

    pub(crate) const fn total(&self) -> usize {
        self.todo + self.doing + self.done
    }
}

fn display_option(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn display_progress(value: &Option<i32>) -> String {
    value.map(|p| format!("{p}%")).unwrap_or_default()
}

fn display_timestamp(value: &Option<NaiveDateTime>) -> String {
    value
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

fn display_labels(labels: &[Label]) -> String {
    labels
        .iter()
        .map(|l| l.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
