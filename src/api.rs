// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

//! Typed endpoints of the TaskMaster API. Each request type converts into a
//! transport [`Request`] and names the payload it expects back.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    error::{self, Result},
    model::{
        Label, LabelUpdate, LabelWithCount, NewTask, Registration, Task, TaskStatus, TaskUpdate,
        Token, User,
    },
    pipeline::Pipeline,
    transport::Request,
};

#[async_trait]
pub(crate) trait Executor: Send + Sized {
    type Response: DeserializeOwned + Send;

    async fn execute(self, pipeline: &Pipeline) -> Result<Self::Response>
    where
        Self: TryInto<Request>,
        error::Error: From<<Self as TryInto<Request>>::Error>,
    {
        let req = self.try_into()?;
        pipeline.fetch(req).await
    }
}

/// The form-encoded password grant.
pub(crate) struct IssueToken<'a> {
    pub(crate) username: &'a str,
    pub(crate) password: &'a str,
}

impl From<IssueToken<'_>> for Request {
    fn from(value: IssueToken<'_>) -> Self {
        Self::post("/token").with_form([("username", value.username), ("password", value.password)])
    }
}

impl Executor for IssueToken<'_> {
    type Response = Token;
}

pub(crate) struct GetCurrentUser;

impl From<GetCurrentUser> for Request {
    fn from(_: GetCurrentUser) -> Self {
        Self::get("/users/me")
    }
}

impl Executor for GetCurrentUser {
    type Response = User;
}

pub(crate) struct Register(pub(crate) Registration);

impl TryFrom<Register> for Request {
    type Error = error::Error;

    fn try_from(value: Register) -> Result<Self, Self::Error> {
        Self::post("/register").with_json(&value.0)
    }
}

impl Executor for Register {
    type Response = User;
}

#[derive(Default)]
pub(crate) struct ListTasks {
    pub(crate) status: Option<TaskStatus>,
}

impl From<ListTasks> for Request {
    fn from(value: ListTasks) -> Self {
        let req = Self::get("/tasks/");
        match value.status {
            Some(status) => req.with_query("status", status.as_str()),
            None => req,
        }
    }
}

impl Executor for ListTasks {
    type Response = Vec<Task>;
}

/// Tasks by active flag; inactive tasks are the trash.
pub(crate) struct ListAllTasks {
    pub(crate) is_active: bool,
}

impl From<ListAllTasks> for Request {
    fn from(value: ListAllTasks) -> Self {
        Self::get("/tasks/all").with_query("is_active", value.is_active)
    }
}

impl Executor for ListAllTasks {
    type Response = Vec<Task>;
}

pub(crate) struct GetTask {
    pub(crate) id: i64,
}

impl From<GetTask> for Request {
    fn from(value: GetTask) -> Self {
        Self::get(format!("/tasks/{}", value.id))
    }
}

impl Executor for GetTask {
    type Response = Task;
}

pub(crate) struct CreateTask(pub(crate) NewTask);

impl TryFrom<CreateTask> for Request {
    type Error = error::Error;

    fn try_from(value: CreateTask) -> Result<Self, Self::Error> {
        Self::post("/tasks/").with_json(&value.0)
    }
}

impl Executor for CreateTask {
    type Response = Task;
}

pub(crate) struct UpdateTask {
    pub(crate) id: i64,
    pub(crate) update: TaskUpdate,
}

impl TryFrom<UpdateTask> for Request {
    type Error = error::Error;

    fn try_from(value: UpdateTask) -> Result<Self, Self::Error> {
        Self::put(format!("/tasks/{}", value.id)).with_json(&value.update)
    }
}

impl Executor for UpdateTask {
    type Response = Task;
}

pub(crate) struct DeleteTask {
    pub(crate) id: i64,
}

impl From<DeleteTask> for Request {
    fn from(value: DeleteTask) -> Self {
        Self::delete(format!("/tasks/{}", value.id))
    }
}

impl Executor for DeleteTask {
    type Response = Task;
}

/// Brings a task back out of the trash.
pub(crate) struct ActivateTask {
    pub(crate) id: i64,
}

impl From<ActivateTask> for Request {
    fn from(value: ActivateTask) -> Self {
        Self::put(format!("/tasks/{}/activate", value.id))
    }
}

impl Executor for ActivateTask {
    type Response = Task;
}

#[derive(Serialize)]
pub(crate) struct AddLabel {
    #[serde(skip)]
    pub(crate) task_id: i64,
    pub(crate) label_name: String,
}

impl TryFrom<AddLabel> for Request {
    type Error = error::Error;

    fn try_from(value: AddLabel) -> Result<Self, Self::Error> {
        Self::post(format!("/tasks/{}/add_label", value.task_id)).with_json(&value)
    }
}

impl Executor for AddLabel {
    type Response = Task;
}

pub(crate) struct RemoveLabel {
    pub(crate) task_id: i64,
    pub(crate) label_id: i64,
}

impl From<RemoveLabel> for Request {
    fn from(value: RemoveLabel) -> Self {
        Self::delete(format!("/tasks/{}/labels/{}", value.task_id, value.label_id))
    }
}

impl Executor for RemoveLabel {
    type Response = Task;
}

#[derive(Serialize)]
pub(crate) struct AddParticipant {
    #[serde(skip)]
    pub(crate) task_id: i64,
    pub(crate) email: String,
}

impl TryFrom<AddParticipant> for Request {
    type Error = error::Error;

    fn try_from(value: AddParticipant) -> Result<Self, Self::Error> {
        Self::post(format!("/tasks/{}/participants", value.task_id)).with_json(&value)
    }
}

impl Executor for AddParticipant {
    type Response = Task;
}

pub(crate) struct RemoveParticipant {
    pub(crate) task_id: i64,
    pub(crate) user_id: i64,
}

impl From<RemoveParticipant> for Request {
    fn from(value: RemoveParticipant) -> Self {
        Self::delete(format!(
            "/tasks/{}/participants/{}",
            value.task_id, value.user_id
        ))
    }
}

impl Executor for RemoveParticipant {
    type Response = Task;
}

pub(crate) struct ListLabels {
    pub(crate) skip: u32,
    pub(crate) limit: u32,
}

impl Default for ListLabels {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: 100,
        }
    }
}

impl From<ListLabels> for Request {
    fn from(value: ListLabels) -> Self {
        Self::get("/")
            .with_query("skip", value.skip)
            .with_query("limit", value.limit)
    }
}

impl Executor for ListLabels {
    type Response = Vec<Label>;
}

pub(crate) struct ListLabelsWithCount;

impl From<ListLabelsWithCount> for Request {
    fn from(_: ListLabelsWithCount) -> Self {
        Self::get("/with_count")
    }
}

impl Executor for ListLabelsWithCount {
    type Response = Vec<LabelWithCount>;
}

pub(crate) struct GetLabel {
    pub(crate) id: i64,
}

impl From<GetLabel> for Request {
    fn from(value: GetLabel) -> Self {
        Self::get(format!("/{}", value.id))
    }
}

impl Executor for GetLabel {
    type Response = Label;
}

pub(crate) struct UpdateLabel {
    pub(crate) id: i64,
    pub(crate) label: LabelUpdate,
}

impl TryFrom<UpdateLabel> for Request {
    type Error = error::Error;

    fn try_from(value: UpdateLabel) -> Result<Self, Self::Error> {
        Self::put(format!("/{}", value.id)).with_json(&value.label)
    }
}

impl Executor for UpdateLabel {
    type Response = Label;
}
