use std::sync::Arc;

use crate::api::TaskApi;
use crate::error::{ApiError, ClientError};
use crate::models::{TaskId, TaskStatus};
use crate::state::{ListStatus, ViewState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// Blank title: nothing was sent and the list was not refreshed.
    Skipped,
    Created,
}

/// Drives the request/render cycle: every operation is one backend round trip followed by a
/// full list refresh. Cheap to clone; clones share the api and the view state.
pub struct TaskClient<A> {
    api: Arc<A>,
    state: ViewState,
}

impl<A> Clone for TaskClient<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            state: self.state.clone(),
        }
    }
}

impl<A: TaskApi> TaskClient<A> {
    pub fn new(api: A, state: ViewState) -> Self {
        Self {
            api: Arc::new(api),
            state,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Refetches the list for the active filter. A response that lost the race against a
    /// newer refresh is dropped without touching the view.
    pub async fn refresh(&self) -> Result<(), ApiError> {
        let (token, filter) = self.state.begin_load();
        match self.api.list_tasks(filter.as_ref()).await {
            Ok(tasks) => {
                log::debug!(
                    "list loaded token={} filter={:?} count={}",
                    token,
                    filter,
                    tasks.len()
                );
                self.state.finish_load(token, ListStatus::Loaded(tasks));
                Ok(())
            }
            Err(err) => {
                log::warn!("list failed token={} filter={:?}: {}", token, filter, err);
                self.state
                    .finish_load(token, ListStatus::Failed(err.to_string()));
                Err(err)
            }
        }
    }

    pub async fn create(&self) -> Result<CreateOutcome, ClientError> {
        let new_task = match self.state.form().to_new_task() {
            Ok(Some(task)) => task,
            Ok(None) => {
                log::debug!("create skipped: blank title");
                return Ok(CreateOutcome::Skipped);
            }
            Err(err) => {
                log::warn!("create rejected: {err}");
                self.state.record_error(err.to_string());
                return Err(err.into());
            }
        };

        let result = self.api.create_task(&new_task).await;
        match &result {
            Ok(()) => {
                log::info!("task created title={:?}", new_task.title);
                self.state.clear_form();
                self.state.clear_error();
            }
            Err(err) => {
                log::warn!("create failed title={:?}: {}", new_task.title, err);
                self.state.record_error(format!("create failed: {err}"));
            }
        }
        let _ = self.refresh().await;
        result.map(|()| CreateOutcome::Created).map_err(ClientError::from)
    }

    pub async fn update_status(&self, id: TaskId, status: TaskStatus) -> Result<(), ApiError> {
        let result = self.api.update_status(id, &status).await;
        self.settle(&result, || format!("update task {id} to {status}"));
        let _ = self.refresh().await;
        result
    }

    pub async fn mark_done(&self, id: TaskId) -> Result<(), ApiError> {
        self.update_status(id, TaskStatus::Done).await
    }

    pub async fn delete(&self, id: TaskId) -> Result<(), ApiError> {
        let result = self.api.delete_task(id).await;
        self.settle(&result, || format!("delete task {id}"));
        let _ = self.refresh().await;
        result
    }

    pub async fn set_filter(&self, filter: Option<TaskStatus>) -> Result<(), ApiError> {
        log::debug!("filter set to {:?}", filter);
        self.state.set_filter(filter);
        self.refresh().await
    }

    /// Checks the origin-root health endpoint. Only logged: the list status already shows
    /// whether the task api itself answers.
    pub async fn health(&self) -> Result<(), ApiError> {
        let result = self.api.health().await;
        match &result {
            Ok(()) => log::info!("backend reachable"),
            Err(err) => log::warn!("backend health check failed: {err}"),
        }
        result
    }

    fn settle(&self, result: &Result<(), ApiError>, what: impl FnOnce() -> String) {
        match result {
            Ok(()) => {
                log::info!("{} ok", what());
                self.state.clear_error();
            }
            Err(err) => {
                let what = what();
                log::warn!("{what} failed: {err}");
                self.state.record_error(format!("{what} failed: {err}"));
            }
        }
    }
}
