use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::form::CreateForm;
use crate::models::{Task, TaskStatus};

/// What the list area currently shows.
#[derive(Debug, Clone, PartialEq)]
pub enum ListStatus {
    Loading,
    Loaded(Vec<Task>),
    Failed(String),
}

/// Point-in-time copy of the view state, used for drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSnapshot {
    pub filter: Option<TaskStatus>,
    pub form: CreateForm,
    pub list: ListStatus,
    pub refreshing: bool,
    pub last_error: Option<String>,
}

/// The single owner of everything the page would otherwise keep in globals.
#[derive(Clone, Default)]
pub struct ViewState {
    inner: Arc<Mutex<ViewData>>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ViewData> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        let guard = self.lock();
        ViewSnapshot {
            filter: guard.filter.clone(),
            form: guard.form.clone(),
            list: guard.list.clone(),
            refreshing: guard.latest_token != guard.applied_token,
            last_error: guard.last_error.clone(),
        }
    }

    pub fn filter(&self) -> Option<TaskStatus> {
        self.lock().filter.clone()
    }

    pub fn set_filter(&self, filter: Option<TaskStatus>) {
        self.lock().filter = filter;
    }

    pub fn form(&self) -> CreateForm {
        self.lock().form.clone()
    }

    pub fn update_form(&self, edit: impl FnOnce(&mut CreateForm)) {
        let mut guard = self.lock();
        edit(&mut guard.form);
    }

    pub fn clear_form(&self) {
        self.lock().form.clear();
    }

    /// Issues the next list token and returns it with the filter the request must use.
    pub fn begin_load(&self) -> (u64, Option<TaskStatus>) {
        let mut guard = self.lock();
        guard.latest_token += 1;
        (guard.latest_token, guard.filter.clone())
    }

    /// Applies a list result unless a newer request has been issued since `token`.
    pub fn finish_load(&self, token: u64, list: ListStatus) -> bool {
        let mut guard = self.lock();
        if token != guard.latest_token {
            log::debug!(
                "dropping stale list response token={} latest={}",
                token,
                guard.latest_token
            );
            return false;
        }
        guard.list = list;
        guard.applied_token = token;
        true
    }

    #[cfg(test)]
    pub(crate) fn latest_token(&self) -> u64 {
        self.lock().latest_token
    }

    pub fn record_error(&self, message: impl Into<String>) {
        self.lock().last_error = Some(message.into());
    }

    pub fn clear_error(&self) {
        self.lock().last_error = None;
    }
}

#[derive(Debug)]
struct ViewData {
    filter: Option<TaskStatus>,
    form: CreateForm,
    list: ListStatus,
    latest_token: u64,
    applied_token: u64,
    last_error: Option<String>,
}

impl Default for ViewData {
    fn default() -> Self {
        Self {
            filter: None,
            form: CreateForm::default(),
            list: ListStatus::Loading,
            latest_token: 0,
            applied_token: 0,
            last_error: None,
        }
    }
}
