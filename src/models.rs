use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

pub type TaskId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Done,
    /// Any value the backend reports that this client has no name for.
    Other(String),
}

impl TaskStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
            TaskStatus::Other(value) => value.as_str(),
        }
    }

    /// Human-facing badge text: the wire value with underscores shown as spaces.
    pub fn label(&self) -> String {
        self.as_str().replace('_', " ")
    }

    pub fn is_done(&self) -> bool {
        matches!(self, TaskStatus::Done)
    }
}

impl From<String> for TaskStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "pending" => TaskStatus::Pending,
            "in_progress" => TaskStatus::InProgress,
            "done" => TaskStatus::Done,
            _ => TaskStatus::Other(value),
        }
    }
}

impl From<&str> for TaskStatus {
    fn from(value: &str) -> Self {
        TaskStatus::from(value.to_string())
    }
}

impl From<TaskStatus> for String {
    fn from(value: TaskStatus) -> Self {
        match value {
            TaskStatus::Other(value) => value,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default)]
    pub due_date: Option<String>,
    pub status: TaskStatus,
}

/// Body of `POST /tasks`. `due_date` is always present on the wire, `null` when unset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub due_date: Option<String>,
}

/// Body of `PATCH /tasks/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct StatusPatch {
    pub status: TaskStatus,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_known_and_unknown_values() {
        let statuses: Vec<TaskStatus> =
            serde_json::from_str(r#"["pending","in_progress","done","blocked"]"#).unwrap();
        assert_eq!(
            statuses,
            vec![
                TaskStatus::Pending,
                TaskStatus::InProgress,
                TaskStatus::Done,
                TaskStatus::Other("blocked".to_string()),
            ]
        );
        let back = serde_json::to_value(&statuses).unwrap();
        assert_eq!(
            back,
            serde_json::json!(["pending", "in_progress", "done", "blocked"])
        );
    }

    #[test]
    fn status_label_replaces_every_underscore() {
        assert_eq!(TaskStatus::InProgress.label(), "in progress");
        assert_eq!(TaskStatus::Done.label(), "done");
        assert_eq!(
            TaskStatus::from("waiting_on_review").label(),
            "waiting on review"
        );
    }

    #[test]
    fn task_tolerates_null_description_missing_due_date_and_extra_fields() {
        let json = r#"
        {
          "id": 7,
          "title": "A",
          "description": null,
          "status": "pending",
          "created_at": "2024-01-01T10:00:00"
        }
        "#;

        let task: Task = serde_json::from_str(json).expect("task should deserialize");
        assert_eq!(task.id, 7);
        assert_eq!(task.description, "");
        assert_eq!(task.due_date, None);
        assert_eq!(task.status, TaskStatus::Pending);
    }

    #[test]
    fn new_task_serializes_absent_due_date_as_null() {
        let body = NewTask {
            title: "Buy milk".to_string(),
            description: String::new(),
            due_date: None,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
              "title": "Buy milk",
              "description": "",
              "due_date": null
            })
        );
    }

    #[test]
    fn status_patch_carries_only_status() {
        let body = StatusPatch {
            status: TaskStatus::Done,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({ "status": "done" })
        );
    }
}
