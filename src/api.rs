use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;

use crate::error::ApiError;
use crate::models::{NewTask, StatusPatch, Task, TaskId, TaskStatus};

/// The backend as the client sees it. Production uses [`HttpTaskApi`].
#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn list_tasks(&self, filter: Option<&TaskStatus>) -> Result<Vec<Task>, ApiError>;
    async fn create_task(&self, task: &NewTask) -> Result<(), ApiError>;
    async fn update_status(&self, id: TaskId, status: &TaskStatus) -> Result<(), ApiError>;
    async fn delete_task(&self, id: TaskId) -> Result<(), ApiError>;
    async fn health(&self) -> Result<(), ApiError>;
}

/// Path (relative to the api base) for listing tasks, scoped to `filter` when set.
pub fn tasks_path(filter: Option<&TaskStatus>) -> String {
    match filter {
        Some(status) if !status.as_str().is_empty() => {
            format!("/tasks?status={}", urlencoding::encode(status.as_str()))
        }
        _ => "/tasks".to_string(),
    }
}

pub fn task_path(id: TaskId) -> String {
    format!("/tasks/{id}")
}

pub struct HttpTaskApi {
    client: reqwest::Client,
    base: String,
    health_url: Url,
}

impl HttpTaskApi {
    pub fn new(api_base: &str, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let base = api_base.trim().trim_end_matches('/').to_string();
        let parsed =
            Url::parse(&base).map_err(|err| ApiError::InvalidBase(format!("{base}: {err}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::InvalidBase(format!(
                "{base}: unsupported scheme {}",
                parsed.scheme()
            )));
        }
        // The backend serves /health at the origin root, outside the api prefix.
        let health_url = parsed
            .join("/health")
            .map_err(|err| ApiError::InvalidBase(format!("{base}: {err}")))?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            base,
            health_url,
        })
    }

    #[cfg(test)]
    pub(crate) fn base(&self) -> &str {
        &self.base
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    #[cfg(test)]
    pub(crate) fn health_url(&self) -> &Url {
        &self.health_url
    }
}

async fn read_success(resp: reqwest::Response) -> Result<String, ApiError> {
    let status = resp.status();
    let text = resp.text().await?;
    if !status.is_success() {
        return Err(ApiError::Status { status, body: text });
    }
    Ok(text)
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    async fn list_tasks(&self, filter: Option<&TaskStatus>) -> Result<Vec<Task>, ApiError> {
        let url = self.url_for(&tasks_path(filter));
        log::debug!("GET {url}");
        let text = read_success(self.client.get(&url).send().await?).await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn create_task(&self, task: &NewTask) -> Result<(), ApiError> {
        let url = self.url_for("/tasks");
        log::debug!("POST {url} title={:?}", task.title);
        read_success(self.client.post(&url).json(task).send().await?).await?;
        Ok(())
    }

    async fn update_status(&self, id: TaskId, status: &TaskStatus) -> Result<(), ApiError> {
        let url = self.url_for(&task_path(id));
        log::debug!("PATCH {url} status={status}");
        let body = StatusPatch {
            status: status.clone(),
        };
        read_success(self.client.patch(&url).json(&body).send().await?).await?;
        Ok(())
    }

    async fn delete_task(&self, id: TaskId) -> Result<(), ApiError> {
        let url = self.url_for(&task_path(id));
        log::debug!("DELETE {url}");
        read_success(self.client.delete(&url).send().await?).await?;
        Ok(())
    }

    async fn health(&self) -> Result<(), ApiError> {
        log::debug!("GET {}", self.health_url);
        read_success(self.client.get(self.health_url.clone()).send().await?).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Accepts one connection, answers it with `status_line`/`body` and returns the raw request.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                    let len = head
                        .lines()
                        .find_map(|line| line.strip_prefix("content-length:"))
                        .and_then(|value| value.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if buf.len() >= end + 4 + len {
                        break;
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.flush().await.unwrap();
            String::from_utf8(buf).unwrap()
        });
        (format!("http://{addr}/api"), handle)
    }

    #[test]
    fn tasks_path_is_unscoped_for_empty_filter() {
        assert_eq!(tasks_path(None), "/tasks");
        assert_eq!(tasks_path(Some(&TaskStatus::from(""))), "/tasks");
    }

    #[test]
    fn tasks_path_url_encodes_the_filter() {
        assert_eq!(tasks_path(Some(&TaskStatus::Done)), "/tasks?status=done");
        assert_eq!(
            tasks_path(Some(&TaskStatus::InProgress)),
            "/tasks?status=in_progress"
        );
        assert_eq!(
            tasks_path(Some(&TaskStatus::from("on hold&x=1"))),
            "/tasks?status=on%20hold%26x%3D1"
        );
    }

    #[test]
    fn new_normalizes_base_and_derives_health_url() {
        let api = HttpTaskApi::new(" http://localhost:5000/api/ ", None).unwrap();
        assert_eq!(api.base(), "http://localhost:5000/api");
        assert_eq!(api.url_for("/tasks/3"), "http://localhost:5000/api/tasks/3");
        assert_eq!(api.health_url().as_str(), "http://localhost:5000/health");
    }

    #[test]
    fn new_rejects_unusable_bases() {
        assert!(matches!(
            HttpTaskApi::new("not a url", None),
            Err(ApiError::InvalidBase(_))
        ));
        assert!(matches!(
            HttpTaskApi::new("ftp://example.com/api", None),
            Err(ApiError::InvalidBase(_))
        ));
    }

    #[tokio::test]
    async fn list_tasks_sends_scoped_get_and_decodes_body() {
        let (base, server) = serve_once(
            "200 OK",
            r#"[{"id":1,"title":"A","description":null,"due_date":null,"status":"in_progress"}]"#,
        )
        .await;
        let api = HttpTaskApi::new(&base, Some(Duration::from_secs(5))).unwrap();

        let tasks = api.list_tasks(Some(&TaskStatus::InProgress)).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].status, TaskStatus::InProgress);

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/tasks?status=in_progress HTTP/1.1\r\n"));
    }

    #[tokio::test]
    async fn create_task_posts_json_body() {
        let (base, server) = serve_once("201 Created", r#"{"id":9}"#).await;
        let api = HttpTaskApi::new(&base, Some(Duration::from_secs(5))).unwrap();

        let body = NewTask {
            title: "Buy milk".to_string(),
            description: String::new(),
            due_date: None,
        };
        api.create_task(&body).await.unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/tasks HTTP/1.1\r\n"));
        let (_, payload) = request.split_once("\r\n\r\n").unwrap();
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(payload).unwrap(),
            serde_json::json!({ "title": "Buy milk", "description": "", "due_date": null })
        );
    }

    #[tokio::test]
    async fn update_status_patches_only_status() {
        let (base, server) = serve_once("200 OK", "{}").await;
        let api = HttpTaskApi::new(&base, Some(Duration::from_secs(5))).unwrap();

        api.update_status(4, &TaskStatus::Done).await.unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("PATCH /api/tasks/4 HTTP/1.1\r\n"));
        let (_, payload) = request.split_once("\r\n\r\n").unwrap();
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(payload).unwrap(),
            serde_json::json!({ "status": "done" })
        );
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let (base, server) = serve_once("404 Not Found", r#"{"error":"missing"}"#).await;
        let api = HttpTaskApi::new(&base, Some(Duration::from_secs(5))).unwrap();

        let err = api.delete_task(12).await.expect_err("404 must fail");
        match err {
            ApiError::Status { status, body } => {
                assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
                assert_eq!(body, r#"{"error":"missing"}"#);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(server
            .await
            .unwrap()
            .starts_with("DELETE /api/tasks/12 HTTP/1.1\r\n"));
    }

    #[tokio::test]
    async fn undecodable_list_body_is_a_decode_error() {
        let (base, _server) = serve_once("200 OK", "<html>").await;
        let api = HttpTaskApi::new(&base, Some(Duration::from_secs(5))).unwrap();
        assert!(matches!(
            api.list_tasks(None).await,
            Err(ApiError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn health_hits_origin_root() {
        let (base, server) = serve_once("200 OK", r#"{"status":"ok"}"#).await;
        let api = HttpTaskApi::new(&base, Some(Duration::from_secs(5))).unwrap();
        api.health().await.unwrap();
        assert!(server.await.unwrap().starts_with("GET /health HTTP/1.1\r\n"));
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let api = HttpTaskApi::new(&format!("http://{addr}/api"), Some(Duration::from_secs(5)))
            .unwrap();
        assert!(matches!(
            api.list_tasks(None).await,
            Err(ApiError::Transport(_))
        ));
    }
}
