//! Best-effort request logging
//!
//! Each request is formatted as `<timestamp>: <METHOD> <PATH>`, echoed to
//! the diagnostic log and appended to a log file from a detached task. The
//! append never delays the response, and an append failure is reported but
//! never surfaced to the client.

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::{error, info};
use tokio::{fs::OpenOptions, io, io::AsyncWriteExt};

use crate::http::{Request, Response};
use crate::pipeline::{Named, Stage};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

pub struct AccessLogStage {
    log_path: PathBuf,
}

impl AccessLogStage {
    pub fn new<P: Into<PathBuf>>(log_path: P) -> Self {
        Self {
            log_path: log_path.into(),
        }
    }
}

fn format_line(request: &Request) -> String {
    format!(
        "{}: {} {}",
        request.received_at().format(TIMESTAMP_FORMAT),
        request.method(),
        request.uri()
    )
}

async fn append_line(path: &Path, line: &str) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;

    file.write_all(format!("{line}\n").as_bytes()).await
}

impl Named for AccessLogStage {}

#[async_trait]
impl Stage for AccessLogStage {
    async fn handle(&self, request: &Request) -> ControlFlow<Response> {
        let line = format_line(request);

        info!("{line}");

        // Fire-and-forget, the chain moves on without waiting for the disk.
        let path = self.log_path.clone();
        tokio::spawn(async move {
            if let Err(e) = append_line(&path, &line).await {
                error!("Unable to append to {}: {e}", path.display());
            }
        });

        ControlFlow::Continue(())
    }
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::time::Duration;

    use super::*;
    use crate::http::Method;

    fn temp_log(name: &str) -> PathBuf {
        env::temp_dir().join(format!("hbserve-{name}-{}.log", std::process::id()))
    }

    async fn wait_for_lines(path: &Path, expected: usize) -> Vec<String> {
        for _ in 0..100 {
            if let Ok(content) = tokio::fs::read_to_string(path).await {
                let lines: Vec<String> = content.lines().map(str::to_string).collect();
                if lines.len() >= expected {
                    return lines;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        panic!("log file never reached {expected} lines");
    }

    #[test]
    fn test_line_format() {
        let request = Request::new(Method::Get, "/about".into(), "http/1.1".into());
        let line = format_line(&request);

        assert!(line.ends_with(": GET /about"));
        assert!(line.contains(&request.received_at().format("%Y-%m-%d").to_string()));
    }

    #[tokio::test]
    async fn test_append_continues_and_reaches_the_file() {
        let path = temp_log("single");
        let _ = tokio::fs::remove_file(&path).await;

        let stage = AccessLogStage::new(&path);
        let request = Request::new(Method::Get, "/".into(), "http/1.1".into());

        let outcome = stage.handle(&request).await;
        assert!(matches!(outcome, ControlFlow::Continue(())));

        let lines = wait_for_lines(&path, 1).await;
        assert!(lines[0].ends_with(": GET /"));

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn test_concurrent_requests_each_get_a_line() {
        let path = temp_log("concurrent");
        let _ = tokio::fs::remove_file(&path).await;

        let stage = AccessLogStage::new(&path);
        for uri in ["/", "/about", "/bad"] {
            let request = Request::new(Method::Get, uri.into(), "http/1.1".into());
            assert!(matches!(
                stage.handle(&request).await,
                ControlFlow::Continue(())
            ));
        }

        let lines = wait_for_lines(&path, 3).await;
        assert_eq!(lines.len(), 3);
        for line in &lines {
            assert!(line.contains(": GET /"));
        }

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn test_unwritable_log_path_still_continues() {
        let stage = AccessLogStage::new("/definitely/not/a/dir/server.log");
        let request = Request::new(Method::Get, "/".into(), "http/1.1".into());

        assert!(matches!(
            stage.handle(&request).await,
            ControlFlow::Continue(())
        ));
    }
}
