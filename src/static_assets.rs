//! Public directory file serving

use std::ops::ControlFlow;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use log::{debug, warn};
use tokio::{fs::File, io::AsyncReadExt};

use crate::http::{HttpStatus, Method, Request, Response};
use crate::pipeline::{Named, Stage};

/// Serves files found under a fixed assets root and defers everything
/// else to the next stage. GET only; directories are not listed.
pub struct StaticAssetStage {
    root: PathBuf,
}

impl StaticAssetStage {
    pub fn new<P: Into<PathBuf>>(root: P) -> Result<Self, &'static str> {
        let root: PathBuf = root.into();

        if !root.exists() {
            return Err("Path doesn't exists in the system!");
        }

        if !root.is_dir() {
            return Err("Path is not a directory!");
        }

        Ok(StaticAssetStage { root })
    }

    /// Map a url path to a file under the root. `None` for anything that
    /// is not a plain file, including paths trying to climb out of the root.
    fn resolve(&self, mut path: &Path) -> Option<PathBuf> {
        if let Ok(p) = path.strip_prefix("/") {
            path = p;
        }

        if !path.components().all(|c| matches!(c, Component::Normal(_))) {
            return None;
        }

        let file_path = self.root.join(path);
        if file_path.is_file() {
            Some(file_path)
        } else {
            None
        }
    }
}

fn mime_by_path(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_text_plain()
        .to_string()
}

impl Named for StaticAssetStage {}

#[async_trait]
impl Stage for StaticAssetStage {
    async fn handle(&self, request: &Request) -> ControlFlow<Response> {
        if request.method() != Method::Get {
            return ControlFlow::Continue(());
        }

        let url = request.url();
        let path = Path::new(url.path());

        let Some(file_path) = self.resolve(path) else {
            return ControlFlow::Continue(());
        };

        debug!("Reading {file_path:?}");

        let mut file = match File::open(&file_path).await {
            Ok(f) => f,
            Err(e) => {
                warn!("{e:?}");
                return ControlFlow::Continue(());
            }
        };

        let mut body = Vec::new();
        if let Err(e) = file.read_to_end(&mut body).await {
            warn!("{e:?}");
            return ControlFlow::Break(Response::new(HttpStatus::InternalServerError));
        }

        let mut response = Response::new(HttpStatus::Ok);
        response.add_header(("Content-Type", &mime_by_path(path)));
        response.add_body(&body);

        ControlFlow::Break(response)
    }
}
