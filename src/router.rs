//! Route table, the fixed endpoint handlers, and the terminal stages
//!
//! The route table is built once at startup and shared read-only; lookup
//! is an exact match on method + path. The router always terminates the
//! chain: matched handler, 500 on a render failure, 404 otherwise.

use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::Arc;

use async_trait::async_trait;
use handlebars::RenderError;
use log::error;
use serde::Serialize;
use serde_json::json;

use crate::http::{HttpStatus, Method, Request, Response};
use crate::pipeline::{Named, Stage};
use crate::templates::{TemplateRegistry, ABOUT_TEMPLATE, HOME_TEMPLATE, MAINTENANCE_TEMPLATE};

pub type HandlerFn = fn(&TemplateRegistry) -> Result<Response, RenderError>;

#[derive(Default)]
pub struct RouteTable {
    routes: HashMap<(Method, String), HandlerFn>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(mut self, path: &str, handler: HandlerFn) -> Self {
        self.routes.insert((Method::Get, path.to_string()), handler);
        self
    }

    fn lookup(&self, method: Method, path: &str) -> Option<HandlerFn> {
        self.routes.get(&(method, path.to_string())).copied()
    }
}

/// The three endpoints of the site.
pub fn default_routes() -> RouteTable {
    RouteTable::new()
        .get("/", home)
        .get("/about", about)
        .get("/bad", bad)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HomeCtx {
    page_title: &'static str,
    welcome_message: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AboutCtx {
    page_title: &'static str,
}

fn home(templates: &TemplateRegistry) -> Result<Response, RenderError> {
    let body = templates.render(
        HOME_TEMPLATE,
        &HomeCtx {
            page_title: "Home Page",
            welcome_message: "Welcome to my website",
        },
    )?;

    Ok(Response::html(&body))
}

fn about(templates: &TemplateRegistry) -> Result<Response, RenderError> {
    let body = templates.render(
        ABOUT_TEMPLATE,
        &AboutCtx {
            page_title: "About Page",
        },
    )?;

    Ok(Response::html(&body))
}

fn bad(_: &TemplateRegistry) -> Result<Response, RenderError> {
    Ok(Response::json(&json!({
        "errorMessage": "Unable to fulfill this request"
    })))
}

pub struct RouterStage {
    routes: RouteTable,
    templates: Arc<TemplateRegistry>,
}

impl RouterStage {
    pub fn new(routes: RouteTable, templates: Arc<TemplateRegistry>) -> Self {
        Self { routes, templates }
    }
}

impl Named for RouterStage {}

#[async_trait]
impl Stage for RouterStage {
    async fn handle(&self, request: &Request) -> ControlFlow<Response> {
        let path = request.path();

        let Some(handler) = self.routes.lookup(request.method(), &path) else {
            return ControlFlow::Break(Response::not_found());
        };

        let response = match handler(&self.templates) {
            Ok(response) => response,
            Err(e) => {
                error!("Render failed for {} {path}: {e}", request.method());
                Response::new(HttpStatus::InternalServerError)
            }
        };

        ControlFlow::Break(response)
    }
}

/// Takes the whole site offline with a fixed page. Inserted in front of
/// the router when needed; the other stages keep their order.
pub struct MaintenanceStage {
    templates: Arc<TemplateRegistry>,
}

impl MaintenanceStage {
    pub fn new(templates: Arc<TemplateRegistry>) -> Self {
        Self { templates }
    }
}

impl Named for MaintenanceStage {}

#[async_trait]
impl Stage for MaintenanceStage {
    async fn handle(&self, _: &Request) -> ControlFlow<Response> {
        let mut response = Response::new(HttpStatus::ServiceUnavailable);

        match self.templates.render(MAINTENANCE_TEMPLATE, &()) {
            Ok(body) => {
                response.add_header(("Content-Type", "text/html; charset=utf-8"));
                response.add_body(body.as_bytes());
            }
            Err(e) => error!("Render failed for maintenance page: {e}"),
        }

        ControlFlow::Break(response)
    }
}
