// #![warn(missing_docs)]

//! # hbserve
//!
//! A small templated web server. Every request walks an ordered chain of
//! [pipeline::Stage]s: an access logger (side effect only), a static file
//! responder for the public assets directory, and a router dispatching the
//! fixed routes to handlers that render [handlebars] templates or answer
//! JSON. A stage either passes the request on or terminates the chain with
//! a response; when the chain runs out the server answers 404.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use hbserve::{
//!     access_log::AccessLogStage,
//!     pipeline::Server,
//!     router::{default_routes, RouterStage},
//!     static_assets::StaticAssetStage,
//!     templates::TemplateRegistry,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let templates = Arc::new(TemplateRegistry::new().expect("Failed loading templates"));
//!
//!     Server::new("127.0.0.1:3000".to_string())
//!         .push_stage(Arc::new(AccessLogStage::new("server.log")))
//!         .push_stage(Arc::new(
//!             StaticAssetStage::new("public").expect("Failed creating asset stage"),
//!         ))
//!         .push_stage(Arc::new(RouterStage::new(default_routes(), templates)))
//!         .run()
//!         .await
//!         .unwrap()
//! }
//! ```

pub mod access_log;
pub mod http;
pub mod pipeline;
pub mod router;
pub mod static_assets;
pub mod templates;
