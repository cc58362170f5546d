use std::{env, path::PathBuf, sync::Arc};

use clap::Parser;
use hbserve::{
    access_log::AccessLogStage,
    pipeline::Server,
    router::{default_routes, RouterStage},
    static_assets::StaticAssetStage,
    templates::TemplateRegistry,
};

const LOG_FILE: &str = "server.log";

#[derive(Debug, Parser)]
struct Args {
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    port: u16,
    #[arg(short, long, default_value = "127.0.0.1")]
    bind: String,
    /// Static assets directory; defaults to `public` next to the executable
    public_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let Args {
        port,
        mut bind,
        public_dir,
    } = Args::parse();

    let public_dir = public_dir.unwrap_or_else(default_public_dir);

    bind.push_str(&format!(":{port}"));

    let log_env = env_logger::Env::default().default_filter_or("info");
    env_logger::init_from_env(log_env);

    let templates = Arc::new(TemplateRegistry::new().expect("Failed loading templates"));
    let assets = StaticAssetStage::new(public_dir).expect("Failed creating asset stage");
    let router = RouterStage::new(default_routes(), templates.clone());

    Server::new(bind)
        .push_stage(Arc::new(AccessLogStage::new(LOG_FILE)))
        // Uncomment to take the site offline without touching the rest:
        // .push_stage(Arc::new(hbserve::router::MaintenanceStage::new(
        //     templates.clone(),
        // )))
        .push_stage(Arc::new(assets))
        .push_stage(Arc::new(router))
        .run()
        .await
        .unwrap()
}

/// Assets root anchored to the installation directory, not the working
/// directory, so launching from elsewhere still finds the same files.
/// Falls back to the checkout layout for `cargo run`.
fn default_public_dir() -> PathBuf {
    let exe_relative = env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|d| d.join("public")));

    match exe_relative {
        Some(dir) if dir.is_dir() => dir,
        _ => PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("public"),
    }
}
