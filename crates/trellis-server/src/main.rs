mod app;
mod demo;

use anyhow::Context;
use std::sync::Arc;
use tracing::info;
use trellis::{Config, RouteTable};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let mut config = Config::load_default().unwrap_or_else(|e| {
        eprintln!("Failed to load config: {:#}, using defaults", e);
        Config::default()
    });
    apply_env_overrides(&mut config);

    info!(
        "trellis starting: routes_dir={}, case_insensitive={}",
        config.routing.routes_dir, config.routing.case_insensitive
    );

    // Demo modules are compiled in; the registry also serves as the file listing
    let registry = demo::registry();
    let table = RouteTable::build(&config.routing.routes_dir, &registry, &registry, &config.routing)
        .await
        .context("Failed to build route table")?;

    for route in table.routes() {
        info!(
            "  {} -> {} {:?} (middleware {}, layouts {}, app {}, error boundaries {})",
            route.pattern(),
            route.file(),
            route.methods,
            route.middleware.len(),
            route.composition.layouts.len(),
            route.composition.wraps_in_app(),
            route.error_chain.len()
        );
    }

    let app = app::router(Arc::new(table));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// `TRELLIS_HOST` / `TRELLIS_PORT` win over trellis.toml
fn apply_env_overrides(config: &mut Config) {
    if let Ok(host) = std::env::var("TRELLIS_HOST") {
        config.server.host = host;
    }
    if let Some(port) = std::env::var("TRELLIS_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
    {
        config.server.port = port;
    }
}
