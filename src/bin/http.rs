#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::net::SocketAddr;

    use line_planner::{PlannerConfig, PlanningSession, http_api, load_config_from_json};
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let addr: SocketAddr = std::env::var("LINE_PLANNER_HTTP_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        .parse()?;
    let config = match std::env::var("LINE_PLANNER_CONFIG") {
        Ok(path) => load_config_from_json(path)?,
        Err(_) => PlannerConfig::default(),
    };

    println!("line-planner HTTP API listening on http://{addr}");
    http_api::serve(addr, PlanningSession::new(config)?).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
