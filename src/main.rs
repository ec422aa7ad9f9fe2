use hime_animator::config::{default_config_path, load_config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_config(&default_config_path());

    let demo_lines: Vec<String> = std::env::args().skip(1).collect();
    hime_animator::run(config, demo_lines).await
}
