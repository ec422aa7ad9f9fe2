pub mod animation;
pub mod capability;
pub mod clock;
pub mod config;
pub mod dispatcher;
pub mod display;
pub mod emotion;
pub mod error;

#[cfg(test)]
mod tests;

use crate::animation::AnimationController;
use crate::config::AnimatorConfig;
use crate::dispatcher::{ResponseDispatcher, Role};
use crate::display::WebSocketLink;
use std::sync::Arc;
use tracing::{info, warn};

/// Run the animator against the configured display until Ctrl-C.
///
/// `demo_lines` are played back as assistant replies once the display is
/// initialized, which is handy for checking a new model by eye.
pub async fn run(config: AnimatorConfig, demo_lines: Vec<String>) -> anyhow::Result<()> {
    config.validate()?;

    let link = Arc::new(WebSocketLink::new(&config.display));
    info!("[Animator] Using Hime Display at {}", link.url());

    let controller = AnimationController::new(link, config);
    if !controller.initialize().await {
        warn!("[Animator] Display unreachable; commands will retry on demand");
    }

    let dispatcher = ResponseDispatcher::new(controller.clone());
    for line in &demo_lines {
        dispatcher.on_response_start().await;
        let report = dispatcher.on_text(line, Role::Assistant).await;
        info!(
            "[Animator] Demo line: emotion={:?} reaction={:?} spoke_for={:?}",
            report.emotion, report.reaction, report.spoke_for
        );
    }

    match serde_json::to_string(&controller.capabilities().await) {
        Ok(json) => info!("[Animator] Capabilities: {}", json),
        Err(e) => warn!("[Animator] Could not serialize capabilities: {}", e),
    }

    tokio::signal::ctrl_c().await?;
    info!("[Animator] Shutdown signal received");
    controller.shutdown().await;
    Ok(())
}
