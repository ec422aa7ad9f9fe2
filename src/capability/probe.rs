//! Capability Probe — discover which parameters and motion groups the loaded
//! model exposes by trying each candidate once.
//!
//! Probing a parameter really sets it to 0 and probing a group really plays a
//! motion; both are accepted as a one-time startup cost.

use super::CapabilityModel;
use crate::clock::Clock;
use crate::config::ProbeConfig;
use crate::display::{DisplayCommand, RemoteLink};
use std::time::Duration;
use tracing::{debug, info};

/// Standard Live2D parameters, grouped by what they move.
pub const CANDIDATE_PARAMETERS: &[(&str, &[&str])] = &[
    ("angles", &["ParamAngleX", "ParamAngleY", "ParamAngleZ"]),
    (
        "eyes",
        &[
            "ParamEyeLOpen",
            "ParamEyeROpen",
            "ParamEyeBallX",
            "ParamEyeBallY",
        ],
    ),
    ("mouth", &["ParamMouthOpenY", "ParamMouthForm"]),
    ("body", &["ParamBodyAngleX", "ParamBodyAngleY"]),
    (
        "brows",
        &[
            "ParamBrowLY",
            "ParamBrowRY",
            "ParamBrowLForm",
            "ParamBrowRForm",
        ],
    ),
];

/// Motion groups most models ship with.
pub const CANDIDATE_GROUPS: &[&str] = &["idle", "motion", "greeting", "tap_head", "tap_body"];

pub fn candidate_parameter_ids() -> impl Iterator<Item = &'static str> {
    CANDIDATE_PARAMETERS
        .iter()
        .flat_map(|(_, params)| params.iter().copied())
}

pub struct CapabilityProbe {
    parameter_delay: Duration,
    group_delay: Duration,
}

impl CapabilityProbe {
    pub fn new(config: &ProbeConfig) -> Self {
        Self {
            parameter_delay: Duration::from_millis(config.parameter_delay_ms),
            group_delay: Duration::from_millis(config.group_delay_ms),
        }
    }

    /// Probe every candidate and return what was confirmed.
    ///
    /// If not a single parameter is confirmed, the whole candidate set is
    /// assumed. Some displays acknowledge commands without a success flag,
    /// and a fully inert character is worse than a few ignored updates.
    /// Groups get no such fallback.
    pub async fn run(&self, link: &dyn RemoteLink, clock: &dyn Clock) -> CapabilityModel {
        info!("[Probe] Probing model capabilities...");
        let mut found = CapabilityModel::new();

        for (category, params) in CANDIDATE_PARAMETERS {
            for param in params.iter() {
                if self.test_parameter(link, param).await {
                    found.mark_parameter_supported(param);
                } else {
                    debug!("[Probe] {} parameter {} not confirmed", category, param);
                }
                clock.sleep(self.parameter_delay).await;
            }
        }
        info!("[Probe] Found {} supported parameters", found.parameter_count());

        for group in CANDIDATE_GROUPS {
            if self.test_group(link, group).await {
                found.mark_group_supported(group);
            }
            clock.sleep(self.group_delay).await;
        }
        info!("[Probe] Found {} animation groups", found.group_count());

        if found.group_count() == 0 {
            info!("[Probe] Model doesn't support animations");
        }
        if !found.supports_parameter(crate::emotion::expression::PARAM_MOUTH_OPEN_Y) {
            info!("[Probe] Model doesn't support mouth animation");
        }

        if found.parameter_count() == 0 {
            info!("[Probe] Using fallback: assuming basic parameter support");
            for param in candidate_parameter_ids() {
                found.mark_parameter_supported(param);
            }
        }

        found.mark_probed();
        info!("[Probe] Model capabilities detected");
        found
    }

    async fn test_parameter(&self, link: &dyn RemoteLink, param: &str) -> bool {
        match link.send(DisplayCommand::set_parameter(param, 0.0)).await {
            Ok(response) => response.is_success(),
            Err(e) => {
                debug!("[Probe] setParameter {} failed: {}", param, e);
                false
            }
        }
    }

    async fn test_group(&self, link: &dyn RemoteLink, group: &str) -> bool {
        match link.send(DisplayCommand::play_random_motion(group)).await {
            Ok(response) => response.is_success(),
            Err(e) => {
                debug!("[Probe] playRandomMotion {} failed: {}", group, e);
                false
            }
        }
    }
}
