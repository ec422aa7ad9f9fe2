//! Model Capabilities — what the connected Live2D model actually supports.
//!
//! Filled once by [`probe::CapabilityProbe`] and read by every adaptive
//! operation afterwards. Supported sets only ever grow.

pub mod probe;

pub use probe::{CapabilityProbe, CANDIDATE_GROUPS, CANDIDATE_PARAMETERS};

use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

#[derive(Debug, Clone, Default)]
pub struct CapabilityModel {
    supported_parameters: HashSet<String>,
    supported_groups: HashSet<String>,
    has_motions: bool,
    probed: bool,
    warned: HashSet<String>,
}

/// Serializable view of a capability model, for status reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapabilitySnapshot {
    pub parameters: BTreeSet<String>,
    pub groups: BTreeSet<String>,
    pub has_motions: bool,
    pub probed: bool,
}

impl CapabilityModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_parameter_supported(&mut self, id: &str) {
        self.supported_parameters.insert(id.to_string());
    }

    pub fn mark_group_supported(&mut self, group: &str) {
        self.supported_groups.insert(group.to_string());
        self.has_motions = true;
    }

    pub fn supports_parameter(&self, id: &str) -> bool {
        self.supported_parameters.contains(id)
    }

    pub fn supports_group(&self, group: &str) -> bool {
        self.supported_groups.contains(group)
    }

    pub fn has_motions(&self) -> bool {
        self.has_motions
    }

    pub fn is_probed(&self) -> bool {
        self.probed
    }

    pub fn mark_probed(&mut self) {
        self.probed = true;
    }

    /// True the first time a key is seen, false forever after.
    pub fn should_warn(&mut self, key: &str) -> bool {
        self.warned.insert(key.to_string())
    }

    pub fn parameter_count(&self) -> usize {
        self.supported_parameters.len()
    }

    pub fn group_count(&self) -> usize {
        self.supported_groups.len()
    }

    /// Fold another model's findings into this one. Never removes anything.
    pub fn merge(&mut self, other: CapabilityModel) {
        for id in other.supported_parameters {
            self.supported_parameters.insert(id);
        }
        for group in other.supported_groups {
            self.mark_group_supported(&group);
        }
        self.probed |= other.probed;
        self.warned.extend(other.warned);
    }

    pub fn snapshot(&self) -> CapabilitySnapshot {
        CapabilitySnapshot {
            parameters: self.supported_parameters.iter().cloned().collect(),
            groups: self.supported_groups.iter().cloned().collect(),
            has_motions: self.has_motions,
            probed: self.probed,
        }
    }
}
