use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::geometry::Vector3;

/// Where to go and what to do on arrival. Fixed for one navigation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavigationTarget {
    pub position: Vector3,
    pub needs_interaction: bool,
    pub timeout: Duration,
}

impl NavigationTarget {
    pub fn new(position: Vector3, needs_interaction: bool, timeout: Duration) -> Self {
        Self {
            position,
            needs_interaction,
            timeout,
        }
    }

    /// A target that is interacted with on arrival.
    pub fn interact_at(position: Vector3, timeout: Duration) -> Self {
        Self::new(position, true, timeout)
    }

    /// A target that only has to be reached.
    pub fn reach(position: Vector3, timeout: Duration) -> Self {
        Self::new(position, false, timeout)
    }
}
