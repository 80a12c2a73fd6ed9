//! Telemetry snapshot types and entity classification.
//!
//! The telemetry service reports the live entity list and the camera pose.
//! The classification rules here (what counts as a way-point, a hostile, a
//! fire mechanism) are shared by the state decider and the state handlers so
//! the two can never disagree.

use serde::{Deserialize, Serialize};

use crate::geometry::{Rotator, Vector3};

/// Opaque identifier of a live game entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(u64);

impl EntityId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Blueprint name of the fire mechanism that opens a UI when interacted with.
pub const FIRE_MECHANISM_NAME: &str = "BP_OpenUIMechanism_Rouge_C";
/// Blueprint name of the turret interactable.
pub const TURRET_NAME: &str = "BP_Paotai_Rouge01_C";

const DELIVERY_CLASS_FRAGMENT: &str = "RougeLikeDelivery";
const MONSTER_CLASS_PREFIXES: [&str; 2] = ["BP_Mon_", "BP_Boss_"];
const MONSTER_PARENT_FRAGMENT: &str = "MonsterCharacter";

/// A live entity as reported by the telemetry service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub class_name: String,
    #[serde(default)]
    pub name: String,
    pub position: Vector3,
    #[serde(default)]
    pub is_actor: bool,
    #[serde(default)]
    pub already_dead: bool,
    #[serde(default)]
    pub can_open: bool,
    #[serde(default)]
    pub open_state: bool,
    #[serde(default)]
    pub parent_classes: Vec<String>,
}

impl Entity {
    /// A fire mechanism that can still be opened.
    pub fn is_open_fire_mechanism(&self) -> bool {
        self.name == FIRE_MECHANISM_NAME && self.can_open && !self.open_state
    }

    pub fn is_turret(&self) -> bool {
        self.is_actor && self.name == TURRET_NAME
    }

    /// Way-point (delivery) actor of any kind.
    pub fn is_waypoint(&self) -> bool {
        self.is_actor && self.class_name.contains(DELIVERY_CLASS_FRAGMENT)
    }

    /// Living hostile monster or boss.
    pub fn is_live_hostile(&self) -> bool {
        self.is_actor
            && MONSTER_CLASS_PREFIXES
                .iter()
                .any(|p| self.class_name.starts_with(p))
            && self
                .parent_classes
                .iter()
                .any(|c| c.contains(MONSTER_PARENT_FRAGMENT))
            && !self.already_dead
    }

    /// Hostile that the battle handler is willing to target.
    ///
    /// Unnamed actors are placeholder spawns and are skipped.
    pub fn is_targetable_hostile(&self) -> bool {
        self.is_live_hostile() && !self.name.is_empty() && self.name != "None"
    }

    /// Key used for per-target bookkeeping such as stuck counters.
    pub fn target_key(&self) -> String {
        format!("{}_{}", self.name, self.id)
    }
}

/// Way-point kinds in the order the bot prefers to take them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaypointKind {
    Shop,
    Event,
    Battle2,
    Battle,
    EliteBattle,
    Boss,
}

impl WaypointKind {
    pub const PRIORITY: [WaypointKind; 6] = [
        WaypointKind::Shop,
        WaypointKind::Event,
        WaypointKind::Battle2,
        WaypointKind::Battle,
        WaypointKind::EliteBattle,
        WaypointKind::Boss,
    ];

    /// Exact blueprint class of this way-point kind.
    pub fn class_name(&self) -> &'static str {
        match self {
            WaypointKind::Shop => "BP_RougeLikeDelivery_Shop_C",
            WaypointKind::Event => "BP_RougeLikeDelivery_Event_C",
            WaypointKind::Battle2 => "BP_RougeLikeDelivery_Battle_2_C",
            WaypointKind::Battle => "BP_RougeLikeDelivery_Battle_C",
            WaypointKind::EliteBattle => "BP_RougeLikeDelivery_EliteBattle_C",
            WaypointKind::Boss => "BP_RougeLikeDelivery_Boss_C",
        }
    }
}

impl std::fmt::Display for WaypointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.class_name())
    }
}

/// Camera location and rotation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CameraPose {
    pub location: Vector3,
    pub rotation: Rotator,
}

impl CameraPose {
    pub const fn new(location: Vector3, rotation: Rotator) -> Self {
        Self { location, rotation }
    }
}

/// Everything the telemetry service reported in one read.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub camera: CameraPose,
    pub player_position: Vector3,
    #[serde(default)]
    pub entities: Vec<Entity>,
}

impl TelemetrySnapshot {
    /// Distance from the camera to `position`.
    pub fn distance_from_camera(&self, position: &Vector3) -> f64 {
        self.camera.location.distance(position)
    }

    /// Entities matching `predicate` within `radius` of the camera, nearest
    /// first, paired with their distance.
    pub fn within<F>(&self, radius: f64, predicate: F) -> Vec<(&Entity, f64)>
    where
        F: Fn(&Entity) -> bool,
    {
        let mut found: Vec<_> = self
            .entities
            .iter()
            .filter(|e| predicate(e))
            .map(|e| (e, self.distance_from_camera(&e.position)))
            .filter(|(_, d)| *d <= radius)
            .collect();
        found.sort_by(|a, b| a.1.total_cmp(&b.1));
        found
    }

    /// Nearest entity matching `predicate` within `radius`.
    pub fn nearest<F>(&self, radius: f64, predicate: F) -> Option<(&Entity, f64)>
    where
        F: Fn(&Entity) -> bool,
    {
        self.within(radius, predicate).into_iter().next()
    }

    pub fn has_within<F>(&self, radius: f64, predicate: F) -> bool
    where
        F: Fn(&Entity) -> bool,
    {
        self.entities
            .iter()
            .any(|e| predicate(e) && self.distance_from_camera(&e.position) <= radius)
    }

    /// Highest-priority way-point within `radius`; nearest wins within a kind.
    pub fn preferred_waypoint(&self, radius: f64) -> Option<(&Entity, WaypointKind, f64)> {
        WaypointKind::PRIORITY.iter().find_map(|kind| {
            self.nearest(radius, |e| e.is_actor && e.class_name == kind.class_name())
                .map(|(e, d)| (e, *kind, d))
        })
    }
}
