use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::collaborators::RenderableId;

pub const DEFAULT_COLLECTIBLE_RADIUS: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerUpKind {
    DoubleDamage,
    SlowMotion,
    HealthPack,
    AmmoRefill,
}

impl PowerUpKind {
    pub const ALL: [Self; 4] = [
        Self::DoubleDamage,
        Self::SlowMotion,
        Self::HealthPack,
        Self::AmmoRefill,
    ];

    pub fn as_token(self) -> &'static str {
        match self {
            Self::DoubleDamage => "double_damage",
            Self::SlowMotion => "slow_motion",
            Self::HealthPack => "health_pack",
            Self::AmmoRefill => "ammo_refill",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_token() == token)
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::DoubleDamage => "DOUBLE DAMAGE!",
            Self::SlowMotion => "SLOW MOTION!",
            Self::HealthPack => "HEALTH RESTORED!",
            Self::AmmoRefill => "AMMO REFILLED!",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ModifierState {
    double_damage_until: Option<f64>,
    slow_motion_until: Option<f64>,
}

impl ModifierState {
    pub fn activate(&mut self, kind: PowerUpKind, now: f64, duration_seconds: f64) {
        let until = Some(now + duration_seconds);
        match kind {
            PowerUpKind::DoubleDamage => self.double_damage_until = until,
            PowerUpKind::SlowMotion => self.slow_motion_until = until,
            PowerUpKind::HealthPack | PowerUpKind::AmmoRefill => {}
        }
    }

    pub fn double_damage(&self) -> bool {
        self.double_damage_until.is_some()
    }

    pub fn slow_motion(&self) -> bool {
        self.slow_motion_until.is_some()
    }

    pub fn expire(&mut self, now: f64) -> Vec<PowerUpKind> {
        let mut expired = Vec::new();
        if self.double_damage_until.is_some_and(|until| now >= until) {
            self.double_damage_until = None;
            expired.push(PowerUpKind::DoubleDamage);
        }
        if self.slow_motion_until.is_some_and(|until| now >= until) {
            self.slow_motion_until = None;
            expired.push(PowerUpKind::SlowMotion);
        }
        expired
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CollectibleId(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub struct Collectible {
    pub id: CollectibleId,
    pub kind: PowerUpKind,
    pub position: Vec3,
    pub radius: f32,
    pub renderable: RenderableId,
    collected: bool,
}

impl Collectible {
    pub fn is_collected(&self) -> bool {
        self.collected
    }

    pub fn collect(&mut self) -> Option<PowerUpKind> {
        if self.collected {
            return None;
        }
        self.collected = true;
        debug!(collectible_id = self.id.0, kind = self.kind.as_token(), "collectible_collected");
        Some(self.kind)
    }
}

#[derive(Debug, Default)]
pub struct CollectibleSet {
    next_id: u64,
    items: Vec<Collectible>,
}

impl CollectibleSet {
    pub fn spawn(
        &mut self,
        kind: PowerUpKind,
        position: Vec3,
        renderable: RenderableId,
    ) -> CollectibleId {
        let id = CollectibleId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.items.push(Collectible {
            id,
            kind,
            position,
            radius: DEFAULT_COLLECTIBLE_RADIUS,
            renderable,
            collected: false,
        });
        id
    }

    pub fn items(&self) -> &[Collectible] {
        &self.items
    }

    pub fn find(&self, id: CollectibleId) -> Option<&Collectible> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn find_mut(&mut self, id: CollectibleId) -> Option<&mut Collectible> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    pub fn available(&self) -> impl Iterator<Item = &Collectible> {
        self.items.iter().filter(|item| !item.collected)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
