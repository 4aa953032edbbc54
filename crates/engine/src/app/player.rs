use tracing::debug;

use super::tasks::{DeferredTaskQueue, TaskKind, TaskOwner};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerState {
    health: u32,
    max_health: u32,
    ammo: u32,
    magazine_size: u32,
    reloading: bool,
}

impl PlayerState {
    pub fn new(max_health: u32, magazine_size: u32) -> Self {
        Self {
            health: max_health,
            max_health,
            ammo: magazine_size,
            magazine_size,
            reloading: false,
        }
    }

    pub fn health(&self) -> u32 {
        self.health
    }

    pub fn max_health(&self) -> u32 {
        self.max_health
    }

    pub fn ammo(&self) -> u32 {
        self.ammo
    }

    pub fn magazine_size(&self) -> u32 {
        self.magazine_size
    }

    pub fn is_reloading(&self) -> bool {
        self.reloading
    }

    pub fn is_dead(&self) -> bool {
        self.health == 0
    }

    pub fn take_damage(&mut self, amount: u32) -> bool {
        if self.is_dead() {
            return false;
        }
        self.health = self.health.saturating_sub(amount);
        self.health == 0
    }

    pub fn heal_full(&mut self) {
        self.health = self.max_health;
    }

    pub fn try_fire(&mut self) -> bool {
        if self.reloading || self.ammo == 0 {
            return false;
        }
        self.ammo -= 1;
        true
    }

    pub fn begin_reload(&mut self, now: f64, reload_seconds: f64, tasks: &mut DeferredTaskQueue) -> bool {
        if self.reloading || self.ammo == self.magazine_size {
            return false;
        }
        self.reloading = true;
        tasks.schedule(TaskOwner::Player, TaskKind::ReloadComplete, now + reload_seconds);
        debug!(ammo = self.ammo, "reload_started");
        true
    }

    pub fn finish_reload(&mut self) -> bool {
        if !self.reloading {
            return false;
        }
        self.reloading = false;
        self.ammo = self.magazine_size;
        true
    }

    pub fn refill_ammo(&mut self, tasks: &mut DeferredTaskQueue) {
        if self.reloading {
            tasks.cancel_owner(TaskOwner::Player);
            self.reloading = false;
        }
        self.ammo = self.magazine_size;
    }
}
