use std::collections::HashMap;

use rail_engine::{
    HudSnapshot, LifecycleState, PowerUpKind, RenderableDesc, RenderableId, RenderableKind,
    SceneGraph, UiSink,
};
use tracing::{debug, info};

/// Logs UI side effects. HUD snapshots arrive every tick; only changes that a
/// player would notice are logged.
#[derive(Debug, Default)]
pub(crate) struct ConsoleUi {
    last_hud: Option<HudSnapshot>,
}

impl UiSink for ConsoleUi {
    fn update_hud(&mut self, hud: &HudSnapshot) {
        if self
            .last_hud
            .is_some_and(|last| !hud_changed_visibly(&last, hud))
        {
            return;
        }
        info!(
            health = hud.health,
            max_health = hud.max_health,
            ammo = hud.ammo,
            magazine_size = hud.magazine_size,
            reloading = hud.reloading,
            score = hud.score,
            combo = hud.combo_streak,
            scene = hud.scene_index + 1,
            total_scenes = hud.total_scenes,
            enemies_remaining = hud.enemies_remaining,
            state = hud.lifecycle.as_str(),
            "hud"
        );
        self.last_hud = Some(*hud);
    }

    fn show_headshot_indicator(&mut self) {
        info!(banner = "HEADSHOT!", "headshot");
    }

    fn show_power_up_message(&mut self, kind: PowerUpKind) {
        info!(
            power_up = kind.as_token(),
            banner = kind.message(),
            "power_up_collected"
        );
    }

    fn show_scene_title(&mut self, title: &str) {
        info!(title, "scene_title");
    }
}

fn hud_changed_visibly(last: &HudSnapshot, next: &HudSnapshot) -> bool {
    last.health != next.health
        || last.score != next.score
        || last.reloading != next.reloading
        || last.scene_index != next.scene_index
        || last.enemies_remaining != next.enemies_remaining
        || last.lifecycle != next.lifecycle
        || (next.lifecycle == LifecycleState::Gameplay && next.ammo == 0 && last.ammo != 0)
}

#[derive(Debug, Default)]
pub(crate) struct LoggedSceneGraph {
    visible: HashMap<RenderableId, RenderableKind>,
}

impl SceneGraph for LoggedSceneGraph {
    fn add(&mut self, id: RenderableId, desc: &RenderableDesc) {
        debug!(
            renderable = id.0,
            name = %desc.debug_name,
            x = desc.position.x,
            y = desc.position.y,
            z = desc.position.z,
            "renderable_added"
        );
        self.visible.insert(id, desc.kind.clone());
    }

    fn remove(&mut self, id: RenderableId) {
        if self.visible.remove(&id).is_some() {
            debug!(renderable = id.0, "renderable_removed");
        }
    }

    fn swap_visual(&mut self, id: RenderableId, kind: &RenderableKind) {
        if let Some(current) = self.visible.get_mut(&id) {
            debug!(renderable = id.0, kind = ?kind, "renderable_swapped");
            *current = kind.clone();
        }
    }
}
