// Pure projection of (snapshot, local identity, overlay) into draw calls.
// The surface itself is opaque: callers supply whatever 2D backend they have.

use crate::config;
use crate::effects::EffectsOverlay;
use crate::snapshot::{ResourceKind, Snapshot};
use std::collections::HashMap;

/// Opaque 2D drawing capability. Colors are CSS-style strings, matching what
/// the snapshot carries for player colors.
pub trait DrawSurface {
    fn clear(&mut self);
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: &str);
    fn fill_circle(&mut self, x: f64, y: f64, radius: f64, color: &str);
    fn stroke_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, width: f64, color: &str);
    fn text(&mut self, x: f64, y: f64, text: &str, font: &str, color: &str);
}

const PLAYER_SIZE: f64 = 20.0;
const RESOURCE_SIZE: f64 = 10.0;
const HEALTH_BAR_HEIGHT: f64 = 3.0;
const SWING_ARM_LENGTH: f64 = 30.0;
const LABEL_FONT: &str = "12px Arial";
const EMOJI_FONT: &str = "20px Arial";
const HEALTH_COLOR: &str = "#e74c3c";
const LABEL_COLOR: &str = "#fff";
const SWING_COLOR: &str = "white";
const MINIMAP_BG: &str = "rgba(0, 0, 0, 0.5)";
const LOCAL_MINIMAP_COLOR: &str = "#e74c3c";

fn resource_color(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Wood => "#8B4513",
        ResourceKind::Stone => "#808080",
        ResourceKind::Food => "#00FF00",
        ResourceKind::Other => "#FFFF00",
    }
}

fn resource_emoji(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Wood => "\u{1F333}",  // tree
        ResourceKind::Stone => "\u{1FAA8}", // rock
        ResourceKind::Food => "\u{1F34E}",  // apple
        ResourceKind::Other => "\u{2728}",  // sparkles
    }
}

/// Draws the world centered on the local player, with an inset minimap.
/// A pure function of its inputs; it owns no state beyond viewport geometry.
#[derive(Debug, Clone)]
pub struct Renderer {
    width: f64,
    height: f64,
    minimap_size: f64,
}

impl Renderer {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            minimap_size: config::MINIMAP_SIZE,
        }
    }

    /// Render one tick. If the snapshot is missing or the local player is not
    /// in it, this performs zero draw calls; the loop must never crash on a
    /// partial view of the world.
    pub fn render(
        &self,
        surface: &mut dyn DrawSurface,
        snapshot: Option<&Snapshot>,
        player_id: &str,
        overlay: &EffectsOverlay,
    ) {
        let Some(snapshot) = snapshot else { return };
        let Some(local) = snapshot.players.get(player_id) else {
            return;
        };

        surface.clear();

        // Camera: every entity is placed relative to the local player, who
        // sits at the viewport center. No interpolation between snapshots.
        let center_x = self.width / 2.0;
        let center_y = self.height / 2.0;
        let view = |x: f64, y: f64| (center_x - local.x + x, center_y - local.y + y);

        for resource in &snapshot.resources {
            let (vx, vy) = view(resource.x, resource.y);
            surface.fill_rect(
                vx - RESOURCE_SIZE / 2.0,
                vy - RESOURCE_SIZE / 2.0,
                RESOURCE_SIZE,
                RESOURCE_SIZE,
                resource_color(resource.kind),
            );
        }

        for (id, player) in &snapshot.players {
            let (vx, vy) = view(player.x, player.y);
            surface.fill_rect(
                vx - PLAYER_SIZE / 2.0,
                vy - PLAYER_SIZE / 2.0,
                PLAYER_SIZE,
                PLAYER_SIZE,
                &player.color,
            );

            let label = if id == player_id {
                "You".to_string()
            } else {
                id.chars().take(6).collect()
            };
            surface.text(
                vx - PLAYER_SIZE / 2.0,
                vy - PLAYER_SIZE / 2.0 - 5.0,
                &label,
                LABEL_FONT,
                LABEL_COLOR,
            );

            // Health bar only while below the maximum.
            if player.health < 100.0 {
                surface.fill_rect(
                    vx - PLAYER_SIZE / 2.0,
                    vy - PLAYER_SIZE,
                    PLAYER_SIZE * (player.health / 100.0),
                    HEALTH_BAR_HEIGHT,
                    HEALTH_COLOR,
                );
            }
        }

        if let Some(angle) = overlay.swing_angle() {
            let hand_x = center_x + angle.cos() * SWING_ARM_LENGTH;
            let hand_y = center_y + angle.sin() * SWING_ARM_LENGTH;
            surface.stroke_line(center_x, center_y, hand_x, hand_y, 3.0, SWING_COLOR);
        }

        // Collection particles drift from their origin toward the inventory
        // corner as their progress advances.
        let target_x = 20.0;
        let target_y = self.height - 20.0;
        for effect in overlay.effects() {
            let (vx, vy) = view(effect.origin_x, effect.origin_y);
            let anim_x = vx + (target_x - vx) * effect.progress();
            let anim_y = vy + (target_y - vy) * effect.progress();
            surface.text(
                anim_x,
                anim_y,
                resource_emoji(effect.kind),
                EMOJI_FONT,
                LABEL_COLOR,
            );
        }

        self.draw_inventory(surface, &local.inventory);
        self.draw_minimap(surface, snapshot, player_id);
    }

    fn draw_inventory(&self, surface: &mut dyn DrawSurface, inventory: &[ResourceKind]) {
        let mut counts: HashMap<ResourceKind, usize> = HashMap::new();
        for item in inventory {
            *counts.entry(*item).or_insert(0) += 1;
        }

        // Fixed kind order keeps the row stable between frames.
        let mut offset = 0.0;
        for kind in [
            ResourceKind::Wood,
            ResourceKind::Stone,
            ResourceKind::Food,
            ResourceKind::Other,
        ] {
            let Some(count) = counts.get(&kind) else {
                continue;
            };
            surface.text(
                20.0 + offset,
                self.height - 40.0,
                &format!("{}\u{00D7}{}", resource_emoji(kind), count),
                EMOJI_FONT,
                LABEL_COLOR,
            );
            offset += 30.0;
        }
    }

    fn draw_minimap(&self, surface: &mut dyn DrawSurface, snapshot: &Snapshot, player_id: &str) {
        let pos_x = self.width - self.minimap_size - config::MINIMAP_MARGIN;
        let pos_y = config::MINIMAP_MARGIN;
        surface.fill_rect(pos_x, pos_y, self.minimap_size, self.minimap_size, MINIMAP_BG);

        let scale = self.minimap_size / snapshot.map_size;

        for resource in &snapshot.resources {
            surface.fill_rect(
                pos_x + resource.x * scale,
                pos_y + resource.y * scale,
                2.0,
                2.0,
                resource_color(resource.kind),
            );
        }

        for (id, player) in &snapshot.players {
            let color = if id == player_id {
                LOCAL_MINIMAP_COLOR
            } else {
                &player.color
            };
            surface.fill_circle(
                pos_x + player.x * scale,
                pos_y + player.y * scale,
                3.0,
                color,
            );
        }
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(config::VIEWPORT_WIDTH, config::VIEWPORT_HEIGHT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{PlayerView, ResourceView};

    /// Records every draw call for assertions.
    #[derive(Debug, Default)]
    struct RecordingSurface {
        calls: Vec<String>,
        rects: Vec<(f64, f64, f64, f64, String)>,
        circles: Vec<(f64, f64, f64, String)>,
    }

    impl DrawSurface for RecordingSurface {
        fn clear(&mut self) {
            self.calls.push("clear".to_string());
        }
        fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: &str) {
            self.calls.push("fill_rect".to_string());
            self.rects.push((x, y, w, h, color.to_string()));
        }
        fn fill_circle(&mut self, x: f64, y: f64, radius: f64, color: &str) {
            self.calls.push("fill_circle".to_string());
            self.circles.push((x, y, radius, color.to_string()));
        }
        fn stroke_line(&mut self, _: f64, _: f64, _: f64, _: f64, _: f64, _: &str) {
            self.calls.push("stroke_line".to_string());
        }
        fn text(&mut self, _: f64, _: f64, text: &str, _: &str, _: &str) {
            self.calls.push(format!("text:{text}"));
        }
    }

    fn player(x: f64, y: f64, health: f64) -> PlayerView {
        PlayerView {
            x,
            y,
            health,
            hunger: 100.0,
            inventory: vec![],
            color: "#3498db".to_string(),
        }
    }

    fn base_snapshot() -> Snapshot {
        let mut players = HashMap::new();
        players.insert("me".to_string(), player(100.0, 100.0, 100.0));
        Snapshot {
            players,
            resources: vec![],
            map_size: 1000.0,
        }
    }

    #[test]
    fn missing_local_player_draws_nothing() {
        let renderer = Renderer::new(800.0, 600.0);
        let overlay = EffectsOverlay::new();
        let mut surface = RecordingSurface::default();

        let mut snapshot = base_snapshot();
        snapshot.players.clear();
        renderer.render(&mut surface, Some(&snapshot), "me", &overlay);
        assert!(surface.calls.is_empty());

        renderer.render(&mut surface, None, "me", &overlay);
        assert!(surface.calls.is_empty());
    }

    #[test]
    fn local_player_is_drawn_at_viewport_center() {
        let renderer = Renderer::new(800.0, 600.0);
        let overlay = EffectsOverlay::new();
        let mut surface = RecordingSurface::default();

        renderer.render(&mut surface, Some(&base_snapshot()), "me", &overlay);
        // First rect is the player body (no resources in this snapshot).
        let (x, y, w, h, _) = surface.rects[0].clone();
        assert_eq!((x, y, w, h), (400.0 - 10.0, 300.0 - 10.0, 20.0, 20.0));
    }

    #[test]
    fn other_entities_are_camera_relative() {
        let renderer = Renderer::new(800.0, 600.0);
        let overlay = EffectsOverlay::new();
        let mut surface = RecordingSurface::default();

        let mut snapshot = base_snapshot();
        snapshot.resources.push(ResourceView {
            id: "r".to_string(),
            x: 150.0,
            y: 80.0,
            kind: ResourceKind::Stone,
        });
        renderer.render(&mut surface, Some(&snapshot), "me", &overlay);

        // view = center - local + entity; resources draw before players.
        let (x, y, _, _, color) = surface.rects[0].clone();
        assert_eq!(x, 400.0 - 100.0 + 150.0 - 5.0);
        assert_eq!(y, 300.0 - 100.0 + 80.0 - 5.0);
        assert_eq!(color, "#808080");
    }

    #[test]
    fn health_bar_only_when_damaged() {
        let renderer = Renderer::new(800.0, 600.0);
        let overlay = EffectsOverlay::new();

        let mut surface = RecordingSurface::default();
        renderer.render(&mut surface, Some(&base_snapshot()), "me", &overlay);
        let full_health_rects = surface.rects.len();

        let mut snapshot = base_snapshot();
        snapshot.players.insert("me".to_string(), player(100.0, 100.0, 50.0));
        let mut surface = RecordingSurface::default();
        renderer.render(&mut surface, Some(&snapshot), "me", &overlay);
        assert_eq!(surface.rects.len(), full_health_rects + 1);

        // Bar width is proportional to health.
        let bar = surface
            .rects
            .iter()
            .find(|(_, _, _, h, color)| *h == 3.0 && color == HEALTH_COLOR)
            .expect("health bar");
        assert_eq!(bar.2, 20.0 * 0.5);
    }

    #[test]
    fn minimap_scales_by_map_size() {
        let renderer = Renderer::new(800.0, 600.0);
        let overlay = EffectsOverlay::new();
        let mut surface = RecordingSurface::default();

        let mut snapshot = base_snapshot();
        snapshot.map_size = 500.0;
        renderer.render(&mut surface, Some(&snapshot), "me", &overlay);

        // Minimap background sits inset at the top-right.
        let bg = surface
            .rects
            .iter()
            .find(|(_, _, w, h, _)| *w == 100.0 && *h == 100.0)
            .expect("minimap background");
        assert_eq!((bg.0, bg.1), (800.0 - 100.0 - 10.0, 10.0));

        // Local player plotted at scale = 100 / 500, distinguished by color.
        let dot = surface.circles.last().expect("player dot");
        assert_eq!((dot.0, dot.1), (690.0 + 100.0 * 0.2, 10.0 + 100.0 * 0.2));
        assert_eq!(dot.3, LOCAL_MINIMAP_COLOR);
    }

    #[test]
    fn swing_and_particles_are_drawn() {
        let renderer = Renderer::new(800.0, 600.0);
        let mut overlay = EffectsOverlay::new();
        let mut snapshot = base_snapshot();
        snapshot.resources.push(ResourceView {
            id: "r".to_string(),
            x: 110.0,
            y: 100.0,
            kind: ResourceKind::Food,
        });
        overlay.trigger_action(Some(&snapshot), "me");

        let mut surface = RecordingSurface::default();
        renderer.render(&mut surface, Some(&snapshot), "me", &overlay);
        assert!(surface.calls.iter().any(|c| c == "stroke_line"));
        assert!(surface.calls.iter().any(|c| c == "text:\u{1F34E}"));
    }

    #[test]
    fn inventory_row_shows_counts() {
        let renderer = Renderer::new(800.0, 600.0);
        let overlay = EffectsOverlay::new();
        let mut snapshot = base_snapshot();
        snapshot.players.get_mut("me").unwrap().inventory =
            vec![ResourceKind::Wood, ResourceKind::Wood, ResourceKind::Food];

        let mut surface = RecordingSurface::default();
        renderer.render(&mut surface, Some(&snapshot), "me", &overlay);
        assert!(
            surface
                .calls
                .iter()
                .any(|c| c == "text:\u{1F333}\u{00D7}2")
        );
        assert!(
            surface
                .calls
                .iter()
                .any(|c| c == "text:\u{1F34E}\u{00D7}1")
        );
    }
}
