use crate::camera::{MainCamera, ViewBounds};
use crate::controls::TargetDrag;
use bevy::math::Isometry2d;
use bevy::prelude::*;
use bevy_egui::{EguiContexts, egui};
use darwins_rockets::population::normalized_fitnesses;
use darwins_rockets::rocket::{Rocket, Target};
use darwins_rockets::sim::SimulationState;
use darwins_rockets::world::World as RocketWorld;

const BOUNDARY_COLOR: Color = Color::srgb(0.78, 0.78, 0.82);
const GRID_COLOR: Color = Color::srgba(0.9, 0.9, 0.92, 0.15);
const START_MARKER_COLOR: Color = Color::srgb(0.7, 0.7, 0.78);
const TARGET_COLOR: Color = Color::srgb(0.86, 0.2, 0.24);
const TARGET_HOVER_COLOR: Color = Color::srgb(1.0, 0.45, 0.3);
const ARROW_COLOR: Color = Color::WHITE;
const GRID_SPACING: f32 = 50.0;
/// Gap between a rocket's edge and its fitness label
const LABEL_OFFSET: f32 = 25.0;
/// Normalized fitness above which a label is drawn large and bright
const HIGHLIGHT_FITNESS: f32 = 0.8;

fn at(pos: Vec2) -> Isometry2d {
    Isometry2d::from_translation(pos)
}

/// Red for the weakest rocket, green for the generation's best or any hit
pub fn rocket_color(rocket: &Rocket, best_fitness: f32, target: Option<&Target>) -> Color {
    if target.is_some_and(|target| target.contains(rocket.pos)) {
        return Color::srgb(0.0, 1.0, 0.0);
    }
    let norm = if best_fitness > 0.0 {
        (rocket.fitness / best_fitness).clamp(0.0, 1.0)
    } else {
        0.0
    };
    Color::srgb(1.0 - norm, norm, 0.0)
}

/// System to draw the simulation area and every body in it
pub fn draw_world(
    mut gizmos: Gizmos,
    world: Res<RocketWorld>,
    bounds: Res<ViewBounds>,
    drag: Res<TargetDrag>,
) {
    let size = Vec2::new(bounds.width, bounds.height);

    // Background grid
    let mut x = 0.0;
    while x <= bounds.width {
        gizmos.line_2d(
            bounds.to_screen(Vec2::new(x, 0.0)),
            bounds.to_screen(Vec2::new(x, bounds.height)),
            GRID_COLOR,
        );
        x += GRID_SPACING;
    }
    let mut y = 0.0;
    while y <= bounds.height {
        gizmos.line_2d(
            bounds.to_screen(Vec2::new(0.0, y)),
            bounds.to_screen(Vec2::new(bounds.width, y)),
            GRID_COLOR,
        );
        y += GRID_SPACING;
    }

    gizmos.rect_2d(at(Vec2::ZERO), size, BOUNDARY_COLOR);

    for start in world.population().start_positions() {
        let marker = bounds.to_screen(*start);
        gizmos.circle_2d(at(marker), 3.0, START_MARKER_COLOR);
        gizmos.line_2d(
            bounds.to_screen(*start + Vec2::new(0.0, 10.0)),
            bounds.to_screen(*start + Vec2::new(0.0, 30.0)),
            START_MARKER_COLOR,
        );
    }

    let target = world.target();
    if let Some(target) = target {
        let center = bounds.to_screen(target.pos);
        let (color, radius) = if drag.hovered || drag.dragging {
            gizmos.circle_2d(at(center), target.radius + 11.0, Color::srgba(1.0, 1.0, 1.0, 0.2));
            (TARGET_HOVER_COLOR, target.radius + 3.0)
        } else {
            (TARGET_COLOR, target.radius)
        };
        gizmos.circle_2d(at(center), radius, color);
        gizmos.circle_2d(at(center), (radius - 5.0).max(1.0), Color::WHITE);
        gizmos.circle_2d(at(center), 3.0, Color::WHITE);
    }

    let best_fitness = world.stats().best_fitness_current_gen;
    for rocket in world.rockets() {
        let color = rocket_color(rocket, best_fitness, target);

        // Trail fades in from oldest to newest
        let len = rocket.trail().len().max(1) as f32;
        gizmos.linestrip_gradient_2d(rocket.trail().enumerate().map(|(i, pos)| {
            (bounds.to_screen(pos), color.with_alpha(i as f32 / len))
        }));

        let center = bounds.to_screen(rocket.pos);
        gizmos.circle_2d(at(center), rocket.radius(), color);

        if rocket.vel.length() > 0.1 {
            // Screen space flips y, so flip the heading too
            let heading = Vec2::new(rocket.vel.x, -rocket.vel.y).normalize();
            gizmos.arrow_2d(center, center + heading * (rocket.radius() + 5.0), ARROW_COLOR);
        }
    }
}

/// Label text, size and brightness for one rocket's normalized fitness
pub fn fitness_label(normalized: f32) -> (String, f32, egui::Color32) {
    let text = format!("{normalized:.4}");
    if normalized > HIGHLIGHT_FITNESS {
        (text, 14.0, egui::Color32::WHITE)
    } else {
        (text, 11.0, egui::Color32::from_gray(200))
    }
}

/// Hint shown over the world while it is not advancing
pub fn status_message(state: SimulationState) -> Option<&'static str> {
    match state {
        SimulationState::Running => None,
        SimulationState::Idle => Some("Press S to launch the rockets, Q to quit"),
        SimulationState::Paused => Some("Paused: P to step, S to resume, R to restart or Q to quit"),
    }
}

/// System to label every rocket with its normalized fitness and show the status hint
pub fn draw_overlays(
    mut contexts: EguiContexts,
    world: Res<RocketWorld>,
    state: Res<SimulationState>,
    bounds: Res<ViewBounds>,
    cameras: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
) {
    let ctx = contexts.ctx_mut();

    if let Ok((camera, camera_transform)) = cameras.get_single() {
        let fitnesses: Vec<f32> = world.rockets().map(|rocket| rocket.fitness).collect();
        let painter = ctx.layer_painter(egui::LayerId::background());
        for (rocket, normalized) in world.rockets().zip(normalized_fitnesses(&fitnesses)) {
            let above = rocket.pos - Vec2::new(0.0, rocket.radius() + LABEL_OFFSET);
            let Ok(screen) =
                camera.world_to_viewport(camera_transform, bounds.to_screen(above).extend(0.0))
            else {
                continue;
            };
            let (text, size, color) = fitness_label(normalized);
            painter.text(
                egui::pos2(screen.x, screen.y),
                egui::Align2::CENTER_CENTER,
                text,
                egui::FontId::proportional(size),
                color,
            );
        }
    }

    if let Some(message) = status_message(*state) {
        egui::Area::new(egui::Id::new("status_message"))
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.heading(message);
                });
            });
    }
}
