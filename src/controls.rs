use crate::camera::{MainCamera, ViewBounds, cursor_sim_position};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use darwins_rockets::sim::SimulationCommand;
use darwins_rockets::world::World as RocketWorld;

/// Mouse interaction state for the target
#[derive(Resource, Default)]
pub struct TargetDrag {
    pub dragging: bool,
    pub hovered: bool,
}

/// System to hover and drag the target with the left mouse button
pub fn drag_target(
    mouse_button: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    bounds: Res<ViewBounds>,
    world: Res<RocketWorld>,
    mut drag: ResMut<TargetDrag>,
    mut commands: EventWriter<SimulationCommand>,
) {
    let Some(cursor) = cursor_sim_position(&windows, &cameras, &bounds) else {
        drag.hovered = false;
        return;
    };

    let over_target = world.target().is_some_and(|target| target.contains(cursor));
    let inside_world = (0.0..=bounds.width).contains(&cursor.x);
    drag.hovered = over_target && inside_world;

    if mouse_button.just_pressed(MouseButton::Left) && drag.hovered {
        drag.dragging = true;
    }
    if mouse_button.just_released(MouseButton::Left) {
        drag.dragging = false;
    }

    if drag.dragging {
        if inside_world {
            commands.send(SimulationCommand::MoveTarget(cursor));
        } else {
            // Leaving the simulation area drops the target
            drag.dragging = false;
        }
    }
}

/// System to map keys to simulation commands: S start, P pause/step, R restart, Q quit
pub fn keyboard_commands(
    keys: Res<ButtonInput<KeyCode>>,
    mut commands: EventWriter<SimulationCommand>,
    mut exit: EventWriter<AppExit>,
) {
    if keys.just_pressed(KeyCode::KeyS) {
        commands.send(SimulationCommand::Start);
    }
    if keys.just_pressed(KeyCode::KeyP) {
        commands.send(SimulationCommand::TogglePause);
    }
    if keys.just_pressed(KeyCode::KeyR) {
        commands.send(SimulationCommand::Restart);
    }
    if keys.just_pressed(KeyCode::KeyQ) {
        exit.send(AppExit::Success);
    }
}
