use bevy::input::mouse::{MouseMotion, MouseWheel};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

#[derive(Component)]
pub struct MainCamera;

/// Zoom level and pan offset of the view onto the simulation area
#[derive(Resource)]
pub struct CameraState {
    pub zoom: f32,
    pub offset: Vec2,
    pub is_panning: bool,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            offset: Vec2::ZERO,
            is_panning: false,
        }
    }
}

/// Size of the simulated rectangle, used to map between coordinate spaces
#[derive(Resource, Clone, Copy)]
pub struct ViewBounds {
    pub width: f32,
    pub height: f32,
}

impl ViewBounds {
    /// Simulation space (origin top-left, y down) to Bevy space (centred, y up)
    pub fn to_screen(&self, sim: Vec2) -> Vec2 {
        Vec2::new(sim.x - self.width / 2.0, self.height / 2.0 - sim.y)
    }

    pub fn to_sim(&self, screen: Vec2) -> Vec2 {
        Vec2::new(screen.x + self.width / 2.0, self.height / 2.0 - screen.y)
    }
}

pub fn setup_camera(mut commands: Commands) {
    commands.spawn((Camera2d, MainCamera, Transform::from_xyz(0.0, 0.0, 0.0)));
}

/// Cursor position in simulation coordinates, if it is over the window
pub fn cursor_sim_position(
    windows: &Query<&Window, With<PrimaryWindow>>,
    cameras: &Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    bounds: &ViewBounds,
) -> Option<Vec2> {
    let window = windows.get_single().ok()?;
    let (camera, camera_transform) = cameras.get_single().ok()?;
    let cursor = window.cursor_position()?;
    let world_pos = camera.viewport_to_world_2d(camera_transform, cursor).ok()?;
    Some(bounds.to_sim(world_pos))
}

pub fn camera_zoom(
    mut scroll_events: EventReader<MouseWheel>,
    mut camera_state: ResMut<CameraState>,
    mut query: Query<&mut OrthographicProjection, With<MainCamera>>,
) {
    for event in scroll_events.read() {
        let zoom_delta = -event.y * 0.1;
        camera_state.zoom = (camera_state.zoom + zoom_delta).clamp(0.25, 4.0);

        if let Ok(mut projection) = query.get_single_mut() {
            projection.scale = camera_state.zoom;
        }
    }
}

pub fn camera_pan(
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut motion_events: EventReader<MouseMotion>,
    mut camera_state: ResMut<CameraState>,
    mut query: Query<&mut Transform, With<MainCamera>>,
) {
    if mouse_button.just_pressed(MouseButton::Middle) {
        camera_state.is_panning = true;
    }
    if mouse_button.just_released(MouseButton::Middle) {
        camera_state.is_panning = false;
    }

    if !camera_state.is_panning {
        motion_events.clear();
        return;
    }

    for event in motion_events.read() {
        // Screen y grows downward, world y upward
        let pan_delta = Vec2::new(-event.delta.x, event.delta.y) * camera_state.zoom;
        camera_state.offset += pan_delta;
        if let Ok(mut transform) = query.get_single_mut() {
            transform.translation.x = camera_state.offset.x;
            transform.translation.y = camera_state.offset.y;
        }
    }
}
