use crate::config::{ConfigError, SimulationConfig};
use crate::world::World;
use bevy::prelude::*;
use tracing::{error, info};

/// Resource to control simulation state
#[derive(Resource, PartialEq, Eq, Clone, Copy, Debug, Default)]
pub enum SimulationState {
    /// Waiting for the first start command
    #[default]
    Idle,
    Running,
    Paused,
}

/// Single-step request and running-time bookkeeping
#[derive(Resource, Default, Debug)]
pub struct StepControl {
    pub step_once: bool,
    pub elapsed_secs: f32,
}

/// Requests from input handling; the plugin applies them to the world
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub enum SimulationCommand {
    Start,
    /// Pause a running simulation, or advance one step if already paused
    TogglePause,
    Restart,
    /// Drag the target here (simulation coordinates), clamped inside the world
    MoveTarget(Vec2),
}

/// Owns the rocket [`World`] and advances it once per frame while running
pub struct SimulationPlugin {
    config: SimulationConfig,
    autostart: bool,
}

impl SimulationPlugin {
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            autostart: false,
        })
    }

    /// Start in the running state instead of waiting for [`SimulationCommand::Start`]
    pub fn autostart(mut self, autostart: bool) -> Self {
        self.autostart = autostart;
        self
    }
}

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        let world = match fresh_world(&self.config) {
            Ok(world) => world,
            Err(err) => {
                error!("cannot build rocket world: {err}");
                return;
            }
        };

        let state = if self.autostart {
            SimulationState::Running
        } else {
            SimulationState::Idle
        };

        app.insert_resource(world)
            .insert_resource(state)
            .init_resource::<StepControl>()
            .add_event::<SimulationCommand>()
            .add_systems(Update, (handle_commands, advance_world).chain());
    }
}

/// A new world with the target in its default spot, a quarter of the way down
pub fn fresh_world(config: &SimulationConfig) -> Result<World, ConfigError> {
    let mut world = World::seeded(config.clone())?;
    world.set_target(
        (config.width / 2.0).trunc(),
        (config.height / 4.0).trunc(),
        config.target_radius,
    );
    Ok(world)
}

/// Keep a target of the given radius fully inside the world rectangle
pub fn clamp_target_position(pos: Vec2, radius: f32, config: &SimulationConfig) -> Vec2 {
    let max_x = (config.width - radius).max(radius);
    let max_y = (config.height - radius).max(radius);
    Vec2::new(pos.x.clamp(radius, max_x), pos.y.clamp(radius, max_y))
}

/// System to apply queued simulation commands
pub fn handle_commands(
    mut commands: EventReader<SimulationCommand>,
    mut state: ResMut<SimulationState>,
    mut control: ResMut<StepControl>,
    mut world: ResMut<World>,
) {
    for command in commands.read() {
        match *command {
            SimulationCommand::Start => *state = SimulationState::Running,
            SimulationCommand::TogglePause => match *state {
                SimulationState::Running => *state = SimulationState::Paused,
                SimulationState::Paused => control.step_once = true,
                SimulationState::Idle => {}
            },
            SimulationCommand::Restart => match fresh_world(world.config()) {
                Ok(new_world) => {
                    *world = new_world;
                    if *state == SimulationState::Paused {
                        *state = SimulationState::Running;
                    }
                    info!("simulation restarted");
                }
                Err(err) => error!("restart failed: {err}"),
            },
            SimulationCommand::MoveTarget(pos) => {
                let radius = world
                    .target()
                    .map_or(world.config().target_radius, |target| target.radius);
                let pos = clamp_target_position(pos, radius, world.config());
                world.set_target(pos.x, pos.y, radius);
            }
        }
    }
}

/// System to step the world: every frame while running, once per request while paused
pub fn advance_world(
    time: Res<Time>,
    state: Res<SimulationState>,
    mut control: ResMut<StepControl>,
    mut world: ResMut<World>,
) {
    match *state {
        SimulationState::Running => {
            world.step();
            control.elapsed_secs += time.delta_secs();
        }
        SimulationState::Paused if control.step_once => {
            world.step();
            control.step_once = false;
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_is_clamped_inside_the_world() {
        let config = SimulationConfig {
            width: 400.0,
            height: 300.0,
            ..Default::default()
        };
        assert_eq!(
            clamp_target_position(Vec2::new(-50.0, 1000.0), 20.0, &config),
            Vec2::new(20.0, 280.0)
        );
        assert_eq!(
            clamp_target_position(Vec2::new(150.0, 150.0), 20.0, &config),
            Vec2::new(150.0, 150.0)
        );
    }

    #[test]
    fn fresh_world_places_default_target() {
        let config = SimulationConfig {
            width: 401.0,
            height: 300.0,
            seed: Some(1),
            ..Default::default()
        };
        let world = fresh_world(&config).unwrap();
        let target = world.target().unwrap();
        assert_eq!(target.pos, Vec2::new(200.0, 75.0));
        assert_eq!(target.radius, config.target_radius);
    }

    #[test]
    fn plugin_rejects_invalid_config() {
        let config = SimulationConfig {
            mutation_rate: -0.5,
            ..Default::default()
        };
        assert!(SimulationPlugin::new(config).is_err());
    }
}
