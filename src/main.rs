mod camera;
mod controls;
mod render;

use bevy::prelude::*;
use bevy_egui::{EguiContexts, EguiPlugin, egui};
use camera::{CameraState, ViewBounds, camera_pan, camera_zoom, setup_camera};
use controls::{TargetDrag, drag_target, keyboard_commands};
use darwins_rockets::config::{APP_MUTATION_RATE, ConfigError, SEED_ENV_VAR, SimulationConfig};
use darwins_rockets::sim::{SimulationCommand, SimulationPlugin, SimulationState, StepControl};
use darwins_rockets::world::World as RocketWorld;
use render::{draw_overlays, draw_world};

fn main() -> Result<(), ConfigError> {
    // An unparsable seed is ignored and the run seeds from entropy
    let seed = std::env::var(SEED_ENV_VAR)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok());

    let config = SimulationConfig {
        mutation_rate: APP_MUTATION_RATE,
        seed,
        ..Default::default()
    };
    let simulation = SimulationPlugin::new(config.clone())?;

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Darwin's Rockets - Genetic Algorithm Simulation".to_string(),
                resolution: (config.width, config.height).into(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(EguiPlugin)
        .add_plugins(simulation)
        .insert_resource(ClearColor(Color::srgb(0.12, 0.13, 0.18)))
        .insert_resource(ViewBounds {
            width: config.width,
            height: config.height,
        })
        .init_resource::<CameraState>()
        .init_resource::<TargetDrag>()
        .add_systems(Startup, (setup_camera, announce_run))
        .add_systems(
            Update,
            (
                camera_zoom,
                camera_pan,
                keyboard_commands,
                drag_target,
                draw_world,
                draw_overlays,
                ui_system,
            ),
        )
        .run();

    Ok(())
}

fn announce_run(world: Res<RocketWorld>) {
    let config = world.config();
    info!(
        rockets = config.population_size,
        dna_length = config.dna_length,
        mutation_rate = config.mutation_rate,
        seed = ?config.seed,
        "press S to launch"
    );
}

fn ui_system(
    mut contexts: EguiContexts,
    world: Res<RocketWorld>,
    state: Res<SimulationState>,
    control: Res<StepControl>,
    camera_state: Res<CameraState>,
    mut commands: EventWriter<SimulationCommand>,
) {
    let stats = world.stats();

    egui::Window::new("Darwin's Rockets")
        .default_pos(egui::pos2(10.0, 10.0))
        .show(contexts.ctx_mut(), |ui| {
            ui.horizontal(|ui| {
                if ui.button("▶ Start").clicked() {
                    commands.send(SimulationCommand::Start);
                }
                let pause_text = if *state == SimulationState::Paused {
                    "⏭ Step"
                } else {
                    "⏸ Pause"
                };
                if ui.button(pause_text).clicked() {
                    commands.send(SimulationCommand::TogglePause);
                }
                if ui.button("⟲ Restart").clicked() {
                    commands.send(SimulationCommand::Restart);
                }
            });

            let state_text = match *state {
                SimulationState::Idle => "Waiting",
                SimulationState::Running => "Running",
                SimulationState::Paused => "Paused",
            };
            ui.label(format!("State: {}", state_text));
            ui.label(format!("Elapsed: {:.1}s", control.elapsed_secs));

            ui.separator();
            ui.heading(format!("Generation {}", world.generation()));

            let progress = world.generation_progress();
            ui.add(egui::ProgressBar::new(progress).text(format!(
                "step {} / {}",
                world.generation_step(),
                world.max_steps_per_generation()
            )));

            ui.separator();
            ui.heading("Statistics");
            ui.separator();

            ui.label(format!("Rockets: {}", world.rocket_count()));
            ui.label(format!("Reached target: {}", stats.rockets_reached_current_gen));
            ui.label(format!("Reached (all gens): {}", stats.total_rockets_reached_target));
            ui.label(format!("Best fitness: {:.4}", stats.best_fitness_current_gen));
            ui.label(format!("Best fitness (all time): {:.4}", stats.best_fitness_all_time));
            if stats.best_distance_achieved.is_finite() {
                ui.label(format!("Best distance: {:.1}", stats.best_distance_achieved));
            } else {
                ui.label("Best distance: -");
            }

            if let Some(summary) = world.last_summary() {
                ui.separator();
                ui.label(format!(
                    "Last gen {}: {} hit, best {:.2} in {} steps",
                    summary.generation, summary.reached_target, summary.best_fitness, summary.steps
                ));
            }

            ui.separator();
            ui.label("Controls:");
            ui.label("• S - Start");
            ui.label("• P - Pause / step once");
            ui.label("• R - Restart");
            ui.label("• Q - Quit");
            ui.label("• Left drag - Move target");
            ui.label(format!("• Wheel / middle drag - Zoom {:.2}x / pan", camera_state.zoom));
        });
}
