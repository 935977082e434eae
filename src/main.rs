//! Hatchfall entry point
//!
//! Headless demo: runs a scripted session against an in-memory store and
//! logs the HUD once a second. Pass a path to a tuning JSON to override
//! balance constants.

use hatchfall::persistence::MemoryStore;
use hatchfall::sim::{self, World};
use hatchfall::{Tuning, format_mmss};

fn load_tuning() -> Tuning {
    let Some(path) = std::env::args().nth(1) else {
        return Tuning::default();
    };
    let loaded = std::fs::read_to_string(&path)
        .map_err(|e| e.to_string())
        .and_then(|json| Tuning::from_json(&json).map_err(|e| e.to_string()));
    match loaded {
        Ok(tuning) => {
            log::info!("loaded tuning overrides from {path}");
            tuning
        }
        Err(e) => {
            log::warn!("ignoring tuning file {path}: {e}");
            Tuning::default()
        }
    }
}

fn main() {
    env_logger::init();
    log::info!("hatchfall (headless demo) starting");

    let tuning = load_tuning();
    let mut world = match World::new(390.0, 700.0, 2024, tuning, Box::new(MemoryStore::new())) {
        Ok(world) => world,
        Err(e) => {
            eprintln!("failed to build world: {e}");
            std::process::exit(1);
        }
    };

    // Scripted session: sweep between the walls, firing as we go.
    let dt = 1.0 / 60.0;
    let mut now = 0.0;
    world.start_move_right();
    for frame in 0u32..(120 * 60) {
        now += dt;
        if frame % 8 == 0 {
            world.player_shoot();
        }
        if frame % 240 == 120 {
            world.player_jump();
        }
        match frame % 360 {
            0 => {
                world.stop_move_left();
                world.start_move_right();
            }
            180 => {
                world.stop_move_right();
                world.start_move_left();
            }
            _ => {}
        }

        sim::step(&mut world, now);

        if frame % 60 == 59 {
            let hud = world.hud();
            log::info!(
                "t={} score={} lives={} misses_left={} units={}",
                format_mmss(hud.elapsed),
                hud.score,
                hud.lives,
                hud.misses_left,
                world.unit_count(),
            );
        }
        if world.hud().game_over {
            break;
        }
    }

    let hud = world.hud();
    println!(
        "run over: score {}, kills {}, survived {}, best {}",
        hud.score,
        hud.kills,
        format_mmss(hud.elapsed),
        format_mmss(hud.best_time),
    );
}
