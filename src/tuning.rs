//! Data-driven game balance
//!
//! Every gameplay constant lives here as a named field so balance passes
//! never touch simulation code. `Tuning::default()` is the shipped balance;
//! a partial JSON override can be layered on top for playtesting.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// All balance constants for one world instance.
///
/// Distances are in field units (y up, floor at 0), times in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Vertical acceleration applied to gravity-affected bodies (negative = down).
    pub gravity: f32,

    // === Static geometry ===
    /// Thickness of walls, ceiling and floor segments.
    pub wall_thickness: f32,
    /// Width of the ceiling opening units fall through.
    pub top_hole_width: f32,
    /// Width of the floor opening units escape through.
    pub bottom_hole_width: f32,
    /// Platform height.
    pub platform_height: f32,
    /// Platform span as a fraction of field width.
    pub platform_frac: f32,

    // === Player ===
    pub player_size: Vec2,
    /// Spawn x as a fraction of field width.
    pub player_spawn_frac: f32,
    /// Horizontal speed while a move direction is held.
    pub player_move_speed: f32,
    /// Upward velocity added by a jump.
    pub player_jump_impulse: f32,
    /// Vertical speed clamp magnitude.
    pub player_max_fall: f32,
    /// Downward ray length for the ground check under the player.
    pub jump_probe: f32,

    // === Units ===
    pub unit_size: Vec2,
    /// Horizontal speed once a direction is committed.
    pub unit_speed: f32,
    /// Vertical speed clamp magnitude.
    pub unit_max_fall: f32,
    /// Horizontal kick applied when a unit commits its direction.
    pub commit_kick: f32,

    // === Bullets ===
    pub bullet_size: Vec2,
    pub bullet_speed: f32,
    /// Seconds before a bullet self-removes.
    pub bullet_lifetime: f32,
    /// Extra gap between the player edge and a freshly spawned bullet.
    pub bullet_muzzle_gap: f32,

    // === Bonus crates ===
    pub crate_size: Vec2,
    /// Seconds a collected bonus stays active.
    pub bonus_duration: f32,
    /// One-in-N chance of a crate per spawn tick.
    pub bonus_chance_in: u32,

    // === Spawning / pacing ===
    /// Seconds between spawn-scheduler firings.
    pub spawn_period: f32,
    /// Seconds between the player dying and respawning.
    pub respawn_delay: f32,
    /// Seconds between shots.
    pub fire_cooldown: f64,
    /// Seconds between shots while RapidFire is active.
    pub rapid_fire_cooldown: f64,

    // === Scoring / budgets ===
    /// Score awarded per unit killed.
    pub kill_score: u64,
    /// Starting lives.
    pub lives: i32,
    /// Units allowed to escape before game over.
    pub miss_budget: i32,

    // === Update-step housekeeping ===
    /// Distance past the field bounds before an entity is reclaimed.
    pub cull_margin: f32,
    /// Height above the floor top at which the fallback miss check fires.
    pub sensor_grace: f32,
    /// Upper clamp on a single frame's delta time.
    pub max_frame_dt: f32,
    /// Delta assumed for the very first tick of a run.
    pub fallback_dt: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            gravity: -980.0,

            wall_thickness: 24.0,
            top_hole_width: 100.0,
            bottom_hole_width: 120.0,
            platform_height: 12.0,
            platform_frac: 0.65,

            player_size: Vec2::new(24.0, 36.0),
            player_spawn_frac: 0.25,
            player_move_speed: 220.0,
            player_jump_impulse: 360.0,
            player_max_fall: 800.0,
            jump_probe: 8.0,

            unit_size: Vec2::new(18.0, 32.0),
            unit_speed: 160.0,
            unit_max_fall: 600.0,
            commit_kick: 12.0,

            bullet_size: Vec2::new(10.0, 4.0),
            bullet_speed: 520.0,
            bullet_lifetime: 2.0,
            bullet_muzzle_gap: 2.0,

            crate_size: Vec2::new(18.0, 18.0),
            bonus_duration: 8.0,
            bonus_chance_in: 8,

            spawn_period: 0.8,
            respawn_delay: 0.6,
            fire_cooldown: 0.35,
            rapid_fire_cooldown: 0.12,

            kill_score: 10,
            lives: 3,
            miss_budget: 5,

            cull_margin: 500.0,
            sensor_grace: 2.0,
            max_frame_dt: 0.25,
            fallback_dt: 1.0 / 60.0,
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) JSON override.
    ///
    /// Missing fields fall back to the shipped defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_override_keeps_defaults() {
        let t = Tuning::from_json(r#"{ "unit_speed": 200.0 }"#).unwrap();
        assert_eq!(t.unit_speed, 200.0);
        assert_eq!(t.spawn_period, Tuning::default().spawn_period);
        assert_eq!(t.lives, 3);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(Tuning::from_json("not json").is_err());
    }
}
