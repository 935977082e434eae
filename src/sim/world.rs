//! World construction, entity factory and command API
//!
//! One [`World`] owns everything for a play session: the static boundary
//! geometry, the body table, entity arenas, the spawn scheduler, the RNG
//! and the game state machine. The presentation layer only calls the
//! command methods and reads [`Hud`](super::state::Hud) snapshots.

use std::collections::HashSet;
use std::fmt;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::body::{Body, BodyId, Category, GroundKind, Mask, ray_hits_ground};
use super::state::{ActiveBonus, BonusCrate, BonusKind, Bullet, Facing, GameState, Hud, Player, Tint, Unit};
use crate::persistence::KvStore;
use crate::tuning::Tuning;

/// Construction failure. The only fatal condition in the crate; every
/// runtime edge case is a policy no-op instead.
#[derive(Debug, Clone, PartialEq)]
pub enum WorldError {
    InvalidFieldSize { width: f32, height: f32 },
}

impl fmt::Display for WorldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorldError::InvalidFieldSize { width, height } => {
                write!(f, "field size must be positive, got {width}x{height}")
            }
        }
    }
}

impl std::error::Error for WorldError {}

/// The simulation world. Single-threaded; advance it with
/// [`step`](super::tick::step) once per host frame.
pub struct World {
    pub(crate) tuning: Tuning,
    pub(crate) width: f32,
    pub(crate) height: f32,
    pub(crate) rng: Pcg32,

    pub(crate) bodies: Vec<Body>,
    next_body_id: u32,

    pub(crate) player: Option<Player>,
    pub(crate) units: Vec<Unit>,
    pub(crate) bullets: Vec<Bullet>,
    pub(crate) crates: Vec<BonusCrate>,

    pub state: GameState,

    pub(crate) move_left: bool,
    pub(crate) move_right: bool,

    spawning: bool,
    pub(crate) spawn_accum: f32,

    /// World clock in seconds, advanced by `step`.
    pub(crate) clock: f64,
    pub(crate) last_now: Option<f64>,
    pub(crate) last_shot: Option<f64>,
    pub(crate) respawn_in: Option<f32>,

    /// Body pairs overlapping as of the previous tick, keyed by id order.
    pub(crate) touching: HashSet<(BodyId, BodyId)>,
}

impl World {
    /// Build a world for the given play-field size. Static geometry is
    /// derived from the size once; resizing means building a new world.
    pub fn new(
        width: f32,
        height: f32,
        seed: u64,
        tuning: Tuning,
        store: Box<dyn KvStore>,
    ) -> Result<Self, WorldError> {
        if !(width > 0.0 && height > 0.0) {
            return Err(WorldError::InvalidFieldSize { width, height });
        }

        let lives = tuning.lives;
        let miss_budget = tuning.miss_budget;
        let mut world = Self {
            tuning,
            width,
            height,
            rng: Pcg32::seed_from_u64(seed),
            bodies: Vec::new(),
            next_body_id: 1,
            player: None,
            units: Vec::new(),
            bullets: Vec::new(),
            crates: Vec::new(),
            state: GameState::new(lives, miss_budget, store),
            move_left: false,
            move_right: false,
            spawning: false,
            spawn_accum: 0.0,
            clock: 0.0,
            last_now: None,
            last_shot: None,
            respawn_in: None,
            touching: HashSet::new(),
        };

        world.build_static();
        world.spawn_player();
        world.start_spawning();
        log::debug!("world built: {width}x{height}, seed {seed}");
        Ok(world)
    }

    // === Static geometry ===

    /// Walls, split ceiling/floor with centered openings, mid platform and
    /// the escape sensor spanning the floor opening.
    fn build_static(&mut self) {
        let t = self.tuning.wall_thickness;
        let (w, h) = (self.width, self.height);

        self.add_static(Vec2::new(0.0, 0.0), Vec2::new(t, h), GroundKind::Wall);
        self.add_static(Vec2::new(w - t, 0.0), Vec2::new(t, h), GroundKind::Wall);

        let top_y = h - t;
        let top_left = (w - self.tuning.top_hole_width) / 2.0;
        let top_right = top_left + self.tuning.top_hole_width;
        self.add_static(Vec2::new(0.0, top_y), Vec2::new(top_left, t), GroundKind::Ceiling);
        self.add_static(
            Vec2::new(top_right, top_y),
            Vec2::new(w - top_right, t),
            GroundKind::Ceiling,
        );

        let (hole_left, hole_right) = self.bottom_hole_span();
        self.add_static(Vec2::new(0.0, 0.0), Vec2::new(hole_left, t), GroundKind::Floor);
        self.add_static(
            Vec2::new(hole_right, 0.0),
            Vec2::new(w - hole_right, t),
            GroundKind::Floor,
        );

        let platform_w = w * self.tuning.platform_frac;
        let platform_h = self.tuning.platform_height;
        self.add_static(
            Vec2::new((w - platform_w) / 2.0, (h - platform_h) / 2.0),
            Vec2::new(platform_w, platform_h),
            GroundKind::Platform,
        );

        // Two floor rectangles leave a gap but generate no contact for a
        // body passing between them, so the opening gets its own sensor.
        let id = self.alloc_body_id();
        self.bodies.push(Body {
            id,
            category: Category::HoleSensor,
            contact_mask: Mask::of(&[Category::Unit]),
            collision_mask: Mask::EMPTY,
            pos: Vec2::new((hole_left + hole_right) / 2.0, t / 2.0),
            vel: Vec2::ZERO,
            half: Vec2::new((hole_right - hole_left) / 2.0, t / 2.0),
            gravity: false,
            dynamic: false,
            ground_kind: None,
        });
    }

    fn add_static(&mut self, min: Vec2, size: Vec2, kind: GroundKind) {
        let id = self.alloc_body_id();
        self.bodies.push(Body {
            id,
            category: Category::Ground,
            contact_mask: Mask::of(&[Category::Unit, Category::Player]),
            collision_mask: Mask::of(&[Category::Unit, Category::Player]),
            pos: min + size / 2.0,
            vel: Vec2::ZERO,
            half: size / 2.0,
            gravity: false,
            dynamic: false,
            ground_kind: Some(kind),
        });
    }

    // === Entity factory ===

    pub(crate) fn spawn_player(&mut self) {
        let size = self.tuning.player_size;
        let pos = Vec2::new(
            self.width * self.tuning.player_spawn_frac,
            self.tuning.wall_thickness + size.y / 2.0 + 2.0,
        );
        let id = self.alloc_body_id();
        self.bodies.push(Body {
            id,
            category: Category::Player,
            contact_mask: Mask::of(&[Category::Ground, Category::Unit, Category::Bonus]),
            collision_mask: Mask::of(&[Category::Ground, Category::Unit]),
            pos,
            vel: Vec2::ZERO,
            half: size / 2.0,
            gravity: true,
            dynamic: true,
            ground_kind: None,
        });
        self.player = Some(Player {
            body: id,
            facing: Facing::default(),
            tint: Tint::Base,
        });
        self.refresh_tint();
    }

    /// Drop a unit through the ceiling opening at a random x.
    pub(crate) fn spawn_unit(&mut self) {
        let half_hole = self.tuning.top_hole_width / 2.0;
        let cx = self.top_hole_center_x();
        let x = self.rng.random_range(cx - half_hole..=cx + half_hole);
        let size = self.tuning.unit_size;
        let id = self.alloc_body_id();
        self.bodies.push(Body {
            id,
            category: Category::Unit,
            contact_mask: Mask::of(&[
                Category::Ground,
                Category::Bullet,
                Category::HoleSensor,
                Category::Player,
            ]),
            collision_mask: Mask::of(&[Category::Ground, Category::Player]),
            pos: Vec2::new(x, self.height + size.y),
            vel: Vec2::ZERO,
            half: size / 2.0,
            gravity: true,
            dynamic: true,
            ground_kind: None,
        });
        self.units.push(Unit {
            body: id,
            dir: None,
            counted: false,
        });
    }

    pub(crate) fn spawn_crate(&mut self) {
        let half_hole = self.tuning.top_hole_width / 2.0;
        let cx = self.top_hole_center_x();
        let x = self.rng.random_range(cx - half_hole..=cx + half_hole);
        let size = self.tuning.crate_size;
        let id = self.alloc_body_id();
        self.bodies.push(Body {
            id,
            category: Category::Bonus,
            contact_mask: Mask::of(&[Category::Player, Category::Ground, Category::HoleSensor]),
            collision_mask: Mask::of(&[Category::Ground]),
            pos: Vec2::new(x, self.height + size.y),
            vel: Vec2::ZERO,
            half: size / 2.0,
            gravity: true,
            dynamic: true,
            ground_kind: None,
        });
        self.crates.push(BonusCrate { body: id });
    }

    // === Spawn scheduler ===

    /// Idempotent: calling while already running is a no-op.
    pub fn start_spawning(&mut self) {
        if self.spawning {
            return;
        }
        self.spawning = true;
        self.spawn_accum = 0.0;
    }

    /// Stops the repeating timer; entities already in flight are unaffected.
    pub fn stop_spawning(&mut self) {
        self.spawning = false;
    }

    pub fn is_spawning(&self) -> bool {
        self.spawning
    }

    /// Advance the repeating spawn timer. Each firing drops one unit and,
    /// one time in `bonus_chance_in`, a bonus crate.
    pub(crate) fn run_spawner(&mut self, dt: f32) {
        if !self.spawning {
            return;
        }
        self.spawn_accum += dt;
        while self.spawn_accum >= self.tuning.spawn_period {
            self.spawn_accum -= self.tuning.spawn_period;
            self.spawn_unit();
            // bonus_chance_in of 0 disables crates entirely.
            if self.tuning.bonus_chance_in > 0
                && self.rng.random_range(0..self.tuning.bonus_chance_in) == 0
            {
                self.spawn_crate();
            }
        }
    }

    // === Command API ===

    pub fn start_move_left(&mut self) {
        self.move_left = true;
        if let Some(p) = &mut self.player {
            p.facing = Facing::Left;
        }
    }

    pub fn stop_move_left(&mut self) {
        self.move_left = false;
    }

    pub fn start_move_right(&mut self) {
        self.move_right = true;
        if let Some(p) = &mut self.player {
            p.facing = Facing::Right;
        }
    }

    pub fn stop_move_right(&mut self) {
        self.move_right = false;
    }

    /// Jump if standing on ground; no double or air jumps. The ground check
    /// is a short downward ray from the player's feet.
    pub fn player_jump(&mut self) {
        let Some(pid) = self.player.as_ref().map(|p| p.body) else {
            return;
        };
        let (x, feet_y) = match self.body(pid) {
            Some(b) => (b.pos.x, b.min().y - 1.0),
            None => return,
        };
        if !ray_hits_ground(&self.bodies, x, feet_y, self.tuning.jump_probe) {
            return;
        }
        let impulse = self.tuning.player_jump_impulse;
        if let Some(b) = self.body_mut(pid) {
            if b.vel.y < 0.0 {
                b.vel.y = 0.0;
            }
            b.vel.y += impulse;
        }
    }

    /// Fire a bullet in the facing direction, subject to the fire cooldown
    /// (shorter while RapidFire is active).
    pub fn player_shoot(&mut self) {
        if self.state.game_over {
            return;
        }
        let Some(player) = &self.player else {
            return;
        };
        let cooldown = if self.state.rapid_fire_active() {
            self.tuning.rapid_fire_cooldown
        } else {
            self.tuning.fire_cooldown
        };
        let now = self.clock;
        if let Some(last) = self.last_shot
            && now - last < cooldown
        {
            return;
        }

        let dir = player.facing.sign();
        let pid = player.body;
        let Some(pb) = self.body(pid) else {
            return;
        };
        let bullet_half = self.tuning.bullet_size / 2.0;
        let pos = Vec2::new(
            pb.pos.x + dir * (pb.half.x + bullet_half.x + self.tuning.bullet_muzzle_gap),
            pb.pos.y + self.tuning.player_size.y * 0.1,
        );
        let vel = Vec2::new(self.tuning.bullet_speed * dir, 0.0);

        self.last_shot = Some(now);
        let id = self.alloc_body_id();
        self.bodies.push(Body {
            id,
            category: Category::Bullet,
            contact_mask: Mask::of(&[Category::Unit]),
            collision_mask: Mask::EMPTY,
            pos,
            vel,
            half: bullet_half,
            gravity: false,
            dynamic: true,
            ground_kind: None,
        });
        self.bullets.push(Bullet {
            body: id,
            ttl: self.tuning.bullet_lifetime,
        });
    }

    /// Tear everything down and rebuild. The only way out of game over.
    /// Best time is the sole survivor.
    pub fn reset(&mut self) {
        self.stop_spawning();
        self.bodies.clear();
        self.units.clear();
        self.bullets.clear();
        self.crates.clear();
        self.player = None;
        self.touching.clear();
        self.respawn_in = None;
        self.last_shot = None;
        self.clock = 0.0;
        self.last_now = None;
        self.state.reset(self.tuning.lives, self.tuning.miss_budget);

        self.build_static();
        self.spawn_player();
        self.start_spawning();
        log::info!("world reset");
    }

    // === Published state ===

    pub fn hud(&self) -> Hud {
        self.state.hud()
    }

    pub fn player_alive(&self) -> bool {
        self.player.is_some()
    }

    pub fn player_tint(&self) -> Option<Tint> {
        self.player.as_ref().map(|p| p.tint)
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn bullet_count(&self) -> usize {
        self.bullets.len()
    }

    pub fn crate_count(&self) -> usize {
        self.crates.len()
    }

    // === Contact/update event sinks ===

    /// Remove a killed unit and credit the kill.
    pub(crate) fn destroy_unit(&mut self, body: BodyId) {
        self.units.retain(|u| u.body != body);
        self.remove_body(body);
        self.state.score += self.tuning.kill_score;
        self.state.kills += 1;
    }

    /// One unit escaped through the floor opening.
    pub(crate) fn register_miss(&mut self) {
        if self.state.game_over {
            return;
        }
        self.state.misses_left -= 1;
        if self.state.misses_left <= 0 {
            self.enter_game_over();
        }
    }

    /// Unit touched the player without a shield up.
    pub(crate) fn kill_player(&mut self) {
        if self.state.game_over {
            return;
        }
        let Some(player) = self.player.take() else {
            return;
        };
        self.remove_body(player.body);
        self.state.lives -= 1;
        if self.state.lives <= 0 {
            self.enter_game_over();
            return;
        }
        self.respawn_in = Some(self.tuning.respawn_delay);
    }

    /// Grant a random bonus kind, overwriting any active one.
    pub(crate) fn grant_random_bonus(&mut self) {
        let kind = if self.rng.random_bool(0.5) {
            BonusKind::RapidFire
        } else {
            BonusKind::Shield
        };
        self.state.active_bonus = Some(ActiveBonus {
            kind,
            time_left: self.tuning.bonus_duration,
        });
        self.refresh_tint();
        log::debug!("bonus collected: {}", kind.label());
    }

    /// Re-derive the player tint from current bonus state.
    pub(crate) fn refresh_tint(&mut self) {
        let shielded = self.state.shield_active();
        if let Some(p) = &mut self.player {
            p.tint = if shielded { Tint::Shield } else { Tint::Base };
        }
    }

    /// Terminal transition: freeze the clock, persist best time, clear the
    /// field. Only `reset` leaves this state.
    pub(crate) fn enter_game_over(&mut self) {
        self.state.game_over = true;
        self.state.finish_run();
        self.stop_spawning();
        self.respawn_in = None;

        let dead: Vec<BodyId> = self
            .units
            .iter()
            .map(|u| u.body)
            .chain(self.bullets.iter().map(|b| b.body))
            .chain(self.crates.iter().map(|c| c.body))
            .collect();
        for id in dead {
            self.remove_body(id);
        }
        self.units.clear();
        self.bullets.clear();
        self.crates.clear();
        if let Some(player) = self.player.take() {
            self.remove_body(player.body);
        }

        log::info!(
            "game over: score {}, kills {}, survived {:.1}s",
            self.state.score,
            self.state.kills,
            self.state.elapsed
        );
    }

    // === Body table ===

    pub(crate) fn alloc_body_id(&mut self) -> BodyId {
        let id = BodyId(self.next_body_id);
        self.next_body_id += 1;
        id
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.iter().find(|b| b.id == id)
    }

    pub(crate) fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.iter_mut().find(|b| b.id == id)
    }

    pub(crate) fn remove_body(&mut self, id: BodyId) {
        self.bodies.retain(|b| b.id != id);
    }

    pub(crate) fn find_unit_mut(&mut self, body: BodyId) -> Option<&mut Unit> {
        self.units.iter_mut().find(|u| u.body == body)
    }

    // === Geometry queries ===

    pub(crate) fn top_hole_center_x(&self) -> f32 {
        self.width * 0.5
    }

    pub(crate) fn bottom_hole_center_x(&self) -> f32 {
        self.width * 0.5
    }

    /// Horizontal extent of the floor opening.
    pub(crate) fn bottom_hole_span(&self) -> (f32, f32) {
        let half = self.tuning.bottom_hole_width / 2.0;
        let cx = self.bottom_hole_center_x();
        (cx - half, cx + half)
    }
}
