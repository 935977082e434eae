//! Entities and the game state machine
//!
//! Entity structs hold only simulation bookkeeping; their position and
//! velocity live in the body table under the same handle, so the whole
//! module stays testable without any renderer.

use serde::{Deserialize, Serialize};

use super::body::BodyId;
use crate::persistence::{BEST_TIME_KEY, KvStore};

/// Horizontal facing of the player, decides bullet direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }
}

/// Player sprite tint, the one render-facing side effect of bonus state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tint {
    Base,
    Shield,
}

/// The player-controlled character.
#[derive(Debug, Clone)]
pub struct Player {
    pub body: BodyId,
    pub facing: Facing,
    pub tint: Tint,
}

/// A descending enemy. `dir` stays `None` until the unit first lands on the
/// platform or the floor; once set it never changes for that unit.
#[derive(Debug, Clone)]
pub struct Unit {
    pub body: BodyId,
    pub dir: Option<f32>,
    /// Guards against registering the same escape twice (sensor contact and
    /// the fallback check can both see one unit).
    pub counted: bool,
}

#[derive(Debug, Clone)]
pub struct Bullet {
    pub body: BodyId,
    /// Seconds until self-removal.
    pub ttl: f32,
}

/// A falling bonus crate. The bonus kind is rolled at pickup, not at spawn.
#[derive(Debug, Clone)]
pub struct BonusCrate {
    pub body: BodyId,
}

/// Time-limited modifier granted by a crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BonusKind {
    RapidFire,
    Shield,
}

impl BonusKind {
    pub fn label(self) -> &'static str {
        match self {
            BonusKind::RapidFire => "Rapid Fire",
            BonusKind::Shield => "Shield",
        }
    }
}

/// The single active bonus slot. Picking up a new crate overwrites it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveBonus {
    pub kind: BonusKind,
    pub time_left: f32,
}

/// Read-only snapshot published to the HUD each frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hud {
    pub score: u64,
    pub kills: u32,
    pub lives: i32,
    pub misses_left: i32,
    pub elapsed: f64,
    pub best_time: f64,
    pub bonus: Option<ActiveBonus>,
    pub game_over: bool,
}

/// Scores, budgets and the run clock. Mutated only by the contact
/// dispatcher and the per-frame update step; everything else reads the
/// [`Hud`] snapshot.
pub struct GameState {
    pub score: u64,
    pub kills: u32,
    pub lives: i32,
    pub misses_left: i32,
    pub elapsed: f64,
    pub best_time: f64,
    pub game_over: bool,
    pub active_bonus: Option<ActiveBonus>,

    run_start: Option<f64>,
    running: bool,
    store: Box<dyn KvStore>,
}

impl GameState {
    pub fn new(lives: i32, miss_budget: i32, store: Box<dyn KvStore>) -> Self {
        let best_time = store.get(BEST_TIME_KEY).unwrap_or(0.0);
        Self {
            score: 0,
            kills: 0,
            lives,
            misses_left: miss_budget,
            elapsed: 0.0,
            best_time,
            game_over: false,
            active_bonus: None,
            run_start: None,
            running: false,
            store,
        }
    }

    pub fn shield_active(&self) -> bool {
        matches!(
            self.active_bonus,
            Some(ActiveBonus {
                kind: BonusKind::Shield,
                ..
            })
        )
    }

    pub fn rapid_fire_active(&self) -> bool {
        matches!(
            self.active_bonus,
            Some(ActiveBonus {
                kind: BonusKind::RapidFire,
                ..
            })
        )
    }

    /// Capture the run's start reference on the first tick after a (re)start.
    pub fn tick_clock(&mut self, now: f64) {
        if self.game_over {
            return;
        }
        if self.run_start.is_none() {
            self.run_start = Some(now);
            self.running = true;
        }
        if self.running {
            let start = self.run_start.unwrap_or(now);
            self.elapsed = (now - start).max(0.0);
        }
    }

    /// Freeze the clock and persist the best time if this run beat it.
    pub fn finish_run(&mut self) {
        self.running = false;
        if self.elapsed > self.best_time {
            self.best_time = self.elapsed;
            self.store.set(BEST_TIME_KEY, self.best_time);
            log::info!("new best time: {:.1}s", self.best_time);
        }
    }

    /// Restore initial values. Best time is the only field that survives.
    pub fn reset(&mut self, lives: i32, miss_budget: i32) {
        self.score = 0;
        self.kills = 0;
        self.lives = lives;
        self.misses_left = miss_budget;
        self.elapsed = 0.0;
        self.game_over = false;
        self.active_bonus = None;
        self.run_start = None;
        self.running = false;
    }

    pub fn hud(&self) -> Hud {
        Hud {
            score: self.score,
            kills: self.kills,
            lives: self.lives,
            misses_left: self.misses_left,
            elapsed: self.elapsed,
            best_time: self.best_time,
            bonus: self.active_bonus,
            game_over: self.game_over,
        }
    }
}
