//! Headless simulation module
//!
//! All gameplay logic lives here, with no rendering or platform
//! dependencies:
//! - Seeded RNG only, so runs are reproducible
//! - One logical thread; `step` is the only way time advances
//! - Entities are plain structs keyed into the body table by stable handles

pub mod body;
pub(crate) mod contacts;
pub mod state;
pub mod tick;
pub mod world;

pub use body::{Body, BodyId, Category, GroundKind, Mask};
pub use state::{ActiveBonus, BonusKind, Facing, GameState, Hud, Tint};
pub use tick::step;
pub use world::{World, WorldError};
