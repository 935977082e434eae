//! Hatchfall - a platform-defense arcade game, simulation only
//!
//! Enemies drop through a hatch in the ceiling; the player shoots them
//! before they escape through a hatch in the floor, and grabs falling
//! bonus crates along the way.
//!
//! Core modules:
//! - `sim`: deterministic simulation (bodies, contacts, game state)
//! - `tuning`: data-driven game balance
//! - `persistence`: key/value port for state that outlives a run
//!
//! The crate is headless. A host renders from [`Hud`] snapshots and body
//! positions, and drives the world through the command API plus
//! [`sim::step`] once per frame.

pub mod persistence;
pub mod sim;
pub mod tuning;

pub use persistence::{KvStore, MemoryStore};
pub use sim::{Hud, World, WorldError};
pub use tuning::Tuning;

/// Format a duration in seconds as "MM:SS" for HUD display.
///
/// Floors first so 59.9 reads "00:59", not "01:00".
pub fn format_mmss(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_mmss() {
        assert_eq!(format_mmss(0.0), "00:00");
        assert_eq!(format_mmss(59.9), "00:59");
        assert_eq!(format_mmss(75.0), "01:15");
        assert_eq!(format_mmss(-3.0), "00:00");
        assert_eq!(format_mmss(3600.0), "60:00");
    }
}
