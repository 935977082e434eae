//! Contact detection and game-rule dispatch
//!
//! Contacts are begin-edge events: a pair is reported the tick it starts
//! overlapping and not again until the bodies separate. Each event goes
//! through one dispatch table keyed by the normalized unordered category
//! pair, so (Bullet, Unit) and (Unit, Bullet) hit the same rule.

use std::collections::HashSet;

use super::body::{BodyId, Category, GroundKind};
use super::world::World;

/// Order-independent key for a body pair.
#[inline]
fn pair_key(a: BodyId, b: BodyId) -> (BodyId, BodyId) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Scan the body table for overlapping pairs that either side wants
/// reported, and return the pairs that were not touching last tick.
pub(crate) fn collect_begins(world: &mut World) -> Vec<(BodyId, BodyId)> {
    let mut now_touching = HashSet::new();
    let bodies = &world.bodies;
    for (i, a) in bodies.iter().enumerate() {
        for b in &bodies[i + 1..] {
            if !a.dynamic && !b.dynamic {
                continue;
            }
            if !(a.contact_mask.contains(b.category) || b.contact_mask.contains(a.category)) {
                continue;
            }
            if a.overlaps(b) {
                now_touching.insert(pair_key(a.id, b.id));
            }
        }
    }

    let mut begins: Vec<_> = now_touching.difference(&world.touching).copied().collect();
    begins.sort();
    world.touching = now_touching;
    begins
}

/// Resolve one contact-begin event into its game rule. Terminal state
/// absorbs everything; a body removed by an earlier event this tick makes
/// the event a no-op.
pub(crate) fn dispatch(world: &mut World, a: BodyId, b: BodyId) {
    if world.state.game_over {
        return;
    }
    let (ca, cb) = match (world.body(a), world.body(b)) {
        (Some(ba), Some(bb)) => (ba.category, bb.category),
        _ => return,
    };
    let (first, second, low, high) = if ca.bit() <= cb.bit() {
        (a, b, ca, cb)
    } else {
        (b, a, cb, ca)
    };

    match (low, high) {
        (Category::Unit, Category::Ground) => unit_ground(world, first, second),
        (Category::Unit, Category::Bullet) => {
            world.bullets.retain(|bl| bl.body != second);
            world.remove_body(second);
            world.destroy_unit(first);
        }
        (Category::Unit, Category::Player) => {
            if !world.state.shield_active() {
                world.kill_player();
            }
        }
        (Category::Unit, Category::HoleSensor) => unit_escaped(world, first),
        (Category::Player, Category::Bonus) => {
            world.crates.retain(|c| c.body != second);
            world.remove_body(second);
            world.grant_random_bonus();
        }
        // Remaining reported pairs (player landing, crates settling) carry
        // no game rule.
        _ => {}
    }
}

/// First platform or floor contact commits the unit's travel direction
/// toward the floor opening, with a small kick to get it moving. Later
/// ground contacts never re-evaluate.
fn unit_ground(world: &mut World, unit_id: BodyId, ground_id: BodyId) {
    let kind = match world.body(ground_id).and_then(|b| b.ground_kind) {
        Some(k) => k,
        None => return,
    };
    if !matches!(kind, GroundKind::Platform | GroundKind::Floor) {
        return;
    }
    let hole_cx = world.bottom_hole_center_x();
    let unit_x = match world.body(unit_id) {
        Some(b) => b.pos.x,
        None => return,
    };
    let kick = world.tuning.commit_kick;

    let dir = {
        let Some(unit) = world.find_unit_mut(unit_id) else {
            return;
        };
        if unit.dir.is_some() {
            return;
        }
        let dir = if unit_x < hole_cx { 1.0 } else { -1.0 };
        unit.dir = Some(dir);
        dir
    };
    if let Some(body) = world.body_mut(unit_id) {
        body.vel.x = kick * dir;
    }
}

/// Sensor contact in the floor opening: count one miss per unit, ever.
/// The fallback check in the update step uses the same `counted` guard.
fn unit_escaped(world: &mut World, unit_id: BodyId) {
    let already = match world.find_unit_mut(unit_id) {
        Some(unit) => {
            let c = unit.counted;
            unit.counted = true;
            c
        }
        None => return,
    };
    if already {
        return;
    }
    world.units.retain(|u| u.body != unit_id);
    world.remove_body(unit_id);
    world.register_miss();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use crate::sim::state::{ActiveBonus, BonusKind, Tint};
    use crate::tuning::Tuning;

    fn world() -> World {
        World::new(390.0, 700.0, 42, Tuning::default(), Box::new(MemoryStore::new())).unwrap()
    }

    fn ground_id(w: &World, kind: GroundKind) -> BodyId {
        w.bodies
            .iter()
            .find(|b| b.ground_kind == Some(kind))
            .unwrap()
            .id
    }

    fn sensor_id(w: &World) -> BodyId {
        w.bodies
            .iter()
            .find(|b| b.category == Category::HoleSensor)
            .unwrap()
            .id
    }

    fn spawn_unit_at(w: &mut World, x: f32, y: f32) -> BodyId {
        w.spawn_unit();
        let id = w.units.last().unwrap().body;
        let body = w.body_mut(id).unwrap();
        body.pos.x = x;
        body.pos.y = y;
        id
    }

    #[test]
    fn pair_key_is_order_independent() {
        assert_eq!(pair_key(BodyId(3), BodyId(9)), pair_key(BodyId(9), BodyId(3)));
    }

    #[test]
    fn begin_fires_once_while_touching() {
        let mut w = world();
        let platform = ground_id(&w, GroundKind::Platform);
        let platform_top = w.body(platform).unwrap().max().y;
        let mid_x = w.width / 2.0;
        let unit = spawn_unit_at(&mut w, mid_x, platform_top + 10.0);
        w.body_mut(unit).unwrap().pos.y = platform_top - 1.0;

        let begins = collect_begins(&mut w);
        assert!(begins.contains(&pair_key(unit, platform)));
        // Same overlap next tick: no new begin event.
        let begins = collect_begins(&mut w);
        assert!(begins.is_empty());
    }

    #[test]
    fn bullet_kills_unit_in_either_order() {
        for swap in [false, true] {
            let mut w = world();
            let unit = spawn_unit_at(&mut w, 100.0, 300.0);
            w.clock = 1.0;
            w.player_shoot();
            let bullet = w.bullets[0].body;

            let (a, b) = if swap { (bullet, unit) } else { (unit, bullet) };
            dispatch(&mut w, a, b);
            assert_eq!(w.unit_count(), 0);
            assert_eq!(w.bullet_count(), 0);
            assert_eq!(w.state.score, w.tuning.kill_score);
            assert_eq!(w.state.kills, 1);
        }
    }

    #[test]
    fn platform_contact_commits_direction_once() {
        let mut w = world();
        let platform = ground_id(&w, GroundKind::Platform);
        let cx = w.bottom_hole_center_x();

        // Left of the opening center: head right.
        let unit = spawn_unit_at(&mut w, cx - 30.0, 360.0);
        dispatch(&mut w, unit, platform);
        assert_eq!(w.units[0].dir, Some(1.0));
        assert!(w.body(unit).unwrap().vel.x > 0.0);

        // A later floor contact must not flip it.
        let floor = ground_id(&w, GroundKind::Floor);
        w.body_mut(unit).unwrap().pos.x = cx + 50.0;
        dispatch(&mut w, unit, floor);
        assert_eq!(w.units[0].dir, Some(1.0));
    }

    #[test]
    fn direction_uses_strict_less_than_at_center() {
        let mut w = world();
        let platform = ground_id(&w, GroundKind::Platform);
        let cx = w.bottom_hole_center_x();
        let unit = spawn_unit_at(&mut w, cx, 360.0);
        dispatch(&mut w, unit, platform);
        assert_eq!(w.units[0].dir, Some(-1.0));
    }

    #[test]
    fn right_of_center_heads_left() {
        let mut w = world();
        let floor = ground_id(&w, GroundKind::Floor);
        let cx = w.bottom_hole_center_x();
        let unit = spawn_unit_at(&mut w, cx + 40.0, 40.0);
        dispatch(&mut w, unit, floor);
        assert_eq!(w.units[0].dir, Some(-1.0));
    }

    #[test]
    fn wall_contact_does_not_commit() {
        let mut w = world();
        let wall = ground_id(&w, GroundKind::Wall);
        let unit = spawn_unit_at(&mut w, 30.0, 300.0);
        dispatch(&mut w, unit, wall);
        assert_eq!(w.units[0].dir, None);
    }

    #[test]
    fn unit_touch_kills_player_without_shield() {
        let mut w = world();
        let unit = spawn_unit_at(&mut w, 100.0, 60.0);
        let player = w.player.as_ref().unwrap().body;
        dispatch(&mut w, unit, player);
        assert!(!w.player_alive());
        assert_eq!(w.state.lives, 2);
        // The unit keeps going toward the floor opening.
        assert_eq!(w.unit_count(), 1);
    }

    #[test]
    fn shield_blocks_player_death() {
        let mut w = world();
        w.state.active_bonus = Some(ActiveBonus {
            kind: BonusKind::Shield,
            time_left: 5.0,
        });
        let unit = spawn_unit_at(&mut w, 100.0, 60.0);
        let player = w.player.as_ref().unwrap().body;
        dispatch(&mut w, player, unit);
        assert!(w.player_alive());
        assert_eq!(w.state.lives, 3);
    }

    #[test]
    fn sensor_contact_counts_one_miss() {
        let mut w = world();
        let sensor = sensor_id(&w);
        let mid_x = w.width / 2.0;
        let unit = spawn_unit_at(&mut w, mid_x, 20.0);
        dispatch(&mut w, unit, sensor);
        assert_eq!(w.state.misses_left, 4);
        assert_eq!(w.unit_count(), 0);

        // The pair firing again for the same (now removed) unit is inert.
        dispatch(&mut w, unit, sensor);
        assert_eq!(w.state.misses_left, 4);
    }

    #[test]
    fn bonus_pickup_grants_and_removes_crate() {
        let mut w = world();
        w.spawn_crate();
        let crate_id = w.crates[0].body;
        let player = w.player.as_ref().unwrap().body;
        dispatch(&mut w, crate_id, player);
        assert_eq!(w.crate_count(), 0);
        let bonus = w.state.active_bonus.expect("bonus granted");
        assert_eq!(bonus.time_left, w.tuning.bonus_duration);
        match bonus.kind {
            BonusKind::Shield => assert_eq!(w.player_tint(), Some(Tint::Shield)),
            BonusKind::RapidFire => assert_eq!(w.player_tint(), Some(Tint::Base)),
        }
    }

    #[test]
    fn new_pickup_overwrites_active_bonus() {
        let mut w = world();
        w.state.active_bonus = Some(ActiveBonus {
            kind: BonusKind::Shield,
            time_left: 0.5,
        });
        w.spawn_crate();
        let crate_id = w.crates[0].body;
        let player = w.player.as_ref().unwrap().body;
        dispatch(&mut w, player, crate_id);
        assert_eq!(
            w.state.active_bonus.unwrap().time_left,
            w.tuning.bonus_duration
        );
    }

    #[test]
    fn terminal_state_absorbs_contacts() {
        let mut w = world();
        w.clock = 1.0;
        w.player_shoot();
        let unit = spawn_unit_at(&mut w, 100.0, 300.0);
        let bullet = w.bullets[0].body;
        w.state.game_over = true;
        dispatch(&mut w, bullet, unit);
        assert_eq!(w.state.score, 0);
        assert_eq!(w.state.kills, 0);
    }
}
