//! Per-frame update step
//!
//! One call to [`step`] advances a full simulation tick: spawn scheduling,
//! gravity integration, penetration resolution, contact dispatch, then the
//! update pass (clocks, countdowns, velocity enforcement, fallback checks
//! and entity reclamation). Contact mutations are always fully applied
//! before the fallback checks of the same tick run.

use glam::Vec2;

use super::body::BodyId;
use super::contacts;
use super::state::Facing;
use super::world::World;

/// Advance the world to host time `now` (seconds).
pub fn step(world: &mut World, now: f64) {
    world.clock = now;
    let dt = match world.last_now {
        Some(prev) => ((now - prev) as f32).clamp(0.0, world.tuning.max_frame_dt),
        None => world.tuning.fallback_dt,
    };
    world.last_now = Some(now);

    // The spawn timer has its own cadence but shares the tick thread.
    world.run_spawner(dt);

    integrate(world, dt);
    let begins = contacts::collect_begins(world);
    resolve_penetrations(world);
    for (a, b) in begins {
        contacts::dispatch(world, a, b);
    }

    update_pass(world, dt, now);
}

/// Gravity and position integration for dynamic bodies.
fn integrate(world: &mut World, dt: f32) {
    let g = world.tuning.gravity;
    for body in world.bodies.iter_mut().filter(|b| b.dynamic) {
        if body.gravity {
            body.vel.y += g * dt;
        }
        body.pos += body.vel * dt;
    }
}

/// Push dynamic bodies out of anything their collision mask blocks on.
/// Sensors never appear here: nothing lists HoleSensor in a collision mask.
fn resolve_penetrations(world: &mut World) {
    // Statics never move, so a snapshot is enough.
    let statics: Vec<_> = world
        .bodies
        .iter()
        .filter(|b| !b.dynamic)
        .map(|b| (b.category, b.pos, b.half))
        .collect();

    for body in world.bodies.iter_mut().filter(|b| b.dynamic) {
        for &(category, pos, half) in &statics {
            if !body.collision_mask.contains(category) {
                continue;
            }
            let d = (pos - body.pos).abs();
            let reach = body.half + half;
            let pen = reach - d;
            if pen.x <= 0.0 || pen.y <= 0.0 {
                continue;
            }
            if pen.x < pen.y {
                let push = if body.pos.x < pos.x { -pen.x } else { pen.x };
                body.pos.x += push;
                if push * body.vel.x < 0.0 {
                    body.vel.x = 0.0;
                }
            } else {
                let push = if body.pos.y < pos.y { -pen.y } else { pen.y };
                body.pos.y += push;
                if push * body.vel.y < 0.0 {
                    body.vel.y = 0.0;
                }
            }
        }
    }

    // Player and units block each other; split the correction between them.
    let Some(pid) = world.player.as_ref().map(|p| p.body) else {
        return;
    };
    let unit_ids: Vec<BodyId> = world.units.iter().map(|u| u.body).collect();
    for uid in unit_ids {
        let (ppos, phalf) = match world.body(pid) {
            Some(b) => (b.pos, b.half),
            None => return,
        };
        let (upos, uhalf) = match world.body(uid) {
            Some(b) => (b.pos, b.half),
            None => continue,
        };
        let d = (upos - ppos).abs();
        let pen = phalf + uhalf - d;
        if pen.x <= 0.0 || pen.y <= 0.0 {
            continue;
        }
        let (dx, dy) = if pen.x < pen.y {
            (if ppos.x < upos.x { pen.x } else { -pen.x }, 0.0)
        } else {
            (0.0, if ppos.y < upos.y { pen.y } else { -pen.y })
        };
        if let Some(b) = world.body_mut(pid) {
            b.pos -= Vec2::new(dx, dy) / 2.0;
        }
        if let Some(b) = world.body_mut(uid) {
            b.pos += Vec2::new(dx, dy) / 2.0;
        }
    }
}

fn update_pass(world: &mut World, dt: f32, now: f64) {
    world.state.tick_clock(now);

    // Bonus countdown. Cleared the tick it reaches zero, never negative.
    let mut bonus_expired = false;
    if !world.state.game_over
        && let Some(bonus) = world.state.active_bonus.as_mut()
    {
        bonus.time_left -= dt;
        bonus_expired = bonus.time_left <= 0.0;
    }
    if bonus_expired {
        world.state.active_bonus = None;
        world.refresh_tint();
    }

    // Pending respawn after a death.
    let mut respawn_now = false;
    if let Some(t) = world.respawn_in.as_mut() {
        *t -= dt;
        respawn_now = *t <= 0.0;
    }
    if respawn_now {
        world.respawn_in = None;
        if !world.state.game_over && world.player.is_none() && world.state.lives > 0 {
            world.spawn_player();
        }
    }

    // Player velocity from the held-direction flags. Both or neither held
    // nets to zero; facing follows any non-zero direction.
    if let Some(pid) = world.player.as_ref().map(|p| p.body) {
        let dir = (world.move_right as i32 - world.move_left as i32) as f32;
        if dir != 0.0
            && let Some(p) = world.player.as_mut()
        {
            p.facing = if dir > 0.0 { Facing::Right } else { Facing::Left };
        }
        let speed = world.tuning.player_move_speed;
        let max_fall = world.tuning.player_max_fall;
        if let Some(b) = world.body_mut(pid) {
            b.vel.x = speed * dir;
            b.vel.y = b.vel.y.clamp(-max_fall, max_fall);
        }
    }

    // Committed units travel at constant horizontal speed no matter what
    // the resolver did to them.
    let unit_speed = world.tuning.unit_speed;
    let unit_max_fall = world.tuning.unit_max_fall;
    let committed: Vec<(BodyId, f32)> = world
        .units
        .iter()
        .filter_map(|u| u.dir.map(|d| (u.body, d)))
        .collect();
    for (id, dir) in committed {
        if let Some(b) = world.body_mut(id) {
            b.vel.x = unit_speed * dir;
            b.vel.y = b.vel.y.clamp(-unit_max_fall, unit_max_fall);
        }
    }

    // Fallback miss detection: a fast unit can cross the sensor between
    // ticks, so any uncounted unit inside the opening at floor height is
    // counted here.
    let (hole_left, hole_right) = world.bottom_hole_span();
    let sensor_top = world.tuning.wall_thickness + world.tuning.sensor_grace;
    let escaped: Vec<BodyId> = world
        .units
        .iter()
        .filter(|u| !u.counted)
        .filter_map(|u| world.body(u.body).map(|b| (u.body, b.pos)))
        .filter(|(_, pos)| pos.y <= sensor_top && pos.x >= hole_left && pos.x <= hole_right)
        .map(|(id, _)| id)
        .collect();
    for id in escaped {
        if world.state.game_over {
            break;
        }
        match world.find_unit_mut(id) {
            Some(u) if !u.counted => u.counted = true,
            _ => continue,
        }
        world.units.retain(|u| u.body != id);
        world.remove_body(id);
        world.register_miss();
    }

    // Bullets: lifetime countdown plus early reclaim at the field edges.
    let width = world.width;
    let mut dead_bullets: Vec<BodyId> = Vec::new();
    for bullet in world.bullets.iter_mut() {
        bullet.ttl -= dt;
        if bullet.ttl <= 0.0 {
            dead_bullets.push(bullet.body);
        }
    }
    for bullet in world.bullets.iter() {
        if dead_bullets.contains(&bullet.body) {
            continue;
        }
        if let Some(body) = world.body(bullet.body)
            && (body.pos.x < 0.0 || body.pos.x > width)
        {
            dead_bullets.push(bullet.body);
        }
    }
    for id in dead_bullets {
        world.bullets.retain(|b| b.body != id);
        world.remove_body(id);
    }

    // Off-field garbage collection. Never counts a miss.
    let margin = world.tuning.cull_margin;
    let height = world.height;
    let out = |pos: Vec2| {
        pos.x < -margin || pos.x > width + margin || pos.y < -margin || pos.y > height + margin
    };
    let strays: Vec<BodyId> = world
        .units
        .iter()
        .map(|u| u.body)
        .chain(world.bullets.iter().map(|b| b.body))
        .chain(world.crates.iter().map(|c| c.body))
        .filter(|id| world.body(*id).map(|b| out(b.pos)).unwrap_or(false))
        .collect();
    for id in strays {
        world.units.retain(|u| u.body != id);
        world.bullets.retain(|b| b.body != id);
        world.crates.retain(|c| c.body != id);
        world.remove_body(id);
    }
}
