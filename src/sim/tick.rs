//! Per-frame simulation tick for the continuous variants
//!
//! One call advances the stage by one animation frame. Returns a verdict
//! the moment the run ends; the caller stops ticking after that.

use glam::Vec2;
use rand::Rng;

use super::collision::{clamp_to_band, edge_hit, first_contact, in_contact, reflect_heading};
use super::levels::generate_sky;
use super::stage::{CatchState, FlightState, Fruit, FruitKind};
use super::state::{FailCause, SimEvent, Verdict};
use crate::consts::*;

/// Advance the flight stage by one frame
pub fn tick_flight<R: Rng>(
    state: &mut FlightState,
    rng: &mut R,
    events: &mut Vec<SimEvent>,
) -> Option<Verdict> {
    state.ticks += 1;
    let behaviors = state.behaviors;

    if !behaviors.forever {
        state.speed *= SPEED_DECAY;
        if state.speed < STALL_SPEED {
            return Some(Verdict::Fail(FailCause::Stalled));
        }
    }

    let mut next = state.pos + state.heading * state.speed;

    let hit = edge_hit(next);
    if hit.any() {
        if !behaviors.bounces() {
            return Some(Verdict::Fail(FailCause::HitEdge));
        }
        state.heading = reflect_heading(state.heading, hit);
        if hit.x {
            next.x = clamp_to_band(next.x);
        }
        if hit.y {
            next.y = clamp_to_band(next.y);
        }
        if behaviors.color {
            state.tint_hue = Some(rng.random::<f32>() * 360.0);
        }
        events.push(SimEvent::Bounced {
            tint_hue: state.tint_hue,
        });
    }

    if let Some(index) = first_contact(next, &state.hazards, CONTACT_RADIUS) {
        return Some(Verdict::Fail(FailCause::Hazard { index }));
    }

    state.pos = next;
    state.record_trail();

    if in_contact(next, state.goal, CONTACT_RADIUS) {
        state.stars += 1;
        events.push(SimEvent::StarCaught { total: state.stars });
        if state.stars >= STARS_TO_WIN {
            return Some(Verdict::Win);
        }
        // Counters survive the reroll; only the layout changes
        state.set_layout(generate_sky(rng, state.pos));
        events.push(SimEvent::LayoutRerolled);
        log::info!("Star {} caught, layout rerolled", state.stars);
    }

    None
}

/// Advance the catch stage by one frame
pub fn tick_catch<R: Rng>(
    state: &mut CatchState,
    rng: &mut R,
    events: &mut Vec<SimEvent>,
) -> Option<Verdict> {
    state.frame += 1;

    if state.frame % FRUIT_SPAWN_FRAMES == 0 {
        let id = state.next_fruit_id();
        let kind = match rng.random_range(0..3) {
            0 => FruitKind::Apple,
            1 => FruitKind::Cherry,
            _ => FruitKind::Banana,
        };
        state.fruits.push(Fruit {
            id,
            pos: Vec2::new(10.0 + rng.random::<f32>() * 80.0, -10.0),
            kind,
        });
    }

    state.player_x = (state.player_x + state.behaviors.drift).clamp(CATCH_MIN_X, CATCH_MAX_X);

    let player_x = state.player_x;
    let scoring = state.behaviors.scoring;
    let mut score = state.score;
    state.fruits.retain_mut(|fruit| {
        fruit.pos.y += FRUIT_FALL_SPEED;
        let in_basket = fruit.pos.y > 80.0 && fruit.pos.y < 95.0;
        if in_basket && (fruit.pos.x - player_x).abs() < 10.0 {
            if scoring {
                score += 1;
                events.push(SimEvent::FruitCaught { score });
            }
            return false;
        }
        fruit.pos.y < 110.0
    });
    state.score = score;

    (state.score >= SCORE_TO_WIN).then_some(Verdict::Win)
}
