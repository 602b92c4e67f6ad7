/// Party kernel — Spatial Predicates
///
/// Pure position checks used by the eligibility engine and the
/// status broadcaster.

use crate::domain::{PartyConstants, Position};

/// True when `b` lies inside the box of half-widths `(range_xy, range_xy, range_z)`
/// centred on `a`.
pub fn in_range_box(a: &Position, b: &Position, range_xy: u32, range_z: u32) -> bool {
    a.distance_x(b) <= range_xy && a.distance_y(b) <= range_xy && a.distance_z(b) <= range_z
}

/// Shared-experience proximity to the leader.
pub fn in_shared_exp_range(leader: &Position, player: &Position, c: &PartyConstants) -> bool {
    in_range_box(leader, player, c.shared_exp_range_xy, c.shared_exp_range_z)
}

/// Status visibility. Floors are ignored; `max_distance == 0` is unlimited.
pub fn within_status_distance(a: &Position, b: &Position, max_distance: u32) -> bool {
    max_distance == 0 || (a.distance_x(b) <= max_distance && a.distance_y(b) <= max_distance)
}

/// Change of status visibility for a pair when one side moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeTransition {
    Entered,
    Left,
    Unchanged,
}

pub fn range_transition(
    old_pos: &Position,
    new_pos: &Position,
    other: &Position,
    max_distance: u32,
) -> RangeTransition {
    let was = within_status_distance(old_pos, other, max_distance);
    let is = within_status_distance(new_pos, other, max_distance);
    match (was, is) {
        (true, false) => RangeTransition::Left,
        (false, true) => RangeTransition::Entered,
        _ => RangeTransition::Unchanged,
    }
}
