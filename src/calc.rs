pub const NO_LAP_TIME: f64 = 99999.0;

pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Signed distance from the player to an opponent along a looping track.
///
/// Positive means the opponent is ahead, negative behind. The shorter arc
/// around the loop is always chosen. A non-positive `track_length` has no
/// loop to fold onto, so the plain difference is returned.
pub fn circular_relative_distance(track_length: f64, player_dist: f64, opponent_dist: f64) -> f64 {
    let rel_dist = opponent_dist - player_dist;
    if track_length <= 0.0 {
        return rel_dist;
    }

    if rel_dist.abs() > track_length * 0.5 {
        if opponent_dist > player_dist {
            return rel_dist - track_length;
        } else if opponent_dist < player_dist {
            return rel_dist + track_length;
        }
    }
    rel_dist
}

/// Lap difference between an opponent and the player.
///
/// Positive: lap(s) ahead. Negative: lap(s) behind. Zero: within the
/// `lap_ahead`/`lap_behind` thresholds, treated as the same lap.
pub fn lap_difference(opponent_laps: f64, player_laps: f64, lap_ahead: f64, lap_behind: f64) -> f64 {
    let lap_diff = opponent_laps - player_laps;
    if lap_diff > lap_ahead || lap_diff < -lap_behind {
        lap_diff
    } else {
        0.0
    }
}

pub fn relative_time_gap(rel_dist: f64, player_speed: f64, opponent_speed: f64) -> f64 {
    let speed = player_speed.max(opponent_speed);
    if speed > 1.0 {
        (rel_dist / speed).abs()
    } else {
        0.0
    }
}

pub fn lap_progress_distance(dist_into: f64, length: f64) -> f64 {
    if length < 1.0 {
        return 0.0;
    }
    (dist_into / length).max(0.0).min(1.0)
}

pub fn sec2laptime(seconds: f64) -> String {
    if seconds > 60.0 {
        sec2laptime_full(seconds)
    } else {
        format!["{:.3}", seconds % 60.0]
    }
}

pub fn sec2laptime_full(seconds: f64) -> String {
    format!["{:.0}:{:06.3}", (seconds / 60.0).floor(), seconds % 60.0]
}

/// Gap between a vehicle's best lap and the session (or class) best.
///
/// `None` marks the vehicle holding the reference time itself. Vehicles
/// without a time, or faster than the reference, get a zero gap.
pub fn gap_to_best_lap(best: f64, session_best: f64, class_best: f64, from_class_best: bool) -> Option<f64> {
    let reference = if from_class_best { class_best } else { session_best };
    let gap = best - reference;
    if gap == 0.0 && best > 0.0 {
        return None;
    }
    if gap < 0.0 || best < 1.0 {
        return Some(0.0);
    }
    Some(gap)
}
