//! Ranked standings lists, either for the whole field or split per vehicle class.
//!
//! Every list is a window over the running order: the leading `top` places
//! are always present and the remaining room is filled with the places
//! closest to the player. Each window ends with an empty slot that marks
//! the gap before the next class.

use std::collections::BTreeSet;

use crate::classes::{ ClassEntry, ClassGroups };
use crate::config::{ StandingsConfig, MIN_TOP_VEHICLES, MAX_TOP_VEHICLES };
use crate::telemetry::{ Slot, Snapshot };

/// Places around the player, the player first, then alternating front and rear.
///
/// Front places stay above `top`, rear places stay below `total`; at most
/// `limit - top` places are returned. A `player_place` of 0 adds no
/// player slot.
fn nearby_places(top: usize, total: usize, player_place: usize, limit: usize) -> Vec<usize> {
    let max_range = limit.saturating_sub(top);
    let mut places = Vec::with_capacity(max_range + 1);
    if player_place > 0 {
        places.push(player_place);
    }

    for offset in 0..max_range {
        if player_place > top + 1 + offset {
            places.push(player_place - 1 - offset);
            if places.len() >= max_range {
                break;
            }
        }
        let rear = player_place + 1 + offset;
        if rear < total {
            places.push(rear);
            if places.len() >= max_range {
                break;
            }
        }
    }
    places
}

pub fn build_window(top: usize, total: usize, limit: usize, player_place: usize, place_index: &[(usize, usize)]) -> Vec<Slot> {
    let reference: BTreeSet<usize> = if player_place <= top || total <= limit {
        (1..=total.min(limit)).collect()
    } else {
        (1..=top).chain(nearby_places(top, total, player_place, limit)).collect()
    };

    place_index.iter()
        .filter(|(place, _)| reference.contains(place))
        .map(|(_, index)| Some(*index))
        .chain(std::iter::once(None))
        .collect()
}

fn top_vehicles(config: &StandingsConfig) -> usize {
    config.min_top_vehicles.max(MIN_TOP_VEHICLES).min(MAX_TOP_VEHICLES)
}

pub fn combined_standings(snapshot: &Snapshot, config: &StandingsConfig) -> Vec<Slot> {
    let top = top_vehicles(config);
    let limit = config.max_vehicles_combined_mode.max(top + 2);
    let total = snapshot.vehicles.len().max(1);
    let player_place = snapshot.player().map(|player| player.place as usize).unwrap_or(0);

    let mut place_index: Vec<(usize, usize)> = snapshot.vehicles.iter()
            .map(|vehicle| (vehicle.place as usize, vehicle.index))
            .collect();
    place_index.sort();

    build_window(top, total, limit, player_place, &place_index)
}

pub fn split_classes(groups: &ClassGroups) -> Vec<Vec<&ClassEntry>> {
    let mut sorted: Vec<&ClassEntry> = groups.entries.iter().collect();
    sorted.sort_by(|a, b| {
        a.class_name.cmp(&b.class_name)
            .then(a.class_best_lap_time.total_cmp(&b.class_best_lap_time))
            .then(a.class_position.cmp(&b.class_position))
    });

    let mut runs: Vec<Vec<&ClassEntry>> = Vec::new();
    for entry in sorted {
        match runs.last_mut() {
            Some(run) if run[0].class_name == entry.class_name => run.push(entry),
            _ => runs.push(vec![entry]),
        }
    }

    runs.sort_by(|a, b| a[0].class_best_lap_time.total_cmp(&b[0].class_best_lap_time));
    runs
}

pub fn class_split_standings(player_index: usize, groups: &ClassGroups, config: &StandingsConfig) -> Vec<Slot> {
    let top = top_vehicles(config);
    let mut standings = Vec::new();

    for run in split_classes(groups) {
        let total = run.last().map(|entry| entry.class_position as usize).unwrap_or(0);
        let place_index: Vec<(usize, usize)> = run.iter()
                .map(|entry| (entry.class_position as usize, entry.vehicle_index))
                .collect();

        let (limit, player_place) = match run.iter().find(|entry| entry.vehicle_index == player_index) {
            Some(player) => (config.max_vehicles_per_split_player.max(top + 2), player.class_position as usize),
            None => (config.max_vehicles_per_split_others.max(top), 0),
        };

        standings.extend(build_window(top, total, limit, player_place, &place_index));
    }
    standings
}

pub fn build_standings(snapshot: &Snapshot, groups: &ClassGroups, config: &StandingsConfig) -> Vec<Slot> {
    if config.enable_multi_class_split_mode && groups.is_multi_class() {
        class_split_standings(snapshot.player_index, groups, config)
    } else {
        combined_standings(snapshot, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classes::group_classes;
    use crate::telemetry::VehicleSnapshot;
    use crate::telemetry::tests::vehicle;

    /// Vehicle `i` runs in place `i + 1`.
    fn in_order(count: usize) -> Vec<(usize, usize)> {
        (0..count).map(|index| (index + 1, index)).collect()
    }

    fn field(player_index: usize, vehicles: Vec<VehicleSnapshot>) -> Snapshot {
        Snapshot {
            track_length: 2000.0,
            player_index,
            session: 10,
            vehicles,
        }
    }

    #[test]
    fn small_field_is_shown_in_full() {
        let window = build_window(3, 5, 10, 4, &in_order(5));
        assert_eq!(window, vec![Some(0), Some(1), Some(2), Some(3), Some(4), None]);
    }

    #[test]
    fn leader_gets_top_window() {
        let window = build_window(3, 30, 6, 2, &in_order(30));
        assert_eq!(window, vec![Some(0), Some(1), Some(2), Some(3), Some(4), Some(5), None]);
    }

    #[test]
    fn window_centers_on_player() {
        // Top three plus player in 15th with one in front and one behind.
        let window = build_window(3, 30, 6, 15, &in_order(30));
        assert_eq!(window, vec![Some(0), Some(1), Some(2), Some(13), Some(14), Some(15), None]);
    }

    #[test]
    fn window_stays_above_top_places() {
        // Player in 5th: place 4 is the only front place above the top three.
        let window = build_window(3, 30, 8, 5, &in_order(30));
        assert_eq!(window, vec![Some(0), Some(1), Some(2), Some(3), Some(4), Some(5), Some(6), Some(7), None]);
    }

    #[test]
    fn last_place_fills_from_the_front() {
        let window = build_window(2, 20, 6, 20, &in_order(20));
        assert_eq!(window, vec![Some(0), Some(1), Some(16), Some(17), Some(18), Some(19), None]);
    }

    #[test]
    fn player_always_included_when_centered() {
        for player_place in 4..=40 {
            let window = build_window(3, 40, 7, player_place, &in_order(40));
            assert!(window.contains(&Some(player_place - 1)), "place {} missing", player_place);
            assert_eq!(window.last(), Some(&None));
        }
    }

    #[test]
    fn empty_field_is_just_the_gap() {
        assert_eq!(build_window(3, 0, 5, 0, &[]), vec![None]);
    }

    #[test]
    fn combined_mode_uses_overall_place() {
        let vehicles: Vec<VehicleSnapshot> = (0..12)
                .map(|index| vehicle(index, "GT3", 12 - index as u32, 0.0, 90.0))
                .collect();
        let snapshot = field(2, vehicles);
        let config = StandingsConfig {
            min_top_vehicles: 1,
            max_vehicles_combined_mode: 4,
            ..StandingsConfig::default()
        };

        // Player (index 2) is in 10th; places 1, 9, 10, 11 are shown.
        let standings = combined_standings(&snapshot, &config);

        assert_eq!(standings, vec![Some(11), Some(3), Some(2), Some(1), None]);
    }

    #[test]
    fn combined_limit_has_a_floor() {
        let vehicles: Vec<VehicleSnapshot> = (0..10)
                .map(|index| vehicle(index, "GT3", index as u32 + 1, 0.0, 90.0))
                .collect();
        let snapshot = field(9, vehicles);
        let config = StandingsConfig {
            min_top_vehicles: 2,
            max_vehicles_combined_mode: 0,
            ..StandingsConfig::default()
        };

        let standings = combined_standings(&snapshot, &config);

        // Limit is raised to top + 2: places 1, 2, then 9 and 10.
        assert_eq!(standings, vec![Some(0), Some(1), Some(8), Some(9), None]);
    }

    #[test]
    fn classes_ordered_by_class_best() {
        let vehicles = vec![
            vehicle(0, "GT3", 3, 0.0, 95.0),
            vehicle(1, "LMP2", 1, 0.0, 85.0),
            vehicle(2, "GT3", 4, 0.0, 96.0),
            vehicle(3, "LMP2", 2, 0.0, 86.0),
        ];
        let groups = group_classes(&vehicles);

        let runs = split_classes(&groups);

        let names: Vec<&str> = runs.iter().map(|run| run[0].class_name.as_str()).collect();
        assert_eq!(names, vec!["LMP2", "GT3"]);
        assert_eq!(runs[1].iter().map(|entry| entry.vehicle_index).collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn class_split_windows_each_class() {
        let mut vehicles = Vec::new();
        // LMP2 leads overall in places 1..=6, GT3 follows in 7..=16.
        for index in 0..6 {
            vehicles.push(vehicle(index, "LMP2", index as u32 + 1, 0.0, 85.0 + index as f64));
        }
        for index in 6..16 {
            vehicles.push(vehicle(index, "GT3", index as u32 + 1, 0.0, 95.0 + index as f64));
        }
        let snapshot = field(13, vehicles);
        let groups = group_classes(&snapshot.vehicles);
        let config = StandingsConfig {
            min_top_vehicles: 2,
            max_vehicles_combined_mode: 20,
            enable_multi_class_split_mode: true,
            max_vehicles_per_split_player: 5,
            max_vehicles_per_split_others: 3,
        };

        let standings = build_standings(&snapshot, &groups, &config);

        // Player is 8th of 10 in GT3: top two, then 7th, 8th, 9th.
        assert_eq!(standings, vec![
            Some(0), Some(1), Some(2), None,
            Some(6), Some(7), Some(12), Some(13), Some(14), None,
        ]);
    }

    #[test]
    fn split_mode_disabled_or_single_class_is_combined() {
        let vehicles = vec![
            vehicle(0, "GT3", 2, 0.0, 95.0),
            vehicle(1, "LMP2", 1, 0.0, 85.0),
        ];
        let snapshot = field(0, vehicles);
        let groups = group_classes(&snapshot.vehicles);
        let config = StandingsConfig {
            enable_multi_class_split_mode: false,
            ..StandingsConfig::default()
        };

        assert_eq!(build_standings(&snapshot, &groups, &config), vec![Some(1), Some(0), None]);

        let single = field(0, vec![vehicle(0, "GT3", 1, 0.0, 95.0)]);
        let single_groups = group_classes(&single.vehicles);
        assert_eq!(build_standings(&single, &single_groups, &StandingsConfig::default()), vec![Some(0), None]);
    }

    #[test]
    fn same_snapshot_same_standings() {
        let vehicles: Vec<VehicleSnapshot> = (0..25)
                .map(|index| vehicle(index, if index % 3 == 0 { "GT3" } else { "GTE" }, index as u32 + 1, 0.0, 90.0 + index as f64))
                .collect();
        let snapshot = field(17, vehicles);
        let groups = group_classes(&snapshot.vehicles);
        let config = StandingsConfig::default();

        assert_eq!(build_standings(&snapshot, &groups, &config), build_standings(&snapshot, &groups, &config));
    }
}
