use crate::calc;
use crate::config::{ RelativeConfig, MAX_ADDITIONAL_PLAYERS };
use crate::telemetry::{ Slot, Snapshot, VehicleSnapshot };

const BASE_SLOTS: usize = 7;
const SLOTS_IN_FRONT: usize = 3;

pub fn relative_len(extra_front: usize, extra_behind: usize) -> usize {
    BASE_SLOTS + extra_front + extra_behind
}

pub fn show_vehicle(in_race: bool, show_in_garage: bool, in_garage: bool) -> bool {
    !(in_race && !show_in_garage && in_garage)
}

pub fn relative_distances(snapshot: &Snapshot, config: &RelativeConfig) -> Vec<(f64, usize)> {
    let player_dist = snapshot.player().map(|player| player.lap_distance).unwrap_or(0.0);
    let in_race = snapshot.in_race();

    snapshot.vehicles.iter()
        .filter(|vehicle| show_vehicle(in_race, config.show_vehicle_in_garage_for_race, vehicle.in_garage))
        .map(|vehicle| {
            let rel_dist = calc::circular_relative_distance(snapshot.track_length, player_dist, vehicle.lap_distance);
            (rel_dist, vehicle.index)
        })
        .collect()
}

/// Player centered list of vehicle indices, most-ahead first.
///
/// The result always holds `relative_len(extra_front, extra_behind)` slots with
/// the player at offset `3 + extra_front`. Short fields are padded with empty
/// slots and the list wraps around, so vehicles near either end of the order
/// still fill the window. A missing player anchors the window at the first entry.
/// Extra counts above 60 are capped.
pub fn relative_index_list(distances: &[(f64, usize)], player_index: usize, extra_front: usize, extra_behind: usize) -> Vec<Slot> {
    let extra_front = extra_front.min(MAX_ADDITIONAL_PLAYERS);
    let extra_behind = extra_behind.min(MAX_ADDITIONAL_PLAYERS);
    let max_slots = relative_len(extra_front, extra_behind);

    let mut sorted = distances.to_vec();
    sorted.sort_by(|a, b| b.0.total_cmp(&a.0).then(b.1.cmp(&a.1)));

    let mut slots: Vec<Slot> = sorted.into_iter().map(|(_, index)| Some(index)).collect();
    if slots.len() < max_slots {
        slots.resize(max_slots, None);
    }

    let mut doubled = slots.clone();
    doubled.extend(slots);

    let anchor = doubled.iter()
            .position(|slot| *slot == Some(player_index))
            .unwrap_or(0) as isize;

    let start = anchor - (SLOTS_IN_FRONT + extra_front) as isize;
    let end = anchor + (BASE_SLOTS - SLOTS_IN_FRONT + extra_behind) as isize;
    let len = doubled.len() as isize;

    (start..end)
        .map(|position| doubled[position.rem_euclid(len) as usize])
        .collect()
}

pub fn build_relative(snapshot: &Snapshot, config: &RelativeConfig) -> Vec<Slot> {
    let distances = relative_distances(snapshot, config);
    relative_index_list(&distances, snapshot.player_index,
        config.additional_players_front, config.additional_players_behind)
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelativeRow<'a> {
    pub vehicle: &'a VehicleSnapshot,
    pub is_player: bool,
    pub relative_distance: f64,
    pub time_gap: f64,
    pub lap_difference: f64,
}

pub fn relative_rows<'a>(snapshot: &'a Snapshot, relative: &[Slot]) -> Vec<Option<RelativeRow<'a>>> {
    let player = snapshot.player();
    let player_dist = player.map(|player| player.lap_distance).unwrap_or(0.0);
    let player_speed = player.map(|player| player.speed).unwrap_or(0.0);
    let player_laps = player.map(|player| snapshot.lap_progress(player)).unwrap_or(0.0);

    relative.iter()
        .map(|slot| {
            let vehicle = snapshot.vehicle((*slot)?)?;
            let relative_distance = calc::circular_relative_distance(
                snapshot.track_length, player_dist, vehicle.lap_distance);

            Some(RelativeRow {
                vehicle,
                is_player: vehicle.index == snapshot.player_index,
                relative_distance,
                time_gap: calc::relative_time_gap(relative_distance, player_speed, vehicle.speed),
                lap_difference: calc::lap_difference(snapshot.lap_progress(vehicle), player_laps, 1.0, 1.0),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::tests::vehicle;

    fn snapshot(session: i64, vehicles: Vec<VehicleSnapshot>) -> Snapshot {
        Snapshot {
            track_length: 1000.0,
            player_index: 0,
            session,
            vehicles,
        }
    }

    #[test]
    fn window_length_is_fixed() {
        let distances: Vec<(f64, usize)> = (0..20).map(|index| (index as f64 * 10.0, index)).collect();
        for front in 0..=60 {
            for behind in (0..=60).step_by(7).chain(std::iter::once(60)) {
                let list = relative_index_list(&distances, 5, front, behind);
                assert_eq!(list.len(), 7 + front + behind);
                assert_eq!(list[3 + front], Some(5));
            }
        }
    }

    #[test]
    fn extra_counts_are_capped() {
        assert_eq!(relative_index_list(&[(0.0, 0)], 0, 100, 0).len(), 67);
        assert_eq!(relative_index_list(&[(0.0, 0)], 0, 61, 500).len(), 127);

        let config = RelativeConfig {
            additional_players_front: 90,
            additional_players_behind: 2,
            show_vehicle_in_garage_for_race: false,
        };
        let list = build_relative(&snapshot(10, vec![vehicle(0, "GT3", 1, 0.0, 0.0)]), &config);
        assert_eq!(list.len(), 69);
        assert_eq!(list[63], Some(0));
    }

    #[test]
    fn short_field_is_padded_deterministically() {
        let distances = vec![(0.0, 0), (50.0, 1), (-30.0, 2)];

        let list = relative_index_list(&distances, 0, 0, 0);

        // Order ahead-first: [1, 0, 2, -, -, -, -], doubled, centered on slot 1.
        assert_eq!(list, vec![None, None, Some(1), Some(0), Some(2), None, None]);
        assert_eq!(list.iter().filter(|slot| slot.is_some()).count(), 3);
    }

    #[test]
    fn wraps_around_when_player_leads() {
        let distances = vec![(0.0, 4), (-10.0, 1), (-20.0, 2), (-30.0, 3), (-40.0, 5), (-50.0, 6), (-60.0, 7), (-70.0, 8)];

        let list = relative_index_list(&distances, 4, 0, 0);

        assert_eq!(list, vec![Some(6), Some(7), Some(8), Some(4), Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn missing_player_anchors_at_first_entry() {
        let distances = vec![(10.0, 1), (5.0, 2)];

        let list = relative_index_list(&distances, 9, 0, 0);

        assert_eq!(list, vec![None, None, None, Some(1), Some(2), None, None]);
    }

    #[test]
    fn empty_field_yields_empty_slots() {
        assert_eq!(relative_index_list(&[], 0, 1, 1), vec![None; 9]);
    }

    #[test]
    fn same_input_same_output() {
        let distances = vec![(12.0, 3), (-4.0, 0), (12.0, 1), (300.0, 2)];
        let first = relative_index_list(&distances, 0, 2, 1);
        let second = relative_index_list(&distances, 0, 2, 1);
        assert_eq!(first, second);
    }

    #[test]
    fn garage_cars_hidden_only_in_races() {
        assert!(show_vehicle(false, false, true));
        assert!(!show_vehicle(true, false, true));
        assert!(show_vehicle(true, true, true));
        assert!(show_vehicle(true, false, false));

        let vehicles = vec![
            vehicle(0, "GT3", 1, 100.0, 0.0),
            VehicleSnapshot { in_garage: true, ..vehicle(1, "GT3", 2, 0.0, 0.0) },
        ];
        let config = RelativeConfig::default();

        assert_eq!(relative_distances(&snapshot(10, vehicles.clone()), &config).len(), 1);
        assert_eq!(relative_distances(&snapshot(5, vehicles), &config).len(), 2);
    }

    #[test]
    fn builds_from_snapshot() {
        let snapshot = snapshot(10, vec![
            vehicle(0, "GT3", 2, 10.0, 0.0),
            vehicle(1, "GT3", 1, 990.0, 0.0),
            vehicle(2, "GT3", 3, 60.0, 0.0),
        ]);

        let list = build_relative(&snapshot, &RelativeConfig::default());

        assert_eq!(list, vec![None, None, Some(2), Some(0), Some(1), None, None]);
    }

    #[test]
    fn rows_carry_gap_and_lap_difference() {
        let mut lapped = vehicle(1, "GT3", 2, 20.0, 0.0);
        lapped.total_laps = 3;
        let mut player = vehicle(0, "GT3", 1, 10.0, 0.0);
        player.total_laps = 5;
        let snapshot = snapshot(10, vec![player, lapped]);

        let rows = relative_rows(&snapshot, &[Some(1), Some(0), None]);

        let row = rows[0].as_ref().unwrap();
        assert_eq!(row.relative_distance, 10.0);
        assert_eq!(row.time_gap, 0.25);
        assert!(row.lap_difference < -1.0);
        assert!(rows[1].as_ref().unwrap().is_player);
        assert!(rows[2].is_none());
    }
}
