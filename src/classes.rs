use std::collections::BTreeSet;

use crate::calc::NO_LAP_TIME;
use crate::telemetry::VehicleSnapshot;

#[derive(Debug, Clone, PartialEq)]
pub struct ClassEntry {
    pub vehicle_index: usize,
    pub class_position: u32,
    pub class_name: String,
    pub session_best_lap_time: f64,
    pub class_best_lap_time: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClassGroups {
    pub entries: Vec<ClassEntry>,
    pub classes: Vec<String>,
}

impl ClassGroups {
    pub fn is_multi_class(&self) -> bool {
        self.classes.len() > 1
    }
}

fn normalized_lap_time(lap_time: f64) -> f64 {
    if lap_time > 0.0 {
        lap_time
    } else {
        NO_LAP_TIME
    }
}

/// Groups vehicles by class and ranks them within their class by overall place.
///
/// The class best lap time is the time of the class leader, not the fastest
/// lap within the class.
pub fn group_classes(vehicles: &[VehicleSnapshot]) -> ClassGroups {
    let classes: Vec<String> = vehicles.iter()
            .map(|vehicle| vehicle.class_name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

    let session_best_lap_time = vehicles.iter()
            .map(|vehicle| normalized_lap_time(vehicle.best_lap_time))
            .fold(NO_LAP_TIME, f64::min);

    let mut running_order: Vec<&VehicleSnapshot> = vehicles.iter().collect();
    running_order.sort_by(|a, b| {
        a.class_name.cmp(&b.class_name)
            .then(a.place.cmp(&b.place))
            .then(a.index.cmp(&b.index))
    });

    let mut entries = Vec::with_capacity(running_order.len());
    let mut current_class: Option<&str> = None;
    let mut position_counter = 0;
    let mut class_best_lap_time = NO_LAP_TIME;

    for vehicle in running_order {
        if current_class == Some(vehicle.class_name.as_str()) {
            position_counter += 1;
        } else {
            current_class = Some(vehicle.class_name.as_str());
            position_counter = 1;
        }

        if position_counter == 1 {
            class_best_lap_time = normalized_lap_time(vehicle.best_lap_time);
        }

        entries.push(ClassEntry {
            vehicle_index: vehicle.index,
            class_position: position_counter,
            class_name: vehicle.class_name.clone(),
            session_best_lap_time,
            class_best_lap_time,
        });
    }

    entries.sort_by_key(|entry| entry.vehicle_index);

    ClassGroups { entries, classes }
}
