use std::convert::TryFrom;

use thiserror::Error;
use yaml_rust::{ YamlLoader, Yaml, ScanError };

use crate::calc;

/// A fixed-size list entry: a vehicle index, or `None` for an empty slot.
pub type Slot = Option<usize>;

const LAST_NON_RACE_SESSION: i64 = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct VehicleSnapshot {
    pub index: usize,
    pub driver_name: String,
    pub class_name: String,
    pub place: u32,
    pub lap_distance: f64,
    pub total_laps: u32,
    /// Seconds, zero or negative when no lap has been set.
    pub best_lap_time: f64,
    pub speed: f64,
    pub in_garage: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub track_length: f64,
    pub player_index: usize,
    pub session: i64,
    pub vehicles: Vec<VehicleSnapshot>,
}

impl Snapshot {
    pub fn in_race(&self) -> bool {
        self.session > LAST_NON_RACE_SESSION
    }

    pub fn player(&self) -> Option<&VehicleSnapshot> {
        self.vehicles.iter().find(|vehicle| vehicle.index == self.player_index)
    }

    pub fn vehicle(&self, index: usize) -> Option<&VehicleSnapshot> {
        self.vehicles.iter().find(|vehicle| vehicle.index == index)
    }

    pub fn lap_progress(&self, vehicle: &VehicleSnapshot) -> f64 {
        vehicle.total_laps as f64 + calc::lap_progress_distance(vehicle.lap_distance, self.track_length)
    }

    pub fn from_yaml(doc: &Yaml) -> Result<Snapshot, SnapshotError> {
        let track_length = yaml_f64(&doc["TrackLength"]).ok_or(SnapshotError::MissingField("TrackLength"))?;
        let player_index = doc["PlayerIndex"].as_i64()
                .ok_or(SnapshotError::MissingField("PlayerIndex"))?;
        let session = doc["Session"].as_i64().unwrap_or(0);

        let vehicles = match &doc["Vehicles"] {
            Yaml::Array(entries) => entries.iter().enumerate()
                    .map(|(slot, entry)| vehicle_from_yaml(slot, entry))
                    .collect::<Result<Vec<_>, _>>()?,
            Yaml::BadValue | Yaml::Null => vec![],
            _ => return Err(SnapshotError::MissingField("Vehicles")),
        };

        Ok(Snapshot {
            track_length: calc::finite_or_zero(track_length),
            player_index: player_index.max(0) as usize,
            session,
            vehicles,
        })
    }
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("empty snapshot document")]
    Empty,

    #[error("failed to parse snapshot yaml")]
    Parse(#[from] ScanError),

    #[error("snapshot field `{0}` is missing or has the wrong type")]
    MissingField(&'static str),
}

impl TryFrom<&String> for Snapshot {
    type Error = SnapshotError;

    fn try_from(str: &String) -> Result<Self, Self::Error> {
        let docs = YamlLoader::load_from_str(str)?;
        let doc = docs.first().ok_or(SnapshotError::Empty)?;
        Snapshot::from_yaml(doc)
    }
}

fn yaml_f64(value: &Yaml) -> Option<f64> {
    match value {
        Yaml::Real(_) => value.as_f64(),
        Yaml::Integer(int) => Some(*int as f64),
        _ => None,
    }
}

fn vehicle_from_yaml(slot: usize, entry: &Yaml) -> Result<VehicleSnapshot, SnapshotError> {
    let index = entry["Index"].as_i64().map(|index| index.max(0) as usize).unwrap_or(slot);
    let place = entry["Place"].as_i64().ok_or(SnapshotError::MissingField("Place"))?;
    let class_name = match &entry["Class"] {
        Yaml::String(class_name) => class_name.clone(),
        Yaml::BadValue | Yaml::Null => String::new(),
        _ => return Err(SnapshotError::MissingField("Class")),
    };

    Ok(VehicleSnapshot {
        index,
        driver_name: entry["Driver"].as_str().unwrap_or("").to_string(),
        class_name,
        place: place.max(0) as u32,
        lap_distance: calc::finite_or_zero(yaml_f64(&entry["LapDistance"]).unwrap_or(0.0)),
        total_laps: entry["TotalLaps"].as_i64().unwrap_or(0).max(0) as u32,
        best_lap_time: calc::finite_or_zero(yaml_f64(&entry["BestLapTime"]).unwrap_or(0.0)),
        speed: calc::finite_or_zero(yaml_f64(&entry["Speed"]).unwrap_or(0.0)),
        in_garage: entry["InGarage"].as_bool().unwrap_or(false),
    })
}
