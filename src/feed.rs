use std::path::Path;
use std::time::{ Duration, Instant };

use async_std::fs;
use async_trait::async_trait;
use yaml_rust::YamlLoader;

use crate::telemetry::{ Snapshot, SnapshotError, VehicleSnapshot };

#[async_trait]
pub trait TelemetrySource: Send {
    async fn poll(&mut self) -> Option<Snapshot>;
}

const SIMULATED_RACE_SESSION: i64 = 10;

struct SimulatedCar {
    driver_name: String,
    class_name: String,
    speed: f64,
    distance: f64,
    best_lap_time: f64,
    in_garage: bool,
}

pub struct SimulatedFeed {
    track_length: f64,
    player_index: usize,
    cars: Vec<SimulatedCar>,
    last_tick: Option<Instant>,
}

impl SimulatedFeed {
    pub fn new(field_size: usize, track_length: f64, player_index: usize) -> SimulatedFeed {
        let cars = (0..field_size)
            .map(|index| {
                let prototype = index % 3 == 0;
                let base_speed = if prototype { 62.0 } else { 52.0 };
                SimulatedCar {
                    driver_name: format!["Driver {}", index + 1],
                    class_name: if prototype { "LMP2".to_string() } else { "GT3".to_string() },
                    speed: base_speed - (index as f64 * 0.37) % 3.0,
                    distance: track_length - index as f64 * 25.0,
                    best_lap_time: 0.0,
                    in_garage: field_size > 1 && index == field_size - 1,
                }
            })
            .collect();

        SimulatedFeed {
            track_length,
            player_index,
            cars,
            last_tick: None,
        }
    }

    pub fn advance(&mut self, elapsed: Duration) -> Snapshot {
        let dt = elapsed.as_secs_f64();
        for car in self.cars.iter_mut().filter(|car| !car.in_garage) {
            let laps_before = (car.distance / self.track_length).floor();
            car.distance += car.speed * dt;
            let laps_after = (car.distance / self.track_length).floor();

            if laps_after > laps_before && laps_after > 1.0 {
                let lap_time = self.track_length / car.speed;
                if car.best_lap_time <= 0.0 || lap_time < car.best_lap_time {
                    car.best_lap_time = lap_time;
                }
            }
        }

        let mut running_order: Vec<usize> = (0..self.cars.len()).collect();
        running_order.sort_by(|a, b| {
            let (a, b) = (&self.cars[*a], &self.cars[*b]);
            a.in_garage.cmp(&b.in_garage).then(b.distance.total_cmp(&a.distance))
        });

        let mut vehicles: Vec<VehicleSnapshot> = self.cars.iter().enumerate()
            .map(|(index, car)| VehicleSnapshot {
                index,
                driver_name: car.driver_name.clone(),
                class_name: car.class_name.clone(),
                place: 0,
                lap_distance: car.distance.rem_euclid(self.track_length),
                total_laps: (car.distance / self.track_length).floor().max(0.0) as u32,
                best_lap_time: car.best_lap_time,
                speed: if car.in_garage { 0.0 } else { car.speed },
                in_garage: car.in_garage,
            })
            .collect();
        for (place, index) in running_order.into_iter().enumerate() {
            vehicles[index].place = place as u32 + 1;
        }

        Snapshot {
            track_length: self.track_length,
            player_index: self.player_index,
            session: SIMULATED_RACE_SESSION,
            vehicles,
        }
    }
}

#[async_trait]
impl TelemetrySource for SimulatedFeed {
    async fn poll(&mut self) -> Option<Snapshot> {
        let now = Instant::now();
        let elapsed = self.last_tick.map(|last| now.duration_since(last)).unwrap_or_default();
        self.last_tick = Some(now);
        Some(self.advance(elapsed))
    }
}

pub struct ReplayFeed {
    snapshots: Vec<Snapshot>,
    next: usize,
}

impl ReplayFeed {
    pub fn new(snapshots: Vec<Snapshot>) -> ReplayFeed {
        ReplayFeed { snapshots, next: 0 }
    }

    pub fn parse(content: &str) -> Result<ReplayFeed, SnapshotError> {
        let snapshots = YamlLoader::load_from_str(content)?
            .iter()
            .map(Snapshot::from_yaml)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ReplayFeed::new(snapshots))
    }

    pub async fn load(path: &Path) -> Result<ReplayFeed, ReplayError> {
        let content = fs::read_to_string(path).await?;
        let feed = ReplayFeed::parse(&content)?;
        info!["Loaded {} snapshots from {}", feed.snapshots.len(), path.display()];
        Ok(feed)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("failed to read replay file")]
    Io(#[from] std::io::Error),

    #[error("invalid replay snapshot")]
    Snapshot(#[from] SnapshotError),
}

#[async_trait]
impl TelemetrySource for ReplayFeed {
    async fn poll(&mut self) -> Option<Snapshot> {
        if self.snapshots.is_empty() {
            return None;
        }
        let snapshot = self.snapshots[self.next].clone();
        self.next = (self.next + 1) % self.snapshots.len();
        Some(snapshot)
    }
}
