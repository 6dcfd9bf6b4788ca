mod calc;
mod classes;
mod config;
mod feed;
mod module;
mod relative;
mod shared;
mod standings;
mod telemetry;

#[macro_use] extern crate log;
extern crate env_logger;
extern crate yaml_rust;

use std::future::Future;
use std::path::{ Path, PathBuf };
use std::sync::Arc;
use std::time::Duration;

use async_std::io;
use async_std::task;

use config::{ Config, ConfigHandle };
use feed::{ TelemetrySource, SimulatedFeed, ReplayFeed };
use module::{ ModuleHandle, RelativeModule, RelativeOutput };
use shared::Shared;
use telemetry::Slot;

const DEFAULT_CONFIG_PATH: &str = "relative.yaml";
const CONFIG_POLL_INTERVAL: Duration = Duration::from_secs(2);
const REPORT_INTERVAL: Duration = Duration::from_secs(1);

const SIMULATED_FIELD_SIZE: usize = 24;
const SIMULATED_TRACK_LENGTH: f64 = 5793.0;
const SIMULATED_PLAYER_INDEX: usize = 10;

fn format_slots(slots: &[Slot]) -> String {
    slots.iter()
        .map(|slot| match slot {
            Some(index) => index.to_string(),
            None => "-".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

async fn load_config(path: &Path) -> Config {
    match Config::load(path).await {
        Ok(config) => {
            info!["Loaded config from {}", path.display()];
            config
        },
        Err(err) => {
            warn!["Using default config, failed to load {}: {}", path.display(), err];
            Config::default()
        }
    }
}

async fn open_source(replay: Option<PathBuf>) -> Box<dyn TelemetrySource> {
    if let Some(path) = replay {
        match ReplayFeed::load(&path).await {
            Ok(feed) => return Box::new(feed),
            Err(err) => error!["Failed to load replay {}: {}, falling back to simulation", path.display(), err],
        }
    }
    Box::new(SimulatedFeed::new(SIMULATED_FIELD_SIZE, SIMULATED_TRACK_LENGTH, SIMULATED_PLAYER_INDEX))
}

async fn report(handle: ModuleHandle) {
    loop {
        task::sleep(REPORT_INTERVAL).await;

        let output = handle.output();
        let snapshot = match &output.snapshot {
            Some(snapshot) => snapshot,
            None => {
                debug!("Waiting for session");
                continue;
            }
        };

        info!["Relative: {}", format_slots(&output.relative)];
        for row in relative::relative_rows(snapshot, &output.relative).into_iter().flatten() {
            debug![
                "{}{:<12} {:>8.1}m {:>6.2}s lap {:+.0}",
                if row.is_player { ">" } else { " " },
                row.vehicle.driver_name, row.relative_distance, row.time_gap, row.lap_difference
            ];
        }

        info!["Standings: {}", format_slots(&output.standings)];
        let player = output.vehicle_classes.iter()
                .find(|entry| entry.vehicle_index == snapshot.player_index);
        if let (Some(entry), Some(vehicle)) = (player, snapshot.player()) {
            let gap = calc::gap_to_best_lap(vehicle.best_lap_time,
                entry.session_best_lap_time, entry.class_best_lap_time, true);
            debug![
                "Player {} P{} in class, best {}, gap to class best {}",
                entry.class_name, entry.class_position, calc::sec2laptime(vehicle.best_lap_time.max(0.0)),
                gap.map(|gap| format!["{:.3}", gap]).unwrap_or_else(|| "leader".to_string())
            ];
        }
    }
}

// Ends on EOF, a read error, or a `q` line.
async fn wait_for_quit() {
    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        line.clear();
        match stdin.read_line(&mut line).await {
            Ok(0) => break,
            Ok(_) if line.trim() == "q" => break,
            Ok(_) => (),
            Err(err) => {
                warn!["Stopped reading stdin: {}", err];
                break;
            }
        }
    }
}

async fn run<F>(source: Box<dyn TelemetrySource>, settings: ConfigHandle, quit: F) -> Arc<RelativeOutput>
where
    F: Future<Output = ()>,
{
    let (module, handle) = RelativeModule::new(source, settings);
    let module_task = task::spawn(module.execute());
    let report_task = task::spawn(report(handle.clone()));

    quit.await;
    info!("Shutting down");

    handle.stop();
    module_task.await;
    report_task.cancel().await;

    handle.output()
}

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Debug)
        .init();

    let mut args = std::env::args().skip(1);
    let config_path = PathBuf::from(args.next().unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string()));
    let replay_path = args.next().map(PathBuf::from);

    task::block_on(async {
        let settings: ConfigHandle = Shared::new(load_config(&config_path).await);
        task::spawn(config::watch(config_path.clone(), settings.clone(), CONFIG_POLL_INTERVAL));

        let source = open_source(replay_path).await;
        run(source, settings, wait_for_quit()).await;
    });
}
