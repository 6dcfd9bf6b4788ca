use std::sync::Arc;

use async_std::channel;
use async_std::channel::{ Sender, Receiver };
use async_std::future;

use crate::classes::{ self, ClassEntry };
use crate::config::{ Config, ConfigHandle };
use crate::feed::TelemetrySource;
use crate::relative;
use crate::shared::Shared;
use crate::standings;
use crate::telemetry::{ Slot, Snapshot };

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RelativeOutput {
    pub relative: Vec<Slot>,
    pub standings: Vec<Slot>,
    pub vehicle_classes: Vec<ClassEntry>,
    pub snapshot: Option<Arc<Snapshot>>,
}

impl RelativeOutput {
    pub fn is_idle(&self) -> bool {
        self.snapshot.is_none()
    }
}

pub fn compute(snapshot: &Snapshot, config: &Config) -> RelativeOutput {
    if snapshot.vehicles.is_empty() {
        return RelativeOutput::default();
    }

    let relative = relative::build_relative(snapshot, &config.relative);
    let groups = classes::group_classes(&snapshot.vehicles);
    let standings = standings::build_standings(snapshot, &groups, &config.standings);

    RelativeOutput {
        relative,
        standings,
        vehicle_classes: groups.entries,
        snapshot: Some(Arc::new(snapshot.clone())),
    }
}

pub struct RelativeModule {
    source: Box<dyn TelemetrySource>,
    config: ConfigHandle,
    output: Shared<RelativeOutput>,
    stop: Receiver<()>,
}

#[derive(Clone)]
pub struct ModuleHandle {
    output: Shared<RelativeOutput>,
    stop: Sender<()>,
}

impl ModuleHandle {
    pub fn output(&self) -> Arc<RelativeOutput> {
        self.output.get()
    }

    /// Asks the module to exit once its current tick is done.
    pub fn stop(&self) {
        let _ = self.stop.try_send(());
    }
}

impl RelativeModule {
    pub fn new(source: Box<dyn TelemetrySource>, config: ConfigHandle) -> (RelativeModule, ModuleHandle) {
        let (stop_sender, stop_receiver) = channel::bounded(1);
        let output = Shared::default();

        (
            RelativeModule {
                source,
                config,
                output: output.clone(),
                stop: stop_receiver,
            },
            ModuleHandle {
                output,
                stop: stop_sender,
            }
        )
    }

    pub async fn execute(mut self) {
        info!("relative module started");

        let mut active = false;
        loop {
            let config = self.config.get();

            match self.source.poll().await {
                Some(snapshot) => {
                    if !active {
                        active = true;
                        debug!("Session active, updating every {:?}", config.module_relative.update_interval);
                    }
                    let output = compute(&snapshot, &config);
                    if output.is_idle() {
                        trace!("Empty snapshot, publishing idle output");
                    }
                    self.output.replace(output);
                },
                None => {
                    if active {
                        active = false;
                        debug!("Session inactive, updating every {:?}", config.module_relative.idle_update_interval);
                    }
                }
            }

            let interval = if active {
                config.module_relative.update_interval
            } else {
                config.module_relative.idle_update_interval
            };

            // Either a stop request or a closed handle ends the loop.
            if future::timeout(interval, self.stop.recv()).await.is_ok() {
                break;
            }
        }

        self.output.replace(RelativeOutput::default());
        info!("relative module closed");
    }
}
