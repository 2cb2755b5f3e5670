use crate::hub::hub_command::HubCommand;
use crate::hub::hub_observer::HubObserver;
use crate::hub::switchboard::{Switchboard, SwitchboardSettings};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Единственный владелец состояния сигнального слоя.
pub struct Hub {
    switchboard: Switchboard,
    observer: Arc<dyn HubObserver>,
    command_rx: mpsc::Receiver<HubCommand>,
    sweep_interval: Duration,
}

impl Hub {
    pub fn new(
        settings: SwitchboardSettings,
        observer: Arc<dyn HubObserver>,
        command_rx: mpsc::Receiver<HubCommand>,
        sweep_interval: Duration,
    ) -> Self {
        Self {
            switchboard: Switchboard::new(settings),
            observer,
            command_rx,
            sweep_interval,
        }
    }

    pub async fn run(mut self) {
        info!("Hub event loop started");

        let mut sweep = tokio::time::interval(self.sweep_interval.max(Duration::from_millis(1)));
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(c) => self.handle_command(c),
                        None => {
                            info!("Command channel closed. Shutting down hub.");
                            break;
                        }
                    }
                }

                _ = sweep.tick() => {
                    self.switchboard.sweep(Instant::now());
                }
            }

            for notice in self.switchboard.drain_notices() {
                notice.dispatch(self.observer.as_ref()).await;
            }
        }

        info!("Hub event loop finished");
    }

    fn handle_command(&mut self, cmd: HubCommand) {
        match cmd {
            HubCommand::Connect {
                connection_id,
                kind,
                outbound,
            } => self.switchboard.connect(connection_id, kind, outbound),

            HubCommand::Event {
                connection_id,
                event,
            } => {
                debug!("{} from {}", event.name(), connection_id);
                self.switchboard.handle(connection_id, event, Instant::now());
            }

            HubCommand::Disconnect { connection_id } => {
                self.switchboard.disconnect(connection_id, Instant::now());
            }

            HubCommand::Stats { reply } => {
                let _ = reply.send(self.switchboard.stats());
            }
        }
    }
}
