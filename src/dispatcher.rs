//! The single host loop that every engine callback runs on.

use crate::platform::{EventPump, InputSourceController, ObserverFactory, Workspace};
use crate::service::{Flow, SwitchService};
use crate::signal::Signal;
use log::{debug, info};
use std::sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError};
use std::time::{Duration, Instant};

pub struct Dispatcher<W, C, F>
where
    F: ObserverFactory,
{
    rx: Receiver<Signal>,
    service: SwitchService<W, C, F>,
    pump: Option<Box<dyn EventPump>>,
    pump_interval: Duration,
}

impl<W, C, F> Dispatcher<W, C, F>
where
    W: Workspace,
    C: InputSourceController,
    F: ObserverFactory,
{
    pub fn new(
        rx: Receiver<Signal>,
        service: SwitchService<W, C, F>,
        pump_interval: Duration,
    ) -> Self {
        Self {
            rx,
            service,
            pump: None,
            pump_interval,
        }
    }

    /// Let `pump` deliver platform events while the loop waits.
    pub fn with_pump(mut self, pump: Box<dyn EventPump>) -> Self {
        self.pump = Some(pump);
        self
    }

    /// Run until a shutdown signal arrives or every sender is gone, then
    /// release all observers. Returns the service for inspection.
    pub fn run(mut self) -> SwitchService<W, C, F> {
        self.service.start(Instant::now());

        loop {
            self.service.fire_due(Instant::now());

            let wait = self.wait_budget(Instant::now());
            if self.wait_and_drain(wait) == Flow::Stop {
                break;
            }
        }

        info!("Switch service stopping");
        self.service.shutdown();
        self.service
    }

    /// Time until the pending check is due, capped at one pump slice.
    fn wait_budget(&self, now: Instant) -> Duration {
        match self.service.next_deadline() {
            Some(deadline) => deadline.saturating_duration_since(now).min(self.pump_interval),
            None => self.pump_interval,
        }
    }

    fn wait_and_drain(&mut self, wait: Duration) -> Flow {
        if let Some(pump) = self.pump.as_mut() {
            pump.pump(wait);
        } else {
            match self.rx.recv_timeout(wait) {
                Ok(signal) => {
                    if self.dispatch(signal) == Flow::Stop {
                        return Flow::Stop;
                    }
                }
                Err(RecvTimeoutError::Timeout) => return Flow::Continue,
                Err(RecvTimeoutError::Disconnected) => return Flow::Stop,
            }
        }

        loop {
            match self.rx.try_recv() {
                Ok(signal) => {
                    if self.dispatch(signal) == Flow::Stop {
                        return Flow::Stop;
                    }
                }
                Err(TryRecvError::Empty) => return Flow::Continue,
                Err(TryRecvError::Disconnected) => return Flow::Stop,
            }
        }
    }

    fn dispatch(&mut self, signal: Signal) -> Flow {
        debug!("Signal: {signal:?}");
        self.service.handle(signal, Instant::now())
    }
}
