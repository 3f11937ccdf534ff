//! Progress hooks for a backtest run.

use std::time::Instant;

/// Checkpoints emitted by the backtest runner, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    GenerationStarted { strategy: String },
    GenerationFinished { n_trades: usize },
    ExecutionStarted { n_trades: usize },
    ExecutionFinished { n_trades: usize },
    AggregationStarted { n_orders: usize },
    AggregationFinished { final_wealth: f64 },
}

pub trait ProgressObserver {
    fn on_event(&mut self, event: &ProgressEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl ProgressObserver for NullObserver {
    fn on_event(&mut self, _event: &ProgressEvent) {}
}

/// Forwards events to the `log` facade with the time spent in each phase.
#[derive(Debug, Default)]
pub struct LogObserver {
    phase_started: Option<Instant>,
}

impl LogObserver {
    pub fn new() -> Self {
        Self::default()
    }

    fn elapsed_ms(&mut self) -> u128 {
        self.phase_started
            .take()
            .map_or(0, |start| start.elapsed().as_millis())
    }
}

impl ProgressObserver for LogObserver {
    fn on_event(&mut self, event: &ProgressEvent) {
        match event {
            ProgressEvent::GenerationStarted { strategy } => {
                self.phase_started = Some(Instant::now());
                log::info!("generating trades with {strategy}");
            }
            ProgressEvent::GenerationFinished { n_trades } => {
                let ms = self.elapsed_ms();
                log::info!("generated {n_trades} trades ({ms} ms)");
            }
            ProgressEvent::ExecutionStarted { n_trades } => {
                self.phase_started = Some(Instant::now());
                log::info!("executing {n_trades} trades");
            }
            ProgressEvent::ExecutionFinished { n_trades } => {
                let ms = self.elapsed_ms();
                log::info!("executed {n_trades} trades ({ms} ms)");
            }
            ProgressEvent::AggregationStarted { n_orders } => {
                self.phase_started = Some(Instant::now());
                log::debug!("aggregating {n_orders} orders into transaction and wealth");
            }
            ProgressEvent::AggregationFinished { final_wealth } => {
                let ms = self.elapsed_ms();
                log::info!("final wealth {final_wealth:.4} ({ms} ms)");
            }
        }
    }
}

/// Keeps every event; handy for asserting on the checkpoint sequence.
#[derive(Debug, Default, Clone)]
pub struct RecordingObserver {
    pub events: Vec<ProgressEvent>,
}

impl ProgressObserver for RecordingObserver {
    fn on_event(&mut self, event: &ProgressEvent) {
        self.events.push(event.clone());
    }
}
