//! Cosmetic loading state and the caption ticker that runs beside it.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::{
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};

pub const LOADER_CAPTIONS: [&str; 4] = [
    "Syncing Live Weather...",
    "Analyzing Atmosphere...",
    "Simulating Risks...",
    "Generating Report...",
];

pub const MAX_PROGRESS: u8 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadingState {
    active: bool,
    progress: u8,
    phase_index: usize,
}

impl LoadingState {
    pub fn begin(initial_progress: u8) -> Self {
        Self {
            active: true,
            progress: initial_progress.min(MAX_PROGRESS),
            phase_index: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn phase_index(&self) -> usize {
        self.phase_index
    }

    pub fn caption(&self) -> &'static str {
        LOADER_CAPTIONS[self.phase_index % LOADER_CAPTIONS.len()]
    }

    /// Raises progress to `value`; lower values never overwrite higher ones.
    pub fn advance(&mut self, value: u8) -> bool {
        let value = value.min(MAX_PROGRESS);
        if !self.active || value <= self.progress {
            return false;
        }
        self.progress = value;
        true
    }

    pub fn tick(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.phase_index = (self.phase_index + 1) % LOADER_CAPTIONS.len();
        true
    }

    pub fn finish(&mut self) {
        self.active = false;
        self.phase_index = 0;
    }
}

/// Counts caption timers that are still scheduled.
#[derive(Debug, Clone, Default)]
pub struct TimerGauge(Arc<AtomicUsize>);

impl TimerGauge {
    pub fn live(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Periodic caption task. Dropping the ticker aborts the task.
#[derive(Debug)]
pub struct LoaderTicker {
    handle: Option<JoinHandle<()>>,
    gauge: TimerGauge,
}

impl LoaderTicker {
    pub fn start<F>(period: Duration, gauge: &TimerGauge, mut on_tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        gauge.0.fetch_add(1, Ordering::SeqCst);
        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                on_tick();
            }
        });
        Self {
            handle: Some(handle),
            gauge: gauge.clone(),
        }
    }

    pub fn stop(self) {}
}

impl Drop for LoaderTicker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            self.gauge.0.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
#[path = "tests/loader_tests.rs"]
mod tests;
