//! The loop that drives an Emulator at a fixed instruction rate and a fixed
//! timer rate, feeding it input and handing its frames to a frontend
use std::thread;
use std::time::{Duration, Instant};

use slog::{info, o, Logger};

use crate::config::Config;
use crate::error::Result;
use crate::graphics::Graphics;
use crate::keyboard::AsKeyboard;
use crate::Emulator;

/// How long the loop sleeps when neither a step nor a tick is due
const IDLE_SLEEP: Duration = Duration::from_micros(200);

/// What the host loop should run on this pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Due {
    pub step: bool,
    pub tick: bool,
}

/// Decides from wall clock time when the next step and the next timer tick are
/// due. The two run on independent clocks
#[derive(Debug, Clone)]
pub struct Pacer {
    step_interval: Duration,
    tick_interval: Duration,
    last_step: Instant,
    last_tick: Instant,
}

impl Pacer {
    pub fn new(step_interval: Duration, tick_interval: Duration, start: Instant) -> Self {
        Pacer {
            step_interval,
            tick_interval,
            last_step: start,
            last_tick: start,
        }
    }

    /// A step is due once more than one step interval has passed since the last
    /// step, and likewise for ticks. Reporting one as due restarts its clock at `now`
    pub fn poll(&mut self, now: Instant) -> Due {
        let mut due = Due::default();

        if now.saturating_duration_since(self.last_step) > self.step_interval {
            self.last_step = now;
            due.step = true;
        }
        if now.saturating_duration_since(self.last_tick) > self.tick_interval {
            self.last_tick = now;
            due.tick = true;
        }
        due
    }
}

/// The windowing, rendering and input side of the emulator
pub trait Frontend: AsKeyboard {
    /// The loop stops once this returns false
    fn is_open(&self) -> bool;

    /// Called at the timer rate. `frame` is the screen when it changed since the
    /// last call, None otherwise. Frontends should pump their event queue here
    fn present(&mut self, frame: Option<&Graphics>) -> Result<()>;

    /// The sound timer ran out and a tone should be played
    fn tone(&mut self) {}
}

/// Counters describing what a run did
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub steps: u64,
    pub ticks: u64,
    /// instructions that were skipped because they couldn't run
    pub faults: u64,
    pub frames: u64,
    pub tones: u64,
}

pub struct Runner {
    step_interval: Duration,
    tick_interval: Duration,
    logger: Logger,
}

impl Runner {
    pub fn new(config: &Config, logger: Option<Logger>) -> Result<Self> {
        let config = config.clone().validate()?;
        let logger = logger.unwrap_or_else(crate::logger::discard);
        Ok(Runner {
            step_interval: config.step_interval(),
            tick_interval: config.tick_interval(),
            logger: logger.new(o!("component" => "host")),
        })
    }

    /// Run until the frontend closes
    pub fn run<F: Frontend>(&self, emulator: &mut Emulator, frontend: &mut F) -> Result<RunStats> {
        self.run_until(emulator, frontend, None)
    }

    /// Run until the frontend closes or `max_steps` instructions have executed
    pub fn run_for<F: Frontend>(
        &self,
        emulator: &mut Emulator,
        frontend: &mut F,
        max_steps: u64,
    ) -> Result<RunStats> {
        self.run_until(emulator, frontend, Some(max_steps))
    }

    fn run_until<F: Frontend>(
        &self,
        emulator: &mut Emulator,
        frontend: &mut F,
        max_steps: Option<u64>,
    ) -> Result<RunStats> {
        let mut pacer = Pacer::new(self.step_interval, self.tick_interval, Instant::now());
        let mut stats = RunStats::default();
        info!(self.logger, "starting";
            "step_interval_us" => self.step_interval.as_micros() as u64,
            "tick_interval_us" => self.tick_interval.as_micros() as u64);

        while frontend.is_open() && max_steps.map_or(true, |max| stats.steps < max) {
            emulator.handle_key_input(&*frontend);

            let due = pacer.poll(Instant::now());
            if due.step {
                stats.steps += 1;
                match emulator.step() {
                    Ok(_) => {}
                    // already logged by the emulator, the faulty instruction was skipped
                    Err(e) if e.is_runtime_fault() => stats.faults += 1,
                    Err(e) => return Err(e),
                }
            }

            if due.tick {
                stats.ticks += 1;
                if emulator.tick() {
                    stats.tones += 1;
                    frontend.tone();
                }

                let frame = emulator.take_frame();
                if frame.is_some() {
                    stats.frames += 1;
                }
                frontend.present(frame)?;
            }

            if !due.step && !due.tick {
                thread::sleep(IDLE_SLEEP);
            }
        }

        info!(self.logger, "stopped"; "steps" => stats.steps, "ticks" => stats.ticks, "faults" => stats.faults);
        Ok(stats)
    }
}
