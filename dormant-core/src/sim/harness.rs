//! Whole-board harness: the firmware's startup and idle loop on the
//! simulated chip

use dormant_hal::{Level, PinId};

use super::bus::{Sim, SimEvent};
use super::peripherals::{SimPower, SimSleeper, SimTimer};
use crate::boot::{boot, BootPeripherals, BootReport};
use crate::config::{ConfigError, PinMap, SystemConfig, ValidConfig};
use crate::handlers::{ButtonHandler, TickHandler, TimerHandler};
use crate::idle::IdleLoop;
use crate::irq::InterruptSource;

/// Why [`Simulator::run_until`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStop {
    Deadline,
    /// A source kept re-entering without being acknowledged
    Storm(InterruptSource),
}

/// Simulated board running the startup sequence and idle loop
pub struct Simulator {
    sim: Sim,
    config: ValidConfig,
    pins: PinMap,
    boots: Vec<BootReport>,
    idle: IdleLoop<SimPower, SimTimer, SimSleeper>,
}

impl Simulator {
    /// Validate, power on and boot
    pub fn new(config: &SystemConfig, pins: PinMap) -> Result<Self, ConfigError> {
        pins.validate()?;
        let config = config.validate()?;
        let sim = Sim::new();
        let idle = IdleLoop::new(sim.power(), sim.timer(), sim.sleeper());

        let mut simulator = Self {
            sim,
            config,
            pins,
            boots: Vec::new(),
            idle,
        };
        simulator.boot();
        Ok(simulator)
    }

    pub fn sim(&self) -> &Sim {
        &self.sim
    }

    pub fn config(&self) -> &ValidConfig {
        &self.config
    }

    pub fn pins(&self) -> &PinMap {
        &self.pins
    }

    /// Reports of every boot so far, oldest first
    pub fn boots(&self) -> &[BootReport] {
        &self.boots
    }

    pub fn idle(&self) -> &IdleLoop<SimPower, SimTimer, SimSleeper> {
        &self.idle
    }

    /// Install handler contexts, then run the startup sequence
    fn boot(&mut self) {
        let sim = &self.sim;
        let cfg = &self.config;
        let pins = &self.pins;

        for source in [InterruptSource::ExtiGroupA, InterruptSource::ExtiGroupB] {
            let mut handler = ButtonHandler::new(
                source,
                cfg,
                pins,
                sim.exti(),
                sim.gpio(pins.button_port()),
                sim.gpio(pins.led_port()),
                sim.delay(),
            );
            sim.attach(source, Box::new(move || handler.handle()));
        }

        let mut timer =
            TimerHandler::new(cfg, pins, sim.timer(), sim.gpio(pins.led_port()), sim.delay());
        sim.attach(InterruptSource::TimerOverflow, Box::new(move || timer.handle()));

        let mut tick = TickHandler::new(pins, sim.gpio(pins.led_port()));
        sim.attach(InterruptSource::SysTick, Box::new(move || tick.handle()));

        let report = boot(
            cfg,
            pins,
            BootPeripherals {
                gpio: &mut sim.pins(),
                exti: &mut sim.exti(),
                timer: &mut sim.timer(),
                tick: &mut sim.tick(),
                nvic: &mut sim.nvic(),
                power: &mut sim.power(),
            },
        );
        self.boots.push(report);
    }

    /// Schedule a press of `pin` at cycle `at`, released `hold` cycles later
    ///
    /// Pressed is the level opposite the button pull's idle level.
    pub fn press(&self, pin: PinId, at: u64, hold: u64) {
        let idle = self.pins.button_pull.idle_level();
        let active = Level::from(!idle.is_high());
        self.sim.schedule_input(at, pin, active);
        self.sim.schedule_input(at + hold, pin, idle);
    }

    /// Run the idle loop until the clock reaches `deadline`
    ///
    /// A Standby wake or a reset-pin assertion reboots the board from its
    /// configuration, as the reset vector would.
    pub fn run_until(&mut self, deadline: u64) -> RunStop {
        self.sim.set_deadline(deadline);
        loop {
            if let Some(source) = self.storming() {
                return RunStop::Storm(source);
            }
            if self.sim.take_reset() {
                self.boot();
            }
            if self.sim.now() >= deadline {
                return RunStop::Deadline;
            }
            self.idle.iterate();
        }
    }

    fn storming(&self) -> Option<InterruptSource> {
        if !self.sim.storm() {
            return None;
        }
        self.sim.trace().iter().rev().find_map(|t| match t.event {
            SimEvent::Storm(source) => Some(source),
            _ => None,
        })
    }
}

impl Drop for Simulator {
    fn drop(&mut self) {
        // Installed handlers hold handles back to the chip
        self.sim.clear_handlers();
    }
}
