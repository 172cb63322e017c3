//! Register-interface implementations over the simulated register file
//!
//! Writes to a peripheral whose bus clock is off are dropped, as on the
//! real chip.

use dormant_hal::{
    BusyWait, Edge, ExtiController, InputPort, InterruptController, LineMask, OutputPort,
    OverflowTimer, PinConfigurator, PinId, PinMask, PinMode, Port, PowerController, Priority,
    Sleeper, TickTimer, Vector, TICK_RELOAD_MAX,
};

use super::bus::{Sim, SimEvent};
use crate::irq::InterruptSource;

/// RCC port clocks plus GPIO mode fields
#[derive(Clone)]
pub struct SimPins(pub(crate) Sim);

impl PinConfigurator for SimPins {
    fn enable_port_clock(&mut self, port: Port) {
        self.0.with_regs(|r| r.port_clocks[port.index() as usize] = true);
    }

    fn set_mode(&mut self, pin: PinId, mode: PinMode) {
        self.0.with_regs(|r| {
            let p = pin.port.index() as usize;
            if r.port_clocks[p] {
                r.modes[p][pin.line as usize] = Some(mode);
            }
        });
    }
}

/// Data registers of one GPIO port
#[derive(Clone)]
pub struct SimGpio {
    pub(crate) sim: Sim,
    pub(crate) port: Port,
}

impl SimGpio {
    fn write(&mut self, f: impl FnOnce(u16) -> u16) {
        let port = self.port;
        let written = self.sim.with_regs(|r| {
            let p = port.index() as usize;
            if !r.port_clocks[p] {
                return None;
            }
            r.odr[p] = f(r.odr[p]);
            Some(PinMask(r.odr[p]))
        });
        if let Some(levels) = written {
            self.sim.record(SimEvent::Output { port, levels });
        }
    }
}

impl OutputPort for SimGpio {
    fn set_pins(&mut self, mask: PinMask) {
        self.write(|odr| odr | mask.bits());
    }

    fn clear_pins(&mut self, mask: PinMask) {
        self.write(|odr| odr & !mask.bits());
    }

    fn toggle_pins(&mut self, mask: PinMask) {
        self.write(|odr| odr ^ mask.bits());
    }

    fn output_levels(&self) -> PinMask {
        self.sim.regs().output_levels(self.port)
    }
}

impl InputPort for SimGpio {
    fn input_levels(&self) -> PinMask {
        self.sim.regs().input_levels(self.port)
    }
}

#[derive(Clone)]
pub struct SimExti(pub(crate) Sim);

impl ExtiController for SimExti {
    fn enable_syscfg_clock(&mut self) {
        self.0.with_regs(|r| r.syscfg_clock = true);
    }

    fn route(&mut self, line: u8, port: Port) {
        self.0.with_regs(|r| {
            if r.syscfg_clock {
                r.exti_routes[line as usize] = port;
            }
        });
    }

    fn unmask(&mut self, line: u8) {
        self.0.with_regs(|r| r.imr |= 1 << line);
    }

    fn set_trigger(&mut self, line: u8, edge: Edge) {
        let bit = 1u32 << line;
        self.0.with_regs(|r| match edge {
            Edge::Rising => {
                r.rtsr |= bit;
                r.ftsr &= !bit;
            }
            Edge::Falling => {
                r.rtsr &= !bit;
                r.ftsr |= bit;
            }
            Edge::Both => {
                r.rtsr |= bit;
                r.ftsr |= bit;
            }
        });
    }

    fn pending(&self) -> LineMask {
        LineMask(self.0.regs().pr)
    }

    fn clear_pending(&mut self, lines: LineMask) {
        self.0.with_regs(|r| r.pr &= !lines.bits());
        self.0.record(SimEvent::ExtiAck(lines));
    }
}

#[derive(Clone)]
pub struct SimTimer(pub(crate) Sim);

impl OverflowTimer for SimTimer {
    fn enable_clock(&mut self) {
        self.0.with_regs(|r| r.timer_clock = true);
    }

    fn set_prescaler(&mut self, psc: u16) {
        self.0.with_regs(|r| {
            if r.timer_clock {
                r.psc = psc;
            }
        });
    }

    fn set_auto_reload(&mut self, arr: u16) {
        self.0.with_regs(|r| {
            if r.timer_clock {
                r.arr = arr;
            }
        });
    }

    fn start(&mut self) {
        self.0.with_regs(|r| {
            if r.timer_clock && !r.timer_running {
                r.timer_running = true;
                r.timer_next = Some(r.now + r.timer_period());
            }
        });
    }

    fn enable_update_interrupt(&mut self) {
        self.0.with_regs(|r| {
            if r.timer_clock {
                r.uie = true;
            }
        });
    }

    fn update_pending(&self) -> bool {
        self.0.regs().uif
    }

    fn clear_update_flag(&mut self) {
        self.0.with_regs(|r| r.uif = false);
        self.0.record(SimEvent::TimerAck);
    }
}

#[derive(Clone)]
pub struct SimTick(pub(crate) Sim);

impl TickTimer for SimTick {
    fn set_reload(&mut self, reload: u32) {
        self.0.with_regs(|r| r.tick_load = reload & TICK_RELOAD_MAX);
    }

    fn clear_current(&mut self) {
        self.0.with_regs(|r| {
            if r.tick_enabled {
                r.tick_next = Some(r.now + r.tick_period());
            }
        });
    }

    fn enable(&mut self) {
        self.0.with_regs(|r| {
            r.tick_enabled = true;
            r.tick_next = Some(r.now + r.tick_period());
        });
    }
}

#[derive(Clone)]
pub struct SimNvic(pub(crate) Sim);

impl InterruptController for SimNvic {
    fn enable(&mut self, vector: Vector) {
        if vector == Vector::SysTick {
            return;
        }
        let source = InterruptSource::from_vector(vector);
        self.0.with_regs(|r| r.nvic_enabled.insert(source));
    }

    fn set_priority(&mut self, vector: Vector, priority: Priority) {
        self.0.set_priority(InterruptSource::from_vector(vector), priority);
    }
}

/// PWR control/status plus the SCB deep-sleep bit
#[derive(Clone)]
pub struct SimPower(pub(crate) Sim);

impl PowerController for SimPower {
    fn enable_clock(&mut self) {
        self.0.with_regs(|r| r.pwr_clock = true);
    }

    fn set_sleep_deep(&mut self, on: bool) {
        self.0.with_regs(|r| r.sleep_deep = on);
    }

    fn set_low_power_regulator(&mut self, on: bool) {
        self.0.with_regs(|r| {
            if r.pwr_clock {
                r.lpds = on;
            }
        });
    }

    fn set_power_down_deep_sleep(&mut self, on: bool) {
        self.0.with_regs(|r| {
            if r.pwr_clock {
                r.pdds = on;
            }
        });
    }

    fn enable_wakeup_pin(&mut self, pin: u8, on: bool) {
        self.0.with_regs(|r| {
            if r.pwr_clock && pin == 1 {
                r.ewup1 = on;
            }
        });
    }

    fn clear_wakeup_flag(&mut self) {
        self.0.with_regs(|r| {
            if r.pwr_clock {
                r.wuf = false;
            }
        });
        self.0.record(SimEvent::WakeFlagCleared);
    }

    fn standby_flag(&self) -> bool {
        self.0.regs().sbf
    }

    fn clear_standby_flag(&mut self) {
        self.0.with_regs(|r| {
            if r.pwr_clock {
                r.sbf = false;
            }
        });
    }
}

#[derive(Clone)]
pub struct SimDelay(pub(crate) Sim);

impl BusyWait for SimDelay {
    fn spin(&mut self, cycles: u32) {
        self.0.spin(cycles);
    }
}

#[derive(Clone)]
pub struct SimSleeper(pub(crate) Sim);

impl Sleeper for SimSleeper {
    fn wait_for_interrupt(&mut self) {
        self.0.suspend();
    }
}

impl Sim {
    pub fn pins(&self) -> SimPins {
        SimPins(self.clone())
    }

    pub fn gpio(&self, port: Port) -> SimGpio {
        SimGpio {
            sim: self.clone(),
            port,
        }
    }

    pub fn exti(&self) -> SimExti {
        SimExti(self.clone())
    }

    pub fn timer(&self) -> SimTimer {
        SimTimer(self.clone())
    }

    pub fn tick(&self) -> SimTick {
        SimTick(self.clone())
    }

    pub fn nvic(&self) -> SimNvic {
        SimNvic(self.clone())
    }

    pub fn power(&self) -> SimPower {
        SimPower(self.clone())
    }

    pub fn delay(&self) -> SimDelay {
        SimDelay(self.clone())
    }

    pub fn sleeper(&self) -> SimSleeper {
        SimSleeper(self.clone())
    }
}
