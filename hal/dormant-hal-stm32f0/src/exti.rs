//! EXTI lines and SYSCFG port routing

use dormant_hal::{Edge, ExtiController, LineMask, Port};
use embassy_stm32::pac;
use embassy_stm32::pac::exti::regs::Lines;

/// The EXTI block (line registers in bank 0)
#[derive(Clone, Copy)]
pub struct Exti {
    _private: (),
}

impl Exti {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

impl ExtiController for Exti {
    fn enable_syscfg_clock(&mut self) {
        pac::RCC.apb2enr().modify(|w| w.set_syscfgen(true));
    }

    fn route(&mut self, line: u8, port: Port) {
        let line = line as usize;
        pac::SYSCFG
            .exticr(line / 4)
            .modify(|w| w.set_exti(line % 4, port.index()));
    }

    fn unmask(&mut self, line: u8) {
        pac::EXTI.imr(0).modify(|w| w.set_line(line as usize, true));
    }

    fn set_trigger(&mut self, line: u8, edge: Edge) {
        let line = line as usize;
        let (rising, falling) = match edge {
            Edge::Rising => (true, false),
            Edge::Falling => (false, true),
            Edge::Both => (true, true),
        };
        pac::EXTI.rtsr(0).modify(|w| w.set_line(line, rising));
        pac::EXTI.ftsr(0).modify(|w| w.set_line(line, falling));
    }

    fn pending(&self) -> LineMask {
        LineMask(pac::EXTI.pr(0).read().0)
    }

    fn clear_pending(&mut self, lines: LineMask) {
        // Write-1-to-clear: zero bits leave other lines pending
        pac::EXTI.pr(0).write_value(Lines(lines.bits()));
    }
}
