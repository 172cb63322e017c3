//! NVIC vector enable and priority, plus the SysTick exception priority

use cortex_m::peripheral::{NVIC, SCB};
use dormant_hal::{InterruptController, Priority, Vector};
use embassy_stm32::pac::Interrupt;

/// SysTick priority byte within SHPR3
const SYSTICK_PRIORITY_SHIFT: u32 = 24;

pub struct Nvic {
    nvic: NVIC,
}

impl Nvic {
    pub(crate) fn new(nvic: NVIC) -> Self {
        Self { nvic }
    }
}

fn interrupt(vector: Vector) -> Option<Interrupt> {
    match vector {
        Vector::Exti0_1 => Some(Interrupt::EXTI0_1),
        Vector::Exti2_3 => Some(Interrupt::EXTI2_3),
        Vector::Timer => Some(Interrupt::TIM14),
        Vector::SysTick => None,
    }
}

impl InterruptController for Nvic {
    fn enable(&mut self, vector: Vector) {
        if let Some(irq) = interrupt(vector) {
            // SAFETY: handlers for every enabled vector are linked into the
            // firmware and their contexts are installed before startup
            // enables anything
            unsafe { NVIC::unmask(irq) };
        }
    }

    fn set_priority(&mut self, vector: Vector, priority: Priority) {
        let hw = priority.hardware_value();
        match interrupt(vector) {
            // SAFETY: priorities are only written during startup, before
            // the vector is unmasked
            Some(irq) => unsafe { self.nvic.set_priority(irq, hw) },
            None => {
                // SAFETY: SHPR3 is written once during startup, before the
                // tick counter runs; SCB is otherwise owned by `Power`,
                // which never touches SHPR
                unsafe {
                    (*SCB::PTR).shpr[1].modify(|r| {
                        (r & !(0xFF << SYSTICK_PRIORITY_SHIFT))
                            | (u32::from(hw) << SYSTICK_PRIORITY_SHIFT)
                    })
                };
            }
        }
    }
}
