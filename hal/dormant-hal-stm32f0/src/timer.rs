//! TIM14 as the overflow timer, and the core SysTick

use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::peripheral::{NVIC, SYST};
use dormant_hal::{OverflowTimer, TickTimer, TICK_RELOAD_MAX};
use embassy_stm32::pac;

/// TIM14, a 16-bit up-counter on APB1
///
/// Zero-sized: the idle loop and the timer handler each hold one.
#[derive(Clone, Copy)]
pub struct Tim14 {
    _private: (),
}

impl Tim14 {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

impl OverflowTimer for Tim14 {
    fn enable_clock(&mut self) {
        pac::RCC.apb1enr().modify(|w| w.set_tim14en(true));
    }

    fn set_prescaler(&mut self, psc: u16) {
        pac::TIM14.psc().write(|w| w.set_psc(psc));
    }

    fn set_auto_reload(&mut self, arr: u16) {
        pac::TIM14.arr().write(|w| w.set_arr(arr));
    }

    fn start(&mut self) {
        let tim = pac::TIM14;
        // PSC is buffered; force an update event so the first period uses it,
        // then drop the flag and the NVIC pend that event raised
        tim.egr().write(|w| w.set_ug(true));
        clear_uif();
        NVIC::unpend(pac::Interrupt::TIM14);
        tim.cr1().modify(|w| w.set_cen(true));
    }

    fn enable_update_interrupt(&mut self) {
        pac::TIM14.dier().modify(|w| w.set_uie(true));
    }

    fn update_pending(&self) -> bool {
        pac::TIM14.sr().read().uif()
    }

    fn clear_update_flag(&mut self) {
        clear_uif();
    }
}

/// SR store clearing UIF (bit 0) alone
///
/// SR flags are rc_w0, so ones leave the other flags as they are, even one
/// that sets between a read and a write.
const SR_CLEAR_UIF: u32 = !1;

fn clear_uif() {
    pac::TIM14.sr().write(|w| w.0 = SR_CLEAR_UIF);
}

/// The SysTick core peripheral
pub struct SysTick {
    syst: SYST,
}

impl SysTick {
    pub(crate) fn new(syst: SYST) -> Self {
        Self { syst }
    }
}

impl TickTimer for SysTick {
    fn set_reload(&mut self, reload: u32) {
        self.syst.set_reload(reload & TICK_RELOAD_MAX);
    }

    fn clear_current(&mut self) {
        self.syst.clear_current();
    }

    fn enable(&mut self) {
        self.syst.set_clock_source(SystClkSource::Core);
        self.syst.enable_interrupt();
        self.syst.enable_counter();
    }
}
