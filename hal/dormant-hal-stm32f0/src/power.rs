//! PWR control/status and the SLEEPDEEP bit

use cortex_m::peripheral::SCB;
use dormant_hal::PowerController;
use embassy_stm32::pac;
use embassy_stm32::pac::pwr::vals::Pdds;

pub struct Power {
    scb: SCB,
}

impl Power {
    pub(crate) fn new(scb: SCB) -> Self {
        Self { scb }
    }
}

impl PowerController for Power {
    fn enable_clock(&mut self) {
        pac::RCC.apb1enr().modify(|w| w.set_pwren(true));
    }

    fn set_sleep_deep(&mut self, on: bool) {
        if on {
            self.scb.set_sleepdeep();
        } else {
            self.scb.clear_sleepdeep();
        }
    }

    fn set_low_power_regulator(&mut self, on: bool) {
        pac::PWR.cr().modify(|w| w.set_lpds(on));
    }

    fn set_power_down_deep_sleep(&mut self, on: bool) {
        let pdds = if on { Pdds::STANDBY_MODE } else { Pdds::STOP_MODE };
        pac::PWR.cr().modify(|w| w.set_pdds(pdds));
    }

    fn enable_wakeup_pin(&mut self, pin: u8, on: bool) {
        // EWUP fields are zero-based; WKUP1 is field 0
        let Some(index) = (pin as usize).checked_sub(1) else {
            return;
        };
        pac::PWR.csr().modify(|w| w.set_ewup(index, on));
    }

    fn clear_wakeup_flag(&mut self) {
        pac::PWR.cr().modify(|w| w.set_cwuf(true));
    }

    fn standby_flag(&self) -> bool {
        pac::PWR.csr().read().sbf()
    }

    fn clear_standby_flag(&mut self) {
        pac::PWR.cr().modify(|w| w.set_csbf(true));
    }
}
