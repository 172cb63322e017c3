//! GPIO ports A, B and F
//!
//! The F030F4 package bonds out only these three ports; the build script
//! rejects pin maps that name any other.

use dormant_hal::{InputPort, OutputPort, PinConfigurator, PinId, PinMask, PinMode, Port, Pull};
use embassy_stm32::pac;
use embassy_stm32::pac::gpio::regs::Bsrr;
use embassy_stm32::pac::gpio::vals::{Moder, Pupdr};
use embassy_stm32::pac::gpio::Gpio;

/// A port letter with no GPIO block on this package
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UnsupportedPort(pub Port);

fn registers(port: Port) -> Result<Gpio, UnsupportedPort> {
    match port {
        Port::A => Ok(pac::GPIOA),
        Port::B => Ok(pac::GPIOB),
        Port::F => Ok(pac::GPIOF),
        other => Err(UnsupportedPort(other)),
    }
}

/// RCC port clocks plus MODER/PUPDR writes
pub struct PinSetup {
    _private: (),
}

impl PinSetup {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

impl PinConfigurator for PinSetup {
    fn enable_port_clock(&mut self, port: Port) {
        pac::RCC.ahbenr().modify(|w| match port {
            Port::A => w.set_gpioaen(true),
            Port::B => w.set_gpioben(true),
            Port::F => w.set_gpiofen(true),
            _ => {}
        });
    }

    fn set_mode(&mut self, pin: PinId, mode: PinMode) {
        let Ok(gpio) = registers(pin.port) else {
            return;
        };
        let n = pin.line as usize;
        match mode {
            PinMode::Input(pull) => {
                let pupdr = match pull {
                    Pull::None => Pupdr::FLOATING,
                    Pull::Up => Pupdr::PULL_UP,
                    Pull::Down => Pupdr::PULL_DOWN,
                };
                gpio.pupdr().modify(|w| w.set_pupdr(n, pupdr));
                gpio.moder().modify(|w| w.set_moder(n, Moder::INPUT));
            }
            PinMode::Output => {
                gpio.pupdr().modify(|w| w.set_pupdr(n, Pupdr::FLOATING));
                gpio.moder().modify(|w| w.set_moder(n, Moder::OUTPUT));
            }
        }
    }
}

/// Data registers of one port
///
/// Set and clear go through BSRR, which is a single store and needs no
/// locking. Copies may be held by several handler contexts.
#[derive(Clone, Copy)]
pub struct GpioPort {
    regs: Gpio,
}

impl GpioPort {
    pub fn new(port: Port) -> Result<Self, UnsupportedPort> {
        Ok(Self {
            regs: registers(port)?,
        })
    }
}

/// BSRR value setting `set` and resetting `reset`; set wins where both
/// name a line
fn bsrr(set: PinMask, reset: PinMask) -> Bsrr {
    Bsrr(u32::from(set.bits()) | (u32::from(reset.bits()) << 16))
}

impl OutputPort for GpioPort {
    fn set_pins(&mut self, mask: PinMask) {
        self.regs.bsrr().write_value(bsrr(mask, PinMask::EMPTY));
    }

    fn clear_pins(&mut self, mask: PinMask) {
        self.regs.bsrr().write_value(bsrr(PinMask::EMPTY, mask));
    }

    fn toggle_pins(&mut self, mask: PinMask) {
        // ODR read and BSRR write must not be split by a preempting handler
        // that drives the same pins
        critical_section::with(|_| {
            let high = self.output_levels().intersection(mask);
            self.regs
                .bsrr()
                .write_value(bsrr(mask.difference(high), high));
        });
    }

    fn output_levels(&self) -> PinMask {
        PinMask(self.regs.odr().read().0 as u16)
    }
}

impl InputPort for GpioPort {
    fn input_levels(&self) -> PinMask {
        PinMask(self.regs.idr().read().0 as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bsrr_layout() {
        assert_eq!(bsrr(PinMask(0b1000), PinMask::EMPTY).0, 0b1000);
        assert_eq!(bsrr(PinMask::EMPTY, PinMask(0b1000)).0, 0b1000 << 16);
        assert_eq!(
            bsrr(PinMask(0b01_0000), PinMask(0b10_1000)).0,
            0b01_0000 | (0b10_1000 << 16)
        );
    }

    #[test]
    fn test_only_bonded_ports() {
        assert!(registers(Port::A).is_ok());
        assert!(registers(Port::F).is_ok());
        assert_eq!(registers(Port::C).err(), Some(UnsupportedPort(Port::C)));
    }
}
