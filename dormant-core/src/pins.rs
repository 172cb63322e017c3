//! Pin configuration
//!
//! Runs once at startup. Every port that owns a requested pin gets its
//! clock enabled exactly once, before any of its mode fields are written.

use dormant_hal::{PinConfigurator, PinId, PinMode, Port};

/// Enable the owning port clocks, then write each pin's mode
pub fn configure_pins<G: PinConfigurator>(gpio: &mut G, assignments: &[(PinId, PinMode)]) {
    let mut clocked = [false; Port::ALL.len()];
    for (pin, _) in assignments {
        let idx = pin.port.index() as usize;
        if !clocked[idx] {
            gpio.enable_port_clock(pin.port);
            clocked[idx] = true;
        }
    }

    for (pin, mode) in assignments {
        gpio.set_mode(*pin, *mode);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PinMap;
    use dormant_hal::Pull;

    #[derive(Default)]
    struct MockGpio {
        clocks: Vec<Port>,
        modes: Vec<(PinId, PinMode)>,
    }

    impl PinConfigurator for MockGpio {
        fn enable_port_clock(&mut self, port: Port) {
            assert!(self.modes.is_empty(), "clock enabled after a mode write");
            self.clocks.push(port);
        }

        fn set_mode(&mut self, pin: PinId, mode: PinMode) {
            assert!(self.clocks.contains(&pin.port), "mode written without clock");
            self.modes.push((pin, mode));
        }
    }

    #[test]
    fn test_reference_board() {
        let mut gpio = MockGpio::default();
        configure_pins(&mut gpio, &PinMap::REFERENCE.assignments());

        assert_eq!(gpio.clocks, vec![Port::A]);
        assert_eq!(gpio.modes.len(), 6);
        for (pin, mode) in &gpio.modes[..3] {
            assert!(pin.line <= 2);
            assert_eq!(*mode, PinMode::Input(Pull::Up));
        }
        for (_, mode) in &gpio.modes[3..] {
            assert_eq!(*mode, PinMode::Output);
        }
    }

    #[test]
    fn test_each_port_clocked_once() {
        let pa = |line| PinId { port: Port::A, line };
        let pb = |line| PinId { port: Port::B, line };
        let assignments = [
            (pb(1), PinMode::Output),
            (pa(0), PinMode::Input(Pull::Down)),
            (pb(2), PinMode::Output),
            (pa(7), PinMode::Output),
        ];

        let mut gpio = MockGpio::default();
        configure_pins(&mut gpio, &assignments);
        assert_eq!(gpio.clocks, vec![Port::B, Port::A]);
        assert_eq!(gpio.modes, assignments.to_vec());
    }

    #[test]
    fn test_empty_list() {
        let mut gpio = MockGpio::default();
        configure_pins(&mut gpio, &[]);
        assert!(gpio.clocks.is_empty());
    }
}
