//! Interrupt source configurator
//!
//! Arms each enabled source in the same order: prerequisite clock, unmask,
//! rising-edge trigger, then priority and enable at the interrupt
//! controller.
//!
//! Vector sharing:
//!
//! | Vector    | Lines | Handler                     |
//! |-----------|-------|-----------------------------|
//! | EXTI0_1   | 0, 1  | group A button handler      |
//! | EXTI2_3   | 2, 3  | group B button handler      |
//! | TIM14     | -     | timer overflow handler      |
//! | SysTick   | -     | tick handler                |
//!
//! Line 3 is never unmasked, so the group B handler only ever sees line 2.

use dormant_hal::{Edge, ExtiController, InterruptController, OverflowTimer, TickTimer};

use super::source::{InterruptSource, SourceSet};
use crate::config::{PinMap, ValidConfig};

/// Arms interrupt sources from a validated configuration
pub struct InterruptConfigurator<'a> {
    config: &'a ValidConfig,
    pins: &'a PinMap,
}

impl<'a> InterruptConfigurator<'a> {
    pub fn new(config: &'a ValidConfig, pins: &'a PinMap) -> Self {
        Self { config, pins }
    }

    /// Arm both EXTI groups for the button lines
    pub fn arm_external<E, N>(&self, exti: &mut E, nvic: &mut N)
    where
        E: ExtiController,
        N: InterruptController,
    {
        exti.enable_syscfg_clock();

        let port = self.pins.button_port();
        for pin in self.pins.buttons() {
            exti.route(pin.line, port);
            exti.unmask(pin.line);
            exti.set_trigger(pin.line, Edge::Rising);
        }
        // Edges seen while routing must not fire the moment the vector opens
        exti.clear_pending(self.pins.armed_lines());

        for source in [InterruptSource::ExtiGroupA, InterruptSource::ExtiGroupB] {
            nvic.set_priority(source.vector(), self.config.priority(source));
            nvic.enable(source.vector());
        }
    }

    /// Start the overflow timer with its update interrupt
    pub fn arm_timer<T, N>(&self, timer: &mut T, nvic: &mut N)
    where
        T: OverflowTimer,
        N: InterruptController,
    {
        let (psc, arr) = self.config.timer_registers();
        let source = InterruptSource::TimerOverflow;

        timer.enable_clock();
        timer.set_prescaler(psc);
        timer.set_auto_reload(arr);
        timer.enable_update_interrupt();
        timer.start();

        nvic.set_priority(source.vector(), self.config.priority(source));
        nvic.enable(source.vector());
    }

    /// Start SysTick with its exception enabled
    pub fn arm_tick<K, N>(&self, tick: &mut K, nvic: &mut N)
    where
        K: TickTimer,
        N: InterruptController,
    {
        let source = InterruptSource::SysTick;

        tick.set_reload(self.config.tick_load());
        tick.clear_current();
        nvic.set_priority(source.vector(), self.config.priority(source));
        tick.enable();
    }

    /// Arm every source the configuration enables
    pub fn arm_all<E, T, K, N>(
        &self,
        exti: &mut E,
        timer: &mut T,
        tick: &mut K,
        nvic: &mut N,
    ) -> SourceSet
    where
        E: ExtiController,
        T: OverflowTimer,
        K: TickTimer,
        N: InterruptController,
    {
        let armed = self.config.armed();

        if armed.contains(InterruptSource::ExtiGroupA) {
            self.arm_external(exti, nvic);
        }
        if armed.contains(InterruptSource::TimerOverflow) {
            self.arm_timer(timer, nvic);
        }
        if armed.contains(InterruptSource::SysTick) {
            self.arm_tick(tick, nvic);
        }

        armed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SystemConfig;
    use dormant_hal::{LineMask, Port, Priority, Vector};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Op {
        SyscfgClock,
        Route(u8, Port),
        Unmask(u8),
        Trigger(u8, Edge),
        ClearPending(LineMask),
        TimerClock,
        Prescaler(u16),
        AutoReload(u16),
        TimerStart,
        UpdateIrq,
        TickReload(u32),
        TickClear,
        TickEnable,
        Priority(Vector, u8),
        Enable(Vector),
    }

    #[derive(Default)]
    struct Recorder {
        ops: Vec<Op>,
    }

    impl ExtiController for Recorder {
        fn enable_syscfg_clock(&mut self) {
            self.ops.push(Op::SyscfgClock);
        }
        fn route(&mut self, line: u8, port: Port) {
            self.ops.push(Op::Route(line, port));
        }
        fn unmask(&mut self, line: u8) {
            self.ops.push(Op::Unmask(line));
        }
        fn set_trigger(&mut self, line: u8, edge: Edge) {
            self.ops.push(Op::Trigger(line, edge));
        }
        fn pending(&self) -> LineMask {
            LineMask::EMPTY
        }
        fn clear_pending(&mut self, lines: LineMask) {
            self.ops.push(Op::ClearPending(lines));
        }
    }

    impl OverflowTimer for Recorder {
        fn enable_clock(&mut self) {
            self.ops.push(Op::TimerClock);
        }
        fn set_prescaler(&mut self, psc: u16) {
            self.ops.push(Op::Prescaler(psc));
        }
        fn set_auto_reload(&mut self, arr: u16) {
            self.ops.push(Op::AutoReload(arr));
        }
        fn start(&mut self) {
            self.ops.push(Op::TimerStart);
        }
        fn enable_update_interrupt(&mut self) {
            self.ops.push(Op::UpdateIrq);
        }
        fn update_pending(&self) -> bool {
            false
        }
        fn clear_update_flag(&mut self) {}
    }

    impl TickTimer for Recorder {
        fn set_reload(&mut self, reload: u32) {
            self.ops.push(Op::TickReload(reload));
        }
        fn clear_current(&mut self) {
            self.ops.push(Op::TickClear);
        }
        fn enable(&mut self) {
            self.ops.push(Op::TickEnable);
        }
    }

    impl InterruptController for Recorder {
        fn enable(&mut self, vector: Vector) {
            self.ops.push(Op::Enable(vector));
        }
        fn set_priority(&mut self, vector: Vector, priority: Priority) {
            self.ops.push(Op::Priority(vector, priority.value()));
        }
    }

    fn arm(config: SystemConfig) -> (SourceSet, Vec<Op>) {
        let valid = config.validate().unwrap();
        let pins = PinMap::REFERENCE;
        let configurator = InterruptConfigurator::new(&valid, &pins);
        let mut exti = Recorder::default();
        let mut timer = Recorder::default();
        let mut tick = Recorder::default();
        let mut nvic = Recorder::default();
        let armed = configurator.arm_all(&mut exti, &mut timer, &mut tick, &mut nvic);

        let mut ops = exti.ops;
        ops.extend(timer.ops);
        ops.extend(tick.ops);
        ops.extend(nvic.ops);
        (armed, ops)
    }

    #[test]
    fn test_external_arming_order() {
        let valid = SystemConfig {
            enable_external_interrupt: true,
            ..SystemConfig::default()
        }
        .validate()
        .unwrap();
        let pins = PinMap::REFERENCE;
        let mut exti = Recorder::default();
        let mut nvic = Recorder::default();
        InterruptConfigurator::new(&valid, &pins).arm_external(&mut exti, &mut nvic);

        assert_eq!(exti.ops[0], Op::SyscfgClock);
        for line in 0..3 {
            let route = exti.ops.iter().position(|op| *op == Op::Route(line, Port::A)).unwrap();
            let unmask = exti.ops.iter().position(|op| *op == Op::Unmask(line)).unwrap();
            let trigger = exti
                .ops
                .iter()
                .position(|op| *op == Op::Trigger(line, Edge::Rising))
                .unwrap();
            assert!(route < unmask && unmask < trigger);
        }
        assert!(!exti.ops.contains(&Op::Unmask(3)));
        assert_eq!(exti.ops.last(), Some(&Op::ClearPending(LineMask(0b0111))));

        assert_eq!(
            nvic.ops,
            vec![
                Op::Priority(Vector::Exti0_1, 1),
                Op::Enable(Vector::Exti0_1),
                Op::Priority(Vector::Exti2_3, 0),
                Op::Enable(Vector::Exti2_3),
            ]
        );
    }

    #[test]
    fn test_timer_registers_hold_value_minus_one() {
        let (armed, ops) = arm(SystemConfig::default());
        assert_eq!(armed, SourceSet::single(InterruptSource::TimerOverflow));
        assert_eq!(
            ops,
            vec![
                Op::TimerClock,
                Op::Prescaler(7999),
                Op::AutoReload(9999),
                Op::UpdateIrq,
                Op::TimerStart,
                Op::Priority(Vector::Timer, 1),
                Op::Enable(Vector::Timer),
            ]
        );
    }

    #[test]
    fn test_tick_arming() {
        let (armed, ops) = arm(SystemConfig {
            enable_timer_interrupt: false,
            enable_tick_interrupt: true,
            ..SystemConfig::default()
        });
        assert_eq!(armed, SourceSet::single(InterruptSource::SysTick));
        assert_eq!(
            ops,
            vec![
                Op::TickReload(15_999_999),
                Op::TickClear,
                Op::TickEnable,
                Op::Priority(Vector::SysTick, 0),
            ]
        );
    }

    #[test]
    fn test_disabled_sources_untouched() {
        let (armed, ops) = arm(SystemConfig {
            enable_timer_interrupt: false,
            sleep_mode: crate::power::SleepMode::Standby,
            ..SystemConfig::default()
        });
        assert!(armed.is_empty());
        assert!(ops.is_empty());
    }
}
