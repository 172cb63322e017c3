//! Configuration type definitions
//!
//! These types describe which interrupt sources are armed, how the timers
//! are clocked, the priority of each source and the sleep mode entered by
//! the idle loop. They are filled in at build time and checked once by
//! [`SystemConfig::validate`].

use dormant_hal::{Priority, TICK_RELOAD_MAX};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use crate::irq::{InterruptSource, PriorityTable, SourceSet};
use crate::power::SleepMode;

/// Core clock after reset (HSI, no PLL)
pub const CORE_CLOCK_HZ: u32 = 8_000_000;

/// Largest divisor/count a 16-bit timer register can express (value - 1)
pub const TIMER_COUNT_MAX: u32 = 1 << 16;

/// Overflow timer clocking
///
/// Both fields are the real divisor and count; the registers hold value - 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimerConfig {
    /// Core clock divisor (1..=65536)
    pub prescaler: u32,
    /// Counts per overflow (2..=65536); a zero auto-reload register stops the counter
    pub reload: u32,
}

impl TimerConfig {
    /// Core cycles between two update events
    pub const fn period_cycles(&self) -> u64 {
        self.prescaler as u64 * self.reload as u64
    }

    fn registers(&self) -> Result<(u16, u16), ConfigError> {
        if self.prescaler == 0 || self.prescaler > TIMER_COUNT_MAX {
            return Err(ConfigError::TimerPrescalerOutOfRange(self.prescaler));
        }
        if self.reload < 2 || self.reload > TIMER_COUNT_MAX {
            return Err(ConfigError::TimerReloadOutOfRange(self.reload));
        }
        Ok(((self.prescaler - 1) as u16, (self.reload - 1) as u16))
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        // 8 MHz / 8000 = 1 kHz, 10000 counts = 10 s
        Self {
            prescaler: 8000,
            reload: 10_000,
        }
    }
}

/// SysTick period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TickConfig {
    /// Core cycles between ticks (2..=2^24-1)
    pub reload: u32,
}

impl TickConfig {
    fn load_value(&self) -> Result<u32, ConfigError> {
        if self.reload < 2 || self.reload > TICK_RELOAD_MAX {
            return Err(ConfigError::TickReloadOutOfRange(self.reload));
        }
        Ok(self.reload - 1)
    }
}

impl Default for TickConfig {
    fn default() -> Self {
        // Two seconds at 8 MHz
        Self { reload: 16_000_000 }
    }
}

/// Priority number per source (lower is more urgent)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Priorities {
    pub exti_group_a: u8,
    pub exti_group_b: u8,
    pub timer: u8,
    pub tick: u8,
}

impl Priorities {
    pub const fn get(&self, source: InterruptSource) -> u8 {
        match source {
            InterruptSource::ExtiGroupA => self.exti_group_a,
            InterruptSource::ExtiGroupB => self.exti_group_b,
            InterruptSource::TimerOverflow => self.timer,
            InterruptSource::SysTick => self.tick,
        }
    }

    fn table(&self) -> Result<PriorityTable, ConfigError> {
        let mut table = [Priority::LOWEST; InterruptSource::COUNT];
        for source in InterruptSource::ALL {
            let value = self.get(source);
            table[source.index()] = Priority::new(value)
                .ok_or(ConfigError::PriorityOutOfRange { source, value })?;
        }
        Ok(PriorityTable::new(table))
    }
}

impl Default for Priorities {
    fn default() -> Self {
        Self {
            exti_group_a: 1,
            exti_group_b: 0,
            timer: 1,
            tick: 0,
        }
    }
}

/// Busy-wait lengths used inside the handlers, in core cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HandlerTiming {
    /// Debounce settle after the effect (~50 us)
    pub settle_cycles: u32,
    /// Lockout after release (~3 s)
    pub lockout_cycles: u32,
    /// Width of one timer-driven LED pulse
    pub pulse_cycles: u32,
}

impl Default for HandlerTiming {
    fn default() -> Self {
        Self {
            settle_cycles: 400,
            lockout_cycles: 24_000_000,
            pulse_cycles: 120_000,
        }
    }
}

/// Complete build-time configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SystemConfig {
    pub enable_external_interrupt: bool,
    pub enable_timer_interrupt: bool,
    pub enable_tick_interrupt: bool,
    pub sleep_mode: SleepMode,
    pub timer: TimerConfig,
    pub tick: TickConfig,
    pub priorities: Priorities,
    pub timing: HandlerTiming,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            enable_external_interrupt: false,
            enable_timer_interrupt: true,
            enable_tick_interrupt: false,
            sleep_mode: SleepMode::Sleep,
            timer: TimerConfig::default(),
            tick: TickConfig::default(),
            priorities: Priorities::default(),
            timing: HandlerTiming::default(),
        }
    }
}

impl SystemConfig {
    /// Sources this configuration arms
    pub fn armed_sources(&self) -> SourceSet {
        let mut set = SourceSet::EMPTY;
        if self.enable_external_interrupt {
            set.insert(InterruptSource::ExtiGroupA);
            set.insert(InterruptSource::ExtiGroupB);
        }
        if self.enable_timer_interrupt {
            set.insert(InterruptSource::TimerOverflow);
        }
        if self.enable_tick_interrupt {
            set.insert(InterruptSource::SysTick);
        }
        set
    }

    /// Check every rule and precompute register values
    pub fn validate(&self) -> Result<ValidConfig, ConfigError> {
        let (timer_psc, timer_arr) = self.timer.registers()?;
        let tick_load = self.tick.load_value()?;
        let priorities = self.priorities.table()?;

        if self.enable_external_interrupt {
            let group_a = priorities.get(InterruptSource::ExtiGroupA);
            let group_b = priorities.get(InterruptSource::ExtiGroupB);
            if !group_b.preempts(group_a) {
                return Err(ConfigError::PriorityInversion {
                    group_a: group_a.value(),
                    group_b: group_b.value(),
                });
            }
        }

        let armed = self.armed_sources();
        if !self.sleep_mode.has_wake_source(armed) {
            return Err(ConfigError::NoWakeSource(self.sleep_mode));
        }

        Ok(ValidConfig {
            config: *self,
            priorities,
            timer_psc,
            timer_arr,
            tick_load,
            armed,
        })
    }
}

/// A configuration that passed [`SystemConfig::validate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ValidConfig {
    config: SystemConfig,
    priorities: PriorityTable,
    timer_psc: u16,
    timer_arr: u16,
    tick_load: u32,
    armed: SourceSet,
}

impl ValidConfig {
    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn priorities(&self) -> &PriorityTable {
        &self.priorities
    }

    pub fn priority(&self, source: InterruptSource) -> Priority {
        self.priorities.get(source)
    }

    /// Prescaler and auto-reload register values
    pub fn timer_registers(&self) -> (u16, u16) {
        (self.timer_psc, self.timer_arr)
    }

    /// SysTick LOAD register value
    pub fn tick_load(&self) -> u32 {
        self.tick_load
    }

    pub fn armed(&self) -> SourceSet {
        self.armed
    }

    pub fn sleep_mode(&self) -> SleepMode {
        self.config.sleep_mode
    }

    pub fn timing(&self) -> &HandlerTiming {
        &self.config.timing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn all_sources() -> SystemConfig {
        SystemConfig {
            enable_external_interrupt: true,
            enable_timer_interrupt: true,
            enable_tick_interrupt: true,
            ..SystemConfig::default()
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        let valid = SystemConfig::default().validate().unwrap();
        assert_eq!(valid.timer_registers(), (7999, 9999));
        assert_eq!(valid.tick_load(), 15_999_999);
        assert_eq!(valid.armed(), SourceSet::single(InterruptSource::TimerOverflow));
        assert_eq!(valid.sleep_mode(), SleepMode::Sleep);
    }

    #[test]
    fn test_timer_period() {
        assert_eq!(TimerConfig::default().period_cycles(), 80_000_000);
        assert_eq!(
            TimerConfig::default().period_cycles(),
            10 * CORE_CLOCK_HZ as u64
        );
    }

    #[test]
    fn test_timer_range() {
        let mut cfg = SystemConfig::default();
        cfg.timer.prescaler = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::TimerPrescalerOutOfRange(0)));

        cfg.timer.prescaler = TIMER_COUNT_MAX;
        cfg.timer.reload = TIMER_COUNT_MAX + 1;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::TimerReloadOutOfRange(TIMER_COUNT_MAX + 1))
        );

        cfg.timer.reload = 2;
        assert_eq!(cfg.validate().unwrap().timer_registers(), (0xFFFF, 1));
    }

    #[test]
    fn test_timer_reload_of_one_rejected() {
        // ARR = 0 blocks the counter, so the timer would never wake the core
        let mut cfg = SystemConfig::default();
        cfg.timer.reload = 1;
        assert_eq!(cfg.validate(), Err(ConfigError::TimerReloadOutOfRange(1)));
        cfg.timer.reload = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::TimerReloadOutOfRange(0)));
    }

    #[test]
    fn test_priority_out_of_range() {
        let mut cfg = SystemConfig::default();
        cfg.priorities.timer = 4;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::PriorityOutOfRange {
                source: InterruptSource::TimerOverflow,
                value: 4
            })
        );
    }

    #[test]
    fn test_priority_inversion_only_when_external_armed() {
        let mut cfg = SystemConfig::default();
        cfg.priorities.exti_group_a = 1;
        cfg.priorities.exti_group_b = 1;
        assert!(cfg.validate().is_ok());

        cfg.enable_external_interrupt = true;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::PriorityInversion { group_a: 1, group_b: 1 })
        );
    }

    #[test]
    fn test_stop_needs_external_source() {
        let mut cfg = SystemConfig::default();
        cfg.sleep_mode = SleepMode::Stop;
        assert_eq!(cfg.validate(), Err(ConfigError::NoWakeSource(SleepMode::Stop)));

        cfg.enable_external_interrupt = true;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_sleep_needs_some_source() {
        let cfg = SystemConfig {
            enable_timer_interrupt: false,
            ..SystemConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::NoWakeSource(SleepMode::Sleep)));
    }

    #[test]
    fn test_standby_always_wakeable() {
        let cfg = SystemConfig {
            enable_timer_interrupt: false,
            sleep_mode: SleepMode::Standby,
            ..SystemConfig::default()
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_all_sources_armed() {
        let valid = all_sources().validate().unwrap();
        assert_eq!(valid.armed().len(), InterruptSource::COUNT);
        assert_eq!(valid.priority(InterruptSource::ExtiGroupB).value(), 0);
    }

    proptest! {
        #[test]
        fn prop_tick_reload_never_wraps(reload in any::<u32>()) {
            let mut cfg = all_sources();
            cfg.tick.reload = reload;
            match cfg.validate() {
                Ok(valid) => {
                    prop_assert!((2..=TICK_RELOAD_MAX).contains(&reload));
                    prop_assert_eq!(valid.tick_load() + 1, reload);
                }
                Err(err) => {
                    prop_assert!(reload < 2 || reload > TICK_RELOAD_MAX);
                    prop_assert_eq!(err, ConfigError::TickReloadOutOfRange(reload));
                }
            }
        }

        #[test]
        fn prop_valid_priorities_keep_group_b_ahead(a in 0u8..6, b in 0u8..6) {
            let mut cfg = all_sources();
            cfg.priorities.exti_group_a = a;
            cfg.priorities.exti_group_b = b;
            if let Ok(valid) = cfg.validate() {
                prop_assert!(valid
                    .priority(InterruptSource::ExtiGroupB)
                    .preempts(valid.priority(InterruptSource::ExtiGroupA)));
            }
        }
    }
}
