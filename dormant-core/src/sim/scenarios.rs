//! End-to-end runs of the startup sequence, handlers and idle loop

use dormant_hal::{Level, LineMask, PinId, PinMask, PinMode, Port, Pull, TICK_RELOAD_MAX};

use super::*;
use crate::config::{ConfigError, HandlerTiming, PinMap, SystemConfig, TimerConfig};
use crate::handlers::{HandlerOutcome, RELEASE_POLL_CYCLES};
use crate::irq::InterruptSource::{self, *};
use crate::power::{ResetCause, SleepMode, WakeSource};

const PA0: PinId = PinId { port: Port::A, line: 0 };
const PA1: PinId = PinId { port: Port::A, line: 1 };
const PA2: PinId = PinId { port: Port::A, line: 2 };

const SETTLE: u64 = 400;
const LOCKOUT: u64 = 24_000_000;

fn external() -> SystemConfig {
    SystemConfig {
        enable_external_interrupt: true,
        enable_timer_interrupt: false,
        ..SystemConfig::default()
    }
}

fn short_timing() -> HandlerTiming {
    HandlerTiming {
        settle_cycles: 400,
        lockout_cycles: 1_000,
        pulse_cycles: 100,
    }
}

fn fast_timer(prescaler: u32, reload: u32) -> SystemConfig {
    SystemConfig {
        timer: TimerConfig { prescaler, reload },
        timing: short_timing(),
        ..SystemConfig::default()
    }
}

fn board(config: &SystemConfig) -> Simulator {
    Simulator::new(config, PinMap::REFERENCE).unwrap()
}

fn bank(s: &Simulator) -> PinMask {
    s.sim()
        .regs()
        .output_levels(Port::A)
        .intersection(s.pins().led_bank())
}

fn events_at(s: &Simulator, pred: impl Fn(&SimEvent) -> bool) -> Vec<u64> {
    s.sim()
        .trace()
        .into_iter()
        .filter(|t| pred(&t.event))
        .map(|t| t.at)
        .collect()
}

#[test]
fn test_boot_configures_board() {
    let s = board(&external());
    let regs = s.sim().regs();

    assert!(regs.port_clocks[Port::A.index() as usize]);
    for line in 0..3 {
        assert_eq!(regs.modes[0][line], Some(PinMode::Input(Pull::Up)));
    }
    for line in 3..6 {
        assert_eq!(regs.modes[0][line], Some(PinMode::Output));
    }
    assert_eq!(regs.imr, 0b0111);
    assert_eq!(regs.rtsr, 0b0111);
    assert_eq!(regs.ftsr, 0);
    assert!(regs.nvic_enabled.contains(ExtiGroupA));
    assert!(regs.nvic_enabled.contains(ExtiGroupB));
    assert!(!regs.nvic_enabled.contains(TimerOverflow));
    drop(regs);

    assert_eq!(s.sim().priority(ExtiGroupA).value(), 1);
    assert_eq!(s.sim().priority(ExtiGroupB).value(), 0);
    assert_eq!(s.boots()[0].reset_cause, ResetCause::PowerOn);
}

#[test]
fn test_line_a_press_sets_bank_then_acknowledges() {
    let mut s = board(&external());
    // Pull-up button: press is falling, release is the rising trigger
    s.press(PA0, 1_000, 5_000);

    assert_eq!(s.run_until(6_000 + 30_000_000), RunStop::Deadline);

    let runs = s.sim().dispatches_of(ExtiGroupA);
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].entered, 6_000);
    assert_eq!(
        runs[0].outcome,
        HandlerOutcome::Serviced {
            source: ExtiGroupA,
            lines: LineMask(0b0001)
        }
    );

    let led_writes = events_at(&s, |e| matches!(e, SimEvent::Output { .. }));
    assert_eq!(led_writes, vec![6_000]);
    let acks = events_at(&s, |e| *e == SimEvent::ExtiAck(LineMask(0b0001)));
    assert_eq!(acks, vec![6_000 + SETTLE + LOCKOUT]);
    assert_eq!(runs[0].returned, acks[0]);

    assert_eq!(bank(&s), s.pins().led_bank());
    assert_eq!(s.sim().regs().pr, 0);
    // Back in the idle loop after the handler
    assert!(s.idle().wakes() >= 2);
}

#[test]
fn test_timer_fires_every_prescaler_times_reload() {
    for (prescaler, reload) in [(8, 1_000), (1, 5_000), (80, 100)] {
        let mut s = board(&fast_timer(prescaler, reload));
        let period = u64::from(prescaler) * u64::from(reload);

        s.run_until(period * 5);

        let runs = s.sim().dispatches_of(TimerOverflow);
        let entered: Vec<u64> = runs.iter().map(|d| d.entered).collect();
        assert_eq!(entered, (1..=5).map(|k| k * period).collect::<Vec<_>>());
        assert!(runs.iter().all(|d| d.outcome == HandlerOutcome::TimerPulsed));

        // Double pulse on the middle LED: on, off, lockout, on, off
        let first = runs[0].entered;
        let writes: Vec<(u64, PinMask)> = s
            .sim()
            .trace()
            .into_iter()
            .filter_map(|t| match t.event {
                SimEvent::Output { levels, .. } if t.at < first + period => Some((t.at, levels)),
                _ => None,
            })
            .collect();
        let led = PinMask::line(4);
        assert_eq!(
            writes,
            vec![
                (first, led),
                (first + 100, PinMask::EMPTY),
                (first + 1_100, led),
                (first + 1_200, PinMask::EMPTY),
            ]
        );
        assert!(!s.sim().regs().uif);
    }
}

#[test]
fn test_tick_fires_every_reload_cycles() {
    let mut config = SystemConfig {
        enable_timer_interrupt: false,
        enable_tick_interrupt: true,
        ..SystemConfig::default()
    };
    config.tick.reload = 5_000;
    let mut s = board(&config);

    s.run_until(20_000);
    let entered: Vec<u64> = s
        .sim()
        .dispatches_of(SysTick)
        .iter()
        .map(|d| d.entered)
        .collect();
    assert_eq!(entered, vec![5_000, 10_000, 15_000, 20_000]);
    assert!(!s.sim().regs().output_levels(Port::A).contains(5));

    s.run_until(25_000);
    assert!(s.sim().regs().output_levels(Port::A).contains(5));
}

#[test]
fn test_tick_reload_limit() {
    let mut config = SystemConfig {
        enable_tick_interrupt: true,
        ..SystemConfig::default()
    };

    config.tick.reload = TICK_RELOAD_MAX + 1;
    assert_eq!(
        Simulator::new(&config, PinMap::REFERENCE).err(),
        Some(ConfigError::TickReloadOutOfRange(TICK_RELOAD_MAX + 1))
    );

    config.tick.reload = TICK_RELOAD_MAX;
    let s = board(&config);
    assert_eq!(s.sim().regs().tick_load, TICK_RELOAD_MAX - 1);
}

#[test]
fn test_shared_vector_services_both_lines() {
    let mut s = board(&external());
    // Drop the stale-pending clear from startup
    s.sim().clear_trace();
    s.press(PA0, 100, 100);
    s.press(PA1, 100, 100);

    s.run_until(60_000_000);

    let runs = s.sim().dispatches_of(ExtiGroupA);
    assert_eq!(runs.len(), 1);
    assert_eq!(
        runs[0].outcome,
        HandlerOutcome::Serviced {
            source: ExtiGroupA,
            lines: LineMask(0b0011)
        }
    );

    let acks: Vec<SimEvent> = s
        .sim()
        .trace()
        .into_iter()
        .map(|t| t.event)
        .filter(|e| matches!(e, SimEvent::ExtiAck(_)))
        .collect();
    assert_eq!(
        acks,
        vec![
            SimEvent::ExtiAck(LineMask(0b0001)),
            SimEvent::ExtiAck(LineMask(0b0010))
        ]
    );
    // On, then off
    assert!(bank(&s).is_empty());
    assert_eq!(s.sim().regs().pr, 0);
}

#[test]
fn test_spurious_entry_leaves_state_alone() {
    let s = board(&SystemConfig {
        enable_external_interrupt: true,
        ..SystemConfig::default()
    });
    s.sim().clear_trace();
    s.sim().with_regs(|r| r.odr[0] = 0b1_0000);
    let before = s.sim().regs().clone();

    s.sim().pend(ExtiGroupA);
    s.sim().pend(TimerOverflow);

    let runs = s.sim().dispatches();
    assert_eq!(
        runs.iter().map(|d| d.outcome).collect::<Vec<_>>(),
        vec![
            HandlerOutcome::Spurious(ExtiGroupA),
            HandlerOutcome::Spurious(TimerOverflow)
        ]
    );

    let after = s.sim().regs();
    assert_eq!(after.odr, before.odr);
    assert_eq!(after.pr, before.pr);
    assert_eq!(after.uif, before.uif);
    assert!(s
        .sim()
        .trace()
        .iter()
        .all(|t| !matches!(t.event, SimEvent::ExtiAck(_) | SimEvent::TimerAck)));
}

#[test]
fn test_group_b_preempts_group_a_lockout() {
    let mut s = board(&external());
    s.press(PA0, 500, 500);
    s.press(PA2, 1_000_000, 1_000);

    s.run_until(50_000_000);

    let a = s.sim().dispatches_of(ExtiGroupA)[0];
    let b = s.sim().dispatches_of(ExtiGroupB)[0];
    assert_eq!(a.entered, 1_000);
    assert_eq!(b.entered, 1_001_000);
    assert_eq!(b.preempted, Some(ExtiGroupA));
    assert!(b.returned < a.returned);
    // A's own lockout still runs in full around B
    assert_eq!(
        a.returned,
        1_000 + SETTLE + LOCKOUT + (b.returned - b.entered)
    );
}

#[test]
fn test_group_a_waits_for_group_b() {
    let mut s = board(&external());
    s.press(PA2, 500, 500);
    s.press(PA0, 1_000_000, 1_000);

    s.run_until(50_000_000);

    let a = s.sim().dispatches_of(ExtiGroupA)[0];
    let b = s.sim().dispatches_of(ExtiGroupB)[0];
    assert_eq!(b.entered, 1_000);
    assert_eq!(a.entered, b.returned);
    assert_eq!(a.preempted, None);
    assert_eq!(b.preempted, None);
}

#[test]
fn test_power_bits_match_mode_table() {
    for mode in SleepMode::ALL {
        let config = SystemConfig {
            enable_external_interrupt: mode == SleepMode::Stop,
            sleep_mode: mode,
            ..SystemConfig::default()
        };
        let s = board(&config);
        let expected = mode.power_bits();
        let regs = s.sim().regs();

        assert_eq!(regs.sleep_deep, expected.sleep_deep, "{:?}", mode);
        assert_eq!(regs.lpds, expected.low_power_regulator, "{:?}", mode);
        assert_eq!(regs.pdds, expected.power_down_deep_sleep, "{:?}", mode);
        assert_eq!(regs.ewup1, expected.wakeup_pin, "{:?}", mode);
        assert_eq!(regs.power_mode(), mode);
        assert_eq!(s.boots()[0].power_bits, expected);
    }
}

#[test]
fn test_release_bounce_is_one_event() {
    let mut s = board(&external());
    let sim = s.sim();
    sim.schedule_input(100, PA2, Level::Low);
    for (at, level) in [
        (1_000, Level::High),
        (1_100, Level::Low),
        (1_200, Level::High),
        (1_300, Level::Low),
        (1_400, Level::High),
    ] {
        sim.schedule_input(at, PA2, level);
    }

    s.run_until(60_000_000);

    let runs = s.sim().dispatches_of(ExtiGroupB);
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].entered, 1_000);
    // A single toggle: bank on
    assert_eq!(bank(&s), s.pins().led_bank());
    assert_eq!(s.sim().regs().pr, 0);
}

#[test]
fn test_pull_down_release_wait() {
    let pins = PinMap {
        button_pull: Pull::Down,
        ..PinMap::REFERENCE
    };
    let mut s = Simulator::new(&external(), pins).unwrap();
    s.sim().clear_trace();
    // Pull-down button: press is the rising trigger
    s.press(PA0, 100, 50_000);

    s.run_until(30_000_000);

    let runs = s.sim().dispatches_of(ExtiGroupA);
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].entered, 100);

    let released = 50_100;
    let ack = events_at(&s, |e| matches!(e, SimEvent::ExtiAck(_)))[0];
    assert!(ack >= released + LOCKOUT);
    assert!(ack < released + LOCKOUT + u64::from(RELEASE_POLL_CYCLES));
}

#[test]
fn test_stop_mode_ignores_timer() {
    let config = SystemConfig {
        enable_external_interrupt: true,
        sleep_mode: SleepMode::Stop,
        ..fast_timer(8, 1_000)
    };
    let mut s = board(&config);

    s.run_until(100_000);
    assert!(s.sim().dispatches().is_empty());

    s.press(PA0, 100_000, 1_000);
    s.run_until(120_000);
    assert_eq!(s.sim().dispatches_of(ExtiGroupA).len(), 1);
    assert!(s.sim().dispatches_of(TimerOverflow).is_empty());
}

#[test]
fn test_sleep_mode_wakes_on_timer() {
    let mut s = board(&fast_timer(8, 1_000));
    s.run_until(100_000);
    assert_eq!(s.sim().dispatches_of(TimerOverflow).len(), 12);
}

#[test]
fn test_standby_wake_is_a_reset() {
    let config = SystemConfig {
        enable_timer_interrupt: false,
        sleep_mode: SleepMode::Standby,
        ..SystemConfig::default()
    };
    let mut s = board(&config);

    s.run_until(10_000);
    assert_eq!(s.boots().len(), 1);
    assert!(events_at(&s, |e| *e == SimEvent::Suspend(SleepMode::Standby)).contains(&0));

    // Rising edge on WKUP1
    s.sim().schedule_input(15_000, PA0, Level::Low);
    s.sim().schedule_input(20_000, PA0, Level::High);
    s.run_until(30_000);

    assert_eq!(events_at(&s, |e| *e == SimEvent::StandbyReset), vec![20_000]);
    let causes: Vec<ResetCause> = s.boots().iter().map(|b| b.reset_cause).collect();
    assert_eq!(causes, vec![ResetCause::PowerOn, ResetCause::StandbyWake]);
    // The second boot clears the flag and the idle loop sets it again
    assert!(events_at(&s, |e| *e == SimEvent::Suspend(SleepMode::Standby)).contains(&20_000));
    assert!(s.sim().regs().sbf);
    assert!(s.sim().regs().ewup1);
}

#[test]
fn test_reset_pin_reboots_every_mode() {
    for mode in SleepMode::ALL {
        assert!(mode.can_wake_from(WakeSource::ResetPin));
        let config = SystemConfig {
            enable_external_interrupt: mode == SleepMode::Stop,
            sleep_mode: mode,
            ..SystemConfig::default()
        };
        let mut s = board(&config);

        s.run_until(10_000);
        assert_eq!(s.boots().len(), 1, "{:?}", mode);
        s.sim().assert_reset();
        s.run_until(20_000);

        assert_eq!(s.boots().len(), 2, "{:?}", mode);
        assert_eq!(events_at(&s, |e| *e == SimEvent::PinReset), vec![10_000]);
        // Only Standby leaves the standby flag behind
        let expected = if mode == SleepMode::Standby {
            ResetCause::StandbyWake
        } else {
            ResetCause::PowerOn
        };
        assert_eq!(s.boots()[1].reset_cause, expected, "{:?}", mode);
        assert_eq!(s.sim().regs().power_mode(), mode);
    }
}

#[test]
fn test_wake_flag_cleared_before_every_suspend() {
    let mut s = board(&fast_timer(8, 1_000));
    s.run_until(80_000);

    let mut cleared = false;
    let mut suspends = 0;
    for trace in s.sim().trace() {
        match trace.event {
            SimEvent::WakeFlagCleared => cleared = true,
            SimEvent::Suspend(_) => {
                assert!(cleared, "suspend at {} without clearing", trace.at);
                cleared = false;
                suspends += 1;
            }
            _ => {}
        }
    }
    assert!(suspends > 1);
    assert_eq!(suspends, s.idle().wakes());
}

#[test]
fn test_stale_wake_flag_ends_standby() {
    let config = SystemConfig {
        enable_timer_interrupt: false,
        sleep_mode: SleepMode::Standby,
        ..SystemConfig::default()
    };

    // Suspending without the idle loop's housekeeping resets at once
    let s = board(&config);
    s.sim().with_regs(|r| r.wuf = true);
    s.sim().set_deadline(10_000);
    s.sim().suspend();
    assert!(s.sim().take_reset());
    assert_eq!(events_at(&s, |e| *e == SimEvent::StandbyReset), vec![0]);

    // The idle loop clears it first and stays asleep
    let mut s = board(&config);
    s.sim().with_regs(|r| r.wuf = true);
    s.run_until(10_000);
    assert_eq!(s.boots().len(), 1);
    assert!(events_at(&s, |e| *e == SimEvent::StandbyReset).is_empty());
}

#[test]
fn test_idle_clears_stale_timer_flag() {
    let mut config = SystemConfig {
        enable_timer_interrupt: false,
        enable_tick_interrupt: true,
        ..SystemConfig::default()
    };
    config.tick.reload = 5_000;
    let mut s = board(&config);
    s.sim().with_regs(|r| r.uif = true);

    s.run_until(1);

    assert!(!s.sim().regs().uif);
    let trace = s.sim().trace();
    let ack = trace.iter().position(|t| t.event == SimEvent::TimerAck);
    let suspend = trace
        .iter()
        .position(|t| matches!(t.event, SimEvent::Suspend(_)));
    assert!(ack.unwrap() < suspend.unwrap());
}

#[test]
fn test_missing_acknowledge_storms() {
    let mut s = board(&fast_timer(8, 1_000));
    s.sim()
        .attach(TimerOverflow, Box::new(|| HandlerOutcome::TimerPulsed));

    assert_eq!(s.run_until(100_000), RunStop::Storm(TimerOverflow));
    assert_eq!(
        s.sim().dispatches_of(TimerOverflow).len(),
        MAX_DISPATCHES_PER_PASS
    );
    assert!(s.sim().regs().uif);
}

#[test]
fn test_tick_preempts_timer_pulse() {
    let mut config = SystemConfig {
        enable_tick_interrupt: true,
        timing: HandlerTiming {
            lockout_cycles: 10_000,
            ..short_timing()
        },
        ..fast_timer(8, 1_000)
    };
    config.tick.reload = 13_000;
    let mut s = board(&config);

    s.run_until(20_000);

    // The first timer run locks out from 8 100 to 18 100
    let tick = s.sim().dispatches_of(SysTick)[0];
    assert_eq!(tick.entered, 13_000);
    assert_eq!(tick.preempted, Some(InterruptSource::TimerOverflow));
}
