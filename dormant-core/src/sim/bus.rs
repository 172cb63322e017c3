//! Simulated register file, cycle clock and interrupt dispatcher

use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

use dormant_hal::{Level, LineMask, PinId, PinMask, PinMode, Port, Priority};

use crate::handlers::HandlerOutcome;
use crate::irq::{DispatchModel, InterruptSource, PriorityTable, SourceSet};
use crate::power::{SleepMode, WakeSource};

/// Handler installed on a simulated vector
pub type HandlerFn = Box<dyn FnMut() -> HandlerOutcome>;

/// Handler entries allowed in one dispatch pass before the source is
/// declared to be storming (pending flag never acknowledged)
pub const MAX_DISPATCHES_PER_PASS: usize = 64;

const PORTS: usize = Port::ALL.len();

/// Things the simulator records, in time order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEvent {
    /// Output data register of `port` after a write
    Output { port: Port, levels: PinMask },
    /// EXTI pending bits written with 1
    ExtiAck(LineMask),
    /// Timer update flag cleared
    TimerAck,
    WakeFlagCleared,
    Enter {
        source: InterruptSource,
        preempted: Option<InterruptSource>,
    },
    Exit {
        source: InterruptSource,
        outcome: HandlerOutcome,
    },
    Suspend(SleepMode),
    Resume,
    StandbyReset,
    /// NRST pulled low
    PinReset,
    Storm(InterruptSource),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trace {
    pub at: u64,
    pub event: SimEvent,
}

/// One completed handler invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatch {
    pub source: InterruptSource,
    pub entered: u64,
    pub returned: u64,
    pub preempted: Option<InterruptSource>,
    pub outcome: HandlerOutcome,
}

/// Register backing store
#[derive(Debug, Clone)]
pub struct Registers {
    /// Core cycles since power-on
    pub now: u64,

    pub port_clocks: [bool; PORTS],
    pub syscfg_clock: bool,
    pub timer_clock: bool,
    pub pwr_clock: bool,

    pub modes: [[Option<PinMode>; 16]; PORTS],
    pub odr: [u16; PORTS],
    /// Levels driven onto pins from outside the chip
    pub external: [[Option<Level>; 16]; PORTS],

    pub exti_routes: [Port; 16],
    pub imr: u32,
    pub rtsr: u32,
    pub ftsr: u32,
    pub pr: u32,

    pub psc: u16,
    pub arr: u16,
    pub timer_running: bool,
    pub uie: bool,
    pub uif: bool,
    pub timer_next: Option<u64>,

    pub tick_load: u32,
    pub tick_enabled: bool,
    pub tick_next: Option<u64>,
    pub tick_pending: bool,

    pub sleep_deep: bool,
    pub lpds: bool,
    pub pdds: bool,
    pub ewup1: bool,
    pub wuf: bool,
    pub sbf: bool,

    pub nvic_enabled: SourceSet,
    /// Vectors pended by software
    pub soft_pending: SourceSet,
}

impl Registers {
    /// Reset values
    pub fn power_on() -> Self {
        Self {
            now: 0,
            port_clocks: [false; PORTS],
            syscfg_clock: false,
            timer_clock: false,
            pwr_clock: false,
            modes: [[None; 16]; PORTS],
            odr: [0; PORTS],
            external: [[None; 16]; PORTS],
            exti_routes: [Port::A; 16],
            imr: 0,
            rtsr: 0,
            ftsr: 0,
            pr: 0,
            psc: 0,
            arr: 0xFFFF,
            timer_running: false,
            uie: false,
            uif: false,
            timer_next: None,
            tick_load: 0,
            tick_enabled: false,
            tick_next: None,
            tick_pending: false,
            sleep_deep: false,
            lpds: false,
            pdds: false,
            ewup1: false,
            wuf: false,
            sbf: false,
            nvic_enabled: SourceSet::EMPTY,
            soft_pending: SourceSet::EMPTY,
        }
    }

    /// Level seen by the input data register
    pub fn input_level(&self, port: Port, line: u8) -> Level {
        let p = port.index() as usize;
        let l = line as usize;
        match self.modes[p][l] {
            Some(PinMode::Output) => Level::from(self.odr[p] & (1 << l) != 0),
            Some(PinMode::Input(pull)) => self.external[p][l].unwrap_or(pull.idle_level()),
            None => self.external[p][l].unwrap_or(Level::Low),
        }
    }

    pub fn input_levels(&self, port: Port) -> PinMask {
        (0..16u8)
            .filter(|line| self.input_level(port, *line).is_high())
            .fold(PinMask::EMPTY, |mask, line| mask | PinMask::line(line))
    }

    pub fn output_levels(&self, port: Port) -> PinMask {
        PinMask(self.odr[port.index() as usize])
    }

    /// Mode the next WFI enters, from the deep-sleep and power-down bits
    pub fn power_mode(&self) -> SleepMode {
        match (self.sleep_deep, self.pdds) {
            (false, _) => SleepMode::Sleep,
            (true, false) => SleepMode::Stop,
            (true, true) => SleepMode::Standby,
        }
    }

    /// Core cycles per timer update event
    pub fn timer_period(&self) -> u64 {
        (u64::from(self.psc) + 1) * (u64::from(self.arr) + 1)
    }

    pub fn tick_period(&self) -> u64 {
        u64::from(self.tick_load) + 1
    }

    /// Sources currently requesting service
    pub fn asserted(&self) -> SourceSet {
        let mut set: SourceSet = self
            .soft_pending
            .iter()
            .filter(|s| *s == InterruptSource::SysTick || self.nvic_enabled.contains(*s))
            .collect();
        let requested = self.pr & self.imr;
        for source in [InterruptSource::ExtiGroupA, InterruptSource::ExtiGroupB] {
            if requested & source.lines().bits() != 0 && self.nvic_enabled.contains(source) {
                set.insert(source);
            }
        }
        if self.uif && self.uie && self.nvic_enabled.contains(InterruptSource::TimerOverflow) {
            set.insert(InterruptSource::TimerOverflow);
        }
        if self.tick_pending {
            set.insert(InterruptSource::SysTick);
        }
        set
    }
}

struct SimInner {
    regs: RefCell<Registers>,
    model: RefCell<DispatchModel>,
    slots: [RefCell<Option<HandlerFn>>; InterruptSource::COUNT],
    /// Scheduled external drives, ordered by time
    inputs: RefCell<Vec<(u64, PinId, Level)>>,
    trace: RefCell<Vec<Trace>>,
    deadline: Cell<u64>,
    storm: Cell<bool>,
    reset_pending: Cell<bool>,
}

/// Shared handle to one simulated chip
#[derive(Clone)]
pub struct Sim(Rc<SimInner>);

fn reset_model() -> DispatchModel {
    // Priority fields reset to 0
    DispatchModel::new(PriorityTable::new([Priority::HIGHEST; InterruptSource::COUNT]))
}

impl Sim {
    pub fn new() -> Self {
        Sim(Rc::new(SimInner {
            regs: RefCell::new(Registers::power_on()),
            model: RefCell::new(reset_model()),
            slots: Default::default(),
            inputs: RefCell::new(Vec::new()),
            trace: RefCell::new(Vec::new()),
            deadline: Cell::new(u64::MAX),
            storm: Cell::new(false),
            reset_pending: Cell::new(false),
        }))
    }

    pub fn regs(&self) -> Ref<'_, Registers> {
        self.0.regs.borrow()
    }

    pub fn with_regs<R>(&self, f: impl FnOnce(&mut Registers) -> R) -> R {
        f(&mut self.0.regs.borrow_mut())
    }

    pub fn now(&self) -> u64 {
        self.regs().now
    }

    pub fn record(&self, event: SimEvent) {
        let at = self.now();
        self.0.trace.borrow_mut().push(Trace { at, event });
    }

    pub fn trace(&self) -> Vec<Trace> {
        self.0.trace.borrow().clone()
    }

    /// Forget everything recorded so far, such as the startup writes
    pub fn clear_trace(&self) {
        self.0.trace.borrow_mut().clear();
    }

    /// Completed handler invocations in return order
    pub fn dispatches(&self) -> Vec<Dispatch> {
        let mut open: Vec<(InterruptSource, u64, Option<InterruptSource>)> = Vec::new();
        let mut done = Vec::new();
        for trace in self.0.trace.borrow().iter() {
            match trace.event {
                SimEvent::Enter { source, preempted } => open.push((source, trace.at, preempted)),
                SimEvent::Exit { source, outcome } => {
                    if let Some((_, entered, preempted)) = open.pop() {
                        done.push(Dispatch {
                            source,
                            entered,
                            returned: trace.at,
                            preempted,
                            outcome,
                        });
                    }
                }
                _ => {}
            }
        }
        done
    }

    pub fn dispatches_of(&self, source: InterruptSource) -> Vec<Dispatch> {
        self.dispatches()
            .into_iter()
            .filter(|d| d.source == source)
            .collect()
    }

    pub fn attach(&self, source: InterruptSource, handler: HandlerFn) {
        *self.0.slots[source.index()].borrow_mut() = Some(handler);
    }

    /// Drop every installed handler
    pub fn clear_handlers(&self) {
        for slot in &self.0.slots {
            slot.borrow_mut().take();
        }
    }

    pub fn set_priority(&self, source: InterruptSource, priority: Priority) {
        self.0.model.borrow_mut().set_priority(source, priority);
    }

    pub fn priority(&self, source: InterruptSource) -> Priority {
        self.0.model.borrow().priorities().get(source)
    }

    pub fn set_deadline(&self, deadline: u64) {
        self.0.deadline.set(deadline);
    }

    pub fn storm(&self) -> bool {
        self.0.storm.get()
    }

    /// Check and clear the reset request left by a Standby wake
    pub fn take_reset(&self) -> bool {
        self.0.reset_pending.replace(false)
    }

    /// Drive `pin` to `level` from outside at cycle `at`
    pub fn schedule_input(&self, at: u64, pin: PinId, level: Level) {
        let mut inputs = self.0.inputs.borrow_mut();
        let idx = inputs.partition_point(|(t, _, _)| *t <= at);
        inputs.insert(idx, (at, pin, level));
    }

    /// Pend a vector from software and service it
    pub fn pend(&self, source: InterruptSource) {
        self.with_regs(|r| r.soft_pending.insert(source));
        self.dispatch_pending();
    }

    /// Busy-wait `cycles` of the caller's own execution time
    ///
    /// More urgent handlers that become ready run inside the wait; their
    /// run time does not count against `cycles`.
    pub fn spin(&self, cycles: u32) {
        let mut remaining = u64::from(cycles);
        loop {
            self.apply_due_events();
            self.dispatch_pending();
            if remaining == 0 {
                break;
            }
            let now = self.now();
            let step = self
                .next_event_time(false)
                .map_or(remaining, |t| t.saturating_sub(now).min(remaining));
            if step == 0 {
                continue;
            }
            self.with_regs(|r| r.now += step);
            remaining -= step;
        }
    }

    /// Suspend until a source the current power mode honours fires
    pub fn suspend(&self) {
        let mode = self.regs().power_mode();
        self.record(SimEvent::Suspend(mode));
        match mode {
            SleepMode::Standby => self.standby(),
            SleepMode::Sleep | SleepMode::Stop => self.sleep(mode),
        }
    }

    fn sleep(&self, mode: SleepMode) {
        let frozen = mode == SleepMode::Stop;
        loop {
            self.apply_due_events();
            let woken = self
                .regs()
                .asserted()
                .iter()
                .any(|source| mode.can_wake_from(WakeSource::Interrupt(source)));
            if woken {
                self.record(SimEvent::Resume);
                self.dispatch_pending();
                return;
            }

            let now = self.now();
            let deadline = self.0.deadline.get();
            match self.next_event_time(frozen) {
                Some(t) if t <= deadline => self.advance_asleep(t.saturating_sub(now), frozen),
                _ => {
                    self.advance_asleep(deadline.saturating_sub(now), frozen);
                    return;
                }
            }
        }
    }

    fn standby(&self) {
        self.with_regs(|r| r.sbf = true);
        loop {
            // A set wake-up flag ends Standby as soon as it is entered
            if self.regs().wuf {
                self.standby_reset();
                return;
            }

            let deadline = self.0.deadline.get();
            match self.next_input_time() {
                Some(t) if t <= deadline => {
                    self.with_regs(|r| r.now = r.now.max(t));
                    self.apply_due_inputs();
                }
                _ => {
                    self.with_regs(|r| r.now = r.now.max(deadline));
                    return;
                }
            }
        }
    }

    /// Pull NRST low: a system reset from any power mode
    ///
    /// The PWR flags keep their values, so a reset out of Standby still
    /// reports the standby flag.
    pub fn assert_reset(&self) {
        self.system_reset(SimEvent::PinReset);
    }

    fn standby_reset(&self) {
        self.system_reset(SimEvent::StandbyReset);
    }

    /// Lose all state except the clock, the pins and the power flags
    fn system_reset(&self, cause: SimEvent) {
        self.with_regs(|r| {
            let mut fresh = Registers::power_on();
            fresh.now = r.now;
            fresh.external = r.external;
            fresh.wuf = r.wuf;
            fresh.sbf = r.sbf;
            *r = fresh;
        });
        *self.0.model.borrow_mut() = reset_model();
        self.clear_handlers();
        self.0.reset_pending.set(true);
        self.record(cause);
    }

    fn advance_asleep(&self, dt: u64, frozen: bool) {
        self.with_regs(|r| {
            r.now += dt;
            if frozen {
                r.timer_next = r.timer_next.map(|t| t + dt);
                r.tick_next = r.tick_next.map(|t| t + dt);
            }
        });
    }

    fn next_input_time(&self) -> Option<u64> {
        self.0.inputs.borrow().first().map(|(t, _, _)| *t)
    }

    fn next_event_time(&self, timers_frozen: bool) -> Option<u64> {
        let input = self.next_input_time();
        if timers_frozen {
            return input;
        }
        let regs = self.regs();
        let timer = regs.timer_next.filter(|_| regs.timer_running);
        let tick = regs.tick_next.filter(|_| regs.tick_enabled);
        [input, timer, tick].into_iter().flatten().min()
    }

    fn apply_due_inputs(&self) {
        let now = self.now();
        loop {
            let due = {
                let mut inputs = self.0.inputs.borrow_mut();
                match inputs.first() {
                    Some((t, _, _)) if *t <= now => Some(inputs.remove(0)),
                    _ => None,
                }
            };
            match due {
                Some((_, pin, level)) => self.drive(pin, level),
                None => break,
            }
        }
    }

    fn apply_due_events(&self) {
        self.apply_due_inputs();
        self.with_regs(|r| {
            let now = r.now;
            if r.timer_running {
                while let Some(t) = r.timer_next.filter(|t| *t <= now) {
                    r.uif = true;
                    r.timer_next = Some(t + r.timer_period());
                }
            }
            if r.tick_enabled {
                while let Some(t) = r.tick_next.filter(|t| *t <= now) {
                    r.tick_pending = true;
                    r.tick_next = Some(t + r.tick_period());
                }
            }
        });
    }

    fn drive(&self, pin: PinId, level: Level) {
        self.with_regs(|r| {
            let old = r.input_level(pin.port, pin.line);
            r.external[pin.port.index() as usize][pin.line as usize] = Some(level);
            let new = r.input_level(pin.port, pin.line);
            if old == new {
                return;
            }

            let bit = 1u32 << pin.line;
            if r.exti_routes[pin.line as usize] == pin.port {
                let armed = if new.is_high() { r.rtsr } else { r.ftsr };
                if armed & bit != 0 {
                    r.pr |= bit;
                }
            }
            // WKUP1 is PA0
            if pin.port == Port::A && pin.line == 0 && new.is_high() && r.ewup1 {
                r.wuf = true;
            }
        });
    }

    /// Run every ready source that may start in the current context
    pub fn dispatch_pending(&self) {
        if self.storm() {
            return;
        }
        for _ in 0..MAX_DISPATCHES_PER_PASS {
            let pending = self.regs().asserted();
            let next = self.0.model.borrow().next_ready(pending);
            let Some(source) = next else {
                return;
            };
            self.run_handler(source);
        }

        let pending = self.regs().asserted();
        let next = self.0.model.borrow().next_ready(pending);
        if let Some(source) = next {
            self.0.storm.set(true);
            self.record(SimEvent::Storm(source));
        }
    }

    fn run_handler(&self, source: InterruptSource) {
        let preempted = {
            let mut model = self.0.model.borrow_mut();
            let running = model.running();
            if !model.enter(source) {
                return;
            }
            running
        };
        self.with_regs(|r| {
            r.soft_pending.remove(source);
            if source == InterruptSource::SysTick {
                r.tick_pending = false;
            }
        });
        self.record(SimEvent::Enter { source, preempted });

        let outcome = {
            let mut slot = self.0.slots[source.index()].borrow_mut();
            match slot.as_mut() {
                Some(handler) => handler(),
                None => HandlerOutcome::Spurious(source),
            }
        };

        self.0.model.borrow_mut().exit();
        self.record(SimEvent::Exit { source, outcome });
    }
}

impl Default for Sim {
    fn default() -> Self {
        Self::new()
    }
}
