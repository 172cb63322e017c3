//! Build script for dormant-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Parses and validates firmware.toml at compile time
//! - Generates `config.rs` holding the validated configuration as constants

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use dormant_core::config::{
    parse_pin, HandlerTiming, PinMap, Priorities, SystemConfig, TickConfig, TimerConfig,
};
use dormant_core::power::SleepMode;
use dormant_hal::{PinId, Port, Pull};
use serde::Deserialize;

/// Ports bonded out on the F030F4 package
const BONDED_PORTS: [Port; 3] = [Port::A, Port::B, Port::F];

fn main() {
    setup_linker();
    let (config, pins) = load_config();
    generate_config(&config, &pins);
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = out_dir();

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

fn out_dir() -> PathBuf {
    PathBuf::from(env::var("OUT_DIR").unwrap())
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct FirmwareToml {
    #[serde(default)]
    interrupts: InterruptsSection,
    #[serde(default)]
    power: PowerSection,
    #[serde(default)]
    timer: TimerConfig,
    #[serde(default)]
    tick: TickConfig,
    #[serde(default)]
    priority: Priorities,
    #[serde(default)]
    timing: HandlerTiming,
    #[serde(default)]
    pins: PinsSection,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct InterruptsSection {
    external: bool,
    timer: bool,
    tick: bool,
}

impl Default for InterruptsSection {
    fn default() -> Self {
        let defaults = SystemConfig::default();
        Self {
            external: defaults.enable_external_interrupt,
            timer: defaults.enable_timer_interrupt,
            tick: defaults.enable_tick_interrupt,
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PowerSection {
    #[serde(default)]
    sleep_mode: SleepMode,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PinsSection {
    on_button: String,
    off_button: String,
    toggle_button: String,
    button_pull: String,
    leds: [String; 3],
}

impl Default for PinsSection {
    fn default() -> Self {
        let name = |pin: PinId| format!("P{}{}", pin.port.letter(), pin.line);
        let reference = PinMap::REFERENCE;
        Self {
            on_button: name(reference.on_button),
            off_button: name(reference.off_button),
            toggle_button: name(reference.toggle_button),
            button_pull: "up".into(),
            leds: reference.leds.map(name),
        }
    }
}

/// Read, parse and validate firmware.toml
fn load_config() -> (SystemConfig, PinMap) {
    // Re-run if firmware.toml changes
    println!("cargo:rerun-if-changed=firmware.toml");

    let config_path = Path::new("firmware.toml");

    if !config_path.exists() {
        fail(
            "firmware.toml not found!",
            &[
                "The firmware requires a firmware.toml configuration file."
                    .to_string(),
                "Please create one in the dormant-firmware directory.".to_string(),
            ],
        );
    }

    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => fail("Failed to read firmware.toml", &[e.to_string()]),
    };

    let parsed: FirmwareToml = match toml::from_str(&content) {
        Ok(parsed) => parsed,
        Err(e) => fail(
            "Invalid firmware.toml",
            &e.to_string().lines().map(str::to_string).collect::<Vec<_>>(),
        ),
    };

    let config = SystemConfig {
        enable_external_interrupt: parsed.interrupts.external,
        enable_timer_interrupt: parsed.interrupts.timer,
        enable_tick_interrupt: parsed.interrupts.tick,
        sleep_mode: parsed.power.sleep_mode,
        timer: parsed.timer,
        tick: parsed.tick,
        priorities: parsed.priority,
        timing: parsed.timing,
    };
    let pins = parse_pins(&parsed.pins);

    let mut errors = Vec::new();
    if let Err(e) = config.validate() {
        errors.push(e.to_string());
    }
    if let Err(e) = pins.validate() {
        errors.push(e.to_string());
    }
    if !errors.is_empty() {
        fail("Invalid configuration in firmware.toml", &errors);
    }

    println!("cargo:warning=firmware.toml validated successfully");
    (config, pins)
}

/// Parse the `[pins]` section, collecting every bad entry before failing
fn parse_pins(section: &PinsSection) -> PinMap {
    let mut errors = Vec::new();

    let mut pin = |field: &str, name: &str| -> PinId {
        match parse_pin(name) {
            Ok(pin) if BONDED_PORTS.contains(&pin.port) => pin,
            Ok(pin) => {
                errors.push(format!(
                    "[pins] {} = \"{}\": port {} is not on this package",
                    field,
                    name,
                    pin.port.letter()
                ));
                PinMap::REFERENCE.on_button
            }
            Err(e) => {
                errors.push(format!("[pins] {} = \"{}\": {}", field, name, e));
                PinMap::REFERENCE.on_button
            }
        }
    };

    let on_button = pin("on_button", &section.on_button);
    let off_button = pin("off_button", &section.off_button);
    let toggle_button = pin("toggle_button", &section.toggle_button);
    let leds = [
        pin("leds[0]", &section.leds[0]),
        pin("leds[1]", &section.leds[1]),
        pin("leds[2]", &section.leds[2]),
    ];

    let button_pull = match section.button_pull.as_str() {
        "up" => Pull::Up,
        "down" => Pull::Down,
        "none" => Pull::None,
        other => {
            errors.push(format!(
                "[pins] button_pull = \"{}\": expected up, down or none",
                other
            ));
            Pull::Up
        }
    };

    if !errors.is_empty() {
        fail("Invalid [pins] section in firmware.toml", &errors);
    }

    PinMap {
        on_button,
        off_button,
        toggle_button,
        button_pull,
        leds,
    }
}

/// Write `config.rs` for the firmware to `include!`
fn generate_config(config: &SystemConfig, pins: &PinMap) {
    let pin = |p: PinId| format!("PinId {{ port: Port::{:?}, line: {} }}", p.port, p.line);

    let code = format!(
        "// Generated by build.rs from firmware.toml\n\
         \n\
         use dormant_core::config::{{\n    \
             HandlerTiming, PinMap, Priorities, SystemConfig, TickConfig, TimerConfig,\n\
         }};\n\
         use dormant_core::power::SleepMode;\n\
         use dormant_hal::{{PinId, Port, Pull}};\n\
         \n\
         pub const SYSTEM: SystemConfig = SystemConfig {{\n    \
             enable_external_interrupt: {external},\n    \
             enable_timer_interrupt: {timer},\n    \
             enable_tick_interrupt: {tick},\n    \
             sleep_mode: SleepMode::{mode:?},\n    \
             timer: TimerConfig {{ prescaler: {psc}, reload: {arr} }},\n    \
             tick: TickConfig {{ reload: {tick_reload} }},\n    \
             priorities: Priorities {{\n        \
                 exti_group_a: {pa},\n        \
                 exti_group_b: {pb},\n        \
                 timer: {pt},\n        \
                 tick: {pk},\n    \
             }},\n    \
             timing: HandlerTiming {{\n        \
                 settle_cycles: {settle},\n        \
                 lockout_cycles: {lockout},\n        \
                 pulse_cycles: {pulse},\n    \
             }},\n\
         }};\n\
         \n\
         pub const PINS: PinMap = PinMap {{\n    \
             on_button: {on},\n    \
             off_button: {off},\n    \
             toggle_button: {toggle},\n    \
             button_pull: Pull::{pull:?},\n    \
             leds: [{led0}, {led1}, {led2}],\n\
         }};\n",
        external = config.enable_external_interrupt,
        timer = config.enable_timer_interrupt,
        tick = config.enable_tick_interrupt,
        mode = config.sleep_mode,
        psc = config.timer.prescaler,
        arr = config.timer.reload,
        tick_reload = config.tick.reload,
        pa = config.priorities.exti_group_a,
        pb = config.priorities.exti_group_b,
        pt = config.priorities.timer,
        pk = config.priorities.tick,
        settle = config.timing.settle_cycles,
        lockout = config.timing.lockout_cycles,
        pulse = config.timing.pulse_cycles,
        on = pin(pins.on_button),
        off = pin(pins.off_button),
        toggle = pin(pins.toggle_button),
        pull = pins.button_pull,
        led0 = pin(pins.leds[0]),
        led1 = pin(pins.leds[1]),
        led2 = pin(pins.leds[2]),
    );

    fs::write(out_dir().join("config.rs"), code).unwrap();
}

/// Abort the build with a boxed error message
fn fail(title: &str, lines: &[String]) -> ! {
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        format_error_lines(lines)
    );
}

/// Format error message lines with box drawing
fn format_error_lines(lines: &[String]) -> String {
    lines
        .iter()
        .map(|line| {
            let truncated = if line.chars().count() > 62 {
                format!("{}...", line.chars().take(59).collect::<String>())
            } else {
                line.clone()
            };
            format!("║  • {:<62} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
