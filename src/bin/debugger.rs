use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use cathode8_core::nes::{Bus, CPU_CLOCK_DIVIDER, cartridge::Cartridge};

/// Program traced when no ROM is given.
const DEMO_PROGRAM: &[u8] = &[
    0xA9, 0xF0, // LDA #$F0
    0xAA, // TAX
    0x85, 0x00, // STA $00
    0x69, 0x11, // ADC #$11
    0xE9, 0x02, // SBC #$02
    0x00, // BRK
];

#[derive(Debug, Clone)]
struct Config {
    rom: Option<PathBuf>,
    cycles: u64,
    json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rom: None,
            cycles: 64,
            json: false,
        }
    }
}

fn parse_args() -> Result<Config> {
    let mut cfg = Config::default();
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--rom" => {
                let value = args
                    .next()
                    .context("--rom requires a path, e.g. --rom nestest.nes")?;
                cfg.rom = Some(PathBuf::from(value));
            }
            "--cycles" => {
                let value = args
                    .next()
                    .context("--cycles requires an integer, e.g. --cycles 64")?;
                cfg.cycles = value
                    .parse::<u64>()
                    .with_context(|| format!("invalid --cycles value: {value}"))?;
            }
            "--json" => cfg.json = true,
            "--help" | "-h" => {
                println!(
                    "cathode8_debug\n\n\
Usage:\n\
  cargo run --bin cathode8_debug -- [options]\n\n\
Options:\n\
  --rom <path>      iNES ROM to trace (default: built-in demo program)\n\
  --cycles <n>      CPU cycles to run (default 64)\n\
  --json            Print one JSON register snapshot per instruction\n\
  -h, --help        Show this help\n"
                );
                std::process::exit(0);
            }
            other => bail!("unknown argument: {other}"),
        }
    }

    Ok(cfg)
}

fn main() -> Result<()> {
    let cfg = parse_args()?;

    let mut bus = Bus::new();
    match cfg.rom.as_deref() {
        Some(path) => bus.load_rom_from_path(path)?,
        None => bus.insert(Cartridge::from_program(DEMO_PROGRAM))?,
    }
    bus.power();

    if !cfg.json {
        println!("Mapper: {}", bus.mapper_name());
        println!("{}", bus.debug_mapper_state());
        println!();
    }

    let master_ticks = cfg.cycles.saturating_mul(CPU_CLOCK_DIVIDER);
    for _ in 0..master_ticks {
        let tick = bus.clock();
        if tick % CPU_CLOCK_DIVIDER != 0 {
            continue;
        }

        if cfg.json {
            if bus.cpu().complete() {
                println!("{}", serde_json::to_string(&bus.cpu().state())?);
            }
        } else {
            let line = bus.debug_string();
            if !line.is_empty() {
                println!("{line}");
            }
        }
    }

    if !cfg.json {
        let (unknown, last_opcode, last_pc) = bus.cpu().debug_unknown_opcodes();
        println!();
        println!(
            "CPU cycles: {}  unknown opcodes: {}",
            bus.cpu().total_cycles(),
            unknown
        );
        if unknown > 0 {
            println!("Last unknown opcode: ${last_opcode:02X} @ ${last_pc:04X}");
        }
        println!("Events:");
        for event in bus.debug_events() {
            println!("  {event}");
        }
    }

    Ok(())
}
