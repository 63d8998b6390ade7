pub mod cartridge;
pub mod cpu;
pub mod mapper;
pub mod opcodes;

use anyhow::Result;
use std::{collections::VecDeque, path::Path};

use cartridge::Cartridge;
use cpu::Cpu;
use mapper::{Mapper, Mirroring, create_mapper, mapper_name};

pub const FLAG_CARRY: u8 = 0x01;
pub const FLAG_ZERO: u8 = 0x02;
pub const FLAG_INTERRUPT: u8 = 0x04;
pub const FLAG_DECIMAL: u8 = 0x08;
pub const FLAG_BREAK: u8 = 0x10;
pub const FLAG_UNUSED: u8 = 0x20;
pub const FLAG_OVERFLOW: u8 = 0x40;
pub const FLAG_NEGATIVE: u8 = 0x80;

pub const RAM_SIZE: usize = 2048;
pub const CPU_CLOCK_DIVIDER: u64 = 3;

const MAX_DEBUG_EVENTS: usize = 512;

pub trait CpuBus {
    /// `read_only` marks debugger peeks that must not trigger side effects.
    fn read(&mut self, addr: u16, read_only: bool) -> u8;
    fn write(&mut self, addr: u16, value: u8);

    fn read16(&mut self, addr: u16, read_only: bool) -> u16 {
        let lo = self.read(addr, read_only) as u16;
        let hi = self.read(addr.wrapping_add(1), read_only) as u16;
        (hi << 8) | lo
    }

    fn debug_event(&mut self, _event: String) {}
}

pub struct SystemMemory {
    ram: [u8; RAM_SIZE],
    mapper: Option<Box<dyn Mapper>>,
    disabled_accesses: u64,
    debug_events: VecDeque<String>,
}

impl SystemMemory {
    fn new() -> Self {
        Self {
            ram: [0; RAM_SIZE],
            mapper: None,
            disabled_accesses: 0,
            debug_events: VecDeque::with_capacity(MAX_DEBUG_EVENTS),
        }
    }

    fn push_debug_event(&mut self, event: impl Into<String>) {
        if self.debug_events.len() >= MAX_DEBUG_EVENTS {
            self.debug_events.pop_front();
        }
        self.debug_events.push_back(event.into());
    }

    fn note_disabled_access(&mut self, addr: u16, kind: &str) {
        self.disabled_accesses = self.disabled_accesses.wrapping_add(1);
        log::error!("{kind} of disabled APU/IO test region at ${addr:04X}");
        self.push_debug_event(format!("Disabled region {kind} @ ${addr:04X}"));
    }
}

impl CpuBus for SystemMemory {
    fn read(&mut self, addr: u16, read_only: bool) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr as usize) & 0x07FF],
            // PPU registers and APU/input ports are not emulated.
            0x2000..=0x3FFF | 0x4000..=0x4017 => 0,
            0x4018..=0x401F => {
                if !read_only {
                    self.note_disabled_access(addr, "read");
                }
                0
            }
            0x4020..=0xFFFF => match self.mapper.as_mut() {
                Some(mapper) => mapper.cpu_read(addr),
                None => 0,
            },
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr as usize) & 0x07FF] = value,
            0x2000..=0x3FFF | 0x4000..=0x4017 => {}
            0x4018..=0x401F => self.note_disabled_access(addr, "write"),
            0x4020..=0xFFFF => {
                if let Some(mapper) = self.mapper.as_mut() {
                    mapper.cpu_write(addr, value);
                }
            }
        }
    }

    fn debug_event(&mut self, event: String) {
        self.push_debug_event(event);
    }
}

pub struct Bus {
    cpu: Cpu,
    memory: SystemMemory,
    master_clock: u64,
    mapper_name: String,
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus {
    pub fn new() -> Self {
        Self {
            cpu: Cpu::new(),
            memory: SystemMemory::new(),
            master_clock: 0,
            mapper_name: String::from("None"),
        }
    }

    pub fn load_rom_from_path(&mut self, path: &Path) -> Result<()> {
        let cart = Cartridge::from_file(path)?;
        self.insert(cart)
    }

    pub fn insert(&mut self, cart: Cartridge) -> Result<()> {
        let mapper_id = cart.mapper_id;
        self.memory.mapper = None;
        self.mapper_name = String::from("None");

        match create_mapper(cart) {
            Ok(mapper) => {
                self.memory.mapper = Some(mapper);
                self.mapper_name = format!("{} (mapper {mapper_id})", mapper_name(mapper_id));
                log::info!("cartridge inserted: {}", self.mapper_name);
                self.memory
                    .push_debug_event(format!("ROM loaded: {}", self.mapper_name));
                Ok(())
            }
            Err(err) => {
                log::error!("cartridge rejected: {err}");
                self.memory
                    .push_debug_event(format!("ROM rejected: mapper {mapper_id}"));
                Err(err)
            }
        }
    }

    pub fn power(&mut self) {
        self.reset();
    }

    pub fn reset(&mut self) {
        self.cpu.reset(&mut self.memory);
        self.master_clock = 0;
        self.memory
            .push_debug_event(format!("CPU reset, PC=${:04X}", self.cpu.pc()));
    }

    pub fn clock(&mut self) -> u64 {
        if self.master_clock % CPU_CLOCK_DIVIDER == 0 {
            self.cpu.clock(&mut self.memory);
        }
        self.master_clock = self.master_clock.wrapping_add(1);
        self.master_clock
    }

    /// Clocks until the CPU has fetched and finished one instruction,
    /// draining any latency still in flight first. Returns master ticks spent.
    pub fn step_instruction(&mut self) -> u64 {
        let start = self.master_clock;
        let mut fetched = false;
        loop {
            let fetch_due = self.cpu.complete() && self.master_clock % CPU_CLOCK_DIVIDER == 0;
            self.clock();
            fetched |= fetch_due;
            if fetched && self.cpu.complete() && self.master_clock % CPU_CLOCK_DIVIDER == 0 {
                break;
            }
        }
        self.master_clock.wrapping_sub(start)
    }

    pub fn read(&mut self, addr: u16, read_only: bool) -> u8 {
        self.memory.read(addr, read_only)
    }

    pub fn read16(&mut self, addr: u16, read_only: bool) -> u16 {
        self.memory.read16(addr, read_only)
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        self.memory.write(addr, value);
    }

    pub fn ppu_read(&mut self, addr: u16) -> u8 {
        match self.memory.mapper.as_mut() {
            Some(mapper) => mapper.ppu_read(addr),
            None => 0,
        }
    }

    pub fn ppu_write(&mut self, addr: u16, value: u8) {
        if let Some(mapper) = self.memory.mapper.as_mut() {
            mapper.ppu_write(addr, value);
        }
    }

    pub fn request_irq(&mut self) {
        self.cpu.request_irq();
    }

    pub fn request_nmi(&mut self) {
        self.cpu.request_nmi();
    }

    pub fn debug_string(&mut self) -> String {
        self.cpu.debug_string(&mut self.memory)
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    pub fn master_clock(&self) -> u64 {
        self.master_clock
    }

    pub fn has_cartridge(&self) -> bool {
        self.memory.mapper.is_some()
    }

    pub fn mapper_name(&self) -> &str {
        &self.mapper_name
    }

    pub fn mirroring(&self) -> Option<Mirroring> {
        self.memory.mapper.as_ref().map(|mapper| mapper.mirroring())
    }

    pub fn debug_mapper_state(&self) -> String {
        self.memory
            .mapper
            .as_ref()
            .map(|mapper| mapper.debug_state())
            .unwrap_or_default()
    }

    pub fn debug_disabled_accesses(&self) -> u64 {
        self.memory.disabled_accesses
    }

    pub fn debug_events(&self) -> impl Iterator<Item = &str> {
        self.memory.debug_events.iter().map(String::as_str)
    }

    pub fn clear_debug_events(&mut self) {
        self.memory.debug_events.clear();
    }
}
