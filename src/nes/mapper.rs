use anyhow::{Result, bail};
use serde::Serialize;

use super::cartridge::{CHR_BANK_SIZE, Cartridge};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mirroring {
    Horizontal,
    Vertical,
    OneScreenLower,
    OneScreenUpper,
}

/// Cartridge board logic. The CPU side sees $4020-$FFFF, the PPU side
/// sees the pattern tables at $0000-$1FFF.
pub trait Mapper {
    fn cpu_read(&mut self, addr: u16) -> u8;
    fn cpu_write(&mut self, addr: u16, value: u8);
    fn ppu_read(&mut self, addr: u16) -> u8;
    fn ppu_write(&mut self, addr: u16, value: u8);
    fn mirroring(&self) -> Mirroring;
    fn debug_state(&self) -> String {
        String::new()
    }
}

pub fn mapper_name(mapper_id: u8) -> &'static str {
    match mapper_id {
        0 => "NROM",
        _ => "Unsupported",
    }
}

pub fn create_mapper(cart: Cartridge) -> Result<Box<dyn Mapper>> {
    let mapper: Box<dyn Mapper> = match cart.mapper_id {
        0 => Box::new(Mapper0::new(cart)),
        id => {
            bail!("mapper {id} ({}) is not supported", mapper_name(id));
        }
    };
    Ok(mapper)
}

struct Mapper0 {
    prg_rom: Vec<u8>,
    prg_banks: u8,
    chr: Vec<u8>,
    chr_is_ram: bool,
    mirroring: Mirroring,
}

impl Mapper0 {
    fn new(cart: Cartridge) -> Self {
        let chr_is_ram = cart.chr_banks == 0;
        let chr = if chr_is_ram && cart.chr_rom.is_empty() {
            vec![0; CHR_BANK_SIZE]
        } else {
            cart.chr_rom
        };
        Self {
            prg_rom: cart.prg_rom,
            prg_banks: cart.prg_banks,
            chr,
            chr_is_ram,
            mirroring: cart.mirroring,
        }
    }

    fn prg_mask(&self) -> u16 {
        if self.prg_banks > 1 { 0x7FFF } else { 0x3FFF }
    }
}

impl Mapper for Mapper0 {
    fn cpu_read(&mut self, addr: u16) -> u8 {
        if addr < 0x8000 {
            return 0;
        }
        let idx = (addr & self.prg_mask()) as usize;
        self.prg_rom.get(idx).copied().unwrap_or(0)
    }

    fn cpu_write(&mut self, addr: u16, value: u8) {
        log::warn!("ROM write ignored: ${addr:04X} <- ${value:02X}");
    }

    fn ppu_read(&mut self, addr: u16) -> u8 {
        if addr >= 0x2000 {
            return 0;
        }
        self.chr.get(addr as usize).copied().unwrap_or(0)
    }

    fn ppu_write(&mut self, addr: u16, value: u8) {
        if addr >= 0x2000 {
            return;
        }
        if !self.chr_is_ram {
            log::warn!("CHR ROM write ignored: ${addr:04X} <- ${value:02X}");
            return;
        }
        if let Some(slot) = self.chr.get_mut(addr as usize) {
            *slot = value;
        }
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    fn debug_state(&self) -> String {
        format!(
            "NROM prg_banks={} chr={} mirroring={:?}",
            self.prg_banks,
            if self.chr_is_ram { "RAM" } else { "ROM" },
            self.mirroring
        )
    }
}
