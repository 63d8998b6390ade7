use anyhow::{Context, Result, bail};
use std::{fs, path::Path};

use super::mapper::Mirroring;

pub const PRG_BANK_SIZE: usize = 16 * 1024;
pub const CHR_BANK_SIZE: usize = 8 * 1024;

const HEADER_LEN: usize = 16;
const TRAINER_LEN: usize = 512;
const INES_MAGIC: &[u8; 4] = b"NES\x1A";

/// In-memory cartridge image handed to [`Bus::insert`](super::Bus::insert).
///
/// `chr_banks == 0` means the board carries CHR RAM instead of CHR ROM.
#[derive(Debug, Clone)]
pub struct Cartridge {
    pub mapper_id: u8,
    pub mirroring: Mirroring,
    pub has_battery_backed_ram: bool,
    pub prg_banks: u8,
    pub chr_banks: u8,
    pub prg_rom: Vec<u8>,
    pub chr_rom: Vec<u8>,
}

impl Cartridge {
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes =
            fs::read(path).with_context(|| format!("failed to read ROM: {}", path.display()))?;
        Self::from_bytes(&bytes)
            .with_context(|| format!("failed to parse ROM: {}", path.display()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            bail!("ROM is too small to contain an iNES header");
        }
        if &bytes[0..4] != INES_MAGIC {
            bail!("invalid iNES header magic, expected NES<EOF>");
        }

        let prg_banks = bytes[4];
        let chr_banks = bytes[5];
        let flags6 = bytes[6];
        let flags7 = bytes[7];

        let mapper_id = (flags7 & 0xF0) | (flags6 >> 4);
        let mirroring = if (flags6 & 0x01) != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };
        let has_battery_backed_ram = (flags6 & 0x02) != 0;
        let trainer_present = (flags6 & 0x04) != 0;

        let mut cursor = HEADER_LEN;
        if trainer_present {
            cursor += TRAINER_LEN;
        }

        let prg_rom_size = prg_banks as usize * PRG_BANK_SIZE;
        if prg_rom_size == 0 {
            bail!("invalid PRG ROM: header declares zero banks");
        }
        if bytes.len() < cursor + prg_rom_size {
            bail!(
                "ROM truncated: expected {} PRG bytes but file ended early",
                prg_rom_size
            );
        }
        let prg_rom = bytes[cursor..cursor + prg_rom_size].to_vec();
        cursor += prg_rom_size;

        let chr_rom_size = chr_banks as usize * CHR_BANK_SIZE;
        if bytes.len() < cursor + chr_rom_size {
            bail!(
                "ROM truncated: expected {} CHR bytes but file ended early",
                chr_rom_size
            );
        }
        let chr_rom = bytes[cursor..cursor + chr_rom_size].to_vec();

        Ok(Self {
            mapper_id,
            mirroring,
            has_battery_backed_ram,
            prg_banks,
            chr_banks,
            prg_rom,
            chr_rom,
        })
    }

    /// Single-bank NROM image at $8000 with every vector pointing at the
    /// program. Overlong programs are truncated.
    pub fn from_program(program: &[u8]) -> Self {
        let mut prg_rom = vec![0xEA; PRG_BANK_SIZE];
        let len = program.len().min(PRG_BANK_SIZE - 6);
        prg_rom[..len].copy_from_slice(&program[..len]);

        // $FFFA-$FFFF land at the top of the mirrored 16KB bank.
        for vector in [0x3FFA, 0x3FFC, 0x3FFE] {
            prg_rom[vector] = 0x00;
            prg_rom[vector + 1] = 0x80;
        }

        Self {
            mapper_id: 0,
            mirroring: Mirroring::Horizontal,
            has_battery_backed_ram: false,
            prg_banks: 1,
            chr_banks: 0,
            prg_rom,
            chr_rom: Vec::new(),
        }
    }
}
