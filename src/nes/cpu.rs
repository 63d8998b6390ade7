use serde::Serialize;

use super::opcodes::{self, AddressingMode, Instruction, Opcode};
use super::{
    CpuBus, FLAG_BREAK, FLAG_CARRY, FLAG_DECIMAL, FLAG_INTERRUPT, FLAG_NEGATIVE, FLAG_OVERFLOW,
    FLAG_UNUSED, FLAG_ZERO,
};

const STACK_BASE: u16 = 0x0100;
const NMI_VECTOR: u16 = 0xFFFA;
const RESET_VECTOR: u16 = 0xFFFC;
const IRQ_VECTOR: u16 = 0xFFFE;

const RESET_CYCLES: u8 = 8;
const IRQ_CYCLES: u8 = 7;
const NMI_CYCLES: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CpuState {
    pub pc: u16,
    pub sp: u8,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub p: u8,
    pub cycles: u8,
}

#[derive(Debug, Clone)]
pub struct Cpu {
    pc: u16,
    sp: u8,
    a: u8,
    x: u8,
    y: u8,
    p: u8,

    cycles: u8,
    total_cycles: u64,

    pending_nmi: bool,
    pending_irq: bool,

    unknown_opcode_count: u64,
    last_unknown_opcode: u8,
    last_unknown_pc: u16,
    irq_serviced_count: u64,
    nmi_serviced_count: u64,
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    pub fn new() -> Self {
        Self {
            pc: 0,
            sp: 0xFD,
            a: 0,
            x: 0,
            y: 0,
            p: FLAG_UNUSED,
            cycles: 0,
            total_cycles: 0,
            pending_nmi: false,
            pending_irq: false,
            unknown_opcode_count: 0,
            last_unknown_opcode: 0,
            last_unknown_pc: 0,
            irq_serviced_count: 0,
            nmi_serviced_count: 0,
        }
    }

    pub fn reset(&mut self, bus: &mut impl CpuBus) {
        self.pc = bus.read16(RESET_VECTOR, false);
        self.p = FLAG_UNUSED;
        self.sp = 0xFD;
        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.pending_nmi = false;
        self.pending_irq = false;
        self.cycles = RESET_CYCLES;
        log::info!("CPU reset, PC=${:04X}", self.pc);
    }

    pub fn irq(&mut self, bus: &mut impl CpuBus) {
        if self.get_flag(FLAG_INTERRUPT) {
            return;
        }
        self.interrupt(bus, IRQ_VECTOR);
        self.cycles = IRQ_CYCLES;
        self.irq_serviced_count = self.irq_serviced_count.wrapping_add(1);
        bus.debug_event(format!("IRQ serviced -> PC=${:04X}", self.pc));
    }

    pub fn nmi(&mut self, bus: &mut impl CpuBus) {
        self.interrupt(bus, NMI_VECTOR);
        self.cycles = NMI_CYCLES;
        self.nmi_serviced_count = self.nmi_serviced_count.wrapping_add(1);
        bus.debug_event(format!("NMI serviced -> PC=${:04X}", self.pc));
    }

    pub fn request_irq(&mut self) {
        self.pending_irq = true;
    }

    pub fn request_nmi(&mut self) {
        self.pending_nmi = true;
    }

    pub fn clock(&mut self, bus: &mut impl CpuBus) {
        if self.cycles == 0 {
            self.p |= FLAG_UNUSED;
            if self.pending_nmi {
                self.pending_nmi = false;
                self.nmi(bus);
            } else if self.pending_irq && !self.get_flag(FLAG_INTERRUPT) {
                self.pending_irq = false;
                self.irq(bus);
            } else {
                self.step(bus);
            }
        }
        self.cycles = self.cycles.saturating_sub(1);
        self.total_cycles = self.total_cycles.wrapping_add(1);
    }

    fn step(&mut self, bus: &mut impl CpuBus) {
        let opcode_pc = self.pc;
        let opcode = self.fetch_byte(bus);
        let entry = opcodes::lookup(opcode);

        let (addr, page_crossed) = self.operand_address(bus, entry.mode);
        let extra = self.execute(bus, entry, addr);
        if entry.instruction == Instruction::Illegal {
            self.note_unknown_opcode(bus, opcode, opcode_pc);
        }

        self.cycles += entry.cycles + extra;
        if page_crossed {
            self.cycles += entry.page_cycles;
        }
    }

    /// Empty while the current instruction still has cycles to run.
    pub fn debug_string(&self, bus: &mut impl CpuBus) -> String {
        if self.cycles > 0 {
            return String::new();
        }

        let opcode = bus.read(self.pc, true);
        format!(
            "{:#06x} {:#04x} {}      A:{:#04x} X:{:#04x} Y:{:#04x} P:{:#04x} SP:{:#04x}",
            self.pc,
            opcode,
            opcodes::lookup(opcode).name(),
            self.a,
            self.x,
            self.y,
            self.p,
            self.sp
        )
    }

    pub fn state(&self) -> CpuState {
        CpuState {
            pc: self.pc,
            sp: self.sp,
            a: self.a,
            x: self.x,
            y: self.y,
            p: self.p,
            cycles: self.cycles,
        }
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn sp(&self) -> u8 {
        self.sp
    }

    pub fn a(&self) -> u8 {
        self.a
    }

    pub fn x(&self) -> u8 {
        self.x
    }

    pub fn y(&self) -> u8 {
        self.y
    }

    pub fn status(&self) -> u8 {
        self.p
    }

    pub fn cycles(&self) -> u8 {
        self.cycles
    }

    pub fn complete(&self) -> bool {
        self.cycles == 0
    }

    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    pub fn get_flag(&self, flag: u8) -> bool {
        (self.p & flag) != 0
    }

    pub fn debug_unknown_opcodes(&self) -> (u64, u8, u16) {
        (
            self.unknown_opcode_count,
            self.last_unknown_opcode,
            self.last_unknown_pc,
        )
    }

    pub fn debug_interrupts_serviced(&self) -> (u64, u64) {
        (self.nmi_serviced_count, self.irq_serviced_count)
    }

    fn set_flag(&mut self, flag: u8, value: bool) {
        if value {
            self.p |= flag;
        } else {
            self.p &= !flag;
        }
        self.p |= FLAG_UNUSED;
    }

    fn update_zn(&mut self, value: u8) {
        self.set_flag(FLAG_ZERO, value == 0);
        self.set_flag(FLAG_NEGATIVE, (value & 0x80) != 0);
    }

    fn interrupt(&mut self, bus: &mut impl CpuBus, vector: u16) {
        self.push_u16(bus, self.pc);
        self.push(bus, (self.p & !FLAG_BREAK) | FLAG_UNUSED);
        self.set_flag(FLAG_INTERRUPT, true);
        self.pc = bus.read16(vector, false);
    }

    fn note_unknown_opcode(&mut self, bus: &mut impl CpuBus, opcode: u8, pc: u16) {
        self.unknown_opcode_count = self.unknown_opcode_count.wrapping_add(1);
        self.last_unknown_opcode = opcode;
        self.last_unknown_pc = pc;
        log::warn!("unknown opcode ${opcode:02X} @ ${pc:04X}, executed as NOP");
        bus.debug_event(format!("Unknown opcode ${:02X} @ ${:04X}", opcode, pc));
    }

    fn fetch_byte(&mut self, bus: &mut impl CpuBus) -> u8 {
        let byte = bus.read(self.pc, false);
        self.pc = self.pc.wrapping_add(1);
        byte
    }

    fn fetch_word(&mut self, bus: &mut impl CpuBus) -> u16 {
        let lo = self.fetch_byte(bus) as u16;
        let hi = self.fetch_byte(bus) as u16;
        (hi << 8) | lo
    }

    fn push(&mut self, bus: &mut impl CpuBus, value: u8) {
        bus.write(STACK_BASE | self.sp as u16, value);
        self.sp = self.sp.wrapping_sub(1);
    }

    fn pop(&mut self, bus: &mut impl CpuBus) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        bus.read(STACK_BASE | self.sp as u16, false)
    }

    fn push_u16(&mut self, bus: &mut impl CpuBus, value: u16) {
        self.push(bus, (value >> 8) as u8);
        self.push(bus, value as u8);
    }

    fn pop_u16(&mut self, bus: &mut impl CpuBus) -> u16 {
        let lo = self.pop(bus) as u16;
        let hi = self.pop(bus) as u16;
        (hi << 8) | lo
    }

    fn read_zp_u16(bus: &mut impl CpuBus, addr: u8) -> u16 {
        let lo = bus.read(addr as u16, false) as u16;
        let hi = bus.read(addr.wrapping_add(1) as u16, false) as u16;
        (hi << 8) | lo
    }

    /// Resolves the operand for `mode`, consuming its bytes. Returns the
    /// effective address and whether indexing crossed a page. For `Rel`
    /// the address is the sign-extended branch offset.
    fn operand_address(&mut self, bus: &mut impl CpuBus, mode: AddressingMode) -> (u16, bool) {
        match mode {
            AddressingMode::Imp | AddressingMode::Acc => (0, false),
            AddressingMode::Imm => {
                let addr = self.pc;
                self.pc = self.pc.wrapping_add(1);
                (addr, false)
            }
            AddressingMode::Rel => {
                let offset = self.fetch_byte(bus) as i8;
                (offset as i16 as u16, false)
            }
            AddressingMode::Zp0 => (self.fetch_byte(bus) as u16, false),
            AddressingMode::Zpx => (self.fetch_byte(bus).wrapping_add(self.x) as u16, false),
            AddressingMode::Zpy => (self.fetch_byte(bus).wrapping_add(self.y) as u16, false),
            AddressingMode::Abs => (self.fetch_word(bus), false),
            AddressingMode::Abx => {
                let base = self.fetch_word(bus);
                let addr = base.wrapping_add(self.x as u16);
                (addr, (base & 0xFF00) != (addr & 0xFF00))
            }
            AddressingMode::Aby => {
                let base = self.fetch_word(bus);
                let addr = base.wrapping_add(self.y as u16);
                (addr, (base & 0xFF00) != (addr & 0xFF00))
            }
            AddressingMode::Ind => {
                let ptr = self.fetch_word(bus);
                // The high byte never carries into the next page.
                let lo = bus.read(ptr, false) as u16;
                let hi_addr = (ptr & 0xFF00) | (ptr.wrapping_add(1) & 0x00FF);
                let hi = bus.read(hi_addr, false) as u16;
                ((hi << 8) | lo, false)
            }
            AddressingMode::Izx => {
                let zp = self.fetch_byte(bus).wrapping_add(self.x);
                (Self::read_zp_u16(bus, zp), false)
            }
            AddressingMode::Izy => {
                let zp = self.fetch_byte(bus);
                let base = Self::read_zp_u16(bus, zp);
                let addr = base.wrapping_add(self.y as u16);
                (addr, (base & 0xFF00) != (addr & 0xFF00))
            }
        }
    }

    // Extra cycles only the handler knows about (taken branches).
    fn execute(&mut self, bus: &mut impl CpuBus, entry: &Opcode, addr: u16) -> u8 {
        let mode = entry.mode;
        match entry.instruction {
            Instruction::Lda => {
                self.a = bus.read(addr, false);
                self.update_zn(self.a);
            }
            Instruction::Ldx => {
                self.x = bus.read(addr, false);
                self.update_zn(self.x);
            }
            Instruction::Ldy => {
                self.y = bus.read(addr, false);
                self.update_zn(self.y);
            }
            Instruction::Sta => bus.write(addr, self.a),
            Instruction::Stx => bus.write(addr, self.x),
            Instruction::Sty => bus.write(addr, self.y),

            Instruction::Tax => {
                self.x = self.a;
                self.update_zn(self.x);
            }
            Instruction::Tay => {
                self.y = self.a;
                self.update_zn(self.y);
            }
            Instruction::Tsx => {
                self.x = self.sp;
                self.update_zn(self.x);
            }
            Instruction::Txa => {
                self.a = self.x;
                self.update_zn(self.a);
            }
            Instruction::Txs => self.sp = self.x,
            Instruction::Tya => {
                self.a = self.y;
                self.update_zn(self.a);
            }

            Instruction::Adc => {
                let value = bus.read(addr, false);
                self.adc(value);
            }
            Instruction::Sbc => {
                let value = bus.read(addr, false);
                self.sbc(value);
            }
            Instruction::And => {
                self.a &= bus.read(addr, false);
                self.update_zn(self.a);
            }
            Instruction::Ora => {
                self.a |= bus.read(addr, false);
                self.update_zn(self.a);
            }
            Instruction::Eor => {
                self.a ^= bus.read(addr, false);
                self.update_zn(self.a);
            }
            Instruction::Bit => {
                let value = bus.read(addr, false);
                self.set_flag(FLAG_ZERO, (self.a & value) == 0);
                self.set_flag(FLAG_NEGATIVE, (value & 0x80) != 0);
                self.set_flag(FLAG_OVERFLOW, (value & 0x40) != 0);
            }
            Instruction::Cmp => {
                let value = bus.read(addr, false);
                self.compare(self.a, value);
            }
            Instruction::Cpx => {
                let value = bus.read(addr, false);
                self.compare(self.x, value);
            }
            Instruction::Cpy => {
                let value = bus.read(addr, false);
                self.compare(self.y, value);
            }

            Instruction::Asl => self.read_modify_write(bus, mode, addr, RmwOp::Asl),
            Instruction::Lsr => self.read_modify_write(bus, mode, addr, RmwOp::Lsr),
            Instruction::Rol => self.read_modify_write(bus, mode, addr, RmwOp::Rol),
            Instruction::Ror => self.read_modify_write(bus, mode, addr, RmwOp::Ror),
            Instruction::Inc => self.read_modify_write(bus, mode, addr, RmwOp::Inc),
            Instruction::Dec => self.read_modify_write(bus, mode, addr, RmwOp::Dec),
            Instruction::Inx => {
                self.x = self.x.wrapping_add(1);
                self.update_zn(self.x);
            }
            Instruction::Iny => {
                self.y = self.y.wrapping_add(1);
                self.update_zn(self.y);
            }
            Instruction::Dex => {
                self.x = self.x.wrapping_sub(1);
                self.update_zn(self.x);
            }
            Instruction::Dey => {
                self.y = self.y.wrapping_sub(1);
                self.update_zn(self.y);
            }

            Instruction::Bcc => return self.branch(!self.get_flag(FLAG_CARRY), addr, entry),
            Instruction::Bcs => return self.branch(self.get_flag(FLAG_CARRY), addr, entry),
            Instruction::Bne => return self.branch(!self.get_flag(FLAG_ZERO), addr, entry),
            Instruction::Beq => return self.branch(self.get_flag(FLAG_ZERO), addr, entry),
            Instruction::Bpl => return self.branch(!self.get_flag(FLAG_NEGATIVE), addr, entry),
            Instruction::Bmi => return self.branch(self.get_flag(FLAG_NEGATIVE), addr, entry),
            Instruction::Bvc => return self.branch(!self.get_flag(FLAG_OVERFLOW), addr, entry),
            Instruction::Bvs => return self.branch(self.get_flag(FLAG_OVERFLOW), addr, entry),

            Instruction::Jmp => self.pc = addr,
            Instruction::Jsr => {
                self.push_u16(bus, self.pc.wrapping_sub(1));
                self.pc = addr;
            }
            Instruction::Rts => {
                self.pc = self.pop_u16(bus).wrapping_add(1);
            }
            Instruction::Brk => {
                self.set_flag(FLAG_INTERRUPT, true);
                self.push_u16(bus, self.pc);
                self.push(bus, self.p | FLAG_BREAK | FLAG_UNUSED);
                self.pc = bus.read16(IRQ_VECTOR, false);
            }
            Instruction::Rti => {
                self.p = self.pop(bus) | FLAG_UNUSED;
                self.pc = self.pop_u16(bus);
            }

            Instruction::Pha => self.push(bus, self.a),
            Instruction::Php => self.push(bus, self.p | FLAG_BREAK | FLAG_UNUSED),
            Instruction::Pla => {
                self.a = self.pop(bus);
                self.update_zn(self.a);
            }
            Instruction::Plp => {
                self.p = self.pop(bus) | FLAG_UNUSED;
            }

            Instruction::Clc => self.set_flag(FLAG_CARRY, false),
            Instruction::Sec => self.set_flag(FLAG_CARRY, true),
            Instruction::Cli => self.set_flag(FLAG_INTERRUPT, false),
            Instruction::Sei => self.set_flag(FLAG_INTERRUPT, true),
            Instruction::Cld => self.set_flag(FLAG_DECIMAL, false),
            Instruction::Sed => self.set_flag(FLAG_DECIMAL, true),
            Instruction::Clv => self.set_flag(FLAG_OVERFLOW, false),

            Instruction::Nop | Instruction::Illegal => {}
        }
        0
    }

    fn branch(&mut self, condition: bool, offset: u16, entry: &Opcode) -> u8 {
        if !condition {
            return 0;
        }
        let old_pc = self.pc;
        self.pc = old_pc.wrapping_add(offset);
        if (old_pc & 0xFF00) != (self.pc & 0xFF00) {
            1 + entry.page_cycles
        } else {
            1
        }
    }

    fn read_modify_write(
        &mut self,
        bus: &mut impl CpuBus,
        mode: AddressingMode,
        addr: u16,
        op: RmwOp,
    ) {
        if mode == AddressingMode::Acc {
            self.a = self.apply_rmw(self.a, op);
            return;
        }
        let value = bus.read(addr, false);
        let out = self.apply_rmw(value, op);
        bus.write(addr, out);
    }

    fn apply_rmw(&mut self, value: u8, op: RmwOp) -> u8 {
        match op {
            RmwOp::Asl => self.asl(value),
            RmwOp::Lsr => self.lsr(value),
            RmwOp::Rol => self.rol(value),
            RmwOp::Ror => self.ror(value),
            RmwOp::Inc => {
                let out = value.wrapping_add(1);
                self.update_zn(out);
                out
            }
            RmwOp::Dec => {
                let out = value.wrapping_sub(1);
                self.update_zn(out);
                out
            }
        }
    }

    fn compare(&mut self, register: u8, value: u8) {
        let result = register.wrapping_sub(value);
        self.set_flag(FLAG_CARRY, register >= value);
        self.update_zn(result);
    }

    fn adc(&mut self, value: u8) {
        let carry_in = u16::from(self.get_flag(FLAG_CARRY));
        let result = self.a as u16 + value as u16 + carry_in;
        let out = result as u8;

        self.set_flag(FLAG_CARRY, result > 0xFF);
        self.set_flag(FLAG_OVERFLOW, (!(self.a ^ value) & (self.a ^ out) & 0x80) != 0);

        self.a = out;
        self.update_zn(self.a);
    }

    fn sbc(&mut self, value: u8) {
        self.adc(!value);
    }

    fn asl(&mut self, value: u8) -> u8 {
        self.set_flag(FLAG_CARRY, (value & 0x80) != 0);
        let result = value << 1;
        self.update_zn(result);
        result
    }

    fn lsr(&mut self, value: u8) -> u8 {
        self.set_flag(FLAG_CARRY, (value & 0x01) != 0);
        let result = value >> 1;
        self.update_zn(result);
        result
    }

    fn rol(&mut self, value: u8) -> u8 {
        let carry_in = u8::from(self.get_flag(FLAG_CARRY));
        self.set_flag(FLAG_CARRY, (value & 0x80) != 0);
        let result = (value << 1) | carry_in;
        self.update_zn(result);
        result
    }

    fn ror(&mut self, value: u8) -> u8 {
        let carry_in = if self.get_flag(FLAG_CARRY) { 0x80 } else { 0 };
        self.set_flag(FLAG_CARRY, (value & 0x01) != 0);
        let result = (value >> 1) | carry_in;
        self.update_zn(result);
        result
    }
}

#[derive(Clone, Copy)]
enum RmwOp {
    Asl,
    Lsr,
    Rol,
    Ror,
    Inc,
    Dec,
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestBus {
        mem: Vec<u8>,
        events: Vec<String>,
    }

    impl TestBus {
        fn new() -> Self {
            Self {
                mem: vec![0; 0x10000],
                events: Vec::new(),
            }
        }

        fn load(&mut self, addr: u16, bytes: &[u8]) {
            let start = addr as usize;
            self.mem[start..start + bytes.len()].copy_from_slice(bytes);
        }

        fn set_vector(&mut self, vector: u16, target: u16) {
            self.load(vector, &target.to_le_bytes());
        }
    }

    impl CpuBus for TestBus {
        fn read(&mut self, addr: u16, _read_only: bool) -> u8 {
            self.mem[addr as usize]
        }

        fn write(&mut self, addr: u16, value: u8) {
            self.mem[addr as usize] = value;
        }

        fn debug_event(&mut self, event: String) {
            self.events.push(event);
        }
    }

    fn setup(program: &[u8]) -> (Cpu, TestBus) {
        let mut bus = TestBus::new();
        bus.load(0x8000, program);
        bus.set_vector(RESET_VECTOR, 0x8000);
        bus.set_vector(IRQ_VECTOR, 0x9000);
        bus.set_vector(NMI_VECTOR, 0xA000);

        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);
        cpu.cycles = 0;
        (cpu, bus)
    }

    fn clocks_until_idle(cpu: &mut Cpu, bus: &mut TestBus) -> u32 {
        let mut clocks = 0;
        while !cpu.complete() {
            cpu.clock(bus);
            clocks += 1;
        }
        clocks
    }

    fn run(cpu: &mut Cpu, bus: &mut TestBus) -> u32 {
        assert!(cpu.complete());
        cpu.clock(bus);
        1 + clocks_until_idle(cpu, bus)
    }

    #[test]
    fn reset_loads_vector_and_waits_eight_cycles() {
        let mut bus = TestBus::new();
        bus.set_vector(RESET_VECTOR, 0xC123);
        let mut cpu = Cpu::new();
        cpu.a = 9;
        cpu.p = 0xFF;

        cpu.reset(&mut bus);
        assert_eq!(cpu.pc(), 0xC123);
        assert_eq!(cpu.status(), FLAG_UNUSED);
        assert_eq!(cpu.sp(), 0xFD);
        assert_eq!((cpu.a(), cpu.x(), cpu.y()), (0, 0, 0));
        assert_eq!(clocks_until_idle(&mut cpu, &mut bus), 8);
    }

    #[test]
    fn lda_immediate_sets_zero_and_negative() {
        let (mut cpu, mut bus) = setup(&[0xA9, 0x42, 0xA9, 0x00, 0xA9, 0xFF]);

        assert_eq!(run(&mut cpu, &mut bus), 2);
        assert_eq!(cpu.a(), 0x42);
        assert!(!cpu.get_flag(FLAG_ZERO));
        assert!(!cpu.get_flag(FLAG_NEGATIVE));

        run(&mut cpu, &mut bus);
        assert!(cpu.get_flag(FLAG_ZERO));
        assert!(!cpu.get_flag(FLAG_NEGATIVE));

        run(&mut cpu, &mut bus);
        assert!(!cpu.get_flag(FLAG_ZERO));
        assert!(cpu.get_flag(FLAG_NEGATIVE));
    }

    #[test]
    fn adc_signed_overflow() {
        let (mut cpu, mut bus) = setup(&[0xA9, 0x50, 0x69, 0x50]);
        run(&mut cpu, &mut bus);
        run(&mut cpu, &mut bus);

        assert_eq!(cpu.a(), 0xA0);
        assert!(cpu.get_flag(FLAG_OVERFLOW));
        assert!(!cpu.get_flag(FLAG_CARRY));
        assert!(cpu.get_flag(FLAG_NEGATIVE));
        assert!(!cpu.get_flag(FLAG_ZERO));
    }

    #[test]
    fn sbc_is_adc_of_complement() {
        for a in 0..=255u8 {
            for m in 0..=255u8 {
                for carry in [false, true] {
                    let mut sub = Cpu::new();
                    sub.a = a;
                    sub.set_flag(FLAG_CARRY, carry);
                    sub.sbc(m);

                    let mut add = Cpu::new();
                    add.a = a;
                    add.set_flag(FLAG_CARRY, carry);
                    add.adc(!m);

                    assert_eq!((sub.a, sub.p), (add.a, add.p), "a={a:02X} m={m:02X} c={carry}");

                    let diff = a as i16 - m as i16 - i16::from(!carry);
                    let result = diff as u8;
                    assert_eq!(sub.a, result);
                    assert_eq!(sub.get_flag(FLAG_CARRY), diff >= 0);
                    assert_eq!(
                        sub.get_flag(FLAG_OVERFLOW),
                        ((a ^ m) & (a ^ result) & 0x80) != 0
                    );
                    assert_eq!(sub.get_flag(FLAG_ZERO), result == 0);
                    assert_eq!(sub.get_flag(FLAG_NEGATIVE), result & 0x80 != 0);
                }
            }
        }
    }

    #[test]
    fn jmp_indirect_wraps_within_page() {
        let (mut cpu, mut bus) = setup(&[0x6C, 0xFF, 0x02]);
        bus.mem[0x02FF] = 0x34;
        bus.mem[0x0200] = 0x12;
        bus.mem[0x0300] = 0x56;

        assert_eq!(run(&mut cpu, &mut bus), 5);
        assert_eq!(cpu.pc(), 0x1234);
    }

    #[test]
    fn jmp_indirect_reads_pointer_normally() {
        let (mut cpu, mut bus) = setup(&[0x6C, 0x10, 0x02]);
        bus.load(0x0210, &[0xCD, 0xAB]);

        run(&mut cpu, &mut bus);
        assert_eq!(cpu.pc(), 0xABCD);
    }

    #[test]
    fn irq_respects_interrupt_disable() {
        let (mut cpu, mut bus) = setup(&[0xEA]);
        cpu.p |= FLAG_INTERRUPT;

        cpu.irq(&mut bus);
        assert_eq!(cpu.pc(), 0x8000);
        assert_eq!(cpu.sp(), 0xFD);
        assert!(cpu.complete());

        cpu.p &= !FLAG_INTERRUPT;
        cpu.p |= FLAG_BREAK | FLAG_CARRY;
        cpu.irq(&mut bus);
        assert_eq!(cpu.pc(), 0x9000);
        assert_eq!(cpu.sp(), 0xFA);
        assert_eq!(bus.mem[0x01FD], 0x80);
        assert_eq!(bus.mem[0x01FC], 0x00);
        assert_eq!(bus.mem[0x01FB], FLAG_UNUSED | FLAG_CARRY);
        assert!(cpu.get_flag(FLAG_INTERRUPT));
        assert_eq!(clocks_until_idle(&mut cpu, &mut bus), 7);
        assert_eq!(cpu.debug_interrupts_serviced(), (0, 1));
    }

    #[test]
    fn nmi_ignores_interrupt_disable() {
        let (mut cpu, mut bus) = setup(&[0xEA]);
        cpu.p |= FLAG_INTERRUPT;

        cpu.nmi(&mut bus);
        assert_eq!(cpu.pc(), 0xA000);
        assert_eq!(bus.mem[0x01FB], FLAG_UNUSED | FLAG_INTERRUPT);
        assert_eq!(clocks_until_idle(&mut cpu, &mut bus), 8);
        assert!(bus.events.iter().any(|e| e.starts_with("NMI serviced")));
    }

    #[test]
    fn latched_nmi_wins_over_irq() {
        let (mut cpu, mut bus) = setup(&[0xEA]);
        cpu.request_irq();
        cpu.request_nmi();

        cpu.clock(&mut bus);
        assert_eq!(cpu.pc(), 0xA000);
        assert_eq!(clocks_until_idle(&mut cpu, &mut bus), 7);

        // IRQ stays latched while the NMI handler runs with I set.
        bus.mem[0xA000] = 0xEA;
        run(&mut cpu, &mut bus);
        assert_eq!(cpu.pc(), 0xA001);

        cpu.p &= !FLAG_INTERRUPT;
        assert_eq!(run(&mut cpu, &mut bus), 7);
        assert_eq!(cpu.pc(), 0x9000);
    }

    #[test]
    fn taken_branch_costs_extra_cycles() {
        // Not taken.
        let (mut cpu, mut bus) = setup(&[0xF0, 0x10]);
        assert_eq!(run(&mut cpu, &mut bus), 2);
        assert_eq!(cpu.pc(), 0x8002);

        // Taken, same page.
        let (mut cpu, mut bus) = setup(&[0xD0, 0x02]);
        assert_eq!(run(&mut cpu, &mut bus), 3);
        assert_eq!(cpu.pc(), 0x8004);

        // Taken backwards across a page.
        let (mut cpu, mut bus) = setup(&[0xD0, 0xFC]);
        assert_eq!(run(&mut cpu, &mut bus), 4);
        assert_eq!(cpu.pc(), 0x7FFE);

        // Taken forwards across a page.
        let (mut cpu, mut bus) = setup(&[]);
        bus.load(0x80F0, &[0xD0, 0x20]);
        cpu.pc = 0x80F0;
        assert_eq!(run(&mut cpu, &mut bus), 4);
        assert_eq!(cpu.pc(), 0x8112);
    }

    #[test]
    fn indexed_reads_pay_for_page_cross() {
        let (mut cpu, mut bus) = setup(&[
            0xBD, 0x00, 0x03, // LDA $0300,X
            0xBD, 0xFF, 0x03, // LDA $03FF,X
            0x9D, 0xFF, 0x03, // STA $03FF,X
            0xB9, 0xFF, 0x03, // LDA $03FF,Y
            0xB1, 0x10, // LDA ($10),Y
            0xB5, 0xFF, // LDA $FF,X
        ]);
        cpu.x = 1;
        cpu.y = 1;
        bus.mem[0x0301] = 0x11;
        bus.mem[0x0400] = 0x22;
        bus.load(0x0010, &[0xFF, 0x03]);

        assert_eq!(run(&mut cpu, &mut bus), 4);
        assert_eq!(cpu.a(), 0x11);
        assert_eq!(run(&mut cpu, &mut bus), 5);
        assert_eq!(cpu.a(), 0x22);
        assert_eq!(run(&mut cpu, &mut bus), 5);
        assert_eq!(run(&mut cpu, &mut bus), 5);
        assert_eq!(run(&mut cpu, &mut bus), 6);

        // Zero page indexing wraps and never pays.
        bus.mem[0x0000] = 0x33;
        assert_eq!(run(&mut cpu, &mut bus), 4);
        assert_eq!(cpu.a(), 0x33);
    }

    #[test]
    fn indexed_indirect_wraps_in_zero_page() {
        let (mut cpu, mut bus) = setup(&[0xA1, 0xFE]);
        cpu.x = 1;
        bus.mem[0x00FF] = 0x34;
        bus.mem[0x0000] = 0x02;
        bus.mem[0x0234] = 0x5A;

        assert_eq!(run(&mut cpu, &mut bus), 6);
        assert_eq!(cpu.a(), 0x5A);
    }

    #[test]
    fn php_forces_break_and_plp_forces_unused() {
        let (mut cpu, mut bus) = setup(&[0x08, 0x28]);
        cpu.p = FLAG_UNUSED | FLAG_CARRY;

        assert_eq!(run(&mut cpu, &mut bus), 3);
        assert_eq!(bus.mem[0x01FD], FLAG_UNUSED | FLAG_BREAK | FLAG_CARRY);

        bus.mem[0x01FD] = FLAG_NEGATIVE;
        assert_eq!(run(&mut cpu, &mut bus), 4);
        assert_eq!(cpu.status(), FLAG_NEGATIVE | FLAG_UNUSED);
        assert_eq!(cpu.sp(), 0xFD);
    }

    #[test]
    fn brk_and_rti_round_trip() {
        let (mut cpu, mut bus) = setup(&[0x00, 0xFF, 0xEA]);
        bus.mem[0x9000] = 0x40;
        cpu.p = FLAG_UNUSED | FLAG_ZERO;

        assert_eq!(run(&mut cpu, &mut bus), 7);
        assert_eq!(cpu.pc(), 0x9000);
        assert!(cpu.get_flag(FLAG_INTERRUPT));
        assert_eq!(bus.mem[0x01FD], 0x80);
        assert_eq!(bus.mem[0x01FC], 0x01);
        assert_eq!(
            bus.mem[0x01FB],
            FLAG_UNUSED | FLAG_BREAK | FLAG_INTERRUPT | FLAG_ZERO
        );

        assert_eq!(run(&mut cpu, &mut bus), 6);
        assert_eq!(cpu.pc(), 0x8001);
        assert!(cpu.get_flag(FLAG_INTERRUPT));
        assert!(cpu.get_flag(FLAG_ZERO));
    }

    #[test]
    fn jsr_and_rts() {
        let (mut cpu, mut bus) = setup(&[0x20, 0x00, 0x90, 0xEA]);
        bus.mem[0x9000] = 0x60;

        assert_eq!(run(&mut cpu, &mut bus), 6);
        assert_eq!(cpu.pc(), 0x9000);
        assert_eq!(bus.mem[0x01FD], 0x80);
        assert_eq!(bus.mem[0x01FC], 0x02);

        assert_eq!(run(&mut cpu, &mut bus), 6);
        assert_eq!(cpu.pc(), 0x8003);
        assert_eq!(cpu.sp(), 0xFD);
    }

    #[test]
    fn compare_leaves_register_alone() {
        let (mut cpu, mut bus) = setup(&[0xC9, 0x10, 0xC9, 0x20, 0xE0, 0x01, 0xC0, 0x05]);
        cpu.a = 0x10;
        cpu.x = 0x01;
        cpu.y = 0x06;

        run(&mut cpu, &mut bus);
        assert!(cpu.get_flag(FLAG_ZERO));
        assert!(cpu.get_flag(FLAG_CARRY));
        assert!(!cpu.get_flag(FLAG_NEGATIVE));

        run(&mut cpu, &mut bus);
        assert!(!cpu.get_flag(FLAG_ZERO));
        assert!(!cpu.get_flag(FLAG_CARRY));
        assert!(cpu.get_flag(FLAG_NEGATIVE));
        assert_eq!(cpu.a(), 0x10);

        run(&mut cpu, &mut bus);
        assert!(cpu.get_flag(FLAG_ZERO));
        run(&mut cpu, &mut bus);
        assert!(cpu.get_flag(FLAG_CARRY));
        assert!(!cpu.get_flag(FLAG_ZERO));
        assert_eq!(cpu.y(), 0x06);
    }

    #[test]
    fn shifts_on_accumulator_and_memory() {
        let (mut cpu, mut bus) = setup(&[
            0x0A, // ASL A
            0x38, // SEC
            0x66, 0x10, // ROR $10
            0x2A, // ROL A
            0x46, 0x10, // LSR $10
        ]);
        cpu.a = 0x81;
        bus.mem[0x0010] = 0x01;

        assert_eq!(run(&mut cpu, &mut bus), 2);
        assert_eq!(cpu.a(), 0x02);
        assert!(cpu.get_flag(FLAG_CARRY));

        run(&mut cpu, &mut bus);
        assert_eq!(run(&mut cpu, &mut bus), 5);
        assert_eq!(bus.mem[0x0010], 0x80);
        assert!(cpu.get_flag(FLAG_CARRY));
        assert!(cpu.get_flag(FLAG_NEGATIVE));

        run(&mut cpu, &mut bus);
        assert_eq!(cpu.a(), 0x05);
        assert!(!cpu.get_flag(FLAG_CARRY));

        run(&mut cpu, &mut bus);
        assert_eq!(bus.mem[0x0010], 0x40);
        assert!(!cpu.get_flag(FLAG_CARRY));
        assert!(!cpu.get_flag(FLAG_NEGATIVE));
    }

    #[test]
    fn stack_pointer_wraps_within_page() {
        let (mut cpu, mut bus) = setup(&[0x48, 0x68]);
        cpu.sp = 0x00;
        cpu.a = 0x77;

        run(&mut cpu, &mut bus);
        assert_eq!(bus.mem[0x0100], 0x77);
        assert_eq!(cpu.sp(), 0xFF);

        cpu.a = 0;
        assert_eq!(run(&mut cpu, &mut bus), 4);
        assert_eq!(cpu.a(), 0x77);
        assert_eq!(cpu.sp(), 0x00);
    }

    #[test]
    fn illegal_opcode_is_a_timed_nop() {
        let (mut cpu, mut bus) = setup(&[0x03, 0x44, 0xEA]);
        let before = cpu.state();

        assert_eq!(run(&mut cpu, &mut bus), 8);
        assert_eq!(cpu.pc(), 0x8002);
        assert_eq!(
            (cpu.a(), cpu.x(), cpu.y(), cpu.sp(), cpu.status()),
            (before.a, before.x, before.y, before.sp, before.p)
        );
        assert_eq!(cpu.debug_unknown_opcodes(), (1, 0x03, 0x8000));
        assert!(bus.events.iter().any(|e| e == "Unknown opcode $03 @ $8000"));
    }

    #[test]
    fn inc_dec_and_transfers() {
        let (mut cpu, mut bus) = setup(&[
            0xE6, 0x20, // INC $20
            0xC6, 0x21, // DEC $21
            0xA2, 0x80, // LDX #$80
            0x9A, // TXS
            0xBA, // TSX
            0xE8, // INX
            0x8A, // TXA
            0xA8, // TAY
            0x88, // DEY
        ]);
        bus.mem[0x0020] = 0xFF;
        bus.mem[0x0021] = 0x00;

        run(&mut cpu, &mut bus);
        assert_eq!(bus.mem[0x0020], 0x00);
        assert!(cpu.get_flag(FLAG_ZERO));
        run(&mut cpu, &mut bus);
        assert_eq!(bus.mem[0x0021], 0xFF);
        assert!(cpu.get_flag(FLAG_NEGATIVE));

        for _ in 0..6 {
            run(&mut cpu, &mut bus);
        }
        assert_eq!(cpu.sp(), 0x80);
        assert_eq!(cpu.x(), 0x81);
        assert_eq!(cpu.a(), 0x81);
        assert_eq!(cpu.y(), 0x80);
        assert!(cpu.get_flag(FLAG_NEGATIVE));
    }

    #[test]
    fn bit_copies_high_bits() {
        let (mut cpu, mut bus) = setup(&[0x24, 0x30]);
        cpu.a = 0x01;
        bus.mem[0x0030] = 0xC0;

        assert_eq!(run(&mut cpu, &mut bus), 3);
        assert!(cpu.get_flag(FLAG_ZERO));
        assert!(cpu.get_flag(FLAG_NEGATIVE));
        assert!(cpu.get_flag(FLAG_OVERFLOW));
        assert_eq!(cpu.a(), 0x01);
    }

    #[test]
    fn debug_string_describes_next_instruction() {
        let (mut cpu, mut bus) = setup(&[0xA2, 0x05, 0x02]);

        assert_eq!(
            cpu.debug_string(&mut bus),
            "0x8000 0xa2 LDX      A:0x00 X:0x00 Y:0x00 P:0x20 SP:0xfd"
        );

        cpu.clock(&mut bus);
        assert_eq!(cpu.debug_string(&mut bus), "");

        cpu.clock(&mut bus);
        assert_eq!(
            cpu.debug_string(&mut bus),
            "0x8002 0x02 ???      A:0x00 X:0x05 Y:0x00 P:0x20 SP:0xfd"
        );
    }
}
