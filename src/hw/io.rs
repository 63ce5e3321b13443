// Register-level access to the adapter.
//
// The adapter exposes relocated VGA index/data pairs (sequencer, CRTC,
// graphics controller, attribute controller), four index/data pairs for the
// video bridge ("Part1".."Part4"), a memory-mapped register window and, on
// Chrontel equipped boards, an encoder reachable over the DDC lines.

use std::cell::RefCell;
use std::rc::Rc;

use crate::bios::BiosRegs;

const DEBUG_IO: bool = false;

/// Low level port/MMIO access, implemented by the platform layer (or by
/// `EmulatedAdapter` in tests).
pub trait Hardware {
    fn in_u8(&mut self, port: u16) -> u8;

    fn out_u8(&mut self, port: u16, data: u8);

    fn mmio_in32(&mut self, offset: u32) -> u32;

    fn mmio_out32(&mut self, offset: u32, data: u32);

    /// busy delay, used for reset pulses
    fn delay_us(&mut self, us: u32);

    /// reads a register of an external TV encoder, None if no encoder answers
    fn encoder_read(&mut self, _reg: u8) -> Option<u8> {
        None
    }

    /// returns true if the encoder acknowledged the write
    fn encoder_write(&mut self, _reg: u8, _data: u8) -> bool {
        false
    }

    /// issues a video BIOS interrupt, returns true if a BIOS handled it
    fn int10(&mut self, _regs: &mut BiosRegs) -> bool {
        false
    }
}

/// Shared handle to the single I/O mapping of a physical device.
pub type IoHandle = Rc<RefCell<dyn Hardware>>;

/// Index/data register banks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Bank {
    /// sequencer
    Sr,
    /// CRT controller
    Cr,
    /// graphics controller
    Gr,
    /// video bridge CRT2 timing/control
    Part1,
    /// video bridge TV encoder
    Part2,
    /// video bridge TV timing
    Part3,
    /// video bridge identification, LCD and misc
    Part4,
}

impl Bank {
    pub fn is_bridge(self) -> bool {
        match self {
            Bank::Part1 | Bank::Part2 | Bank::Part3 | Bank::Part4 => true,
            _ => false,
        }
    }
}

/// Relocated I/O port layout. All ports are offsets from `rel_io`, the
/// relocated I/O base reported by the PCI probe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ports {
    pub rel_io: u16,
}

impl Default for Ports {
    fn default() -> Self {
        // legacy VGA placement: SR at 0x3C4
        Ports { rel_io: 0x380 }
    }
}

impl Ports {
    pub fn new(rel_io: u16) -> Self {
        Ports { rel_io }
    }

    /// returns the (index, data) port pair of a bank
    pub fn pair(&self, bank: Bank) -> (u16, u16) {
        let base = self.rel_io;
        match bank {
            Bank::Part1 => (base + 0x04, base + 0x05),
            Bank::Part2 => (base + 0x10, base + 0x11),
            Bank::Part3 => (base + 0x12, base + 0x13),
            Bank::Part4 => (base + 0x14, base + 0x15),
            Bank::Sr => (base + 0x44, base + 0x45),
            Bank::Gr => (base + 0x4E, base + 0x4F),
            Bank::Cr => (base + 0x54, base + 0x55),
        }
    }

    pub fn attribute_write(&self) -> u16 {
        self.rel_io + 0x40
    }

    pub fn attribute_read(&self) -> u16 {
        self.rel_io + 0x41
    }

    pub fn misc_write(&self) -> u16 {
        self.rel_io + 0x42
    }

    pub fn misc_read(&self) -> u16 {
        self.rel_io + 0x4C
    }

    pub fn input_status(&self) -> u16 {
        self.rel_io + 0x5A
    }
}

/// Indexed register accessor bound to one hardware mapping.
pub struct Regs<'a> {
    hw: &'a mut dyn Hardware,
    ports: Ports,
}

impl<'a> Regs<'a> {
    pub fn new(hw: &'a mut dyn Hardware, ports: Ports) -> Self {
        Regs { hw, ports }
    }

    pub fn ports(&self) -> Ports {
        self.ports
    }

    pub fn read(&mut self, bank: Bank, index: u8) -> u8 {
        let (idx, data) = self.ports.pair(bank);
        self.hw.out_u8(idx, index);
        let val = self.hw.in_u8(data);
        if DEBUG_IO {
            log::trace!("read {:?}{:02X} = {:02X}", bank, index, val);
        }
        val
    }

    pub fn write(&mut self, bank: Bank, index: u8, val: u8) {
        if DEBUG_IO {
            log::trace!("write {:?}{:02X} = {:02X}", bank, index, val);
        }
        let (idx, data) = self.ports.pair(bank);
        self.hw.out_u8(idx, index);
        self.hw.out_u8(data, val);
    }

    /// read-modify-write: (old & and_mask) | or_mask
    pub fn set(&mut self, bank: Bank, index: u8, and_mask: u8, or_mask: u8) {
        let old = self.read(bank, index);
        self.write(bank, index, (old & and_mask) | or_mask);
    }

    pub fn or(&mut self, bank: Bank, index: u8, bits: u8) {
        self.set(bank, index, 0xFF, bits);
    }

    pub fn and(&mut self, bank: Bank, index: u8, mask: u8) {
        self.set(bank, index, mask, 0x00);
    }

    pub fn input_status(&mut self) -> u8 {
        let port = self.ports.input_status();
        self.hw.in_u8(port)
    }

    pub fn read_misc(&mut self) -> u8 {
        let port = self.ports.misc_read();
        self.hw.in_u8(port)
    }

    pub fn write_misc(&mut self, val: u8) {
        let port = self.ports.misc_write();
        self.hw.out_u8(port, val);
    }

    /// Attribute controller access. Reading the input status register
    /// resets the index/data flip-flop; bit 5 of the index keeps the
    /// palette source enabled.
    pub fn read_ar(&mut self, index: u8) -> u8 {
        self.input_status();
        let (w, r) = (self.ports.attribute_write(), self.ports.attribute_read());
        self.hw.out_u8(w, (index & 0x1F) | 0x20);
        self.hw.in_u8(r)
    }

    pub fn write_ar(&mut self, index: u8, val: u8) {
        self.input_status();
        let w = self.ports.attribute_write();
        self.hw.out_u8(w, (index & 0x1F) | 0x20);
        self.hw.out_u8(w, val);
    }

    /// SiS6326 integrated TV encoder, reached through CRE0/CRE1
    pub fn read_tv6326(&mut self, index: u8) -> u8 {
        self.write(Bank::Cr, 0xE0, index);
        self.read(Bank::Cr, 0xE1)
    }

    pub fn write_tv6326(&mut self, index: u8, val: u8) {
        self.write(Bank::Cr, 0xE0, index);
        self.write(Bank::Cr, 0xE1, val);
    }

    pub fn mmio_in32(&mut self, offset: u32) -> u32 {
        self.hw.mmio_in32(offset)
    }

    pub fn mmio_out32(&mut self, offset: u32, data: u32) {
        self.hw.mmio_out32(offset, data)
    }

    pub fn encoder_read(&mut self, reg: u8) -> Option<u8> {
        self.hw.encoder_read(reg)
    }

    pub fn encoder_write(&mut self, reg: u8, data: u8) -> bool {
        self.hw.encoder_write(reg, data)
    }

    pub fn delay_us(&mut self, us: u32) {
        self.hw.delay_us(us)
    }

    pub fn int10(&mut self, regs: &mut BiosRegs) -> bool {
        self.hw.int10(regs)
    }
}
