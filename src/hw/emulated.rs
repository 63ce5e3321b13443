// An in-memory SiS adapter used by the tests and benchmarks.
//
// Models the relocated index/data banks, the SR05/CR80 lock gate, the CR11
// write protection, the attribute controller flip-flop, vertical retrace on
// input status 1, the synchronous reset pulse, the SiS6326 TV registers,
// a Chrontel encoder on the DDC side channel and a minimal VBE BIOS.

use std::collections::HashMap;

use crate::bios::{BiosRegs, VbeModeInfo, VBE_FAILED, VBE_SCANLINE, VBE_SET_MODE, VBE_SUCCESS};
use crate::hw::io::{Bank, Hardware, Ports};
use crate::hw::regs::{
    CR11_PROTECT, CR_LEGACY_LOCK, CR_MODE_NUMBER, CR_VRETRACE_END, P1_MODE_CONTROL, RESET_RUN, RESET_SYNC,
    SR_LOCK, SR_RESET, STATUS_VRETRACE, UNLOCKED, UNLOCK_CODE,
};

const BANKS: [Bank; 7] = [Bank::Sr, Bank::Cr, Bank::Gr, Bank::Part1, Bank::Part2, Bank::Part3, Bank::Part4];

/// lock register readback while locked
const LOCKED: u8 = 0x21;

/// input status reads per emulated frame
const FRAME_READS: u32 = 8;

/// Part1 00h value a VBE BIOS leaves behind: bridge slaved to CRT1
const BIOS_SLAVE_STATUS: u8 = 0x30;

/// One accepted register write, in bus order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegWrite {
    pub bank: Bank,
    pub index: u8,
    pub value: u8,
}

pub struct EmulatedAdapter {
    ports: Ports,
    banks: HashMap<Bank, [u8; 256]>,
    indices: HashMap<Bank, u8>,

    ar: [u8; 32],
    ar_index: u8,
    ar_data_next: bool,
    misc: u8,

    tv6326: [u8; 256],
    encoder: Option<[u8; 256]>,
    mmio: HashMap<u32, u32>,

    seq_unlocked: bool,
    legacy_unlocked: bool,
    refuse_unlock: bool,
    bridge_status: Option<u8>,

    status_reads: u32,
    retrace: Option<bool>,

    in_reset: bool,
    reset_pulses: u32,
    delayed_us: u64,

    bios: Option<Vec<VbeModeInfo>>,
    vbe_mode: Option<u16>,
    scanline: Option<u16>,
    bios_calls: u32,

    log: Vec<RegWrite>,
}

impl EmulatedAdapter {
    /// A powered-up adapter as left by the system BIOS: extensions locked,
    /// CRT1 running with a monitor attached, no bridge.
    pub fn new(ports: Ports) -> Self {
        let mut banks = HashMap::new();
        let mut indices = HashMap::new();
        for bank in BANKS.iter() {
            banks.insert(*bank, [0u8; 256]);
            indices.insert(*bank, 0u8);
        }
        let mut emu = EmulatedAdapter {
            ports,
            banks,
            indices,
            ar: [0; 32],
            ar_index: 0,
            ar_data_next: false,
            misc: 0x67,
            tv6326: [0; 256],
            encoder: None,
            mmio: HashMap::new(),
            seq_unlocked: false,
            legacy_unlocked: false,
            refuse_unlock: false,
            bridge_status: None,
            status_reads: 0,
            retrace: None,
            in_reset: false,
            reset_pulses: 0,
            delayed_us: 0,
            bios: None,
            vbe_mode: None,
            scanline: None,
            bios_calls: 0,
            log: Vec::new(),
        };
        emu.set_reg(Bank::Sr, SR_RESET, RESET_RUN);
        emu.set_reg(Bank::Sr, 0x01, 0x01);
        emu.set_reg(Bank::Cr, CR_VRETRACE_END, 0x8E);
        emu.set_reg(Bank::Cr, 0x17, 0xA3);
        emu.set_reg(Bank::Cr, 0x32, 0x20);
        emu
    }

    /// raw register value, without bus side effects
    pub fn reg(&self, bank: Bank, index: u8) -> u8 {
        self.banks.get(&bank).map_or(0, |regs| regs[index as usize])
    }

    /// raw register store, bypasses locks and the write log
    pub fn set_reg(&mut self, bank: Bank, index: u8, val: u8) {
        if let Some(regs) = self.banks.get_mut(&bank) {
            regs[index as usize] = val;
        }
    }

    pub fn ar(&self, index: u8) -> u8 {
        self.ar[(index & 0x1F) as usize]
    }

    pub fn misc(&self) -> u8 {
        self.misc
    }

    pub fn tv6326_reg(&self, index: u8) -> u8 {
        self.tv6326[index as usize]
    }

    pub fn set_tv6326_reg(&mut self, index: u8, val: u8) {
        self.tv6326[index as usize] = val;
    }

    /// puts a Chrontel encoder on the DDC side channel
    pub fn attach_encoder(&mut self) {
        self.encoder = Some([0; 256]);
    }

    pub fn encoder_reg(&self, reg: u8) -> Option<u8> {
        self.encoder.map(|regs| regs[reg as usize])
    }

    /// a SiS 30x bridge with the given Part4 id and revision
    pub fn attach_bridge(&mut self, id: u8, revision: u8) {
        self.set_reg(Bank::Part4, 0x00, id);
        self.set_reg(Bank::Part4, 0x01, revision);
    }

    /// BIOS-reported CR32 connection bits, CR36 panel type and CR37 encoder
    pub fn set_connection(&mut self, cr32: u8, cr36: u8, cr37: u8) {
        self.set_reg(Bank::Cr, 0x32, cr32);
        self.set_reg(Bank::Cr, 0x36, cr36);
        self.set_reg(Bank::Cr, 0x37, cr37);
    }

    /// installs a VBE BIOS reporting the given modes
    pub fn install_bios(&mut self, modes: Vec<VbeModeInfo>) {
        self.bios = Some(modes);
    }

    /// lock register readback never reports unlocked
    pub fn refuse_unlock(&mut self, refuse: bool) {
        self.refuse_unlock = refuse;
    }

    /// pins the Part1 00h readback, as a bridge that switches itself into
    /// slave mode would report
    pub fn pin_bridge_status(&mut self, status: Option<u8>) {
        self.bridge_status = status;
    }

    /// Some(true) stays in retrace, Some(false) never retraces
    pub fn stick_retrace(&mut self, retrace: Option<bool>) {
        self.retrace = retrace;
    }

    pub fn is_unlocked(&self) -> bool {
        self.seq_unlocked
    }

    pub fn is_legacy_unlocked(&self) -> bool {
        self.legacy_unlocked
    }

    pub fn reset_pulses(&self) -> u32 {
        self.reset_pulses
    }

    pub fn delayed_us(&self) -> u64 {
        self.delayed_us
    }

    pub fn vbe_mode(&self) -> Option<u16> {
        self.vbe_mode
    }

    pub fn scanline(&self) -> Option<u16> {
        self.scanline
    }

    pub fn bios_calls(&self) -> u32 {
        self.bios_calls
    }

    pub fn mmio(&self, offset: u32) -> u32 {
        self.mmio.get(&offset).cloned().unwrap_or(0)
    }

    pub fn write_log(&self) -> &[RegWrite] {
        &self.log
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    /// position of the first logged write to a bank
    pub fn first_write(&self, bank: Bank) -> Option<usize> {
        self.log.iter().position(|w| w.bank == bank)
    }

    fn decode(&self, port: u16) -> Option<(Bank, bool)> {
        for bank in BANKS.iter() {
            let (idx, data) = self.ports.pair(*bank);
            if port == idx {
                return Some((*bank, true));
            }
            if port == data {
                return Some((*bank, false));
            }
        }
        None
    }

    fn lock_readback(&self, unlocked: bool) -> u8 {
        if unlocked && !self.refuse_unlock {
            UNLOCKED
        } else {
            LOCKED
        }
    }

    fn read_bank(&mut self, bank: Bank) -> u8 {
        let index = self.indices.get(&bank).cloned().unwrap_or(0);
        match (bank, index) {
            (Bank::Sr, SR_LOCK) => self.lock_readback(self.seq_unlocked),
            (Bank::Cr, CR_LEGACY_LOCK) => self.lock_readback(self.legacy_unlocked),
            (Bank::Cr, 0xE1) => {
                let tv_index = self.reg(Bank::Cr, 0xE0);
                self.tv6326[tv_index as usize]
            }
            (Bank::Part1, P1_MODE_CONTROL) => match self.bridge_status {
                Some(status) => status,
                None => self.reg(bank, index),
            },
            _ => self.reg(bank, index),
        }
    }

    fn writable(&self, bank: Bank, index: u8) -> bool {
        match bank {
            Bank::Sr => index < 0x05 || self.seq_unlocked,
            Bank::Cr => {
                if index < 0x08 {
                    self.reg(Bank::Cr, CR_VRETRACE_END) & CR11_PROTECT == 0
                } else if index < 0x19 {
                    true
                } else {
                    self.seq_unlocked || self.legacy_unlocked
                }
            }
            Bank::Gr => true,
            _ => self.seq_unlocked,
        }
    }

    fn write_bank(&mut self, bank: Bank, val: u8) {
        let index = self.indices.get(&bank).cloned().unwrap_or(0);
        match (bank, index) {
            (Bank::Sr, SR_LOCK) => {
                self.seq_unlocked = val == UNLOCK_CODE && !self.refuse_unlock;
                return;
            }
            (Bank::Cr, CR_LEGACY_LOCK) => {
                self.legacy_unlocked = val == UNLOCK_CODE;
                return;
            }
            _ => {}
        }
        if !self.writable(bank, index) {
            return;
        }
        if bank == Bank::Sr && index == SR_RESET {
            if val == RESET_SYNC {
                self.in_reset = true;
            } else if val == RESET_RUN && self.in_reset {
                self.in_reset = false;
                self.reset_pulses += 1;
            }
        }
        if bank == Bank::Cr && index == 0xE1 {
            let tv_index = self.reg(Bank::Cr, 0xE0);
            self.tv6326[tv_index as usize] = val;
        }
        self.set_reg(bank, index, val);
        self.log.push(RegWrite { bank, index, value: val });
    }

    fn input_status(&mut self) -> u8 {
        self.ar_data_next = false;
        let in_retrace = match self.retrace {
            Some(r) => r,
            None => {
                self.status_reads = self.status_reads.wrapping_add(1);
                self.status_reads % FRAME_READS >= FRAME_READS - 2
            }
        };
        if in_retrace {
            STATUS_VRETRACE
        } else {
            0
        }
    }

    fn vbe_set_mode(&mut self, regs: &mut BiosRegs) {
        let mode = regs.bx & 0x3FFF;
        let known = self
            .bios
            .as_ref()
            .map_or(false, |modes| modes.iter().any(|m| m.mode == mode));
        if !known {
            regs.ax = VBE_FAILED;
            return;
        }
        self.vbe_mode = Some(mode);
        self.set_reg(Bank::Cr, CR_MODE_NUMBER, (mode & 0xFF) as u8);
        // the BIOS only drives the bridge slaved to CRT1
        if self.reg(Bank::Part4, 0x00) != 0 {
            self.set_reg(Bank::Part1, P1_MODE_CONTROL, BIOS_SLAVE_STATUS);
        }
        regs.ax = VBE_SUCCESS;
    }
}

impl Hardware for EmulatedAdapter {
    fn in_u8(&mut self, port: u16) -> u8 {
        if port == self.ports.input_status() {
            return self.input_status();
        }
        if port == self.ports.misc_read() {
            return self.misc;
        }
        if port == self.ports.attribute_read() {
            return self.ar[self.ar_index as usize];
        }
        match self.decode(port) {
            Some((bank, true)) => self.indices.get(&bank).cloned().unwrap_or(0),
            Some((bank, false)) => self.read_bank(bank),
            None => 0xFF,
        }
    }

    fn out_u8(&mut self, port: u16, data: u8) {
        if port == self.ports.misc_write() {
            self.misc = data;
            return;
        }
        if port == self.ports.attribute_write() {
            if self.ar_data_next {
                self.ar[self.ar_index as usize] = data;
            } else {
                self.ar_index = data & 0x1F;
            }
            self.ar_data_next = !self.ar_data_next;
            return;
        }
        match self.decode(port) {
            Some((bank, true)) => {
                self.indices.insert(bank, data);
            }
            Some((bank, false)) => self.write_bank(bank, data),
            None => {}
        }
    }

    fn mmio_in32(&mut self, offset: u32) -> u32 {
        self.mmio(offset)
    }

    fn mmio_out32(&mut self, offset: u32, data: u32) {
        self.mmio.insert(offset, data);
    }

    fn delay_us(&mut self, us: u32) {
        self.delayed_us += u64::from(us);
    }

    fn encoder_read(&mut self, reg: u8) -> Option<u8> {
        self.encoder_reg(reg)
    }

    fn encoder_write(&mut self, reg: u8, data: u8) -> bool {
        match self.encoder.as_mut() {
            Some(regs) => {
                regs[reg as usize] = data;
                true
            }
            None => false,
        }
    }

    fn int10(&mut self, regs: &mut BiosRegs) -> bool {
        if self.bios.is_none() {
            return false;
        }
        self.bios_calls += 1;
        match regs.ax {
            VBE_SET_MODE => self.vbe_set_mode(regs),
            VBE_SCANLINE => match regs.bl() {
                0x00 => {
                    self.scanline = Some(regs.cx);
                    regs.bx = regs.cx;
                    regs.ax = VBE_SUCCESS;
                }
                0x01 => {
                    let pixels = self.scanline.unwrap_or(0);
                    regs.cx = pixels;
                    regs.bx = pixels;
                    regs.ax = VBE_SUCCESS;
                }
                _ => regs.ax = VBE_FAILED,
            },
            _ => regs.ax = VBE_FAILED,
        }
        true
    }
}
