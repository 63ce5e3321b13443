// Register state capture and restore, for VT switches and teardown.
//
// Restore always writes the bridge before the VGA core. A bridge that is
// slaved to CRT1 at restore time keeps CRT1 exactly as it is: no enable
// change and no reset pulse.

use std::rc::Rc;

use quick_error::quick_error;

use crate::chip::{BridgeFamily, FamilyCaps, QueueKind, TvEncoder};
use crate::hw::regs::{
    CR11_PROTECT, CR_CONNECTION, CR_CRT2_CONTROL, CR_CRT2_TARGET, CR_MODE_NUMBER, CR_RATE_INDEX, CR_TV_EXT,
    CR_VRETRACE_END, MMIO_QUEUE_BASE, MMIO_QUEUE_READ_PTR, MMIO_QUEUE_WRITE_PTR, P4_BRIDGE_ID, P4_REVISION,
    SR_LOCK, SR_RESET,
};
use crate::hw::{Bank, RegisterLock, Regs};
use crate::modes::{dmt_modes, native_mode_lookup, ModeDescriptor};
use crate::context::{DeviceContext, HeadRole};
use crate::switch::{apply_crt1_enable, bridge_slaved, SwitchError, SwitchJob, SwitchStrategy, NATIVE_COMBINED};

#[cfg(test)]
#[path = "./state_test.rs"]
mod state_test;

const DEBUG_STATE: bool = false;

const SR_COUNT: usize = 0x40;
const CR_COUNT: usize = 0x80;
const GR_COUNT: usize = 0x09;
const AR_COUNT: usize = 0x15;
const PART_COUNT: usize = 0x50;
const TV6326_COUNT: usize = 0x50;
const ENCODER_COUNT: usize = 0x80;

quick_error! {
    #[derive(Debug)]
    pub enum SnapshotError {
        Encoding(err: bincode::Error) {
            from()
            display("register snapshot encoding: {}", err)
        }
    }
}

/// Captured register state of one adapter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterSnapshot {
    sr: Vec<u8>,
    cr: Vec<u8>,
    gr: Vec<u8>,
    ar: Vec<u8>,
    misc: u8,
    /// Part1..Part4, empty without a bridge
    parts: Vec<Vec<u8>>,
    tv6326: Option<Vec<u8>>,
    encoder: Option<Vec<u8>>,
    /// MMIO queue base and write pointer
    queue: Option<(u32, u32)>,

    crt1_enable: bool,
    /// CR30, CR31, CR32, CR38
    connection: [u8; 4],
    mode_number: u8,
    rate_index: u8,
}

const PART_BANKS: [Bank; 4] = [Bank::Part1, Bank::Part2, Bank::Part3, Bank::Part4];

fn has_part_banks(bridge: BridgeFamily) -> bool {
    bridge.is_sis_bridge() || bridge.is_lvds() || bridge == BridgeFamily::Chrontel7005 || bridge == BridgeFamily::Chrontel7019
}

fn read_bank(regs: &mut Regs, bank: Bank, count: usize) -> Vec<u8> {
    (0..count).map(|i| regs.read(bank, i as u8)).collect()
}

fn read_connection(regs: &mut Regs) -> [u8; 4] {
    [
        regs.read(Bank::Cr, CR_CRT2_TARGET),
        regs.read(Bank::Cr, CR_CRT2_CONTROL),
        regs.read(Bank::Cr, CR_CONNECTION),
        regs.read(Bank::Cr, CR_TV_EXT),
    ]
}

impl RegisterSnapshot {
    pub fn crt1_enable(&self) -> bool {
        self.crt1_enable
    }

    pub fn connection(&self) -> [u8; 4] {
        self.connection
    }

    pub fn mode_number(&self) -> u8 {
        self.mode_number
    }

    pub fn rate_index(&self) -> u8 {
        self.rate_index
    }

    pub fn register(&self, bank: Bank, index: u8) -> Option<u8> {
        let idx = index as usize;
        match bank {
            Bank::Sr => self.sr.get(idx).cloned(),
            Bank::Cr => self.cr.get(idx).cloned(),
            Bank::Gr => self.gr.get(idx).cloned(),
            Bank::Part1 => self.parts.get(0).and_then(|p| p.get(idx).cloned()),
            Bank::Part2 => self.parts.get(1).and_then(|p| p.get(idx).cloned()),
            Bank::Part3 => self.parts.get(2).and_then(|p| p.get(idx).cloned()),
            Bank::Part4 => self.parts.get(3).and_then(|p| p.get(idx).cloned()),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, SnapshotError> {
        Ok(bincode::deserialize(data)?)
    }
}

/// Captures every register bank the chip family and bridge use. The lock
/// must be held.
pub fn save(regs: &mut Regs, caps: &FamilyCaps, bridge: BridgeFamily) -> RegisterSnapshot {
    let sr = read_bank(regs, Bank::Sr, SR_COUNT);
    let cr = read_bank(regs, Bank::Cr, CR_COUNT);
    let gr = read_bank(regs, Bank::Gr, GR_COUNT);
    let ar = (0..AR_COUNT).map(|i| regs.read_ar(i as u8)).collect();
    let misc = regs.read_misc();

    let parts = if has_part_banks(bridge) {
        PART_BANKS.iter().map(|b| read_bank(regs, *b, PART_COUNT)).collect()
    } else {
        Vec::new()
    };
    let tv6326 = if bridge == BridgeFamily::IntegratedTv {
        Some((0..TV6326_COUNT).map(|i| regs.read_tv6326(i as u8)).collect())
    } else {
        None
    };
    let encoder = match bridge.tv_encoder() {
        Some(TvEncoder::Chrontel7005) | Some(TvEncoder::Chrontel7019) => (0..ENCODER_COUNT)
            .map(|i| regs.encoder_read(i as u8))
            .collect::<Option<Vec<u8>>>(),
        _ => None,
    };
    let queue = match caps.queue {
        Some(QueueKind::MmioQueue) => Some((regs.mmio_in32(MMIO_QUEUE_BASE), regs.mmio_in32(MMIO_QUEUE_WRITE_PTR))),
        _ => None,
    };

    // these may have moved while the banks were read
    let crt1_enable = caps.crt1_switch.read(regs);
    let connection = read_connection(regs);
    let mode_number = regs.read(Bank::Cr, CR_MODE_NUMBER);
    let rate_index = regs.read(Bank::Cr, CR_RATE_INDEX);

    if DEBUG_STATE {
        log::debug!("saved state: CRT1 {}, connection {:02X?}, mode {:02X}", crt1_enable, connection, mode_number);
    }
    RegisterSnapshot {
        sr,
        cr,
        gr,
        ar,
        misc,
        parts,
        tv6326,
        encoder,
        queue,
        crt1_enable,
        connection,
        mode_number,
        rate_index,
    }
}

/// What a restore did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RestoreOutcome {
    /// the bridge was slaved when the restore started, CRT1 was left alone
    pub slaved: bool,
    pub crt1_toggled: bool,
    pub by_set: bool,
}

/// Bridge side: Part banks, external encoder, 6326 TV bank.
fn restore_bridge(regs: &mut Regs, snap: &RegisterSnapshot) {
    for (bank, values) in PART_BANKS.iter().zip(snap.parts.iter()) {
        for (i, val) in values.iter().enumerate() {
            let index = i as u8;
            if *bank == Bank::Part4 && (index == P4_BRIDGE_ID || index == P4_REVISION) {
                continue;
            }
            regs.write(*bank, index, *val);
        }
    }
    if let Some(ref encoder) = snap.encoder {
        for (i, val) in encoder.iter().enumerate() {
            regs.encoder_write(i as u8, *val);
        }
    }
    if let Some(ref tv) = snap.tv6326 {
        for (i, val) in tv.iter().enumerate() {
            regs.write_tv6326(i as u8, *val);
        }
    }
}

/// VGA core. The CRT1 switch bit keeps its current state, CR11 goes last
/// so the protected timing registers can be written.
fn restore_core(regs: &mut Regs, caps: &FamilyCaps, snap: &RegisterSnapshot) {
    for (i, val) in snap.sr.iter().enumerate() {
        let index = i as u8;
        if index == SR_RESET || index == SR_LOCK {
            continue;
        }
        regs.write(Bank::Sr, index, *val);
    }
    for (i, val) in snap.gr.iter().enumerate() {
        regs.write(Bank::Gr, i as u8, *val);
    }
    for (i, val) in snap.ar.iter().enumerate() {
        regs.write_ar(i as u8, *val);
    }
    regs.write_misc(snap.misc);

    let switch = caps.crt1_switch;
    regs.and(Bank::Cr, CR_VRETRACE_END, !CR11_PROTECT);
    for (i, val) in snap.cr.iter().enumerate() {
        let index = i as u8;
        if index == CR_VRETRACE_END {
            continue;
        }
        let val = if index == switch.index() {
            let current = regs.read(Bank::Cr, index);
            switch.encode(*val, switch.decode(current))
        } else {
            *val
        };
        regs.write(Bank::Cr, index, val);
    }
    if let Some(&cr11) = snap.cr.get(CR_VRETRACE_END as usize) {
        regs.write(Bank::Cr, CR_VRETRACE_END, cr11);
    }

    if let Some((base, write_ptr)) = snap.queue {
        regs.mmio_out32(MMIO_QUEUE_BASE, base);
        regs.mmio_out32(MMIO_QUEUE_WRITE_PTR, write_ptr);
        let read_ptr = regs.mmio_in32(MMIO_QUEUE_READ_PTR);
        if read_ptr != write_ptr {
            regs.mmio_out32(MMIO_QUEUE_READ_PTR, write_ptr);
        }
    }
}

fn restore_connection(regs: &mut Regs, snap: &RegisterSnapshot) {
    let [cr30, cr31, cr32, cr38] = snap.connection;
    regs.write(Bank::Cr, CR_CRT2_TARGET, cr30);
    regs.write(Bank::Cr, CR_CRT2_CONTROL, cr31);
    regs.write(Bank::Cr, CR_CONNECTION, cr32);
    regs.write(Bank::Cr, CR_TV_EXT, cr38);
    regs.write(Bank::Cr, CR_RATE_INDEX, snap.rate_index);
    regs.write(Bank::Cr, CR_MODE_NUMBER, snap.mode_number);
}

fn restore_crt1(regs: &mut Regs, caps: &FamilyCaps, snap: &RegisterSnapshot, slaved: bool) -> bool {
    if slaved {
        log::debug!("bridge slaved, CRT1 enable left as is");
        return false;
    }
    apply_crt1_enable(regs, caps, snap.crt1_enable)
}

/// Replays a snapshot: bridge, VGA core, connection registers, then CRT1.
/// The lock must be held.
pub fn restore(regs: &mut Regs, caps: &FamilyCaps, bridge: BridgeFamily, snap: &RegisterSnapshot) -> RestoreOutcome {
    let slaved = bridge_slaved(regs, caps, bridge);
    restore_bridge(regs, snap);
    restore_core(regs, caps, snap);
    restore_connection(regs, snap);
    let crt1_toggled = restore_crt1(regs, caps, snap, slaved);
    RestoreOutcome { slaved, crt1_toggled, by_set: false }
}

/// Timing used to set a native mode id again: the 60 Hz variant of its
/// resolution, or the first one listed.
fn mode_for_id(id: u8) -> Option<(ModeDescriptor, u8)> {
    let (width, height, depth) = native_mode_lookup(id)?;
    let modes: Vec<ModeDescriptor> = dmt_modes().into_iter().filter(|m| m.size() == (width, height)).collect();
    let mut mode = modes
        .iter()
        .find(|m| m.refresh_rounded() == 60)
        .or_else(|| modes.first())
        .cloned()?;
    mode.bios_mode = Some(u16::from(id));
    Some((mode, depth))
}

impl DeviceContext {
    /// Captures the adapter state into the context.
    pub fn save_state(&mut self) -> Result<(), SwitchError> {
        let _guard = self.begin()?;
        let io = Rc::clone(&self.io);
        let mut hw = io.borrow_mut();
        let mut lock = RegisterLock::acquire(Regs::new(&mut *hw, self.ports), self.caps.legacy_lock);
        let snap = save(&mut lock, self.caps, self.detected.bridge);
        log::info!("{:?} head: register state saved, mode {:02X}", self.role, snap.mode_number);
        self.snapshot = Some(snap);
        Ok(())
    }

    /// Writes the saved state back. With restore-by-set the recorded mode
    /// is switched to again through the native path instead of replaying
    /// the VGA core.
    pub fn restore_state(&mut self) -> Result<Option<RestoreOutcome>, SwitchError> {
        let _guard = self.begin()?;
        let snap = match self.snapshot {
            Some(ref s) => s.clone(),
            None => {
                log::warn!("{:?} head: nothing saved to restore", self.role);
                return Ok(None);
            }
        };
        let io = Rc::clone(&self.io);
        let mut hw = io.borrow_mut();
        let mut lock = RegisterLock::acquire(Regs::new(&mut *hw, self.ports), self.caps.legacy_lock);

        let recorded = if self.restore_by_set && self.caps.native_switch {
            mode_for_id(snap.mode_number)
        } else {
            None
        };
        let (mode, depth) = match recorded {
            Some(found) => found,
            None => return Ok(Some(restore(&mut lock, self.caps, self.detected.bridge, &snap))),
        };

        let slaved = bridge_slaved(&mut lock, self.caps, self.detected.bridge);
        restore_bridge(&mut lock, &snap);
        restore_connection(&mut lock, &snap);
        log::info!("{:?} head: restoring by setting {} again", self.role, mode);
        let job = SwitchJob {
            caps: self.caps,
            bridge: self.detected.bridge,
            role: HeadRole::Sole,
            output: &self.output,
            mode: &mode,
            depth,
            pitch: mode.hdisplay,
        };
        let by_set = match NATIVE_COMBINED.switch(&job, &mut lock) {
            Ok(()) => true,
            Err(e) => {
                // CRT1 may be half programmed, replay everything
                log::warn!("{:?} head: setting {} again failed: {}, replaying registers", self.role, mode, e);
                restore_core(&mut lock, self.caps, &snap);
                restore_connection(&mut lock, &snap);
                false
            }
        };
        let crt1_toggled = restore_crt1(&mut lock, self.caps, &snap, slaved);
        Ok(Some(RestoreOutcome { slaved, crt1_toggled, by_set }))
    }
}
