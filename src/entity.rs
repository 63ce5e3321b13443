// The Entity: state shared by the two heads of one physical adapter.
//
// It owns the I/O mapping, the options both heads must agree on, the video
// memory partition, the shared TV parameter cache and the busy flag that
// keeps register sequences of the two heads from interleaving. Each head
// holds an `Rc` to it, the Entity goes away with the last head.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::chip::{caps, ChipVariant, QueueKind};
use crate::context::{HeadRole, ProbeInfo};
use crate::hw::IoHandle;
use crate::options::{Options, QueueMode};
use crate::output::{BindError, TvStandard};
use crate::switch::{SwitchError, QUEUE_SIZE_KB};
use crate::tv::TvParamSet;

#[cfg(test)]
#[path = "./entity_test.rs"]
mod entity_test;

/// cursor area, reserved below the command queue
pub const CURSOR_SIZE_KB: u32 = 64;
/// head slices are aligned to this
const SLICE_ALIGN: u32 = 64 * 1024;

/// Options that must be identical on both heads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SharedOptions {
    pub hw_cursor: bool,
    pub queue_mode: QueueMode,
    pub panel_delay_compensation: Option<u8>,
    pub tv_standard: Option<TvStandard>,
}

impl SharedOptions {
    pub fn from_options(opts: &Options) -> Self {
        SharedOptions {
            hw_cursor: opts.hw_cursor,
            queue_mode: opts.queue_mode,
            panel_delay_compensation: opts.panel_delay_compensation,
            tv_standard: opts.force_tv_standard,
        }
    }

    /// Overrides a head's options with the shared ones, warning about
    /// every value that differed.
    pub fn apply(&self, opts: &mut Options) {
        if opts.hw_cursor != self.hw_cursor {
            log::warn!("hw_cursor differs between heads, using {}", self.hw_cursor);
            opts.hw_cursor = self.hw_cursor;
        }
        if opts.queue_mode != self.queue_mode {
            log::warn!("queue_mode differs between heads, using {:?}", self.queue_mode);
            opts.queue_mode = self.queue_mode;
        }
        if opts.panel_delay_compensation != self.panel_delay_compensation {
            log::warn!("panel_delay_compensation differs between heads, using {:?}", self.panel_delay_compensation);
            opts.panel_delay_compensation = self.panel_delay_compensation;
        }
        if opts.force_tv_standard != self.tv_standard {
            log::warn!("force_tv_standard differs between heads, using {:?}", self.tv_standard);
            opts.force_tv_standard = self.tv_standard;
        }
    }
}

/// A range of video memory, in bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemorySlice {
    pub offset: u32,
    pub size: u32,
}

impl MemorySlice {
    pub fn end(&self) -> u32 {
        self.offset + self.size
    }

    pub fn overlaps(&self, other: &MemorySlice) -> bool {
        self.size != 0 && other.size != 0 && self.offset < other.end() && other.offset < self.end()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoryPartition {
    /// CRT2 head, or the only head
    pub master: MemorySlice,
    /// CRT1 head in dual head, empty otherwise
    pub slave: MemorySlice,
    pub cursor: MemorySlice,
    pub queue: Option<MemorySlice>,
}

/// Reserves the queue and the cursor at the top of video memory and splits
/// the rest between the heads.
pub fn partition_memory(video_memory_kb: u32, queue: Option<QueueKind>, split: bool) -> MemoryPartition {
    let total = video_memory_kb * 1024;
    let mut top = total;
    let queue = queue.map(|_| {
        let size = QUEUE_SIZE_KB * 1024;
        top = top.saturating_sub(size);
        MemorySlice { offset: top, size: total - top }
    });
    let cursor_size = CURSOR_SIZE_KB * 1024;
    let cursor_top = top;
    top = top.saturating_sub(cursor_size);
    let cursor = MemorySlice { offset: top, size: cursor_top - top };

    let usable = top & !(SLICE_ALIGN - 1);
    let (master, slave) = if split {
        let half = (usable / 2) & !(SLICE_ALIGN - 1);
        (MemorySlice { offset: 0, size: half }, MemorySlice { offset: half, size: half })
    } else {
        (MemorySlice { offset: 0, size: usable }, MemorySlice::default())
    };
    MemoryPartition { master, slave, cursor, queue }
}

/// Holds the busy flag for the duration of one register sequence.
pub struct SequenceGuard {
    flag: Rc<Cell<bool>>,
}

impl SequenceGuard {
    pub fn enter(flag: &Rc<Cell<bool>>) -> Result<SequenceGuard, SwitchError> {
        if flag.get() {
            return Err(SwitchError::Busy);
        }
        flag.set(true);
        Ok(SequenceGuard { flag: Rc::clone(flag) })
    }
}

impl Drop for SequenceGuard {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

pub struct Entity {
    io: IoHandle,
    chip: ChipVariant,
    shared: SharedOptions,
    partition: MemoryPartition,
    tv: TvParamSet,
    // held by the bound head, cleared when it drops
    master_bound: Rc<Cell<bool>>,
    slave_bound: Rc<Cell<bool>>,
    busy: Rc<Cell<bool>>,
}

impl Entity {
    /// Creates the Entity of a dual head capable adapter. The first head's
    /// options become the shared options.
    pub fn new(io: IoHandle, probe: &ProbeInfo, options: &Options) -> Result<Rc<RefCell<Entity>>, BindError> {
        let chip = ChipVariant::from_pci_id(probe.pci_id).ok_or(BindError::UnknownChip(probe.pci_id))?;
        let family_caps = caps(chip.family());
        if !family_caps.dual_head {
            return Err(BindError::DualHeadUnsupported(chip));
        }
        let partition = partition_memory(probe.video_memory_kb, family_caps.queue, true);
        log::info!(
            "{} dual head: master {:?}, slave {:?}",
            chip,
            partition.master,
            partition.slave
        );
        Ok(Rc::new(RefCell::new(Entity {
            io,
            chip,
            shared: SharedOptions::from_options(options),
            partition,
            tv: TvParamSet::default(),
            master_bound: Rc::new(Cell::new(false)),
            slave_bound: Rc::new(Cell::new(false)),
            busy: Rc::new(Cell::new(false)),
        })))
    }

    pub fn io(&self) -> IoHandle {
        Rc::clone(&self.io)
    }

    pub fn chip(&self) -> ChipVariant {
        self.chip
    }

    pub fn shared(&self) -> &SharedOptions {
        &self.shared
    }

    pub fn partition(&self) -> MemoryPartition {
        self.partition
    }

    pub fn slice_for(&self, role: HeadRole) -> MemorySlice {
        match role {
            HeadRole::Slave => self.partition.slave,
            _ => self.partition.master,
        }
    }

    pub fn tv(&self) -> &TvParamSet {
        &self.tv
    }

    pub fn tv_mut(&mut self) -> &mut TvParamSet {
        &mut self.tv
    }

    /// Seeds the shared TV cache with configured values, first head wins.
    pub(crate) fn seed_tv(&mut self, initial: &TvParamSet) {
        for (param, value) in initial.iter() {
            if self.tv.get(param).is_none() {
                self.tv.set(param, value);
            }
        }
    }

    pub fn busy_flag(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.busy)
    }

    pub fn heads_bound(&self) -> usize {
        self.master_bound.get() as usize + self.slave_bound.get() as usize
    }

    pub fn is_bound(&self, role: HeadRole) -> bool {
        match role {
            HeadRole::Master => self.master_bound.get(),
            HeadRole::Slave => self.slave_bound.get(),
            HeadRole::Sole => false,
        }
    }

    /// Marks the role bound and hands out its slot, the head clears it on
    /// release without borrowing the Entity.
    pub(crate) fn bind_head(&self, role: HeadRole) -> Result<Rc<Cell<bool>>, BindError> {
        let slot = match role {
            HeadRole::Master => &self.master_bound,
            HeadRole::Slave => &self.slave_bound,
            HeadRole::Sole => return Err(BindError::TooManyHeads),
        };
        if slot.get() {
            return Err(BindError::TooManyHeads);
        }
        slot.set(true);
        Ok(Rc::clone(slot))
    }
}
