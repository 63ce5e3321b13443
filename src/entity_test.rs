use std::cell::{Cell, RefCell};
use std::rc::Rc;

use pretty_assertions::assert_eq;

use crate::chip::{ChipVariant, QueueKind};
use crate::context::{DeviceContext, HeadRole, ProbeInfo};
use crate::entity::{partition_memory, Entity, MemorySlice, SequenceGuard, SharedOptions, CURSOR_SIZE_KB};
use crate::hw::{EmulatedAdapter, IoHandle, Ports};
use crate::modes::MonitorDescriptor;
use crate::options::{Options, QueueMode};
use crate::output::{BindError, TvStandard};
use crate::switch::{SwitchError, QUEUE_SIZE_KB};
use crate::tv::{TvParam, TvParamSet};

fn probe(chip: ChipVariant) -> ProbeInfo {
    ProbeInfo {
        pci_id: chip.pci_id(),
        rel_io: 0x380,
        video_memory_kb: 32 * 1024,
        vbe_modes: Vec::new(),
        monitor: MonitorDescriptor::default(),
    }
}

fn io() -> IoHandle {
    Rc::new(RefCell::new(EmulatedAdapter::new(Ports::default())))
}

#[test]
fn dual_head_partition_is_disjoint() {
    let p = partition_memory(32 * 1024, Some(QueueKind::MmioQueue), true);
    let queue = p.queue.unwrap();
    assert_eq!(MemorySlice { offset: (32 * 1024 - QUEUE_SIZE_KB) * 1024, size: QUEUE_SIZE_KB * 1024 }, queue);
    assert_eq!(queue.offset - CURSOR_SIZE_KB * 1024, p.cursor.offset);

    assert_eq!(MemorySlice { offset: 0, size: 16064 * 1024 }, p.master);
    assert_eq!(MemorySlice { offset: 16064 * 1024, size: 16064 * 1024 }, p.slave);
    assert!(!p.master.overlaps(&p.slave));
    assert!(!p.slave.overlaps(&p.cursor));
    assert!(!p.cursor.overlaps(&queue));
    assert_eq!(0, p.slave.offset % (64 * 1024));
}

#[test]
fn single_head_partition_keeps_everything_below_the_cursor() {
    let p = partition_memory(8 * 1024, None, false);
    assert_eq!(None, p.queue);
    assert_eq!(MemorySlice { offset: (8 * 1024 - CURSOR_SIZE_KB) * 1024, size: CURSOR_SIZE_KB * 1024 }, p.cursor);
    assert_eq!(MemorySlice { offset: 0, size: p.cursor.offset }, p.master);
    assert_eq!(0, p.slave.size);
}

#[test]
fn entity_needs_a_dual_head_chip() {
    let res = Entity::new(io(), &probe(ChipVariant::Sis6326), &Options::default());
    match res {
        Err(e) => assert_eq!(BindError::DualHeadUnsupported(ChipVariant::Sis6326), e),
        Ok(_) => panic!("6326 accepted as dual head"),
    }

    let res = Entity::new(io(), &ProbeInfo { pci_id: 0x1234, ..probe(ChipVariant::Sis650) }, &Options::default());
    match res {
        Err(e) => assert_eq!(BindError::UnknownChip(0x1234), e),
        Ok(_) => panic!("unknown chip accepted"),
    }
}

#[test]
fn each_role_binds_once() {
    let ent = Entity::new(io(), &probe(ChipVariant::Sis315H), &Options::default()).unwrap();
    let ent = ent.borrow();
    let master = ent.bind_head(HeadRole::Master).unwrap();
    assert_eq!(Err(BindError::TooManyHeads), ent.bind_head(HeadRole::Master));
    assert_eq!(Err(BindError::TooManyHeads), ent.bind_head(HeadRole::Sole));
    assert!(ent.bind_head(HeadRole::Slave).is_ok());
    assert_eq!(2, ent.heads_bound());

    master.set(false);
    assert_eq!(1, ent.heads_bound());
    assert!(!ent.is_bound(HeadRole::Master));
    assert!(ent.is_bound(HeadRole::Slave));
}

#[test]
fn dropped_head_frees_its_role_while_the_entity_is_borrowed() {
    let mut emu = EmulatedAdapter::new(Ports::default());
    emu.attach_bridge(1, 0xB0);
    emu.set_connection(0x20 | 0x08, 0x02, 0x00);
    let emu: IoHandle = Rc::new(RefCell::new(emu));
    let ent = Entity::new(emu, &probe(ChipVariant::Sis315H), &Options::default()).unwrap();
    let master = DeviceContext::bind(&ent, HeadRole::Master, probe(ChipVariant::Sis315H), Options::default()).unwrap();
    {
        let _held = ent.borrow_mut();
        drop(master);
    }
    assert!(!ent.borrow().is_bound(HeadRole::Master));
    assert!(DeviceContext::bind(&ent, HeadRole::Master, probe(ChipVariant::Sis315H), Options::default()).is_ok());
}

#[test]
fn slices_follow_the_role() {
    let ent = Entity::new(io(), &probe(ChipVariant::Sis630), &Options::default()).unwrap();
    let ent = ent.borrow();
    assert_eq!(ent.partition().master, ent.slice_for(HeadRole::Master));
    assert_eq!(ent.partition().slave, ent.slice_for(HeadRole::Slave));
}

#[test]
fn sequence_guard_refuses_nesting() {
    let flag = Rc::new(Cell::new(false));
    {
        let _outer = SequenceGuard::enter(&flag).unwrap();
        assert!(flag.get());
        match SequenceGuard::enter(&flag) {
            Err(e) => assert_eq!(SwitchError::Busy, e),
            Ok(_) => panic!("nested sequence entered"),
        }
    }
    assert!(!flag.get());
    assert!(SequenceGuard::enter(&flag).is_ok());
}

#[test]
fn shared_options_win() {
    let first = Options {
        hw_cursor: false,
        queue_mode: QueueMode::Vram,
        force_tv_standard: Some(TvStandard::Pal),
        ..Options::default()
    };
    let shared = SharedOptions::from_options(&first);

    let mut second = Options::default();
    shared.apply(&mut second);
    assert_eq!(false, second.hw_cursor);
    assert_eq!(QueueMode::Vram, second.queue_mode);
    assert_eq!(Some(TvStandard::Pal), second.force_tv_standard);
    assert_eq!(None, second.panel_delay_compensation);
}

#[test]
fn first_seeded_tv_value_wins() {
    let ent = Entity::new(io(), &probe(ChipVariant::Sis650), &Options::default()).unwrap();
    let mut ent = ent.borrow_mut();

    let mut a = TvParamSet::default();
    a.set(TvParam::Saturation, 3);
    ent.seed_tv(&a);

    let mut b = TvParamSet::default();
    b.set(TvParam::Saturation, 9);
    b.set(TvParam::Edge, 4);
    ent.seed_tv(&b);

    assert_eq!(Some(3), ent.tv().get(TvParam::Saturation));
    assert_eq!(Some(4), ent.tv().get(TvParam::Edge));
}
