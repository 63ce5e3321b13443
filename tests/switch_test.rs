use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;

use sisdisplay::bios::{BiosError, VbeModeInfo, VBE_FAILED, VBE_SET_MODE};
use sisdisplay::chip::ChipVariant;
use sisdisplay::hw::{Bank, EmulatedAdapter, IoHandle, Ports};
use sisdisplay::modes::MonitorDescriptor;
use sisdisplay::output::Relation;
use sisdisplay::switch::{StrategyKind, SwitchError, SwitchState};
use sisdisplay::{DeviceContext, Options, ProbeInfo};

const VBE_1024X768X16: VbeModeInfo = VbeModeInfo { mode: 0x117, width: 1024, height: 768, bpp: 16 };
const VBE_800X600X16: VbeModeInfo = VbeModeInfo { mode: 0x114, width: 800, height: 600, bpp: 16 };

fn probe(vbe_modes: Vec<VbeModeInfo>) -> ProbeInfo {
    ProbeInfo {
        pci_id: ChipVariant::Sis650.pci_id(),
        rel_io: 0x380,
        video_memory_kb: 32 * 1024,
        vbe_modes,
        monitor: MonitorDescriptor::default(),
    }
}

fn panel_adapter() -> Rc<RefCell<EmulatedAdapter>> {
    let mut emu = EmulatedAdapter::new(Ports::default());
    emu.attach_bridge(1, 0xB0);
    emu.set_connection(0x20 | 0x08, 0x02, 0x00);
    Rc::new(RefCell::new(emu))
}

fn context(emu: &Rc<RefCell<EmulatedAdapter>>, vbe_modes: Vec<VbeModeInfo>, options: Options) -> DeviceContext {
    let io: IoHandle = emu.clone();
    match DeviceContext::new(io, probe(vbe_modes), options) {
        Ok(ctx) => ctx,
        Err(e) => panic!("bind failed: {}", e),
    }
}

#[test]
fn slaved_bridge_narrows_single_to_mirror() {
    let emu = panel_adapter();
    let opts = Options { force_crt1: Some(false), ..Options::default() };
    let mut ctx = context(&emu, Vec::new(), opts);
    assert_eq!(Relation::Single, ctx.output().relation());
    assert!(!ctx.output().crt1());
    let mode = ctx.catalog().find(800, 600, 60).cloned().unwrap();

    emu.borrow_mut().pin_bridge_status(Some(0x10));
    let report = ctx.set_mode(&mode).unwrap();
    assert!(report.downgraded);
    assert_eq!(Relation::Mirror, report.relation);
    assert_eq!(Relation::Mirror, ctx.output().relation());
    assert!(ctx.output().crt1());
    assert_eq!(Relation::Single, ctx.intended_output().relation());

    // the next switch starts from what was asked for
    emu.borrow_mut().pin_bridge_status(None);
    let report = ctx.set_mode(&mode).unwrap();
    assert!(!report.downgraded);
    assert_eq!(Relation::Single, report.relation);
    assert!(!ctx.output().crt1());
}

#[test]
fn vesa_switch_goes_through_the_bios() {
    let emu = panel_adapter();
    emu.borrow_mut().install_bios(vec![VBE_1024X768X16]);
    let opts = Options { use_vesa: true, ..Options::default() };
    let mut ctx = context(&emu, vec![VBE_1024X768X16, VBE_800X600X16], opts);
    assert_eq!(StrategyKind::Vesa, ctx.strategy_kind());

    let mode = ctx.catalog().find(1024, 768, 60).cloned().unwrap();
    let report = ctx.set_mode(&mode).unwrap();
    assert_eq!("vesa", report.path);
    assert_eq!(Some(0x117), report.bios_mode);
    assert_eq!(Some(0x117), emu.borrow().vbe_mode());
    // the BIOS only mirrors
    assert_eq!(Relation::Mirror, report.relation);
    assert_eq!(None, emu.borrow().scanline());
}

#[test]
fn bios_refusal_keeps_the_current_mode() {
    let emu = panel_adapter();
    emu.borrow_mut().install_bios(vec![VBE_1024X768X16]);
    let opts = Options { use_vesa: true, ..Options::default() };
    let mut ctx = context(&emu, vec![VBE_1024X768X16, VBE_800X600X16], opts);

    let good = ctx.catalog().find(1024, 768, 60).cloned().unwrap();
    ctx.set_mode(&good).unwrap();

    let bad = ctx.catalog().find(800, 600, 60).cloned().unwrap();
    let res = ctx.set_mode(&bad).map(|r| r.path);
    assert_eq!(Err(SwitchError::Bios(BiosError::Rejected(VBE_SET_MODE, VBE_FAILED))), res);
    assert_eq!(Some(good.name.as_str()), ctx.current_mode().map(|m| m.name.as_str()));
    assert_eq!(SwitchState::Idle, ctx.state());
    assert_eq!(Some(0x117), emu.borrow().vbe_mode());
}

#[test]
fn virtual_width_sets_the_scan_line() {
    let emu = panel_adapter();
    emu.borrow_mut().install_bios(vec![VBE_800X600X16]);
    let opts = Options { use_vesa: true, virtual_width: Some(1024), ..Options::default() };
    let mut ctx = context(&emu, vec![VBE_800X600X16], opts);

    let mode = ctx.catalog().find(800, 600, 60).cloned().unwrap();
    ctx.set_mode(&mode).unwrap();
    assert_eq!(Some(1024), emu.borrow().scanline());
}

#[test]
fn native_switch_records_the_mode_number() {
    let emu = panel_adapter();
    let mut ctx = context(&emu, Vec::new(), Options::default());
    let mode = ctx.catalog().find(1024, 768, 60).cloned().unwrap();
    let report = ctx.set_mode(&mode).unwrap();
    assert_eq!("native", report.path);
    assert_eq!(Some(0x4A), report.bios_mode);
    assert_eq!(0x4A, emu.borrow().reg(Bank::Cr, 0x34));
    assert_eq!(0x22, emu.borrow().reg(Bank::Cr, 0x33));
    assert_eq!(Some(0x4A), ctx.current_mode().and_then(|m| m.bios_mode));
}
