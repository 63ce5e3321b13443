use pretty_assertions::assert_eq;

use crate::chip::{caps, BridgeFamily, ChipFamily};
use crate::context::HeadRole;
use crate::hw::regs::{TV6326_ATTACH, TV6326_CONTROL, TV6326_PRESENT};
use crate::hw::{Bank, EmulatedAdapter, Ports, RegisterLock, Regs};
use crate::modes::dmt_modes;
use crate::output::{Crt2Device, OutputConfig, TvPlug, TvStandard};
use crate::switch::legacy::LEGACY;
use crate::switch::strategy::{SwitchJob, SwitchStrategy};

fn tv_output() -> OutputConfig {
    OutputConfig::mirror(Crt2Device::Tv { standard: TvStandard::Ntsc, plug: TvPlug::Composite })
}

fn switch(emu: &mut EmulatedAdapter, bridge: BridgeFamily, output: &OutputConfig) {
    let mode = &dmt_modes()[0];
    let job = SwitchJob {
        caps: caps(ChipFamily::Old),
        bridge,
        role: HeadRole::Sole,
        output,
        mode,
        depth: 8,
        pitch: 640,
    };
    let mut lock = RegisterLock::acquire(Regs::new(emu, Ports::default()), true);
    LEGACY.switch(&job, &mut lock).unwrap();
}

/// values written to the 6326 TV control register, in order
fn tv_control_writes(emu: &EmulatedAdapter) -> Vec<(usize, u8)> {
    let log = emu.write_log();
    let mut out = Vec::new();
    for (i, w) in log.iter().enumerate() {
        if w.bank == Bank::Cr && w.index == 0xE1 && i > 0 {
            let prev = log[i - 1];
            if prev.bank == Bank::Cr && prev.index == 0xE0 && prev.value == TV6326_CONTROL {
                out.push((i, w.value));
            }
        }
    }
    out
}

#[test]
fn tv_is_detached_around_the_crtc_writes() {
    let mut emu = EmulatedAdapter::new(Ports::default());
    emu.set_tv6326_reg(TV6326_CONTROL, TV6326_PRESENT | TV6326_ATTACH);
    switch(&mut emu, BridgeFamily::IntegratedTv, &tv_output());

    let writes = tv_control_writes(&emu);
    assert_eq!(2, writes.len());
    let (detach_at, detached) = writes[0];
    let (attach_at, attached) = writes[1];
    assert_eq!(TV6326_PRESENT, detached);
    assert_eq!(TV6326_PRESENT | TV6326_ATTACH, attached);

    let first_crtc = emu
        .write_log()
        .iter()
        .position(|w| w.bank == Bank::Cr && w.index == 0x00)
        .unwrap();
    assert!(detach_at < first_crtc);
    assert!(first_crtc < attach_at);
    assert_eq!(TV6326_PRESENT | TV6326_ATTACH, emu.tv6326_reg(TV6326_CONTROL));
}

#[test]
fn missing_retrace_does_not_hang() {
    let mut emu = EmulatedAdapter::new(Ports::default());
    emu.set_tv6326_reg(TV6326_CONTROL, TV6326_PRESENT | TV6326_ATTACH);
    emu.stick_retrace(Some(false));
    switch(&mut emu, BridgeFamily::IntegratedTv, &tv_output());
    assert_eq!(TV6326_PRESENT | TV6326_ATTACH, emu.tv6326_reg(TV6326_CONTROL));
}

#[test]
fn no_workaround_without_tv() {
    let mut emu = EmulatedAdapter::new(Ports::default());
    emu.set_tv6326_reg(TV6326_CONTROL, TV6326_PRESENT);
    switch(&mut emu, BridgeFamily::IntegratedTv, &tv_output());
    assert!(tv_control_writes(&emu).is_empty());

    let mut emu = EmulatedAdapter::new(Ports::default());
    switch(&mut emu, BridgeFamily::None, &OutputConfig::crt1_only());
    assert!(tv_control_writes(&emu).is_empty());
    assert_eq!(0x5F, emu.reg(Bank::Cr, 0x00));
}
