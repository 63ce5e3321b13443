use pretty_assertions::assert_eq;

use crate::hw::regs::{CR11_PROTECT, CR17_CRT1_ENABLE};
use crate::hw::{Bank, EmulatedAdapter, Ports, RegisterLock, Regs};
use crate::modes::dmt_modes;
use crate::switch::crtc::{color_mode, misc_output, VgaCrtc};

#[test]
fn encodes_640x480() {
    let mode = &dmt_modes()[0];
    let crtc = VgaCrtc::from_mode(mode, 8, 640);
    assert_eq!(0x5F, crtc.horizontal_total);
    assert_eq!(0x4F, crtc.horizontal_display_end);
    assert_eq!(0x0B, crtc.vertical_total);
    assert_eq!(0x3E, crtc.overflow);
    assert_eq!(0xEA, crtc.vertical_retrace_start);
    assert_eq!(0xDF, crtc.vertical_display_end);
    assert_eq!(0x50, crtc.offset);
    assert_eq!(0xEF, misc_output(mode));
}

#[test]
fn pitch_follows_depth() {
    let mode = &dmt_modes()[0];
    assert_eq!(0xA0, VgaCrtc::from_mode(mode, 16, 640).offset);
    // 640 * 4 / 8 = 0x140, bit 8 goes to SR0A
    let crtc = VgaCrtc::from_mode(mode, 24, 640);
    assert_eq!(0x40, crtc.offset);
    assert_eq!(0x10, crtc.ext_vertical_overflow & 0xF0);
    assert_eq!(0x12, color_mode(24));
}

#[test]
fn write_drops_protection_and_keeps_crt1_enable() {
    let mut emu = EmulatedAdapter::new(Ports::default());
    let mode = &dmt_modes()[0];
    {
        let mut lock = RegisterLock::acquire(Regs::new(&mut emu, Ports::default()), false);
        VgaCrtc::from_mode(mode, 8, 640).write(&mut lock);
    }
    assert_eq!(0x5F, emu.reg(Bank::Cr, 0x00));
    assert_eq!(0, emu.reg(Bank::Cr, 0x11) & CR11_PROTECT);
    assert_eq!(CR17_CRT1_ENABLE, emu.reg(Bank::Cr, 0x17) & CR17_CRT1_ENABLE);
}
