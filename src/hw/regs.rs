// Register indices and bit assignments of the SiS VGA core and its video
// bridges. Values not covered here are programmed from the timing tables.

use bitflags::bitflags;

pub const SR_RESET: u8 = 0x00;
pub const SR_CLOCKING: u8 = 0x01;
pub const SR_LOCK: u8 = 0x05;
pub const SR_COLOR_MODE: u8 = 0x06;
pub const SR_OVERFLOW: u8 = 0x0A;
pub const SR_HOVERFLOW: u8 = 0x0B;
pub const SR_DDC_POWER: u8 = 0x11;
pub const SR_POWER: u8 = 0x1F;
pub const SR_QUEUE_CTRL: u8 = 0x26;
pub const SR_QUEUE_THRESHOLD: u8 = 0x27;
pub const SR_VCLK_NUM: u8 = 0x2B;
pub const SR_VCLK_DEN: u8 = 0x2C;
/// CRT2 clock on LVDS and Chrontel paths
pub const SR_CRT2_VCLK_NUM: u8 = 0x2E;
pub const SR_CRT2_VCLK_DEN: u8 = 0x2F;

/// SR00 value that holds the sequencer in synchronous reset
pub const RESET_SYNC: u8 = 0x01;
/// SR00 value for normal operation
pub const RESET_RUN: u8 = 0x03;
/// microseconds the synchronous reset is held
pub const RESET_PULSE_US: u32 = 10_000;

pub const SR01_SCREEN_OFF: u8 = 0x20;
pub const SR11_PANEL_OFF: u8 = 0x08;
pub const SR1F_HSYNC_OFF: u8 = 0x40;
pub const SR1F_VSYNC_OFF: u8 = 0x80;
pub const SR1F_SYNC_MASK: u8 = 0xC0;

/// extended register unlock code, for both SR05 and CR80
pub const UNLOCK_CODE: u8 = 0x86;
/// relock code
pub const LOCK_CODE: u8 = 0x00;
/// readback of an unlocked lock register
pub const UNLOCKED: u8 = 0xA1;

pub const CR_VRETRACE_END: u8 = 0x11;
pub const CR_MODE_CONTROL: u8 = 0x17;
pub const CR_CRT2_TARGET: u8 = 0x30;
pub const CR_CRT2_CONTROL: u8 = 0x31;
pub const CR_CONNECTION: u8 = 0x32;
pub const CR_RATE_INDEX: u8 = 0x33;
pub const CR_MODE_NUMBER: u8 = 0x34;
pub const CR_PANEL_TYPE: u8 = 0x36;
pub const CR_ENCODER_TYPE: u8 = 0x37;
pub const CR_TV_EXT: u8 = 0x38;
pub const CR_CRT1_OFF: u8 = 0x63;
pub const CR_LEGACY_LOCK: u8 = 0x80;

/// CR11: write protect CR00-CR07
pub const CR11_PROTECT: u8 = 0x80;
/// CR17: timing generator/CRT1 enabled (300 and older families)
pub const CR17_CRT1_ENABLE: u8 = 0x80;
/// CR63: CRT1 switched off (315 family)
pub const CR63_CRT1_OFF: u8 = 0x40;

/// input status 1: vertical retrace in progress
pub const STATUS_VRETRACE: u8 = 0x08;

pub const P1_MODE_CONTROL: u8 = 0x00;
pub const P1_BLANK: u8 = 0x01;
pub const P1_PANEL_DELAY: u8 = 0x2D;
pub const P1_BLANK_CRT2: u8 = 0x20;

pub const P4_BRIDGE_ID: u8 = 0x00;
pub const P4_REVISION: u8 = 0x01;
/// CRT2 clock on SiS bridges
pub const P4_VCLK_NUM: u8 = 0x0A;
pub const P4_VCLK_DEN: u8 = 0x0B;
pub const P4_BACKLIGHT: u8 = 0x26;
pub const P4_BACKLIGHT_ON: u8 = 0x02;

/// SiS6326 TV register 00h
pub const TV6326_CONTROL: u8 = 0x00;
/// TV attached to the CRTC output
pub const TV6326_ATTACH: u8 = 0x04;
/// S-video plug instead of composite
pub const TV6326_SVIDEO: u8 = 0x08;
/// PAL encoding selected
pub const TV6326_PAL: u8 = 0x10;
/// encoder present strap
pub const TV6326_PRESENT: u8 = 0x80;

/// Chrontel 7005 power management register
pub const CH7005_POWER: u8 = 0x0E;
pub const CH7005_POWER_ON: u8 = 0x0B;
pub const CH7005_POWER_OFF: u8 = 0x09;
/// Chrontel 7019 power management register
pub const CH7019_POWER: u8 = 0x49;
pub const CH7019_TV_ON: u8 = 0x20;
pub const CH7019_TV_OFF: u8 = 0x3E;
/// Chrontel 7019 backlight control
pub const CH7019_BACKLIGHT: u8 = 0x66;
pub const CH7019_BACKLIGHT_ON: u8 = 0x20;

/// 315 family command queue registers (MMIO window)
pub const MMIO_QUEUE_BASE: u32 = 0x85C0;
pub const MMIO_QUEUE_WRITE_PTR: u32 = 0x85C4;
pub const MMIO_QUEUE_READ_PTR: u32 = 0x85C8;

bitflags! {
    /// CR30: CRT2 output target
    pub struct Cr30: u8 {
        const SIMULCAST = 0x01;
        const COMPOSITE = 0x04;
        const SVIDEO = 0x08;
        const SCART = 0x10;
        const LCD = 0x20;
        const SECOND_VGA = 0x40;
        const COMPONENT = 0x80;
        const TARGETS = Self::COMPOSITE.bits | Self::SVIDEO.bits | Self::SCART.bits
            | Self::LCD.bits | Self::SECOND_VGA.bits | Self::COMPONENT.bits;
    }
}

bitflags! {
    /// CR31: CRT2 control
    pub struct Cr31: u8 {
        const PAL = 0x01;
        const NOT_SIMULCAST = 0x04;
        const CRT2_DISABLED = 0x20;
        const DRIVER_MODE = 0x40;
    }
}

bitflags! {
    /// CR32: connected devices as found by the BIOS
    pub struct Cr32: u8 {
        const SCART = 0x01;
        const COMPOSITE = 0x02;
        const SVIDEO = 0x04;
        const LCD = 0x08;
        const SECOND_VGA = 0x10;
        const CRT1 = 0x20;
        const TV = Self::SCART.bits | Self::COMPOSITE.bits | Self::SVIDEO.bits;
    }
}

bitflags! {
    /// CR38: extended TV standard and plug bits (315 family)
    pub struct Cr38: u8 {
        const COMPONENT = 0x04;
        const PAL_M = 0x40;
        const PAL_N = 0x80;
    }
}
