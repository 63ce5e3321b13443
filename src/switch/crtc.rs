// CRT1 timing generator programming, the standard VGA CRTC set plus the
// SiS overflow registers in SR0A/SR0B.

use crate::chip::FamilyCaps;
use crate::hw::regs::{CR11_PROTECT, CR17_CRT1_ENABLE, CR_MODE_CONTROL, CR_VRETRACE_END, SR_COLOR_MODE, SR_HOVERFLOW, SR_OVERFLOW};
use crate::hw::{Bank, Regs};
use crate::modes::{synthesize, ModeDescriptor, ModeFlags};
use crate::switch::SwitchError;

#[cfg(test)]
#[path = "./crtc_test.rs"]
mod crtc_test;

const DEBUG_CRTC: bool = false;

/// misc output: colour, RAM enabled, programmable clock, high page
const MISC_BASE: u8 = 0x2F;
const MISC_HSYNC_NEG: u8 = 0x40;
const MISC_VSYNC_NEG: u8 = 0x80;

/// Register image of the VGA CRTC for one mode.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VgaCrtc {
    pub horizontal_total: u8,
    pub horizontal_display_end: u8,
    pub start_horizontal_blanking: u8,
    pub end_horizontal_blanking: u8,
    pub start_horizontal_retrace: u8,
    pub end_horizontal_retrace: u8,
    pub vertical_total: u8,
    pub overflow: u8,
    pub preset_row_scan: u8,
    pub maximum_scan_line: u8,
    pub vertical_retrace_start: u8,
    pub vertical_retrace_end: u8,
    pub vertical_display_end: u8,
    pub offset: u8,
    pub underline_location: u8,
    pub start_vertical_blanking: u8,
    pub end_vertical_blanking: u8,
    pub mode_control: u8,
    pub line_compare: u8,

    /// SR0A
    pub ext_vertical_overflow: u8,
    /// SR0B
    pub ext_horizontal_overflow: u8,
}

/// bytes per pixel in the framebuffer, 24 bpp is stored as 32
pub fn bytes_per_pixel(depth: u8) -> u32 {
    match depth {
        0..=8 => 1,
        9..=16 => 2,
        _ => 4,
    }
}

/// SR06: enhanced mode with the pixel format in bits 2-4
pub fn color_mode(depth: u8) -> u8 {
    match depth {
        0..=8 => 0x02,
        9..=16 => 0x0A,
        _ => 0x12,
    }
}

impl VgaCrtc {
    /// Encodes a mode, `pitch_pixels` is the virtual width.
    pub fn from_mode(mode: &ModeDescriptor, depth: u8, pitch_pixels: u16) -> Self {
        let ht = u32::from(mode.htotal) >> 3;
        let hde = u32::from(mode.hdisplay) >> 3;
        let hbs = u32::from(mode.hblank_start()) >> 3;
        let hbe = u32::from(mode.hblank_end()) >> 3;
        let hrs = u32::from(mode.hsync_start) >> 3;
        let hre = u32::from(mode.hsync_end) >> 3;

        let halve = |v: u16| if mode.is_interlaced() { u32::from(v) / 2 } else { u32::from(v) };
        let vt = halve(mode.vtotal) - 2;
        let vde = halve(mode.vdisplay) - 1;
        let vrs = halve(mode.vsync_start);
        let vre = halve(mode.vsync_end);
        let vbs = halve(mode.vblank_start()) - 1;
        let vbe = halve(mode.vblank_end()) - 1;

        let pitch = (u32::from(pitch_pixels) * bytes_per_pixel(depth)) >> 3;

        let overflow = ((vt & 0x100) >> 8)
            | ((vde & 0x100) >> 7)
            | ((vrs & 0x100) >> 6)
            | ((vbs & 0x100) >> 5)
            | 0x10
            | ((vt & 0x200) >> 4)
            | ((vde & 0x200) >> 3)
            | ((vrs & 0x200) >> 2);

        let mut max_scan = ((vbs & 0x200) >> 4) | 0x40;
        if mode.is_doublescan() {
            max_scan |= 0x80;
        }

        let ext_v = ((vt & 0x400) >> 10) | ((vde & 0x400) >> 9) | ((vbs & 0x400) >> 8) | ((vrs & 0x400) >> 7) | ((pitch & 0xF00) >> 4);
        let ext_h = ((ht - 5) >> 8 & 0x03)
            | (((hde - 1) >> 8 & 0x01) << 2)
            | (((hbs - 1) >> 8 & 0x01) << 4)
            | ((hrs >> 8 & 0x01) << 6);

        VgaCrtc {
            horizontal_total: (ht - 5) as u8,
            horizontal_display_end: (hde - 1) as u8,
            start_horizontal_blanking: (hbs - 1) as u8,
            end_horizontal_blanking: (((hbe - 1) & 0x1F) | 0x80) as u8,
            start_horizontal_retrace: hrs as u8,
            end_horizontal_retrace: ((((hbe - 1) & 0x20) << 2) | (hre & 0x1F)) as u8,
            vertical_total: vt as u8,
            overflow: overflow as u8,
            preset_row_scan: 0,
            maximum_scan_line: max_scan as u8,
            vertical_retrace_start: vrs as u8,
            vertical_retrace_end: ((vre & 0x0F) | 0x20) as u8,
            vertical_display_end: vde as u8,
            offset: pitch as u8,
            underline_location: 0,
            start_vertical_blanking: vbs as u8,
            end_vertical_blanking: vbe as u8,
            mode_control: 0x43,
            line_compare: 0xFF,
            ext_vertical_overflow: ext_v as u8,
            ext_horizontal_overflow: ext_h as u8,
        }
    }

    fn values(&self) -> [u8; 0x19] {
        [
            self.horizontal_total,
            self.horizontal_display_end,
            self.start_horizontal_blanking,
            self.end_horizontal_blanking,
            self.start_horizontal_retrace,
            self.end_horizontal_retrace,
            self.vertical_total,
            self.overflow,
            self.preset_row_scan,
            self.maximum_scan_line,
            0x00,
            0x00,
            0x00,
            0x00,
            0x00,
            0x00,
            self.vertical_retrace_start,
            self.vertical_retrace_end,
            self.vertical_display_end,
            self.offset,
            self.underline_location,
            self.start_vertical_blanking,
            self.end_vertical_blanking,
            self.mode_control,
            self.line_compare,
        ]
    }

    /// Writes CR00-CR18 and the overflow registers. CR11 protection is
    /// dropped first and CR17 keeps its CRT1 enable bit.
    pub fn write(&self, regs: &mut Regs) {
        regs.and(Bank::Cr, CR_VRETRACE_END, !CR11_PROTECT);
        let crt1_bit = regs.read(Bank::Cr, CR_MODE_CONTROL) & CR17_CRT1_ENABLE;
        for (index, val) in self.values().iter().enumerate() {
            let index = index as u8;
            let val = match index {
                CR_MODE_CONTROL => (val & !CR17_CRT1_ENABLE) | crt1_bit,
                CR_VRETRACE_END => val & !CR11_PROTECT,
                _ => *val,
            };
            regs.write(Bank::Cr, index, val);
        }
        regs.write(Bank::Sr, SR_OVERFLOW, self.ext_vertical_overflow);
        regs.write(Bank::Sr, SR_HOVERFLOW, self.ext_horizontal_overflow);
    }
}

pub fn misc_output(mode: &ModeDescriptor) -> u8 {
    let mut misc = MISC_BASE;
    if mode.flags.contains(ModeFlags::NHSYNC) {
        misc |= MISC_HSYNC_NEG;
    }
    if mode.flags.contains(ModeFlags::NVSYNC) {
        misc |= MISC_VSYNC_NEG;
    }
    misc
}

/// Programs CRT1 for a mode: clock, CRTC, sync polarity and pixel format.
pub fn program_crt1(regs: &mut Regs, caps: &FamilyCaps, mode: &ModeDescriptor, depth: u8, pitch: u16) -> Result<(), SwitchError> {
    let clock = match mode.clock_regs {
        Some(c) => c,
        None => synthesize(mode.clock_khz).ok_or(SwitchError::Replay("no clock divider for the dot clock"))?,
    };
    if mode.clock_khz > caps.max_dotclock_for(depth) {
        return Err(SwitchError::Replay("dot clock above the family limit"));
    }
    let crtc = VgaCrtc::from_mode(mode, depth, pitch);
    if DEBUG_CRTC {
        log::trace!("crtc for {}: {:?}, clock {:?}", mode, crtc, clock);
    }
    regs.write_misc(misc_output(mode));
    crtc.write(regs);
    clock.write(regs);
    regs.write(Bank::Sr, SR_COLOR_MODE, color_mode(depth));
    Ok(())
}
