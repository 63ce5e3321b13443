// Display mode timings.
// Horizontal values in pixels, vertical values in lines, clock in kHz.

use std::fmt;

use bitflags::bitflags;

use crate::modes::clock::ClockRegs;

bitflags! {
    pub struct ModeFlags: u16 {
        const INTERLACE = 0x0001;
        const DOUBLESCAN = 0x0002;
        const NHSYNC = 0x0004;
        const NVSYNC = 0x0008;
        /// chip specific low resolution timing, doublescanned
        const SYNTHETIC = 0x0010;
        /// fixed table timing with precomputed clock registers
        const PRECOMPUTED = 0x0020;
    }
}

/// one character clock
const MIN_HDISPLAY: u16 = 8;
/// CR00 holds the total in characters minus 5
const MIN_HTOTAL: u16 = 5 * 8;
/// interlaced timings are halved before encoding
const MIN_VDISPLAY: u16 = 2;
const MIN_VTOTAL: u16 = 4;

#[derive(Clone, Debug, PartialEq)]
pub struct ModeDescriptor {
    pub name: String,
    pub clock_khz: u32,
    pub hdisplay: u16,
    pub hsync_start: u16,
    pub hsync_end: u16,
    pub htotal: u16,
    pub vdisplay: u16,
    pub vsync_start: u16,
    pub vsync_end: u16,
    pub vtotal: u16,
    pub flags: ModeFlags,
    /// refresh variant index for the table driven switch paths
    pub rate_index: Option<u8>,
    /// VBE mode number or native mode id, once resolved
    pub bios_mode: Option<u16>,
    pub clock_regs: Option<ClockRegs>,
}

impl ModeDescriptor {
    /// h and v are [display, sync start, sync end, total]
    pub fn new(clock_khz: u32, h: [u16; 4], v: [u16; 4], flags: ModeFlags) -> Self {
        let mut mode = ModeDescriptor {
            name: String::new(),
            clock_khz,
            hdisplay: h[0],
            hsync_start: h[1],
            hsync_end: h[2],
            htotal: h[3],
            vdisplay: v[0],
            vsync_start: v[1],
            vsync_end: v[2],
            vtotal: v[3],
            flags,
            rate_index: None,
            bios_mode: None,
            clock_regs: None,
        };
        mode.name = format!("{}x{}@{}", mode.hdisplay, mode.vdisplay, mode.refresh_rounded());
        mode
    }

    pub fn with_clock_regs(mut self, regs: ClockRegs) -> Self {
        self.clock_regs = Some(regs);
        self.flags |= ModeFlags::PRECOMPUTED;
        self
    }

    pub fn is_interlaced(&self) -> bool {
        self.flags.contains(ModeFlags::INTERLACE)
    }

    pub fn is_doublescan(&self) -> bool {
        self.flags.contains(ModeFlags::DOUBLESCAN)
    }

    /// Display, sync start, sync end and total are in order on both axes,
    /// and large enough for the CRTC encoding.
    pub fn has_ordered_timing(&self) -> bool {
        let horizontal = self.hdisplay <= self.hsync_start && self.hsync_start <= self.hsync_end && self.hsync_end <= self.htotal;
        let vertical = self.vdisplay <= self.vsync_start && self.vsync_start <= self.vsync_end && self.vsync_end <= self.vtotal;
        horizontal && vertical && self.hdisplay >= MIN_HDISPLAY && self.htotal >= MIN_HTOTAL && self.vdisplay >= MIN_VDISPLAY && self.vtotal >= MIN_VTOTAL
    }

    pub fn hblank_start(&self) -> u16 {
        self.hdisplay
    }

    pub fn hblank_end(&self) -> u16 {
        self.htotal
    }

    pub fn vblank_start(&self) -> u16 {
        self.vdisplay
    }

    pub fn vblank_end(&self) -> u16 {
        self.vtotal
    }

    /// horizontal sync frequency in kHz
    pub fn hsync_khz(&self) -> f32 {
        if self.htotal == 0 {
            return 0.0;
        }
        self.clock_khz as f32 / f32::from(self.htotal)
    }

    /// vertical refresh in Hz
    pub fn refresh_hz(&self) -> f32 {
        let total = u32::from(self.htotal) * u32::from(self.vtotal);
        if total == 0 {
            return 0.0;
        }
        let mut refresh = self.clock_khz as f32 * 1000.0 / total as f32;
        if self.is_interlaced() {
            refresh *= 2.0;
        }
        if self.is_doublescan() {
            refresh /= 2.0;
        }
        refresh
    }

    pub fn refresh_rounded(&self) -> u32 {
        (self.refresh_hz() + 0.5) as u32
    }

    pub fn size(&self) -> (u16, u16) {
        (self.hdisplay, self.vdisplay)
    }

    /// same visible size and refresh
    pub fn same_shape(&self, other: &ModeDescriptor) -> bool {
        self.size() == other.size() && self.refresh_rounded() == other.refresh_rounded()
    }
}

impl fmt::Display for ModeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({} kHz)", self.name, self.clock_khz)
    }
}

/// MonitorDescriptor is the opaque monitor hint handed over by the probe layer
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MonitorDescriptor {
    /// declared modes, preferred first
    pub modes: Vec<ModeDescriptor>,
    /// horizontal sync range in kHz
    pub hsync_khz: Option<(f32, f32)>,
    /// vertical refresh range in Hz
    pub vrefresh_hz: Option<(f32, f32)>,
}

impl MonitorDescriptor {
    pub fn in_sync_range(&self, mode: &ModeDescriptor) -> bool {
        // half a unit of slack for rounded EDID limits
        let within = |range: Option<(f32, f32)>, val: f32| match range {
            Some((lo, hi)) => val >= lo - 0.5 && val <= hi + 0.5,
            None => true,
        };
        within(self.hsync_khz, mode.hsync_khz()) && within(self.vrefresh_hz, mode.refresh_hz())
    }
}
