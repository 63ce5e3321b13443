// VESA BIOS Extension calls issued through the video BIOS.
// VBE 3.0 core functions: 4F02h set mode, 4F06h logical scan line length

use quick_error::quick_error;

use crate::hw::Regs;

const DEBUG_BIOS: bool = false;

/// AX after a successful VBE call
pub const VBE_SUCCESS: u16 = 0x004F;
/// AX after a failed VBE call
pub const VBE_FAILED: u16 = 0x014F;

/// 4F02h: mode number flag, use the linear framebuffer
pub const VBE_LINEAR: u16 = 0x4000;
/// 4F02h: mode number flag, don't clear display memory
pub const VBE_PRESERVE: u16 = 0x8000;

pub const VBE_SET_MODE: u16 = 0x4F02;
pub const VBE_SCANLINE: u16 = 0x4F06;

/// registers passed to and returned from a BIOS interrupt
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BiosRegs {
    pub ax: u16,
    pub bx: u16,
    pub cx: u16,
    pub dx: u16,
    pub es: u16,
    pub di: u16,
}

impl BiosRegs {
    pub fn bl(&self) -> u8 {
        (self.bx & 0xFF) as u8
    }

    pub fn set_bl(&mut self, val: u8) {
        self.bx = (self.bx & 0xFF00) | u16::from(val);
    }
}

/// VbeModeInfo is one entry of the mode list reported by the BIOS
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VbeModeInfo {
    pub mode: u16,
    pub width: u16,
    pub height: u16,
    pub bpp: u8,
}

quick_error! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum BiosError {
        NoBios {
            display("no video BIOS answered int 10h")
        }
        Rejected(function: u16, status: u16) {
            display("VBE function {:04X} failed with status {:04X}", function, status)
        }
    }
}

fn call(regs: &mut Regs, bios: &mut BiosRegs) -> Result<(), BiosError> {
    let function = bios.ax;
    if !regs.int10(bios) {
        return Err(BiosError::NoBios);
    }
    if DEBUG_BIOS {
        log::trace!("int 10h {:04X} -> ax={:04X} bx={:04X} cx={:04X}", function, bios.ax, bios.bx, bios.cx);
    }
    if bios.ax != VBE_SUCCESS {
        return Err(BiosError::Rejected(function, bios.ax));
    }
    Ok(())
}

/// Sets a VBE mode with the linear framebuffer and without clearing
/// display memory.
pub fn set_vbe_mode(regs: &mut Regs, mode: u16) -> Result<(), BiosError> {
    let mut bios = BiosRegs {
        ax: VBE_SET_MODE,
        bx: (mode & 0x3FFF) | VBE_LINEAR | VBE_PRESERVE,
        ..BiosRegs::default()
    };
    call(regs, &mut bios)
}

/// Sets the logical scan line length in pixels, returns the resulting
/// bytes per scan line.
pub fn set_logical_scanline(regs: &mut Regs, pixels: u16) -> Result<u16, BiosError> {
    let mut bios = BiosRegs {
        ax: VBE_SCANLINE,
        cx: pixels,
        ..BiosRegs::default()
    };
    bios.set_bl(0x00);
    call(regs, &mut bios)?;
    Ok(bios.bx)
}
