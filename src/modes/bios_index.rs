// Mode number tables: VESA mode numbers for the VBE path and the SiS
// native mode ids stored in CR34 by the BIOS emulation.

use crate::bios::VbeModeInfo;
use crate::chip::ChipFamily;

/// (width, height, depth, VESA mode number)
const VESA_MODES: &[(u16, u16, u8, u16)] = &[
    (640, 400, 8, 0x100),
    (640, 480, 8, 0x101),
    (640, 480, 16, 0x111),
    (640, 480, 24, 0x112),
    (800, 600, 8, 0x103),
    (800, 600, 16, 0x114),
    (800, 600, 24, 0x115),
    (1024, 768, 8, 0x105),
    (1024, 768, 16, 0x117),
    (1024, 768, 24, 0x118),
    (1280, 1024, 8, 0x107),
    (1280, 1024, 16, 0x11A),
    (1280, 1024, 24, 0x11B),
];

/// (width, height, [id at 8, 16, 24 bpp])
const NATIVE_MODES: &[(u16, u16, [u8; 3])] = &[
    (320, 200, [0x59, 0x41, 0x4F]),
    (320, 240, [0x50, 0x56, 0x53]),
    (400, 300, [0x51, 0x57, 0x54]),
    (512, 384, [0x52, 0x58, 0x5C]),
    (640, 400, [0x2F, 0x5D, 0x5E]),
    (640, 480, [0x2E, 0x44, 0x62]),
    (800, 600, [0x30, 0x47, 0x63]),
    (1024, 600, [0x20, 0x21, 0x22]),
    (1024, 768, [0x38, 0x4A, 0x64]),
    (1152, 864, [0x29, 0x2A, 0x2B]),
    (1280, 768, [0x23, 0x24, 0x25]),
    (1280, 960, [0x7C, 0x7D, 0x7E]),
    (1280, 1024, [0x3A, 0x4D, 0x65]),
    (1400, 1050, [0x26, 0x27, 0x28]),
    (1600, 1200, [0x3C, 0x3D, 0x66]),
];

fn depth_slot(depth: u8) -> usize {
    match depth {
        0..=8 => 0,
        9..=16 => 1,
        _ => 2,
    }
}

/// VESA mode number from the family table. The old family BIOS has no
/// true colour modes.
pub fn vesa_mode_number(family: ChipFamily, width: u16, height: u16, depth: u8) -> Option<u16> {
    if family == ChipFamily::Old && depth > 16 {
        return None;
    }
    VESA_MODES
        .iter()
        .find(|(w, h, d, _)| *w == width && *h == height && *d == depth)
        .map(|(_, _, _, mode)| *mode)
}

/// searches the mode list the BIOS reported at runtime
pub fn search_vbe_list(list: &[VbeModeInfo], width: u16, height: u16, depth: u8) -> Option<u16> {
    list.iter()
        .find(|m| m.width == width && m.height == height && (m.bpp == depth || (depth == 24 && m.bpp == 32)))
        .map(|m| m.mode)
}

/// Resolves the VBE mode number, table first, then the BIOS list.
pub fn resolve_vesa(family: ChipFamily, list: &[VbeModeInfo], width: u16, height: u16, depth: u8) -> Option<u16> {
    vesa_mode_number(family, width, height, depth).or_else(|| search_vbe_list(list, width, height, depth))
}

pub fn native_mode_id(width: u16, height: u16, depth: u8) -> Option<u8> {
    NATIVE_MODES
        .iter()
        .find(|(w, h, _)| *w == width && *h == height)
        .map(|(_, _, ids)| ids[depth_slot(depth)])
}

/// (width, height, depth) of a native mode id
pub fn native_mode_lookup(id: u8) -> Option<(u16, u16, u8)> {
    for (w, h, ids) in NATIVE_MODES {
        if let Some(slot) = ids.iter().position(|i| *i == id) {
            let depth = [8, 16, 24][slot];
            return Some((*w, *h, depth));
        }
    }
    None
}
