// Built-in mode lists.
//
// Standard timings follow the VESA DMT. The 300 and 315 families add
// doublescanned low resolution timings, the old family gets two high
// resolution modes with clock registers taken from the BIOS tables since
// the synthesizer misses those clocks on that silicon.

use crate::chip::{ChipFamily, FamilyCaps};
use crate::modes::clock::ClockRegs;
use crate::modes::descriptor::{ModeDescriptor, ModeFlags};

fn neg() -> ModeFlags {
    ModeFlags::NHSYNC | ModeFlags::NVSYNC
}

fn pos() -> ModeFlags {
    ModeFlags::empty()
}

pub fn dmt_modes() -> Vec<ModeDescriptor> {
    vec![
        ModeDescriptor::new(25_175, [640, 656, 752, 800], [480, 490, 492, 525], neg()),
        ModeDescriptor::new(31_500, [640, 664, 704, 832], [480, 489, 492, 520], neg()),
        ModeDescriptor::new(31_500, [640, 656, 720, 840], [480, 481, 484, 500], neg()),
        ModeDescriptor::new(36_000, [640, 696, 752, 832], [480, 481, 484, 509], neg()),
        ModeDescriptor::new(25_175, [640, 656, 752, 800], [400, 412, 414, 449], ModeFlags::NVSYNC),
        ModeDescriptor::new(36_000, [800, 824, 896, 1024], [600, 601, 603, 625], pos()),
        ModeDescriptor::new(40_000, [800, 840, 968, 1056], [600, 601, 605, 628], pos()),
        ModeDescriptor::new(50_000, [800, 856, 976, 1040], [600, 637, 643, 666], pos()),
        ModeDescriptor::new(49_500, [800, 816, 896, 1056], [600, 601, 604, 625], pos()),
        ModeDescriptor::new(56_250, [800, 832, 896, 1048], [600, 601, 604, 631], pos()),
        ModeDescriptor::new(44_900, [1024, 1032, 1208, 1264], [768, 768, 776, 817], ModeFlags::INTERLACE),
        ModeDescriptor::new(65_000, [1024, 1048, 1184, 1344], [768, 771, 777, 806], neg()),
        ModeDescriptor::new(75_000, [1024, 1048, 1184, 1328], [768, 771, 777, 806], neg()),
        ModeDescriptor::new(78_750, [1024, 1040, 1136, 1312], [768, 769, 772, 800], pos()),
        ModeDescriptor::new(94_500, [1024, 1072, 1168, 1376], [768, 769, 772, 808], pos()),
        ModeDescriptor::new(108_000, [1152, 1216, 1344, 1600], [864, 865, 868, 900], pos()),
        ModeDescriptor::new(108_000, [1280, 1376, 1488, 1800], [960, 961, 964, 1000], pos()),
        ModeDescriptor::new(108_000, [1280, 1328, 1440, 1688], [1024, 1025, 1028, 1066], pos()),
        ModeDescriptor::new(135_000, [1280, 1296, 1440, 1688], [1024, 1025, 1028, 1066], pos()),
        ModeDescriptor::new(157_500, [1280, 1344, 1504, 1728], [1024, 1025, 1028, 1072], pos()),
        ModeDescriptor::new(121_750, [1400, 1488, 1632, 1864], [1050, 1053, 1057, 1089], ModeFlags::NHSYNC),
        ModeDescriptor::new(162_000, [1600, 1664, 1856, 2160], [1200, 1201, 1204, 1250], pos()),
    ]
}

/// doublescanned timings, vertical values are per scanned line pair
pub fn synthetic_lowres() -> Vec<ModeDescriptor> {
    let ds = ModeFlags::DOUBLESCAN | ModeFlags::SYNTHETIC;
    vec![
        ModeDescriptor::new(12_588, [320, 336, 384, 400], [200, 204, 205, 225], ds | ModeFlags::NVSYNC),
        ModeDescriptor::new(12_588, [320, 336, 384, 400], [240, 245, 246, 262], ds | neg()),
        ModeDescriptor::new(20_000, [400, 420, 484, 528], [300, 300, 302, 314], ds),
        ModeDescriptor::new(32_500, [512, 524, 592, 672], [384, 385, 388, 403], ds | neg()),
    ]
}

/// old family high resolution modes with BIOS clock registers, by depth
pub fn precomputed_modes(depth: u8) -> Vec<ModeDescriptor> {
    let mut modes = Vec::new();
    if depth <= 16 {
        modes.push(
            ModeDescriptor::new(135_000, [1280, 1296, 1440, 1688], [1024, 1025, 1028, 1066], pos())
                .with_clock_regs(ClockRegs { sr2b: 0x41, sr2c: 0x06 }),
        );
    }
    if depth == 8 {
        modes.push(
            ModeDescriptor::new(162_000, [1600, 1664, 1856, 2160], [1200, 1201, 1204, 1250], pos())
                .with_clock_regs(ClockRegs { sr2b: 0x21, sr2c: 0x02 }),
        );
    }
    modes
}

/// Adds `mode` unless an entry of the same shape exists, a precomputed
/// mode replaces its generic twin.
fn merge(list: &mut Vec<ModeDescriptor>, mode: ModeDescriptor) {
    match list.iter().position(|m| m.same_shape(&mode)) {
        Some(i) if mode.flags.contains(ModeFlags::PRECOMPUTED) => list[i] = mode,
        Some(_) => {}
        None => list.push(mode),
    }
}

/// Candidate modes in order: the monitor's declared modes (or the DMT
/// list without any), then the family specific additions.
pub fn candidate_modes(caps: &FamilyCaps, declared: &[ModeDescriptor], depth: u8) -> Vec<ModeDescriptor> {
    let mut list = Vec::new();
    let base = if declared.is_empty() { dmt_modes() } else { declared.to_vec() };
    for mode in base {
        merge(&mut list, mode);
    }
    if caps.synthetic_lowres {
        for mode in synthetic_lowres() {
            merge(&mut list, mode);
        }
    }
    if caps.family == ChipFamily::Old {
        for mode in precomputed_modes(depth) {
            merge(&mut list, mode);
        }
    }
    list
}
