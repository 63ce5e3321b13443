// Video bridge families and their identification.
//
// SiS 30x bridges answer on Part4 (id in 00h, revision in 01h). External
// LVDS transmitters and Chrontel TV encoders are reported by the BIOS in
// CR37. The 6326 carries its own TV encoder behind CRE0/CRE1.

use crate::chip::variant::{ChipFamily, ChipVariant};
use crate::hw::{Bank, Regs};
use crate::hw::regs::{CR_ENCODER_TYPE, P4_BRIDGE_ID, P4_REVISION, TV6326_CONTROL, TV6326_PRESENT};
use crate::output::TvStandard;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BridgeFamily {
    None,
    /// SiS6326 integrated TV encoder, TV only
    IntegratedTv,
    Sis301,
    Sis301B,
    Sis302B,
    Sis301C,
    Sis301LV,
    Sis302LV,
    Lvds,
    Chrontel7005,
    Chrontel7019,
    LvdsChrontel,
}

/// TvEncoder selects the register layout of the TV parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TvEncoder {
    SisBridge,
    Chrontel7005,
    Chrontel7019,
    Sis6326,
}

impl BridgeFamily {
    /// the SiS 30x video bridge series, with Part1..Part4 banks
    pub fn is_sis_bridge(self) -> bool {
        match self {
            BridgeFamily::Sis301
            | BridgeFamily::Sis301B
            | BridgeFamily::Sis302B
            | BridgeFamily::Sis301C
            | BridgeFamily::Sis301LV
            | BridgeFamily::Sis302LV => true,
            _ => false,
        }
    }

    pub fn is_lvds(self) -> bool {
        match self {
            BridgeFamily::Lvds | BridgeFamily::LvdsChrontel => true,
            _ => false,
        }
    }

    pub fn supports_panel(self) -> bool {
        self.is_sis_bridge() || self.is_lvds()
    }

    pub fn supports_tv(self) -> bool {
        match self {
            BridgeFamily::Sis301LV | BridgeFamily::Sis302LV => false,
            BridgeFamily::None | BridgeFamily::Lvds => false,
            _ => true,
        }
    }

    pub fn supports_second_vga(self) -> bool {
        match self {
            BridgeFamily::Sis301 | BridgeFamily::Sis301B | BridgeFamily::Sis302B | BridgeFamily::Sis301C => true,
            _ => false,
        }
    }

    /// whether CRT2 can run a timing independent from CRT1
    pub fn independent_timing(self) -> bool {
        match self {
            BridgeFamily::None | BridgeFamily::IntegratedTv | BridgeFamily::Chrontel7005 => false,
            _ => true,
        }
    }

    pub fn supports_pal_mn(self) -> bool {
        match self {
            BridgeFamily::Sis301B
            | BridgeFamily::Sis302B
            | BridgeFamily::Sis301C
            | BridgeFamily::Chrontel7019
            | BridgeFamily::LvdsChrontel => true,
            _ => false,
        }
    }

    pub fn supports_component(self) -> bool {
        match self {
            BridgeFamily::Sis301C => true,
            _ => false,
        }
    }

    pub fn tv_encoder(self) -> Option<TvEncoder> {
        match self {
            BridgeFamily::IntegratedTv => Some(TvEncoder::Sis6326),
            BridgeFamily::Chrontel7005 => Some(TvEncoder::Chrontel7005),
            BridgeFamily::Chrontel7019 | BridgeFamily::LvdsChrontel => Some(TvEncoder::Chrontel7019),
            b if b.is_sis_bridge() && b.supports_tv() => Some(TvEncoder::SisBridge),
            _ => None,
        }
    }

    /// Register replay does not reliably bring these back to the console
    /// mode, the old mode has to be set again instead.
    pub fn needs_restore_by_set(self, family: ChipFamily) -> bool {
        match self {
            BridgeFamily::Sis301C | BridgeFamily::Sis302LV => true,
            BridgeFamily::Lvds => family == ChipFamily::Sis300,
            _ => false,
        }
    }

    /// dot clock limit of a second VGA monitor on CRT2, in kHz
    pub fn max_crt2_dotclock(self) -> u32 {
        match self {
            BridgeFamily::Sis301 => 162_000,
            BridgeFamily::Sis301B | BridgeFamily::Sis302B => 203_000,
            BridgeFamily::Sis301C => 230_000,
            _ => 108_000,
        }
    }

    /// largest mode the TV encoder can scale down for the given standard
    pub fn tv_max_size(self, standard: TvStandard) -> (u32, u32) {
        match self {
            BridgeFamily::IntegratedTv => match standard {
                TvStandard::Ntsc | TvStandard::PalM => (640, 480),
                _ => (800, 600),
            },
            BridgeFamily::Chrontel7005 | BridgeFamily::Chrontel7019 | BridgeFamily::LvdsChrontel => (800, 600),
            _ => (1024, 768),
        }
    }
}

/// Reads the bridge identification registers of a chip.
pub fn detect_bridge(regs: &mut Regs, chip: ChipVariant) -> BridgeFamily {
    match chip.family() {
        ChipFamily::Old => {
            if chip != ChipVariant::Sis6326 {
                return BridgeFamily::None;
            }
            if regs.read_tv6326(TV6326_CONTROL) & TV6326_PRESENT != 0 {
                BridgeFamily::IntegratedTv
            } else {
                BridgeFamily::None
            }
        }
        ChipFamily::Sis530 => BridgeFamily::None,
        family => {
            let id = regs.read(Bank::Part4, P4_BRIDGE_ID);
            if id == 1 || id == 2 {
                let rev = regs.read(Bank::Part4, P4_REVISION);
                return sis_bridge_from_id(id, rev);
            }
            let encoder = (regs.read(Bank::Cr, CR_ENCODER_TYPE) >> 1) & 0x07;
            match (encoder, family) {
                (2, _) => BridgeFamily::Lvds,
                (3, ChipFamily::Sis315) => BridgeFamily::LvdsChrontel,
                (3, _) => BridgeFamily::Lvds,
                (4, ChipFamily::Sis300) => BridgeFamily::Chrontel7005,
                (4, _) => BridgeFamily::Chrontel7019,
                _ => BridgeFamily::None,
            }
        }
    }
}

fn sis_bridge_from_id(id: u8, rev: u8) -> BridgeFamily {
    match (id, rev) {
        (2, r) if r >= 0xE0 => BridgeFamily::Sis302LV,
        (_, r) if r >= 0xE0 => BridgeFamily::Sis301LV,
        (_, r) if r >= 0xC0 => BridgeFamily::Sis301C,
        (2, r) if r >= 0xB0 => BridgeFamily::Sis302B,
        (_, r) if r >= 0xB0 => BridgeFamily::Sis301B,
        _ => BridgeFamily::Sis301,
    }
}
