// Video clock synthesis for SR2B/SR2C.
//
//   VCLK = 14.318 MHz * numerator / (denominator * post divider)
//
// SR2B bits 6:0 numerator - 1
// SR2C bits 4:0 denominator - 1, bits 6:5 post divider - 1

use crate::hw::regs::{SR_VCLK_DEN, SR_VCLK_NUM};
use crate::hw::{Bank, Regs};

/// reference crystal in kHz
pub const REF_KHZ: u32 = 14_318;

/// VCO range of the synthesizer in kHz
const VCO_MIN_KHZ: u32 = 50_000;
const VCO_MAX_KHZ: u32 = 260_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockRegs {
    pub sr2b: u8,
    pub sr2c: u8,
}

impl ClockRegs {
    pub fn new(numerator: u32, denominator: u32, post: u32) -> Self {
        ClockRegs {
            sr2b: ((numerator - 1) & 0x7F) as u8,
            sr2c: ((((post - 1) & 0x03) << 5) | ((denominator - 1) & 0x1F)) as u8,
        }
    }

    pub fn numerator(self) -> u32 {
        u32::from(self.sr2b & 0x7F) + 1
    }

    pub fn denominator(self) -> u32 {
        u32::from(self.sr2c & 0x1F) + 1
    }

    pub fn post(self) -> u32 {
        u32::from((self.sr2c >> 5) & 0x03) + 1
    }

    /// resulting clock in kHz
    pub fn khz(self) -> u32 {
        REF_KHZ * self.numerator() / (self.denominator() * self.post())
    }

    pub fn write(self, regs: &mut Regs) {
        regs.write(Bank::Sr, SR_VCLK_NUM, self.sr2b);
        regs.write(Bank::Sr, SR_VCLK_DEN, self.sr2c);
    }
}

/// Searches the divider combination closest to `target_khz`. Returns None
/// if no combination keeps the VCO in range.
pub fn synthesize(target_khz: u32) -> Option<ClockRegs> {
    let mut best: Option<(u32, ClockRegs)> = None;
    for post in 1..=4u32 {
        let vco_target = target_khz * post;
        if vco_target < VCO_MIN_KHZ || vco_target > VCO_MAX_KHZ {
            continue;
        }
        for den in 2..=32u32 {
            // nearest numerator for this denominator
            let num = (vco_target * den + REF_KHZ / 2) / REF_KHZ;
            if num < 2 || num > 128 {
                continue;
            }
            let vco = REF_KHZ * num / den;
            if vco < VCO_MIN_KHZ || vco > VCO_MAX_KHZ {
                continue;
            }
            let regs = ClockRegs::new(num, den, post);
            let err = (regs.khz() as i64 - target_khz as i64).abs() as u32;
            if best.map_or(true, |(e, _)| err < e) {
                best = Some((err, regs));
            }
        }
    }
    best.map(|(_, regs)| regs)
}
