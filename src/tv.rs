// TV encoder parameters and CRT2 output power.
//
// Every parameter has a range and a register field per encoder family. The
// public value is the register field plus the range minimum, so position
// offsets are signed and everything else starts at 0.
//
// SiS bridges keep their TV registers in Part2/Part4, the Chrontel parts
// sit on the DDC side channel and the SiS6326 uses its own TV bank behind
// CRE0/CRE1.

use std::collections::BTreeMap;

use quick_error::quick_error;

use crate::chip::{BridgeFamily, ChipFamily, TvEncoder};
use crate::hw::regs::{
    CH7005_POWER, CH7005_POWER_OFF, CH7005_POWER_ON, CH7019_BACKLIGHT, CH7019_BACKLIGHT_ON, CH7019_POWER,
    CH7019_TV_OFF, CH7019_TV_ON, P1_BLANK, P1_BLANK_CRT2, P4_BACKLIGHT, P4_BACKLIGHT_ON, SR11_PANEL_OFF,
    SR_DDC_POWER, TV6326_ATTACH, TV6326_CONTROL,
};
use crate::hw::{Bank, Regs};
use crate::options::TvSettings;
use crate::output::Crt2Device;

#[cfg(test)]
#[path = "./tv_test.rs"]
mod tv_test;

const DEBUG_TV: bool = false;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TvParam {
    Contrast,
    TextEnhance,
    ChromaFlickerFilter,
    LumaFlickerFilter,
    CvbsColor,
    Bandwidth,
    AntiFlicker,
    Saturation,
    Edge,
    YFilter,
    XPosition,
    YPosition,
}

pub const ALL_PARAMS: [TvParam; 12] = [
    TvParam::Contrast,
    TvParam::TextEnhance,
    TvParam::ChromaFlickerFilter,
    TvParam::LumaFlickerFilter,
    TvParam::CvbsColor,
    TvParam::Bandwidth,
    TvParam::AntiFlicker,
    TvParam::Saturation,
    TvParam::Edge,
    TvParam::YFilter,
    TvParam::XPosition,
    TvParam::YPosition,
];

quick_error! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum TvError {
        NoEncoder {
            display("no TV encoder on this adapter")
        }
        Unsupported(param: TvParam, encoder: TvEncoder) {
            display("{:?} has no {:?} control", encoder, param)
        }
    }
}

/// Result of a parameter query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TvQuery {
    Value(i32),
    /// never configured
    Unset,
    /// the encoder has no such control
    Unsupported,
}

/// TvParamSet holds requested values, a missing key means unset
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TvParamSet {
    values: BTreeMap<TvParam, i32>,
}

impl TvParamSet {
    pub fn get(&self, param: TvParam) -> Option<i32> {
        self.values.get(&param).cloned()
    }

    pub fn set(&mut self, param: TvParam, value: i32) {
        self.values.insert(param, value);
    }

    pub fn unset(&mut self, param: TvParam) {
        self.values.remove(&param);
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TvParam, i32)> + '_ {
        self.values.iter().map(|(p, v)| (*p, *v))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Field {
    Bridge(Bank, u8),
    Encoder(u8),
    Tv6326(u8),
}

#[derive(Clone, Copy, Debug)]
struct Layout {
    encoder: TvEncoder,
    param: TvParam,
    min: i32,
    max: i32,
    field: Field,
    shift: u8,
    width: u8,
}

const fn l(encoder: TvEncoder, param: TvParam, min: i32, max: i32, field: Field, shift: u8, width: u8) -> Layout {
    Layout { encoder, param, min, max, field, shift, width }
}

const LAYOUTS: &[Layout] = &[
    // SiS 30x bridges
    l(TvEncoder::SisBridge, TvParam::AntiFlicker, 0, 4, Field::Bridge(Bank::Part2, 0x0A), 4, 3),
    l(TvEncoder::SisBridge, TvParam::Saturation, 0, 15, Field::Bridge(Bank::Part4, 0x21), 0, 4),
    l(TvEncoder::SisBridge, TvParam::Edge, 0, 15, Field::Bridge(Bank::Part2, 0x35), 0, 4),
    l(TvEncoder::SisBridge, TvParam::YFilter, 0, 1, Field::Bridge(Bank::Part2, 0x30), 5, 1),
    l(TvEncoder::SisBridge, TvParam::XPosition, -32, 32, Field::Bridge(Bank::Part2, 0x1F), 0, 7),
    l(TvEncoder::SisBridge, TvParam::YPosition, -32, 32, Field::Bridge(Bank::Part2, 0x02), 0, 7),
    // Chrontel 7005
    l(TvEncoder::Chrontel7005, TvParam::Contrast, 0, 7, Field::Encoder(0x11), 0, 3),
    l(TvEncoder::Chrontel7005, TvParam::TextEnhance, 0, 3, Field::Encoder(0x01), 0, 2),
    l(TvEncoder::Chrontel7005, TvParam::ChromaFlickerFilter, 0, 3, Field::Encoder(0x01), 4, 2),
    l(TvEncoder::Chrontel7005, TvParam::LumaFlickerFilter, 0, 3, Field::Encoder(0x01), 2, 2),
    l(TvEncoder::Chrontel7005, TvParam::Bandwidth, 0, 3, Field::Encoder(0x03), 2, 2),
    l(TvEncoder::Chrontel7005, TvParam::XPosition, -32, 32, Field::Encoder(0x0A), 0, 8),
    l(TvEncoder::Chrontel7005, TvParam::YPosition, -32, 32, Field::Encoder(0x0B), 0, 8),
    // Chrontel 7019
    l(TvEncoder::Chrontel7019, TvParam::Contrast, 0, 15, Field::Encoder(0x11), 0, 4),
    l(TvEncoder::Chrontel7019, TvParam::TextEnhance, 0, 15, Field::Encoder(0x13), 0, 4),
    l(TvEncoder::Chrontel7019, TvParam::ChromaFlickerFilter, 0, 15, Field::Encoder(0x01), 4, 4),
    l(TvEncoder::Chrontel7019, TvParam::LumaFlickerFilter, 0, 15, Field::Encoder(0x01), 0, 4),
    l(TvEncoder::Chrontel7019, TvParam::CvbsColor, 0, 1, Field::Encoder(0x20), 6, 1),
    l(TvEncoder::Chrontel7019, TvParam::XPosition, -32, 32, Field::Encoder(0x0A), 0, 8),
    l(TvEncoder::Chrontel7019, TvParam::YPosition, -32, 32, Field::Encoder(0x0B), 0, 8),
    // SiS6326 integrated encoder
    l(TvEncoder::Sis6326, TvParam::AntiFlicker, 0, 4, Field::Tv6326(0x03), 0, 3),
    l(TvEncoder::Sis6326, TvParam::Edge, 0, 15, Field::Tv6326(0x2B), 4, 4),
    l(TvEncoder::Sis6326, TvParam::YFilter, 0, 2, Field::Tv6326(0x43), 0, 2),
    l(TvEncoder::Sis6326, TvParam::XPosition, -16, 16, Field::Tv6326(0x3A), 0, 6),
    l(TvEncoder::Sis6326, TvParam::YPosition, -16, 16, Field::Tv6326(0x3B), 0, 6),
];

fn layout(encoder: TvEncoder, param: TvParam) -> Option<&'static Layout> {
    LAYOUTS.iter().find(|l| l.encoder == encoder && l.param == param)
}

/// supported range of a parameter, None if the encoder lacks it
pub fn param_range(encoder: TvEncoder, param: TvParam) -> Option<(i32, i32)> {
    layout(encoder, param).map(|l| (l.min, l.max))
}

pub fn clamp_param(encoder: TvEncoder, param: TvParam, value: i32) -> Option<i32> {
    param_range(encoder, param).map(|(min, max)| value.max(min).min(max))
}

fn read_field(regs: &mut Regs, field: Field) -> Option<u8> {
    match field {
        Field::Bridge(bank, index) => Some(regs.read(bank, index)),
        Field::Encoder(reg) => regs.encoder_read(reg),
        Field::Tv6326(index) => Some(regs.read_tv6326(index)),
    }
}

fn write_field(regs: &mut Regs, field: Field, val: u8) {
    match field {
        Field::Bridge(bank, index) => regs.write(bank, index, val),
        Field::Encoder(reg) => {
            if !regs.encoder_write(reg, val) {
                log::warn!("TV encoder did not acknowledge register {:02X}", reg);
            }
        }
        Field::Tv6326(index) => regs.write_tv6326(index, val),
    }
}

/// Writes a clamped value into the encoder registers. The lock must be held.
pub fn write_param(regs: &mut Regs, encoder: TvEncoder, param: TvParam, value: i32) -> Result<(), TvError> {
    let l = layout(encoder, param).ok_or(TvError::Unsupported(param, encoder))?;
    write_layout(regs, l, value);
    Ok(())
}

fn write_layout(regs: &mut Regs, l: &Layout, value: i32) {
    let value = value.max(l.min).min(l.max);
    let mask = ((1u16 << l.width) - 1) as u8;
    let raw = ((value - l.min) as u8) & mask;
    let old = read_field(regs, l.field).unwrap_or(0);
    let new = (old & !(mask << l.shift)) | (raw << l.shift);
    if DEBUG_TV {
        log::trace!("tv {:?} {:?} = {} ({:?} {:02X} -> {:02X})", l.encoder, l.param, value, l.field, old, new);
    }
    write_field(regs, l.field, new);
}

/// Reads a parameter back from the encoder, in public units.
pub fn read_param(regs: &mut Regs, encoder: TvEncoder, param: TvParam) -> Option<i32> {
    let l = layout(encoder, param)?;
    let mask = ((1u16 << l.width) - 1) as u8;
    let reg = read_field(regs, l.field)?;
    Some(i32::from((reg >> l.shift) & mask) + l.min)
}

/// Configured initial values clamped for the encoder, the ones it lacks
/// are dropped.
pub fn initial_values(settings: &TvSettings, encoder: Option<TvEncoder>) -> TvParamSet {
    let mut set = TvParamSet::default();
    let encoder = match encoder {
        Some(e) => e,
        None => return set,
    };
    for (param, value) in settings.values() {
        match clamp_param(encoder, param, value) {
            Some(v) => set.set(param, v),
            None => log::warn!("{:?} has no {:?} control, initial value ignored", encoder, param),
        }
    }
    set
}

/// Writes every cached value the encoder supports.
pub fn reapply(regs: &mut Regs, encoder: TvEncoder, set: &TvParamSet) {
    for (param, value) in set.iter() {
        match layout(encoder, param) {
            Some(l) => write_layout(regs, l, value),
            None => {
                if DEBUG_TV {
                    log::trace!("tv {:?} has no {:?}, cached value kept", encoder, param);
                }
            }
        }
    }
}

/// Panel backlight on the active bridge path.
pub fn set_backlight(regs: &mut Regs, family: ChipFamily, bridge: BridgeFamily, on: bool) {
    match bridge {
        b if b.is_sis_bridge() => {
            let bits = if on { P4_BACKLIGHT_ON } else { 0 };
            regs.set(Bank::Part4, P4_BACKLIGHT, !P4_BACKLIGHT_ON, bits);
        }
        BridgeFamily::LvdsChrontel => {
            let val = regs.encoder_read(CH7019_BACKLIGHT).unwrap_or(0);
            let val = if on { val | CH7019_BACKLIGHT_ON } else { val & !CH7019_BACKLIGHT_ON };
            regs.encoder_write(CH7019_BACKLIGHT, val);
        }
        BridgeFamily::Lvds if family != ChipFamily::Old => {
            let bits = if on { 0 } else { SR11_PANEL_OFF };
            regs.set(Bank::Sr, SR_DDC_POWER, !SR11_PANEL_OFF, bits);
        }
        _ => {}
    }
}

/// Powers the TV encoder up or down.
pub fn set_encoder_power(regs: &mut Regs, bridge: BridgeFamily, on: bool) {
    match bridge.tv_encoder() {
        Some(TvEncoder::Chrontel7005) => {
            regs.encoder_write(CH7005_POWER, if on { CH7005_POWER_ON } else { CH7005_POWER_OFF });
        }
        Some(TvEncoder::Chrontel7019) => {
            regs.encoder_write(CH7019_POWER, if on { CH7019_TV_ON } else { CH7019_TV_OFF });
        }
        Some(TvEncoder::Sis6326) => {
            let bits = if on { TV6326_ATTACH } else { 0 };
            let ctl = regs.read_tv6326(TV6326_CONTROL);
            regs.write_tv6326(TV6326_CONTROL, (ctl & !TV6326_ATTACH) | bits);
        }
        Some(TvEncoder::SisBridge) => set_bridge_blank(regs, !on),
        None => {}
    }
}

fn set_bridge_blank(regs: &mut Regs, blank: bool) {
    let bits = if blank { P1_BLANK_CRT2 } else { 0 };
    regs.set(Bank::Part1, P1_BLANK, !P1_BLANK_CRT2, bits);
}

/// Blanks or unblanks CRT2 without changing the power state of the sink.
pub fn crt2_blank(regs: &mut Regs, family: ChipFamily, bridge: BridgeFamily, crt2: Crt2Device, blank: bool) {
    match crt2 {
        Crt2Device::None => {}
        _ if bridge.is_sis_bridge() => set_bridge_blank(regs, blank),
        Crt2Device::Panel(_) => set_backlight(regs, family, bridge, !blank),
        Crt2Device::Tv { .. } => set_encoder_power(regs, bridge, !blank),
        Crt2Device::SecondVga => {}
    }
}

/// DPMS for CRT2: panels lose their backlight, TV encoders power down.
pub fn crt2_power(regs: &mut Regs, family: ChipFamily, bridge: BridgeFamily, crt2: Crt2Device, on: bool) {
    match crt2 {
        Crt2Device::None => {}
        Crt2Device::Panel(_) => {
            set_backlight(regs, family, bridge, on);
            if bridge.is_sis_bridge() {
                set_bridge_blank(regs, !on);
            }
        }
        Crt2Device::Tv { .. } => set_encoder_power(regs, bridge, on),
        Crt2Device::SecondVga => set_bridge_blank(regs, !on),
    }
}
