// User overrides, read from a TOML document by the host.
//
//   force_crt2_type = "tv"
//   force_tv_standard = "palm"
//   use_vesa = false
//
//   [tv]
//   saturation = 7

use std::fs;
use std::io;
use std::path::Path;

use quick_error::quick_error;

use crate::output::{TvPlug, TvStandard};
use crate::tv::TvParam;

#[cfg(test)]
#[path = "./options_test.rs"]
mod options_test;

quick_error! {
    #[derive(Debug)]
    pub enum ConfigError {
        Io(err: io::Error) {
            from()
            display("cannot read options: {}", err)
        }
        Parse(err: toml::de::Error) {
            from()
            display("invalid options: {}", err)
        }
        Depth(depth: u8) {
            display("unsupported depth {}, expected 8, 16 or 24", depth)
        }
    }
}

/// Crt2Type selects a CRT2 device over the detected one
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Crt2Type {
    None,
    Lcd,
    Tv,
    Vga,
}

/// how the 315 family feeds its command queue
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueMode {
    Mmio,
    Vram,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TvSettings {
    pub contrast: Option<i32>,
    pub text_enhance: Option<i32>,
    pub chroma_flicker_filter: Option<i32>,
    pub luma_flicker_filter: Option<i32>,
    pub cvbs_color: Option<i32>,
    pub bandwidth: Option<i32>,
    pub anti_flicker: Option<i32>,
    pub saturation: Option<i32>,
    pub edge: Option<i32>,
    pub y_filter: Option<i32>,
    pub x_position: Option<i32>,
    pub y_position: Option<i32>,
}

impl TvSettings {
    /// configured initial values, in parameter order
    pub fn values(&self) -> Vec<(TvParam, i32)> {
        let all = [
            (TvParam::Contrast, self.contrast),
            (TvParam::TextEnhance, self.text_enhance),
            (TvParam::ChromaFlickerFilter, self.chroma_flicker_filter),
            (TvParam::LumaFlickerFilter, self.luma_flicker_filter),
            (TvParam::CvbsColor, self.cvbs_color),
            (TvParam::Bandwidth, self.bandwidth),
            (TvParam::AntiFlicker, self.anti_flicker),
            (TvParam::Saturation, self.saturation),
            (TvParam::Edge, self.edge),
            (TvParam::YFilter, self.y_filter),
            (TvParam::XPosition, self.x_position),
            (TvParam::YPosition, self.y_position),
        ];
        all.iter().filter_map(|(p, v)| v.map(|v| (*p, v))).collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    pub force_crt2_type: Option<Crt2Type>,
    pub force_tv_standard: Option<TvStandard>,
    pub force_tv_plug: Option<TvPlug>,
    /// Some(false) switches CRT1 off when CRT2 is active
    pub force_crt1: Option<bool>,
    /// switch modes through the VBE BIOS
    pub use_vesa: bool,
    /// panel delay compensation, low nibble of Part1 2Dh
    pub panel_delay_compensation: Option<u8>,
    pub hw_cursor: bool,
    pub queue_mode: QueueMode,
    /// None: decided by the bridge family
    pub restore_by_set: Option<bool>,
    pub depth: u8,
    /// virtual screen width in pixels, None follows the mode
    pub virtual_width: Option<u16>,
    pub tv: TvSettings,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            force_crt2_type: None,
            force_tv_standard: None,
            force_tv_plug: None,
            force_crt1: None,
            use_vesa: false,
            panel_delay_compensation: None,
            hw_cursor: true,
            queue_mode: QueueMode::Mmio,
            restore_by_set: None,
            depth: 16,
            virtual_width: None,
            tv: TvSettings::default(),
        }
    }
}

impl Options {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let opts: Options = toml::from_str(s)?;
        opts.validate()?;
        Ok(opts)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.depth {
            8 | 16 | 24 => Ok(()),
            d => Err(ConfigError::Depth(d)),
        }
    }
}
