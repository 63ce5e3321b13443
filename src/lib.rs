#![allow(dead_code)]
#![allow(clippy::single_match)]
#![allow(clippy::verbose_bit_mask)]

#[macro_use]
extern crate serde_derive;

#[cfg(test)]
extern crate pretty_assertions;

pub mod bios;
pub mod chip;
pub mod context;
pub mod entity;
pub mod hw;
pub mod modes;
pub mod options;
pub mod output;
pub mod power;
pub mod screen;
pub mod state;
pub mod switch;
pub mod tv;

pub use crate::context::{DeviceContext, HeadRole, ProbeInfo};
pub use crate::entity::Entity;
pub use crate::options::Options;
pub use crate::power::PowerState;
