// these modules are re-exported as a single module

pub use self::strategy::*;
mod strategy;

pub use self::crtc::*;
mod crtc;

pub use self::queue::*;
mod queue;

pub use self::bridge::*;
mod bridge;

pub use self::vesa::*;
mod vesa;

pub use self::native::*;
mod native;

pub use self::legacy::*;
mod legacy;

pub use self::dispatch::*;
mod dispatch;
