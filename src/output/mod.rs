// these modules are re-exported as a single module

pub use self::config::*;
mod config;

pub use self::detect::*;
mod detect;
