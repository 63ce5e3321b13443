// these modules are re-exported as a single module

pub use self::descriptor::*;
mod descriptor;

pub use self::clock::*;
mod clock;

pub use self::builtin::*;
mod builtin;

pub use self::rate::*;
mod rate;

pub use self::bios_index::*;
mod bios_index;

pub use self::catalog::*;
mod catalog;
