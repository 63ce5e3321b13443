// these modules are re-exported as a single module

pub use self::io::*;
mod io;

pub use self::lock::*;
mod lock;

pub use self::wait::*;
mod wait;

pub use self::emulated::*;
mod emulated;

pub mod regs;
