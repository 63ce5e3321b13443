// these modules are re-exported as a single module

pub use self::variant::*;
mod variant;

pub use self::caps::*;
mod caps;

pub use self::bridge::*;
mod bridge;
