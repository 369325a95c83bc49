//! Sequential audit math utilities.

pub mod math;

pub use math::boundary::*;
pub use math::growth::*;
pub use math::sprt::*;
pub use math::stable::*;
