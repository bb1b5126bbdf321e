#![deny(warnings)]
#![deny(rust_2018_idioms)]

//! Domain types shared by the vessel tracking services.

mod feature;
mod vessel;

pub use feature::*;
pub use vessel::*;
