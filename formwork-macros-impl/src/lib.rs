#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

mod derive;
pub use derive::*;
