#![doc = include_str!("../README.md")]
#![no_std]
#![deny(future_incompatible)]
#![deny(rust_2018_idioms)]

#[cfg(test)]
extern crate std;

// Generated code names this crate by its absolute path.
#[cfg(test)]
extern crate self as type_erasure;

mod erased;

pub use type_erasure_macros::type_erasure;

pub use self::erased::Erased;
