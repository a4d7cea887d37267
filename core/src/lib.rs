#![cfg_attr(not(test), no_std)]

pub mod app;
pub mod decoder;
pub mod framebuffer;
pub mod glyphs;
pub mod input;
pub mod scroll;
pub mod settings;
pub mod store;
pub mod surface;

#[cfg(test)]
pub(crate) mod mock;
