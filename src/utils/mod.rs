//! Utils Module - Helper Functions & Shared Utilities

pub mod constants;
pub mod html;

pub use constants::*;
pub use html::*;
