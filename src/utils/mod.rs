//! Utility modules for the optimizer.

pub mod html;
pub mod plural;
