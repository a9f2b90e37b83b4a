// Utility functions

pub mod retry;
pub mod validators;

pub use retry::*;
pub use validators::*;
