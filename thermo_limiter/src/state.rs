//! State machine module root.

pub mod lifecycle;
