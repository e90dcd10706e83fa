//! Route handlers

pub mod classes;
pub mod predict;
