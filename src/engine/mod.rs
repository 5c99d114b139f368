// src/engine/mod.rs

pub mod rules;
pub mod session;
pub mod shuffle;
