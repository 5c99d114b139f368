// src/handlers/mod.rs

pub mod achievement;
pub mod activity;
pub mod attempt;
pub mod quiz;
