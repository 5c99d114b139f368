// src/models/mod.rs

pub mod achievement;
pub mod attempt;
pub mod event;
pub mod question;
pub mod quiz;
