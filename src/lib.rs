// src/lib.rs

//! Price and stock availability watcher library

pub mod bot;
pub mod config;
pub mod error;
pub mod intake;
pub mod models;
pub mod notify;
pub mod parsers;
pub mod pipeline;
pub mod storage;
pub mod utils;
