//! Core domain types and logic.

pub mod backtest;
pub mod bar;
pub mod calendar;
pub mod error;
pub mod indicator;
pub mod metrics;
pub mod position;
pub mod run_config;
pub mod signal;
pub mod strategy;
