//! Business logic services

pub mod api;
pub mod directions;
pub mod display;
pub mod estimator;
pub mod planning;
pub mod rollup;
pub mod route_history;
pub mod schedule;
pub mod sequencer;
