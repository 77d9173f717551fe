pub mod api;
pub mod clean;
pub mod models;
pub mod ratios;
pub mod regression;
pub mod runner;
pub mod sink;
pub mod universe;
