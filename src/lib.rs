// Main library entry point for the mini compiler service.

pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod logger;
pub mod ports;
