pub mod calendar;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod pages;
pub mod platform;
pub mod report;
pub mod service;
pub mod sort;
pub mod store;
pub mod table;
pub mod web;

pub use error::{Error, Result};
