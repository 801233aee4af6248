#![warn(clippy::all)]

#[macro_use]
extern crate strum;

pub mod abs_path;
pub mod console;
pub mod error;
mod macros;
pub mod model;
pub mod service;

pub type Error = anyhow::Error;
pub type Result<T> = anyhow::Result<T>;
