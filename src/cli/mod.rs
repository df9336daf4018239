//! CLI command handlers

pub mod commands;

pub use commands::{inspect, matrix, render, MatrixArgs, RenderArgs};
