// Library exports for batchart

pub mod config;
pub mod error;
pub mod event;
pub mod graph;
pub mod palette;
pub mod parser;
pub mod runtime;
pub mod session;
pub mod source;

// Data pipeline
pub mod binner;
pub mod stacker;
pub mod scale;
pub mod ticks;
pub mod layout;

// Interactive chart
pub mod interaction;
pub mod chart;

// Scene construction and rendering
pub mod ir;
pub mod compiler;
