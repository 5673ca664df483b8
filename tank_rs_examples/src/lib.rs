//! Runnable examples of tank_rs, see `examples/`.
//!
//! ```text
//! cargo run --example resnet50 -- --frontend torch
//! ```
