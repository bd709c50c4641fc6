//! Progressive Mandelbrot explorer.
//!
//! Window, input, GPU and overlay plumbing around the `tilecache` core: the
//! core decides which tiles to compute each frame, this crate streams them
//! into a texture array and draws them.

pub mod app;
pub mod config;
pub mod controls;
pub mod hud;
pub mod renderer;
