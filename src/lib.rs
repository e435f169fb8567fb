//! boxfix - bounding-box annotation review tool
//!
//! Walks a single image or a directory of images and lets the user draw,
//! select, delete and relabel axis-aligned boxes with mouse and keyboard.
//! Boxes are stored one text file per image, one normalized record per line,
//! and every edit is written back immediately.
//!
//! The editing core ([`editor`], [`session`]) does not depend on any window
//! system; it talks to a [`frontend::Frontend`] and an
//! [`images::ImageSource`]. [`native`] provides the winit + wgpu window.

pub mod classes;
pub mod collection;
pub mod config;
pub mod constants;
pub mod detector;
pub mod editor;
pub mod format;
pub mod frontend;
pub mod geometry;
pub mod images;
pub mod keybindings;
pub mod native;
pub mod palette;
pub mod render;
pub mod session;
