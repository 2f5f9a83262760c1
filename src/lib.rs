//! rmdemux - RealMedia demuxing tool
//!
//! This library crate exposes the configuration layer for integration testing.

pub mod config;
