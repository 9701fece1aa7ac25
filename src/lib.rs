//! spritedb - Library for schema-driven game content tables and sprite
//! composition
//!
//! This library provides functionality to:
//! - Validate table records against a typed schema registry
//! - Load tilesheets and cut color-keyed base sprites from them
//! - Resolve composite sprite definitions, forward references included
//! - Write composed sprites to PNG images

pub mod cli;
pub mod color;
pub mod datasource;
pub mod geometry;
pub mod loader;
pub mod models;
pub mod output;
pub mod schema;
pub mod sheets;
pub mod slicer;
pub mod sprites;
pub mod typedef;
pub mod validate;
