#![allow(dead_code)]

pub mod color;
pub mod error;
pub mod features;
pub mod graph;
pub mod overlay;
pub mod partition;
pub mod pipeline;
pub mod raster;

pub use error::{Error, Result};
