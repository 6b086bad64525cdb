//! Presentation layer: serializable views of feed and entity data.

pub mod views;
