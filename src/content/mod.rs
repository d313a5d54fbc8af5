//! Content module - post models, markup rendering and legacy import

pub mod markup;
pub mod migrate;
mod post;

pub use post::{generate_id, Draft, ImageRef, Position, Post, ScheduledPost};
