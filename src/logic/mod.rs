pub mod fetch;
pub mod normalize;

pub use fetch::{FetchMessage, FetchOrchestrator, FetchRequest};
