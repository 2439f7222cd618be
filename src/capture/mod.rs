//! Screen capture: decoded frames and the age-gated screenshot cache.

pub mod cache;
pub mod frame;

pub use cache::ScreenshotCache;
pub use frame::{Frame, Region};
