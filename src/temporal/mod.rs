//! Durations and window boundaries over integer and temporal index columns

pub mod duration;
pub mod window;

pub use self::duration::{Duration, IndexKind, IntoDuration};
pub use self::window::{StartBy, WindowClosed};
