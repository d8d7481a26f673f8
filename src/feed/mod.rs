//! Feed shaping: stable pagination and lazyload windows over the
//! flattened visible feed.

pub mod cursor;
pub mod lazyload;
pub mod paginator;

pub use cursor::Cursor;
pub use lazyload::{LazyloadSlice, LazyloadWindow};
pub use paginator::{Page, Paginator};
