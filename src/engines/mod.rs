//! Search engine implementations.

// Online engines
mod duckduckgo;
mod wikipedia;

// Offline engines
mod bookmarks;

pub use duckduckgo::DuckDuckGo;
pub use wikipedia::Wikipedia;

pub use bookmarks::{Bookmark, Bookmarks};
