pub mod browser;
pub mod cache;
pub mod extract;
pub mod fetch;
pub mod filter;
pub mod metadata;
pub mod scan;
pub mod score;

pub use browser::*;
pub use cache::*;
pub use fetch::*;
pub use scan::*;
