//! Data models for copyright-waiver

pub mod commit;
pub mod license;
pub mod repository;
pub mod summary;

pub use commit::*;
pub use license::*;
pub use repository::*;
pub use summary::*;
