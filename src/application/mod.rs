//! Application services orchestrating domain rules over the stores.

pub mod error;
pub mod feed;
pub mod follows;
pub mod guard;
pub mod pagination;
pub mod posts;
pub mod repos;
