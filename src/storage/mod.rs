pub mod db;
pub mod error;
pub mod page_cache;
pub mod playlists;
pub(crate) mod schema;
