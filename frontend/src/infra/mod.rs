pub mod feed_client;
pub mod local_storage;
pub mod terminal;
pub mod web;
