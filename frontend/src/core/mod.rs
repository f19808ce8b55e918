pub mod app;
pub mod feed;
pub mod input;
pub mod models;
pub mod pages;
pub mod player;
pub mod settings;
pub mod storage;
