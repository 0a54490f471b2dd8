pub mod chat;
pub mod config;
pub mod conversation;
pub mod export;
pub mod message;
pub mod settings;
pub mod storage;
pub mod store;
pub mod title;
