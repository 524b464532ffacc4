pub mod access;
pub mod archive_fetch;
pub mod chart;
pub mod config;
pub mod details;
pub mod error;
pub mod feed;
pub mod history;
pub mod history_cache;
pub mod http_client;
pub mod keys;
pub mod logging;
pub mod odds;
pub mod record;
pub mod state;
pub mod timeline;
pub mod win_prob;
