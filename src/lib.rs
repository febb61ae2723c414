pub mod board;
pub mod config;
pub mod db_reader;
pub mod deploy;
pub mod fixture;
pub mod http_client;
pub mod logging;
pub mod markup;
pub mod probe;
pub mod refresher;
pub mod share;
pub mod site_builder;
pub mod time_label;
