pub mod config;
pub mod init;
pub mod route;
pub mod run;
pub mod stats;
pub mod version;
