pub mod command_log;
pub mod config;
pub mod error;
pub mod planning_store;
pub mod rest_client;
pub mod storage;
pub mod task_catalog;
