//! School photography catalog: schools, classes, events, students and
//! their photos, with a paginated public gallery over them.

pub mod catalog;
pub mod config;
pub mod db;
pub mod logging;
pub mod server;
