pub mod calculator;
pub mod database;
pub mod handlers;
pub mod ledger;
pub mod middleware;
pub mod models;
pub mod utils;
