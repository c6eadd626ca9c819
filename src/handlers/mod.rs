pub mod auth;
pub mod content;
pub mod crafting;
pub mod dashboard;
pub mod profiles;
pub mod treasury;
