pub mod assets;
pub mod health;
pub mod performance;
pub mod portfolio;
pub mod sentiment;
