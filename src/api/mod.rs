pub mod affiliations;
pub mod assets;
pub mod assigned_assets;
pub mod auth;
pub mod billing;
pub mod health;
pub mod packages;
pub mod requests;
