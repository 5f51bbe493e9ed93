//! imagery-service: category-routed image discovery with a daily cache.
pub mod config;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
