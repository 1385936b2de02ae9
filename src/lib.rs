pub mod annict;
pub mod channel;
pub mod config;
pub mod model;
pub mod recording;
pub mod season;
pub mod selection;
pub mod web;
