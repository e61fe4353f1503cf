pub mod config;
pub mod controller;
pub mod conversation;
pub mod credentials;
pub mod gateway;
pub mod message;
pub mod params;
