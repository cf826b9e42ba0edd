pub mod components;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod scheduler;
pub mod shutdown;
pub mod startup;
pub mod utils;
