pub mod commands;
pub mod health_poller;
pub mod image_poller;

pub use commands::{DockerCommands, run_sequence};
pub use health_poller::HealthPoller;
pub use image_poller::ImagePoller;
