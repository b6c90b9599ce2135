pub mod capture;
pub mod cli;
pub mod common;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod logging;
pub mod pipeline;

pub use common::{Color, Frame};
pub use config::Configuration;
pub use coordinator::{Coordinator, CoordinatorBuilder};
pub use error::AppError;
