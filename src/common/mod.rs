pub mod color;
pub mod frame;

pub use color::{Color, HsvColor};
pub use frame::Frame;
