mod transitioner;

pub use transitioner::{interpolate, Transitioner};
