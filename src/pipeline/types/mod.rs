mod color_category;
mod color_sample;
mod gate_decision;

pub use color_category::ColorCategory;
pub use color_sample::ColorSample;
pub use gate_decision::{AcceptedChange, GateDecision, GateRejection};
