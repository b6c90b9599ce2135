pub mod color_pipeline;
pub mod context;
pub mod services;
pub mod types;

pub use color_pipeline::{ColorPipeline, ColorPipelineBuilder, TickReport};
pub use context::{PipelineMetrics, PipelineStats};
pub use types::{AcceptedChange, ColorCategory, ColorSample, GateDecision, GateRejection};
