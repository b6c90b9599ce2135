mod temporal_smoother;

pub use temporal_smoother::TemporalSmoother;
