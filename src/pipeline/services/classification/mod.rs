mod color_classifier;

pub use color_classifier::ColorClassifier;
