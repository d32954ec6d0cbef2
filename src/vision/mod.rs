// Vision module for expression classification of gated camera frames

mod classifier;

pub use classifier::{EmotionClassifier, EmotionLabel};
