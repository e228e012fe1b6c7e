// Machine Learning Module

pub mod artifact;
pub mod frame;
pub mod invoker;
pub mod model;
pub mod source;

// Expose key types and functions
pub use artifact::{load_artifact, ArtifactFormat};
pub use frame::FeatureFrame;
pub use invoker::PredictionInvoker;
pub use model::{LinearModel, ModelArtifact, RegressionModel, RegressionTree, TreeEnsemble, TreeNode};
pub use source::{model_source_from_config, FileModelSource, ModelSource, PreloadedModelSource};
