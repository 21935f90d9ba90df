pub mod blur;
pub mod config;
pub mod degradation;
pub mod downsampling;
pub mod image_model;
pub mod motion;
pub mod noise;

pub use blur::BlurModule;
pub use config::DegradationConfig;
pub use degradation::{convert_kernel_to_operator_matrix, DegradationOperator, LinearOperatorMatrix};
pub use downsampling::DownsamplingModule;
pub use image_model::ImageModel;
pub use motion::MotionModule;
pub use noise::AdditiveNoiseModule;
