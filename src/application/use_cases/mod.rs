//! Use case implementations.

mod load_images_use_case;

pub use load_images_use_case::{DescribeHandle, LoadImagesUseCase};
