pub mod image_io;

pub use image_io::{
    load_image, load_images_from_directory, save_image, save_images_to_directory, save_png,
    save_tiff,
};
