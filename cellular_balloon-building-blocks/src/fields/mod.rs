mod image_field;

pub use image_field::*;
