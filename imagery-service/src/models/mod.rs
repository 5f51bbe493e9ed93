pub mod image;

pub use image::{Category, DailyRecord, ImageResult};
