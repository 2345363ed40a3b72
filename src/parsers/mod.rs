pub mod images;

#[cfg(test)]
mod tests;

pub use images::{ImageExtractor, ImagePattern};
