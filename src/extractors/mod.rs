pub mod image;
pub mod office;
pub mod pdf;
