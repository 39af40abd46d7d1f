pub mod category;
pub mod music;
