pub mod json;
pub mod svg;
