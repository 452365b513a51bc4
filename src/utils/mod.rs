pub mod dates;
pub mod json;
