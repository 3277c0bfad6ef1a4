pub mod parse;
pub mod profile;
