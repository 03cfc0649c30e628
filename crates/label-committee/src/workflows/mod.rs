pub mod committee;
pub mod import;
