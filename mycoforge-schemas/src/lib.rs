pub mod curve;
pub mod file_formats;
pub mod inputs;
pub mod preset;
pub mod record;
