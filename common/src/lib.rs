pub mod file_format;
pub mod file_utils;
pub mod log_setup;
pub mod normalize_string;
pub mod serde;
pub mod test_utils;

pub use file_format::FileFormat;
