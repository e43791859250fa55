//! Readers and writers for example files.
pub mod svmlight;

pub use svmlight::{
    parse_line, read_examples, write_predictions, SvmLightReader, SvmLightRecord,
};
