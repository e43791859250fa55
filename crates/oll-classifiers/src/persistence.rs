//! Binary model files.
//!
//! A model file is a small header (`OLL1` magic and a format version)
//! followed by the serialized [`Model`], both encoded with bincode's standard
//! configuration. Floats are stored by bit pattern, so a loaded model scores
//! and trains exactly like the one that was saved.
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ClassifierError, Result};
use crate::models::Model;

pub const MAGIC: [u8; 4] = *b"OLL1";
pub const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Header {
    magic: [u8; 4],
    version: u32,
}

fn format_error<E: std::fmt::Display>(err: E) -> ClassifierError {
    ClassifierError::Format(err.to_string())
}

/// Encode a model into the on-disk byte layout.
pub fn encode_model(model: &Model) -> Result<Vec<u8>> {
    let config = bincode::config::standard();
    let header = Header {
        magic: MAGIC,
        version: FORMAT_VERSION,
    };
    let mut bytes = bincode::serde::encode_to_vec(&header, config).map_err(format_error)?;
    bytes.extend(bincode::serde::encode_to_vec(model, config).map_err(format_error)?);
    Ok(bytes)
}

/// Decode bytes produced by [`encode_model`]. The decoded model is checked
/// with [`Model::validate`] before it is returned.
pub fn decode_model(bytes: &[u8]) -> Result<Model> {
    let config = bincode::config::standard();
    let (header, offset): (Header, usize) =
        bincode::serde::decode_from_slice(bytes, config).map_err(format_error)?;
    if header.magic != MAGIC {
        return Err(ClassifierError::Format("not an oll model file".to_string()));
    }
    if header.version != FORMAT_VERSION {
        return Err(ClassifierError::Format(format!(
            "unsupported format version {} (expected {})",
            header.version, FORMAT_VERSION
        )));
    }
    let (model, read): (Model, usize) =
        bincode::serde::decode_from_slice(&bytes[offset..], config).map_err(format_error)?;
    if offset + read != bytes.len() {
        return Err(ClassifierError::Format(format!(
            "{} trailing bytes after model",
            bytes.len() - offset - read
        )));
    }
    model.validate()?;
    Ok(model)
}

pub fn save_model<P: AsRef<Path>>(model: &Model, path: P) -> Result<()> {
    let bytes = encode_model(model)?;
    fs::write(&path, &bytes)?;
    log::info!(
        "Saved {} model ({} examples, {} updates) to {}",
        model.method(),
        model.examples_seen(),
        model.updates(),
        path.as_ref().display()
    );
    Ok(())
}

pub fn load_model<P: AsRef<Path>>(path: P) -> Result<Model> {
    let bytes = fs::read(&path)?;
    let model = decode_model(&bytes)?;
    log::info!(
        "Loaded {} model ({} examples, {} updates) from {}",
        model.method(),
        model.examples_seen(),
        model.updates(),
        path.as_ref().display()
    );
    Ok(model)
}
