//! SVM-light style sparse text format.
//!
//! One example per line: `<label> <index>:<value> <index>:<value> ...`,
//! tokens separated by spaces or tabs. Blank lines and lines starting with
//! `#` are skipped; a token starting with `#` ends the line.
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use csv::WriterBuilder;

use crate::error::{ClassifierError, Result};
use crate::math::SparseVector;
use crate::models::Label;

/// One parsed line.
#[derive(Clone, Debug, PartialEq)]
pub struct SvmLightRecord {
    /// 1-based line number in the source.
    pub line: usize,
    /// `None` when the source is read as unlabeled.
    pub label: Option<Label>,
    pub features: SparseVector,
}

/// Streaming reader over SVM-light lines.
pub struct SvmLightReader<R: Read> {
    reader: BufReader<R>,
    buffer: String,
    line: usize,
    labeled: bool,
}

impl SvmLightReader<File> {
    pub fn from_path<P: AsRef<Path>>(path: P, labeled: bool) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::from_reader(file, labeled))
    }
}

impl<R: Read> SvmLightReader<R> {
    pub fn from_reader(rdr: R, labeled: bool) -> Self {
        Self {
            reader: BufReader::new(rdr),
            buffer: String::new(),
            line: 0,
            labeled,
        }
    }

    /// Next non-empty line, or `None` at end of input.
    pub fn next_record(&mut self) -> Result<Option<SvmLightRecord>> {
        loop {
            self.buffer.clear();
            if self.reader.read_line(&mut self.buffer)? == 0 {
                return Ok(None);
            }
            self.line += 1;
            if let Some(parsed) = parse_line(&self.buffer, self.line, self.labeled)? {
                return Ok(Some(parsed));
            }
        }
    }
}

impl<R: Read> Iterator for SvmLightReader<R> {
    type Item = Result<SvmLightRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

/// Parse a single line. Returns `Ok(None)` for blank and comment-only lines.
pub fn parse_line(text: &str, line: usize, labeled: bool) -> Result<Option<SvmLightRecord>> {
    let mut tokens = text
        .split_whitespace()
        .take_while(|token| !token.starts_with('#'))
        .peekable();
    if tokens.peek().is_none() {
        return Ok(None);
    }

    let label = if labeled {
        tokens.next().map(|token| parse_label(token, line)).transpose()?
    } else {
        None
    };
    let entries = tokens
        .map(|token| parse_feature(token, line))
        .collect::<Result<Vec<_>>>()?;
    Ok(Some(SvmLightRecord {
        line,
        label,
        features: SparseVector::from_unsorted(entries),
    }))
}

/// Read every example of a file into memory.
pub fn read_examples<P: AsRef<Path>>(path: P, labeled: bool) -> Result<Vec<SvmLightRecord>> {
    SvmLightReader::from_path(path, labeled)?.collect()
}

fn parse_error(line: usize, message: String) -> ClassifierError {
    ClassifierError::Parse { line, message }
}

fn parse_label(token: &str, line: usize) -> Result<Label> {
    let value = match token.parse::<i64>() {
        Ok(value) => value,
        Err(_) => match token.parse::<f64>() {
            Ok(value) if value.fract() == 0.0 && value.abs() <= i64::MAX as f64 => value as i64,
            _ => return Err(parse_error(line, format!("invalid label '{}'", token))),
        },
    };
    Label::try_from(value)
        .map_err(|_| parse_error(line, format!("label must be +1 or -1, got '{}'", token)))
}

fn parse_feature(token: &str, line: usize) -> Result<(u32, f32)> {
    let (index, value) = token
        .split_once(':')
        .ok_or_else(|| parse_error(line, format!("expected <index>:<value>, got '{}'", token)))?;
    let index = index
        .parse::<u32>()
        .map_err(|_| parse_error(line, format!("invalid feature index '{}'", index)))?;
    let value = value
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| parse_error(line, format!("invalid feature value '{}'", value)))?;
    Ok((index, value))
}

/// Write one `score<TAB>prediction` row per score, predicting `+1` when the
/// score is at least `threshold`.
pub fn write_predictions<P: AsRef<Path>>(path: P, scores: &[f32], threshold: f32) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_path(path)?;
    for &score in scores {
        let prediction = if score >= threshold { "+1" } else { "-1" };
        writer.write_record([score.to_string().as_str(), prediction])?;
    }
    writer.flush()?;
    Ok(())
}
