use serde::{Deserialize, Serialize};

use crate::error::ClassifierError;

/// Binary class label. Public entry points take `+1` / `-1` integers and
/// convert through `TryFrom`, rejecting anything else.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    Positive,
    Negative,
}

impl Label {
    pub fn sign(self) -> f32 {
        match self {
            Label::Positive => 1.0,
            Label::Negative => -1.0,
        }
    }

    pub fn as_i32(self) -> i32 {
        match self {
            Label::Positive => 1,
            Label::Negative => -1,
        }
    }

    pub fn is_positive(self) -> bool {
        self == Label::Positive
    }
}

impl TryFrom<i64> for Label {
    type Error = ClassifierError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Label::Positive),
            -1 => Ok(Label::Negative),
            other => Err(ClassifierError::InvalidLabel(other)),
        }
    }
}

impl TryFrom<i32> for Label {
    type Error = ClassifierError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Label::try_from(value as i64)
    }
}

impl From<Label> for i32 {
    fn from(label: Label) -> Self {
        label.as_i32()
    }
}
