use serde::{Deserialize, Serialize};

use crate::error::RecordError;

/// One recorded satisfaction of a contract by a concrete type.
///
/// Serializes as `{"text":…,"synthetic":…,"types":[…]}`, the shape the
/// rendering layer reads. `types` is never empty, also when deserializing.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawRecord")]
pub struct ImplementorRecord {
    text: String,
    synthetic: bool,
    types: Vec<String>,
}

#[derive(Deserialize)]
struct RawRecord {
    text: String,
    synthetic: bool,
    types: Vec<String>,
}

impl TryFrom<RawRecord> for ImplementorRecord {
    type Error = RecordError;

    fn try_from(raw: RawRecord) -> Result<Self, Self::Error> {
        Self::new(raw.text, raw.synthetic, raw.types)
    }
}

impl ImplementorRecord {
    pub fn new(
        text: impl Into<String>,
        synthetic: bool,
        types: Vec<String>,
    ) -> Result<Self, RecordError> {
        if types.is_empty() {
            return Err(RecordError::EmptyTypePath);
        }
        Ok(Self {
            text: text.into(),
            synthetic,
            types,
        })
    }

    /// Markup describing the impl. Not parsed downstream.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    pub fn types(&self) -> &[String] {
        &self.types
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_in_field_order() {
        let record =
            ImplementorRecord::new("impl Sync for ChaCha", false, vec!["chacha::ChaCha".into()])
                .unwrap();
        insta::assert_snapshot!(
            serde_json::to_string(&record).unwrap(),
            @r#"{"text":"impl Sync for ChaCha","synthetic":false,"types":["chacha::ChaCha"]}"#
        );
    }

    #[test]
    fn empty_type_path_is_rejected() {
        assert_eq!(
            ImplementorRecord::new("impl Sync for ()", true, vec![]),
            Err(RecordError::EmptyTypePath)
        );
    }

    #[test]
    fn deserializing_an_empty_type_path_fails() {
        let result: Result<ImplementorRecord, _> =
            serde_json::from_str(r#"{"text":"x","synthetic":false,"types":[]}"#);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("empty type path"), "{err}");
    }
}
