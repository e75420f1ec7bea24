use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::pipeline::structuring::parser::{lenient_age, lenient_text, text_or_list};

/// Demographics plus raw condition/medication entries from one FHIR bundle.
///
/// Intermediate form: the entries are kept verbatim and only normalized by
/// the extraction gateway.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPatientBundle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    /// FHIR `HumanName` array, verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    #[serde(default)]
    pub conditions_list: Vec<Value>,
    #[serde(default)]
    pub medication_list: Vec<Value>,
    /// File the bundle was read from. Not sent to the inference capability.
    #[serde(skip)]
    pub source_file: String,
}

impl RawPatientBundle {
    pub fn has_demographics(&self) -> bool {
        self.patient_id.is_some()
    }
}

/// Normalized patient features. Identity: `patient_id`; `name` is display only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    #[serde(alias = "id", deserialize_with = "lenient_text")]
    pub patient_id: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_age")]
    pub age: Option<u32>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub gender: String,
    #[serde(default, deserialize_with = "text_or_list")]
    pub conditions: Vec<String>,
    #[serde(default, deserialize_with = "text_or_list")]
    pub medications: Vec<String>,
}
