use serde::{Deserialize, Serialize};

use crate::pipeline::structuring::parser::lenient_text;

/// Eligibility verdict for one (patient, trial) pair.
///
/// `matched` is the only strictly typed field: a verdict without a boolean
/// `match` is malformed and rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchVerdict {
    #[serde(default, deserialize_with = "lenient_text")]
    pub trial_id: String,
    #[serde(rename = "match")]
    pub matched: bool,
    #[serde(default, deserialize_with = "lenient_text")]
    pub eligibility_criteria_met: String,
}
