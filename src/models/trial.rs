use serde::{Deserialize, Serialize};

use crate::pipeline::structuring::parser::{lenient_text, text_or_list};

/// One page of the registry `studies` query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTrialPage {
    #[serde(default)]
    pub studies: Vec<RawStudy>,
    #[serde(default)]
    pub next_page_token: Option<String>,
    #[serde(default)]
    pub total_count: Option<u64>,
}

impl RawTrialPage {
    /// Continuation cursor. An empty token counts as exhausted.
    pub fn cursor(&self) -> Option<&str> {
        self.next_page_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// A study as projected by `fields=EligibilityCriteria|NCTId|BriefTitle`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStudy {
    #[serde(default)]
    pub protocol_section: ProtocolSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolSection {
    #[serde(default)]
    pub identification_module: IdentificationModule,
    #[serde(default)]
    pub eligibility_module: EligibilityModule,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentificationModule {
    #[serde(default)]
    pub nct_id: Option<String>,
    #[serde(default)]
    pub brief_title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityModule {
    #[serde(default)]
    pub eligibility_criteria: Option<String>,
}

impl RawStudy {
    #[cfg(test)]
    pub fn new(nct_id: &str, brief_title: &str, eligibility_criteria: &str) -> Self {
        Self {
            protocol_section: ProtocolSection {
                identification_module: IdentificationModule {
                    nct_id: Some(nct_id.to_string()),
                    brief_title: Some(brief_title.to_string()),
                },
                eligibility_module: EligibilityModule {
                    eligibility_criteria: Some(eligibility_criteria.to_string()),
                },
            },
        }
    }

    pub fn nct_id(&self) -> Option<&str> {
        self.protocol_section.identification_module.nct_id.as_deref()
    }

    pub fn brief_title(&self) -> Option<&str> {
        self.protocol_section.identification_module.brief_title.as_deref()
    }

    pub fn eligibility_criteria(&self) -> Option<&str> {
        self.protocol_section
            .eligibility_module
            .eligibility_criteria
            .as_deref()
    }
}

/// Normalized eligibility features of one trial. Identity: `trial_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialRecord {
    #[serde(alias = "nctId", deserialize_with = "lenient_text")]
    pub trial_id: String,
    #[serde(alias = "briefTitle", deserialize_with = "lenient_text")]
    pub trial_name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub age_range: String,
    #[serde(default, deserialize_with = "text_or_list")]
    pub inclusion_criteria: Vec<String>,
    #[serde(default, deserialize_with = "text_or_list")]
    pub exclusion_criteria: Vec<String>,
}
