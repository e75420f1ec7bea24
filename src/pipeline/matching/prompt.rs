use crate::models::{PatientRecord, TrialRecord};

pub const MATCH_SYSTEM_PROMPT: &str =
    "You are a medical assistant helping to match patients to clinical trials.";

/// Build the classification prompt for one pair. Both records are embedded
/// as compact JSON.
pub fn build_match_prompt(
    patient: &PatientRecord,
    trial: &TrialRecord,
) -> Result<String, serde_json::Error> {
    let patient_json = serde_json::to_string(patient)?;
    let trial_json = serde_json::to_string(trial)?;

    Ok(format!(
        "Given the following patient information and clinical trial eligibility criteria, \
determine whether the patient is eligible for the trial.\n\n\
Patient:\n{patient_json}\n\n\
Clinical trial:\n{trial_json}\n\n\
Respond with a JSON object with these keys:\n\
- trialId (the trial's trialId)\n\
- match (true if the patient meets the eligibility criteria, otherwise false)\n\
- eligibilityCriteriaMet (the criteria the patient meets, as text)\n\n\
Example: {{\"trialId\": \"{}\", \"match\": true, \"eligibilityCriteriaMet\": \"...\"}}",
        trial.trial_id
    ))
}
