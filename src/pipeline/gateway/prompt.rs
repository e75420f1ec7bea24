use chrono::NaiveDate;

use crate::models::{RawPatientBundle, RawStudy};

/// Response key holding the patient record list.
pub const PATIENTS_KEY: &str = "patients";
/// Response key holding the trial record list.
pub const TRIALS_KEY: &str = "clinicalTrials";

pub const PATIENT_SYSTEM_PROMPT: &str = "You are a medical assistant extracting structured \
patient information. You always return just the JSON with no additional description or context.";

pub const TRIAL_SYSTEM_PROMPT: &str = "You are a medical assistant extracting structured \
clinical trial information from the clinicaltrials.gov website data. You always return just \
the JSON with no additional description or context.";

/// Build the patient feature prompt. Each bundle is embedded as one JSON line.
pub fn build_patient_prompt(
    bundles: &[RawPatientBundle],
    reference_date: NaiveDate,
) -> Result<String, serde_json::Error> {
    let mut records = String::new();
    for (i, bundle) in bundles.iter().enumerate() {
        records.push_str(&format!("Patient {}:\n{}\n\n", i + 1, serde_json::to_string(bundle)?));
    }

    Ok(format!(
        "You are a medical assistant. For each patient in the following JSON data, extract the \
following patient details:\n\
- patientId (copy the entire id directly from the data)\n\
- name (use the given name)\n\
- age (whole years, calculated from birthDate as of {reference_date})\n\
- gender\n\
- conditions (medical conditions / diagnoses, as a list of strings)\n\
- medications (as a list of strings)\n\n\
Return exactly one record per patient. If a field is missing in the data, use null.\n\n\
Patient information:\n\
{records}\
Respond with a JSON object of the form:\n\
{{\"{PATIENTS_KEY}\": [{{\"patientId\": \"...\", \"name\": \"...\", \"age\": 0, \"gender\": \"...\", \
\"conditions\": [\"...\"], \"medications\": [\"...\"]}}]}}"
    ))
}

/// Build the trial feature prompt from registry studies.
pub fn build_trial_prompt(studies: &[&RawStudy]) -> String {
    let mut trials = String::new();
    for study in studies {
        trials.push_str(&format!(
            "Trial Id: {}\nTrial Name: {}\nEligibilityCriteria: {}\n\n",
            study.nct_id().unwrap_or_default(),
            study.brief_title().unwrap_or_default(),
            study.eligibility_criteria().unwrap_or("Not provided"),
        ));
    }

    format!(
        "You are a medical assistant. For each clinical trial in the following data, extract the \
following clinical trial information:\n\
- trialId (the Trial Id, verbatim)\n\
- trialName (the Trial Name, verbatim)\n\
- ageRange\n\
- inclusionCriteria (list of strings)\n\
- exclusionCriteria (list of strings, empty if none)\n\n\
Clinical Trial data:\n\
{trials}\
Respond with a JSON object of the form:\n\
{{\"{TRIALS_KEY}\": [{{\"trialId\": \"...\", \"trialName\": \"...\", \"ageRange\": \"...\", \
\"inclusionCriteria\": [\"...\"], \"exclusionCriteria\": [\"...\"]}}]}}"
    )
}
