use serde::{Deserialize, Serialize};

use crate::pipeline::matching::MatchMatrix;

use super::OutputError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibleTrial {
    pub trial_id: String,
    pub trial_name: String,
    pub eligibility_criteria_met: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientEligibility {
    pub patient_id: String,
    pub patient_name: String,
    pub eligible_trials: Vec<EligibleTrial>,
}

/// Per-patient list of matched trials, in matrix order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EligibilityReport(pub Vec<PatientEligibility>);

/// Keep only evaluated cells whose verdict matched. Every patient row of the
/// matrix gets an entry, possibly with no trials.
pub fn assemble(matrix: &MatchMatrix) -> EligibilityReport {
    let entries = matrix
        .iter()
        .map(|(patient_id, row)| PatientEligibility {
            patient_id: patient_id.to_string(),
            patient_name: row.patient_name.clone(),
            eligible_trials: row
                .trials
                .iter()
                .filter_map(|(trial_id, cell)| {
                    let verdict = cell.outcome.verdict().filter(|v| v.matched)?;
                    Some(EligibleTrial {
                        trial_id: trial_id.clone(),
                        trial_name: cell.trial_name.clone(),
                        eligibility_criteria_met: verdict.eligibility_criteria_met.clone(),
                    })
                })
                .collect(),
        })
        .collect();

    EligibilityReport(entries)
}

/// CSV header, in column order.
const CSV_HEADER: [&str; 5] = [
    "patientId",
    "patientName",
    "trialId",
    "trialName",
    "eligibilityCriteriaMet",
];

impl EligibilityReport {
    pub fn entries(&self) -> &[PatientEligibility] {
        &self.0
    }

    pub fn eligible_count(&self) -> usize {
        self.0.iter().map(|p| p.eligible_trials.len()).sum()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// One row per (patient, eligible trial). A patient without eligible
    /// trials gets a single row with the trial columns left empty.
    pub fn to_csv(&self) -> Result<Vec<u8>, OutputError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(CSV_HEADER)?;

        for patient in &self.0 {
            if patient.eligible_trials.is_empty() {
                writer.write_record([patient.patient_id.as_str(), patient.patient_name.as_str(), "", "", ""])?;
                continue;
            }
            for trial in &patient.eligible_trials {
                writer.write_record([
                    patient.patient_id.as_str(),
                    patient.patient_name.as_str(),
                    trial.trial_id.as_str(),
                    trial.trial_name.as_str(),
                    trial.eligibility_criteria_met.as_str(),
                ])?;
            }
        }

        writer
            .into_inner()
            .map_err(|e| OutputError::Io {
                path: "<csv buffer>".into(),
                source: std::io::Error::other(e.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchVerdict;
    use crate::pipeline::matching::{CellOutcome, MatchCell};

    fn cell(trial_name: &str, matched: bool, met: &str) -> MatchCell {
        MatchCell {
            trial_name: trial_name.into(),
            outcome: CellOutcome::Evaluated {
                verdict: MatchVerdict {
                    trial_id: "echo".into(),
                    matched,
                    eligibility_criteria_met: met.into(),
                },
            },
        }
    }

    /// Alice matches T1, Bob matches T2, Carol's only cell is unknown.
    fn matrix() -> MatchMatrix {
        let mut matrix = MatchMatrix::seeded([
            ("p-a".to_string(), "Alice".to_string()),
            ("p-b".to_string(), "Bob".to_string()),
            ("p-c".to_string(), "Carol".to_string()),
        ]);
        matrix.record("p-a", "Alice", "NCT1", cell("T1", true, "Age 18-65; Prediabetes"));
        matrix.record("p-a", "Alice", "NCT2", cell("T2", false, ""));
        matrix.record("p-b", "Bob", "NCT1", cell("T1", false, ""));
        matrix.record("p-b", "Bob", "NCT2", cell("T2", true, "Age"));
        matrix.record(
            "p-c",
            "Carol",
            "NCT1",
            MatchCell {
                trial_name: "T1".into(),
                outcome: CellOutcome::Unknown { reason: "timeout".into() },
            },
        );
        matrix
    }

    #[test]
    fn keeps_only_matched_cells() {
        let report = assemble(&matrix());
        let entries = report.entries();

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].patient_name, "Alice");
        assert_eq!(
            entries[0].eligible_trials,
            vec![EligibleTrial {
                trial_id: "NCT1".into(),
                trial_name: "T1".into(),
                eligibility_criteria_met: "Age 18-65; Prediabetes".into(),
            }]
        );
        assert_eq!(entries[1].eligible_trials.len(), 1);
        assert_eq!(entries[1].eligible_trials[0].trial_name, "T2");
        assert!(entries[2].eligible_trials.is_empty());
        assert_eq!(report.eligible_count(), 2);
    }

    #[test]
    fn trial_id_comes_from_matrix_key() {
        let report = assemble(&matrix());
        assert_eq!(report.entries()[1].eligible_trials[0].trial_id, "NCT2");
    }

    #[test]
    fn assembly_is_idempotent() {
        let matrix = matrix();
        let first = assemble(&matrix).to_json().unwrap();
        let second = assemble(&matrix).to_json().unwrap();
        assert_eq!(first, second);
        assert_eq!(assemble(&matrix).to_csv().unwrap(), assemble(&matrix).to_csv().unwrap());
    }

    #[test]
    fn json_shape() {
        let value = serde_json::to_value(assemble(&matrix())).unwrap();
        assert_eq!(value[0]["patientId"], "p-a");
        assert_eq!(value[0]["eligibleTrials"][0]["eligibilityCriteriaMet"], "Age 18-65; Prediabetes");
        assert_eq!(value[2]["eligibleTrials"], serde_json::json!([]));
    }

    #[test]
    fn csv_has_one_row_per_eligible_trial() {
        let csv = String::from_utf8(assemble(&matrix()).to_csv().unwrap()).unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(
            lines,
            vec![
                "patientId,patientName,trialId,trialName,eligibilityCriteriaMet",
                "p-a,Alice,NCT1,T1,Age 18-65; Prediabetes",
                "p-b,Bob,NCT2,T2,Age",
                "p-c,Carol,,,",
            ]
        );
    }

    #[test]
    fn csv_quotes_embedded_separators() {
        let mut matrix = MatchMatrix::default();
        matrix.record("p-a", "Smith, Alice", "NCT1", cell("T1", true, "Age, \"adult\""));
        let csv = String::from_utf8(assemble(&matrix).to_csv().unwrap()).unwrap();
        assert!(csv.contains("p-a,\"Smith, Alice\",NCT1,T1,\"Age, \"\"adult\"\"\""));
    }

    #[test]
    fn empty_matrix_yields_header_only() {
        let report = assemble(&MatchMatrix::default());
        assert!(report.entries().is_empty());
        assert_eq!(report.to_json().unwrap(), "[]");
        let csv = String::from_utf8(report.to_csv().unwrap()).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }
}
