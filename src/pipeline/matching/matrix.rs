use serde::{Deserialize, Serialize};

use crate::models::MatchVerdict;

/// Result of classifying one (patient, trial) cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CellOutcome {
    Evaluated { verdict: MatchVerdict },
    /// Classification failed; `reason` is the logged error.
    Unknown { reason: String },
}

impl CellOutcome {
    pub fn verdict(&self) -> Option<&MatchVerdict> {
        match self {
            Self::Evaluated { verdict } => Some(verdict),
            Self::Unknown { .. } => None,
        }
    }

    pub fn is_match(&self) -> bool {
        self.verdict().is_some_and(|v| v.matched)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchCell {
    pub trial_name: String,
    pub outcome: CellOutcome,
}

/// One patient's row of the matrix, trials in input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientMatches {
    pub patient_name: String,
    #[serde(with = "keyed")]
    pub trials: Vec<(String, MatchCell)>,
}

/// Verdicts for the patient × trial cross product, keyed by patient id then
/// trial id. Serializes as nested JSON objects in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchMatrix {
    #[serde(with = "keyed")]
    patients: Vec<(String, PatientMatches)>,
}

/// Cell counts for logging and the run summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MatchSummary {
    pub patients: usize,
    pub cells: usize,
    pub evaluated: usize,
    pub matched: usize,
    pub unknown: usize,
}

impl MatchMatrix {
    /// Matrix with one empty row per patient, given as `(id, name)`.
    pub fn seeded<I>(patients: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            patients: patients
                .into_iter()
                .map(|(id, patient_name)| {
                    (
                        id,
                        PatientMatches {
                            patient_name,
                            trials: Vec::new(),
                        },
                    )
                })
                .collect(),
        }
    }

    /// Append a cell to the patient's row, creating the row if needed.
    pub fn record(&mut self, patient_id: &str, patient_name: &str, trial_id: &str, cell: MatchCell) {
        let row = match self.patients.iter().position(|(id, _)| id == patient_id) {
            Some(index) => &mut self.patients[index].1,
            None => {
                self.patients.push((
                    patient_id.to_string(),
                    PatientMatches {
                        patient_name: patient_name.to_string(),
                        trials: Vec::new(),
                    },
                ));
                let last = self.patients.len() - 1;
                &mut self.patients[last].1
            }
        };
        row.trials.push((trial_id.to_string(), cell));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PatientMatches)> {
        self.patients.iter().map(|(id, row)| (id.as_str(), row))
    }

    pub fn get(&self, patient_id: &str) -> Option<&PatientMatches> {
        self.patients
            .iter()
            .find(|(id, _)| id == patient_id)
            .map(|(_, row)| row)
    }

    pub fn cell(&self, patient_id: &str, trial_id: &str) -> Option<&MatchCell> {
        self.get(patient_id)?
            .trials
            .iter()
            .find(|(id, _)| id == trial_id)
            .map(|(_, cell)| cell)
    }

    /// Number of patient rows.
    pub fn len(&self) -> usize {
        self.patients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }

    pub fn summary(&self) -> MatchSummary {
        let mut summary = MatchSummary {
            patients: self.patients.len(),
            ..Default::default()
        };
        for (_, row) in &self.patients {
            for (_, cell) in &row.trials {
                summary.cells += 1;
                match &cell.outcome {
                    CellOutcome::Evaluated { verdict } => {
                        summary.evaluated += 1;
                        if verdict.matched {
                            summary.matched += 1;
                        }
                    }
                    CellOutcome::Unknown { .. } => summary.unknown += 1,
                }
            }
        }
        summary
    }
}

/// `Vec<(String, T)>` as a JSON object, keeping entry order both ways.
mod keyed {
    use std::fmt;
    use std::marker::PhantomData;

    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S, T>(entries: &[(String, T)], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (key, value) in entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Vec<(String, T)>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        struct KeyedVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for KeyedVisitor<T> {
            type Value = Vec<(String, T)>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(entry) = access.next_entry()? {
                    entries.push(entry);
                }
                Ok(entries)
            }
        }

        deserializer.deserialize_map(KeyedVisitor(PhantomData))
    }
}
