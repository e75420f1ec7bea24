use std::path::Path;

use serde_json::Value;

use crate::models::RawPatientBundle;
use crate::pipeline::SourceFetchError;

use super::CohortError;

const PATIENT_RESOURCE: &str = "Patient";
const CONDITION_RESOURCE: &str = "Condition";
const MEDICATION_RESOURCE: &str = "Medication";

/// Read every regular file in `dir` as one FHIR bundle.
///
/// Order follows the directory listing, which is platform-dependent.
/// An entry that cannot be inspected or read is logged and skipped; a file
/// that is not JSON aborts the ingestion.
pub async fn ingest_cohort(dir: &Path) -> Result<Vec<RawPatientBundle>, CohortError> {
    let read_dir_error = |source: std::io::Error| CohortError::ReadDir {
        path: dir.display().to_string(),
        source,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(read_dir_error)?;
    let mut bundles = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(read_dir_error)? {
        let path = entry.path();
        let file_name = entry.file_name().to_string_lossy().into_owned();

        match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => {}
            Ok(_) => continue,
            Err(source) => {
                let e = SourceFetchError::Io {
                    path: path.display().to_string(),
                    source,
                };
                tracing::warn!(file = %file_name, error = %e, "Skipping cohort entry that cannot be inspected");
                continue;
            }
        }

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(source) => {
                let e = SourceFetchError::Io {
                    path: path.display().to_string(),
                    source,
                };
                tracing::warn!(file = %file_name, error = %e, "Skipping unreadable cohort file");
                continue;
            }
        };

        let document: Value = serde_json::from_slice(&bytes).map_err(|source| CohortError::Parse {
            file: file_name.clone(),
            source,
        })?;

        let bundle = bundle_from_document(&file_name, &document);
        if !bundle.has_demographics() {
            tracing::warn!(file = %file_name, "Bundle has no Patient resource, demographics omitted");
        }
        tracing::debug!(
            file = %file_name,
            conditions = bundle.conditions_list.len(),
            medications = bundle.medication_list.len(),
            "Cohort bundle ingested"
        );
        bundles.push(bundle);
    }

    tracing::info!(
        dir = %dir.display(),
        bundles = bundles.len(),
        "Cohort ingestion finished"
    );

    Ok(bundles)
}

/// Pull demographics and the raw Condition/Medication entries out of one
/// FHIR document. Never fails: missing pieces become absent fields or empty
/// lists.
pub fn bundle_from_document(file_name: &str, document: &Value) -> RawPatientBundle {
    let entries: &[Value] = document
        .get("entry")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut bundle = RawPatientBundle {
        source_file: file_name.to_string(),
        ..Default::default()
    };

    if let Some(patient) = entries
        .iter()
        .find(|e| resource_type(e) == Some(PATIENT_RESOURCE))
        .and_then(|e| e.get("resource"))
    {
        bundle.patient_id = text_field(patient, "id");
        bundle.birth_date = text_field(patient, "birthDate");
        bundle.gender = text_field(patient, "gender");
        bundle.name = patient.get("name").cloned();
    }

    bundle.conditions_list = entries_of_type(entries, CONDITION_RESOURCE);
    bundle.medication_list = entries_of_type(entries, MEDICATION_RESOURCE);

    bundle
}

fn resource_type(entry: &Value) -> Option<&str> {
    entry
        .get("resource")
        .and_then(|r| r.get("resourceType"))
        .and_then(Value::as_str)
}

fn text_field(resource: &Value, key: &str) -> Option<String> {
    resource.get(key).and_then(Value::as_str).map(str::to_string)
}

fn entries_of_type(entries: &[Value], kind: &str) -> Vec<Value> {
    entries
        .iter()
        .filter(|e| resource_type(e) == Some(kind))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn patient_document(id: &str, given: &str) -> Value {
        json!({
            "resourceType": "Bundle",
            "type": "transaction",
            "entry": [
                {"fullUrl": format!("urn:uuid:{id}"), "resource": {
                    "resourceType": "Patient",
                    "id": id,
                    "birthDate": "1980-04-02",
                    "gender": "female",
                    "name": [{"use": "official", "family": "Smith", "given": [given]}]
                }},
                {"resource": {"resourceType": "Condition", "id": "c1",
                    "code": {"text": "Prediabetes"}}},
                {"resource": {"resourceType": "Condition", "id": "c2",
                    "code": {"text": "Hypertension"}}},
                {"resource": {"resourceType": "Medication", "id": "m1",
                    "code": {"text": "Metformin 500 MG"}}},
                {"resource": {"resourceType": "Encounter", "id": "e1"}}
            ]
        })
    }

    #[test]
    fn extracts_demographics_and_entries() {
        let bundle = bundle_from_document("alice.json", &patient_document("p-1", "Alice"));
        assert_eq!(bundle.patient_id.as_deref(), Some("p-1"));
        assert_eq!(bundle.birth_date.as_deref(), Some("1980-04-02"));
        assert_eq!(bundle.gender.as_deref(), Some("female"));
        assert_eq!(bundle.name.as_ref().unwrap()[0]["given"][0], "Alice");
        assert_eq!(bundle.conditions_list.len(), 2);
        assert_eq!(bundle.medication_list.len(), 1);
        assert_eq!(bundle.source_file, "alice.json");
    }

    #[test]
    fn keeps_entries_verbatim() {
        let bundle = bundle_from_document("alice.json", &patient_document("p-1", "Alice"));
        assert_eq!(bundle.conditions_list[0]["resource"]["code"]["text"], "Prediabetes");
        assert_eq!(bundle.medication_list[0]["resource"]["id"], "m1");
    }

    #[test]
    fn first_patient_resource_wins() {
        let document = json!({"entry": [
            {"resource": {"resourceType": "Patient", "id": "first"}},
            {"resource": {"resourceType": "Patient", "id": "second"}}
        ]});
        let bundle = bundle_from_document("x.json", &document);
        assert_eq!(bundle.patient_id.as_deref(), Some("first"));
    }

    #[test]
    fn missing_patient_keeps_bundle() {
        let document = json!({"entry": [
            {"resource": {"resourceType": "Condition", "id": "c1"}}
        ]});
        let bundle = bundle_from_document("orphan.json", &document);
        assert!(bundle.patient_id.is_none());
        assert!(bundle.name.is_none());
        assert_eq!(bundle.conditions_list.len(), 1);
        assert!(bundle.medication_list.is_empty());
    }

    #[test]
    fn missing_entry_yields_empty_lists() {
        let bundle = bundle_from_document("empty.json", &json!({"resourceType": "Bundle"}));
        assert!(bundle.conditions_list.is_empty());
        assert!(bundle.medication_list.is_empty());

        let bundle = bundle_from_document("odd.json", &json!({"entry": "not a list"}));
        assert!(bundle.conditions_list.is_empty());
    }

    #[tokio::test]
    async fn ingests_one_bundle_per_file() {
        let dir = tempfile::tempdir().unwrap();
        for (id, given) in [("p-1", "Alice"), ("p-2", "Bob"), ("p-3", "Carol")] {
            let path = dir.path().join(format!("{given}.json"));
            std::fs::write(&path, patient_document(id, given).to_string()).unwrap();
        }
        std::fs::write(dir.path().join("no_patient.json"), r#"{"entry": []}"#).unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let bundles = ingest_cohort(dir.path()).await.unwrap();

        assert_eq!(bundles.len(), 4);
        let mut ids: Vec<_> = bundles.iter().filter_map(|b| b.patient_id.clone()).collect();
        ids.sort();
        assert_eq!(ids, vec!["p-1", "p-2", "p-3"]);
        assert!(bundles
            .iter()
            .all(|b| b.conditions_list.len() <= 2 && b.medication_list.len() <= 1));
    }

    #[tokio::test]
    async fn empty_directory_yields_no_bundles() {
        let dir = tempfile::tempdir().unwrap();
        let bundles = ingest_cohort(dir.path()).await.unwrap();
        assert!(bundles.is_empty());
    }

    #[tokio::test]
    async fn unparseable_file_aborts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("good.json"), patient_document("p-1", "Alice").to_string()).unwrap();
        std::fs::write(dir.path().join("bad.json"), "{ not json").unwrap();

        let result = ingest_cohort(dir.path()).await;

        match result {
            Err(CohortError::Parse { file, .. }) => assert_eq!(file, "bad.json"),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn dangling_symlink_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("alice.json"), patient_document("p-1", "Alice").to_string()).unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone.json"), dir.path().join("dangling.json")).unwrap();

        let bundles = ingest_cohort(dir.path()).await.unwrap();

        assert_eq!(bundles.len(), 1);
        assert_eq!(bundles[0].source_file, "alice.json");
    }

    #[tokio::test]
    async fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ingest_cohort(&dir.path().join("does-not-exist")).await;
        assert!(matches!(result, Err(CohortError::ReadDir { .. })));
    }
}
