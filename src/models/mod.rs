pub mod patient;
pub mod trial;
pub mod verdict;

pub use patient::{PatientRecord, RawPatientBundle};
pub use trial::{RawStudy, RawTrialPage, TrialRecord};
pub use verdict::MatchVerdict;
