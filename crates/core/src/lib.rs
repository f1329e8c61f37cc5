//! fhir-query-core: FHIR wire shapes and query logic shared by the server
//!
//! Everything here is free of I/O: text-to-filter extraction, the Condition
//! and Patient shapes read from the remote server, age arithmetic and the
//! flattened patient record returned to callers.

pub mod bundle;
pub mod condition;
pub mod filter;
pub mod patient;
pub mod suggest;

pub use bundle::{Bundle, BundleEntry, BundleLink};
pub use condition::{CodeableConcept, Coding, Condition, Reference};
pub use filter::{AgeFilter, AgeOperator, DIAGNOSIS_VOCABULARY, Extraction, Filter, extract};
pub use patient::{PatientRecord, PatientResource, calculate_age};
pub use suggest::suggest;
