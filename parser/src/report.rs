//! Structured binding reports.
//!
//! A [`BindingReport`] is the machine-readable twin of the reconstructed
//! command line: one entry per descriptor with its current display values,
//! whether a token ever wrote it, and the provenance of the latest write.
//! Reports serialize to JSON for logging or downstream tooling.

use serde::{Deserialize, Serialize};

use optbind_core::{DescriptorSet, OptionsRecord, Provenance, Value};

/// Serializable snapshot of a bound options record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindingReport {
    pub program: String,
    pub arguments: Vec<ArgumentReport>,
    pub positional: Vec<String>,
}

/// One descriptor's bound state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArgumentReport {
    pub name: String,
    pub kind: String,
    /// Display form of the current value(s); empty for a cleared or unset
    /// slot.
    pub values: Vec<String>,
    /// Whether any token wrote the slot (a clear sentinel counts).
    pub explicitly_set: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Provenance>,
}

pub(crate) fn build(record: &OptionsRecord, model: &DescriptorSet) -> BindingReport {
    let arguments = model
        .descriptors()
        .iter()
        .map(|descriptor| {
            let slot = record.slot(descriptor.primary_target());
            let values = if descriptor.is_collection() {
                slot.values().iter().map(Value::to_string).collect()
            } else {
                slot.value().map(Value::to_string).into_iter().collect()
            };
            ArgumentReport {
                name: descriptor.name.clone(),
                kind: descriptor.kind.to_string(),
                values,
                explicitly_set: slot.is_set(),
                provenance: slot.source(),
            }
        })
        .collect();

    BindingReport {
        program: record.program_name().to_string(),
        arguments,
        positional: record
            .positional_values()
            .iter()
            .map(Value::to_string)
            .collect(),
    }
}
