//! Command-line reconstruction.
//!
//! Serializes every explicitly-resolved argument back into token form using
//! each descriptor's primary name, so aliased and identically-aliased
//! descriptors stay distinct in round-tripped logs. A cleared slot is
//! rendered with the clear sentinel so the clearing itself is visible.

use optbind_core::{DescriptorSet, OptionsRecord};

use crate::CLEAR_SENTINEL;

pub(crate) fn reconstruct(record: &OptionsRecord, model: &DescriptorSet) -> String {
    let mut parts = vec![record.program_name().to_string()];

    for descriptor in model.descriptors() {
        let slot = record.slot(descriptor.primary_target());
        if !slot.is_set() {
            continue;
        }
        if descriptor.is_collection() {
            if slot.values().is_empty() {
                parts.push(format!("{}={CLEAR_SENTINEL}", descriptor.name));
            }
            for value in slot.values() {
                parts.push(format!("{}={value}", descriptor.name));
            }
        } else {
            match slot.value() {
                Some(value) => parts.push(format!("{}={value}", descriptor.name)),
                None => parts.push(format!("{}={CLEAR_SENTINEL}", descriptor.name)),
            }
        }
    }

    for value in record.positional_values() {
        parts.push(value.to_string());
    }
    parts.join(" ")
}
