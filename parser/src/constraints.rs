//! Post-binding constraint validation.
//!
//! Runs once after every token is consumed. Unlike binding, which stops at
//! the first bad token, validation inspects every descriptor and reports all
//! violations of the pass together, maximizing feedback per invocation.

use thiserror::Error;

use optbind_core::{DescriptorSet, OptionsRecord};

/// One constraint violation found after binding completed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstraintViolation {
    #[error("option {0} is required")]
    MissingRequired(String),

    #[error("option {option} must be specified unless one of ({}) is specified", .peers.join(", "))]
    CliqueUnsatisfied { option: String, peers: Vec<String> },

    #[error("options {option} and {peer} cannot be used together")]
    Conflict { option: String, peer: String },

    #[error("option {option} was specified {observed} times; at least {min} required")]
    TooFew {
        option: String,
        observed: usize,
        min: usize,
    },

    #[error("option {option} was specified {observed} times; at most {max} allowed")]
    TooMany {
        option: String,
        observed: usize,
        max: usize,
    },
}

/// Checks required/cardinality/mutex invariants over every descriptor and
/// returns every violation found.
pub(crate) fn validate(
    model: &DescriptorSet,
    record: &OptionsRecord,
) -> Vec<ConstraintViolation> {
    let mut violations = Vec::new();

    for descriptor in model.descriptors() {
        let slot = record.slot(descriptor.primary_target());

        if slot.has_value() {
            // Conflicts are evaluated from each descriptor's own declared
            // peer list; the relation need not be symmetric.
            for peer in &descriptor.mutex_peers {
                if peer_holds(model, record, peer) {
                    violations.push(ConstraintViolation::Conflict {
                        option: descriptor.name.clone(),
                        peer: peer.clone(),
                    });
                }
            }
        }

        match descriptor.cardinality {
            Some(cardinality) => {
                let observed = slot.values().len();
                if observed < cardinality.min {
                    let relieved = observed == 0
                        && descriptor
                            .mutex_peers
                            .iter()
                            .any(|peer| peer_holds(model, record, peer));
                    if !relieved {
                        violations.push(ConstraintViolation::TooFew {
                            option: descriptor.name.clone(),
                            observed,
                            min: cardinality.min,
                        });
                    }
                }
                if let Some(max) = cardinality.max {
                    if observed > max {
                        violations.push(ConstraintViolation::TooMany {
                            option: descriptor.name.clone(),
                            observed,
                            max,
                        });
                    }
                }
            }
            None => {
                if !slot.has_value() && descriptor.required {
                    if descriptor.mutex_peers.is_empty() {
                        violations
                            .push(ConstraintViolation::MissingRequired(descriptor.name.clone()));
                    } else if !descriptor
                        .mutex_peers
                        .iter()
                        .any(|peer| peer_holds(model, record, peer))
                    {
                        // The requirement is satisfied collectively across
                        // the clique.
                        violations.push(ConstraintViolation::CliqueUnsatisfied {
                            option: descriptor.name.clone(),
                            peers: descriptor.mutex_peers.clone(),
                        });
                    }
                }
            }
        }
    }

    if let Some(positional) = model.positional() {
        let observed = record.slot(positional.target).values().len();
        if observed < positional.cardinality.min {
            violations.push(ConstraintViolation::TooFew {
                option: positional.name.clone(),
                observed,
                min: positional.cardinality.min,
            });
        }
        if let Some(max) = positional.cardinality.max {
            if observed > max {
                violations.push(ConstraintViolation::TooMany {
                    option: positional.name.clone(),
                    observed,
                    max,
                });
            }
        }
    }

    violations
}

fn peer_holds(model: &DescriptorSet, record: &OptionsRecord, peer: &str) -> bool {
    model
        .lookup(peer)
        .is_some_and(|descriptor| record.slot(descriptor.primary_target()).has_value())
}
