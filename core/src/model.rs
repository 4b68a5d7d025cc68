//! Definition discovery: compiling declarations into the descriptor set.
//!
//! [`DescriptorSet::compile`] runs once per options record, before any token
//! is read. It detects case-insensitive name clashes, resolves override
//! pairs into single logical descriptors with fan-out write targets,
//! auto-initializes collection stores, and derives requiredness. Everything
//! downstream (binding, validation, usage, serialization) works from the
//! compiled set and never re-inspects raw declarations.

use std::collections::HashMap;

use crate::OPTIONS_FILE_KEY;
use crate::error::DefinitionError;
use crate::record::{CollectionKind, OptionsRecord, SlotId};
use crate::types::{CollectionStore, SequenceStore, UniqueSetStore, Value, ValueKind};

/// Inclusive cardinality bounds for a collection descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cardinality {
    pub min: usize,
    /// `None` means unbounded.
    pub max: Option<usize>,
}

/// Compiled metadata for one logical bindable slot.
///
/// An override pair compiles into a single descriptor carrying the
/// descendant's metadata and every physical cell in `targets` (descendant
/// first); the binder fans each write out to all of them.
#[derive(Debug, Clone)]
pub struct Descriptor {
    pub name: String,
    /// Defaults to `name` when the declaration carried no alias.
    pub short_alias: String,
    pub kind: ValueKind,
    /// `None` for scalar slots.
    pub cardinality: Option<Cardinality>,
    /// Base requiredness, before mutex-clique relief is applied.
    pub required: bool,
    pub mutex_peers: Vec<String>,
    pub overridable: bool,
    pub doc: String,
    pub has_default: bool,
    /// Token form of the compiled-in default(s), for usage output.
    pub default_display: Option<String>,
    pub targets: Vec<SlotId>,
}

impl Descriptor {
    pub fn is_collection(&self) -> bool {
        self.cardinality.is_some()
    }

    /// The cell reads go through; writes go to every target.
    pub fn primary_target(&self) -> SlotId {
        self.targets[0]
    }
}

/// Compiled metadata for the positional-argument slot.
#[derive(Debug, Clone)]
pub struct PositionalDescriptor {
    pub name: String,
    pub kind: ValueKind,
    pub cardinality: Cardinality,
    pub doc: String,
    pub target: SlotId,
}

/// The descriptor set for one options record, with a case-insensitive key
/// index over names and aliases.
#[derive(Debug)]
pub struct DescriptorSet {
    descriptors: Vec<Descriptor>,
    by_key: HashMap<String, usize>,
    positional: Option<PositionalDescriptor>,
}

impl DescriptorSet {
    /// Builds the descriptor set and initializes the record's slots, or fails
    /// with a fatal [`DefinitionError`].
    ///
    /// # Examples
    ///
    /// ```
    /// use optbind_core::{DescriptorSet, OptionDecl, OptionsRecord, ValueKind};
    ///
    /// let mut record = OptionsRecord::new("tool");
    /// record.declare(OptionDecl::scalar("FROB", ValueKind::Text));
    /// record.declare(OptionDecl::scalar("frob", ValueKind::Text));
    /// assert!(DescriptorSet::compile(&mut record).is_err());
    /// ```
    pub fn compile(record: &mut OptionsRecord) -> Result<Self, DefinitionError> {
        let mut set = Self {
            descriptors: Vec::new(),
            by_key: HashMap::new(),
            positional: None,
        };

        for index in 0..record.decls().len() {
            set.compile_decl(record, index)?;
        }
        set.compile_positional(record)?;
        Ok(set)
    }

    fn compile_decl(
        &mut self,
        record: &mut OptionsRecord,
        index: usize,
    ) -> Result<(), DefinitionError> {
        let slot_id = record.decl_slot(index);
        let supplied_store = record
            .decl_mut(index)
            .collection
            .as_mut()
            .and_then(|spec| spec.store.take());

        let decl = &record.decls()[index];
        let name = decl.name.clone();
        let alias = decl.short_alias.clone().unwrap_or_else(|| name.clone());
        if name.eq_ignore_ascii_case(OPTIONS_FILE_KEY) || alias.eq_ignore_ascii_case(OPTIONS_FILE_KEY)
        {
            return Err(DefinitionError::ReservedName(name));
        }

        let collection = decl.collection.as_ref();
        if let Some(default) = &decl.default {
            if !kind_matches(default, &decl.kind) {
                return Err(DefinitionError::DefaultKindMismatch(name));
            }
        }
        if let Some(spec) = collection {
            if spec.defaults.iter().any(|v| !kind_matches(v, &decl.kind)) {
                return Err(DefinitionError::DefaultKindMismatch(name));
            }
        }

        let cardinality = collection.map(|spec| Cardinality {
            min: spec.min,
            max: spec.max,
        });
        let has_default = match collection {
            Some(spec) => !spec.defaults.is_empty(),
            None => decl.default.is_some(),
        };
        let required = decl.required.unwrap_or(match cardinality {
            Some(card) => card.min > 0,
            None => decl.default.is_none(),
        });
        let default_display = match collection {
            Some(spec) if !spec.defaults.is_empty() => Some(
                spec.defaults
                    .iter()
                    .map(Value::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            Some(_) => None,
            None => decl.default.as_ref().map(Value::to_string),
        };
        let descriptor = Descriptor {
            name: name.clone(),
            short_alias: alias.clone(),
            kind: decl.kind.clone(),
            cardinality,
            required,
            mutex_peers: decl.mutex.clone(),
            overridable: decl.overridable,
            doc: decl.doc.clone(),
            has_default,
            default_display,
            targets: vec![slot_id],
        };
        let scalar_default = decl.default.clone();
        let collection_defaults: Vec<Value> = collection
            .map(|spec| spec.defaults.clone())
            .unwrap_or_default();
        let collection_kind = collection.map(|spec| spec.kind);

        // Initialize this declaration's own cell before any merge bookkeeping.
        if let Some(kind) = collection_kind {
            let store: Box<dyn CollectionStore> = match supplied_store {
                Some(store) => store,
                None => match kind {
                    CollectionKind::Sequence => Box::new(SequenceStore::new()),
                    CollectionKind::UniqueSet => Box::new(UniqueSetStore::new()),
                    CollectionKind::Custom => {
                        return Err(DefinitionError::CollectionNotInitializable(name));
                    }
                },
            };
            record.install_store(slot_id, store);
            record.preload_values(slot_id, &collection_defaults);
        }

        match self.by_key.get(&fold(&name)).copied() {
            Some(existing) => {
                let ancestor = &self.descriptors[existing];
                if !ancestor.name.eq_ignore_ascii_case(&name) || !ancestor.overridable {
                    return Err(DefinitionError::NameClash(name));
                }
                if ancestor.is_collection() != descriptor.is_collection() {
                    return Err(DefinitionError::MismatchedOverride(name));
                }
                let mut merged = descriptor;
                merged.targets.extend(self.descriptors[existing].targets.iter().copied());
                // Descendant metadata wins everywhere, defaults included.
                for target in merged.targets.iter().copied() {
                    if merged.is_collection() {
                        record.preload_values(target, &collection_defaults);
                    } else {
                        record.preload_scalar(target, scalar_default.clone());
                    }
                }
                self.by_key.retain(|_, idx| *idx != existing);
                self.descriptors[existing] = merged;
                self.insert_key(&name, existing)?;
                self.insert_key(&alias, existing)?;
            }
            None => {
                let idx = self.descriptors.len();
                self.descriptors.push(descriptor);
                self.insert_key(&name, idx)?;
                self.insert_key(&alias, idx)?;
            }
        }
        Ok(())
    }

    fn compile_positional(&mut self, record: &mut OptionsRecord) -> Result<(), DefinitionError> {
        if record.positionals().len() > 1 {
            return Err(DefinitionError::DuplicatePositional);
        }
        if let Some((decl, id)) = record.positionals().first() {
            let descriptor = PositionalDescriptor {
                name: decl.name.clone(),
                kind: decl.kind.clone(),
                cardinality: Cardinality {
                    min: decl.min,
                    max: decl.max,
                },
                doc: decl.doc.clone(),
                target: *id,
            };
            record.install_store(descriptor.target, Box::new(SequenceStore::new()));
            self.positional = Some(descriptor);
        }
        Ok(())
    }

    fn insert_key(&mut self, key: &str, idx: usize) -> Result<(), DefinitionError> {
        match self.by_key.insert(fold(key), idx) {
            Some(previous) if previous != idx => Err(DefinitionError::NameClash(key.to_string())),
            _ => Ok(()),
        }
    }

    /// All logical descriptors, in declaration order.
    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    /// Case-insensitive lookup by primary name or short alias.
    pub fn lookup(&self, key: &str) -> Option<&Descriptor> {
        self.by_key.get(&fold(key)).map(|idx| &self.descriptors[*idx])
    }

    pub fn positional(&self) -> Option<&PositionalDescriptor> {
        self.positional.as_ref()
    }
}

fn fold(key: &str) -> String {
    key.to_ascii_lowercase()
}

fn kind_matches(value: &Value, kind: &ValueKind) -> bool {
    match (value, kind) {
        (Value::Bool(_), ValueKind::Boolean)
        | (Value::Int(_), ValueKind::Integer)
        | (Value::Text(_), ValueKind::Text)
        | (Value::Path(_), ValueKind::Path) => true,
        (Value::Symbol(symbol), ValueKind::Choice(choices)) => {
            choices.iter().any(|c| c == symbol)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{CollectionSpec, OptionDecl, PositionalDecl};
    use crate::types::{CollectionStore, Provenance};

    #[test]
    fn test_compile_initializes_every_collection_slot() {
        let mut record = OptionsRecord::new("tool");
        let seq = record.declare(OptionDecl::collection(
            "SEQ",
            ValueKind::Text,
            CollectionSpec::sequence(),
        ));
        let set = record.declare(OptionDecl::collection(
            "SET",
            ValueKind::Text,
            CollectionSpec::unique_set(),
        ));
        let pos = record.declare_positional(PositionalDecl::new("FILE", ValueKind::Path));

        let model = DescriptorSet::compile(&mut record).unwrap();
        assert_eq!(model.descriptors().len(), 2);
        for id in [seq, set, pos] {
            record.append_value(id, Value::Text("x".into()), Provenance::Direct);
            assert_eq!(record.slot(id).values().len(), 1);
        }
    }

    #[test]
    fn test_collection_defaults_are_loaded_at_compile() {
        let mut record = OptionsRecord::new("tool");
        let id = record.declare(OptionDecl::collection(
            "TAG",
            ValueKind::Text,
            CollectionSpec::sequence()
                .with_defaults(vec![Value::Text("foo".into()), Value::Text("bar".into())]),
        ));
        DescriptorSet::compile(&mut record).unwrap();
        assert_eq!(record.slot(id).values().len(), 2);
        assert!(!record.slot(id).is_set());
    }

    #[test]
    fn test_case_clash_is_a_definition_error() {
        let mut record = OptionsRecord::new("tool");
        record.declare(OptionDecl::scalar("FROB", ValueKind::Text));
        record.declare(OptionDecl::scalar("frob", ValueKind::Text));
        assert_eq!(
            DescriptorSet::compile(&mut record).unwrap_err(),
            DefinitionError::NameClash("frob".into())
        );
    }

    #[test]
    fn test_alias_clash_is_a_definition_error() {
        let mut record = OptionsRecord::new("tool");
        record.declare(OptionDecl::scalar("ALPHA", ValueKind::Text).with_short_alias("A"));
        record.declare(OptionDecl::scalar("a", ValueKind::Text));
        assert!(matches!(
            DescriptorSet::compile(&mut record),
            Err(DefinitionError::NameClash(_))
        ));
    }

    #[test]
    fn test_override_pair_merges_into_one_descriptor() {
        let mut record = OptionsRecord::new("tool");
        let parent = record.declare(
            OptionDecl::scalar("LABEL", ValueKind::Text)
                .with_default(Value::Text("parent".into()))
                .allow_override(),
        );
        let child = record.declare(
            OptionDecl::scalar("LABEL", ValueKind::Text)
                .with_default(Value::Text("child".into())),
        );

        let model = DescriptorSet::compile(&mut record).unwrap();
        assert_eq!(model.descriptors().len(), 1);
        let descriptor = model.lookup("LABEL").unwrap();
        assert_eq!(descriptor.targets, vec![child, parent]);

        // Descendant default propagated to both physical cells.
        assert_eq!(record.slot(parent).value(), Some(&Value::Text("child".into())));
        assert_eq!(record.slot(child).value(), Some(&Value::Text("child".into())));
    }

    #[test]
    fn test_redeclaring_non_overridable_name_is_a_clash() {
        let mut record = OptionsRecord::new("tool");
        record.declare(OptionDecl::scalar("LABEL", ValueKind::Text));
        record.declare(OptionDecl::scalar("LABEL", ValueKind::Text));
        assert_eq!(
            DescriptorSet::compile(&mut record).unwrap_err(),
            DefinitionError::NameClash("LABEL".into())
        );
    }

    #[test]
    fn test_mismatched_override_shape_is_rejected() {
        let mut record = OptionsRecord::new("tool");
        record.declare(OptionDecl::scalar("LABEL", ValueKind::Text).allow_override());
        record.declare(OptionDecl::collection(
            "LABEL",
            ValueKind::Text,
            CollectionSpec::sequence(),
        ));
        assert_eq!(
            DescriptorSet::compile(&mut record).unwrap_err(),
            DefinitionError::MismatchedOverride("LABEL".into())
        );
    }

    #[test]
    fn test_custom_collection_without_store_cannot_be_auto_initialized() {
        let mut record = OptionsRecord::new("tool");
        record.declare(OptionDecl::collection(
            "SET",
            ValueKind::Text,
            CollectionSpec::custom(),
        ));
        assert_eq!(
            DescriptorSet::compile(&mut record).unwrap_err(),
            DefinitionError::CollectionNotInitializable("SET".into())
        );
    }

    #[test]
    fn test_custom_collection_with_supplied_store_compiles() {
        #[derive(Debug, Default)]
        struct CountingStore(Vec<Value>);
        impl CollectionStore for CountingStore {
            fn append(&mut self, value: Value) {
                self.0.push(value);
            }
            fn clear(&mut self) {
                self.0.clear();
            }
            fn values(&self) -> &[Value] {
                &self.0
            }
        }

        let mut record = OptionsRecord::new("tool");
        record.declare(OptionDecl::collection(
            "SET",
            ValueKind::Text,
            CollectionSpec::custom().with_store(Box::<CountingStore>::default()),
        ));
        assert!(DescriptorSet::compile(&mut record).is_ok());
    }

    #[test]
    fn test_second_positional_declaration_is_rejected() {
        let mut record = OptionsRecord::new("tool");
        record.declare_positional(PositionalDecl::new("FILE", ValueKind::Path));
        record.declare_positional(PositionalDecl::new("MORE", ValueKind::Path));
        assert_eq!(
            DescriptorSet::compile(&mut record).unwrap_err(),
            DefinitionError::DuplicatePositional
        );
    }

    #[test]
    fn test_reserved_directive_name_is_rejected() {
        let mut record = OptionsRecord::new("tool");
        record.declare(OptionDecl::scalar("options_file", ValueKind::Path));
        assert_eq!(
            DescriptorSet::compile(&mut record).unwrap_err(),
            DefinitionError::ReservedName("options_file".into())
        );
    }

    #[test]
    fn test_default_kind_mismatch_is_rejected() {
        let mut record = OptionsRecord::new("tool");
        record.declare(
            OptionDecl::scalar("LEVEL", ValueKind::Integer)
                .with_default(Value::Text("six".into())),
        );
        assert_eq!(
            DescriptorSet::compile(&mut record).unwrap_err(),
            DefinitionError::DefaultKindMismatch("LEVEL".into())
        );
    }

    #[test]
    fn test_required_derivation() {
        let mut record = OptionsRecord::new("tool");
        record.declare(OptionDecl::scalar("NO_DEFAULT", ValueKind::Text));
        record.declare(
            OptionDecl::scalar("DEFAULTED", ValueKind::Integer).with_default(Value::Int(6)),
        );
        record.declare(OptionDecl::scalar("EXPLICIT", ValueKind::Text).optional());
        record.declare(OptionDecl::collection(
            "AT_LEAST_ONE",
            ValueKind::Text,
            CollectionSpec::sequence().with_min(1),
        ));
        record.declare(OptionDecl::collection(
            "ANY_NUMBER",
            ValueKind::Text,
            CollectionSpec::sequence(),
        ));

        let model = DescriptorSet::compile(&mut record).unwrap();
        assert!(model.lookup("NO_DEFAULT").unwrap().required);
        assert!(!model.lookup("DEFAULTED").unwrap().required);
        assert!(!model.lookup("EXPLICIT").unwrap().required);
        assert!(model.lookup("AT_LEAST_ONE").unwrap().required);
        assert!(!model.lookup("ANY_NUMBER").unwrap().required);
    }
}
