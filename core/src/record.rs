//! The options record: slot declarations and their mutable storage.
//!
//! An [`OptionsRecord`] is the structured object this engine populates. The
//! embedding application declares each bindable slot up front with
//! [`OptionDecl`] (plus at most one [`PositionalDecl`]), then hands the record
//! to the parser. Declarations are an explicit registration step; the compiled
//! descriptor set is derived from them once, before any token is read.
//!
//! # Examples
//!
//! ```
//! use optbind_core::{OptionDecl, OptionsRecord, Value, ValueKind};
//!
//! let mut record = OptionsRecord::new("archive")
//!     .with_one_line_summary("Pack input files into a compressed archive");
//! record.declare(
//!     OptionDecl::scalar("COMPRESSION_LEVEL", ValueKind::Integer)
//!         .with_short_alias("L")
//!         .with_default(Value::Int(6))
//!         .with_doc("Compression level setting."),
//! );
//!
//! assert_eq!(record.int("COMPRESSION_LEVEL"), Some(6));
//! ```

use crate::types::{CollectionStore, Provenance, Value, ValueKind};

/// Handle to one physical storage cell inside a record.
///
/// Returned by [`OptionsRecord::declare`]; useful when a test or caller needs
/// to inspect a specific declared level of an override pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(pub(crate) usize);

/// How a collection slot's backing store is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    /// Insertion-ordered sequence, duplicates kept. Auto-initialized to a
    /// [`SequenceStore`](crate::SequenceStore) when no store is supplied.
    Sequence,
    /// Insertion-ordered set, duplicate values dropped. Auto-initialized to a
    /// [`UniqueSetStore`](crate::UniqueSetStore) when no store is supplied.
    UniqueSet,
    /// Abstract collection the engine cannot instantiate; the record author
    /// must supply a store or discovery fails.
    Custom,
}

/// Collection half of an option declaration: store kind, cardinality bounds,
/// and default elements.
#[derive(Debug)]
pub struct CollectionSpec {
    pub kind: CollectionKind,
    pub min: usize,
    /// `None` means unbounded.
    pub max: Option<usize>,
    pub defaults: Vec<Value>,
    pub store: Option<Box<dyn CollectionStore>>,
}

impl CollectionSpec {
    /// An auto-initializable ordered sequence.
    pub fn sequence() -> Self {
        Self {
            kind: CollectionKind::Sequence,
            min: 0,
            max: None,
            defaults: Vec::new(),
            store: None,
        }
    }

    /// An auto-initializable insertion-ordered unique set.
    pub fn unique_set() -> Self {
        Self {
            kind: CollectionKind::UniqueSet,
            ..Self::sequence()
        }
    }

    /// An abstract collection; discovery fails unless [`with_store`] supplies
    /// an instance.
    ///
    /// [`with_store`]: CollectionSpec::with_store
    pub fn custom() -> Self {
        Self {
            kind: CollectionKind::Custom,
            ..Self::sequence()
        }
    }

    /// Sets inclusive cardinality bounds.
    pub fn with_bounds(mut self, min: usize, max: usize) -> Self {
        self.min = min;
        self.max = Some(max);
        self
    }

    /// Sets a minimum with no upper bound.
    pub fn with_min(mut self, min: usize) -> Self {
        self.min = min;
        self.max = None;
        self
    }

    /// Pre-populates the slot; defaults persist until a clear sentinel.
    pub fn with_defaults(mut self, defaults: Vec<Value>) -> Self {
        self.defaults = defaults;
        self
    }

    /// Supplies the backing store instance.
    pub fn with_store(mut self, store: Box<dyn CollectionStore>) -> Self {
        self.store = Some(store);
        self
    }
}

/// Declaration of one named bindable slot.
///
/// Built with [`OptionDecl::scalar`] or [`OptionDecl::collection`] and the
/// chainable `with_*` methods.
///
/// # Examples
///
/// ```
/// use optbind_core::{CollectionSpec, OptionDecl, ValueKind};
///
/// let tags = OptionDecl::collection(
///     "TAG",
///     ValueKind::Text,
///     CollectionSpec::sequence().with_bounds(1, 3),
/// )
/// .with_doc("Labels recorded in the archive index.");
/// assert_eq!(tags.name, "TAG");
/// ```
#[derive(Debug)]
pub struct OptionDecl {
    /// Primary token key; also the display key in reconstructed command lines.
    pub name: String,
    /// Optional alternate token key; defaults to `name` at compile time.
    pub short_alias: Option<String>,
    pub kind: ValueKind,
    /// Compiled-in default for scalar slots.
    pub default: Option<Value>,
    /// Present for collection slots, absent for scalars.
    pub collection: Option<CollectionSpec>,
    /// Explicit required/optional override; `None` derives it.
    pub required: Option<bool>,
    /// Whether a later redeclaration of this name may override this one.
    pub overridable: bool,
    /// Names of mutually exclusive peers, as declared on this option.
    pub mutex: Vec<String>,
    /// Markup documentation text.
    pub doc: String,
}

impl OptionDecl {
    /// Declares a scalar slot.
    pub fn scalar(name: &str, kind: ValueKind) -> Self {
        Self {
            name: name.to_string(),
            short_alias: None,
            kind,
            default: None,
            collection: None,
            required: None,
            overridable: false,
            mutex: Vec::new(),
            doc: String::new(),
        }
    }

    /// Declares a collection slot.
    pub fn collection(name: &str, kind: ValueKind, spec: CollectionSpec) -> Self {
        Self {
            collection: Some(spec),
            ..Self::scalar(name, kind)
        }
    }

    pub fn with_short_alias(mut self, alias: &str) -> Self {
        self.short_alias = Some(alias.to_string());
        self
    }

    pub fn with_doc(mut self, doc: &str) -> Self {
        self.doc = doc.to_string();
        self
    }

    /// Sets the scalar default; a slot with a default is optional unless
    /// explicitly marked required.
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Marks the slot explicitly optional.
    pub fn optional(mut self) -> Self {
        self.required = Some(false);
        self
    }

    /// Marks the slot explicitly required.
    pub fn require(mut self) -> Self {
        self.required = Some(true);
        self
    }

    /// Allows a later redeclaration of the same name to override this one.
    pub fn allow_override(mut self) -> Self {
        self.overridable = true;
        self
    }

    /// Declares mutually exclusive peer names. The relation is evaluated from
    /// this declaration's own list and need not be symmetric.
    pub fn with_mutex(mut self, peers: &[&str]) -> Self {
        self.mutex = peers.iter().map(|p| p.to_string()).collect();
        self
    }
}

/// Declaration of the positional-argument slot. At most one per record; it
/// behaves as an unnamed collection bound by token position rather than key.
#[derive(Debug)]
pub struct PositionalDecl {
    /// Display name used in usage output.
    pub name: String,
    pub kind: ValueKind,
    pub min: usize,
    pub max: Option<usize>,
    pub doc: String,
}

impl PositionalDecl {
    pub fn new(name: &str, kind: ValueKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            min: 0,
            max: None,
            doc: String::new(),
        }
    }

    pub fn with_bounds(mut self, min: usize, max: usize) -> Self {
        self.min = min;
        self.max = Some(max);
        self
    }

    pub fn with_doc(mut self, doc: &str) -> Self {
        self.doc = doc.to_string();
        self
    }
}

#[derive(Debug)]
enum Storage {
    Scalar(Option<Value>),
    /// `None` until discovery installs or auto-initializes the store.
    Collection(Option<Box<dyn CollectionStore>>),
}

/// One physical storage cell plus its binding state.
#[derive(Debug)]
pub struct Slot {
    storage: Storage,
    source: Option<Provenance>,
    set: bool,
}

impl Slot {
    fn scalar(default: Option<Value>) -> Self {
        Self {
            storage: Storage::Scalar(default),
            source: None,
            set: false,
        }
    }

    fn collection() -> Self {
        Self {
            storage: Storage::Collection(None),
            source: None,
            set: false,
        }
    }

    /// Current scalar value, `None` for empty or collection slots.
    pub fn value(&self) -> Option<&Value> {
        match &self.storage {
            Storage::Scalar(v) => v.as_ref(),
            Storage::Collection(_) => None,
        }
    }

    /// Current collection contents, empty for scalar or uninitialized slots.
    pub fn values(&self) -> &[Value] {
        match &self.storage {
            Storage::Collection(Some(store)) => store.values(),
            _ => &[],
        }
    }

    /// Whether the slot currently holds anything, default values included.
    pub fn has_value(&self) -> bool {
        match &self.storage {
            Storage::Scalar(v) => v.is_some(),
            Storage::Collection(store) => store.as_ref().is_some_and(|s| !s.is_empty()),
        }
    }

    /// Whether a token ever wrote this slot (a clear sentinel counts).
    pub fn is_set(&self) -> bool {
        self.set
    }

    /// Provenance of the most recent successful write, if any.
    pub fn source(&self) -> Option<Provenance> {
        self.source
    }

    pub fn is_collection(&self) -> bool {
        matches!(self.storage, Storage::Collection(_))
    }
}

/// The structured object whose named slots this engine populates.
///
/// Holds the program identity, the doc summaries, and one [`Slot`] per
/// declaration. Typed read accessors resolve names case-insensitively against
/// the most recently declared matching level, so override pairs read the
/// descendant value.
#[derive(Debug, Default)]
pub struct OptionsRecord {
    program_name: String,
    one_line_summary: String,
    summary: String,
    decls: Vec<OptionDecl>,
    /// Slot cell per declaration; positional slots make the two sequences
    /// diverge, so the mapping is explicit.
    decl_slots: Vec<SlotId>,
    slots: Vec<Slot>,
    positionals: Vec<(PositionalDecl, SlotId)>,
}

impl OptionsRecord {
    pub fn new(program_name: &str) -> Self {
        Self {
            program_name: program_name.to_string(),
            ..Self::default()
        }
    }

    /// Sets the one-line summary shown at the top of usage output. May use
    /// character references and the paragraph marker only.
    pub fn with_one_line_summary(mut self, summary: &str) -> Self {
        self.one_line_summary = summary.to_string();
        self
    }

    /// Sets the detailed summary rendered in full usage output. May use the
    /// whole supported markup subset.
    pub fn with_summary(mut self, summary: &str) -> Self {
        self.summary = summary.to_string();
        self
    }

    /// Registers one named slot and returns its physical cell handle.
    pub fn declare(&mut self, decl: OptionDecl) -> SlotId {
        let slot = if decl.collection.is_some() {
            Slot::collection()
        } else {
            Slot::scalar(decl.default.clone())
        };
        self.slots.push(slot);
        let id = SlotId(self.slots.len() - 1);
        self.decls.push(decl);
        self.decl_slots.push(id);
        id
    }

    /// Registers the positional slot. Declaring more than one is reported as
    /// a definition error at discovery time.
    pub fn declare_positional(&mut self, decl: PositionalDecl) -> SlotId {
        self.slots.push(Slot::collection());
        let id = SlotId(self.slots.len() - 1);
        self.positionals.push((decl, id));
        id
    }

    pub fn program_name(&self) -> &str {
        &self.program_name
    }

    pub fn one_line_summary(&self) -> &str {
        &self.one_line_summary
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub(crate) fn decls(&self) -> &[OptionDecl] {
        &self.decls
    }

    pub(crate) fn decl_mut(&mut self, index: usize) -> &mut OptionDecl {
        &mut self.decls[index]
    }

    pub(crate) fn decl_slot(&self, index: usize) -> SlotId {
        self.decl_slots[index]
    }

    pub(crate) fn positionals(&self) -> &[(PositionalDecl, SlotId)] {
        &self.positionals
    }

    /// Borrows one physical cell.
    pub fn slot(&self, id: SlotId) -> &Slot {
        &self.slots[id.0]
    }

    // ------------------------------------------------------------------
    // Slot mutation (the binder's write interface)
    // ------------------------------------------------------------------

    /// Replaces a scalar cell's value and records the write provenance.
    /// `None` is the cleared state produced by the clear sentinel.
    ///
    /// # Panics
    ///
    /// Panics if the cell is collection-typed; the compiled descriptor set
    /// never routes a scalar write there.
    pub fn write_scalar(&mut self, id: SlotId, value: Option<Value>, provenance: Provenance) {
        let slot = &mut self.slots[id.0];
        match &mut slot.storage {
            Storage::Scalar(v) => *v = value,
            Storage::Collection(_) => panic!("scalar write routed to collection slot"),
        }
        slot.set = true;
        slot.source = Some(provenance);
    }

    /// Appends to a collection cell and records the write provenance.
    ///
    /// # Panics
    ///
    /// Panics if the cell is scalar-typed or its store was never installed.
    pub fn append_value(&mut self, id: SlotId, value: Value, provenance: Provenance) {
        let slot = &mut self.slots[id.0];
        match &mut slot.storage {
            Storage::Collection(Some(store)) => store.append(value),
            _ => panic!("collection write routed to scalar or uninitialized slot"),
        }
        slot.set = true;
        slot.source = Some(provenance);
    }

    /// Empties a collection cell, discarding defaults and accumulated values.
    ///
    /// # Panics
    ///
    /// Panics if the cell is scalar-typed or its store was never installed.
    pub fn clear_values(&mut self, id: SlotId, provenance: Provenance) {
        let slot = &mut self.slots[id.0];
        match &mut slot.storage {
            Storage::Collection(Some(store)) => store.clear(),
            _ => panic!("collection clear routed to scalar or uninitialized slot"),
        }
        slot.set = true;
        slot.source = Some(provenance);
    }

    /// Installs a collection cell's backing store during discovery.
    pub(crate) fn install_store(&mut self, id: SlotId, store: Box<dyn CollectionStore>) {
        let slot = &mut self.slots[id.0];
        match &mut slot.storage {
            Storage::Collection(s) => *s = Some(store),
            Storage::Scalar(_) => panic!("store installed on scalar slot"),
        }
    }

    /// Overwrites a scalar cell without marking it set; used to propagate
    /// override-pair defaults at discovery time.
    pub(crate) fn preload_scalar(&mut self, id: SlotId, value: Option<Value>) {
        match &mut self.slots[id.0].storage {
            Storage::Scalar(v) => *v = value,
            Storage::Collection(_) => panic!("scalar preload routed to collection slot"),
        }
    }

    /// Loads collection defaults without marking the cell set.
    pub(crate) fn preload_values(&mut self, id: SlotId, values: &[Value]) {
        match &mut self.slots[id.0].storage {
            Storage::Collection(Some(store)) => {
                store.clear();
                for v in values {
                    store.append(v.clone());
                }
            }
            _ => panic!("collection preload routed to scalar or uninitialized slot"),
        }
    }

    // ------------------------------------------------------------------
    // Typed reads
    // ------------------------------------------------------------------

    fn resolve(&self, name: &str) -> Option<&Slot> {
        // Last match wins so override descendants shadow their ancestors.
        self.decls
            .iter()
            .enumerate()
            .rev()
            .find(|(_, d)| {
                d.name.eq_ignore_ascii_case(name)
                    || d.short_alias
                        .as_deref()
                        .is_some_and(|a| a.eq_ignore_ascii_case(name))
            })
            .map(|(i, _)| self.slot(self.decl_slots[i]))
    }

    /// Current scalar value of a named slot.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.resolve(name).and_then(Slot::value)
    }

    /// Current contents of a named collection slot.
    pub fn values(&self, name: &str) -> &[Value] {
        self.resolve(name).map(Slot::values).unwrap_or(&[])
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        match self.value(name) {
            Some(Value::Int(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        match self.value(name) {
            Some(Value::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.value(name) {
            Some(Value::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn path(&self, name: &str) -> Option<&std::path::Path> {
        self.value(name).and_then(Value::as_path)
    }

    /// Matched symbol of a choice-typed slot.
    pub fn symbol(&self, name: &str) -> Option<&str> {
        match self.value(name) {
            Some(Value::Symbol(s)) => Some(s),
            _ => None,
        }
    }

    /// Values bound to the positional slot, in encounter order.
    pub fn positional_values(&self) -> &[Value] {
        self.positionals
            .first()
            .map(|(_, id)| self.slot(*id).values())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_declare_preloads_default() {
        let mut record = OptionsRecord::new("tool");
        let id = record.declare(
            OptionDecl::scalar("LEVEL", ValueKind::Integer).with_default(Value::Int(6)),
        );
        assert_eq!(record.int("LEVEL"), Some(6));
        assert!(!record.slot(id).is_set());
        assert_eq!(record.slot(id).source(), None);
    }

    #[test]
    fn test_write_scalar_marks_set_and_source() {
        let mut record = OptionsRecord::new("tool");
        let id = record.declare(OptionDecl::scalar("LEVEL", ValueKind::Integer));
        record.write_scalar(id, Some(Value::Int(4)), Provenance::OptionsFile);
        assert_eq!(record.int("LEVEL"), Some(4));
        assert!(record.slot(id).is_set());
        assert_eq!(record.slot(id).source(), Some(Provenance::OptionsFile));
    }

    #[test]
    fn test_name_resolution_is_case_insensitive_and_covers_aliases() {
        let mut record = OptionsRecord::new("tool");
        record.declare(
            OptionDecl::scalar("LEVEL", ValueKind::Integer)
                .with_short_alias("L")
                .with_default(Value::Int(2)),
        );
        assert_eq!(record.int("level"), Some(2));
        assert_eq!(record.int("l"), Some(2));
        assert_eq!(record.int("UNKNOWN"), None);
    }

    #[test]
    fn test_cleared_scalar_is_set_but_empty() {
        let mut record = OptionsRecord::new("tool");
        let id = record.declare(
            OptionDecl::scalar("LEVEL", ValueKind::Integer).with_default(Value::Int(6)),
        );
        record.write_scalar(id, None, Provenance::Direct);
        assert_eq!(record.value("LEVEL"), None);
        assert!(record.slot(id).is_set());
        assert!(!record.slot(id).has_value());
    }
}
