//! The editable value table: a row list kept in sync with its mapping.
//!
//! All edits run synchronously. A table is shared by reference (`&self`) so
//! that change listeners can hold an `Rc` to the table they observe; while a
//! recompose is in flight any re-entrant edit is suppressed.

use std::{
    cell::{Cell, RefCell},
    fmt,
    marker::PhantomData,
    rc::Rc,
};

use tracing::debug;
use valuetable_types::{
    CellValue, Field, FieldInput, KeyKind, Mapping, Row, RowKind, TableKind, ValueKind,
};

use crate::{
    codec::{KeyShape, Keyed, Ranged},
    error::TableError,
    sync::{RecomposeScope, blank_row, decompose, recompose, reorder},
};

/// Table over discrete keys.
pub type KeyValueTable = ValueTable<Keyed>;
/// Table over `from~to` ranges.
pub type RangeValueTable = ValueTable<Ranged>;

/// Per-instance configuration: `valuetype` and `keytype`/`rangetype`.
///
/// An unset `key_kind` resolves to the key shape's own default, so range
/// tables compare bounds numerically unless told otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableOptions {
    pub value_kind: ValueKind,
    pub key_kind: Option<KeyKind>,
}

impl TableOptions {
    /// Options a table of `kind` starts with when nothing is configured.
    pub fn for_kind(kind: TableKind) -> Self {
        Self {
            value_kind: ValueKind::default(),
            key_kind: Some(kind.default_key_kind()),
        }
    }

    pub fn with_value_kind(mut self, value_kind: ValueKind) -> Self {
        self.value_kind = value_kind;
        self
    }

    pub fn with_key_kind(mut self, key_kind: KeyKind) -> Self {
        self.key_kind = Some(key_kind);
        self
    }
}

/// The operation that produced a change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeCause {
    Edit,
    Append,
    Delete,
    Reorder,
}

/// Payload of a change notification: the freshly produced mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub mapping: Mapping,
    pub cause: ChangeCause,
}

/// What an edit call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOutcome {
    /// The mapping was rebuilt and listeners were notified once.
    Recomposed,
    /// The new row was promoted into the mapping and reset.
    Appended,
    /// The input was held in its row without rebuilding the mapping.
    Staged,
    /// The field is disabled (the default row's key).
    Ignored,
    /// Another recompose was in flight; nothing changed.
    Suppressed,
}

/// Where input focus should go after an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusTarget {
    pub row: usize,
    pub field: Field,
}

type Listener = Rc<dyn Fn(&ChangeEvent)>;

struct TableState<K> {
    mapping: Mapping,
    rows: Vec<Row<K>>,
    focus: Option<FocusTarget>,
}

impl<K> TableState<K> {
    fn new_row_index(&self) -> usize {
        self.rows.len() - 2
    }
}

/// Holds the recomposing flag for the duration of one operation.
struct RecomposeGuard<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> RecomposeGuard<'a> {
    fn acquire(flag: &'a Cell<bool>) -> Option<Self> {
        if flag.replace(true) { None } else { Some(Self { flag }) }
    }
}

impl Drop for RecomposeGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

/// A key/value or range/value table editor.
///
/// The row list is the source of truth while editing: existing rows, then the
/// trailing new row, then the fixed default row. Every committed change
/// rebuilds a fresh [`Mapping`] from the rows, replaces the held one and
/// notifies each listener exactly once.
pub struct ValueTable<S: KeyShape> {
    options: TableOptions,
    state: RefCell<TableState<S::Key>>,
    recomposing: Cell<bool>,
    listeners: RefCell<Vec<Listener>>,
    _shape: PhantomData<S>,
}

impl<S: KeyShape> ValueTable<S> {
    pub fn new(options: TableOptions) -> Self {
        Self::with_value(Mapping::new(), options)
    }

    pub fn with_value(mapping: Mapping, options: TableOptions) -> Self {
        let rows = decompose::<S>(&mapping, options.value_kind);
        Self {
            options,
            state: RefCell::new(TableState {
                mapping,
                rows,
                focus: None,
            }),
            recomposing: Cell::new(false),
            listeners: RefCell::new(Vec::new()),
            _shape: PhantomData,
        }
    }

    pub fn options(&self) -> TableOptions {
        self.options
    }

    /// The comparator kind in effect: the configured one, or the shape's default.
    pub fn key_kind(&self) -> KeyKind {
        self.options.key_kind.unwrap_or(S::DEFAULT_KEY_KIND)
    }

    /// Replaces the mapping from outside. Rows are re-projected; no notification is sent.
    pub fn set_value(&self, mapping: Mapping) {
        let mut state = self.state.borrow_mut();
        state.rows = decompose::<S>(&mapping, self.options.value_kind);
        state.mapping = mapping;
        state.focus = None;
    }

    /// The current mapping.
    pub fn value(&self) -> Mapping {
        self.state.borrow().mapping.clone()
    }

    /// The current row list, including the new and default rows.
    pub fn rows(&self) -> Vec<Row<S::Key>> {
        self.state.borrow().rows.clone()
    }

    pub fn row(&self, index: usize) -> Option<Row<S::Key>> {
        self.state.borrow().rows.get(index).cloned()
    }

    pub fn new_row_index(&self) -> usize {
        self.state.borrow().new_row_index()
    }

    pub fn default_row_index(&self) -> usize {
        self.state.borrow().rows.len() - 1
    }

    /// Index of the first existing row whose encoded key is `raw`.
    pub fn find_row(&self, raw: &str) -> Option<usize> {
        self.state
            .borrow()
            .rows
            .iter()
            .position(|row| row.kind == RowKind::Existing && S::encode(&row.key) == raw)
    }

    pub fn focus(&self) -> Option<FocusTarget> {
        self.state.borrow().focus
    }

    pub fn is_recomposing(&self) -> bool {
        self.recomposing.get()
    }

    /// Registers a listener receiving every change notification.
    pub fn subscribe(&self, listener: impl Fn(&ChangeEvent) + 'static) {
        self.listeners.borrow_mut().push(Rc::new(listener));
    }

    /// Resolves `query` against the current mapping, falling back to the default.
    pub fn resolve(&self, query: &str) -> Option<CellValue> {
        crate::lookup::resolve::<S>(&self.state.borrow().mapping, query, self.key_kind()).cloned()
    }

    /// Holds typed input in a row without rebuilding the mapping.
    ///
    /// Staged input is read by the next recompose, whichever row triggers it.
    pub fn edit(&self, index: usize, field: Field, input: impl Into<FieldInput>) -> Result<ChangeOutcome, TableError> {
        if self.recomposing.get() {
            return Ok(ChangeOutcome::Suppressed);
        }
        let mut state = self.state.borrow_mut();
        let row = row_mut(&mut state.rows, index)?;
        if apply_input::<S>(row, field, input.into(), self.options.value_kind)? {
            Ok(ChangeOutcome::Staged)
        } else {
            Ok(ChangeOutcome::Ignored)
        }
    }

    /// Commits a changed input, the way an input's change event does.
    ///
    /// Existing and default rows recompose. The new row is promoted when its
    /// value changes while its key is filled, or when its key is committed
    /// while its value is already filled; otherwise the input is staged.
    pub fn commit(&self, index: usize, field: Field, input: impl Into<FieldInput>) -> Result<ChangeOutcome, TableError> {
        let Some(_guard) = RecomposeGuard::acquire(&self.recomposing) else {
            debug!(index, %field, "change suppressed while recomposing");
            return Ok(ChangeOutcome::Suppressed);
        };

        let (kind, promote) = {
            let mut state = self.state.borrow_mut();
            let row = row_mut(&mut state.rows, index)?;
            if !apply_input::<S>(row, field, input.into(), self.options.value_kind)? {
                return Ok(ChangeOutcome::Ignored);
            }
            let key_filled = !S::primary(&row.key).is_empty();
            let promote = key_filled && (field == Field::Value || row.value.is_filled());
            (row.kind, promote)
        };

        match kind {
            RowKind::Existing | RowKind::Default => {
                self.recompose_and_notify(RecomposeScope::Committed, ChangeCause::Edit);
                Ok(ChangeOutcome::Recomposed)
            }
            RowKind::New if promote => {
                self.promote_new_row();
                Ok(ChangeOutcome::Appended)
            }
            RowKind::New => Ok(ChangeOutcome::Staged),
        }
    }

    /// Folds the new row into the mapping and resets it, focusing its first field.
    ///
    /// A new row with an empty key is discarded by the recompose.
    pub fn append(&self) -> ChangeOutcome {
        let Some(_guard) = RecomposeGuard::acquire(&self.recomposing) else {
            return ChangeOutcome::Suppressed;
        };
        self.promote_new_row();
        ChangeOutcome::Appended
    }

    /// Deletes an existing row by clearing its primary key and recomposing.
    pub fn delete(&self, index: usize) -> Result<ChangeOutcome, TableError> {
        let Some(_guard) = RecomposeGuard::acquire(&self.recomposing) else {
            return Ok(ChangeOutcome::Suppressed);
        };
        {
            let mut state = self.state.borrow_mut();
            let row = row_mut(&mut state.rows, index)?;
            if !row.is_deletable() {
                return Err(TableError::NotDeletable { index, kind: row.kind });
            }
            if let Some(primary) = S::field_mut(&mut row.key, S::primary_field()) {
                primary.clear();
            }
        }
        self.recompose_and_notify(RecomposeScope::Committed, ChangeCause::Delete);
        Ok(ChangeOutcome::Recomposed)
    }

    /// Sorts entries descending by key (or `from` bound); the default stays last.
    ///
    /// Sorting works on the current mapping, so staged input in existing rows is dropped.
    pub fn sort(&self) -> ChangeOutcome {
        let Some(_guard) = RecomposeGuard::acquire(&self.recomposing) else {
            return ChangeOutcome::Suppressed;
        };
        let event = {
            let mut state = self.state.borrow_mut();
            let mapping = reorder::<S>(&state.mapping, self.key_kind());
            let draft = state.rows[state.new_row_index()].clone();
            self.project(&mut state, mapping.clone(), Some(draft));
            ChangeEvent {
                mapping,
                cause: ChangeCause::Reorder,
            }
        };
        self.notify(&event);
        ChangeOutcome::Recomposed
    }

    fn promote_new_row(&self) {
        self.recompose_and_notify(RecomposeScope::IncludingNew, ChangeCause::Append);
        let mut state = self.state.borrow_mut();
        let row = state.new_row_index();
        state.focus = Some(FocusTarget {
            row,
            field: S::primary_field(),
        });
    }

    fn recompose_and_notify(&self, scope: RecomposeScope, cause: ChangeCause) {
        let event = {
            let mut state = self.state.borrow_mut();
            let mapping = recompose::<S>(&state.rows, scope, self.options.value_kind);
            let draft = match scope {
                RecomposeScope::Committed => Some(state.rows[state.new_row_index()].clone()),
                RecomposeScope::IncludingNew => None,
            };
            self.project(&mut state, mapping.clone(), draft);
            ChangeEvent { mapping, cause }
        };
        self.notify(&event);
    }

    // Replaces the mapping and re-projects the rows, carrying over the new-row draft if given.
    fn project(&self, state: &mut TableState<S::Key>, mapping: Mapping, draft: Option<Row<S::Key>>) {
        state.rows = decompose::<S>(&mapping, self.options.value_kind);
        let new_row = state.new_row_index();
        state.rows[new_row] = draft.unwrap_or_else(|| blank_row::<S>(self.options.value_kind));
        state.mapping = mapping;
    }

    fn notify(&self, event: &ChangeEvent) {
        debug!(cause = ?event.cause, entries = event.mapping.len(), "value table changed");
        let listeners: Vec<Listener> = self.listeners.borrow().clone();
        for listener in listeners {
            listener(event);
        }
    }
}

impl<S: KeyShape> fmt::Debug for ValueTable<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ValueTable")
            .field("options", &self.options)
            .field("mapping", &state.mapping)
            .field("rows", &state.rows)
            .field("recomposing", &self.recomposing.get())
            .finish_non_exhaustive()
    }
}

fn row_mut<K>(rows: &mut [Row<K>], index: usize) -> Result<&mut Row<K>, TableError> {
    let len = rows.len();
    rows.get_mut(index).ok_or(TableError::RowOutOfRange { index, len })
}

// Returns false when the field is disabled for this row.
fn apply_input<S: KeyShape>(
    row: &mut Row<S::Key>,
    field: Field,
    input: FieldInput,
    value_kind: ValueKind,
) -> Result<bool, TableError> {
    if field == Field::Value {
        row.value = CellValue::from(input).conform(value_kind);
        return Ok(true);
    }
    if !S::KEY_FIELDS.contains(&field) {
        return Err(TableError::UnknownField { field });
    }
    if !row.is_key_editable() {
        return Ok(false);
    }
    let FieldInput::Text(text) = input else {
        return Err(TableError::CheckedKeyInput { field });
    };
    if let Some(slot) = S::field_mut(&mut row.key, field) {
        *slot = text;
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use valuetable_types::RangeKey;

    fn parse(json: &str) -> Mapping {
        serde_json::from_str(json).expect("parse mapping")
    }

    fn recorder<S: KeyShape>(table: &ValueTable<S>) -> Rc<RefCell<Vec<ChangeEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        table.subscribe(move |event| sink.borrow_mut().push(event.clone()));
        events
    }

    #[test]
    fn editing_existing_value_recomposes_once() {
        let table = KeyValueTable::with_value(parse(r#"{"a": "x", "default": "z"}"#), TableOptions::default());
        let events = recorder(&table);

        let outcome = table.commit(0, Field::Value, "changed").expect("commit");

        assert_eq!(outcome, ChangeOutcome::Recomposed);
        assert_eq!(events.borrow().len(), 1);
        assert_eq!(table.value(), parse(r#"{"a": "changed", "default": "z"}"#));
        assert_eq!(events.borrow()[0].cause, ChangeCause::Edit);
    }

    #[test]
    fn default_row_key_is_disabled() {
        let table = RangeValueTable::new(TableOptions::for_kind(TableKind::Range));
        let index = table.default_row_index();
        let outcome = table.commit(index, Field::From, "0").expect("commit");
        assert_eq!(outcome, ChangeOutcome::Ignored);
        assert_eq!(table.row(index).map(|row| row.key), Some(RangeKey::new("default", "")));
    }

    #[test]
    fn key_fields_must_exist_on_the_shape() {
        let table = KeyValueTable::new(TableOptions::default());
        let error = table.commit(0, Field::To, "5").expect_err("keyed tables have no upper bound");
        assert_eq!(error, TableError::UnknownField { field: Field::To });
        let error = table.commit(0, Field::Key, true).expect_err("keys take text");
        assert_eq!(error, TableError::CheckedKeyInput { field: Field::Key });
    }

    #[test]
    fn new_row_key_alone_is_staged() {
        let table = KeyValueTable::new(TableOptions::default());
        let events = recorder(&table);
        let outcome = table.commit(table.new_row_index(), Field::Key, "a").expect("commit");
        assert_eq!(outcome, ChangeOutcome::Staged);
        assert!(events.borrow().is_empty());
        assert_eq!(table.row(table.new_row_index()).map(|row| row.key), Some("a".to_string()));
    }

    #[test]
    fn re_entrant_commit_from_listener_is_suppressed() {
        let table = Rc::new(KeyValueTable::with_value(parse(r#"{"a": "x"}"#), TableOptions::default()));
        let observed = Rc::new(RefCell::new(Vec::new()));
        let weak = Rc::downgrade(&table);
        let sink = Rc::clone(&observed);
        table.subscribe(move |_| {
            if let Some(table) = weak.upgrade() {
                sink.borrow_mut().push(table.commit(0, Field::Value, "echo"));
            }
        });

        table.commit(0, Field::Value, "y").expect("commit");

        assert_eq!(*observed.borrow(), vec![Ok(ChangeOutcome::Suppressed)]);
        assert_eq!(table.value().get("a"), Some(&CellValue::from("y")));
        assert!(!table.is_recomposing());
    }

    #[test]
    fn unset_key_kind_follows_the_shape() {
        assert_eq!(RangeValueTable::new(TableOptions::default()).key_kind(), KeyKind::Number);
        assert_eq!(KeyValueTable::new(TableOptions::default()).key_kind(), KeyKind::String);
        let lexical = TableOptions::default().with_key_kind(KeyKind::String);
        assert_eq!(RangeValueTable::new(lexical).key_kind(), KeyKind::String);
    }

    #[test]
    fn guard_is_released_after_errors() {
        let table = KeyValueTable::new(TableOptions::default());
        assert!(table.delete(42).is_err());
        assert!(!table.is_recomposing());
        assert_eq!(table.sort(), ChangeOutcome::Recomposed);
    }
}
