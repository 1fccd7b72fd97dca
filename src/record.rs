//! A single row: an ordered list of values sharing the table's field set.

use crate::field::FieldDescriptor;
use crate::value::Value;
use std::sync::Arc;

/// A row materialized from (or destined for) one position in the table.
///
/// Records read from the table are snapshots: mutating one does not
/// retroactively alter the file. `record_index == -1` marks a synthetic
/// record not yet placed at a cursor position (the template returned while
/// the cursor sits at `BeforeFirst`, or a freshly built record passed to
/// `add_record`).
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    fields: Arc<Vec<FieldDescriptor>>,
    values: Vec<Value>,
    record_index: i64,
    deleted: bool,
}

impl Record {
    pub(crate) fn new(fields: Arc<Vec<FieldDescriptor>>, values: Vec<Value>, record_index: i64) -> Self {
        debug_assert_eq!(fields.len(), values.len());
        Self {
            fields,
            values,
            record_index,
            deleted: false,
        }
    }

    /// Builds the template record: every field at its declared default.
    pub(crate) fn template(fields: Arc<Vec<FieldDescriptor>>) -> Self {
        let count = fields.len();
        let mut record = Self::new(fields, vec![Value::Null; count], -1);
        record.clear_values();
        record
    }

    pub fn record_index(&self) -> i64 {
        self.record_index
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub(crate) fn set_deleted(&mut self, deleted: bool) {
        self.deleted = deleted;
    }

    pub fn field_count(&self) -> usize {
        self.values.len()
    }

    pub fn field_descriptor(&self, index: usize) -> Option<&FieldDescriptor> {
        self.fields.get(index)
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name().eq_ignore_ascii_case(name))
    }

    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn value_by_name(&self, name: &str) -> Option<&Value> {
        self.index_of(name).and_then(|i| self.values.get(i))
    }

    pub(crate) fn set_value(&mut self, index: usize, value: Value) -> Option<Value> {
        self.values.get_mut(index).map(|slot| std::mem::replace(slot, value))
    }

    /// Resets every field to its declared default, without touching
    /// metadata (index, deleted flag).
    pub(crate) fn clear_values(&mut self) {
        for (slot, descriptor) in self.values.iter_mut().zip(self.fields.iter()) {
            *slot = descriptor.default_value();
        }
    }

    pub(crate) fn values(&self) -> &[Value] {
        &self.values
    }
}
