use std::{
    collections::{BTreeSet, HashMap},
    hash::Hash,
};

/// Two-key table where most cells are empty. Rows are remembered in the order they were first
/// written, columns are kept sorted. Reading a cell that was never written gives `V::default()`.
///
/// Not synchronized, [SparseTable::update] is a plain read-modify-write.
#[derive(Debug, Clone)]
pub struct SparseTable<R, C, V> {
    rows: Vec<R>,
    columns: BTreeSet<C>,
    values: HashMap<R, HashMap<C, V>>,
}

impl<R, C, V> Default for SparseTable<R, C, V> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            columns: BTreeSet::new(),
            values: HashMap::new(),
        }
    }
}

impl<R, C, V> SparseTable<R, C, V>
where
    R: Eq + Hash + Clone,
    C: Ord + Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, row: R, column: C, value: V) {
        if !self.columns.contains(&column) {
            self.columns.insert(column.clone());
        }
        let cells = self.values.entry(row.clone()).or_insert_with(|| {
            self.rows.push(row);
            HashMap::new()
        });
        cells.insert(column, value);
    }

    /// Returns the cell only if it was written, so an explicitly stored empty value can be told
    /// apart from a missing one.
    pub fn try_get(&self, row: &R, column: &C) -> Option<&V> {
        self.values.get(row).and_then(|cells| cells.get(column))
    }

    pub fn get(&self, row: &R, column: &C) -> V
    where
        V: Clone + Default,
    {
        self.try_get(row, column).cloned().unwrap_or_default()
    }

    pub fn update(&mut self, row: R, column: C, update: impl FnOnce(V) -> V)
    where
        V: Default,
    {
        let current = self
            .values
            .get_mut(&row)
            .and_then(|cells| cells.remove(&column))
            .unwrap_or_default();
        self.set(row, column, update(current));
    }

    /// Rows in the order they were first written.
    pub fn row_keys(&self) -> impl Iterator<Item = &R> {
        self.rows.iter()
    }

    /// Every column that has been written in any row, ascending.
    pub fn col_keys(&self) -> impl Iterator<Item = &C> {
        self.columns.iter()
    }
}
