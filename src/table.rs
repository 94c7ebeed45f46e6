/// Data Sweeper Table Implementation
///
/// A Table is a collection of columns with a schema. Besides row-level access
/// it carries the cleaning operations applied to uploads: duplicate removal,
/// mean-fill of numeric columns and column selection.
///
/// # Examples
///
/// ```
/// use datasweeper::{Table, Schema, ColumnType, ColumnValue};
///
/// let schema = Schema::new(vec![
///     ("name".to_string(), ColumnType::String),
///     ("score".to_string(), ColumnType::Float64),
/// ]);
///
/// let mut table = Table::new("scores".to_string(), schema);
/// table.append_row(vec![ColumnValue::String("Alice".to_string()), ColumnValue::Float64(95.5)]).unwrap();
/// table.append_row(vec![ColumnValue::String("Alice".to_string()), ColumnValue::Float64(95.5)]).unwrap();
///
/// assert_eq!(table.drop_duplicates(), 1);
/// assert_eq!(table.len(), 1);
/// ```

use crate::column::{Column, ColumnType, ColumnValue};
use std::collections::HashSet;

/// Schema definition with column names and types.
///
/// # Examples
///
/// ```
/// use datasweeper::{Schema, ColumnType};
///
/// let schema = Schema::new(vec![
///     ("id".to_string(), ColumnType::Int64),
///     ("email".to_string(), ColumnType::String),
/// ]);
///
/// assert_eq!(schema.len(), 2);
/// assert_eq!(schema.get_column_index("email"), Some(1));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    columns: Vec<(String, ColumnType)>,
}

impl Schema {
    pub fn new(columns: Vec<(String, ColumnType)>) -> Self {
        Schema { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get_column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|(n, _)| n == name)
    }

    pub fn get_column_type(&self, name: &str) -> Option<ColumnType> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, ty)| *ty)
    }

    /// Names of numeric columns, in schema order.
    pub fn numeric_column_names(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|(_, ty)| ty.is_numeric())
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Root table owning its data.
#[derive(Clone)]
pub struct Table {
    name: String,
    schema: Schema,
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    pub fn new(name: String, schema: Schema) -> Self {
        let columns = schema
            .columns
            .iter()
            .map(|(col_name, col_type)| Column::new(col_name.clone(), *col_type))
            .collect();

        Table {
            name,
            schema,
            columns,
            row_count: 0,
        }
    }

    /// Build a table from fully populated columns. All columns must have the
    /// same length and distinct names.
    pub fn from_columns(name: String, columns: Vec<Column>) -> Result<Self, String> {
        let row_count = columns.first().map_or(0, Column::len);
        let mut seen = HashSet::new();
        for col in &columns {
            if col.len() != row_count {
                return Err(format!(
                    "Column '{}' has {} values, expected {}",
                    col.name(),
                    col.len(),
                    row_count
                ));
            }
            if !seen.insert(col.name()) {
                return Err(format!("Duplicate column name '{}'", col.name()));
            }
        }

        let schema = Schema::new(
            columns
                .iter()
                .map(|c| (c.name().to_string(), c.column_type()))
                .collect(),
        );

        Ok(Table {
            name,
            schema,
            columns,
            row_count,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.schema
            .get_column_index(name)
            .map(|idx| &self.columns[idx])
    }

    pub fn get_value(&self, row: usize, column: &str) -> Result<ColumnValue, String> {
        let col_idx = self
            .schema
            .get_column_index(column)
            .ok_or_else(|| format!("Column '{}' not found", column))?;

        self.columns[col_idx].get(row)
    }

    /// Values of one row, in column order.
    pub fn get_row(&self, row: usize) -> Result<Vec<ColumnValue>, String> {
        if row >= self.row_count {
            return Err(format!("Row {} out of range [0, {})", row, self.row_count));
        }

        self.columns.iter().map(|col| col.get(row)).collect()
    }

    /// Append a row given in column order. Nothing is written if any value
    /// fails type validation.
    pub fn append_row(&mut self, row: Vec<ColumnValue>) -> Result<(), String> {
        if row.len() != self.columns.len() {
            return Err(format!(
                "Row has {} values, table has {} columns",
                row.len(),
                self.columns.len()
            ));
        }

        for (col, value) in self.columns.iter().zip(row.iter()) {
            let ty = col.column_type();
            let ok = match value {
                ColumnValue::Null => true,
                ColumnValue::Int64(_) => ty == ColumnType::Int64,
                ColumnValue::Float64(_) => ty == ColumnType::Float64,
                ColumnValue::Bool(_) => ty == ColumnType::Bool,
                ColumnValue::String(_) => ty == ColumnType::String,
            };
            if !ok {
                return Err(format!(
                    "Type mismatch in column '{}': expected {}, got {:?}",
                    col.name(),
                    ty.label(),
                    value
                ));
            }
        }

        for (col, value) in self.columns.iter_mut().zip(row) {
            col.append(value)?;
        }
        self.row_count += 1;

        Ok(())
    }

    pub fn iter_rows(&self) -> TableRowIterator<'_> {
        TableRowIterator {
            table: self,
            index: 0,
        }
    }

    /// First `n` rows, in column order.
    pub fn head(&self, n: usize) -> Vec<Vec<ColumnValue>> {
        self.iter_rows().take(n).collect()
    }

    // ========================================================================
    // Cleaning Methods
    // ========================================================================

    /// Remove rows that equal an earlier row across all columns, keeping the
    /// first occurrence. Returns the number of removed rows.
    ///
    /// ```
    /// use datasweeper::{Table, Schema, ColumnType, ColumnValue};
    ///
    /// let schema = Schema::new(vec![("v".to_string(), ColumnType::String)]);
    /// let mut table = Table::new("t".to_string(), schema);
    /// for v in ["A", "A", "B"] {
    ///     table.append_row(vec![ColumnValue::String(v.to_string())]).unwrap();
    /// }
    ///
    /// assert_eq!(table.drop_duplicates(), 1);
    /// assert_eq!(table.get_value(1, "v").unwrap().as_string(), Some("B"));
    /// ```
    pub fn drop_duplicates(&mut self) -> usize {
        let mut seen: HashSet<Vec<&ColumnValue>> = HashSet::with_capacity(self.row_count);
        let keep: Vec<bool> = (0..self.row_count)
            .map(|row| {
                let key: Vec<&ColumnValue> = self
                    .columns
                    .iter()
                    .filter_map(|col| col.get_ref(row))
                    .collect();
                seen.insert(key)
            })
            .collect();
        drop(seen);

        let removed = keep.iter().filter(|k| !**k).count();
        if removed > 0 {
            for col in self.columns.iter_mut() {
                col.retain_rows(&keep);
            }
            self.row_count -= removed;
        }
        removed
    }

    /// Replace NULLs in every numeric column with the mean of that column's
    /// present values. Non-numeric columns are untouched. Returns the number
    /// of filled cells.
    ///
    /// An INT64 column whose mean has a fractional part is widened to FLOAT64.
    pub fn fill_missing_with_mean(&mut self) -> usize {
        let mut filled = 0;

        for (idx, col) in self.columns.iter_mut().enumerate() {
            if !col.column_type().is_numeric() || col.null_count() == 0 {
                continue;
            }
            let Some(mean) = column_mean(col) else {
                continue;
            };

            if col.column_type() == ColumnType::Int64 && mean.fract() != 0.0 {
                col.promote_to_float();
                self.schema.columns[idx].1 = ColumnType::Float64;
            }
            let fill = match col.column_type() {
                ColumnType::Int64 => ColumnValue::Int64(mean as i64),
                _ => ColumnValue::Float64(mean),
            };

            for row in 0..self.row_count {
                if col.is_null_at(row) && col.set(row, fill.clone()).is_ok() {
                    filled += 1;
                }
            }
        }

        filled
    }

    /// Restrict the table to exactly `names`, in that order.
    pub fn select_columns(&mut self, names: &[String]) -> Result<(), String> {
        let mut indices = Vec::with_capacity(names.len());
        let mut seen = HashSet::new();
        for name in names {
            let idx = self
                .schema
                .get_column_index(name)
                .ok_or_else(|| format!("Column '{}' not found", name))?;
            if !seen.insert(idx) {
                return Err(format!("Column '{}' selected more than once", name));
            }
            indices.push(idx);
        }

        let mut old: Vec<Option<Column>> = std::mem::take(&mut self.columns)
            .into_iter()
            .map(Some)
            .collect();
        self.columns = indices
            .iter()
            .filter_map(|&idx| old[idx].take())
            .collect();
        self.schema = Schema::new(
            self.columns
                .iter()
                .map(|c| (c.name().to_string(), c.column_type()))
                .collect(),
        );

        Ok(())
    }
}

fn column_mean(col: &Column) -> Option<f64> {
    let (sum, count) = col
        .iter()
        .filter_map(ColumnValue::to_f64)
        .fold((0.0, 0usize), |(s, c), n| (s + n, c + 1));

    if count > 0 {
        Some(sum / count as f64)
    } else {
        None
    }
}

pub struct TableRowIterator<'a> {
    table: &'a Table,
    index: usize,
}

impl<'a> Iterator for TableRowIterator<'a> {
    type Item = Vec<ColumnValue>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.table.row_count {
            None
        } else {
            let result = self.table.get_row(self.index).ok();
            self.index += 1;
            result
        }
    }
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Table {{ name: '{}', columns: {}, rows: {} }}",
            self.name,
            self.schema.len(),
            self.row_count
        )
    }
}
