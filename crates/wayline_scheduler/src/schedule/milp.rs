use crate::define_index_newtype;

define_index_newtype!(ColumnId);
define_index_newtype!(RowId);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ColumnKind {
    Continuous,
    Binary,
}

/// Bound classes for columns and rows, mirroring the usual LP conventions:
/// one-sided, two-sided, or pinned to a single value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Bounds {
    Lower(f64),
    Upper(f64),
    Range(f64, f64),
    Fixed(f64),
}

#[derive(Debug, Clone)]
pub(crate) struct Column {
    pub kind: ColumnKind,
    pub bounds: Bounds,
    pub objective: f64,
}

#[derive(Debug, Clone)]
pub(crate) struct Row {
    pub bounds: Bounds,
    pub coefficients: Vec<(ColumnId, f64)>,
}

/// A minimization mixed-integer program described as plain data. Keeping the
/// model inert makes the scheduling logic independent of any particular
/// solver: backends consume it, and tests can answer it with canned values.
#[derive(Debug, Default)]
pub(crate) struct MilpModel {
    columns: Vec<Column>,
    rows: Vec<Row>,
}

impl MilpModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_column(&mut self, kind: ColumnKind, bounds: Bounds) -> ColumnId {
        let id = ColumnId::new(self.columns.len());
        self.columns.push(Column { kind, bounds, objective: 0.0 });
        id
    }

    pub fn add_row(&mut self, bounds: Bounds) -> RowId {
        let id = RowId::new(self.rows.len());
        self.rows.push(Row { bounds, coefficients: Vec::new() });
        id
    }

    pub fn set_coefficient(&mut self, row: RowId, column: ColumnId, value: f64) {
        self.rows[row.get()].coefficients.push((column, value));
    }

    pub fn set_objective(&mut self, column: ColumnId, value: f64) {
        self.columns[column.get()].objective = value;
    }

    pub fn clear_objective(&mut self) {
        for column in &mut self.columns {
            column.objective = 0.0;
        }
    }

    pub fn set_row_bounds(&mut self, row: RowId, bounds: Bounds) {
        self.rows[row.get()].bounds = bounds;
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

/// Why a solve produced no usable point. Both cases collapse into the same
/// infeasible-route error at the public surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SolveFailure {
    Infeasible,
    Undefined,
}

/// Column values of a solved model, in column order.
#[derive(Debug, Clone)]
pub(crate) struct MilpValues(Vec<f64>);

impl MilpValues {
    pub fn new(values: Vec<f64>) -> Self {
        MilpValues(values)
    }

    pub fn value(&self, column: ColumnId) -> f64 {
        self.0[column.get()]
    }

    /// Round-to-nearest whole seconds, half away from zero.
    pub fn rounded_secs(&self, column: ColumnId) -> i64 {
        self.value(column).round() as i64
    }
}

/// The only seam to the underlying linear-programming library.
pub(crate) trait MilpBackend {
    fn solve(&self, model: &MilpModel) -> Result<MilpValues, SolveFailure>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_bookkeeping() {
        let mut model = MilpModel::new();
        let t = model.add_column(ColumnKind::Continuous, Bounds::Range(0.0, 10.0));
        let x = model.add_column(ColumnKind::Binary, Bounds::Range(0.0, 1.0));
        let row = model.add_row(Bounds::Lower(1.0));
        model.set_coefficient(row, t, 1.0);
        model.set_coefficient(row, x, -2.0);
        model.set_objective(t, 3.0);

        assert_eq!(model.column_count(), 2);
        assert_eq!(model.rows()[0].coefficients, vec![(t, 1.0), (x, -2.0)]);
        assert_eq!(model.columns()[t.get()].objective, 3.0);

        model.clear_objective();
        assert_eq!(model.columns()[t.get()].objective, 0.0);

        model.set_row_bounds(row, Bounds::Fixed(4.0));
        assert_eq!(model.rows()[0].bounds, Bounds::Fixed(4.0));
    }

    #[test]
    fn test_rounding_is_half_away_from_zero() {
        let values = MilpValues::new(vec![1.5, 2.4999, -0.2, 10.0]);

        assert_eq!(values.rounded_secs(ColumnId::new(0)), 2);
        assert_eq!(values.rounded_secs(ColumnId::new(1)), 2);
        assert_eq!(values.rounded_secs(ColumnId::new(2)), 0);
        assert_eq!(values.rounded_secs(ColumnId::new(3)), 10);
    }
}
