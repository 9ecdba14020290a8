use good_lp::{
    Expression, ResolutionError, Solution, SolverModel, Variable, constraint, default_solver,
    variable, variables,
};

use crate::schedule::milp::{
    Bounds, ColumnKind, MilpBackend, MilpModel, MilpValues, SolveFailure,
};

/// Lowers a [`MilpModel`] onto `good_lp` and solves it with the bundled
/// pure-Rust branch-and-bound solver. A fresh problem instance is built per
/// call and dropped with it, so repeated solves of a mutated model never
/// share state.
pub(crate) struct GoodLpBackend;

impl MilpBackend for GoodLpBackend {
    fn solve(&self, model: &MilpModel) -> Result<MilpValues, SolveFailure> {
        let mut vars = variables!();

        let handles: Vec<Variable> = model
            .columns()
            .iter()
            .map(|column| {
                let definition = match (column.kind, column.bounds) {
                    (ColumnKind::Continuous, Bounds::Lower(lower)) => variable().min(lower),
                    (ColumnKind::Continuous, Bounds::Upper(upper)) => variable().max(upper),
                    (ColumnKind::Continuous, Bounds::Range(lower, upper)) => {
                        variable().min(lower).max(upper)
                    }
                    (ColumnKind::Continuous, Bounds::Fixed(value)) => {
                        variable().min(value).max(value)
                    }
                    (ColumnKind::Binary, Bounds::Fixed(value)) => {
                        variable().integer().min(value).max(value)
                    }
                    (ColumnKind::Binary, _) => variable().binary(),
                };
                vars.add(definition)
            })
            .collect();

        let objective = model
            .columns()
            .iter()
            .zip(&handles)
            .filter(|(column, _)| column.objective != 0.0)
            .fold(Expression::from(0.0), |acc, (column, handle)| {
                acc + *handle * column.objective
            });

        let mut problem = vars.minimise(objective).using(default_solver);

        for row in model.rows() {
            let expression = row
                .coefficients
                .iter()
                .fold(Expression::from(0.0), |acc, &(column, coefficient)| {
                    acc + handles[column.get()] * coefficient
                });
            problem = match row.bounds {
                Bounds::Lower(bound) => problem.with(constraint::geq(expression, bound)),
                Bounds::Upper(bound) => problem.with(constraint::leq(expression, bound)),
                Bounds::Fixed(bound) => problem.with(constraint::eq(expression, bound)),
                Bounds::Range(lower, upper) => problem
                    .with(constraint::geq(expression.clone(), lower))
                    .with(constraint::leq(expression, upper)),
            };
        }

        let solution = problem.solve().map_err(|error| match error {
            ResolutionError::Infeasible => SolveFailure::Infeasible,
            _ => SolveFailure::Undefined,
        })?;

        Ok(MilpValues::new(handles.iter().map(|handle| solution.value(*handle)).collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solves_a_tiny_program() {
        // minimize t subject to t >= 3, t in [0, 10]
        let mut model = MilpModel::new();
        let t = model.add_column(ColumnKind::Continuous, Bounds::Range(0.0, 10.0));
        let row = model.add_row(Bounds::Lower(3.0));
        model.set_coefficient(row, t, 1.0);
        model.set_objective(t, 1.0);

        let values = GoodLpBackend.solve(&model).unwrap();
        assert_eq!(values.rounded_secs(t), 3);
    }

    #[test]
    fn test_binary_choice() {
        // exactly one of two binaries; picking the second is cheaper
        let mut model = MilpModel::new();
        let a = model.add_column(ColumnKind::Binary, Bounds::Range(0.0, 1.0));
        let b = model.add_column(ColumnKind::Binary, Bounds::Range(0.0, 1.0));
        let pick_one = model.add_row(Bounds::Fixed(1.0));
        model.set_coefficient(pick_one, a, 1.0);
        model.set_coefficient(pick_one, b, 1.0);
        model.set_objective(a, 5.0);
        model.set_objective(b, 1.0);

        let values = GoodLpBackend.solve(&model).unwrap();
        assert_eq!(values.rounded_secs(a), 0);
        assert_eq!(values.rounded_secs(b), 1);
    }

    #[test]
    fn test_infeasible_maps_to_failure() {
        // t <= 1 and t >= 2 cannot both hold
        let mut model = MilpModel::new();
        let t = model.add_column(ColumnKind::Continuous, Bounds::Range(0.0, 1.0));
        let row = model.add_row(Bounds::Lower(2.0));
        model.set_coefficient(row, t, 1.0);

        assert!(GoodLpBackend.solve(&model).is_err());
    }
}
