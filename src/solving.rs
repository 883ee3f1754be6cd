use pathfinding::prelude::{kuhn_munkres_min, Matrix};

/// Integer cost of a banned entry. Large enough that any assignment avoiding it is preferred.
pub const SENTINEL: i64 = 1_000_000_000_000_000;

/// Fractional costs are kept to this precision when handed to the matcher
const COST_SCALE: f64 = 100.0;

/// Dense rows x columns cost table. Entries start banned.
#[derive(Clone,Debug)]
pub struct CostMatrix {
    rows: usize,
    columns: usize,
    costs: Vec<f64>,
}
impl CostMatrix {
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            costs: vec![f64::INFINITY; rows * columns],
        }
    }

    pub fn rows(&self) -> usize { self.rows }

    pub fn columns(&self) -> usize { self.columns }

    pub fn set(&mut self, row: usize, column: usize, cost: f64) {
        self.costs[row * self.columns + column] = cost;
    }

    pub fn get(&self, row: usize, column: usize) -> f64 {
        self.costs[row * self.columns + column]
    }

    pub fn ban(&mut self, row: usize, column: usize) {
        self.set(row, column, f64::INFINITY);
    }

    pub fn is_banned(&self, row: usize, column: usize) -> bool {
        !self.get(row, column).is_finite()
    }

    fn scaled(&self, row: usize, column: usize) -> i64 {
        let cost = self.get(row, column);
        if !cost.is_finite() { return SENTINEL }
        let scaled = (cost * COST_SCALE).round();
        if scaled >= SENTINEL as f64 { SENTINEL }
        else if scaled <= -(SENTINEL as f64) { -SENTINEL }
        else { scaled as i64 }
    }
}

#[derive(Clone,Debug,PartialEq)]
pub struct Matching {
    /// row -> column; None when the row could only be given padding or a banned column
    pub assignments: Vec<Option<usize>>,

    /// Sum over assigned rows
    pub total_cost: f64,
}

/// Minimum-cost assignment of rows to distinct columns
pub fn solve(matrix: &CostMatrix) -> Matching {
    let rows = matrix.rows();
    if rows == 0 {
        return Matching { assignments: Vec::new(), total_cost: 0.0 };
    }

    // The matcher needs at least as many columns as rows
    let columns = matrix.columns().max(rows);
    let mut weights = Matrix::new(rows, columns, SENTINEL);
    for row in 0..rows {
        for column in 0..matrix.columns() {
            weights[(row, column)] = matrix.scaled(row, column);
        }
    }

    let (_, solution) = kuhn_munkres_min(&weights);

    let mut total_cost = 0.0;
    let assignments = solution.into_iter().enumerate().map(|(row, column)| {
        if column >= matrix.columns() || matrix.is_banned(row, column) {
            tracing::debug!(row = row, "assignment row left unmatched");
            None
        } else {
            total_cost += matrix.get(row, column);
            Some(column)
        }
    }).collect();

    Matching { assignments, total_cost }
}
