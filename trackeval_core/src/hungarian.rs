//! Kuhn-Munkres (Hungarian) solver for rectangular minimum-cost assignment.
//!
//! # Algorithm
//! 1. Pad columns up to the row count with the matrix maximum.
//! 2. Subtract each row minimum from its row.
//! 3. Star the first zero of each row whose column holds no star yet
//!    (row-major scan order; this fixes the tie-break).
//! 4. Cover every starred column; stop once `min(rows, cols)` are covered.
//! 5. Prime an uncovered zero. If its row holds a star, cover the row and
//!    uncover the star's column; otherwise flip the alternating
//!    prime/star path that starts at it and go back to 4.
//! 6. With no uncovered zero left, subtract the smallest uncovered value
//!    from every uncovered cell and add it to every doubly covered cell,
//!    then go back to 5.
//!
//! Costs are compared against exact `0.0`: a reduced cell only becomes zero
//! by subtracting its own value, which is exact in IEEE arithmetic.

use crate::error::AssignmentError;
use nalgebra::DMatrix;

/// Solve the assignment problem for `costs` (rows are assigned to columns).
///
/// Returns `assignment` where `assignment[row]` is the selected column. Every
/// row receives exactly one column and no column is used twice. Columns at
/// index `>= costs.ncols()` are padding, only selected when there are more
/// rows than columns.
pub fn solve(costs: &DMatrix<f64>) -> Result<Vec<usize>, AssignmentError> {
    let n_rows = costs.nrows();
    if n_rows == 0 {
        return Ok(Vec::new());
    }
    for r in 0..n_rows {
        for c in 0..costs.ncols() {
            let value = costs[(r, c)];
            if !value.is_finite() {
                return Err(AssignmentError::NonFiniteCost { row: r, col: c, value });
            }
        }
    }

    let assignment = Munkres::new(costs).run();
    debug_assert_eq!(assignment.len(), n_rows);
    Ok(assignment)
}

/// Sum of the selected cells, ignoring padding columns.
pub fn total_cost(costs: &DMatrix<f64>, assignment: &[usize]) -> f64 {
    assignment
        .iter()
        .enumerate()
        .filter(|&(_, &c)| c < costs.ncols())
        .map(|(r, &c)| costs[(r, c)])
        .sum()
}

// ---------------------------------------------------------------------------
// Working state
// ---------------------------------------------------------------------------

struct Munkres {
    costs: DMatrix<f64>,
    n_rows: usize,
    n_cols: usize,
    row_star: Vec<Option<usize>>,
    col_star: Vec<Option<usize>>,
    row_prime: Vec<Option<usize>>,
    row_covered: Vec<bool>,
    col_covered: Vec<bool>,
}

impl Munkres {
    fn new(values: &DMatrix<f64>) -> Self {
        let n_rows = values.nrows();
        let n_cols = values.ncols().max(n_rows);
        let filler = values.iter().copied().reduce(f64::max).unwrap_or(0.0);

        let mut costs = DMatrix::from_element(n_rows, n_cols, filler);
        costs
            .view_mut((0, 0), (n_rows, values.ncols()))
            .copy_from(values);

        Self {
            costs,
            n_rows,
            n_cols,
            row_star: vec![None; n_rows],
            col_star: vec![None; n_cols],
            row_prime: vec![None; n_rows],
            row_covered: vec![false; n_rows],
            col_covered: vec![false; n_cols],
        }
    }

    fn run(mut self) -> Vec<usize> {
        self.reduce_rows();
        self.star_zeros();

        let k = self.n_rows.min(self.n_cols);
        while self.cover_starred_columns() < k {
            loop {
                let Some((r, c)) = self.find_uncovered_zero() else {
                    self.reduce_uncovered();
                    continue;
                };
                self.row_prime[r] = Some(c);
                match self.row_star[r] {
                    Some(star_col) => {
                        self.row_covered[r] = true;
                        self.col_covered[star_col] = false;
                    }
                    None => {
                        self.augment(r, c);
                        break;
                    }
                }
            }
        }

        self.row_star.into_iter().flatten().collect()
    }

    fn reduce_rows(&mut self) {
        for r in 0..self.n_rows {
            let min = (0..self.n_cols)
                .map(|c| self.costs[(r, c)])
                .fold(f64::INFINITY, f64::min);
            for c in 0..self.n_cols {
                self.costs[(r, c)] -= min;
            }
        }
    }

    fn star_zeros(&mut self) {
        for r in 0..self.n_rows {
            for c in 0..self.n_cols {
                if self.col_star[c].is_none() && self.costs[(r, c)] == 0.0 {
                    self.row_star[r] = Some(c);
                    self.col_star[c] = Some(r);
                    break;
                }
            }
        }
    }

    /// Cover the starred columns and return how many there are.
    fn cover_starred_columns(&mut self) -> usize {
        let mut covered = 0;
        for c in 0..self.n_cols {
            self.col_covered[c] = self.col_star[c].is_some();
            if self.col_covered[c] {
                covered += 1;
            }
        }
        covered
    }

    fn find_uncovered_zero(&self) -> Option<(usize, usize)> {
        (0..self.n_rows)
            .filter(|&r| !self.row_covered[r])
            .find_map(|r| {
                (0..self.n_cols)
                    .find(|&c| !self.col_covered[c] && self.costs[(r, c)] == 0.0)
                    .map(|c| (r, c))
            })
    }

    /// Flip the alternating path starting at the primed zero `(row, col)`:
    /// every prime on it becomes a star, every star on it is dropped.
    fn augment(&mut self, row: usize, col: usize) {
        let mut primes = vec![(row, col)];
        let mut c = col;
        while let Some(star_row) = self.col_star[c] {
            let Some(prime_col) = self.row_prime[star_row] else {
                break;
            };
            primes.push((star_row, prime_col));
            c = prime_col;
        }

        // Starring a prime evicts the star sharing its column, and the
        // evicted star's row is re-starred by the next prime on the path.
        for &(r, c) in &primes {
            self.row_star[r] = Some(c);
            self.col_star[c] = Some(r);
        }

        self.row_prime.fill(None);
        self.row_covered.fill(false);
    }

    fn reduce_uncovered(&mut self) {
        let mut min = f64::INFINITY;
        for r in (0..self.n_rows).filter(|&r| !self.row_covered[r]) {
            for c in (0..self.n_cols).filter(|&c| !self.col_covered[c]) {
                min = min.min(self.costs[(r, c)]);
            }
        }

        for r in 0..self.n_rows {
            for c in 0..self.n_cols {
                match (self.row_covered[r], self.col_covered[c]) {
                    (false, false) => self.costs[(r, c)] -= min,
                    (true, true) => self.costs[(r, c)] += min,
                    _ => {}
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
