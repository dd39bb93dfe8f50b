//! Per-knot action-value expansion and the cost-to-go accumulator.

use nalgebra::{DMatrix, DVector};

/// `Qxx, Quu, Qux, Qx, Qu` at one knot, plus the regularized copies used to
/// solve for the gains. The unregularized fields are retained because the
/// cost-to-go update must use them, not the regularized ones.
#[derive(Debug, Clone)]
pub struct ActionValueExpansion {
    pub Qxx: DMatrix<f64>,
    pub Quu: DMatrix<f64>,
    pub Qux: DMatrix<f64>,
    pub Qx: DVector<f64>,
    pub Qu: DVector<f64>,
    pub Quu_reg: DMatrix<f64>,
    pub Qux_reg: DMatrix<f64>,
}

impl ActionValueExpansion {
    pub fn zeros(n: usize, m: usize) -> Self {
        Self {
            Qxx: DMatrix::zeros(n, n),
            Quu: DMatrix::zeros(m, m),
            Qux: DMatrix::zeros(m, n),
            Qx: DVector::zeros(n),
            Qu: DVector::zeros(m),
            Quu_reg: DMatrix::zeros(m, m),
            Qux_reg: DMatrix::zeros(m, n),
        }
    }
}

/// Quadratic cost-to-go `1/2 x'Px + p'x + c`, carried backward through the
/// Riccati recursion. `P` is explicitly symmetrized after every update
/// (invariant I5); `dv` splits the predicted reduction into its first- and
/// second-order contributions (`dv[0]` linear, `dv[1]` quadratic).
#[derive(Debug, Clone)]
pub struct CostToGo {
    pub P: DMatrix<f64>,
    pub p: DVector<f64>,
    pub dv: [f64; 2],
}

impl CostToGo {
    pub fn zeros(n: usize) -> Self {
        Self {
            P: DMatrix::zeros(n, n),
            p: DVector::zeros(n),
            dv: [0.0, 0.0],
        }
    }

    pub fn reset_from_terminal(&mut self, q_terminal: &DMatrix<f64>, q_terminal_vec: &DVector<f64>) {
        self.P.copy_from(q_terminal);
        self.p.copy_from(q_terminal_vec);
        self.dv = [0.0, 0.0];
    }

    /// Enforces invariant I5: `P <- 1/2 (P + P')`.
    pub fn symmetrize(&mut self) {
        let n = self.P.nrows();
        for i in 0..n {
            for j in (i + 1)..n {
                let avg = 0.5 * (self.P[(i, j)] + self.P[(j, i)]);
                self.P[(i, j)] = avg;
                self.P[(j, i)] = avg;
            }
        }
    }
}
