use super::{Constraint, ConstraintSense};
use crate::error::ConstraintResult;
use crate::trajectory::Trajectory;
use nalgebra::{DMatrix, DVector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    State,
    Control,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Upper,
    Lower,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    idx: usize,
    value: f64,
    target: Target,
    side: Side,
}

/// Per-component lower/upper bounds on state and control:
/// `x_min <= x <= x_max`, `u_min <= u <= u_max`. Infinite bounds are
/// discarded at construction, so evaluation is linear in the number of
/// finite components, never in `n` or `m`.
///
/// Residual ordering is `[x_max_finite, x_min_finite, u_max_finite,
/// u_min_finite]`; `c <= 0` for every component, with sign `+1` on upper
/// bounds and `-1` on lower bounds.
#[derive(Debug, Clone)]
pub struct Bound {
    entries: Vec<Entry>,
}

impl Bound {
    pub fn new(x_max: &[f64], x_min: &[f64], u_max: &[f64], u_min: &[f64]) -> Self {
        let mut entries = Vec::new();
        for (idx, &v) in x_max.iter().enumerate() {
            if v.is_finite() {
                entries.push(Entry { idx, value: v, target: Target::State, side: Side::Upper });
            }
        }
        for (idx, &v) in x_min.iter().enumerate() {
            if v.is_finite() {
                entries.push(Entry { idx, value: v, target: Target::State, side: Side::Lower });
            }
        }
        for (idx, &v) in u_max.iter().enumerate() {
            if v.is_finite() {
                entries.push(Entry { idx, value: v, target: Target::Control, side: Side::Upper });
            }
        }
        for (idx, &v) in u_min.iter().enumerate() {
            if v.is_finite() {
                entries.push(Entry { idx, value: v, target: Target::Control, side: Side::Lower });
            }
        }
        Self { entries }
    }
}

impl Constraint for Bound {
    fn length(&self) -> usize {
        self.entries.len()
    }

    fn sense(&self) -> ConstraintSense {
        ConstraintSense::Inequality
    }

    fn label(&self) -> &'static str {
        "bound"
    }

    fn evaluate(&self, c_out: &mut DVector<f64>, traj: &Trajectory, k: usize) {
        for (row, e) in self.entries.iter().enumerate() {
            let v = match e.target {
                Target::State => traj.x[k][e.idx],
                Target::Control => traj.u[k][e.idx],
            };
            c_out[row] = match e.side {
                Side::Upper => v - e.value,
                Side::Lower => e.value - v,
            };
        }
    }

    fn jacobian(&self, cx_out: &mut DMatrix<f64>, cu_out: &mut DMatrix<f64>, _traj: &Trajectory, _k: usize) -> ConstraintResult<()> {
        cx_out.fill(0.0);
        cu_out.fill(0.0);
        for (row, e) in self.entries.iter().enumerate() {
            let sign = match e.side {
                Side::Upper => 1.0,
                Side::Lower => -1.0,
            };
            match e.target {
                Target::State => cx_out[(row, e.idx)] = sign,
                Target::Control => cu_out[(row, e.idx)] = sign,
            }
        }
        Ok(())
    }

    fn max_violation_info(&self, c: &DVector<f64>, _k: usize) -> (f64, String) {
        if c.is_empty() {
            return (0.0, self.label().to_string());
        }
        let (row, &worst) = c
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .expect("checked non-empty above");
        let e = &self.entries[row];
        let which = match e.target {
            Target::State => "x",
            Target::Control => "u",
        };
        let side = match e.side {
            Side::Upper => "max",
            Side::Lower => "min",
        };
        (worst, format!("bound[{}{}_{}]", which, e.idx, side))
    }

    fn const_jac(&self) -> bool {
        true
    }

    fn state_expansion(&self) -> bool {
        self.entries.iter().any(|e| e.target == Target::State)
    }

    fn control_expansion(&self) -> bool {
        self.entries.iter().any(|e| e.target == Target::Control)
    }

    fn coupled_expansion(&self) -> bool {
        false
    }

    fn direct(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infinite_bounds_are_dropped_and_ordering_is_preserved() {
        let bound = Bound::new(&[f64::INFINITY, 5.0], &[-5.0, f64::NEG_INFINITY], &[1.0], &[-1.0]);
        assert_eq!(bound.length(), 4);

        let mut traj = Trajectory::new(vec![0.0, 0.1], 2, 1);
        traj.x[0] = DVector::from_vec(vec![-6.0, 6.0]);
        traj.u[0] = DVector::from_vec(vec![2.0]);

        let mut c = DVector::zeros(4);
        bound.evaluate(&mut c, &traj, 0);
        // order: x_max_finite (x1<=5), x_min_finite (x0>=-5), u_max_finite (u0<=1), u_min_finite (u0>=-1)
        assert!((c[0] - 1.0).abs() < 1e-12); // 6 - 5
        assert!((c[1] - 1.0).abs() < 1e-12); // -5 - (-6)
        assert!((c[2] - 1.0).abs() < 1e-12); // 2 - 1
        assert!((c[3] - (-3.0)).abs() < 1e-12); // -1 - 2
    }

    #[test]
    fn all_infinite_bounds_are_a_no_op() {
        let bound = Bound::new(&[f64::INFINITY], &[f64::NEG_INFINITY], &[f64::INFINITY], &[f64::NEG_INFINITY]);
        assert_eq!(bound.length(), 0);
        let c = DVector::zeros(0);
        assert_eq!(bound.max_violation_info(&c, 0), (0.0, "bound".to_string()));
    }

    #[test]
    fn jacobian_sign_pattern_matches_bound_side() {
        let bound = Bound::new(&[f64::INFINITY, 5.0], &[-5.0, f64::NEG_INFINITY], &[1.0], &[-1.0]);
        let traj = Trajectory::new(vec![0.0, 0.1], 2, 1);
        let mut cx = DMatrix::zeros(4, 2);
        let mut cu = DMatrix::zeros(4, 1);
        bound.jacobian(&mut cx, &mut cu, &traj, 0).unwrap();
        assert_eq!(cx[(0, 1)], 1.0);
        assert_eq!(cx[(1, 0)], -1.0);
        assert_eq!(cu[(2, 0)], 1.0);
        assert_eq!(cu[(3, 0)], -1.0);
    }
}
