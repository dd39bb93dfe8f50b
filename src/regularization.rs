//! The regularization controller: a scalar `rho` with hysteresis carried in
//! a `rate` multiplier so repeated backward-pass restarts amplify growth
//! super-linearly.

use serde::{Deserialize, Serialize};

/// Which Hessian blocks absorb the regularization in the backward pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegularizationType {
    /// `Quu_reg = Quu + rho*I`, `Qux_reg = Qux`; checked for positive
    /// definiteness via Cholesky.
    Control,
    /// `Quu_reg = Quu + rho*B'B`, `Qux_reg = Qux + rho*B'A`; not checked.
    State,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegularizationController {
    pub rho: f64,
    pub rate: f64,
    pub rho_min: f64,
    pub rho_max: f64,
    pub factor: f64,
}

impl RegularizationController {
    pub fn new(rho_min: f64, rho_max: f64, factor: f64, factor_floor: f64) -> Self {
        Self {
            rho: 0.0,
            rate: factor_floor,
            rho_min,
            rho_max,
            factor,
        }
    }

    /// Grows `rho`. Returns `true` if the cap was exceeded (a terminal
    /// condition for the backward pass); `rho` is clamped to `rho_max`
    /// regardless so callers can keep using the controller's state.
    pub fn increase(&mut self) -> bool {
        self.rate = (self.rate * self.factor).max(self.factor);
        let candidate = (self.rho * self.rate).max(self.rho_min);
        if candidate > self.rho_max {
            self.rho = self.rho_max;
            true
        } else {
            self.rho = candidate;
            false
        }
    }

    /// Shrinks `rho`, snapping to zero once it falls below the floor.
    pub fn decrease(&mut self) {
        self.rate = (self.rate / self.factor).min(1.0 / self.factor);
        self.rho *= self.rate;
        if self.rho < self.rho_min {
            self.rho = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increase_amplifies_with_repeated_failures() {
        let mut ctrl = RegularizationController::new(1e-8, 1e8, 1.6, 1.0);
        ctrl.rho = 1e-4;
        let first_rho = {
            ctrl.increase();
            ctrl.rho
        };
        let second_rho = {
            ctrl.increase();
            ctrl.rho
        };
        // Hysteresis: the second jump is larger (relatively) than the first.
        assert!(second_rho / first_rho > first_rho / 1e-4);
    }

    #[test]
    fn increase_signals_cap_exceeded() {
        let mut ctrl = RegularizationController::new(1e-8, 1.0, 1.6, 1.0);
        ctrl.rho = 0.9;
        let mut exceeded = false;
        for _ in 0..50 {
            if ctrl.increase() {
                exceeded = true;
                break;
            }
        }
        assert!(exceeded);
        assert_eq!(ctrl.rho, 1.0);
    }

    #[test]
    fn decrease_snaps_to_zero_below_floor() {
        let mut ctrl = RegularizationController::new(1e-3, 1e8, 1.6, 1.0);
        ctrl.rho = 1e-4;
        ctrl.decrease();
        assert_eq!(ctrl.rho, 0.0);
    }
}
