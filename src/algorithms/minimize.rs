//! Small dense minimizers used by the constrained edge fits.
//!
//! Each runs under a fixed iteration budget and reports whether it met its
//! own stopping criterion; the callers decide what residual is acceptable.

use nalgebra::{DMatrix, DVector};
use tracing::trace;

#[derive(Clone, Debug)]
pub struct Minimum {
    pub x: Vec<f64>,
    /// Objective at `x` (sum of squared residuals for least squares).
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
}

pub const LM_MAX_ITER: usize = 200;
pub const NM_MAX_ITER: usize = 2000;
pub const GOLDEN_MAX_ITER: usize = 200;

/// Levenberg–Marquardt on a residual vector with a forward-difference
/// Jacobian. Stops once the squared residual drops below `target` or the
/// step stalls.
pub fn levenberg_marquardt<F>(residuals: F, x0: &[f64], target: f64) -> Minimum
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    let n = x0.len();
    let mut x = DVector::from_column_slice(x0);
    let mut r = DVector::from_vec(residuals(x.as_slice()));
    let mut cost = r.norm_squared();
    let mut lambda = 1e-3;

    for it in 0..LM_MAX_ITER {
        if cost <= target {
            return Minimum { x: x.as_slice().to_vec(), value: cost, iterations: it, converged: true };
        }
        let jac = jacobian(&residuals, &x, &r);
        let jt = jac.transpose();
        let jtj = &jt * &jac;
        let grad = &jt * &r;

        let mut improved = false;
        while lambda < 1e12 {
            let mut lhs = jtj.clone();
            for i in 0..n {
                lhs[(i, i)] += lambda * jtj[(i, i)].max(1e-12);
            }
            let Some(step) = lhs.lu().solve(&(-&grad)) else {
                lambda *= 10.0;
                continue;
            };
            let candidate = &x + &step;
            let rc = DVector::from_vec(residuals(candidate.as_slice()));
            let c = rc.norm_squared();
            if c.is_finite() && c < cost {
                let stalled = step.norm() <= 1e-15 * (1.0 + x.norm());
                x = candidate;
                r = rc;
                cost = c;
                lambda = (lambda * 0.3).max(1e-12);
                improved = true;
                if stalled {
                    return Minimum { x: x.as_slice().to_vec(), value: cost, iterations: it + 1, converged: cost <= target };
                }
                break;
            }
            lambda *= 10.0;
        }
        trace!(iteration = it, cost, lambda, "levenberg-marquardt step");
        if !improved {
            return Minimum { x: x.as_slice().to_vec(), value: cost, iterations: it + 1, converged: cost <= target };
        }
    }
    Minimum { x: x.as_slice().to_vec(), value: cost, iterations: LM_MAX_ITER, converged: cost <= target }
}

fn jacobian<F>(residuals: &F, x: &DVector<f64>, r: &DVector<f64>) -> DMatrix<f64>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    let m = r.len();
    let n = x.len();
    let mut jac = DMatrix::zeros(m, n);
    let mut shifted = x.clone();
    for j in 0..n {
        let h = 1e-7 * (1.0 + x[j].abs());
        shifted[j] = x[j] + h;
        let rp = residuals(shifted.as_slice());
        for i in 0..m {
            jac[(i, j)] = (rp[i] - r[i]) / h;
        }
        shifted[j] = x[j];
    }
    jac
}

/// Nelder–Mead simplex search. Converged when the spread of objective values
/// across the simplex falls below `ftol`.
pub fn nelder_mead<F>(f: F, x0: &[f64], initial_step: f64, ftol: f64) -> Minimum
where
    F: Fn(&[f64]) -> f64,
{
    let n = x0.len();
    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(x0.to_vec());
    for i in 0..n {
        let mut v = x0.to_vec();
        v[i] += if v[i].abs() > 1e-8 { initial_step * v[i].abs().max(0.1) } else { initial_step };
        simplex.push(v);
    }
    let mut values: Vec<f64> = simplex.iter().map(|v| f(v)).collect();

    for it in 0..NM_MAX_ITER {
        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
        simplex = order.iter().map(|&i| simplex[i].clone()).collect();
        values = order.iter().map(|&i| values[i]).collect();

        if (values[n] - values[0]).abs() <= ftol {
            return Minimum { x: simplex[0].clone(), value: values[0], iterations: it, converged: true };
        }

        let centroid: Vec<f64> = (0..n)
            .map(|j| simplex[..n].iter().map(|v| v[j]).sum::<f64>() / n as f64)
            .collect();
        let towards = |coef: f64| -> Vec<f64> {
            (0..n).map(|j| centroid[j] + coef * (simplex[n][j] - centroid[j])).collect()
        };

        let reflected = towards(-1.0);
        let fr = f(&reflected);
        if fr < values[0] {
            let expanded = towards(-2.0);
            let fe = f(&expanded);
            if fe < fr {
                simplex[n] = expanded;
                values[n] = fe;
            } else {
                simplex[n] = reflected;
                values[n] = fr;
            }
        } else if fr < values[n - 1] {
            simplex[n] = reflected;
            values[n] = fr;
        } else {
            let contracted = if fr < values[n] { towards(-0.5) } else { towards(0.5) };
            let fc = f(&contracted);
            if fc < values[n].min(fr) {
                simplex[n] = contracted;
                values[n] = fc;
            } else {
                // Shrink towards the best vertex
                let best = simplex[0].clone();
                for i in 1..=n {
                    for j in 0..n {
                        simplex[i][j] = best[j] + 0.5 * (simplex[i][j] - best[j]);
                    }
                    values[i] = f(&simplex[i]);
                }
            }
        }
    }

    let (best, value) = simplex
        .iter()
        .zip(values.iter())
        .min_by(|a, b| a.1.total_cmp(b.1))
        .map(|(x, v)| (x.clone(), *v))
        .unwrap_or((x0.to_vec(), f64::INFINITY));
    Minimum { x: best, value, iterations: NM_MAX_ITER, converged: false }
}

/// Golden-section search for a minimum of a unimodal `f` on `[lo, hi]`.
pub fn golden_section<F>(f: F, lo: f64, hi: f64, xtol: f64) -> Minimum
where
    F: Fn(f64) -> f64,
{
    const INV_PHI: f64 = 0.618_033_988_749_894_8;
    let (mut a, mut b) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    let mut c = b - INV_PHI * (b - a);
    let mut d = a + INV_PHI * (b - a);
    let mut fc = f(c);
    let mut fd = f(d);

    for it in 0..GOLDEN_MAX_ITER {
        if (b - a).abs() <= xtol * (1.0 + c.abs().max(d.abs())) {
            let x = 0.5 * (a + b);
            return Minimum { x: vec![x], value: f(x), iterations: it, converged: true };
        }
        if fc < fd {
            b = d;
            d = c;
            fd = fc;
            c = b - INV_PHI * (b - a);
            fc = f(c);
        } else {
            a = c;
            c = d;
            fc = fd;
            d = a + INV_PHI * (b - a);
            fd = f(d);
        }
    }
    let x = 0.5 * (a + b);
    Minimum { x: vec![x], value: f(x), iterations: GOLDEN_MAX_ITER, converged: false }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lm_solves_circle_intersection() {
        // Point at distance 5 from origin and from (8, 0), upper half plane
        let res = levenberg_marquardt(
            |p| {
                let (x, y) = (p[0], p[1]);
                vec![(x * x + y * y).sqrt() - 5.0, ((x - 8.0).powi(2) + y * y).sqrt() - 5.0]
            },
            &[3.0, 2.0],
            1e-20,
        );
        assert!(res.converged, "{:?}", res);
        assert!((res.x[0] - 4.0).abs() < 1e-8);
        assert!((res.x[1] - 3.0).abs() < 1e-8);
    }

    #[test]
    fn nelder_mead_finds_rosenbrock_valley() {
        let res = nelder_mead(
            |p| (1.0 - p[0]).powi(2) + 100.0 * (p[1] - p[0] * p[0]).powi(2),
            &[-1.2, 1.0],
            0.1,
            1e-16,
        );
        assert!(res.converged);
        assert!((res.x[0] - 1.0).abs() < 1e-3, "{:?}", res.x);
        assert!((res.x[1] - 1.0).abs() < 1e-3, "{:?}", res.x);
    }

    #[test]
    fn golden_section_parabola() {
        let res = golden_section(|x| (x - 2.5).powi(2) + 1.0, 0.0, 10.0, 1e-10);
        assert!(res.converged);
        assert!((res.x[0] - 2.5).abs() < 1e-8);
        assert!((res.value - 1.0).abs() < 1e-12);
    }
}
