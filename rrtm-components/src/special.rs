//! Special functions behind the power-law transit-time integrals.
//!
//! Everything here works on the integral
//!
//! $$ J_s(a, b) = \int_a^b u^{s-1} e^{-u} \, du, \qquad 0 < a < b \le \infty $$
//!
//! which is a difference of upper incomplete gamma functions
//! $\Gamma(s, a) - \Gamma(s, b)$. For the storage kinetics $s = 1 - \alpha$ is
//! below one and may be negative, so the usual regularised gamma routines
//! (which need $s > 0$) do not apply.

use rrtm_core::errors::{RRTMError, RRTMResult};

/// Arguments below this use the power series, above it the continued fraction
pub const SERIES_UPPER_LIMIT: f64 = 3.0;

/// Below this value of `|p ln(y/x)|` the power difference uses its logarithmic limit
const LOG_LIMIT_THRESHOLD: f64 = 1e-8;

const MAX_ITER: usize = 500;
const EPS: f64 = f64::EPSILON;
const FPMIN: f64 = f64::MIN_POSITIVE / EPS;

/// Compute $(y^p - x^p) / p$ for $0 < x \le y$.
///
/// Continuous in `p`: at `p = 0` this is $\ln(y / x)$. Evaluated as
/// $x^p \, \mathrm{expm1}(p L) / p$ with $L = \ln(y/x)$, switching to the
/// second-order expansion $x^p L (1 + pL/2)$ when $|pL|$ is tiny so that
/// exponents near a pole (e.g. $\alpha \approx 1$) lose no precision.
pub fn power_difference(x: f64, y: f64, p: f64) -> f64 {
    let log_ratio = (y / x).ln();
    let pl = p * log_ratio;
    let xp = x.powf(p);
    if pl.abs() < LOG_LIMIT_THRESHOLD {
        xp * log_ratio * (1.0 + pl / 2.0)
    } else {
        xp * pl.exp_m1() / p
    }
}

/// $J_s(a, b)$ for $b \le$ [`SERIES_UPPER_LIMIT`] by integrating the Taylor
/// series of $e^{-u}$ term by term:
///
/// $$ J_s(a, b) = \sum_{n \ge 0} \frac{(-1)^n}{n!} \frac{b^{s+n} - a^{s+n}}{s+n} $$
fn gamma_series(s: f64, a: f64, b: f64) -> RRTMResult<f64> {
    let mut sum = 0.0;
    let mut coefficient = 1.0;
    for n in 0..MAX_ITER {
        if n > 0 {
            coefficient *= -1.0 / n as f64;
        }
        let term = coefficient * power_difference(a, b, s + n as f64);
        sum += term;
        if term.abs() <= EPS * sum.abs() {
            return Ok(sum);
        }
    }
    Err(RRTMError::numeric_domain(
        "incomplete gamma series",
        "s",
        s,
        format!("did not converge on [{}, {}]", a, b),
    ))
}

/// $e^{c} \, \Gamma(s, x)$ by the modified Lentz continued fraction.
///
/// The factor $e^c$ is folded into the prefactor $e^{-x + s \ln x}$ so that
/// large shifts do not overflow. Requires $c \le x$.
fn upper_gamma_shifted(s: f64, x: f64, shift: f64) -> RRTMResult<f64> {
    let mut b = x + 1.0 - s;
    let mut c = 1.0 / FPMIN;
    let mut d = 1.0 / b;
    let mut h = d;

    for i in 1..MAX_ITER {
        let i = i as f64;
        let an = -i * (i - s);
        b += 2.0;
        d = an * d + b;
        if d.abs() < FPMIN {
            d = FPMIN;
        }
        c = b + an / c;
        if c.abs() < FPMIN {
            c = FPMIN;
        }
        d = 1.0 / d;
        let delta = d * c;
        h *= delta;
        if (delta - 1.0).abs() <= EPS {
            return Ok((shift - x + s * x.ln()).exp() * h);
        }
    }
    Err(RRTMError::numeric_domain(
        "incomplete gamma continued fraction",
        "x",
        x,
        format!("did not converge for s = {}", s),
    ))
}

/// Compute $e^{c} J_s(a, b)$ where `b` may be infinite.
///
/// `shift` ($c$) must not exceed `a`. Returns zero when `a >= b`.
pub fn shifted_gamma_integral(s: f64, a: f64, b: f64, shift: f64) -> RRTMResult<f64> {
    if a.is_nan() || a <= 0.0 || b.is_nan() {
        return Err(RRTMError::numeric_domain(
            "incomplete gamma integral",
            "a",
            a,
            "lower limit must be positive",
        ));
    }
    if shift > a {
        return Err(RRTMError::numeric_domain(
            "incomplete gamma integral",
            "shift",
            shift,
            "must not exceed the lower limit",
        ));
    }
    if a >= b {
        return Ok(0.0);
    }

    if b <= SERIES_UPPER_LIMIT {
        return Ok(shift.exp() * gamma_series(s, a, b)?);
    }

    let upper_tail = if b.is_finite() {
        upper_gamma_shifted(s, b, shift)?
    } else {
        0.0
    };
    if a < SERIES_UPPER_LIMIT {
        // shift <= a < 3 so exp(shift) is safe
        let head = shift.exp() * gamma_series(s, a, SERIES_UPPER_LIMIT)?;
        Ok(head + upper_gamma_shifted(s, SERIES_UPPER_LIMIT, shift)? - upper_tail)
    } else {
        Ok(upper_gamma_shifted(s, a, shift)? - upper_tail)
    }
}
