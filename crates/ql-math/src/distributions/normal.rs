//! Gaussian helpers used by the random-number layer.

use ql_core::Real;

/// Inverse cumulative normal with configurable mean and standard deviation.
///
/// Maps a uniform deviate in `(0, 1)` to a Gaussian deviate.  Uses Peter J.
/// Acklam's rational approximation (absolute error below 1.15e-9), which
/// is plenty for Monte Carlo sampling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InverseCumulativeNormal {
    average: Real,
    sigma: Real,
}

impl Default for InverseCumulativeNormal {
    fn default() -> Self {
        Self::standard()
    }
}

impl InverseCumulativeNormal {
    /// Create the inverse of `N(average, sigma²)`.
    pub fn new(average: Real, sigma: Real) -> Self {
        Self { average, sigma }
    }

    /// Inverse of the standard normal distribution.
    pub fn standard() -> Self {
        Self::new(0.0, 1.0)
    }

    /// Evaluate at `p`.
    ///
    /// `p` is expected in the open interval `(0, 1)`; the end points map to
    /// `∓∞`, matching the limit of the distribution.
    pub fn value(&self, p: Real) -> Real {
        if p <= 0.0 {
            return Real::NEG_INFINITY;
        }
        if p >= 1.0 {
            return Real::INFINITY;
        }
        self.average + self.sigma * standard_value(p)
    }
}

const A: [Real; 6] = [
    -3.969_683_028_665_376e+01,
    2.209_460_984_245_205e+02,
    -2.759_285_104_469_687e+02,
    1.383_577_518_672_69e2,
    -3.066_479_806_614_716e+01,
    2.506_628_277_459_239e+00,
];
const B: [Real; 5] = [
    -5.447_609_879_822_406e+01,
    1.615_858_368_580_409e+02,
    -1.556_989_798_598_866e+02,
    6.680_131_188_771_972e+01,
    -1.328_068_155_288_572e+01,
];
const C: [Real; 6] = [
    -7.784_894_002_430_293e-03,
    -3.223_964_580_411_365e-01,
    -2.400_758_277_161_838e+00,
    -2.549_732_539_343_734e+00,
    4.374_664_141_464_968e+00,
    2.938_163_982_698_783e+00,
];
const D: [Real; 4] = [
    7.784_695_709_041_462e-03,
    3.224_671_290_700_398e-01,
    2.445_134_137_142_996e+00,
    3.754_408_661_907_416e+00,
];

const P_LOW: Real = 0.02425;
const P_HIGH: Real = 1.0 - P_LOW;

fn tail(q: Real) -> Real {
    (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
        / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
}

fn standard_value(p: Real) -> Real {
    if p < P_LOW {
        tail((-2.0 * p.ln()).sqrt())
    } else if p <= P_HIGH {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -tail((-2.0 * (1.0 - p).ln()).sqrt())
    }
}
