//! The fixed 20-term degree-3 trivariate monomial basis shared by every
//! RPC numerator/denominator polynomial, and its partial derivatives.

/// Canonical `(i, j, k)` exponents of `Xn^i * Yn^j * Zn^k` for the 20 RPC
/// monomials, in the order every coefficient vector is laid out in.
pub const MONOMIAL_EXPONENTS: [(u32, u32, u32); 20] = [
    (0, 0, 0),
    (1, 0, 0),
    (0, 1, 0),
    (0, 0, 1),
    (1, 1, 0),
    (1, 0, 1),
    (0, 1, 1),
    (2, 0, 0),
    (0, 2, 0),
    (0, 0, 2),
    (1, 1, 1),
    (3, 0, 0),
    (1, 2, 0),
    (1, 0, 2),
    (2, 1, 0),
    (0, 3, 0),
    (0, 1, 2),
    (2, 0, 1),
    (0, 2, 1),
    (0, 0, 3),
];

/// Evaluate the 20 monomials at normalized coordinates `(xn, yn, zn)`.
pub fn monomials(xn: f64, yn: f64, zn: f64) -> [f64; 20] {
    let mut m = [0.0; 20];
    for (idx, &(i, j, k)) in MONOMIAL_EXPONENTS.iter().enumerate() {
        m[idx] = xn.powi(i as i32) * yn.powi(j as i32) * zn.powi(k as i32);
    }
    m
}

/// Partial derivative of each monomial with respect to `xn`.
pub fn monomials_dx(xn: f64, yn: f64, zn: f64) -> [f64; 20] {
    let mut m = [0.0; 20];
    for (idx, &(i, j, k)) in MONOMIAL_EXPONENTS.iter().enumerate() {
        m[idx] = if i == 0 {
            0.0
        } else {
            (i as f64) * xn.powi(i as i32 - 1) * yn.powi(j as i32) * zn.powi(k as i32)
        };
    }
    m
}

/// Partial derivative of each monomial with respect to `yn`.
pub fn monomials_dy(xn: f64, yn: f64, zn: f64) -> [f64; 20] {
    let mut m = [0.0; 20];
    for (idx, &(i, j, k)) in MONOMIAL_EXPONENTS.iter().enumerate() {
        m[idx] = if j == 0 {
            0.0
        } else {
            xn.powi(i as i32) * (j as f64) * yn.powi(j as i32 - 1) * zn.powi(k as i32)
        };
    }
    m
}

/// Dot product of a coefficient vector with an evaluated monomial vector.
pub fn dot20(coeffs: &[f64; 20], m: &[f64; 20]) -> f64 {
    coeffs.iter().zip(m.iter()).map(|(c, v)| c * v).sum()
}
