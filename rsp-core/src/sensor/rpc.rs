//! The Rational Polynomial Camera model: ground<->sensor projection via
//! two pairs of 20-term cubic rational polynomials, with a Newton
//! fallback when only the inverse (ground-to-sensor) direction is known.

use crate::error::{ProjectionError, Result, RspError};
use crate::monomial::{dot20, monomials, monomials_dx, monomials_dy};

/// Near-zero denominator threshold; below this the evaluation is flagged
/// as extrapolated/near-singular but still carried through (never fails).
const DEN_EPSILON: f64 = 1e-10;

/// Desired Newton convergence precision, in sensor pixels.
const NEWTON_EPS: f64 = 1e-6;

/// The seven `(offset, scale)` normalization pairs shared by every RPC
/// direction.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Normalization {
    pub lon_offset: f64,
    pub lon_scale: f64,
    pub lat_offset: f64,
    pub lat_scale: f64,
    pub alt_offset: f64,
    pub alt_scale: f64,
    pub col_offset: f64,
    pub col_scale: f64,
    pub row_offset: f64,
    pub row_scale: f64,
}

impl Normalization {
    fn validate(&self) -> Result<()> {
        let scales = [
            self.lon_scale,
            self.lat_scale,
            self.alt_scale,
            self.col_scale,
            self.row_scale,
        ];
        if scales.iter().any(|s| *s <= 0.0) {
            return Err(RspError::InvalidInput(
                "RPC normalization scales must be strictly positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Ground-to-sensor (inverse) coefficient vectors. Always present: every
/// `RpcModel` can project ground points to sensor coordinates.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct InverseCoefficients {
    pub num_col: [f64; 20],
    pub den_col: [f64; 20],
    pub num_row: [f64; 20],
    pub den_row: [f64; 20],
}

/// Sensor-to-ground (forward) coefficient vectors. Optional: when absent,
/// forward projection falls back to Newton iteration over the inverse
/// direction.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ForwardCoefficients {
    pub num_lon: [f64; 20],
    pub den_lon: [f64; 20],
    pub num_lat: [f64; 20],
    pub den_lat: [f64; 20],
}

/// Which coefficient directions an RPC model was built with. Inverse
/// coefficients are mandatory; forward coefficients are an optional
/// addition, replacing the nullable-field representation of the source
/// format with a tagged variant.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Coefficients {
    InverseOnly(InverseCoefficients),
    Bidirectional {
        inverse: InverseCoefficients,
        forward: ForwardCoefficients,
    },
}

/// The partial derivatives of the inverse projection, in unnormalized
/// (pixel per ground-unit) terms, batched.
#[derive(Debug, Clone, PartialEq)]
pub struct Jacobian {
    pub dc_dx: Vec<f64>,
    pub dc_dy: Vec<f64>,
    pub dl_dx: Vec<f64>,
    pub dl_dy: Vec<f64>,
}

/// A Rational Polynomial Camera model. Immutable after construction.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RpcModel {
    normalization: Normalization,
    coefficients: Coefficients,
    lim_extrapol: f64,
}

impl RpcModel {
    /// Build a model with only the inverse (ground-to-sensor) direction.
    /// `direct_loc_h` will fall back to Newton iteration.
    pub fn from_inverse(normalization: Normalization, inverse: InverseCoefficients) -> Result<Self> {
        normalization.validate()?;
        Ok(Self {
            normalization,
            coefficients: Coefficients::InverseOnly(inverse),
            lim_extrapol: 1.0001,
        })
    }

    /// Build a model with both directions available.
    pub fn from_bidirectional(
        normalization: Normalization,
        inverse: InverseCoefficients,
        forward: ForwardCoefficients,
    ) -> Result<Self> {
        normalization.validate()?;
        Ok(Self {
            normalization,
            coefficients: Coefficients::Bidirectional { inverse, forward },
            lim_extrapol: 1.0001,
        })
    }

    /// Override the default extrapolation sentinel (`1.0001`).
    pub fn with_lim_extrapol(mut self, lim_extrapol: f64) -> Self {
        self.lim_extrapol = lim_extrapol;
        self
    }

    pub fn has_forward(&self) -> bool {
        matches!(self.coefficients, Coefficients::Bidirectional { .. })
    }

    pub fn normalization(&self) -> &Normalization {
        &self.normalization
    }

    pub fn lon_offset(&self) -> f64 {
        self.normalization.lon_offset
    }

    pub fn lat_offset(&self) -> f64 {
        self.normalization.lat_offset
    }

    fn inverse_coeffs(&self) -> &InverseCoefficients {
        match &self.coefficients {
            Coefficients::InverseOnly(inv) => inv,
            Coefficients::Bidirectional { inverse, .. } => inverse,
        }
    }

    pub fn forward_coeffs(&self) -> Option<&ForwardCoefficients> {
        match &self.coefficients {
            Coefficients::InverseOnly(_) => None,
            Coefficients::Bidirectional { forward, .. } => Some(forward),
        }
    }

    /// Direct (forward) localization at constant altitude: sensor
    /// `(row, col)` -> ground `(lon, lat)`.
    pub fn direct_loc_h(&self, row: &[f64], col: &[f64], alt: f64) -> Result<(Vec<f64>, Vec<f64>)> {
        if row.len() != col.len() {
            return Err(ProjectionError::DimensionMismatch(row.len(), col.len()).into());
        }
        match self.forward_coeffs() {
            Some(forward) => Ok(self.direct_loc_analytic(forward, row, col, alt)),
            None => {
                let (lon, lat, _nonconvergent) = self.inverse_via_newton(row, col, alt, true, 10)?;
                Ok((lon, lat))
            }
        }
    }

    fn direct_loc_analytic(
        &self,
        forward: &ForwardCoefficients,
        row: &[f64],
        col: &[f64],
        alt: f64,
    ) -> (Vec<f64>, Vec<f64>) {
        let n = self.normalization;
        let zn = (alt - n.alt_offset) / n.alt_scale;

        let xn: Vec<f64> = col.iter().map(|c| (c - n.col_offset) / n.col_scale).collect();
        let yn: Vec<f64> = row.iter().map(|r| (r - n.row_offset) / n.row_scale).collect();

        if !xn.is_empty() && xn.iter().all(|v| v.abs() > self.lim_extrapol) {
            tracing::warn!(?xn, "direct_loc_h: evaluation extrapolated in column");
        }
        if !yn.is_empty() && yn.iter().all(|v| v.abs() > self.lim_extrapol) {
            tracing::warn!(?yn, "direct_loc_h: evaluation extrapolated in row");
        }

        let mut lon = Vec::with_capacity(row.len());
        let mut lat = Vec::with_capacity(row.len());
        for i in 0..row.len() {
            let m = monomials(xn[i], yn[i], zn);
            let den_x = dot20(&forward.den_lon, &m);
            let den_y = dot20(&forward.den_lat, &m);
            if den_x.abs() < DEN_EPSILON || den_y.abs() < DEN_EPSILON {
                tracing::warn!("direct_loc_h: near-singular denominator");
            }
            let num_x = dot20(&forward.num_lon, &m);
            let num_y = dot20(&forward.num_lat, &m);
            lon.push(num_x / den_x * n.lon_scale + n.lon_offset);
            lat.push(num_y / den_y * n.lat_scale + n.lat_offset);
        }
        (lon, lat)
    }

    /// Inverse localization: ground `(lon, lat)` at constant altitude ->
    /// sensor `(row, col)`.
    pub fn inverse_loc(&self, lon: &[f64], lat: &[f64], alt: f64) -> Result<(Vec<f64>, Vec<f64>)> {
        if lon.len() != lat.len() {
            return Err(ProjectionError::DimensionMismatch(lon.len(), lat.len()).into());
        }
        Ok(self.inverse_loc_raw(lon, lat, alt))
    }

    /// Core inverse evaluation. Inverse coefficients always exist, so this
    /// never fails; callers needing validated lengths use `inverse_loc`.
    fn inverse_loc_raw(&self, lon: &[f64], lat: &[f64], alt: f64) -> (Vec<f64>, Vec<f64>) {
        let inv = self.inverse_coeffs();
        let n = &self.normalization;
        let zn = (alt - n.alt_offset) / n.alt_scale;

        let xn: Vec<f64> = lon.iter().map(|v| (v - n.lon_offset) / n.lon_scale).collect();
        let yn: Vec<f64> = lat.iter().map(|v| (v - n.lat_offset) / n.lat_scale).collect();

        if !xn.is_empty() && xn.iter().all(|v| v.abs() > self.lim_extrapol) {
            tracing::warn!(?xn, "inverse_loc: evaluation extrapolated in longitude");
        }
        if !yn.is_empty() && yn.iter().all(|v| v.abs() > self.lim_extrapol) {
            tracing::warn!(?yn, "inverse_loc: evaluation extrapolated in latitude");
        }

        let mut row = Vec::with_capacity(lon.len());
        let mut col = Vec::with_capacity(lon.len());
        for i in 0..lon.len() {
            let m = monomials(xn[i], yn[i], zn);
            let den_col = dot20(&inv.den_col, &m);
            let den_row = dot20(&inv.den_row, &m);
            if den_col.abs() < DEN_EPSILON || den_row.abs() < DEN_EPSILON {
                tracing::warn!("inverse_loc: near-singular denominator");
            }
            let num_col = dot20(&inv.num_col, &m);
            let num_row = dot20(&inv.num_row, &m);
            col.push(num_col / den_col * n.col_scale + n.col_offset);
            row.push(num_row / den_row * n.row_scale + n.row_offset);
        }
        (row, col)
    }

    /// Analytical Jacobian of the inverse projection at ground points
    /// `(lon, lat, alt)`, in unnormalized units.
    pub fn partials(&self, lon: &[f64], lat: &[f64], alt: f64) -> Result<Jacobian> {
        if lon.len() != lat.len() {
            return Err(ProjectionError::DimensionMismatch(lon.len(), lat.len()).into());
        }
        Ok(self.partials_raw(lon, lat, alt))
    }

    fn partials_raw(&self, lon: &[f64], lat: &[f64], alt: f64) -> Jacobian {
        let inv = self.inverse_coeffs();
        let n = &self.normalization;
        let zn = (alt - n.alt_offset) / n.alt_scale;

        let mut dc_dx = Vec::with_capacity(lon.len());
        let mut dc_dy = Vec::with_capacity(lon.len());
        let mut dl_dx = Vec::with_capacity(lon.len());
        let mut dl_dy = Vec::with_capacity(lon.len());

        for i in 0..lon.len() {
            let xn = (lon[i] - n.lon_offset) / n.lon_scale;
            let yn = (lat[i] - n.lat_offset) / n.lat_scale;
            let m = monomials(xn, yn, zn);
            let mx = monomials_dx(xn, yn, zn);
            let my = monomials_dy(xn, yn, zn);

            let num_dc = dot20(&inv.num_col, &m);
            let den_dc = dot20(&inv.den_col, &m);
            let num_dl = dot20(&inv.num_row, &m);
            let den_dl = dot20(&inv.den_row, &m);

            let num_dc_dx = dot20(&inv.num_col, &mx);
            let den_dc_dx = dot20(&inv.den_col, &mx);
            let num_dl_dx = dot20(&inv.num_row, &mx);
            let den_dl_dx = dot20(&inv.den_row, &mx);

            let num_dc_dy = dot20(&inv.num_col, &my);
            let den_dc_dy = dot20(&inv.den_col, &my);
            let num_dl_dy = dot20(&inv.num_row, &my);
            let den_dl_dy = dot20(&inv.den_row, &my);

            // quotient rule: (u/v)' = (u'v - v'u) / v^2, then chain rule by scale ratio.
            dc_dx.push(n.col_scale / n.lon_scale * (num_dc_dx * den_dc - den_dc_dx * num_dc) / den_dc.powi(2));
            dc_dy.push(n.col_scale / n.lat_scale * (num_dc_dy * den_dc - den_dc_dy * num_dc) / den_dc.powi(2));
            dl_dx.push(n.row_scale / n.lon_scale * (num_dl_dx * den_dl - den_dl_dx * num_dl) / den_dl.powi(2));
            dl_dy.push(n.row_scale / n.lat_scale * (num_dl_dy * den_dl - den_dl_dy * num_dl) / den_dl.powi(2));
        }

        Jacobian {
            dc_dx,
            dc_dy,
            dl_dx,
            dl_dy,
        }
    }

    /// Iterative (Newton) inversion of the forward projection, used when
    /// no forward coefficients are available: sensor `(row, col)` ->
    /// ground `(lon, lat)`. Returns the count of elements that failed to
    /// converge within `nb_iter_max` iterations (non-fatal; best-effort
    /// values are still written for those elements).
    pub fn inverse_via_newton(
        &self,
        row: &[f64],
        col: &[f64],
        alt: f64,
        fill_nan: bool,
        nb_iter_max: usize,
    ) -> Result<(Vec<f64>, Vec<f64>, usize)> {
        if row.len() != col.len() {
            return Err(ProjectionError::DimensionMismatch(row.len(), col.len()).into());
        }
        let n = &self.normalization;

        let (lon_nan_value, lat_nan_value) = if fill_nan {
            (n.lon_offset, n.lat_offset)
        } else {
            (f64::NAN, f64::NAN)
        };
        let mut lon_out = vec![lon_nan_value; row.len()];
        let mut lat_out = vec![lat_nan_value; row.len()];

        let valid: Vec<usize> = (0..row.len())
            .filter(|&i| !row[i].is_nan() && !col[i].is_nan())
            .collect();
        if valid.is_empty() {
            return Ok((lon_out, lat_out, 0));
        }

        let row_v: Vec<f64> = valid.iter().map(|&i| row[i]).collect();
        let col_v: Vec<f64> = valid.iter().map(|&i| col[i]).collect();

        // Seed every point at the normalization origin.
        let (l0, c0) = self.inverse_loc_raw(&[n.lon_offset], &[n.lat_offset], alt);
        let mut x = vec![n.lon_offset; valid.len()];
        let mut y = vec![n.lat_offset; valid.len()];
        let mut dc: Vec<f64> = col_v.iter().map(|c| c - c0[0]).collect();
        let mut dl: Vec<f64> = row_v.iter().map(|r| r - l0[0]).collect();

        let mut work: Vec<usize> = (0..valid.len())
            .filter(|&k| dc[k].abs() > NEWTON_EPS || dl[k].abs() > NEWTON_EPS)
            .collect();
        let mut iteration = 0;
        while !work.is_empty() && iteration < nb_iter_max {
            let x_sub: Vec<f64> = work.iter().map(|&k| x[k]).collect();
            let y_sub: Vec<f64> = work.iter().map(|&k| y[k]).collect();
            let jac = self.partials_raw(&x_sub, &y_sub, alt);

            let l_sub: Vec<f64> = work.iter().map(|&k| dl[k]).collect();
            let c_sub: Vec<f64> = work.iter().map(|&k| dc[k]).collect();

            let mut x_new = Vec::with_capacity(work.len());
            let mut y_new = Vec::with_capacity(work.len());
            for j in 0..work.len() {
                let det = jac.dc_dx[j] * jac.dl_dy[j] - jac.dl_dx[j] * jac.dc_dy[j];
                let dx = (jac.dl_dy[j] * c_sub[j] - jac.dc_dy[j] * l_sub[j]) / det;
                let dy = (-jac.dl_dx[j] * c_sub[j] + jac.dc_dx[j] * l_sub[j]) / det;
                x_new.push(x_sub[j] + dx);
                y_new.push(y_sub[j] + dy);
            }
            for (j, &k) in work.iter().enumerate() {
                x[k] = x_new[j];
                y[k] = y_new[j];
            }

            let (l, c) = self.inverse_loc_raw(&x_new, &y_new, alt);
            for (j, &k) in work.iter().enumerate() {
                dc[k] = col_v[k] - c[j];
                dl[k] = row_v[k] - l[j];
            }

            iteration += 1;
            work = (0..valid.len())
                .filter(|&k| dc[k].abs() > NEWTON_EPS || dl[k].abs() > NEWTON_EPS)
                .collect();
        }

        let nonconvergent = work.len();
        if nonconvergent > 0 {
            tracing::warn!(
                nonconvergent,
                nb_iter_max,
                "inverse_via_newton: some points did not converge, returning best effort"
            );
        }

        for (k, &i) in valid.iter().enumerate() {
            lon_out[i] = x[k];
            lat_out[i] = y[k];
        }
        Ok((lon_out, lat_out, nonconvergent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn identity_normalization() -> Normalization {
        Normalization {
            lon_offset: 0.0,
            lon_scale: 1.0,
            lat_offset: 0.0,
            lat_scale: 1.0,
            alt_offset: 0.0,
            alt_scale: 1.0,
            col_offset: 0.0,
            col_scale: 1.0,
            row_offset: 0.0,
            row_scale: 1.0,
        }
    }

    /// A constant-coefficient RPC: col == lon, row == lat exactly, under
    /// identity normalization (term index 1 is the pure-X monomial, index
    /// 2 the pure-Y monomial; see `MONOMIAL_EXPONENTS`).
    fn identity_inverse() -> InverseCoefficients {
        let mut num_col = [0.0; 20];
        num_col[1] = 1.0;
        let mut den_col = [0.0; 20];
        den_col[0] = 1.0;
        let mut num_row = [0.0; 20];
        num_row[2] = 1.0;
        let mut den_row = [0.0; 20];
        den_row[0] = 1.0;
        InverseCoefficients {
            num_col,
            den_col,
            num_row,
            den_row,
        }
    }

    fn identity_forward() -> ForwardCoefficients {
        let mut num_lon = [0.0; 20];
        num_lon[1] = 1.0;
        let mut den_lon = [0.0; 20];
        den_lon[0] = 1.0;
        let mut num_lat = [0.0; 20];
        num_lat[2] = 1.0;
        let mut den_lat = [0.0; 20];
        den_lat[0] = 1.0;
        ForwardCoefficients {
            num_lon,
            den_lon,
            num_lat,
            den_lat,
        }
    }

    #[test]
    fn rejects_non_positive_scale() {
        let mut n = identity_normalization();
        n.lon_scale = 0.0;
        let err = RpcModel::from_inverse(n, identity_inverse());
        assert!(err.is_err());
    }

    #[test]
    fn inverse_loc_identity() {
        let rpc = RpcModel::from_inverse(identity_normalization(), identity_inverse()).unwrap();
        let (row, col) = rpc.inverse_loc(&[0.3], &[0.5], 0.0).unwrap();
        assert_relative_eq!(col[0], 0.3, epsilon = 1e-9);
        assert_relative_eq!(row[0], 0.5, epsilon = 1e-9);
    }

    #[test]
    fn direct_loc_h_analytic_roundtrip() {
        let rpc = RpcModel::from_bidirectional(identity_normalization(), identity_inverse(), identity_forward())
            .unwrap();
        let row = vec![0.2, -0.5, 0.0];
        let col = vec![0.4, 0.1, -0.3];
        let (lon, lat) = rpc.direct_loc_h(&row, &col, 0.0).unwrap();
        let (row2, col2) = rpc.inverse_loc(&lon, &lat, 0.0).unwrap();
        for i in 0..row.len() {
            assert_relative_eq!(row2[i], row[i], epsilon = 1e-3);
            assert_relative_eq!(col2[i], col[i], epsilon = 1e-3);
        }
    }

    #[test]
    fn newton_fallback_matches_analytic() {
        let bidir = RpcModel::from_bidirectional(identity_normalization(), identity_inverse(), identity_forward())
            .unwrap();
        let inv_only = RpcModel::from_inverse(identity_normalization(), identity_inverse()).unwrap();
        assert!(!inv_only.has_forward());

        let row = vec![0.25, -0.1];
        let col = vec![0.1, 0.4];
        let (lon_a, lat_a) = bidir.direct_loc_h(&row, &col, 0.0).unwrap();
        let (lon_b, lat_b) = inv_only.direct_loc_h(&row, &col, 0.0).unwrap();
        for i in 0..row.len() {
            assert_relative_eq!(lon_a[i], lon_b[i], epsilon = 1e-3);
            assert_relative_eq!(lat_a[i], lat_b[i], epsilon = 1e-3);
        }
    }

    #[test]
    fn newton_nan_input_fill_nan_true() {
        let rpc = RpcModel::from_inverse(identity_normalization(), identity_inverse()).unwrap();
        let row = vec![f64::NAN, 0.1];
        let col = vec![0.2, 0.3];
        let (lon, lat, _nonconvergent) = rpc.inverse_via_newton(&row, &col, 0.0, true, 10).unwrap();
        assert_eq!(lon[0], rpc.lon_offset());
        assert_eq!(lat[0], rpc.lat_offset());
        assert_relative_eq!(lon[1], 0.3, epsilon = 1e-3);
        assert_relative_eq!(lat[1], 0.1, epsilon = 1e-3);
    }

    #[test]
    fn newton_nan_input_fill_nan_false_yields_nan() {
        let rpc = RpcModel::from_inverse(identity_normalization(), identity_inverse()).unwrap();
        let row = vec![f64::NAN];
        let col = vec![0.2];
        let (lon, lat, _) = rpc.inverse_via_newton(&row, &col, 0.0, false, 10).unwrap();
        assert!(lon[0].is_nan());
        assert!(lat[0].is_nan());
    }

    #[test]
    fn dimension_mismatch_is_an_error() {
        let rpc = RpcModel::from_inverse(identity_normalization(), identity_inverse()).unwrap();
        let err = rpc.inverse_loc(&[0.0, 1.0], &[0.0], 0.0);
        assert!(err.is_err());
    }
}
