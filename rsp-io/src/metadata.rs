//! RPC model extraction from a GDAL dataset's `RPC` metadata domain.
//!
//! GDAL itself normalizes the dialect differences (DIMAP v1 XML, OSSIM
//! keyword list, EUCLIDIUM text) at the driver level; by the time a
//! dataset reaches here, its `RPC` metadata domain is always the same flat
//! `HashMap<String, String>` regardless of which dialect produced it. This
//! module only has to turn that map into an `rsp_core::RpcModel`.

use std::collections::HashMap;

use gdal::Dataset;
use rsp_core::sensor::{InverseCoefficients, Normalization};
use rsp_core::RpcModel;

use crate::error::{IoError, Result};

/// Read the `RPC` metadata domain off `dataset` and build an `RpcModel`.
///
/// GDAL's RPC domain only ever carries the ground-to-sensor (inverse)
/// direction — `direct_loc_h` on the resulting model falls back to Newton
/// iteration, which is the expected, common case for this collaborator.
///
/// `topleftconvention`, when true, shifts `SAMP_OFF`/`LINE_OFF` by `+0.5`
/// so pixel `(0, 0)` denotes the top-left corner rather than the pixel
/// center, matching the flag's meaning upstream.
pub fn extract_rpc_model(dataset: &Dataset, topleftconvention: bool) -> Result<RpcModel> {
    let domain = dataset.metadata_domain("RPC").ok_or(IoError::NoRpcMetadata)?;

    let mut col_offset = parse_single(&domain, "SAMP_OFF")?;
    let mut row_offset = parse_single(&domain, "LINE_OFF")?;
    if topleftconvention {
        col_offset += 0.5;
        row_offset += 0.5;
    }

    let normalization = Normalization {
        lon_offset: parse_single(&domain, "LONG_OFF")?,
        lon_scale: parse_single(&domain, "LONG_SCALE")?,
        lat_offset: parse_single(&domain, "LAT_OFF")?,
        lat_scale: parse_single(&domain, "LAT_SCALE")?,
        alt_offset: parse_single(&domain, "HEIGHT_OFF")?,
        alt_scale: parse_single(&domain, "HEIGHT_SCALE")?,
        col_offset,
        col_scale: parse_single(&domain, "SAMP_SCALE")?,
        row_offset,
        row_scale: parse_single(&domain, "LINE_SCALE")?,
    };

    let inverse = InverseCoefficients {
        num_col: parse_coeff_array(&domain, "SAMP_NUM_COEFF")?,
        den_col: parse_coeff_array(&domain, "SAMP_DEN_COEFF")?,
        num_row: parse_coeff_array(&domain, "LINE_NUM_COEFF")?,
        den_row: parse_coeff_array(&domain, "LINE_DEN_COEFF")?,
    };

    Ok(RpcModel::from_inverse(normalization, inverse)?)
}

fn parse_coeff_array(domain: &HashMap<String, String>, prefix: &str) -> Result<[f64; 20]> {
    let mut coeffs = [0.0; 20];
    for (i, slot) in coeffs.iter_mut().enumerate() {
        let key = format!("{prefix}_{}", i + 1);
        let value = domain.get(&key).ok_or_else(|| IoError::MissingRpcField(key.clone()))?;
        *slot = value
            .trim()
            .parse()
            .map_err(|_| IoError::InvalidRpcField(key, value.clone()))?;
    }
    Ok(coeffs)
}

fn parse_single(domain: &HashMap<String, String>, key: &str) -> Result<f64> {
    let value = domain
        .get(key)
        .ok_or_else(|| IoError::MissingRpcField(key.to_string()))?;
    value
        .trim()
        .parse()
        .map_err(|_| IoError::InvalidRpcField(key.to_string(), value.clone()))
}
