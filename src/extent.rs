use proj::Proj;

use crate::error::{Error, Result};

/// Metric CRS used for the offset arithmetic; units are meters.
const WEB_MERCATOR: &str = "EPSG:3857";

/// Corner coordinates of grid cells, parallel to the input centroids.
#[derive(Debug, Clone, Default)]
pub struct GridExtent {
    pub top: Vec<f64>,
    pub left: Vec<f64>,
    pub bottom: Vec<f64>,
    pub right: Vec<f64>,
}

/// Compute the four corner coordinates of a fixed-size grid cell around each
/// centroid.
///
/// Each (x, y) pair is reprojected from `src_crs` into Web Mercator, where
/// half-width/half-height offsets in meters are applied, and the resulting
/// (left, top) and (right, bottom) corners are reprojected back to `src_crs`.
/// Meter arithmetic is only valid in a planar metric CRS, hence the round
/// trip.
///
/// `x` and `y` must have the same length; the output vectors preserve input
/// order. Discontinuities near the antimeridian or the poles are the
/// caller's problem.
pub fn create_extent_from_centroid(
    src_crs: &str,
    x: &[f64],
    y: &[f64],
    grid_width: u32,
    grid_height: u32,
    spatial_resolution: f64,
) -> Result<GridExtent> {
    if x.len() != y.len() {
        return Err(Error::LengthMismatch {
            x_len: x.len(),
            y_len: y.len(),
        });
    }

    let to_mercator = Proj::new_known_crs(src_crs, WEB_MERCATOR, None)?;
    let from_mercator = Proj::new_known_crs(WEB_MERCATOR, src_crs, None)?;

    let half_width = (grid_width as f64 / 2.0) * spatial_resolution;
    let half_height = (grid_height as f64 / 2.0) * spatial_resolution;

    let mut extent = GridExtent::default();
    for (&cx, &cy) in x.iter().zip(y) {
        let (mx, my) = to_mercator.convert((cx, cy))?;

        let top = my + half_height;
        let bottom = my - half_height;
        let left = mx - half_width;
        let right = mx + half_width;

        // The two corner pairs go back through the inverse transform
        // independently, matching how they are consumed downstream.
        let (left, top) = from_mercator.convert((left, top))?;
        let (right, bottom) = from_mercator.convert((right, bottom))?;

        extent.top.push(top);
        extent.left.push(left);
        extent.bottom.push(bottom);
        extent.right.push(right);
    }

    Ok(extent)
}
