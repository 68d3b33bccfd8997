use std::fs::File;
use std::path::Path;

use geo::{LineString, Polygon};
use geojson::{Feature, FeatureCollection, Geometry as GeoJsonGeometry};
use serde_json::{json, Map as JsonMap};

use crate::error::{Error, Result};
use crate::table::DataTable;

/// Write one axis-aligned grid polygon per table row to a GeoJSON file.
///
/// The table must carry numeric "left", "bottom", "right" and "top" columns;
/// `columns` names the attribute columns copied onto each feature. The
/// feature collection is tagged with `crs` as a named-CRS foreign member so
/// the coordinate system survives the file format.
pub fn write_grid_geojson(
    table: &DataTable,
    crs: &str,
    columns: &[String],
    path: &Path,
) -> Result<()> {
    for column in columns {
        if !table.has_column(column) {
            return Err(Error::MissingColumn(column.clone()));
        }
    }

    let left = table.numeric_column("left")?;
    let bottom = table.numeric_column("bottom")?;
    let right = table.numeric_column("right")?;
    let top = table.numeric_column("top")?;

    let mut features = Vec::with_capacity(table.len());
    for row in 0..table.len() {
        let polygon = grid_polygon(left[row], bottom[row], right[row], top[row]);

        let exterior: Vec<Vec<f64>> = polygon
            .exterior()
            .points()
            .map(|p| vec![p.x(), p.y()])
            .collect();
        let geometry = GeoJsonGeometry::new(geojson::Value::Polygon(vec![exterior]));

        let mut properties = JsonMap::new();
        for column in columns {
            let value = table.value(row, column).map(|v| v.to_json());
            properties.insert(column.clone(), value.unwrap_or(serde_json::Value::Null));
        }

        features.push(Feature {
            bbox: None,
            geometry: Some(geometry),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        });
    }

    let mut foreign_members = JsonMap::new();
    foreign_members.insert(
        "crs".to_string(),
        json!({ "type": "name", "properties": { "name": crs } }),
    );

    let feature_collection = FeatureCollection {
        bbox: None,
        features,
        foreign_members: Some(foreign_members),
    };

    println!(
        "Writing {} grid polygons to {}",
        table.len(),
        path.display()
    );
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &feature_collection)?;
    Ok(())
}

/// Rectangle from (left, bottom) to (right, top) as a closed exterior ring.
fn grid_polygon(left: f64, bottom: f64, right: f64, top: f64) -> Polygon<f64> {
    let exterior = LineString::new(vec![
        (left, bottom).into(),
        (right, bottom).into(),
        (right, top).into(),
        (left, top).into(),
        (left, bottom).into(), // Close the polygon
    ]);
    Polygon::new(exterior, vec![])
}
