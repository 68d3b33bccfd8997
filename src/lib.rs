pub mod error;
pub mod extent;
pub mod grid;
pub mod scores;
pub mod table;

pub use error::{Error, Result};
pub use extent::{create_extent_from_centroid, GridExtent};
pub use grid::write_grid_geojson;
pub use scores::{add_classifier_scores, add_detector_scores};
pub use table::{DataTable, Value};
