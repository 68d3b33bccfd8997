use clap::{Arg, ArgMatches, Command};
use std::path::{Path, PathBuf};

use grid_mapper::{
    add_classifier_scores, add_detector_scores, create_extent_from_centroid, write_grid_geojson,
    DataTable,
};

fn main() {
    let matches = Command::new("Grid Mapper")
        .version("1.0")
        .about("Grid cell and confidence score utilities for image-based mapping workflows")
        .subcommand_required(true)
        .subcommand(
            Command::new("extent")
                .about("Compute grid cell corners around centroid coordinates")
                .arg(table_arg())
                .arg(output_arg())
                .arg(
                    Arg::new("crs")
                        .long("crs")
                        .num_args(1)
                        .default_value("EPSG:4326")
                        .help("CRS of the centroid coordinates"),
                )
                .arg(
                    Arg::new("x-col")
                        .long("x-col")
                        .num_args(1)
                        .default_value("lon")
                        .help("Column holding x (longitude) coordinates"),
                )
                .arg(
                    Arg::new("y-col")
                        .long("y-col")
                        .num_args(1)
                        .default_value("lat")
                        .help("Column holding y (latitude) coordinates"),
                )
                .arg(
                    Arg::new("width")
                        .long("width")
                        .num_args(1)
                        .default_value("512")
                        .help("Grid width in pixels"),
                )
                .arg(
                    Arg::new("height")
                        .long("height")
                        .num_args(1)
                        .default_value("512")
                        .help("Grid height in pixels"),
                )
                .arg(
                    Arg::new("resolution")
                        .long("resolution")
                        .num_args(1)
                        .default_value("0.6")
                        .help("Spatial resolution in meters per pixel"),
                )
                .arg(
                    Arg::new("geojson")
                        .long("geojson")
                        .num_args(1)
                        .help("Also write the grid polygons to this GeoJSON file"),
                )
                .arg(
                    Arg::new("columns")
                        .long("columns")
                        .num_args(1..)
                        .help("Attribute columns to keep in the GeoJSON output"),
                ),
        )
        .subcommand(
            Command::new("merge-detector")
                .about("Merge YOLO-style detector confidences into a table")
                .arg(table_arg())
                .arg(output_arg())
                .arg(predictions_arg())
                .arg(score_column_arg("conf_yolov5"))
                .arg(id_column_arg()),
        )
        .subcommand(
            Command::new("merge-classifier")
                .about("Merge classifier class probabilities into a table")
                .arg(table_arg())
                .arg(output_arg())
                .arg(predictions_arg())
                .arg(score_column_arg("conf_efficientnet"))
                .arg(id_column_arg())
                .arg(
                    Arg::new("class-index")
                        .long("class-index")
                        .num_args(1)
                        .default_value("1")
                        .help("Positional index of the class probability to keep"),
                ),
        )
        .get_matches();

    let result = match matches.subcommand() {
        Some(("extent", sub)) => run_extent(sub),
        Some(("merge-detector", sub)) => run_merge_detector(sub),
        Some(("merge-classifier", sub)) => run_merge_classifier(sub),
        _ => unreachable!("subcommand is required"),
    };

    match result {
        Ok(_) => println!("Processing completed successfully"),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn table_arg() -> Arg {
    Arg::new("table")
        .short('t')
        .long("table")
        .num_args(1)
        .required(true)
        .help("Input table as a JSON array of records")
}

fn output_arg() -> Arg {
    Arg::new("output")
        .short('o')
        .long("output")
        .num_args(1)
        .required(true)
        .help("Path for the output table")
}

fn predictions_arg() -> Arg {
    Arg::new("predictions")
        .short('p')
        .long("predictions")
        .num_args(1)
        .required(true)
        .help("Directory of per-image prediction text files")
}

fn score_column_arg(default: &'static str) -> Arg {
    Arg::new("column")
        .long("column")
        .num_args(1)
        .default_value(default)
        .help("Column name for the merged confidence scores")
}

fn id_column_arg() -> Arg {
    Arg::new("id-column")
        .long("id-column")
        .num_args(1)
        .default_value("image_id")
        .help("Column holding image identifiers")
}

fn load_table(matches: &ArgMatches) -> grid_mapper::Result<DataTable> {
    let path = PathBuf::from(matches.get_one::<String>("table").unwrap());
    if !path.exists() {
        eprintln!("Error: File not found: {}", path.display());
        std::process::exit(1);
    }
    DataTable::from_json_records(&path)
}

fn run_extent(matches: &ArgMatches) -> grid_mapper::Result<()> {
    let crs = matches.get_one::<String>("crs").unwrap();
    let width = matches
        .get_one::<String>("width")
        .unwrap()
        .parse::<u32>()
        .expect("Invalid grid width");
    let height = matches
        .get_one::<String>("height")
        .unwrap()
        .parse::<u32>()
        .expect("Invalid grid height");
    let resolution = matches
        .get_one::<String>("resolution")
        .unwrap()
        .parse::<f64>()
        .expect("Invalid spatial resolution");

    let mut table = load_table(matches)?;
    let x = table.numeric_column(matches.get_one::<String>("x-col").unwrap())?;
    let y = table.numeric_column(matches.get_one::<String>("y-col").unwrap())?;

    println!("Computing {}x{} px extents for {} centroids", width, height, x.len());
    let extent = create_extent_from_centroid(crs, &x, &y, width, height, resolution)?;
    table.append_numeric_column("top", &extent.top);
    table.append_numeric_column("left", &extent.left);
    table.append_numeric_column("bottom", &extent.bottom);
    table.append_numeric_column("right", &extent.right);

    table.to_json_records(Path::new(matches.get_one::<String>("output").unwrap()))?;

    if let Some(geojson_path) = matches.get_one::<String>("geojson") {
        let columns: Vec<String> = matches
            .get_many::<String>("columns")
            .map(|values| values.cloned().collect())
            .unwrap_or_default();
        write_grid_geojson(&table, crs, &columns, Path::new(geojson_path))?;
    }
    Ok(())
}

fn run_merge_detector(matches: &ArgMatches) -> grid_mapper::Result<()> {
    let table = load_table(matches)?;
    let merged = add_detector_scores(
        &table,
        Path::new(matches.get_one::<String>("predictions").unwrap()),
        matches.get_one::<String>("column").unwrap(),
        matches.get_one::<String>("id-column").unwrap(),
    )?;
    merged.to_json_records(Path::new(matches.get_one::<String>("output").unwrap()))
}

fn run_merge_classifier(matches: &ArgMatches) -> grid_mapper::Result<()> {
    let class_index = matches
        .get_one::<String>("class-index")
        .unwrap()
        .parse::<usize>()
        .expect("Invalid class index");

    let table = load_table(matches)?;
    let merged = add_classifier_scores(
        &table,
        Path::new(matches.get_one::<String>("predictions").unwrap()),
        class_index,
        matches.get_one::<String>("column").unwrap(),
        matches.get_one::<String>("id-column").unwrap(),
    )?;
    merged.to_json_records(Path::new(matches.get_one::<String>("output").unwrap()))
}
