use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::table::{DataTable, Value};

/// Merge YOLO-style detector confidences into a copy of the table.
///
/// Every file in `predictions_dir` is named `<image_id>.txt` and holds one
/// detection per line, whitespace-separated fields with the confidence last.
/// The maximum confidence across the file's lines (the most confident
/// detection) lands in `score_column` for every row whose `id_column`
/// matches the file's image id. Rows with no prediction file keep a `Null`
/// score; an existing file with no lines is an error.
pub fn add_detector_scores(
    table: &DataTable,
    predictions_dir: &Path,
    score_column: &str,
    id_column: &str,
) -> Result<DataTable> {
    merge_scores(table, predictions_dir, score_column, id_column, |path| {
        let content = fs::read_to_string(path)?;
        let mut best: Option<f64> = None;
        for line in content.lines() {
            let conf = last_field(path, line)?;
            best = Some(best.map_or(conf, |b| b.max(conf)));
        }
        best.ok_or_else(|| Error::EmptyPredictionFile(path.to_path_buf()))
    })
}

/// Merge classifier probabilities into a copy of the table.
///
/// Each prediction file holds one line of whitespace-separated class
/// probabilities; `class_index` picks the positional field (index 1 is the
/// positive class in the two-class layout). Only the first line is
/// consulted.
pub fn add_classifier_scores(
    table: &DataTable,
    predictions_dir: &Path,
    class_index: usize,
    score_column: &str,
    id_column: &str,
) -> Result<DataTable> {
    merge_scores(table, predictions_dir, score_column, id_column, |path| {
        let content = fs::read_to_string(path)?;
        let line = content
            .lines()
            .next()
            .ok_or_else(|| Error::EmptyPredictionFile(path.to_path_buf()))?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        let field = fields
            .get(class_index)
            .ok_or_else(|| Error::ClassIndexOutOfRange {
                index: class_index,
                fields: fields.len(),
                path: path.to_path_buf(),
            })?;
        field
            .parse()
            .map_err(|_| Error::MalformedPredictionLine {
                path: path.to_path_buf(),
                line: line.to_string(),
            })
    })
}

/// Shared merge loop: one score per prediction file, written to every row
/// whose id matches. Ids with no matching row are skipped silently.
fn merge_scores<F>(
    table: &DataTable,
    predictions_dir: &Path,
    score_column: &str,
    id_column: &str,
    score_for: F,
) -> Result<DataTable>
where
    F: Fn(&Path) -> Result<f64>,
{
    let mut merged = table.clone();
    let index = merged.id_index(id_column)?;
    let column_idx = merged.add_column(score_column);

    let mut paths: Vec<PathBuf> = fs::read_dir(predictions_dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<_>>()?;
    paths.sort();

    println!(
        "Merging {} prediction files from {}",
        paths.len(),
        predictions_dir.display()
    );

    for path in paths {
        let score = score_for(&path)?;
        let id = image_id_from_path(&path)?;
        if let Some(rows) = index.get(&id) {
            for &row in rows {
                merged.set_value(row, column_idx, Value::Float(score));
            }
        }
    }

    Ok(merged)
}

/// Last whitespace-separated field of a line as a float.
fn last_field(path: &Path, line: &str) -> Result<f64> {
    let malformed = || Error::MalformedPredictionLine {
        path: path.to_path_buf(),
        line: line.to_string(),
    };
    line.split_whitespace()
        .next_back()
        .ok_or_else(|| malformed())?
        .parse()
        .map_err(|_| malformed())
}

/// Image id from a `<integer>.txt` file name.
fn image_id_from_path(path: &Path) -> Result<i64> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::InvalidPredictionFileName(path.to_path_buf()))?;
    let stem = name.strip_suffix(".txt").unwrap_or(name);
    stem.parse()
        .map_err(|_| Error::InvalidPredictionFileName(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    fn image_table(ids: &[i64]) -> DataTable {
        let mut table = DataTable::new(vec!["image_id".into()]);
        for &id in ids {
            table.push_row(vec![Value::Int(id)]);
        }
        table
    }

    fn write_file(dir: &Path, name: &str, content: &str) {
        let mut file = File::create(dir.join(name)).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn detector_takes_max_confidence() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "3.txt",
            "0 0.5 0.5 0.1 0.1 0.2\n0 0.4 0.4 0.2 0.2 0.9\n0 0.3 0.3 0.1 0.1 0.5\n",
        );

        let table = image_table(&[3]);
        let merged = add_detector_scores(&table, dir.path(), "conf_yolov5", "image_id").unwrap();
        assert_eq!(merged.value(0, "conf_yolov5"), Some(&Value::Float(0.9)));
    }

    #[test]
    fn detector_leaves_unmatched_rows_null() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "1.txt", "0 0.5 0.5 0.1 0.1 0.7\n");

        let table = image_table(&[1, 2]);
        let merged = add_detector_scores(&table, dir.path(), "conf_yolov5", "image_id").unwrap();
        assert_eq!(merged.value(0, "conf_yolov5"), Some(&Value::Float(0.7)));
        assert_eq!(merged.value(1, "conf_yolov5"), Some(&Value::Null));
        // Input table untouched.
        assert!(!table.has_column("conf_yolov5"));
    }

    #[test]
    fn detector_updates_every_matching_row() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "5.txt", "0 0.5 0.5 0.1 0.1 0.6\n");

        let table = image_table(&[5, 9, 5]);
        let merged = add_detector_scores(&table, dir.path(), "conf", "image_id").unwrap();
        assert_eq!(merged.value(0, "conf"), Some(&Value::Float(0.6)));
        assert_eq!(merged.value(1, "conf"), Some(&Value::Null));
        assert_eq!(merged.value(2, "conf"), Some(&Value::Float(0.6)));
    }

    #[test]
    fn detector_rejects_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "4.txt", "");

        let result = add_detector_scores(&image_table(&[4]), dir.path(), "conf", "image_id");
        assert!(matches!(result, Err(Error::EmptyPredictionFile(_))));
    }

    #[test]
    fn detector_rejects_non_numeric_confidence() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "4.txt", "0 0.5 0.5 0.1 0.1 high\n");

        let result = add_detector_scores(&image_table(&[4]), dir.path(), "conf", "image_id");
        assert!(matches!(result, Err(Error::MalformedPredictionLine { .. })));
    }

    #[test]
    fn non_integer_file_name_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "notes.txt", "0 0.5 0.5 0.1 0.1 0.9\n");

        let result = add_detector_scores(&image_table(&[1]), dir.path(), "conf", "image_id");
        assert!(matches!(result, Err(Error::InvalidPredictionFileName(_))));
    }

    #[test]
    fn unknown_image_id_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "42.txt", "0 0.5 0.5 0.1 0.1 0.9\n");

        let table = image_table(&[1]);
        let merged = add_detector_scores(&table, dir.path(), "conf", "image_id").unwrap();
        assert_eq!(merged.value(0, "conf"), Some(&Value::Null));
    }

    #[test]
    fn classifier_selects_positional_field() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "6.txt", "0.3 0.7\n");

        let table = image_table(&[6]);
        let merged = add_classifier_scores(&table, dir.path(), 1, "conf_eff", "image_id").unwrap();
        assert_eq!(merged.value(0, "conf_eff"), Some(&Value::Float(0.7)));
    }

    #[test]
    fn classifier_ignores_extra_lines() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "6.txt", "0.3 0.7\n0.9 0.1\n");

        let merged =
            add_classifier_scores(&image_table(&[6]), dir.path(), 1, "conf", "image_id").unwrap();
        assert_eq!(merged.value(0, "conf"), Some(&Value::Float(0.7)));
    }

    #[test]
    fn classifier_rejects_out_of_range_index() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "6.txt", "0.3 0.7\n");

        let result = add_classifier_scores(&image_table(&[6]), dir.path(), 5, "conf", "image_id");
        assert!(matches!(
            result,
            Err(Error::ClassIndexOutOfRange {
                index: 5,
                fields: 2,
                ..
            })
        ));
    }

    #[test]
    fn classifier_rejects_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "6.txt", "");

        let result = add_classifier_scores(&image_table(&[6]), dir.path(), 1, "conf", "image_id");
        assert!(matches!(result, Err(Error::EmptyPredictionFile(_))));
    }

    #[test]
    fn missing_id_column_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let table = DataTable::new(vec!["name".into()]);
        let result = add_detector_scores(&table, dir.path(), "conf", "image_id");
        assert!(matches!(result, Err(Error::MissingColumn(c)) if c == "image_id"));
    }
}
