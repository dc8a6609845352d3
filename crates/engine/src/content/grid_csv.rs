use std::path::Path;

use super::types::{CollisionData, ContentError};

/// Parses a collision grid: one row per line, comma-separated integer codes.
/// Blank lines are ignored.
pub fn parse_collision_csv(path: &Path, raw: &str) -> Result<CollisionData, ContentError> {
    let mut width = None;
    let mut height = 0u32;
    let mut codes = Vec::new();

    for (line_index, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let csv_error = |message: String| ContentError::Csv {
            path: path.to_path_buf(),
            line: line_index + 1,
            message,
        };

        let mut row_len = 0u32;
        for cell in line.split(',') {
            let cell = cell.trim();
            let code = cell
                .parse::<i32>()
                .map_err(|err| csv_error(format!("cell '{cell}' is not an integer: {err}")))?;
            codes.push(code);
            row_len += 1;
        }

        match width {
            None => width = Some(row_len),
            Some(expected) if expected != row_len => {
                return Err(csv_error(format!(
                    "row has {row_len} cells, expected {expected}"
                )));
            }
            Some(_) => {}
        }
        height += 1;
    }

    Ok(CollisionData {
        width: width.unwrap_or(0),
        height,
        codes,
    })
}
