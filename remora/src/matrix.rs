//! Text matrix files.
//!
//! One row per line, space-separated unsigned 32-bit decimals. Loading
//! sign-extends each value (u32 → i32 → i64); saving reduces mod 2³².
//! Individual shares routinely overflow the 32-bit band (they carry the
//! masks of every gadget that touched them), but reduction mod 2³² commutes
//! with reconstruction, so the checker's mod-2³² comparison is unaffected.

use crate::errors::Error;
use halyard::ring::ShareMat;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Load a `rows` × `cols` share matrix.
pub fn load(path: &Path, rows: usize, cols: usize) -> Result<ShareMat, Error> {
    let reader = BufReader::new(File::open(path)?);
    let mut matrix = Vec::with_capacity(rows);

    for (lineno, line) in reader.lines().enumerate() {
        if matrix.len() == rows {
            break;
        }
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row = line
            .split_whitespace()
            .map(|token| {
                token
                    .parse::<u32>()
                    .map(|v| (v as i32) as i64)
                    .map_err(|_| {
                        Error::Parse(format!(
                            "{}:{}: bad matrix entry {:?}",
                            path.display(),
                            lineno + 1,
                            token
                        ))
                    })
            })
            .collect::<Result<Vec<i64>, Error>>()?;
        if row.len() != cols {
            return Err(Error::DimensionMismatch {
                expected: cols,
                got: row.len(),
            });
        }
        matrix.push(row);
    }

    if matrix.len() != rows {
        return Err(Error::DimensionMismatch {
            expected: rows,
            got: matrix.len(),
        });
    }
    Ok(matrix)
}

/// Save a share matrix, reducing each entry mod 2³².
pub fn save(path: &Path, matrix: &ShareMat) -> Result<(), Error> {
    let mut writer = BufWriter::new(File::create(path)?);
    for row in matrix.iter() {
        for (j, value) in row.iter().enumerate() {
            if j > 0 {
                write!(writer, " ")?;
            }
            write!(writer, "{}", *value as u32)?;
        }
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}
