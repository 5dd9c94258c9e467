use anyhow::{bail, Context, Result};
use log::{debug, info, warn};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const SAMPLE_EXTENSIONS: [&str; 3] = ["txt", "csv", "dat"];

/// Parse samples from a reader: first column, one sample per row.
///
/// Blank lines and `#` comments are skipped. A first row that does not parse
/// as a number is treated as a header.
pub fn read_samples<R: Read>(reader: R) -> Result<Vec<f32>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut samples = Vec::new();
    for (row, result) in rdr.records().enumerate() {
        let record = result?;
        let field = match record.get(0) {
            Some(f) if !f.is_empty() => f,
            _ => continue,
        };

        match field.parse::<f32>() {
            Ok(value) => samples.push(value),
            Err(_) if row == 0 => {
                debug!("Skipping header row: {:?}", field);
            }
            Err(e) => {
                let line = record.position().map(|p| p.line()).unwrap_or(row as u64 + 1);
                bail!("Failed to parse sample {:?} on line {}: {}", field, line, e);
            }
        }
    }

    Ok(samples)
}

pub fn read_sample_file(path: &Path) -> Result<Vec<f32>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
    let samples = read_samples(file)
        .with_context(|| format!("Failed to read samples from {}", path.display()))?;
    info!("Loaded {} samples from {}", samples.len(), path.display());
    Ok(samples)
}

/// A single file, or every sample file under a directory sorted by path
pub fn collect_input_files(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        bail!("Input path does not exist: {}", path.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", path.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_sample_file = entry
            .path()
            .extension()
            .and_then(|s| s.to_str())
            .map(|ext| SAMPLE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if is_sample_file {
            files.push(entry.into_path());
        }
    }

    if files.is_empty() {
        warn!("No sample files found under {}", path.display());
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_plain_lines() {
        let input = "0.5\n0.75\n\n1.0\n";
        assert_eq!(read_samples(input.as_bytes()).unwrap(), vec![0.5, 0.75, 1.0]);
    }

    #[test]
    fn test_header_comments_and_extra_columns() {
        let input = "amplitude,time\n# generated\n0.1,0.00\n 0.2 ,0.02\n0.3,0.04\n";
        assert_eq!(read_samples(input.as_bytes()).unwrap(), vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_garbage_after_header_fails() {
        let input = "0.1\nnot-a-number\n";
        assert!(read_samples(input.as_bytes()).is_err());
    }

    #[test]
    fn test_collect_and_read_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut b = File::create(dir.path().join("b.txt")).unwrap();
        writeln!(b, "0.2\n0.3").unwrap();
        let mut a = File::create(dir.path().join("a.csv")).unwrap();
        writeln!(a, "0.1").unwrap();
        File::create(dir.path().join("notes.md")).unwrap();

        let files = collect_input_files(dir.path()).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("a.csv"));
        assert!(files[1].ends_with("b.txt"));

        assert_eq!(read_sample_file(&files[1]).unwrap(), vec![0.2, 0.3]);
        assert_eq!(
            collect_input_files(&files[0]).unwrap(),
            vec![files[0].clone()]
        );
    }

    #[test]
    fn test_missing_path() {
        assert!(collect_input_files(Path::new("/definitely/not/here")).is_err());
    }
}
