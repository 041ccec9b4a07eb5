//! Persisting elements: one file per element, named by its index

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::OutputFormat;
use crate::error::Result;
use crate::types::Element;

/// Write each element to `dir` as `{index}.txt` (raw content) or
/// `{index}.json` (content and metadata).
///
/// Elements sharing an index get `{index}_{n}` names in encounter order.
/// Returns the written paths in element order.
pub fn save_elements(dir: &Path, elements: &[Element], format: OutputFormat) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;

    let mut seen: HashMap<u32, usize> = HashMap::new();
    let mut written = Vec::with_capacity(elements.len());

    for element in elements {
        let count = seen.entry(element.index()).or_insert(0);
        let stem = match *count {
            0 => element.index().to_string(),
            n => format!("{}_{}", element.index(), n),
        };
        *count += 1;

        let path = dir.join(format!("{}.{}", stem, format.extension()));
        match format {
            OutputFormat::Text => std::fs::write(&path, element.content())?,
            OutputFormat::Json => std::fs::write(&path, serde_json::to_string_pretty(element)?)?,
        }
        written.push(path);
    }

    tracing::debug!(dir = %dir.display(), files = written.len(), "Saved elements");
    Ok(written)
}

/// Read back elements written with [`OutputFormat::Json`], ordered by
/// index and then by their position within the index
pub fn load_elements(dir: &Path) -> Result<Vec<Element>> {
    let mut files: Vec<((u32, usize), PathBuf)> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .filter_map(|path| stem_order(&path).map(|key| (key, path)))
        .collect();
    files.sort_by_key(|(key, _)| *key);
    let paths: Vec<PathBuf> = files.into_iter().map(|(_, path)| path).collect();

    paths
        .iter()
        .map(|path| -> Result<Element> {
            let raw = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&raw)?)
        })
        .collect()
}

/// `(index, n)` from a `{index}` or `{index}_{n}` file stem
fn stem_order(path: &Path) -> Option<(u32, usize)> {
    let stem = path.file_stem()?.to_str()?;
    match stem.split_once('_') {
        Some((index, n)) => Some((index.parse().ok()?, n.parse().ok()?)),
        None => Some((stem.parse().ok()?, 0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FileMetadata, Source, TextMetadata};

    fn text(content: &str, index: u32) -> Element {
        Element::text(content, Source::Native, index, FileMetadata::default(), TextMetadata::default()).unwrap()
    }

    #[test]
    fn test_text_files_named_by_index() {
        let dir = tempfile::tempdir().unwrap();
        let elements = vec![text("first", 2), text("second", 2), text("other", 9)];

        let paths = save_elements(dir.path(), &elements, OutputFormat::Text).unwrap();
        let names: Vec<String> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["2.txt", "2_1.txt", "9.txt"]);
        assert_eq!(std::fs::read_to_string(&paths[1]).unwrap(), "second");
    }

    #[test]
    fn test_json_records_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let elements = vec![text("alpha", 1), text("beta", 3)];

        save_elements(dir.path(), &elements, OutputFormat::Json).unwrap();
        let raw = std::fs::read_to_string(dir.path().join("3.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["type"], "text");
        assert_eq!(value["content"], "beta");

        assert_eq!(load_elements(dir.path()).unwrap(), elements);
    }

    #[test]
    fn test_load_orders_by_numeric_index() {
        let dir = tempfile::tempdir().unwrap();
        let elements = vec![text("a", 1), text("b", 1), text("c", 2), text("d", 10)];

        save_elements(dir.path(), &elements, OutputFormat::Json).unwrap();
        let loaded = load_elements(dir.path()).unwrap();
        let indices: Vec<u32> = loaded.iter().map(|e| e.index()).collect();
        assert_eq!(indices, vec![1, 1, 2, 10]);
        assert_eq!(loaded, elements);
    }

    #[test]
    fn test_stem_order() {
        assert_eq!(stem_order(Path::new("12.json")), Some((12, 0)));
        assert_eq!(stem_order(Path::new("3_2.json")), Some((3, 2)));
        assert_eq!(stem_order(Path::new("notes.json")), None);
    }
}
