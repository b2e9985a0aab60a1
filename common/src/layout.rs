//! Hive-style on-disk layout shared by the writer and the readers:
//! `<root>/<source>/<key_1>=<value>/<key_2>=<value>/<file>.parquet`.
//!
//! Values are percent-encoded in directory names, so a value can never add a
//! path level or be mistaken for a `key=value` separator.

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use std::path::{Path, PathBuf};

/// Directory value used for rows whose partition key is null.
pub const HIVE_DEFAULT_PARTITION: &str = "__HIVE_DEFAULT_PARTITION__";

const PARTITION_VALUE: &AsciiSet = &CONTROLS
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'\'')
    .add(b'*')
    .add(b'/')
    .add(b':')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'{')
    .add(b'|')
    .add(b'}');

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct PartitionPath {
    segments: Vec<(String, Option<String>)>,
}

impl PartitionPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_segment(mut self, key: &str, value: Option<&str>) -> Self {
        self.segments.push((key.to_string(), value.map(str::to_string)));
        self
    }

    /// Keys with their decoded values; `None` is the null partition.
    pub fn segments(&self) -> &[(String, Option<String>)] {
        &self.segments
    }

    pub fn build_storage_path(&self) -> String {
        self.segments
            .iter()
            .map(|(key, value)| segment_name(key, value.as_deref()))
            .collect::<Vec<_>>()
            .join("/")
    }

    pub fn build_dir(&self, root: &Path, source_name: &str) -> PathBuf {
        let mut dir = source_dir(root, source_name);
        for (key, value) in &self.segments {
            dir.push(segment_name(key, value.as_deref()));
        }
        dir
    }
}

pub fn source_dir(root: &Path, source_name: &str) -> PathBuf {
    root.join(source_name)
}

fn segment_name(key: &str, value: Option<&str>) -> String {
    format!("{}={}", key, encode_partition_value(value))
}

fn encode_partition_value(value: Option<&str>) -> String {
    match value {
        None => HIVE_DEFAULT_PARTITION.to_string(),
        Some(value) => utf8_percent_encode(value, PARTITION_VALUE).to_string(),
    }
}

fn decode_partition_value(raw: &str) -> Option<String> {
    if raw == HIVE_DEFAULT_PARTITION {
        return None;
    }
    Some(percent_decode_str(raw).decode_utf8_lossy().into_owned())
}

/// Splits a `key=value` directory name and decodes the value. Names without
/// `=` or with an empty key are not partition directories.
pub fn parse_partition_segment(name: &str) -> Option<(&str, Option<String>)> {
    let (key, value) = name.split_once('=')?;
    if key.is_empty() {
        return None;
    }
    Some((key, decode_partition_value(value)))
}

/// A directory holding data files, with the partition values of its
/// `key=value` ancestors.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionLeaf {
    pub partition: PartitionPath,
    pub files: Vec<PathBuf>,
}

/// Every directory under a source that holds Parquet files, in path order.
/// Hidden (`.`) and scratch (`_`) entries are ignored.
pub fn discover_partitions(source_dir: &Path) -> std::io::Result<Vec<PartitionLeaf>> {
    let mut leaves = Vec::new();
    collect_leaves(source_dir, PartitionPath::new(), &mut leaves)?;
    Ok(leaves)
}

fn collect_leaves(
    dir: &Path,
    partition: PartitionPath,
    leaves: &mut Vec<PartitionLeaf>,
) -> std::io::Result<()> {
    let mut files = Vec::new();
    let mut children = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || name.starts_with('_') {
            continue;
        }
        if entry.file_type()?.is_dir() {
            if let Some((key, value)) = parse_partition_segment(&name) {
                children.push((entry.path(), key.to_string(), value));
            }
        } else if name.ends_with(".parquet") {
            files.push(entry.path());
        }
    }
    files.sort();
    children.sort();

    if !files.is_empty() {
        leaves.push(PartitionLeaf {
            partition: partition.clone(),
            files,
        });
    }
    for (path, key, value) in children {
        let nested = partition.clone().with_segment(&key, value.as_deref());
        collect_leaves(&path, nested, leaves)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_nested_partition_dirs() {
        let path = PartitionPath::new()
            .with_segment("symbole_action", Some("FSLR"))
            .with_segment("annee", Some("2023"));

        assert_eq!(path.build_storage_path(), "symbole_action=FSLR/annee=2023");
        assert_eq!(
            path.build_dir(Path::new("/lake"), "stock_prices"),
            PathBuf::from("/lake/stock_prices/symbole_action=FSLR/annee=2023")
        );
    }

    #[test]
    fn null_values_use_default_partition() {
        let path = PartitionPath::new().with_segment("annee", None);
        assert_eq!(path.build_storage_path(), "annee=__HIVE_DEFAULT_PARTITION__");
        assert_eq!(
            parse_partition_segment("annee=__HIVE_DEFAULT_PARTITION__"),
            Some(("annee", None))
        );
    }

    #[test]
    fn separators_in_values_stay_inside_one_directory() {
        let path = PartitionPath::new().with_segment("symbole_action", Some("a/../../x=1"));
        let dir = path.build_dir(Path::new("/lake"), "stock_prices");

        assert_eq!(dir.parent(), Some(Path::new("/lake/stock_prices")));
        assert_eq!(path.build_storage_path(), "symbole_action=a%2F..%2F..%2Fx%3D1");

        let name = dir.file_name().unwrap().to_str().unwrap();
        assert_eq!(
            parse_partition_segment(name),
            Some(("symbole_action", Some("a/../../x=1".to_string())))
        );
    }

    #[test]
    fn parses_segments() {
        assert_eq!(
            parse_partition_segment("annee=2020"),
            Some(("annee", Some("2020".to_string())))
        );
        assert_eq!(parse_partition_segment("annee="), Some(("annee", Some(String::new()))));
        assert_eq!(parse_partition_segment("=2020"), None);
        assert_eq!(parse_partition_segment("annee"), None);
    }

    #[test]
    fn discovers_leaves_with_decoded_values() {
        let root = tempfile::tempdir().unwrap();
        let source = root.path().join("rte");
        std::fs::create_dir_all(source.join("annee=2021/mois=1")).unwrap();
        std::fs::create_dir_all(source.join("annee=2020/mois=12")).unwrap();
        std::fs::create_dir_all(source.join("_tmp")).unwrap();
        std::fs::write(source.join("annee=2021/mois=1/part-0.parquet"), b"").unwrap();
        std::fs::write(source.join("annee=2020/mois=12/part-0.parquet"), b"").unwrap();
        std::fs::write(source.join("_tmp/part-0.parquet"), b"").unwrap();

        let leaves = discover_partitions(&source).unwrap();
        assert_eq!(leaves.len(), 2);
        assert_eq!(leaves[0].partition.build_storage_path(), "annee=2020/mois=12");
        assert_eq!(
            leaves[1].partition.segments(),
            &[
                ("annee".to_string(), Some("2021".to_string())),
                ("mois".to_string(), Some("1".to_string()))
            ]
        );
    }

    #[test]
    fn unpartitioned_source_is_a_single_leaf() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("part-0.parquet"), b"").unwrap();

        let leaves = discover_partitions(root.path()).unwrap();
        assert_eq!(leaves.len(), 1);
        assert!(leaves[0].partition.segments().is_empty());
    }

    #[test]
    fn empty_source_has_no_leaves() {
        let root = tempfile::tempdir().unwrap();
        assert!(discover_partitions(root.path()).unwrap().is_empty());
    }
}
