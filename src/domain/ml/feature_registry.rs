use crate::domain::errors::SchemaError;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Identifier column carried through to the predictions file.
pub const ID_COLUMN: &str = "ID_code";

/// Label column present in training data only.
pub const TARGET_COLUMN: &str = "target";

/// Number of anonymized numeric features (`var_0` .. `var_199`).
pub const FEATURE_COUNT: usize = 200;

/// Message returned to clients for any rejected upload.
pub const SCHEMA_ERROR_MESSAGE: &str = "Wrong file format or missing columns";

/// Cell values treated as missing, in addition to the empty cell.
/// Matches the default NA spellings of pandas' CSV reader.
pub const MISSING_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Ordered list of feature names.
/// Models are fitted and evaluated on columns in exactly this order.
pub fn feature_names() -> &'static [String] {
    static NAMES: OnceLock<Vec<String>> = OnceLock::new();
    NAMES.get_or_init(|| (0..FEATURE_COUNT).map(|i| format!("var_{i}")).collect())
}

/// ID column followed by every feature column.
pub fn expected_columns() -> Vec<&'static str> {
    std::iter::once(ID_COLUMN)
        .chain(feature_names().iter().map(String::as_str))
        .collect()
}

pub fn is_missing_marker(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || MISSING_MARKERS.contains(&trimmed)
}

/// Positions of the expected columns inside an uploaded header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    pub id_index: usize,
    pub feature_indices: Vec<usize>,
    pub target_index: Option<usize>,
}

impl ColumnLayout {
    /// Resolve the expected columns within `headers`.
    ///
    /// Extra columns are ignored. Every expected column must be present
    /// exactly once; when `require_target` is set the label column is
    /// required too.
    pub fn resolve<'a, I>(headers: I, require_target: bool) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut positions: HashMap<&str, usize> = HashMap::new();
        let mut duplicates: Vec<String> = Vec::new();
        for (idx, name) in headers.into_iter().enumerate() {
            let name = name.trim();
            if positions.insert(name, idx).is_some() {
                duplicates.push(name.to_string());
            }
        }

        let mut required = expected_columns();
        if require_target {
            required.push(TARGET_COLUMN);
        }

        if let Some(name) = duplicates
            .into_iter()
            .find(|name| required.contains(&name.as_str()))
        {
            return Err(SchemaError::DuplicateColumn { name });
        }

        let missing: Vec<String> = required
            .iter()
            .filter(|name| !positions.contains_key(*name))
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(SchemaError::MissingColumns { missing });
        }

        Ok(Self {
            id_index: positions[ID_COLUMN],
            feature_indices: feature_names()
                .iter()
                .map(|name| positions[name.as_str()])
                .collect(),
            target_index: positions.get(TARGET_COLUMN).copied(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_header() -> Vec<String> {
        expected_columns().into_iter().map(str::to_string).collect()
    }

    #[test]
    fn test_feature_names_are_positional() {
        let names = feature_names();
        assert_eq!(names.len(), FEATURE_COUNT);
        assert_eq!(names[0], "var_0");
        assert_eq!(names[199], "var_199");
    }

    #[test]
    fn test_resolve_exact_header() {
        let header = full_header();
        let layout = ColumnLayout::resolve(header.iter().map(String::as_str), false).unwrap();
        assert_eq!(layout.id_index, 0);
        assert_eq!(layout.feature_indices[0], 1);
        assert_eq!(layout.feature_indices[199], 200);
        assert_eq!(layout.target_index, None);
    }

    #[test]
    fn test_resolve_reordered_header_with_extras() {
        let mut header = full_header();
        header.reverse();
        header.insert(0, "extra".to_string());
        let layout = ColumnLayout::resolve(header.iter().map(String::as_str), false).unwrap();
        // reversed: var_199 at 1 .. var_0 at 200, ID at 201
        assert_eq!(layout.id_index, 201);
        assert_eq!(layout.feature_indices[0], 200);
        assert_eq!(layout.feature_indices[199], 1);
    }

    #[test]
    fn test_resolve_reports_missing_columns() {
        let header: Vec<String> = full_header()
            .into_iter()
            .filter(|c| c != "var_42")
            .collect();
        let err = ColumnLayout::resolve(header.iter().map(String::as_str), false).unwrap_err();
        assert_eq!(
            err,
            SchemaError::MissingColumns {
                missing: vec!["var_42".to_string()]
            }
        );
    }

    #[test]
    fn test_resolve_requires_target_for_training() {
        let header = full_header();
        let err = ColumnLayout::resolve(header.iter().map(String::as_str), true).unwrap_err();
        assert!(matches!(err, SchemaError::MissingColumns { missing } if missing == vec!["target"]));
    }

    #[test]
    fn test_resolve_rejects_duplicate_required_column() {
        let mut header = full_header();
        header.push("var_5".to_string());
        let err = ColumnLayout::resolve(header.iter().map(String::as_str), false).unwrap_err();
        assert_eq!(
            err,
            SchemaError::DuplicateColumn {
                name: "var_5".to_string()
            }
        );
    }

    #[test]
    fn test_missing_markers() {
        assert!(is_missing_marker(""));
        assert!(is_missing_marker("  "));
        assert!(is_missing_marker("NaN"));
        assert!(is_missing_marker("NA"));
        assert!(!is_missing_marker("0.0"));
        assert!(!is_missing_marker("abc"));
    }
}
