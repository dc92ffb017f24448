//! CSV decoding of transaction files and encoding of prediction files.

use crate::domain::errors::UploadError;
use crate::domain::ml::feature_registry::{
    self, ColumnLayout, ID_COLUMN, TARGET_COLUMN, is_missing_marker,
};
use crate::domain::transactions::{LabeledDataset, Prediction, RawFeatures, TransactionBatch};
use std::io::Read;

// Short rows are allowed: absent trailing cells read as missing values.
fn reader<R: Read>(source: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(source)
}

fn check_row_width(
    record: &csv::StringRecord,
    header_width: usize,
    row: usize,
) -> Result<(), UploadError> {
    if record.len() > header_width {
        return Err(UploadError::Malformed {
            reason: format!(
                "row {} has {} fields, header has {}",
                row,
                record.len(),
                header_width
            ),
        });
    }
    Ok(())
}

fn parse_features(
    record: &csv::StringRecord,
    layout: &ColumnLayout,
    row: usize,
) -> Result<RawFeatures, UploadError> {
    layout
        .feature_indices
        .iter()
        .enumerate()
        .map(|(feature, &idx)| {
            let raw = record.get(idx).unwrap_or_default();
            if is_missing_marker(raw) {
                return Ok(None);
            }
            // any NaN spelling is missing; infinities are not valid features
            match raw.trim().parse::<f64>() {
                Ok(value) if value.is_nan() => Ok(None),
                Ok(value) if value.is_finite() => Ok(Some(value)),
                _ => Err(UploadError::InvalidValue {
                    row,
                    column: feature_registry::feature_names()[feature].clone(),
                    value: raw.to_string(),
                }),
            }
        })
        .collect()
}

fn parse_id(record: &csv::StringRecord, layout: &ColumnLayout) -> String {
    record.get(layout.id_index).unwrap_or_default().trim().to_string()
}

/// Decode an uploaded transactions file (UTF-8 CSV with a header row).
pub fn parse_upload(bytes: &[u8]) -> Result<TransactionBatch, UploadError> {
    std::str::from_utf8(bytes).map_err(|_| UploadError::Encoding)?;

    let mut rdr = reader(bytes);
    let headers = rdr.headers()?.clone();
    let layout = ColumnLayout::resolve(headers.iter(), false)?;

    let mut batch = TransactionBatch::default();
    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        check_row_width(&record, headers.len(), i + 1)?;
        batch.ids.push(parse_id(&record, &layout));
        batch.features.push(parse_features(&record, &layout, i + 1)?);
    }
    Ok(batch)
}

/// Decode a labeled training file. The label column must hold 0 or 1.
pub fn parse_labeled<R: Read>(source: R) -> Result<LabeledDataset, UploadError> {
    let mut rdr = reader(source);
    let headers = rdr.headers()?.clone();
    let layout = ColumnLayout::resolve(headers.iter(), true)?;
    let target_index = layout
        .target_index
        .ok_or_else(|| UploadError::Malformed {
            reason: format!("missing {} column", TARGET_COLUMN),
        })?;

    let mut dataset = LabeledDataset::default();
    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        check_row_width(&record, headers.len(), i + 1)?;
        let raw_label = record.get(target_index).unwrap_or_default().trim();
        let label = match raw_label.parse::<f64>() {
            Ok(v) if v == 0.0 => 0,
            Ok(v) if v == 1.0 => 1,
            _ => {
                return Err(UploadError::InvalidLabel {
                    row: i + 1,
                    value: raw_label.to_string(),
                });
            }
        };

        dataset.ids.push(parse_id(&record, &layout));
        dataset.features.push(parse_features(&record, &layout, i + 1)?);
        dataset.labels.push(label);
    }
    Ok(dataset)
}

/// Encode predictions as `ID_code,target` rows.
pub fn write_predictions(predictions: &[Prediction]) -> Result<Vec<u8>, csv::Error> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record([ID_COLUMN, TARGET_COLUMN])?;
    for prediction in predictions {
        let value = prediction.value.to_string();
        wtr.write_record([prediction.id.as_str(), value.as_str()])?;
    }
    wtr.into_inner().map_err(|e| e.into_error().into())
}
