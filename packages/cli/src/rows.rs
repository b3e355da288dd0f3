//! CSV input to [`OverlapRow`]s.

use std::io::Read;

use census_overlay_overlap::{MeasureValue, OverlapRow};

use crate::{AggregationConfig, ConfigError};

/// Reads overlap rows from CSV with a header row.
///
/// Key and geometry columns are located by the names in `config.columns`.
/// Value columns are `config.subgroups` when set, otherwise every other
/// column. Blank cells become [`MeasureValue::Missing`]; anything else is
/// kept as text and parsed during aggregation.
///
/// # Errors
///
/// Returns [`ConfigError`] if the CSV is malformed or a configured column
/// is missing from the header.
pub fn read_rows<R: Read>(
    reader: R,
    config: &AggregationConfig,
) -> Result<Vec<OverlapRow>, ConfigError> {
    let mut csv = csv::Reader::from_reader(reader);
    let headers = csv.headers()?.clone();

    let column = |name: &str| {
        headers
            .iter()
            .position(|header| header.trim() == name)
            .ok_or_else(|| ConfigError::MissingColumn {
                column: name.to_string(),
            })
    };

    let columns = &config.columns;
    let target_key = column(&columns.target_key)?;
    let source_key = columns.source_key.as_deref().map(column).transpose()?;
    let source_wkt = column(&columns.source_wkt)?;
    let target_wkt = column(&columns.target_wkt)?;

    let value_columns: Vec<(String, usize)> = match &config.subgroups {
        Some(subgroups) => subgroups
            .iter()
            .map(|name| column(name).map(|index| (name.clone(), index)))
            .collect::<Result<_, _>>()?,
        None => {
            let key_columns: Vec<&str> = columns.names().collect();
            headers
                .iter()
                .enumerate()
                .filter(|(_, header)| !key_columns.contains(&header.trim()))
                .map(|(index, header)| (header.trim().to_string(), index))
                .collect()
        }
    };

    let mut rows = Vec::new();
    for record in csv.records() {
        let record = record?;
        let cell = |index: usize| record.get(index).unwrap_or_default();

        let values = value_columns
            .iter()
            .map(|(name, index)| {
                let text = cell(*index).trim();
                let value = if text.is_empty() {
                    MeasureValue::Missing
                } else {
                    MeasureValue::from(text)
                };
                (name.clone(), value)
            })
            .collect();

        rows.push(OverlapRow {
            target_key: cell(target_key).trim().to_string(),
            source_key: source_key.map(|index| cell(index).trim().to_string()),
            source_wkt: cell(source_wkt).to_string(),
            target_wkt: cell(target_wkt).to_string(),
            values,
        });
    }

    let subgroups: Vec<&str> = value_columns.iter().map(|(name, _)| name.as_str()).collect();
    log::info!("Read {} rows with subgroups {subgroups:?}", rows.len());

    Ok(rows)
}
