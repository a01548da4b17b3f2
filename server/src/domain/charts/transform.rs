//! Chart transformer
//!
//! Shapes executor output into a `{labels, values}` series. Coercion is
//! lenient here: numeric strings and booleans are read as numbers.

use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;

use super::pipeline::GROUP_LIMIT;
use crate::data::types::{ChartSpec, FieldValue, ResultRow};

/// Index-aligned labels and values of one chart
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartSeries {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum TransformError {
    #[error("Result rows mix grouped and raw shapes")]
    MixedRows,
}

/// Transform executor rows into a series
///
/// The first row decides the mode. Grouped rows keep their order; raw rows
/// are grouped here by `group_by`, summing `measure`, then sorted by value
/// descending and cut to the top groups. Raw rows for a chart without both
/// fields give an empty series.
pub fn transform(chart: &ChartSpec, rows: &[ResultRow]) -> Result<ChartSeries, TransformError> {
    let Some(first) = rows.first() else {
        return Ok(ChartSeries::default());
    };

    if rows.iter().any(|r| r.is_grouped() != first.is_grouped()) {
        return Err(TransformError::MixedRows);
    }

    if first.is_grouped() {
        Ok(from_grouped(rows))
    } else {
        Ok(from_raw(chart, rows))
    }
}

fn from_grouped(rows: &[ResultRow]) -> ChartSeries {
    let mut series = ChartSeries::default();
    for row in rows {
        if let ResultRow::Grouped { id, value } = row {
            series.labels.push(id.as_label());
            series.values.push(value.as_number());
        }
    }
    series
}

fn from_raw(chart: &ChartSpec, rows: &[ResultRow]) -> ChartSeries {
    let Some(config) = chart.config.as_ref().filter(|c| c.is_grouped()) else {
        return ChartSeries::default();
    };

    let mut totals: IndexMap<String, f64> = IndexMap::new();
    for row in rows {
        if let ResultRow::Raw { data } = row {
            let label = FieldValue::field(data, &config.group_by).as_label();
            let value = FieldValue::field(data, &config.measure).as_number();
            *totals.entry(label).or_insert(0.0) += value;
        }
    }

    let mut totals: Vec<(String, f64)> = totals.into_iter().collect();
    totals.sort_by(|a, b| b.1.total_cmp(&a.1));
    totals.truncate(GROUP_LIMIT);

    let (labels, values) = totals.into_iter().unzip();
    ChartSeries { labels, values }
}
