//! Pipeline builder
//!
//! Turns a chart definition into the ordered stage list the executor runs.

use crate::data::types::{ChartSpec, Stage};

/// Source records read before any grouping
pub const SOURCE_RECORD_LIMIT: usize = 1000;

/// Groups kept after sorting
pub const GROUP_LIMIT: usize = 20;

/// Records passed through when the chart has no grouping
pub const RAW_RECORD_LIMIT: usize = 100;

/// Build the stage list for a chart
///
/// Always `Match` then `Limit(SOURCE_RECORD_LIMIT)`. With a config the payload
/// is projected; a config naming both a group-by and a measure field adds
/// `Group`, `SortByValueDesc` and `Limit(GROUP_LIMIT)`, otherwise
/// `Limit(RAW_RECORD_LIMIT)` selects pass-through mode.
pub fn build_pipeline(chart: &ChartSpec) -> Vec<Stage> {
    let mut stages = vec![
        Stage::Match {
            data_source: chart.data_source.clone(),
        },
        Stage::Limit(SOURCE_RECORD_LIMIT),
    ];

    let Some(config) = &chart.config else {
        return stages;
    };

    stages.push(Stage::ProjectData);

    if config.is_grouped() {
        stages.push(Stage::Group {
            key_field: config.group_by.clone(),
            measure_field: config.measure.clone(),
            accumulator: config.aggregate.into(),
        });
        stages.push(Stage::SortByValueDesc);
        stages.push(Stage::Limit(GROUP_LIMIT));
    } else {
        stages.push(Stage::Limit(RAW_RECORD_LIMIT));
    }

    stages
}
