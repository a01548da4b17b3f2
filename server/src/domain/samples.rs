//! Built-in sample data sets
//!
//! Four small data sources for trying out dashboards. Seeding skips any
//! source whose name already exists in the organization.

use serde::Serialize;
use utoipa::ToSchema;

use crate::data::DataError;
use crate::data::traits::TransactionalRepository;
use crate::data::types::{DataSourceRow, FieldValue, RecordData, SourceType};

const INDUSTRY_REVENUE: [(&str, i64); 5] = [
    ("Manufacturing", 450),
    ("Healthcare", 380),
    ("Technology", 520),
    ("Retail", 290),
    ("Finance", 400),
];

const MONTHS: [&str; 6] = ["Jan", "Feb", "Mar", "Apr", "May", "Jun"];

const MONTHLY_TRENDS: [(&str, [i64; 6]); 2] = [
    ("Manufacturing", [65, 59, 80, 81, 56, 55]),
    ("Healthcare", [28, 48, 40, 19, 86, 27]),
];

const SIZE_DISTRIBUTION: [(&str, i64); 4] = [
    ("Small", 30),
    ("Medium", 45),
    ("Large", 15),
    ("Enterprise", 10),
];

const EMPLOYEE_GROWTH: [(&str, i64); 5] = [
    ("2019", 1200),
    ("2020", 1350),
    ("2021", 1500),
    ("2022", 1800),
    ("2023", 2100),
];

/// Sample data source definition
#[derive(Debug, Clone)]
pub struct SampleSource {
    pub name: &'static str,
    pub description: &'static str,
    pub records: Vec<RecordData>,
}

/// Outcome of seeding the samples into one organization
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct SeedReport {
    /// Names of the data sources created
    pub created: Vec<String>,
    /// Names skipped because a data source with that name exists
    pub skipped: Vec<String>,
}

fn record(fields: &[(&str, FieldValue)]) -> RecordData {
    fields
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn pairs(key: &str, measure: &str, rows: &[(&str, i64)]) -> Vec<RecordData> {
    rows.iter()
        .map(|(k, v)| record(&[(key, (*k).into()), (measure, (*v).into())]))
        .collect()
}

/// All sample data sources in seeding order
pub fn sample_sources() -> Vec<SampleSource> {
    let monthly = MONTHLY_TRENDS
        .iter()
        .flat_map(|(industry, values)| {
            MONTHS.iter().zip(values).map(move |(month, value)| {
                record(&[
                    ("industry", (*industry).into()),
                    ("month", (*month).into()),
                    ("value", (*value).into()),
                ])
            })
        })
        .collect();

    vec![
        SampleSource {
            name: "Industry Revenue",
            description: "Annual revenue by industry sector",
            records: pairs("industry", "revenue", &INDUSTRY_REVENUE),
        },
        SampleSource {
            name: "Monthly Trends",
            description: "Monthly performance trends by industry",
            records: monthly,
        },
        SampleSource {
            name: "Company Size Distribution",
            description: "Distribution of companies by size",
            records: pairs("size", "count", &SIZE_DISTRIBUTION),
        },
        SampleSource {
            name: "Employee Growth",
            description: "Employee growth trend over years",
            records: pairs("year", "employees", &EMPLOYEE_GROWTH),
        },
    ]
}

/// Create the sample data sources that do not exist yet
pub async fn seed_samples(
    repository: &dyn TransactionalRepository,
    org_id: &str,
) -> Result<SeedReport, DataError> {
    let mut report = SeedReport::default();

    for sample in sample_sources() {
        let created: Option<DataSourceRow> = repository
            .create_data_source_with_records(
                org_id,
                sample.name,
                Some(sample.description),
                SourceType::Sample,
                &sample.records,
            )
            .await?;

        match created {
            Some(source) => {
                tracing::debug!(org_id, name = %source.name, records = source.record_count, "Sample data source created");
                report.created.push(source.name);
            }
            None => report.skipped.push(sample.name.to_string()),
        }
    }

    tracing::info!(
        org_id,
        created = report.created.len(),
        skipped = report.skipped.len(),
        "Sample data seeded"
    );
    Ok(report)
}
