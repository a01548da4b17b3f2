//! Data source API types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::api::types::{default_limit, default_page, validate_limit, validate_page};
use crate::core::constants::RECORD_MAX_FIELDS;
use crate::data::types::{DataSourceRow, RecordData, SourceType, StoredRecord};

/// Data source DTO for API responses
#[derive(Debug, Serialize, ToSchema)]
pub struct DataSourceDto {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub source_type: SourceType,
    /// Field names observed so far, in first-seen order
    pub columns: Vec<String>,
    pub record_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DataSourceRow> for DataSourceDto {
    fn from(row: DataSourceRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            source_type: row.source_type,
            columns: row.columns,
            record_count: row.record_count,
            created_at: DateTime::from_timestamp(row.created_at, 0).unwrap_or_else(Utc::now),
            updated_at: DateTime::from_timestamp(row.updated_at, 0).unwrap_or_else(Utc::now),
        }
    }
}

/// Record DTO for API responses
#[derive(Debug, Serialize, ToSchema)]
pub struct RecordDto {
    pub id: String,
    pub data_source: String,
    #[schema(value_type = Object)]
    pub data: RecordData,
    pub created_at: DateTime<Utc>,
}

impl From<StoredRecord> for RecordDto {
    fn from(record: StoredRecord) -> Self {
        Self {
            id: record.id,
            data_source: record.data_source,
            data: record.data,
            created_at: DateTime::from_timestamp(record.created_at, 0).unwrap_or_else(Utc::now),
        }
    }
}

fn validate_record_fields(data: &RecordData) -> Result<(), ValidationError> {
    if data.is_empty() {
        return Err(
            ValidationError::new("fields_min").with_message("Record must have at least one field".into())
        );
    }
    if data.len() > RECORD_MAX_FIELDS {
        return Err(ValidationError::new("fields_max").with_message(
            format!("Record must have at most {} fields", RECORD_MAX_FIELDS).into(),
        ));
    }
    if data.keys().any(|k| k.trim().is_empty()) {
        return Err(
            ValidationError::new("field_name").with_message("Field names must not be blank".into())
        );
    }
    Ok(())
}

/// Request body for streaming one record
///
/// Field values must be scalars; nested objects and arrays are rejected.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct StreamRecordRequest {
    /// Target data source name, created on first use
    #[validate(length(min = 1, max = 200, message = "Data source must be 1-200 characters"))]
    pub data_source: String,

    #[schema(value_type = Object)]
    #[validate(custom(function = "validate_record_fields"))]
    pub data: RecordData,
}

/// Response for a streamed record
#[derive(Debug, Serialize, ToSchema)]
pub struct StreamRecordResponse {
    pub data_source: DataSourceDto,
    pub record: RecordDto,
}

/// Query params for listing records
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ListRecordsQuery {
    #[serde(default = "default_page")]
    #[validate(custom(function = "validate_page"))]
    pub page: u32,

    #[serde(default = "default_limit")]
    #[validate(custom(function = "validate_limit"))]
    pub limit: u32,
}
