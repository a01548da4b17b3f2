//! SQLite repositories
//!
//! Types (DashboardRow, DataSourceRow, etc.) should be imported from `crate::data::types`.

pub mod api_key;
pub mod dashboard;
pub mod data_source;
pub mod organization;
pub mod record;

pub use api_key::{
    create_api_key, delete_api_key, get_by_hash as get_api_key_by_hash,
    list_for_org as list_api_keys_for_org, touch_api_key,
};
pub use dashboard::{
    create_dashboard, delete_dashboard, ensure_chart_ids, get_dashboard,
    list_for_org as list_dashboards_for_org, remove_chart, update_dashboard,
};
pub use data_source::{
    create_with_records as create_data_source_with_records, delete_data_source, get_data_source,
    list_for_org as list_data_sources_for_org,
};
pub use organization::{create_organization, get_organization};
pub use record::{append_record, list_records, query_records};
