//! SQLite schema definitions

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// Complete schema SQL
pub const SCHEMA: &str = r#"
-- =============================================================================
-- Infrastructure: Schema version tracking
-- =============================================================================
CREATE TABLE IF NOT EXISTS schema_version (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    version INTEGER NOT NULL,
    applied_at INTEGER NOT NULL,
    description TEXT
);

CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at INTEGER NOT NULL,
    checksum TEXT NOT NULL,
    execution_time_ms INTEGER,
    success INTEGER NOT NULL DEFAULT 1
);

-- =============================================================================
-- 1. Organizations
-- =============================================================================
CREATE TABLE IF NOT EXISTS organizations (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL CHECK(length(name) >= 1 AND length(name) <= 100),
    slug TEXT NOT NULL UNIQUE CHECK(
        (length(slug) >= 2 AND length(slug) <= 50 AND slug GLOB '[a-z0-9][a-z0-9-]*[a-z0-9]')
        OR (length(slug) = 1 AND slug GLOB '[a-z0-9]')
    ),
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

-- =============================================================================
-- 2. API Keys (references organizations)
-- =============================================================================
CREATE TABLE IF NOT EXISTS api_keys (
    id TEXT PRIMARY KEY,
    organization_id TEXT NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    name TEXT NOT NULL CHECK(length(name) >= 1 AND length(name) <= 100),
    key_hash TEXT NOT NULL UNIQUE,
    key_prefix TEXT NOT NULL,
    last_used_at INTEGER,
    expires_at INTEGER,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_api_keys_org ON api_keys(organization_id);

-- =============================================================================
-- 3. Data Sources (references organizations)
-- =============================================================================
CREATE TABLE IF NOT EXISTS data_sources (
    id TEXT PRIMARY KEY,
    organization_id TEXT NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    name TEXT NOT NULL CHECK(length(name) >= 1 AND length(name) <= 200),
    description TEXT,
    source_type TEXT NOT NULL CHECK(source_type IN ('file', 'api', 'sample')),
    columns TEXT NOT NULL DEFAULT '[]' CHECK(json_valid(columns)),
    record_count INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    UNIQUE (organization_id, name)
);

-- =============================================================================
-- 4. Records (references data sources, cascade on delete)
-- =============================================================================
CREATE TABLE IF NOT EXISTS records (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    organization_id TEXT NOT NULL,
    data_source_id TEXT NOT NULL REFERENCES data_sources(id) ON DELETE CASCADE,
    data_source TEXT NOT NULL,
    data TEXT NOT NULL CHECK(json_valid(data)),
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_records_source ON records(organization_id, data_source, seq);
CREATE INDEX IF NOT EXISTS idx_records_source_id ON records(data_source_id, seq);

-- =============================================================================
-- 5. Dashboards (references organizations, charts embedded as JSON)
-- =============================================================================
CREATE TABLE IF NOT EXISTS dashboards (
    id TEXT PRIMARY KEY,
    organization_id TEXT NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    name TEXT NOT NULL CHECK(length(name) >= 1 AND length(name) <= 100),
    description TEXT,
    charts TEXT NOT NULL DEFAULT '[]' CHECK(json_valid(charts)),
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    UNIQUE (organization_id, name)
);

-- =============================================================================
-- Default data
-- =============================================================================
INSERT OR IGNORE INTO organizations (id, name, slug, created_at, updated_at)
VALUES ('default', 'Default Organization', 'default', strftime('%s', 'now'), strftime('%s', 'now'));
"#;
