//! Canonical schema constants for structured logging and events
//!
//! These constants ensure consistency across all logging and error reporting.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_REQUEST_ID: &str = "request_id";

// Entity identifiers
pub const FIELD_SNAPSHOT_ID: &str = "snapshot_id";
pub const FIELD_DIFF_ID: &str = "diff_id";
pub const FIELD_RULE_ID: &str = "rule_id";

// Collection sizes
pub const FIELD_ITEM_COUNT: &str = "item_count";
pub const FIELD_CURRENT_COUNT: &str = "current_count";
pub const FIELD_DELTA_COUNT: &str = "delta_count";

// Error fields
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";

// Event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
