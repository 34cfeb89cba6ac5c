use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use entiva_application::HistoryQuery;
use entiva_domain::HistoryRecord;

/// Query parameters accepted by the history listing.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQueryParams {
    pub receiver_id: Option<String>,
    pub entitlement_id: Option<String>,
    pub role_id: Option<String>,
    pub role_suite_id: Option<String>,
    pub grant_request_id: Option<String>,
    pub revoke_request_id: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl From<HistoryQueryParams> for HistoryQuery {
    fn from(params: HistoryQueryParams) -> Self {
        Self {
            receiver_id: params.receiver_id,
            entitlement_id: params.entitlement_id,
            role_id: params.role_id,
            role_suite_id: params.role_suite_id,
            grant_request_id: params.grant_request_id,
            revoke_request_id: params.revoke_request_id,
            from: params.from,
            to: params.to,
            limit: params.limit.unwrap_or(0),
            offset: params.offset.unwrap_or(0),
        }
    }
}

/// API representation of one permission history record.
#[derive(Debug, Serialize)]
pub struct HistoryRecordResponse {
    pub history_id: String,
    pub effect: String,
    pub reason: String,
    pub receiver_type: String,
    pub receiver_id: String,
    pub entitlement_id: Option<String>,
    pub role_id: Option<String>,
    pub role_suite_id: Option<String>,
    pub grant_request_id: Option<String>,
    pub revoke_request_id: Option<String>,
    pub approver_id: Option<String>,
    pub metadata: Option<Value>,
    pub created_at: String,
}

impl From<HistoryRecord> for HistoryRecordResponse {
    fn from(record: HistoryRecord) -> Self {
        Self {
            history_id: record.history_id().to_owned(),
            effect: record.effect().as_str().to_owned(),
            reason: record.reason().as_str().to_owned(),
            receiver_type: record.receiver().receiver_type.as_str().to_owned(),
            receiver_id: record.receiver().receiver_id.clone(),
            entitlement_id: record.refs().entitlement_id.clone(),
            role_id: record.refs().role_id.clone(),
            role_suite_id: record.refs().role_suite_id.clone(),
            grant_request_id: record.refs().grant_request_id.clone(),
            revoke_request_id: record.refs().revoke_request_id.clone(),
            approver_id: record.approver_id().map(ToOwned::to_owned),
            metadata: record.metadata().cloned(),
            created_at: record.created_at().to_rfc3339(),
        }
    }
}
