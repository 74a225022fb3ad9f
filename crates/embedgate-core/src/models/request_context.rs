use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Caller identity and tracing token for one embedding request.
///
/// The dispatch layer only threads this through; provider clients may read
/// `database` to resolve per-tenant credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Database the texts belong to. Multi-tenant deployments encode the
    /// tenant as a `tenant_` prefix.
    pub database: String,
    /// Collection the texts belong to, if known.
    pub collection_uuid: Option<Uuid>,
    /// Unique id of this request, for log correlation.
    pub request_id: Uuid,
}

impl RequestContext {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection_uuid: None,
            request_id: Uuid::new_v4(),
        }
    }

    pub fn with_collection(mut self, collection_uuid: Uuid) -> Self {
        self.collection_uuid = Some(collection_uuid);
        self
    }

    /// Tenant id encoded in the database name (`tenant123_mydb` → `tenant123`).
    pub fn tenant_id(&self) -> Option<&str> {
        self.database.split_once('_').map(|(tenant, _)| tenant)
    }
}
