mod local;

pub use local::LocalTransfertool;

use tracing::debug;

use crate::context::AppContext;
use crate::core::{TransferRequest, Transfertool};

/// Endpoint selection: decides which adapter instance services a given
/// set of requests and how it is parametrized.
///
/// With only the local adapter in the tree the decision is static, but
/// the two-step shape (select, then build against a context) is what a
/// multi-adapter deployment plugs into.
pub struct TransfertoolBuilder {
    external_host: String,
}

impl TransfertoolBuilder {
    /// Builder for the adapter able to service `requests`.
    pub fn for_requests(_requests: &[TransferRequest]) -> Self {
        Self {
            external_host: "Local Transfertool".to_string(),
        }
    }

    pub fn build(self, ctx: AppContext) -> Box<dyn Transfertool> {
        let tool = LocalTransfertool::with_external_host(ctx, self.external_host);
        debug!(tool = tool.external_name(), "selected transfer tool");
        Box::new(tool)
    }
}
