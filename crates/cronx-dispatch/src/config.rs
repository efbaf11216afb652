use cronx_rpc::PoolConfig;

use crate::reconcile::ReconcilePolicy;

#[derive(Debug, Clone, Default)]
pub struct DispatcherConfig {
    pub pool: PoolConfig,
    pub reconcile: ReconcilePolicy,
}

impl DispatcherConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.pool.validate()
    }
}
