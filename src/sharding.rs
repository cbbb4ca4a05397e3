// ============================================================================
// Shard Router - modulo mapping from an identity to a partition index
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ShardingError {
    #[error("shard count must be at least 1")]
    NoShards,
}

#[derive(Debug, Clone, Copy)]
pub struct ShardRouter {
    num_shards: usize,
}

impl ShardRouter {
    pub fn new(num_shards: usize) -> Result<Self, ShardingError> {
        if num_shards == 0 {
            return Err(ShardingError::NoShards);
        }
        Ok(Self { num_shards })
    }

    pub fn num_shards(&self) -> usize {
        self.num_shards
    }

    /// Partition index for `key`, always in `0..num_shards`
    pub fn shard_for(&self, key: i64) -> usize {
        key.rem_euclid(self.num_shards as i64) as usize
    }
}
