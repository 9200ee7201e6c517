use crate::error::{DeployerError, DeployerResult};

/// Picks the subnet the next blockchain is created on.
///
/// The snapshot preloads a pool of validated subnets. Sorting the pool and indexing it with the
/// number of already created blockchains walks through it incrementally, wrapping around once
/// every subnet holds a blockchain.
pub fn select_subnet_slot(pool: &[String], created_blockchains: usize) -> DeployerResult<String> {
    if pool.is_empty() {
        return Err(DeployerError::EmptySubnetPool);
    }
    let mut sorted: Vec<&String> = pool.iter().collect();
    sorted.sort();
    Ok(sorted[created_blockchains % sorted.len()].clone())
}
