//! Round-robin allocation of engine endpoints across client sessions.

use crate::{BenchError, BenchResult};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Rotating pool of `host:port` endpoints. Rotation is serialized behind a
/// mutex so two allocations can never observe the same head.
pub struct EndpointPool {
    endpoints: Mutex<VecDeque<String>>,
}

impl EndpointPool {
    pub fn new(endpoints: Vec<String>) -> BenchResult<Self> {
        if endpoints.is_empty() {
            return Err(BenchError::Config("endpoint pool is empty".into()));
        }
        Ok(Self {
            endpoints: Mutex::new(endpoints.into()),
        })
    }

    /// Build a pool from a comma-separated `host:port` list.
    pub fn from_csv(spec: &str) -> BenchResult<Self> {
        Self::new(
            spec.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        )
    }

    /// Advance the cursor by one position and return the endpoint now at
    /// the tail, spreading successive sessions across the cluster.
    pub fn next(&self) -> String {
        let mut endpoints = self.endpoints.lock().unwrap();
        endpoints.rotate_left(1);
        endpoints.back().cloned().expect("pool is never empty")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn empty_pool_is_a_config_error() {
        assert!(EndpointPool::new(vec![]).is_err());
        assert!(EndpointPool::from_csv(" , ").is_err());
    }

    #[test]
    fn rotates_in_pool_order() {
        let pool =
            EndpointPool::from_csv("a:21000, b:21000, c:21000").unwrap();
        let seen: Vec<String> = (0..6).map(|_| pool.next()).collect();
        assert_eq!(seen, ["a:21000", "b:21000", "c:21000", "a:21000", "b:21000", "c:21000"]);
    }

    #[test]
    fn concurrent_allocations_never_collide_within_a_cycle() {
        let pool = Arc::new(EndpointPool::from_csv("a,b,c,d").unwrap());
        let mut handles = Vec::new();
        for _ in 0..4 {
            let pool = Arc::clone(&pool);
            handles.push(std::thread::spawn(move || pool.next()));
        }
        let seen: HashSet<String> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(seen.len(), 4);
    }
}
