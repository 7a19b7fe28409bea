//! Reusable bounded buffer for batched outbound datagrams.

use std::net::SocketAddr;
use thiserror::Error;

/// Most datagrams a connection may produce per send call.
pub const MAX_BATCH_DATAGRAMS: usize = 10;

/// Largest datagram a connection may produce, in bytes.
pub const MAX_DATAGRAM_SIZE: usize = 1500;

/// Errors from pushing into a [`DatagramBatch`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BatchError {
    /// The batch already holds its maximum number of datagrams.
    #[error("datagram batch is full ({0} datagrams)")]
    Full(usize),

    /// A datagram exceeded the per-datagram size limit.
    #[error("datagram of {size} bytes exceeds the {limit}-byte limit")]
    Oversize { size: usize, limit: usize },
}

/// A bounded, reusable buffer a transport connection fills with outbound
/// datagrams, together with the path (dest, src) they travel on.
///
/// The endpoint clears and re-passes the same batch on every send call, so
/// allocations amortize across the run. Both bounds are configuration
/// constants, not algorithmic requirements.
#[derive(Debug)]
pub struct DatagramBatch {
    max_datagrams: usize,
    max_datagram_size: usize,
    path: Option<(SocketAddr, SocketAddr)>,
    datagrams: Vec<Vec<u8>>,
}

impl DatagramBatch {
    /// A batch with the default bounds.
    pub fn new() -> Self {
        Self::with_limits(MAX_BATCH_DATAGRAMS, MAX_DATAGRAM_SIZE)
    }

    pub fn with_limits(max_datagrams: usize, max_datagram_size: usize) -> Self {
        DatagramBatch {
            max_datagrams,
            max_datagram_size,
            path: None,
            datagrams: Vec::with_capacity(max_datagrams),
        }
    }

    /// Set the (dest, src) path for every datagram in the batch.
    pub fn set_path(&mut self, dest: SocketAddr, src: SocketAddr) {
        self.path = Some((dest, src));
    }

    pub fn path(&self) -> Option<(SocketAddr, SocketAddr)> {
        self.path
    }

    /// Append one datagram, enforcing both bounds.
    pub fn push(&mut self, datagram: Vec<u8>) -> Result<(), BatchError> {
        if self.datagrams.len() >= self.max_datagrams {
            return Err(BatchError::Full(self.max_datagrams));
        }
        if datagram.len() > self.max_datagram_size {
            return Err(BatchError::Oversize {
                size: datagram.len(),
                limit: self.max_datagram_size,
            });
        }
        self.datagrams.push(datagram);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.datagrams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datagrams.is_empty()
    }

    /// Datagram slots still available.
    pub fn remaining(&self) -> usize {
        self.max_datagrams - self.datagrams.len()
    }

    pub fn max_datagram_size(&self) -> usize {
        self.max_datagram_size
    }

    /// Drop any buffered datagrams and the path, keeping capacity.
    pub fn clear(&mut self) {
        self.path = None;
        self.datagrams.clear();
    }

    /// Move the buffered datagrams out, leaving the batch empty.
    pub fn drain(&mut self) -> std::vec::Drain<'_, Vec<u8>> {
        self.datagrams.drain(..)
    }
}

impl Default for DatagramBatch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;

    fn addr(port: u16) -> SocketAddr {
        format!("10.0.0.1:{port}").parse().unwrap()
    }

    #[test]
    fn enforces_count_bound() {
        let mut batch = DatagramBatch::with_limits(2, 100);
        batch.push(vec![0; 10]).unwrap();
        batch.push(vec![0; 10]).unwrap();
        assert_eq!(batch.push(vec![0; 10]), Err(BatchError::Full(2)));
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.remaining(), 0);
    }

    #[test]
    fn enforces_size_bound() {
        let mut batch = DatagramBatch::with_limits(4, 100);
        assert_eq!(
            batch.push(vec![0; 101]),
            Err(BatchError::Oversize {
                size: 101,
                limit: 100
            })
        );
        assert!(batch.is_empty());
    }

    #[test]
    fn clear_resets_path_and_contents() {
        let mut batch = DatagramBatch::new();
        batch.set_path(addr(1), addr(2));
        batch.push(vec![1, 2, 3]).unwrap();
        batch.clear();
        assert!(batch.is_empty());
        assert_eq!(batch.path(), None);
    }

    #[test]
    fn drain_moves_datagrams_out() {
        let mut batch = DatagramBatch::new();
        batch.push(vec![1]).unwrap();
        batch.push(vec![2]).unwrap();
        let out: Vec<_> = batch.drain().collect();
        assert_eq!(out, vec![vec![1], vec![2]]);
        assert!(batch.is_empty());
    }
}
