//! Cluster-to-cluster potentially visible sets.

use serde::{Deserialize, Serialize};

use crate::error::{Result, WorldError};

use super::ClusterId;

/// Bytes needed for one row of a PVS with `num_clusters` clusters.
#[inline]
pub fn cluster_bytes(num_clusters: usize) -> usize {
    num_clusters.div_ceil(8)
}

/// A `num_clusters × num_clusters` bit matrix.
///
/// Row `a` starts at byte `a * cluster_bytes`; bit `b % 8` of byte
/// `b / 8` in that row is set when cluster `b` is visible from `a`.
///
/// Deserialization goes through [`PvsTable::from_bytes`], so a stored table
/// always has a buffer matching its cluster count.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "StoredPvs")]
pub struct PvsTable {
    num_clusters: usize,
    cluster_bytes: usize,
    bits: Vec<u8>,
}

/// Unchecked serialized form of [`PvsTable`].
#[derive(Deserialize)]
struct StoredPvs {
    num_clusters: usize,
    cluster_bytes: usize,
    bits: Vec<u8>,
}

impl TryFrom<StoredPvs> for PvsTable {
    type Error = WorldError;

    fn try_from(stored: StoredPvs) -> Result<Self> {
        let stride = cluster_bytes(stored.num_clusters);
        if stored.cluster_bytes != stride {
            return Err(WorldError::PvsSize {
                expected: stored.num_clusters * stride,
                actual: stored.num_clusters * stored.cluster_bytes,
            });
        }
        Self::from_bytes(stored.num_clusters, stored.bits)
    }
}

impl PvsTable {
    /// A table where nothing is visible.
    pub fn new(num_clusters: usize) -> Self {
        let stride = cluster_bytes(num_clusters);
        Self {
            num_clusters,
            cluster_bytes: stride,
            bits: vec![0; num_clusters * stride],
        }
    }

    /// A table where every cluster sees every other cluster.
    ///
    /// Padding bits past `num_clusters` in each row are set too, which keeps
    /// rows byte-identical to a `0xff` fill.
    pub fn all_visible(num_clusters: usize) -> Self {
        let stride = cluster_bytes(num_clusters);
        Self {
            num_clusters,
            cluster_bytes: stride,
            bits: vec![0xff; num_clusters * stride],
        }
    }

    /// Wraps visibility data compiled elsewhere.
    pub fn from_bytes(num_clusters: usize, bits: Vec<u8>) -> Result<Self> {
        let stride = cluster_bytes(num_clusters);
        let expected = num_clusters * stride;
        if bits.len() != expected {
            return Err(WorldError::PvsSize {
                expected,
                actual: bits.len(),
            });
        }
        Ok(Self {
            num_clusters,
            cluster_bytes: stride,
            bits,
        })
    }

    #[inline]
    pub fn num_clusters(&self) -> usize {
        self.num_clusters
    }

    /// Row stride in bytes.
    #[inline]
    pub fn cluster_bytes(&self) -> usize {
        self.cluster_bytes
    }

    /// The whole buffer.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }

    /// The row for `cluster`, or `None` if it is out of range.
    pub fn row(&self, cluster: ClusterId) -> Option<&[u8]> {
        let cluster = cluster as usize;
        if cluster >= self.num_clusters {
            return None;
        }
        let start = cluster * self.cluster_bytes;
        self.bits.get(start..start + self.cluster_bytes)
    }

    /// Returns true if `to` is visible from `from`.
    ///
    /// Out-of-range ids are reported visible so bad ids never hide geometry.
    pub fn is_visible(&self, from: ClusterId, to: ClusterId) -> bool {
        if to as usize >= self.num_clusters {
            return true;
        }
        match self.row(from) {
            Some(row) => row_contains(row, to),
            None => true,
        }
    }

    /// Marks `to` visible from `from`. Out-of-range ids are ignored.
    pub fn set_visible(&mut self, from: ClusterId, to: ClusterId) {
        let (from, to) = (from as usize, to as usize);
        if from >= self.num_clusters || to >= self.num_clusters {
            return;
        }
        if let Some(byte) = self.bits.get_mut(from * self.cluster_bytes + (to >> 3)) {
            *byte |= 1 << (to & 7);
        }
    }

    /// Iterates over the clusters visible from `from`.
    /// Empty if `from` is out of range.
    pub fn visible_from(&self, from: ClusterId) -> impl Iterator<Item = ClusterId> + '_ {
        let row = self.row(from).unwrap_or(&[]);
        (0..self.num_clusters as ClusterId).filter(move |&to| row_contains(row, to))
    }
}

/// Tests bit `cluster` of a single PVS row.
#[inline]
pub fn row_contains(row: &[u8], cluster: ClusterId) -> bool {
    let cluster = cluster as usize;
    row.get(cluster >> 3)
        .is_some_and(|byte| byte & (1 << (cluster & 7)) != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_rounds_up() {
        assert_eq!(cluster_bytes(0), 0);
        assert_eq!(cluster_bytes(1), 1);
        assert_eq!(cluster_bytes(8), 1);
        assert_eq!(cluster_bytes(9), 2);
        assert_eq!(cluster_bytes(17), 3);
    }

    #[test]
    fn all_visible_is_symmetric() {
        let table = PvsTable::all_visible(11);
        assert_eq!(table.as_bytes().len(), 11 * 2);
        for a in 0..11 {
            for b in 0..11 {
                assert!(table.is_visible(a, b));
                assert_eq!(table.is_visible(a, b), table.is_visible(b, a));
            }
        }
    }

    #[test]
    fn out_of_range_fails_open() {
        let table = PvsTable::new(4);
        assert!(!table.is_visible(0, 1));
        assert!(table.is_visible(4, 0));
        assert!(table.is_visible(0, 99));
        assert!(table.row(4).is_none());
        assert_eq!(table.visible_from(7).count(), 0);
    }

    #[test]
    fn set_visible_touches_one_bit() {
        let mut table = PvsTable::new(10);
        table.set_visible(2, 9);

        assert!(table.is_visible(2, 9));
        assert!(!table.is_visible(9, 2));
        assert!(!table.is_visible(2, 8));
        assert_eq!(table.row(2).unwrap(), &[0b0000_0000, 0b0000_0010]);
        assert_eq!(table.visible_from(2).collect::<Vec<_>>(), vec![9]);

        table.set_visible(20, 1);
        assert_eq!(table.as_bytes().iter().map(|b| b.count_ones()).sum::<u32>(), 1);
    }

    #[test]
    fn from_bytes_checks_length() {
        assert!(PvsTable::from_bytes(3, vec![0b101, 0b010, 0b111]).is_ok());
        assert_eq!(
            PvsTable::from_bytes(9, vec![0; 9]),
            Err(WorldError::PvsSize {
                expected: 18,
                actual: 9
            })
        );
    }

    #[test]
    fn visible_from_lists_row() {
        let table = PvsTable::from_bytes(3, vec![0b101, 0b010, 0b111]).unwrap();
        assert_eq!(table.visible_from(0).collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(table.visible_from(1).collect::<Vec<_>>(), vec![1]);
        assert_eq!(table.visible_from(2).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn empty_table() {
        let table = PvsTable::all_visible(0);
        assert!(table.as_bytes().is_empty());
        assert!(table.row(0).is_none());
        assert!(table.is_visible(0, 0));
    }

    #[test]
    fn table_survives_json() {
        let mut table = PvsTable::new(10);
        table.set_visible(3, 7);
        let json = serde_json::to_string(&table).unwrap();
        let restored: PvsTable = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, table);
        assert!(restored.is_visible(3, 7));
    }

    #[test]
    fn short_stored_buffer_is_rejected() {
        let result = serde_json::from_str::<PvsTable>(
            r#"{"num_clusters":4,"cluster_bytes":1,"bits":[]}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn mismatched_stored_stride_is_rejected() {
        let result = serde_json::from_str::<PvsTable>(
            r#"{"num_clusters":2,"cluster_bytes":2,"bits":[1,2,3,4]}"#,
        );
        assert!(result.is_err());
    }
}
