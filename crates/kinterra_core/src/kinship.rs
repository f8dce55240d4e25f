use crate::bitset::Pid;

/// Family-size bookkeeping over the host-visible kinship matrix.
///
/// The matrix itself lives in the shared buffers (`N*N` bytes, row-major);
/// this engine owns only the derived family-size vectors. Rows and columns
/// are rewritten when a slot is born and deliberately left intact on death,
/// so the reward pass can still attribute a final reward to a slot that was
/// terminated this tick.
#[derive(Debug, Clone)]
pub struct KinshipEngine {
    capacity: usize,
    n_genes: usize,
    family_size: Vec<u32>,
    prev_family_size: Vec<u32>,
}

impl KinshipEngine {
    #[must_use]
    pub fn new(capacity: usize, n_genes: usize) -> Self {
        Self {
            capacity,
            n_genes,
            family_size: vec![0; capacity],
            prev_family_size: vec![0; capacity],
        }
    }

    /// Zeroes the matrix and pins every diagonal cell to the gene count.
    pub fn reset(&mut self, matrix: &mut [u8]) {
        matrix.fill(0);
        for pid in 0..self.capacity {
            matrix[pid * self.capacity + pid] = self.n_genes as u8;
        }
        self.family_size.fill(0);
        self.prev_family_size.fill(0);
    }

    #[must_use]
    pub fn kinship(&self, matrix: &[u8], a: Pid, b: Pid) -> u8 {
        matrix[a * self.capacity + b]
    }

    /// Fills the row and column of a freshly-born slot against every alive
    /// peer and seeds its previous family size with its birth family.
    ///
    /// Iterates the alive mask rather than the cached alive list: the
    /// newborn is already masked in while the list is refreshed only at
    /// tick end.
    pub fn record_birth(&mut self, pid: Pid, alive_mask: &[u8], dnas: &[u8], matrix: &mut [u8]) {
        let n = self.capacity;
        let genes = self.n_genes;
        matrix[pid * n + pid] = genes as u8;
        let mut family = genes as u32;
        for (q, &mask) in alive_mask.iter().enumerate() {
            if mask == 0 || q == pid {
                continue;
            }
            let mut shared = 0u8;
            for g in 0..genes {
                if dnas[pid * genes + g] == dnas[q * genes + g] {
                    shared += 1;
                }
            }
            matrix[pid * n + q] = shared;
            matrix[q * n + pid] = shared;
            family += u32::from(shared);
        }
        self.prev_family_size[pid] = family;
        self.family_size[pid] = family;
    }

    /// Recomputes the family size of every slot in `targets` as the sum of
    /// its kinship to the current alive list. Terminated slots passed in
    /// `targets` still sum over their last-written rows.
    pub fn compute_family_sizes(&mut self, targets: &[Pid], alive: &[Pid], matrix: &[u8]) {
        for &pid in targets {
            let row = &matrix[pid * self.capacity..(pid + 1) * self.capacity];
            self.family_size[pid] = alive.iter().map(|&q| u32::from(row[q])).sum();
        }
    }

    #[must_use]
    pub fn family_size(&self, pid: Pid) -> u32 {
        self.family_size[pid]
    }

    #[must_use]
    pub fn prev_family_size(&self, pid: Pid) -> u32 {
        self.prev_family_size[pid]
    }

    /// Rolls the computed family sizes into the previous-tick baseline.
    pub fn commit_family_sizes(&mut self, targets: &[Pid]) {
        for &pid in targets {
            self.prev_family_size[pid] = self.family_size[pid];
        }
    }
}
