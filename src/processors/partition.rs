//! Label partitions and the combination enumerator shared by the generators.

/// Points grouped by cluster label.
///
/// An arena of clusters indexed `0..L`; each cluster holds point indices in
/// input order. Labels that received no points are kept as empty clusters so
/// the label set matches what the generator produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelPartition {
    clusters: Vec<Vec<usize>>,
}

impl LabelPartition {
    /// Build a partition from one label per point. `label_count` must exceed
    /// every label; labels in `0..label_count` without points stay empty.
    pub fn from_labels(labels: &[usize], label_count: usize) -> Self {
        let mut clusters = vec![Vec::new(); label_count];
        for (point, &label) in labels.iter().enumerate() {
            clusters[label].push(point);
        }
        Self { clusters }
    }

    /// Build a partition from DBSCAN-style labels, where `-1` marks noise.
    ///
    /// Returns the number of noise points as the error when any exist.
    pub fn from_dense_labels(labels: &[i32]) -> Result<Self, usize> {
        let noise = labels.iter().filter(|&&l| l < 0).count();
        if noise > 0 {
            return Err(noise);
        }
        let unsigned: Vec<usize> = labels.iter().map(|&l| l as usize).collect();
        let label_count = unsigned.iter().copied().max().map_or(0, |m| m + 1);
        Ok(Self::from_labels(&unsigned, label_count))
    }

    /// Number of labels `L`.
    #[inline]
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Point indices assigned to `label`.
    #[inline]
    pub fn members(&self, label: usize) -> &[usize] {
        &self.clusters[label]
    }

    pub fn iter(&self) -> impl Iterator<Item = &[usize]> {
        self.clusters.iter().map(Vec::as_slice)
    }
}

/// Lexicographic `k`-combinations of `0..n`.
#[derive(Debug, Clone)]
pub struct Combinations {
    n: usize,
    indices: Vec<usize>,
    started: bool,
    done: bool,
}

impl Combinations {
    pub fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            indices: (0..k).collect(),
            started: false,
            done: k > n,
        }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(self.indices.clone());
        }

        let k = self.indices.len();
        // Rightmost slot that can still move forward
        let mut i = k;
        while i > 0 {
            i -= 1;
            if self.indices[i] != i + self.n - k {
                self.indices[i] += 1;
                for j in i + 1..k {
                    self.indices[j] = self.indices[j - 1] + 1;
                }
                return Some(self.indices.clone());
            }
        }

        self.done = true;
        None
    }
}

/// Binomial coefficient `C(n, k)`, saturating at `u64::MAX`.
pub fn binomial(n: usize, k: usize) -> u64 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut acc: u128 = 1;
    for i in 0..k {
        acc = acc * (n - i) as u128 / (i + 1) as u128;
        if acc > u64::MAX as u128 {
            return u64::MAX;
        }
    }
    acc as u64
}
