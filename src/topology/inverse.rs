//! CSR inverse of a row table: for every target value, the rows that hold it.
//!
//! Used both for node → element lookups on an [`ElementTable`] and for
//! entity → element lookups on an [`IncidenceTable`].
//!
//! [`ElementTable`]: crate::data::elements::ElementTable
//! [`IncidenceTable`]: crate::algs::entities::IncidenceTable

/// CSR-style inverse index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InverseIndex {
    /// CSR offsets into `owners` for each target.
    pub xadj: Vec<usize>,
    /// Owning row numbers, ascending within each target, without repeats.
    pub owners: Vec<usize>,
}

impl InverseIndex {
    /// Invert `rows` (each of width `width`, flattened in `data`) whose values
    /// lie in `0..ntargets`.
    ///
    /// A row holding the same value twice is listed once for that value.
    pub fn build(data: &[usize], width: usize, ntargets: usize) -> Self {
        let mut counts = vec![0usize; ntargets + 1];
        if width > 0 {
            for row in data.chunks_exact(width) {
                for (k, &v) in row.iter().enumerate() {
                    if !row[..k].contains(&v) {
                        counts[v + 1] += 1;
                    }
                }
            }
        }
        for i in 0..ntargets {
            counts[i + 1] += counts[i];
        }
        let xadj = counts;
        let mut fill = xadj.clone();
        let mut owners = vec![0usize; xadj[ntargets]];
        if width > 0 {
            for (r, row) in data.chunks_exact(width).enumerate() {
                for (k, &v) in row.iter().enumerate() {
                    if !row[..k].contains(&v) {
                        owners[fill[v]] = r;
                        fill[v] += 1;
                    }
                }
            }
        }
        Self { xadj, owners }
    }

    /// Number of targets.
    #[inline]
    pub fn len(&self) -> usize {
        self.xadj.len().saturating_sub(1)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rows owning target `t`.
    #[inline]
    pub fn owners(&self, t: usize) -> &[usize] {
        &self.owners[self.xadj[t]..self.xadj[t + 1]]
    }

    /// Number of rows owning target `t`.
    #[inline]
    pub fn count(&self, t: usize) -> usize {
        self.xadj[t + 1] - self.xadj[t]
    }

    /// Owner counts for all targets.
    pub fn counts(&self) -> Vec<usize> {
        self.xadj.windows(2).map(|w| w[1] - w[0]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverse_of_small_table() {
        // [[0,1,2],[0,1,4],[0,4,2]]
        let inv = InverseIndex::build(&[0, 1, 2, 0, 1, 4, 0, 4, 2], 3, 5);
        assert_eq!(inv.owners(0), &[0, 1, 2]);
        assert_eq!(inv.owners(1), &[0, 1]);
        assert_eq!(inv.owners(2), &[0, 2]);
        assert!(inv.owners(3).is_empty());
        assert_eq!(inv.owners(4), &[1, 2]);
        assert_eq!(inv.counts(), vec![3, 2, 2, 0, 2]);
    }

    #[test]
    fn repeated_value_in_row_counted_once() {
        let inv = InverseIndex::build(&[0, 1, 1], 3, 2);
        assert_eq!(inv.owners(1), &[0]);
    }

    #[test]
    fn empty_table() {
        let inv = InverseIndex::build(&[], 3, 0);
        assert!(inv.is_empty());
        assert_eq!(inv.xadj, vec![0]);
    }
}
