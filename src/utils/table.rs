/*!
# Dynamic 2-D Tables

This module provides a fixed-column, growable-row 2-D array stored **row-major** in a
single contiguous buffer, so that a whole row can be handed out as a slice.

The transition function of a word graph and its two source tables are all instances of
`DynamicTable<Option<Node>>`: rows are nodes, columns are labels, and `None` marks an
absent entry.

### Invariants

1. `data.len() == num_rows * num_cols`
2. Row `r` occupies `data[r * num_cols .. (r + 1) * num_cols]`

These invariants are established by every constructor and growth operation, which allows
plain slicing without further arithmetic checks.
*/

/// A row-major 2-D array with a fixed number of columns and a growable number of rows.
///
/// New cells created by [`DynamicTable::add_rows`] and [`DynamicTable::add_cols`] are
/// initialised with a caller-supplied fill value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicTable<T> {
    num_rows: usize,
    num_cols: usize,
    data: Vec<T>,
}

impl<T: Copy> DynamicTable<T> {
    /// Creates a new table of `rows * cols` cells, all holding `fill`.
    ///
    /// # Examples
    /// ```
    /// use wgraphs::utils::DynamicTable;
    ///
    /// let table = DynamicTable::new(3, 2, 0u32);
    /// assert_eq!(table.number_of_rows(), 3);
    /// assert_eq!(table.number_of_cols(), 2);
    /// assert_eq!(table.get(2, 1), 0);
    /// ```
    pub fn new(rows: usize, cols: usize, fill: T) -> Self {
        Self {
            num_rows: rows,
            num_cols: cols,
            data: vec![fill; rows * cols],
        }
    }

    /// Returns the number of rows.
    #[inline(always)]
    pub fn number_of_rows(&self) -> usize {
        self.num_rows
    }

    /// Returns the number of columns.
    #[inline(always)]
    pub fn number_of_cols(&self) -> usize {
        self.num_cols
    }

    /// Returns the cell `(r, c)`.
    ///
    /// **Panics if `r >= number_of_rows()` or `c >= number_of_cols()`.**
    #[inline(always)]
    pub fn get(&self, r: usize, c: usize) -> T {
        assert!(c < self.num_cols);
        self.data[r * self.num_cols + c]
    }

    /// Sets the cell `(r, c)` to `v`.
    ///
    /// **Panics if `r >= number_of_rows()` or `c >= number_of_cols()`.**
    #[inline(always)]
    pub fn set(&mut self, r: usize, c: usize, v: T) {
        assert!(c < self.num_cols);
        self.data[r * self.num_cols + c] = v;
    }

    /// Returns row `r` as a contiguous slice of length `number_of_cols()`.
    ///
    /// **Panics if `r >= number_of_rows()`.**
    ///
    /// # Examples
    /// ```
    /// use wgraphs::utils::DynamicTable;
    ///
    /// let mut table = DynamicTable::new(2, 3, 0u32);
    /// table.set(1, 2, 7);
    /// assert_eq!(table.row(1), &[0, 0, 7]);
    /// ```
    #[inline(always)]
    pub fn row(&self, r: usize) -> &[T] {
        &self.data[r * self.num_cols..(r + 1) * self.num_cols]
    }

    /// Overwrites every cell of row `r` with `v`.
    ///
    /// **Panics if `r >= number_of_rows()`.**
    pub fn fill_row(&mut self, r: usize, v: T) {
        self.data[r * self.num_cols..(r + 1) * self.num_cols].fill(v);
    }

    /// Appends `k` rows whose cells all hold `fill`.
    pub fn add_rows(&mut self, k: usize, fill: T) {
        self.num_rows += k;
        self.data.resize(self.num_rows * self.num_cols, fill);
    }

    /// Appends `k` columns whose cells all hold `fill`.
    ///
    /// Unlike row growth this re-lays-out the whole buffer, as the storage is row-major.
    pub fn add_cols(&mut self, k: usize, fill: T) {
        if k == 0 {
            return;
        }
        let new_cols = self.num_cols + k;
        let mut data = Vec::with_capacity(self.num_rows * new_cols);
        for r in 0..self.num_rows {
            data.extend_from_slice(self.row(r));
            data.resize((r + 1) * new_cols, fill);
        }
        self.num_cols = new_cols;
        self.data = data;
    }

    /// Drops all rows with index `>= k`.
    ///
    /// **Panics if `k > number_of_rows()`.**
    pub fn shrink_rows_to(&mut self, k: usize) {
        assert!(k <= self.num_rows);
        self.num_rows = k;
        self.data.truncate(k * self.num_cols);
    }

    /// Exchanges the contents of rows `a` and `b`.
    ///
    /// **Panics if `a == b` or either index is out of range.**
    ///
    /// # Examples
    /// ```
    /// use wgraphs::utils::DynamicTable;
    ///
    /// let mut table = DynamicTable::new(2, 2, 0u32);
    /// table.set(0, 0, 1);
    /// table.swap_rows(0, 1);
    /// assert_eq!(table.row(1), &[1, 0]);
    /// assert_eq!(table.row(0), &[0, 0]);
    /// ```
    pub fn swap_rows(&mut self, a: usize, b: usize) {
        assert_ne!(a, b);
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };

        let (beg, end) = self.data.split_at_mut(hi * self.num_cols);
        beg[lo * self.num_cols..(lo + 1) * self.num_cols]
            .swap_with_slice(&mut end[..self.num_cols]);
    }
}
