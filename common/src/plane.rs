use std::ops::{Index, IndexMut};
use std::slice;

/// Row-major 2-D buffer. Coordinates are `(row, col)`, rows outermost,
/// matching the orientation of a decoded raster.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane<T> {
    values: Vec<T>,
    rows: usize,
    cols: usize,
}

impl<T> Plane<T> {
    pub fn new(rows: usize, cols: usize, values: Vec<T>) -> Self {
        assert_eq!(
            values.len(),
            rows * cols,
            "values length must equal rows * cols"
        );
        Self { values, rows, cols }
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> &T {
        debug_assert!(row < self.rows && col < self.cols);
        &self.values[row * self.cols + col]
    }

    #[inline]
    pub fn get_mut(&mut self, row: usize, col: usize) -> &mut T {
        debug_assert!(row < self.rows && col < self.cols);
        &mut self.values[row * self.cols + col]
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    #[inline]
    pub fn into_vec(self) -> Vec<T> {
        self.values
    }

    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.values.iter()
    }

    #[inline]
    pub fn iter_mut(&mut self) -> slice::IterMut<'_, T> {
        self.values.iter_mut()
    }

    /// Iterates one row as a slice.
    #[inline]
    pub fn row(&self, row: usize) -> &[T] {
        debug_assert!(row < self.rows);
        &self.values[row * self.cols..(row + 1) * self.cols]
    }
}

impl<T: Clone> Plane<T> {
    pub fn new_filled(rows: usize, cols: usize, value: T) -> Self {
        Self {
            values: vec![value; rows * cols],
            rows,
            cols,
        }
    }
}

impl Plane<f64> {
    /// Arithmetic mean over the `size x size` block whose top-left corner
    /// is `(row0, col0)`. The block must lie fully inside the plane.
    pub fn block_mean(&self, row0: usize, col0: usize, size: usize) -> f64 {
        assert!(size > 0, "block size must be positive");
        assert!(
            row0 + size <= self.rows && col0 + size <= self.cols,
            "block must lie inside the plane"
        );

        let mut sum = 0.0;
        for r in row0..row0 + size {
            for &v in &self.row(r)[col0..col0 + size] {
                sum += v;
            }
        }
        sum / (size * size) as f64
    }
}

impl<T> Index<(usize, usize)> for Plane<T> {
    type Output = T;

    #[inline]
    fn index(&self, (row, col): (usize, usize)) -> &Self::Output {
        &self.values[row * self.cols + col]
    }
}

impl<T> IndexMut<(usize, usize)> for Plane<T> {
    #[inline]
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut Self::Output {
        &mut self.values[row * self.cols + col]
    }
}

impl<'a, T> IntoIterator for &'a Plane<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl<T> IntoIterator for Plane<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_stores_dimensions() {
        let plane = Plane::new(2, 3, vec![10, 20, 30, 40, 50, 60]);
        assert_eq!(plane.rows(), 2);
        assert_eq!(plane.cols(), 3);
        assert_eq!(plane.len(), 6);
        assert!(!plane.is_empty());
    }

    #[test]
    #[should_panic(expected = "values length must equal rows * cols")]
    fn new_panics_on_size_mismatch() {
        Plane::new(2, 3, vec![1, 2, 3]);
    }

    #[test]
    fn get_is_row_major() {
        // row 0 = [10, 20, 30], row 1 = [40, 50, 60]
        let plane = Plane::new(2, 3, vec![10, 20, 30, 40, 50, 60]);
        assert_eq!(*plane.get(0, 0), 10);
        assert_eq!(*plane.get(0, 2), 30);
        assert_eq!(*plane.get(1, 0), 40);
        assert_eq!(*plane.get(1, 2), 60);
    }

    #[test]
    fn index_tuple() {
        let mut plane = Plane::new(2, 2, vec![1, 2, 3, 4]);
        assert_eq!(plane[(1, 0)], 3);
        plane[(1, 1)] = 77;
        assert_eq!(plane[(1, 1)], 77);
    }

    #[test]
    fn row_slices() {
        let plane = Plane::new(2, 3, vec![10, 20, 30, 40, 50, 60]);
        assert_eq!(plane.row(0), &[10, 20, 30]);
        assert_eq!(plane.row(1), &[40, 50, 60]);
    }

    #[test]
    fn new_filled() {
        let plane = Plane::new_filled(3, 2, 7u8);
        assert_eq!(plane.len(), 6);
        assert!(plane.iter().all(|&v| v == 7));
    }

    #[test]
    fn block_mean_full_plane() {
        let plane = Plane::new(2, 2, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(plane.block_mean(0, 0, 2), 2.5);
    }

    #[test]
    fn block_mean_sub_block() {
        // 4x4 plane, bottom-right 2x2 block holds [11, 12, 15, 16]
        let values: Vec<f64> = (1..=16).map(|v| v as f64).collect();
        let plane = Plane::new(4, 4, values);
        assert_eq!(plane.block_mean(2, 2, 2), 13.5);
    }

    #[test]
    #[should_panic(expected = "block must lie inside the plane")]
    fn block_mean_panics_out_of_bounds() {
        let plane = Plane::new_filled(4, 4, 0.0);
        plane.block_mean(3, 0, 2);
    }

    #[test]
    fn into_vec_round_trip() {
        let values = vec![1.0f64, 2.0, 3.0, 4.0];
        let plane = Plane::new(2, 2, values.clone());
        assert_eq!(plane.into_vec(), values);
    }
}
