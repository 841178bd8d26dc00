use std::sync::Arc;

/// A single histogram: X bin boundaries (or point positions), Y counts, and
/// E errors.
///
/// The X array is held behind an [`Arc`] so that spectra recorded with
/// identical binning share one copy of the bin boundaries instead of
/// duplicating them across thousands of pixels. Sharing is copy-on-write:
/// mutating X through [`Histogram1D::x_mut`] detaches this histogram from the
/// shared array first, leaving every other holder untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Histogram1D {
    x: Arc<Vec<f64>>,
    y: Vec<f64>,
    e: Vec<f64>,
}

impl Histogram1D {
    /// Creates a histogram from explicit X, Y, and E data.
    pub fn new(x: Vec<f64>, y: Vec<f64>, e: Vec<f64>) -> Self {
        Self {
            x: Arc::new(x),
            y,
            e,
        }
    }

    /// Creates a zero-filled histogram with the given X and Y lengths.
    pub fn with_lengths(x_len: usize, y_len: usize) -> Self {
        Self {
            x: Arc::new(vec![0.0; x_len]),
            y: vec![0.0; y_len],
            e: vec![0.0; y_len],
        }
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn e(&self) -> &[f64] {
        &self.e
    }

    /// Mutable access to the X array, detaching it from any sharing first.
    pub fn x_mut(&mut self) -> &mut Vec<f64> {
        Arc::make_mut(&mut self.x)
    }

    pub fn y_mut(&mut self) -> &mut Vec<f64> {
        &mut self.y
    }

    pub fn e_mut(&mut self) -> &mut Vec<f64> {
        &mut self.e
    }

    /// Returns a handle to the shared X array for installing into another
    /// histogram via [`Histogram1D::set_shared_x`].
    pub fn shared_x(&self) -> Arc<Vec<f64>> {
        Arc::clone(&self.x)
    }

    /// Replaces the X array with a shared one.
    pub fn set_shared_x(&mut self, x: Arc<Vec<f64>>) {
        self.x = x;
    }

    /// Whether this histogram and `other` point at the same X allocation.
    pub fn shares_x_with(&self, other: &Histogram1D) -> bool {
        Arc::ptr_eq(&self.x, &other.x)
    }

    /// True when X holds bin boundaries (one more entry than Y) rather than
    /// point positions.
    pub fn is_bin_edges(&self) -> bool {
        self.x.len() == self.y.len() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_lengths_zero_fills_all_arrays() {
        let h = Histogram1D::with_lengths(11, 10);
        assert_eq!(h.x().len(), 11);
        assert_eq!(h.y().len(), 10);
        assert_eq!(h.e().len(), 10);
        assert!(h.x().iter().all(|&v| v == 0.0));
        assert!(h.is_bin_edges());
    }

    #[test]
    fn shared_x_is_a_single_allocation() {
        let mut a = Histogram1D::new(vec![0.0, 1.0, 2.0], vec![5.0, 5.0], vec![1.0, 1.0]);
        let mut b = Histogram1D::with_lengths(3, 2);

        b.set_shared_x(a.shared_x());
        assert!(a.shares_x_with(&b));
        assert_eq!(b.x(), &[0.0, 1.0, 2.0]);

        // Mutating Y never touches the shared X.
        a.y_mut()[0] = 9.0;
        assert!(a.shares_x_with(&b));
    }

    #[test]
    fn mutating_x_detaches_from_the_shared_array() {
        let a = Histogram1D::new(vec![0.0, 1.0, 2.0], vec![0.0, 0.0], vec![0.0, 0.0]);
        let mut b = Histogram1D::with_lengths(3, 2);
        b.set_shared_x(a.shared_x());

        b.x_mut()[0] = -1.0;

        assert!(!a.shares_x_with(&b));
        assert_eq!(a.x()[0], 0.0);
        assert_eq!(b.x()[0], -1.0);
    }
}
