use std::fmt;

/// Axis-aligned bounding box, expressed in the axis order of whatever
/// reference system it is paired with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// A box is empty when its ordinates are inverted, e.g. after an
    /// intersection of disjoint boxes.
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    /// Smallest box covering both `self` and `other`.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Overlap of `self` and `other`; the result may be empty.
    pub fn intersection(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min_x: self.min_x.max(other.min_x),
            min_y: self.min_y.max(other.min_y),
            max_x: self.max_x.min(other.max_x),
            max_y: self.max_y.min(other.max_y),
        }
    }

    /// The same box with X and Y ordinates swapped.
    pub fn flipped_xy(&self) -> BoundingBox {
        BoundingBox {
            min_x: self.min_y,
            min_y: self.min_x,
            max_x: self.max_y,
            max_y: self.max_x,
        }
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

#[cfg(test)]
mod tests {
    use super::BoundingBox;

    #[test]
    fn union_covers_both_boxes() {
        let a = BoundingBox::new(0.0, 0.0, 2.0, 2.0);
        let b = BoundingBox::new(1.0, -1.0, 4.0, 1.0);
        assert_eq!(a.union(&b), BoundingBox::new(0.0, -1.0, 4.0, 2.0));
    }

    #[test]
    fn intersection_clips_to_overlap() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 5.0, 20.0, 20.0);
        assert_eq!(a.intersection(&b), BoundingBox::new(5.0, 5.0, 10.0, 10.0));
    }

    #[test]
    fn intersection_of_disjoint_boxes_is_empty() {
        let a = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let b = BoundingBox::new(2.0, 2.0, 3.0, 3.0);
        assert!(a.intersection(&b).is_empty());
        assert!(!a.is_empty());
    }

    #[test]
    fn flipped_xy_swaps_ordinates() {
        let a = BoundingBox::new(-120.0, 30.0, -110.0, 40.0);
        assert_eq!(a.flipped_xy(), BoundingBox::new(30.0, -120.0, 40.0, -110.0));
        assert_eq!(a.flipped_xy().flipped_xy(), a);
    }
}
