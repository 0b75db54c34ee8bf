use serde_derive::{Deserialize, Serialize};

use crate::bbox::{BBox, Ltwh, Xywh};

/// One batch from the detection pipeline. Person boxes are corner-form,
/// face boxes are center-form as the face network emits them; `similarities`
/// is aligned by index with `faces` and holds distances to the reference
/// identity (lower = more similar).
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct DetectionBatch {
    pub boxes: Vec<BBox<Ltwh>>,
    pub faces: Vec<BBox<Xywh>>,
    pub similarities: Vec<f32>,
}

impl DetectionBatch {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty() && self.faces.is_empty()
    }

    /// Face/similarity pairs, truncated to the shorter of the two arrays.
    /// A mismatched batch is served as the aligned prefix, never an error.
    #[inline]
    pub fn face_pairs(&self) -> impl Iterator<Item = (&BBox<Xywh>, f32)> {
        self.faces.iter().zip(self.similarities.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatched_lengths_zip_to_prefix() {
        let batch = DetectionBatch {
            boxes: vec![],
            faces: vec![
                BBox::xywh(10.0, 10.0, 4.0, 4.0),
                BBox::xywh(20.0, 20.0, 4.0, 4.0),
            ],
            similarities: vec![0.3],
        };

        let pairs: Vec<_> = batch.face_pairs().collect();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].1, 0.3);
    }

    #[test]
    fn empty_batch_is_empty() {
        assert!(DetectionBatch::default().is_empty());
    }
}
