use nalgebra as na;
use serde::{Deserialize, Serialize};
use serde_derive::{Deserialize, Serialize};
use std::marker::PhantomData;

pub trait BBoxFormat: std::fmt::Debug {}

/// Left-top-width-height format, contains left top corner and width-height
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct Ltwh;
impl BBoxFormat for Ltwh {}

/// Left-top-right-bottom format, contains left top and right bottom corners
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct Ltrb;
impl BBoxFormat for Ltrb {}

/// X-y-width-height format, contains coordinates of the center of bbox and width-height
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct Xywh;
impl BBoxFormat for Xywh {}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct BBox<F: BBoxFormat + Serialize + Deserialize<'static> + PartialEq>(
    [f32; 4],
    PhantomData<F>,
);

impl<F: BBoxFormat + Serialize + Deserialize<'static> + PartialEq> From<BBox<F>> for [f32; 4] {
    fn from(bbox: BBox<F>) -> Self {
        bbox.0
    }
}

impl<F: BBoxFormat + Serialize + Deserialize<'static> + PartialEq> BBox<F> {
    #[inline]
    pub fn as_slice(&self) -> &[f32; 4] {
        &self.0
    }
}

impl BBox<Ltwh> {
    #[inline]
    pub fn ltwh(x1: f32, x2: f32, x3: f32, x4: f32) -> Self {
        BBox([x1, x2, x3, x4], Default::default())
    }

    #[inline(always)]
    pub fn left(&self) -> f32 {
        self.0[0]
    }

    #[inline(always)]
    pub fn top(&self) -> f32 {
        self.0[1]
    }

    #[inline(always)]
    pub fn width(&self) -> f32 {
        self.0[2]
    }

    #[inline(always)]
    pub fn height(&self) -> f32 {
        self.0[3]
    }

    #[inline]
    pub fn center(&self) -> na::Point2<f32> {
        na::Point2::new(self.0[0] + self.0[2] / 2.0, self.0[1] + self.0[3] / 2.0)
    }

    /// Whether the point lies inside the box grown by `margin` on every side.
    #[inline]
    pub fn contains_point(&self, p: na::Point2<f32>, margin: f32) -> bool {
        p.x >= self.0[0] - margin
            && p.x <= self.0[0] + self.0[2] + margin
            && p.y >= self.0[1] - margin
            && p.y <= self.0[1] + self.0[3] + margin
    }

    #[inline]
    pub fn translate(&mut self, d: na::Vector2<f32>) {
        self.0[0] += d.x;
        self.0[1] += d.y;
    }

    #[inline]
    pub fn as_ltrb(&self) -> BBox<Ltrb> {
        self.into()
    }
}

impl BBox<Ltrb> {
    #[inline]
    pub fn ltrb(x1: f32, x2: f32, x3: f32, x4: f32) -> Self {
        BBox([x1, x2, x3, x4], Default::default())
    }

    #[inline(always)]
    pub fn left(&self) -> f32 {
        self.0[0]
    }

    #[inline(always)]
    pub fn top(&self) -> f32 {
        self.0[1]
    }

    #[inline(always)]
    pub fn right(&self) -> f32 {
        self.0[2]
    }

    #[inline(always)]
    pub fn bottom(&self) -> f32 {
        self.0[3]
    }

    /// Full containment: every corner of `self` lies inside `other`.
    #[inline]
    pub fn inside(&self, other: &BBox<Ltrb>) -> bool {
        self.0[0] >= other.0[0]
            && self.0[1] >= other.0[1]
            && self.0[2] <= other.0[2]
            && self.0[3] <= other.0[3]
    }

    #[inline]
    pub fn as_ltwh(&self) -> BBox<Ltwh> {
        self.into()
    }
}

impl BBox<Xywh> {
    #[inline]
    pub fn xywh(x1: f32, x2: f32, x3: f32, x4: f32) -> Self {
        BBox([x1, x2, x3, x4], Default::default())
    }

    #[inline(always)]
    pub fn cx(&self) -> f32 {
        self.0[0]
    }

    #[inline(always)]
    pub fn cy(&self) -> f32 {
        self.0[1]
    }

    #[inline(always)]
    pub fn width(&self) -> f32 {
        self.0[2]
    }

    #[inline(always)]
    pub fn height(&self) -> f32 {
        self.0[3]
    }

    #[inline]
    pub fn as_ltrb(&self) -> BBox<Ltrb> {
        self.into()
    }
}

impl<'a> From<&'a BBox<Ltwh>> for BBox<Ltrb> {
    #[inline]
    fn from(v: &'a BBox<Ltwh>) -> Self {
        Self(
            [v.0[0], v.0[1], v.0[2] + v.0[0], v.0[3] + v.0[1]],
            Default::default(),
        )
    }
}

impl<'a> From<&'a BBox<Ltrb>> for BBox<Ltwh> {
    #[inline]
    fn from(v: &'a BBox<Ltrb>) -> Self {
        Self(
            [v.0[0], v.0[1], v.0[2] - v.0[0], v.0[3] - v.0[1]],
            Default::default(),
        )
    }
}

impl<'a> From<&'a BBox<Xywh>> for BBox<Ltrb> {
    #[inline]
    fn from(v: &'a BBox<Xywh>) -> Self {
        Self(
            [
                v.0[0] - v.0[2] / 2.0,
                v.0[1] - v.0[3] / 2.0,
                v.0[0] + v.0[2] / 2.0,
                v.0[1] + v.0[3] / 2.0,
            ],
            Default::default(),
        )
    }
}

impl<'a> From<&'a BBox<Xywh>> for BBox<Ltwh> {
    #[inline]
    fn from(v: &'a BBox<Xywh>) -> Self {
        Self(
            [v.0[0] - v.0[2] / 2.0, v.0[1] - v.0[3] / 2.0, v.0[2], v.0[3]],
            Default::default(),
        )
    }
}

/// Symmetric center-to-center distance in pixels. Association thresholds
/// (`same_person_threshold`) are expressed in the same units.
#[inline]
pub fn center_distance(a: &BBox<Ltwh>, b: &BBox<Ltwh>) -> f32 {
    na::distance(&a.center(), &b.center())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra as na;

    #[test]
    fn ltwh_ltrb_round_trip() {
        let b = BBox::ltwh(10.0, 20.0, 30.0, 40.0);
        let r = b.as_ltrb();
        assert_eq!(r, BBox::ltrb(10.0, 20.0, 40.0, 60.0));
        assert_eq!(r.as_ltwh(), b);
    }

    #[test]
    fn center_form_to_corner_form() {
        let f = BBox::xywh(50.0, 50.0, 20.0, 10.0);
        assert_eq!(f.as_ltrb(), BBox::ltrb(40.0, 45.0, 60.0, 55.0));
    }

    #[test]
    fn containment_is_full_not_overlap() {
        let person = BBox::ltwh(10.0, 10.0, 100.0, 200.0).as_ltrb();
        let inside = BBox::ltrb(20.0, 20.0, 60.0, 60.0);
        let overlapping = BBox::ltrb(5.0, 20.0, 60.0, 60.0);
        assert!(inside.inside(&person));
        assert!(!overlapping.inside(&person));
    }

    #[test]
    fn point_containment_with_margin() {
        let b = BBox::ltwh(0.0, 0.0, 10.0, 10.0);
        assert!(b.contains_point(na::Point2::new(5.0, 5.0), 0.0));
        assert!(!b.contains_point(na::Point2::new(12.0, 5.0), 0.0));
        assert!(b.contains_point(na::Point2::new(12.0, 5.0), 4.0));
    }

    #[test]
    fn distance_is_between_centers() {
        let a = BBox::ltwh(0.0, 0.0, 10.0, 10.0);
        let b = BBox::ltwh(3.0, 4.0, 10.0, 10.0);
        assert!((center_distance(&a, &b) - 5.0).abs() < 1e-6);
    }
}
