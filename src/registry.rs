use log::debug;
use nalgebra as na;

use crate::bbox::{center_distance, BBox, Ltwh};
use crate::config::TrackerParams;
use crate::detection::DetectionBatch;
use crate::track::Track;

/// Live set of candidate and confirmed-person tracks, with the engines
/// that mutate it: flow propagation, detection association, face binding,
/// reference selection and lifecycle refresh. Owned exclusively by the
/// tracking loop; never touched concurrently.
pub struct Registry {
    params: TrackerParams,
    candidates: Vec<Track>,
    persons: Vec<Track>,
}

impl Registry {
    pub fn new(params: TrackerParams) -> Self {
        Self {
            params,
            candidates: Vec::new(),
            persons: Vec::new(),
        }
    }

    #[inline]
    pub fn persons(&self) -> &[Track] {
        &self.persons
    }

    #[inline]
    pub fn candidates(&self) -> &[Track] {
        &self.candidates
    }

    #[inline]
    pub fn reference(&self) -> Option<&Track> {
        self.persons.iter().find(|p| p.is_reference)
    }

    /// Motion step: propagate every track's box along the flow field local
    /// to it. `old` and `new` are the parallel found-correspondence arrays
    /// of this frame. Runs once per frame, detections or not.
    pub fn step_all(&mut self, old: &[na::Point2<f32>], new: &[na::Point2<f32>]) {
        for cand in &mut self.candidates {
            cand.step(old, new);
        }
        for person in &mut self.persons {
            person.step(old, new);
        }
    }

    /// Consume one detection batch: assign boxes to tracks, bind faces,
    /// re-select the reference person and run the lifecycle refresh, in
    /// exactly that order.
    pub fn associate(&mut self, batch: &DetectionBatch) {
        self.assign_boxes(&batch.boxes);
        self.bind_faces(batch);
        self.select_reference();
        self.refresh();
    }

    /// Greedy, order-dependent assignment: every detection independently
    /// claims the nearest track within `same_person_threshold`, preferring
    /// whichever of the nearest person / nearest candidate is closer, and
    /// spawns a fresh candidate when nothing is near. Distances are
    /// snapshotted per detection before the single mutation is applied.
    fn assign_boxes(&mut self, boxes: &[BBox<Ltwh>]) {
        let thr = self.params.same_person_threshold;

        for bbox in boxes {
            let near_person = nearest_within(&self.persons, bbox, thr);
            let near_cand = nearest_within(&self.candidates, bbox, thr);

            match (near_person, near_cand) {
                (Some((pi, pd)), Some((ci, cd))) => {
                    // Both nearby: the strictly closer one wins, ties go
                    // to the person so an existing identity is kept.
                    if cd < pd {
                        self.hit_candidate(ci, bbox);
                    } else {
                        self.hit_person(pi, bbox);
                    }
                }
                (Some((pi, _)), None) => self.hit_person(pi, bbox),
                (None, Some((ci, _))) => self.hit_candidate(ci, bbox),
                (None, None) => {
                    debug!("unclaimed detection, spawning candidate");
                    self.candidates.push(Track::candidate(*bbox));
                }
            }
        }
    }

    fn hit_person(&mut self, idx: usize, bbox: &BBox<Ltwh>) {
        let person = &mut self.persons[idx];
        person.bbox = *bbox;
        // A confirmed re-detection fully restores liveness.
        person.counter = self.params.patience;
        debug!("detection snapped to person {}", idx);
    }

    fn hit_candidate(&mut self, idx: usize, bbox: &BBox<Ltwh>) {
        let cand = &mut self.candidates[idx];
        cand.bbox = *bbox;
        // A confirmed hit advances promotion faster than one flow-only
        // refresh decays it.
        cand.counter += 2;
        debug!("detection snapped to candidate {}", idx);
    }

    /// Bind detected faces to the persons that spatially contain them,
    /// then age every binding by one cycle, the just-updated ones
    /// included. Candidates never own faces.
    fn bind_faces(&mut self, batch: &DetectionBatch) {
        for (face, sim) in batch.face_pairs() {
            let corner = face.as_ltrb();

            for person in &mut self.persons {
                if corner.inside(&person.bbox.as_ltrb()) {
                    let replace = match &person.face {
                        None => true,
                        Some(f) => face.cy() > f.bbox.cy() + f.bbox.height() / 2.0,
                    };

                    if replace {
                        person.set_face(*face, sim);
                        debug!("face bound, similarity {:.3}", sim);
                    }

                    // A face belongs to at most one person.
                    break;
                }
            }
        }

        for person in &mut self.persons {
            if let Some(face) = &mut person.face {
                face.counter -= 1;
                if face.counter < 0 {
                    person.face = None;
                }
            }
        }
    }

    /// Mark the person whose face is strictly most similar to the
    /// reference identity, provided it clears the similarity threshold.
    /// Stale flags are cleared first so at most one reference ever holds.
    fn select_reference(&mut self) {
        for person in &mut self.persons {
            person.is_reference = false;
        }

        let mut best: Option<(usize, f32)> = None;
        for (idx, person) in self.persons.iter().enumerate() {
            if let Some(face) = &person.face {
                if face.similarity < self.params.ref_similarity_threshold
                    && best.map_or(true, |(_, s)| face.similarity < s)
                {
                    best = Some((idx, face.similarity));
                }
            }
        }

        if let Some((idx, sim)) = best {
            self.persons[idx].is_reference = true;
            debug!("reference person {} (similarity {:.3})", idx, sim);
        }
    }

    /// Lifecycle refresh: candidates with enough accumulated evidence are
    /// promoted (counter capped at patience), everything else ages by one
    /// and is dropped the moment its counter goes negative. Promoted
    /// tracks skip the person aging pass of the cycle they were promoted
    /// in, so a fresh person always starts at exactly `patience`.
    pub fn refresh(&mut self) {
        let patience = self.params.patience;

        let mut kept_candidates = Vec::with_capacity(self.candidates.len());
        let mut promoted = Vec::new();

        for mut cand in self.candidates.drain(..) {
            if cand.counter >= patience {
                cand.promote(patience);
                promoted.push(cand);
            } else {
                cand.counter -= 1;
                if cand.counter >= 0 {
                    kept_candidates.push(cand);
                }
            }
        }
        self.candidates = kept_candidates;

        let mut kept_persons = Vec::with_capacity(self.persons.len() + promoted.len());
        for mut person in self.persons.drain(..) {
            person.counter -= 1;
            if person.counter >= 0 {
                kept_persons.push(person);
            } else {
                // Owned face binding and reference flag go with it.
                debug!("person evicted (reference={})", person.is_reference);
            }
        }
        kept_persons.append(&mut promoted);
        self.persons = kept_persons;
    }
}

fn nearest_within(tracks: &[Track], bbox: &BBox<Ltwh>, thr: f32) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;

    for (idx, track) in tracks.iter().enumerate() {
        let d = center_distance(bbox, &track.bbox);
        if d <= thr && best.map_or(true, |(_, bd)| d < bd) {
            best = Some((idx, d));
        }
    }

    best
}
