//! Grouping decoded joints into per-person skeletons.
//!
//! Greedy, seed-anchored clustering: the lowest unclaimed joint id opens a
//! skeleton and every remaining unclaimed joint within the proximity box of
//! that SEED joins it. Membership is decided against the seed only, never
//! against members added later, so two joints close to each other can still
//! land in different skeletons. The non-transitivity is intentional;
//! union-find grouping would be the alternative policy.

use crate::heatmap::DecodedJoints;
use crate::skeleton::{BodyPart, Point, Skeleton};

/// Partition one frame's decoded joints into candidate person skeletons.
///
/// Scan order is ascending joint id for both seed selection and membership,
/// which makes the output deterministic for a given input.
pub fn cluster_persons(joints: &DecodedJoints, proximity: f32) -> Vec<Skeleton> {
    let mut persons = Vec::new();
    let mut claimed = [false; BodyPart::NAMED_COUNT];

    for seed_id in 0..BodyPart::NAMED_COUNT {
        let Some(seed) = joints[seed_id] else {
            continue;
        };
        if claimed[seed_id] {
            continue;
        }

        let mut person = Skeleton::new();
        person.set(seed.part, Point::new(seed.x, seed.y));
        claimed[seed_id] = true;

        for other_id in 0..BodyPart::NAMED_COUNT {
            let Some(other) = joints[other_id] else {
                continue;
            };
            if claimed[other_id] {
                continue;
            }
            if (other.x - seed.x).abs() < proximity && (other.y - seed.y).abs() < proximity {
                person.set(other.part, Point::new(other.x, other.y));
                claimed[other_id] = true;
            }
        }

        persons.push(person);
    }

    persons
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heatmap::JointDetection;

    fn detection(id: usize, x: f32, y: f32) -> Option<JointDetection> {
        Some(JointDetection {
            part: BodyPart::from_id(id).unwrap(),
            x,
            y,
            confidence: 0.9,
        })
    }

    #[test]
    fn empty_input_yields_no_persons() {
        let joints: DecodedJoints = Default::default();
        assert!(cluster_persons(&joints, 100.0).is_empty());
    }

    #[test]
    fn close_joints_form_one_person() {
        let mut joints: DecodedJoints = Default::default();
        joints[BodyPart::Nose as usize] = detection(0, 100.0, 100.0);
        joints[BodyPart::Neck as usize] = detection(1, 110.0, 150.0);
        joints[BodyPart::RHip as usize] = detection(8, 90.0, 180.0);

        let persons = cluster_persons(&joints, 100.0);
        assert_eq!(persons.len(), 1);
        assert_eq!(persons[0].len(), 3);
    }

    #[test]
    fn distant_groups_split_into_two_persons() {
        let mut joints: DecodedJoints = Default::default();
        joints[BodyPart::Nose as usize] = detection(0, 100.0, 100.0);
        joints[BodyPart::Neck as usize] = detection(1, 120.0, 140.0);
        joints[BodyPart::RShoulder as usize] = detection(2, 400.0, 100.0);
        joints[BodyPart::RElbow as usize] = detection(3, 420.0, 150.0);

        let persons = cluster_persons(&joints, 100.0);
        assert_eq!(persons.len(), 2);
        assert!(persons[0].contains(BodyPart::Nose));
        assert!(persons[0].contains(BodyPart::Neck));
        assert!(persons[1].contains(BodyPart::RShoulder));
        assert!(persons[1].contains(BodyPart::RElbow));
    }

    #[test]
    fn every_detection_is_claimed_exactly_once() {
        let mut joints: DecodedJoints = Default::default();
        for id in 0..BodyPart::NAMED_COUNT {
            joints[id] = detection(id, (id as f32) * 60.0, 100.0);
        }

        let persons = cluster_persons(&joints, 100.0);
        let total: usize = persons.iter().map(|p| p.len()).sum();
        assert_eq!(total, BodyPart::NAMED_COUNT);
    }

    #[test]
    fn membership_is_seed_anchored_not_transitive() {
        // Nose seeds the first person. Neck is within 100 of Nose, RShoulder
        // is within 100 of Neck but NOT of Nose, so RShoulder must open its
        // own skeleton even though a chain connects it.
        let mut joints: DecodedJoints = Default::default();
        joints[BodyPart::Nose as usize] = detection(0, 0.0, 0.0);
        joints[BodyPart::Neck as usize] = detection(1, 90.0, 0.0);
        joints[BodyPart::RShoulder as usize] = detection(2, 170.0, 0.0);

        let persons = cluster_persons(&joints, 100.0);
        assert_eq!(persons.len(), 2);
        assert!(persons[0].contains(BodyPart::Nose));
        assert!(persons[0].contains(BodyPart::Neck));
        assert!(!persons[0].contains(BodyPart::RShoulder));
        assert!(persons[1].contains(BodyPart::RShoulder));
    }

    #[test]
    fn proximity_test_is_per_axis_not_euclidean() {
        // dx=99, dy=99: inside the box even though the euclidean distance
        // exceeds 100.
        let mut joints: DecodedJoints = Default::default();
        joints[BodyPart::Nose as usize] = detection(0, 0.0, 0.0);
        joints[BodyPart::Neck as usize] = detection(1, 99.0, 99.0);

        let persons = cluster_persons(&joints, 100.0);
        assert_eq!(persons.len(), 1);
        assert_eq!(persons[0].len(), 2);
    }
}
