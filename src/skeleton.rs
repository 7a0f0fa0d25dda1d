//! Body topology tables and per-frame skeletons.
//!
//! The joint id table and the bone table mirror the output layout of the
//! OpenPose-style graph the estimator runs: 18 named joints plus a trailing
//! background channel. Ids are fixed by the model and must not be reordered.

/// Named body parts, id-aligned to the estimator's heatmap channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum BodyPart {
    Nose = 0,
    Neck = 1,
    RShoulder = 2,
    RElbow = 3,
    RWrist = 4,
    LShoulder = 5,
    LElbow = 6,
    LWrist = 7,
    RHip = 8,
    RKnee = 9,
    RAnkle = 10,
    LHip = 11,
    LKnee = 12,
    LAnkle = 13,
    REye = 14,
    LEye = 15,
    REar = 16,
    LEar = 17,
    /// Model output carries a background channel after the named joints.
    /// It is never part of a skeleton.
    Background = 18,
}

impl BodyPart {
    /// Number of named joints (background excluded).
    pub const NAMED_COUNT: usize = 18;

    pub fn from_id(id: usize) -> Option<Self> {
        match id {
            0 => Some(Self::Nose),
            1 => Some(Self::Neck),
            2 => Some(Self::RShoulder),
            3 => Some(Self::RElbow),
            4 => Some(Self::RWrist),
            5 => Some(Self::LShoulder),
            6 => Some(Self::LElbow),
            7 => Some(Self::LWrist),
            8 => Some(Self::RHip),
            9 => Some(Self::RKnee),
            10 => Some(Self::RAnkle),
            11 => Some(Self::LHip),
            12 => Some(Self::LKnee),
            13 => Some(Self::LAnkle),
            14 => Some(Self::REye),
            15 => Some(Self::LEye),
            16 => Some(Self::REar),
            17 => Some(Self::LEar),
            18 => Some(Self::Background),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Nose => "Nose",
            Self::Neck => "Neck",
            Self::RShoulder => "RShoulder",
            Self::RElbow => "RElbow",
            Self::RWrist => "RWrist",
            Self::LShoulder => "LShoulder",
            Self::LElbow => "LElbow",
            Self::LWrist => "LWrist",
            Self::RHip => "RHip",
            Self::RKnee => "RKnee",
            Self::RAnkle => "RAnkle",
            Self::LHip => "LHip",
            Self::LKnee => "LKnee",
            Self::LAnkle => "LAnkle",
            Self::REye => "REye",
            Self::LEye => "LEye",
            Self::REar => "REar",
            Self::LEar => "LEar",
            Self::Background => "Background",
        }
    }
}

/// Joint pairs connected for rendering and fall geometry.
///
/// Order matches the upstream pose-pair table; renderers draw a bone only
/// when both endpoints are present in the skeleton.
pub const BONES: [(BodyPart, BodyPart); 17] = [
    (BodyPart::Neck, BodyPart::RShoulder),
    (BodyPart::Neck, BodyPart::LShoulder),
    (BodyPart::RShoulder, BodyPart::RElbow),
    (BodyPart::RElbow, BodyPart::RWrist),
    (BodyPart::LShoulder, BodyPart::LElbow),
    (BodyPart::LElbow, BodyPart::LWrist),
    (BodyPart::Neck, BodyPart::RHip),
    (BodyPart::RHip, BodyPart::RKnee),
    (BodyPart::RKnee, BodyPart::RAnkle),
    (BodyPart::Neck, BodyPart::LHip),
    (BodyPart::LHip, BodyPart::LKnee),
    (BodyPart::LKnee, BodyPart::LAnkle),
    (BodyPart::Neck, BodyPart::Nose),
    (BodyPart::Nose, BodyPart::REye),
    (BodyPart::REye, BodyPart::REar),
    (BodyPart::Nose, BodyPart::LEye),
    (BodyPart::LEye, BodyPart::LEar),
];

/// A point in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// One person's joints for a single frame.
///
/// Fixed-size, indexed by joint id, with an explicit present/absent slot per
/// joint. A skeleton never holds two points for the same joint and never
/// holds an entry for the background channel.
#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    joints: [Option<Point>; BodyPart::NAMED_COUNT],
}

impl Skeleton {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, part: BodyPart) -> Option<Point> {
        self.joints.get(part as usize).copied().flatten()
    }

    /// Insert a joint. Background is rejected; a duplicate id is replaced.
    pub fn set(&mut self, part: BodyPart, point: Point) {
        if part != BodyPart::Background {
            self.joints[part as usize] = Some(point);
        }
    }

    pub fn contains(&self, part: BodyPart) -> bool {
        self.get(part).is_some()
    }

    /// Number of present joints.
    pub fn len(&self) -> usize {
        self.joints.iter().filter(|j| j.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.iter().all(|j| j.is_none())
    }

    /// Iterate present joints in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (BodyPart, Point)> + '_ {
        self.joints.iter().enumerate().filter_map(|(id, point)| {
            point.map(|p| (BodyPart::from_id(id).expect("id within named range"), p))
        })
    }

    /// Point pairs for every bone whose both endpoints are present.
    pub fn bone_segments(&self) -> Vec<(Point, Point)> {
        BONES
            .iter()
            .filter_map(|&(from, to)| match (self.get(from), self.get(to)) {
                (Some(a), Some(b)) => Some((a, b)),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_count_excludes_background() {
        assert_eq!(BodyPart::NAMED_COUNT, 18);
        assert_eq!(BodyPart::from_id(18), Some(BodyPart::Background));
        assert_eq!(BodyPart::from_id(19), None);
    }

    #[test]
    fn bone_table_endpoints_are_named_joints() {
        for (from, to) in BONES {
            assert_ne!(from, BodyPart::Background);
            assert_ne!(to, BodyPart::Background);
        }
        assert_eq!(BONES.len(), 17);
    }

    #[test]
    fn skeleton_set_get_and_replace() {
        let mut sk = Skeleton::new();
        assert!(sk.is_empty());

        sk.set(BodyPart::Neck, Point::new(10.0, 20.0));
        sk.set(BodyPart::Neck, Point::new(11.0, 21.0));
        assert_eq!(sk.len(), 1);
        assert_eq!(sk.get(BodyPart::Neck), Some(Point::new(11.0, 21.0)));
    }

    #[test]
    fn skeleton_rejects_background() {
        let mut sk = Skeleton::new();
        sk.set(BodyPart::Background, Point::new(0.0, 0.0));
        assert!(sk.is_empty());
    }

    #[test]
    fn bone_segments_require_both_endpoints() {
        let mut sk = Skeleton::new();
        sk.set(BodyPart::Neck, Point::new(100.0, 50.0));
        sk.set(BodyPart::RShoulder, Point::new(80.0, 55.0));
        sk.set(BodyPart::RWrist, Point::new(60.0, 90.0));

        let segments = sk.bone_segments();
        // Only Neck-RShoulder is fully present; RWrist misses its RElbow peer.
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].0, Point::new(100.0, 50.0));
        assert_eq!(segments[0].1, Point::new(80.0, 55.0));
    }
}
