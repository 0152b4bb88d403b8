//! Synthetic poses shared by unit tests (image coordinates, y down).

use crate::pose::{Landmark, LandmarkIndex, LandmarkSet};

fn pose_from(points: [(f32, f32, f32); LandmarkIndex::COUNT]) -> LandmarkSet {
    LandmarkSet::new(
        points
            .iter()
            .map(|&(x, y, z)| Landmark::new(x, y, z, 0.99))
            .collect(),
    )
}

pub fn standing_pose() -> LandmarkSet {
    squat_pose(0.0)
}

/// Front-facing squat; `depth` 0.0 = standing, 1.0 = bottom
pub fn squat_pose(depth: f32) -> LandmarkSet {
    let drop = 80.0 * depth;
    let arms = 60.0 * depth;
    let spread = 25.0 * depth;
    let knee_z = -40.0 * depth;
    pose_from([
        (320.0, 100.0 + drop, 0.0),
        (312.0, 92.0 + drop, 0.0),
        (308.0, 92.0 + drop, 0.0),
        (304.0, 92.0 + drop, 0.0),
        (328.0, 92.0 + drop, 0.0),
        (332.0, 92.0 + drop, 0.0),
        (336.0, 92.0 + drop, 0.0),
        (300.0, 96.0 + drop, 5.0),
        (340.0, 96.0 + drop, 5.0),
        (314.0, 112.0 + drop, 0.0),
        (326.0, 112.0 + drop, 0.0),
        (290.0, 150.0 + drop, 0.0),
        (350.0, 150.0 + drop, 0.0),
        (280.0, 210.0 + drop - arms * 0.5, -arms * 0.5),
        (360.0, 210.0 + drop - arms * 0.5, -arms * 0.5),
        (275.0, 265.0 + drop - arms, -arms),
        (365.0, 265.0 + drop - arms, -arms),
        (272.0, 280.0 + drop - arms, -arms),
        (368.0, 280.0 + drop - arms, -arms),
        (274.0, 282.0 + drop - arms, -arms),
        (366.0, 282.0 + drop - arms, -arms),
        (278.0, 276.0 + drop - arms, -arms),
        (362.0, 276.0 + drop - arms, -arms),
        (300.0, 280.0 + drop, 0.0),
        (340.0, 280.0 + drop, 0.0),
        (300.0 - spread, 370.0 + drop * 0.25, knee_z),
        (340.0 + spread, 370.0 + drop * 0.25, knee_z),
        (300.0, 460.0, 0.0),
        (340.0, 460.0, 0.0),
        (296.0, 470.0, 5.0),
        (344.0, 470.0, 5.0),
        (306.0, 478.0, -10.0),
        (334.0, 478.0, -10.0),
    ])
}

/// Side-view push-up; `depth` 0.0 = arms extended, 1.0 = chest near floor
pub fn pushup_pose(depth: f32) -> LandmarkSet {
    let chest = 70.0 * depth;
    let hips = 45.0 * depth;
    let elbow = 40.0 * depth;
    pose_from([
        (100.0, 290.0 + chest, 0.0),
        (104.0, 284.0 + chest, -4.0),
        (106.0, 284.0 + chest, -5.0),
        (108.0, 284.0 + chest, -6.0),
        (104.0, 284.0 + chest, 4.0),
        (106.0, 284.0 + chest, 5.0),
        (108.0, 284.0 + chest, 6.0),
        (114.0, 288.0 + chest, -10.0),
        (114.0, 288.0 + chest, 10.0),
        (98.0, 298.0 + chest, -3.0),
        (98.0, 298.0 + chest, 3.0),
        (150.0, 300.0 + chest, -20.0),
        (150.0, 300.0 + chest, 20.0),
        (150.0 + elbow, 350.0 + chest * 0.3, -25.0),
        (150.0 + elbow, 350.0 + chest * 0.3, 25.0),
        (150.0, 400.0, -22.0),
        (150.0, 400.0, 22.0),
        (146.0, 404.0, -24.0),
        (146.0, 404.0, 24.0),
        (144.0, 402.0, -22.0),
        (144.0, 402.0, 22.0),
        (148.0, 398.0, -20.0),
        (148.0, 398.0, 20.0),
        (300.0, 310.0 + hips, -15.0),
        (300.0, 310.0 + hips, 15.0),
        (400.0, 330.0 + hips * 0.5, -12.0),
        (400.0, 330.0 + hips * 0.5, 12.0),
        (500.0, 350.0, -10.0),
        (500.0, 350.0, 10.0),
        (510.0, 348.0, -10.0),
        (510.0, 348.0, 10.0),
        (505.0, 362.0, -10.0),
        (505.0, 362.0, 10.0),
    ])
}

/// Scale about the origin, then shift in the image plane
pub fn transform(set: &LandmarkSet, dx: f32, dy: f32, scale: f32) -> LandmarkSet {
    LandmarkSet::new(
        set.landmarks
            .iter()
            .map(|l| Landmark::new(l.x * scale + dx, l.y * scale + dy, l.z * scale, l.visibility))
            .collect(),
    )
}
