//! Scaling, circles and orientation helpers.

use bevy::math::{DQuat, DVec3};
use rand::Rng;

/// Points of a closed unit circle in the XY plane (`segments + 1` points).
pub fn unit_circle(segments: u32) -> Vec<DVec3> {
    let segments = segments.max(3);
    (0..=segments)
        .map(|i| {
            let angle = std::f64::consts::TAU * i as f64 / segments as f64;
            DVec3::new(angle.cos(), angle.sin(), 0.0)
        })
        .collect()
}

/// Rotation that points an object's +Z axis from `from` toward `to`.
///
/// Identity when the two points coincide.
pub fn look_rotation(from: DVec3, to: DVec3) -> DQuat {
    match (to - from).try_normalize() {
        Some(dir) => DQuat::from_rotation_arc(DVec3::Z, dir),
        None => DQuat::IDENTITY,
    }
}

/// Random unit direction biased toward +Z (the upper hemisphere).
pub fn random_unit_offset(rng: &mut impl Rng) -> DVec3 {
    loop {
        let candidate = DVec3::new(
            rng.gen::<f64>() - 0.5,
            rng.gen::<f64>() - 0.5,
            rng.gen::<f64>() / 2.0,
        );
        if let Some(dir) = candidate.try_normalize() {
            return dir;
        }
    }
}

/// `camera distance / radius / divisor`, the level-of-detail metric.
pub fn distance_radius_factor(camera_distance: f64, radius: f64, divisor: f64) -> f64 {
    camera_distance / radius / divisor
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_unit_circle_is_closed() {
        let points = unit_circle(100);
        assert_eq!(points.len(), 101);
        assert!((points[0] - points[100]).length() < 1e-12);
        assert!(points.iter().all(|p| (p.length() - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_look_rotation_points_z_at_target() {
        let rotation = look_rotation(DVec3::ZERO, DVec3::new(0.0, 5.0, 0.0));
        let forward = rotation * DVec3::Z;
        assert!((forward - DVec3::Y).length() < 1e-9);
        assert_eq!(look_rotation(DVec3::ONE, DVec3::ONE), DQuat::IDENTITY);
    }

    #[test]
    fn test_random_unit_offset_is_normalized_and_upward() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let dir = random_unit_offset(&mut rng);
            assert!((dir.length() - 1.0).abs() < 1e-9);
            assert!(dir.z >= 0.0);
        }
    }
}
