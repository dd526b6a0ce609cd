//! Rigid placement of a panel's 2-D frame in the shared 3-D scene.

use nalgebra::{Point3, Rotation3, Vector3};
use serde::{Deserialize, Serialize};

use crate::model::Vec2;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Local 2-D point that lands on `translation`.
    pub pivot: Vec2,
    pub translation: Vector3<f64>,
    pub rotation: Rotation3<f64>,
}

impl Default for Placement {
    fn default() -> Self {
        Placement {
            pivot: Vec2::ZERO,
            translation: Vector3::zeros(),
            rotation: Rotation3::identity(),
        }
    }
}

impl Placement {
    pub fn point_to_3d(&self, p: Vec2) -> Point3<f64> {
        let local = Vector3::new(p.x - self.pivot.x, p.y - self.pivot.y, 0.0);
        Point3::from(self.rotation * local + self.translation)
    }

    /// Compose an extra rotation given as XYZ Euler angles in degrees.
    pub fn rotate_by_euler_deg(&mut self, x: f64, y: f64, z: f64) {
        let r = Rotation3::from_euler_angles(x.to_radians(), y.to_radians(), z.to_radians());
        self.rotation = r * self.rotation;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pivot_maps_to_translation() {
        let mut pl = Placement::default();
        pl.pivot = Vec2::new(5.0, 10.0);
        pl.translation = Vector3::new(1.0, 2.0, 3.0);
        let p = pl.point_to_3d(Vec2::new(5.0, 10.0));
        assert!((p - Point3::new(1.0, 2.0, 3.0)).norm() < 1e-12);
    }

    #[test]
    fn quarter_turn_about_y_moves_x_into_minus_z() {
        let mut pl = Placement::default();
        pl.rotate_by_euler_deg(0.0, 90.0, 0.0);
        let p = pl.point_to_3d(Vec2::new(1.0, 0.0));
        assert!((p.x).abs() < 1e-12);
        assert!((p.z + 1.0).abs() < 1e-12);
    }
}
