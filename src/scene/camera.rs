//! Heading/pitch/roll camera
//!
//! The camera looks down +z of its own view space. Heading turns about y,
//! pitch about x, roll about z.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::rasterizer::{Mat4, Vec3, EPSILON};

/// Camera state
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub position: Vec3,
    /// Yaw in radians
    pub heading: f32,
    pub pitch: f32,
    pub roll: f32,
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_posture(position: Vec3, heading: f32, pitch: f32, roll: f32) -> Self {
        Self { position, heading, pitch, roll }
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn set_posture(&mut self, heading: f32, pitch: f32, roll: f32) {
        self.heading = heading;
        self.pitch = pitch;
        self.roll = roll;
    }

    /// Place the camera at `from`, facing `to`, with zero roll.
    ///
    /// There is no up vector. Looking straight up or down leaves heading
    /// undefined, so the previous heading is kept.
    pub fn look_at(&mut self, from: Vec3, to: Vec3) {
        self.position = from;
        let d = (to - from).normalize();
        if d == Vec3::ZERO {
            debug!("look_at: target equals position, orientation unchanged");
            return;
        }

        self.pitch = (-d.y).clamp(-1.0, 1.0).asin();
        if d.x.abs() > EPSILON || d.z.abs() > EPSILON {
            self.heading = d.x.atan2(d.z);
        } else {
            debug!("look_at: vertical direction, keeping heading {}", self.heading);
        }
        self.roll = 0.0;
    }

    /// Unit direction the camera faces, in world space
    pub fn forward(&self) -> Vec3 {
        let (sh, ch) = self.heading.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        Vec3::new(cp * sh, -sp, cp * ch)
    }

    /// Move along the camera's own axes: `forward` along the look direction
    /// flattened onto the ground, `right` across it, `up` along world y
    pub fn move_by(&mut self, forward: f32, right: f32, up: f32) {
        let (sh, ch) = self.heading.sin_cos();
        let ahead = Vec3::new(sh, 0.0, ch);
        let across = Vec3::new(ch, 0.0, -sh);
        let position = self.position + ahead * forward + across * right + Vec3::new(0.0, up, 0.0);
        self.set_position(position);
    }

    /// World -> view transform: translate by -position, then undo heading,
    /// pitch and roll in that order.
    pub fn view_matrix(&self) -> Mat4 {
        let rotate = Mat4::rotate_y(-self.heading)
            * Mat4::rotate_x(-self.pitch)
            * Mat4::rotate_z(-self.roll);
        let translate = Mat4::translate(-self.position.x, -self.position.y, -self.position.z);
        translate * rotate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.001
    }

    #[test]
    fn test_look_at_angles() {
        let mut cam = Camera::new();
        cam.look_at(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0));
        assert!(approx(cam.heading, std::f32::consts::FRAC_PI_2));
        assert!(approx(cam.pitch, 0.0));

        cam.look_at(Vec3::ZERO, Vec3::new(0.0, -1.0, 1.0));
        assert!(approx(cam.heading, 0.0));
        assert!(approx(cam.pitch, std::f32::consts::FRAC_PI_4));
        assert_eq!(cam.roll, 0.0);
    }

    #[test]
    fn test_view_matrix_puts_target_on_positive_z() {
        let mut cam = Camera::new();
        let from = Vec3::new(5.0, 5.0, 5.0);
        let to = Vec3::new(-1.0, 2.0, 0.5);
        cam.look_at(from, to);

        let v = to.to_point() * cam.view_matrix();
        let dist = (to - from).len();
        assert!(approx(v.x, 0.0), "x = {}", v.x);
        assert!(approx(v.y, 0.0), "y = {}", v.y);
        assert!(approx(v.z, dist), "z = {}", v.z);
    }

    #[test]
    fn test_forward_matches_look_direction() {
        let mut cam = Camera::new();
        let from = Vec3::new(-3.0, 1.0, 2.0);
        let to = Vec3::new(4.0, -2.0, -6.0);
        cam.look_at(from, to);
        let d = (to - from).normalize();
        let f = cam.forward();
        assert!(approx(f.x, d.x) && approx(f.y, d.y) && approx(f.z, d.z));
    }

    #[test]
    fn test_look_straight_down_keeps_heading() {
        let mut cam = Camera::with_posture(Vec3::ZERO, 0.7, 0.0, 0.3);
        cam.look_at(Vec3::new(0.0, 10.0, 0.0), Vec3::ZERO);
        assert!(approx(cam.heading, 0.7));
        assert!(approx(cam.pitch, std::f32::consts::FRAC_PI_2));
        assert_eq!(cam.roll, 0.0);
        assert!(cam.heading.is_finite());
    }

    #[test]
    fn test_move_by_follows_heading() {
        let mut cam = Camera::with_posture(Vec3::ZERO, std::f32::consts::FRAC_PI_2, 0.4, 0.0);
        cam.move_by(2.0, 0.0, 0.0);
        // Facing +x: moving ahead ignores pitch
        assert!(approx(cam.position.x, 2.0) && approx(cam.position.y, 0.0));
        assert!(approx(cam.position.z, 0.0));

        cam.move_by(0.0, 1.0, 0.5);
        assert!(approx(cam.position.x, 2.0) && approx(cam.position.z, -1.0));
        assert!(approx(cam.position.y, 0.5));

        // The point ahead stays centered after moving
        cam.set_posture(std::f32::consts::FRAC_PI_2, 0.0, 0.0);
        let ahead = cam.position + Vec3::new(3.0, 0.0, 0.0);
        let v = ahead.to_point() * cam.view_matrix();
        assert!(approx(v.x, 0.0) && approx(v.y, 0.0) && approx(v.z, 3.0));
    }

    #[test]
    fn test_roll_spins_view() {
        let cam = Camera::with_posture(Vec3::ZERO, 0.0, 0.0, std::f32::consts::FRAC_PI_2);
        // Rolling the camera by +90deg makes world +x appear along view -y
        let v = Vec3::new(1.0, 0.0, 3.0).to_point() * cam.view_matrix();
        assert!(approx(v.x, 0.0) && approx(v.y, -1.0) && approx(v.z, 3.0));
    }
}
