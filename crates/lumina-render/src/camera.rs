//! Camera and view management.

use glam::{Mat4, Vec3};

/// Camera uniforms shared by every pass that reconstructs positions.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniforms {
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub view_proj: [[f32; 4]; 4],
    pub inv_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 3],
    pub _padding: f32,
}

impl Default for CameraUniforms {
    fn default() -> Self {
        Self {
            view: Mat4::IDENTITY.to_cols_array_2d(),
            proj: Mat4::IDENTITY.to_cols_array_2d(),
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            inv_proj: Mat4::IDENTITY.to_cols_array_2d(),
            camera_pos: [0.0, 0.0, 0.0],
            _padding: 0.0,
        }
    }
}

/// A perspective camera looking from `position` at `target`.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Camera position in world space.
    pub position: Vec3,
    /// Point the camera is looking at.
    pub target: Vec3,
    /// Up vector.
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov: f32,
    /// Aspect ratio (width / height).
    pub aspect_ratio: f32,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
}

impl Camera {
    /// Creates a new camera with default settings.
    #[must_use]
    pub fn new(aspect_ratio: f32) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 3.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov: std::f32::consts::FRAC_PI_4, // 45 degrees
            aspect_ratio,
            near: 0.01,
            far: 1000.0,
        }
    }

    /// Sets the aspect ratio.
    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        if aspect_ratio.is_finite() && aspect_ratio > 0.0 {
            self.aspect_ratio = aspect_ratio;
        }
    }

    /// Returns the view matrix.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Returns the projection matrix (wgpu depth range 0..1).
    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect_ratio, self.near, self.far)
    }

    /// Returns the combined view-projection matrix.
    #[must_use]
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Returns the camera's forward direction.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize()
    }

    /// Returns the camera's right direction.
    #[must_use]
    pub fn right(&self) -> Vec3 {
        self.forward().cross(self.up).normalize()
    }

    /// Distance from the camera to its target.
    #[must_use]
    pub fn distance(&self) -> f32 {
        self.position.distance(self.target)
    }

    /// Orbits the camera around the target.
    pub fn orbit(&mut self, delta_x: f32, delta_y: f32) {
        let radius = (self.position - self.target).length();
        if radius <= f32::EPSILON {
            return;
        }
        let mut theta = (self.position.x - self.target.x).atan2(self.position.z - self.target.z);
        let mut phi = ((self.position.y - self.target.y) / radius)
            .clamp(-1.0, 1.0)
            .acos();

        theta -= delta_x;
        phi = (phi - delta_y).clamp(0.01, std::f32::consts::PI - 0.01);

        self.position = self.target
            + Vec3::new(
                radius * phi.sin() * theta.sin(),
                radius * phi.cos(),
                radius * phi.sin() * theta.cos(),
            );
    }

    /// Pans the camera.
    pub fn pan(&mut self, delta_x: f32, delta_y: f32) {
        let right = self.right();
        let up = self.up;
        let offset = right * delta_x + up * delta_y;
        self.position += offset;
        self.target += offset;
    }

    /// Moves toward (positive delta) or away from the target.
    pub fn zoom(&mut self, delta: f32) {
        let direction = self.forward();
        let distance = (self.position - self.target).length();
        let new_distance = (distance - delta).max(self.near * 2.0).max(0.1);
        self.position = self.target - direction * new_distance;
    }

    /// Frames the given bounding box and adapts the clip planes to its size.
    pub fn fit_to_bounds(&mut self, min: Vec3, max: Vec3) {
        let center = (min + max) * 0.5;
        let size = (max - min).length().max(1e-3);
        let radius = size * 0.5;

        // Distance at which the bounding sphere fits the narrower field of view
        let half_vertical = self.fov * 0.5;
        let half_horizontal = (half_vertical.tan() * self.aspect_ratio).atan();
        let half_fov = half_vertical.min(half_horizontal);
        let distance = radius / half_fov.sin().max(1e-3);

        let direction = (self.position - self.target)
            .try_normalize()
            .unwrap_or(Vec3::Z);
        self.target = center;
        self.position = center + direction * distance;
        self.near = ((distance - radius) * 0.5).max(size * 1e-4);
        self.far = distance + size * 10.0;
    }

    /// Sets the field of view in radians.
    pub fn set_fov(&mut self, fov: f32) {
        self.fov = fov.clamp(0.1, std::f32::consts::PI - 0.1);
    }

    /// Sets the near clipping plane.
    pub fn set_near(&mut self, near: f32) {
        self.near = near.max(0.001);
    }

    /// Sets the far clipping plane.
    pub fn set_far(&mut self, far: f32) {
        self.far = far.max(self.near + 0.1);
    }

    /// Returns FOV in degrees.
    #[must_use]
    pub fn fov_degrees(&self) -> f32 {
        self.fov.to_degrees()
    }

    /// Sets FOV from degrees.
    pub fn set_fov_degrees(&mut self, degrees: f32) {
        self.set_fov(degrees.to_radians());
    }

    /// Packs the matrices for the GPU.
    #[must_use]
    pub fn uniforms(&self) -> CameraUniforms {
        let view = self.view_matrix();
        let proj = self.projection_matrix();
        CameraUniforms {
            view: view.to_cols_array_2d(),
            proj: proj.to_cols_array_2d(),
            view_proj: (proj * view).to_cols_array_2d(),
            inv_proj: proj.inverse().to_cols_array_2d(),
            camera_pos: self.position.to_array(),
            _padding: 0.0,
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(16.0 / 9.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_uniforms_size() {
        assert_eq!(std::mem::size_of::<CameraUniforms>(), 272);
    }

    #[test]
    fn test_projection_is_perspective() {
        let camera = Camera::new(1.0);
        let proj = camera.projection_matrix();
        // Perspective matrix has non-zero w division
        assert!(proj.w_axis.z != 0.0);
        assert_eq!(proj.z_axis.w, -1.0);
    }

    #[test]
    fn test_set_fov_clamping() {
        let mut camera = Camera::new(1.0);
        camera.set_fov(0.0); // Too small
        assert!(camera.fov >= 0.1);

        camera.set_fov(std::f32::consts::PI); // Too large
        assert!(camera.fov < std::f32::consts::PI);
    }

    #[test]
    fn test_fov_degrees_conversion() {
        let mut camera = Camera::new(1.0);
        camera.set_fov_degrees(90.0);
        assert!((camera.fov_degrees() - 90.0).abs() < 0.1);
    }

    #[test]
    fn test_zoom() {
        let mut camera = Camera::new(1.0);
        camera.position = Vec3::new(0.0, 0.0, 5.0);
        camera.target = Vec3::ZERO;

        let initial_distance = camera.distance();
        camera.zoom(1.0); // Zoom in
        assert!(camera.distance() < initial_distance);

        camera.zoom(100.0);
        assert!(camera.distance() > 0.0, "zoom never passes the target");
    }

    #[test]
    fn test_orbit_keeps_distance() {
        let mut camera = Camera::new(1.0);
        camera.position = Vec3::new(0.0, 1.0, 4.0);
        let before = camera.distance();
        camera.orbit(0.7, -0.3);
        assert!((camera.distance() - before).abs() < 1e-4);
        assert_eq!(camera.target, Vec3::ZERO);
    }

    #[test]
    fn test_fit_to_bounds_contains_box() {
        let mut camera = Camera::new(1.5);
        let (min, max) = (Vec3::new(9.0, -1.0, -1.0), Vec3::new(11.0, 1.0, 1.0));
        camera.fit_to_bounds(min, max);
        assert_eq!(camera.target, Vec3::new(10.0, 0.0, 0.0));

        // Every corner projects inside the clip volume
        let view_proj = camera.view_projection_matrix();
        for corner in [min, max, Vec3::new(min.x, max.y, min.z), Vec3::new(max.x, min.y, max.z)] {
            let clip = view_proj * corner.extend(1.0);
            let ndc = clip.truncate() / clip.w;
            assert!(ndc.x.abs() <= 1.0 && ndc.y.abs() <= 1.0, "{ndc:?}");
            assert!((0.0..=1.0).contains(&ndc.z), "{ndc:?}");
        }
    }

    #[test]
    fn test_uniforms_inverse_projection() {
        let camera = Camera::default();
        let uniforms = camera.uniforms();
        let proj = Mat4::from_cols_array_2d(&uniforms.proj);
        let inv = Mat4::from_cols_array_2d(&uniforms.inv_proj);
        assert!((proj * inv).abs_diff_eq(Mat4::IDENTITY, 1e-4));
    }
}
