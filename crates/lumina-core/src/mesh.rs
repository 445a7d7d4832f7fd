//! Indexed triangle meshes.

use std::f32::consts::{PI, TAU};

use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{LuminaError, Result};

/// CPU-side triangle mesh. Every attribute array has one entry per vertex.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshData {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Creates a mesh from positions and triangle indices, computing smooth normals.
    /// UVs are zero.
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Result<Self> {
        let mut mesh = Self {
            uvs: vec![Vec2::ZERO; positions.len()],
            normals: Vec::new(),
            positions,
            indices,
        };
        mesh.compute_normals();
        mesh.validate()?;
        Ok(mesh)
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Checks attribute lengths and index ranges.
    pub fn validate(&self) -> Result<()> {
        let n = self.positions.len();
        if n == 0 {
            return Err(LuminaError::InvalidMesh("mesh has no vertices".into()));
        }
        if self.normals.len() != n || self.uvs.len() != n {
            return Err(LuminaError::InvalidMesh(format!(
                "{n} positions but {} normals and {} uvs",
                self.normals.len(),
                self.uvs.len()
            )));
        }
        if self.indices.is_empty() || self.indices.len() % 3 != 0 {
            return Err(LuminaError::InvalidMesh(format!(
                "index count {} is not a positive multiple of 3",
                self.indices.len()
            )));
        }
        if let Some(&bad) = self.indices.iter().find(|&&i| i as usize >= n) {
            return Err(LuminaError::InvalidMesh(format!(
                "index {bad} out of range for {n} vertices"
            )));
        }
        Ok(())
    }

    /// Recomputes vertex normals as the area-weighted average of the incident
    /// triangle normals.
    pub fn compute_normals(&mut self) {
        self.normals.clear();
        self.normals.resize(self.positions.len(), Vec3::ZERO);
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            if a >= self.positions.len() || b >= self.positions.len() || c >= self.positions.len() {
                continue;
            }
            let (p0, p1, p2) = (self.positions[a], self.positions[b], self.positions[c]);
            // Cross product length is twice the area, which is the weighting we want.
            let n = (p1 - p0).cross(p2 - p0);
            self.normals[a] += n;
            self.normals[b] += n;
            self.normals[c] += n;
        }
        for n in &mut self.normals {
            *n = n.normalize_or_zero();
        }
    }

    /// Axis-aligned bounds in local space, or `None` for an empty mesh.
    #[must_use]
    pub fn bounding_box(&self) -> Option<(Vec3, Vec3)> {
        if self.positions.is_empty() {
            return None;
        }
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        for &p in &self.positions {
            min = min.min(p);
            max = max.max(p);
        }
        Some((min, max))
    }

    /// Bounds after applying `transform`.
    #[must_use]
    pub fn transformed_bounding_box(&self, transform: Mat4) -> Option<(Vec3, Vec3)> {
        let (min, max) = self.bounding_box()?;
        let mut world_min = Vec3::splat(f32::MAX);
        let mut world_max = Vec3::splat(f32::MIN);
        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { min.x } else { max.x },
                if i & 2 == 0 { min.y } else { max.y },
                if i & 4 == 0 { min.z } else { max.z },
            );
            let p = transform.transform_point3(corner);
            world_min = world_min.min(p);
            world_max = world_max.max(p);
        }
        Some((world_min, world_max))
    }

    /// Axis-aligned cube centred at the origin with flat faces.
    #[must_use]
    pub fn cube(size: f32) -> Self {
        let h = size * 0.5;
        // (normal, tangent u, tangent v) per face
        let faces = [
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        ];
        let mut mesh = Self::default();
        for (normal, u, v) in faces {
            let base = mesh.positions.len() as u32;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                mesh.positions.push((normal + u * su + v * sv) * h);
                mesh.normals.push(normal);
                mesh.uvs.push(Vec2::new((su + 1.0) * 0.5, 1.0 - (sv + 1.0) * 0.5));
            }
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        mesh
    }

    /// Horizontal plane at `y = 0` facing +Y.
    #[must_use]
    pub fn plane(size: f32) -> Self {
        let h = size * 0.5;
        Self {
            positions: vec![
                Vec3::new(-h, 0.0, h),
                Vec3::new(h, 0.0, h),
                Vec3::new(h, 0.0, -h),
                Vec3::new(-h, 0.0, -h),
            ],
            normals: vec![Vec3::Y; 4],
            uvs: vec![
                Vec2::new(0.0, 1.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(0.0, 0.0),
            ],
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }

    /// UV sphere centred at the origin. `segments` and `rings` are clamped to at
    /// least 3 and 2.
    #[must_use]
    pub fn uv_sphere(radius: f32, segments: u32, rings: u32) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(2);
        let mut mesh = Self::default();
        for ring in 0..=rings {
            let v = ring as f32 / rings as f32;
            let theta = v * PI;
            for seg in 0..=segments {
                let u = seg as f32 / segments as f32;
                let phi = u * TAU;
                let n = Vec3::new(theta.sin() * phi.cos(), theta.cos(), -theta.sin() * phi.sin());
                mesh.positions.push(n * radius);
                mesh.normals.push(n);
                mesh.uvs.push(Vec2::new(u, v));
            }
        }
        let stride = segments + 1;
        for ring in 0..rings {
            for seg in 0..segments {
                let a = ring * stride + seg;
                let b = a + stride;
                mesh.indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
            }
        }
        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube() {
        let cube = MeshData::cube(2.0);
        assert!(cube.validate().is_ok());
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.triangle_count(), 12);
        let (min, max) = cube.bounding_box().unwrap();
        assert_eq!(min, Vec3::splat(-1.0));
        assert_eq!(max, Vec3::splat(1.0));
    }

    #[test]
    fn test_cube_winding_matches_normals() {
        let cube = MeshData::cube(1.0);
        for tri in cube.indices.chunks_exact(3) {
            let p: Vec<Vec3> = tri.iter().map(|&i| cube.positions[i as usize]).collect();
            let face_normal = (p[1] - p[0]).cross(p[2] - p[0]).normalize();
            assert!(face_normal.dot(cube.normals[tri[0] as usize]) > 0.99);
        }
    }

    #[test]
    fn test_compute_normals_on_plane() {
        let mut plane = MeshData::plane(1.0);
        plane.normals.clear();
        plane.compute_normals();
        for n in &plane.normals {
            assert!((*n - Vec3::Y).length() < 1e-6);
        }
    }

    #[test]
    fn test_sphere_normals_point_outward() {
        let sphere = MeshData::uv_sphere(2.0, 16, 8);
        assert!(sphere.validate().is_ok());
        for (p, n) in sphere.positions.iter().zip(&sphere.normals) {
            assert!((p.length() - 2.0).abs() < 1e-4);
            assert!(p.normalize().dot(*n) > 0.999);
        }
    }

    #[test]
    fn test_validate_rejects_bad_indices() {
        let mut mesh = MeshData::plane(1.0);
        mesh.indices.push(0);
        assert!(mesh.validate().is_err());
        mesh.indices = vec![0, 1, 9];
        assert!(matches!(mesh.validate(), Err(LuminaError::InvalidMesh(_))));
        assert!(MeshData::default().validate().is_err());
    }

    #[test]
    fn test_new_computes_normals() {
        let mesh = MeshData::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![0, 1, 2],
        )
        .unwrap();
        assert_eq!(mesh.normals[0], Vec3::Z);
    }

    #[test]
    fn test_transformed_bounds() {
        let cube = MeshData::cube(2.0);
        let (min, max) = cube
            .transformed_bounding_box(Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0)))
            .unwrap();
        assert_eq!(min, Vec3::new(4.0, -1.0, -1.0));
        assert_eq!(max, Vec3::new(6.0, 1.0, 1.0));
    }
}
