//! Scene registry: meshes, objects and lights.

use std::collections::HashMap;

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{LuminaError, Result};
use crate::lights::{AmbientLight, DirectionalLight, MAX_DIRECTIONAL_LIGHTS};
use crate::mesh::MeshData;

/// An instance of a mesh drawn with a material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub name: String,
    /// Name of the mesh in the owning [`Scene`].
    pub mesh: String,
    /// Name of the material; unknown names fall back to the default material.
    pub material: String,
    pub transform: Mat4,
    pub visible: bool,
}

impl SceneObject {
    /// Creates a visible object with an identity transform.
    pub fn new(name: impl Into<String>, mesh: impl Into<String>, material: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mesh: mesh.into(),
            material: material.into(),
            transform: Mat4::IDENTITY,
            visible: true,
        }
    }

    /// Sets the transform.
    #[must_use]
    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }
}

/// Everything the renderer draws.
///
/// Meshes are shared by name between objects. Objects keep insertion order,
/// which is also the draw order for opaque geometry.
#[derive(Debug, Default)]
pub struct Scene {
    meshes: HashMap<String, MeshData>,
    objects: Vec<SceneObject>,
    directional_lights: Vec<DirectionalLight>,
    /// Environment lighting.
    pub ambient: AmbientLight,
}

impl Scene {
    /// Creates an empty scene with one default directional light.
    pub fn new() -> Self {
        Self {
            directional_lights: vec![DirectionalLight::default()],
            ..Self::default()
        }
    }

    /// Registers a mesh. Returns an error if the mesh is invalid or the name is taken.
    pub fn add_mesh(&mut self, name: impl Into<String>, mesh: MeshData) -> Result<()> {
        let name = name.into();
        if self.meshes.contains_key(&name) {
            return Err(LuminaError::AlreadyExists(name));
        }
        mesh.validate()?;
        log::debug!(
            "added mesh '{}' ({} vertices, {} triangles)",
            name,
            mesh.vertex_count(),
            mesh.triangle_count()
        );
        self.meshes.insert(name, mesh);
        Ok(())
    }

    /// Gets a mesh by name.
    pub fn mesh(&self, name: &str) -> Option<&MeshData> {
        self.meshes.get(name)
    }

    /// Iterates over all meshes in arbitrary order.
    pub fn meshes(&self) -> impl Iterator<Item = (&str, &MeshData)> {
        self.meshes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Removes a mesh. Fails while any object still uses it.
    pub fn remove_mesh(&mut self, name: &str) -> Result<MeshData> {
        if let Some(user) = self.objects.iter().find(|o| o.mesh == name) {
            return Err(LuminaError::invalid(
                "mesh",
                format!("'{name}' is still used by object '{}'", user.name),
            ));
        }
        self.meshes
            .remove(name)
            .ok_or_else(|| LuminaError::NotFound(name.to_string()))
    }

    /// Adds an object. Its mesh must already be registered.
    pub fn add_object(&mut self, object: SceneObject) -> Result<()> {
        if self.contains(&object.name) {
            return Err(LuminaError::AlreadyExists(object.name));
        }
        if !self.meshes.contains_key(&object.mesh) {
            return Err(LuminaError::NotFound(object.mesh));
        }
        self.objects.push(object);
        Ok(())
    }

    /// Checks if an object with the given name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.objects.iter().any(|o| o.name == name)
    }

    /// Gets an object by name.
    pub fn get(&self, name: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.name == name)
    }

    /// Gets a mutable reference to an object by name.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.name == name)
    }

    /// Removes an object by name.
    pub fn remove(&mut self, name: &str) -> Option<SceneObject> {
        let index = self.objects.iter().position(|o| o.name == name)?;
        Some(self.objects.remove(index))
    }

    /// Removes all objects and meshes. Lights are kept.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.meshes.clear();
    }

    /// Objects in insertion order.
    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    /// Number of objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns true if the scene has no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Adds a directional light. Only the first [`MAX_DIRECTIONAL_LIGHTS`] are rendered.
    pub fn add_directional_light(&mut self, light: DirectionalLight) {
        if self.directional_lights.len() >= MAX_DIRECTIONAL_LIGHTS {
            log::warn!(
                "scene has more than {MAX_DIRECTIONAL_LIGHTS} directional lights; extra lights are ignored by the renderer"
            );
        }
        self.directional_lights.push(light);
    }

    /// All directional lights.
    pub fn directional_lights(&self) -> &[DirectionalLight] {
        &self.directional_lights
    }

    /// Removes every directional light.
    pub fn clear_directional_lights(&mut self) {
        self.directional_lights.clear();
    }

    /// World-space bounds of an object, if its mesh exists.
    pub fn object_bounds(&self, object: &SceneObject) -> Option<(Vec3, Vec3)> {
        self.meshes
            .get(&object.mesh)?
            .transformed_bounding_box(object.transform)
    }

    /// World-space bounds of all visible objects.
    pub fn bounding_box(&self) -> Option<(Vec3, Vec3)> {
        self.objects
            .iter()
            .filter(|o| o.visible)
            .filter_map(|o| self.object_bounds(o))
            .reduce(|(a_min, a_max), (b_min, b_max)| (a_min.min(b_min), a_max.max(b_max)))
    }

    /// Diagonal of the scene bounds, or 1.0 for an empty scene.
    pub fn length_scale(&self) -> f32 {
        self.bounding_box()
            .map(|(min, max)| (max - min).length())
            .filter(|l| *l > 0.0)
            .unwrap_or(1.0)
    }

    /// Orders `objects` by decreasing distance from `camera_position`, measured to
    /// the centre of each object's bounds. The sort is stable, so equally distant
    /// objects keep their relative order.
    pub fn sort_back_to_front(&self, objects: &mut [&SceneObject], camera_position: Vec3) {
        // Bounds walk every vertex, so each distance is computed once.
        let mut keyed: Vec<_> = objects
            .iter()
            .map(|&o| {
                let centre = self
                    .object_bounds(o)
                    .map_or_else(|| o.transform.w_axis.truncate(), |(min, max)| (min + max) * 0.5);
                (centre.distance_squared(camera_position), o)
            })
            .collect();
        keyed.sort_by(|a, b| b.0.total_cmp(&a.0));
        for (slot, (_, object)) in objects.iter_mut().zip(keyed) {
            *slot = object;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn scene_with_cube() -> Scene {
        let mut scene = Scene::new();
        scene.add_mesh("cube", MeshData::cube(1.0)).unwrap();
        scene
    }

    #[test]
    fn test_add_and_get() {
        let mut scene = scene_with_cube();
        scene
            .add_object(SceneObject::new("a", "cube", "default"))
            .unwrap();
        assert!(scene.contains("a"));
        assert_eq!(scene.get("a").unwrap().material, "default");
        scene.get_mut("a").unwrap().visible = false;
        assert!(!scene.get("a").unwrap().visible);
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut scene = scene_with_cube();
        assert!(matches!(
            scene.add_mesh("cube", MeshData::plane(1.0)),
            Err(LuminaError::AlreadyExists(_))
        ));
        scene
            .add_object(SceneObject::new("a", "cube", "default"))
            .unwrap();
        assert!(matches!(
            scene.add_object(SceneObject::new("a", "cube", "metal")),
            Err(LuminaError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_unknown_mesh_rejected() {
        let mut scene = Scene::new();
        assert!(matches!(
            scene.add_object(SceneObject::new("a", "missing", "default")),
            Err(LuminaError::NotFound(_))
        ));
    }

    #[test]
    fn test_remove_and_clear() {
        let mut scene = scene_with_cube();
        scene
            .add_object(SceneObject::new("a", "cube", "default"))
            .unwrap();
        assert!(scene.remove_mesh("cube").is_err());
        assert!(scene.remove("a").is_some());
        assert!(scene.remove("a").is_none());
        assert!(scene.remove_mesh("cube").is_ok());

        let mut scene = scene_with_cube();
        scene
            .add_object(SceneObject::new("a", "cube", "default"))
            .unwrap();
        scene.clear();
        assert!(scene.is_empty());
        assert!(scene.mesh("cube").is_none());
        assert_eq!(scene.directional_lights().len(), 1);
    }

    #[test]
    fn test_bounding_box_and_length_scale() {
        let mut scene = scene_with_cube();
        assert!(scene.bounding_box().is_none());
        assert_eq!(scene.length_scale(), 1.0);
        scene
            .add_object(
                SceneObject::new("a", "cube", "default")
                    .with_transform(Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0))),
            )
            .unwrap();
        scene
            .add_object(SceneObject::new("b", "cube", "default"))
            .unwrap();
        let (min, max) = scene.bounding_box().unwrap();
        assert_eq!(min, Vec3::splat(-0.5));
        assert_eq!(max, Vec3::new(2.5, 0.5, 0.5));
    }

    #[test]
    fn test_sort_back_to_front() {
        let mut scene = scene_with_cube();
        for (name, z) in [("near", 1.0), ("far", -10.0), ("mid", -3.0), ("mid2", -3.0)] {
            scene
                .add_object(
                    SceneObject::new(name, "cube", "glass")
                        .with_transform(Mat4::from_translation(Vec3::new(0.0, 0.0, z))),
                )
                .unwrap();
        }
        let mut order: Vec<&SceneObject> = scene.objects().iter().collect();
        scene.sort_back_to_front(&mut order, Vec3::new(0.0, 0.0, 5.0));
        let names: Vec<&str> = order.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["far", "mid", "mid2", "near"]);
    }

    proptest! {
        #[test]
        fn prop_sort_back_to_front_is_stable_and_ordered(
            depths in proptest::collection::vec(-20i32..20, 1..40),
        ) {
            let mut scene = scene_with_cube();
            for (i, z) in depths.iter().enumerate() {
                scene
                    .add_object(
                        SceneObject::new(format!("o{i}"), "cube", "glass")
                            .with_transform(Mat4::from_translation(Vec3::new(0.0, 0.0, *z as f32))),
                    )
                    .unwrap();
            }
            let camera = Vec3::new(0.0, 0.0, 25.0);
            let mut order: Vec<&SceneObject> = scene.objects().iter().collect();
            scene.sort_back_to_front(&mut order, camera);

            prop_assert_eq!(order.len(), depths.len());
            let index = |o: &SceneObject| o.name[1..].parse::<usize>().unwrap();
            for pair in order.windows(2) {
                let (a, b) = (index(pair[0]), index(pair[1]));
                // Camera is in front of every object, so farther means smaller z.
                prop_assert!(depths[a] <= depths[b]);
                if depths[a] == depths[b] {
                    prop_assert!(a < b);
                }
            }
        }
    }

    #[test]
    fn test_light_limit_is_soft() {
        let mut scene = Scene::new();
        for _ in 0..5 {
            scene.add_directional_light(DirectionalLight::default());
        }
        assert_eq!(scene.directional_lights().len(), 6);
    }
}
