use std::ops::Range;

use maths::Mat4;
use slotmap::SlotMap;

use crate::{
    config::BvhConfig,
    core::DirtyFlags,
    error::SceneError,
    mesh::MeshData,
    raytracer::{Triangle, bvh::Bvh},
    transform::{Transform, apply_transform},
};

slotmap::new_key_type! {
    pub struct InstanceId;
}

/// A placed copy of a mesh. Owns its object-space triangles and the slice
/// `first_triangle..first_triangle + triangle_count` of the scene's triangle
/// array, which always holds those triangles under `model_matrix`.
#[derive(Debug, Clone)]
pub struct MeshInstance {
    transform: Transform,
    model_matrix: Mat4,
    inverse_model_matrix: Mat4,
    material_id: i32,
    object_triangles: Vec<Triangle>,
    first_triangle: usize,
    dirty: bool,
}

impl MeshInstance {
    fn new(object_triangles: Vec<Triangle>, transform: Transform, material_id: i32) -> Self {
        let mut instance = Self {
            transform,
            model_matrix: Mat4::IDENTITY,
            inverse_model_matrix: Mat4::IDENTITY,
            material_id,
            object_triangles,
            first_triangle: 0,
            dirty: true,
        };
        instance.set_transform(transform);
        instance
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn model_matrix(&self) -> &Mat4 {
        &self.model_matrix
    }

    pub fn inverse_model_matrix(&self) -> &Mat4 {
        &self.inverse_model_matrix
    }

    pub fn material_id(&self) -> i32 {
        self.material_id
    }

    pub fn object_triangles(&self) -> &[Triangle] {
        &self.object_triangles
    }

    pub fn triangle_count(&self) -> usize {
        self.object_triangles.len()
    }

    /// Slice of the scene triangle array owned by this instance.
    pub fn triangle_range(&self) -> Range<usize> {
        self.first_triangle..self.first_triangle + self.triangle_count()
    }

    fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
        self.model_matrix = transform.get_matrix();
        self.inverse_model_matrix = self.model_matrix.inverse();
        self.dirty = true;
    }

    fn write_world_triangles(&self, target: &mut [Triangle]) {
        apply_transform(&self.object_triangles, &self.model_matrix, target);
        for triangle in target.iter_mut() {
            triangle.material_id = self.material_id;
        }
    }
}

/// Result of [`Scene::update`]: what the renderer has to re-upload.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SceneUpdate {
    pub rebuilt: bool,
    pub refitted: bool,
    /// Union of rewritten triangle slices. `None` when nothing changed.
    pub triangle_range: Option<Range<usize>>,
}

/// Scene-wide triangle array shared by all instances, plus the BVH over it.
///
/// Adding or removing instances changes topology and triggers a rebuild on
/// the next [`Scene::update`]. Transform and material edits only rewrite the
/// affected slices and refit.
#[derive(Debug, Default)]
pub struct Scene {
    triangles: Vec<Triangle>,
    instances: SlotMap<InstanceId, MeshInstance>,
    bvh: Bvh,
    flags: DirtyFlags,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: BvhConfig) -> Result<Self, SceneError> {
        Ok(Self {
            bvh: Bvh::with_config(config)?,
            ..Self::default()
        })
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn bvh(&self) -> &Bvh {
        &self.bvh
    }

    pub fn flags(&self) -> DirtyFlags {
        self.flags
    }

    pub fn instance(&self, id: InstanceId) -> Option<&MeshInstance> {
        self.instances.get(id)
    }

    pub fn instances(&self) -> impl Iterator<Item = (InstanceId, &MeshInstance)> {
        self.instances.iter()
    }

    /// Adds an instance of object-space `triangles`.
    pub fn add_instance(
        &mut self,
        triangles: Vec<Triangle>,
        transform: Transform,
        material_id: i32,
    ) -> Result<InstanceId, SceneError> {
        if triangles.is_empty() {
            return Err(SceneError::EmptyMesh);
        }

        let id = self
            .instances
            .insert(MeshInstance::new(triangles, transform, material_id));
        self.flags.geometry = true;
        Ok(id)
    }

    pub fn add_mesh(
        &mut self,
        mesh: &MeshData,
        transform: Transform,
        material_id: i32,
    ) -> Result<InstanceId, SceneError> {
        self.add_instance(mesh.to_triangles(material_id), transform, material_id)
    }

    pub fn remove_instance(&mut self, id: InstanceId) -> Result<(), SceneError> {
        self.instances
            .remove(id)
            .ok_or(SceneError::UnknownInstance(id))?;
        self.flags.geometry = true;
        Ok(())
    }

    pub fn set_transform(&mut self, id: InstanceId, transform: Transform) -> Result<(), SceneError> {
        let instance = self
            .instances
            .get_mut(id)
            .ok_or(SceneError::UnknownInstance(id))?;
        instance.set_transform(transform);
        self.flags.transforms = true;
        Ok(())
    }

    pub fn set_material(&mut self, id: InstanceId, material_id: i32) -> Result<(), SceneError> {
        let instance = self
            .instances
            .get_mut(id)
            .ok_or(SceneError::UnknownInstance(id))?;
        instance.material_id = material_id;
        instance.dirty = true;
        self.flags.transforms = true;
        Ok(())
    }

    /// Brings the triangle array and the BVH in line with the instances.
    pub fn update(&mut self) -> Result<SceneUpdate, SceneError> {
        if self.flags.geometry {
            self.rebuild();
            return Ok(SceneUpdate {
                rebuilt: true,
                refitted: false,
                triangle_range: (!self.triangles.is_empty()).then(|| 0..self.triangles.len()),
            });
        }

        if !self.flags.transforms {
            return Ok(SceneUpdate::default());
        }

        let mut changed: Option<Range<usize>> = None;
        for instance in self.instances.values_mut().filter(|instance| instance.dirty) {
            let range = instance.triangle_range();
            instance.write_world_triangles(&mut self.triangles[range.clone()]);
            instance.dirty = false;

            changed = Some(match changed {
                Some(changed) => changed.start.min(range.start)..changed.end.max(range.end),
                None => range,
            });
        }

        self.bvh.refit(&self.triangles)?;
        self.flags.transforms = false;

        Ok(SceneUpdate {
            rebuilt: false,
            refitted: true,
            triangle_range: changed,
        })
    }

    fn rebuild(&mut self) {
        let triangle_count = self.instances.values().map(MeshInstance::triangle_count).sum();
        self.triangles.clear();
        self.triangles.resize(triangle_count, Triangle::default());

        let mut first_triangle = 0;
        for instance in self.instances.values_mut() {
            instance.first_triangle = first_triangle;
            let range = instance.triangle_range();
            instance.write_world_triangles(&mut self.triangles[range.clone()]);
            instance.dirty = false;
            first_triangle = range.end;
        }

        self.bvh.build(&self.triangles);
        self.flags = DirtyFlags::default();

        log::info!(
            "Scene rebuilt: {} instances, {} triangles, {} BVH nodes",
            self.instances.len(),
            self.triangles.len(),
            self.bvh.nodes().len()
        );
    }
}
