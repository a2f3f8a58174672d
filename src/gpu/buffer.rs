//! Vertex and index buffers, meshes and vertex arrays.
//!
//! Vertex data is kept one attribute per buffer. A [`Mesh`] owns its
//! buffers; a [`MeshView`] is a borrowed, read-only handle to someone
//! else's mesh and cannot dispose it. A [`VertexArray`] maps a program's
//! named attributes to buffer slots and binds a mesh's buffers to them at
//! draw time.

use std::ops::Range;

use wgpu::util::DeviceExt;

use super::program::{Program, Reflection};

/// Whether a buffer holds vertices or indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferKind {
    Vertex,
    Index,
}

/// A GPU buffer that can be explicitly released.
///
/// Empty data produces a buffer with no GPU allocation; draws against it
/// are skipped.
#[derive(Debug)]
pub struct GpuBuffer {
    raw: Option<wgpu::Buffer>,
    kind: BufferKind,
    /// Number of elements of the uploaded type.
    len: u32,
    capacity_bytes: u64,
}

impl GpuBuffer {
    fn create(device: &wgpu::Device, label: &str, bytes: &[u8], len: u32, kind: BufferKind) -> Self {
        let usage = match kind {
            BufferKind::Vertex => wgpu::BufferUsages::VERTEX,
            BufferKind::Index => wgpu::BufferUsages::INDEX,
        } | wgpu::BufferUsages::COPY_DST;

        let raw = (!bytes.is_empty()).then(|| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytes,
                usage,
            })
        });

        Self {
            raw,
            kind,
            len,
            capacity_bytes: bytes.len() as u64,
        }
    }

    /// Vertex buffer from a typed slice.
    pub fn vertex<T: bytemuck::Pod>(device: &wgpu::Device, label: &str, data: &[T]) -> Self {
        Self::create(
            device,
            label,
            bytemuck::cast_slice(data),
            data.len() as u32,
            BufferKind::Vertex,
        )
    }

    /// `u32` index buffer.
    pub fn index(device: &wgpu::Device, label: &str, data: &[u32]) -> Self {
        Self::create(
            device,
            label,
            bytemuck::cast_slice(data),
            data.len() as u32,
            BufferKind::Index,
        )
    }

    pub fn raw(&self) -> Option<&wgpu::Buffer> {
        self.raw.as_ref()
    }

    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0 || self.raw.is_none()
    }

    /// Overwrite the contents in place. Returns `false` (and writes nothing)
    /// when `data` does not fit the existing allocation.
    pub fn write<T: bytemuck::Pod>(&mut self, queue: &wgpu::Queue, data: &[T]) -> bool {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        match &self.raw {
            Some(raw) if bytes.len() as u64 <= self.capacity_bytes => {
                queue.write_buffer(raw, 0, bytes);
                self.len = data.len() as u32;
                true
            }
            _ => false,
        }
    }

    /// Release the GPU allocation. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        if let Some(raw) = self.raw.take() {
            raw.destroy();
        }
        self.len = 0;
    }
}

impl Drop for GpuBuffer {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Named vertex attributes plus optional indices.
#[derive(Debug)]
pub struct Mesh {
    label: String,
    attributes: Vec<(String, GpuBuffer)>,
    indices: Option<GpuBuffer>,
    vertex_count: u32,
}

impl Mesh {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            attributes: Vec::new(),
            indices: None,
            vertex_count: 0,
        }
    }

    /// Add or replace an attribute buffer. `components` is the number of
    /// floats per vertex.
    pub fn set_attribute(&mut self, device: &wgpu::Device, name: &str, data: &[f32], components: u32) {
        let label = format!("{} {}", self.label, name);
        let buffer = GpuBuffer::vertex(device, &label, data);
        self.vertex_count = data.len() as u32 / components.max(1);
        match self.attributes.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => {
                slot.dispose();
                *slot = buffer;
            }
            None => self.attributes.push((name.to_string(), buffer)),
        }
    }

    pub fn with_attribute(mut self, device: &wgpu::Device, name: &str, data: &[f32], components: u32) -> Self {
        self.set_attribute(device, name, data, components);
        self
    }

    pub fn set_indices(&mut self, device: &wgpu::Device, indices: &[u32]) {
        if let Some(old) = self.indices.as_mut() {
            old.dispose();
        }
        self.indices = Some(GpuBuffer::index(device, &format!("{} indices", self.label), indices));
    }

    pub fn with_indices(mut self, device: &wgpu::Device, indices: &[u32]) -> Self {
        self.set_indices(device, indices);
        self
    }

    /// Overwrite an attribute in place, reallocating if it no longer fits.
    pub fn update_attribute(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        name: &str,
        data: &[f32],
        components: u32,
    ) {
        let written = self
            .attributes
            .iter_mut()
            .find(|(n, _)| n == name)
            .is_some_and(|(_, buffer)| buffer.write(queue, data));
        if written {
            self.vertex_count = data.len() as u32 / components.max(1);
        } else {
            tracing::debug!(mesh = %self.label, attribute = name, len = data.len(), "reallocating vertex buffer");
            self.set_attribute(device, name, data, components);
        }
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn is_empty(&self) -> bool {
        self.vertex_count == 0
    }

    /// Borrow this mesh for drawing by another renderer.
    pub fn view(&self) -> MeshView<'_> {
        MeshView { mesh: self }
    }

    /// Release every buffer. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        for (_, buffer) in &mut self.attributes {
            buffer.dispose();
        }
        if let Some(indices) = self.indices.as_mut() {
            indices.dispose();
        }
        self.vertex_count = 0;
    }
}

/// Non-owning reference to a [`Mesh`]. Has no way to release the mesh.
#[derive(Clone, Copy, Debug)]
pub struct MeshView<'a> {
    mesh: &'a Mesh,
}

impl<'a> MeshView<'a> {
    pub fn attribute(&self, name: &str) -> Option<&'a wgpu::Buffer> {
        self.mesh
            .attributes
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, buffer)| buffer.raw())
    }

    /// Index buffer and index count, if the mesh is indexed and non-empty.
    pub fn indices(&self) -> Option<(&'a wgpu::Buffer, u32)> {
        let indices = self.mesh.indices.as_ref()?;
        Some((indices.raw()?, indices.len()))
    }

    pub fn vertex_count(&self) -> u32 {
        self.mesh.vertex_count
    }

    pub fn is_empty(&self) -> bool {
        self.mesh.is_empty()
    }
}

#[derive(Clone, Debug)]
struct Slot {
    name: String,
    attribute: [wgpu::VertexAttribute; 1],
}

/// Program attribute to buffer slot mapping.
#[derive(Clone, Debug, Default)]
pub struct VertexArray {
    slots: Vec<Slot>,
}

impl VertexArray {
    /// Resolve `names` against the program. Names the program does not
    /// declare are skipped with a warning.
    pub fn new(program: &Program, names: &[&str]) -> Self {
        Self::from_reflection(program.name(), program.reflection(), names)
    }

    /// [`new`](Self::new) over reflected shader inputs; `program` only
    /// labels the warning.
    pub fn from_reflection(program: &str, reflection: &Reflection, names: &[&str]) -> Self {
        let slots = names
            .iter()
            .filter_map(|&name| match reflection.attributes.get(name) {
                Some(info) => Some(Slot {
                    name: name.to_string(),
                    attribute: [wgpu::VertexAttribute {
                        format: info.format,
                        offset: 0,
                        shader_location: info.location,
                    }],
                }),
                None => {
                    tracing::warn!(program, attribute = name, "attribute not found, skipping");
                    None
                }
            })
            .collect();
        Self { slots }
    }

    /// Bound attribute names, in slot order.
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|s| s.name.as_str())
    }

    /// Shader location bound to `name`, if it has a slot.
    pub fn shader_location(&self, name: &str) -> Option<u32> {
        self.slots
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.attribute[0].shader_location)
    }

    /// One tightly packed buffer layout per slot.
    pub fn buffer_layouts(&self) -> Vec<wgpu::VertexBufferLayout<'_>> {
        self.slots
            .iter()
            .map(|slot| wgpu::VertexBufferLayout {
                array_stride: slot.attribute[0].format.size(),
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &slot.attribute,
            })
            .collect()
    }

    /// Bind the mesh's buffers to this array's slots. Returns `false` if the
    /// mesh is empty or lacks a buffer for any slot.
    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>, mesh: MeshView<'_>) -> bool {
        if mesh.is_empty() {
            return false;
        }
        for (slot_index, slot) in self.slots.iter().enumerate() {
            let Some(buffer) = mesh.attribute(&slot.name) else {
                return false;
            };
            pass.set_vertex_buffer(slot_index as u32, buffer.slice(..));
        }
        true
    }

    /// Bind and draw the whole mesh, indexed when it has indices.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, mesh: MeshView<'_>) {
        if !self.bind(pass, mesh) {
            return;
        }
        match mesh.indices() {
            Some((indices, count)) => {
                pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..count, 0, 0..1);
            }
            None => pass.draw(0..mesh.vertex_count(), 0..1),
        }
    }

    /// Bind once and draw each vertex range, for batches of polylines.
    pub fn draw_ranges(&self, pass: &mut wgpu::RenderPass<'_>, mesh: MeshView<'_>, ranges: &[Range<u32>]) {
        if ranges.is_empty() || !self.bind(pass, mesh) {
            return;
        }
        for range in ranges.iter().filter(|r| !r.is_empty()) {
            pass.draw(range.clone(), 0..1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::program::{compile_wgsl, reflect, LINE_WGSL};

    fn line_reflection() -> Reflection {
        reflect(&compile_wgsl("line", LINE_WGSL).unwrap())
    }

    #[test]
    fn test_unknown_attribute_is_skipped() {
        let array = VertexArray::from_reflection("line", &line_reflection(), &["position", "nope", "color"]);
        let names: Vec<&str> = array.attributes().collect();
        assert_eq!(names, ["position", "color"]);
        assert_eq!(array.shader_location("position"), Some(0));
        assert_eq!(array.shader_location("color"), Some(1));
        assert_eq!(array.shader_location("nope"), None);
    }

    #[test]
    fn test_layouts_follow_slots() {
        let array = VertexArray::from_reflection("line", &line_reflection(), &["color", "position"]);
        let layouts = array.buffer_layouts();
        assert_eq!(layouts.len(), 2);
        assert_eq!(layouts[0].array_stride, wgpu::VertexFormat::Float32x4.size());
        assert_eq!(layouts[1].array_stride, wgpu::VertexFormat::Float32x2.size());
        assert_eq!(layouts[1].attributes[0].shader_location, 0);
    }

    #[test]
    fn test_all_unknown_is_empty() {
        let array = VertexArray::from_reflection("line", &line_reflection(), &["uv", "normal"]);
        assert_eq!(array.attributes().count(), 0);
        assert!(array.buffer_layouts().is_empty());
    }
}
