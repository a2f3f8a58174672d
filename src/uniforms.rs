//! Uniform values and per-program uniform blocks.
//!
//! Each program has one uniform struct at `@group(0) @binding(0)`. Its member
//! offsets are read from the shader once when the program is compiled and
//! kept in a [`UniformBlock`], so setting a uniform by name is a hash lookup
//! and a byte copy into a CPU-side mirror of the buffer.
//!
//! ```ignore
//! program.set_uniform("view_proj", camera.view_projection_f32());
//! program.set_uniform("radius", 20_000.0f32);
//! program.flush(&queue);
//! ```

use std::collections::{HashMap, HashSet};

use glam::{Mat4, Vec2, Vec3, Vec4};

/// Supported uniform value types.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    F32(f32),
    I32(i32),
    U32(u32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
}

impl UniformValue {
    /// WGSL type name for this value.
    pub fn wgsl_type(&self) -> &'static str {
        match self {
            UniformValue::F32(_) => "f32",
            UniformValue::I32(_) => "i32",
            UniformValue::U32(_) => "u32",
            UniformValue::Vec2(_) => "vec2<f32>",
            UniformValue::Vec3(_) => "vec3<f32>",
            UniformValue::Vec4(_) => "vec4<f32>",
            UniformValue::Mat4(_) => "mat4x4<f32>",
        }
    }

    /// Byte size of this value (without trailing padding).
    pub fn byte_size(&self) -> usize {
        match self {
            UniformValue::F32(_) | UniformValue::I32(_) | UniformValue::U32(_) => 4,
            UniformValue::Vec2(_) => 8,
            UniformValue::Vec3(_) => 12,
            UniformValue::Vec4(_) => 16,
            UniformValue::Mat4(_) => 64,
        }
    }

    /// Write little-endian bytes into the start of `dst`.
    ///
    /// `dst` must be at least [`byte_size`](Self::byte_size) long.
    pub fn write_to(&self, dst: &mut [u8]) {
        let bytes: &[u8] = match self {
            UniformValue::F32(v) => bytemuck::bytes_of(v),
            UniformValue::I32(v) => bytemuck::bytes_of(v),
            UniformValue::U32(v) => bytemuck::bytes_of(v),
            UniformValue::Vec2(v) => bytemuck::bytes_of(v),
            UniformValue::Vec3(v) => bytemuck::bytes_of(v),
            UniformValue::Vec4(v) => bytemuck::bytes_of(v),
            // Column-major, as WGSL expects.
            UniformValue::Mat4(v) => bytemuck::bytes_of(v),
        };
        dst[..bytes.len()].copy_from_slice(bytes);
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::F32(v)
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        UniformValue::I32(v)
    }
}

impl From<u32> for UniformValue {
    fn from(v: u32) -> Self {
        UniformValue::U32(v)
    }
}

impl From<Vec2> for UniformValue {
    fn from(v: Vec2) -> Self {
        UniformValue::Vec2(v)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        UniformValue::Vec3(v)
    }
}

impl From<Vec4> for UniformValue {
    fn from(v: Vec4) -> Self {
        UniformValue::Vec4(v)
    }
}

impl From<Mat4> for UniformValue {
    fn from(v: Mat4) -> Self {
        UniformValue::Mat4(v)
    }
}

/// Byte range of one uniform struct member.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UniformLocation {
    pub offset: u32,
    pub size: u32,
}

/// CPU mirror of a program's uniform buffer with a name to offset cache.
#[derive(Clone, Debug, Default)]
pub struct UniformBlock {
    bytes: Vec<u8>,
    locations: HashMap<String, UniformLocation>,
    /// Names already reported as missing, so the warning fires once.
    missing: HashSet<String>,
    dirty: bool,
}

impl UniformBlock {
    /// Create a zeroed block of `size` bytes with the given member locations.
    pub fn new(size: u32, locations: impl IntoIterator<Item = (String, UniformLocation)>) -> Self {
        Self {
            bytes: vec![0; size as usize],
            locations: locations.into_iter().collect(),
            missing: HashSet::new(),
            dirty: true,
        }
    }

    pub fn location(&self, name: &str) -> Option<UniformLocation> {
        self.locations.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.locations.keys().map(String::as_str)
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Write a value by member name. Unknown names and values larger than
    /// the member are skipped with a warning. Returns whether it was written.
    pub fn set(&mut self, name: &str, value: impl Into<UniformValue>) -> bool {
        let value = value.into();
        let Some(loc) = self.locations.get(name).copied() else {
            if self.missing.insert(name.to_string()) {
                tracing::warn!(uniform = name, "uniform not found in program, skipping");
            }
            return false;
        };
        if value.byte_size() > loc.size as usize {
            if self.missing.insert(name.to_string()) {
                tracing::warn!(
                    uniform = name,
                    expected = loc.size,
                    got = value.wgsl_type(),
                    "uniform type mismatch, skipping"
                );
            }
            return false;
        }

        let start = loc.offset as usize;
        value.write_to(&mut self.bytes[start..start + loc.size as usize]);
        self.dirty = true;
        true
    }

    /// Raw bytes for upload.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clear the dirty flag, returning its previous value.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }
}
