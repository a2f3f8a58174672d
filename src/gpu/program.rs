//! Shader programs: compile, reflect, link.
//!
//! A program is one WGSL module with a `vs_main`/`fs_main` pair and a single
//! bind group. Compilation runs the source through naga first so failures
//! carry readable diagnostics, and the parsed module is reflected once for
//! attribute locations, uniform member offsets and the bind group layout.
//!
//! Linking a program against a [`VertexArray`] and a primitive topology
//! produces a render pipeline. Pipeline creation is wrapped in a validation
//! error scope so a rejected link becomes [`GpuError::ProgramLink`] instead
//! of a device panic.

use std::collections::HashMap;

use naga::front::wgsl;
use naga::valid::{Capabilities, ValidationFlags, Validator};

use super::buffer::VertexArray;
use super::RenderTarget;
use crate::error::GpuError;
use crate::uniforms::{UniformBlock, UniformLocation, UniformValue};

pub const EARTH_WGSL: &str = include_str!("../shaders/earth.wgsl");
pub const FIELD_WGSL: &str = include_str!("../shaders/field.wgsl");
pub const LINE_WGSL: &str = include_str!("../shaders/line.wgsl");
pub const SOLAR_WGSL: &str = include_str!("../shaders/solar.wgsl");

/// The programs the renderers are built from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    Earth,
    Field,
    Line,
    Solar,
}

impl ProgramKind {
    pub const ALL: [ProgramKind; 4] = [
        ProgramKind::Earth,
        ProgramKind::Field,
        ProgramKind::Line,
        ProgramKind::Solar,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ProgramKind::Earth => "earth",
            ProgramKind::Field => "field",
            ProgramKind::Line => "line",
            ProgramKind::Solar => "solar",
        }
    }

    pub fn source(&self) -> &'static str {
        match self {
            ProgramKind::Earth => EARTH_WGSL,
            ProgramKind::Field => FIELD_WGSL,
            ProgramKind::Line => LINE_WGSL,
            ProgramKind::Solar => SOLAR_WGSL,
        }
    }
}

/// Location and format of a vertex input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttributeInfo {
    pub location: u32,
    pub format: wgpu::VertexFormat,
}

/// A bind group 0 entry the program declares.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    Uniform { size: u32 },
    Texture,
    Sampler,
}

/// What a program exposes, read from its parsed module.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Reflection {
    pub attributes: HashMap<String, AttributeInfo>,
    pub uniform_size: u32,
    pub uniforms: Vec<(String, UniformLocation)>,
    /// `(binding, kind)` pairs in group 0, sorted by binding.
    pub resources: Vec<(u32, ResourceKind)>,
}

impl Reflection {
    pub fn has_textures(&self) -> bool {
        self.resources
            .iter()
            .any(|(_, kind)| matches!(kind, ResourceKind::Texture | ResourceKind::Sampler))
    }
}

/// Parse and validate WGSL. Errors carry the rendered naga diagnostics.
pub fn compile_wgsl(program: &str, source: &str) -> Result<naga::Module, GpuError> {
    let module = wgsl::parse_str(source).map_err(|err| GpuError::ShaderCompile {
        program: program.to_string(),
        diagnostics: err.emit_to_string(source),
    })?;

    let mut validator = Validator::new(ValidationFlags::all(), Capabilities::all());
    validator
        .validate(&module)
        .map_err(|err| GpuError::ShaderCompile {
            program: program.to_string(),
            diagnostics: err.emit_to_string(source),
        })?;

    Ok(module)
}

fn vertex_format(inner: &naga::TypeInner) -> Option<wgpu::VertexFormat> {
    use naga::{ScalarKind, TypeInner, VectorSize};

    match *inner {
        TypeInner::Scalar(s) if s.kind == ScalarKind::Float && s.width == 4 => {
            Some(wgpu::VertexFormat::Float32)
        }
        TypeInner::Vector { size, scalar } if scalar.kind == ScalarKind::Float && scalar.width == 4 => {
            Some(match size {
                VectorSize::Bi => wgpu::VertexFormat::Float32x2,
                VectorSize::Tri => wgpu::VertexFormat::Float32x3,
                VectorSize::Quad => wgpu::VertexFormat::Float32x4,
            })
        }
        _ => None,
    }
}

fn push_attribute(
    reflection: &mut Reflection,
    module: &naga::Module,
    name: Option<&String>,
    ty: naga::Handle<naga::Type>,
    binding: Option<&naga::Binding>,
) {
    let (Some(name), Some(naga::Binding::Location { location, .. })) = (name, binding) else {
        return;
    };
    if let Some(format) = vertex_format(&module.types[ty].inner) {
        reflection.attributes.insert(
            name.clone(),
            AttributeInfo {
                location: *location,
                format,
            },
        );
    }
}

/// Read vertex inputs, uniform members and group 0 resources from a module.
pub fn reflect(module: &naga::Module) -> Reflection {
    let mut reflection = Reflection::default();

    if let Some(entry) = module
        .entry_points
        .iter()
        .find(|e| e.stage == naga::ShaderStage::Vertex)
    {
        for arg in &entry.function.arguments {
            match &module.types[arg.ty].inner {
                // Inputs gathered into a struct carry bindings on the members.
                naga::TypeInner::Struct { members, .. } if arg.binding.is_none() => {
                    for member in members {
                        push_attribute(
                            &mut reflection,
                            module,
                            member.name.as_ref(),
                            member.ty,
                            member.binding.as_ref(),
                        );
                    }
                }
                _ => push_attribute(
                    &mut reflection,
                    module,
                    arg.name.as_ref(),
                    arg.ty,
                    arg.binding.as_ref(),
                ),
            }
        }
    }

    for (_, var) in module.global_variables.iter() {
        let Some(binding) = &var.binding else {
            continue;
        };
        if binding.group != 0 {
            continue;
        }
        let inner = &module.types[var.ty].inner;
        let kind = match (var.space, inner) {
            (naga::AddressSpace::Uniform, naga::TypeInner::Struct { members, span }) => {
                reflection.uniform_size = *span;
                reflection.uniforms = members
                    .iter()
                    .filter_map(|m| {
                        let name = m.name.clone()?;
                        let size = module.types[m.ty].inner.size(module.to_ctx());
                        Some((name, UniformLocation { offset: m.offset, size }))
                    })
                    .collect();
                ResourceKind::Uniform { size: *span }
            }
            (naga::AddressSpace::Handle, naga::TypeInner::Image { .. }) => ResourceKind::Texture,
            (naga::AddressSpace::Handle, naga::TypeInner::Sampler { .. }) => ResourceKind::Sampler,
            _ => continue,
        };
        reflection.resources.push((binding.binding, kind));
    }
    reflection.resources.sort_by_key(|(binding, _)| *binding);

    reflection
}

/// Texture view and sampler for a program's texture bindings.
pub struct TextureBinding<'a> {
    pub view: &'a wgpu::TextureView,
    pub sampler: &'a wgpu::Sampler,
}

/// A compiled program with its uniform buffer and bind group.
pub struct Program {
    name: String,
    module: wgpu::ShaderModule,
    reflection: Reflection,
    uniforms: UniformBlock,
    uniform_buffer: Option<wgpu::Buffer>,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    bind_group: Option<wgpu::BindGroup>,
}

impl Program {
    /// Compile one of the built-in programs.
    pub fn builtin(device: &wgpu::Device, kind: ProgramKind) -> Result<Self, GpuError> {
        Self::compile(device, kind.name(), kind.source())
    }

    /// Compile WGSL source into a program.
    pub fn compile(device: &wgpu::Device, name: &str, source: &str) -> Result<Self, GpuError> {
        let parsed = compile_wgsl(name, source)?;
        let reflection = reflect(&parsed);

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(name),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(GpuError::ShaderCompile {
                program: name.to_string(),
                diagnostics: err.to_string(),
            });
        }

        let entries: Vec<wgpu::BindGroupLayoutEntry> = reflection
            .resources
            .iter()
            .map(|&(binding, kind)| wgpu::BindGroupLayoutEntry {
                binding,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: match kind {
                    ResourceKind::Uniform { .. } => wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    ResourceKind::Texture => wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    ResourceKind::Sampler => {
                        wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering)
                    }
                },
                count: None,
            })
            .collect();

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{name} Bind Group Layout")),
            entries: &entries,
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{name} Pipeline Layout")),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let uniform_buffer = (reflection.uniform_size > 0).then(|| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&format!("{name} Uniform Buffer")),
                size: reflection.uniform_size as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        });
        let uniforms = UniformBlock::new(reflection.uniform_size, reflection.uniforms.clone());

        let mut program = Self {
            name: name.to_string(),
            module,
            reflection,
            uniforms,
            uniform_buffer,
            bind_group_layout,
            pipeline_layout,
            bind_group: None,
        };
        if !program.reflection.has_textures() {
            program.rebuild_bind_group(device, None);
        }

        tracing::debug!(
            program = name,
            attributes = program.reflection.attributes.len(),
            uniforms = program.reflection.uniforms.len(),
            "compiled program"
        );
        Ok(program)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn reflection(&self) -> &Reflection {
        &self.reflection
    }

    /// Location of a named vertex input, if the program declares it.
    pub fn attribute(&self, name: &str) -> Option<AttributeInfo> {
        self.reflection.attributes.get(name).copied()
    }

    pub fn uniforms(&self) -> &UniformBlock {
        &self.uniforms
    }

    /// Set a uniform by name. Unknown names are skipped with a warning.
    pub fn set_uniform(&mut self, name: &str, value: impl Into<UniformValue>) -> bool {
        self.uniforms.set(name, value)
    }

    /// Upload uniforms if any changed since the last flush.
    pub fn flush(&mut self, queue: &wgpu::Queue) {
        if !self.uniforms.take_dirty() {
            return;
        }
        if let Some(buffer) = &self.uniform_buffer {
            queue.write_buffer(buffer, 0, self.uniforms.bytes());
        }
    }

    /// Attach a texture and sampler to the program's texture bindings.
    pub fn bind_texture(&mut self, device: &wgpu::Device, texture: TextureBinding<'_>) {
        self.rebuild_bind_group(device, Some(texture));
    }

    fn rebuild_bind_group(&mut self, device: &wgpu::Device, texture: Option<TextureBinding<'_>>) {
        let mut entries = Vec::with_capacity(self.reflection.resources.len());
        for &(binding, kind) in &self.reflection.resources {
            let resource = match (kind, &texture, &self.uniform_buffer) {
                (ResourceKind::Uniform { .. }, _, Some(buffer)) => buffer.as_entire_binding(),
                (ResourceKind::Texture, Some(t), _) => wgpu::BindingResource::TextureView(t.view),
                (ResourceKind::Sampler, Some(t), _) => wgpu::BindingResource::Sampler(t.sampler),
                _ => {
                    self.bind_group = None;
                    return;
                }
            };
            entries.push(wgpu::BindGroupEntry { binding, resource });
        }

        self.bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{} Bind Group", self.name)),
            layout: &self.bind_group_layout,
            entries: &entries,
        }));
    }

    /// Build a render pipeline for this program.
    pub fn link(
        &self,
        device: &wgpu::Device,
        target: RenderTarget,
        vertex_array: &VertexArray,
        topology: wgpu::PrimitiveTopology,
    ) -> Result<wgpu::RenderPipeline, GpuError> {
        let buffers = vertex_array.buffer_layouts();

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("{} {:?} Pipeline", self.name, topology)),
            layout: Some(&self.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &self.module,
                entry_point: Some("vs_main"),
                buffers: &buffers,
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &self.module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target.color_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: target.depth_format,
                depth_write_enabled: true,
                // Overlays sit on the same plane as the disk and must still pass.
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        match pollster::block_on(device.pop_error_scope()) {
            Some(err) => Err(GpuError::ProgramLink {
                program: self.name.clone(),
                diagnostics: err.to_string(),
            }),
            None => Ok(pipeline),
        }
    }

    /// Set the bind group on a pass. Returns `false` while a textured
    /// program has no texture bound yet.
    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) -> bool {
        match &self.bind_group {
            Some(group) => {
                pass.set_bind_group(0, group, &[]);
                true
            }
            None => false,
        }
    }

    /// Release the uniform buffer and bind group. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        self.bind_group = None;
        if let Some(buffer) = self.uniform_buffer.take() {
            buffer.destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========== Compile Tests ==========

    #[test]
    fn test_builtin_programs_validate() {
        for kind in ProgramKind::ALL {
            if let Err(e) = compile_wgsl(kind.name(), kind.source()) {
                panic!("{e}");
            }
        }
    }

    #[test]
    fn test_compile_error_has_diagnostics() {
        let err = compile_wgsl("broken", "fn vs_main( -> {}").unwrap_err();
        match err {
            GpuError::ShaderCompile { program, diagnostics } => {
                assert_eq!(program, "broken");
                assert!(!diagnostics.is_empty());
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_validation_error_is_compile_error() {
        // Parses, but returns the wrong type.
        let src = "@vertex fn vs_main() -> @builtin(position) vec4<f32> { return 1.0; }";
        assert!(matches!(
            compile_wgsl("typed", src),
            Err(GpuError::ShaderCompile { .. })
        ));
    }

    // ========== Reflection Tests ==========

    fn reflect_kind(kind: ProgramKind) -> Reflection {
        reflect(&compile_wgsl(kind.name(), kind.source()).unwrap())
    }

    #[test]
    fn test_line_attributes() {
        let r = reflect_kind(ProgramKind::Line);
        let position = r.attributes["position"];
        let color = r.attributes["color"];
        assert_eq!(position.location, 0);
        assert_eq!(position.format, wgpu::VertexFormat::Float32x2);
        assert_eq!(color.location, 1);
        assert_eq!(color.format, wgpu::VertexFormat::Float32x4);
    }

    #[test]
    fn test_struct_vertex_inputs() {
        let src = r#"
struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(3) weight: f32,
};
@vertex
fn vs_main(in: VertexInput) -> @builtin(position) vec4<f32> {
    return vec4<f32>(in.position * in.weight, 0.0, 1.0);
}
"#;
        let r = reflect(&compile_wgsl("structured", src).unwrap());
        assert_eq!(r.attributes["position"].location, 0);
        assert_eq!(r.attributes["weight"].format, wgpu::VertexFormat::Float32);
    }

    #[test]
    fn test_uniform_offsets() {
        let r = reflect_kind(ProgramKind::Earth);
        let offset = |name: &str| {
            r.uniforms
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, loc)| *loc)
                .unwrap()
        };
        assert_eq!(offset("view_proj"), UniformLocation { offset: 0, size: 64 });
        assert_eq!(offset("zones"), UniformLocation { offset: 64, size: 16 });
        assert_eq!(offset("radius").offset, 80);
        assert_eq!(r.uniform_size, 96);
        assert_eq!(r.resources, vec![(0, ResourceKind::Uniform { size: 96 })]);
    }

    #[test]
    fn test_every_program_has_view_proj_and_position() {
        for kind in ProgramKind::ALL {
            let r = reflect_kind(kind);
            assert!(r.attributes.contains_key("position"), "{}", kind.name());
            assert!(r.uniforms.iter().any(|(n, _)| n == "view_proj"), "{}", kind.name());
        }
    }

    #[test]
    fn test_field_program_binds_texture() {
        let r = reflect_kind(ProgramKind::Field);
        assert!(r.has_textures());
        assert_eq!(
            r.resources.iter().map(|(b, _)| *b).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert!(!reflect_kind(ProgramKind::Solar).has_textures());
    }
}
