//! Field texture upload.

use crate::field::FieldTexture;

use super::program::TextureBinding;

/// GPU copy of a [`FieldTexture`], stored as `Rgba8Unorm`.
#[derive(Debug)]
pub struct FieldTextureGpu {
    texture: Option<wgpu::Texture>,
    view: Option<wgpu::TextureView>,
    sampler: wgpu::Sampler,
    resolution: u32,
}

impl FieldTextureGpu {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, field: &FieldTexture) -> Self {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Field Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let mut gpu = Self {
            texture: None,
            view: None,
            sampler,
            resolution: 0,
        };
        gpu.upload(device, queue, field);
        gpu
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Write new texel data, recreating the texture if the resolution changed.
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, field: &FieldTexture) {
        let size = field.resolution.max(1);
        if self.texture.is_none() || self.resolution != size {
            self.dispose();
            let texture = device.create_texture(&wgpu::TextureDescriptor {
                label: Some("Field Texture"),
                size: wgpu::Extent3d {
                    width: size,
                    height: size,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            });
            self.view = Some(texture.create_view(&wgpu::TextureViewDescriptor::default()));
            self.texture = Some(texture);
            self.resolution = size;
        }

        let Some(texture) = &self.texture else {
            return;
        };
        if field.is_empty() {
            return;
        }
        let image = field.to_rgba8();
        if image.width() != size || image.height() != size {
            tracing::warn!(resolution = field.resolution, "field texture has no texels, skipping upload");
            return;
        }

        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.as_raw(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * size),
                rows_per_image: Some(size),
            },
            wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
        );
        tracing::debug!(resolution = size, "uploaded field texture");
    }

    /// View and sampler for binding, or `None` after disposal.
    pub fn binding(&self) -> Option<TextureBinding<'_>> {
        Some(TextureBinding {
            view: self.view.as_ref()?,
            sampler: &self.sampler,
        })
    }

    /// Release the texture. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        self.view = None;
        if let Some(texture) = self.texture.take() {
            texture.destroy();
        }
    }
}

impl Drop for FieldTextureGpu {
    fn drop(&mut self) {
        self.dispose();
    }
}
