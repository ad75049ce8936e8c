//! Production [`RenderBackend`] built on wgpu.
//!
//! One forward pass per frame:
//! - Group 0: global uniforms, environment texture and sampler
//! - Group 1: per-primitive uniforms (model matrix, material)
//!
//! Geometry is uploaded lazily and cached by geometry id. Per-primitive
//! bindings are keyed by `(node, primitive index)` and dropped once the
//! primitive stops being drawn.

use std::hash::Hash;

use bytemuck::{Pod, Zeroable};
use glam::Vec4;
use half::f16;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use rustc_hash::{FxHashMap, FxHashSet};
use wgpu::util::DeviceExt;

use crate::errors::{LoadError, Result};
use crate::renderer::backend::{FrameView, RenderBackend};
use crate::renderer::context::WgpuContext;
use crate::renderer::settings::{DEPTH_FORMAT, ENVIRONMENT_FORMAT, RenderSettings};
use crate::resources::geometry::Geometry;
use crate::scene::{EnvironmentMapping, EnvironmentTexture, NodeHandle, NodeKind};

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct Vertex {
    position: [f32; 3],
    normal: [f32; 3],
}

impl Vertex {
    const ATTRIBS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct GlobalUniforms {
    view_proj: [[f32; 4]; 4],
    camera_pos: [f32; 4],
    params: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct ObjectUniforms {
    model: [[f32; 4]; 4],
    normal_matrix: [[f32; 4]; 4],
    base_color: [f32; 4],
    pbr: [f32; 4],
}

struct GpuGeometry {
    vertex_buffer: wgpu::Buffer,
    index_buffer: Option<wgpu::Buffer>,
    draw_count: u32,
}

impl GpuGeometry {
    fn upload(device: &wgpu::Device, geometry: &Geometry) -> Self {
        let vertices: Vec<Vertex> = geometry
            .positions
            .iter()
            .zip(&geometry.normals)
            .map(|(&position, &normal)| Vertex { position, normal })
            .collect();

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Geometry Vertices"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = geometry.indices.as_ref().map(|indices| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Geometry Indices"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            })
        });

        log::trace!(
            "Uploaded geometry {} ({} vertices)",
            geometry.id(),
            geometry.vertex_count()
        );
        Self {
            vertex_buffer,
            index_buffer,
            draw_count: geometry.draw_count() as u32,
        }
    }

    fn destroy(&self) {
        self.vertex_buffer.destroy();
        if let Some(buffer) = &self.index_buffer {
            buffer.destroy();
        }
    }
}

struct GpuObject {
    geometry_id: u64,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

struct GpuEnvironment {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    mapping: EnvironmentMapping,
    is_fallback: bool,
}

impl GpuEnvironment {
    fn upload(ctx: &WgpuContext, label: &str, width: u32, height: u32, data: &[u8]) -> Self {
        let texture = ctx.device.create_texture_with_data(
            &ctx.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: ENVIRONMENT_FORMAT,
                usage: wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            data,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            mapping: EnvironmentMapping::default(),
            is_fallback: false,
        }
    }

    /// 1x1 neutral grey so the bind group layout never changes.
    fn fallback(ctx: &WgpuContext) -> Self {
        let grey = f16::from_f32(0.5).to_bits().to_le_bytes();
        let one = f16::ONE.to_bits().to_le_bytes();
        let texel: Vec<u8> = [grey, grey, grey, one].concat();
        let mut env = Self::upload(ctx, "Fallback Environment", 1, 1, &texel);
        env.is_fallback = true;
        env
    }
}

/// Renders a [`SceneGraph`](crate::scene::SceneGraph) to a window surface.
pub struct WgpuBackend {
    ctx: WgpuContext,
    settings: RenderSettings,

    pipeline: wgpu::RenderPipeline,
    global_layout: wgpu::BindGroupLayout,
    object_layout: wgpu::BindGroupLayout,
    global_buffer: wgpu::Buffer,
    global_bind_group: wgpu::BindGroup,
    sampler: wgpu::Sampler,
    environment: GpuEnvironment,

    geometries: FxHashMap<u64, GpuGeometry>,
    objects: FxHashMap<(NodeHandle, usize), GpuObject>,
    released: bool,
}

impl WgpuBackend {
    /// Creates the surface, device and pipeline for `window`.
    pub async fn new<W>(window: W, settings: RenderSettings, width: u32, height: u32) -> Result<Self>
    where
        W: HasWindowHandle + HasDisplayHandle + Send + Sync + 'static,
    {
        let ctx = WgpuContext::new(window, &settings, width, height).await?;
        let device = &ctx.device;

        let global_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Global Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Object Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let shader = device.create_shader_module(wgpu::include_wgsl!("shaders/viewer.wgsl"));
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Viewer Pipeline Layout"),
            bind_group_layouts: &[Some(&global_layout), Some(&object_layout)],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Viewer Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                buffers: &[Vertex::layout()],
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: Some(true),
                depth_compare: Some(wgpu::CompareFunction::Less),
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.color_format(),
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            multiview_mask: None,
            cache: None,
        });

        let global_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Global Uniforms"),
            size: std::mem::size_of::<GlobalUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Equirectangular maps wrap horizontally and clamp at the poles.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Environment Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let environment = GpuEnvironment::fallback(&ctx);
        let global_bind_group = Self::create_global_bind_group(
            &ctx.device,
            &global_layout,
            &global_buffer,
            &environment.view,
            &sampler,
        );

        Ok(Self {
            ctx,
            settings,
            pipeline,
            global_layout,
            object_layout,
            global_buffer,
            global_bind_group,
            sampler,
            environment,
            geometries: FxHashMap::default(),
            objects: FxHashMap::default(),
            released: false,
        })
    }

    fn create_global_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        buffer: &wgpu::Buffer,
        view: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Global Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }

    fn replace_environment(&mut self, environment: GpuEnvironment) {
        let old = std::mem::replace(&mut self.environment, environment);
        old.texture.destroy();
        self.global_bind_group = Self::create_global_bind_group(
            &self.ctx.device,
            &self.global_layout,
            &self.global_buffer,
            &self.environment.view,
            &self.sampler,
        );
    }

    #[inline]
    #[must_use]
    pub fn context(&self) -> &WgpuContext {
        &self.ctx
    }

    /// Uploads geometry and per-primitive uniforms for every visible mesh.
    ///
    /// Returns the keys drawn this frame, in draw order.
    fn prepare_objects(&mut self, frame: &mut FrameView<'_>) -> Vec<(NodeHandle, usize)> {
        let mut drawn = Vec::new();

        for (handle, node) in frame.scene.iter_mut() {
            if !node.visible {
                continue;
            }
            let world = node.transform.world_matrix_as_mat4();
            let normal_matrix = world.inverse().transpose();
            let NodeKind::Mesh(mesh) = &mut node.kind else {
                continue;
            };
            if !mesh.visible {
                continue;
            }

            for (index, primitive) in mesh.primitives.iter_mut().enumerate() {
                let geometry = &primitive.geometry;
                if geometry.is_empty() {
                    continue;
                }
                let geometry_id = geometry.id();
                self.geometries
                    .entry(geometry_id)
                    .or_insert_with(|| GpuGeometry::upload(&self.ctx.device, geometry));

                let key = (handle, index);
                let stale = self
                    .objects
                    .get(&key)
                    .is_none_or(|object| object.geometry_id != geometry_id);
                if stale {
                    let object = self.create_object(geometry_id);
                    if let Some(old) = self.objects.insert(key, object) {
                        old.buffer.destroy();
                    }
                }
                let Some(object) = self.objects.get(&key) else {
                    continue;
                };

                let material = &mut primitive.material;
                let uniforms = ObjectUniforms {
                    model: world.to_cols_array_2d(),
                    normal_matrix: normal_matrix.to_cols_array_2d(),
                    base_color: material.color.to_array(),
                    pbr: Vec4::new(material.metalness, material.roughness, 0.0, 0.0).to_array(),
                };
                self.ctx
                    .queue
                    .write_buffer(&object.buffer, 0, bytemuck::bytes_of(&uniforms));
                material.needs_update = false;

                drawn.push(key);
            }
        }

        let live: FxHashSet<(NodeHandle, usize)> = drawn.iter().copied().collect();
        for object in evict(&mut self.objects, |key| live.contains(key)) {
            object.buffer.destroy();
        }
        let referenced: FxHashSet<u64> = self.objects.values().map(|o| o.geometry_id).collect();
        for geometry in evict(&mut self.geometries, |id| referenced.contains(id)) {
            geometry.destroy();
        }
        drawn
    }

    fn create_object(&self, geometry_id: u64) -> GpuObject {
        let buffer = self.ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Object Uniforms"),
            size: std::mem::size_of::<ObjectUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = self.ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Object Bind Group"),
            layout: &self.object_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        GpuObject {
            geometry_id,
            buffer,
            bind_group,
        }
    }

    fn write_globals(&self, frame: &FrameView<'_>) {
        let camera = frame.camera;
        let has_env = !self.environment.is_fallback;
        let uniforms = GlobalUniforms {
            view_proj: camera.view_projection_matrix().to_cols_array_2d(),
            camera_pos: camera.position().extend(1.0).to_array(),
            params: [
                self.settings.exposure,
                frame.environment.intensity,
                self.environment.mapping.as_u32() as f32,
                if has_env { 1.0 } else { 0.0 },
            ],
        };
        self.ctx
            .queue
            .write_buffer(&self.global_buffer, 0, bytemuck::bytes_of(&uniforms));
    }
}

impl RenderBackend for WgpuBackend {
    fn resize(&mut self, width: u32, height: u32) {
        self.ctx.resize(width, height);
    }

    fn set_environment(
        &mut self,
        texture: Option<&EnvironmentTexture>,
    ) -> std::result::Result<(), LoadError> {
        let next = match texture {
            Some(texture) => {
                let max = self.ctx.device.limits().max_texture_dimension_2d;
                if texture.width() > max || texture.height() > max {
                    return Err(LoadError::Unsupported {
                        uri: texture.label.clone(),
                        reason: format!(
                            "{}x{} exceeds the device texture limit {max}",
                            texture.width(),
                            texture.height()
                        ),
                    });
                }
                let mut env = GpuEnvironment::upload(
                    &self.ctx,
                    &texture.label,
                    texture.width(),
                    texture.height(),
                    texture.data(),
                );
                env.mapping = texture.mapping();
                env
            }
            None => GpuEnvironment::fallback(&self.ctx),
        };
        self.replace_environment(next);
        Ok(())
    }

    fn draw(&mut self, mut frame: FrameView<'_>) {
        if self.released {
            return;
        }

        let output = match self.ctx.surface.get_current_texture() {
            wgpu::CurrentSurfaceTexture::Success(output)
            | wgpu::CurrentSurfaceTexture::Suboptimal(output) => output,
            wgpu::CurrentSurfaceTexture::Lost | wgpu::CurrentSurfaceTexture::Outdated => {
                log::debug!("Surface lost or outdated, reconfiguring");
                self.ctx.reconfigure();
                return;
            }
            wgpu::CurrentSurfaceTexture::Timeout => {
                log::trace!("Surface timeout, skipping frame");
                return;
            }
            e => {
                log::error!("Failed to acquire surface texture: {e:?}");
                return;
            }
        };

        let drawn = self.prepare_objects(&mut frame);
        self.write_globals(&frame);

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Forward Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.settings.wgpu_clear_color()),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.ctx.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.global_bind_group, &[]);

            for key in &drawn {
                let Some(object) = self.objects.get(key) else {
                    continue;
                };
                let Some(geometry) = self.geometries.get(&object.geometry_id) else {
                    continue;
                };
                pass.set_bind_group(1, &object.bind_group, &[]);
                pass.set_vertex_buffer(0, geometry.vertex_buffer.slice(..));
                match &geometry.index_buffer {
                    Some(indices) => {
                        pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
                        pass.draw_indexed(0..geometry.draw_count, 0, 0..1);
                    }
                    None => pass.draw(0..geometry.draw_count, 0..1),
                }
            }
        }

        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        for object in self.objects.values() {
            object.buffer.destroy();
        }
        self.objects.clear();
        for geometry in self.geometries.values() {
            geometry.destroy();
        }
        self.geometries.clear();
        self.environment.texture.destroy();
        self.global_buffer.destroy();
        self.ctx.destroy();
        log::debug!("GPU resources destroyed");
    }
}

/// Removes every entry whose key fails `keep` and hands the values back for destruction.
fn evict<K, V>(map: &mut FxHashMap<K, V>, keep: impl Fn(&K) -> bool) -> Vec<V>
where
    K: Copy + Eq + Hash,
{
    let stale: Vec<K> = map.keys().filter(|key| !keep(key)).copied().collect();
    stale.iter().filter_map(|key| map.remove(key)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evict_returns_only_unkept_values() {
        let mut map: FxHashMap<u64, &str> = [(1, "a"), (2, "b"), (3, "c")].into_iter().collect();

        let mut removed = evict(&mut map, |id| *id != 2);
        removed.sort_unstable();

        assert_eq!(removed, vec!["b"]);
        assert_eq!(map.len(), 2);
        assert!(!map.contains_key(&2));
    }

    #[test]
    fn geometries_follow_the_objects_that_reference_them() {
        // object key -> geometry id
        let mut objects: FxHashMap<(u32, usize), u64> =
            [((0, 0), 10), ((0, 1), 10), ((1, 0), 20)].into_iter().collect();
        let mut geometries: FxHashMap<u64, ()> = [(10, ()), (20, ()), (30, ())].into_iter().collect();

        let live: FxHashSet<(u32, usize)> = [(0, 1)].into_iter().collect();
        assert_eq!(evict(&mut objects, |key| live.contains(key)).len(), 2);
        let referenced: FxHashSet<u64> = objects.values().copied().collect();
        assert_eq!(evict(&mut geometries, |id| referenced.contains(id)).len(), 2);

        assert_eq!(geometries.keys().copied().collect::<Vec<_>>(), vec![10]);
    }

    #[test]
    fn evict_on_fully_live_map_is_empty() {
        let mut map: FxHashMap<u64, u8> = [(7, 0)].into_iter().collect();
        assert!(evict(&mut map, |_| true).is_empty());
        assert_eq!(map.len(), 1);
    }
}
