//! Aggregates splat instances behind one pipeline and camera uniform.
//!
//! Instances render in insertion order; only the ordering inside each
//! instance is sorted, no inter-instance depth sorting happens here.

use glam::Mat4;
use wgpu::util::DeviceExt;

use crate::camera::{Camera, CameraUniform};
use crate::error::LusterError;
use crate::gpu::lifecycle::{Lifecycle, LifecycleError};
use crate::gpu::render_context::RenderContext;
use crate::options::DisplayOptions;
use crate::splat::instance::{SplatInstance, INSTANCE_ATTRIBUTES};
use crate::splat::quad_mesh::QuadMesh;

/// Renders an ordered collection of [`SplatInstance`]s.
pub struct SplatRenderer {
    instances: Vec<SplatInstance>,
    pipeline: Option<wgpu::RenderPipeline>,
    camera_buffer: Option<wgpu::Buffer>,
    camera_bind_group: Option<wgpu::BindGroup>,
    camera_uniform: CameraUniform,
    lifecycle: Lifecycle,
}

impl Default for SplatRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl SplatRenderer {
    /// Empty renderer. No GPU resources exist until [`acquire`].
    ///
    /// [`acquire`]: Self::acquire
    #[must_use]
    pub fn new() -> Self {
        Self {
            instances: Vec::new(),
            pipeline: None,
            camera_buffer: None,
            camera_bind_group: None,
            camera_uniform: CameraUniform::new(),
            lifecycle: Lifecycle::new(),
        }
    }

    /// Register an owner. The first acquire builds the pipeline and
    /// camera uniform, then initializes every contained instance.
    ///
    /// # Errors
    ///
    /// Propagates instance initialization failures.
    pub fn acquire(
        &mut self,
        context: &RenderContext,
    ) -> Result<(), LusterError> {
        if !self.lifecycle.acquire() {
            return Ok(());
        }

        let device = &context.device;

        let camera_layout = device.create_bind_group_layout(
            &wgpu::BindGroupLayoutDescriptor {
                label: Some("Splat Camera Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            },
        );

        let camera_buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Splat Camera Buffer"),
                contents: bytemuck::bytes_of(&self.camera_uniform),
                usage: wgpu::BufferUsages::UNIFORM
                    | wgpu::BufferUsages::COPY_DST,
            });

        let camera_bind_group =
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Splat Camera Bind Group"),
                layout: &camera_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                }],
            });

        self.pipeline =
            Some(Self::create_pipeline(context, &camera_layout));
        self.camera_buffer = Some(camera_buffer);
        self.camera_bind_group = Some(camera_bind_group);

        for instance in &mut self.instances {
            instance.acquire(context)?;
        }
        Ok(())
    }

    /// Drop one owner. The final release tears down every instance and
    /// the pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`LusterError::Lifecycle`] on over-release.
    pub fn release(&mut self) -> Result<(), LusterError> {
        if !self.lifecycle.release("splat renderer")? {
            return Ok(());
        }

        for instance in &mut self.instances {
            instance.release()?;
        }
        self.pipeline = None;
        self.camera_buffer = None;
        self.camera_bind_group = None;
        Ok(())
    }

    /// Append an instance. If the renderer is already initialized the
    /// instance is initialized immediately (late join).
    ///
    /// # Errors
    ///
    /// Propagates instance initialization failures.
    pub fn add_instance(
        &mut self,
        context: &RenderContext,
        mut instance: SplatInstance,
    ) -> Result<(), LusterError> {
        if self.lifecycle.is_initialized() {
            instance.acquire(context)?;
        }
        self.instances.push(instance);
        Ok(())
    }

    /// Remove the instance at `index`, tearing it down if the renderer is
    /// initialized. Out-of-range indices are ignored.
    ///
    /// # Errors
    ///
    /// Propagates instance release failures.
    pub fn remove_instance(
        &mut self,
        index: usize,
    ) -> Result<(), LusterError> {
        if index >= self.instances.len() {
            return Ok(());
        }
        let mut instance = self.instances.remove(index);
        if self.lifecycle.is_initialized() {
            instance.release()?;
        }
        Ok(())
    }

    /// Update the camera uniform and forward to every instance in
    /// collection order.
    ///
    /// # Errors
    ///
    /// Returns [`LusterError::Lifecycle`] if the renderer is not
    /// initialized; propagates instance update failures.
    pub fn update(
        &mut self,
        context: &RenderContext,
        camera: &Camera,
        parent_transform: Option<&Mat4>,
        display: &DisplayOptions,
    ) -> Result<(), LusterError> {
        self.lifecycle.ensure_initialized("splat renderer")?;

        self.camera_uniform
            .update_view_proj(camera, display.splat_scale);
        if let Some(buffer) = &self.camera_buffer {
            context.queue.write_buffer(
                buffer,
                0,
                bytemuck::bytes_of(&self.camera_uniform),
            );
        }

        for instance in &mut self.instances {
            instance.update(context, camera, parent_transform)?;
        }
        Ok(())
    }

    /// Draw every instance in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`LusterError::Lifecycle`] if the renderer is not
    /// initialized; propagates instance draw failures.
    pub fn render<'a>(
        &'a self,
        render_pass: &mut wgpu::RenderPass<'a>,
    ) -> Result<(), LusterError> {
        self.lifecycle.ensure_initialized("splat renderer")?;
        let (Some(pipeline), Some(camera_bind_group)) =
            (&self.pipeline, &self.camera_bind_group)
        else {
            return Err(LusterError::Lifecycle(
                LifecycleError::NotInitialized {
                    resource: "splat renderer",
                },
            ));
        };

        render_pass.set_pipeline(pipeline);
        render_pass.set_bind_group(0, camera_bind_group, &[]);

        for instance in &self.instances {
            instance.render(render_pass)?;
        }
        Ok(())
    }

    /// Number of contained instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether the renderer holds no instances.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// The instance at `index`, if in range.
    #[must_use]
    pub fn instance(&self, index: usize) -> Option<&SplatInstance> {
        self.instances.get(index)
    }

    fn create_pipeline(
        context: &RenderContext,
        camera_layout: &wgpu::BindGroupLayout,
    ) -> wgpu::RenderPipeline {
        let shader = context.device.create_shader_module(wgpu::include_wgsl!(
            "../../assets/shaders/splat.wgsl"
        ));

        let pipeline_layout = context.device.create_pipeline_layout(
            &wgpu::PipelineLayoutDescriptor {
                label: Some("Splat Pipeline Layout"),
                bind_group_layouts: &[camera_layout],
                push_constant_ranges: &[],
            },
        );

        let buffers = QuadMesh::vertex_buffer_layouts(&INSTANCE_ATTRIBUTES);

        context.device.create_render_pipeline(
            &wgpu::RenderPipelineDescriptor {
                label: Some("Splat Render Pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &buffers,
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: context.config.format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                // Blending is order-dependent; instances pre-sort
                // far-to-near so no depth buffer is attached.
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            },
        )
    }
}
