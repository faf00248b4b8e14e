//! Camera-facing unit quad with swappable per-instance attribute buffers.
//!
//! The quad's divisor-0 geometry (position/uv/normal) is packed once into
//! a single interleaved buffer at initialization and never resized. Each
//! declared divisor-1 attribute gets its own GPU buffer, created lazily on
//! first data assignment and re-uploaded in place on every later one, so
//! per-instance data can be swapped every frame without touching the
//! vertex layout or the static geometry.

use std::fmt;

use rustc_hash::FxHashMap;
use wgpu::util::DeviceExt;

use crate::gpu::attribute_buffer::AttributeBuffer;
use crate::gpu::lifecycle::{Lifecycle, LifecycleError};
use crate::gpu::render_context::RenderContext;
use crate::splat::attributes::{AttributeSet, SplatAttribute};

/// Mesh-level contract violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshError {
    /// `set_attribute_data` targeted an attribute the mesh never declared.
    UndeclaredAttribute(SplatAttribute),
    /// `set_attribute_data` targeted a divisor-0 attribute; static
    /// geometry is packed once and cannot be swapped.
    StaticAttribute(SplatAttribute),
    /// A declared per-instance attribute had no data at draw time.
    MissingInstanceData(SplatAttribute),
    /// Lifecycle violation (use before init, over-release).
    Lifecycle(LifecycleError),
}

impl fmt::Display for MeshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UndeclaredAttribute(a) => {
                write!(f, "attribute '{}' was not declared", a.name())
            }
            Self::StaticAttribute(a) => write!(
                f,
                "attribute '{}' is static and cannot be swapped",
                a.name()
            ),
            Self::MissingInstanceData(a) => write!(
                f,
                "instance attribute '{}' has no data assigned",
                a.name()
            ),
            Self::Lifecycle(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for MeshError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Lifecycle(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LifecycleError> for MeshError {
    fn from(e: LifecycleError) -> Self {
        Self::Lifecycle(e)
    }
}

/// Interleaved divisor-0 vertex of the unit quad.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct QuadVertex {
    position: [f32; 3],
    uv: [f32; 2],
    normal: [f32; 3],
}

const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex {
        position: [-1.0, -1.0, 0.0],
        uv: [0.0, 0.0],
        normal: [0.0, 0.0, -1.0],
    },
    QuadVertex {
        position: [1.0, -1.0, 0.0],
        uv: [1.0, 0.0],
        normal: [0.0, 0.0, -1.0],
    },
    QuadVertex {
        position: [1.0, 1.0, 0.0],
        uv: [1.0, 1.0],
        normal: [0.0, 0.0, -1.0],
    },
    QuadVertex {
        position: [-1.0, 1.0, 0.0],
        uv: [0.0, 1.0],
        normal: [0.0, 0.0, -1.0],
    },
];

/// Two triangles, 6 indices.
const QUAD_INDICES: [u32; 6] = [0, 3, 2, 0, 2, 1];

static STATIC_ATTRIBUTES: [wgpu::VertexAttribute; 3] = [
    wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32x3,
        offset: 0,
        shader_location: SplatAttribute::Position.shader_location(),
    },
    wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32x2,
        offset: 12,
        shader_location: SplatAttribute::Uv.shader_location(),
    },
    wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32x3,
        offset: 20,
        shader_location: SplatAttribute::Normal.shader_location(),
    },
];

static CENTER_ATTRIBUTES: [wgpu::VertexAttribute; 1] =
    instance_attribute(SplatAttribute::Center);
static ROTATION_ATTRIBUTES: [wgpu::VertexAttribute; 1] =
    instance_attribute(SplatAttribute::Rotation);
static SCALE_ATTRIBUTES: [wgpu::VertexAttribute; 1] =
    instance_attribute(SplatAttribute::Scale);
static COLOR_ATTRIBUTES: [wgpu::VertexAttribute; 1] =
    instance_attribute(SplatAttribute::Color);

const fn instance_attribute(
    attribute: SplatAttribute,
) -> [wgpu::VertexAttribute; 1] {
    [wgpu::VertexAttribute {
        format: attribute.format(),
        offset: 0,
        shader_location: attribute.shader_location(),
    }]
}

/// The unit quad shared by all splats of one instance.
pub struct QuadMesh {
    attributes: AttributeSet,
    instance_buffers: FxHashMap<SplatAttribute, AttributeBuffer>,
    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
    lifecycle: Lifecycle,
}

impl QuadMesh {
    /// Quad mesh declaring the static geometry attributes plus the given
    /// per-instance ones. The declaration is fixed for the mesh's
    /// lifetime.
    #[must_use]
    pub fn new(instanced: &[SplatAttribute]) -> Self {
        let mut attributes = AttributeSet::new();
        attributes.add(SplatAttribute::Position);
        attributes.add(SplatAttribute::Uv);
        attributes.add(SplatAttribute::Normal);
        for &attribute in instanced {
            attributes.add(attribute);
        }

        Self {
            attributes,
            instance_buffers: FxHashMap::default(),
            vertex_buffer: None,
            index_buffer: None,
            lifecycle: Lifecycle::new(),
        }
    }

    /// Vertex buffer layouts for a pipeline drawing this mesh: slot 0 is
    /// the interleaved static geometry, followed by one slot per
    /// instanced attribute in declaration order.
    #[must_use]
    pub fn vertex_buffer_layouts(
        instanced: &[SplatAttribute],
    ) -> Vec<wgpu::VertexBufferLayout<'static>> {
        let mut layouts = vec![wgpu::VertexBufferLayout {
            array_stride: size_of::<QuadVertex>()
                as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &STATIC_ATTRIBUTES,
        }];

        for &attribute in instanced {
            let attributes: &'static [wgpu::VertexAttribute] =
                match attribute {
                    SplatAttribute::Center => &CENTER_ATTRIBUTES,
                    SplatAttribute::Rotation => &ROTATION_ATTRIBUTES,
                    SplatAttribute::Scale => &SCALE_ATTRIBUTES,
                    SplatAttribute::Color => &COLOR_ATTRIBUTES,
                    SplatAttribute::Position
                    | SplatAttribute::Uv
                    | SplatAttribute::Normal => &STATIC_ATTRIBUTES[..0],
                };
            layouts.push(wgpu::VertexBufferLayout {
                array_stride: (attribute.components() * 4)
                    as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes,
            });
        }

        layouts
    }

    /// Register an owner; the first acquire uploads the static geometry.
    pub fn acquire(&mut self, context: &RenderContext) {
        if !self.lifecycle.acquire() {
            return;
        }

        self.vertex_buffer = Some(context.device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("Splat Quad Vertex Buffer"),
                contents: bytemuck::cast_slice(&QUAD_VERTICES),
                usage: wgpu::BufferUsages::VERTEX,
            },
        ));
        self.index_buffer = Some(context.device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("Splat Quad Index Buffer"),
                contents: bytemuck::cast_slice(&QUAD_INDICES),
                usage: wgpu::BufferUsages::INDEX,
            },
        ));
    }

    /// Drop one owner; the final release frees all GPU buffers.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::Lifecycle`] on over-release.
    pub fn release(&mut self) -> Result<(), MeshError> {
        if self.lifecycle.release("quad mesh")? {
            self.vertex_buffer = None;
            self.index_buffer = None;
            self.instance_buffers.clear();
        }
        Ok(())
    }

    /// Replace the data of a declared per-instance attribute.
    ///
    /// The GPU buffer is created on first use and re-uploaded in place
    /// afterwards; the static geometry and the vertex layout are
    /// untouched.
    ///
    /// # Errors
    ///
    /// Fails fast if the attribute was never declared, is not a
    /// per-instance attribute, or the mesh is not initialized.
    pub fn set_attribute_data(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        attribute: SplatAttribute,
        data: &[f32],
    ) -> Result<(), MeshError> {
        if !self.attributes.contains(attribute) {
            return Err(MeshError::UndeclaredAttribute(attribute));
        }
        if !attribute.is_instanced() {
            return Err(MeshError::StaticAttribute(attribute));
        }
        self.lifecycle.ensure_initialized("quad mesh")?;

        let buffer =
            self.instance_buffers.entry(attribute).or_insert_with(|| {
                AttributeBuffer::new(format!(
                    "Splat {} Buffer",
                    attribute.name()
                ))
            });
        buffer.write(device, queue, data);
        Ok(())
    }

    /// Bind the static geometry, every instanced attribute buffer, and
    /// the index buffer for an instanced draw.
    ///
    /// # Errors
    ///
    /// Fails fast if the mesh is not initialized or any declared
    /// per-instance attribute still has no data; sampling an unset
    /// instance buffer during a draw would read garbage.
    pub fn bind<'a>(
        &'a self,
        render_pass: &mut wgpu::RenderPass<'a>,
    ) -> Result<(), MeshError> {
        self.lifecycle.ensure_initialized("quad mesh")?;
        let (Some(vertex_buffer), Some(index_buffer)) =
            (&self.vertex_buffer, &self.index_buffer)
        else {
            return Err(MeshError::Lifecycle(
                LifecycleError::NotInitialized {
                    resource: "quad mesh",
                },
            ));
        };

        render_pass.set_vertex_buffer(0, vertex_buffer.slice(..));

        let mut slot = 1;
        for attribute in self.attributes.instanced() {
            let buffer = self
                .instance_buffers
                .get(&attribute)
                .and_then(AttributeBuffer::buffer)
                .ok_or(MeshError::MissingInstanceData(attribute))?;
            render_pass.set_vertex_buffer(slot, buffer.slice(..));
            slot += 1;
        }

        render_pass
            .set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        Ok(())
    }

    /// Index count of the quad (two triangles).
    #[must_use]
    pub const fn num_indices(&self) -> u32 {
        QUAD_INDICES.len() as u32
    }

    /// The declared attribute set.
    #[must_use]
    pub const fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    /// Whether the static geometry has been uploaded.
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.lifecycle.is_initialized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INSTANCED: [SplatAttribute; 4] = [
        SplatAttribute::Center,
        SplatAttribute::Rotation,
        SplatAttribute::Scale,
        SplatAttribute::Color,
    ];

    #[test]
    fn test_declares_static_and_instanced_attributes() {
        let mesh = QuadMesh::new(&INSTANCED);
        assert!(mesh.attributes().contains(SplatAttribute::Position));
        assert!(mesh.attributes().contains(SplatAttribute::Uv));
        assert!(mesh.attributes().contains(SplatAttribute::Normal));
        assert!(mesh.attributes().contains(SplatAttribute::Color));
        assert_eq!(mesh.attributes().instanced().count(), 4);
        assert!(!mesh.is_initialized());
    }

    #[test]
    fn test_six_indices() {
        let mesh = QuadMesh::new(&INSTANCED);
        assert_eq!(mesh.num_indices(), 6);
    }

    #[test]
    fn test_vertex_buffer_layouts() {
        let layouts = QuadMesh::vertex_buffer_layouts(&INSTANCED);
        assert_eq!(layouts.len(), 5);

        // Slot 0: interleaved static geometry, per-vertex step.
        assert_eq!(layouts[0].step_mode, wgpu::VertexStepMode::Vertex);
        assert_eq!(layouts[0].array_stride, 32);
        assert_eq!(layouts[0].attributes.len(), 3);

        // Instanced slots step per instance, one attribute each.
        for (layout, attribute) in layouts[1..].iter().zip(INSTANCED) {
            assert_eq!(layout.step_mode, wgpu::VertexStepMode::Instance);
            assert_eq!(
                layout.array_stride,
                (attribute.components() * 4) as wgpu::BufferAddress
            );
            assert_eq!(layout.attributes.len(), 1);
            assert_eq!(
                layout.attributes[0].shader_location,
                attribute.shader_location()
            );
        }
    }
}
