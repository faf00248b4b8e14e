//! Vertex attribute declarations for splat meshes.
//!
//! A mesh declares the attributes it carries up front. Divisor-0
//! attributes describe the shared quad geometry and are packed once into
//! an interleaved buffer; divisor-1 attributes advance per instance and
//! each live in their own swappable buffer.

/// Identifies one vertex attribute a splat mesh can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SplatAttribute {
    /// Quad corner position, divisor 0.
    Position,
    /// Quad texture coordinate, divisor 0.
    Uv,
    /// Quad facing normal, divisor 0.
    Normal,
    /// Splat center in model space, divisor 1.
    Center,
    /// Splat orientation as a unit quaternion, divisor 1.
    Rotation,
    /// Splat anisotropic scale in log space, divisor 1.
    Scale,
    /// Splat RGBA color with opacity already resolved, divisor 1.
    Color,
}

impl SplatAttribute {
    /// Number of f32 components per element.
    #[must_use]
    pub const fn components(self) -> usize {
        match self {
            Self::Position | Self::Normal | Self::Center | Self::Scale => 3,
            Self::Uv => 2,
            Self::Rotation | Self::Color => 4,
        }
    }

    /// Instancing step rate: 0 advances per vertex, 1 per instance.
    #[must_use]
    pub const fn divisor(self) -> u32 {
        match self {
            Self::Position | Self::Uv | Self::Normal => 0,
            Self::Center | Self::Rotation | Self::Scale | Self::Color => 1,
        }
    }

    /// Whether the attribute advances per instance.
    #[must_use]
    pub const fn is_instanced(self) -> bool {
        self.divisor() == 1
    }

    /// Shader location the attribute binds to.
    #[must_use]
    pub const fn shader_location(self) -> u32 {
        match self {
            Self::Position => 0,
            Self::Uv => 1,
            Self::Normal => 2,
            Self::Center => 3,
            Self::Rotation => 4,
            Self::Scale => 5,
            Self::Color => 6,
        }
    }

    /// Matching wgpu vertex format.
    #[must_use]
    pub const fn format(self) -> wgpu::VertexFormat {
        match self.components() {
            2 => wgpu::VertexFormat::Float32x2,
            3 => wgpu::VertexFormat::Float32x3,
            _ => wgpu::VertexFormat::Float32x4,
        }
    }

    /// Display name for buffer labels and error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Position => "position",
            Self::Uv => "uv",
            Self::Normal => "normal",
            Self::Center => "center",
            Self::Rotation => "rotation",
            Self::Scale => "scale",
            Self::Color => "color",
        }
    }
}

/// The set of attributes a mesh declares at construction, in declaration
/// order.
#[derive(Debug, Clone, Default)]
pub struct AttributeSet {
    attributes: Vec<SplatAttribute>,
}

impl AttributeSet {
    /// Empty declaration set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            attributes: Vec::new(),
        }
    }

    /// Declare an attribute. Re-declaring one is a no-op.
    pub fn add(&mut self, attribute: SplatAttribute) {
        if !self.contains(attribute) {
            self.attributes.push(attribute);
        }
    }

    /// Whether the attribute was declared.
    #[must_use]
    pub fn contains(&self, attribute: SplatAttribute) -> bool {
        self.attributes.contains(&attribute)
    }

    /// All declared attributes in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = SplatAttribute> + '_ {
        self.attributes.iter().copied()
    }

    /// Declared divisor-1 attributes in declaration order.
    pub fn instanced(&self) -> impl Iterator<Item = SplatAttribute> + '_ {
        self.iter().filter(|a| a.is_instanced())
    }

    /// Float stride of one interleaved vertex over the divisor-0
    /// attributes.
    #[must_use]
    pub fn static_vertex_size(&self) -> usize {
        self.iter()
            .filter(|a| !a.is_instanced())
            .map(SplatAttribute::components)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_widths() {
        assert_eq!(SplatAttribute::Position.components(), 3);
        assert_eq!(SplatAttribute::Uv.components(), 2);
        assert_eq!(SplatAttribute::Center.components(), 3);
        assert_eq!(SplatAttribute::Rotation.components(), 4);
        assert_eq!(SplatAttribute::Scale.components(), 3);
        assert_eq!(SplatAttribute::Color.components(), 4);
    }

    #[test]
    fn test_divisors() {
        assert_eq!(SplatAttribute::Position.divisor(), 0);
        assert_eq!(SplatAttribute::Uv.divisor(), 0);
        assert_eq!(SplatAttribute::Normal.divisor(), 0);
        assert_eq!(SplatAttribute::Center.divisor(), 1);
        assert_eq!(SplatAttribute::Rotation.divisor(), 1);
        assert_eq!(SplatAttribute::Scale.divisor(), 1);
        assert_eq!(SplatAttribute::Color.divisor(), 1);
    }

    #[test]
    fn test_declaration_set() {
        let mut set = AttributeSet::new();
        set.add(SplatAttribute::Position);
        set.add(SplatAttribute::Uv);
        set.add(SplatAttribute::Center);
        set.add(SplatAttribute::Center);

        assert!(set.contains(SplatAttribute::Position));
        assert!(set.contains(SplatAttribute::Center));
        assert!(!set.contains(SplatAttribute::Color));
        assert_eq!(set.iter().count(), 3);
        assert_eq!(set.instanced().count(), 1);
    }

    #[test]
    fn test_static_vertex_size() {
        let mut set = AttributeSet::new();
        set.add(SplatAttribute::Position);
        set.add(SplatAttribute::Uv);
        set.add(SplatAttribute::Normal);
        set.add(SplatAttribute::Center);
        // 3 + 2 + 3; the instanced attribute does not contribute
        assert_eq!(set.static_vertex_size(), 8);
    }
}
