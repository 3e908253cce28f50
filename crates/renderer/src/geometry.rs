use std::fmt;
use std::mem::size_of;

use tracing::debug;

use crate::error::PipelineError;
use crate::gpu::GraphicsBackend;

const FLOAT_BYTES: usize = size_of::<f32>();

/// Smallest `GL_MAX_VERTEX_ATTRIB_STRIDE` a conforming driver may report.
const MAX_STRIDE: usize = 2048;

/// Attribute index the vertex shader reads positions from.
pub const POSITION_ATTRIBUTE: u32 = 0;

/// One `f32` vertex attribute; `stride` and `offset` are in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub index: u32,
    pub components: usize,
    pub stride: usize,
    pub offset: usize,
}

/// Ordered attribute list sharing one interleaved buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexLayout {
    attributes: Vec<VertexAttribute>,
}

impl VertexLayout {
    pub fn new(attributes: Vec<VertexAttribute>) -> Self {
        Self { attributes }
    }

    /// Tightly packed positions at attribute 0.
    pub fn positions(components: usize) -> Self {
        Self::new(vec![VertexAttribute {
            index: POSITION_ATTRIBUTE,
            components,
            stride: components * FLOAT_BYTES,
            offset: 0,
        }])
    }

    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    /// Floats per vertex, derived from the shared stride.
    pub fn components_per_vertex(&self) -> usize {
        self.attributes
            .first()
            .map(|attribute| attribute.stride / FLOAT_BYTES)
            .unwrap_or(0)
    }

    /// Checks the layout itself against the attribute contract.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let Some(first) = self.attributes.first() else {
            return Err(PipelineError::config("vertex layout has no attributes"));
        };
        if !self
            .attributes
            .iter()
            .any(|attribute| attribute.index == POSITION_ATTRIBUTE)
        {
            return Err(PipelineError::config(
                "vertex layout must define the position attribute at index 0",
            ));
        }
        for (position, attribute) in self.attributes.iter().enumerate() {
            if !(1..=4).contains(&attribute.components) {
                return Err(PipelineError::config(format!(
                    "attribute {} has {} components; expected 1 to 4",
                    attribute.index, attribute.components
                )));
            }
            if attribute.stride == 0
                || attribute.stride % FLOAT_BYTES != 0
                || attribute.stride > MAX_STRIDE
            {
                return Err(PipelineError::config(format!(
                    "attribute {} stride {} is not a positive multiple of {FLOAT_BYTES} up to {MAX_STRIDE}",
                    attribute.index, attribute.stride
                )));
            }
            if attribute.stride != first.stride {
                return Err(PipelineError::config(format!(
                    "attribute {} stride {} differs from the buffer stride {}",
                    attribute.index, attribute.stride, first.stride
                )));
            }
            if attribute.offset % FLOAT_BYTES != 0
                || attribute.components * FLOAT_BYTES > attribute.stride.saturating_sub(attribute.offset)
            {
                return Err(PipelineError::config(format!(
                    "attribute {} at offset {} does not fit in a {}-byte vertex",
                    attribute.index, attribute.offset, attribute.stride
                )));
            }
            if self.attributes[..position]
                .iter()
                .any(|other| other.index == attribute.index)
            {
                return Err(PipelineError::config(format!(
                    "attribute index {} is defined twice",
                    attribute.index
                )));
            }
        }
        Ok(())
    }

    /// Checks that `vertices` holds exactly `vertex_count` vertices.
    pub fn validate_data(&self, vertex_count: usize, vertices: &[f32]) -> Result<(), PipelineError> {
        self.validate()?;
        if vertex_count == 0 {
            return Err(PipelineError::config("geometry has no vertices"));
        }
        if i32::try_from(vertex_count).is_err() {
            return Err(PipelineError::config(format!(
                "vertex count {vertex_count} exceeds the draw range"
            )));
        }
        let expected = vertex_count * self.components_per_vertex();
        if vertices.len() != expected {
            return Err(PipelineError::config(format!(
                "{} floats supplied for {vertex_count} vertices of {} components; expected {expected}",
                vertices.len(),
                self.components_per_vertex()
            )));
        }
        Ok(())
    }
}

/// Vertex array plus the static buffer it reads from.
#[must_use = "a geometry buffer owns GPU objects that must be released"]
pub struct GeometryBuffer<B: GraphicsBackend> {
    vertex_array: B::VertexArray,
    buffer: B::Buffer,
    layout: VertexLayout,
    vertex_count: usize,
}

impl<B: GraphicsBackend> GeometryBuffer<B> {
    /// Validates, then copies `vertices` into a new static buffer.
    ///
    /// Layout and length are checked before any GPU object is created. The
    /// vertex array is left unbound on return.
    pub fn upload(
        gl: &B,
        layout: VertexLayout,
        vertex_count: usize,
        vertices: &[f32],
    ) -> Result<Self, PipelineError> {
        layout.validate_data(vertex_count, vertices)?;

        let vertex_array = gl
            .create_vertex_array()
            .map_err(|reason| PipelineError::Resource {
                what: "vertex array",
                reason,
            })?;
        let buffer = match gl.create_buffer() {
            Ok(buffer) => buffer,
            Err(reason) => {
                gl.delete_vertex_array(vertex_array);
                return Err(PipelineError::Resource {
                    what: "vertex buffer",
                    reason,
                });
            }
        };

        gl.bind_vertex_array(Some(vertex_array));
        gl.bind_array_buffer(Some(buffer));
        gl.array_buffer_static_data(bytemuck::cast_slice(vertices));
        for attribute in layout.attributes() {
            // validated: components <= 4, offset < stride <= MAX_STRIDE
            gl.vertex_attrib_pointer_f32(
                attribute.index,
                attribute.components as i32,
                attribute.stride as i32,
                attribute.offset as i32,
            );
            gl.enable_vertex_attrib_array(attribute.index);
        }
        gl.bind_array_buffer(None);
        gl.bind_vertex_array(None);

        debug!(
            vertex_count,
            bytes = vertices.len() * FLOAT_BYTES,
            attributes = layout.attributes().len(),
            "geometry uploaded"
        );
        Ok(Self {
            vertex_array,
            buffer,
            layout,
            vertex_count,
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn bind(&self, gl: &B) {
        gl.bind_vertex_array(Some(self.vertex_array));
    }

    /// Draws every vertex as a triangle list; the vertex array must be bound.
    pub fn draw(&self, gl: &B) {
        gl.draw_triangles(0, self.vertex_count as i32);
    }

    pub fn release(self, gl: &B) {
        gl.bind_vertex_array(None);
        gl.delete_buffer(self.buffer);
        gl.delete_vertex_array(self.vertex_array);
        debug!("geometry released");
    }
}

impl<B: GraphicsBackend> fmt::Debug for GeometryBuffer<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeometryBuffer")
            .field("vertex_array", &self.vertex_array)
            .field("buffer", &self.buffer)
            .field("layout", &self.layout)
            .field("vertex_count", &self.vertex_count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::recording::{Call, RecordingBackend};
    use crate::types::TRIANGLE_VERTICES;

    #[test]
    fn uploads_triangle_positions() {
        let gl = RecordingBackend::new();
        let geometry = GeometryBuffer::upload(&gl, VertexLayout::positions(2), 3, &TRIANGLE_VERTICES)
            .expect("triangle uploads");

        assert_eq!(geometry.vertex_count(), 3);
        assert_eq!(gl.buffer_bytes(), bytemuck::cast_slice::<f32, u8>(&TRIANGLE_VERTICES));
        assert_eq!(gl.attributes(), vec![(0, 2, 8, 0)]);
        assert_eq!(gl.enabled_attributes(), vec![0]);

        geometry.bind(&gl);
        geometry.draw(&gl);
        assert!(gl.calls().contains(&Call::Draw { first: 0, count: 3 }));

        geometry.release(&gl);
        assert_eq!(gl.live_objects(), 0);
    }

    #[test]
    fn length_mismatch_is_caught_before_allocation() {
        let gl = RecordingBackend::new();
        let err = GeometryBuffer::upload(&gl, VertexLayout::positions(3), 3, &TRIANGLE_VERTICES)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
        assert_eq!(gl.live_objects(), 0);
        assert!(gl.calls().is_empty());
    }

    #[test]
    fn layout_requires_position_attribute() {
        let layout = VertexLayout::new(vec![VertexAttribute {
            index: 1,
            components: 2,
            stride: 8,
            offset: 0,
        }]);
        assert!(layout.validate().is_err());
    }

    #[test]
    fn layout_rejects_attribute_past_stride() {
        let layout = VertexLayout::new(vec![
            VertexAttribute {
                index: 0,
                components: 2,
                stride: 12,
                offset: 0,
            },
            VertexAttribute {
                index: 1,
                components: 2,
                stride: 12,
                offset: 8,
            },
        ]);
        assert!(layout.validate().is_err());
    }

    #[test]
    fn interleaved_layout_counts_components_from_stride() {
        let layout = VertexLayout::new(vec![
            VertexAttribute {
                index: 0,
                components: 2,
                stride: 20,
                offset: 0,
            },
            VertexAttribute {
                index: 1,
                components: 3,
                stride: 20,
                offset: 8,
            },
        ]);
        assert_eq!(layout.components_per_vertex(), 5);
        assert!(layout.validate_data(2, &[0.0; 10]).is_ok());
        assert!(layout.validate_data(2, &[0.0; 9]).is_err());
    }

    #[test]
    fn rejects_empty_geometry() {
        let layout = VertexLayout::positions(2);
        assert!(layout.validate_data(0, &[]).is_err());
    }
}
