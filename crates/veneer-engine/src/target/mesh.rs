use bytemuck::{Pod, Zeroable};

use crate::device::{
    BufferKind, GraphicsDevice, GraphicsHandle, VertexArrayDesc, VertexAttribute,
};
use crate::error::RenderError;

/// Interleaved compositing vertex: NDC position followed by texture coordinates.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
}

impl QuadVertex {
    const STRIDE: u32 = std::mem::size_of::<QuadVertex>() as u32;

    fn attributes() -> Vec<VertexAttribute> {
        vec![
            VertexAttribute {
                location: 0,
                components: 2,
                offset: 0,
            },
            VertexAttribute {
                location: 1,
                components: 2,
                offset: std::mem::size_of::<[f32; 2]>() as u32,
            },
        ]
    }
}

/// Full-viewport quad. UV (0, 0) is the top-left texel of the canvas.
pub const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex { position: [-1.0, 1.0], uv: [0.0, 0.0] },
    QuadVertex { position: [-1.0, -1.0], uv: [0.0, 1.0] },
    QuadVertex { position: [1.0, -1.0], uv: [1.0, 1.0] },
    QuadVertex { position: [1.0, 1.0], uv: [1.0, 0.0] },
];

pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

pub const QUAD_INDEX_COUNT: u32 = QUAD_INDICES.len() as u32;

/// GPU copy of the compositing quad.
///
/// Contents never change; only the handles are recreated, and only after
/// [`invalidate`](Self::invalidate).
#[derive(Debug, Default)]
pub struct CompositingMesh {
    vertex_array: GraphicsHandle,
    vertex_buffer: GraphicsHandle,
    index_buffer: GraphicsHandle,
}

impl CompositingMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uploads the quad if it is not already resident.
    pub fn create(&mut self, device: &mut dyn GraphicsDevice) {
        if self.is_created() {
            return;
        }

        self.vertex_buffer =
            device.create_buffer(BufferKind::Vertex, bytemuck::cast_slice(&QUAD_VERTICES));
        self.index_buffer =
            device.create_buffer(BufferKind::Index, bytemuck::cast_slice(&QUAD_INDICES));
        self.vertex_array = device.create_vertex_array(VertexArrayDesc {
            vertex_buffer: self.vertex_buffer,
            index_buffer: self.index_buffer,
            stride: QuadVertex::STRIDE,
            attributes: QuadVertex::attributes(),
        });
        log::debug!(
            "compositing mesh created: vao {} vbo {} ibo {}",
            self.vertex_array,
            self.vertex_buffer,
            self.index_buffer
        );
    }

    /// Drops the GPU copy so the next [`create`](Self::create) uploads it again.
    pub fn invalidate(&mut self, device: &mut dyn GraphicsDevice) {
        self.destroy(device);
    }

    /// Releases all handles. Safe to call any number of times.
    pub fn destroy(&mut self, device: &mut dyn GraphicsDevice) {
        let vertex_array = GraphicsHandle::take(&mut self.vertex_array);
        let vertex_buffer = GraphicsHandle::take(&mut self.vertex_buffer);
        let index_buffer = GraphicsHandle::take(&mut self.index_buffer);
        if vertex_array.is_allocated() {
            device.delete_vertex_array(vertex_array);
        }
        if vertex_buffer.is_allocated() {
            device.delete_buffer(vertex_buffer);
        }
        if index_buffer.is_allocated() {
            device.delete_buffer(index_buffer);
        }
    }

    /// Vertex array for a draw. Fails until the mesh is created.
    pub fn ready_vertex_array(&self) -> Result<GraphicsHandle, RenderError> {
        if self.is_created() {
            Ok(self.vertex_array)
        } else {
            Err(RenderError::MeshNotCreated)
        }
    }

    #[inline]
    pub fn is_created(&self) -> bool {
        self.vertex_array.is_allocated()
    }

    pub fn vertex_array(&self) -> GraphicsHandle {
        self.vertex_array
    }

    pub fn vertex_buffer(&self) -> GraphicsHandle {
        self.vertex_buffer
    }

    pub fn index_buffer(&self) -> GraphicsHandle {
        self.index_buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::HeadlessDevice;

    #[test]
    fn vertex_is_four_floats() {
        assert_eq!(QuadVertex::STRIDE, 16);
        assert_eq!(bytemuck::cast_slice::<QuadVertex, f32>(&QUAD_VERTICES).len(), 16);
    }

    #[test]
    fn indices_cover_two_triangles() {
        assert_eq!(QUAD_INDEX_COUNT, 6);
        assert!(QUAD_INDICES.iter().all(|&i| (i as usize) < QUAD_VERTICES.len()));
    }

    #[test]
    fn create_uploads_quad_once() {
        let mut dev = HeadlessDevice::default();
        let mut mesh = CompositingMesh::new();
        mesh.create(&mut dev);
        let vao = mesh.vertex_array();
        mesh.create(&mut dev);

        assert_eq!(mesh.vertex_array(), vao);
        assert_eq!(dev.object_counts().buffers, 2);
        assert_eq!(dev.object_counts().vertex_arrays, 1);

        let bytes = dev.buffer_contents(mesh.vertex_buffer()).unwrap();
        assert_eq!(bytes, bytemuck::cast_slice::<QuadVertex, u8>(&QUAD_VERTICES));
    }

    #[test]
    fn invalidate_recreates_handles_with_same_content() {
        let mut dev = HeadlessDevice::default();
        let mut mesh = CompositingMesh::new();
        mesh.create(&mut dev);
        let before = mesh.vertex_buffer();

        mesh.invalidate(&mut dev);
        assert!(matches!(mesh.ready_vertex_array(), Err(RenderError::MeshNotCreated)));
        mesh.create(&mut dev);

        assert_ne!(mesh.vertex_buffer(), before);
        let bytes = dev.buffer_contents(mesh.index_buffer()).unwrap();
        assert_eq!(bytes, bytemuck::cast_slice::<u32, u8>(&QUAD_INDICES));
        assert_eq!(dev.object_counts().buffers, 2);
    }

    #[test]
    fn destroy_twice_leaves_nothing() {
        let mut dev = HeadlessDevice::default();
        let mut mesh = CompositingMesh::new();
        mesh.create(&mut dev);
        mesh.destroy(&mut dev);
        mesh.destroy(&mut dev);
        assert_eq!(dev.object_counts().total(), 0);
        assert_eq!(mesh.vertex_buffer(), GraphicsHandle::NONE);
    }
}
