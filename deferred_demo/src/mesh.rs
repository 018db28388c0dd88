/// Demo meshes - interleaved position / normal / uv geometry uploaded once

use deferred_engine::deferred::Result;
use deferred_engine::deferred::context::{
    GraphicsContext, VertexArrayHandle, VertexAttribute, VertexLayout, PrimitiveTopology,
};

/// Floats per vertex: position (3), normal (3), uv (2)
const FLOATS_PER_VERTEX: usize = 8;

/// Uploaded mesh
pub struct Mesh {
    pub name: String,
    vertex_array: VertexArrayHandle,
    vertex_count: u32,
}

impl Mesh {
    /// Upload interleaved vertices (`FLOATS_PER_VERTEX` floats each)
    pub fn upload(ctx: &mut dyn GraphicsContext, name: &str, vertices: &[f32]) -> Result<Self> {
        let layout = VertexLayout {
            stride: (FLOATS_PER_VERTEX * std::mem::size_of::<f32>()) as u32,
            attributes: vec![
                VertexAttribute { location: 0, components: 3, offset: 0 },
                VertexAttribute { location: 1, components: 3, offset: 12 },
                VertexAttribute { location: 2, components: 2, offset: 24 },
            ],
        };
        let vertex_array = ctx.create_vertex_array(&layout, bytemuck::cast_slice(vertices))?;
        Ok(Self {
            name: name.to_string(),
            vertex_array,
            vertex_count: (vertices.len() / FLOATS_PER_VERTEX) as u32,
        })
    }

    pub fn draw(&self, ctx: &mut dyn GraphicsContext) {
        ctx.draw_arrays(self.vertex_array, PrimitiveTopology::Triangles, 0, self.vertex_count);
    }

    pub fn destroy(self, ctx: &mut dyn GraphicsContext) {
        ctx.delete_vertex_array(self.vertex_array);
    }
}

/// Unit cube, 36 vertices
pub fn cube_vertices() -> Vec<f32> {
    // (normal, tangent u, tangent v) per face
    let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
    ];
    let corners = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0), (1.0, 1.0), (0.0, 1.0)];

    let mut vertices = Vec::with_capacity(faces.len() * corners.len() * FLOATS_PER_VERTEX);
    for (normal, u, v) in faces {
        for (s, t) in corners {
            for axis in 0..3 {
                let offset = (s - 0.5) * u[axis] + (t - 0.5) * v[axis];
                vertices.push(normal[axis] * 0.5 + offset);
            }
            vertices.extend_from_slice(&normal);
            vertices.extend_from_slice(&[s, t]);
        }
    }
    vertices
}
