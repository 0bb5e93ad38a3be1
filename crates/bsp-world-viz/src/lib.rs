//! Shared viewer utilities: scene generation, face drawing and cameras.

use std::hash::{Hash, Hasher};

use bsp_world::{Camera, Face, FaceIndex, FaceVisitor, MaterialId, World};
use macroquad::models::{draw_mesh, Mesh, Vertex};
use macroquad::prelude::*;
use nalgebra::{Point3, Rotation3, Vector2, Vector3};
use tracing_subscriber::EnvFilter;

pub mod navigator;
pub use navigator::TreeNavigator;

/// Installs a `fmt` subscriber filtered by `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

/// Generates a deterministic color from a face's material and vertices.
/// Fragments of a split face get their own colors, stable across frames.
pub fn face_color(face: &Face) -> Color {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    face.material.0.hash(&mut hasher);
    for v in face.vertices() {
        v.x.to_bits().hash(&mut hasher);
        v.y.to_bits().hash(&mut hasher);
        v.z.to_bits().hash(&mut hasher);
    }
    let hash = hasher.finish();

    let r = (((hash >> 16) & 0xFF) as u8).max(40);
    let g = (((hash >> 8) & 0xFF) as u8).max(40);
    let b = ((hash & 0xFF) as u8).max(40);

    Color::from_rgba(r, g, b, 255)
}

/// Draws a face as a triangle fan. Degenerate faces are skipped.
pub fn draw_face(face: &Face) {
    let verts = face.vertices();
    if verts.len() < 3 || face.is_degenerate() {
        return;
    }

    let color = face_color(face);
    let mesh_vertices: Vec<Vertex> = verts
        .iter()
        .zip(face.uvs())
        .map(|(p, uv)| Vertex::new2(vec3(p.x, p.y, p.z), vec2(uv.x, uv.y), color))
        .collect();

    let mut indices: Vec<u16> = Vec::with_capacity((verts.len() - 2) * 3);
    for i in 1..verts.len() - 1 {
        indices.push(0);
        indices.push(i as u16);
        indices.push((i + 1) as u16);
    }

    draw_mesh(&Mesh {
        vertices: mesh_vertices,
        indices,
        texture: None,
    });
}

/// Visitor that draws every face it receives and counts them.
#[derive(Debug, Default)]
pub struct RenderVisitor {
    pub drawn: usize,
}

impl FaceVisitor for RenderVisitor {
    fn visit(&mut self, _index: FaceIndex, face: &Face) {
        draw_face(face);
        self.drawn += 1;
    }
}

// Corner order shared by the box generators.
const BOX_CORNERS: [[f32; 3]; 8] = [
    [-1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [1.0, 1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, 1.0],
    [1.0, 1.0, 1.0],
    [-1.0, 1.0, 1.0],
];

// Counter-clockwise seen from outside.
const BOX_FACES: [[usize; 4]; 6] = [
    [4, 5, 6, 7], // +Z
    [1, 0, 3, 2], // -Z
    [0, 4, 7, 3], // -X
    [5, 1, 2, 6], // +X
    [7, 6, 2, 3], // +Y
    [0, 1, 5, 4], // -Y
];

fn box_faces(
    center: Point3<f32>,
    half: Vector3<f32>,
    rotation: &Rotation3<f32>,
    inward: bool,
    material: MaterialId,
) -> Vec<Face> {
    let corners: Vec<Point3<f32>> = BOX_CORNERS
        .iter()
        .map(|c| center + rotation * Vector3::new(c[0] * half.x, c[1] * half.y, c[2] * half.z))
        .collect();

    BOX_FACES
        .iter()
        .map(|quad| {
            let mut vertices: Vec<Point3<f32>> = quad.iter().map(|&i| corners[i]).collect();
            if inward {
                vertices.reverse();
            }
            Face::with_uvs(
                vertices,
                vec![
                    Vector2::new(0.0, 0.0),
                    Vector2::new(1.0, 0.0),
                    Vector2::new(1.0, 1.0),
                    Vector2::new(0.0, 1.0),
                ],
                material,
            )
        })
        .collect()
}

/// The 6 outward-facing faces of an axis-aligned cube.
pub fn generate_cube_faces(center: Point3<f32>, size: f32, material: MaterialId) -> Vec<Face> {
    box_faces(center, Vector3::repeat(size / 2.0), &Rotation3::identity(), false, material)
}

/// The 6 outward-facing faces of a rotated cube.
pub fn generate_rotated_cube(
    center: Point3<f32>,
    size: f32,
    rotation: &Rotation3<f32>,
    material: MaterialId,
) -> Vec<Face> {
    box_faces(center, Vector3::repeat(size / 2.0), rotation, false, material)
}

/// A closed room with inward-facing walls and a grid of pillars.
pub fn generate_room(half_extent: f32, pillars_per_side: usize) -> Vec<Face> {
    let mut faces = box_faces(
        Point3::origin(),
        Vector3::repeat(half_extent),
        &Rotation3::identity(),
        true,
        MaterialId(0),
    );

    let spacing = 2.0 * half_extent / (pillars_per_side as f32 + 1.0);
    let pillar_half = Vector3::new(spacing * 0.15, half_extent * 0.6, spacing * 0.15);
    for i in 0..pillars_per_side {
        for j in 0..pillars_per_side {
            let x = -half_extent + spacing * (i as f32 + 1.0);
            let z = -half_extent + spacing * (j as f32 + 1.0);
            faces.extend(box_faces(
                Point3::new(x, -half_extent + pillar_half.y, z),
                pillar_half,
                &Rotation3::identity(),
                false,
                MaterialId(1 + (i * pillars_per_side + j) as u32),
            ));
        }
    }

    faces
}

/// Simple orbit camera for 3D scene navigation.
pub struct OrbitCamera {
    pub distance: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub target: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl OrbitCamera {
    pub fn new(distance: f32, yaw: f32, pitch: f32) -> Self {
        Self {
            distance,
            yaw,
            pitch,
            target: vec3(0.0, 0.0, 0.0),
            fov_y: 45.0_f32.to_radians(),
            zoom_speed: 5.0,
            min_distance: 10.0,
            max_distance: 200.0,
        }
    }

    /// Sets the zoom configuration (speed and distance limits).
    pub fn with_zoom(mut self, speed: f32, min: f32, max: f32) -> Self {
        self.zoom_speed = speed;
        self.min_distance = min;
        self.max_distance = max;
        self
    }

    /// Updates camera state from user input (mouse drag, scroll, arrow keys).
    pub fn update(&mut self) {
        if is_mouse_button_down(MouseButton::Left) {
            let delta = mouse_delta_position();
            self.yaw -= delta.x * 2.0;
            self.pitch -= delta.y * 2.0;
        }

        // keep away from the poles so look_at stays well defined
        self.pitch = self.pitch.clamp(-1.5, 1.5);

        let scroll = mouse_wheel().1;
        self.distance -= scroll * self.zoom_speed;
        self.distance = self.distance.clamp(self.min_distance, self.max_distance);

        if is_key_down(KeyCode::Left) {
            self.yaw += 0.02;
        }
        if is_key_down(KeyCode::Right) {
            self.yaw -= 0.02;
        }
        if is_key_down(KeyCode::Up) {
            self.pitch += 0.02;
        }
        if is_key_down(KeyCode::Down) {
            self.pitch -= 0.02;
        }
    }

    /// Returns the camera's world position.
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + vec3(x, y, z)
    }

    /// Converts to macroquad's Camera3D for rendering.
    pub fn to_camera3d(&self) -> Camera3D {
        Camera3D {
            position: self.position(),
            up: vec3(0.0, 1.0, 0.0),
            target: self.target,
            fovy: self.fov_y,
            ..Default::default()
        }
    }

    pub fn eye_point(&self) -> Point3<f32> {
        let pos = self.position();
        Point3::new(pos.x, pos.y, pos.z)
    }

    /// The same view as a visibility camera, using the current window aspect.
    pub fn to_world_camera(&self) -> Camera {
        let target = Point3::new(self.target.x, self.target.y, self.target.z);
        Camera::look_at(
            self.eye_point(),
            target,
            Vector3::y(),
            self.fov_y,
            screen_width() / screen_height().max(1.0),
        )
    }
}

/// Runs one frame of visibility for `camera` and draws the result.
pub fn render_world(world: &mut World, camera: &Camera) -> bsp_world::TraversalStats {
    world.mark_leaves(&camera.position);
    let mut visitor = RenderVisitor::default();
    world.traverse_for_rendering(camera, &mut visitor)
}
