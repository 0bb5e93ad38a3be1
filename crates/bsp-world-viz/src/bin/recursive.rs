use bsp_world::bsp::subtree_depth;
use bsp_world::{BuildPolicy, Face, MaterialId, SplitterHeuristic, VisConfig, World};
use bsp_world_viz::{
    generate_cube_faces, generate_rotated_cube, init_tracing, render_world, OrbitCamera,
    TreeNavigator,
};
use macroquad::prelude::*;
use nalgebra::{Point3, Rotation3, Unit, Vector3};
use tracing::{error, info};

/// Two cubes and a floor, enough for the splitter to cut faces.
fn generate_scene() -> Vec<Face> {
    let mut faces = Vec::new();

    let rot_x = Rotation3::from_axis_angle(&Unit::new_normalize(Vector3::x()), 0.3);
    let rot_y = Rotation3::from_axis_angle(&Unit::new_normalize(Vector3::y()), 0.4);
    let rot_z = Rotation3::from_axis_angle(&Unit::new_normalize(Vector3::z()), 0.25);
    faces.extend(generate_rotated_cube(
        Point3::new(-1.0, 0.0, 0.0),
        0.8,
        &(rot_z * rot_y * rot_x),
        MaterialId(1),
    ));
    faces.extend(generate_cube_faces(Point3::new(1.0, 0.0, 0.0), 0.8, MaterialId(2)));

    faces.push(Face::new(
        vec![
            Point3::new(-1.5, -1.0, -1.5),
            Point3::new(-1.5, -1.0, 1.5),
            Point3::new(1.5, -1.0, 1.5),
            Point3::new(1.5, -1.0, -1.5),
        ],
        MaterialId(3),
    ));

    faces
}

#[macroquad::main("BSP World - Recursive")]
async fn main() {
    init_tracing();

    let config = VisConfig {
        build_policy: BuildPolicy::Recursive { max_depth: 32 },
        splitter: SplitterHeuristic::Balanced,
        frustum_culling: true,
        ..VisConfig::default()
    };
    let mut world = match World::try_load(generate_scene(), config) {
        Ok(world) => world,
        Err(err) => {
            error!(%err, "could not build world");
            return;
        }
    };
    let depth = world.root().map_or(0, |root| subtree_depth(world.nodes(), root));
    info!(
        faces = world.faces().len(),
        nodes = world.nodes().len(),
        depth,
        "world loaded"
    );

    let mut camera = OrbitCamera::new(5.0, 0.4, 0.4).with_zoom(0.5, 2.0, 20.0);
    let mut navigator = TreeNavigator::new();
    let mut inspect = false;

    loop {
        camera.update();
        navigator.update(&world);
        if is_key_pressed(KeyCode::Tab) {
            inspect = !inspect;
        }

        clear_background(Color::from_rgba(20, 20, 30, 255));
        set_camera(&camera.to_camera3d());

        let stats = render_world_or_subtree(&mut world, &camera, &navigator, inspect);

        draw_line_3d(vec3(0.0, 0.0, 0.0), vec3(1.0, 0.0, 0.0), RED);
        draw_line_3d(vec3(0.0, 0.0, 0.0), vec3(0.0, 1.0, 0.0), GREEN);
        draw_line_3d(vec3(0.0, 0.0, 0.0), vec3(0.0, 0.0, 1.0), BLUE);

        set_default_camera();

        draw_text(
            &format!("Recursive build - {} faces, depth {}", world.faces().len(), depth),
            10.0,
            25.0,
            20.0,
            WHITE,
        );
        draw_text(
            &format!(
                "Drawn {} | frustum rejects {} | {}",
                stats.faces_emitted,
                stats.frustum_rejects,
                if inspect { "subtree view" } else { "visibility view" }
            ),
            10.0,
            45.0,
            18.0,
            GRAY,
        );

        navigator.draw_ui(&world, 70.0);

        draw_text("Drag mouse to rotate, scroll to zoom, Tab toggles view", 10.0, 155.0, 16.0, DARKGRAY);
        draw_text(&format!("FPS: {}", get_fps()), 10.0, 175.0, 16.0, DARKGRAY);

        next_frame().await
    }
}

fn render_world_or_subtree(
    world: &mut World,
    camera: &OrbitCamera,
    navigator: &TreeNavigator,
    inspect: bool,
) -> bsp_world::TraversalStats {
    if inspect {
        navigator.render(world);
        bsp_world::TraversalStats::default()
    } else {
        render_world(world, &camera.to_world_camera())
    }
}
