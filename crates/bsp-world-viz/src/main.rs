use bsp_world::World;
use bsp_world_viz::{generate_room, init_tracing, render_world, OrbitCamera};
use macroquad::prelude::*;
use tracing::info;

#[macroquad::main("BSP World")]
async fn main() {
    init_tracing();

    let faces = generate_room(10.0, 3);
    info!(faces = faces.len(), "generated room");

    let mut world = World::load(faces);
    info!(
        nodes = world.nodes().len(),
        clusters = world.num_clusters(),
        "world loaded"
    );

    let mut camera = OrbitCamera::new(8.0, 0.4, 0.3).with_zoom(0.5, 1.0, 9.0);

    loop {
        camera.update();

        clear_background(Color::from_rgba(20, 20, 30, 255));
        set_camera(&camera.to_camera3d());

        let stats = render_world(&mut world, &camera.to_world_camera());

        set_default_camera();

        draw_text("BSP World - single-leaf build", 10.0, 25.0, 20.0, WHITE);
        draw_text(
            &format!(
                "Frame {} | faces {} / {} | nodes visited {} skipped {}",
                world.vis_count(),
                stats.faces_emitted,
                world.faces().len(),
                stats.nodes_visited,
                stats.nodes_skipped
            ),
            10.0,
            45.0,
            18.0,
            GRAY,
        );
        draw_text("Drag mouse to rotate, scroll to zoom", 10.0, 70.0, 16.0, DARKGRAY);
        draw_text(&format!("FPS: {}", get_fps()), 10.0, 90.0, 16.0, DARKGRAY);

        next_frame().await
    }
}
