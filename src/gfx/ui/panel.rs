use imgui::Ui;

use crate::gfx::scene::{SceneStatistics, ScreenClick};

/// Read-only debug window: camera pose, inertia, loaded models, last click
pub fn scene_debug(ui: &Ui, stats: &SceneStatistics, last_click: Option<&ScreenClick>) {
    ui.window("Desk Scene")
        .size([320.0, 300.0], imgui::Condition::FirstUseEver)
        .position([10.0, 10.0], imgui::Condition::FirstUseEver)
        .build(|| {
            ui.text(format!("FPS: {:.0}", ui.io().framerate));
            ui.separator();

            if ui.collapsing_header("Camera", imgui::TreeNodeFlags::DEFAULT_OPEN) {
                ui.text(format!("Distance: {:.3}", stats.distance));
                ui.text(format!("Azimuth:  {:.1} deg", stats.azimuth.to_degrees()));
                ui.text(format!("Polar:    {:.1} deg", stats.polar.to_degrees()));
                ui.text(format!("Rotation velocity: {:.4}", stats.rotation_velocity));
            }

            if ui.collapsing_header("Models", imgui::TreeNodeFlags::DEFAULT_OPEN) {
                if stats.loaded.is_empty() {
                    ui.text("Loading...");
                }
                for name in &stats.loaded {
                    ui.bullet_text(name);
                }
                ui.text(format!("Triangles: {}", stats.total_triangles));
                ui.text(format!("Keys held: {}", stats.pending_keys));
            }

            if ui.collapsing_header("Screen", imgui::TreeNodeFlags::DEFAULT_OPEN) {
                match last_click {
                    Some(click) => {
                        ui.text(format!("UV: ({:.3}, {:.3})", click.uv[0], click.uv[1]));
                        ui.text(format!(
                            "Point: ({:.3}, {:.3}, {:.3})",
                            click.point.x, click.point.y, click.point.z
                        ));
                        ui.text(format!(
                            "Button: {}",
                            click.button.as_deref().unwrap_or("-")
                        ));
                    }
                    None => ui.text("No clicks yet"),
                }
            }
        });
}
