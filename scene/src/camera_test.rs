#![allow(clippy::float_cmp)]

use super::*;

const EPSILON: f64 = 1e-10;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn viewport() -> Viewport {
    Viewport::new(800.0, 600.0)
}

// --- Vec3 ---

#[test]
fn planar_delta_drops_height() {
    let a = Vec3::new(3.0, 7.0, -2.0);
    let b = Vec3::new(1.0, 2.0, 1.0);
    assert_eq!(a.planar_delta(b), Vec3::new(2.0, 0.0, -3.0));
}

#[test]
fn add_assign_translates_all_axes() {
    let mut p = Vec3::new(1.0, 0.5, 1.0);
    p.add_assign(Vec3::new(0.25, 0.0, -2.0));
    assert_eq!(p, Vec3::new(1.25, 0.5, -1.0));
}

// --- Defaults ---

#[test]
fn default_camera_matches_tabletop_pose() {
    let cam = ArcCamera::default();
    assert!(approx_eq(cam.alpha, -std::f64::consts::FRAC_PI_2));
    assert_eq!(cam.beta, 0.0);
    assert_eq!(cam.radius, 30.0);
    assert_eq!(cam.lower_radius_limit, 5.0);
    assert_eq!(cam.upper_radius_limit, 50.0);
    assert_eq!(cam.wheel_precision, 5.0);
    assert_eq!(cam.panning_sensibility, 200.0);
    assert_eq!(cam.target, Vec3::default());
}

#[test]
fn camera_serializes_camel_case() {
    let json = serde_json::to_value(ArcCamera::default()).expect("serialize");
    assert!(json.get("lowerRadiusLimit").is_some());
    assert!(json.get("wheelPrecision").is_some());
}

// --- Picking ---

#[test]
fn viewport_center_maps_to_target() {
    let mut cam = ArcCamera::default();
    cam.target = Vec3::new(4.0, 0.0, -3.0);
    let p = cam.screen_to_ground(Point::new(400.0, 300.0), viewport()).expect("ground point");
    assert!(approx_eq(p.x, 4.0));
    assert!(approx_eq(p.z, -3.0));
    assert_eq!(p.y, 0.0);
}

#[test]
fn screen_right_is_world_plus_x_and_screen_up_is_world_plus_z() {
    let cam = ArcCamera::default();
    let right = cam.screen_to_ground(Point::new(500.0, 300.0), viewport()).expect("ground point");
    let up = cam.screen_to_ground(Point::new(400.0, 200.0), viewport()).expect("ground point");
    assert!(right.x > 0.0);
    assert!(approx_eq(right.z, 0.0));
    assert!(up.z > 0.0);
    assert!(approx_eq(up.x, 0.0));
}

#[test]
fn screen_to_ground_then_back_is_identity() {
    let cam = ArcCamera::default();
    let screen = Point::new(123.0, 456.0);
    let world = cam.screen_to_ground(screen, viewport()).expect("ground point");
    let back = cam.ground_to_screen(world, viewport());
    assert!(approx_eq(back.x, screen.x));
    assert!(approx_eq(back.y, screen.y));
}

#[test]
fn empty_viewport_has_no_ground_point() {
    let cam = ArcCamera::default();
    assert!(cam.screen_to_ground(Point::new(1.0, 1.0), Viewport::default()).is_none());
}

#[test]
fn closer_camera_covers_less_ground_per_pixel() {
    let mut cam = ArcCamera::default();
    let far = cam.world_per_pixel(viewport());
    cam.radius = 10.0;
    assert!(cam.world_per_pixel(viewport()) < far);
}

// --- Zoom ---

#[test]
fn wheel_zoom_moves_radius() {
    let mut cam = ArcCamera::default();
    cam.zoom_by_wheel(200.0);
    assert!(approx_eq(cam.radius, 31.0));
    cam.zoom_by_wheel(-400.0);
    assert!(approx_eq(cam.radius, 29.0));
}

#[test]
fn pan_keeps_ground_under_pointer_at_default_sensibility() {
    let mut cam = ArcCamera::default();
    let start = Point::new(300.0, 200.0);
    let grabbed = cam.screen_to_ground(start, viewport()).expect("ground point");

    cam.pan_by_pixels(50.0, -30.0, viewport());

    let now = cam.ground_to_screen(grabbed, viewport());
    assert!(approx_eq(now.x, 350.0));
    assert!(approx_eq(now.y, 170.0));
}

#[test]
fn higher_panning_sensibility_pans_slower() {
    let mut normal = ArcCamera::default();
    let mut slow = ArcCamera { panning_sensibility: 400.0, ..ArcCamera::default() };
    normal.pan_by_pixels(80.0, 0.0, viewport());
    slow.pan_by_pixels(80.0, 0.0, viewport());

    assert!(normal.target.x < 0.0);
    assert!(approx_eq(slow.target.x, normal.target.x / 2.0));
    assert_eq!(slow.target.z, 0.0);
}

#[test]
fn wheel_zoom_clamps_to_limits() {
    let mut cam = ArcCamera::default();
    cam.zoom_by_wheel(1_000_000.0);
    assert_eq!(cam.radius, 50.0);
    cam.zoom_by_wheel(-1_000_000.0);
    assert_eq!(cam.radius, 5.0);
}
