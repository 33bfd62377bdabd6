use std::sync::Arc;

use super::*;
use crate::{
    animation::request::SlotTransform,
    foundation::core::ImageRef,
};

fn solid(w: u32, h: u32, px: [u8; 4]) -> PreparedImage {
    PreparedImage {
        width: w,
        height: h,
        rgba8_premul: Arc::new(px.repeat((w * h) as usize)),
    }
}

fn flat_settings() -> RenderSettings {
    RenderSettings {
        image_height: 20.0,
        border_px: 0.0,
        corner_radius_px: 0.0,
        ..RenderSettings::default()
    }
}

fn centered(slot: usize, image: &str, stack_order: u64, opacity: f64) -> SlotSnapshot {
    SlotSnapshot {
        slot,
        image: ImageRef::new(image),
        anchor: Point::new(32.0, 32.0),
        stack_order,
        opacity,
        transform: SlotTransform {
            offset: Vec2::new(-0.5, -0.5),
            scale: 1.0,
            rotation_deg: 0.0,
        },
    }
}

fn store() -> ImageStore {
    let mut s = ImageStore::new();
    s.insert(ImageRef::new("red"), solid(2, 1, [255, 0, 0, 255]));
    s.insert(ImageRef::new("blue"), solid(1, 1, [0, 0, 255, 255]));
    s
}

#[test]
fn empty_scene_is_background() {
    let canvas = Canvas::new(8, 4).unwrap();
    let f = render_scene(canvas, &[], &store(), &RenderSettings::default()).unwrap();
    assert_eq!(f.data.len(), 8 * 4 * 4);
    assert!(f.data.chunks_exact(4).all(|p| p == [255, 255, 255, 255]));
}

#[test]
fn image_is_centered_on_anchor_at_display_height() {
    let canvas = Canvas::new(64, 64).unwrap();
    let f = render_scene(
        canvas,
        &[centered(0, "red", 0, 1.0)],
        &store(),
        &flat_settings(),
    )
    .unwrap();
    // 2:1 image at height 20 spans x 12..52, y 22..42.
    assert_eq!(f.pixel(32, 32), [255, 0, 0, 255]);
    assert_eq!(f.pixel(13, 32), [255, 0, 0, 255]);
    assert_eq!(f.pixel(11, 32), [255, 255, 255, 255]);
    assert_eq!(f.pixel(32, 22), [255, 0, 0, 255]);
    assert_eq!(f.pixel(32, 43), [255, 255, 255, 255]);
}

#[test]
fn later_stack_order_paints_on_top() {
    let canvas = Canvas::new(64, 64).unwrap();
    let scene = [centered(1, "red", 3, 1.0), centered(0, "blue", 4, 1.0)];
    let f = render_scene(canvas, &scene, &store(), &flat_settings()).unwrap();
    assert_eq!(f.pixel(32, 32), [0, 0, 255, 255]);
    // The wider red card still shows beyond the square blue one.
    assert_eq!(f.pixel(14, 32), [255, 0, 0, 255]);
}

#[test]
fn missing_image_draws_placeholder() {
    let canvas = Canvas::new(64, 64).unwrap();
    let f = render_scene(
        canvas,
        &[centered(0, "gone", 0, 1.0)],
        &store(),
        &flat_settings(),
    )
    .unwrap();
    assert_eq!(f.pixel(32, 32), [23, 23, 23, 255]);
}

#[test]
fn opacity_blends_with_background() {
    let canvas = Canvas::new(64, 64).unwrap();
    let f = render_scene(
        canvas,
        &[centered(0, "blue", 0, 0.5)],
        &store(),
        &flat_settings(),
    )
    .unwrap();
    let px = f.pixel(32, 32);
    assert_eq!(px[2], 255);
    assert!((127..=128).contains(&px[0]));
}

#[test]
fn border_frames_the_card() {
    let canvas = Canvas::new(64, 64).unwrap();
    let settings = RenderSettings {
        image_height: 20.0,
        border_px: 2.0,
        corner_radius_px: 0.0,
        ..RenderSettings::default()
    };
    let f = render_scene(canvas, &[centered(0, "red", 0, 1.0)], &store(), &settings).unwrap();
    assert_eq!(f.pixel(12, 32), [0, 0, 0, 255]);
    assert_eq!(f.pixel(15, 32), [255, 0, 0, 255]);
}

#[test]
fn rounded_corners_are_clipped() {
    let canvas = Canvas::new(64, 64).unwrap();
    let settings = RenderSettings {
        image_height: 20.0,
        border_px: 0.0,
        corner_radius_px: 6.0,
        ..RenderSettings::default()
    };
    let f = render_scene(canvas, &[centered(0, "red", 0, 1.0)], &store(), &settings).unwrap();
    assert_eq!(f.pixel(12, 22), [255, 255, 255, 255]);
    assert_eq!(f.pixel(18, 28), [255, 0, 0, 255]);
}

#[test]
fn invalid_settings_are_rejected() {
    let canvas = Canvas::new(4, 4).unwrap();
    let settings = RenderSettings {
        image_height: 0.0,
        ..RenderSettings::default()
    };
    assert!(render_scene(canvas, &[], &store(), &settings).is_err());
}
