use super::*;

#[test]
fn viewport_rejects_empty_dimensions() {
    assert!(Viewport::new(0, 10).is_err());
    assert!(Viewport::new(10, 0).is_err());
    assert!(Viewport::new(1, 1).is_ok());
}

#[test]
fn viewport_contains_rect_boundaries() {
    let vp = Viewport::new(64, 32).unwrap();
    assert!(vp.contains_rect(Rect::new(0.0, 0.0, 64.0, 32.0)));
    assert!(vp.contains_rect(Rect::new(10.0, 5.0, 20.0, 6.0)));
    assert!(!vp.contains_rect(Rect::new(-0.5, 0.0, 10.0, 10.0)));
    assert!(!vp.contains_rect(Rect::new(0.0, 0.0, 64.0, 32.5)));
}

#[test]
fn premul_from_straight_scales_color_by_alpha() {
    let c = Rgba8Premul::from_straight_rgba(200, 100, 0, 128);
    assert_eq!(c.to_array(), [100, 50, 0, 128]);
    assert_eq!(
        Rgba8Premul::from_straight_rgba(9, 9, 9, 0),
        Rgba8Premul::transparent()
    );
}

#[test]
fn frame_index_next_saturates() {
    assert_eq!(FrameIndex(3).next(), FrameIndex(4));
    assert_eq!(FrameIndex(u64::MAX).next(), FrameIndex(u64::MAX));
}

#[test]
fn viewport_rejects_edges_past_pixmap_limit() {
    assert!(Viewport::new(Viewport::MAX_EDGE, 1).is_ok());
    assert!(Viewport::new(Viewport::MAX_EDGE + 1, 1).is_err());
    assert!(Viewport::new(1, 70_000).is_err());
}
