use super::*;
use crate::{
    config::model::LayerConfig,
    foundation::core::Rect,
    render::surface::PixmapSurface,
};

#[derive(Default)]
struct RecordingSurface {
    viewport: Option<Viewport>,
    clears: Vec<[u8; 4]>,
    calls: Vec<(u32, DrawImage)>,
    flushes: usize,
}

impl DrawSurface for RecordingSurface {
    fn viewport(&self) -> Viewport {
        self.viewport.unwrap()
    }

    fn clear(&mut self, premul: [u8; 4]) {
        self.clears.push(premul);
    }

    fn draw_image(&mut self, image: &PreparedImage, cmd: &DrawImage) {
        self.calls.push((image.width, *cmd));
    }

    fn flush(&mut self) {
        self.flushes += 1;
    }
}

fn recording(w: u32, h: u32) -> RecordingSurface {
    RecordingSurface {
        viewport: Some(Viewport::new(w, h).unwrap()),
        ..RecordingSurface::default()
    }
}

/// Every role gets a solid image whose width identifies it (paper = 1 ... scanlines = 5).
fn tagged_store() -> LayerImageStore {
    let mut store = LayerImageStore::new(".");
    for (i, role) in LayerRole::ALL.into_iter().enumerate() {
        let w = i as u32 + 1;
        store.insert(role, PreparedImage::solid(w, 3, [10, 10, 10, 255]).unwrap());
    }
    store
}

fn config(w: u32, h: u32) -> BackgroundConfig {
    let mut cfg = BackgroundConfig::default();
    cfg.viewport = Viewport::new(w, h).unwrap();
    cfg
}

#[test]
fn layers_draw_back_to_front_regardless_of_config_order() {
    let mut cfg = config(40, 30);
    cfg.layers.reverse();
    let comp = Compositor::new(&cfg, tagged_store());

    let roles: Vec<_> = comp.layers().iter().map(|l| l.role).collect();
    assert_eq!(roles, LayerRole::ALL.to_vec());

    let mut s = recording(40, 30);
    let report = comp.draw_frame(&mut s, FrameIndex(0));
    assert_eq!(report.drawn, LayerRole::ALL.to_vec());
    assert!(report.skipped.is_empty());

    let widths: Vec<u32> = s.calls.iter().map(|(w, _)| *w).collect();
    let mut sorted = widths.clone();
    sorted.sort();
    assert_eq!(widths, sorted);
    assert_eq!(s.clears, vec![[0, 0, 0, 255]]);
    assert_eq!(s.flushes, 1);
}

#[test]
fn stretched_layers_cover_the_full_surface_once() {
    let comp = Compositor::new(&config(40, 30), tagged_store());
    let mut s = recording(40, 30);
    comp.draw_frame(&mut s, FrameIndex(7));

    for tag in [1u32, 4, 5] {
        let calls: Vec<_> = s.calls.iter().filter(|(w, _)| *w == tag).collect();
        assert_eq!(calls.len(), 1, "layer tagged {tag}");
        let cmd = calls[0].1;
        assert_eq!(cmd.dst, Rect::new(0.0, 0.0, 40.0, 30.0));
        let src = cmd.transform.inverse().transform_rect_bbox(cmd.dst);
        assert!((src.x0).abs() < 1e-9 && (src.y0).abs() < 1e-9, "{src:?}");
        assert!((src.x1 - f64::from(tag)).abs() < 1e-9, "{src:?}");
        assert!((src.y1 - 3.0).abs() < 1e-9, "{src:?}");
    }
}

#[test]
fn every_draw_stays_within_surface_bounds() {
    let comp = Compositor::new(&config(37, 21), tagged_store());
    let viewport = Viewport::new(37, 21).unwrap();
    for frame in [0u64, 1, 2, 17, 999, 123_456] {
        let mut s = recording(37, 21);
        comp.draw_frame(&mut s, FrameIndex(frame));
        assert!(!s.calls.is_empty());
        for (_, cmd) in &s.calls {
            assert!(viewport.contains_rect(cmd.dst), "frame {frame}: {cmd:?}");
        }
    }
}

#[test]
fn dust_layers_drift_at_independent_speeds() {
    let comp = Compositor::new(&config(40, 30), tagged_store());
    let viewport = Viewport::new(40, 30).unwrap();
    let layer = |role| comp.layers().iter().find(|l| l.role == role).unwrap();

    let paper = layer(LayerRole::Paper);
    assert_eq!(
        paper.placement(viewport, FrameIndex(0)),
        paper.placement(viewport, FrameIndex(50))
    );

    let far = layer(LayerRole::DustFar);
    let near = layer(LayerRole::DustNear);
    assert_ne!(
        far.placement(viewport, FrameIndex(0)),
        far.placement(viewport, FrameIndex(50))
    );
    assert!(near.drift.x > far.drift.x);
}

#[test]
fn missing_image_skips_only_that_layer() {
    let mut store = tagged_store();
    store.take(LayerRole::DustNear);
    let comp = Compositor::new(&config(8, 8), store);

    let mut s = recording(8, 8);
    let report = comp.draw_frame(&mut s, FrameIndex(0));
    assert_eq!(report.skipped, vec![LayerRole::DustNear]);
    assert_eq!(report.drawn.len(), 4);
    assert!(s.calls.iter().all(|(w, _)| *w != 3));
}

#[test]
fn draw_with_no_images_only_clears() {
    let comp = Compositor::new(&config(4, 4), LayerImageStore::new("."));
    let mut s = PixmapSurface::new(Viewport::new(4, 4).unwrap()).unwrap();
    let report = comp.draw_frame(&mut s, FrameIndex(0));
    assert!(report.drawn.is_empty());
    assert_eq!(report.skipped, LayerRole::ALL.to_vec());
    assert!(s.data().chunks_exact(4).all(|p| p == [0, 0, 0, 255]));
}

#[test]
fn draw_advances_frame_counter() {
    let mut comp = Compositor::new(&config(4, 4), tagged_store());
    let mut s = PixmapSurface::new(Viewport::new(4, 4).unwrap()).unwrap();
    assert_eq!(comp.frame(), FrameIndex(0));
    comp.draw(&mut s);
    comp.draw(&mut s);
    assert_eq!(comp.frame(), FrameIndex(2));
}

#[test]
fn late_image_is_drawn_once_attached() {
    let mut cfg = config(2, 2);
    cfg.layers = vec![LayerConfig {
        role: LayerRole::Paper,
        source: "paper.png".to_string(),
        fit: LayerFit::Stretch,
        opacity: 1.0,
        blend: BlendMode::Normal,
        drift_px_per_frame: Vec2::ZERO,
    }];
    let mut comp = Compositor::new(&cfg, LayerImageStore::new("."));
    let mut s = PixmapSurface::new(Viewport::new(2, 2).unwrap()).unwrap();

    assert_eq!(comp.draw(&mut s).skipped, vec![LayerRole::Paper]);
    assert_eq!(s.pixel(0, 0), Some([0, 0, 0, 255]));

    let paper = PreparedImage::solid(1, 1, [200, 180, 150, 255]).unwrap();
    assert!(comp.attach_image(LayerRole::Paper, paper.clone()));
    assert!(!comp.attach_image(LayerRole::Scanlines, paper));

    assert_eq!(comp.draw(&mut s).drawn, vec![LayerRole::Paper]);
    assert_eq!(s.pixel(1, 1), Some([200, 180, 150, 255]));
}

#[test]
fn overlays_darken_the_paper() {
    let mut store = LayerImageStore::new(".");
    store.insert(
        LayerRole::Paper,
        PreparedImage::solid(2, 2, [200, 200, 200, 255]).unwrap(),
    );
    store.insert(
        LayerRole::Vignette,
        PreparedImage::solid(2, 2, [0, 0, 0, 255]).unwrap(),
    );
    let comp = Compositor::new(&config(2, 2), store);
    let mut s = PixmapSurface::new(Viewport::new(2, 2).unwrap()).unwrap();
    comp.draw_frame(&mut s, FrameIndex(0));

    let px = s.pixel(0, 0).unwrap();
    assert!(px[0] < 200 && px[0] > 0, "{px:?}");
    assert_eq!(px[3], 255);
}

#[test]
fn malformed_late_image_is_rejected() {
    let mut cfg = config(4, 4);
    cfg.layers.retain(|l| l.role == LayerRole::Paper);
    let mut comp = Compositor::new(&cfg, LayerImageStore::new("."));
    let bad = PreparedImage {
        width: 4,
        height: 4,
        rgba8_premul: std::sync::Arc::new(vec![255; 4]),
    };
    assert!(!comp.attach_image(LayerRole::Paper, bad));

    let mut s = PixmapSurface::new(Viewport::new(4, 4).unwrap()).unwrap();
    let report = comp.draw(&mut s);
    assert_eq!(report.skipped, vec![LayerRole::Paper]);
    assert_eq!(s.pixel(3, 3), Some([0, 0, 0, 255]));
}
