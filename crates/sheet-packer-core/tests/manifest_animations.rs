use image::{DynamicImage, RgbaImage};
use sheet_packer_core::Manifest;
use sheet_packer_core::prelude::*;

fn blank(w: u32, h: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::new(w, h))
}

fn quiet() -> AtlasConfig {
    AtlasConfig {
        log: false,
        ..Default::default()
    }
}

fn source() -> MemoryImageSource {
    MemoryImageSource::new()
        .with("coin.png", blank(16, 16))
        .with("run_4x3.png", blank(96, 72))
        .with("walk_4x2.png", blank(128, 64))
}

#[test]
fn animations_group_sheet_frames_in_raster_order() {
    let src = source();
    let out = pack_sources(&src.sources(), &src, &quiet(), &NoProgress).expect("pack");
    let manifest: Manifest = serde_json::from_str(&out.manifest).expect("parse");

    let animations = manifest.animations.expect("animations present");
    let keys: Vec<&str> = animations.keys().map(String::as_str).collect();
    assert_eq!(keys, ["run", "walk"]);

    let run: Vec<String> = (0..12).map(|i| format!("run_{:02}.png", i)).collect();
    assert_eq!(animations["run"], run);
    assert_eq!(animations["walk"].len(), 8);
    assert_eq!(animations["walk"][7], "walk_7.png");

    assert_eq!(manifest.frames.len(), 1 + 12 + 8);
    assert!(manifest.frames.contains_key("coin.png"));
    assert!(!animations.values().flatten().any(|n| n == "coin.png"));
}

#[test]
fn manifest_rects_match_canvas_and_extracted_frames() {
    let src = source();
    let out = pack_sources(&src.sources(), &src, &quiet(), &NoProgress).expect("pack");
    let manifest: Manifest = serde_json::from_str(&out.manifest).expect("parse");
    let extracted = extract_frames(&src.sources()).expect("extract");

    assert_eq!(manifest.meta.size.w, out.canvas.width);
    assert_eq!(manifest.meta.size.h, out.canvas.height);
    assert_eq!(manifest.meta.image, "atlas.png");
    assert_eq!(manifest.meta.format, "RGBA8888");

    for frame in &extracted {
        let entry = &manifest.frames[&frame.name];
        assert_eq!((entry.frame.w, entry.frame.h), (frame.width, frame.height));
        assert_eq!((entry.source_size.w, entry.source_size.h), (frame.width, frame.height));
        assert!(!entry.rotated);
        assert!(!entry.trimmed);
    }
    for placed in &out.canvas.frames {
        let entry = &manifest.frames[&placed.frame.name];
        assert_eq!((entry.frame.x, entry.frame.y), (placed.x, placed.y));
        assert!(entry.frame.x + entry.frame.w <= manifest.meta.size.w);
        assert!(entry.frame.y + entry.frame.h <= manifest.meta.size.h);
    }
}

#[test]
fn prettify_changes_layout_not_content() {
    let src = source();
    let compact = pack_sources(&src.sources(), &src, &quiet(), &NoProgress).expect("pack");
    let mut cfg = quiet();
    cfg.prettify = true;
    let pretty = pack_sources(&src.sources(), &src, &cfg, &NoProgress).expect("pack");

    assert!(!compact.manifest.contains('\n'));
    assert!(pretty.manifest.starts_with("{\n  \"meta\": {"));
    let a: serde_json::Value = serde_json::from_str(&compact.manifest).expect("parse");
    let b: serde_json::Value = serde_json::from_str(&pretty.manifest).expect("parse");
    assert_eq!(a, b);
}

#[test]
fn manifest_is_stable_across_runs() {
    let src = source();
    let a = pack_sources(&src.sources(), &src, &quiet(), &NoProgress).expect("pack");
    let b = pack_sources(&src.sources(), &src, &quiet(), &NoProgress).expect("pack");
    assert_eq!(a.manifest, b.manifest);

    let parsed: Manifest = serde_json::from_str(&a.manifest).expect("parse");
    assert_eq!(parsed.to_json(false).expect("json"), a.manifest);
}

#[test]
fn custom_file_name_is_referenced() {
    let src = MemoryImageSource::new().with("coin.png", blank(8, 8));
    let mut cfg = quiet();
    cfg.file_name = "items".into();
    let out = pack_sources(&src.sources(), &src, &cfg, &NoProgress).expect("pack");
    let manifest: Manifest = serde_json::from_str(&out.manifest).expect("parse");
    assert_eq!(manifest.meta.image, "items.png");
    assert_eq!(manifest.meta.app, "sheet-packer");
}
