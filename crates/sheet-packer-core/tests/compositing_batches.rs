use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use image::{DynamicImage, Rgba, RgbaImage};
use sheet_packer_core::compositing::compose;
use sheet_packer_core::prelude::*;

#[derive(Default)]
struct Recorder {
    messages: Mutex<Vec<String>>,
    batches: Mutex<Vec<(usize, usize, u32)>>,
}

impl Progress for Recorder {
    fn message(&self, msg: &str) {
        self.messages.lock().unwrap().push(msg.to_string());
    }

    fn batch_done(&self, done: usize, total: usize, percent: u32) {
        self.batches.lock().unwrap().push((done, total, percent));
    }
}

/// A 70x20 sheet with 35x10 cells of 2x2 px; each cell has its own color.
fn dots_sheet() -> RgbaImage {
    RgbaImage::from_fn(70, 20, |x, y| {
        let cell = (y / 2) * 35 + x / 2;
        Rgba([(cell % 256) as u8, (cell / 256) as u8 + 1, 7, 255])
    })
}

fn quiet() -> AtlasConfig {
    AtlasConfig {
        log: false,
        ..Default::default()
    }
}

#[test]
fn frames_are_drawn_at_their_placement() {
    let src = MemoryImageSource::new()
        .with(
            "red.png",
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 6, Rgba([255, 0, 0, 255]))),
        )
        .with("dots_35x10.png", DynamicImage::ImageRgba8(dots_sheet()));
    let out = pack_sources(&src.sources(), &src, &quiet(), &NoProgress).expect("pack");
    assert_eq!(out.image.dimensions(), (out.canvas.width, out.canvas.height));

    let mut covered = vec![false; (out.canvas.width * out.canvas.height) as usize];
    for placed in &out.canvas.frames {
        let r = placed.rect();
        for y in 0..r.h {
            for x in 0..r.w {
                let expected = match &placed.frame.sheet {
                    None => [255, 0, 0, 255],
                    Some(cell) => {
                        let i = cell.index();
                        [(i % 256) as u8, (i / 256) as u8 + 1, 7, 255]
                    }
                };
                assert_eq!(
                    out.image.get_pixel(r.x + x, r.y + y).0,
                    expected,
                    "pixel ({x},{y}) of {}",
                    placed.frame.name
                );
                covered[((r.y + y) * out.canvas.width + r.x + x) as usize] = true;
            }
        }
    }
    for (i, pixel) in out.image.pixels().enumerate() {
        if !covered[i] {
            assert_eq!(pixel.0, [0, 0, 0, 0]);
        }
    }
}

#[test]
fn progress_reported_between_batches() {
    let src = MemoryImageSource::new().with("dots_35x10.png", DynamicImage::ImageRgba8(dots_sheet()));
    let recorder = Recorder::default();
    let cfg = AtlasConfig::default();
    let out = pack_sources(&src.sources(), &src, &cfg, &recorder).expect("pack");
    assert_eq!(out.canvas.frames.len(), 350);
    assert!(out.canvas.frames.iter().any(|p| p.frame.name == "dots_000.png"));

    // 350 frames -> 4 batches; reports after batches 1 and 2 only.
    let batches = recorder.batches.lock().unwrap().clone();
    assert_eq!(batches, vec![(1, 4, 29), (2, 4, 57)]);

    let messages = recorder.messages.lock().unwrap().clone();
    let packing = messages.iter().position(|m| m == "Packing...");
    let processing = messages.iter().position(|m| m == "Processing images...");
    assert!(packing.is_some() && processing.is_some());
    assert!(packing < processing);
}

#[test]
fn disabled_log_silences_progress() {
    let src = MemoryImageSource::new().with("dots_35x10.png", DynamicImage::ImageRgba8(dots_sheet()));
    let recorder = Recorder::default();
    pack_sources(&src.sources(), &src, &quiet(), &recorder).expect("pack");
    assert!(recorder.messages.lock().unwrap().is_empty());
    assert!(recorder.batches.lock().unwrap().is_empty());
}

#[test]
fn default_batch_report_is_a_percent_message() {
    struct Messages(Mutex<Vec<String>>);
    impl Progress for Messages {
        fn message(&self, msg: &str) {
            self.0.lock().unwrap().push(msg.to_string());
        }
    }

    let src = MemoryImageSource::new().with("dots_35x10.png", DynamicImage::ImageRgba8(dots_sheet()));
    let frames = extract_frames(&src.sources()).expect("extract");
    let canvas = pack_frames(&frames, &PackerConfig::default()).expect("pack");
    let sink = Messages(Mutex::new(Vec::new()));
    compose(&canvas, &src, &sink).expect("compose");

    let messages = sink.0.lock().unwrap().clone();
    assert_eq!(
        messages,
        vec!["Processing images...", "Processed: 29%", "Processed: 57%"]
    );
}

#[test]
fn small_runs_report_no_batches() {
    let src = MemoryImageSource::new().with(
        "one.png",
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(3, 3, Rgba([1, 1, 1, 255]))),
    );
    let recorder = Recorder::default();
    pack_sources(&src.sources(), &src, &AtlasConfig::default(), &recorder).expect("pack");
    assert!(recorder.batches.lock().unwrap().is_empty());
}

#[test]
fn missing_pixels_fail_the_run() {
    let sources = vec![SourceImage::new("ghost.png", 8, 8)];
    let err = pack_sources(&sources, &MemoryImageSource::new(), &quiet(), &NoProgress).unwrap_err();
    assert!(matches!(err, SheetPackerError::MissingSource { .. }));
    assert!(err.is_collaborator());
}

/// Counts how often pixels are requested from the wrapped source.
struct CountingSource {
    inner: MemoryImageSource,
    regions: AtomicUsize,
}

impl ImageSource for CountingSource {
    fn dimensions(&self, path: &Path) -> Result<(u32, u32)> {
        self.inner.dimensions(path)
    }

    fn region(&self, path: &Path, rect: Option<Rect>) -> Result<RgbaImage> {
        self.regions.fetch_add(1, Ordering::SeqCst);
        self.inner.region(path, rect)
    }
}

#[test]
fn sheet_is_decoded_once_per_batch() {
    let src = CountingSource {
        inner: MemoryImageSource::new().with("dots_35x10.png", DynamicImage::ImageRgba8(dots_sheet())),
        regions: AtomicUsize::new(0),
    };
    let frames = extract_frames(&src.inner.sources()).expect("extract");
    let canvas = pack_frames(&frames, &PackerConfig::default()).expect("pack");
    let image = compose(&canvas, &src, &NoProgress).expect("compose");

    // 350 cells in 4 batches: one fetch of the sheet per batch, not one per cell.
    assert_eq!(src.regions.load(Ordering::SeqCst), 4);
    for placed in &canvas.frames {
        let i = placed.frame.sheet.as_ref().map(|c| c.index()).expect("sheet cell");
        assert_eq!(
            image.get_pixel(placed.x + 1, placed.y + 1).0,
            [(i % 256) as u8, (i / 256) as u8 + 1, 7, 255],
            "{}",
            placed.frame.name
        );
    }
}

#[test]
fn cell_outside_its_sheet_is_an_image_error() {
    // Dimensions claim a larger sheet than the pixels provide.
    let sources = vec![SourceImage::new("tall_1x2.png", 4, 8)];
    let src = MemoryImageSource::new().with("tall_1x2.png", DynamicImage::ImageRgba8(RgbaImage::new(4, 4)));
    let err = pack_sources(&sources, &src, &quiet(), &NoProgress).unwrap_err();
    assert!(matches!(err, SheetPackerError::Image { .. }));
}
