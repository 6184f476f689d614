use image::{Rgba, RgbaImage};
use rand::{Rng, SeedableRng};
use std::fs;
use std::path::{Path, PathBuf};

fn solid(w: u32, h: u32, c: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(w, h, Rgba(c))
}

fn random_color_opaque(rng: &mut impl Rng) -> [u8; 4] {
    [rng.r#gen(), rng.r#gen(), rng.r#gen(), 255]
}

fn draw_rect(img: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, c: [u8; 4]) {
    let (iw, ih) = img.dimensions();
    for yy in y.min(ih)..(y.saturating_add(h)).min(ih) {
        for xx in x.min(iw)..(x.saturating_add(w)).min(iw) {
            img.put_pixel(xx, yy, Rgba(c));
        }
    }
}

fn draw_border_rect(img: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, c: [u8; 4]) {
    if w == 0 || h == 0 {
        return;
    }
    draw_rect(img, x, y, w, 1, c);
    draw_rect(img, x, y + h - 1, w, 1, c);
    draw_rect(img, x, y, 1, h, c);
    draw_rect(img, x + w - 1, y, 1, h, c);
}

// --- simple 3x5 bitmap font for digits '0'..'9' ---
const FONT_3X5: [[u8; 5]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111], // 0
    [0b010, 0b110, 0b010, 0b010, 0b111], // 1
    [0b111, 0b001, 0b111, 0b100, 0b111], // 2
    [0b111, 0b001, 0b111, 0b001, 0b111], // 3
    [0b101, 0b101, 0b111, 0b001, 0b001], // 4
    [0b111, 0b100, 0b111, 0b001, 0b111], // 5
    [0b111, 0b100, 0b111, 0b101, 0b111], // 6
    [0b111, 0b001, 0b010, 0b010, 0b010], // 7
    [0b111, 0b101, 0b111, 0b101, 0b111], // 8
    [0b111, 0b101, 0b111, 0b001, 0b111], // 9
];

/// Draws `label` centered in the given cell, scaled to roughly 60% of the cell.
fn draw_label(img: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, label: &str) {
    let len = label.chars().count().max(1) as u32;
    let scale = ((w * 6 / 10) / (4 * len)).min((h * 6 / 10) / 5).max(1);
    let text_w = len * 4 * scale - scale;
    let x0 = x + w.saturating_sub(text_w) / 2;
    let y0 = y + h.saturating_sub(5 * scale) / 2;
    for (i, ch) in label.chars().enumerate() {
        let Some(d) = ch.to_digit(10) else { continue };
        let cx = x0 + i as u32 * 4 * scale;
        for (row_i, row) in FONT_3X5[d as usize].iter().enumerate() {
            for col in 0..3 {
                if (row >> (2 - col)) & 1 == 1 {
                    draw_rect(
                        img,
                        cx + col * scale,
                        y0 + row_i as u32 * scale,
                        scale,
                        scale,
                        [255, 255, 255, 255],
                    );
                }
            }
        }
    }
}

fn save(img: &RgbaImage, path: &Path) -> anyhow::Result<()> {
    img.save(path)?;
    Ok(())
}

/// Loose sprites with varied sizes.
fn gen_sprites(out: &Path, rng: &mut impl Rng) -> anyhow::Result<()> {
    for i in 0..40u32 {
        let w = rng.gen_range(12..=96);
        let h = rng.gen_range(12..=96);
        let mut img = solid(w, h, random_color_opaque(rng));
        draw_border_rect(&mut img, 0, 0, w, h, [0, 0, 0, 255]);
        draw_label(&mut img, 0, 0, w, h, &i.to_string());
        save(&img, &out.join(format!("sprite{:02}.png", i)))?;
    }
    Ok(())
}

/// Grid sheets named `<name>_<cols>x<rows>.png`; every cell carries its raster index.
fn gen_sheet(
    out: &Path,
    name: &str,
    cols: u32,
    rows: u32,
    cell: (u32, u32),
    rng: &mut impl Rng,
) -> anyhow::Result<()> {
    let (cw, ch) = cell;
    let mut img = solid(cols * cw, rows * ch, [0, 0, 0, 0]);
    let base = random_color_opaque(rng);
    for row in 0..rows {
        for col in 0..cols {
            let (x, y) = (col * cw, row * ch);
            let shade = (row * cols + col) as u8 * 8;
            let c = [
                base[0].wrapping_add(shade),
                base[1],
                base[2].wrapping_sub(shade),
                255,
            ];
            draw_rect(&mut img, x + 1, y + 1, cw - 2, ch - 2, c);
            draw_border_rect(&mut img, x, y, cw, ch, [0, 0, 0, 255]);
            draw_label(&mut img, x, y, cw, ch, &(row * cols + col).to_string());
        }
    }
    save(&img, &out.join(format!("{}_{}x{}.png", name, cols, rows)))
}

fn main() -> anyhow::Result<()> {
    // Usage: cargo run -p sheet-packer-cli --example gen_sheets -- [out_dir]
    // Default out_dir: assets/sheets
    let out = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("assets/sheets"));
    fs::create_dir_all(&out)?;

    let mut rng = rand::rngs::StdRng::seed_from_u64(0x5EED);
    gen_sprites(&out, &mut rng)?;
    gen_sheet(&out, "walk", 4, 2, (48, 64), &mut rng)?;
    gen_sheet(&out, "run", 6, 2, (48, 64), &mut rng)?;
    gen_sheet(&out, "coin", 8, 1, (24, 24), &mut rng)?;
    gen_sheet(&out, "explosion", 5, 3, (64, 64), &mut rng)?;

    fs::write(
        out.join("README.txt"),
        "Loose sprites plus grid sheets (walk, run, coin, explosion) for `sheet-packer pack`.",
    )?;
    println!("Generated sprites and sheets under {}", out.display());
    Ok(())
}
