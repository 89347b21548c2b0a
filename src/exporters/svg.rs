use std::path::Path;

use handlebars::Handlebars;
use log::info;

use crate::config::ReportConfig;
use crate::error::{ReportError, Result};
use crate::layout::LayoutRect;

/// Color per top-level branch, in order of decreasing size.
const PALETTE: [&str; 10] = [
    "#636efa", "#EF553B", "#00cc96", "#ab63fa", "#FFA15A", "#19d3f3", "#FF6692", "#B6E880",
    "#FF97FF", "#FECB52",
];
const ROOT_FILL: &str = "#e5ecf6";
const DARK_TEXT: &str = "#2a3f5f";
const LIGHT_TEXT: &str = "#ffffff";

const FONT_SIZE: u32 = 11;
/// Rough advance of one character at [`FONT_SIZE`].
const CHAR_WIDTH: f64 = 6.6;
const LINE_HEIGHT: f64 = 13.0;
const TEXT_INSET: f64 = 4.0;

#[derive(serde_derive::Serialize)]
struct SvgData {
    width: u32,
    height: u32,
    boxes: Vec<SvgBox>,
}

#[derive(serde_derive::Serialize)]
struct SvgBox {
    depth: usize,
    x: String,
    y: String,
    w: String,
    h: String,
    fill: String,
    hover: String,
    lines: Vec<SvgText>,
}

#[derive(serde_derive::Serialize)]
struct SvgText {
    x: String,
    y: String,
    font_size: u32,
    color: &'static str,
    text: String,
}

pub fn render(rects: &[LayoutRect], config: &ReportConfig) -> Result<String> {
    let mut handlebars = Handlebars::new();
    handlebars.set_strict_mode(true);
    handlebars
        .register_template_string("treemap", include_str!("../../static/treemap.svg.hbs"))
        .map_err(|e| ReportError::Template(Box::new(e)))?;

    let data = SvgData {
        width: config.width,
        height: config.height,
        boxes: rects.iter().map(|rect| svg_box(rect, config)).collect(),
    };
    Ok(handlebars.render("treemap", &data)?)
}

/// Create or truncate `path` and write `svg` to it.
pub fn write(svg: &str, path: &Path) -> Result<()> {
    std::fs::write(path, svg).map_err(|source| ReportError::Write {
        path: path.to_owned(),
        source,
    })?;
    info!("wrote {} bytes to {}", svg.len(), path.display());
    Ok(())
}

fn svg_box(rect: &LayoutRect, config: &ReportConfig) -> SvgBox {
    let fill = fill_color(rect);
    let color = text_color(&fill);
    let r = rect.rect;

    let mut lines = Vec::new();
    let mut line = |text: String, baseline: f64| {
        lines.push(SvgText {
            x: px(r.x + TEXT_INSET),
            y: px(r.y + baseline),
            font_size: FONT_SIZE,
            color,
            text,
        })
    };
    if let Some(name) = fit_label(&rect.name, r.w) {
        if rect.has_children {
            // Children start below the header band, so the label always fits.
            line(name, (config.header_height + FONT_SIZE as f64) / 2.0);
        } else if r.h >= LINE_HEIGHT + 2.0 {
            line(name, LINE_HEIGHT);
            if r.h >= 2.0 * LINE_HEIGHT + 4.0 {
                if let Some(size) = fit_label(&rect.size.to_string(), r.w) {
                    line(size, 2.0 * LINE_HEIGHT);
                }
            }
        }
    }

    SvgBox {
        depth: rect.depth,
        x: px(r.x),
        y: px(r.y),
        w: px(r.w),
        h: px(r.h),
        fill,
        hover: format!("{}\nsize={}", rect.path, rect.size),
        lines,
    }
}

fn px(v: f64) -> String {
    format!("{v:.2}")
}

/// `label`, shortened with an ellipsis to fit `width`. `None` when not even
/// two characters fit.
fn fit_label(label: &str, width: f64) -> Option<String> {
    let max_chars = ((width - 2.0 * TEXT_INSET) / CHAR_WIDTH).floor();
    if max_chars < 2.0 {
        return None;
    }
    let max_chars = max_chars as usize;
    if label.chars().count() <= max_chars {
        Some(label.to_string())
    } else {
        let mut short = label.chars().take(max_chars - 1).collect::<String>();
        short.push('…');
        Some(short)
    }
}

/// Branch color, washed out toward white the deeper the box.
fn fill_color(rect: &LayoutRect) -> String {
    let Some(branch) = rect.branch else {
        return ROOT_FILL.to_string();
    };
    let base = rgb(PALETTE[branch % PALETTE.len()]);
    let t = (0.18 * rect.depth.saturating_sub(1) as f64).min(0.72);
    let [r, g, b] = base.map(|c| (c as f64 + (255.0 - c as f64) * t).round() as u8);
    format!("#{r:02x}{g:02x}{b:02x}")
}

fn text_color(fill: &str) -> &'static str {
    let [r, g, b] = rgb(fill);
    let luma = 0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64;
    if luma > 160.0 {
        DARK_TEXT
    } else {
        LIGHT_TEXT
    }
}

/// Parses `#rrggbb`. Only ever called on the constants above and on
/// [`fill_color`] output.
fn rgb(hex: &str) -> [u8; 3] {
    let channel = |i: usize| {
        hex.get(1 + 2 * i..3 + 2 * i)
            .and_then(|c| u8::from_str_radix(c, 16).ok())
            .unwrap_or(0)
    };
    [channel(0), channel(1), channel(2)]
}
