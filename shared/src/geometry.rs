//! Wheel geometry shared by the rotation math and whatever draws the wheel.
//!
//! Angles are in degrees, measured clockwise from 12 o'clock, which is where
//! the pointer sits. Coordinates are in the wheel's own box, origin top-left.

use crate::prize::{Prize, PrizeCatalog};
use serde::Serialize;
use std::f64::consts::PI;

pub const DEFAULT_WHEEL_SIZE: u32 = 300;
pub const MAX_WHEEL_SIZE: u32 = 420;
pub const VIEWPORT_FRACTION: f64 = 0.85;

const INNER_RADIUS_RATIO: f64 = 0.1;
const LABEL_RADIUS_RATIO: f64 = 0.65;
const ICON_RADIUS_RATIO: f64 = 0.35;
const ICON_SIZE_RATIO: f64 = 0.1;
const BORDER_RADIUS_RATIO: f64 = 0.98;
const BORDER_STROKE_RATIO: f64 = 0.06;
const HUB_OUTER_RATIO: f64 = 0.1;
const HUB_INNER_RATIO: f64 = 0.07;
const MIN_FONT_SIZE: f64 = 8.0;

const DARK_TEXT: &str = "#000000";
const LIGHT_TEXT: &str = "#FFFFFF";

pub fn round_to_precision(value: f64, precision: i32) -> f64 {
    let factor = 10f64.powi(precision);
    // Adding 0.0 folds -0.0 into 0.0 so it never prints as "-0".
    (value * factor).round() / factor + 0.0
}

pub fn segment_angle(count: usize) -> f64 {
    360.0 / count as f64
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentSpan {
    pub start: f64,
    pub end: f64,
    pub mid: f64,
}

pub fn segment_span(index: usize, count: usize) -> SegmentSpan {
    let width = segment_angle(count);
    let start = index as f64 * width;
    SegmentSpan {
        start,
        end: start + width,
        mid: start + width / 2.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Point at `distance` from the center along `angle`, rounded for stable output.
pub fn polar_point(center: f64, distance: f64, angle: f64) -> Point {
    let radians = (angle - 90.0) * PI / 180.0;
    Point {
        x: round_to_precision(center + distance * radians.cos(), 3),
        y: round_to_precision(center + distance * radians.sin(), 3),
    }
}

/// SVG path for an annular sector of a wheel with the given diameter.
pub fn arc_path(size: f64, start: f64, end: f64) -> String {
    let radius = size / 2.0;
    let inner = round_to_precision(radius * INNER_RADIUS_RATIO, 3);
    let outer_start = polar_point(radius, radius, start);
    let outer_end = polar_point(radius, radius, end);
    let inner_start = polar_point(radius, inner, start);
    let inner_end = polar_point(radius, inner, end);
    let large_arc = if end - start <= 180.0 { 0 } else { 1 };

    format!(
        "M {},{} A {},{} 0 {} 1 {},{} L {},{} A {},{} 0 {} 0 {},{} Z",
        outer_start.x,
        outer_start.y,
        radius,
        radius,
        large_arc,
        outer_end.x,
        outer_end.y,
        inner_end.x,
        inner_end.y,
        inner,
        inner,
        large_arc,
        inner_start.x,
        inner_start.y,
    )
}

pub fn parse_hex_color(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color
        .strip_prefix('#')?
        .get(0..6)
        .filter(|digits| digits.is_ascii())?;
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// Perceived brightness in `[0, 1]`.
pub fn relative_luminance(red: u8, green: u8, blue: u8) -> f64 {
    (0.299 * red as f64 + 0.587 * green as f64 + 0.114 * blue as f64) / 255.0
}

/// Black on light backgrounds, white on dark ones. Unreadable input gets black.
pub fn contrasting_text_color(background: &str) -> &'static str {
    match parse_hex_color(background) {
        Some((red, green, blue)) if relative_luminance(red, green, blue) <= 0.5 => LIGHT_TEXT,
        _ => DARK_TEXT,
    }
}

pub fn text_color_for(prize: &Prize) -> String {
    match &prize.text_color {
        Some(color) => color.clone(),
        None => contrasting_text_color(&prize.color).to_string(),
    }
}

/// Wheel diameter for a viewport width, capped so it never outgrows the card.
pub fn responsive_wheel_size(viewport_width: f64) -> u32 {
    if !viewport_width.is_finite() || viewport_width <= 0.0 {
        return DEFAULT_WHEEL_SIZE;
    }
    (viewport_width * VIEWPORT_FRACTION)
        .min(MAX_WHEEL_SIZE as f64)
        .round() as u32
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Anchor {
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentLayout {
    pub prize_id: String,
    pub span: SegmentSpan,
    pub path: String,
    pub fill: String,
    pub text_color: String,
    pub label: Anchor,
    pub label_lines: Vec<String>,
    pub icon: Option<Anchor>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WheelLayout {
    pub size: u32,
    pub radius: f64,
    pub border_radius: f64,
    pub border_stroke_width: f64,
    pub hub_outer_radius: f64,
    pub hub_inner_radius: f64,
    pub icon_size: f64,
    pub font_size: f64,
    pub line_height: f64,
    pub segments: Vec<SegmentLayout>,
}

pub fn layout_wheel(catalog: &PrizeCatalog, size: u32) -> WheelLayout {
    let diameter = size as f64;
    let radius = diameter / 2.0;
    let count = catalog.len();

    let segments = catalog
        .prizes()
        .iter()
        .enumerate()
        .map(|(index, prize)| {
            let span = segment_span(index, count);
            let label_at = polar_point(radius, radius * LABEL_RADIUS_RATIO, span.mid);
            let icon = prize.icon.as_ref().map(|_| {
                let icon_at = polar_point(radius, radius * ICON_RADIUS_RATIO, span.mid);
                Anchor {
                    x: icon_at.x,
                    y: icon_at.y,
                    rotation: span.mid,
                }
            });

            SegmentLayout {
                prize_id: prize.id.clone(),
                span,
                path: arc_path(diameter, span.start, span.end),
                fill: prize.color.clone(),
                text_color: text_color_for(prize),
                label: Anchor {
                    x: label_at.x,
                    y: label_at.y,
                    rotation: span.mid,
                },
                label_lines: prize.name.split_whitespace().map(str::to_string).collect(),
                icon,
            }
        })
        .collect();

    WheelLayout {
        size,
        radius,
        border_radius: round_to_precision(radius * BORDER_RADIUS_RATIO, 3),
        border_stroke_width: round_to_precision(diameter * BORDER_STROKE_RATIO, 2),
        hub_outer_radius: round_to_precision(radius * HUB_OUTER_RATIO, 3),
        hub_inner_radius: round_to_precision(radius * HUB_INNER_RATIO, 3),
        icon_size: round_to_precision(diameter * ICON_SIZE_RATIO, 3),
        font_size: round_to_precision((diameter / 35.0).max(MIN_FONT_SIZE), 1),
        line_height: round_to_precision(diameter / 33.0, 1),
        segments,
    }
}
