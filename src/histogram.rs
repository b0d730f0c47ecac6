use crate::counter::{RollCounter, MIN_FACE, NUM_FACES};

// one text row covers two pixel rows of the surface, so a width/2 surface
// comes out roughly 2:1 on screen
const PX_PER_ROW: f64 = 2.0;

/// One bar of the histogram, in surface pixel units. y grows downward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// The shaded expected-average window, spanning the full surface width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub top: f64,
    pub bottom: f64,
    pub low_count: f64,
    pub high_count: f64,
}

/// Everything needed to draw one frame, computed from the surface width and
/// the counter state. Plain data so sizing and highlight selection can be
/// tested without a terminal.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub width: f64,
    pub height: f64,
    pub bar_spacing: f64,
    pub bar_width: f64,
    pub bar_padding: f64,
    pub font_height: f64,
    pub label_height: f64,
    pub bar_bottom: f64,
    pub max_bar_height: f64,
    pub band: Option<Band>,
    pub bars: [Bar; NUM_FACES],
    /// Faces hatched for sitting at the greatest deviation, minus any whose
    /// count already lands inside the expected band.
    pub highlighted: Vec<u8>,
}

impl Layout {
    /// Derives every layout metric from the surface's current width. The
    /// surface may have been resized since the last draw, so nothing here is
    /// cached.
    pub fn compute(width: f64, counter: &RollCounter) -> Self {
        let height = width * 0.5;
        let bar_spacing = width / NUM_FACES as f64;
        let bar_width = bar_spacing * 0.65;
        let bar_padding = (bar_spacing - bar_width) / 2.0;
        let font_height = bar_width * 0.75;
        let label_height = font_height + bar_padding;
        let bar_bottom = height - label_height;
        let max_bar_height = height - label_height - bar_padding;

        let max_count = counter.max_count();
        let average = counter.expected_average();
        let high_count = average.ceil() + 0.5;
        let low_count = (average.floor() - 0.5).max(0.0);

        let band = (max_count > 0).then(|| Band {
            top: bar_bottom - max_bar_height * high_count / max_count as f64,
            bottom: bar_bottom - max_bar_height * low_count / max_count as f64,
            low_count,
            high_count,
        });

        let bars = std::array::from_fn(|slot| {
            let left = slot as f64 * bar_spacing + bar_padding;
            let height = if max_count > 0 {
                max_bar_height * counter.count(slot as u8 + MIN_FACE) as f64 / max_count as f64
            } else {
                0.0
            };
            Bar {
                left,
                top: bar_bottom - height,
                width: bar_width,
                height,
            }
        });

        let highlighted = counter
            .faces_matching_deviation(counter.greatest_deviation())
            .into_iter()
            .filter(|&face| {
                let count = counter.count(face) as f64;
                !(count >= low_count && count <= high_count)
            })
            .collect();

        Self {
            width,
            height,
            bar_spacing,
            bar_width,
            bar_padding,
            font_height,
            label_height,
            bar_bottom,
            max_bar_height,
            band,
            bars,
            highlighted,
        }
    }
}

/// Paints a layout onto a character grid.
///
/// Stacking matches the original drawing order: band behind everything,
/// hatching over the band across the full column height, bars on top, labels
/// beneath the axis.
pub fn render(layout: &Layout) -> String {
    let cols = layout.width.round() as usize;
    let chart_rows = (layout.bar_bottom / PX_PER_ROW).ceil() as usize;
    let mut out = String::with_capacity((cols + 1) * (chart_rows + 2));

    for row in 0..chart_rows {
        let y_top = row as f64 * PX_PER_ROW;
        let y_mid = y_top + PX_PER_ROW / 2.0;
        for col in 0..cols {
            let x = col as f64 + 0.5;
            let slot = ((x / layout.bar_spacing) as usize).min(NUM_FACES - 1);
            let bar = &layout.bars[slot];
            let in_bar = bar.height > 0.0 && x >= bar.left && x < bar.left + bar.width;
            let glyph = if in_bar && bar.top <= y_top {
                '█'
            } else if in_bar && bar.top <= y_mid {
                '▄'
            } else if layout.highlighted.contains(&(slot as u8 + MIN_FACE))
                && y_mid <= layout.bar_bottom
            {
                '╱'
            } else if matches!(&layout.band, Some(band) if y_mid >= band.top && y_mid <= band.bottom)
            {
                '░'
            } else {
                ' '
            };
            out.push(glyph);
        }
        out.push('\n');
    }

    out.push_str(&"─".repeat(cols));
    out.push('\n');

    // face labels, centered under their columns
    let mut labels = vec![' '; cols];
    for (slot, _) in layout.bars.iter().enumerate() {
        let text = (slot as u8 + MIN_FACE).to_string();
        let center = (slot as f64 + 0.5) * layout.bar_spacing;
        let start = (center - text.len() as f64 / 2.0).round().max(0.0) as usize;
        for (offset, ch) in text.chars().enumerate() {
            if let Some(cell) = labels.get_mut(start + offset) {
                *cell = ch;
            }
        }
    }
    out.extend(labels);
    out.push('\n');
    out
}
