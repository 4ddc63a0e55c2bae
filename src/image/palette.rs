//! Color quantization with a median-cut palette.
//!
//! The distinct colors of an image, weighted by how many pixels use them, start
//! out in one box. Until there are as many boxes as requested colors, the box
//! with the widest channel range is split at the weighted median of that
//! channel. Each box then contributes its weighted mean color to the palette,
//! and every pixel is redrawn with its nearest palette color.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap, HashMap};

use tracing::{debug, trace};

use super::{ImageGrid, Rgb};
use crate::{DigitizerError, DigitizerResult};

/// Largest palette an indexed [`ImageGrid`] can address.
pub const MAX_PALETTE_COLORS: usize = u16::MAX as usize + 1;

#[derive(Debug, Clone, Copy)]
struct ColorCount {
    color: Rgb,
    count: usize,
}

#[derive(Debug, Clone)]
struct ColorBox {
    entries: Vec<ColorCount>,
    // lower/upper choices from the first box; sorts boxes into palette order
    path: Vec<bool>,
    population: usize,
    low: [u8; 3],
    high: [u8; 3],
    channel: usize,
    range: u8,
}

impl ColorBox {
    fn new(entries: Vec<ColorCount>, path: Vec<bool>) -> Self {
        let mut population = 0;
        let mut low = [u8::MAX; 3];
        let mut high = [u8::MIN; 3];
        for entry in &entries {
            population += entry.count;
            for channel in 0..3 {
                low[channel] = low[channel].min(entry.color.0[channel]);
                high[channel] = high[channel].max(entry.color.0[channel]);
            }
        }

        // R wins ties, then G
        let (channel, range) = (0..3).fold((0, 0), |best, channel| {
            let range = high[channel].saturating_sub(low[channel]);
            if range > best.1 { (channel, range) } else { best }
        });

        Self {
            entries,
            path,
            population,
            low,
            high,
            channel,
            range,
        }
    }

    fn is_splittable(&self) -> bool {
        self.range > 0
    }

    // Only called on splittable boxes; both halves keep at least one color.
    fn split(self) -> (ColorBox, ColorBox) {
        let channel = self.channel;
        let mut population_at = [0usize; 256];
        for entry in &self.entries {
            population_at[usize::from(entry.color.0[channel])] += entry.count;
        }

        let (low, high) = (self.low[channel], self.high[channel]);
        let half = self.population.div_ceil(2);
        let mut cut = low;
        let mut seen = population_at[usize::from(low)];
        while seen < half && cut + 1 < high {
            cut += 1;
            seen += population_at[usize::from(cut)];
        }

        let (lower, upper): (Vec<_>, Vec<_>) = self
            .entries
            .into_iter()
            .partition(|entry| entry.color.0[channel] <= cut);

        let mut lower_path = self.path;
        let mut upper_path = lower_path.clone();
        lower_path.push(false);
        upper_path.push(true);
        (
            ColorBox::new(lower, lower_path),
            ColorBox::new(upper, upper_path),
        )
    }

    fn mean_color(&self) -> Rgb {
        let population = self.population.max(1);
        let mut mean = [0u8; 3];
        for (channel, value) in mean.iter_mut().enumerate() {
            let sum: usize = self
                .entries
                .iter()
                .map(|e| usize::from(e.color.0[channel]) * e.count)
                .sum();
            // rounded, always <= 255
            *value = ((sum + population / 2) / population) as u8;
        }
        Rgb(mean)
    }
}

// Heap order: widest range, then largest population, then earliest in palette order.
impl Ord for ColorBox {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.range, self.population)
            .cmp(&(other.range, other.population))
            .then_with(|| other.path.cmp(&self.path))
    }
}

impl PartialOrd for ColorBox {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ColorBox {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ColorBox {}

/// Chooses up to `color_count` colors for `image` by median cut.
///
/// Returns fewer colors when the image has fewer distinct colors than
/// requested; each distinct color is then its own palette entry. Requests above
/// [`MAX_PALETTE_COLORS`] are capped there. The result is deterministic for a
/// given image.
///
/// # Errors
/// [`DigitizerError::InvalidParameter`] if `color_count` is zero.
pub fn median_cut_palette(image: &ImageGrid, color_count: usize) -> DigitizerResult<Vec<Rgb>> {
    if color_count == 0 {
        return Err(DigitizerError::invalid_parameter(
            "color_count",
            "must be >= 1",
        ));
    }
    let color_count = color_count.min(MAX_PALETTE_COLORS);

    let mut histogram: BTreeMap<Rgb, usize> = BTreeMap::new();
    for &pixel in image.to_pixels().iter() {
        *histogram.entry(pixel).or_insert(0) += 1;
    }
    let entries = histogram
        .into_iter()
        .map(|(color, count)| ColorCount { color, count })
        .collect();

    let mut pending = BinaryHeap::new();
    let mut settled = Vec::new();
    let root = ColorBox::new(entries, Vec::new());
    if root.is_splittable() {
        pending.push(root);
    } else {
        settled.push(root);
    }

    while pending.len() + settled.len() < color_count {
        let Some(widest) = pending.pop() else {
            break;
        };
        let (lower, upper) = widest.split();
        trace!(
            depth = lower.path.len(),
            lower = lower.entries.len(),
            upper = upper.entries.len(),
            "split color box"
        );
        for half in [lower, upper] {
            if half.is_splittable() {
                pending.push(half);
            } else {
                settled.push(half);
            }
        }
    }

    let mut boxes = pending.into_vec();
    boxes.append(&mut settled);
    boxes.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(boxes.iter().map(ColorBox::mean_color).collect())
}

const CELL_SHIFT: u32 = 4;
const CELLS_PER_AXIS: usize = 256 >> CELL_SHIFT;
const CELL_WIDTH: u32 = 1 << CELL_SHIFT;

/// Palette entries bucketed on a coarse RGB grid for nearest-color lookups.
struct PaletteIndex<'a> {
    palette: &'a [Rgb],
    cells: Vec<Vec<u16>>,
}

impl<'a> PaletteIndex<'a> {
    fn cell_of(color: Rgb) -> [usize; 3] {
        color.0.map(|c| usize::from(c >> CELL_SHIFT))
    }

    fn flat([r, g, b]: [usize; 3]) -> usize {
        (r * CELLS_PER_AXIS + g) * CELLS_PER_AXIS + b
    }

    // palette.len() <= MAX_PALETTE_COLORS is checked by the caller
    fn new(palette: &'a [Rgb]) -> Self {
        let mut cells = vec![Vec::new(); CELLS_PER_AXIS.pow(3)];
        for (i, &color) in palette.iter().enumerate() {
            cells[Self::flat(Self::cell_of(color))].push(i as u16);
        }
        Self { palette, cells }
    }

    /// Index of the palette color closest to `color`; ties go to the lower index.
    fn nearest(&self, color: Rgb) -> u16 {
        let center = Self::cell_of(color);
        let mut best: Option<(u32, u16)> = None;

        for radius in 0..CELLS_PER_AXIS {
            let span = |axis: usize| {
                let last = (center[axis] + radius).min(CELLS_PER_AXIS - 1);
                center[axis].saturating_sub(radius)..=last
            };
            for r in span(0) {
                for g in span(1) {
                    for b in span(2) {
                        let shell = [r, g, b]
                            .iter()
                            .zip(center)
                            .map(|(&c, o)| c.abs_diff(o))
                            .max()
                            .unwrap_or(0);
                        if shell != radius {
                            continue;
                        }
                        for &i in &self.cells[Self::flat([r, g, b])] {
                            let distance = color.distance_squared(self.palette[usize::from(i)]);
                            let closer = match best {
                                None => true,
                                Some((d, j)) => distance < d || (distance == d && i < j),
                            };
                            if closer {
                                best = Some((distance, i));
                            }
                        }
                    }
                }
            }

            // every unvisited cell lies at least this far away along one axis
            let reach = CELL_WIDTH * radius as u32 + 1;
            if best.is_some_and(|(d, _)| d < reach * reach) {
                break;
            }
        }

        best.map_or(0, |(_, i)| i)
    }
}

/// Maps every pixel of `image` to its nearest color in `palette`.
///
/// Distance is squared euclidean RGB distance; ties go to the earlier palette
/// entry. The result is palette-indexed; call [`ImageGrid::to_rgb`] for full color.
///
/// # Errors
/// [`DigitizerError::InvalidParameter`] if the palette is empty or has more than
/// [`MAX_PALETTE_COLORS`] entries.
pub fn quantize_to_palette(image: &ImageGrid, palette: &[Rgb]) -> DigitizerResult<ImageGrid> {
    if palette.is_empty() || palette.len() > MAX_PALETTE_COLORS {
        return Err(DigitizerError::invalid_parameter(
            "palette",
            format!(
                "must hold 1 to {MAX_PALETTE_COLORS} colors, got {}",
                palette.len()
            ),
        ));
    }

    let index = PaletteIndex::new(palette);
    let mut nearest: HashMap<Rgb, u16> = HashMap::new();
    let indices = image
        .to_pixels()
        .mapv(|pixel| *nearest.entry(pixel).or_insert_with(|| index.nearest(pixel)));

    ImageGrid::from_indexed(indices, palette.to_vec())
}

/// Reduces `image` to at most `color_count` colors and returns it in full color.
///
/// Combines [`median_cut_palette`] and [`quantize_to_palette`], then
/// de-palettizes. Any positive `color_count` is accepted, powers of two or not;
/// counts above [`MAX_PALETTE_COLORS`] are capped there.
///
/// # Errors
/// [`DigitizerError::InvalidParameter`] if `color_count` is zero.
pub fn reduce_colors(image: &ImageGrid, color_count: usize) -> DigitizerResult<ImageGrid> {
    let palette = median_cut_palette(image, color_count)?;
    let indexed = quantize_to_palette(image, &palette)?;

    debug!(
        requested = color_count,
        palette = palette.len(),
        "reduced image colors"
    );
    Ok(indexed.to_rgb())
}
