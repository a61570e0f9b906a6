// Color palette for categorical marks (bars, pie slices)

/// Number of colors before the palette cycles
pub const PALETTE_SIZE: usize = 8;

/// Cyclic color palette; index `i` always resolves to `i % PALETTE_SIZE`
#[derive(Debug, Clone)]
pub struct ColorPalette {
    colors: [&'static str; PALETTE_SIZE],
}

impl ColorPalette {
    /// The eight-color chart palette used for bars and pie slices
    pub fn chart8() -> Self {
        ColorPalette {
            colors: [
                "#8884d8", // violet
                "#82ca9d", // green
                "#ffc658", // amber
                "#ff7c7c", // coral
                "#8dd1e1", // sky
                "#d084d0", // orchid
                "#ffb347", // orange
                "#a4de6c", // lime
            ],
        }
    }

    /// Palette slot for a mark at `position` in the series
    pub fn index_for(&self, position: usize) -> usize {
        position % PALETTE_SIZE
    }

    /// Get color for a specific index (wraps around if index > palette size)
    pub fn get_color(&self, index: usize) -> &'static str {
        self.colors[self.index_for(index)]
    }
}

/// Parse `#rrggbb` into its channels
pub fn parse_hex_color(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}
