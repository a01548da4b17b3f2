//! Color assigner

/// Base palette, cycled by series position
const PALETTE: [(u8, u8, u8); 5] = [
    (255, 99, 132),
    (54, 162, 235),
    (255, 206, 86),
    (75, 192, 192),
    (153, 102, 255),
];

/// Parallel background and border colors for a series
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartColors {
    pub background: Vec<String>,
    pub border: Vec<String>,
}

/// Colors for `n` series entries; entry `i` depends only on `i % 5`
pub fn chart_colors(n: usize) -> ChartColors {
    let mut colors = ChartColors {
        background: Vec::with_capacity(n),
        border: Vec::with_capacity(n),
    };
    for (r, g, b) in PALETTE.iter().cycle().take(n) {
        colors.background.push(format!("rgba({}, {}, {}, 0.5)", r, g, b));
        colors.border.push(format!("rgba({}, {}, {}, 1)", r, g, b));
    }
    colors
}
