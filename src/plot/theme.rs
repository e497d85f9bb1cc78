//! Color themes for genotype plots

use plotters::style::RGBColor;

/// Color theme for plots
#[derive(Debug, Clone)]
pub struct Theme {
    /// Text color
    pub text: RGBColor,
    /// Axis color
    pub axis: RGBColor,
    /// Box fill in the correlation plot
    pub box_fill: RGBColor,
    /// Box outline, median and whiskers
    pub box_edge: RGBColor,
    /// Individual sample points in the strip
    pub strip_points: RGBColor,
    /// Least squares trendline
    pub trendline: RGBColor,
    /// Map graticule
    pub graticule: RGBColor,
    /// One color per genotype category, in display order
    pub category_colors: Vec<RGBColor>,
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}

impl Theme {
    /// Light blue boxes with a red trendline
    pub fn classic() -> Self {
        Self {
            text: RGBColor(0, 0, 0),
            axis: RGBColor(60, 60, 60),
            box_fill: RGBColor(190, 221, 253),     // #BEDDFD
            box_edge: RGBColor(70, 70, 70),
            strip_points: RGBColor(37, 143, 248),  // #258FF8
            trendline: RGBColor(232, 125, 133),    // #E87D85
            graticule: RGBColor(215, 215, 215),
            category_colors: vec![
                RGBColor(31, 119, 180),   // Blue
                RGBColor(255, 127, 14),   // Orange
                RGBColor(44, 160, 44),    // Green
                RGBColor(214, 39, 40),    // Red
            ],
        }
    }

    /// Color of the category at `index`, cycling when there are more
    /// categories than colors
    pub fn category_color(&self, index: usize) -> RGBColor {
        self.category_colors[index % self.category_colors.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_color_cycles() {
        let theme = Theme::classic();
        assert_eq!(theme.category_color(0), theme.category_color(4));
        assert_ne!(theme.category_color(0), theme.category_color(1));
    }
}
