// Sparkline rendering utilities

const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Generate a sparkline on a fixed 0..=100 scale, so a flat 12% line stays low
/// Characters: ▁ ▂ ▃ ▄ ▅ ▆ ▇ █
pub fn render_percent_sparkline(data: &[f64]) -> String {
    data.iter()
        .map(|&v| {
            let ratio = (v / 100.0 * 7.0).clamp(0.0, 7.0);
            BARS[ratio as usize]
        })
        .collect()
}

/// Keep only the last `width` samples
pub fn tail(data: &[f64], width: usize) -> &[f64] {
    &data[data.len().saturating_sub(width)..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_sparkline() {
        let data: Vec<f64> = vec![];
        assert_eq!(render_percent_sparkline(&data), "");
    }

    #[test]
    fn test_percent_scale() {
        assert_eq!(render_percent_sparkline(&[12.0, 12.0]), "▁▁");
        assert_eq!(render_percent_sparkline(&[0.0, 100.0, 150.0]), "▁██");
        assert_eq!(render_percent_sparkline(&[-5.0, 50.0]), "▁▄");
    }

    #[test]
    fn test_tail() {
        let data = [1.0, 2.0, 3.0];
        assert_eq!(tail(&data, 2), &[2.0, 3.0]);
        assert_eq!(tail(&data, 10), &data);
    }
}
