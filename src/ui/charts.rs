//! Line charts over the rolling windows.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    symbols,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};

use super::common::format_count;
use super::theme::Tone;
use crate::app::App;
use crate::data::{Field, RollingWindow};

/// Points of a window, oldest at x = 0.
pub fn chart_points(window: &RollingWindow<u64>) -> Vec<(f64, f64)> {
    window
        .iter()
        .enumerate()
        .map(|(i, v)| (i as f64, *v as f64))
        .collect()
}

/// Y axis range covering the window. A flat series gets a band of one unit
/// on each side so the line stays visible.
pub fn y_bounds(window: &RollingWindow<u64>) -> [f64; 2] {
    match window.bounds() {
        Some((min, max)) if min == max => [min.saturating_sub(1) as f64, max as f64 + 1.0],
        Some((min, max)) => [min as f64, max as f64],
        None => [0.0, 1.0],
    }
}

/// Render the chart of `field`; fields without history render an empty frame.
pub fn render_chart(frame: &mut Frame, app: &App, area: Rect, field: Field, tone: Tone) {
    let color = app.theme.color(tone);
    let block = Block::default()
        .title(Span::styled(
            format!(" {} ", field.label()),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::TOP)
        .border_style(Style::default().fg(app.theme.border));

    let Some(window) = app.snapshot.window(field) else {
        frame.render_widget(block, area);
        return;
    };

    let points = chart_points(window);
    let [low, high] = y_bounds(window);
    let x_max = window.capacity().saturating_sub(1).max(1) as f64;

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(&points);

    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(Axis::default().bounds([0.0, x_max]))
        .y_axis(
            Axis::default()
                .style(app.theme.muted)
                .bounds([low, high])
                .labels(vec![format_count(low as u64), format_count(high as u64)]),
        );

    frame.render_widget(chart, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(values: &[u64]) -> RollingWindow<u64> {
        let mut window = RollingWindow::new(5);
        for v in values {
            window.push(*v);
        }
        window
    }

    #[test]
    fn test_chart_points() {
        assert!(chart_points(&window(&[])).is_empty());
        assert_eq!(
            chart_points(&window(&[7, 9])),
            vec![(0.0, 7.0), (1.0, 9.0)]
        );
    }

    #[test]
    fn test_y_bounds() {
        assert_eq!(y_bounds(&window(&[])), [0.0, 1.0]);
        assert_eq!(y_bounds(&window(&[3, 10, 5])), [3.0, 10.0]);
        assert_eq!(y_bounds(&window(&[4, 4])), [3.0, 5.0]);
        assert_eq!(y_bounds(&window(&[0])), [0.0, 1.0]);
    }
}
