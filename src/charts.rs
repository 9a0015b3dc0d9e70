// src/charts.rs
//! Canvas programs that draw prepared projections. They own their data and
//! never query the dataset themselves.

use chrono::NaiveDate;
use iced::alignment::{Horizontal, Vertical};
use iced::mouse;
use iced::widget::canvas::{self, Frame, Geometry, Path, Stroke, Text};
use iced::{Color, Point, Rectangle, Renderer, Size, Theme};

use crate::data_types::{CountryAggregate, CountrySeries, MapPoint, Metric};
use crate::ui::{category_color, format_compact, reds, Styles};

const TITLE_HEIGHT: f32 = 28.0;
const LEGEND_STEPS: usize = 5;

#[derive(Debug, Clone, Copy)]
pub struct ChartConfig {
    pub padding: f32,
    pub grid_lines: usize,
    pub text: Color,
    pub grid: Color,
}

impl ChartConfig {
    pub fn themed(styles: &Styles) -> Self {
        ChartConfig {
            padding: 56.0,
            grid_lines: 4,
            text: styles.fg,
            grid: styles.grid,
        }
    }
}

pub struct BarChart {
    title: String,
    bars: Vec<CountryAggregate>,
    config: ChartConfig,
}

impl BarChart {
    pub fn new(title: impl Into<String>, bars: Vec<CountryAggregate>, config: ChartConfig) -> Self {
        BarChart {
            title: title.into(),
            bars,
            config,
        }
    }
}

impl<Message> canvas::Program<Message, Renderer> for BarChart {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        let plot = plot_area(bounds.size(), &self.config);
        draw_title(&mut frame, &self.title, &self.config);

        if self.bars.is_empty() {
            draw_placeholder(&mut frame, plot, &self.config);
            return vec![frame.into_geometry()];
        }

        let max = nice_ceiling(self.bars.iter().map(|b| b.confirmed).max().unwrap_or(0) as f64);
        draw_value_grid(&mut frame, plot, max, &self.config);

        let slot = plot.width / self.bars.len() as f32;
        let bar_width = slot * 0.7;
        let max_label_chars = ((slot / 7.0) as usize).max(3);

        for (i, bar) in self.bars.iter().enumerate() {
            let height = (bar.confirmed as f64 / max) as f32 * plot.height;
            let x = plot.x + slot * i as f32 + (slot - bar_width) / 2.0;
            let y = plot.y + plot.height - height;
            let center = x + bar_width / 2.0;

            frame.fill_rectangle(Point::new(x, y), Size::new(bar_width, height), category_color(i));
            frame.fill_text(Text {
                content: format_compact(bar.confirmed as f64),
                position: Point::new(center, y - 4.0),
                color: self.config.text,
                size: 12.0,
                horizontal_alignment: Horizontal::Center,
                vertical_alignment: Vertical::Bottom,
                ..Text::default()
            });
            frame.fill_text(Text {
                content: truncate_label(&bar.country, max_label_chars),
                position: Point::new(center, plot.y + plot.height + 8.0),
                color: self.config.text,
                size: 12.0,
                horizontal_alignment: Horizontal::Center,
                vertical_alignment: Vertical::Top,
                ..Text::default()
            });
        }

        vec![frame.into_geometry()]
    }
}

pub struct LineChart {
    title: String,
    points: Vec<(NaiveDate, u64)>,
    color: Color,
    config: ChartConfig,
}

impl LineChart {
    pub fn from_series(series: &CountrySeries, metric: Metric, color: Color, config: ChartConfig) -> Self {
        LineChart {
            title: format!("{}: {} Over Time", series.country, metric_title(metric)),
            points: series
                .points
                .iter()
                .map(|r| (r.date, r.metric(metric)))
                .collect(),
            color,
            config,
        }
    }
}

impl<Message> canvas::Program<Message, Renderer> for LineChart {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        let plot = plot_area(bounds.size(), &self.config);
        draw_title(&mut frame, &self.title, &self.config);

        let (Some(first), Some(last)) = (self.points.first(), self.points.last()) else {
            draw_placeholder(&mut frame, plot, &self.config);
            return vec![frame.into_geometry()];
        };

        let max = nice_ceiling(self.points.iter().map(|(_, v)| *v).max().unwrap_or(0) as f64);
        draw_value_grid(&mut frame, plot, max, &self.config);

        let span = (last.0 - first.0).num_days().max(1) as f32;
        let project = |date: NaiveDate, value: u64| {
            let x = if self.points.len() == 1 {
                plot.x + plot.width / 2.0
            } else {
                plot.x + plot.width * (date - first.0).num_days() as f32 / span
            };
            let y = plot.y + plot.height - (value as f64 / max) as f32 * plot.height;
            Point::new(x, y)
        };

        let positions: Vec<Point> = self.points.iter().map(|(d, v)| project(*d, *v)).collect();
        let line = Path::new(|builder| {
            for (i, p) in positions.iter().enumerate() {
                if i == 0 {
                    builder.move_to(*p);
                } else {
                    builder.line_to(*p);
                }
            }
        });
        frame.stroke(&line, Stroke::default().with_color(self.color).with_width(2.0));

        for p in &positions {
            frame.fill(&Path::circle(*p, 3.0), self.color);
        }

        let mut ticks = vec![first.0, last.0];
        if self.points.len() > 2 {
            ticks.insert(1, self.points[self.points.len() / 2].0);
        }
        ticks.dedup();
        for date in ticks {
            let x = project(date, 0).x;
            frame.fill_text(Text {
                content: date.format("%Y-%m-%d").to_string(),
                position: Point::new(x, plot.y + plot.height + 8.0),
                color: self.config.text,
                size: 12.0,
                horizontal_alignment: Horizontal::Center,
                vertical_alignment: Vertical::Top,
                ..Text::default()
            });
        }

        vec![frame.into_geometry()]
    }
}

/// Bubble map on an equirectangular projection, shaded on a red scale.
pub struct MapChart {
    title: String,
    points: Vec<MapPoint>,
    config: ChartConfig,
}

impl MapChart {
    pub fn new(title: impl Into<String>, mut points: Vec<MapPoint>, config: ChartConfig) -> Self {
        // largest first so small bubbles stay visible on top
        points.sort_by(|a, b| b.confirmed.cmp(&a.confirmed));
        MapChart {
            title: title.into(),
            points,
            config,
        }
    }
}

impl<Message> canvas::Program<Message, Renderer> for MapChart {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        draw_title(&mut frame, &self.title, &self.config);

        let area = plot_area(bounds.size(), &self.config);
        let map = fit_world(area);

        frame.fill_rectangle(
            Point::new(map.x, map.y),
            map.size(),
            Color {
                a: self.config.grid.a * 0.5,
                ..self.config.grid
            },
        );

        let graticule = Path::new(|builder| {
            for long in (-180..=180).step_by(30) {
                builder.move_to(project(90.0, long as f64, map));
                builder.line_to(project(-90.0, long as f64, map));
            }
            for lat in (-90..=90).step_by(30) {
                builder.move_to(project(lat as f64, -180.0, map));
                builder.line_to(project(lat as f64, 180.0, map));
            }
        });
        frame.stroke(&graticule, Stroke::default().with_color(self.config.grid).with_width(1.0));

        if self.points.is_empty() {
            draw_placeholder(&mut frame, map, &self.config);
            return vec![frame.into_geometry()];
        }

        let max = self.points.iter().map(|p| p.confirmed).max().unwrap_or(0).max(1) as f64;
        for point in &self.points {
            let share = (point.confirmed as f64 / max) as f32;
            let center = project(point.latitude, point.longitude, map);
            let radius = 3.0 + 17.0 * share.sqrt();
            frame.fill(&Path::circle(center, radius), Color { a: 0.85, ..reds(share) });
        }

        // colour legend along the right edge
        let step_height = map.height / (LEGEND_STEPS as f32 * 2.0);
        let legend_x = map.x + map.width + 8.0;
        for i in 0..LEGEND_STEPS {
            let t = 1.0 - i as f32 / (LEGEND_STEPS - 1) as f32;
            frame.fill_rectangle(
                Point::new(legend_x, map.y + step_height * i as f32),
                Size::new(12.0, step_height),
                reds(t),
            );
        }
        for (value, y) in [(max, map.y), (0.0, map.y + step_height * LEGEND_STEPS as f32)] {
            frame.fill_text(Text {
                content: format_compact(value),
                position: Point::new(legend_x + 16.0, y),
                color: self.config.text,
                size: 11.0,
                vertical_alignment: Vertical::Center,
                ..Text::default()
            });
        }

        vec![frame.into_geometry()]
    }
}

fn metric_title(metric: Metric) -> &'static str {
    match metric {
        Metric::Confirmed => "Confirmed Cases",
        Metric::Deaths => "Deaths",
        Metric::Recovered => "Recoveries",
    }
}

fn plot_area(size: Size, config: &ChartConfig) -> Rectangle {
    let top = TITLE_HEIGHT + config.padding / 2.0;
    Rectangle {
        x: config.padding,
        y: top,
        width: (size.width - config.padding * 2.0).max(0.0),
        height: (size.height - top - config.padding).max(0.0),
    }
}

/// Largest 2:1 rectangle centred in `area`.
fn fit_world(area: Rectangle) -> Rectangle {
    let width = area.width.min(area.height * 2.0);
    let height = width / 2.0;
    Rectangle {
        x: area.x + (area.width - width) / 2.0,
        y: area.y + (area.height - height) / 2.0,
        width,
        height,
    }
}

fn project(latitude: f64, longitude: f64, map: Rectangle) -> Point {
    let x = (longitude.clamp(-180.0, 180.0) + 180.0) / 360.0;
    let y = (90.0 - latitude.clamp(-90.0, 90.0)) / 180.0;
    Point::new(map.x + x as f32 * map.width, map.y + y as f32 * map.height)
}

/// Rounds up to 1, 2, 2.5 or 5 times a power of ten.
fn nice_ceiling(value: f64) -> f64 {
    if value <= 0.0 {
        return 1.0;
    }
    let magnitude = 10f64.powf(value.log10().floor());
    [1.0, 2.0, 2.5, 5.0, 10.0]
        .into_iter()
        .map(|step| step * magnitude)
        .find(|candidate| *candidate >= value)
        .unwrap_or(10.0 * magnitude)
}

fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        return label.to_string();
    }
    let kept: String = label.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{kept}…")
}

fn draw_title(frame: &mut Frame, title: &str, config: &ChartConfig) {
    frame.fill_text(Text {
        content: title.to_string(),
        position: Point::new(config.padding, 4.0),
        color: config.text,
        size: 18.0,
        ..Text::default()
    });
}

fn draw_value_grid(frame: &mut Frame, plot: Rectangle, max: f64, config: &ChartConfig) {
    let lines = config.grid_lines.max(1);
    let grid = Path::new(|builder| {
        for i in 0..=lines {
            let y = plot.y + plot.height - plot.height * i as f32 / lines as f32;
            builder.move_to(Point::new(plot.x, y));
            builder.line_to(Point::new(plot.x + plot.width, y));
        }
    });
    frame.stroke(&grid, Stroke::default().with_color(config.grid).with_width(1.0));

    for i in 0..=lines {
        let y = plot.y + plot.height - plot.height * i as f32 / lines as f32;
        frame.fill_text(Text {
            content: format_compact(max * i as f64 / lines as f64),
            position: Point::new(plot.x - 6.0, y),
            color: config.text,
            size: 11.0,
            horizontal_alignment: Horizontal::Right,
            vertical_alignment: Vertical::Center,
            ..Text::default()
        });
    }
}

fn draw_placeholder(frame: &mut Frame, area: Rectangle, config: &ChartConfig) {
    frame.fill_text(Text {
        content: "No data".to_string(),
        position: area.center(),
        color: config.text,
        size: 16.0,
        horizontal_alignment: Horizontal::Center,
        vertical_alignment: Vertical::Center,
        ..Text::default()
    });
}
