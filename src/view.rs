// src/view.rs
use std::path::Path;

use iced::alignment::Horizontal;
use iced::widget::{
    button, column, container, pick_list, radio, row, scrollable, text, text_input, Canvas, Column,
    Space,
};
use iced::{Alignment, Color, Element, Length};

use crate::charts::{BarChart, ChartConfig, LineChart, MapChart};
use crate::data_types::{CountrySeries, Dataset, Metric, View};
use crate::error::DataError;
use crate::query;
use crate::ui::{self, category_color, format_count, Styles};
use crate::Message;

const SIDEBAR_WIDTH: f32 = 280.0;
const CHART_HEIGHT: f32 = 380.0;

/// What the Country Insights page needs from the application state.
pub struct CountryPage<'a> {
    pub countries: &'a [String],
    pub search_input: &'a str,
    pub search_matched: bool,
    pub selected: Option<&'a String>,
    pub series: Option<&'a Result<CountrySeries, DataError>>,
    pub show_trends: bool,
}

pub fn sidebar<'a>(
    current: View,
    dataset: &Dataset,
    source: &Path,
    is_dark_mode: bool,
    styles: &Styles,
) -> Element<'a, Message> {
    let navigation = Column::with_children(
        View::ALL
            .iter()
            .map(|view| radio(view.to_string(), *view, Some(current), Message::Navigate).into())
            .collect(),
    )
    .spacing(10);

    let latest = dataset
        .latest_date()
        .map_or_else(|| "-".to_string(), |d| d.to_string());
    let source_name = source
        .file_name()
        .map_or_else(|| source.display().to_string(), |n| n.to_string_lossy().into_owned());

    let dataset_info = column![
        text("Dataset").size(14).style(styles.muted_fg),
        text(source_name).size(14).style(styles.sidebar_fg),
        text(format!("{} records", format_count(dataset.len() as u64)))
            .size(14)
            .style(styles.sidebar_fg),
        text(format!("Latest date {latest}"))
            .size(14)
            .style(styles.sidebar_fg),
    ]
    .spacing(4);

    let theme_label = if is_dark_mode { "Light mode" } else { "Dark mode" };

    let content = column![
        text("Navigation Panel").size(24).style(styles.sidebar_fg),
        text("Go to Section:").size(16).style(styles.muted_fg),
        navigation,
        Space::with_height(Length::Fill),
        dataset_info,
        button(text(theme_label).size(14))
            .on_press(Message::ToggleTheme)
            .padding(8)
            .style(ui::flat_button(styles)),
    ]
    .spacing(16)
    .padding(24);

    container(content)
        .width(Length::Fixed(SIDEBAR_WIDTH))
        .height(Length::Fill)
        .style(ui::panel(styles.sidebar_bg, styles.sidebar_fg))
        .into()
}

pub fn home_page<'a>(dataset: &Dataset, styles: &Styles) -> Element<'a, Message> {
    let summary = query::global_summary(dataset);

    let cards = row![
        metric_card("Total Confirmed", summary.confirmed, styles),
        metric_card("Total Deaths", summary.deaths, styles),
        metric_card("Total Recovered", summary.recovered, styles),
    ]
    .spacing(16);

    let map_title = match dataset.latest_date() {
        Some(date) => format!("Worldwide Cases (as of {date})"),
        None => "Worldwide Cases".to_string(),
    };
    let map = Canvas::new(MapChart::new(
        map_title,
        query::map_points(dataset),
        ChartConfig::themed(styles),
    ))
    .width(Length::Fill)
    .height(Length::Fixed(CHART_HEIGHT + 60.0));

    page(
        column![
            heading("COVID-19 Global Dashboard", styles),
            paragraph(
                "Gain insights into the worldwide spread of COVID-19 using data visualization and analytics.",
                styles,
            ),
            cards,
            subheading("Global Spread Map", styles),
            map,
        ],
        styles,
    )
}

pub fn top_countries_page<'a>(dataset: &Dataset, n: usize, styles: &Styles) -> Element<'a, Message> {
    let top = query::top_countries(dataset, n);

    let body: Element<'a, Message> = if top.is_empty() {
        paragraph("No countries reported on the latest date.", styles)
    } else {
        Canvas::new(BarChart::new(
            format!("Top {n} Countries by Confirmed Cases"),
            top,
            ChartConfig::themed(styles),
        ))
        .width(Length::Fill)
        .height(Length::Fixed(CHART_HEIGHT + 80.0))
        .into()
    };

    page(
        column![heading(format!("Top {n} Most Affected Countries"), styles), body],
        styles,
    )
}

pub fn country_page<'a>(state: CountryPage<'a>, styles: &Styles) -> Element<'a, Message> {
    let mut content = column![
        heading("Country-wise Insights", styles),
        paragraph(
            "Use the search bar below to explore COVID-19 trends for any country.",
            styles,
        ),
        text_input("Search Country", state.search_input)
            .on_input(Message::SearchChanged)
            .padding(10)
            .width(Length::Fixed(360.0)),
    ];

    if !state.search_matched {
        content = content.push(
            pick_list(
                state.countries,
                state.selected.cloned(),
                Message::CountrySelected,
            )
            .placeholder("Select Country")
            .padding(10)
            .width(Length::Fixed(360.0)),
        );
    }

    content = match state.series {
        None => content.push(paragraph("Select a country to see its figures.", styles)),
        Some(Err(err)) => content.push(notice(err.to_string(), styles.error_fg)),
        Some(Ok(series)) => {
            let content = match query::latest_country_record(series) {
                Some(latest) => content.push(
                    row![
                        metric_card("Confirmed", latest.confirmed, styles),
                        metric_card("Deaths", latest.deaths, styles),
                        metric_card("Recovered", latest.recovered, styles),
                    ]
                    .spacing(16),
                ),
                None => content,
            };

            let toggle = if state.show_trends {
                "Hide Trend Graphs"
            } else {
                "Show Trend Graphs"
            };
            let mut content = content.push(
                button(text(toggle).size(16))
                    .on_press(Message::ToggleTrends)
                    .padding(10)
                    .style(ui::flat_button(styles)),
            );

            if state.show_trends {
                for (i, metric) in Metric::ALL.into_iter().enumerate() {
                    content = content.push(
                        Canvas::new(LineChart::from_series(
                            series,
                            metric,
                            category_color(i),
                            ChartConfig::themed(styles),
                        ))
                        .width(Length::Fill)
                        .height(Length::Fixed(CHART_HEIGHT)),
                    );
                }
            }
            content
        }
    };

    page(content, styles)
}

pub fn about_page<'a>(styles: &Styles) -> Element<'a, Message> {
    page(
        column![
            heading("About This Project", styles),
            paragraph(
                "This interactive dashboard visualizes the spread of COVID-19 globally. \
                 It reads a daily per-country case dataset once at start-up and derives \
                 every figure from the latest reported day.",
                styles,
            ),
            subheading("Views", styles),
            paragraph("Home: global totals and a map of confirmed cases.", styles),
            paragraph("Top 10 Affected Countries: ranking by confirmed cases.", styles),
            paragraph("Country Insights: per-country figures and trends.", styles),
            subheading("Technologies Used", styles),
            paragraph("Rust, iced, csv, serde, chrono.", styles),
        ],
        styles,
    )
}

/// Full-window message shown while loading or after a fatal load error.
pub fn status_page<'a>(message: impl ToString, color: Color, styles: &Styles) -> Element<'a, Message> {
    container(
        text(message)
            .size(24)
            .style(color)
            .horizontal_alignment(Horizontal::Center),
    )
    .width(Length::Fill)
    .height(Length::Fill)
    .center_x()
    .center_y()
    .padding(40)
    .style(ui::panel(styles.bg, styles.fg))
    .into()
}

fn page<'a>(content: Column<'a, Message>, styles: &Styles) -> Element<'a, Message> {
    container(scrollable(content.spacing(20).padding(32).width(Length::Fill)))
        .width(Length::Fill)
        .height(Length::Fill)
        .style(ui::panel(styles.bg, styles.fg))
        .into()
}

fn metric_card<'a>(label: &str, value: u64, styles: &Styles) -> Element<'a, Message> {
    container(
        column![
            text(label).size(16).style(styles.muted_fg),
            text(format_count(value)).size(32).style(styles.fg),
        ]
        .spacing(6)
        .align_items(Alignment::Start),
    )
    .padding(20)
    .width(Length::Fill)
    .style(ui::card(styles))
    .into()
}

fn heading<'a>(title: impl ToString, styles: &Styles) -> Element<'a, Message> {
    text(title).size(32).style(styles.fg).into()
}

fn subheading<'a>(title: impl ToString, styles: &Styles) -> Element<'a, Message> {
    text(title).size(22).style(styles.fg).into()
}

fn paragraph<'a>(body: impl ToString, styles: &Styles) -> Element<'a, Message> {
    text(body).size(16).style(styles.muted_fg).into()
}

fn notice<'a>(body: impl ToString, color: Color) -> Element<'a, Message> {
    text(body).size(16).style(color).into()
}
