// src/main.rs
use std::sync::Arc;

use env_logger::Env;
use iced::widget::{container, row};
use iced::{executor, window, Application, Command, Element, Length, Settings, Theme};
use log::{debug, error, info, warn};

mod charts;
mod config;
mod csv_handler;
mod data_types;
mod error;
mod query;
mod ui;
mod view;

use config::DashboardConfig;
use csv_handler::DatasetLoader;
use data_types::{CountryResolution, CountrySeries, Dataset, View};
use error::DataError;
use ui::{Styles, DARK_THEME, LIGHT_THEME};

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn main() -> anyhow::Result<()> {
    let config = config::load_config()?;

    env_logger::Builder::from_env(Env::default().default_filter_or(config.log_level.as_str()))
        .init();
    info!(
        "Pandemic Dashboard v{VERSION} starting with dataset {}",
        config.dataset_path.display()
    );

    Dashboard::run(Settings {
        window: window::Settings {
            size: (1280, 860),
            resizable: true,
            ..Default::default()
        },
        ..Settings::with_flags(config)
    })
    .map_err(|e| anyhow::anyhow!("dashboard window failed: {e}"))
}

enum LoadState {
    Loading,
    Ready(Arc<Dataset>),
    Failed(DataError),
}

struct Dashboard {
    config: DashboardConfig,
    loader: Arc<DatasetLoader>,
    is_dark_mode: bool,
    load_state: LoadState,
    view: View,
    countries: Vec<String>,
    search_input: String,
    search_match: Option<String>,
    selected_country: Option<String>,
    series: Option<Result<CountrySeries, DataError>>,
    show_trends: bool,
}

#[derive(Debug, Clone)]
pub enum Message {
    DatasetLoaded(Result<Arc<Dataset>, DataError>),
    Navigate(View),
    SearchChanged(String),
    CountrySelected(String),
    ToggleTrends,
    ToggleTheme,
}

impl Application for Dashboard {
    type Executor = executor::Default;
    type Message = Message;
    type Theme = Theme;
    type Flags = DashboardConfig;

    fn new(config: DashboardConfig) -> (Self, Command<Message>) {
        let loader = Arc::new(DatasetLoader::new(
            config.dataset_path.clone(),
            config.date_format.clone(),
        ));
        let load = Command::perform(loader.clone().load_async(), Message::DatasetLoaded);

        (
            Dashboard {
                is_dark_mode: config.dark_mode,
                config,
                loader,
                load_state: LoadState::Loading,
                view: View::default(),
                countries: Vec::new(),
                search_input: String::new(),
                search_match: None,
                selected_country: None,
                series: None,
                show_trends: false,
            },
            load,
        )
    }

    fn title(&self) -> String {
        format!("COVID-19 Global Analytics Dashboard v{}", VERSION)
    }

    fn update(&mut self, message: Message) -> Command<Message> {
        match message {
            Message::DatasetLoaded(Ok(dataset)) => {
                self.countries = dataset.countries();
                // the selector falls back to the first country, like an untouched select box
                self.selected_country = self.countries.first().cloned();
                self.load_state = LoadState::Ready(dataset);
                self.refresh_country();
            }

            Message::DatasetLoaded(Err(err)) => {
                if err.is_fatal() {
                    error!("Dataset load failed: {err}");
                } else {
                    warn!("Dataset load returned an unexpected error: {err}");
                }
                self.load_state = LoadState::Failed(err);
            }

            Message::Navigate(view) => {
                debug!("Navigating to {view}");
                self.view = view;
            }

            Message::SearchChanged(input) => {
                self.search_input = input;
                self.refresh_country();
            }

            Message::CountrySelected(country) => {
                self.selected_country = Some(country);
                self.refresh_country();
            }

            Message::ToggleTrends => {
                self.show_trends = !self.show_trends;
            }

            Message::ToggleTheme => {
                self.is_dark_mode = !self.is_dark_mode;
            }
        }
        Command::none()
    }

    fn view(&self) -> Element<Message> {
        let styles = self.styles();

        let dataset = match &self.load_state {
            LoadState::Loading => {
                return view::status_page("Loading dataset…", styles.fg, styles);
            }
            LoadState::Failed(err) => {
                return view::status_page(
                    format!("The dashboard could not be started.\n{err}"),
                    styles.error_fg,
                    styles,
                );
            }
            LoadState::Ready(dataset) => dataset,
        };

        let page = match self.view {
            View::Home => view::home_page(dataset, styles),
            View::TopCountries => view::top_countries_page(dataset, self.config.top_n, styles),
            View::CountryInsights => view::country_page(
                view::CountryPage {
                    countries: &self.countries,
                    search_input: &self.search_input,
                    search_matched: self.search_match.is_some(),
                    selected: self.selected_country.as_ref(),
                    series: self.series.as_ref(),
                    show_trends: self.show_trends,
                },
                styles,
            ),
            View::About => view::about_page(styles),
        };

        let sidebar = view::sidebar(
            self.view,
            dataset,
            self.loader.path(),
            self.is_dark_mode,
            styles,
        );

        container(row![sidebar, page])
            .width(Length::Fill)
            .height(Length::Fill)
            .style(ui::panel(styles.bg, styles.fg))
            .into()
    }

    fn theme(&self) -> Theme {
        if self.is_dark_mode {
            Theme::Dark
        } else {
            Theme::Light
        }
    }
}

impl Dashboard {
    fn styles(&self) -> &'static Styles {
        if self.is_dark_mode {
            &DARK_THEME
        } else {
            &LIGHT_THEME
        }
    }

    /// Re-resolves the country shown on the insights page after a search or selection.
    fn refresh_country(&mut self) {
        let LoadState::Ready(dataset) = &self.load_state else {
            return;
        };

        let resolution = query::resolve_country(dataset, Some(self.search_input.as_str()));
        self.search_match = match resolution {
            CountryResolution::Resolved(country) => Some(country),
            CountryResolution::NeedsSelection(_) => None,
        };

        let country = self.search_match.as_ref().or(self.selected_country.as_ref());
        self.series = country.map(|c| query::country_series(dataset, c));

        if let Some(Err(err)) = &self.series {
            warn!("Country view unavailable: {err}");
        }
    }
}
