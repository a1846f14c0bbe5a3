use std::io;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::{Duration, Instant};

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use ratatui::{backend::Backend, Terminal};

use crate::catalog::{self, City};
use crate::forecast::{DailyForecast, ForecastError};
use crate::locate::{Coordinates, GeolocationError};
use crate::store::{AppState, StateStore};
use crate::toast::Toast;
use crate::ui::{self, HitMap};
use crate::units::Units;
use crate::worker::{Effect, Outcome, Worker};

const TICK_RATE: Duration = Duration::from_millis(100);

pub const CURRENT_LOCATION: &str = "Current location";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Enter a city name")]
    Empty,
    #[error("City not found")]
    NotFound,
    #[error("this city is already added")]
    Duplicate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Input,
    List,
}

/// The forecast currently on screen and the location it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct Shown {
    pub city: String,
    pub days: Vec<DailyForecast>,
}

pub struct App {
    state: AppState,
    store: StateStore,
    effects: Vec<Effect>,

    pub units: Units,
    pub focus: Focus,
    pub input: String,
    pub suggestions: Vec<City>,
    pub suggestions_visible: bool,
    pub highlighted: Option<usize>,
    pub cursor: usize,

    pub title: Option<String>,
    pub forecast: Option<Shown>,
    pub loading: bool,
    pub panel_error: Option<String>,
    pub field_error: Option<String>,
    pub toast: Toast,

    pub hits: HitMap,
    pub quit: bool,
}

impl App {
    pub fn new(store: StateStore, units: Units) -> Self {
        let state = store.load();
        Self {
            state,
            store,
            effects: vec![],
            units,
            focus: Focus::List,
            input: String::new(),
            suggestions: vec![],
            suggestions_visible: false,
            highlighted: None,
            cursor: 0,
            title: None,
            forecast: None,
            loading: false,
            panel_error: None,
            field_error: None,
            toast: Toast::default(),
            hits: HitMap::default(),
            quit: false,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Drains the effects requested since the last call.
    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    fn persist(&self) {
        self.store.save(&self.state);
    }

    pub fn startup(&mut self, now: Instant) {
        if self.state.main.is_none() {
            self.request_geolocation(now);
        } else {
            self.load_all_weather();
        }
    }

    /// Makes a catalog city the main location, saving it if needed.
    pub fn choose_main(&mut self, name: &str) -> Result<(), ValidationError> {
        let city = catalog::find_by_name(name.trim()).ok_or(ValidationError::NotFound)?;
        if !self.state.contains(&city.name) {
            self.state.cities.push(city.clone());
        }
        tracing::info!(city = %city.name, "main location chosen at startup");
        self.state.main = Some(city);
        self.persist();
        Ok(())
    }

    pub fn request_geolocation(&mut self, now: Instant) {
        self.toast.show("Detecting location...", now);
        self.effects.push(Effect::Locate);
    }

    pub fn on_located(&mut self, result: Result<Coordinates, GeolocationError>, now: Instant) {
        match result {
            Ok(coords) => {
                tracing::info!(lat = coords.latitude, lon = coords.longitude, "location detected");
                self.state.main = Some(City::new(
                    CURRENT_LOCATION,
                    coords.latitude,
                    coords.longitude,
                ));
                self.persist();
                self.toast.show("Location detected!", now);
                self.load_all_weather();
            }
            Err(e) => {
                tracing::warn!("geolocation failed: {e:?}");
                self.toast.show(e.to_string(), now);
                if e != GeolocationError::Unsupported && self.state.cities.is_empty() {
                    self.focus = Focus::Input;
                }
            }
        }
    }

    /// Clears the panel error and requests the main location's forecast.
    pub fn load_all_weather(&mut self) {
        self.panel_error = None;
        match &self.state.main {
            Some(main) => {
                self.loading = true;
                self.title = Some(main.name.clone());
                self.effects.push(Effect::FetchForecast(main.clone()));
            }
            None => self.loading = false,
        }
    }

    pub fn on_forecast(&mut self, city: City, result: Result<Vec<DailyForecast>, ForecastError>) {
        self.loading = false;
        match result {
            Ok(days) => {
                tracing::debug!(city = %city.name, days = days.len(), "forecast received");
                self.forecast = Some(Shown {
                    city: city.name,
                    days,
                });
            }
            Err(e) => {
                match &e {
                    ForecastError::Network(source) => {
                        tracing::warn!(city = %city.name, "forecast request failed: {source}")
                    }
                    ForecastError::Data { reason } => {
                        tracing::warn!(city = %city.name, "unusable forecast response: {reason}")
                    }
                    ForecastError::NotStarted { reason } => {
                        tracing::warn!(city = %city.name, "forecast request not started: {reason}")
                    }
                }
                self.panel_error = Some(e.to_string());
            }
        }
    }

    pub fn apply(&mut self, outcome: Outcome, now: Instant) {
        match outcome {
            Outcome::Forecast { city, result } => self.on_forecast(city, result),
            Outcome::Located(result) => self.on_located(result, now),
        }
    }

    pub fn add_city(&mut self, now: Instant) -> Result<(), ValidationError> {
        let result = self.validate_new_city();
        let city = match result {
            Ok(city) => city,
            Err(e) => {
                self.field_error = Some(e.to_string());
                return Err(e);
            }
        };

        tracing::info!(city = %city.name, "city added");
        self.field_error = None;
        self.state.cities.push(city);
        self.persist();
        self.input.clear();
        self.hide_suggestions();
        self.toast.show("City added!", now);
        Ok(())
    }

    fn validate_new_city(&self) -> Result<City, ValidationError> {
        let name = self.input.trim();
        if name.is_empty() {
            return Err(ValidationError::Empty);
        }
        let city = catalog::find_by_name(name).ok_or(ValidationError::NotFound)?;
        if self.state.contains(&city.name) {
            return Err(ValidationError::Duplicate);
        }
        Ok(city)
    }

    pub fn remove_city(&mut self, index: usize, now: Instant) {
        if index >= self.state.cities.len() {
            return;
        }
        let removed = self.state.cities.remove(index);
        tracing::info!(city = %removed.name, "city removed");

        if self.state.is_main(&removed.name) {
            self.state.main = self.state.cities.first().cloned();
            if self.state.main.is_none() {
                self.title = None;
                self.forecast = None;
            }
        }
        self.persist();
        self.cursor = self.cursor.min(self.state.cities.len().saturating_sub(1));

        if self.state.main.is_some() {
            self.load_all_weather();
        }
        self.toast.show("City removed", now);
    }

    pub fn select_city(&mut self, index: usize) {
        let Some(city) = self.state.cities.get(index).cloned() else {
            return;
        };
        tracing::info!(city = %city.name, "city selected");
        self.state.main = Some(city);
        self.persist();
        self.load_all_weather();
    }

    /// Re-filters the catalog against the current input.
    pub fn on_input_changed(&mut self) {
        self.suggestions = catalog::search(self.input.trim());
        self.suggestions_visible = !self.suggestions.is_empty();
        self.highlighted = None;
    }

    pub fn pick_suggestion(&mut self, index: usize) {
        if let Some(city) = self.suggestions.get(index) {
            self.input = city.name.clone();
            self.hide_suggestions();
        }
    }

    pub fn hide_suggestions(&mut self) {
        self.suggestions_visible = false;
        self.highlighted = None;
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        if key.kind == KeyEventKind::Release {
            return;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.quit = true;
            return;
        }
        if key.code == KeyCode::F(5) {
            self.load_all_weather();
            return;
        }
        match self.focus {
            Focus::Input => self.handle_input_key(key, now),
            Focus::List => self.handle_list_key(key, now),
        }
    }

    fn handle_input_key(&mut self, key: KeyEvent, now: Instant) {
        match key.code {
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.push(c);
                self.on_input_changed();
            }
            KeyCode::Backspace => {
                self.input.pop();
                self.on_input_changed();
            }
            KeyCode::Down if self.suggestions_visible => {
                let last = self.suggestions.len() - 1;
                self.highlighted = Some(self.highlighted.map_or(0, |i| (i + 1).min(last)));
            }
            KeyCode::Up if self.suggestions_visible => {
                self.highlighted = self.highlighted.and_then(|i| i.checked_sub(1));
            }
            KeyCode::Enter => match self.highlighted {
                Some(i) if self.suggestions_visible => self.pick_suggestion(i),
                _ => {
                    // the field error carries the rejection
                    let _ = self.add_city(now);
                }
            },
            KeyCode::Esc => self.hide_suggestions(),
            KeyCode::Tab => {
                self.hide_suggestions();
                self.focus = Focus::List;
            }
            _ => {}
        }
    }

    fn handle_list_key(&mut self, key: KeyEvent, now: Instant) {
        let count = self.state.cities.len();
        match key.code {
            KeyCode::Char('q') => self.quit = true,
            KeyCode::Char('r') => self.load_all_weather(),
            KeyCode::Char('g') => self.request_geolocation(now),
            KeyCode::Char('/') | KeyCode::Tab => self.focus = Focus::Input,
            KeyCode::Up => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Down if count > 0 => self.cursor = (self.cursor + 1).min(count - 1),
            KeyCode::Enter => self.select_city(self.cursor),
            KeyCode::Delete | KeyCode::Char('d') => self.remove_city(self.cursor, now),
            _ => {}
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent, now: Instant) {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }
        let (column, row) = (mouse.column, mouse.row);

        if self.suggestions_visible {
            if let Some(i) = self.hits.suggestion_at(column, row) {
                self.pick_suggestion(i);
                self.focus = Focus::Input;
                return;
            }
        }
        if self.hits.on_input(column, row) {
            self.focus = Focus::Input;
            return;
        }

        self.hide_suggestions();
        if let Some((i, on_remove)) = self.hits.city_at(column, row) {
            if i >= self.state.cities.len() {
                return;
            }
            self.focus = Focus::List;
            self.cursor = i;
            if on_remove {
                self.remove_city(i, now);
            } else {
                self.select_city(i);
            }
        }
    }
}

pub fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    worker: &Worker,
    outcomes: &Receiver<Outcome>,
) -> io::Result<()> {
    app.startup(Instant::now());
    loop {
        for effect in app.take_effects() {
            worker.run(effect);
        }

        let now = Instant::now();
        app.toast.tick(now);
        let view: &App = app;
        let mut hits = HitMap::default();
        terminal.draw(|f| hits = ui::draw(f, view, now))?;
        app.hits = hits;

        if event::poll(TICK_RATE)? {
            match event::read()? {
                Event::Key(key) => app.handle_key(key, Instant::now()),
                Event::Mouse(mouse) => app.handle_mouse(mouse, Instant::now()),
                _ => {}
            }
        }

        loop {
            match outcomes.try_recv() {
                Ok(outcome) => app.apply(outcome, Instant::now()),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    return Err(io::Error::new(
                        io::ErrorKind::BrokenPipe,
                        "worker channel closed",
                    ))
                }
            }
        }

        if app.quit {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toast::Phase;
    use ratatui::{backend::TestBackend, buffer::Buffer};

    struct Fixture {
        _dir: tempfile::TempDir,
        store: StateStore,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let store = StateStore::new(dir.path().join("state.json"));
            Self { _dir: dir, store }
        }

        fn app(&self) -> App {
            App::new(self.store.clone(), Units::Metric)
        }
    }

    fn type_text(app: &mut App, text: &str, now: Instant) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)), now);
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn add(app: &mut App, name: &str, now: Instant) -> Result<(), ValidationError> {
        app.input = name.to_string();
        app.add_city(now)
    }

    fn names(app: &App) -> Vec<&str> {
        app.state().cities.iter().map(|c| c.name.as_str()).collect()
    }

    fn toast_text(app: &App, now: Instant) -> Option<String> {
        app.toast.current(now).map(|(m, _)| m.to_string())
    }

    fn main_name(app: &App) -> Option<&str> {
        app.state().main.as_ref().map(|c| c.name.as_str())
    }

    /// Draws one frame the way the event loop does and keeps its hit map.
    fn draw(app: &mut App, now: Instant) -> Buffer {
        let mut terminal = Terminal::new(TestBackend::new(90, 30)).unwrap();
        let view: &App = app;
        let mut hits = HitMap::default();
        terminal.draw(|f| hits = ui::draw(f, view, now)).unwrap();
        app.hits = hits;
        terminal.backend().buffer().clone()
    }

    fn screen_row(buffer: &Buffer, y: u16) -> String {
        (0..buffer.area.width).map(|x| buffer[(x, y)].symbol()).collect()
    }

    /// Column of `needle` on row `y`, counted in cells.
    fn column_of(buffer: &Buffer, y: u16, needle: &str) -> Option<u16> {
        let row = screen_row(buffer, y);
        let at = row.find(needle)?;
        Some(row[..at].chars().count() as u16)
    }

    fn locate(buffer: &Buffer, needle: &str) -> (u16, u16) {
        (0..buffer.area.height)
            .find_map(|y| column_of(buffer, y, needle).map(|x| (x, y)))
            .unwrap_or_else(|| panic!("{needle:?} not on screen"))
    }

    fn click(app: &mut App, (column, row): (u16, u16), now: Instant) {
        app.handle_mouse(
            MouseEvent {
                kind: MouseEventKind::Down(MouseButton::Left),
                column,
                row,
                modifiers: KeyModifiers::NONE,
            },
            now,
        );
    }

    #[test]
    fn test_add_city_case_insensitive_then_duplicate() {
        let fx = Fixture::new();
        let mut app = fx.app();
        let now = Instant::now();

        for name in ["Казань", "казань", "КАЗАНЬ", "  Москва  ", "санкт-петербург"] {
            let first = add(&mut app, name, now);
            let second = add(&mut app, name, now);
            if first.is_ok() {
                assert_eq!(second, Err(ValidationError::Duplicate), "{name}");
            } else {
                assert_eq!(first, Err(ValidationError::Duplicate), "{name}");
            }
        }
        assert_eq!(names(&app), vec!["Казань", "Москва", "Санкт-Петербург"]);
        assert_eq!(fx.store.load().cities.len(), 3);
    }

    #[test]
    fn test_add_kazan_twice() {
        let fx = Fixture::new();
        let mut app = fx.app();
        let now = Instant::now();

        add(&mut app, "Казань", now).unwrap();
        assert_eq!(names(&app), vec!["Казань"]);
        assert!(app.input.is_empty());
        assert!(app.field_error.is_none());
        assert_eq!(toast_text(&app, now).as_deref(), Some("City added!"));

        assert_eq!(add(&mut app, "Казань", now), Err(ValidationError::Duplicate));
        assert_eq!(app.field_error.as_deref(), Some("this city is already added"));
        assert_eq!(names(&app), vec!["Казань"]);
    }

    #[test]
    fn test_add_rejections_leave_state_alone() {
        let fx = Fixture::new();
        let mut app = fx.app();
        let now = Instant::now();

        for (input, expected) in [
            ("", ValidationError::Empty),
            ("   ", ValidationError::Empty),
            ("Paris", ValidationError::NotFound),
            ("Каз", ValidationError::NotFound),
        ] {
            assert_eq!(add(&mut app, input, now), Err(expected.clone()));
            assert_eq!(app.field_error, Some(expected.to_string()));
            assert!(app.state().cities.is_empty());
        }
        assert_eq!(fx.store.load(), AppState::default());
        assert!(app.take_effects().is_empty());
    }

    #[test]
    fn test_remove_main_promotes_next_then_clears() {
        let fx = Fixture::new();
        let mut app = fx.app();
        let now = Instant::now();
        add(&mut app, "Москва", now).unwrap();
        add(&mut app, "Казань", now).unwrap();
        app.select_city(0);
        app.take_effects();

        app.remove_city(0, now);
        assert_eq!(app.state().main.as_ref().map(|c| c.name.as_str()), Some("Казань"));
        assert_eq!(
            app.take_effects(),
            vec![Effect::FetchForecast(catalog::find_by_name("Казань").unwrap())]
        );
        assert_eq!(toast_text(&app, now).as_deref(), Some("City removed"));

        app.remove_city(0, now);
        assert!(app.state().main.is_none());
        assert!(app.state().cities.is_empty());
        assert!(app.take_effects().is_empty());
        assert_eq!(fx.store.load(), AppState::default());
    }

    #[test]
    fn test_remove_other_city_keeps_main() {
        let fx = Fixture::new();
        let mut app = fx.app();
        let now = Instant::now();
        add(&mut app, "Москва", now).unwrap();
        add(&mut app, "Казань", now).unwrap();
        app.select_city(1);

        app.remove_city(0, now);
        assert_eq!(app.state().main.as_ref().map(|c| c.name.as_str()), Some("Казань"));
        assert_eq!(names(&app), vec!["Казань"]);

        // out of range is ignored
        app.remove_city(5, now);
        assert_eq!(names(&app), vec!["Казань"]);
    }

    #[test]
    fn test_select_city_persists_and_fetches() {
        let fx = Fixture::new();
        let mut app = fx.app();
        let now = Instant::now();
        add(&mut app, "Екатеринбург", now).unwrap();
        app.take_effects();

        app.select_city(0);
        let city = catalog::find_by_name("Екатеринбург").unwrap();
        assert_eq!(app.state().main, Some(city.clone()));
        assert_eq!(fx.store.load().main, Some(city.clone()));
        assert_eq!(app.title.as_deref(), Some("Екатеринбург"));
        assert!(app.loading);
        assert_eq!(app.take_effects(), vec![Effect::FetchForecast(city)]);
    }

    #[test]
    fn test_startup_without_main_denied_focuses_input() {
        let fx = Fixture::new();
        let mut app = fx.app();
        let now = Instant::now();

        app.startup(now);
        assert_eq!(app.take_effects(), vec![Effect::Locate]);
        assert_eq!(toast_text(&app, now).as_deref(), Some("Detecting location..."));
        assert_eq!(app.focus, Focus::List);

        app.apply(Outcome::Located(Err(GeolocationError::PermissionDenied)), now);
        assert_eq!(app.focus, Focus::Input);
        assert_eq!(
            toast_text(&app, now).as_deref(),
            Some("Location access denied. Enter a city manually.")
        );
        assert!(app.state().main.is_none());
    }

    #[test]
    fn test_geolocation_failure_with_saved_cities_keeps_focus() {
        let fx = Fixture::new();
        let mut app = fx.app();
        let now = Instant::now();
        add(&mut app, "Москва", now).unwrap();

        app.on_located(Err(GeolocationError::Timeout), now);
        assert_eq!(app.focus, Focus::List);
        assert_eq!(toast_text(&app, now).as_deref(), Some("Location request timed out."));
    }

    #[test]
    fn test_unsupported_geolocation_keeps_focus() {
        let fx = Fixture::new();
        let mut app = fx.app();
        let now = Instant::now();

        app.startup(now);
        app.take_effects();
        app.apply(Outcome::Located(Err(GeolocationError::Unsupported)), now);
        assert_eq!(app.focus, Focus::List);
        assert_eq!(
            toast_text(&app, now).as_deref(),
            Some("Geolocation is not supported.")
        );
        assert!(app.state().main.is_none());
    }

    #[test]
    fn test_geolocation_success_sets_current_location() {
        let fx = Fixture::new();
        let mut app = fx.app();
        let now = Instant::now();

        app.on_located(
            Ok(Coordinates {
                latitude: 43.07,
                longitude: -89.4,
            }),
            now,
        );
        let main = City::new(CURRENT_LOCATION, 43.07, -89.4);
        assert_eq!(app.state().main, Some(main.clone()));
        assert_eq!(fx.store.load().main, Some(main.clone()));
        assert!(app.state().cities.is_empty());
        assert_eq!(app.take_effects(), vec![Effect::FetchForecast(main)]);
        assert_eq!(toast_text(&app, now).as_deref(), Some("Location detected!"));
    }

    #[test]
    fn test_startup_with_main_loads_forecast() {
        let fx = Fixture::new();
        let moscow = catalog::find_by_name("Москва").unwrap();
        fx.store.save(&AppState {
            main: Some(moscow.clone()),
            cities: vec![moscow.clone()],
        });

        let mut app = fx.app();
        app.startup(Instant::now());
        assert_eq!(app.take_effects(), vec![Effect::FetchForecast(moscow)]);
        assert!(app.toast.current(Instant::now()).is_none());
    }

    #[test]
    fn test_forecast_outcomes() {
        let fx = Fixture::new();
        let mut app = fx.app();
        let city = catalog::find_by_name("Казань").unwrap();
        let days = vec![DailyForecast {
            date: "2024-01-01".to_string(),
            temp_max_c: 5.0,
            temp_min_c: -1.0,
        }];

        app.loading = true;
        app.on_forecast(city.clone(), Ok(days.clone()));
        assert!(!app.loading);
        assert_eq!(
            app.forecast,
            Some(Shown {
                city: "Казань".to_string(),
                days: days.clone()
            })
        );

        app.on_forecast(
            city.clone(),
            Err(ForecastError::Data {
                reason: "no daily".to_string(),
            }),
        );
        assert_eq!(app.panel_error.as_deref(), Some("Weather data error"));
        // the previous forecast stays on screen
        assert_eq!(app.forecast.as_ref().map(|s| s.days.len()), Some(1));

        app.load_all_weather();
        assert!(app.panel_error.is_none());
    }

    #[test]
    fn test_forecast_not_started_clears_loading() {
        let fx = Fixture::new();
        let mut app = fx.app();
        app.choose_main("Казань").unwrap();
        app.load_all_weather();
        assert!(app.loading);

        app.apply(
            Outcome::Forecast {
                city: catalog::find_by_name("Казань").unwrap(),
                result: Err(ForecastError::NotStarted {
                    reason: "Resource temporarily unavailable".to_string(),
                }),
            },
            Instant::now(),
        );
        assert!(!app.loading);
        assert_eq!(app.panel_error.as_deref(), Some("Failed to load weather data"));
    }

    #[test]
    fn test_suggestions_follow_input() {
        let fx = Fixture::new();
        let mut app = fx.app();
        let now = Instant::now();
        app.focus = Focus::Input;

        type_text(&mut app, "моск", now);
        assert!(app.suggestions_visible);
        assert_eq!(app.suggestions.len(), 1);
        assert_eq!(app.suggestions[0].name, "Москва");

        for _ in 0..4 {
            app.handle_key(key(KeyCode::Backspace), now);
        }
        assert!(app.input.is_empty());
        assert!(!app.suggestions_visible);

        type_text(&mut app, "xyz", now);
        assert!(!app.suggestions_visible);
    }

    #[test]
    fn test_pick_suggestion_fills_input_without_adding() {
        let fx = Fixture::new();
        let mut app = fx.app();
        let now = Instant::now();
        app.focus = Focus::Input;

        type_text(&mut app, "ск", now);
        assert_eq!(app.suggestions.len(), 2);
        app.handle_key(key(KeyCode::Down), now);
        app.handle_key(key(KeyCode::Down), now);
        assert_eq!(app.highlighted, Some(1));
        app.handle_key(key(KeyCode::Enter), now);

        assert_eq!(app.input, "Новосибирск");
        assert!(!app.suggestions_visible);
        assert!(app.state().cities.is_empty());

        app.handle_key(key(KeyCode::Enter), now);
        assert_eq!(names(&app), vec!["Новосибирск"]);
    }

    #[test]
    fn test_escape_and_tab_hide_suggestions() {
        let fx = Fixture::new();
        let mut app = fx.app();
        let now = Instant::now();
        app.focus = Focus::Input;

        type_text(&mut app, "к", now);
        assert!(app.suggestions_visible);
        app.handle_key(key(KeyCode::Esc), now);
        assert!(!app.suggestions_visible);

        type_text(&mut app, "а", now);
        assert!(app.suggestions_visible);
        app.handle_key(key(KeyCode::Tab), now);
        assert!(!app.suggestions_visible);
        assert_eq!(app.focus, Focus::List);
    }

    #[test]
    fn test_list_keys() {
        let fx = Fixture::new();
        let mut app = fx.app();
        let now = Instant::now();
        add(&mut app, "Москва", now).unwrap();
        add(&mut app, "Казань", now).unwrap();
        app.take_effects();

        app.handle_key(key(KeyCode::Down), now);
        app.handle_key(key(KeyCode::Down), now);
        assert_eq!(app.cursor, 1);
        app.handle_key(key(KeyCode::Enter), now);
        assert_eq!(app.state().main.as_ref().map(|c| c.name.as_str()), Some("Казань"));

        app.handle_key(key(KeyCode::Char('d')), now);
        assert_eq!(names(&app), vec!["Москва"]);
        assert_eq!(app.cursor, 0);
        assert_eq!(app.state().main.as_ref().map(|c| c.name.as_str()), Some("Москва"));

        app.take_effects();
        app.handle_key(key(KeyCode::Char('g')), now);
        assert_eq!(app.take_effects(), vec![Effect::Locate]);

        app.handle_key(key(KeyCode::Char('q')), now);
        assert!(app.quit);
    }

    #[test]
    fn test_toast_fades_after_add() {
        let fx = Fixture::new();
        let mut app = fx.app();
        let now = Instant::now();
        add(&mut app, "Москва", now).unwrap();

        let later = now + Duration::from_millis(4100);
        assert_eq!(app.toast.current(later).map(|(_, p)| p), Some(Phase::Fading));
        app.toast.tick(now + Duration::from_millis(4300));
        assert!(app.toast.current(now + Duration::from_millis(4300)).is_none());
    }

    #[test]
    fn test_choose_main_adds_to_saved_list() {
        let fx = Fixture::new();
        let mut app = fx.app();
        app.choose_main("казань").unwrap();
        assert_eq!(names(&app), vec!["Казань"]);
        assert!(app.state().is_main("Казань"));

        app.choose_main("Казань").unwrap();
        assert_eq!(names(&app), vec!["Казань"]);
        assert_eq!(app.choose_main("Paris"), Err(ValidationError::NotFound));
    }

    #[test]
    fn test_click_outside_hides_suggestions() {
        let fx = Fixture::new();
        let mut app = fx.app();
        let now = Instant::now();
        app.focus = Focus::Input;
        type_text(&mut app, "моск", now);
        assert!(app.suggestions_visible);

        draw(&mut app, now);
        click(&mut app, (0, 0), now);
        assert!(!app.suggestions_visible);
        assert_eq!(app.input, "моск");
        assert!(app.state().cities.is_empty());
    }

    #[test]
    fn test_click_input_focuses_it() {
        let fx = Fixture::new();
        let mut app = fx.app();
        let now = Instant::now();
        assert_eq!(app.focus, Focus::List);

        let buffer = draw(&mut app, now);
        click(&mut app, locate(&buffer, "Add city"), now);
        assert_eq!(app.focus, Focus::Input);
    }

    #[test]
    fn test_click_suggestion_fills_input_without_adding() {
        let fx = Fixture::new();
        let mut app = fx.app();
        let now = Instant::now();
        app.focus = Focus::Input;
        type_text(&mut app, "ка", now);
        assert_eq!(
            app.suggestions.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            vec!["Екатеринбург", "Казань"]
        );

        let buffer = draw(&mut app, now);
        click(&mut app, locate(&buffer, "Казань"), now);
        assert_eq!(app.input, "Казань");
        assert!(!app.suggestions_visible);
        assert!(app.state().cities.is_empty());
        assert_eq!(app.focus, Focus::Input);
    }

    #[test]
    fn test_click_saved_rows_selects_and_removes() {
        let fx = Fixture::new();
        let mut app = fx.app();
        let now = Instant::now();
        add(&mut app, "Москва", now).unwrap();
        add(&mut app, "Казань", now).unwrap();
        app.focus = Focus::Input;

        let buffer = draw(&mut app, now);
        click(&mut app, locate(&buffer, "Казань"), now);
        assert_eq!(main_name(&app), Some("Казань"));
        assert_eq!(app.focus, Focus::List);
        assert_eq!(app.cursor, 1);
        assert_eq!(names(&app), vec!["Москва", "Казань"]);

        let buffer = draw(&mut app, now);
        let (_, row) = locate(&buffer, "Москва");
        let column = column_of(&buffer, row, "×").unwrap();
        click(&mut app, (column, row), now);
        assert_eq!(names(&app), vec!["Казань"]);
        assert_eq!(main_name(&app), Some("Казань"));
        assert_eq!(fx.store.load().cities.len(), 1);
    }
}
