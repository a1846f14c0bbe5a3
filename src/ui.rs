use std::time::Instant;

use chrono::NaiveDate;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Focus};
use crate::catalog::City;
use crate::forecast::DailyForecast;
use crate::store::AppState;
use crate::toast::Phase;
use crate::units::Units;

const MISSING: &str = "--";
const REMOVE: &str = " × ";

/// Screen regions that respond to mouse clicks, as laid out by the last draw.
#[derive(Debug, Default, Clone)]
pub struct HitMap {
    input: Rect,
    suggestions: Rect,
    cities: Rect,
}

fn inside(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x && column < area.right() && row >= area.y && row < area.bottom()
}

impl HitMap {
    pub fn on_input(&self, column: u16, row: u16) -> bool {
        inside(self.input, column, row)
    }

    pub fn suggestion_at(&self, column: u16, row: u16) -> Option<usize> {
        inside(self.suggestions, column, row).then(|| usize::from(row - self.suggestions.y))
    }

    /// Index of the saved city on that row, and whether the click hit its
    /// remove marker.
    pub fn city_at(&self, column: u16, row: u16) -> Option<(usize, bool)> {
        if !inside(self.cities, column, row) {
            return None;
        }
        let on_remove = column + REMOVE.chars().count() as u16 >= self.cities.right();
        Some((usize::from(row - self.cities.y), on_remove))
    }
}

fn panel(title: &str, focused: bool) -> Block<'static> {
    let border = if focused { Color::Yellow } else { Color::Cyan };
    Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(Color::Yellow),
        ))
        .title_alignment(Alignment::Left)
        .border_style(Style::default().fg(border))
        .border_type(BorderType::Rounded)
}

pub fn day_label(index: usize) -> String {
    match index {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        n => format!("Day {}", n + 1),
    }
}

fn short_date(date: &str) -> String {
    match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(d) => d.format("%a %d %b").to_string(),
        Err(_) => date.to_string(),
    }
}

fn day_card(index: usize, day: &DailyForecast, units: Units) -> Paragraph<'static> {
    Paragraph::new(vec![
        Line::from(Span::styled(
            day_label(index),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            short_date(&day.date),
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(vec![
            Span::raw("Max: "),
            Span::styled(units.format(day.temp_max_c), Style::default().fg(Color::Red)),
        ]),
        Line::from(vec![
            Span::raw("Min: "),
            Span::styled(units.format(day.temp_min_c), Style::default().fg(Color::Blue)),
        ]),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .border_type(BorderType::Rounded),
    )
}

/// Draws one card per day, or a notice when the series is empty.
pub fn render_forecast(
    f: &mut Frame,
    area: Rect,
    city_name: &str,
    forecast: &[DailyForecast],
    units: Units,
) {
    let block = panel(city_name, false);
    let inner = block.inner(area);
    f.render_widget(block, area);

    if forecast.is_empty() {
        let notice = Paragraph::new(Span::styled(
            "No weather data",
            Style::default().fg(Color::Red),
        ));
        f.render_widget(notice, inner);
        return;
    }

    let constraints = vec![Constraint::Ratio(1, forecast.len() as u32); forecast.len()];
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(inner);
    for (i, day) in forecast.iter().enumerate() {
        f.render_widget(day_card(i, day, units), cards[i]);
    }
}

fn render_placeholder(f: &mut Frame, area: Rect, loading: bool) {
    let text = if loading { "Loading..." } else { MISSING };
    let p = Paragraph::new(Span::styled(text, Style::default().fg(Color::DarkGray)))
        .block(panel("Forecast", false));
    f.render_widget(p, area);
}

/// Draws the saved cities; returns the rows area used for click hits.
pub fn render_city_list(
    f: &mut Frame,
    area: Rect,
    state: &AppState,
    cursor: Option<usize>,
) -> Rect {
    let block = panel("Saved cities", cursor.is_some());
    let inner = block.inner(area);

    if state.cities.is_empty() {
        let empty = Paragraph::new(Span::styled(
            "No saved cities",
            Style::default().fg(Color::DarkGray),
        ))
        .block(block);
        f.render_widget(empty, area);
        return Rect::default();
    }

    let width = usize::from(inner.width);
    let items: Vec<ListItem> = state
        .cities
        .iter()
        .enumerate()
        .map(|(i, city)| {
            let mut style = Style::default();
            if state.is_main(&city.name) {
                style = style.fg(Color::Green).add_modifier(Modifier::BOLD);
            }
            if cursor == Some(i) {
                style = style.add_modifier(Modifier::REVERSED);
            }
            let name_width = width.saturating_sub(REMOVE.chars().count());
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<name_width$}", city.name), style),
                Span::styled(REMOVE, Style::default().fg(Color::Red)),
            ]))
        })
        .collect();
    f.render_widget(List::new(items).block(block), area);
    inner
}

/// Draws the autocomplete dropdown; returns the rows area used for click hits.
pub fn render_suggestions(
    f: &mut Frame,
    area: Rect,
    matches: &[City],
    highlighted: Option<usize>,
) -> Rect {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .border_type(BorderType::Rounded);
    let inner = block.inner(area);
    let items: Vec<ListItem> = matches
        .iter()
        .enumerate()
        .map(|(i, city)| {
            let style = if highlighted == Some(i) {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            ListItem::new(Span::styled(city.name.clone(), style))
        })
        .collect();
    f.render_widget(Clear, area);
    f.render_widget(List::new(items).block(block), area);
    inner
}

pub fn render_toast(f: &mut Frame, area: Rect, message: &str, phase: Phase) {
    let style = match phase {
        Phase::Shown => Style::default().fg(Color::Black).bg(Color::Yellow),
        Phase::Fading => Style::default().fg(Color::DarkGray),
    };
    let width = (message.chars().count() as u16 + 4).min(area.width);
    let toast = Rect {
        x: area.right().saturating_sub(width),
        y: area.y,
        width,
        height: area.height.min(1),
    };
    f.render_widget(Clear, toast);
    f.render_widget(
        Paragraph::new(format!(" {message} "))
            .style(style)
            .alignment(Alignment::Center),
        toast,
    );
}

pub fn render_error(f: &mut Frame, area: Rect, message: &str) {
    let p = Paragraph::new(Span::styled(
        format!(" {message}"),
        Style::default().fg(Color::White).bg(Color::Red),
    ))
    .wrap(Wrap { trim: true });
    f.render_widget(p, area);
}

pub fn render_field_error(f: &mut Frame, area: Rect, message: &str) {
    f.render_widget(
        Paragraph::new(Span::styled(message.to_string(), Style::default().fg(Color::Red))),
        area,
    );
}

fn render_input(f: &mut Frame, area: Rect, text: &str, focused: bool) {
    let mut spans = vec![Span::raw(text.to_string())];
    if focused {
        spans.push(Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)));
    }
    f.render_widget(
        Paragraph::new(Line::from(spans)).block(panel("Add city", focused)),
        area,
    );
}

fn render_headline(f: &mut Frame, area: Rect, title: Option<&str>, loading: bool) {
    let mut spans = vec![
        Span::raw(" "),
        Span::styled(
            title.unwrap_or(MISSING).to_string(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
    ];
    if loading {
        spans.push(Span::styled("  loading...", Style::default().fg(Color::DarkGray)));
    }
    f.render_widget(
        Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .border_type(BorderType::Rounded),
        ),
        area,
    );
}

fn render_footer(f: &mut Frame, area: Rect, focus: Focus) {
    let hints = match focus {
        Focus::Input => " Enter add · ↑↓ suggestions · Esc hide · Tab cities · F5 refresh · Ctrl-C quit",
        Focus::List => " Enter select · d remove · / add city · r refresh · g my location · q quit",
    };
    f.render_widget(
        Paragraph::new(Span::styled(hints, Style::default().fg(Color::DarkGray))),
        area,
    );
}

/// Lays out and draws the whole screen from `app`.
pub fn draw(f: &mut Frame, app: &App, now: Instant) -> HitMap {
    let error_height = if app.panel_error.is_some() { 1 } else { 0 };
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(8),
            Constraint::Length(error_height),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_headline(f, rows[0], app.title.as_deref(), app.loading);

    match &app.forecast {
        Some(shown) => render_forecast(f, rows[1], &shown.city, &shown.days, app.units),
        None => render_placeholder(f, rows[1], app.loading),
    }

    if let Some(message) = &app.panel_error {
        render_error(f, rows[2], message);
    }

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[3]);

    let cursor = (app.focus == Focus::List).then_some(app.cursor);
    let cities = render_city_list(f, body[0], app.state(), cursor);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(1), Constraint::Min(0)])
        .split(body[1]);
    render_input(f, side[0], &app.input, app.focus == Focus::Input);
    if let Some(message) = &app.field_error {
        render_field_error(f, side[1], message);
    }

    render_footer(f, rows[4], app.focus);

    let mut hits = HitMap {
        input: side[0],
        suggestions: Rect::default(),
        cities,
    };

    if app.suggestions_visible && !app.suggestions.is_empty() {
        let screen = f.area();
        let below = screen.bottom().saturating_sub(side[0].bottom());
        let height = (app.suggestions.len() as u16 + 2).min(below);
        if height > 2 {
            let dropdown = Rect {
                x: side[0].x,
                y: side[0].bottom(),
                width: side[0].width,
                height,
            };
            hits.suggestions =
                render_suggestions(f, dropdown, &app.suggestions, app.highlighted);
        }
    }

    if let Some((message, phase)) = app.toast.current(now) {
        render_toast(f, f.area(), message, phase);
    }

    hits
}
