use iced::{
    Alignment, Element, Length, Task,
    alignment::Vertical,
    widget::{Column, Row, button, checkbox, column, container, radio, row, scrollable, text, text_input},
};
use itertools::Itertools;
use shamsi::{
    color::{TODAY_FILL, day_fill},
    event::Event,
    jalali::{JalaliDate, WEEKDAYS, WEEKDAYS_SHORT, YearMonth, month_name},
    settings::ViewMode,
};
use strum::VariantArray;

use crate::{
    app::{self, AppShared},
    panels::{AppEvent, Panel, Shortcut},
    widgets::{
        BOLD, calendar_grid, contrast_color, filled, hex_color, menu_button, square_button,
        with_tooltip,
    },
};

const MONTH_CELL: (f32, f32) = (72.0, 52.0);
const YEAR_CELL: (f32, f32) = (38.0, 36.0);

#[derive(Debug, Clone)]
pub enum Message {
    YearInput(String),
    MonthInput(String),
    Show,
    DayClicked(JalaliDate),
}

/// The main view: toolbar plus a month or year grid.
pub struct Calendar {
    year_input: String,
    month_input: String,
}

fn to_app(message: app::Message) -> super::Message {
    super::Message::to_app(message)
}

impl Calendar {
    pub fn new(app: &AppShared) -> Self {
        let mut calendar = Self {
            year_input: String::new(),
            month_input: String::new(),
        };
        calendar.reset_inputs(app.shown);
        calendar
    }

    fn reset_inputs(&mut self, month: YearMonth) {
        self.year_input = month.year.to_string();
        self.month_input = month.month.to_string();
    }

    fn view_toolbar<'a>(&'a self, app: &'a AppShared) -> Element<'a, super::Message> {
        let inputs = row![
            text("Year:"),
            text_input("Year", &self.year_input)
                .on_input(|s| super::Message::from(Message::YearInput(s)))
                .on_submit(super::Message::from(Message::Show))
                .width(Length::Fixed(80.0)),
            text("Month:"),
            text_input("Month", &self.month_input)
                .on_input(|s| super::Message::from(Message::MonthInput(s)))
                .on_submit(super::Message::from(Message::Show))
                .width(Length::Fixed(50.0)),
            button("Show Calendar")
                .on_press(super::Message::from(Message::Show))
                .style(button::primary),
        ]
        .spacing(8)
        .align_y(Vertical::Center);

        let modes = Row::new().spacing(10).extend(ViewMode::VARIANTS.iter().map(|&mode| {
            radio(
                mode.to_string(),
                mode,
                Some(app.settings.view_mode),
                |mode| to_app(app::Message::SetViewMode(mode)),
            )
            .into()
        }));

        let navigation = row![
            square_button(
                "<",
                "Previous month (Left)",
                to_app(app::Message::ShiftMonth(-1)),
                button::secondary
            ),
            square_button(
                "Today",
                "Jump to the current month",
                to_app(app::Message::ShowToday),
                button::secondary
            ),
            square_button(
                ">",
                "Next month (Right)",
                to_app(app::Message::ShiftMonth(1)),
                button::secondary
            ),
        ]
        .spacing(5);

        let dark_mode = checkbox(app.dark_mode())
            .label("Dark Mode")
            .on_toggle(|dark| to_app(app::Message::ToggleDarkMode(dark)));

        let file = row![
            menu_button("Import Events", to_app(app::Message::ImportEvents)),
            menu_button("Export Events", to_app(app::Message::ExportEvents)),
            menu_button("Delete All Events", to_app(app::Message::DeleteAllEvents)),
        ]
        .spacing(5);

        column![
            row![inputs, modes, navigation, dark_mode]
                .spacing(20)
                .align_y(Vertical::Center),
            file,
        ]
        .spacing(8)
        .into()
    }

    fn view_month<'a>(&'a self, app: &'a AppShared) -> Element<'a, super::Message> {
        let (width, height) = MONTH_CELL;
        let month = app.shown;
        let header = Row::new()
            .spacing(4)
            .extend(WEEKDAYS.iter().map(|&name| {
                container(text(name).font(BOLD))
                    .center_x(Length::Fixed(width))
                    .into()
            }));
        let cells = month
            .grid()
            .into_iter()
            .map(|cell| {
                let label = format!("{}\n({})", cell.date.day, cell.gregorian.format("%m/%d"));
                (cell, day_button(app, cell.date, label, MONTH_CELL, 14.0))
            })
            .collect();
        let content = column![
            text(month.title()).size(24),
            header,
            calendar_grid(cells, width, height),
        ]
        .spacing(8)
        .align_x(Alignment::Center);
        container(content).center(Length::Fill).into()
    }

    fn view_mini_month<'a>(app: &'a AppShared, month: YearMonth) -> Element<'a, super::Message> {
        let (width, height) = YEAR_CELL;
        let header = Row::new()
            .spacing(4)
            .extend(WEEKDAYS_SHORT.iter().map(|&name| {
                container(text(name).size(11).font(BOLD))
                    .center_x(Length::Fixed(width))
                    .into()
            }));
        let cells = month
            .grid()
            .into_iter()
            .map(|cell| {
                let label = format!("{}\n({})", cell.date.day, cell.gregorian.format("%d"));
                (cell, day_button(app, cell.date, label, YEAR_CELL, 10.0))
            })
            .collect();
        container(
            column![
                text(month_name(month.month)).font(BOLD),
                header,
                calendar_grid(cells, width, height),
            ]
            .spacing(4),
        )
        .padding(8)
        .style(container::bordered_box)
        .into()
    }

    fn view_year<'a>(&'a self, app: &'a AppShared) -> Element<'a, super::Message> {
        let year = app.shown.year;
        let mut months = Column::new().spacing(20).align_x(Alignment::Center);
        for chunk in &(1..=12).chunks(3) {
            months = months.push(
                Row::new().spacing(20).extend(
                    chunk.map(|month| Self::view_mini_month(app, YearMonth { year, month })),
                ),
            );
        }
        let content = column![text(year.to_string()).size(24), months]
            .spacing(10)
            .align_x(Alignment::Center);
        scrollable(container(content).center_x(Length::Fill).padding(10))
            .height(Length::Fill)
            .into()
    }
}

/// A clickable day, coloured by its events, with the events in a tooltip.
fn day_button<'a>(
    app: &'a AppShared,
    date: JalaliDate,
    label: String,
    (width, height): (f32, f32),
    size: f32,
) -> Element<'a, super::Message> {
    let events = app.store.events_on(&date);
    let fill = if date == app.today {
        TODAY_FILL.to_string()
    } else {
        day_fill(events)
    };
    let tip = if events.is_empty() {
        "No events".to_string()
    } else {
        events.iter().map(Event::summary).join("\n")
    };
    let content = button(
        text(label)
            .size(size)
            .center()
            .width(Length::Fill)
            .height(Length::Fill),
    )
    .width(Length::Fixed(width))
    .height(Length::Fixed(height))
    .padding(2)
    .style(filled(hex_color(&fill), contrast_color(&fill)))
    .on_press(super::Message::from(Message::DayClicked(date)));
    with_tooltip(content, tip)
}

impl Panel for Calendar {
    fn title(&self) -> String {
        "Calendar".into()
    }

    fn view<'a>(&'a self, app: &'a AppShared) -> Element<'a, super::Message> {
        let grid = match app.settings.view_mode {
            ViewMode::Month => self.view_month(app),
            ViewMode::Year => self.view_year(app),
        };
        column![
            container(grid).height(Length::Fill),
            container(self.view_toolbar(app))
                .padding(10)
                .width(Length::Fill)
                .style(container::rounded_box),
        ]
        .spacing(10)
        .into()
    }

    fn update(&mut self, message: super::Message, _app: &AppShared) -> Task<super::Message> {
        match message {
            super::Message::Calendar(message) => match message {
                Message::YearInput(year) => {
                    self.year_input = year;
                    Task::none()
                }
                Message::MonthInput(month) => {
                    self.month_input = month;
                    Task::none()
                }
                Message::Show => match YearMonth::parse(&self.year_input, &self.month_input) {
                    Ok(month) => Task::done(to_app(app::Message::ShowMonth(month))),
                    Err(err) => Task::done(to_app(app::Message::Notify(app::Notice::error(
                        format!("Invalid input: {err:#}"),
                    )))),
                },
                Message::DayClicked(date) => Task::done(to_app(app::Message::OpenDay(date))),
            },
            _ => {
                log::warn!("Received incompatible panel message for the calendar");
                Task::none()
            }
        }
    }

    fn shortcut(&mut self, shortcut: Shortcut, _app: &AppShared) -> Task<super::Message> {
        match shortcut {
            Shortcut::PreviousMonth => Task::done(to_app(app::Message::ShiftMonth(-1))),
            Shortcut::NextMonth => Task::done(to_app(app::Message::ShiftMonth(1))),
            _ => Task::none(),
        }
    }

    fn app_event(&mut self, event: AppEvent, _app: &AppShared) -> Task<super::Message> {
        match event {
            AppEvent::MonthShown(month) => self.reset_inputs(month),
        }
        Task::none()
    }
}
