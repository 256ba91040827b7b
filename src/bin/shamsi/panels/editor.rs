use anyhow::Context;
use iced::{
    Element, Length, Task,
    alignment::Vertical,
    widget::{Row, Space, button, column, container, pick_list, row, text, text_input},
};
use shamsi::{
    color::{PALETTE, Rgb},
    event::{Event, Priority},
    jalali::JalaliDate,
};
use strum::VariantArray;

use crate::{
    app::{self, AppShared, Confirm, StoreCommand},
    panels::Panel,
    widgets::{BOLD, contrast_color, filled, hex_color, swatch, text_field, with_tooltip},
};

#[derive(Debug, Clone)]
pub enum Message {
    Text(String),
    Time(String),
    Priority(Priority),
    Color(String),
    Swatch(&'static str),
    ClearColor,
    Save,
    Delete,
    Cancel,
}

/// Form for adding an event to a day or changing an existing one.
pub struct Editor {
    date: JalaliDate,
    /// Position of the event being edited, `None` when adding.
    idx: Option<usize>,
    text: String,
    time: String,
    priority: Priority,
    color: String,
    error: Option<String>,
}

fn to_app(message: app::Message) -> super::Message {
    super::Message::to_app(message)
}

fn editor_message(message: Message) -> super::Message {
    super::Message::from(message)
}

impl Editor {
    pub fn new(date: JalaliDate, idx: Option<usize>, app: &AppShared) -> anyhow::Result<Self> {
        let mut editor = Self {
            date,
            idx,
            text: String::new(),
            time: String::new(),
            priority: Priority::default(),
            color: String::new(),
            error: None,
        };
        if let Some(idx) = idx {
            let event = app
                .store
                .events_on(&date)
                .get(idx)
                .with_context(|| format!("No event {} on {date}", idx + 1))?;
            editor.text = event.text.clone();
            editor.time = event.time.map(|t| t.to_string()).unwrap_or_default();
            editor.priority = event.priority;
            editor.color = event.color.clone().unwrap_or_default();
        }
        Ok(editor)
    }

    /// Validates the form.
    fn build(&self) -> anyhow::Result<Event> {
        let color = match self.color.trim() {
            "" => None,
            hex => Some(Rgb::parse(hex)?.to_hex()),
        };
        Event::from_input(&self.text, &self.time, self.priority, color)
    }

    fn save(&mut self) -> Task<super::Message> {
        let event = match self.build() {
            Ok(event) => event,
            Err(err) => {
                log::debug!("Rejected event input: {err:#}");
                self.error = Some(format!("{err:#}"));
                return Task::none();
            }
        };
        let command = match self.idx {
            Some(idx) => StoreCommand::Update(self.date, idx, event),
            None => StoreCommand::Add(self.date, event),
        };
        Task::done(to_app(app::Message::Sequence(vec![
            app::Message::ClosePanel,
            app::Message::Store(command),
        ])))
    }

    fn view_color(&self) -> Element<'_, super::Message> {
        let swatches = Row::new().spacing(4).extend(PALETTE.iter().map(|&hex| {
            let fill = hex_color(hex);
            with_tooltip(
                button(Space::new().width(Length::Fixed(18.0)).height(Length::Fixed(18.0)))
                    .padding(2)
                    .style(filled(fill, contrast_color(hex)))
                    .on_press(editor_message(Message::Swatch(hex))),
                hex,
            )
        }));
        let preview: Element<'_, super::Message> = match Rgb::parse(&self.color) {
            Ok(rgb) => swatch(hex_color(&rgb.to_hex()), 24.0),
            Err(_) => text("Default").into(),
        };
        row![
            text("Color").font(BOLD).width(Length::FillPortion(1)),
            row![
                text_input("#rrggbb", &self.color)
                    .on_input(|s| editor_message(Message::Color(s)))
                    .on_submit(editor_message(Message::Save))
                    .padding(10)
                    .width(Length::Fixed(110.0)),
                preview,
                swatches,
                button("Clear")
                    .style(button::text)
                    .on_press(editor_message(Message::ClearColor)),
            ]
            .spacing(10)
            .align_y(Vertical::Center)
            .width(Length::FillPortion(3)),
        ]
        .spacing(10)
        .align_y(Vertical::Center)
        .into()
    }
}

impl Panel for Editor {
    fn title(&self) -> String {
        match self.idx {
            Some(_) => format!("Edit Event for {}", self.date),
            None => format!("Add Event for {}", self.date),
        }
    }

    fn view<'a>(&'a self, _app: &'a AppShared) -> Element<'a, super::Message> {
        let priority = row![
            text("Priority").font(BOLD).width(Length::FillPortion(1)),
            container(pick_list(Priority::VARIANTS, Some(self.priority), |p| {
                editor_message(Message::Priority(p))
            }))
            .width(Length::FillPortion(3)),
        ]
        .spacing(10)
        .align_y(Vertical::Center);

        let mut actions = row![
            button("Save")
                .style(button::primary)
                .on_press(editor_message(Message::Save)),
            button("Cancel")
                .style(button::secondary)
                .on_press(editor_message(Message::Cancel)),
        ]
        .spacing(10);
        if self.idx.is_some() {
            actions = actions.push(
                button("Delete")
                    .style(button::danger)
                    .on_press(editor_message(Message::Delete)),
            );
        }

        let mut form = column![
            text(self.title()).font(BOLD).size(22),
            text_field(
                "Event",
                "What is happening?",
                &self.text,
                |s| editor_message(Message::Text(s)),
                editor_message(Message::Save),
            ),
            text_field(
                "Time (HH:MM)",
                "optional, e.g. 14:30",
                &self.time,
                |s| editor_message(Message::Time(s)),
                editor_message(Message::Save),
            ),
            priority,
            self.view_color(),
        ]
        .spacing(15)
        .max_width(700.0);
        if let Some(error) = &self.error {
            form = form.push(
                container(text(error))
                    .padding(8)
                    .width(Length::Fill)
                    .style(container::danger),
            );
        }
        container(form.push(actions).padding(10))
            .center_x(Length::Fill)
            .into()
    }

    fn update(&mut self, message: super::Message, _app: &AppShared) -> Task<super::Message> {
        let super::Message::Editor(message) = message else {
            log::warn!("Received incompatible panel message for the editor");
            return Task::none();
        };
        match message {
            Message::Text(text) => self.text = text,
            Message::Time(time) => self.time = time,
            Message::Priority(priority) => self.priority = priority,
            Message::Color(color) => self.color = color,
            Message::Swatch(hex) => self.color = hex.to_string(),
            Message::ClearColor => self.color.clear(),
            Message::Save => return self.save(),
            Message::Delete => {
                let Some(idx) = self.idx else {
                    return Task::none();
                };
                return Task::done(to_app(app::Message::AskConfirm(Confirm {
                    title: "Delete Event".into(),
                    prompt: "Are you sure you want to delete this event?".into(),
                    on_yes: vec![
                        app::Message::ClosePanel,
                        app::Message::Store(StoreCommand::Remove(self.date, idx)),
                    ],
                })));
            }
            Message::Cancel => return Task::done(to_app(app::Message::ClosePanel)),
        }
        Task::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor(text: &str, time: &str, color: &str) -> Editor {
        Editor {
            date: JalaliDate::new(1403, 1, 1).unwrap(),
            idx: None,
            text: text.into(),
            time: time.into(),
            priority: Priority::High,
            color: color.into(),
            error: None,
        }
    }

    #[test]
    fn builds_event_from_form() {
        let event = editor("  Nowruz visit ", "9:05", "#ABC").build().unwrap();
        assert_eq!(event.text, "Nowruz visit");
        assert_eq!(event.time_label(), "09:05");
        assert_eq!(event.priority, Priority::High);
        assert_eq!(event.color.as_deref(), Some("#aabbcc"));
    }

    #[test]
    fn blank_colour_means_default() {
        let event = editor("Call", "", " ").build().unwrap();
        assert_eq!(event.color, None);
        assert_eq!(event.time, None);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(editor("", "10:00", "").build().is_err());
        assert!(editor("Call", "25:00", "").build().is_err());
        assert!(editor("Call", "10:00", "red").build().is_err());
    }

    #[test]
    fn failed_save_keeps_the_form_open() {
        let mut form = editor("", "", "");
        let _ = form.save();
        assert_eq!(
            form.error.as_deref(),
            Some("Event description cannot be empty.")
        );
    }
}
