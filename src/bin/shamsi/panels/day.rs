use iced::{
    Alignment, Element, Length, Task,
    alignment::Vertical,
    widget::{Column, button, column, container, row, scrollable, text},
};
use shamsi::{color::DEFAULT_FILL, event::Event, jalali::JalaliDate};

use crate::{
    app::{self, AppShared, Confirm, Notice, StoreCommand},
    panels::{Panel, Shortcut},
    widgets::{BOLD, hex_color, swatch},
};

#[derive(Debug, Clone)]
pub enum Message {
    Add,
    Edit(usize),
    Delete(usize),
    MoveUp(usize),
    MoveDown(usize),
    SortByTime,
    SortByPriority,
    DeleteAll,
    Back,
}

/// Lists the events of one day.
pub struct DayPanel {
    date: JalaliDate,
}

fn to_app(message: app::Message) -> super::Message {
    super::Message::to_app(message)
}

fn day_message(message: Message) -> super::Message {
    super::Message::from(message)
}

impl DayPanel {
    pub fn new(date: JalaliDate) -> Self {
        Self { date }
    }

    fn view_event<'a>(
        idx: usize,
        count: usize,
        event: &'a Event,
    ) -> Element<'a, super::Message> {
        let fill = event.color.as_deref().unwrap_or(DEFAULT_FILL);
        let up = button(text("Up").size(12))
            .style(button::secondary)
            .on_press_maybe((idx > 0).then(|| day_message(Message::MoveUp(idx))));
        let down = button(text("Down").size(12))
            .style(button::secondary)
            .on_press_maybe((idx + 1 < count).then(|| day_message(Message::MoveDown(idx))));
        let line = row![
            swatch(hex_color(fill), 16.0),
            text(event.summary()).width(Length::Fill),
            up,
            down,
            button(text("Edit").size(12))
                .style(button::primary)
                .on_press(day_message(Message::Edit(idx))),
            button(text("Delete").size(12))
                .style(button::danger)
                .on_press(day_message(Message::Delete(idx))),
        ]
        .spacing(8)
        .align_y(Vertical::Center);
        container(line)
            .padding(8)
            .width(Length::Fill)
            .style(container::bordered_box)
            .into()
    }

    fn confirm_delete(&self, idx: usize, app: &AppShared) -> Task<super::Message> {
        let Some(event) = app.store.events_on(&self.date).get(idx) else {
            log::warn!("No event {idx} on {}", self.date);
            return Task::none();
        };
        Task::done(to_app(app::Message::AskConfirm(Confirm {
            title: "Delete Event".into(),
            prompt: format!("Are you sure you want to delete this event?\n\n{}", event.summary()),
            on_yes: vec![app::Message::Store(StoreCommand::Remove(self.date, idx))],
        })))
    }

    fn confirm_delete_all(&self, app: &AppShared) -> Task<super::Message> {
        if app.store.count_on(&self.date) == 0 {
            return Task::done(to_app(app::Message::Notify(Notice::info(format!(
                "No events for {} to delete.",
                self.date
            )))));
        }
        Task::done(to_app(app::Message::AskConfirm(Confirm {
            title: "Delete All Events".into(),
            prompt: format!("Are you sure you want to delete all events for {}?", self.date),
            on_yes: vec![app::Message::Store(StoreCommand::ClearDay(self.date))],
        })))
    }

    fn store(&self, command: StoreCommand) -> Task<super::Message> {
        Task::done(to_app(app::Message::Store(command)))
    }
}

impl Panel for DayPanel {
    fn title(&self) -> String {
        format!("Events for {}", self.date)
    }

    fn view<'a>(&'a self, app: &'a AppShared) -> Element<'a, super::Message> {
        let events = app.store.events_on(&self.date);
        let header = column![
            text(self.title()).font(BOLD).size(22),
            text(self.date.to_gregorian().format("%A, %d %B %Y").to_string()),
        ]
        .spacing(4);

        let list: Element<'a, super::Message> = if events.is_empty() {
            container(text("No events for this day"))
                .center(Length::Fill)
                .into()
        } else {
            scrollable(
                Column::new().spacing(6).extend(
                    events
                        .iter()
                        .enumerate()
                        .map(|(idx, event)| Self::view_event(idx, events.len(), event)),
                ),
            )
            .height(Length::Fill)
            .into()
        };

        let actions = row![
            button("Sort by Time (Ctrl+T)")
                .style(button::secondary)
                .on_press(day_message(Message::SortByTime)),
            button("Sort by Priority (Ctrl+P)")
                .style(button::secondary)
                .on_press(day_message(Message::SortByPriority)),
            button("Add Event")
                .style(button::primary)
                .on_press(day_message(Message::Add)),
            button("Delete All Events")
                .style(button::danger)
                .on_press(day_message(Message::DeleteAll)),
            button("Back")
                .style(button::secondary)
                .on_press(day_message(Message::Back)),
        ]
        .spacing(10);

        column![header, list, actions]
            .spacing(15)
            .padding(10)
            .align_x(Alignment::Start)
            .into()
    }

    fn update(&mut self, message: super::Message, app: &AppShared) -> Task<super::Message> {
        let super::Message::Day(message) = message else {
            log::warn!("Received incompatible panel message for the day view");
            return Task::none();
        };
        match message {
            Message::Add => Task::done(to_app(app::Message::OpenEditor(self.date, None))),
            Message::Edit(idx) => Task::done(to_app(app::Message::OpenEditor(self.date, Some(idx)))),
            Message::Delete(idx) => self.confirm_delete(idx, app),
            Message::MoveUp(idx) => match idx.checked_sub(1) {
                Some(to) => self.store(StoreCommand::Move(self.date, idx, to)),
                None => Task::none(),
            },
            Message::MoveDown(idx) => self.store(StoreCommand::Move(self.date, idx, idx + 1)),
            Message::SortByTime => self.store(StoreCommand::SortByTime(self.date)),
            Message::SortByPriority => self.store(StoreCommand::SortByPriority(self.date)),
            Message::DeleteAll => self.confirm_delete_all(app),
            Message::Back => Task::done(to_app(app::Message::ClosePanel)),
        }
    }

    fn shortcut(&mut self, shortcut: Shortcut, _app: &AppShared) -> Task<super::Message> {
        match shortcut {
            Shortcut::SortByTime => self.store(StoreCommand::SortByTime(self.date)),
            Shortcut::SortByPriority => self.store(StoreCommand::SortByPriority(self.date)),
            _ => Task::none(),
        }
    }
}
