use iced::{Element, Task};
use shamsi::jalali::YearMonth;

use crate::app::{self, AppShared};

pub mod calendar;
pub mod day;
pub mod editor;

#[derive(Debug, Clone)]
pub enum Message {
    ToApp(Box<app::Message>),
    Calendar(calendar::Message),
    Day(day::Message),
    Editor(editor::Message),
}

impl Message {
    pub fn to_app(message: app::Message) -> Self {
        Message::ToApp(Box::new(message))
    }
}

impl From<calendar::Message> for Message {
    fn from(msg: calendar::Message) -> Self {
        Message::Calendar(msg)
    }
}

impl From<day::Message> for Message {
    fn from(msg: day::Message) -> Self {
        Message::Day(msg)
    }
}

impl From<editor::Message> for Message {
    fn from(msg: editor::Message) -> Self {
        Message::Editor(msg)
    }
}

/// Keyboard shortcuts, delivered to the panel on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    PreviousMonth,
    NextMonth,
    SortByTime,
    SortByPriority,
    Escape,
}

/// Application state changes every panel gets to see.
#[derive(Debug, Clone, Copy)]
pub enum AppEvent {
    MonthShown(YearMonth),
}

pub trait Panel {
    fn title(&self) -> String;
    fn view<'a>(&'a self, app: &'a AppShared) -> Element<'a, Message>;
    fn update(&mut self, message: Message, app: &AppShared) -> Task<Message>;
    fn shortcut(&mut self, _shortcut: Shortcut, _app: &AppShared) -> Task<Message> {
        Task::none()
    }
    fn app_event(&mut self, _event: AppEvent, _app: &AppShared) -> Task<Message> {
        Task::none()
    }
}
