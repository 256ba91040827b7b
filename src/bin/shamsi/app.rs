// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::PathBuf;
use std::time::Duration;

use iced::widget::{Column, button, column, container, row, text};
use iced::{Application, Element, Event, Length, Program, Subscription, Task, Theme};
use iced::{alignment::Vertical, event, keyboard, window};
use shamsi::{
    event::Event as CalendarEvent,
    jalali::{JalaliDate, YearMonth},
    settings::{Settings, ViewMode},
    store::{self, EventStore},
    util::{JSON_FILTER, pick_file, pick_save_file},
};

use crate::Args;
use crate::panels::{
    self, AppEvent, Panel, Shortcut, calendar::Calendar, day::DayPanel, editor::Editor,
};
use crate::widgets::BOLD;

const NOTICE_TIMEOUT: Duration = Duration::from_secs(4);

/// State every panel can read.
pub struct AppShared {
    pub store: EventStore,
    pub settings: Settings,
    pub today: JalaliDate,
    /// Month shown by the calendar, and the year shown in year view.
    pub shown: YearMonth,
    /// `--dark` for this run. Never written to the settings file.
    pub force_dark: bool,
}

impl AppShared {
    pub fn dark_mode(&self) -> bool {
        self.force_dark || self.settings.dark_mode
    }

    /// A choice made in the window replaces the command-line override.
    pub fn set_dark_mode(&mut self, dark: bool) {
        self.force_dark = false;
        self.settings.dark_mode = dark;
    }
}

/// The application model stores app-specific state used to describe its interface and
/// drive its logic.
pub struct AppModel {
    shared: AppShared,
    settings_path: PathBuf,
    /// Panels stacked on top of each other. The calendar is always at the bottom.
    panels: Vec<Box<dyn Panel>>,
    confirm: Option<Confirm>,
    notice: Option<Notice>,
    notice_seq: u64,
}

/// Messages emitted by the application and its panels.
#[derive(Debug, Clone)]
pub enum Message {
    Panel(panels::Message),
    /// Handles each message in order.
    Sequence(Vec<Message>),
    Store(StoreCommand),
    ShowMonth(YearMonth),
    ShiftMonth(i32),
    ShowToday,
    SetViewMode(ViewMode),
    ToggleDarkMode(bool),
    OpenDay(JalaliDate),
    OpenEditor(JalaliDate, Option<usize>),
    ClosePanel,
    AskConfirm(Confirm),
    ConfirmAccepted,
    ConfirmDismissed,
    Notify(Notice),
    ExpireNotice(u64),
    DismissNotice,
    ImportEvents,
    DoImport(PathBuf),
    ExportEvents,
    DoExport(PathBuf),
    Exported(Result<PathBuf, String>),
    DeleteAllEvents,
    Shortcut(Shortcut),
    Tick,
}

/// A change to the event store. Every command is saved to disk right away.
#[derive(Debug, Clone)]
pub enum StoreCommand {
    Add(JalaliDate, CalendarEvent),
    Update(JalaliDate, usize, CalendarEvent),
    Remove(JalaliDate, usize),
    Move(JalaliDate, usize, usize),
    SortByTime(JalaliDate),
    SortByPriority(JalaliDate),
    ClearDay(JalaliDate),
    ClearAll,
}

impl StoreCommand {
    /// Applies the command, returning the notice to show on success.
    fn apply(self, store: &mut EventStore) -> anyhow::Result<Option<String>> {
        let notice = match self {
            StoreCommand::Add(date, event) => {
                store.add(date, event);
                Some("Event added.".to_string())
            }
            StoreCommand::Update(date, idx, event) => {
                store.update(&date, idx, event)?;
                Some("Event updated.".to_string())
            }
            StoreCommand::Remove(date, idx) => {
                store.remove(&date, idx)?;
                Some("Event deleted.".to_string())
            }
            StoreCommand::Move(date, from, to) => {
                store.move_event(&date, from, to)?;
                None
            }
            StoreCommand::SortByTime(date) => {
                store.sort_by_time(&date);
                Some("Events sorted by time.".to_string())
            }
            StoreCommand::SortByPriority(date) => {
                store.sort_by_priority(&date);
                Some("Events sorted by priority.".to_string())
            }
            StoreCommand::ClearDay(date) => {
                store.clear_day(&date);
                Some(format!("All events for {date} have been deleted."))
            }
            StoreCommand::ClearAll => {
                let removed = store.clear_all();
                log::info!("Deleted all {removed} events");
                Some("All events have been deleted.".to_string())
            }
        };
        Ok(notice)
    }
}

/// A yes/no question guarding a destructive action.
#[derive(Debug, Clone)]
pub struct Confirm {
    pub title: String,
    pub prompt: String,
    pub on_yes: Vec<Message>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

impl AppModel {
    pub fn create(args: Args) -> Application<impl Program<Message = Message, Theme = Theme>> {
        iced::application(move || Self::init(args.clone()), Self::update, Self::view)
            .title(Self::title)
            .subscription(Self::subscription)
            .theme(Self::theme)
            .window_size((1000.0, 700.0))
    }

    /// Loads the event store and settings and shows the remembered month.
    fn init(args: Args) -> (Self, Task<Message>) {
        let mut errors = Vec::new();

        let (store, load_error) = EventStore::load_or_recover(&args.events);
        if let Some(err) = load_error {
            errors.push(format!("Failed to load events: {err:#}"));
        }

        let mut settings = Settings::load(&args.settings).unwrap_or_else(|err| {
            log::error!("Failed to load settings: {err:?}");
            errors.push(format!("Failed to load settings: {err:#}"));
            Settings::default()
        });

        let today = JalaliDate::today();
        let shown = settings.start_month(today);
        settings.remember(shown);
        log::debug!("Today is {today}, showing {}", shown.title());

        let shared = AppShared {
            store,
            settings,
            today,
            shown,
            force_dark: args.dark,
        };
        let calendar = Calendar::new(&shared);
        let mut app = AppModel {
            shared,
            settings_path: args.settings,
            panels: vec![Box::new(calendar)],
            confirm: None,
            notice: None,
            notice_seq: 0,
        };

        let task = if errors.is_empty() {
            app.save_settings()
        } else {
            app.notify(Notice::error(errors.join("\n")))
        };
        (app, task)
    }

    fn title(&self) -> String {
        match self.panels.last() {
            Some(panel) if self.panels.len() > 1 => format!("Shamsi Calendar - {}", panel.title()),
            _ => "Shamsi Calendar".into(),
        }
    }

    fn theme(&self) -> Theme {
        if self.shared.dark_mode() {
            Theme::Dark
        } else {
            Theme::Light
        }
    }

    /// Describes the interface based on the current state of the application model.
    fn view(&self) -> Element<'_, Message> {
        let body: Element<'_, Message> = match (&self.confirm, self.panels.last()) {
            (Some(confirm), _) => Self::view_confirm(confirm),
            (None, Some(panel)) => panel.view(&self.shared).map(Message::Panel),
            (None, None) => text("Nothing to show").into(),
        };
        let mut content = Column::new();
        if let Some(notice) = &self.notice {
            content = content.push(Self::view_notice(notice));
        }
        content
            .push(container(body).padding(10).height(Length::Fill))
            .into()
    }

    fn view_notice(notice: &Notice) -> Element<'_, Message> {
        let banner = row![
            text(&notice.text).width(Length::Fill),
            button("Dismiss")
                .on_press(Message::DismissNotice)
                .padding(5)
                .style(button::text),
        ]
        .spacing(10)
        .align_y(Vertical::Center);
        let banner = container(banner).padding(8).width(Length::Fill);
        let banner = match notice.level {
            NoticeLevel::Info => banner.style(container::success),
            NoticeLevel::Error => banner.style(container::danger),
        };
        banner.into()
    }

    fn view_confirm(confirm: &Confirm) -> Element<'_, Message> {
        let card = container(
            column![
                text(&confirm.title).font(BOLD).size(20),
                text(&confirm.prompt),
                row![
                    button("Yes")
                        .on_press(Message::ConfirmAccepted)
                        .padding(10)
                        .style(button::danger),
                    button("No")
                        .on_press(Message::ConfirmDismissed)
                        .padding(10)
                        .style(button::secondary),
                ]
                .spacing(10),
            ]
            .spacing(15)
            .padding(20),
        )
        .max_width(480.0)
        .style(container::bordered_box);
        container(card).center(Length::Fill).into()
    }

    /// Register subscriptions for this application.
    ///
    /// Keyboard shortcuts are only seen when no widget (e.g. a focused text
    /// input) captured the key. The clock tick keeps "today" current across
    /// midnight.
    fn subscription(&self) -> Subscription<Message> {
        Subscription::batch([
            event::listen_with(shortcut_for),
            iced::time::every(Duration::from_secs(60)).map(|_| Message::Tick),
        ])
    }

    /// Handles messages emitted by the application and its panels.
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Panel(panels::Message::ToApp(message)) => return self.update(*message),
            Message::Panel(message) => match self.panels.last_mut() {
                Some(panel) => return panel.update(message, &self.shared).map(Message::Panel),
                None => log::warn!("Received panel message without a panel: {message:?}"),
            },
            Message::Sequence(messages) => {
                let tasks: Vec<_> = messages.into_iter().map(|m| self.update(m)).collect();
                return Task::batch(tasks);
            }
            Message::Store(command) => return self.apply(command),
            Message::ShowMonth(month) => return self.show_month(month),
            Message::ShiftMonth(delta) => return self.show_month(self.shared.shown.shift(delta)),
            Message::ShowToday => {
                self.shared.today = JalaliDate::today();
                return self.show_month(self.shared.today.year_month());
            }
            Message::SetViewMode(mode) => {
                self.shared.settings.view_mode = mode;
                return self.save_settings();
            }
            Message::ToggleDarkMode(dark) => {
                self.shared.set_dark_mode(dark);
                return self.save_settings();
            }
            Message::OpenDay(date) => {
                log::debug!("Opening {date}");
                self.panels.push(Box::new(DayPanel::new(date)));
            }
            Message::OpenEditor(date, idx) => match Editor::new(date, idx, &self.shared) {
                Ok(editor) => self.panels.push(Box::new(editor)),
                Err(err) => return self.notify(Notice::error(format!("{err:#}"))),
            },
            Message::ClosePanel => {
                if self.panels.len() > 1 {
                    self.panels.pop();
                } else {
                    log::warn!("Refusing to close the calendar");
                }
            }
            Message::AskConfirm(confirm) => self.confirm = Some(confirm),
            Message::ConfirmAccepted => {
                if let Some(confirm) = self.confirm.take() {
                    return self.update(Message::Sequence(confirm.on_yes));
                }
            }
            Message::ConfirmDismissed => self.confirm = None,
            Message::Notify(notice) => return self.notify(notice),
            Message::ExpireNotice(seq) => {
                if seq == self.notice_seq
                    && self
                        .notice
                        .as_ref()
                        .is_some_and(|n| n.level == NoticeLevel::Info)
                {
                    self.notice = None;
                }
            }
            Message::DismissNotice => self.notice = None,
            Message::ImportEvents => {
                return Task::future(pick_file(&[JSON_FILTER]))
                    .and_then(|p| Task::done(Message::DoImport(p)));
            }
            Message::DoImport(path) => {
                let result = self
                    .shared
                    .store
                    .import(&path)
                    .and_then(|days| self.shared.store.save().map(|_| days));
                return match result {
                    Ok(days) => {
                        log::info!("Imported {days} days from {path:?}");
                        self.notify(Notice::info("Events imported successfully."))
                    }
                    Err(err) => {
                        log::error!("Failed to import events: {err:?}");
                        self.notify(Notice::error(format!("Failed to import events: {err:#}")))
                    }
                };
            }
            Message::ExportEvents => {
                return Task::future(pick_save_file(&[JSON_FILTER], "json"))
                    .and_then(|p| Task::done(Message::DoExport(p)));
            }
            Message::DoExport(path) => match self.shared.store.to_json() {
                Ok(json) => {
                    return Task::perform(store::export(path, json), |result| {
                        Message::Exported(result.map_err(|e| format!("{e:#}")))
                    });
                }
                Err(err) => {
                    return self.notify(Notice::error(format!("Failed to export events: {err:#}")));
                }
            },
            Message::Exported(result) => {
                return match result {
                    Ok(_) => self.notify(Notice::info("Events exported successfully.")),
                    Err(err) => {
                        log::error!("Failed to export events: {err}");
                        self.notify(Notice::error(format!("Failed to export events: {err}")))
                    }
                };
            }
            Message::DeleteAllEvents => {
                if self.shared.store.is_empty() {
                    return self.notify(Notice::info("No events to delete."));
                }
                self.confirm = Some(Confirm {
                    title: "Delete All Events".into(),
                    prompt: "Are you sure you want to delete all events?".into(),
                    on_yes: vec![Message::Store(StoreCommand::ClearAll)],
                });
            }
            Message::Shortcut(Shortcut::Escape) => {
                if self.confirm.take().is_none() && self.panels.len() > 1 {
                    self.panels.pop();
                }
            }
            Message::Shortcut(shortcut) => {
                if self.confirm.is_some() {
                    return Task::none();
                }
                if let Some(panel) = self.panels.last_mut() {
                    return panel.shortcut(shortcut, &self.shared).map(Message::Panel);
                }
            }
            Message::Tick => {
                let today = JalaliDate::today();
                if today != self.shared.today {
                    log::info!("Date changed to {today}");
                    self.shared.today = today;
                }
            }
        }
        Task::none()
    }

    fn apply(&mut self, command: StoreCommand) -> Task<Message> {
        log::debug!("Applying {command:?}");
        match command.apply(&mut self.shared.store) {
            Err(err) => {
                log::error!("Failed to change events: {err:?}");
                self.notify(Notice::error(format!("{err:#}")))
            }
            Ok(done) => match self.shared.store.save() {
                Ok(()) => match done {
                    Some(text) => self.notify(Notice::info(text)),
                    None => Task::none(),
                },
                Err(err) => {
                    log::error!("Failed to save events: {err:?}");
                    self.notify(Notice::error(format!("Failed to save events: {err:#}")))
                }
            },
        }
    }

    fn show_month(&mut self, month: YearMonth) -> Task<Message> {
        self.shared.shown = month;
        self.shared.settings.remember(month);
        let mut tasks: Vec<Task<Message>> = self
            .panels
            .iter_mut()
            .map(|panel| {
                panel
                    .app_event(AppEvent::MonthShown(month), &self.shared)
                    .map(Message::Panel)
            })
            .collect();
        tasks.push(self.save_settings());
        Task::batch(tasks)
    }

    fn save_settings(&mut self) -> Task<Message> {
        match self.shared.settings.save(&self.settings_path) {
            Ok(()) => Task::none(),
            Err(err) => {
                log::error!("Failed to save settings: {err:?}");
                self.notify(Notice::error(format!("Failed to save settings: {err:#}")))
            }
        }
    }

    /// Shows `notice`. Info notices disappear on their own, errors stay until
    /// dismissed or replaced.
    fn notify(&mut self, notice: Notice) -> Task<Message> {
        self.notice_seq += 1;
        let seq = self.notice_seq;
        let expires = notice.level == NoticeLevel::Info;
        self.notice = Some(notice);
        if expires {
            Task::perform(tokio::time::sleep(NOTICE_TIMEOUT), move |_| {
                Message::ExpireNotice(seq)
            })
        } else {
            Task::none()
        }
    }
}

fn shortcut_for(event: Event, status: event::Status, _window: window::Id) -> Option<Message> {
    if status == event::Status::Captured {
        return None;
    }
    let Event::Keyboard(keyboard::Event::KeyPressed { key, modifiers, .. }) = event else {
        return None;
    };
    let shortcut = match key.as_ref() {
        keyboard::Key::Named(keyboard::key::Named::ArrowLeft) => Shortcut::PreviousMonth,
        keyboard::Key::Named(keyboard::key::Named::ArrowRight) => Shortcut::NextMonth,
        keyboard::Key::Named(keyboard::key::Named::Escape) => Shortcut::Escape,
        keyboard::Key::Character("t") if modifiers.command() => Shortcut::SortByTime,
        keyboard::Key::Character("p") if modifiers.command() => Shortcut::SortByPriority,
        _ => return None,
    };
    Some(Message::Shortcut(shortcut))
}
