//! Flat, date-keyed event store backed by a JSON file.

use std::{
    collections::BTreeMap,
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, ensure};

use crate::{event::Event, jalali::JalaliDate};

pub type EventMap = BTreeMap<JalaliDate, Vec<Event>>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventStore {
    path: PathBuf,
    events: EventMap,
    /// Set when the file exists but could not be read; saving would clobber it.
    unread: bool,
}

/// Why an event file could not be read.
#[derive(Debug)]
enum ReadError {
    Io(anyhow::Error),
    Parse(anyhow::Error),
}

impl ReadError {
    fn into_inner(self) -> anyhow::Error {
        match self {
            ReadError::Io(err) | ReadError::Parse(err) => err,
        }
    }
}

/// Reads an event file as written, keeping days with empty lists. A missing
/// file is an empty map.
fn read_days(path: &Path) -> Result<EventMap, ReadError> {
    if !path.exists() {
        return Ok(EventMap::new());
    }
    let reader = fs::File::open(path)
        .with_context(|| format!("Failed to open {path:?}"))
        .map_err(ReadError::Io)?;
    serde_json::from_reader(std::io::BufReader::new(reader)).map_err(|err| {
        if err.is_io() {
            ReadError::Io(anyhow::Error::new(err).context(format!("Failed to read {path:?}")))
        } else {
            ReadError::Parse(
                anyhow::Error::new(err).context(format!("Failed to parse events in {path:?}")),
            )
        }
    })
}

/// First `<file>.corrupt`, `<file>.corrupt.1`, ... name that is not taken.
fn backup_path(path: &Path) -> PathBuf {
    let mut base = path.as_os_str().to_owned();
    base.push(".corrupt");
    let base = PathBuf::from(base);
    if !base.exists() {
        return base;
    }
    (1..)
        .map(|n| {
            let mut name = base.as_os_str().to_owned();
            name.push(format!(".{n}"));
            PathBuf::from(name)
        })
        .find(|candidate| !candidate.exists())
        .unwrap_or(base)
}

/// Writes an event file through a temporary sibling so a failed write never
/// truncates the previous contents.
pub fn write_events(path: &Path, events: &EventMap) -> anyhow::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    {
        let file = fs::File::create(&tmp).with_context(|| format!("Failed to create {tmp:?}"))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, events)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    }
    fs::rename(&tmp, path).with_context(|| format!("Failed to replace {path:?}"))?;
    Ok(())
}

impl EventStore {
    /// An empty store that will save to `path`.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            events: EventMap::new(),
            unread: false,
        }
    }

    pub fn load(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        Self::read(path.into()).map_err(ReadError::into_inner)
    }

    fn read(path: PathBuf) -> Result<Self, ReadError> {
        let mut events = read_days(&path)?;
        events.retain(|_, day| !day.is_empty());
        log::info!(
            "Loaded {} events on {} days from {path:?}",
            events.values().map(Vec::len).sum::<usize>(),
            events.len()
        );
        Ok(Self {
            path,
            events,
            unread: false,
        })
    }

    /// Like [`EventStore::load`], but a file that does not parse is moved
    /// aside to an unused `<file>.corrupt` name and an empty store is returned
    /// together with the error, so the next save cannot overwrite the user's
    /// data. A file that cannot be opened is left where it is.
    pub fn load_or_recover(path: impl Into<PathBuf>) -> (Self, Option<anyhow::Error>) {
        let path = path.into();
        match Self::read(path.clone()) {
            Ok(store) => (store, None),
            Err(ReadError::Io(err)) => {
                log::error!("Failed to load events: {err:?}");
                let store = Self {
                    unread: true,
                    ..Self::empty(path)
                };
                (store, Some(err))
            }
            Err(ReadError::Parse(err)) => {
                log::error!("Failed to load events: {err:?}");
                let backup = backup_path(&path);
                let err = match fs::rename(&path, &backup) {
                    Ok(()) => err.context(format!("Unreadable events moved to {backup:?}")),
                    Err(rename_err) => {
                        log::error!("Failed to move {path:?} aside: {rename_err}");
                        err
                    }
                };
                (Self::empty(path), Some(err))
            }
        }
    }

    pub fn save(&self) -> anyhow::Result<()> {
        ensure!(
            !self.unread,
            "{:?} could not be read, so it is not overwritten",
            self.path
        );
        write_events(&self.path, &self.events)?;
        log::debug!("Saved {} days of events to {:?}", self.events.len(), self.path);
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn events(&self) -> &EventMap {
        &self.events
    }

    pub fn events_on(&self, date: &JalaliDate) -> &[Event] {
        self.events.get(date).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn count_on(&self, date: &JalaliDate) -> usize {
        self.events_on(date).len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn total(&self) -> usize {
        self.events.values().map(Vec::len).sum()
    }

    pub fn add(&mut self, date: JalaliDate, event: Event) {
        self.events.entry(date).or_default().push(event);
    }

    fn day_mut(&mut self, date: &JalaliDate, idx: usize) -> anyhow::Result<&mut Vec<Event>> {
        let day = self
            .events
            .get_mut(date)
            .with_context(|| format!("No events on {date}"))?;
        ensure!(
            idx < day.len(),
            "No event #{} on {date} ({} events)",
            idx + 1,
            day.len()
        );
        Ok(day)
    }

    pub fn update(&mut self, date: &JalaliDate, idx: usize, event: Event) -> anyhow::Result<()> {
        self.day_mut(date, idx)?[idx] = event;
        Ok(())
    }

    pub fn remove(&mut self, date: &JalaliDate, idx: usize) -> anyhow::Result<Event> {
        let removed = self.day_mut(date, idx)?.remove(idx);
        if self.events.get(date).is_some_and(Vec::is_empty) {
            self.events.remove(date);
        }
        Ok(removed)
    }

    /// Removes every event of one day, returning how many there were.
    pub fn clear_day(&mut self, date: &JalaliDate) -> usize {
        self.events.remove(date).map(|day| day.len()).unwrap_or(0)
    }

    pub fn clear_all(&mut self) -> usize {
        let total = self.total();
        self.events.clear();
        total
    }

    /// Moves the event at `from` so it ends up at index `to`.
    pub fn move_event(&mut self, date: &JalaliDate, from: usize, to: usize) -> anyhow::Result<()> {
        let day = self.day_mut(date, from)?;
        ensure!(to < day.len(), "Cannot move event past the end of {date}");
        let event = day.remove(from);
        day.insert(to, event);
        Ok(())
    }

    /// Timed events first in chronological order, untimed events last.
    pub fn sort_by_time(&mut self, date: &JalaliDate) {
        if let Some(day) = self.events.get_mut(date) {
            day.sort_by_key(|e| (e.time.is_none(), e.time.map(|t| t.minutes())));
        }
    }

    pub fn sort_by_priority(&mut self, date: &JalaliDate) {
        if let Some(day) = self.events.get_mut(date) {
            day.sort_by_key(|e| e.priority);
        }
    }

    /// Merges another event file into the store. Days present in the file
    /// replace the store's events for that day, so an empty list clears it.
    /// Returns the number of days in the file.
    pub fn import(&mut self, path: &Path) -> anyhow::Result<usize> {
        ensure!(path.exists(), "{path:?} does not exist");
        let imported = read_days(path).map_err(ReadError::into_inner)?;
        let days = imported.len();
        for (date, day) in imported {
            if day.is_empty() {
                self.events.remove(&date);
            } else {
                self.events.insert(date, day);
            }
        }
        log::info!("Imported {days} days of events from {path:?}");
        Ok(days)
    }

    /// Serialized store contents, as written by `save` and `export`.
    pub fn to_json(&self) -> anyhow::Result<String> {
        let mut json = serde_json::to_string_pretty(&self.events)?;
        json.push('\n');
        Ok(json)
    }
}

/// Writes a snapshot taken with [`EventStore::to_json`] to `path`.
pub async fn export(path: PathBuf, json: String) -> anyhow::Result<PathBuf> {
    tokio::fs::write(&path, json)
        .await
        .with_context(|| format!("Failed to write {path:?}"))?;
    log::info!("Exported events to {path:?}");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Priority;

    fn date(y: i32, m: u32, d: u32) -> JalaliDate {
        JalaliDate::new(y, m, d).unwrap()
    }

    fn event(text: &str, time: &str, priority: Priority) -> Event {
        Event::from_input(text, time, priority, None).unwrap()
    }

    fn texts(store: &EventStore, d: &JalaliDate) -> Vec<String> {
        store.events_on(d).iter().map(|e| e.text.clone()).collect()
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = EventStore::load(dir.path().join("events.json")).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.total(), 0);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(EventStore::load(&path).is_err());
        fs::write(&path, r#"{"1403-13-1": [["x", null, "", 2]]}"#).unwrap();
        assert!(EventStore::load(&path).is_err());
    }

    #[test]
    fn save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");
        let mut store = EventStore::empty(&path);
        let nowruz = date(1403, 1, 1);
        store.add(nowruz, event("Nowruz", "", Priority::High));
        store.add(nowruz, event("Visit", "18:30", Priority::Low));
        store.add(date(1403, 12, 30), event("Last day", "", Priority::Medium));
        store.save().unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"1403-1-1\": ["));
        assert!(raw.contains("\"1403-12-30\""));
        assert!(!dir.path().join("events.json.tmp").exists());

        let reloaded = EventStore::load(&path).unwrap();
        assert_eq!(reloaded, store);
        assert_eq!(reloaded.count_on(&nowruz), 2);
        assert_eq!(reloaded.total(), 3);
    }

    #[test]
    fn reads_files_written_by_hand() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");
        fs::write(
            &path,
            r##"{
  "1402-7-15": [["Exam", "#ff0000", "9:00", 1], ["Gym", null, "", 3]],
  "1402-7-16": []
}"##,
        )
        .unwrap();
        let store = EventStore::load(&path).unwrap();
        let day = date(1402, 7, 15);
        assert_eq!(texts(&store, &day), vec!["Exam", "Gym"]);
        assert_eq!(store.events_on(&day)[0].time.unwrap().minutes(), 540);
        assert!(store.events_on(&date(1402, 7, 16)).is_empty());
        assert_eq!(store.events().len(), 1);
    }

    #[test]
    fn update_remove_and_clear() {
        let mut store = EventStore::empty("unused.json");
        let d = date(1403, 5, 10);
        store.add(d, event("a", "", Priority::Medium));
        store.add(d, event("b", "", Priority::Medium));

        store.update(&d, 1, event("B", "", Priority::High)).unwrap();
        assert_eq!(texts(&store, &d), vec!["a", "B"]);
        assert!(store.update(&d, 2, event("c", "", Priority::High)).is_err());
        assert!(store.update(&date(1403, 5, 11), 0, event("c", "", Priority::High)).is_err());

        assert_eq!(store.remove(&d, 0).unwrap().text, "a");
        assert_eq!(store.remove(&d, 0).unwrap().text, "B");
        assert!(!store.events().contains_key(&d));
        assert!(store.remove(&d, 0).is_err());

        store.add(d, event("x", "", Priority::Low));
        store.add(date(1403, 5, 11), event("y", "", Priority::Low));
        assert_eq!(store.clear_day(&d), 1);
        assert_eq!(store.clear_day(&d), 0);
        assert_eq!(store.clear_all(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn reorders_events() {
        let mut store = EventStore::empty("unused.json");
        let d = date(1403, 2, 2);
        for t in ["a", "b", "c", "d"] {
            store.add(d, event(t, "", Priority::Medium));
        }
        store.move_event(&d, 0, 2).unwrap();
        assert_eq!(texts(&store, &d), vec!["b", "c", "a", "d"]);
        store.move_event(&d, 3, 0).unwrap();
        assert_eq!(texts(&store, &d), vec!["d", "b", "c", "a"]);
        assert!(store.move_event(&d, 0, 4).is_err());
        assert!(store.move_event(&d, 4, 0).is_err());
    }

    #[test]
    fn sorts_by_time_then_priority() {
        let mut store = EventStore::empty("unused.json");
        let d = date(1403, 3, 3);
        store.add(d, event("untimed-1", "", Priority::Low));
        store.add(d, event("late", "21:00", Priority::Medium));
        store.add(d, event("early", "9:30", Priority::Low));
        store.add(d, event("untimed-2", "", Priority::High));
        store.add(d, event("noon", "12:00", Priority::High));

        store.sort_by_time(&d);
        assert_eq!(
            texts(&store, &d),
            vec!["early", "noon", "late", "untimed-1", "untimed-2"]
        );

        store.sort_by_priority(&d);
        assert_eq!(
            texts(&store, &d),
            vec!["noon", "untimed-2", "late", "early", "untimed-1"]
        );
    }

    #[test]
    fn import_replaces_matching_days() {
        let dir = tempfile::tempdir().unwrap();
        let other = dir.path().join("other.json");
        fs::write(
            &other,
            r#"{"1403-1-1": [["imported"]], "1403-1-2": [["new", null, "", 1]]}"#,
        )
        .unwrap();

        let mut store = EventStore::empty(dir.path().join("events.json"));
        store.add(date(1403, 1, 1), event("mine", "", Priority::Medium));
        store.add(date(1403, 1, 3), event("kept", "", Priority::Medium));

        assert_eq!(store.import(&other).unwrap(), 2);
        assert_eq!(texts(&store, &date(1403, 1, 1)), vec!["imported"]);
        assert_eq!(texts(&store, &date(1403, 1, 2)), vec!["new"]);
        assert_eq!(texts(&store, &date(1403, 1, 3)), vec!["kept"]);

        assert!(store.import(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn importing_an_empty_day_clears_it() {
        let dir = tempfile::tempdir().unwrap();
        let other = dir.path().join("other.json");
        fs::write(&other, r#"{"1403-1-1": [], "1403-1-2": []}"#).unwrap();

        let mut store = EventStore::empty(dir.path().join("events.json"));
        store.add(date(1403, 1, 1), event("mine", "", Priority::Medium));
        store.add(date(1403, 1, 3), event("kept", "", Priority::Medium));

        assert_eq!(store.import(&other).unwrap(), 2);
        assert!(store.events_on(&date(1403, 1, 1)).is_empty());
        assert!(!store.events().contains_key(&date(1403, 1, 1)));
        assert!(!store.events().contains_key(&date(1403, 1, 2)));
        assert_eq!(texts(&store, &date(1403, 1, 3)), vec!["kept"]);
    }

    #[test]
    fn one_odd_record_does_not_spoil_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");
        fs::write(
            &path,
            r##"{"1403-1-1": [["ok", "#ff0000", "10:00", 1]], "1403-1-2": [["x", "#ff0000", null, 2]]}"##,
        )
        .unwrap();
        let (store, err) = EventStore::load_or_recover(&path);
        assert!(err.is_none());
        assert!(path.exists());
        assert_eq!(texts(&store, &date(1403, 1, 2)), vec!["x"]);
        assert_eq!(store.events_on(&date(1403, 1, 2))[0].time, None);
    }

    #[tokio::test]
    async fn export_matches_saved_format() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = EventStore::empty(dir.path().join("events.json"));
        store.add(date(1403, 1, 1), event("جشن", "", Priority::High));
        store.save().unwrap();
        let target = dir.path().join("export.json");
        let written = export(target.clone(), store.to_json().unwrap()).await.unwrap();
        assert_eq!(written, target);
        let saved = fs::read_to_string(store.path()).unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), saved);
        assert!(saved.contains("جشن"));
    }

    #[test]
    fn unreadable_file_is_moved_aside() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");
        fs::write(&path, "{ broken").unwrap();
        let (store, err) = EventStore::load_or_recover(&path);
        assert!(err.is_some());
        assert!(store.is_empty());
        assert!(!path.exists());
        assert_eq!(
            fs::read_to_string(dir.path().join("events.json.corrupt")).unwrap(),
            "{ broken"
        );

        let (store, err) = EventStore::load_or_recover(&path);
        assert!(err.is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn earlier_backups_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");
        for content in ["{ first", "{ second", "{ third"] {
            fs::write(&path, content).unwrap();
            let (_, err) = EventStore::load_or_recover(&path);
            assert!(err.is_some());
        }
        let backup = |name: &str| fs::read_to_string(dir.path().join(name)).unwrap();
        assert_eq!(backup("events.json.corrupt"), "{ first");
        assert_eq!(backup("events.json.corrupt.1"), "{ second");
        assert_eq!(backup("events.json.corrupt.2"), "{ third");
    }

    #[test]
    fn unopenable_file_is_left_in_place() {
        let dir = tempfile::tempdir().unwrap();
        // A directory exists but cannot be opened as an event file.
        let path = dir.path().join("events.json");
        fs::create_dir(&path).unwrap();
        let (store, err) = EventStore::load_or_recover(&path);
        assert!(err.is_some());
        assert!(store.is_empty());
        assert!(path.is_dir());
        assert!(!dir.path().join("events.json.corrupt").exists());
        assert!(store.save().is_err());
    }
}
