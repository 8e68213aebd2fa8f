use crate::board::{EMPTY, NUM_CELLS};
use crate::error::{Error, PersistenceError};
use chrono::offset::Local;
use itertools::Itertools;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::fmt;
use std::str::FromStr;

pub type ActionValues = [f32; NUM_CELLS];

/// A board flattened row-major and seen from one side: `+1` is the owner's
/// mark, `-1` the opponent's.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateKey([i8; NUM_CELLS]);

impl Deref for StateKey {
    type Target = [i8; NUM_CELLS];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl StateKey {
    pub fn new(cells: [i8; NUM_CELLS]) -> Self {
        StateKey(cells)
    }
    pub fn legal_actions(&self) -> Vec<usize> {
        self.iter().positions(|&cell| cell == EMPTY).collect()
    }
}

/// Written as a tuple literal, e.g. `(-1, 0, 1, 0, 0, 0, 1, -1, 0)`.
impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({})", self.iter().join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed state key '{0}'")]
pub struct ParseStateKeyError(String);

impl FromStr for StateKey {
    type Err = ParseStateKeyError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ParseStateKeyError(s.to_owned());
        let inner = s
            .trim()
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(malformed)?;
        let cells = inner
            .split(',')
            .map(|token| token.trim().parse::<i8>().ok().filter(|v| (-1..=1).contains(v)))
            .collect::<Option<Vec<i8>>>()
            .ok_or_else(malformed)?;
        let cells: [i8; NUM_CELLS] = cells.try_into().map_err(|_| malformed())?;
        Ok(StateKey(cells))
    }
}

/// Sparse action values per normalized state. States never written read as
/// all zeros without being stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QTable {
    qtable: HashMap<StateKey, ActionValues>,
}

impl Deref for QTable {
    type Target = HashMap<StateKey, ActionValues>;
    fn deref(&self) -> &<Self as Deref>::Target {
        &self.qtable
    }
}

impl QTable {
    pub fn new() -> Self {
        QTable {
            qtable: HashMap::with_capacity(6000),
        }
    }
    pub fn values(&self, state: &StateKey) -> ActionValues {
        self.qtable.get(state).copied().unwrap_or([0.0; NUM_CELLS])
    }
    pub fn value(&self, state: &StateKey, action: usize) -> f32 {
        self.values(state)[action]
    }
    /// Largest value over all nine actions of `state`.
    pub fn max_value(&self, state: &StateKey) -> f32 {
        self.values(state)
            .into_iter()
            .max_by(|value1, value2| value1.total_cmp(value2))
            .unwrap_or(0.0)
    }
    /// Get-or-insert-zero access used by every write.
    pub fn values_mut(&mut self, state: StateKey) -> &mut ActionValues {
        self.qtable.entry(state).or_insert([0.0; NUM_CELLS])
    }
    /// Entries of `other` overwrite ours, everything else is kept.
    pub fn merge(&mut self, other: QTable) {
        self.qtable.extend(other.qtable);
    }
}

impl Serialize for QTable {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.qtable.len()))?;
        for (state, values) in self.qtable.iter().sorted_by_key(|(state, _)| **state) {
            map.serialize_entry(&state.to_string(), &values[..])?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for QTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct QTableVisitor;
        impl<'de> Visitor<'de> for QTableVisitor {
            type Value = QTable;
            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map from state tuples to nine action values")
            }
            fn visit_map<M>(self, mut access: M) -> Result<Self::Value, M::Error>
            where
                M: MapAccess<'de>,
            {
                let mut qtable = HashMap::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, values)) = access.next_entry::<String, Vec<f32>>()? {
                    let state: StateKey = key.parse().map_err(<M::Error as de::Error>::custom)?;
                    let len = values.len();
                    let values: ActionValues = values
                        .try_into()
                        .map_err(|_| <M::Error as de::Error>::invalid_length(len, &"nine action values"))?;
                    qtable.insert(state, values);
                }
                Ok(QTable { qtable })
            }
        }
        deserializer.deserialize_map(QTableVisitor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableFormat {
    Json,
    Pickle,
}

impl TableFormat {
    fn of(path: &Path) -> Self {
        match path.extension().and_then(OsStr::to_str) {
            Some("pickle") | Some("pkl") => TableFormat::Pickle,
            _ => TableFormat::Json,
        }
    }
}

fn persistence(operation: &'static str, path: &Path) -> impl FnOnce(PersistenceError) -> Error {
    let path = path.to_path_buf();
    move |source| Error::Persistence {
        operation,
        path,
        source,
    }
}

/// Writes the table as JSON, or as a pickle when the file ends in `.pickle`.
/// Missing parent directories are created.
pub fn q_table_to_disk(path: &Path, q: &QTable) -> Result<(), Error> {
    let write = || -> Result<(), PersistenceError> {
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let mut writer = BufWriter::new(File::create(path)?);
        match TableFormat::of(path) {
            TableFormat::Json => serde_json::to_writer(&mut writer, q)?,
            TableFormat::Pickle => {
                serde_pickle::to_writer(&mut writer, q, serde_pickle::SerOptions::new())?
            }
        }
        writer.flush()?;
        Ok(())
    };
    write().map_err(persistence("write", path))
}

pub fn q_table_from_disk(path: &Path) -> Result<QTable, Error> {
    let read = || -> Result<QTable, PersistenceError> {
        let reader = BufReader::new(File::open(path)?);
        let decoded = match TableFormat::of(path) {
            TableFormat::Json => serde_json::from_reader(reader)?,
            TableFormat::Pickle => serde_pickle::from_reader(reader, serde_pickle::DeOptions::new())?,
        };
        Ok(decoded)
    };
    read().map_err(persistence("read", path))
}

/// `<dir>/<name>_data.json`
pub fn table_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}_data.json", name))
}

/// `<dir>/<name>_data-<today>.json`
pub fn snapshot_path(dir: &Path, name: &str) -> PathBuf {
    let today = Local::now().date_naive();
    dir.join(format!("{}_data-{}.json", name, today))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> StateKey {
        StateKey::new([-1, 0, 1, 0, 0, 0, 1, -1, 0])
    }

    #[test]
    fn is_state_key_text_working() {
        assert_eq!(key().to_string(), "(-1, 0, 1, 0, 0, 0, 1, -1, 0)");
        assert_eq!("(-1,0,1,0,0,0,1,-1,0)".parse::<StateKey>(), Ok(key()));
        assert_eq!(" ( -1, 0, 1, 0, 0, 0, 1, -1, 0 ) ".parse::<StateKey>(), Ok(key()));
    }

    #[test]
    fn is_malformed_state_key_rejected() {
        assert!("(-1, 0, 1)".parse::<StateKey>().is_err());
        assert!("-1, 0, 1, 0, 0, 0, 1, -1, 0".parse::<StateKey>().is_err());
        assert!("(2, 0, 1, 0, 0, 0, 1, -1, 0)".parse::<StateKey>().is_err());
        assert!("(a, 0, 1, 0, 0, 0, 1, -1, 0)".parse::<StateKey>().is_err());
        assert!("(0, 0, 0, 0, 0, 0, 0, 0, 0, 0)".parse::<StateKey>().is_err());
    }

    #[test]
    fn is_legal_actions_working() {
        assert_eq!(key().legal_actions(), vec![1, 3, 4, 5, 8]);
    }

    #[test]
    fn is_reading_unseen_state_side_effect_free() {
        let q = QTable::new();
        assert_eq!(q.values(&key()), [0.0; NUM_CELLS]);
        assert_eq!(q.max_value(&key()), 0.0);
        assert!(q.is_empty());
        assert_eq!(q, QTable::default());
    }

    #[test]
    fn is_q_table_working() {
        let mut q = QTable::new();
        q.values_mut(key())[4] = 0.5;
        q.values_mut(key())[1] -= 0.25;
        assert_eq!(q.value(&key(), 4), 0.5);
        assert_eq!(q.value(&key(), 1), -0.25);
        assert_eq!(q.max_value(&key()), 0.5);
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn is_merge_overwriting_only_loaded_keys() {
        let other_key = StateKey::new([0; NUM_CELLS]);
        let mut q = QTable::new();
        q.values_mut(key())[0] = 1.0;
        q.values_mut(other_key)[0] = 2.0;
        let mut loaded = QTable::new();
        loaded.values_mut(key())[0] = -1.0;
        q.merge(loaded);
        assert_eq!(q.value(&key(), 0), -1.0);
        assert_eq!(q.value(&other_key, 0), 2.0);
    }

    #[test]
    fn is_json_format_working() {
        let mut q = QTable::new();
        q.values_mut(key())[2] = 0.75;
        let json = serde_json::to_string(&q).unwrap();
        assert_eq!(
            json,
            r#"{"(-1, 0, 1, 0, 0, 0, 1, -1, 0)":[0.0,0.0,0.75,0.0,0.0,0.0,0.0,0.0,0.0]}"#
        );
        let decoded: QTable = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, q);
    }

    #[test]
    fn is_malformed_json_rejected() {
        let short = r#"{"(-1, 0, 1, 0, 0, 0, 1, -1, 0)":[0.0,0.5]}"#;
        assert!(serde_json::from_str::<QTable>(short).is_err());
        let bad_key = r#"{"[-1, 0, 1]":[0,0,0,0,0,0,0,0,0]}"#;
        assert!(serde_json::from_str::<QTable>(bad_key).is_err());
        assert!(serde_json::from_str::<QTable>("[1, 2, 3]").is_err());
    }

    #[test]
    fn is_table_format_chosen_by_extension() {
        assert_eq!(TableFormat::of(Path::new("a1_data.json")), TableFormat::Json);
        assert_eq!(TableFormat::of(Path::new("a1_data.pickle")), TableFormat::Pickle);
        assert_eq!(TableFormat::of(Path::new("a1_data")), TableFormat::Json);
    }

    #[test]
    fn is_missing_file_a_persistence_error() {
        let err = q_table_from_disk(Path::new("./does/not/exist.json")).unwrap_err();
        assert!(matches!(
            err,
            Error::Persistence {
                operation: "read",
                source: PersistenceError::Io(_),
                ..
            }
        ));
    }

    #[test]
    fn is_table_path_working() {
        assert_eq!(
            table_path(Path::new("q_table_archive"), "a1"),
            PathBuf::from("q_table_archive/a1_data.json")
        );
        let snapshot = snapshot_path(Path::new("q_table_archive"), "a2");
        let name = snapshot.file_name().and_then(OsStr::to_str).unwrap();
        assert!(name.starts_with("a2_data-") && name.ends_with(".json"));
    }
}
