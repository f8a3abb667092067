//! The blackboard: a schema of typed keys ([`Registry`]) and the sparse
//! per-context storage bound to it ([`Table`]).

use serde::{Deserialize, Serialize};

use crate::value::{DataType, Value};

/// Dense handle into a [`Registry`], assigned in registration order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataHandle(pub u16);

/// One schema entry: a named, typed key.
#[derive(Clone, Debug, PartialEq)]
pub struct DataEntry {
    pub handle: DataHandle,
    pub name: String,
    pub data_type: DataType,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("registry is full")]
    Full,
    #[error("duplicate entry name {0:?}")]
    DuplicateName(String),
    #[error("entry name may not be empty")]
    EmptyName,
}

/// Ordered catalog of the keys one or more [`Table`]s may hold.
///
/// Handles are never reused within one registry; entries cannot be removed.
#[derive(Clone, Debug, PartialEq)]
pub struct Registry {
    board_name: String,
    entries: Vec<DataEntry>,
}

impl Default for Registry {
    fn default() -> Self {
        Registry::new()
    }
}

impl Registry {
    pub const MAX_ENTRIES: usize = 0xFF00;

    pub fn new() -> Self {
        Registry {
            board_name: "Board".to_owned(),
            entries: vec![],
        }
    }

    pub fn register(&mut self, name: &str, data_type: DataType) -> Result<DataHandle, RegistryError> {
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.entries.len() >= Self::MAX_ENTRIES {
            return Err(RegistryError::Full);
        }
        if self.entries.iter().any(|e| e.name == name) {
            return Err(RegistryError::DuplicateName(name.to_owned()));
        }

        let handle = DataHandle(self.entries.len() as u16);
        self.entries.push(DataEntry {
            handle,
            name: name.to_owned(),
            data_type,
        });
        Ok(handle)
    }

    pub fn handle_of(&self, name: &str) -> Option<DataHandle> {
        self.entries.iter().find(|e| e.name == name).map(|e| e.handle)
    }

    pub fn entry_of(&self, handle: DataHandle) -> Option<&DataEntry> {
        self.entries.get(handle.0 as usize)
    }

    /// Name of an entry, empty for unknown handles.
    pub fn name_of(&self, handle: DataHandle) -> &str {
        self.entry_of(handle).map(|e| e.name.as_str()).unwrap_or("")
    }

    pub fn entries(&self) -> &[DataEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn board_name(&self) -> &str {
        &self.board_name
    }

    pub fn set_board_name(&mut self, name: impl Into<String>) {
        self.board_name = name.into();
    }

    /// Rebuild a registry from decoded parts, trusting the caller to supply
    /// dense handles and unique names (the load path reads them verbatim).
    pub fn from_entries(board_name: String, entries: Vec<DataEntry>) -> Registry {
        Registry {
            board_name,
            entries,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TableEntry {
    pub handle: DataHandle,
    pub value: Value,
}

/// Sparse handle → [`Value`] storage bound to a [`Registry`] at the call
/// sites. Iteration order is insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    entries: Vec<TableEntry>,
}

impl Table {
    pub fn new() -> Self {
        Table::default()
    }

    pub fn find(&self, handle: DataHandle) -> Option<&Value> {
        self.entries
            .iter()
            .find(|e| e.handle == handle)
            .map(|e| &e.value)
    }

    pub fn find_mut(&mut self, handle: DataHandle) -> Option<&mut Value> {
        self.entries
            .iter_mut()
            .find(|e| e.handle == handle)
            .map(|e| &mut e.value)
    }

    /// Look up the entry for `handle`, creating a default-valued one of the
    /// registered type if absent. `None` for handles the registry does not
    /// know.
    pub fn set(&mut self, registry: &Registry, handle: DataHandle) -> Option<&mut Value> {
        let position = self.entries.iter().position(|e| e.handle == handle);
        let index = match position {
            Some(i) => i,
            None => {
                let entry = registry.entry_of(handle)?;
                self.entries.push(TableEntry {
                    handle,
                    value: Value::default_of(entry.data_type),
                });
                self.entries.len() - 1
            }
        };
        Some(&mut self.entries[index].value)
    }

    pub fn unset(&mut self, handle: DataHandle) {
        self.entries.retain(|e| e.handle != handle);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TableEntry> {
        self.entries.iter()
    }
}
