// crates/zwave-rs/src/node/command_class.rs
use alloc::collections::BTreeMap;
use core::fmt;

/// A command class identifier as carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CommandClassId(pub u8);

impl CommandClassId {
    pub const NO_OPERATION: Self = Self(0x00);
    pub const BASIC: Self = Self(0x20);
    pub const SWITCH_BINARY: Self = Self(0x25);
    pub const SWITCH_MULTILEVEL: Self = Self(0x26);
    pub const SENSOR_BINARY: Self = Self(0x30);
    pub const SENSOR_MULTILEVEL: Self = Self(0x31);
    pub const METER: Self = Self(0x32);
    pub const MULTI_INSTANCE: Self = Self(0x60);
    pub const CONFIGURATION: Self = Self(0x70);
    pub const ALARM: Self = Self(0x71);
    pub const MANUFACTURER_SPECIFIC: Self = Self(0x72);
    pub const BATTERY: Self = Self(0x80);
    pub const WAKE_UP: Self = Self(0x84);
    pub const ASSOCIATION: Self = Self(0x85);
    pub const VERSION: Self = Self(0x86);
    /// Marks the end of the supported list in a node information frame.
    pub const MARK: Self = Self(0xEF);

    pub fn name(&self) -> &'static str {
        match *self {
            Self::NO_OPERATION => "NO_OPERATION",
            Self::BASIC => "BASIC",
            Self::SWITCH_BINARY => "SWITCH_BINARY",
            Self::SWITCH_MULTILEVEL => "SWITCH_MULTILEVEL",
            Self::SENSOR_BINARY => "SENSOR_BINARY",
            Self::SENSOR_MULTILEVEL => "SENSOR_MULTILEVEL",
            Self::METER => "METER",
            Self::MULTI_INSTANCE => "MULTI_INSTANCE",
            Self::CONFIGURATION => "CONFIGURATION",
            Self::ALARM => "ALARM",
            Self::MANUFACTURER_SPECIFIC => "MANUFACTURER_SPECIFIC",
            Self::BATTERY => "BATTERY",
            Self::WAKE_UP => "WAKE_UP",
            Self::ASSOCIATION => "ASSOCIATION",
            Self::VERSION => "VERSION",
            Self::MARK => "MARK",
            _ => "UNKNOWN",
        }
    }
}

impl fmt::Display for CommandClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:#04x})", self.name(), self.0)
    }
}

/// What is known about one command class on one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandClassInfo {
    pub id: CommandClassId,
    /// Implemented version, 1 until a VERSION report says otherwise.
    pub version: u8,
    /// Whether the node answers "get" commands for this class.
    pub get_supported: bool,
}

impl CommandClassInfo {
    pub fn new(id: CommandClassId) -> Self {
        Self {
            id,
            version: 1,
            get_supported: true,
        }
    }
}

/// Per-node table of supported command classes.
///
/// Mutation goes through [`super::ZWaveNode`], which only permits it during the interview.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandClassRegistry {
    classes: BTreeMap<CommandClassId, CommandClassInfo>,
}

impl CommandClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: CommandClassId) -> Option<&CommandClassInfo> {
        self.classes.get(&id)
    }

    pub fn contains(&self, id: CommandClassId) -> bool {
        self.classes.contains_key(&id)
    }

    /// False for unsupported classes as well as classes without "get" support.
    pub fn supports_get(&self, id: CommandClassId) -> bool {
        self.classes.get(&id).is_some_and(|info| info.get_supported)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandClassInfo> {
        self.classes.values()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Adds a class if absent. Returns true when it was new.
    pub(crate) fn insert(&mut self, id: CommandClassId) -> bool {
        if self.classes.contains_key(&id) {
            return false;
        }
        self.classes.insert(id, CommandClassInfo::new(id));
        true
    }

    pub(crate) fn get_mut_or_insert(&mut self, id: CommandClassId) -> &mut CommandClassInfo {
        self.classes
            .entry(id)
            .or_insert_with(|| CommandClassInfo::new(id))
    }
}
