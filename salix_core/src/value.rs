use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Packed generational handle to a host-owned actor.
///
/// Layout is `(salt << 16) | index`; the all-zero pattern is reserved as the
/// invalid handle.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorUid(u32);

impl ActorUid {
    pub const INVALID: ActorUid = ActorUid(0);

    pub fn new(index: u16, salt: u16) -> Self {
        ActorUid(((salt as u32) << 16) | index as u32)
    }

    pub fn from_raw(raw: u32) -> Self {
        ActorUid(raw)
    }

    pub fn index(&self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }

    pub fn salt(&self) -> u16 {
        (self.0 >> 16) as u16
    }

    pub fn raw(&self) -> u32 {
        self.0
    }

    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }
}

/// The type tag of a [`Value`], also used by the blackboard schema.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    #[default]
    Void,
    Number,
    Vector,
    Boolean,
    Text,
    Pointer,
    Actor,
}

impl DataType {
    const NAMES: [&'static str; 7] = [
        "VOID", "NUMBER", "VECTOR", "BOOLEAN", "TEXT", "POINTER", "ACTOR",
    ];

    pub fn name(&self) -> &'static str {
        Self::NAMES[*self as usize]
    }

    /// Inverse of [`DataType::name`], unknown names map to [`DataType::Void`].
    pub fn from_name(name: &str) -> DataType {
        match Self::NAMES.iter().position(|n| *n == name) {
            Some(i) => Self::from_u32(i as u32),
            None => DataType::Void,
        }
    }

    /// Persisted discriminant, unknown values map to [`DataType::Void`].
    pub fn from_u32(v: u32) -> DataType {
        match v {
            1 => DataType::Number,
            2 => DataType::Vector,
            3 => DataType::Boolean,
            4 => DataType::Text,
            5 => DataType::Pointer,
            6 => DataType::Actor,
            _ => DataType::Void,
        }
    }
}

/// Tagged variant carried by blackboard entries.
///
/// The tag is fixed at construction. Reading through a mismatched accessor
/// yields the requested type's default and never mutates the value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum Value {
    #[default]
    Void,
    Number(f64),
    Vector(Vec3),
    Boolean(bool),
    Text(String),
    /// Opaque handle to a host-owned object, zero is null.
    Pointer(u64),
    Actor(ActorUid),
}

impl Value {
    pub const TRUE: Value = Value::Boolean(true);
    pub const FALSE: Value = Value::Boolean(false);
    pub const ZERO: Value = Value::Number(0.0);
    pub const ONE: Value = Value::Number(1.0);

    /// Default-initialised value of the given tag.
    pub fn default_of(data_type: DataType) -> Value {
        match data_type {
            DataType::Void => Value::Void,
            DataType::Number => Value::Number(0.0),
            DataType::Vector => Value::Vector(Vec3::ZERO),
            DataType::Boolean => Value::Boolean(false),
            DataType::Text => Value::Text(String::new()),
            DataType::Pointer => Value::Pointer(0),
            DataType::Actor => Value::Actor(ActorUid::INVALID),
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Value::Void => DataType::Void,
            Value::Number(_) => DataType::Number,
            Value::Vector(_) => DataType::Vector,
            Value::Boolean(_) => DataType::Boolean,
            Value::Text(_) => DataType::Text,
            Value::Pointer(_) => DataType::Pointer,
            Value::Actor(_) => DataType::Actor,
        }
    }

    pub fn as_bool(&self) -> bool {
        match self {
            Value::Boolean(b) => *b,
            _ => false,
        }
    }

    pub fn as_number(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            _ => 0.0,
        }
    }

    pub fn as_i32(&self) -> i32 {
        self.as_number() as i32
    }

    pub fn as_f32(&self) -> f32 {
        self.as_number() as f32
    }

    pub fn as_vector(&self) -> Vec3 {
        match self {
            Value::Vector(v) => *v,
            _ => Vec3::ZERO,
        }
    }

    pub fn as_text(&self) -> &str {
        match self {
            Value::Text(t) => t.as_str(),
            _ => "",
        }
    }

    pub fn as_pointer(&self) -> u64 {
        match self {
            Value::Pointer(p) => *p,
            _ => 0,
        }
    }

    pub fn as_actor(&self) -> ActorUid {
        match self {
            Value::Actor(a) => *a,
            _ => ActorUid::INVALID,
        }
    }

    pub fn set_bool(&mut self, v: bool) {
        if let Value::Boolean(b) = self {
            *b = v;
        }
    }

    pub fn set_number(&mut self, v: f64) {
        if let Value::Number(n) = self {
            *n = v;
        }
    }

    pub fn set_vector(&mut self, v: Vec3) {
        if let Value::Vector(w) = self {
            *w = v;
        }
    }

    pub fn set_text(&mut self, v: impl Into<String>) {
        if let Value::Text(t) = self {
            *t = v.into();
        }
    }

    pub fn set_pointer(&mut self, v: u64) {
        if let Value::Pointer(p) = self {
            *p = v;
        }
    }

    pub fn set_actor(&mut self, v: ActorUid) {
        if let Value::Actor(a) = self {
            *a = v;
        }
    }

    /// Copy `other`'s payload into this value, keeping this value's tag.
    ///
    /// Dispatches on the source tag; a mismatched copy resets this value to
    /// its own tag's default instead.
    pub fn assign(&mut self, other: &Value) {
        if self.data_type() == other.data_type() {
            *self = other.clone();
        } else {
            *self = Value::default_of(self.data_type());
        }
    }

    /// Reset the payload to the tag's default.
    pub fn clear(&mut self) {
        *self = Value::default_of(self.data_type());
    }
}
