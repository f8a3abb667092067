//! Little-endian wire primitives shared by the persistence codec.
//!
//! Strings are framed as a `u32` length, the raw bytes, and zero to three
//! `0x00` padding bytes up to the next 4-byte boundary.

use byteorder::{LittleEndian, ReadBytesExt};
use glam::{Vec2, Vec3};
use uuid::Uuid;

use crate::value::{ActorUid, DataType, Value};

#[derive(thiserror::Error, Debug)]
pub enum WireError {
    #[error("unexpected end of stream")]
    TruncatedStream,
    #[error("stream read failed: {0}")]
    Io(std::io::Error),
}

impl From<std::io::Error> for WireError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            WireError::TruncatedStream
        } else {
            WireError::Io(e)
        }
    }
}

fn padding_of(len: usize) -> usize {
    (4 - len % 4) % 4
}

/// Append-only byte sink.
#[derive(Debug, Default)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Encoder::default()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_bool(&mut self, v: bool) {
        self.write_u8(v as u8);
    }

    pub fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_f32(&mut self, v: f32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_f64(&mut self, v: f64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_str(&mut self, s: &str) {
        self.write_u32(s.len() as u32);
        self.buf.extend_from_slice(s.as_bytes());
        for _ in 0..padding_of(s.len()) {
            self.buf.push(0);
        }
    }

    pub fn write_uuid(&mut self, uuid: &Uuid) {
        self.buf.extend_from_slice(uuid.as_bytes());
    }

    pub fn write_vec2(&mut self, v: Vec2) {
        self.write_f32(v.x);
        self.write_f32(v.y);
    }

    pub fn write_vec3(&mut self, v: Vec3) {
        self.write_f32(v.x);
        self.write_f32(v.y);
        self.write_f32(v.z);
    }

    /// Tagged value: `u32` tag then the payload of that tag.
    pub fn write_value(&mut self, v: &Value) {
        self.write_u32(v.data_type() as u32);
        match v {
            Value::Void => {}
            Value::Number(n) => self.write_f64(*n),
            Value::Vector(w) => self.write_vec3(*w),
            Value::Boolean(b) => self.write_bool(*b),
            Value::Text(t) => self.write_str(t),
            Value::Pointer(p) => self.write_u64(*p),
            Value::Actor(a) => self.write_u32(a.raw()),
        }
    }
}

/// Forward-only cursor over a byte slice.
#[derive(Debug)]
pub struct Decoder<'a> {
    data: &'a [u8],
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Decoder { data }
    }

    pub fn remaining(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn read_raw(&mut self, len: usize) -> Result<&'a [u8], WireError> {
        if self.data.len() < len {
            return Err(WireError::TruncatedStream);
        }
        let (head, tail) = self.data.split_at(len);
        self.data = tail;
        Ok(head)
    }

    pub fn read_u8(&mut self) -> Result<u8, WireError> {
        Ok(self.data.read_u8()?)
    }

    pub fn read_bool(&mut self) -> Result<bool, WireError> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u32(&mut self) -> Result<u32, WireError> {
        Ok(self.data.read_u32::<LittleEndian>()?)
    }

    pub fn read_i32(&mut self) -> Result<i32, WireError> {
        Ok(self.data.read_i32::<LittleEndian>()?)
    }

    pub fn read_u64(&mut self) -> Result<u64, WireError> {
        Ok(self.data.read_u64::<LittleEndian>()?)
    }

    pub fn read_f32(&mut self) -> Result<f32, WireError> {
        Ok(self.data.read_f32::<LittleEndian>()?)
    }

    pub fn read_f64(&mut self) -> Result<f64, WireError> {
        Ok(self.data.read_f64::<LittleEndian>()?)
    }

    pub fn read_str(&mut self) -> Result<String, WireError> {
        let len = self.read_u32()? as usize;
        let bytes = self.read_raw(len)?;
        let s = String::from_utf8_lossy(bytes).into_owned();
        self.read_raw(padding_of(len))?;
        Ok(s)
    }

    pub fn read_uuid(&mut self) -> Result<Uuid, WireError> {
        let bytes = self.read_raw(16)?;
        let mut raw = [0u8; 16];
        raw.copy_from_slice(bytes);
        Ok(Uuid::from_bytes(raw))
    }

    pub fn read_vec2(&mut self) -> Result<Vec2, WireError> {
        Ok(Vec2::new(self.read_f32()?, self.read_f32()?))
    }

    pub fn read_vec3(&mut self) -> Result<Vec3, WireError> {
        Ok(Vec3::new(self.read_f32()?, self.read_f32()?, self.read_f32()?))
    }

    pub fn read_value(&mut self) -> Result<Value, WireError> {
        let tag = DataType::from_u32(self.read_u32()?);
        Ok(match tag {
            DataType::Void => Value::Void,
            DataType::Number => Value::Number(self.read_f64()?),
            DataType::Vector => Value::Vector(self.read_vec3()?),
            DataType::Boolean => Value::Boolean(self.read_bool()?),
            DataType::Text => Value::Text(self.read_str()?),
            DataType::Pointer => Value::Pointer(self.read_u64()?),
            DataType::Actor => Value::Actor(ActorUid::from_raw(self.read_u32()?)),
        })
    }
}
