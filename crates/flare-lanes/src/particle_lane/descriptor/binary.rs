// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The version-tagged binary descriptor format.
//!
//! Every processor descriptor is written as one `u8` version followed by its
//! bincode-encoded fields. Lists are a bincode `u32` count followed by, per
//! item, a `u8` kind tag and the versioned payload. Readers reject versions
//! newer than they know.

use crate::particle_lane::DescriptorError;
use bincode::config::{self, Configuration};
use bincode::{Decode, Encode};

fn binary_config() -> Configuration {
    config::standard()
}

/// A cursor over descriptor bytes.
pub(crate) struct Reader<'a> {
    bytes: &'a [u8],
}

impl<'a> Reader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, DescriptorError> {
        let (&byte, rest) = self
            .bytes
            .split_first()
            .ok_or(DescriptorError::UnexpectedEof)?;
        self.bytes = rest;
        Ok(byte)
    }

    pub(crate) fn read<T: Decode<()>>(&mut self) -> Result<T, DescriptorError> {
        let (value, read) = bincode::decode_from_slice(self.bytes, binary_config())?;
        self.bytes = &self.bytes[read..];
        Ok(value)
    }

    /// Reads a version byte and the payload that follows it.
    pub(crate) fn read_versioned<T: Decode<()>>(
        &mut self,
        kind: &'static str,
        supported: u8,
    ) -> Result<T, DescriptorError> {
        let found = self.read_u8()?;
        if found > supported {
            return Err(DescriptorError::UnsupportedVersion {
                kind,
                found,
                supported,
            });
        }
        self.read()
    }
}

/// An append-only descriptor byte buffer.
#[derive(Default)]
pub(crate) struct Writer {
    bytes: Vec<u8>,
}

impl Writer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn write_u8(&mut self, value: u8) {
        self.bytes.push(value);
    }

    pub(crate) fn write<T: Encode>(&mut self, value: &T) -> Result<(), DescriptorError> {
        let encoded = bincode::encode_to_vec(value, binary_config())?;
        self.bytes.extend_from_slice(&encoded);
        Ok(())
    }

    /// Writes a version byte and the payload after it.
    pub(crate) fn write_versioned<T: Encode>(&mut self, version: u8, value: &T) -> Result<(), DescriptorError> {
        self.write_u8(version);
        self.write(value)
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// A closed family of descriptors stored as kind tag + versioned payload.
pub(crate) trait BinaryDescriptor: Sized {
    fn write_binary(&self, writer: &mut Writer) -> Result<(), DescriptorError>;
    fn read_binary(reader: &mut Reader<'_>) -> Result<Self, DescriptorError>;
}

/// Implements [`BinaryDescriptor`] for a descriptor enum whose variants each
/// wrap a struct with a `VERSION` constant.
macro_rules! binary_descriptor_enum {
    ($family:literal, $enum:ident { $($tag:literal => $variant:ident($payload:ty)),+ $(,)? }) => {
        impl $crate::particle_lane::descriptor::binary::BinaryDescriptor for $enum {
            fn write_binary(
                &self,
                writer: &mut $crate::particle_lane::descriptor::binary::Writer,
            ) -> Result<(), $crate::particle_lane::DescriptorError> {
                match self {
                    $($enum::$variant(payload) => {
                        writer.write_u8($tag);
                        writer.write_versioned(<$payload>::VERSION, payload)
                    })+
                }
            }

            fn read_binary(
                reader: &mut $crate::particle_lane::descriptor::binary::Reader<'_>,
            ) -> Result<Self, $crate::particle_lane::DescriptorError> {
                match reader.read_u8()? {
                    $($tag => Ok($enum::$variant(
                        reader.read_versioned(stringify!($variant), <$payload>::VERSION)?,
                    )),)+
                    tag => Err($crate::particle_lane::DescriptorError::UnknownKind {
                        family: $family,
                        tag,
                    }),
                }
            }
        }
    };
}

pub(crate) use binary_descriptor_enum;

pub(crate) fn write_list<T: BinaryDescriptor>(writer: &mut Writer, items: &[T]) -> Result<(), DescriptorError> {
    writer.write(&(items.len() as u32))?;
    for item in items {
        item.write_binary(writer)?;
    }
    Ok(())
}

pub(crate) fn read_list<T: BinaryDescriptor>(reader: &mut Reader<'_>) -> Result<Vec<T>, DescriptorError> {
    let count: u32 = reader.read()?;
    (0..count).map(|_| T::read_binary(reader)).collect()
}
