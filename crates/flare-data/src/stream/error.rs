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

use super::StreamDataType;
use flare_core::HashedString;
use std::fmt;

/// Errors raised when changing the layout of a stream group.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamError {
    /// A stream with the same name already exists with a different type.
    TypeMismatch {
        /// The stream name.
        name: HashedString,
        /// The type the stream already has.
        existing: StreamDataType,
        /// The type that was requested.
        requested: StreamDataType,
    },
    /// No stream with this name exists.
    UnknownStream(HashedString),
    /// A buffer or element alignment was not a power of two.
    InvalidAlignment(usize),
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::TypeMismatch {
                name,
                existing,
                requested,
            } => write!(
                f,
                "Stream '{name}' already exists as {existing}, cannot add it as {requested}"
            ),
            StreamError::UnknownStream(name) => write!(f, "No stream named '{name}'"),
            StreamError::InvalidAlignment(alignment) => {
                write!(f, "Alignment {alignment} is not a power of two")
            }
        }
    }
}

impl std::error::Error for StreamError {}

/// Errors raised by a processor that cannot bind to the streams it needs.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamBindingError {
    /// A required stream is absent.
    MissingStream {
        /// The stream name.
        name: HashedString,
        /// The type the processor needs.
        data_type: StreamDataType,
    },
    /// A required stream exists with another type.
    TypeMismatch {
        /// The stream name.
        name: HashedString,
        /// The type the processor needs.
        expected: StreamDataType,
        /// The type of the existing stream.
        found: StreamDataType,
    },
}

impl fmt::Display for StreamBindingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamBindingError::MissingStream { name, data_type } => {
                write!(f, "Missing stream '{name}' ({data_type})")
            }
            StreamBindingError::TypeMismatch {
                name,
                expected,
                found,
            } => write!(f, "Stream '{name}' is {found}, expected {expected}"),
        }
    }
}

impl std::error::Error for StreamBindingError {}
