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

use thiserror::Error;

/// Errors raised while reading or writing particle descriptors.
#[derive(Error, Debug)]
pub enum DescriptorError {
    /// Reading or writing a descriptor file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The binary encoder failed.
    #[error("Binary encoding failed: {0}")]
    Encode(#[from] bincode::error::EncodeError),
    /// The binary decoder failed.
    #[error("Binary decoding failed: {0}")]
    Decode(#[from] bincode::error::DecodeError),
    /// The RON text could not be parsed or produced.
    #[error("RON error: {0}")]
    Ron(String),
    /// The data was written by a newer version of a descriptor.
    #[error("{kind} descriptor version {found} is newer than the supported version {supported}")]
    UnsupportedVersion {
        /// The descriptor kind.
        kind: &'static str,
        /// The version found in the data.
        found: u8,
        /// The newest version this build reads.
        supported: u8,
    },
    /// A kind tag did not name any known descriptor.
    #[error("Unknown {family} kind tag {tag}")]
    UnknownKind {
        /// The descriptor family (emitter, initializer, ...).
        family: &'static str,
        /// The tag found in the data.
        tag: u8,
    },
    /// The data ended in the middle of a descriptor.
    #[error("Unexpected end of descriptor data")]
    UnexpectedEof,
}
