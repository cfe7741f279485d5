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

//! Names and types of the standard particle streams.

use flare_data::stream::{StreamDataType, StreamDeclaration};

/// World-space position, `Float3`.
pub const POSITION: &str = "Position";
/// World-space velocity, `Float3`.
pub const VELOCITY: &str = "Velocity";
/// Linear RGBA color, `Float4`.
pub const COLOR: &str = "Color";
/// Size in world units, `Float`.
pub const SIZE: &str = "Size";
/// Remaining lifetime in seconds and the inverse of the total lifetime, `Float2`.
pub const LIFETIME: &str = "LifeTime";

/// Declaration of the `Position` stream.
pub fn position() -> StreamDeclaration {
    StreamDeclaration::new(POSITION, StreamDataType::Float3)
}

/// Declaration of the `Velocity` stream.
pub fn velocity() -> StreamDeclaration {
    StreamDeclaration::new(VELOCITY, StreamDataType::Float3)
}

/// Declaration of the `Color` stream.
pub fn color() -> StreamDeclaration {
    StreamDeclaration::new(COLOR, StreamDataType::Float4)
}

/// Declaration of the `Size` stream.
pub fn size() -> StreamDeclaration {
    StreamDeclaration::new(SIZE, StreamDataType::Float)
}

/// Declaration of the `LifeTime` stream.
pub fn lifetime() -> StreamDeclaration {
    StreamDeclaration::new(LIFETIME, StreamDataType::Float2)
}
