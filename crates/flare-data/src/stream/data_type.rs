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

use bytemuck::Pod;
use flare_core::math::{LinearRgba, Vec3, Vec4};
use half::f16;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The scalar kind underlying a [`StreamDataType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// 16-bit float.
    Half,
    /// 32-bit float.
    Float,
    /// 8-bit unsigned integer.
    Byte,
    /// 16-bit signed integer.
    Short,
    /// 32-bit signed integer.
    Int,
}

impl ScalarKind {
    /// Size of one scalar in bytes.
    pub const fn size(self) -> usize {
        match self {
            ScalarKind::Byte => 1,
            ScalarKind::Half | ScalarKind::Short => 2,
            ScalarKind::Float | ScalarKind::Int => 4,
        }
    }
}

/// The element type of a stream: a scalar kind times a component count of 1 to 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum StreamDataType {
    Half,
    Half2,
    Half3,
    Half4,
    Float,
    Float2,
    Float3,
    Float4,
    Byte,
    Byte2,
    Byte3,
    Byte4,
    Short,
    Short2,
    Short3,
    Short4,
    Int,
    Int2,
    Int3,
    Int4,
}

/// Byte size of every [`StreamDataType`], indexed by discriminant.
const SIZE_TABLE: [usize; 20] = [
    2, 4, 6, 8, // Half
    4, 8, 12, 16, // Float
    1, 2, 3, 4, // Byte
    2, 4, 6, 8, // Short
    4, 8, 12, 16, // Int
];

// Adding a variant without extending the table fails to compile.
const _: () = assert!(StreamDataType::Int4 as usize + 1 == SIZE_TABLE.len());

impl StreamDataType {
    /// Size of one element in bytes.
    #[inline]
    pub const fn size(self) -> usize {
        SIZE_TABLE[self as usize]
    }

    /// Number of components (1 to 4).
    #[inline]
    pub const fn component_count(self) -> usize {
        (self as usize % 4) + 1
    }

    /// The scalar kind of each component.
    pub const fn scalar(self) -> ScalarKind {
        match self as usize / 4 {
            0 => ScalarKind::Half,
            1 => ScalarKind::Float,
            2 => ScalarKind::Byte,
            3 => ScalarKind::Short,
            _ => ScalarKind::Int,
        }
    }
}

/// A Rust type whose layout matches one [`StreamDataType`].
///
/// `Half` streams hold [`half::f16`] components.
pub trait StreamElement: Pod {
    /// The stream type this Rust type views.
    const DATA_TYPE: StreamDataType;
}

macro_rules! stream_elements {
    ($($ty:ty => $data_type:ident),+ $(,)?) => {
        $(impl StreamElement for $ty {
            const DATA_TYPE: StreamDataType = StreamDataType::$data_type;
        })+
    };
}

stream_elements! {
    f16 => Half, [f16; 2] => Half2, [f16; 3] => Half3, [f16; 4] => Half4,
    f32 => Float, [f32; 2] => Float2, [f32; 3] => Float3, [f32; 4] => Float4,
    Vec3 => Float3, Vec4 => Float4, LinearRgba => Float4,
    u8 => Byte, [u8; 2] => Byte2, [u8; 3] => Byte3, [u8; 4] => Byte4,
    i16 => Short, [i16; 2] => Short2, [i16; 3] => Short3, [i16; 4] => Short4,
    i32 => Int, [i32; 2] => Int2, [i32; 3] => Int3, [i32; 4] => Int4,
}

impl fmt::Display for StreamDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_match_scalar_times_components() {
        let all = [
            StreamDataType::Half,
            StreamDataType::Half3,
            StreamDataType::Float2,
            StreamDataType::Float4,
            StreamDataType::Byte3,
            StreamDataType::Short4,
            StreamDataType::Int,
            StreamDataType::Int4,
        ];
        for data_type in all {
            assert_eq!(
                data_type.size(),
                data_type.scalar().size() * data_type.component_count(),
                "{data_type}"
            );
        }
        assert_eq!(StreamDataType::Float3.size(), 12);
        assert_eq!(StreamDataType::Byte.component_count(), 1);
        assert_eq!(StreamDataType::Short3.scalar(), ScalarKind::Short);
    }

    fn assert_element_size<T: StreamElement>() {
        assert_eq!(std::mem::size_of::<T>(), T::DATA_TYPE.size(), "{}", T::DATA_TYPE);
    }

    #[test]
    fn element_types_match_stream_sizes() {
        assert_element_size::<f16>();
        assert_element_size::<[f16; 3]>();
        assert_element_size::<[f32; 2]>();
        assert_element_size::<Vec3>();
        assert_element_size::<LinearRgba>();
        assert_element_size::<[u8; 3]>();
        assert_element_size::<[i16; 4]>();
        assert_element_size::<[i32; 4]>();
    }
}
