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

//! The [`Stream`] buffer: one named, typed, contiguous array of elements.

use super::iter::{StreamIter, StreamIterMut};
use super::{StreamDataType, StreamElement, StreamError};
use bytemuck::Pod;
use flare_core::HashedString;
use std::alloc::{self, Layout};
use std::ops::Range;
use std::ptr::NonNull;

/// Default alignment of a stream's buffer, in bytes.
pub const DEFAULT_STREAM_ALIGNMENT: usize = 64;

enum Storage {
    Empty,
    Owned { ptr: NonNull<u8>, layout: Layout },
    External { ptr: NonNull<u8> },
}

/// A named, typed, contiguous buffer of fixed-stride elements.
///
/// The buffer is either owned (aligned to [`Stream::alignment`] and zeroed on
/// every resize) or a view over caller memory set through
/// [`Stream::set_external_memory`]. In both cases
/// `len_bytes() == len() * stride()`.
pub struct Stream {
    name: HashedString,
    data_type: StreamDataType,
    alignment: usize,
    element_stride: usize,
    element_count: usize,
    storage: Storage,
}

// SAFETY: an owned buffer is uniquely owned by the stream. External memory is
// only installed through the unsafe `set_external_memory`, whose contract makes
// the caller responsible for exclusive access while the view exists.
unsafe impl Send for Stream {}
// SAFETY: shared references only give read access to the bytes.
unsafe impl Sync for Stream {}

impl Stream {
    /// Creates an empty stream with the default buffer alignment and an element
    /// alignment equal to the scalar size.
    pub fn new(name: impl Into<HashedString>, data_type: StreamDataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            alignment: DEFAULT_STREAM_ALIGNMENT,
            element_stride: data_type.size(),
            element_count: 0,
            storage: Storage::Empty,
        }
    }

    /// Creates an empty stream with explicit buffer and element alignments.
    ///
    /// The element stride is the type size rounded up to `element_alignment`.
    pub fn with_alignment(
        name: impl Into<HashedString>,
        data_type: StreamDataType,
        alignment: usize,
        element_alignment: usize,
    ) -> Result<Self, StreamError> {
        if !alignment.is_power_of_two() {
            return Err(StreamError::InvalidAlignment(alignment));
        }
        if !element_alignment.is_power_of_two() || element_alignment > alignment {
            return Err(StreamError::InvalidAlignment(element_alignment));
        }
        let element_alignment = element_alignment.max(data_type.scalar().size());
        let mut stream = Self::new(name, data_type);
        stream.alignment = alignment;
        stream.element_stride = data_type.size().next_multiple_of(element_alignment);
        Ok(stream)
    }

    /// The stream's name.
    #[inline]
    pub fn name(&self) -> &HashedString {
        &self.name
    }

    /// The element type.
    #[inline]
    pub fn data_type(&self) -> StreamDataType {
        self.data_type
    }

    /// Buffer alignment in bytes.
    #[inline]
    pub fn alignment(&self) -> usize {
        self.alignment
    }

    /// Distance in bytes between consecutive elements.
    #[inline]
    pub fn stride(&self) -> usize {
        self.element_stride
    }

    /// Number of elements the buffer holds.
    #[inline]
    pub fn len(&self) -> usize {
        self.element_count
    }

    /// Returns `true` if the buffer holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.element_count == 0
    }

    /// Size of the buffer in bytes.
    #[inline]
    pub fn len_bytes(&self) -> usize {
        self.element_count * self.element_stride
    }

    /// Returns `true` if the stream is a view over caller memory.
    #[inline]
    pub fn is_external(&self) -> bool {
        matches!(self.storage, Storage::External { .. })
    }

    /// Resizes the buffer to `element_count` zeroed elements, discarding the
    /// previous contents. A size of zero frees the buffer. An external view is
    /// dropped and the stream returns to owned storage.
    pub fn set_size(&mut self, element_count: usize) {
        self.release();
        let byte_len = element_count * self.element_stride;
        if byte_len == 0 {
            self.element_count = element_count;
            return;
        }

        let layout = match Layout::from_size_align(byte_len, self.alignment) {
            Ok(layout) => layout,
            Err(e) => panic!("Invalid layout for stream '{}': {e}", self.name),
        };
        // SAFETY: `layout` has a non-zero size.
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let Some(ptr) = NonNull::new(raw) else {
            alloc::handle_alloc_error(layout);
        };
        self.storage = Storage::Owned { ptr, layout };
        self.element_count = element_count;
    }

    /// Makes the stream a view over `element_count` elements of caller memory.
    ///
    /// The stream never frees this memory. The view ends on the next
    /// [`Stream::set_size`] or when the stream is dropped.
    ///
    /// # Safety
    /// `ptr` must be valid for reads and writes of `element_count * stride()`
    /// bytes, aligned to the element type, and not accessed through any other
    /// path while the view exists.
    pub unsafe fn set_external_memory(&mut self, ptr: NonNull<u8>, element_count: usize) {
        self.release();
        self.storage = Storage::External { ptr };
        self.element_count = element_count;
    }

    /// The raw bytes of the whole buffer.
    pub fn as_bytes(&self) -> &[u8] {
        match self.storage {
            Storage::Empty => &[],
            // SAFETY: the pointer is valid for `len_bytes()` bytes while the storage lives.
            Storage::Owned { ptr, .. } | Storage::External { ptr } => unsafe {
                std::slice::from_raw_parts(ptr.as_ptr(), self.len_bytes())
            },
        }
    }

    /// The raw bytes of the whole buffer, mutably.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        match self.storage {
            Storage::Empty => &mut [],
            // SAFETY: as in `as_bytes`, and `&mut self` guarantees exclusivity.
            Storage::Owned { ptr, .. } | Storage::External { ptr } => unsafe {
                std::slice::from_raw_parts_mut(ptr.as_ptr(), self.len_bytes())
            },
        }
    }

    /// Address of the buffer, for tests that check the buffer was not reallocated.
    pub fn buffer_address(&self) -> usize {
        self.as_bytes().as_ptr() as usize
    }

    /// Views the whole buffer as a slice of `T`.
    ///
    /// # Panics
    /// If `T` does not have the stream's type size, or the stride differs
    /// from the type size (use [`Stream::iter`] then).
    pub fn as_slice<T: Pod>(&self) -> &[T] {
        self.check_slice_type::<T>();
        cast_elements(self.as_bytes())
    }

    /// Views the whole buffer as a mutable slice of `T`.
    ///
    /// # Panics
    /// Same conditions as [`Stream::as_slice`].
    pub fn as_slice_mut<T: Pod>(&mut self) -> &mut [T] {
        self.check_slice_type::<T>();
        cast_elements_mut(self.as_bytes_mut())
    }

    /// Views the buffer as `T` if `T` is the stream's element type and the
    /// stride is unpadded.
    pub fn typed<T: StreamElement>(&self) -> Option<&[T]> {
        (T::DATA_TYPE == self.data_type && self.element_stride == self.data_type.size())
            .then(|| cast_elements(self.as_bytes()))
    }

    /// Mutable counterpart of [`Stream::typed`].
    pub fn typed_mut<T: StreamElement>(&mut self) -> Option<&mut [T]> {
        if T::DATA_TYPE == self.data_type && self.element_stride == self.data_type.size() {
            Some(cast_elements_mut(self.as_bytes_mut()))
        } else {
            None
        }
    }

    /// Iterates over the elements in `range`, whatever the stride.
    pub fn iter<T: Pod>(&self, range: Range<usize>) -> StreamIter<'_, T> {
        self.check_element_type::<T>();
        let stride = self.element_stride;
        StreamIter::new(&self.as_bytes()[range.start * stride..range.end * stride], stride)
    }

    /// Iterates mutably over the elements in `range`, whatever the stride.
    pub fn iter_mut<T: Pod>(&mut self, range: Range<usize>) -> StreamIterMut<'_, T> {
        self.check_element_type::<T>();
        let stride = self.element_stride;
        StreamIterMut::new(
            &mut self.as_bytes_mut()[range.start * stride..range.end * stride],
            stride,
        )
    }

    /// Copies element `from` over element `to`.
    pub(crate) fn copy_element(&mut self, from: usize, to: usize) {
        if from == to {
            return;
        }
        let stride = self.element_stride;
        self.as_bytes_mut()
            .copy_within(from * stride..(from + 1) * stride, to * stride);
    }

    /// Zeroes the elements in `range`.
    pub(crate) fn zero_elements(&mut self, range: Range<usize>) {
        let stride = self.element_stride;
        self.as_bytes_mut()[range.start * stride..range.end * stride].fill(0);
    }

    fn check_element_type<T: Pod>(&self) {
        assert_eq!(
            std::mem::size_of::<T>(),
            self.data_type.size(),
            "Element type of size {} does not match stream '{}' ({})",
            std::mem::size_of::<T>(),
            self.name,
            self.data_type
        );
    }

    fn check_slice_type<T: Pod>(&self) {
        self.check_element_type::<T>();
        assert_eq!(
            self.element_stride,
            self.data_type.size(),
            "Stream '{}' is padded to a stride of {}; use a strided iterator",
            self.name,
            self.element_stride
        );
    }

    fn release(&mut self) {
        if let Storage::Owned { ptr, layout } = std::mem::replace(&mut self.storage, Storage::Empty) {
            // SAFETY: the buffer was allocated with exactly this layout.
            unsafe { alloc::dealloc(ptr.as_ptr(), layout) };
        }
        self.element_count = 0;
    }
}

// An unsized stream's empty byte slice is not aligned for wider element types.
fn cast_elements<T: Pod>(bytes: &[u8]) -> &[T] {
    if bytes.is_empty() {
        &[]
    } else {
        bytemuck::cast_slice(bytes)
    }
}

fn cast_elements_mut<T: Pod>(bytes: &mut [u8]) -> &mut [T] {
    if bytes.is_empty() {
        &mut []
    } else {
        bytemuck::cast_slice_mut(bytes)
    }
}

impl Drop for Stream {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stream")
            .field("name", &self.name)
            .field("data_type", &self.data_type)
            .field("stride", &self.element_stride)
            .field("len", &self.element_count)
            .field("external", &self.is_external())
            .finish()
    }
}
