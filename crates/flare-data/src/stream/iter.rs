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

//! Strided element iterators over stream bytes.

use bytemuck::Pod;
use std::marker::PhantomData;
use std::slice::{ChunksExact, ChunksExactMut};

/// Iterates over the typed elements of a stream, one stride at a time.
pub struct StreamIter<'a, T> {
    chunks: ChunksExact<'a, u8>,
    _marker: PhantomData<&'a T>,
}

impl<'a, T: Pod> StreamIter<'a, T> {
    pub(crate) fn new(bytes: &'a [u8], stride: usize) -> Self {
        Self {
            chunks: bytes.chunks_exact(stride),
            _marker: PhantomData,
        }
    }
}

impl<'a, T: Pod> Iterator for StreamIter<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.chunks
            .next()
            .map(|chunk| bytemuck::from_bytes(&chunk[..std::mem::size_of::<T>()]))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

impl<T: Pod> ExactSizeIterator for StreamIter<'_, T> {}

/// Iterates mutably over the typed elements of a stream, one stride at a time.
pub struct StreamIterMut<'a, T> {
    chunks: ChunksExactMut<'a, u8>,
    _marker: PhantomData<&'a mut T>,
}

impl<'a, T: Pod> StreamIterMut<'a, T> {
    pub(crate) fn new(bytes: &'a mut [u8], stride: usize) -> Self {
        Self {
            chunks: bytes.chunks_exact_mut(stride),
            _marker: PhantomData,
        }
    }
}

impl<'a, T: Pod> Iterator for StreamIterMut<'a, T> {
    type Item = &'a mut T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.chunks
            .next()
            .map(|chunk| bytemuck::from_bytes_mut(&mut chunk[..std::mem::size_of::<T>()]))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

impl<T: Pod> ExactSizeIterator for StreamIterMut<'_, T> {}
