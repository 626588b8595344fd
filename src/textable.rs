/*
 *  textable.rs
 *
 *  ht16k33-display - seg_14_x_4 model
 *  (c) 2020-26 Stuart Hunter
 *
 *  Rotating window text scroller for fixed width character displays
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

/// Windows of `width` characters over `text`, advancing one character per
/// frame with no wraparound and no padding.
///
/// Text shorter than the window yields nothing; callers decide how to show it.
/// The sequence is plain data: cloning or calling `render` again replays it.
pub fn render(text: &str, width: usize) -> ScrollFrames<'_> {
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let chars = bounds.len() - 1;

    let frames = if width == 0 || chars < width { 0 } else { chars - width + 1 };

    ScrollFrames {
        text,
        bounds,
        width,
        next: 0,
        frames,
    }
}

/// Iterator returned by [`render`]
#[derive(Debug, Clone)]
pub struct ScrollFrames<'a> {
    text: &'a str,
    bounds: Vec<usize>, // byte offset of every char, plus the end
    width: usize,
    next: usize,
    frames: usize,
}

impl<'a> Iterator for ScrollFrames<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.frames {
            return None;
        }
        let start = self.bounds[self.next];
        let end = self.bounds[self.next + self.width];
        self.next += 1;
        Some(&self.text[start..end])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.frames - self.next;
        (left, Some(left))
    }
}

impl ExactSizeIterator for ScrollFrames<'_> {}

/// Scrolls text through a display of fixed cell count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextScroller {
    width: usize,
}

impl TextScroller {
    pub fn new(width: usize) -> Self {
        Self { width }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn frames<'a>(&self, text: &'a str) -> ScrollFrames<'a> {
        render(text, self.width)
    }
}
