//! Icon container parsing
//!
//! Decodes the .ico directory format (6-byte header, 16-byte entries,
//! offset-addressed payloads) and reconstructs standalone single-entry icon
//! files that a standard raster decoder can open.

use byteorder::{ByteOrder, LittleEndian};
use tracing::debug;

use crate::FormatError;

const HEADER_LEN: usize = 6;
const ENTRY_LEN: usize = 16;

/// Offset of the payload in a reconstructed single-entry file:
/// one header plus one directory entry.
const SINGLE_ICON_OFFSET: i32 = (HEADER_LEN + ENTRY_LEN) as i32;

/// Which entry a directory scan should pick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeSelect {
    Largest,
    Smallest,
}

/// One 16-byte directory entry, fields kept as raw wire values.
#[derive(Debug, Clone, Copy)]
pub struct IconDirEntry {
    /// Stored width; 0 means 256
    pub width: u8,
    /// Stored height; 0 means 256
    pub height: u8,
    pub color_count: u8,
    pub reserved: u8,
    pub planes: i16,
    pub bit_count: i16,
    pub bytes_in_res: i32,
    pub image_offset: i32,
}

impl IconDirEntry {
    /// Actual pixel width (the 0 => 256 wire mapping applied)
    pub fn pixel_width(&self) -> u32 {
        if self.width == 0 { 256 } else { self.width as u32 }
    }

    /// Actual pixel height (the 0 => 256 wire mapping applied)
    pub fn pixel_height(&self) -> u32 {
        if self.height == 0 { 256 } else { self.height as u32 }
    }
}

/// Parsed icon container: header fields, directory, and the source buffer.
///
/// Entries are metadata views; payload bytes stay in the borrowed buffer and
/// are copied only when an entry is materialized by [`build_single_icon`].
///
/// [`build_single_icon`]: IconDir::build_single_icon
#[derive(Debug)]
pub struct IconDir<'a> {
    pub reserved: i16,
    pub kind: i16,
    entries: Vec<IconDirEntry>,
    data: &'a [u8],
}

impl<'a> IconDir<'a> {
    /// Parse an icon container buffer.
    ///
    /// Fails with `Truncated` when the buffer is shorter than the header or
    /// the declared directory, and `EntryOutOfBounds` when an entry's payload
    /// span falls outside the buffer.
    pub fn parse(data: &'a [u8]) -> Result<IconDir<'a>, FormatError> {
        if data.len() < HEADER_LEN {
            return Err(FormatError::Truncated {
                needed: HEADER_LEN,
                have: data.len(),
            });
        }

        let reserved = LittleEndian::read_i16(&data[0..2]);
        let kind = LittleEndian::read_i16(&data[2..4]);
        // A non-positive count reads as an empty directory
        let count = LittleEndian::read_i16(&data[4..6]).max(0) as usize;

        let needed = HEADER_LEN + count * ENTRY_LEN;
        if data.len() < needed {
            return Err(FormatError::Truncated {
                needed,
                have: data.len(),
            });
        }
        debug!(count, "parsing icon directory");

        let mut entries = Vec::with_capacity(count);
        for index in 0..count {
            let e = &data[HEADER_LEN + index * ENTRY_LEN..];
            let entry = IconDirEntry {
                width: e[0],
                height: e[1],
                color_count: e[2],
                reserved: e[3],
                planes: LittleEndian::read_i16(&e[4..6]),
                bit_count: LittleEndian::read_i16(&e[6..8]),
                bytes_in_res: LittleEndian::read_i32(&e[8..12]),
                image_offset: LittleEndian::read_i32(&e[12..16]),
            };

            if entry.image_offset < 0
                || entry.bytes_in_res < 0
                || entry.image_offset as usize + entry.bytes_in_res as usize > data.len()
            {
                return Err(FormatError::EntryOutOfBounds { index });
            }
            entries.push(entry);
        }

        Ok(IconDir {
            reserved,
            kind,
            entries,
            data,
        })
    }

    /// Directory entries in file order
    pub fn entries(&self) -> &[IconDirEntry] {
        &self.entries
    }

    /// Number of entries in the directory
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Materialize one entry as a minimal standalone single-entry icon file.
    ///
    /// Keeps the original header fields, forces the entry count to 1, and
    /// recomputes the entry's offset to the fixed post-directory position.
    /// Payload bounds were validated at parse time.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range for the directory.
    pub fn build_single_icon(&self, index: usize) -> Vec<u8> {
        let entry = &self.entries[index];
        let start = entry.image_offset as usize;
        let payload = &self.data[start..start + entry.bytes_in_res as usize];

        let mut header = [0u8; HEADER_LEN + ENTRY_LEN];
        LittleEndian::write_i16(&mut header[0..2], self.reserved);
        LittleEndian::write_i16(&mut header[2..4], self.kind);
        LittleEndian::write_i16(&mut header[4..6], 1);
        header[6] = entry.width;
        header[7] = entry.height;
        header[8] = entry.color_count;
        header[9] = entry.reserved;
        LittleEndian::write_i16(&mut header[10..12], entry.planes);
        LittleEndian::write_i16(&mut header[12..14], entry.bit_count);
        LittleEndian::write_i32(&mut header[14..18], entry.bytes_in_res);
        LittleEndian::write_i32(&mut header[18..22], SINGLE_ICON_OFFSET);

        let mut out = Vec::with_capacity(header.len() + payload.len());
        out.extend_from_slice(&header);
        out.extend_from_slice(payload);
        out
    }

    /// Materialize every entry as its own single-entry icon file.
    pub fn build_all(&self) -> Vec<Vec<u8>> {
        (0..self.entries.len())
            .map(|i| self.build_single_icon(i))
            .collect()
    }

    /// Linear scan for the largest or smallest entry. `None` only when the
    /// directory is empty.
    ///
    /// The best index updates only when a candidate beats it on BOTH axes
    /// strictly, compared on the raw stored bytes (so a 256-pixel entry,
    /// stored as 0, never wins a `Largest` scan). Ties and single-axis wins
    /// keep the earlier best. Historical behavior, kept as-is.
    pub fn find_extreme(&self, select: SizeSelect) -> Option<usize> {
        if self.entries.is_empty() {
            return None;
        }

        let mut best = 0;
        for (i, entry) in self.entries.iter().enumerate() {
            let current = &self.entries[best];
            let wins = match select {
                SizeSelect::Largest => entry.width > current.width && entry.height > current.height,
                SizeSelect::Smallest => entry.width < current.width && entry.height < current.height,
            };
            if wins {
                best = i;
            }
        }
        Some(best)
    }
}
