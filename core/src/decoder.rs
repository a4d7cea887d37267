//! Streaming scanline PNG decoder.
//!
//! Decodes non-interlaced 8-bit PNGs (greyscale, RGB, RGBA, palette)
//! straight onto a [`Surface`], one row at a time. IDAT data is fed
//! through a streaming inflate core with a 32 KiB window; the full image
//! is never held in memory. Chunk CRCs are skipped, not verified.

extern crate alloc;

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;

use embedded_io::SeekFrom;
use log::debug;
use miniz_oxide::inflate::TINFLStatus;
use miniz_oxide::inflate::core::{DecompressorOxide, decompress, inflate_flags};

use crate::store::{ByteSource, ByteStore};
use crate::surface::Surface;

const PNG_SIG: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

const CHUNK_IHDR: [u8; 4] = *b"IHDR";
const CHUNK_PLTE: [u8; 4] = *b"PLTE";
const CHUNK_IDAT: [u8; 4] = *b"IDAT";
const CHUNK_IEND: [u8; 4] = *b"IEND";

const COLOR_GREYSCALE: u8 = 0;
const COLOR_RGB: u8 = 2;
const COLOR_PALETTE: u8 = 3;
const COLOR_RGBA: u8 = 6;

const FILTER_NONE: u8 = 0;
const FILTER_SUB: u8 = 1;
const FILTER_UP: u8 = 2;
const FILTER_AVERAGE: u8 = 3;
const FILTER_PAETH: u8 = 4;

// inflate LZ dictionary; must be a power of two >= 32768
const DICT_SIZE: usize = 32_768;
// compressed read buffer for topping up from the IDAT stream
const READ_BUF: usize = 1024;

// largest image the appliance will stream; the panel is 320x240
const MAX_WIDTH: u32 = 480;
const MAX_HEIGHT: u32 = 480;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The store could not open the named resource.
    OpenFailed,
    /// The stream ended before the claimed image data did.
    Truncated,
    /// Not a PNG this decoder handles.
    BadFormat,
}

struct Header {
    width: u32,
    height: u32,
    color_type: u8,
}

impl Header {
    fn bytes_per_pixel(&self) -> usize {
        match self.color_type {
            COLOR_RGB => 3,
            COLOR_RGBA => 4,
            _ => 1,
        }
    }

    fn scanline_bytes(&self) -> usize {
        self.width as usize * self.bytes_per_pixel()
    }
}

/// Decode the named resource onto the surface, top row first.
///
/// Rows already painted stay on the surface when decoding fails
/// part-way; the caller decides whether that is acceptable.
pub fn decode<B: ByteStore, S: Surface>(
    store: &mut B,
    name: &str,
    surface: &mut S,
) -> Result<(), DecodeError> {
    let mut src = store.open(name).map_err(|_| DecodeError::OpenFailed)?;
    decode_from(&mut src, name, surface)
}

fn decode_from<R: ByteSource, S: Surface>(
    src: &mut R,
    name: &str,
    surface: &mut S,
) -> Result<(), DecodeError> {
    // anything too short to carry the signature is not a PNG at all
    let mut sig = [0u8; 8];
    if read_exact(src, &mut sig).is_err() || sig != PNG_SIG {
        return Err(DecodeError::BadFormat);
    }

    // IHDR must be the first chunk
    let mut chunk_hdr = [0u8; 8]; // 4-byte length + 4-byte type
    read_exact(src, &mut chunk_hdr)?;
    if chunk_type(&chunk_hdr) != CHUNK_IHDR || be_u32(&chunk_hdr, 0) != 13 {
        return Err(DecodeError::BadFormat);
    }
    let mut ihdr = [0u8; 13];
    read_exact(src, &mut ihdr)?;
    skip(src, 4)?; // CRC

    let header = Header {
        width: be_u32(&ihdr, 0),
        height: be_u32(&ihdr, 4),
        color_type: ihdr[9],
    };
    let bit_depth = ihdr[8];
    let (compression, filter_method, interlace) = (ihdr[10], ihdr[11], ihdr[12]);
    if header.width == 0
        || header.height == 0
        || header.width > MAX_WIDTH
        || header.height > MAX_HEIGHT
    {
        return Err(DecodeError::BadFormat);
    }
    if bit_depth != 8 || compression != 0 || filter_method != 0 || interlace != 0 {
        return Err(DecodeError::BadFormat);
    }
    if !matches!(
        header.color_type,
        COLOR_GREYSCALE | COLOR_RGB | COLOR_PALETTE | COLOR_RGBA
    ) {
        return Err(DecodeError::BadFormat);
    }

    debug!(
        "{}: {}x{} colour type {}",
        name, header.width, header.height, header.color_type
    );

    // walk chunks up to the first IDAT, capturing PLTE on the way
    let mut plte: Option<Vec<u8>> = None;
    let first_idat_len;
    loop {
        read_exact(src, &mut chunk_hdr)?;
        let clen = be_u32(&chunk_hdr, 0) as usize;
        let ctype = chunk_type(&chunk_hdr);
        if ctype == CHUNK_IDAT {
            first_idat_len = clen;
            break;
        } else if ctype == CHUNK_IEND {
            return Err(DecodeError::BadFormat);
        } else if ctype == CHUNK_PLTE {
            if clen > 768 || clen % 3 != 0 {
                return Err(DecodeError::BadFormat);
            }
            let mut p = vec![0u8; clen];
            read_exact(src, &mut p)?;
            skip(src, 4)?; // CRC
            plte = Some(p);
        } else {
            skip(src, clen as u64 + 4)?; // data + CRC
        }
    }

    let palette = build_palette(header.color_type, plte.as_deref())?;

    let bpp = header.bytes_per_pixel();
    let scanline_bytes = header.scanline_bytes();

    // scanline accumulator: 1 filter byte + raw row
    let row_total = 1 + scanline_bytes;
    let mut row_buf = vec![0u8; row_total];
    let mut row_pos = 0usize;
    let mut prev_row = vec![0u8; scanline_bytes];
    let mut curr_row = vec![0u8; scanline_bytes];
    let mut row565 = vec![0u16; header.width as usize];

    let mut decomp = Box::new(DecompressorOxide::new());
    let mut dict = vec![0u8; DICT_SIZE];
    let mut dict_pos = 0usize;

    let mut idat_buf = [0u8; READ_BUF];
    let mut in_avail = 0usize;
    let mut idat_chunk_left = first_idat_len;
    let mut more_idat = true;
    let mut y = 0usize;

    loop {
        // top up the compressed input buffer from the IDAT stream
        while in_avail < READ_BUF {
            if idat_chunk_left > 0 {
                let want = idat_chunk_left.min(READ_BUF - in_avail);
                read_exact(src, &mut idat_buf[in_avail..in_avail + want])?;
                in_avail += want;
                idat_chunk_left -= want;
            } else if more_idat {
                skip(src, 4)?; // CRC of the previous IDAT
                read_exact(src, &mut chunk_hdr)?;
                if chunk_type(&chunk_hdr) == CHUNK_IDAT {
                    idat_chunk_left = be_u32(&chunk_hdr, 0) as usize;
                } else {
                    more_idat = false;
                    break;
                }
            } else {
                break;
            }
        }

        let has_more = idat_chunk_left > 0 || more_idat;
        let flags = inflate_flags::TINFL_FLAG_PARSE_ZLIB_HEADER
            | if has_more {
                inflate_flags::TINFL_FLAG_HAS_MORE_INPUT
            } else {
                0
            };

        let write_pos = dict_pos & (DICT_SIZE - 1);
        let (status, consumed, produced) =
            decompress(&mut decomp, &idat_buf[..in_avail], &mut dict, write_pos, flags);

        if consumed > 0 && consumed < in_avail {
            idat_buf.copy_within(consumed..in_avail, 0);
        }
        in_avail -= consumed;

        // feed decompressed bytes into the scanline accumulator
        for i in 0..produced {
            row_buf[row_pos] = dict[(write_pos + i) & (DICT_SIZE - 1)];
            row_pos += 1;

            if row_pos == row_total {
                let filter = row_buf[0];
                curr_row.copy_from_slice(&row_buf[1..]);
                unfilter_row(filter, &mut curr_row, &prev_row, bpp)?;

                if y < header.height as usize {
                    convert_row(&curr_row, &header, &palette, &mut row565);
                    surface.blit_row(0, y as i32, &row565);
                }
                y += 1;

                core::mem::swap(&mut prev_row, &mut curr_row);
                row_pos = 0;
            }
        }

        dict_pos += produced;

        match status {
            TINFLStatus::Done => break,
            TINFLStatus::NeedsMoreInput => {
                if !has_more && in_avail == 0 {
                    return Err(DecodeError::Truncated);
                }
                if consumed == 0 && produced == 0 && in_avail >= READ_BUF {
                    return Err(DecodeError::BadFormat);
                }
            }
            TINFLStatus::HasMoreOutput => {
                if consumed == 0 && produced == 0 {
                    return Err(DecodeError::BadFormat);
                }
            }
            _ => return Err(DecodeError::BadFormat),
        }
    }

    if y < header.height as usize {
        return Err(DecodeError::Truncated);
    }
    Ok(())
}

fn read_exact<R: ByteSource>(src: &mut R, buf: &mut [u8]) -> Result<(), DecodeError> {
    let mut done = 0;
    while done < buf.len() {
        match src.read(&mut buf[done..]) {
            Ok(0) | Err(_) => return Err(DecodeError::Truncated),
            Ok(n) => done += n,
        }
    }
    Ok(())
}

fn skip<R: ByteSource>(src: &mut R, n: u64) -> Result<(), DecodeError> {
    src.seek(SeekFrom::Current(n as i64))
        .map_err(|_| DecodeError::Truncated)?;
    Ok(())
}

#[inline]
fn be_u32(d: &[u8], o: usize) -> u32 {
    u32::from_be_bytes([d[o], d[o + 1], d[o + 2], d[o + 3]])
}

#[inline]
fn chunk_type(hdr: &[u8; 8]) -> [u8; 4] {
    [hdr[4], hdr[5], hdr[6], hdr[7]]
}

#[inline]
fn rgb565(r: u8, g: u8, b: u8) -> u16 {
    ((r as u16 & 0xF8) << 8) | ((g as u16 & 0xFC) << 3) | (b as u16 >> 3)
}

fn build_palette(color_type: u8, plte: Option<&[u8]>) -> Result<[u16; 256], DecodeError> {
    let mut lut = [0u16; 256];
    if color_type == COLOR_PALETTE {
        let plte = plte.ok_or(DecodeError::BadFormat)?;
        for (i, rgb) in plte.chunks_exact(3).enumerate() {
            lut[i] = rgb565(rgb[0], rgb[1], rgb[2]);
        }
    }
    Ok(lut)
}

fn convert_row(row: &[u8], header: &Header, palette: &[u16; 256], out: &mut [u16]) {
    let w = header.width as usize;
    match header.color_type {
        COLOR_GREYSCALE => {
            for x in 0..w {
                out[x] = rgb565(row[x], row[x], row[x]);
            }
        }
        COLOR_RGB => {
            for x in 0..w {
                out[x] = rgb565(row[x * 3], row[x * 3 + 1], row[x * 3 + 2]);
            }
        }
        COLOR_PALETTE => {
            for x in 0..w {
                out[x] = palette[row[x] as usize];
            }
        }
        COLOR_RGBA => {
            // blend against the black panel background
            for x in 0..w {
                let a = row[x * 4 + 3] as u16;
                let r = (row[x * 4] as u16 * a / 255) as u8;
                let g = (row[x * 4 + 1] as u16 * a / 255) as u8;
                let b = (row[x * 4 + 2] as u16 * a / 255) as u8;
                out[x] = rgb565(r, g, b);
            }
        }
        _ => {}
    }
}

// reconstruct one scanline in place given the previous unfiltered row
fn unfilter_row(filter: u8, row: &mut [u8], prev: &[u8], bpp: usize) -> Result<(), DecodeError> {
    let len = row.len();
    match filter {
        FILTER_NONE => {}
        FILTER_SUB => {
            for i in bpp..len {
                row[i] = row[i].wrapping_add(row[i - bpp]);
            }
        }
        FILTER_UP => {
            for i in 0..len {
                row[i] = row[i].wrapping_add(prev[i]);
            }
        }
        FILTER_AVERAGE => {
            for i in 0..len {
                let a = if i >= bpp { row[i - bpp] as u16 } else { 0 };
                let b = prev[i] as u16;
                row[i] = row[i].wrapping_add(((a + b) / 2) as u8);
            }
        }
        FILTER_PAETH => {
            for i in 0..len {
                let a = if i >= bpp { row[i - bpp] } else { 0 };
                let b = prev[i];
                let c = if i >= bpp { prev[i - bpp] } else { 0 };
                row[i] = row[i].wrapping_add(paeth(a, b, c));
            }
        }
        _ => return Err(DecodeError::BadFormat),
    }
    Ok(())
}

#[inline]
fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let (a, b, c) = (a as i16, b as i16, c as i16);
    let p = a + b - c;
    let pa = (p - a).unsigned_abs();
    let pb = (p - b).unsigned_abs();
    let pc = (p - c).unsigned_abs();
    if pa <= pb && pa <= pc {
        a as u8
    } else if pb <= pc {
        b as u8
    } else {
        c as u8
    }
}
