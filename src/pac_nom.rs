use nom::bytes::complete::{tag, take};
use nom::combinator::{cond, map_res};
use nom::multi::count;
use nom::number::complete::u32;
use nom::number::Endianness;
use nom::sequence::tuple;
use nom::IResult;

//The parsing half of the PAC container format.
//Layout, all integers in the archive's own byte order:
//  header   "FPAC" data_start total_size file_count params name_length [8 reserved]
//  entries  name[name_length] index offset size [name_id], padded to ALIGNMENT
//  data     starting at data_start, every entry padded to ALIGNMENT
//The byte order isn't stored anywhere, detect() tries both.

pub const MAGIC: &[u8] = b"FPAC";
pub const HEADER_SIZE: usize = 32;
pub const ALIGNMENT: usize = 16;
pub const NAME_ID: u32 = 0x8000_0000;
pub const EXTENDED_NAME_ID: u32 = 0xA000_0000;
pub const MAX_NAME_LENGTH: u32 = 4096;

pub fn align(value: usize, to: usize) -> usize {
    (value + to - 1) / to * to
}

/// Size of one entry of the table for a given name field width.
pub fn entry_size(name_length: u32, name_id: bool) -> usize {
    let fields = if name_id { 16 } else { 12 };
    align(name_length as usize + fields, ALIGNMENT)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub data_start: u32,
    pub total_size: u32,
    pub file_count: u32,
    pub params: u32,
    pub name_length: u32,
}

impl Header {
    pub fn has_name_id(&self) -> bool {
        self.params & NAME_ID != 0
    }

    pub fn entry_size(&self) -> usize {
        entry_size(self.name_length, self.has_name_id())
    }

    /// Whether the header describes a container of exactly `len` bytes.
    pub fn fits(&self, len: usize) -> bool {
        let table = (self.file_count as u64) * (self.entry_size() as u64) + HEADER_SIZE as u64;
        self.total_size as usize == len
            && self.name_length > 0
            && self.name_length <= MAX_NAME_LENGTH
            && table <= self.data_start as u64
            && self.data_start <= self.total_size
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub name: String,
    pub index: u32,
    pub offset: u32,
    pub size: u32,
    pub name_id: Option<u32>,
}

pub fn header(input: &[u8], e: Endianness) -> IResult<&[u8], Header> {
    let (input, _) = tag(MAGIC)(input)?;
    let (input, (data_start, total_size, file_count, params, name_length)) =
        tuple((u32(e), u32(e), u32(e), u32(e), u32(e)))(input)?;
    let (input, _reserved) = take(8usize)(input)?;
    Ok((
        input,
        Header {
            data_start,
            total_size,
            file_count,
            params,
            name_length,
        },
    ))
}

/// Finds the byte order a container was written in.
/// `None` means the bytes aren't a container at all.
pub fn detect(input: &[u8]) -> Option<(Endianness, Header)> {
    detect_len(input, input.len())
}

/// Like `detect`, for when only the start of a container of `len` bytes is at hand.
pub fn detect_len(input: &[u8], len: usize) -> Option<(Endianness, Header)> {
    let orders = [Endianness::Little, Endianness::Big];
    orders.iter().find_map(|&e| match header(input, e) {
        Ok((_, h)) if h.fits(len) => Some((e, h)),
        _ => None,
    })
}

//Names are NUL padded to the field width.
fn name(input: &[u8], width: u32) -> IResult<&[u8], String> {
    map_res(take(width as usize), |bytes: &[u8]| {
        let end = bytes.iter().position(|&c| c == 0).unwrap_or(bytes.len());
        String::from_utf8(bytes[..end].to_vec())
    })(input)
}

fn entry<'a>(input: &'a [u8], e: Endianness, header: &Header) -> IResult<&'a [u8], RawEntry> {
    let start = input.len();
    let (input, name) = name(input, header.name_length)?;
    let (input, (index, offset, size)) = tuple((u32(e), u32(e), u32(e)))(input)?;
    let (input, name_id) = cond(header.has_name_id(), u32(e))(input)?;
    let used = start - input.len();
    let (input, _padding) = take(header.entry_size() - used)(input)?;
    Ok((
        input,
        RawEntry {
            name,
            index,
            offset,
            size,
            name_id,
        },
    ))
}

/// The entry table, `input` starting right after the header.
pub fn entries<'a>(input: &'a [u8], e: Endianness, header: &Header) -> IResult<&'a [u8], Vec<RawEntry>> {
    count(|i| entry(i, e, header), header.file_count as usize)(input)
}
