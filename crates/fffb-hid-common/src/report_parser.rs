//! Bounds-checked reads over a report payload

use crate::{HidCommonError, HidCommonResult};

/// A read cursor over borrowed report bytes.
pub struct ReportCursor<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> ReportCursor<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn read_u8(&mut self) -> HidCommonResult<u8> {
        let value = *self
            .buffer
            .get(self.position)
            .ok_or_else(|| end_of_data(self.position, 1))?;
        self.position += 1;
        Ok(value)
    }

    pub fn read_u16_be(&mut self) -> HidCommonResult<u16> {
        let [hi, lo] = self.read_array::<2>()?;
        Ok(u16::from_be_bytes([hi, lo]))
    }

    pub fn read_i16_be(&mut self) -> HidCommonResult<i16> {
        let bytes = self.read_array::<2>()?;
        Ok(i16::from_be_bytes(bytes))
    }

    pub fn read_bytes(&mut self, count: usize) -> HidCommonResult<&'a [u8]> {
        let end = self
            .position
            .checked_add(count)
            .ok_or_else(|| end_of_data(self.position, count))?;
        let bytes = self
            .buffer
            .get(self.position..end)
            .ok_or_else(|| end_of_data(self.position, count))?;
        self.position = end;
        Ok(bytes)
    }

    pub fn read_array<const N: usize>(&mut self) -> HidCommonResult<[u8; N]> {
        let bytes = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    pub fn peek_u8(&self) -> HidCommonResult<u8> {
        self.buffer
            .get(self.position)
            .copied()
            .ok_or_else(|| end_of_data(self.position, 1))
    }

    pub fn skip(&mut self, count: usize) {
        self.position = self.position.saturating_add(count).min(self.buffer.len());
    }

    pub fn rest(&self) -> &'a [u8] {
        self.buffer.get(self.position..).unwrap_or(&[])
    }
}

fn end_of_data(position: usize, wanted: usize) -> HidCommonError {
    HidCommonError::InvalidReport(format!(
        "Unexpected end of data: wanted {wanted} byte(s) at offset {position}"
    ))
}
