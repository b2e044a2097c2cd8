use core::ffi::CStr;
use heapless::Vec;

#[derive(Debug)]
pub enum Error {
    BufferOverflow,
    InteriorNul,
}

// Builds a nul-terminated copy of `s`, trimmed of surrounding newlines, as
// mbedtls expects for server names and PEM data.
pub fn build_trimmed_c_str_vec<const N: usize>(s: &str) -> Result<Vec<u8, N>, Error> {
    let trimmed = s.trim_matches('\n');

    let mut buf: Vec<u8, N> = Vec::new();
    buf.extend_from_slice(trimmed.as_bytes())
        .map_err(|_| Error::BufferOverflow)?;
    buf.push(0).map_err(|_| Error::BufferOverflow)?;

    // reject early rather than at handshake
    as_c_str(&buf)?;

    Ok(buf)
}

pub fn as_c_str(buf: &[u8]) -> Result<&CStr, Error> {
    CStr::from_bytes_with_nul(buf).map_err(|_| Error::InteriorNul)
}
