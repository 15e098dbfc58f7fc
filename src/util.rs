use std::error::Error;
use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

/// Check whether a reader points to a binary file by looking for null bytes
/// in the first 512 bytes. Resets the reader position to the start afterward.
pub fn is_binary_reader<R: Read + Seek>(reader: &mut R) -> io::Result<bool> {
    let mut header = [0u8; 512];
    let n = reader.read(&mut header)?;
    reader.seek(SeekFrom::Start(0))?;
    Ok(header[..n].contains(&0))
}

/// Read a text source to a string, rejecting binary content.
pub fn read_text<R: Read + Seek>(mut reader: R, name: &str) -> Result<String, Box<dyn Error>> {
    if is_binary_reader(&mut reader)? {
        return Err(format!("{name}: binary file").into());
    }
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    String::from_utf8(bytes).map_err(|_| format!("{name}: not valid UTF-8").into())
}

/// Current content of `path`, from stdin when `from_stdin` is set (an editor
/// buffer with unsaved edits) or from disk otherwise.
pub fn read_content(path: &Path, from_stdin: bool) -> Result<String, Box<dyn Error>> {
    if from_stdin {
        let mut bytes = Vec::new();
        io::stdin().read_to_end(&mut bytes)?;
        return read_text(Cursor::new(bytes), "<stdin>");
    }
    let file = File::open(path).map_err(|e| format!("{}: {e}", path.display()))?;
    read_text(file, &path.display().to_string())
}

#[cfg(test)]
#[path = "util_test.rs"]
mod tests;
