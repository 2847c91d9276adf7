use crate::error::Result;
use crate::stream::FontReader;
use crate::tables::FontTable;

/// prep table - Control value program bytecode, surfaced verbatim and never
/// executed.
#[derive(Debug, Clone)]
pub struct PrepTable {
    pub instructions: Vec<u8>,
}

impl FontTable for PrepTable {
    fn from_reader(reader: &mut FontReader, length: u32) -> Result<Self> {
        let instructions = reader.read_bytes(length as usize)?;
        Ok(PrepTable { instructions })
    }
}
