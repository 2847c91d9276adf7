use crate::error::{FontError, Result};
use crate::outline::Outline;
use crate::stream::FontReader;
use crate::tables::FontTable;
use crate::variation::{ItemVariationStore, NormalizedCoords};

use super::cff::{Dict, FdSelect, Index, Subfont, dict_op};
use super::charstring::{BlendState, CharstringInterpreter};

/// CFF2 table - Compact Font Format version 2 (variable-font charstrings)
#[derive(Debug, Clone)]
pub struct Cff2Table {
    pub charstrings: Index,
    pub global_subrs: Index,
    pub subfonts: Vec<Subfont>,
    pub fd_select: Option<FdSelect>,
    pub variation_store: Option<ItemVariationStore>,
}

impl Cff2Table {
    pub fn num_glyphs(&self) -> u16 {
        self.charstrings.len() as u16
    }

    fn subfont_for_glyph(&self, glyph_id: u16) -> Result<&Subfont> {
        let index = match &self.fd_select {
            Some(fd_select) => fd_select.fd_index(glyph_id).ok_or_else(|| {
                FontError::corrupt("CFF2", format!("no FD for glyph {glyph_id}"))
            })? as usize,
            None => 0,
        };
        self.subfonts
            .get(index)
            .ok_or_else(|| FontError::corrupt("CFF2", format!("FD index {index} out of range")))
    }

    /// Interpret a glyph charstring at the given normalized coordinates.
    /// The `vsindex` in effect resets to the subfont's Private DICT default
    /// for every glyph.
    pub fn outline(&self, glyph_id: u16, coords: &NormalizedCoords) -> Result<Outline> {
        let charstring = self
            .charstrings
            .get(glyph_id as usize)
            .ok_or_else(|| FontError::corrupt("CFF2", format!("glyph {glyph_id} out of range")))?;
        let subfont = self.subfont_for_glyph(glyph_id)?;

        let blend = match &self.variation_store {
            Some(store) => Some(BlendState::new(store, coords, subfont.vsindex)?),
            None => None,
        };

        let interpreter =
            CharstringInterpreter::new(&self.global_subrs, &subfont.local_subrs, true, blend);
        interpreter.run(charstring)
    }
}

impl FontTable for Cff2Table {
    fn from_reader(reader: &mut FontReader, _length: u32) -> Result<Self> {
        let major = reader.read_u8()?;
        let _minor = reader.read_u8()?;
        if major != 2 {
            return Err(FontError::UnsupportedVersion {
                tag: "CFF2",
                version: major as u32,
            });
        }
        let header_size = reader.read_u8()? as usize;
        let top_dict_length = reader.read_u16()? as usize;

        let mut sub = reader.subreader(header_size, top_dict_length)?;
        let top_dict_bytes = sub.read_bytes(top_dict_length)?;
        let top_dict = Dict::from_slice(&top_dict_bytes)?;

        // Global subrs follow the Top DICT immediately
        reader.set_position(header_size + top_dict_length)?;
        let global_subrs = Index::from_reader_u32(reader)?;

        let charstrings_offset = top_dict
            .get_offset(dict_op::CHARSTRINGS)
            .ok_or_else(|| FontError::corrupt("CFF2", "Top DICT missing CharStrings"))?;
        reader.set_position(charstrings_offset)?;
        let charstrings = Index::from_reader_u32(reader)?;
        let num_glyphs = charstrings.len() as u16;

        // vstore: a 2-byte length prefix, then an ItemVariationStore
        let variation_store = match top_dict.get_offset(dict_op::VSTORE) {
            Some(offset) => {
                reader.set_position(offset)?;
                let _store_length = reader.read_u16()?;
                Some(ItemVariationStore::from_reader(reader, offset + 2)?)
            }
            None => None,
        };

        // The FDArray is required in CFF2
        let fd_array_offset = top_dict
            .get_offset(dict_op::FD_ARRAY)
            .ok_or_else(|| FontError::corrupt("CFF2", "Top DICT missing FDArray"))?;
        reader.set_position(fd_array_offset)?;
        let fd_array = Index::from_reader_u32(reader)?;
        if fd_array.is_empty() {
            return Err(FontError::corrupt("CFF2", "empty FDArray"));
        }

        let mut subfonts = Vec::with_capacity(fd_array.len());
        for fd_bytes in &fd_array.items {
            let font_dict = Dict::from_slice(fd_bytes)?;
            let subfont = match font_dict.get(dict_op::PRIVATE) {
                Some([size, offset]) => {
                    parse_private_cff2(reader, *offset as usize, *size as usize)?
                }
                _ => Subfont::default(),
            };
            subfonts.push(subfont);
        }

        let fd_select = match top_dict.get_offset(dict_op::FD_SELECT) {
            Some(offset) => {
                reader.set_position(offset)?;
                Some(FdSelect::from_reader(reader, num_glyphs)?)
            }
            None => None,
        };

        Ok(Cff2Table {
            charstrings,
            global_subrs,
            subfonts,
            fd_select,
            variation_store,
        })
    }
}

/// CFF2 Private DICT: local subrs (32-bit INDEX) and the default vsindex.
fn parse_private_cff2(
    table: &mut FontReader,
    private_offset: usize,
    private_size: usize,
) -> Result<Subfont> {
    let mut sub = table.subreader(private_offset, private_size)?;
    let dict_bytes = sub.read_bytes(private_size)?;
    let private = Dict::from_slice(&dict_bytes)?;

    let local_subrs = match private.get_offset(dict_op::SUBRS) {
        Some(subrs_offset) => {
            table.set_position(private_offset + subrs_offset)?;
            Index::from_reader_u32(table)?
        }
        None => Index::empty(),
    };

    Ok(Subfont {
        local_subrs,
        default_width_x: 0.0,
        nominal_width_x: 0.0,
        vsindex: private.get_f64(dict_op::VSINDEX).unwrap_or(0.0) as u16,
    })
}
