// otf-rs: A Rust library for decoding TrueType/OpenType fonts

mod error;
mod font;
mod outline;
mod registry;
mod stream;
mod tables;
mod variation;
mod woff;
mod woff2;
mod woff2_transforms;

pub use error::{FontError, Result};
pub use font::{Font, FontFormat, detect_format};
pub use outline::{BoundingBox, Contour, Outline, OutlinePoint, Transform};
pub use registry::TableRegistry;
pub use stream::{FontReader, FontWriter, calculate_checksum};
pub use variation::{
    DeltaSetIndexMap, ItemVariationStore, NormalizedCoords, RegionAxis, VariationRegion,
    normalize_coordinate,
};
pub use woff::{WoffHeader, WoffTableEntry, decompress_woff};
pub use woff2::decompress_woff2;
pub use woff2_transforms::{ReconstructedGlyf, reconstruct_glyf, reconstruct_hmtx};
pub use tables::{
    FontTable, TableRecord,
    avar::AvarTable,
    cff::CffTable,
    cff2::Cff2Table,
    charstring::{BlendState, CharstringInterpreter},
    cmap::{CmapSubtable, CmapTable},
    cvt::CvtTable,
    fpgm::FpgmTable,
    fvar::{FvarTable, NamedInstance, VariationAxis},
    gdef::GdefTable,
    glyf::{GlyfTable, Glyph, GlyphData},
    gpos::GposTable,
    gsub::GsubTable,
    gvar::GvarTable,
    head::HeadTable,
    hhea::HheaTable,
    hmtx::HmtxTable,
    hvar::{HvarTable, VvarTable},
    layout::{ClassDef, Coverage, LayoutTable},
    loca::LocaTable,
    maxp::MaxpTable,
    mvar::MvarTable,
    name::NameTable,
    os2::Os2Table,
    post::PostTable,
    prep::PrepTable,
    vhea::VheaTable,
    vmtx::VmtxTable,
};
