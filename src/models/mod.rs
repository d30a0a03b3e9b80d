pub mod item;
pub mod timeline;

pub use item::ItemKind;
pub use timeline::Xref;
