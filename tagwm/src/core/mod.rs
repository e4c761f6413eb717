pub mod context;
pub mod cursors;
pub mod keysyms;
pub mod props;
pub mod x11;
