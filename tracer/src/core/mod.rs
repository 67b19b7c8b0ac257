pub mod flags;

pub use flags::DirtyFlags;
