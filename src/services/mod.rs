pub mod selection;
pub mod size_cache;
pub mod transfer;
