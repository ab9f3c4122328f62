pub mod entry;
pub mod output;
pub mod template;
