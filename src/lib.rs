pub mod config;
pub mod dependency;
pub mod library;
pub mod lockfile;
pub mod resolver;
pub mod rewrite;
pub mod source;
pub mod version;
